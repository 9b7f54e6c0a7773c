// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Execution of shader and filter passes on a device context.

use super::{DrawCall, FrameTargets, GpuLightBuffers, ShaderRun};
use crate::shader::{Filter, Material, PassMode, ShaderPass, Visual, PASS_RESOURCE_SLOT};
use tessera_core::asset::ResourceHandle;
use tessera_core::renderer::{
    CameraConstants, DeviceContext, PipelineStage, PrimitiveTopology, ProgramId, ResourceView,
};
use tessera_data::ResourceCache;

/// Counters of what a [`PassExecutor`] recorded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecutionStats {
    /// Passes that were prepared, disabled ones excluded.
    pub passes: usize,
    /// Draw calls executed by forward passes.
    pub draws: usize,
    /// Full-screen triangles drawn by deferred passes.
    pub fullscreen_draws: usize,
    /// Visual rebinds inside forward passes.
    pub visual_binds: usize,
    /// Material rebinds inside forward passes.
    pub material_binds: usize,
    /// Compute dispatches.
    pub dispatches: usize,
    /// Times the light buffers were bound.
    pub light_binds: usize,
}

impl std::ops::AddAssign for ExecutionStats {
    fn add_assign(&mut self, rhs: Self) {
        self.passes += rhs.passes;
        self.draws += rhs.draws;
        self.fullscreen_draws += rhs.fullscreen_draws;
        self.visual_binds += rhs.visual_binds;
        self.material_binds += rhs.material_binds;
        self.dispatches += rhs.dispatches;
        self.light_binds += rhs.light_binds;
    }
}

/// Records the passes of one camera on a device context.
///
/// Every pass goes through the same sequence: [`ShaderPass::prepare`], the
/// mode-specific work, then [`ShaderPass::clear`].
pub struct PassExecutor<'a> {
    ctx: &'a mut dyn DeviceContext,
    frame: FrameTargets,
    fullscreen_program: ProgramId,
    stats: ExecutionStats,
}

impl<'a> PassExecutor<'a> {
    /// Creates an executor recording on `ctx`.
    ///
    /// `fullscreen_program` is the vertex program deferred passes draw their
    /// triangle with.
    pub fn new(
        ctx: &'a mut dyn DeviceContext,
        frame: FrameTargets,
        fullscreen_program: ProgramId,
    ) -> Self {
        Self {
            ctx,
            frame,
            fullscreen_program,
            stats: ExecutionStats::default(),
        }
    }

    /// The counters so far.
    pub fn stats(&self) -> ExecutionStats {
        self.stats
    }

    /// Direct access to the context, for work outside passes.
    pub fn context(&mut self) -> &mut dyn DeviceContext {
        &mut *self.ctx
    }

    /// Binds the camera constants to every stage.
    pub fn bind_camera(&mut self) {
        let buffers = [Some(self.frame.camera_constants)];
        for stage in [
            PipelineStage::Vertex,
            PipelineStage::Pixel,
            PipelineStage::Compute,
        ] {
            self.ctx
                .set_constant_buffer_list(stage, &buffers, CameraConstants::SLOT);
        }
    }

    /// Runs every pass of `run`'s shader over `calls`.
    ///
    /// A lit shader gets the light buffers bound first. When `lights` is
    /// `None` (lighting failed for this camera) the light slots are unbound
    /// instead, so the shader runs without light contribution.
    pub fn run_shader(
        &mut self,
        run: &ShaderRun,
        calls: &[DrawCall],
        visuals: &ResourceCache<Visual>,
        materials: &ResourceCache<Material>,
        lights: Option<&GpuLightBuffers>,
    ) {
        if run.shader.needs_lighting() {
            match lights {
                Some(lights) => {
                    lights.bind(&mut *self.ctx);
                    self.stats.light_binds += 1;
                }
                None => GpuLightBuffers::unbind(&mut *self.ctx),
            }
        }

        for pass in run.shader.passes() {
            match pass.prepare(&mut *self.ctx, &self.frame) {
                PassMode::None => continue,
                PassMode::Forward => self.draw_run(pass, calls, visuals, materials),
                PassMode::Deferred => self.draw_fullscreen(),
                PassMode::Compute => self.dispatch(pass),
            }
            self.stats.passes += 1;
            pass.clear(&mut *self.ctx);
        }
    }

    /// Runs every pass of a filter.
    pub fn run_filter(&mut self, filter: &Filter) {
        for pass in filter.passes() {
            match pass.prepare(&mut *self.ctx, &self.frame) {
                PassMode::None => continue,
                PassMode::Deferred => self.draw_fullscreen(),
                PassMode::Compute => self.dispatch(pass),
                // Filters have no draw calls.
                PassMode::Forward => {}
            }
            self.stats.passes += 1;
            pass.clear(&mut *self.ctx);
        }
    }

    /// Draws one full-screen triangle with the shared vertex program.
    pub fn draw_fullscreen(&mut self) {
        let ctx = &mut *self.ctx;
        ctx.set_program(PipelineStage::Vertex, Some(self.fullscreen_program));
        ctx.set_input_layout(None);
        ctx.set_primitive_topology(PrimitiveTopology::TriangleList);
        ctx.set_vertex_buffer(0, None);
        ctx.draw_primitive(3, 0);
        self.stats.fullscreen_draws += 1;
    }

    fn dispatch(&mut self, pass: &ShaderPass) {
        let [x, y, z] = pass.dispatch_size();
        self.ctx.dispatch(x, y, z);
        self.stats.dispatches += 1;
    }

    /// Replays the calls of a run, rebinding the visual and the material only
    /// when they change from the previous call.
    fn draw_run(
        &mut self,
        pass: &ShaderPass,
        calls: &[DrawCall],
        visuals: &ResourceCache<Visual>,
        materials: &ResourceCache<Material>,
    ) {
        let material_slot = PASS_RESOURCE_SLOT + pass.resource_count();
        let mut current_visual: Option<ResourceHandle<Visual>> = None;
        let mut current_material: Option<ResourceHandle<Material>> = None;
        let mut material_resources = 0;

        for call in calls {
            if current_visual != Some(call.visual) {
                // Unloaded since submission.
                let Some(visual) = visuals.get_resource(call.visual) else {
                    continue;
                };
                visual.bind(&mut *self.ctx);
                current_visual = Some(call.visual);
                self.stats.visual_binds += 1;
            }
            if current_material != Some(call.material) {
                let Some(material) = materials.get_resource(call.material) else {
                    continue;
                };
                material.bind(&mut *self.ctx, material_slot);
                material_resources = material_resources.max(material.resources.len());
                current_material = Some(call.material);
                self.stats.material_binds += 1;
            }
            call.command.execute(&mut *self.ctx);
            self.stats.draws += 1;
        }

        if material_resources > 0 {
            let unbound: Vec<Option<ResourceView>> = vec![None; material_resources];
            self.ctx
                .set_resource_list(PipelineStage::Pixel, &unbound, material_slot);
        }
    }
}
