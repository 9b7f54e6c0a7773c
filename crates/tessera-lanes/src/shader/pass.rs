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

//! Compiled passes and their state binding.

use super::{ClearValue, PassMode};
use crate::render_lane::{FrameTargets, LIGHT_RESOURCE_COUNT, LIGHT_RESOURCE_SLOT};
use tessera_core::renderer::{
    BlendStateId, BufferId, ClearFlags, DepthStateId, DeviceContext, PipelineStage, ProgramId,
    RenderStateId, ResourceView, TextureId, Viewport,
};

/// First resource slot of a pass's own resources. The light buffers sit
/// below it; material resources follow the pass resources.
pub const PASS_RESOURCE_SLOT: u32 = LIGHT_RESOURCE_SLOT + LIGHT_RESOURCE_COUNT;

/// A texture or buffer a compiled pass refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Binding {
    /// The current camera's color target.
    Screen,
    /// The shared depth target.
    DepthBuffer,
    /// A texture owned by the shader or filter.
    Texture(TextureId),
    /// A buffer owned by the shader or filter.
    Buffer(BufferId),
}

impl Binding {
    /// The texture this binding names for the current frame, if it is one.
    pub fn texture(&self, frame: &FrameTargets) -> Option<TextureId> {
        match *self {
            Binding::Screen => Some(frame.screen),
            Binding::DepthBuffer => Some(frame.depth),
            Binding::Texture(id) => Some(id),
            Binding::Buffer(_) => None,
        }
    }

    /// The resource view this binding names for the current frame.
    pub fn view(&self, frame: &FrameTargets) -> ResourceView {
        match *self {
            Binding::Screen => ResourceView::Texture(frame.screen),
            Binding::DepthBuffer => ResourceView::Texture(frame.depth),
            Binding::Texture(id) => ResourceView::Texture(id),
            Binding::Buffer(id) => ResourceView::Buffer(id),
        }
    }
}

/// The fixed-function state objects of a graphics pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassStates {
    /// Rasterizer state.
    pub render: RenderStateId,
    /// Depth state.
    pub depth: DepthStateId,
    /// Blend state.
    pub blend: BlendStateId,
}

/// One compiled pass of a shader or filter.
///
/// [`ShaderPass::prepare`] performs the pass's clears and copies and binds
/// its state; [`ShaderPass::clear`] unbinds what `prepare` bound.
#[derive(Debug, Clone, PartialEq)]
pub struct ShaderPass {
    pub(crate) mode: PassMode,
    pub(crate) program: Option<ProgramId>,
    pub(crate) states: Option<PassStates>,
    pub(crate) render_targets: Vec<Binding>,
    pub(crate) depth_target: Option<Binding>,
    // Size of the first named target; `None` follows the frame.
    pub(crate) viewport: Option<(u32, u32)>,
    pub(crate) resources: Vec<Binding>,
    pub(crate) unordered_access: Vec<Binding>,
    pub(crate) clears: Vec<(Binding, ClearValue)>,
    pub(crate) copies: Vec<(Binding, Binding)>,
    pub(crate) resolves: Vec<(Binding, Binding)>,
    pub(crate) mipmaps: Vec<Binding>,
    pub(crate) dispatch: [u32; 3],
}

impl ShaderPass {
    /// A pass that does nothing.
    pub fn disabled() -> Self {
        Self {
            mode: PassMode::None,
            program: None,
            states: None,
            render_targets: Vec::new(),
            depth_target: None,
            viewport: None,
            resources: Vec::new(),
            unordered_access: Vec::new(),
            clears: Vec::new(),
            copies: Vec::new(),
            resolves: Vec::new(),
            mipmaps: Vec::new(),
            dispatch: [0; 3],
        }
    }

    /// The mode [`ShaderPass::prepare`] returns.
    pub fn mode(&self) -> PassMode {
        self.mode
    }

    /// The pixel or compute program.
    pub fn program(&self) -> Option<ProgramId> {
        self.program
    }

    /// Number of resource slots the pass binds from [`PASS_RESOURCE_SLOT`].
    pub fn resource_count(&self) -> u32 {
        self.resources.len() as u32
    }

    /// Thread group counts of a compute pass.
    pub fn dispatch_size(&self) -> [u32; 3] {
        self.dispatch
    }

    fn stage(&self) -> PipelineStage {
        match self.mode {
            PassMode::Compute => PipelineStage::Compute,
            _ => PipelineStage::Pixel,
        }
    }

    /// Runs the pass's clears, copies, resolves and mip generation, binds its
    /// state and returns its mode.
    pub fn prepare(&self, ctx: &mut dyn DeviceContext, frame: &FrameTargets) -> PassMode {
        if self.mode == PassMode::None {
            return PassMode::None;
        }

        for (binding, value) in &self.clears {
            match *value {
                ClearValue::Color(color) => {
                    if let Some(target) = binding.texture(frame) {
                        ctx.clear_render_target(target, color);
                    }
                }
                ClearValue::Depth(depth) => {
                    if let Some(target) = binding.texture(frame) {
                        ctx.clear_depth_stencil_target(target, ClearFlags::DEPTH, depth, 0);
                    }
                }
                ClearValue::Float(value) => ctx.clear_unordered_access(binding.view(frame), value),
            }
        }
        for (destination, source) in &self.copies {
            ctx.copy_resource(destination.view(frame), source.view(frame));
        }
        for (destination, source) in &self.resolves {
            if let (Some(d), Some(s)) = (destination.texture(frame), source.texture(frame)) {
                ctx.resolve_resource(d, s);
            }
        }
        for binding in &self.mipmaps {
            if let Some(texture) = binding.texture(frame) {
                ctx.generate_mipmaps(texture);
            }
        }

        let stage = self.stage();
        if stage == PipelineStage::Pixel {
            if let Some(states) = self.states {
                ctx.set_render_state(Some(states.render));
                ctx.set_depth_state(Some(states.depth));
                ctx.set_blend_state(Some(states.blend));
            }
            let targets: Vec<TextureId> = self
                .render_targets
                .iter()
                .filter_map(|b| b.texture(frame))
                .collect();
            let depth = self.depth_target.and_then(|b| b.texture(frame));
            ctx.set_render_target_list(&targets, depth);
            let (width, height) = self.viewport.unwrap_or((frame.width, frame.height));
            ctx.set_viewport_list(&[Viewport::from_size(width, height)]);
        }

        ctx.set_program(stage, self.program);
        if !self.resources.is_empty() {
            let views: Vec<Option<ResourceView>> =
                self.resources.iter().map(|b| Some(b.view(frame))).collect();
            ctx.set_resource_list(stage, &views, PASS_RESOURCE_SLOT);
        }
        if !self.unordered_access.is_empty() {
            let views: Vec<Option<ResourceView>> = self
                .unordered_access
                .iter()
                .map(|b| Some(b.view(frame)))
                .collect();
            ctx.set_unordered_access_list(&views, 0);
        }
        self.mode
    }

    /// Unbinds the resources, unordered-access resources and render targets
    /// bound by [`ShaderPass::prepare`].
    pub fn clear(&self, ctx: &mut dyn DeviceContext) {
        if self.mode == PassMode::None {
            return;
        }
        let stage = self.stage();
        if !self.resources.is_empty() {
            ctx.set_resource_list(stage, &vec![None; self.resources.len()], PASS_RESOURCE_SLOT);
        }
        if !self.unordered_access.is_empty() {
            ctx.set_unordered_access_list(&vec![None; self.unordered_access.len()], 0);
        }
        if stage == PipelineStage::Pixel {
            ctx.set_render_target_list(&[], None);
        }
    }
}
