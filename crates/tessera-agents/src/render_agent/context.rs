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

//! The long-lived rendering state shared by every frame.

use anyhow::Context;
use std::borrow::Cow;
use std::sync::Arc;
use tessera_core::asset::ResourceHandle;
use tessera_core::renderer::{
    BlendStateDescriptor, BufferDescriptor, BufferUsage, CameraConstants, CompareFunction,
    CullMode, DepthStateDescriptor, GraphicsDevice, PipelineStage, ProgramDescriptor, ProgramId,
    RenderStateDescriptor, RendererSettings, ResourceError, TextureDescriptor, TextureFormat,
    TextureId, TextureUsage,
};
use tessera_core::tasks::TaskPool;
use tessera_data::ResourceCache;
use tessera_lanes::render_lane::FrameTargets;
use tessera_lanes::shader::{
    CompileContext, Filter, FilterDescriptor, Material, PassStates, Shader, ShaderDescriptor,
    ShaderLibrary, Visual,
};

/// Entry point of the vertex program drawing full-screen triangles.
pub const FULLSCREEN_PROGRAM: &str = "fullscreen_vs";

/// Entry point of the pixel program compositing the screen onto the back buffer.
pub const OVERLAY_PROGRAM: &str = "overlay_ps";

/// Owns the device, the worker pool, the caches and the engine's own GPU objects.
pub struct RenderContext {
    device: Arc<dyn GraphicsDevice>,
    pool: Arc<TaskPool>,
    settings: RendererSettings,
    library: ShaderLibrary,
    materials: ResourceCache<Material>,
    visuals: ResourceCache<Visual>,
    frame: FrameTargets,
    fullscreen_program: ProgramId,
    overlay_program: ProgramId,
    overlay_states: PassStates,
}

impl RenderContext {
    /// Validates `settings`, starts the worker pool and creates the screen,
    /// depth and back buffer targets, the camera constant buffer and the
    /// overlay programs.
    pub fn new(device: Arc<dyn GraphicsDevice>, settings: RendererSettings) -> anyhow::Result<Self> {
        settings
            .validate()
            .context("invalid renderer settings")?;
        let threads = settings.resolved_worker_threads();
        let pool = Arc::new(
            TaskPool::new(threads)
                .with_context(|| format!("failed to start a pool of {threads} workers"))?,
        );

        let frame = create_frame_targets(device.as_ref(), &settings)
            .context("failed to create the frame targets")?;
        let objects = create_overlay_objects(device.as_ref());
        let (fullscreen_program, overlay_program, overlay_states) = match objects {
            Ok(objects) => objects,
            Err(e) => {
                destroy_frame_targets(device.as_ref(), &frame);
                return Err(e).context("failed to create the overlay objects");
            }
        };

        log::info!(
            "RenderContext: {}x{} screen, {} workers, {}x{}x{} light grid",
            settings.screen_width,
            settings.screen_height,
            threads,
            settings.tile_grid.width,
            settings.tile_grid.height,
            settings.tile_grid.depth
        );

        Ok(Self {
            library: ShaderLibrary::new(pool.clone()),
            materials: ResourceCache::new("Material", pool.clone()),
            visuals: ResourceCache::new("Visual", pool.clone()),
            device,
            pool,
            settings,
            frame,
            fullscreen_program,
            overlay_program,
            overlay_states,
        })
    }

    /// The graphics device.
    pub fn device(&self) -> &Arc<dyn GraphicsDevice> {
        &self.device
    }

    /// The worker pool.
    pub fn pool(&self) -> &Arc<TaskPool> {
        &self.pool
    }

    /// The settings the context was created with.
    pub fn settings(&self) -> &RendererSettings {
        &self.settings
    }

    /// The compiled shaders and filters.
    pub fn library(&self) -> &ShaderLibrary {
        &self.library
    }

    /// The material cache.
    pub fn materials(&self) -> &ResourceCache<Material> {
        &self.materials
    }

    /// The visual cache.
    pub fn visuals(&self) -> &ResourceCache<Visual> {
        &self.visuals
    }

    /// The shared frame targets.
    pub fn frame_targets(&self) -> FrameTargets {
        self.frame
    }

    /// The vertex program of full-screen triangles.
    pub fn fullscreen_program(&self) -> ProgramId {
        self.fullscreen_program
    }

    pub(crate) fn overlay(&self) -> (ProgramId, PassStates) {
        (self.overlay_program, self.overlay_states)
    }

    /// What shader and filter compilation needs.
    pub fn compile_context(&self) -> CompileContext<'_> {
        CompileContext {
            device: self.device.as_ref(),
            screen_width: self.settings.screen_width,
            screen_height: self.settings.screen_height,
        }
    }

    /// Compiles a batch of shaders into the library.
    pub fn load_shaders(
        &self,
        descriptors: &[ShaderDescriptor],
    ) -> anyhow::Result<Vec<ResourceHandle<Shader>>> {
        self.library
            .load_shaders(&self.compile_context(), descriptors)
            .with_context(|| format!("failed to load {} shaders", descriptors.len()))
    }

    /// Compiles a batch of filters into the library.
    pub fn load_filters(
        &self,
        descriptors: &[FilterDescriptor],
    ) -> anyhow::Result<Vec<ResourceHandle<Filter>>> {
        self.library
            .load_filters(&self.compile_context(), descriptors)
            .with_context(|| format!("failed to load {} filters", descriptors.len()))
    }

    /// Waits for background loads, then destroys every shader, filter and
    /// frame target.
    pub fn release(&self) {
        self.pool.wait_idle();
        self.library.release_all(self.device.as_ref());
        self.materials.clear();
        self.visuals.clear();
        destroy_frame_targets(self.device.as_ref(), &self.frame);
    }
}

fn create_target(
    device: &dyn GraphicsDevice,
    label: &'static str,
    width: u32,
    height: u32,
    format: TextureFormat,
    usage: TextureUsage,
) -> Result<TextureId, ResourceError> {
    device.create_texture(&TextureDescriptor {
        label: Some(Cow::Borrowed(label)),
        width,
        height,
        format,
        mip_levels: 1,
        sample_count: 1,
        usage,
    })
}

fn create_frame_targets(
    device: &dyn GraphicsDevice,
    settings: &RendererSettings,
) -> Result<FrameTargets, ResourceError> {
    let (width, height) = (settings.screen_width, settings.screen_height);
    let mut textures = Vec::with_capacity(3);
    let result = (|| {
        let screen = create_target(
            device,
            "screen",
            width,
            height,
            TextureFormat::Rgba16Float,
            TextureUsage::RENDER_TARGET | TextureUsage::SHADER_RESOURCE | TextureUsage::UNORDERED_ACCESS,
        )?;
        textures.push(screen);
        let depth = create_target(
            device,
            "depthBuffer",
            width,
            height,
            TextureFormat::Depth32Float,
            TextureUsage::DEPTH_TARGET | TextureUsage::SHADER_RESOURCE,
        )?;
        textures.push(depth);
        let back_buffer = create_target(
            device,
            "back_buffer",
            width,
            height,
            TextureFormat::Rgba8Unorm,
            TextureUsage::RENDER_TARGET,
        )?;
        textures.push(back_buffer);
        let camera_constants = device.create_buffer(&BufferDescriptor {
            label: Some(Cow::Borrowed("camera_constants")),
            size: std::mem::size_of::<CameraConstants>() as u64,
            usage: BufferUsage::CONSTANT | BufferUsage::CPU_WRITE,
            stride: 0,
        })?;
        Ok(FrameTargets {
            screen,
            depth,
            back_buffer,
            width,
            height,
            camera_constants,
        })
    })();

    if result.is_err() {
        for id in textures {
            if let Err(e) = device.destroy_texture(id) {
                log::error!("RenderContext: failed to destroy {id:?}: {e}");
            }
        }
    }
    result
}

fn destroy_frame_targets(device: &dyn GraphicsDevice, frame: &FrameTargets) {
    for id in [frame.screen, frame.depth, frame.back_buffer] {
        if let Err(e) = device.destroy_texture(id) {
            log::error!("RenderContext: failed to destroy {id:?}: {e}");
        }
    }
    if let Err(e) = device.destroy_buffer(frame.camera_constants) {
        log::error!(
            "RenderContext: failed to destroy {:?}: {e}",
            frame.camera_constants
        );
    }
}

fn create_overlay_objects(
    device: &dyn GraphicsDevice,
) -> Result<(ProgramId, ProgramId, PassStates), ResourceError> {
    let fullscreen = device.create_program(&ProgramDescriptor {
        stage: PipelineStage::Vertex,
        entry: FULLSCREEN_PROGRAM.to_owned(),
    })?;
    let overlay = device.create_program(&ProgramDescriptor {
        stage: PipelineStage::Pixel,
        entry: OVERLAY_PROGRAM.to_owned(),
    })?;
    let states = PassStates {
        render: device.create_render_state(&RenderStateDescriptor {
            cull_mode: CullMode::None,
            ..Default::default()
        })?,
        depth: device.create_depth_state(&DepthStateDescriptor {
            enable: false,
            write: false,
            compare: CompareFunction::Always,
        })?,
        blend: device.create_blend_state(&BlendStateDescriptor::default())?,
    };
    Ok((fullscreen, overlay, states))
}
