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

//! Defines the RenderAgent, the central orchestrator for the rendering subsystem.

use super::camera::{CameraQueue, CameraRequest};
use super::context::RenderContext;
use super::light_preparation::prepare_lights;
use crossbeam_channel::{Receiver, Sender};
use parking_lot::RwLock;
use rayon::prelude::*;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tessera_core::renderer::{
    CameraConstants, ClearFlags, DeviceContext, GraphicsDevice, LightGridConstants, PipelineStage,
    RenderError, RendererSettings, ResourceView, Viewport,
};
use tessera_data::{LightSnapshot, LightTracker};
use tessera_lanes::render_lane::{
    cluster_lights, CameraView, DrawBatches, DrawCollector, DrawProducer, DrawQueue,
    ExecutionStats, GpuLightBuffers, LightBuffer, PassExecutor, TileGrid,
};
use tessera_lanes::shader::Filter;

/// What one call to [`RenderAgent::on_update`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// The frame time handed to `on_update`.
    pub frame_time: Duration,
    /// Time spent inside `on_update`.
    pub cpu_time: Duration,
    /// Cameras rendered.
    pub cameras: usize,
    /// Cameras dropped as degenerate or because their constants failed to upload.
    pub skipped_cameras: usize,
    /// Draw calls accepted by the collectors.
    pub draw_calls_submitted: usize,
    /// Draw calls replayed by forward passes.
    pub draw_calls_executed: usize,
    /// Shader runs executed.
    pub runs: usize,
    /// Passes prepared, disabled ones excluded.
    pub passes: usize,
    /// Visual rebinds.
    pub visual_binds: usize,
    /// Material rebinds.
    pub material_binds: usize,
    /// Compute dispatches.
    pub dispatches: usize,
    /// Full-screen triangles, the overlay included.
    pub fullscreen_draws: usize,
    /// Times the light buffers were bound.
    pub light_binds: usize,
    /// Point lights that survived culling, summed over cameras.
    pub visible_point_lights: usize,
    /// Spot lights that survived culling, summed over cameras.
    pub visible_spot_lights: usize,
    /// Cameras whose light preparation or upload failed.
    pub lighting_failures: usize,
}

impl FrameStats {
    fn record(&mut self, execution: ExecutionStats) {
        self.passes += execution.passes;
        self.draw_calls_executed += execution.draws;
        self.fullscreen_draws += execution.fullscreen_draws;
        self.visual_binds += execution.visual_binds;
        self.material_binds += execution.material_binds;
        self.dispatches += execution.dispatches;
        self.light_binds += execution.light_binds;
    }
}

/// The agent responsible for turning queued cameras into recorded GPU work.
///
/// Cameras are processed strictly one after the other, in the order they
/// were queued: every draw call of a camera is collected, sorted and executed
/// before the next camera starts.
pub struct RenderAgent {
    // Device, pool, caches and the engine's own GPU objects.
    context: RenderContext,
    // Camera FIFO. The sender half is cloned into every `CameraQueue`.
    camera_sender: Sender<CameraRequest>,
    camera_receiver: Receiver<CameraRequest>,
    // Broadcast once per camera, in parallel on the pool.
    producers: RwLock<Vec<Arc<dyn DrawProducer>>>,
    // Fed by the scene's population signals.
    lights: Arc<RwLock<LightTracker>>,
    // Per-tile light lists, rebuilt for every lit camera.
    tile_grid: TileGrid,
    light_buffers: GpuLightBuffers,
    // Filled by the producers, drained once per camera.
    draw_queue: DrawQueue,
    frame_count: u64,
    is_shut_down: bool,
}

impl RenderAgent {
    /// Creates the agent and its [`RenderContext`].
    pub fn new(device: Arc<dyn GraphicsDevice>, settings: RendererSettings) -> anyhow::Result<Self> {
        let tile_grid = TileGrid::new(settings.tile_grid);
        let context = RenderContext::new(device, settings)?;
        let (camera_sender, camera_receiver) = crossbeam_channel::unbounded();
        Ok(Self {
            context,
            camera_sender,
            camera_receiver,
            producers: RwLock::new(Vec::new()),
            lights: Arc::new(RwLock::new(LightTracker::new())),
            tile_grid,
            light_buffers: GpuLightBuffers::new(),
            draw_queue: DrawQueue::new(),
            frame_count: 0,
            is_shut_down: false,
        })
    }

    /// The rendering state: device, pool, shader library and caches.
    pub fn context(&self) -> &RenderContext {
        &self.context
    }

    /// Queues a camera for the next frame.
    ///
    /// Returns `false` after [`RenderAgent::shutdown`].
    pub fn queue_camera(&self, request: CameraRequest) -> bool {
        if self.is_shut_down {
            log::warn!("RenderAgent: camera queued after shutdown, ignoring it");
            return false;
        }
        self.camera_sender.send(request).is_ok()
    }

    /// A handle for queueing cameras from other threads.
    pub fn camera_queue(&self) -> CameraQueue {
        CameraQueue::new(self.camera_sender.clone())
    }

    /// Number of cameras waiting for the next frame.
    pub fn pending_cameras(&self) -> usize {
        self.camera_receiver.len()
    }

    /// Adds a producer to the per-camera broadcast.
    pub fn register_producer(&self, producer: Arc<dyn DrawProducer>) {
        log::debug!("RenderAgent: registered draw producer '{}'", producer.name());
        self.producers.write().push(producer);
    }

    /// Removes every producer called `name`. Returns `true` if one was removed.
    pub fn unregister_producer(&self, name: &str) -> bool {
        let mut producers = self.producers.write();
        let before = producers.len();
        producers.retain(|p| p.name() != name);
        producers.len() != before
    }

    /// The light tracker the population signals must be routed to.
    pub fn light_tracker(&self) -> Arc<RwLock<LightTracker>> {
        self.lights.clone()
    }

    /// Number of frames rendered so far.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Renders every queued camera on `ctx`, then composites the result onto
    /// the back buffer.
    pub fn on_update(&mut self, frame_time: Duration, ctx: &mut dyn DeviceContext) -> FrameStats {
        let mut stats = FrameStats {
            frame_time,
            ..Default::default()
        };
        if self.is_shut_down {
            return stats;
        }
        let start = Instant::now();

        let snapshot = Arc::new(self.lights.read().snapshot());
        let filters = self.resolve_filters();
        let requests: Vec<CameraRequest> = self.camera_receiver.try_iter().collect();
        for request in &requests {
            self.render_camera(request, &snapshot, &filters, ctx, &mut stats);
        }
        self.render_overlay(ctx, stats.cameras > 0, &mut stats);

        self.frame_count += 1;
        stats.cpu_time = start.elapsed();
        log::trace!("RenderAgent: frame {} {:?}", self.frame_count, stats);
        stats
    }

    /// Stops pulling camera requests, waits for in-flight loads and destroys
    /// every GPU object the agent owns. Later calls do nothing.
    pub fn shutdown(&mut self) {
        if self.is_shut_down {
            return;
        }
        self.is_shut_down = true;
        let dropped = self.camera_receiver.try_iter().count();
        if dropped > 0 {
            log::debug!("RenderAgent: dropped {dropped} cameras queued before shutdown");
        }
        self.producers.write().clear();
        self.light_buffers.release(self.context.device().as_ref());
        self.context.release();
        log::info!("RenderAgent: shut down after {} frames", self.frame_count);
    }

    // Filters are looked up once per frame, so a missing one warns once.
    fn resolve_filters(&self) -> Vec<Arc<Filter>> {
        let library = self.context.library();
        self.context
            .settings()
            .filters
            .iter()
            .filter_map(|name| {
                let filter = library.filter_by_name(name);
                if filter.is_none() {
                    log::warn!("RenderAgent: filter '{name}' is not loaded, skipping it");
                }
                filter
            })
            .collect()
    }

    fn render_camera(
        &mut self,
        request: &CameraRequest,
        snapshot: &Arc<LightSnapshot>,
        filters: &[Arc<Filter>],
        ctx: &mut dyn DeviceContext,
        stats: &mut FrameStats,
    ) {
        let Some(camera) = request.resolve() else {
            log::warn!(
                "RenderAgent: skipping degenerate camera (near {}, far {})",
                request.near,
                request.far
            );
            stats.skipped_cameras += 1;
            return;
        };

        let context = &self.context;
        let library = context.library();
        let force_shader = request.force_shader.as_deref().and_then(|name| {
            let handle = library.shader_handle(name);
            if handle.is_none() {
                log::warn!("RenderAgent: force shader '{name}' is not loaded, using material shaders");
            }
            handle
        });

        let mut frame = context.frame_targets();
        if let Some(target) = request.target {
            frame.screen = target;
        }

        let constants = CameraConstants::new(
            &camera.view,
            &camera.projection,
            camera.near,
            camera.far,
            frame.width,
            frame.height,
        );
        if let Err(e) =
            context
                .device()
                .write_buffer(frame.camera_constants, 0, bytemuck::bytes_of(&constants))
        {
            log::error!("RenderAgent: failed to upload camera constants, skipping camera: {e}");
            stats.skipped_cameras += 1;
            return;
        }

        ctx.clear_render_target(frame.screen, context.settings().background_color);
        ctx.clear_depth_stencil_target(frame.depth, ClearFlags::DEPTH, 1.0, 0);

        // Gather.
        let producers = self.producers.read().clone();
        let collector = DrawCollector::new(
            &self.draw_queue,
            library.shaders(),
            context.materials(),
            context.visuals(),
            force_shader,
        );
        context.pool().install(|| {
            producers
                .par_iter()
                .for_each(|producer| producer.produce(&camera, &collector))
        });
        let calls = self.draw_queue.drain();
        stats.draw_calls_submitted += calls.len();

        let batches = DrawBatches::build(context.pool(), calls, library.shaders());
        stats.runs += batches.run_count();

        let lights = if batches.has_lighting() {
            match upload_lighting(
                context,
                &mut self.tile_grid,
                &mut self.light_buffers,
                &camera,
                snapshot,
            ) {
                Ok((point, spot)) => {
                    stats.visible_point_lights += point;
                    stats.visible_spot_lights += spot;
                    Some(&self.light_buffers)
                }
                Err(e) => {
                    log::error!("RenderAgent: lighting disabled for this camera: {e}");
                    stats.lighting_failures += 1;
                    None
                }
            }
        } else {
            None
        };

        let mut executor = PassExecutor::new(&mut *ctx, frame, context.fullscreen_program());
        executor.bind_camera();
        for run in batches.runs() {
            executor.run_shader(
                run,
                batches.calls(run),
                context.visuals(),
                context.materials(),
                lights,
            );
        }
        for filter in filters {
            executor.run_filter(filter);
        }
        stats.record(executor.stats());
        stats.cameras += 1;
    }

    fn render_overlay(&self, ctx: &mut dyn DeviceContext, rendered: bool, stats: &mut FrameStats) {
        let frame = self.context.frame_targets();
        let background = self.context.settings().background_color;
        if !rendered {
            ctx.clear_render_target(frame.screen, background);
            ctx.clear_render_target(frame.back_buffer, background);
        }

        let (program, states) = self.context.overlay();
        ctx.set_render_state(Some(states.render));
        ctx.set_depth_state(Some(states.depth));
        ctx.set_blend_state(Some(states.blend));
        ctx.set_render_target_list(&[frame.back_buffer], None);
        ctx.set_viewport_list(&[Viewport::from_size(frame.width, frame.height)]);
        ctx.set_program(PipelineStage::Pixel, Some(program));
        ctx.set_resource_list(
            PipelineStage::Pixel,
            &[Some(ResourceView::Texture(frame.screen))],
            0,
        );

        let mut executor = PassExecutor::new(&mut *ctx, frame, self.context.fullscreen_program());
        executor.draw_fullscreen();
        stats.record(executor.stats());

        ctx.set_resource_list(PipelineStage::Pixel, &[None], 0);
        ctx.set_render_target_list(&[], None);
    }
}

impl Drop for RenderAgent {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Prepares, clusters and uploads the lights of one camera.
///
/// Returns the visible point and spot light counts.
fn upload_lighting(
    context: &RenderContext,
    grid: &mut TileGrid,
    buffers: &mut GpuLightBuffers,
    camera: &CameraView,
    snapshot: &Arc<LightSnapshot>,
) -> Result<(usize, usize), RenderError> {
    let pool = context.pool();
    let lights = prepare_lights(pool, snapshot.clone(), camera)?;
    let cluster = cluster_lights(
        pool,
        grid,
        camera,
        &lights.point_bounds(),
        &lights.spot_bounds(),
    );
    let flattened = LightBuffer::build(grid);
    let constants = LightGridConstants::new(
        grid.config(),
        camera.near,
        camera.far,
        lights.directional.len(),
        lights.point.len(),
        lights.spot.len(),
    );
    buffers.upload(context.device().as_ref(), &lights, &flattened, &constants)?;
    log::trace!(
        "RenderAgent: {} lights, {} of {} tested tiles lit",
        lights.len(),
        cluster.appended,
        cluster.tested
    );
    Ok((lights.point.len(), lights.spot.len()))
}
