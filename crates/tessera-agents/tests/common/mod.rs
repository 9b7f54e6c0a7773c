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

//! Shared fixtures for the render agent integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tessera_agents::{CameraRequest, RenderAgent};
use tessera_core::asset::ResourceHandle;
use tessera_core::math::{LinearRgba, Mat4, Vec3, FRAC_PI_2};
use tessera_core::renderer::light::{LightType, PointLight};
use tessera_core::renderer::*;
use tessera_data::{Component, EntityId};
use tessera_lanes::render_lane::{CameraView, DrawCollector, DrawProducer};
use tessera_lanes::shader::{Material, PassDescriptor, PassMode, ShaderDescriptor, Visual};

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A device handing out sequential ids and recording buffer traffic by label.
#[derive(Debug, Default)]
pub struct MockDevice {
    next_id: AtomicUsize,
    pub buffer_labels: Mutex<HashMap<BufferId, String>>,
    pub texture_labels: Mutex<HashMap<TextureId, String>>,
    pub writes: Mutex<Vec<(BufferId, Vec<u8>)>>,
    pub destroyed_buffers: Mutex<Vec<BufferId>>,
    pub destroyed_textures: Mutex<Vec<TextureId>>,
    // Writes to buffers with this label fail while the counter is non-zero.
    failing: Mutex<Option<(String, usize)>>,
}

impl MockDevice {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            next_id: AtomicUsize::new(1),
            ..Default::default()
        })
    }

    fn next(&self) -> usize {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Makes the next `times` writes to buffers labelled `label` fail.
    pub fn fail_writes_to(&self, label: &str, times: usize) {
        *self.failing.lock().unwrap() = Some((label.to_owned(), times));
    }

    /// Every buffer ever created under `label`, in creation order.
    pub fn buffers_labelled(&self, label: &str) -> Vec<BufferId> {
        let mut ids: Vec<BufferId> = self
            .buffer_labels
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, l)| l.as_str() == label)
            .map(|(id, _)| *id)
            .collect();
        ids.sort_unstable_by_key(|id| id.0);
        ids
    }

    pub fn texture_labelled(&self, label: &str) -> Option<TextureId> {
        self.texture_labels
            .lock()
            .unwrap()
            .iter()
            .find(|(_, l)| l.as_str() == label)
            .map(|(id, _)| *id)
    }

    /// The payloads successfully written to buffers labelled `label`.
    pub fn writes_to(&self, label: &str) -> Vec<Vec<u8>> {
        let ids = self.buffers_labelled(label);
        self.writes
            .lock()
            .unwrap()
            .iter()
            .filter(|(id, _)| ids.contains(id))
            .map(|(_, data)| data.clone())
            .collect()
    }
}

impl GraphicsDevice for MockDevice {
    fn create_buffer(&self, descriptor: &BufferDescriptor) -> Result<BufferId, ResourceError> {
        let id = BufferId(self.next());
        let label = descriptor.label.as_deref().unwrap_or_default().to_owned();
        self.buffer_labels.lock().unwrap().insert(id, label);
        Ok(id)
    }

    fn destroy_buffer(&self, id: BufferId) -> Result<(), ResourceError> {
        self.destroyed_buffers.lock().unwrap().push(id);
        Ok(())
    }

    fn write_buffer(&self, id: BufferId, _offset: u64, data: &[u8]) -> Result<(), ResourceError> {
        let label = self.buffer_labels.lock().unwrap().get(&id).cloned();
        if let Some((failing, left)) = self.failing.lock().unwrap().as_mut() {
            if *left > 0 && label.as_deref() == Some(failing.as_str()) {
                *left -= 1;
                return Err(ResourceError::BackendError("map failed".into()));
            }
        }
        self.writes.lock().unwrap().push((id, data.to_vec()));
        Ok(())
    }

    fn create_texture(&self, descriptor: &TextureDescriptor) -> Result<TextureId, ResourceError> {
        let id = TextureId(self.next());
        let label = descriptor.label.as_deref().unwrap_or_default().to_owned();
        self.texture_labels.lock().unwrap().insert(id, label);
        Ok(id)
    }

    fn destroy_texture(&self, id: TextureId) -> Result<(), ResourceError> {
        self.destroyed_textures.lock().unwrap().push(id);
        Ok(())
    }

    fn create_sampler_state(&self, _d: &SamplerDescriptor) -> Result<SamplerId, ResourceError> {
        Ok(SamplerId(self.next()))
    }

    fn create_render_state(
        &self,
        _d: &RenderStateDescriptor,
    ) -> Result<RenderStateId, ResourceError> {
        Ok(RenderStateId(self.next()))
    }

    fn create_depth_state(&self, _d: &DepthStateDescriptor) -> Result<DepthStateId, ResourceError> {
        Ok(DepthStateId(self.next()))
    }

    fn create_blend_state(&self, _d: &BlendStateDescriptor) -> Result<BlendStateId, ResourceError> {
        Ok(BlendStateId(self.next()))
    }

    fn create_program(&self, _d: &ProgramDescriptor) -> Result<ProgramId, ResourceError> {
        Ok(ProgramId(self.next()))
    }

    fn create_input_layout(
        &self,
        _d: &InputLayoutDescriptor,
    ) -> Result<InputLayoutId, ResourceError> {
        Ok(InputLayoutId(self.next()))
    }
}

/// A context call, as recorded by [`RecordingContext`].
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Program(PipelineStage, Option<ProgramId>),
    InputLayout(Option<InputLayoutId>),
    RenderTargets(Vec<TextureId>, Option<TextureId>),
    Resources(PipelineStage, Vec<Option<ResourceView>>, u32),
    ConstantBuffers(PipelineStage, Vec<Option<BufferId>>, u32),
    ClearTarget(TextureId, [f32; 4]),
    ClearDepth(TextureId, f32),
    Draw(u32, u32),
    Dispatch(u32, u32, u32),
    Other,
}

/// A context that records every command it receives.
#[derive(Debug, Default)]
pub struct RecordingContext {
    pub calls: Vec<Call>,
}

impl RecordingContext {
    pub fn count(&self, matches: impl Fn(&Call) -> bool) -> usize {
        self.calls.iter().filter(|c| matches(c)).count()
    }
}

impl DeviceContext for RecordingContext {
    fn set_program(&mut self, stage: PipelineStage, program: Option<ProgramId>) {
        self.calls.push(Call::Program(stage, program));
    }
    fn set_input_layout(&mut self, layout: Option<InputLayoutId>) {
        self.calls.push(Call::InputLayout(layout));
    }
    fn set_primitive_topology(&mut self, _topology: PrimitiveTopology) {
        self.calls.push(Call::Other);
    }
    fn set_vertex_buffer(&mut self, _slot: u32, _buffer: Option<BufferId>) {
        self.calls.push(Call::Other);
    }
    fn set_index_buffer(&mut self, _buffer: Option<BufferId>, _format: IndexFormat) {
        self.calls.push(Call::Other);
    }
    fn set_render_state(&mut self, _state: Option<RenderStateId>) {
        self.calls.push(Call::Other);
    }
    fn set_depth_state(&mut self, _state: Option<DepthStateId>) {
        self.calls.push(Call::Other);
    }
    fn set_blend_state(&mut self, _state: Option<BlendStateId>) {
        self.calls.push(Call::Other);
    }
    fn set_render_target_list(&mut self, targets: &[TextureId], depth: Option<TextureId>) {
        self.calls.push(Call::RenderTargets(targets.to_vec(), depth));
    }
    fn set_viewport_list(&mut self, _viewports: &[Viewport]) {
        self.calls.push(Call::Other);
    }
    fn set_constant_buffer_list(
        &mut self,
        stage: PipelineStage,
        buffers: &[Option<BufferId>],
        first_slot: u32,
    ) {
        self.calls
            .push(Call::ConstantBuffers(stage, buffers.to_vec(), first_slot));
    }
    fn set_resource_list(
        &mut self,
        stage: PipelineStage,
        resources: &[Option<ResourceView>],
        first_slot: u32,
    ) {
        self.calls
            .push(Call::Resources(stage, resources.to_vec(), first_slot));
    }
    fn set_unordered_access_list(&mut self, _resources: &[Option<ResourceView>], _first_slot: u32) {
        self.calls.push(Call::Other);
    }
    fn set_sampler_state_list(
        &mut self,
        _stage: PipelineStage,
        _samplers: &[Option<SamplerId>],
        _first_slot: u32,
    ) {
        self.calls.push(Call::Other);
    }
    fn clear_render_target(&mut self, target: TextureId, color: [f32; 4]) {
        self.calls.push(Call::ClearTarget(target, color));
    }
    fn clear_depth_stencil_target(
        &mut self,
        target: TextureId,
        _flags: ClearFlags,
        depth: f32,
        _stencil: u8,
    ) {
        self.calls.push(Call::ClearDepth(target, depth));
    }
    fn clear_unordered_access(&mut self, _resource: ResourceView, _value: [f32; 4]) {
        self.calls.push(Call::Other);
    }
    fn copy_resource(&mut self, _destination: ResourceView, _source: ResourceView) {
        self.calls.push(Call::Other);
    }
    fn resolve_resource(&mut self, _destination: TextureId, _source: TextureId) {
        self.calls.push(Call::Other);
    }
    fn generate_mipmaps(&mut self, _texture: TextureId) {
        self.calls.push(Call::Other);
    }
    fn draw_primitive(&mut self, vertex_count: u32, first_vertex: u32) {
        self.calls.push(Call::Draw(vertex_count, first_vertex));
    }
    fn draw_indexed_primitive(&mut self, index_count: u32, first_index: u32, _base_vertex: i32) {
        self.calls.push(Call::Draw(index_count, first_index));
    }
    fn draw_instanced_primitive(
        &mut self,
        vertex_count: u32,
        _instance_count: u32,
        first_vertex: u32,
        _first_instance: u32,
    ) {
        self.calls.push(Call::Draw(vertex_count, first_vertex));
    }
    fn dispatch(&mut self, x: u32, y: u32, z: u32) {
        self.calls.push(Call::Dispatch(x, y, z));
    }
}

pub const BACKGROUND: [f32; 4] = [0.1, 0.2, 0.3, 1.0];

/// A 4x4x4 linear grid on a 64x64 screen.
pub fn settings() -> RendererSettings {
    RendererSettings {
        tile_grid: TileGridConfig::new(4, 4, 4),
        worker_threads: 2,
        screen_width: 64,
        screen_height: 64,
        background_color: BACKGROUND,
        filters: Vec::new(),
    }
}

pub fn agent(device: &Arc<MockDevice>) -> RenderAgent {
    let device: Arc<dyn GraphicsDevice> = device.clone();
    RenderAgent::new(device, settings()).unwrap()
}

/// A 90 degree square camera at the origin looking down -Z, clipping at 1 and 9.
pub fn camera() -> CameraRequest {
    CameraRequest::perspective(Mat4::IDENTITY, FRAC_PI_2, 1.0, 1.0, 9.0)
}

pub fn shader(name: &str, lighting: bool) -> ShaderDescriptor {
    ShaderDescriptor {
        name: name.into(),
        lighting,
        passes: vec![PassDescriptor::new(PassMode::Forward, format!("{name}_ps"))],
        ..Default::default()
    }
}

pub fn draw(vertex_count: u32) -> DrawCommand {
    DrawCommand::Primitive {
        vertex_buffer: None,
        vertex_count,
        first_vertex: 0,
    }
}

pub fn visual(agent: &RenderAgent, key: u64) -> ResourceHandle<Visual> {
    let context = agent.context();
    let visual = Visual::create(context.device().as_ref(), "vs", None).unwrap();
    context.visuals().insert(key, visual)
}

pub fn material(agent: &RenderAgent, shader: &str, key: u64) -> ResourceHandle<Material> {
    let context = agent.context();
    let shader = context.library().shader_handle(shader).unwrap();
    context.materials().insert(key, Material::new(shader))
}

/// Submits a fixed list of draw calls for every camera.
pub struct FixedProducer {
    pub calls: Vec<(ResourceHandle<Visual>, ResourceHandle<Material>, DrawCommand)>,
}

impl DrawProducer for FixedProducer {
    fn name(&self) -> &str {
        "fixed"
    }

    fn produce(&self, _camera: &CameraView, collector: &DrawCollector<'_>) {
        for (visual, material, command) in &self.calls {
            collector.queue_draw_call(*visual, *material, *command);
        }
    }
}

/// Reports a white point light of range `range` at `position`.
pub fn add_point_light(agent: &RenderAgent, id: u64, position: Vec3, range: f32) {
    let tracker = agent.light_tracker();
    let mut tracker = tracker.write();
    let entity = EntityId(id);
    tracker.on_entity_created(entity);
    tracker.on_component_added(entity, Component::Transform(Mat4::from_translation(position)));
    tracker.on_component_added(entity, Component::Color(LinearRgba::WHITE));
    tracker.on_component_added(
        entity,
        Component::Light(LightType::Point(PointLight {
            intensity: 1.0,
            radius: 0.1,
            range,
        })),
    );
}

pub fn decode_u32s(bytes: &[u8]) -> Vec<u32> {
    bytes
        .chunks_exact(4)
        .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}
