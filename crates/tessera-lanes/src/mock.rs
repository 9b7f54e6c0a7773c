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

//! Test doubles for the device and context traits.

use crate::render_lane::{DrawCollector, DrawQueue, FrameTargets};
use crate::shader::{
    CompileContext, Material, PassDescriptor, PassMode, Shader, ShaderDescriptor, ShaderLibrary,
    Visual,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use parking_lot::Mutex;
use std::sync::Arc;
use tessera_core::asset::ResourceHandle;
use tessera_core::renderer::*;
use tessera_core::tasks::TaskPool;
use tessera_data::ResourceCache;

/// Routes `log` output to the test harness.
pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A mock graphics device that produces unique ids and records buffer traffic.
#[derive(Debug)]
pub struct MockGraphicsDevice {
    next_id: AtomicUsize,
    pub created_buffers: Mutex<Vec<(Option<String>, u64)>>,
    pub destroyed_buffers: Mutex<Vec<BufferId>>,
    pub created_textures: Mutex<Vec<(u32, u32)>>,
    pub destroyed_textures: Mutex<Vec<TextureId>>,
    pub fail_writes: AtomicBool,
    pub fail_textures: AtomicBool,
}

impl MockGraphicsDevice {
    pub fn new() -> Self {
        Self {
            next_id: AtomicUsize::new(1),
            created_buffers: Mutex::new(Vec::new()),
            destroyed_buffers: Mutex::new(Vec::new()),
            created_textures: Mutex::new(Vec::new()),
            destroyed_textures: Mutex::new(Vec::new()),
            fail_writes: AtomicBool::new(false),
            fail_textures: AtomicBool::new(false),
        }
    }

    fn next(&self) -> usize {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }
}

impl GraphicsDevice for MockGraphicsDevice {
    fn create_buffer(&self, descriptor: &BufferDescriptor) -> Result<BufferId, ResourceError> {
        self.created_buffers.lock().push((
            descriptor.label.as_ref().map(|l| l.to_string()),
            descriptor.size,
        ));
        Ok(BufferId(self.next()))
    }

    fn destroy_buffer(&self, id: BufferId) -> Result<(), ResourceError> {
        self.destroyed_buffers.lock().push(id);
        Ok(())
    }

    fn write_buffer(&self, _id: BufferId, _offset: u64, _data: &[u8]) -> Result<(), ResourceError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(ResourceError::BackendError("map failed".into()))
        } else {
            Ok(())
        }
    }

    fn create_texture(&self, descriptor: &TextureDescriptor) -> Result<TextureId, ResourceError> {
        if self.fail_textures.load(Ordering::SeqCst) {
            return Err(ResourceError::OutOfMemory);
        }
        self.created_textures
            .lock()
            .push((descriptor.width, descriptor.height));
        Ok(TextureId(self.next()))
    }

    fn destroy_texture(&self, id: TextureId) -> Result<(), ResourceError> {
        self.destroyed_textures.lock().push(id);
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
    VertexBuffer(u32, Option<BufferId>),
    RenderTargets(Vec<TextureId>, Option<TextureId>),
    Resources(PipelineStage, Vec<Option<ResourceView>>, u32),
    UnorderedAccess(Vec<Option<ResourceView>>, u32),
    ConstantBuffers(PipelineStage, Vec<Option<BufferId>>, u32),
    ClearTarget(TextureId, [f32; 4]),
    ClearDepth(TextureId, f32),
    ClearUnorderedAccess(ResourceView),
    Copy(ResourceView, ResourceView),
    Resolve(TextureId, TextureId),
    Mipmaps(TextureId),
    Draw(u32, u32),
    DrawIndexed(u32, u32, i32),
    DrawInstanced(u32, u32),
    Dispatch(u32, u32, u32),
    State,
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
        self.calls.push(Call::State);
    }
    fn set_vertex_buffer(&mut self, slot: u32, buffer: Option<BufferId>) {
        self.calls.push(Call::VertexBuffer(slot, buffer));
    }
    fn set_index_buffer(&mut self, _buffer: Option<BufferId>, _format: IndexFormat) {
        self.calls.push(Call::State);
    }
    fn set_render_state(&mut self, _state: Option<RenderStateId>) {
        self.calls.push(Call::State);
    }
    fn set_depth_state(&mut self, _state: Option<DepthStateId>) {
        self.calls.push(Call::State);
    }
    fn set_blend_state(&mut self, _state: Option<BlendStateId>) {
        self.calls.push(Call::State);
    }
    fn set_render_target_list(&mut self, targets: &[TextureId], depth: Option<TextureId>) {
        self.calls.push(Call::RenderTargets(targets.to_vec(), depth));
    }
    fn set_viewport_list(&mut self, _viewports: &[Viewport]) {
        self.calls.push(Call::State);
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
    fn set_unordered_access_list(&mut self, resources: &[Option<ResourceView>], first_slot: u32) {
        self.calls
            .push(Call::UnorderedAccess(resources.to_vec(), first_slot));
    }
    fn set_sampler_state_list(
        &mut self,
        _stage: PipelineStage,
        _samplers: &[Option<SamplerId>],
        _first_slot: u32,
    ) {
        self.calls.push(Call::State);
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
    fn clear_unordered_access(&mut self, resource: ResourceView, _value: [f32; 4]) {
        self.calls.push(Call::ClearUnorderedAccess(resource));
    }
    fn copy_resource(&mut self, destination: ResourceView, source: ResourceView) {
        self.calls.push(Call::Copy(destination, source));
    }
    fn resolve_resource(&mut self, destination: TextureId, source: TextureId) {
        self.calls.push(Call::Resolve(destination, source));
    }
    fn generate_mipmaps(&mut self, texture: TextureId) {
        self.calls.push(Call::Mipmaps(texture));
    }
    fn draw_primitive(&mut self, vertex_count: u32, first_vertex: u32) {
        self.calls.push(Call::Draw(vertex_count, first_vertex));
    }
    fn draw_indexed_primitive(&mut self, index_count: u32, first_index: u32, base_vertex: i32) {
        self.calls
            .push(Call::DrawIndexed(index_count, first_index, base_vertex));
    }
    fn draw_instanced_primitive(
        &mut self,
        vertex_count: u32,
        instance_count: u32,
        _first_vertex: u32,
        _first_instance: u32,
    ) {
        self.calls
            .push(Call::DrawInstanced(vertex_count, instance_count));
    }
    fn dispatch(&mut self, x: u32, y: u32, z: u32) {
        self.calls.push(Call::Dispatch(x, y, z));
    }
}

/// Shaders, materials and visuals loaded against a [`MockGraphicsDevice`].
pub struct TestScene {
    pub device: MockGraphicsDevice,
    pub pool: Arc<TaskPool>,
    pub library: ShaderLibrary,
    pub materials: ResourceCache<Material>,
    pub visuals: ResourceCache<Visual>,
    pub queue: DrawQueue,
}

impl TestScene {
    /// A scene with one single-pass forward shader per name.
    pub fn new(shaders: &[&str]) -> Self {
        let descriptors: Vec<ShaderDescriptor> =
            shaders.iter().map(|name| forward_shader(name)).collect();
        Self::with_shaders(&descriptors)
    }

    pub fn with_shaders(descriptors: &[ShaderDescriptor]) -> Self {
        init_logger();
        let device = MockGraphicsDevice::new();
        let pool = Arc::new(TaskPool::new(2).unwrap());
        let library = ShaderLibrary::new(pool.clone());
        let ctx = CompileContext {
            device: &device,
            screen_width: 64,
            screen_height: 64,
        };
        library.load_shaders(&ctx, descriptors).unwrap();
        Self {
            materials: ResourceCache::new("Material", pool.clone()),
            visuals: ResourceCache::new("Visual", pool.clone()),
            device,
            pool,
            library,
            queue: DrawQueue::new(),
        }
    }

    pub fn visual(&self, key: u64) -> ResourceHandle<Visual> {
        let visual = Visual::create(&self.device, "vs", None).unwrap();
        self.visuals.insert(key, visual)
    }

    pub fn material(&self, shader: &str, key: u64) -> ResourceHandle<Material> {
        let shader = self.library.shader_handle(shader).unwrap();
        self.materials.insert(key, Material::new(shader))
    }

    pub fn collector(&self, force_shader: Option<ResourceHandle<Shader>>) -> DrawCollector<'_> {
        DrawCollector::new(
            &self.queue,
            self.library.shaders(),
            &self.materials,
            &self.visuals,
            force_shader,
        )
    }
}

pub fn forward_shader(name: &str) -> ShaderDescriptor {
    ShaderDescriptor {
        name: name.into(),
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

pub fn frame() -> FrameTargets {
    FrameTargets {
        screen: TextureId(1000),
        depth: TextureId(1001),
        back_buffer: TextureId(1002),
        width: 64,
        height: 64,
        camera_constants: BufferId(1003),
    }
}
