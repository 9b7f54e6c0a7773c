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

use crate::renderer::api::*;

/// Records draw, dispatch and binding commands in program order.
///
/// One context records all the work of a frame on the frame thread, so the
/// trait carries no `Send` bound. Binding methods that take a list bind
/// `list.len()` consecutive slots starting at `first_slot`; `None` entries
/// unbind their slot.
pub trait DeviceContext {
    /// Binds a program to `stage`, or unbinds the stage with `None`.
    fn set_program(&mut self, stage: PipelineStage, program: Option<ProgramId>);

    /// Binds the vertex input layout.
    fn set_input_layout(&mut self, layout: Option<InputLayoutId>);

    /// Sets the primitive topology for subsequent draws.
    fn set_primitive_topology(&mut self, topology: PrimitiveTopology);

    /// Binds a vertex buffer to an input slot.
    fn set_vertex_buffer(&mut self, slot: u32, buffer: Option<BufferId>);

    /// Binds the index buffer.
    fn set_index_buffer(&mut self, buffer: Option<BufferId>, format: IndexFormat);

    /// Binds a rasterizer state; `None` restores the default.
    fn set_render_state(&mut self, state: Option<RenderStateId>);

    /// Binds a depth state; `None` restores the default.
    fn set_depth_state(&mut self, state: Option<DepthStateId>);

    /// Binds a blend state; `None` restores the default.
    fn set_blend_state(&mut self, state: Option<BlendStateId>);

    /// Binds color targets and an optional depth target. An empty list with
    /// no depth target unbinds all targets.
    fn set_render_target_list(&mut self, targets: &[TextureId], depth: Option<TextureId>);

    /// Sets the viewports, one per color target.
    fn set_viewport_list(&mut self, viewports: &[Viewport]);

    /// Binds constant buffers to `stage`.
    fn set_constant_buffer_list(
        &mut self,
        stage: PipelineStage,
        buffers: &[Option<BufferId>],
        first_slot: u32,
    );

    /// Binds shader resources to `stage`.
    fn set_resource_list(
        &mut self,
        stage: PipelineStage,
        resources: &[Option<ResourceView>],
        first_slot: u32,
    );

    /// Binds unordered-access resources.
    fn set_unordered_access_list(&mut self, resources: &[Option<ResourceView>], first_slot: u32);

    /// Binds sampler states to `stage`.
    fn set_sampler_state_list(
        &mut self,
        stage: PipelineStage,
        samplers: &[Option<SamplerId>],
        first_slot: u32,
    );

    /// Clears a color target.
    fn clear_render_target(&mut self, target: TextureId, color: [f32; 4]);

    /// Clears the planes of a depth-stencil target selected by `flags`.
    fn clear_depth_stencil_target(
        &mut self,
        target: TextureId,
        flags: ClearFlags,
        depth: f32,
        stencil: u8,
    );

    /// Clears an unordered-access resource.
    fn clear_unordered_access(&mut self, resource: ResourceView, value: [f32; 4]);

    /// Copies the whole of `source` into `destination`.
    fn copy_resource(&mut self, destination: ResourceView, source: ResourceView);

    /// Resolves a multisampled texture into a single-sampled one.
    fn resolve_resource(&mut self, destination: TextureId, source: TextureId);

    /// Rebuilds the mip chain of a texture from its top level.
    fn generate_mipmaps(&mut self, texture: TextureId);

    /// Draws non-indexed primitives.
    fn draw_primitive(&mut self, vertex_count: u32, first_vertex: u32);

    /// Draws indexed primitives.
    fn draw_indexed_primitive(&mut self, index_count: u32, first_index: u32, base_vertex: i32);

    /// Draws instanced, non-indexed primitives.
    fn draw_instanced_primitive(
        &mut self,
        vertex_count: u32,
        instance_count: u32,
        first_vertex: u32,
        first_instance: u32,
    );

    /// Dispatches compute work groups.
    fn dispatch(&mut self, x: u32, y: u32, z: u32);
}
