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
use crate::renderer::error::ResourceError;
use std::fmt::Debug;

/// Creates, writes and destroys GPU objects.
///
/// The device is shared between worker threads: resource loaders create
/// objects from the pool while the frame thread writes light buffers. All
/// recording of draw and dispatch work goes through a
/// [`DeviceContext`](super::DeviceContext) instead.
pub trait GraphicsDevice: Send + Sync + Debug + 'static {
    /// Creates a new GPU buffer.
    /// ## Arguments
    /// * `descriptor` - The buffer configuration.
    /// ## Returns
    /// The ID of the created buffer.
    /// ## Errors
    /// * `ResourceError` - If the buffer cannot be allocated.
    fn create_buffer(&self, descriptor: &BufferDescriptor) -> Result<BufferId, ResourceError>;

    /// Destroys a GPU buffer.
    /// ## Arguments
    /// * `id` - The ID of the buffer to be destroyed.
    fn destroy_buffer(&self, id: BufferId) -> Result<(), ResourceError>;

    /// Writes data to a GPU buffer.
    ///
    /// Stands for the map, copy, unmap sequence of the backend. A failure
    /// leaves the previous contents in place.
    /// ## Arguments
    /// * `id` - The ID of the buffer to write to.
    /// * `offset` - Byte offset of the write.
    /// * `data` - The bytes to write.
    /// ## Errors
    /// * `ResourceError` - If the buffer cannot be mapped or the write is out of bounds.
    fn write_buffer(&self, id: BufferId, offset: u64, data: &[u8]) -> Result<(), ResourceError>;

    /// Creates a new GPU texture.
    /// ## Arguments
    /// * `descriptor` - The texture configuration.
    /// ## Returns
    /// The ID of the created texture.
    fn create_texture(&self, descriptor: &TextureDescriptor) -> Result<TextureId, ResourceError>;

    /// Destroys a GPU texture.
    fn destroy_texture(&self, id: TextureId) -> Result<(), ResourceError>;

    /// Creates a sampler state object.
    fn create_sampler_state(
        &self,
        descriptor: &SamplerDescriptor,
    ) -> Result<SamplerId, ResourceError>;

    /// Creates a rasterizer state object.
    fn create_render_state(
        &self,
        descriptor: &RenderStateDescriptor,
    ) -> Result<RenderStateId, ResourceError>;

    /// Creates a depth state object.
    fn create_depth_state(
        &self,
        descriptor: &DepthStateDescriptor,
    ) -> Result<DepthStateId, ResourceError>;

    /// Creates a blend state object.
    fn create_blend_state(
        &self,
        descriptor: &BlendStateDescriptor,
    ) -> Result<BlendStateId, ResourceError>;

    /// Compiles a program for one pipeline stage.
    /// ## Arguments
    /// * `descriptor` - The stage and the entry point to compile.
    /// ## Errors
    /// * `ResourceError` - If the entry point is unknown or compilation fails.
    fn create_program(&self, descriptor: &ProgramDescriptor) -> Result<ProgramId, ResourceError>;

    /// Creates a vertex input layout.
    fn create_input_layout(
        &self,
        descriptor: &InputLayoutDescriptor,
    ) -> Result<InputLayoutId, ResourceError>;
}
