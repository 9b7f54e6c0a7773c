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

//! Draw commands recorded by draw producers and replayed by forward passes.

use super::pipeline::IndexFormat;
use super::resource::BufferId;
use crate::renderer::traits::DeviceContext;
use bitflags::bitflags;

bitflags! {
    /// Which planes of a depth-stencil target to clear.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ClearFlags: u32 {
        /// Clear the depth plane.
        const DEPTH = 1 << 0;
        /// Clear the stencil plane.
        const STENCIL = 1 << 1;
    }
}

/// A geometry draw, recorded once and replayed by every forward pass of the
/// shader it was batched under.
///
/// The visual (vertex program, input layout) and the material resources are
/// bound by the pass executor before the command runs; the command itself only
/// binds its geometry buffers and issues the draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawCommand {
    /// A non-indexed draw.
    Primitive {
        /// The vertex buffer, or `None` for vertex-pulling programs.
        vertex_buffer: Option<BufferId>,
        /// Number of vertices.
        vertex_count: u32,
        /// First vertex.
        first_vertex: u32,
    },
    /// An indexed draw.
    Indexed {
        /// The vertex buffer.
        vertex_buffer: Option<BufferId>,
        /// The index buffer.
        index_buffer: BufferId,
        /// Width of the indices.
        index_format: IndexFormat,
        /// Number of indices.
        index_count: u32,
        /// First index.
        first_index: u32,
        /// Value added to every index.
        base_vertex: i32,
    },
    /// A non-indexed instanced draw.
    Instanced {
        /// The per-vertex buffer, bound to slot 0.
        vertex_buffer: Option<BufferId>,
        /// The per-instance buffer, bound to slot 1.
        instance_buffer: Option<BufferId>,
        /// Number of vertices per instance.
        vertex_count: u32,
        /// Number of instances.
        instance_count: u32,
        /// First vertex.
        first_vertex: u32,
        /// First instance.
        first_instance: u32,
    },
}

impl DrawCommand {
    /// Returns `true` if executing the command would not draw anything.
    pub fn is_empty(&self) -> bool {
        match *self {
            DrawCommand::Primitive { vertex_count, .. } => vertex_count == 0,
            DrawCommand::Indexed { index_count, .. } => index_count == 0,
            DrawCommand::Instanced {
                vertex_count,
                instance_count,
                ..
            } => vertex_count == 0 || instance_count == 0,
        }
    }

    /// Binds the command's geometry and issues its draw on `ctx`.
    pub fn execute(&self, ctx: &mut dyn DeviceContext) {
        match *self {
            DrawCommand::Primitive {
                vertex_buffer,
                vertex_count,
                first_vertex,
            } => {
                ctx.set_vertex_buffer(0, vertex_buffer);
                ctx.draw_primitive(vertex_count, first_vertex);
            }
            DrawCommand::Indexed {
                vertex_buffer,
                index_buffer,
                index_format,
                index_count,
                first_index,
                base_vertex,
            } => {
                ctx.set_vertex_buffer(0, vertex_buffer);
                ctx.set_index_buffer(Some(index_buffer), index_format);
                ctx.draw_indexed_primitive(index_count, first_index, base_vertex);
            }
            DrawCommand::Instanced {
                vertex_buffer,
                instance_buffer,
                vertex_count,
                instance_count,
                first_vertex,
                first_instance,
            } => {
                ctx.set_vertex_buffer(0, vertex_buffer);
                ctx.set_vertex_buffer(1, instance_buffer);
                ctx.draw_instanced_primitive(
                    vertex_count,
                    instance_count,
                    first_vertex,
                    first_instance,
                );
            }
        }
    }
}
