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

//! GPU resource identifiers and their descriptors.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// An opaque handle to a GPU buffer.
///
/// Returned by [`GraphicsDevice::create_buffer`](crate::renderer::GraphicsDevice::create_buffer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(pub usize);

/// An opaque handle to a GPU texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub usize);

/// An opaque handle to a sampler state object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SamplerId(pub usize);

bitflags! {
    /// A set of flags describing the allowed usages of a buffer.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BufferUsage: u32 {
        /// The buffer can be written from the CPU.
        const CPU_WRITE = 1 << 0;
        /// The buffer can be bound as a vertex buffer.
        const VERTEX = 1 << 1;
        /// The buffer can be bound as an index buffer.
        const INDEX = 1 << 2;
        /// The buffer can be bound as a constant buffer.
        const CONSTANT = 1 << 3;
        /// The buffer can be read by shaders as a structured array.
        const STRUCTURED = 1 << 4;
        /// The buffer can be read by shaders as raw 32-bit words.
        const RAW = 1 << 5;
        /// The buffer can be bound for unordered (read/write) access.
        const UNORDERED_ACCESS = 1 << 6;
    }
}

bitflags! {
    /// A set of flags describing how a texture can be bound.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TextureUsage: u32 {
        /// The texture can be sampled by shaders.
        const SHADER_RESOURCE = 1 << 0;
        /// The texture can be bound as a color render target.
        const RENDER_TARGET = 1 << 1;
        /// The texture can be bound as a depth target.
        const DEPTH_TARGET = 1 << 2;
        /// The texture can be bound for unordered (read/write) access.
        const UNORDERED_ACCESS = 1 << 3;
    }
}

/// A descriptor used to create a [`BufferId`].
#[derive(Debug, Clone)]
pub struct BufferDescriptor<'a> {
    /// An optional debug label, kept across reallocations.
    pub label: Option<Cow<'a, str>>,
    /// The total size of the buffer in bytes.
    pub size: u64,
    /// How the buffer will be used.
    pub usage: BufferUsage,
    /// Size in bytes of one element for structured buffers, `0` otherwise.
    pub stride: u32,
}

/// The pixel format of a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TextureFormat {
    /// 8-bit normalized RGBA.
    #[default]
    Rgba8Unorm,
    /// 16-bit float RGBA, for HDR targets.
    Rgba16Float,
    /// 32-bit float RGBA.
    Rgba32Float,
    /// Single 32-bit float channel.
    R32Float,
    /// 32-bit float depth.
    Depth32Float,
}

/// A descriptor used to create a [`TextureId`].
#[derive(Debug, Clone)]
pub struct TextureDescriptor<'a> {
    /// An optional debug label.
    pub label: Option<Cow<'a, str>>,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel format.
    pub format: TextureFormat,
    /// Number of mip levels; `0` requests a full chain.
    pub mip_levels: u32,
    /// MSAA sample count.
    pub sample_count: u32,
    /// How the texture will be bound.
    pub usage: TextureUsage,
}

/// Texture addressing outside `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AddressMode {
    /// Repeat the texture.
    #[default]
    Wrap,
    /// Clamp to the edge texel.
    Clamp,
    /// Mirror on every repetition.
    Mirror,
}

/// Texel filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FilterMode {
    /// Nearest texel.
    Point,
    /// Linear interpolation.
    #[default]
    Linear,
    /// Anisotropic filtering.
    Anisotropic,
}

/// A descriptor used to create a [`SamplerId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerDescriptor {
    /// Addressing on all three axes.
    pub address_mode: AddressMode,
    /// Minification, magnification and mip filtering.
    pub filter: FilterMode,
}

/// A resource bound to a shader resource or unordered-access slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceView {
    /// A buffer.
    Buffer(BufferId),
    /// A texture.
    Texture(TextureId),
}

impl From<BufferId> for ResourceView {
    fn from(id: BufferId) -> Self {
        ResourceView::Buffer(id)
    }
}

impl From<TextureId> for ResourceView {
    fn from(id: TextureId) -> Self {
        ResourceView::Texture(id)
    }
}
