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

//! Programs, input layouts and fixed-function state objects.
//!
//! State descriptors are `Deserialize` so that shader and filter passes can
//! declare them alongside their other settings.

use serde::{Deserialize, Serialize};

/// A programmable stage of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PipelineStage {
    /// The vertex stage.
    Vertex,
    /// The pixel (fragment) stage.
    Pixel,
    /// The compute stage.
    Compute,
}

/// An opaque handle to a compiled program for one stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProgramId(pub usize);

/// A descriptor used to create a [`ProgramId`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProgramDescriptor {
    /// The stage the program runs in.
    pub stage: PipelineStage,
    /// The entry point name the backend resolves to compiled code.
    pub entry: String,
}

/// An opaque handle to a vertex input layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InputLayoutId(pub usize);

/// The format of a single vertex attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VertexFormat {
    /// Two 32-bit floats.
    Float32x2,
    /// Three 32-bit floats.
    Float32x3,
    /// Four 32-bit floats.
    Float32x4,
    /// Four normalized bytes.
    Unorm8x4,
}

/// One attribute of a vertex input layout.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VertexElement {
    /// The shader semantic this attribute feeds.
    pub semantic: String,
    /// Attribute format.
    pub format: VertexFormat,
    /// Byte offset inside the vertex.
    pub offset: u32,
}

/// A descriptor used to create an [`InputLayoutId`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct InputLayoutDescriptor {
    /// The vertex attributes.
    pub elements: Vec<VertexElement>,
    /// Size of one vertex in bytes.
    pub stride: u32,
}

/// How vertices are assembled into primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PrimitiveTopology {
    /// Each vertex is a point.
    PointList,
    /// Every two vertices form a line.
    LineList,
    /// Every three vertices form a triangle.
    #[default]
    TriangleList,
    /// Triangles share edges with their predecessor.
    TriangleStrip,
}

/// The width of indices in an index buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum IndexFormat {
    /// 16-bit indices.
    Uint16,
    /// 32-bit indices.
    #[default]
    Uint32,
}

/// An opaque handle to a rasterizer state object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderStateId(pub usize);

/// An opaque handle to a depth state object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DepthStateId(pub usize);

/// An opaque handle to a blend state object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlendStateId(pub usize);

/// Which faces are culled by the rasterizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CullMode {
    /// No culling.
    None,
    /// Cull front faces.
    Front,
    /// Cull back faces.
    #[default]
    Back,
}

/// How polygons are filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FillMode {
    /// Solid triangles.
    #[default]
    Solid,
    /// Wireframe.
    Wireframe,
}

/// A descriptor used to create a [`RenderStateId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderStateDescriptor {
    /// Face culling.
    pub cull_mode: CullMode,
    /// Fill mode.
    pub fill_mode: FillMode,
    /// Enables multisample rasterization.
    pub multisample: bool,
}

/// A comparison function for depth testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CompareFunction {
    /// The test never passes.
    Never,
    /// Passes if the new value is less than the existing value.
    #[default]
    Less,
    /// Passes if the values are equal.
    Equal,
    /// Passes if the new value is less than or equal to the existing value.
    LessEqual,
    /// Passes if the new value is greater than the existing value.
    Greater,
    /// Passes if the new value is greater than or equal to the existing value.
    GreaterEqual,
    /// The test always passes.
    Always,
}

/// A descriptor used to create a [`DepthStateId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct DepthStateDescriptor {
    /// Enables the depth test.
    pub enable: bool,
    /// Enables depth writes.
    pub write: bool,
    /// The comparison function.
    pub compare: CompareFunction,
}

impl Default for DepthStateDescriptor {
    fn default() -> Self {
        Self {
            enable: true,
            write: true,
            compare: CompareFunction::Less,
        }
    }
}

/// A blend factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlendFactor {
    /// `0.0`.
    Zero,
    /// `1.0`.
    One,
    /// Source alpha.
    SrcAlpha,
    /// `1.0 - source alpha`.
    OneMinusSrcAlpha,
}

/// A blend operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BlendOperation {
    /// `src + dst`.
    #[default]
    Add,
    /// `src - dst`.
    Subtract,
    /// `min(src, dst)`.
    Min,
    /// `max(src, dst)`.
    Max,
}

/// A descriptor used to create a [`BlendStateId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct BlendStateDescriptor {
    /// Enables blending.
    pub enable: bool,
    /// Source factor.
    pub src: BlendFactor,
    /// Destination factor.
    pub dst: BlendFactor,
    /// Blend operation.
    pub operation: BlendOperation,
}

impl Default for BlendStateDescriptor {
    fn default() -> Self {
        Self {
            enable: false,
            src: BlendFactor::One,
            dst: BlendFactor::Zero,
            operation: BlendOperation::Add,
        }
    }
}

/// A rectangular region of a render target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Left edge in pixels.
    pub x: f32,
    /// Top edge in pixels.
    pub y: f32,
    /// Width in pixels.
    pub width: f32,
    /// Height in pixels.
    pub height: f32,
    /// Minimum depth, usually `0.0`.
    pub min_depth: f32,
    /// Maximum depth, usually `1.0`.
    pub max_depth: f32,
}

impl Viewport {
    /// A full-depth viewport covering `width × height` pixels.
    pub fn from_size(width: u32, height: u32) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: width as f32,
            height: height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        }
    }
}
