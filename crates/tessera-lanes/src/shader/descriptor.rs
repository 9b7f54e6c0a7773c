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

//! Serializable descriptions of shaders and filters.
//!
//! Descriptors can be built in code or read from any serde format; RON
//! helpers are provided since the rest of the engine stores its data as RON.

use super::PassMode;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tessera_core::renderer::{
    BlendStateDescriptor, DepthStateDescriptor, RenderStateDescriptor, TextureFormat,
};

/// Name of the built-in color target each camera renders into.
pub const SCREEN_TARGET: &str = "screen";

/// Name of the built-in depth target shared by all cameras.
pub const DEPTH_TARGET: &str = "depthBuffer";

/// A texture declared by a shader or filter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetDescriptor {
    /// Pixel format.
    pub format: TextureFormat,
    /// Size relative to the screen.
    pub scale: f32,
    /// Number of mip levels.
    pub mip_levels: u32,
    /// Whether passes may bind it for unordered access.
    pub unordered_access: bool,
}

impl Default for TargetDescriptor {
    fn default() -> Self {
        Self {
            format: TextureFormat::Rgba8Unorm,
            scale: 1.0,
            mip_levels: 1,
            unordered_access: false,
        }
    }
}

/// A structured buffer declared by a shader or filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageDescriptor {
    /// Size of one element in bytes.
    pub stride: u32,
    /// Number of elements.
    pub count: u32,
    /// Whether passes may bind it for unordered access.
    pub unordered_access: bool,
}

/// The value a pass clears a target or buffer to before running.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ClearValue {
    /// Clear a color target.
    Color([f32; 4]),
    /// Clear a depth target.
    Depth(f32),
    /// Clear an unordered-access resource.
    Float([f32; 4]),
}

/// One pass of a shader or filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PassDescriptor {
    /// What the pass does. Required.
    pub mode: Option<PassMode>,
    /// A disabled pass compiles to [`PassMode::None`].
    pub enabled: bool,
    /// Entry point of the pixel or compute program.
    pub program: Option<String>,
    /// Color targets; `["screen"]` when omitted on a graphics pass.
    pub render_targets: Option<Vec<String>>,
    /// Depth target.
    pub depth_target: Option<String>,
    /// Targets and buffers bound as shader resources.
    pub resources: Vec<String>,
    /// Targets and buffers bound for unordered access.
    pub unordered_access: Vec<String>,
    /// Targets and buffers cleared before the pass.
    pub clear: BTreeMap<String, ClearValue>,
    /// Copies made before the pass, destination to source.
    pub copy: BTreeMap<String, String>,
    /// Multisample resolves made before the pass, destination to source.
    pub resolve: BTreeMap<String, String>,
    /// Targets whose mip chain is regenerated before the pass.
    pub generate_mipmaps: Vec<String>,
    /// Blending.
    pub blend_state: BlendStateDescriptor,
    /// Depth testing.
    pub depth_state: DepthStateDescriptor,
    /// Rasterization.
    pub render_state: RenderStateDescriptor,
    /// Thread group counts of a compute pass.
    pub dispatch: Option<[u32; 3]>,
}

impl Default for PassDescriptor {
    fn default() -> Self {
        Self {
            mode: None,
            enabled: true,
            program: None,
            render_targets: None,
            depth_target: None,
            resources: Vec::new(),
            unordered_access: Vec::new(),
            clear: BTreeMap::new(),
            copy: BTreeMap::new(),
            resolve: BTreeMap::new(),
            generate_mipmaps: Vec::new(),
            blend_state: BlendStateDescriptor::default(),
            depth_state: DepthStateDescriptor::default(),
            render_state: RenderStateDescriptor::default(),
            dispatch: None,
        }
    }
}

impl PassDescriptor {
    /// A graphics or compute pass running `program`.
    pub fn new(mode: PassMode, program: impl Into<String>) -> Self {
        Self {
            mode: Some(mode),
            program: Some(program.into()),
            ..Default::default()
        }
    }

    /// Sets the color targets.
    pub fn with_render_targets<I, S>(mut self, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.render_targets = Some(targets.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the depth target.
    pub fn with_depth_target(mut self, target: impl Into<String>) -> Self {
        self.depth_target = Some(target.into());
        self
    }

    /// Adds a shader resource.
    pub fn with_resource(mut self, name: impl Into<String>) -> Self {
        self.resources.push(name.into());
        self
    }

    /// Adds a clear made before the pass.
    pub fn with_clear(mut self, name: impl Into<String>, value: ClearValue) -> Self {
        self.clear.insert(name.into(), value);
        self
    }

    /// Sets the thread group counts.
    pub fn with_dispatch(mut self, x: u32, y: u32, z: u32) -> Self {
        self.dispatch = Some([x, y, z]);
        self
    }
}

/// A shader: the passes run over the draw calls batched under it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShaderDescriptor {
    /// Unique name; materials and force-shader overrides refer to it.
    pub name: String,
    /// Shaders that must run before this one.
    pub requires: Vec<String>,
    /// Whether the passes read the light buffers.
    pub lighting: bool,
    /// Textures owned by the shader.
    pub targets: BTreeMap<String, TargetDescriptor>,
    /// Structured buffers owned by the shader.
    pub buffers: BTreeMap<String, StorageDescriptor>,
    /// The passes, in execution order.
    pub passes: Vec<PassDescriptor>,
}

impl ShaderDescriptor {
    /// Reads a descriptor from RON text.
    pub fn from_ron_str(text: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(text)
    }
}

/// A filter: full-screen or compute passes run once per camera after all shaders.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterDescriptor {
    /// Unique name, as listed in the renderer settings.
    pub name: String,
    /// Textures owned by the filter.
    pub targets: BTreeMap<String, TargetDescriptor>,
    /// Structured buffers owned by the filter.
    pub buffers: BTreeMap<String, StorageDescriptor>,
    /// The passes, in execution order.
    pub passes: Vec<PassDescriptor>,
}

impl FilterDescriptor {
    /// Reads a descriptor from RON text.
    pub fn from_ron_str(text: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shader_descriptor_from_ron() {
        let text = r#"(
            name: "lit",
            requires: ["sky"],
            lighting: true,
            targets: { "normals": (format: Rgba16Float, scale: 0.5) },
            passes: [
                (mode: Some(Forward), program: Some("lit_ps"), depth_target: Some("depthBuffer")),
                (mode: Some(Compute), program: Some("blur_cs"), dispatch: Some((8, 8, 1)), enabled: false),
            ],
        )"#;
        let shader = ShaderDescriptor::from_ron_str(text).unwrap();
        assert_eq!(shader.name, "lit");
        assert_eq!(shader.requires, vec!["sky".to_string()]);
        assert!(shader.lighting);
        assert_eq!(shader.targets["normals"].scale, 0.5);
        assert_eq!(shader.targets["normals"].mip_levels, 1);
        assert_eq!(shader.passes.len(), 2);
        assert!(shader.passes[0].enabled);
        assert_eq!(shader.passes[0].render_targets, None);
        assert!(!shader.passes[1].enabled);
        assert_eq!(shader.passes[1].dispatch, Some([8, 8, 1]));
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let filter = FilterDescriptor::from_ron_str("(name: \"tonemap\")").unwrap();
        assert!(filter.passes.is_empty());
        assert!(filter.targets.is_empty());
    }
}
