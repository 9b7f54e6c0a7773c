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

//! Defines the data layouts of clustered (tiled) forward lighting.
//!
//! The view frustum is divided into a fixed `width × height × depth` grid of
//! tiles. Every frame the CPU bins the visible point and spot lights into
//! those tiles, then uploads three things the lit shaders read:
//!
//! - the per-type light parameter arrays ([`GpuDirectionalLight`],
//!   [`GpuPointLight`], [`GpuSpotLight`]),
//! - a tile table of [`GpuTileInfo`] entries, one per tile,
//! - a flat `u32` index array, laid out per tile as
//!   `[point indices][spot indices]`.
//!
//! [`LightGridConstants`] carries the grid dimensions and the depth mapping
//! so that shaders can locate the tile of a fragment.

use super::settings::SettingsError;
use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

/// How the near/far range is divided into depth slices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DepthSlicing {
    /// Slices of equal thickness between the near and far planes.
    #[default]
    Linear,
    /// Slices whose thickness grows geometrically with depth, so that every
    /// slice covers the same ratio `far / near` to the power `1 / depth`.
    Logarithmic,
}

impl DepthSlicing {
    /// The value written into [`LightGridConstants::grid_size`]`[3]`.
    pub const fn gpu_mode(&self) -> u32 {
        match self {
            DepthSlicing::Linear => 0,
            DepthSlicing::Logarithmic => 1,
        }
    }
}

/// Dimensions of the light tile grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TileGridConfig {
    /// Number of tile columns across the screen.
    pub width: u32,
    /// Number of tile rows down the screen.
    pub height: u32,
    /// Number of depth slices between the near and far planes.
    pub depth: u32,
    /// The depth slicing mode.
    pub slicing: DepthSlicing,
}

impl Default for TileGridConfig {
    fn default() -> Self {
        Self {
            width: 16,
            height: 8,
            depth: 32,
            slicing: DepthSlicing::Linear,
        }
    }
}

impl TileGridConfig {
    /// Creates a linear grid with the given dimensions.
    pub const fn new(width: u32, height: u32, depth: u32) -> Self {
        Self {
            width,
            height,
            depth,
            slicing: DepthSlicing::Linear,
        }
    }

    /// Returns a copy of the grid using `slicing`.
    pub const fn with_slicing(mut self, slicing: DepthSlicing) -> Self {
        self.slicing = slicing;
        self
    }

    /// Checks that every dimension is non-zero and the tile count fits a `u32`.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.width == 0 || self.height == 0 || self.depth == 0 {
            return Err(SettingsError::InvalidValue(format!(
                "tile grid dimensions must be non-zero, got {}x{}x{}",
                self.width, self.height, self.depth
            )));
        }
        let count = self.width as u64 * self.height as u64 * self.depth as u64;
        if count > u32::MAX as u64 {
            return Err(SettingsError::InvalidValue(format!(
                "tile grid has too many tiles ({count})"
            )));
        }
        Ok(())
    }

    /// Total number of tiles in the grid.
    #[inline]
    pub const fn tile_count(&self) -> usize {
        self.width as usize * self.height as usize * self.depth as usize
    }

    /// Number of tiles in one depth slice.
    #[inline]
    pub const fn slice_len(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Linear index of tile `(x, y, z)`; x varies fastest, then y, then z.
    #[inline]
    pub const fn tile_index(&self, x: u32, y: u32, z: u32) -> usize {
        (z as usize * self.height as usize + y as usize) * self.width as usize + x as usize
    }

    /// Maps a positive view depth to a fractional slice coordinate in
    /// `[0, depth]` for depths inside `[near, far]`. The result is not clamped.
    pub fn slice_coordinate(&self, view_depth: f32, near: f32, far: f32) -> f32 {
        let d = self.depth as f32;
        match self.slicing {
            DepthSlicing::Linear => (view_depth - near) / (far - near) * d,
            DepthSlicing::Logarithmic => {
                if view_depth <= 0.0 {
                    return f32::NEG_INFINITY;
                }
                (view_depth / near).ln() / (far / near).ln() * d
            }
        }
    }

    /// Returns the slice containing `view_depth`, clamped to the grid.
    pub fn slice_of_depth(&self, view_depth: f32, near: f32, far: f32) -> u32 {
        let s = self.slice_coordinate(view_depth, near, far).floor();
        if s.is_nan() || s < 0.0 {
            0
        } else {
            (s as u32).min(self.depth - 1)
        }
    }

    /// View depth of the boundary at the start of slice `k` (`k` in `0..=depth`).
    pub fn depth_of_slice(&self, k: u32, near: f32, far: f32) -> f32 {
        let t = k as f32 / self.depth as f32;
        match self.slicing {
            DepthSlicing::Linear => near + (far - near) * t,
            DepthSlicing::Logarithmic => near * (far / near).powf(t),
        }
    }
}

/// One entry of the tile table.
///
/// `light_counts` packs the spot count in the high 16 bits and the point count
/// in the low 16 bits.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Pod, Zeroable)]
pub struct GpuTileInfo {
    /// Offset of the tile's first index in the flat index array.
    pub index_offset: u32,
    /// `(spot_count << 16) | point_count`.
    pub light_counts: u32,
}

impl GpuTileInfo {
    /// Packs a tile entry. Counts above `u16::MAX` saturate.
    pub fn new(index_offset: u32, point_count: usize, spot_count: usize) -> Self {
        let p = point_count.min(u16::MAX as usize) as u32;
        let s = spot_count.min(u16::MAX as usize) as u32;
        Self {
            index_offset,
            light_counts: (s << 16) | p,
        }
    }

    /// Number of point lights in the tile.
    #[inline]
    pub const fn point_count(&self) -> u32 {
        self.light_counts & 0xFFFF
    }

    /// Number of spot lights in the tile.
    #[inline]
    pub const fn spot_count(&self) -> u32 {
        self.light_counts >> 16
    }
}

/// A directional light in view space.
///
/// # Memory Layout
///
/// 32 bytes.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct GpuDirectionalLight {
    /// Normalized direction in view space, pointing away from the light.
    pub direction: [f32; 3],
    /// Padding.
    pub _pad0: f32,
    /// Color scaled by intensity.
    pub radiance: [f32; 3],
    /// Padding.
    pub _pad1: f32,
}

/// A point light in view space.
///
/// # Memory Layout
///
/// 32 bytes.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct GpuPointLight {
    /// Position in view space.
    pub position: [f32; 3],
    /// Influence range.
    pub range: f32,
    /// Color scaled by intensity.
    pub radiance: [f32; 3],
    /// Emitter radius.
    pub radius: f32,
}

/// A spot light in view space.
///
/// # Memory Layout
///
/// 64 bytes.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct GpuSpotLight {
    /// Position in view space.
    pub position: [f32; 3],
    /// Influence range.
    pub range: f32,
    /// Color scaled by intensity.
    pub radiance: [f32; 3],
    /// Emitter radius.
    pub radius: f32,
    /// Normalized direction in view space.
    pub direction: [f32; 3],
    /// Angular falloff exponent.
    pub falloff: f32,
    /// Cosine of the inner cone angle.
    pub cos_inner: f32,
    /// Cosine of the outer cone angle.
    pub cos_outer: f32,
    /// Padding.
    pub _pad: [f32; 2],
}

/// Constant buffer describing the light grid for the current camera.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct LightGridConstants {
    /// Grid width, height, depth and [`DepthSlicing::gpu_mode`].
    pub grid_size: [u32; 4],
    /// Near plane, far plane, `ln(far / near)`, unused.
    pub depth_range: [f32; 4],
    /// Directional, point and spot light counts, unused.
    pub light_counts: [u32; 4],
}

impl LightGridConstants {
    /// Builds the constants for a camera.
    pub fn new(
        grid: &TileGridConfig,
        near: f32,
        far: f32,
        directional: usize,
        point: usize,
        spot: usize,
    ) -> Self {
        Self {
            grid_size: [grid.width, grid.height, grid.depth, grid.slicing.gpu_mode()],
            depth_range: [near, far, (far / near).ln(), 0.0],
            light_counts: [directional as u32, point as u32, spot as u32, 0],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_gpu_layout_sizes() {
        assert_eq!(std::mem::size_of::<GpuTileInfo>(), 8);
        assert_eq!(std::mem::size_of::<GpuDirectionalLight>(), 32);
        assert_eq!(std::mem::size_of::<GpuPointLight>(), 32);
        assert_eq!(std::mem::size_of::<GpuSpotLight>(), 64);
        assert_eq!(std::mem::size_of::<LightGridConstants>() % 16, 0);
    }

    #[test]
    fn test_tile_info_packing() {
        let info = GpuTileInfo::new(12, 3, 5);
        assert_eq!(info.light_counts, (5 << 16) | 3);
        assert_eq!(info.point_count(), 3);
        assert_eq!(info.spot_count(), 5);
    }

    #[test]
    fn test_tile_index_is_x_fastest() {
        let grid = TileGridConfig::new(4, 3, 2);
        assert_eq!(grid.tile_index(0, 0, 0), 0);
        assert_eq!(grid.tile_index(1, 0, 0), 1);
        assert_eq!(grid.tile_index(0, 1, 0), 4);
        assert_eq!(grid.tile_index(0, 0, 1), 12);
        assert_eq!(grid.tile_count(), 24);
    }

    #[test]
    fn test_validate_rejects_zero_dimension() {
        assert!(TileGridConfig::new(0, 4, 4).validate().is_err());
        assert!(TileGridConfig::default().validate().is_ok());
    }

    #[test]
    fn test_linear_slicing() {
        let grid = TileGridConfig::new(4, 4, 4);
        assert_eq!(grid.slice_of_depth(1.0, 1.0, 9.0), 0);
        assert_eq!(grid.slice_of_depth(5.0, 1.0, 9.0), 2);
        assert_eq!(grid.slice_of_depth(50.0, 1.0, 9.0), 3);
        assert_eq!(grid.slice_of_depth(0.5, 1.0, 9.0), 0);
        assert_relative_eq!(grid.depth_of_slice(2, 1.0, 9.0), 5.0);
    }

    #[test]
    fn test_logarithmic_slicing_inverts() {
        let grid = TileGridConfig::new(4, 4, 8).with_slicing(DepthSlicing::Logarithmic);
        for k in 0..8 {
            let start = grid.depth_of_slice(k, 0.1, 100.0);
            let end = grid.depth_of_slice(k + 1, 0.1, 100.0);
            assert_eq!(grid.slice_of_depth((start + end) * 0.5, 0.1, 100.0), k);
        }
        assert_relative_eq!(grid.depth_of_slice(8, 0.1, 100.0), 100.0, max_relative = 1e-4);
    }
}
