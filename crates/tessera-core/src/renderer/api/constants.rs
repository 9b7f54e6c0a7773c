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

//! Per-camera constant buffer layout.

use crate::math::Mat4;
use bytemuck::{Pod, Zeroable};

/// Constants uploaded once per camera and bound to constant slot
/// [`CameraConstants::SLOT`] for every pass of that camera.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct CameraConstants {
    /// World to view transform.
    pub view: [[f32; 4]; 4],
    /// View to clip transform.
    pub projection: [[f32; 4]; 4],
    /// Clip to view transform, used by deferred passes to rebuild positions.
    pub inverse_projection: [[f32; 4]; 4],
    /// Near plane, far plane, unused, unused.
    pub depth_params: [f32; 4],
    /// Width, height, `1 / width`, `1 / height` of the camera target.
    pub viewport: [f32; 4],
}

impl CameraConstants {
    /// The constant buffer slot camera constants are bound to.
    pub const SLOT: u32 = 0;

    /// Builds the constants of a camera.
    ///
    /// A singular projection yields an identity inverse.
    pub fn new(view: &Mat4, projection: &Mat4, near: f32, far: f32, width: u32, height: u32) -> Self {
        let inverse = projection.inverse().unwrap_or(Mat4::IDENTITY);
        let w = width.max(1) as f32;
        let h = height.max(1) as f32;
        Self {
            view: view.to_cols_array_2d(),
            projection: projection.to_cols_array_2d(),
            inverse_projection: inverse.to_cols_array_2d(),
            depth_params: [near, far, 0.0, 0.0],
            viewport: [w, h, 1.0 / w, 1.0 / h],
        }
    }
}
