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

//! Defines the per-camera data the lanes consume.
//!
//! None of these types outlive a frame. The render agent builds a
//! [`CameraView`] from each queued camera request, fills a [`ViewLights`]
//! during light preparation and hands both, together with the
//! [`FrameTargets`], to the clustering and pass execution stages.

use tessera_core::math::{Frustum, Mat4, Sphere, Vec3};
use tessera_core::renderer::{
    BufferId, GpuDirectionalLight, GpuPointLight, GpuSpotLight, TextureId,
};

/// A resolved camera: matrices, clip range and culling volumes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraView {
    /// World to view transform.
    pub view: Mat4,
    /// View to clip transform (right-handed, zero-to-one depth).
    pub projection: Mat4,
    /// Distance of the near plane.
    pub near: f32,
    /// Distance of the far plane.
    pub far: f32,
    /// The frustum in world space, for producers culling their own objects.
    pub frustum: Frustum,
}

impl CameraView {
    /// Builds a camera view and its world-space frustum.
    pub fn new(view: Mat4, projection: Mat4, near: f32, far: f32) -> Self {
        Self {
            view,
            projection,
            near,
            far,
            frustum: Frustum::from_projection(&(projection * view)),
        }
    }

    /// The frustum in view space, used to cull lights already moved into view space.
    pub fn view_frustum(&self) -> Frustum {
        Frustum::from_projection(&self.projection)
    }

    /// The horizontal and vertical projection scales (`proj[0][0]`, `proj[1][1]`).
    #[inline]
    pub fn projection_scale(&self) -> (f32, f32) {
        (self.projection.cols[0].x, self.projection.cols[1].y)
    }
}

/// The textures and buffers every pass of a camera can refer to.
///
/// `screen` and `depth` are what the built-in `screen` and `depthBuffer`
/// target names of shader and filter passes resolve to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameTargets {
    /// The color target cameras render into.
    pub screen: TextureId,
    /// The depth target shared by all cameras.
    pub depth: TextureId,
    /// The presentation target the overlay composites onto.
    pub back_buffer: TextureId,
    /// Width of `screen` in pixels.
    pub width: u32,
    /// Height of `screen` in pixels.
    pub height: u32,
    /// The buffer holding the current camera's constants.
    pub camera_constants: BufferId,
}

/// The lights of one camera, in view space and in GPU layout.
///
/// Point and spot lists only hold lights that survived culling; their order
/// is the order clustering indices refer to.
#[derive(Debug, Clone, Default)]
pub struct ViewLights {
    /// Directional lights. Never culled.
    pub directional: Vec<GpuDirectionalLight>,
    /// Visible point lights.
    pub point: Vec<GpuPointLight>,
    /// Visible spot lights.
    pub spot: Vec<GpuSpotLight>,
}

impl ViewLights {
    /// Total number of lights.
    pub fn len(&self) -> usize {
        self.directional.len() + self.point.len() + self.spot.len()
    }

    /// Returns `true` if there is no light at all.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// View-space bounding spheres of the point lights.
    pub fn point_bounds(&self) -> Vec<Sphere> {
        self.point
            .iter()
            .map(|l| Sphere::new(Vec3::from(l.position), l.range))
            .collect()
    }

    /// View-space bounding spheres of the spot lights.
    pub fn spot_bounds(&self) -> Vec<Sphere> {
        self.spot
            .iter()
            .map(|l| Sphere::new(Vec3::from(l.position), l.range))
            .collect()
    }
}
