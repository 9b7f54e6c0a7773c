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

//! Batch frustum culling of bounding spheres.
//!
//! Spheres are stored structure-of-arrays in blocks of [`LANES`] so that the
//! plane tests of one block compile down to straight-line vector code. The
//! last block is padded with zero-radius spheres at the origin, which sit
//! behind the near plane of any perspective frustum and are therefore always
//! reported invisible.

use tessera_core::math::{Frustum, Sphere, Vec3};

/// Number of spheres tested together.
pub const LANES: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq)]
struct SphereBlock {
    x: [f32; LANES],
    y: [f32; LANES],
    z: [f32; LANES],
    radius: [f32; LANES],
}

impl SphereBlock {
    const PADDING: Self = Self {
        x: [0.0; LANES],
        y: [0.0; LANES],
        z: [0.0; LANES],
        radius: [0.0; LANES],
    };

    #[inline]
    fn outside(&self, frustum: &Frustum) -> [bool; LANES] {
        let mut outside = [false; LANES];
        for plane in &frustum.planes {
            let n = plane.normal;
            for i in 0..LANES {
                let distance = n.x * self.x[i] + n.y * self.y[i] + n.z * self.z[i] + plane.distance;
                outside[i] |= distance < -self.radius[i];
            }
        }
        outside
    }
}

/// A growable batch of bounding spheres laid out for [`cull_spheres`].
#[derive(Debug, Clone, Default)]
pub struct SphereBatch {
    blocks: Vec<SphereBlock>,
    len: usize,
}

impl SphereBatch {
    /// Creates an empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty batch with room for `capacity` spheres.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            blocks: Vec::with_capacity(capacity.div_ceil(LANES)),
            len: 0,
        }
    }

    /// Number of spheres pushed.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if no sphere was pushed.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of spheres including the padding of the last block.
    pub fn padded_len(&self) -> usize {
        self.blocks.len() * LANES
    }

    /// Appends a sphere.
    pub fn push(&mut self, center: Vec3, radius: f32) {
        let lane = self.len % LANES;
        if lane == 0 {
            self.blocks.push(SphereBlock::PADDING);
        }
        if let Some(block) = self.blocks.last_mut() {
            block.x[lane] = center.x;
            block.y[lane] = center.y;
            block.z[lane] = center.z;
            block.radius[lane] = radius;
        }
        self.len += 1;
    }

    /// Removes every sphere, keeping the allocation.
    pub fn clear(&mut self) {
        self.blocks.clear();
        self.len = 0;
    }
}

impl FromIterator<Sphere> for SphereBatch {
    fn from_iter<I: IntoIterator<Item = Sphere>>(iter: I) -> Self {
        let mut batch = SphereBatch::new();
        for sphere in iter {
            batch.push(sphere.center, sphere.radius);
        }
        batch
    }
}

/// Tests every sphere of `spheres` against the six planes of `frustum`.
///
/// Returns one flag per pushed sphere: `false` if the sphere lies entirely
/// outside at least one plane, `true` otherwise. Spheres and frustum must be
/// in the same space. A NaN coordinate only affects its own sphere.
pub fn cull_spheres(frustum: &Frustum, spheres: &SphereBatch) -> Vec<bool> {
    let mut visible = Vec::with_capacity(spheres.padded_len());
    for block in &spheres.blocks {
        let outside = block.outside(frustum);
        visible.extend(outside.iter().map(|o| !o));
    }
    visible.truncate(spheres.len());
    visible
}
