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

//! Defines the light components tracked by the scheduler.
//!
//! A light entity carries a transform, a color and one of these light types.
//! Positions come from the transform; the directions stored here are in the
//! entity's local space and are rotated by the transform every frame. Radiance
//! is the entity's color scaled by `intensity`.

use crate::math::Vec3;
use serde::{Deserialize, Serialize};

/// A directional light source that illuminates from a uniform direction.
///
/// Directional lights are never culled: every camera receives all of them.
///
/// # Examples
///
/// ```
/// use tessera_core::renderer::light::DirectionalLight;
/// use tessera_core::math::Vec3;
///
/// let sun = DirectionalLight {
///     direction: Vec3::new(-0.5, -1.0, -0.3).normalize(),
///     intensity: 1.0,
/// };
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DirectionalLight {
    /// The direction the light is pointing, from the light towards the scene.
    pub direction: Vec3,

    /// The intensity multiplier for the light.
    pub intensity: f32,
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self {
            direction: Vec3::new(0.0, -1.0, -0.5).normalize(),
            intensity: 1.0,
        }
    }
}

/// A point light source that emits light in all directions from a single point.
///
/// The culler and the tile clusterer bound a point light by a sphere of
/// radius `range` centred on the entity's position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointLight {
    /// The intensity of the light.
    pub intensity: f32,

    /// The physical radius of the emitter, used by shaders for soft falloff.
    pub radius: f32,

    /// The maximum range of the light in world units.
    ///
    /// Beyond this distance, the light has no effect.
    pub range: f32,
}

impl Default for PointLight {
    fn default() -> Self {
        Self {
            intensity: 100.0,
            radius: 0.1,
            range: 10.0,
        }
    }
}

/// A spot light source that emits light in a cone from a single point.
///
/// Spot lights are bounded by the same sphere as a point light of equal
/// `range`; the cone is only evaluated by shaders.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpotLight {
    /// The direction the spotlight is pointing.
    pub direction: Vec3,

    /// The intensity of the light.
    pub intensity: f32,

    /// The physical radius of the emitter.
    pub radius: f32,

    /// The maximum range of the light in world units.
    pub range: f32,

    /// The angle in radians at which the light begins to fall off.
    pub inner_angle: f32,

    /// The angle in radians at which the light is fully attenuated.
    pub outer_angle: f32,

    /// Exponent shaping the falloff between the inner and outer angles.
    pub falloff: f32,
}

impl Default for SpotLight {
    fn default() -> Self {
        Self {
            direction: Vec3::new(0.0, -1.0, 0.0),
            intensity: 200.0,
            radius: 0.1,
            range: 15.0,
            inner_angle: 20.0_f32.to_radians(),
            outer_angle: 35.0_f32.to_radians(),
            falloff: 1.0,
        }
    }
}

/// An enumeration of all supported light types.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum LightType {
    /// A directional light (sun-like, infinite distance, no falloff).
    Directional(DirectionalLight),
    /// A point light (omni-directional with distance falloff).
    Point(PointLight),
    /// A spotlight (cone-shaped with distance and angular falloff).
    Spot(SpotLight),
}

impl Default for LightType {
    fn default() -> Self {
        LightType::Directional(DirectionalLight::default())
    }
}

impl LightType {
    /// Returns the culling radius of the light, or `None` for lights that are
    /// never culled.
    pub fn bounding_radius(&self) -> Option<f32> {
        match self {
            LightType::Directional(_) => None,
            LightType::Point(p) => Some(p.range),
            LightType::Spot(s) => Some(s.range),
        }
    }
}
