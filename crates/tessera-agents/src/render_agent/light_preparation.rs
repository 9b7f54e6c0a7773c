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

//! Moves the tracked lights into a camera's view space.
//!
//! The three light types are prepared by three independent pool tasks and
//! joined before clustering starts. Directional lights are never culled;
//! point and spot lights are tested against the view-space frustum.

use std::sync::Arc;
use tessera_core::math::{Mat4, Vec3};
use tessera_core::renderer::{
    DirectionalLight, GpuDirectionalLight, GpuPointLight, GpuSpotLight, PointLight, SpotLight,
};
use tessera_core::tasks::{TaskError, TaskPool};
use tessera_data::population::LightInstance;
use tessera_data::LightSnapshot;
use tessera_lanes::render_lane::{cull_spheres, CameraView, SphereBatch, ViewLights};

/// The output of one light preparation task.
#[derive(Debug, Clone, PartialEq)]
pub enum PreparedBatch {
    /// Directional lights.
    Directional(Vec<GpuDirectionalLight>),
    /// Visible point lights.
    Point(Vec<GpuPointLight>),
    /// Visible spot lights.
    Spot(Vec<GpuSpotLight>),
}

fn view_direction(view: &Mat4, transform: &Mat4, local: Vec3) -> Option<Vec3> {
    let direction = view.transform_vector3(transform.transform_vector3(local));
    let length_sq = direction.length_squared();
    (length_sq > 0.0 && length_sq.is_finite()).then(|| direction.normalize())
}

fn view_position(view: &Mat4, transform: &Mat4) -> Vec3 {
    view.transform_point3(transform.transform_point3(Vec3::ZERO))
}

fn has_range(range: f32) -> bool {
    range > 0.0 && range.is_finite()
}

// Keeps the entries whose bounding sphere touches the view frustum.
fn cull<T>(camera: &CameraView, lights: Vec<T>, bounds: impl Fn(&T) -> (Vec3, f32)) -> Vec<T> {
    if lights.is_empty() {
        return lights;
    }
    let mut batch = SphereBatch::with_capacity(lights.len());
    for light in &lights {
        let (center, radius) = bounds(light);
        batch.push(center, radius);
    }
    let visible = cull_spheres(&camera.view_frustum(), &batch);
    lights
        .into_iter()
        .zip(visible)
        .filter_map(|(light, visible)| visible.then_some(light))
        .collect()
}

/// Rotates every directional light into view space.
///
/// Lights whose direction collapses to zero are skipped.
pub fn prepare_directional(
    lights: &[LightInstance<DirectionalLight>],
    camera: &CameraView,
) -> Vec<GpuDirectionalLight> {
    lights
        .iter()
        .filter_map(|instance| {
            let direction = view_direction(&camera.view, &instance.transform, instance.light.direction)?;
            Some(GpuDirectionalLight {
                direction: direction.to_array(),
                radiance: instance.color.radiance(instance.light.intensity),
                ..Default::default()
            })
        })
        .collect()
}

/// Moves the point lights into view space and keeps the visible ones.
pub fn prepare_point(
    lights: &[LightInstance<PointLight>],
    camera: &CameraView,
) -> Vec<GpuPointLight> {
    let candidates: Vec<GpuPointLight> = lights
        .iter()
        .filter(|instance| has_range(instance.light.range))
        .map(|instance| GpuPointLight {
            position: view_position(&camera.view, &instance.transform).to_array(),
            range: instance.light.range,
            radiance: instance.color.radiance(instance.light.intensity),
            radius: instance.light.radius,
        })
        .collect();
    cull(camera, candidates, |l| (Vec3::from(l.position), l.range))
}

/// Moves the spot lights into view space and keeps the visible ones.
///
/// A spot light is bounded by the sphere of its range, like a point light.
pub fn prepare_spot(lights: &[LightInstance<SpotLight>], camera: &CameraView) -> Vec<GpuSpotLight> {
    let candidates: Vec<GpuSpotLight> = lights
        .iter()
        .filter(|instance| has_range(instance.light.range))
        .filter_map(|instance| {
            let light = &instance.light;
            let direction = view_direction(&camera.view, &instance.transform, light.direction)?;
            Some(GpuSpotLight {
                position: view_position(&camera.view, &instance.transform).to_array(),
                range: light.range,
                radiance: instance.color.radiance(light.intensity),
                radius: light.radius,
                direction: direction.to_array(),
                falloff: light.falloff,
                cos_inner: light.inner_angle.cos(),
                cos_outer: light.outer_angle.cos(),
                _pad: [0.0; 2],
            })
        })
        .collect();
    cull(camera, candidates, |l| (Vec3::from(l.position), l.range))
}

/// Prepares the three light types on the pool and joins them.
///
/// Fails only if one of the tasks panicked.
pub fn prepare_lights(
    pool: &TaskPool,
    snapshot: Arc<LightSnapshot>,
    camera: &CameraView,
) -> Result<ViewLights, TaskError> {
    let camera = *camera;
    let handles = vec![
        {
            let snapshot = snapshot.clone();
            pool.submit(move || {
                PreparedBatch::Directional(prepare_directional(&snapshot.directional, &camera))
            })
        },
        {
            let snapshot = snapshot.clone();
            pool.submit(move || PreparedBatch::Point(prepare_point(&snapshot.point, &camera)))
        },
        pool.submit(move || PreparedBatch::Spot(prepare_spot(&snapshot.spot, &camera))),
    ];

    let mut lights = ViewLights::default();
    for batch in pool.join_all(handles)? {
        match batch {
            PreparedBatch::Directional(l) => lights.directional = l,
            PreparedBatch::Point(l) => lights.point = l,
            PreparedBatch::Spot(l) => lights.spot = l,
        }
    }
    Ok(lights)
}
