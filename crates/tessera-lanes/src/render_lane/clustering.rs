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

//! Binning of visible lights into the screen-space tile grid.
//!
//! Each light is first bounded in tile coordinates: the x and y extents come
//! from the tangent planes through the eye that touch the light sphere
//! ("clip region"), the z extent from the depth slices covering
//! `[depth - radius, depth + radius]`. Every tile in that range then runs a
//! separating-plane test against the light, and the light's index is appended
//! to the tile's point or spot list when the test cannot rule it out.
//!
//! Depth slices are processed in parallel. Per-tile lists are lock-free
//! queues, so workers never wait on each other.

use super::CameraView;
use crossbeam::queue::SegQueue;
use rayon::prelude::*;
use tessera_core::math::{Aabb, Sphere, Vec3};
use tessera_core::renderer::TileGridConfig;
use tessera_core::tasks::TaskPool;

/// The type of light a tile list holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClusterLightKind {
    /// Point lights.
    Point,
    /// Spot lights.
    Spot,
}

/// The tile grid with one point and one spot index list per tile.
///
/// Allocated once; the lists are emptied when the light buffer is built from
/// them, and again by [`TileGrid::clear`] before each clustering run.
#[derive(Debug)]
pub struct TileGrid {
    config: TileGridConfig,
    point: Vec<SegQueue<u32>>,
    spot: Vec<SegQueue<u32>>,
}

impl TileGrid {
    /// Allocates the lists of every tile of `config`.
    pub fn new(config: TileGridConfig) -> Self {
        let count = config.tile_count();
        Self {
            config,
            point: (0..count).map(|_| SegQueue::new()).collect(),
            spot: (0..count).map(|_| SegQueue::new()).collect(),
        }
    }

    /// The grid dimensions.
    pub fn config(&self) -> &TileGridConfig {
        &self.config
    }

    /// Number of tiles.
    pub fn tile_count(&self) -> usize {
        self.point.len()
    }

    /// Appends `light` to a list of `tile`. Safe to call from many threads.
    #[inline]
    pub fn append(&self, kind: ClusterLightKind, tile: usize, light: u32) {
        let lists = match kind {
            ClusterLightKind::Point => &self.point,
            ClusterLightKind::Spot => &self.spot,
        };
        if let Some(list) = lists.get(tile) {
            list.push(light);
        }
    }

    /// Removes and returns the indices of one tile list, in no particular order.
    pub fn drain_tile(&self, kind: ClusterLightKind, tile: usize) -> Vec<u32> {
        let lists = match kind {
            ClusterLightKind::Point => &self.point,
            ClusterLightKind::Spot => &self.spot,
        };
        let Some(list) = lists.get(tile) else {
            return Vec::new();
        };
        let mut indices = Vec::with_capacity(list.len());
        while let Some(index) = list.pop() {
            indices.push(index);
        }
        indices
    }

    /// Empties every list.
    pub fn clear(&mut self) {
        for list in self.point.iter_mut().chain(self.spot.iter_mut()) {
            *list = SegQueue::new();
        }
    }
}

/// An inclusive range of tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileRange {
    /// Lowest `(x, y, z)` tile coordinate.
    pub min: [u32; 3],
    /// Highest `(x, y, z)` tile coordinate.
    pub max: [u32; 3],
}

impl TileRange {
    /// Returns `true` if tile `(x, y, z)` lies in the range.
    pub fn contains(&self, x: u32, y: u32, z: u32) -> bool {
        (self.min[0]..=self.max[0]).contains(&x)
            && (self.min[1]..=self.max[1]).contains(&y)
            && (self.min[2]..=self.max[2]).contains(&z)
    }

    /// Number of tiles in the range.
    pub fn tile_count(&self) -> usize {
        (0..3)
            .map(|i| (self.max[i] - self.min[i] + 1) as usize)
            .product()
    }
}

/// Narrows `[clip_min, clip_max]` with one tangent plane solution.
fn update_clip_region_root(
    nc: f32,
    lc: f32,
    lz: f32,
    radius: f32,
    scale: f32,
    clip_min: &mut f32,
    clip_max: &mut f32,
) {
    if nc == 0.0 {
        return;
    }
    let nz = (radius - nc * lc) / lz;
    // Depth of the tangent point; a root behind the eye does not bound the light.
    let pz = lz - radius * nz;
    if pz > 0.0 {
        let clip = -nz * scale / nc;
        if nc > 0.0 {
            *clip_min = clip_min.max(clip);
        } else {
            *clip_max = clip_max.min(clip);
        }
    }
}

/// Returns the NDC extent `[min, max]` on one axis of a sphere with lateral
/// coordinate `lc`, positive depth `lz` and `radius`, seen through a
/// projection scale `scale`.
///
/// The eye inside the sphere, or the sphere tangent to the eye plane, keeps
/// the full `[-1, 1]` range.
pub fn clip_region(lc: f32, lz: f32, radius: f32, scale: f32) -> (f32, f32) {
    let mut clip_min = -1.0f32;
    let mut clip_max = 1.0f32;
    let r2 = radius * radius;
    let len2 = lc * lc + lz * lz;
    let discriminant = r2 * lc * lc - len2 * (r2 - lz * lz);
    if discriminant > 0.0 && len2 > 0.0 {
        let a = radius * lc;
        let b = discriminant.sqrt();
        let nc0 = (a + b) / len2;
        let nc1 = (a - b) / len2;
        update_clip_region_root(nc0, lc, lz, radius, scale, &mut clip_min, &mut clip_max);
        update_clip_region_root(nc1, lc, lz, radius, scale, &mut clip_min, &mut clip_max);
    }
    (clip_min, clip_max)
}

/// Maps an NDC coordinate to a tile column in `0..count`.
#[inline]
fn ndc_to_tile(ndc: f32, count: u32) -> u32 {
    let t = ((ndc + 1.0) * 0.5 * count as f32).floor();
    if t.is_nan() || t < 0.0 {
        0
    } else {
        (t as u32).min(count - 1)
    }
}

/// Computes the tiles a view-space light sphere can touch.
///
/// Returns `None` when the sphere lies entirely before the near or beyond the
/// far plane.
pub fn light_tile_range(
    grid: &TileGridConfig,
    camera: &CameraView,
    light: &Sphere,
) -> Option<TileRange> {
    let depth = -light.center.z;
    let radius = light.radius;
    if depth + radius < camera.near || depth - radius > camera.far {
        return None;
    }

    let (sx, sy) = camera.projection_scale();
    let (x_min, x_max) = clip_region(light.center.x, depth, radius, sx);
    let (y_min, y_max) = clip_region(light.center.y, depth, radius, sy);
    if x_min > x_max || y_min > y_max {
        return None;
    }

    // Tile rows run top-down while NDC y points up.
    let min = [
        ndc_to_tile(x_min, grid.width),
        ndc_to_tile(-y_max, grid.height),
        grid.slice_of_depth(depth - radius, camera.near, camera.far),
    ];
    let max = [
        ndc_to_tile(x_max, grid.width),
        ndc_to_tile(-y_min, grid.height),
        grid.slice_of_depth(depth + radius, camera.near, camera.far),
    ];
    Some(TileRange { min, max })
}

/// The view-space bounding box of tile `(x, y, z)`.
pub fn tile_bounds(grid: &TileGridConfig, camera: &CameraView, x: u32, y: u32, z: u32) -> Aabb {
    let (sx, sy) = camera.projection_scale();
    let ndc_x = [
        x as f32 / grid.width as f32 * 2.0 - 1.0,
        (x + 1) as f32 / grid.width as f32 * 2.0 - 1.0,
    ];
    let ndc_y = [
        1.0 - y as f32 / grid.height as f32 * 2.0,
        1.0 - (y + 1) as f32 / grid.height as f32 * 2.0,
    ];
    let depth = [
        grid.depth_of_slice(z, camera.near, camera.far),
        grid.depth_of_slice(z + 1, camera.near, camera.far),
    ];

    let mut corners = [Vec3::ZERO; 8];
    let mut i = 0;
    for d in depth {
        for ny in ndc_y {
            for nx in ndc_x {
                corners[i] = Vec3::new(nx * d / sx, ny * d / sy, -d);
                i += 1;
            }
        }
    }
    Aabb::from_points(&corners)
}

/// Returns `false` only if a plane provably separates `tile` from `light`.
///
/// The plane normal points from the light towards the tile center; the tile
/// is rejected when even its nearest corner along that normal lies beyond the
/// light's reach. Over-inclusion is possible, under-inclusion is not.
pub fn light_reaches_tile(light: &Sphere, tile: &Aabb) -> bool {
    let n = (tile.center() - light.center).normalize();
    if n == Vec3::ZERO {
        return true;
    }
    let reach = n.dot(light.center) + light.radius;
    let nearest = tile
        .corners()
        .iter()
        .map(|c| n.dot(*c))
        .fold(f32::INFINITY, f32::min);
    nearest <= reach
}

/// Counts of the tile-list appends made by one clustering run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClusterStats {
    /// Tiles covered by the light ranges.
    pub tested: usize,
    /// Tiles the separation test accepted.
    pub appended: usize,
}

/// Bins the `point` and `spot` light spheres into `grid`.
///
/// Indices appended are positions in the given slices. The grid is cleared
/// first; the call returns once every slice has been processed.
pub fn cluster_lights(
    pool: &TaskPool,
    grid: &mut TileGrid,
    camera: &CameraView,
    point: &[Sphere],
    spot: &[Sphere],
) -> ClusterStats {
    grid.clear();
    let grid = &*grid;
    let config = *grid.config();

    let bounded = |kind: ClusterLightKind, lights: &[Sphere]| {
        lights
            .iter()
            .enumerate()
            .filter_map(|(index, light)| {
                light_tile_range(&config, camera, light).map(|range| (kind, index as u32, *light, range))
            })
            .collect::<Vec<_>>()
    };
    let mut ranged = bounded(ClusterLightKind::Point, point);
    ranged.extend(bounded(ClusterLightKind::Spot, spot));

    pool.install(|| {
        (0..config.depth)
            .into_par_iter()
            .map(|z| {
                let mut stats = ClusterStats::default();
                for (kind, index, light, range) in &ranged {
                    if z < range.min[2] || z > range.max[2] {
                        continue;
                    }
                    for y in range.min[1]..=range.max[1] {
                        for x in range.min[0]..=range.max[0] {
                            stats.tested += 1;
                            let bounds = tile_bounds(&config, camera, x, y, z);
                            if light_reaches_tile(light, &bounds) {
                                grid.append(*kind, config.tile_index(x, y, z), *index);
                                stats.appended += 1;
                            }
                        }
                    }
                }
                stats
            })
            .reduce(ClusterStats::default, |a, b| ClusterStats {
                tested: a.tested + b.tested,
                appended: a.appended + b.appended,
            })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use tessera_core::math::Mat4;

    fn camera() -> CameraView {
        // fov 90 degrees and aspect 1 give unit projection scales.
        let proj = Mat4::perspective_rh_zo(std::f32::consts::FRAC_PI_2, 1.0, 1.0, 9.0).unwrap();
        CameraView::new(Mat4::IDENTITY, proj, 1.0, 9.0)
    }

    fn drain_all(grid: &TileGrid) -> Vec<(usize, ClusterLightKind, u32)> {
        let mut out = Vec::new();
        for tile in 0..grid.tile_count() {
            for kind in [ClusterLightKind::Point, ClusterLightKind::Spot] {
                for index in grid.drain_tile(kind, tile) {
                    out.push((tile, kind, index));
                }
            }
        }
        out
    }

    #[test]
    fn test_clip_region_matches_tangent_angle() {
        // Sphere of radius 1 at depth 5 on the axis: tan = 1 / sqrt(24).
        let (lo, hi) = clip_region(0.0, 5.0, 1.0, 1.0);
        let t = 1.0 / 24.0f32.sqrt();
        assert_relative_eq!(lo, -t, epsilon = 1e-5);
        assert_relative_eq!(hi, t, epsilon = 1e-5);
    }

    #[test]
    fn test_clip_region_off_axis_bounds_the_sphere() {
        let (lo, hi) = clip_region(3.0, 6.0, 1.0, 1.0);
        // The center projects to 0.5 and must lie strictly inside.
        assert!(lo < 0.5 && hi > 0.5);
        // Tangents of 3 +- 1 over the same depth are looser than the exact bound.
        assert!(lo > 2.0 / 6.0 - 0.1);
        assert!(hi < 4.0 / 6.0 + 0.1);
    }

    #[test]
    fn test_clip_region_with_eye_inside_is_full_screen() {
        assert_eq!(clip_region(0.2, 0.3, 1.0, 1.0), (-1.0, 1.0));
        assert_eq!(clip_region(0.0, 0.0, 1.0, 1.0), (-1.0, 1.0));
    }

    #[test]
    fn test_centered_light_covers_two_by_two_by_two_tiles() {
        let mut grid = TileGrid::new(TileGridConfig::new(4, 4, 4));
        let camera = camera();
        let light = Sphere::new(Vec3::new(0.0, 0.0, -5.0), 1.0);

        let range = light_tile_range(grid.config(), &camera, &light).unwrap();
        assert_eq!(range.min, [1, 1, 1]);
        assert_eq!(range.max, [2, 2, 2]);

        let pool = TaskPool::new(2).unwrap();
        let stats = cluster_lights(&pool, &mut grid, &camera, &[light], &[]);
        assert_eq!(stats.tested, 8);
        assert_eq!(stats.appended, 8);

        let entries = drain_all(&grid);
        assert_eq!(entries.len(), 8);
        for (tile, kind, index) in entries {
            assert_eq!(kind, ClusterLightKind::Point);
            assert_eq!(index, 0);
            let x = tile % 4;
            let y = (tile / 4) % 4;
            let z = tile / 16;
            assert!(range.contains(x as u32, y as u32, z as u32));
        }
    }

    #[test]
    fn test_light_outside_depth_range_has_no_tiles() {
        let grid = TileGridConfig::new(4, 4, 4);
        let camera = camera();
        assert!(light_tile_range(&grid, &camera, &Sphere::new(Vec3::new(0.0, 0.0, -11.0), 1.0)).is_none());
        assert!(light_tile_range(&grid, &camera, &Sphere::new(Vec3::new(0.0, 0.0, 2.0), 1.0)).is_none());
    }

    #[test]
    fn test_separation_test_rejects_far_tile_and_keeps_touching_one() {
        let grid = TileGridConfig::new(4, 4, 4);
        let camera = camera();
        let light = Sphere::new(Vec3::new(0.0, 0.0, -5.0), 1.0);
        // Tile containing the light center.
        assert!(light_reaches_tile(&light, &tile_bounds(&grid, &camera, 1, 1, 1)));
        // Top-left corner tile at the far end of the grid.
        assert!(!light_reaches_tile(&light, &tile_bounds(&grid, &camera, 0, 0, 3)));
    }

    #[test]
    fn test_tile_rows_run_top_down() {
        let grid = TileGridConfig::new(4, 4, 4);
        let camera = camera();
        // A small light high up on the screen lands in row 0.
        let light = Sphere::new(Vec3::new(0.0, 4.0, -5.0), 0.25);
        let range = light_tile_range(&grid, &camera, &light).unwrap();
        assert_eq!(range.min[1], 0);
        assert_eq!(range.max[1], 0);
    }

    #[test]
    fn test_every_point_of_a_light_is_covered() {
        // Completeness: sample points inside each sphere and check the tile
        // holding the sample received the light.
        let config = TileGridConfig::new(8, 6, 8);
        let mut grid = TileGrid::new(config);
        let camera = camera();
        let lights: Vec<Sphere> = (0..12)
            .map(|i| {
                let t = i as f32;
                Sphere::new(
                    Vec3::new((t * 0.9).sin() * 3.0, (t * 0.5).cos() * 2.0, -2.0 - t * 0.5),
                    0.4 + (i % 3) as f32 * 0.3,
                )
            })
            .collect();
        let pool = TaskPool::new(3).unwrap();
        cluster_lights(&pool, &mut grid, &camera, &lights, &[]);
        let mut assigned = std::collections::HashSet::new();
        for tile in 0..grid.tile_count() {
            for index in grid.drain_tile(ClusterLightKind::Point, tile) {
                assigned.insert((tile, index));
            }
        }

        let (sx, sy) = camera.projection_scale();
        for (index, light) in lights.iter().enumerate() {
            let range = light_tile_range(&config, &camera, light);
            for s in 0..64 {
                let u = s as f32 / 64.0;
                let dir = Vec3::new(
                    (u * 37.0).sin(),
                    (u * 53.0).cos(),
                    (u * 11.0).sin() * 0.8,
                )
                .normalize();
                let p = light.center + dir * (light.radius * 0.95);
                let d = -p.z;
                if d <= camera.near || d >= camera.far {
                    continue;
                }
                let (nx, ny) = (p.x * sx / d, p.y * sy / d);
                if nx.abs() >= 1.0 || ny.abs() >= 1.0 {
                    continue;
                }
                let x = ndc_to_tile(nx, config.width);
                let y = ndc_to_tile(-ny, config.height);
                let z = config.slice_of_depth(d, camera.near, camera.far);
                let range = range.expect("a visible sample implies a range");
                assert!(range.contains(x, y, z), "light {index} sample outside its range");
                assert!(
                    assigned.contains(&(config.tile_index(x, y, z), index as u32)),
                    "light {index} missing from tile ({x}, {y}, {z})"
                );
            }
        }
    }

    #[test]
    fn test_spot_lights_use_their_own_lists() {
        let mut grid = TileGrid::new(TileGridConfig::new(2, 2, 2));
        let camera = camera();
        let light = Sphere::new(Vec3::new(0.0, 0.0, -5.0), 0.5);
        let pool = TaskPool::new(1).unwrap();
        cluster_lights(&pool, &mut grid, &camera, &[], &[light]);
        let entries = drain_all(&grid);
        assert!(!entries.is_empty());
        assert!(entries.iter().all(|(_, kind, _)| *kind == ClusterLightKind::Spot));
    }
}
