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

//! # Tessera Lanes
//!
//! The hot-path stages of the scheduler. Every stage is a plain function or a
//! small value type driven by the render agent once per camera:
//!
//! 1. [`render_lane::cull_spheres`] tests light bounds against the frustum.
//! 2. [`render_lane::cluster_lights`] bins visible lights into the tile grid.
//! 3. [`render_lane::LightBuffer`] flattens the grid for the GPU.
//! 4. [`render_lane::DrawQueue`] collects draw calls from producers.
//! 5. [`render_lane::DrawBatches`] sorts them into shader runs.
//! 6. [`render_lane::PassExecutor`] runs shader and filter passes.
//!
//! The [`shader`] module holds the load-time side: descriptors, compilation
//! and the materials and visuals draw calls refer to.

#![warn(missing_docs)]

pub mod render_lane;
pub mod shader;

#[cfg(test)]
mod mock;
