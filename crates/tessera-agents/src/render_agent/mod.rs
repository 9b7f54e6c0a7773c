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

//! Acts as the **[A]gent** for the rendering subsystem.
//!
//! The agent owns the [`RenderContext`] (device, worker pool and every cache)
//! and drives the lanes of `tessera-lanes` once per queued camera:
//!
//! 1. light preparation, as three pool tasks joined before clustering;
//! 2. tile clustering and light buffer upload, only when a lit shader draws;
//! 3. draw collection from every registered producer, sorting and batching;
//! 4. shader passes, then filter passes;
//!
//! and finally composites the result onto the back buffer.

mod agent;
mod camera;
mod context;
mod light_preparation;

pub use agent::*;
pub use camera::*;
pub use context::*;
pub use light_preparation::*;
