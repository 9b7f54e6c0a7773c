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

//! Rendering lane, the per-camera hot path of the scheduler.

mod batching;
mod clustering;
mod culling;
mod draw_queue;
mod light_buffer;
mod pass_executor;
mod world;

pub use batching::*;
pub use clustering::*;
pub use culling::*;
pub use draw_queue::*;
pub use light_buffer::*;
pub use pass_executor::*;
pub use world::*;
