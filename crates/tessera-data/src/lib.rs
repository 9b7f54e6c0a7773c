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

//! # Tessera Data
//!
//! Owns the long-lived state of the scheduler: the generation-checked
//! [`ResourceCache`](assets::ResourceCache) behind every shader, material and
//! visual handle, and the [`LightTracker`](population::LightTracker) fed by
//! the scene's population signals.

#![warn(missing_docs)]

pub mod assets;
pub mod population;

pub use assets::{content_hash, LoadError, LoadMode, ResourceCache};
pub use population::{Component, ComponentKind, EntityId, LightSnapshot, LightTracker};
