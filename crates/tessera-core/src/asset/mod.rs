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

//! Resource handle primitives.
//!
//! The cache that issues and resolves handles lives in `tessera-data`; this
//! module only defines the vocabulary shared by every crate.

mod handle;

pub use handle::*;

/// A marker trait for types that can be owned by a resource cache.
///
/// `Send + Sync + 'static` lets resources be built on worker threads and read
/// from any thread while a background reload replaces them.
pub trait Asset: Send + Sync + 'static {}
