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

//! Ownership of GPU-side resources behind generation-checked handles.

mod storage;

pub use storage::*;

use tessera_core::renderer::ResourceError;
use thiserror::Error;

/// An error returned by a resource loader.
///
/// A failed load leaves its handle "not ready" until the cache is reloaded.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The resource the loader was asked for does not exist.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// The resource description is malformed.
    #[error("Invalid resource data: {0}")]
    InvalidData(String),

    /// A dependency of the resource is not loaded yet or failed to load.
    #[error("Dependency not ready: {0}")]
    DependencyNotReady(String),

    /// The device failed to create a GPU object.
    #[error("Device error: {0}")]
    Device(#[from] ResourceError),
}
