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

//! Shaders, filters, materials and visuals.
//!
//! Shaders and filters are described by serde descriptors and compiled once,
//! at load time, into GPU objects and [`ShaderPass`] lists. Every problem with
//! a description is reported then as a [`ConfigError`]; the per-frame path
//! only ever sees compiled objects.

mod descriptor;
mod library;
mod material;
mod pass;

pub use descriptor::*;
pub use library::*;
pub use material::*;
pub use pass::*;

use serde::{Deserialize, Serialize};
use tessera_core::renderer::ResourceError;
use thiserror::Error;

/// What a pass does once its state is bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PassMode {
    /// Draws every call of the shader's run.
    Forward,
    /// Draws one full-screen triangle.
    Deferred,
    /// Dispatches the pass's compute program.
    Compute,
    /// Does nothing.
    None,
}

/// A problem found while compiling a shader or filter description.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required field is absent.
    #[error("{owner}: missing parameter '{parameter}'")]
    MissingParameter {
        /// The shader or filter pass the field belongs to.
        owner: String,
        /// The missing field.
        parameter: &'static str,
    },

    /// A field holds a value that cannot be used.
    #[error("{owner}: invalid parameter '{parameter}': {reason}")]
    InvalidParameter {
        /// The shader or filter pass the field belongs to.
        owner: String,
        /// The offending field.
        parameter: &'static str,
        /// What is wrong with it.
        reason: String,
    },

    /// A pass refers to a target or buffer its shader does not declare.
    #[error("{owner}: target '{target}' is not listed")]
    UnlistedTarget {
        /// The shader or filter pass referring to it.
        owner: String,
        /// The unknown name.
        target: String,
    },

    /// A shader requires a shader that is neither loaded nor being loaded.
    #[error("shader '{shader}' requires unknown shader '{dependency}'")]
    UnknownDependency {
        /// The requiring shader.
        shader: String,
        /// The missing shader.
        dependency: String,
    },

    /// Shaders require each other in a cycle.
    #[error("cyclic shader dependency between: {}", .shaders.join(", "))]
    CyclicDependency {
        /// The shaders that could not be ordered.
        shaders: Vec<String>,
    },

    /// The device failed to create an object the description asks for.
    #[error("{owner}: device error: {source}")]
    Device {
        /// The shader or filter being compiled.
        owner: String,
        /// The device failure.
        #[source]
        source: ResourceError,
    },
}
