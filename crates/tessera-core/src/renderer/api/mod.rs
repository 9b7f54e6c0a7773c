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

//! Backend-agnostic rendering API.
//!
//! - **[`resource`]**: GPU object identifiers and their descriptors.
//! - **[`pipeline`]**: programs, input layouts and fixed-function state.
//! - **[`command`]**: draw commands and clear flags.
//! - **[`constants`]**: constant buffer layouts shared with shaders.

pub mod command;
pub mod constants;
pub mod pipeline;
pub mod resource;

pub use self::command::*;
pub use self::constants::*;
pub use self::pipeline::*;
pub use self::resource::*;
