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

//! Defines the error types of the rendering subsystem.

use crate::renderer::settings::SettingsError;
use crate::tasks::TaskError;
use std::fmt;

/// An error raised by a [`GraphicsDevice`](crate::renderer::GraphicsDevice) while
/// creating, writing or destroying a GPU object.
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceError {
    /// The referenced resource does not exist.
    NotFound,
    /// The handle or ID used to reference a resource is invalid.
    InvalidHandle,
    /// The device could not allocate memory for the resource.
    OutOfMemory,
    /// An error originating from the specific graphics backend implementation.
    BackendError(String),
    /// A write or copy went past the end of the resource.
    OutOfBounds,
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceError::NotFound => write!(f, "Resource not found with ID."),
            ResourceError::InvalidHandle => write!(f, "Invalid resource handle or ID."),
            ResourceError::OutOfMemory => write!(f, "Out of GPU memory."),
            ResourceError::BackendError(msg) => {
                write!(f, "Backend-specific resource error: {msg}")
            }
            ResourceError::OutOfBounds => write!(f, "Resource access out of bounds."),
        }
    }
}

impl std::error::Error for ResourceError {}

/// A high-level error of the render scheduler.
#[derive(Debug)]
pub enum RenderError {
    /// A GPU resource operation failed.
    Resource(ResourceError),
    /// The renderer settings could not be loaded.
    Settings(SettingsError),
    /// The worker pool could not be created or a task failed.
    Task(TaskError),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::Resource(err) => {
                write!(f, "Graphics resource operation failed: {err}")
            }
            RenderError::Settings(err) => write!(f, "Invalid renderer settings: {err}"),
            RenderError::Task(err) => write!(f, "Worker pool failure: {err}"),
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::Resource(err) => Some(err),
            RenderError::Settings(err) => Some(err),
            RenderError::Task(err) => Some(err),
        }
    }
}

impl From<ResourceError> for RenderError {
    fn from(err: ResourceError) -> Self {
        RenderError::Resource(err)
    }
}

impl From<SettingsError> for RenderError {
    fn from(err: SettingsError) -> Self {
        RenderError::Settings(err)
    }
}

impl From<TaskError> for RenderError {
    fn from(err: TaskError) -> Self {
        RenderError::Task(err)
    }
}
