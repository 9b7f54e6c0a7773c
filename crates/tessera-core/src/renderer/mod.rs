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

//! Backend-agnostic rendering contracts of the scheduler.
//!
//! This module defines the data the scheduler exchanges with a graphics
//! backend: the [`GraphicsDevice`] and [`DeviceContext`] traits, the resource
//! and state descriptors they accept, the GPU layouts of the light grid, and
//! the renderer settings. Concrete backends implement the traits; the lanes
//! and the render agent only ever talk to the traits.

pub mod api;
pub mod error;
pub mod forward_plus;
pub mod light;
pub mod settings;
pub mod traits;

pub use self::api::*;
pub use self::error::{RenderError, ResourceError};
pub use self::forward_plus::{
    DepthSlicing, GpuDirectionalLight, GpuPointLight, GpuSpotLight, GpuTileInfo,
    LightGridConstants, TileGridConfig,
};
pub use self::light::{DirectionalLight, LightType, PointLight, SpotLight};
pub use self::settings::{RendererSettings, SettingsError};
pub use self::traits::{DeviceContext, GraphicsDevice};
