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

//! Renderer settings, loadable from RON.
//!
//! ```ron
//! (
//!     tile_grid: (width: 16, height: 8, depth: 32, slicing: Logarithmic),
//!     worker_threads: 4,
//!     screen_width: 1920,
//!     screen_height: 1080,
//!     background_color: (0.1, 0.1, 0.1, 1.0),
//!     filters: ["tonemap"],
//! )
//! ```

use super::forward_plus::TileGridConfig;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// An error raised while loading or validating [`RendererSettings`].
#[derive(Debug)]
pub enum SettingsError {
    /// The settings file could not be read.
    Io(std::io::Error),
    /// The settings text is not valid RON for [`RendererSettings`].
    Parse(ron::error::SpannedError),
    /// A field holds a value the renderer cannot use.
    InvalidValue(String),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::Io(err) => write!(f, "Failed to read renderer settings: {err}"),
            SettingsError::Parse(err) => write!(f, "Failed to parse renderer settings: {err}"),
            SettingsError::InvalidValue(msg) => write!(f, "Invalid renderer setting: {msg}"),
        }
    }
}

impl std::error::Error for SettingsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SettingsError::Io(err) => Some(err),
            SettingsError::Parse(err) => Some(err),
            SettingsError::InvalidValue(_) => None,
        }
    }
}

impl From<std::io::Error> for SettingsError {
    fn from(err: std::io::Error) -> Self {
        SettingsError::Io(err)
    }
}

impl From<ron::error::SpannedError> for SettingsError {
    fn from(err: ron::error::SpannedError) -> Self {
        SettingsError::Parse(err)
    }
}

/// Settings of the render scheduler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererSettings {
    /// Light tile grid dimensions.
    pub tile_grid: TileGridConfig,
    /// Worker thread count. `0` picks the CPU count minus one, at least one.
    pub worker_threads: usize,
    /// Width in pixels that relative-scale shader targets are sized against.
    pub screen_width: u32,
    /// Height in pixels that relative-scale shader targets are sized against.
    pub screen_height: u32,
    /// Flat color every camera output and the empty back buffer is cleared to.
    pub background_color: [f32; 4],
    /// Names of the post-process filters applied to every camera, in order.
    pub filters: Vec<String>,
}

impl Default for RendererSettings {
    fn default() -> Self {
        Self {
            tile_grid: TileGridConfig::default(),
            worker_threads: 0,
            screen_width: 1280,
            screen_height: 720,
            background_color: [0.0, 0.0, 0.0, 1.0],
            filters: Vec::new(),
        }
    }
}

impl RendererSettings {
    /// Parses and validates settings from RON text.
    pub fn from_ron_str(text: &str) -> Result<Self, SettingsError> {
        let settings: Self = ron::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reads, parses and validates a RON settings file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_ron_str(&text)
    }

    /// Checks the values that cannot be expressed by the field types alone.
    pub fn validate(&self) -> Result<(), SettingsError> {
        self.tile_grid.validate()?;
        if self.screen_width == 0 || self.screen_height == 0 {
            return Err(SettingsError::InvalidValue(format!(
                "screen size must be non-zero, got {}x{}",
                self.screen_width, self.screen_height
            )));
        }
        Ok(())
    }

    /// The worker thread count after resolving `0` to a CPU-based default.
    pub fn resolved_worker_threads(&self) -> usize {
        if self.worker_threads > 0 {
            self.worker_threads
        } else {
            num_cpus::get().saturating_sub(1).max(1)
        }
    }
}
