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

//! # Tessera Agents
//!
//! The agents own long-lived state and decide, frame after frame, which lane
//! runs when. The [`render_agent::RenderAgent`] drains the camera queue, fans
//! light preparation out to the worker pool and records every pass of every
//! camera on the device context it is given.

#![warn(missing_docs)]

pub mod render_agent;

pub use render_agent::{
    CameraQueue, CameraRequest, FrameStats, Projection, RenderAgent, RenderContext,
};
