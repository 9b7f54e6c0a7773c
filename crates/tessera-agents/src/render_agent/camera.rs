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

//! Camera requests and the queue they travel through.

use crossbeam_channel::Sender;
use tessera_core::math::{Mat4, Vec3};
use tessera_core::renderer::TextureId;
use tessera_lanes::render_lane::CameraView;

/// How a camera projects view space to clip space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    /// An explicit projection matrix (right-handed, zero-to-one depth).
    Matrix(Mat4),
    /// A perspective projection built from the request's clip range.
    Perspective {
        /// Vertical field of view in radians.
        fov_y: f32,
        /// Width over height.
        aspect: f32,
    },
}

/// A camera to render this frame.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraRequest {
    /// World to view transform.
    pub view: Mat4,
    /// View to clip transform.
    pub projection: Projection,
    /// Distance of the near plane.
    pub near: f32,
    /// Distance of the far plane.
    pub far: f32,
    /// Texture rendered into instead of the shared screen target.
    pub target: Option<TextureId>,
    /// Name of a shader every draw call of this camera is batched under.
    pub force_shader: Option<String>,
}

impl CameraRequest {
    /// A camera with an explicit projection matrix.
    pub fn new(view: Mat4, projection: Mat4, near: f32, far: f32) -> Self {
        Self {
            view,
            projection: Projection::Matrix(projection),
            near,
            far,
            target: None,
            force_shader: None,
        }
    }

    /// A perspective camera.
    pub fn perspective(view: Mat4, fov_y: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            projection: Projection::Perspective { fov_y, aspect },
            ..Self::new(view, Mat4::IDENTITY, near, far)
        }
    }

    /// A perspective camera at `eye` looking at `target`.
    ///
    /// Returns `None` when the camera sits on its own target or `up` is
    /// parallel to the view direction.
    pub fn look_at(
        eye: Vec3,
        target: Vec3,
        up: Vec3,
        fov_y: f32,
        aspect: f32,
        near: f32,
        far: f32,
    ) -> Option<Self> {
        let view = Mat4::look_at_rh(eye, target, up)?;
        Some(Self::perspective(view, fov_y, aspect, near, far))
    }

    /// Renders into `target` instead of the shared screen target.
    pub fn with_target(mut self, target: TextureId) -> Self {
        self.target = Some(target);
        self
    }

    /// Batches every draw call under the shader called `name`.
    pub fn with_force_shader(mut self, name: impl Into<String>) -> Self {
        self.force_shader = Some(name.into());
        self
    }

    /// The projection matrix, or `None` if it cannot be built.
    pub fn projection_matrix(&self) -> Option<Mat4> {
        match self.projection {
            Projection::Matrix(m) => Some(m),
            Projection::Perspective { fov_y, aspect } => {
                Mat4::perspective_rh_zo(fov_y, aspect, self.near, self.far)
            }
        }
    }

    /// Resolves the request into a camera view.
    ///
    /// Degenerate cameras resolve to `None`: a clip range that is not
    /// `0 < near < far`, a projection that does not scale both axes, or a
    /// view matrix that cannot be inverted.
    pub fn resolve(&self) -> Option<CameraView> {
        if !(self.near.is_finite() && self.far.is_finite() && self.near > 0.0 && self.far > self.near)
        {
            return None;
        }
        let projection = self.projection_matrix()?;
        let (sx, sy) = (projection.cols[0].x, projection.cols[1].y);
        if !(sx.is_finite() && sy.is_finite()) || sx == 0.0 || sy == 0.0 {
            return None;
        }
        self.view.inverse()?;
        Some(CameraView::new(self.view, projection, self.near, self.far))
    }
}

/// A cloneable handle that queues cameras from any thread.
///
/// Requests are processed strictly in the order they were queued, each one
/// completely before the next.
#[derive(Debug, Clone)]
pub struct CameraQueue {
    sender: Sender<CameraRequest>,
}

impl CameraQueue {
    pub(crate) fn new(sender: Sender<CameraRequest>) -> Self {
        Self { sender }
    }

    /// Queues a camera for the next frame.
    ///
    /// Returns `false` once the agent is gone.
    pub fn push(&self, request: CameraRequest) -> bool {
        self.sender.send(request).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perspective_camera_resolves() {
        let camera = CameraRequest::perspective(Mat4::IDENTITY, 90f32.to_radians(), 1.0, 1.0, 9.0)
            .resolve()
            .unwrap();
        let (sx, sy) = camera.projection_scale();
        approx::assert_relative_eq!(sx, 1.0, epsilon = 1e-5);
        approx::assert_relative_eq!(sy, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_degenerate_cameras_are_rejected() {
        let fov = 60f32.to_radians();
        assert!(CameraRequest::perspective(Mat4::IDENTITY, fov, 1.0, 0.0, 10.0)
            .resolve()
            .is_none());
        assert!(CameraRequest::perspective(Mat4::IDENTITY, fov, 1.0, 5.0, 5.0)
            .resolve()
            .is_none());
        assert!(CameraRequest::perspective(Mat4::IDENTITY, fov, 0.0, 0.1, 10.0)
            .resolve()
            .is_none());
        assert!(CameraRequest::new(Mat4::ZERO, Mat4::IDENTITY, 0.1, 10.0)
            .resolve()
            .is_none());
        assert!(CameraRequest::new(Mat4::IDENTITY, Mat4::ZERO, 0.1, 10.0)
            .resolve()
            .is_none());
    }

    #[test]
    fn test_camera_on_its_target_is_degenerate() {
        let p = Vec3::new(1.0, 2.0, 3.0);
        assert!(CameraRequest::look_at(p, p, Vec3::Y, 1.0, 1.0, 0.1, 10.0).is_none());
        assert!(CameraRequest::look_at(p, Vec3::ZERO, Vec3::Y, 1.0, 1.0, 0.1, 10.0).is_some());
    }

    #[test]
    fn test_queue_preserves_order() {
        let (sender, receiver) = crossbeam_channel::unbounded();
        let queue = CameraQueue::new(sender);
        for far in [10.0, 20.0, 30.0] {
            assert!(queue.push(CameraRequest::new(Mat4::IDENTITY, Mat4::IDENTITY, 0.1, far)));
        }
        let fars: Vec<f32> = receiver.try_iter().map(|r| r.far).collect();
        assert_eq!(fars, vec![10.0, 20.0, 30.0]);
    }
}
