use glam::{Mat4, Vec3};

use crate::scene::bounds::BoundingBox;

/// Camera framing parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FramingConfig {
    /// Multiplier applied to the subject height before fitting it into the
    /// vertical field of view.
    pub padding: f32,
}

impl Default for FramingConfig {
    fn default() -> Self {
        Self { padding: 1.2 }
    }
}

/// A perspective camera looking at a target point.
///
/// Only the state needed to frame a posed avatar is kept here. Projection
/// and view matrices are derived on demand.
#[derive(Debug, Clone)]
pub struct Camera {
    /// Vertical field of view in radians
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,

    pub position: Vec3,
    pub target: Vec3,
}

impl Camera {
    /// Creates a perspective camera. `fov` is given in degrees.
    #[must_use]
    pub fn new_perspective(fov: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            fov: fov.to_radians(),
            aspect,
            near,
            far,
            position: Vec3::new(0.0, 1.4, 3.0),
            target: Vec3::new(0.0, 1.4, 0.0),
        }
    }

    #[must_use]
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov, self.aspect, self.near, self.far)
    }

    #[must_use]
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, Vec3::Y)
    }

    /// Distance at which a subject of `height` fills the vertical field of
    /// view once scaled by `padding`.
    #[must_use]
    pub fn fit_distance(&self, height: f32, padding: f32) -> f32 {
        (height * padding) / (2.0 * (self.fov / 2.0).tan())
    }

    /// Moves the camera in front of `bounds` (along +Z from its center) so
    /// the box height fits the view, and tightens the clip planes around it.
    ///
    /// A degenerate height falls back to one unit. Returns the chosen
    /// distance.
    pub fn frame_bounds(&mut self, bounds: &BoundingBox, config: FramingConfig) -> f32 {
        let center = bounds.center();
        let size = bounds.size();
        let height = if size.y > 0.0 { size.y } else { 1.0 };

        let distance = self.fit_distance(height, config.padding);

        self.position = center + Vec3::Z * distance;
        self.target = center;
        self.near = distance / 10.0;
        self.far = distance * 10.0;

        distance
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new_perspective(35.0, 1.0, 0.1, 100.0)
    }
}
