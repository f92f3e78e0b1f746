use glam::Vec3;

/// Axis-aligned bounding box in world or local space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: Vec3,
    pub max: Vec3,
}

impl BoundingBox {
    /// Builds the tightest box around `points`. Returns `None` for an empty
    /// iterator or when any point is not finite.
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Option<Self> {
        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);
        let mut valid = false;

        for point in points {
            if !point.is_finite() {
                return None;
            }
            min = min.min(point);
            max = max.max(point);
            valid = true;
        }

        valid.then_some(Self { min, max })
    }

    #[must_use]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    #[must_use]
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }
}
