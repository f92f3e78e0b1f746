/// Defines the target property for animation data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetPath {
    Translation, // Maps to transform.position
    Rotation,    // Maps to transform.rotation
    Scale,       // Maps to transform.scale
}

impl TargetPath {
    /// Property suffix used in track binding names (`Hips.quaternion`).
    #[must_use]
    pub fn property_name(self) -> &'static str {
        match self {
            Self::Translation => "position",
            Self::Rotation => "quaternion",
            Self::Scale => "scale",
        }
    }

    /// Parses a binding-name property. glTF channel names are accepted too.
    #[must_use]
    pub fn from_property_name(name: &str) -> Option<Self> {
        match name {
            "position" | "translation" => Some(Self::Translation),
            "quaternion" | "rotation" => Some(Self::Rotation),
            "scale" => Some(Self::Scale),
            _ => None,
        }
    }
}
