use serde::{Deserialize, Serialize};

/// Placement of a primitive in the world, the source of its local-to-world matrix.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Transform {
    pub position: glam::Vec3,
    pub rotation: glam::Quat,
    pub scale:    glam::Vec3,
}

// Constants
impl Transform {
    pub const IDENTITY: Self = Self {
        position: glam::Vec3::ZERO,
        rotation: glam::Quat::IDENTITY,
        scale:    glam::Vec3::ONE,
    };
}

// Factories
impl Transform {
    pub fn from_position(position: glam::Vec3) -> Self {
        Self { position, ..Self::IDENTITY }
    }

    pub fn from_uniform_scale(scale: f32) -> Self {
        Self { scale: glam::Vec3::splat(scale), ..Self::IDENTITY }
    }
}

// Getters
impl Transform {
    /// Local-to-world matrix
    #[inline]
    pub fn as_mat(&self) -> glam::Mat4 {
        glam::Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }

    /// World-to-local matrix
    #[inline]
    pub fn as_inverse_mat(&self) -> glam::Mat4 {
        self.as_mat().inverse()
    }
}

// Builders
impl Transform {
    pub fn with_position(&self, position: glam::Vec3) -> Self {
        Self { position, ..*self }
    }
    pub fn with_rotation(&self, rotation: glam::Quat) -> Self {
        Self { rotation, ..*self }
    }
    pub fn with_scale(&self, scale: glam::Vec3) -> Self {
        Self { scale, ..*self }
    }
}

// Operations
impl Transform {
    #[inline]
    pub fn translate(&self, translation: glam::Vec3) -> Self {
        Self { position: self.position + translation, ..*self }
    }

    #[inline]
    pub fn rotate(&self, rotation: glam::Quat) -> Self {
        Self { rotation: (self.rotation * rotation).normalize(), ..*self }
    }
}

impl Default for Transform {
    fn default() -> Self { Self::IDENTITY }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inverse_matrix_maps_world_back_to_local() {
        let transform = Transform::from_position(glam::Vec3::new(1.0, 2.0, 3.0))
            .with_rotation(glam::Quat::from_rotation_y(0.7))
            .with_scale(glam::Vec3::splat(2.0));
        let local = glam::Vec3::new(0.5, -0.25, 1.0);

        let world = transform.as_mat().transform_point3(local);
        let back = transform.as_inverse_mat().transform_point3(world);

        assert!(back.abs_diff_eq(local, 1e-5));
    }

    #[test]
    fn missing_fields_deserialize_to_identity() {
        let transform: Transform = serde_json::from_str(r#"{ "position": [1.0, 0.0, 0.0] }"#).unwrap();

        assert_eq!(transform, Transform::from_position(glam::Vec3::X));
    }
}
