use serde::{Deserialize, Serialize};
use slotmap::{new_key_type, SlotMap};
use strum_macros::{AsRefStr, EnumIter};

use crate::framework::math::Transform;


// ============================================================================================
// Primitive Pool
// ============================================================================================

new_key_type! {
    /// Handle of a primitive. Registration and deregistration compare primitives by this key.
    pub struct PrimitiveId;
}
pub type PrimitivePool = SlotMap<PrimitiveId, Primitive>;


// ============================================================================================
// Primitive Kind
// ============================================================================================

/// Shape of a primitive, the discriminant is the value the shading stage switches on.
#[repr(u32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, AsRefStr, EnumIter, Serialize, Deserialize)]
pub enum PrimitiveKind {
    /// `params.x` is the radius
    Sphere = 0,
    /// `params.x` is the ring radius, `params.y` the tube radius
    Torus  = 1,
    /// `params` are the half-extents
    Box    = 2,
    /// `params` is the plane normal in local space, the offset comes from the transform
    Plane  = 3,
}

impl PrimitiveKind {
    pub fn to_index(self) -> u32 {
        self as u32
    }
}


// ============================================================================================
// Primitive
// ============================================================================================

/// One implicit surface instance.
///
/// Setters of shape, color and kind mark the primitive dirty, setting the transform marks it as moved.
/// Both flags are cleared only by the frame driver after it consumed them. Values are not validated, a
/// degenerate shape is a rendering concern.
#[derive(Clone, Debug, PartialEq)]
pub struct Primitive {
    kind:              PrimitiveKind,
    params:            glam::Vec3,
    color:             glam::Vec4,
    transform:         Transform,
    dirty:             bool,
    transform_changed: bool,
}

// Constructors
impl Primitive {
    pub const DEFAULT_COLOR: glam::Vec4 = glam::Vec4::new(0.8, 0.8, 0.8, 1.0);

    pub fn new(kind: PrimitiveKind, params: glam::Vec3, color: glam::Vec4) -> Self {
        Self {
            kind,
            params,
            color,
            transform:         Transform::IDENTITY,
            dirty:             false,
            transform_changed: false,
        }
    }

    pub fn sphere(radius: f32) -> Self {
        Self::new(PrimitiveKind::Sphere, glam::Vec3::new(radius, 0.0, 0.0), Self::DEFAULT_COLOR)
    }

    pub fn torus(ring_radius: f32, tube_radius: f32) -> Self {
        Self::new(PrimitiveKind::Torus, glam::Vec3::new(ring_radius, tube_radius, 0.0), Self::DEFAULT_COLOR)
    }

    pub fn cuboid(half_extents: glam::Vec3) -> Self {
        Self::new(PrimitiveKind::Box, half_extents, Self::DEFAULT_COLOR)
    }

    pub fn plane(normal: glam::Vec3) -> Self {
        Self::new(PrimitiveKind::Plane, normal, Self::DEFAULT_COLOR)
    }

    pub fn with_color(mut self, color: glam::Vec4) -> Self {
        self.color = color;
        self
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }
}

// Getters
impl Primitive {
    pub fn kind(&self)      -> PrimitiveKind { self.kind }
    pub fn params(&self)    -> glam::Vec3    { self.params }
    pub fn color(&self)     -> glam::Vec4    { self.color }
    pub fn transform(&self) -> &Transform    { &self.transform }

    /// Local-to-world matrix of the current transform.
    pub fn local_to_world(&self) -> glam::Mat4 {
        self.transform.as_mat()
    }
}

// Setters
impl Primitive {
    pub fn set_kind(&mut self, kind: PrimitiveKind) {
        self.kind = kind;
        self.dirty = true;
    }

    pub fn set_params(&mut self, params: glam::Vec3) {
        self.params = params;
        self.dirty = true;
    }

    pub fn set_color(&mut self, color: glam::Vec4) {
        self.color = color;
        self.dirty = true;
    }

    /// Called by the scene whenever position, rotation or scale changes.
    pub fn set_transform(&mut self, transform: Transform) {
        self.transform = transform;
        self.transform_changed = true;
    }
}

// Change tracking
impl Primitive {
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn set_dirty(&mut self, dirty: bool) {
        self.dirty = dirty;
    }

    pub fn has_transform_changed(&self) -> bool {
        self.transform_changed
    }

    pub fn clear_transform_changed(&mut self) {
        self.transform_changed = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_setters_mark_dirty_but_not_moved() {
        let mut primitive = Primitive::sphere(1.0);
        assert!(!primitive.is_dirty());

        primitive.set_color(glam::Vec4::new(1.0, 0.0, 0.0, 1.0));
        assert!(primitive.is_dirty());
        assert!(!primitive.has_transform_changed());

        primitive.set_dirty(false);
        primitive.set_params(glam::Vec3::splat(2.0));
        assert!(primitive.is_dirty());

        primitive.set_dirty(false);
        primitive.set_kind(PrimitiveKind::Torus);
        assert!(primitive.is_dirty());
    }

    #[test]
    fn moving_marks_transform_only() {
        let mut primitive = Primitive::cuboid(glam::Vec3::ONE);

        primitive.set_transform(Transform::from_position(glam::Vec3::Y));

        assert!(primitive.has_transform_changed());
        assert!(!primitive.is_dirty());
        primitive.clear_transform_changed();
        assert!(!primitive.has_transform_changed());
    }

    #[test]
    fn kind_indices_are_stable() {
        assert_eq!(PrimitiveKind::Sphere.to_index(), 0);
        assert_eq!(PrimitiveKind::Torus.to_index(), 1);
        assert_eq!(PrimitiveKind::Box.to_index(), 2);
        assert_eq!(PrimitiveKind::Plane.to_index(), 3);
    }
}
