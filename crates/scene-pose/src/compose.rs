//! Matrix composition rules
//!
//! All matrices are column-major `glam::Mat4` and transform column vectors,
//! so `a * b` applies `b` first. Quaternions are `(x, y, z, w)` with `w` the
//! scalar part.

use glam::{Mat4, Quat, Vec3};

/// Compose a local transform from translation, rotation and scale
///
/// Yields `T * R * S`: a point is scaled, then rotated, then translated.
#[inline]
pub fn compose_local(translation: Vec3, rotation: Quat, scale: Vec3) -> Mat4 {
    Mat4::from_scale_rotation_translation(scale, rotation, translation)
}

/// Compose a child's global transform from its parent's global transform
///
/// Yields `parent * local`: the local transform applies first.
#[inline]
pub fn compose_global(parent_global: &Mat4, local: &Mat4) -> Mat4 {
    *parent_global * *local
}

/// Compose a joint matrix for GPU skinning
///
/// Yields `mesh_global_inverse * joint_global * inverse_bind`, which moves a
/// bind-space vertex to the joint's current pose and expresses the result in
/// the mesh node's local space.
#[inline]
pub fn compose_skin(mesh_global_inverse: &Mat4, joint_global: &Mat4, inverse_bind: &Mat4) -> Mat4 {
    *mesh_global_inverse * (*joint_global * *inverse_bind)
}
