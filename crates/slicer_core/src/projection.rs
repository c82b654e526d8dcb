//! Plane-local basis construction and 2D projection.
//!
//! The interface consumed by 2D output paths: a view definition (plane
//! normal + up hint) becomes an orthonormal basis, and sliced 3D segments
//! project to plane-local or pixel coordinates.

use glam::{Vec2, Vec3};

use crate::types::Segment3D;

/// Orthonormal plane-local coordinate frame.
#[derive(Clone, Copy, Debug)]
pub struct LocalBasis {
  pub x_axis: Vec3,
  pub y_axis: Vec3,
  pub z_axis: Vec3,
}

/// Build an orthonormal basis from a plane normal and an up hint.
///
/// The up vector is re-orthogonalized against the normal, so callers may
/// pass any vector that is not parallel to the normal.
pub fn build_local_basis(plane_normal: Vec3, view_up: Vec3) -> LocalBasis {
  let z_axis = plane_normal.normalize_or_zero();

  let mut x_axis = view_up.cross(z_axis).normalize_or_zero();
  let y_axis = z_axis.cross(x_axis).normalize_or_zero();
  x_axis = y_axis.cross(z_axis).normalize_or_zero();

  LocalBasis {
    x_axis,
    y_axis,
    z_axis,
  }
}

/// Project a 3D point to plane-local 2D coordinates relative to `anchor`.
#[inline]
pub fn project_point(point: Vec3, anchor: Vec3, basis: &LocalBasis) -> Vec2 {
  let relative = point - anchor;
  Vec2::new(relative.dot(basis.x_axis), relative.dot(basis.y_axis))
}

/// Map plane-local coordinates to pixel space (y-down, origin centered).
#[inline]
pub fn to_image_coord(point: Vec2, width: u32, height: u32, scale: f32) -> Vec2 {
  let cx = width as f32 / 2.0;
  let cy = height as f32 / 2.0;
  Vec2::new(cx + point.x * scale, cy - point.y * scale)
}

/// Project 3D segments into pixel space.
pub fn project_segments(
  segments: &[Segment3D],
  anchor: Vec3,
  basis: &LocalBasis,
  width: u32,
  height: u32,
  scale: f32,
) -> Vec<[Vec2; 2]> {
  segments
    .iter()
    .map(|seg| {
      let start = project_point(seg.start, anchor, basis);
      let end = project_point(seg.end, anchor, basis);
      [
        to_image_coord(start, width, height, scale),
        to_image_coord(end, width, height, scale),
      ]
    })
    .collect()
}

#[cfg(test)]
#[path = "projection_test.rs"]
mod projection_test;
