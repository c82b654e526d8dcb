//! Plane-triangle intersection predicate.
//!
//! The reference CPU form; the WGSL kernels in `slicer_gpu` implement the
//! identical decision tree so CPU and GPU backends agree segment-for-segment.

use glam::Vec3;
use smallvec::SmallVec;

use crate::types::Segment3D;

/// Uniform tolerance for on-plane classification, same-side rejection and
/// intersection-point deduplication. These three uses share one constant on
/// purpose; changing them independently is a correctness risk, not a tuning
/// knob.
pub const EPSILON: f32 = 1e-8;

/// A cutting plane given by a unit normal and an anchor point on the plane.
#[derive(Clone, Copy, Debug)]
pub struct Plane {
  pub normal: Vec3,
  pub anchor: Vec3,
}

impl Plane {
  pub fn new(normal: Vec3, anchor: Vec3) -> Self {
    Self { normal, anchor }
  }

  /// Signed distance from a point to the plane; sign indicates side.
  #[inline]
  pub fn signed_distance(&self, point: Vec3) -> f32 {
    self.normal.dot(point - self.anchor)
  }
}

/// Intersect one triangle with a plane.
///
/// Returns at most one segment. Degenerate configurations (all vertices on
/// one side, triangle coplanar with the plane, zero-area triangles, fewer
/// than two distinct intersection points) yield `None`; none of them are
/// errors.
pub fn intersect_triangle(v0: Vec3, v1: Vec3, v2: Vec3, plane: &Plane) -> Option<Segment3D> {
  let d0 = plane.signed_distance(v0);
  let d1 = plane.signed_distance(v1);
  let d2 = plane.signed_distance(v2);

  // All vertices strictly on one side: no intersection.
  if d0 > EPSILON && d1 > EPSILON && d2 > EPSILON {
    return None;
  }
  if d0 < -EPSILON && d1 < -EPSILON && d2 < -EPSILON {
    return None;
  }

  let on0 = d0.abs() <= EPSILON;
  let on1 = d1.abs() <= EPSILON;
  let on2 = d2.abs() <= EPSILON;

  // Triangle coplanar with the cutting plane: emitting its edges (or a
  // diagonal) would pollute the cross-section, so produce nothing.
  if on0 && on1 && on2 {
    return None;
  }

  // Candidate points, in collection order: edge crossings v0v1, v1v2, v2v0,
  // then on-plane vertices. When numeric degeneracy yields more than two
  // candidates, the segment is built from the first two and the rest are
  // discarded.
  let mut points: SmallVec<[Vec3; 6]> = SmallVec::new();

  edge_crossing(v0, v1, d0, d1, &mut points);
  edge_crossing(v1, v2, d1, d2, &mut points);
  edge_crossing(v2, v0, d2, d0, &mut points);

  if on0 {
    push_unique(&mut points, v0);
  }
  if on1 {
    push_unique(&mut points, v1);
  }
  if on2 {
    push_unique(&mut points, v2);
  }

  if points.len() >= 2 {
    Some(Segment3D::new(points[0], points[1]))
  } else {
    None
  }
}

/// Edge-crossing point for one triangle edge.
///
/// Only contributes when both endpoint distances are strictly opposite in
/// sign (magnitude above tolerance); endpoints within tolerance of the
/// plane are handled by the on-plane vertex rule instead.
#[inline]
fn edge_crossing(a: Vec3, b: Vec3, da: f32, db: f32, out: &mut SmallVec<[Vec3; 6]>) {
  if (da > EPSILON && db > EPSILON) || (da < -EPSILON && db < -EPSILON) {
    return;
  }
  if da.abs() <= EPSILON || db.abs() <= EPSILON {
    return;
  }

  let t = da / (da - db);
  push_unique(out, a.lerp(b, t));
}

/// Append a point unless it coincides with an already-collected one.
#[inline]
fn push_unique(points: &mut SmallVec<[Vec3; 6]>, p: Vec3) {
  for existing in points.iter() {
    if existing.distance_squared(p) < EPSILON * EPSILON {
      return;
    }
  }
  points.push(p);
}

#[cfg(test)]
#[path = "intersect_test.rs"]
mod intersect_test;
