//! Tests for the plane-triangle intersection predicate.

use glam::Vec3;

use super::*;

fn z_plane() -> Plane {
  Plane::new(Vec3::Z, Vec3::ZERO)
}

#[test]
fn straddling_triangle_produces_segment_on_plane() {
  let seg = intersect_triangle(
    Vec3::new(0.0, 0.0, -1.0),
    Vec3::new(0.0, 0.0, 1.0),
    Vec3::new(1.0, 0.0, 1.0),
    &z_plane(),
  )
  .expect("triangle crosses the plane");

  assert!(seg.start.z.abs() < 1e-6);
  assert!(seg.end.z.abs() < 1e-6);
  assert!(seg.start.distance(seg.end) > 0.0);
}

#[test]
fn crossing_points_interpolate_along_edges() {
  // Edge v0-v1 crosses at the origin, edge v2-v0 crosses halfway.
  let seg = intersect_triangle(
    Vec3::new(0.0, 0.0, -1.0),
    Vec3::new(0.0, 0.0, 1.0),
    Vec3::new(1.0, 0.0, 1.0),
    &z_plane(),
  )
  .unwrap();

  assert!(seg.start.distance(Vec3::ZERO) < 1e-6);
  assert!(seg.end.distance(Vec3::new(0.5, 0.0, 0.0)) < 1e-6);
}

#[test]
fn all_vertices_above_yields_nothing() {
  let result = intersect_triangle(
    Vec3::new(0.0, 0.0, 1.0),
    Vec3::new(1.0, 0.0, 2.0),
    Vec3::new(0.0, 1.0, 3.0),
    &z_plane(),
  );

  assert!(result.is_none());
}

#[test]
fn all_vertices_below_yields_nothing() {
  let result = intersect_triangle(
    Vec3::new(0.0, 0.0, -1.0),
    Vec3::new(1.0, 0.0, -2.0),
    Vec3::new(0.0, 1.0, -3.0),
    &z_plane(),
  );

  assert!(result.is_none());
}

#[test]
fn coplanar_triangle_yields_nothing() {
  // Emitting a coplanar triangle's own edges would pollute the section.
  let result = intersect_triangle(
    Vec3::new(0.0, 0.0, 0.0),
    Vec3::new(1.0, 0.0, 0.0),
    Vec3::new(0.0, 1.0, 0.0),
    &z_plane(),
  );

  assert!(result.is_none());
}

#[test]
fn on_plane_vertex_joins_edge_crossing() {
  // v0 sits on the plane, edge v1-v2 crosses it.
  let seg = intersect_triangle(
    Vec3::new(0.0, 0.0, 0.0),
    Vec3::new(1.0, 0.0, 1.0),
    Vec3::new(1.0, 0.0, -1.0),
    &z_plane(),
  )
  .expect("one crossing plus one on-plane vertex");

  // Edge crossings are collected before on-plane vertices.
  assert!(seg.start.distance(Vec3::new(1.0, 0.0, 0.0)) < 1e-6);
  assert!(seg.end.distance(Vec3::ZERO) < 1e-6);
}

#[test]
fn single_touching_vertex_yields_nothing() {
  let result = intersect_triangle(
    Vec3::new(0.0, 0.0, 0.0),
    Vec3::new(1.0, 0.0, 1.0),
    Vec3::new(0.0, 1.0, 1.0),
    &z_plane(),
  );

  assert!(result.is_none());
}

#[test]
fn on_plane_edge_uses_both_vertices() {
  // Two vertices on the plane, third below: the shared edge is the section.
  let seg = intersect_triangle(
    Vec3::new(0.0, 0.0, 0.0),
    Vec3::new(1.0, 0.0, 0.0),
    Vec3::new(0.0, 1.0, -1.0),
    &z_plane(),
  )
  .expect("on-plane edge");

  assert!(seg.start.distance(Vec3::ZERO) < 1e-6);
  assert!(seg.end.distance(Vec3::new(1.0, 0.0, 0.0)) < 1e-6);
}

#[test]
fn coincident_crossings_deduplicate() {
  // Degenerate sliver: both crossing edges pass through the same point,
  // leaving fewer than two distinct candidates.
  let result = intersect_triangle(
    Vec3::new(0.0, 0.0, -1.0),
    Vec3::new(0.0, 0.0, -1.0),
    Vec3::new(0.0, 0.0, 1.0),
    &z_plane(),
  );

  assert!(result.is_none());
}

#[test]
fn signed_distance_sign_tracks_side() {
  let plane = Plane::new(Vec3::Z, Vec3::new(0.0, 0.0, 2.0));

  assert!(plane.signed_distance(Vec3::new(0.0, 0.0, 3.0)) > 0.0);
  assert!(plane.signed_distance(Vec3::new(0.0, 0.0, 1.0)) < 0.0);
  assert_eq!(plane.signed_distance(Vec3::new(5.0, 5.0, 2.0)), 0.0);
}
