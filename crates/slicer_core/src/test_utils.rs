//! Shared fixtures for unit tests.

use glam::Vec3;

use crate::types::MeshData;

/// Axis-aligned cube of the given half-extent centered at `center`,
/// 8 vertices / 12 triangles.
pub fn cube(half: f32, center: Vec3) -> MeshData {
  let corners = [
    [-half, -half, -half],
    [half, -half, -half],
    [half, half, -half],
    [-half, half, -half],
    [-half, -half, half],
    [half, -half, half],
    [half, half, half],
    [-half, half, half],
  ];

  let mut vertices = Vec::with_capacity(24);
  for c in corners {
    vertices.push(c[0] + center.x);
    vertices.push(c[1] + center.y);
    vertices.push(c[2] + center.z);
  }

  let indices = vec![
    0, 1, 2, 0, 2, 3, // bottom (z = -half)
    4, 6, 5, 4, 7, 6, // top (z = +half)
    0, 5, 1, 0, 4, 5, // front (y = -half)
    2, 6, 7, 2, 7, 3, // back (y = +half)
    0, 3, 7, 0, 7, 4, // left (x = -half)
    1, 5, 6, 1, 6, 2, // right (x = +half)
  ];

  MeshData::new(vertices, indices)
}

/// A cube of half-extent 50 at the origin, the canonical slicing fixture.
pub fn test_cube() -> MeshData {
  cube(50.0, Vec3::ZERO)
}

/// Min/max of one coordinate axis over all segment endpoints.
pub fn coord_range(segments: &[crate::types::Segment3D], axis: usize) -> (f32, f32) {
  let mut min = f32::INFINITY;
  let mut max = f32::NEG_INFINITY;
  for seg in segments {
    for p in [seg.start, seg.end] {
      let v = p[axis];
      min = min.min(v);
      max = max.max(v);
    }
  }
  (min, max)
}
