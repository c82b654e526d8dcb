//! Core data types for mesh/plane slicing.

use glam::Vec3;

use crate::intersect::EPSILON;

/// RGBA color in the 0..=1 range, one per mesh.
pub type MeshColor = [f32; 4];

/// Immutable triangle mesh input, owned by the caller.
///
/// `vertices` is a flat sequence of xyz triples; `indices` is a flat
/// sequence of unsigned-integer triples, one per triangle.
#[derive(Clone, Debug, Default)]
pub struct MeshData {
  /// Flat vertex positions (x, y, z, x, y, z, ...).
  pub vertices: Vec<f32>,

  /// Flat triangle indices (3 per triangle), indexing vertex triples.
  pub indices: Vec<u32>,

  /// Optional per-vertex normals, parallel to `vertices`.
  pub normals: Option<Vec<f32>>,
}

impl MeshData {
  pub fn new(vertices: Vec<f32>, indices: Vec<u32>) -> Self {
    Self {
      vertices,
      indices,
      normals: None,
    }
  }

  /// Number of triangles.
  pub fn tri_count(&self) -> usize {
    self.indices.len() / 3
  }

  /// Number of vertices.
  pub fn vertex_count(&self) -> usize {
    self.vertices.len() / 3
  }

  /// Fetch a vertex position by vertex index.
  #[inline]
  pub fn vertex(&self, index: u32) -> Vec3 {
    let i = index as usize * 3;
    Vec3::new(self.vertices[i], self.vertices[i + 1], self.vertices[i + 2])
  }
}

/// A 3D line segment, part of a mesh/plane intersection.
///
/// Segments carry no inherent direction semantics beyond the toggle
/// cancellation rule in [`crate::normalize`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Segment3D {
  pub start: Vec3,
  pub end: Vec3,
}

impl Segment3D {
  pub fn new(start: Vec3, end: Vec3) -> Self {
    Self { start, end }
  }
}

/// A segment tagged with the original index of the mesh that produced it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SegmentEntry {
  pub start: Vec3,
  pub end: Vec3,
  pub mesh_index: u32,
}

impl SegmentEntry {
  pub fn segment(&self) -> Segment3D {
    Segment3D::new(self.start, self.end)
  }
}

/// Axis-aligned bounding box.
///
/// Computed once per mesh and cached alongside chunk metadata so repeated
/// plane culls never rescan vertex data.
#[derive(Clone, Copy, Debug)]
pub struct Aabb {
  pub min: Vec3,
  pub max: Vec3,
}

impl Aabb {
  /// Create an AABB with inverted extents (ready for encapsulation).
  pub fn empty() -> Self {
    Self {
      min: Vec3::splat(f32::INFINITY),
      max: Vec3::splat(f32::NEG_INFINITY),
    }
  }

  pub fn new(min: Vec3, max: Vec3) -> Self {
    Self { min, max }
  }

  /// Compute the bounding box of a flat xyz vertex buffer.
  pub fn from_vertices(vertices: &[f32]) -> Self {
    let mut bbox = Self::empty();
    for triple in vertices.chunks_exact(3) {
      bbox.encapsulate(Vec3::new(triple[0], triple[1], triple[2]));
    }
    bbox
  }

  /// Expand to include a point.
  #[inline]
  pub fn encapsulate(&mut self, point: Vec3) {
    self.min = self.min.min(point);
    self.max = self.max.max(point);
  }

  /// True when min <= max on all axes.
  pub fn is_valid(&self) -> bool {
    self.min.cmple(self.max).all()
  }

  /// True when the box straddles or touches the plane.
  ///
  /// Projects all 8 corners onto `normal` relative to `anchor` and checks
  /// that the projected range covers zero within tolerance. Used to skip
  /// accelerator work for meshes the plane cannot possibly cut.
  pub fn intersects_plane(&self, normal: Vec3, anchor: Vec3) -> bool {
    let mut d_min = f32::INFINITY;
    let mut d_max = f32::NEG_INFINITY;

    for i in 0..8u32 {
      let corner = Vec3::new(
        if i & 1 != 0 { self.max.x } else { self.min.x },
        if i & 2 != 0 { self.max.y } else { self.min.y },
        if i & 4 != 0 { self.max.z } else { self.min.z },
      );
      let d = normal.dot(corner - anchor);
      d_min = d_min.min(d);
      d_max = d_max.max(d);
    }

    d_min <= EPSILON && d_max >= -EPSILON
  }
}

impl Default for Aabb {
  fn default() -> Self {
    Self::empty()
  }
}

/// A view definition: cutting-plane normal plus an "up" hint.
///
/// The up vector is only consumed when building the camera basis for 2D
/// output; the pure slicing path ignores it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewPreset {
  pub plane_normal: Vec3,
  pub view_up: Vec3,
}

/// Standard orthogonal view presets.
pub mod standard_views {
  use super::ViewPreset;
  use glam::Vec3;

  pub const AXIAL: ViewPreset = ViewPreset {
    plane_normal: Vec3::new(0.0, 0.0, -1.0),
    view_up: Vec3::new(0.0, -1.0, 0.0),
  };

  pub const SAGITTAL: ViewPreset = ViewPreset {
    plane_normal: Vec3::new(-1.0, 0.0, 0.0),
    view_up: Vec3::new(0.0, 0.0, 1.0),
  };

  pub const CORONAL: ViewPreset = ViewPreset {
    plane_normal: Vec3::new(0.0, -1.0, 0.0),
    view_up: Vec3::new(0.0, 0.0, 1.0),
  };
}

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;
