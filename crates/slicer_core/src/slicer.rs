//! CPU reference slicer and the backend seam.
//!
//! `slice_mesh` is the synchronous-algorithm entry point; the `MeshSlicer`
//! trait lets callers hold either this CPU form or the GPU engine from
//! `slicer_gpu` behind one interface.

use glam::Vec3;
use rayon::prelude::*;

use crate::error::SliceError;
use crate::intersect::{intersect_triangle, Plane};
use crate::types::{Aabb, MeshData, Segment3D};

/// Compute the cross-section of one mesh with a cutting plane.
///
/// Runs a bounding-box cull first, then the per-triangle intersector over
/// every triangle. Output order follows triangle order here, but consumers
/// must treat it as arbitrary: the GPU backend produces the same segments
/// in whatever order its atomic slot allocation lands them.
pub fn slice_mesh(mesh: &MeshData, normal: Vec3, anchor: Vec3) -> Vec<Segment3D> {
  let bbox = Aabb::from_vertices(&mesh.vertices);
  if !bbox.intersects_plane(normal, anchor) {
    return Vec::new();
  }

  let plane = Plane::new(normal, anchor);
  let mut segments = Vec::new();

  for tri in mesh.indices.chunks_exact(3) {
    let v0 = mesh.vertex(tri[0]);
    let v1 = mesh.vertex(tri[1]);
    let v2 = mesh.vertex(tri[2]);

    if let Some(segment) = intersect_triangle(v0, v1, v2, &plane) {
      segments.push(segment);
    }
  }

  segments
}

/// Slice many meshes against one plane in parallel, one result list per
/// mesh. CPU analogue of a batched accelerator dispatch.
pub fn slice_meshes(meshes: &[MeshData], normal: Vec3, anchor: Vec3) -> Vec<Vec<Segment3D>> {
  meshes
    .par_iter()
    .map(|mesh| slice_mesh(mesh, normal, anchor))
    .collect()
}

/// Backend identifier for a slicer implementation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Backend {
  Cpu,
  Gpu,
}

/// Single-mesh slicer interface shared by CPU and GPU backends.
pub trait MeshSlicer {
  /// Which backend this slicer runs on.
  fn backend(&self) -> Backend;

  /// Upload/prepare one mesh for repeated slicing.
  fn init(&mut self, mesh: &MeshData) -> Result<(), SliceError>;

  /// Slice the prepared mesh with a plane.
  fn slice(&mut self, normal: Vec3, anchor: Vec3) -> Result<Vec<Segment3D>, SliceError>;
}

/// CPU implementation of [`MeshSlicer`].
#[derive(Default)]
pub struct CpuSlicer {
  mesh: Option<MeshData>,
}

impl CpuSlicer {
  pub fn new() -> Self {
    Self::default()
  }
}

impl MeshSlicer for CpuSlicer {
  fn backend(&self) -> Backend {
    Backend::Cpu
  }

  fn init(&mut self, mesh: &MeshData) -> Result<(), SliceError> {
    self.mesh = Some(mesh.clone());
    Ok(())
  }

  fn slice(&mut self, normal: Vec3, anchor: Vec3) -> Result<Vec<Segment3D>, SliceError> {
    let mesh = self.mesh.as_ref().ok_or(SliceError::NotInitialized)?;
    Ok(slice_mesh(mesh, normal, anchor))
  }
}

#[cfg(test)]
#[path = "slicer_test.rs"]
mod slicer_test;
