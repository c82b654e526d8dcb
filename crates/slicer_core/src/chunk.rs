//! Chunk planner: packs many meshes into accelerator-buffer-bounded batches.
//!
//! Each chunk concatenates the vertex and index buffers of its meshes, with
//! indices rebased by the cumulative vertex count of earlier meshes, so a
//! single dispatch can sweep every triangle of every contained mesh.

use glam::Vec3;

use crate::types::{Aabb, MeshData};

/// Bytes per segment output record in the batch kernel (vec3 start +
/// mesh index + vec3 end + pad). Worst-case output is one record per
/// triangle, so planning budgets segment output at this stride.
pub const SEGMENT_STRIDE: usize = 32;

const DEFAULT_CHUNK_BYTES: usize = 128 * 1024 * 1024;
const DEFAULT_BINDING_BYTES: usize = 128 * 1024 * 1024;
const DEFAULT_BUFFER_BYTES: usize = 256 * 1024 * 1024;

/// Device/resource limits threaded into the planner by the host
/// environment.
#[derive(Clone, Copy, Debug)]
pub struct ChunkLimits {
  /// Soft byte budget for one chunk's combined buffers.
  pub max_chunk_bytes: usize,

  /// Largest single storage-buffer binding the device accepts.
  pub max_binding_bytes: usize,

  /// Largest single buffer the device can allocate.
  pub max_buffer_bytes: usize,
}

impl Default for ChunkLimits {
  fn default() -> Self {
    Self {
      max_chunk_bytes: DEFAULT_CHUNK_BYTES,
      max_binding_bytes: DEFAULT_BINDING_BYTES,
      max_buffer_bytes: DEFAULT_BUFFER_BYTES,
    }
  }
}

impl ChunkLimits {
  pub fn with_max_chunk_bytes(mut self, bytes: usize) -> Self {
    self.max_chunk_bytes = bytes;
    self
  }

  pub fn with_max_binding_bytes(mut self, bytes: usize) -> Self {
    self.max_binding_bytes = bytes;
    self
  }

  pub fn with_max_buffer_bytes(mut self, bytes: usize) -> Self {
    self.max_buffer_bytes = bytes;
    self
  }
}

/// Placement of one mesh inside a chunk's concatenated buffers.
#[derive(Clone, Copy, Debug)]
pub struct MeshInfo {
  /// First triangle of this mesh in the chunk's index buffer.
  pub tri_offset: u32,

  /// Triangle count.
  pub tri_count: u32,

  /// First float of this mesh's vertices in the chunk's vertex buffer.
  pub vertex_float_offset: u32,

  /// Reserved start slot in the worst-case segment output buffer.
  pub seg_offset: u32,

  /// Bounding box, cached for per-plane culling.
  pub bbox: Aabb,

  /// Index of the mesh in the caller's original mesh list.
  pub mesh_index: u32,
}

/// A batch of meshes concatenated into shared buffers.
///
/// `mesh_infos` is sorted by `tri_offset` with contiguous ranges - the
/// planner enforces this, and the triangle-to-mesh binary search relies on
/// it.
#[derive(Clone, Debug, Default)]
pub struct Chunk {
  /// Concatenated vertex data.
  pub vertices: Vec<f32>,

  /// Concatenated, rebased index data.
  pub indices: Vec<u32>,

  /// Per-mesh placement metadata.
  pub mesh_infos: Vec<MeshInfo>,

  /// Total triangle count across all contained meshes.
  pub total_tri_count: u32,

  /// Worst-case segment capacity (one per triangle).
  pub total_seg_capacity: u32,
}

impl Chunk {
  /// Resolve a global triangle index back to the position of its owning
  /// mesh in `mesh_infos`, by binary search over the sorted offset ranges.
  pub fn mesh_for_triangle(&self, global_tri: u32) -> Option<usize> {
    let idx = self
      .mesh_infos
      .partition_point(|info| info.tri_offset + info.tri_count <= global_tri);
    let info = self.mesh_infos.get(idx)?;
    (global_tri >= info.tri_offset).then_some(idx)
  }

  /// True when the plane touches at least one contained mesh's bounding
  /// box. Inactive chunks are skipped without any dispatch.
  pub fn intersects_plane(&self, normal: Vec3, anchor: Vec3) -> bool {
    self
      .mesh_infos
      .iter()
      .any(|info| info.bbox.intersects_plane(normal, anchor))
  }
}

struct MeshMeta<'a> {
  index: u32,
  mesh: &'a MeshData,
  tri_count: usize,
  vert_bytes: usize,
  idx_bytes: usize,
  seg_bytes: usize,
  total_bytes: usize,
  bbox: Aabb,
}

/// Split a mesh list into chunks whose concatenated buffers respect the
/// given limits.
///
/// Greedy accumulation: before adding the next mesh, if any running byte
/// total would exceed a limit, the current chunk is flushed (only if
/// non-empty) - then the mesh is added unconditionally. A mesh is never
/// split across chunks, so a single mesh whose own cost exceeds a limit
/// still lands alone in a chunk that exceeds the nominal budget. That
/// leniency is deliberate; callers allocating device buffers should log it.
pub fn plan_chunks(meshes: &[MeshData], limits: &ChunkLimits) -> Vec<Chunk> {
  let metas: Vec<MeshMeta> = meshes
    .iter()
    .enumerate()
    .map(|(i, mesh)| {
      let tri_count = mesh.tri_count();
      let vert_bytes = mesh.vertices.len() * 4;
      let idx_bytes = mesh.indices.len() * 4;
      let seg_bytes = tri_count * SEGMENT_STRIDE;
      MeshMeta {
        index: i as u32,
        mesh,
        tri_count,
        vert_bytes,
        idx_bytes,
        seg_bytes,
        total_bytes: vert_bytes + idx_bytes + seg_bytes,
        bbox: Aabb::from_vertices(&mesh.vertices),
      }
    })
    .collect();

  let mut chunks = Vec::new();
  let mut current: Vec<&MeshMeta> = Vec::new();
  let mut current_bytes = 0usize;
  let mut current_vert_bytes = 0usize;
  let mut current_idx_bytes = 0usize;
  let mut current_seg_bytes = 0usize;

  for meta in &metas {
    let next_vert = current_vert_bytes + meta.vert_bytes;
    let next_idx = current_idx_bytes + meta.idx_bytes;
    let next_seg = current_seg_bytes + meta.seg_bytes;
    let next_total = current_bytes + meta.total_bytes;

    let exceeds_budget = next_total > limits.max_chunk_bytes;
    let exceeds_binding = next_vert > limits.max_binding_bytes
      || next_idx > limits.max_binding_bytes
      || next_seg > limits.max_binding_bytes;
    let exceeds_buffer = next_vert > limits.max_buffer_bytes
      || next_idx > limits.max_buffer_bytes
      || next_seg > limits.max_buffer_bytes;

    if !current.is_empty() && (exceeds_budget || exceeds_binding || exceeds_buffer) {
      chunks.push(build_chunk(&current));
      current.clear();
      current_bytes = 0;
      current_vert_bytes = 0;
      current_idx_bytes = 0;
      current_seg_bytes = 0;
    }

    current.push(meta);
    current_bytes += meta.total_bytes;
    current_vert_bytes += meta.vert_bytes;
    current_idx_bytes += meta.idx_bytes;
    current_seg_bytes += meta.seg_bytes;
  }

  if !current.is_empty() {
    chunks.push(build_chunk(&current));
  }

  chunks
}

fn build_chunk(metas: &[&MeshMeta]) -> Chunk {
  let total_vert_floats: usize = metas.iter().map(|m| m.mesh.vertices.len()).sum();
  let total_idx_count: usize = metas.iter().map(|m| m.mesh.indices.len()).sum();
  let total_tri_count: usize = metas.iter().map(|m| m.tri_count).sum();

  let mut vertices = Vec::with_capacity(total_vert_floats);
  let mut indices = Vec::with_capacity(total_idx_count);
  let mut mesh_infos = Vec::with_capacity(metas.len());

  let mut vert_float_offset = 0u32;
  let mut tri_offset = 0u32;
  let mut seg_offset = 0u32;

  for meta in metas {
    // Rebase local vertex indices by the vertices placed so far.
    let vertex_base = vert_float_offset / 3;

    vertices.extend_from_slice(&meta.mesh.vertices);
    indices.extend(meta.mesh.indices.iter().map(|i| i + vertex_base));

    mesh_infos.push(MeshInfo {
      tri_offset,
      tri_count: meta.tri_count as u32,
      vertex_float_offset: vert_float_offset,
      seg_offset,
      bbox: meta.bbox,
      mesh_index: meta.index,
    });

    vert_float_offset += meta.mesh.vertices.len() as u32;
    tri_offset += meta.tri_count as u32;
    seg_offset += meta.tri_count as u32;
  }

  Chunk {
    vertices,
    indices,
    mesh_infos,
    total_tri_count: total_tri_count as u32,
    total_seg_capacity: total_tri_count as u32,
  }
}

#[cfg(test)]
#[path = "chunk_test.rs"]
mod chunk_test;
