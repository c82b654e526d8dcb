//! slicer_core - backend-independent mesh cross-section geometry
//!
//! This crate computes the intersection of triangle meshes with arbitrary
//! cutting planes, producing 3D line segments. It contains the pure-geometry
//! half of the slicing system:
//!
//! - **Plane-triangle intersection** with a uniform on-plane tolerance
//! - **Chunk planning**: packing many meshes into buffer-size-bounded batches
//!   with concatenated, rebased geometry
//! - **Segment normalization**: cancelling duplicate reversed-direction
//!   segments and dropping degenerate ones
//! - **Plane-local projection** for downstream 2D consumers
//!
//! The GPU execution engine lives in the companion `slicer_gpu` crate and
//! shares the exact intersection semantics defined here.
//!
//! # Example
//!
//! ```ignore
//! use glam::Vec3;
//! use slicer_core::{slice_mesh, MeshData};
//!
//! let mesh = MeshData::new(vertices, indices);
//! let segments = slice_mesh(&mesh, Vec3::new(0.0, 0.0, -1.0), Vec3::ZERO);
//! println!("{} segments", segments.len());
//! ```

pub mod error;
pub mod types;

pub use error::SliceError;
pub use types::{standard_views, Aabb, MeshColor, MeshData, Segment3D, SegmentEntry, ViewPreset};

// Plane-triangle intersection predicate
pub mod intersect;
pub use intersect::{intersect_triangle, Plane, EPSILON};

// CPU reference slicer and the backend trait
pub mod slicer;
pub use slicer::{slice_mesh, slice_meshes, Backend, CpuSlicer, MeshSlicer};

// Chunk planning for batched accelerator dispatch
pub mod chunk;
pub use chunk::{plan_chunks, Chunk, ChunkLimits, MeshInfo, SEGMENT_STRIDE};

// Duplicate-segment cancellation
pub mod normalize;
pub use normalize::{normalize_entries, normalize_segments, NormalizeOptions};

// Plane-local basis and 2D projection
pub mod projection;
pub use projection::{build_local_basis, project_point, project_segments, LocalBasis};

// Test fixtures
#[cfg(test)]
pub mod test_utils;
