//! slicer_gpu - wgpu compute backend for mesh cross-sections
//!
//! Dispatches the plane-triangle intersector from `slicer_core` across all
//! triangles of a chunk on the GPU, one invocation per triangle. Segments
//! land in a shared output buffer at slots claimed through an atomic
//! counter, and come back to the host through a two-phase readback: first
//! the 4-byte counter, then exactly the used prefix of the output buffer.
//!
//! The device handle is an explicit [`GpuContext`] passed to constructors -
//! there is no process-wide singleton - so tests and embedders control
//! device lifetime and can run several engines against separate devices.
//!
//! # Example
//!
//! ```ignore
//! use glam::Vec3;
//! use slicer_gpu::{BatchGpuSlicer, GpuContext};
//!
//! let ctx = GpuContext::request_blocking()?;
//! let mut slicer = BatchGpuSlicer::new(ctx);
//! slicer.init_batch(meshes, None)?;
//! let per_mesh = slicer.slice_batch(Vec3::Z, Vec3::ZERO)?;
//! ```

pub mod context;
pub use context::GpuContext;

// Single-mesh engine
pub mod single;
pub use single::GpuSlicer;

// Batched multi-mesh engine
pub mod batch;
pub use batch::{BatchGpuSlicer, SliceStats};

// Single-flight bitmap request coalescing
pub mod bitmap;
pub use bitmap::{BitmapOptions, BitmapQueue, BitmapTicket, FinishOutcome, ImageSegment, SliceImage};

// Per-mesh color tables for the 2D output path
pub mod palette;
pub use palette::{build_palette, default_palette};

// Backend selection
pub mod factory;
pub use factory::{create_batch_slicer, create_slicer};
