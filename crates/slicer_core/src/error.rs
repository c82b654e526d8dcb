//! Error taxonomy shared by the CPU and GPU slicing backends.
//!
//! Degenerate geometry (coplanar triangles, zero-length segments, empty
//! intersections) is never an error - those cases produce empty results.
//! Errors are reserved for misuse of the engine and accelerator failures.

use thiserror::Error;

/// Errors surfaced by slicing backends.
///
/// `Clone` so a single failure can be fanned out to every waiter of a
/// coalesced request.
#[derive(Clone, Debug, Error)]
pub enum SliceError {
  /// A slice operation was issued before the engine was initialized with
  /// mesh data. Must fail loudly rather than silently returning nothing.
  #[error("slicer is not initialized; call init first")]
  NotInitialized,

  /// An out-of-range mesh index was passed to a per-mesh operation.
  #[error("mesh index {index} out of range for {count} meshes")]
  MeshIndexOutOfRange { index: usize, count: usize },

  /// Accelerator-level failure (adapter unavailable, lost device, failed
  /// buffer mapping). Invalidates all chunk buffers; the engine must be
  /// re-initialized on a fresh device.
  #[error("device error: {0}")]
  Device(String),
}
