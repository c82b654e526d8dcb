//! Backend selection.

use slicer_core::{CpuSlicer, MeshSlicer, SliceError};

use crate::batch::BatchGpuSlicer;
use crate::context::GpuContext;
use crate::single::GpuSlicer;

/// Pick the best available single-mesh slicer: GPU when a device can be
/// acquired, CPU otherwise.
pub fn create_slicer() -> Box<dyn MeshSlicer> {
  match GpuContext::request_blocking() {
    Ok(ctx) => Box::new(GpuSlicer::new(ctx)),
    Err(err) => {
      tracing::debug!(%err, "wgpu unavailable, using CPU slicer");
      Box::new(CpuSlicer::new())
    }
  }
}

/// Create a batch slicer; batching requires a device, so this fails when
/// none is available.
pub fn create_batch_slicer() -> Result<BatchGpuSlicer, SliceError> {
  Ok(BatchGpuSlicer::new(GpuContext::request_blocking()?))
}
