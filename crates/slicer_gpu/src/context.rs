//! Explicit GPU device handle.
//!
//! The context is plain data passed to engine constructors. Embedders that
//! already own a wgpu device (a renderer, a game engine) wrap it with
//! [`GpuContext::from_parts`]; standalone use goes through
//! [`GpuContext::request`].

use std::sync::mpsc;

use slicer_core::{ChunkLimits, SliceError};

/// Device + queue pair used by all slicing engines.
#[derive(Clone)]
pub struct GpuContext {
  pub device: wgpu::Device,
  pub queue: wgpu::Queue,
}

impl GpuContext {
  /// Wrap an existing device/queue pair.
  pub fn from_parts(device: wgpu::Device, queue: wgpu::Queue) -> Self {
    Self { device, queue }
  }

  /// Request an adapter and device from the default wgpu instance.
  pub async fn request() -> Result<Self, SliceError> {
    let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
      backends: wgpu::Backends::all(),
      ..Default::default()
    });

    let adapter = instance
      .request_adapter(&wgpu::RequestAdapterOptions {
        power_preference: wgpu::PowerPreference::HighPerformance,
        compatible_surface: None,
        force_fallback_adapter: false,
      })
      .await
      .ok_or_else(|| SliceError::Device("no compatible adapter".into()))?;

    let (device, queue) = adapter
      .request_device(
        &wgpu::DeviceDescriptor {
          label: Some("Slicer Device"),
          required_features: wgpu::Features::empty(),
          required_limits: wgpu::Limits::default(),
          memory_hints: wgpu::MemoryHints::Performance,
        },
        None,
      )
      .await
      .map_err(|e| SliceError::Device(format!("request_device failed: {e}")))?;

    // A lost device invalidates every chunk buffer; surface it in logs so
    // the re-init requirement is visible.
    device.on_uncaptured_error(Box::new(|error: wgpu::Error| {
      tracing::error!(%error, "uncaptured wgpu error");
    }));

    Ok(Self { device, queue })
  }

  /// Blocking form of [`GpuContext::request`].
  pub fn request_blocking() -> Result<Self, SliceError> {
    pollster::block_on(Self::request())
  }

  /// Chunk-planning limits for this device, with the device's storage
  /// binding and buffer size caps threaded through unchanged.
  pub fn chunk_limits(&self) -> ChunkLimits {
    let limits = self.device.limits();
    ChunkLimits::default()
      .with_max_binding_bytes(limits.max_storage_buffer_binding_size as usize)
      .with_max_buffer_bytes(limits.max_buffer_size as usize)
  }

  /// Copy `bytes` from a device buffer into a MAP_READ readback buffer and
  /// return the mapped contents.
  ///
  /// One blocking accelerator round-trip; the two-phase protocol calls this
  /// twice per slice (counter, then exactly the used payload prefix).
  pub fn copy_and_read(
    &self,
    source: &wgpu::Buffer,
    readback: &wgpu::Buffer,
    bytes: u64,
  ) -> Result<Vec<u8>, SliceError> {
    let mut encoder = self
      .device
      .create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("Readback Encoder"),
      });
    encoder.copy_buffer_to_buffer(source, 0, readback, 0, bytes);
    self.queue.submit([encoder.finish()]);

    let slice = readback.slice(0..bytes);
    let (tx, rx) = mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
      let _ = tx.send(result);
    });

    let _ = self.device.poll(wgpu::Maintain::Wait);
    rx.recv()
      .map_err(|_| SliceError::Device("map_async callback dropped".into()))?
      .map_err(|e| SliceError::Device(format!("buffer map failed: {e}")))?;

    let data = slice.get_mapped_range().to_vec();
    readback.unmap();
    Ok(data)
  }
}

pub(crate) fn uniform_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
  wgpu::BindGroupLayoutEntry {
    binding,
    visibility: wgpu::ShaderStages::COMPUTE,
    ty: wgpu::BindingType::Buffer {
      ty: wgpu::BufferBindingType::Uniform,
      has_dynamic_offset: false,
      min_binding_size: None,
    },
    count: None,
  }
}

pub(crate) fn storage_entry(binding: u32, read_only: bool) -> wgpu::BindGroupLayoutEntry {
  wgpu::BindGroupLayoutEntry {
    binding,
    visibility: wgpu::ShaderStages::COMPUTE,
    ty: wgpu::BindingType::Buffer {
      ty: wgpu::BufferBindingType::Storage { read_only },
      has_dynamic_offset: false,
      min_binding_size: None,
    },
    count: None,
  }
}
