//! Single-mesh GPU slicer.
//!
//! GPU counterpart of `slicer_core::CpuSlicer`: one mesh resident on the
//! device, sliced repeatedly with changing planes. Buffers are reused
//! across `init` calls and only grown when a larger mesh arrives, so
//! swapping meshes of similar size never reallocates.

use glam::Vec3;

use slicer_core::{Aabb, Backend, MeshData, MeshSlicer, Segment3D, SliceError, EPSILON};

use crate::context::{storage_entry, uniform_entry, GpuContext};

const WORKGROUP_SIZE: u32 = 64;
const UNIFORM_SIZE: u64 = 48;

/// Bytes per output record (start xyz + end xyz).
const SEGMENT_STRIDE: u64 = 24;

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct SliceParams {
  normal: [f32; 3],
  _pad0: f32,
  anchor: [f32; 3],
  _pad1: f32,
  epsilon: f32,
  tri_count: u32,
  _pad2: [u32; 2],
}

/// Mesh-sized buffers, grown on demand and otherwise reused.
struct MeshBuffers {
  vertex: wgpu::Buffer,
  vertex_capacity: u64,
  index: wgpu::Buffer,
  index_capacity: u64,
  segment: wgpu::Buffer,
  readback_segments: wgpu::Buffer,
  segment_capacity: u64,
  bind_group: wgpu::BindGroup,
}

/// GPU implementation of [`MeshSlicer`].
pub struct GpuSlicer {
  ctx: GpuContext,
  pipeline: wgpu::ComputePipeline,
  bind_group_layout: wgpu::BindGroupLayout,

  uniform_buffer: wgpu::Buffer,
  counter_buffer: wgpu::Buffer,
  readback_counter: wgpu::Buffer,

  buffers: Option<MeshBuffers>,
  tri_count: u32,
  bbox: Option<Aabb>,
}

impl GpuSlicer {
  pub fn new(ctx: GpuContext) -> Self {
    let shader = ctx
      .device
      .create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("Slice Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("shaders/slice.wgsl").into()),
      });

    let bind_group_layout =
      ctx
        .device
        .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
          label: Some("Slice Bind Group Layout"),
          entries: &[
            uniform_entry(0),
            storage_entry(1, true),
            storage_entry(2, true),
            storage_entry(3, false),
            storage_entry(4, false),
          ],
        });

    let pipeline_layout = ctx
      .device
      .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Slice Pipeline Layout"),
        bind_group_layouts: &[&bind_group_layout],
        push_constant_ranges: &[],
      });

    let pipeline = ctx
      .device
      .create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
        label: Some("Slice Pipeline"),
        layout: Some(&pipeline_layout),
        module: &shader,
        entry_point: Some("slice_main"),
        compilation_options: Default::default(),
        cache: None,
      });

    let uniform_buffer = ctx.device.create_buffer(&wgpu::BufferDescriptor {
      label: Some("Slice Uniform Buffer"),
      size: UNIFORM_SIZE,
      usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
      mapped_at_creation: false,
    });

    let counter_buffer = ctx.device.create_buffer(&wgpu::BufferDescriptor {
      label: Some("Slice Counter Buffer"),
      size: 4,
      usage: wgpu::BufferUsages::STORAGE
        | wgpu::BufferUsages::COPY_SRC
        | wgpu::BufferUsages::COPY_DST,
      mapped_at_creation: false,
    });

    let readback_counter = ctx.device.create_buffer(&wgpu::BufferDescriptor {
      label: Some("Slice Counter Readback"),
      size: 4,
      usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
      mapped_at_creation: false,
    });

    Self {
      ctx,
      pipeline,
      bind_group_layout,
      uniform_buffer,
      counter_buffer,
      readback_counter,
      buffers: None,
      tri_count: 0,
      bbox: None,
    }
  }

  fn upload_mesh(&mut self, mesh: &MeshData) {
    let device = &self.ctx.device;
    let vert_bytes = (mesh.vertices.len() * 4).max(4) as u64;
    let idx_bytes = (mesh.indices.len() * 4).max(4) as u64;
    let seg_bytes = (self.tri_count as u64 * SEGMENT_STRIDE).max(SEGMENT_STRIDE);

    let previous = self.buffers.take();
    let mut rebind = previous.is_none();

    let (vertex, vertex_capacity) = match previous.as_ref().filter(|b| b.vertex_capacity >= vert_bytes)
    {
      Some(b) => (b.vertex.clone(), b.vertex_capacity),
      None => {
        rebind = true;
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
          label: Some("Slice Vertex Buffer"),
          size: vert_bytes,
          usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
          mapped_at_creation: false,
        });
        (buffer, vert_bytes)
      }
    };

    let (index, index_capacity) = match previous.as_ref().filter(|b| b.index_capacity >= idx_bytes) {
      Some(b) => (b.index.clone(), b.index_capacity),
      None => {
        rebind = true;
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
          label: Some("Slice Index Buffer"),
          size: idx_bytes,
          usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
          mapped_at_creation: false,
        });
        (buffer, idx_bytes)
      }
    };

    let (segment, readback_segments, segment_capacity) =
      match previous.as_ref().filter(|b| b.segment_capacity >= seg_bytes) {
        Some(b) => (b.segment.clone(), b.readback_segments.clone(), b.segment_capacity),
        None => {
          rebind = true;
          let segment = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Slice Segment Buffer"),
            size: seg_bytes,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
          });
          let readback = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Slice Segment Readback"),
            size: seg_bytes,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
          });
          (segment, readback, seg_bytes)
        }
      };

    if !mesh.vertices.is_empty() {
      self
        .ctx
        .queue
        .write_buffer(&vertex, 0, bytemuck::cast_slice(&mesh.vertices));
    }
    if !mesh.indices.is_empty() {
      self
        .ctx
        .queue
        .write_buffer(&index, 0, bytemuck::cast_slice(&mesh.indices));
    }

    // Only rebuild the bind group when a buffer changed identity.
    let bind_group = match previous {
      Some(b) if !rebind => b.bind_group,
      _ => device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Slice Bind Group"),
        layout: &self.bind_group_layout,
        entries: &[
          wgpu::BindGroupEntry {
            binding: 0,
            resource: self.uniform_buffer.as_entire_binding(),
          },
          wgpu::BindGroupEntry {
            binding: 1,
            resource: vertex.as_entire_binding(),
          },
          wgpu::BindGroupEntry {
            binding: 2,
            resource: index.as_entire_binding(),
          },
          wgpu::BindGroupEntry {
            binding: 3,
            resource: segment.as_entire_binding(),
          },
          wgpu::BindGroupEntry {
            binding: 4,
            resource: self.counter_buffer.as_entire_binding(),
          },
        ],
      }),
    };

    self.buffers = Some(MeshBuffers {
      vertex,
      vertex_capacity,
      index,
      index_capacity,
      segment,
      readback_segments,
      segment_capacity,
      bind_group,
    });
  }
}

impl MeshSlicer for GpuSlicer {
  fn backend(&self) -> Backend {
    Backend::Gpu
  }

  fn init(&mut self, mesh: &MeshData) -> Result<(), SliceError> {
    self.tri_count = mesh.tri_count() as u32;
    self.bbox = Some(Aabb::from_vertices(&mesh.vertices));
    self.upload_mesh(mesh);
    Ok(())
  }

  fn slice(&mut self, normal: Vec3, anchor: Vec3) -> Result<Vec<Segment3D>, SliceError> {
    let buffers = self.buffers.as_ref().ok_or(SliceError::NotInitialized)?;
    let bbox = self.bbox.as_ref().ok_or(SliceError::NotInitialized)?;

    // Host-side cull: skip all accelerator work for a plane that cannot
    // touch the mesh.
    if !bbox.intersects_plane(normal, anchor) {
      return Ok(Vec::new());
    }
    if self.tri_count == 0 {
      return Ok(Vec::new());
    }

    let params = SliceParams {
      normal: normal.to_array(),
      _pad0: 0.0,
      anchor: anchor.to_array(),
      _pad1: 0.0,
      epsilon: EPSILON,
      tri_count: self.tri_count,
      _pad2: [0; 2],
    };
    self
      .ctx
      .queue
      .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&params));
    self
      .ctx
      .queue
      .write_buffer(&self.counter_buffer, 0, bytemuck::bytes_of(&0u32));

    // Phase 1: dispatch, then read back only the 4-byte counter.
    let mut encoder = self
      .ctx
      .device
      .create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("Slice Encoder"),
      });
    {
      let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
        label: Some("Slice Pass"),
        timestamp_writes: None,
      });
      pass.set_pipeline(&self.pipeline);
      pass.set_bind_group(0, &buffers.bind_group, &[]);
      pass.dispatch_workgroups(self.tri_count.div_ceil(WORKGROUP_SIZE), 1, 1);
    }
    self.ctx.queue.submit([encoder.finish()]);

    let count_bytes = self
      .ctx
      .copy_and_read(&self.counter_buffer, &self.readback_counter, 4)?;
    let segment_count: u32 = bytemuck::pod_read_unaligned(&count_bytes);

    if segment_count == 0 {
      return Ok(Vec::new());
    }

    // Phase 2: copy exactly the used prefix of the output buffer.
    let valid_bytes = segment_count as u64 * SEGMENT_STRIDE;
    let data = self
      .ctx
      .copy_and_read(&buffers.segment, &buffers.readback_segments, valid_bytes)?;

    let floats: &[f32] = bytemuck::cast_slice(&data);
    let segments = floats
      .chunks_exact(6)
      .map(|f| Segment3D::new(Vec3::new(f[0], f[1], f[2]), Vec3::new(f[3], f[4], f[5])))
      .collect();

    Ok(segments)
  }
}
