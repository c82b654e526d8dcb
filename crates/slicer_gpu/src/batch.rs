//! Batched multi-mesh slicing engine.
//!
//! Holds the chunk set produced by the planner as resident GPU buffer sets,
//! one per chunk. A slice request tests every contained mesh's bounding box
//! against the plane, dispatches the batch kernel only for active chunks,
//! and runs the two-phase readback per chunk: the atomic counter first,
//! then exactly the first N output records. Output records carry the owning
//! mesh's original index, resolved in-kernel by binary search.
//!
//! Buffer ownership per the resource model: every chunk owns its
//! vertex/index/segment/counter buffers exclusively, and `&mut self` on the
//! engine serializes slice requests against them.

use std::sync::Arc;

use glam::Vec3;
use web_time::Instant;

use slicer_core::{
  plan_chunks, projection, Chunk, ChunkLimits, MeshColor, MeshData, Segment3D, SegmentEntry,
  SliceError, EPSILON, SEGMENT_STRIDE,
};

use crate::bitmap::{BitmapOptions, BitmapQueue, ImageSegment, SliceImage};
use crate::context::{storage_entry, uniform_entry, GpuContext};
use crate::palette::build_palette;

const WORKGROUP_SIZE: u32 = 64;
const UNIFORM_SIZE: u64 = 48;
const DRAW_ARGS_SIZE: u64 = 16;

/// Indirect draw arguments reset value: 6 vertices per segment instance,
/// zero instances until build_draw_args publishes the count.
const ZERO_DRAW_ARGS: [u32; 4] = [6, 0, 0, 0];

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct BatchParams {
  normal: [f32; 3],
  _pad0: f32,
  anchor: [f32; 3],
  _pad1: f32,
  epsilon: f32,
  total_tri_count: u32,
  mesh_count: u32,
  _pad2: u32,
}

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct GpuMeshInfo {
  tri_offset: u32,
  tri_count: u32,
  mesh_index: u32,
  _pad: u32,
}

/// Output record layout shared with the kernel; 32 bytes.
#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct GpuSegment {
  start: [f32; 3],
  mesh_index: u32,
  end: [f32; 3],
  _pad: u32,
}

/// Timing/throughput record for the most recent slice request.
#[derive(Clone, Copy, Debug)]
pub struct SliceStats {
  pub duration_us: u64,
  pub segment_count: usize,
  pub active_chunks: usize,
}

/// One chunk resident on the device.
struct ChunkBuffers {
  chunk: Chunk,
  workgroup_count: u32,
  uniform_buffer: wgpu::Buffer,
  segment_buffer: wgpu::Buffer,
  counter_buffer: wgpu::Buffer,
  indirect_buffer: wgpu::Buffer,
  readback_counter: wgpu::Buffer,
  readback_segments: wgpu::Buffer,
  bind_group: wgpu::BindGroup,
}

impl ChunkBuffers {
  fn new(ctx: &GpuContext, layout: &wgpu::BindGroupLayout, chunk: Chunk) -> Self {
    let device = &ctx.device;
    let segment_capacity_bytes =
      ((chunk.total_seg_capacity as usize * SEGMENT_STRIDE).max(SEGMENT_STRIDE)) as u64;

    let vertex_buffer = device.create_buffer(&wgpu::BufferDescriptor {
      label: Some("Chunk Vertex Buffer"),
      size: (chunk.vertices.len() * 4).max(4) as u64,
      usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
      mapped_at_creation: false,
    });
    if !chunk.vertices.is_empty() {
      ctx
        .queue
        .write_buffer(&vertex_buffer, 0, bytemuck::cast_slice(&chunk.vertices));
    }

    let index_buffer = device.create_buffer(&wgpu::BufferDescriptor {
      label: Some("Chunk Index Buffer"),
      size: (chunk.indices.len() * 4).max(4) as u64,
      usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
      mapped_at_creation: false,
    });
    if !chunk.indices.is_empty() {
      ctx
        .queue
        .write_buffer(&index_buffer, 0, bytemuck::cast_slice(&chunk.indices));
    }

    let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
      label: Some("Chunk Slice Uniform Buffer"),
      size: UNIFORM_SIZE,
      usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
      mapped_at_creation: false,
    });

    let segment_buffer = device.create_buffer(&wgpu::BufferDescriptor {
      label: Some("Chunk Segment Buffer"),
      size: segment_capacity_bytes,
      usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
      mapped_at_creation: false,
    });

    let counter_buffer = device.create_buffer(&wgpu::BufferDescriptor {
      label: Some("Chunk Counter Buffer"),
      size: 4,
      usage: wgpu::BufferUsages::STORAGE
        | wgpu::BufferUsages::COPY_SRC
        | wgpu::BufferUsages::COPY_DST,
      mapped_at_creation: false,
    });

    let mesh_info_data: Vec<GpuMeshInfo> = chunk
      .mesh_infos
      .iter()
      .map(|info| GpuMeshInfo {
        tri_offset: info.tri_offset,
        tri_count: info.tri_count,
        mesh_index: info.mesh_index,
        _pad: 0,
      })
      .collect();

    let mesh_info_buffer = device.create_buffer(&wgpu::BufferDescriptor {
      label: Some("Chunk Mesh Info Buffer"),
      size: (mesh_info_data.len() * std::mem::size_of::<GpuMeshInfo>()).max(16) as u64,
      usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
      mapped_at_creation: false,
    });
    if !mesh_info_data.is_empty() {
      ctx
        .queue
        .write_buffer(&mesh_info_buffer, 0, bytemuck::cast_slice(&mesh_info_data));
    }

    let indirect_buffer = device.create_buffer(&wgpu::BufferDescriptor {
      label: Some("Chunk Indirect Buffer"),
      size: DRAW_ARGS_SIZE,
      usage: wgpu::BufferUsages::STORAGE
        | wgpu::BufferUsages::INDIRECT
        | wgpu::BufferUsages::COPY_DST,
      mapped_at_creation: false,
    });

    let readback_counter = device.create_buffer(&wgpu::BufferDescriptor {
      label: Some("Chunk Counter Readback"),
      size: 4,
      usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
      mapped_at_creation: false,
    });

    let readback_segments = device.create_buffer(&wgpu::BufferDescriptor {
      label: Some("Chunk Segment Readback"),
      size: segment_capacity_bytes,
      usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
      mapped_at_creation: false,
    });

    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
      label: Some("Chunk Slice Bind Group"),
      layout,
      entries: &[
        wgpu::BindGroupEntry {
          binding: 0,
          resource: uniform_buffer.as_entire_binding(),
        },
        wgpu::BindGroupEntry {
          binding: 1,
          resource: vertex_buffer.as_entire_binding(),
        },
        wgpu::BindGroupEntry {
          binding: 2,
          resource: index_buffer.as_entire_binding(),
        },
        wgpu::BindGroupEntry {
          binding: 3,
          resource: segment_buffer.as_entire_binding(),
        },
        wgpu::BindGroupEntry {
          binding: 4,
          resource: counter_buffer.as_entire_binding(),
        },
        wgpu::BindGroupEntry {
          binding: 5,
          resource: mesh_info_buffer.as_entire_binding(),
        },
        wgpu::BindGroupEntry {
          binding: 6,
          resource: indirect_buffer.as_entire_binding(),
        },
      ],
    });

    let workgroup_count = chunk.total_tri_count.div_ceil(WORKGROUP_SIZE);

    Self {
      chunk,
      workgroup_count,
      uniform_buffer,
      segment_buffer,
      counter_buffer,
      indirect_buffer,
      readback_counter,
      readback_segments,
      bind_group,
    }
  }

  /// Phase 1: zero the transient state, dispatch the kernels, read back
  /// the 4-byte segment counter.
  fn dispatch_and_read_counter(
    &self,
    ctx: &GpuContext,
    slice_pipeline: &wgpu::ComputePipeline,
    draw_args_pipeline: &wgpu::ComputePipeline,
    normal: Vec3,
    anchor: Vec3,
  ) -> Result<u32, SliceError> {
    let params = BatchParams {
      normal: normal.to_array(),
      _pad0: 0.0,
      anchor: anchor.to_array(),
      _pad1: 0.0,
      epsilon: EPSILON,
      total_tri_count: self.chunk.total_tri_count,
      mesh_count: self.chunk.mesh_infos.len() as u32,
      _pad2: 0,
    };
    ctx
      .queue
      .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&params));
    ctx
      .queue
      .write_buffer(&self.counter_buffer, 0, bytemuck::bytes_of(&0u32));
    ctx
      .queue
      .write_buffer(&self.indirect_buffer, 0, bytemuck::cast_slice(&ZERO_DRAW_ARGS));

    let mut encoder = ctx
      .device
      .create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("Batch Slice Encoder"),
      });
    {
      let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
        label: Some("Batch Slice Pass"),
        timestamp_writes: None,
      });
      pass.set_pipeline(slice_pipeline);
      pass.set_bind_group(0, &self.bind_group, &[]);
      pass.dispatch_workgroups(self.workgroup_count, 1, 1);

      pass.set_pipeline(draw_args_pipeline);
      pass.set_bind_group(0, &self.bind_group, &[]);
      pass.dispatch_workgroups(1, 1, 1);
    }
    ctx.queue.submit([encoder.finish()]);

    let bytes = ctx.copy_and_read(&self.counter_buffer, &self.readback_counter, 4)?;
    Ok(bytemuck::pod_read_unaligned(&bytes))
  }

  /// Phase 2: copy back exactly the first `count` output records.
  fn read_segments(&self, ctx: &GpuContext, count: u32) -> Result<Vec<SegmentEntry>, SliceError> {
    let valid_bytes = count as u64 * SEGMENT_STRIDE as u64;
    let data = ctx.copy_and_read(&self.segment_buffer, &self.readback_segments, valid_bytes)?;

    let records: &[GpuSegment] = bytemuck::cast_slice(&data);
    Ok(
      records
        .iter()
        .map(|record| SegmentEntry {
          start: Vec3::from_array(record.start),
          end: Vec3::from_array(record.end),
          mesh_index: record.mesh_index,
        })
        .collect(),
    )
  }
}

/// Multi-mesh slicing engine with chunked device-resident geometry.
pub struct BatchGpuSlicer {
  ctx: GpuContext,
  slice_pipeline: wgpu::ComputePipeline,
  draw_args_pipeline: wgpu::ComputePipeline,
  bind_group_layout: wgpu::BindGroupLayout,

  limits: ChunkLimits,
  chunks: Vec<ChunkBuffers>,
  meshes: Vec<MeshData>,
  mesh_count: usize,
  colors: Option<Vec<MeshColor>>,
  palette: Vec<MeshColor>,
  initialized: bool,

  bitmap_queue: BitmapQueue,
  last_stats: Option<SliceStats>,
}

impl BatchGpuSlicer {
  pub fn new(ctx: GpuContext) -> Self {
    let shader = ctx
      .device
      .create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("Batch Slice Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("shaders/slice_batch.wgsl").into()),
      });

    let bind_group_layout =
      ctx
        .device
        .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
          label: Some("Batch Slice Bind Group Layout"),
          entries: &[
            uniform_entry(0),
            storage_entry(1, true),
            storage_entry(2, true),
            storage_entry(3, false),
            storage_entry(4, false),
            storage_entry(5, true),
            storage_entry(6, false),
          ],
        });

    let pipeline_layout = ctx
      .device
      .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Batch Slice Pipeline Layout"),
        bind_group_layouts: &[&bind_group_layout],
        push_constant_ranges: &[],
      });

    let slice_pipeline = ctx
      .device
      .create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
        label: Some("Batch Slice Pipeline"),
        layout: Some(&pipeline_layout),
        module: &shader,
        entry_point: Some("slice_main"),
        compilation_options: Default::default(),
        cache: None,
      });

    let draw_args_pipeline = ctx
      .device
      .create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
        label: Some("Draw Args Pipeline"),
        layout: Some(&pipeline_layout),
        module: &shader,
        entry_point: Some("build_draw_args"),
        compilation_options: Default::default(),
        cache: None,
      });

    let limits = ctx.chunk_limits();

    Self {
      ctx,
      slice_pipeline,
      draw_args_pipeline,
      bind_group_layout,
      limits,
      chunks: Vec::new(),
      meshes: Vec::new(),
      mesh_count: 0,
      colors: None,
      palette: Vec::new(),
      initialized: false,
      bitmap_queue: BitmapQueue::new(),
      last_stats: None,
    }
  }

  /// Override the soft per-chunk byte budget (device binding and buffer
  /// caps always still apply).
  pub fn with_max_chunk_bytes(mut self, bytes: usize) -> Self {
    self.limits.max_chunk_bytes = bytes;
    self
  }

  /// Build (or rebuild) the chunk set from a mesh list.
  ///
  /// `colors` feeds the 2D output path; `None` selects the default
  /// palette. The mesh list is retained so single-mesh updates can rebuild
  /// the whole batch.
  pub fn init_batch(
    &mut self,
    meshes: Vec<MeshData>,
    colors: Option<Vec<MeshColor>>,
  ) -> Result<(), SliceError> {
    self.colors = colors;
    self.rebuild(meshes)
  }

  /// Replace one mesh and rebuild the batch.
  pub fn update_mesh(&mut self, index: usize, mesh: MeshData) -> Result<(), SliceError> {
    if !self.initialized {
      return Err(SliceError::NotInitialized);
    }
    if index >= self.meshes.len() {
      return Err(SliceError::MeshIndexOutOfRange {
        index,
        count: self.meshes.len(),
      });
    }

    let mut meshes = std::mem::take(&mut self.meshes);
    meshes[index] = mesh;
    self.rebuild(meshes)
  }

  fn rebuild(&mut self, meshes: Vec<MeshData>) -> Result<(), SliceError> {
    self.chunks.clear();
    self.mesh_count = meshes.len();
    self.palette = build_palette(self.mesh_count, self.colors.as_deref());

    let chunks = plan_chunks(&meshes, &self.limits);
    for chunk in chunks {
      warn_if_over_budget(&chunk, &self.limits);
      self
        .chunks
        .push(ChunkBuffers::new(&self.ctx, &self.bind_group_layout, chunk));
    }

    self.meshes = meshes;
    self.initialized = true;
    tracing::debug!(
      meshes = self.mesh_count,
      chunks = self.chunks.len(),
      "slice batch built"
    );
    Ok(())
  }

  /// Slice every mesh with the plane, one segment list per original mesh.
  pub fn slice_batch(
    &mut self,
    normal: Vec3,
    anchor: Vec3,
  ) -> Result<Vec<Vec<Segment3D>>, SliceError> {
    let entries = self.slice_entries_flat(normal, anchor)?;

    let mut results = vec![Vec::new(); self.mesh_count];
    for entry in entries {
      // Out-of-range tags are dropped rather than faulting.
      if let Some(list) = results.get_mut(entry.mesh_index as usize) {
        list.push(entry.segment());
      }
    }
    Ok(results)
  }

  /// Slice every mesh with the plane, merged into one flat list.
  pub fn slice_batch_flat(
    &mut self,
    normal: Vec3,
    anchor: Vec3,
  ) -> Result<Vec<Segment3D>, SliceError> {
    Ok(
      self
        .slice_entries_flat(normal, anchor)?
        .into_iter()
        .map(|entry| entry.segment())
        .collect(),
    )
  }

  /// Slice every mesh, keeping mesh tags. This is the input shape the
  /// segment normalizer consumes.
  pub fn slice_entries_flat(
    &mut self,
    normal: Vec3,
    anchor: Vec3,
  ) -> Result<Vec<SegmentEntry>, SliceError> {
    if !self.initialized {
      return Err(SliceError::NotInitialized);
    }

    let started = Instant::now();
    let mut entries = Vec::new();
    let mut active_chunks = 0usize;

    for chunk in &self.chunks {
      // Chunk activation: any contained mesh's bbox touching the plane.
      if !chunk.chunk.intersects_plane(normal, anchor) {
        continue;
      }
      active_chunks += 1;

      let count = chunk.dispatch_and_read_counter(
        &self.ctx,
        &self.slice_pipeline,
        &self.draw_args_pipeline,
        normal,
        anchor,
      )?;
      if count == 0 {
        continue;
      }

      entries.extend(chunk.read_segments(&self.ctx, count)?);
    }

    self.last_stats = Some(SliceStats {
      duration_us: started.elapsed().as_micros() as u64,
      segment_count: entries.len(),
      active_chunks,
    });

    Ok(entries)
  }

  /// Request a 2D slice image through the single-flight latest-wins queue.
  ///
  /// Concurrent requests coalesce: everyone waiting receives (a shared
  /// handle to) the result of whichever request rendered last.
  pub fn slice_to_bitmap(
    &mut self,
    normal: Vec3,
    anchor: Vec3,
    options: BitmapOptions,
  ) -> Result<Arc<SliceImage>, SliceError> {
    if !self.initialized {
      return Err(SliceError::NotInitialized);
    }

    let ticket = self.bitmap_queue.submit(normal, anchor, options);
    self.drain_bitmap_queue();
    ticket.wait()
  }

  fn drain_bitmap_queue(&mut self) {
    while let Some(active) = self.bitmap_queue.begin() {
      let result = self.render_slice_image(active.normal, active.anchor, &active.options);
      self.bitmap_queue.finish(active, result);
    }
  }

  fn render_slice_image(
    &mut self,
    normal: Vec3,
    anchor: Vec3,
    options: &BitmapOptions,
  ) -> Result<SliceImage, SliceError> {
    let entries = self.slice_entries_flat(normal, anchor)?;

    let width = options.width.max(1);
    let height = options.height.max(1);
    let basis = projection::build_local_basis(normal, options.view_up);

    let segments = entries
      .iter()
      .map(|entry| {
        let start = projection::to_image_coord(
          projection::project_point(entry.start, anchor, &basis),
          width,
          height,
          options.scale,
        );
        let end = projection::to_image_coord(
          projection::project_point(entry.end, anchor, &basis),
          width,
          height,
          options.scale,
        );
        let color = self
          .palette
          .get(entry.mesh_index as usize)
          .copied()
          .unwrap_or([1.0, 1.0, 1.0, 1.0]);
        ImageSegment {
          start,
          end,
          mesh_index: entry.mesh_index,
          color,
        }
      })
      .collect();

    Ok(SliceImage {
      width,
      height,
      clear_color: options.clear_color.unwrap_or([0.0; 4]),
      segments,
    })
  }

  /// Number of meshes in the current batch.
  pub fn mesh_count(&self) -> usize {
    self.mesh_count
  }

  /// Number of chunks the batch was packed into.
  pub fn chunk_count(&self) -> usize {
    self.chunks.len()
  }

  /// Display colors, one per mesh.
  pub fn mesh_colors(&self) -> &[MeshColor] {
    &self.palette
  }

  /// Timing/throughput of the most recent slice request.
  pub fn last_stats(&self) -> Option<SliceStats> {
    self.last_stats
  }
}

fn warn_if_over_budget(chunk: &Chunk, limits: &ChunkLimits) {
  let vert_bytes = chunk.vertices.len() * 4;
  let idx_bytes = chunk.indices.len() * 4;
  let seg_bytes = chunk.total_seg_capacity as usize * SEGMENT_STRIDE;
  let total = vert_bytes + idx_bytes + seg_bytes;

  let over_binding = [vert_bytes, idx_bytes, seg_bytes]
    .into_iter()
    .any(|b| b > limits.max_binding_bytes || b > limits.max_buffer_bytes);

  if total > limits.max_chunk_bytes || over_binding {
    tracing::warn!(
      bytes = total,
      meshes = chunk.mesh_infos.len(),
      "chunk exceeds configured limits; a single oversized mesh is packed alone rather than rejected"
    );
  }
}
