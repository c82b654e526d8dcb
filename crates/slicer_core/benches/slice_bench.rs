//! Benchmarks for the CPU slicer and chunk planner.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use glam::Vec3;
use slicer_core::{plan_chunks, slice_mesh, ChunkLimits, MeshData};

/// UV sphere with roughly `target_vertex_count` vertices.
fn uv_sphere(target_vertex_count: usize, radius: f32, center: Vec3) -> MeshData {
  let n = ((target_vertex_count as f32).sqrt().round() as usize).max(4);
  let stacks = n;
  let slices = n;

  let mut vertices = Vec::with_capacity((stacks + 1) * (slices + 1) * 3);
  for i in 0..=stacks {
    let phi = std::f32::consts::PI * i as f32 / stacks as f32;
    for j in 0..=slices {
      let theta = std::f32::consts::TAU * j as f32 / slices as f32;
      let dir = Vec3::new(
        phi.sin() * theta.cos(),
        phi.sin() * theta.sin(),
        phi.cos(),
      );
      let p = center + dir * radius;
      vertices.extend_from_slice(&[p.x, p.y, p.z]);
    }
  }

  let mut indices = Vec::with_capacity(stacks * slices * 6);
  for i in 0..stacks {
    for j in 0..slices {
      let a = (i * (slices + 1) + j) as u32;
      let b = a + slices as u32 + 1;
      indices.extend_from_slice(&[a, b, a + 1, a + 1, b, b + 1]);
    }
  }

  MeshData::new(vertices, indices)
}

fn bench_slice_mesh(c: &mut Criterion) {
  let mesh = uv_sphere(20_000, 50.0, Vec3::ZERO);
  let normal = Vec3::new(0.0, 0.0, -1.0);

  c.bench_function("slice_mesh_sphere_20k", |b| {
    b.iter(|| slice_mesh(black_box(&mesh), black_box(normal), black_box(Vec3::ZERO)))
  });
}

fn bench_plan_chunks(c: &mut Criterion) {
  let meshes: Vec<MeshData> = (0..16)
    .map(|i| uv_sphere(5_000, 40.0, Vec3::new(i as f32 * 10.0, 0.0, 0.0)))
    .collect();
  let limits = ChunkLimits::default().with_max_chunk_bytes(2 * 1024 * 1024);

  c.bench_function("plan_chunks_16_spheres", |b| {
    b.iter(|| plan_chunks(black_box(&meshes), black_box(&limits)))
  });
}

criterion_group!(benches, bench_slice_mesh, bench_plan_chunks);
criterion_main!(benches);
