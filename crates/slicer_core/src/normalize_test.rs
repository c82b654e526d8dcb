//! Tests for duplicate-segment cancellation.

use glam::Vec3;

use super::*;
use crate::types::SegmentEntry;

fn entry(start: [f32; 3], end: [f32; 3], mesh_index: u32) -> SegmentEntry {
  SegmentEntry {
    start: Vec3::from_array(start),
    end: Vec3::from_array(end),
    mesh_index,
  }
}

#[test]
fn reversed_duplicate_cancels() {
  let out = normalize_entries(
    &[
      entry([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], 0),
      entry([1.0, 0.0, 0.0], [0.0, 0.0, 0.0], 0),
    ],
    &NormalizeOptions::default(),
  );

  assert!(out.is_empty());
}

#[test]
fn same_direction_duplicate_cancels() {
  let out = normalize_entries(
    &[
      entry([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], 0),
      entry([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], 0),
    ],
    &NormalizeOptions::default(),
  );

  assert!(out.is_empty());
}

#[test]
fn odd_occurrence_count_leaves_one() {
  let out = normalize_entries(
    &[
      entry([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], 0),
      entry([1.0, 0.0, 0.0], [0.0, 0.0, 0.0], 0),
      entry([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], 0),
    ],
    &NormalizeOptions::default(),
  );

  assert_eq!(out.len(), 1);
  assert_eq!(out[0].mesh_index, 0);
}

#[test]
fn different_meshes_never_cancel() {
  let out = normalize_entries(
    &[
      entry([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], 0),
      entry([1.0, 0.0, 0.0], [0.0, 0.0, 0.0], 1),
    ],
    &NormalizeOptions::default(),
  );

  assert_eq!(out.len(), 2);
}

#[test]
fn zero_length_segment_is_dropped() {
  let out = normalize_entries(
    &[entry([0.5, 0.5, 0.5], [0.5, 0.5, 0.5], 0)],
    &NormalizeOptions::default(),
  );

  assert!(out.is_empty());
}

#[test]
fn near_coincident_endpoints_cancel_via_quantization() {
  // Endpoints differ by far less than the merge grid, so the segments
  // land on the same key and toggle out.
  let out = normalize_entries(
    &[
      entry([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], 0),
      entry([1.000001, 0.0, 0.0], [0.000001, 0.0, 0.0], 0),
    ],
    &NormalizeOptions::default(),
  );

  assert!(out.is_empty());
}

#[test]
fn distinct_segments_survive() {
  let out = normalize_entries(
    &[
      entry([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], 0),
      entry([0.0, 1.0, 0.0], [1.0, 1.0, 0.0], 0),
    ],
    &NormalizeOptions::default(),
  );

  assert_eq!(out.len(), 2);
}

#[test]
fn normalization_is_idempotent() {
  let input = vec![
    entry([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], 0),
    entry([1.0, 0.0, 0.0], [0.0, 0.0, 0.0], 0),
    entry([0.0, 1.0, 0.0], [1.0, 1.0, 0.0], 0),
    entry([2.0, 0.0, 0.0], [3.0, 0.0, 0.0], 1),
  ];

  let once = normalize_entries(&input, &NormalizeOptions::default());
  let twice = normalize_entries(&once, &NormalizeOptions::default());

  assert_eq!(once.len(), twice.len());
  for entry in &once {
    assert!(twice.iter().any(|other| other == entry));
  }
}

#[test]
fn untagged_segments_normalize_as_single_mesh() {
  use crate::types::Segment3D;

  let segments = vec![
    Segment3D::new(Vec3::ZERO, Vec3::X),
    Segment3D::new(Vec3::X, Vec3::ZERO),
  ];

  let out = normalize_segments(&segments, &NormalizeOptions::default());
  assert!(out.is_empty());
}
