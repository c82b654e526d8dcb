//! Segment normalization: duplicate cancellation and degenerate removal.
//!
//! Adjacent triangles sharing a coplanar strip both emit the same physical
//! edge, in opposite directions. Normalization quantizes endpoints to a
//! merge grid, keys segments by their unordered endpoint pair per mesh, and
//! toggles entries in and out of a map: an even number of occurrences of
//! the same undirected segment cancels out entirely, an odd number leaves
//! exactly one.

use std::collections::HashMap;

use glam::Vec3;

use crate::types::{Segment3D, SegmentEntry};

/// Tolerances for normalization.
#[derive(Clone, Copy, Debug)]
pub struct NormalizeOptions {
  /// Segments shorter than this are dropped outright.
  pub zero_length_epsilon: f32,

  /// Quantization grid size for endpoint matching.
  pub point_merge_epsilon: f32,
}

impl Default for NormalizeOptions {
  fn default() -> Self {
    Self {
      zero_length_epsilon: 1e-7,
      point_merge_epsilon: 1e-4,
    }
  }
}

type QuantizedPoint = [i64; 3];

/// Canonical unordered key: mesh index plus the two quantized endpoints in
/// sorted order. Entries from different meshes never share a key, so they
/// never cancel each other.
type SegmentKey = (u32, QuantizedPoint, QuantizedPoint);

#[inline]
fn quantize(point: Vec3, scale: f32) -> QuantizedPoint {
  [
    (point.x * scale).round() as i64,
    (point.y * scale).round() as i64,
    (point.z * scale).round() as i64,
  ]
}

/// Normalize tagged segment entries.
///
/// The surviving entry for an odd occurrence count keeps the orientation of
/// whichever occurrence set it last. Output order is arbitrary, matching
/// the no-ordering guarantee of the slicing engine itself.
pub fn normalize_entries(entries: &[SegmentEntry], options: &NormalizeOptions) -> Vec<SegmentEntry> {
  let zero_sq = options.zero_length_epsilon * options.zero_length_epsilon;
  let scale = 1.0 / options.point_merge_epsilon.max(1e-12);

  let mut toggled: HashMap<SegmentKey, SegmentEntry> = HashMap::new();

  for entry in entries {
    if entry.start.distance_squared(entry.end) <= zero_sq {
      continue;
    }

    let q_start = quantize(entry.start, scale);
    let q_end = quantize(entry.end, scale);
    let keep_direction = q_start <= q_end;
    let key = if keep_direction {
      (entry.mesh_index, q_start, q_end)
    } else {
      (entry.mesh_index, q_end, q_start)
    };

    if toggled.remove(&key).is_some() {
      continue;
    }

    let canonical = if keep_direction {
      *entry
    } else {
      SegmentEntry {
        start: entry.end,
        end: entry.start,
        mesh_index: entry.mesh_index,
      }
    };
    toggled.insert(key, canonical);
  }

  toggled.into_values().collect()
}

/// Normalize untagged segments (treated as a single mesh).
pub fn normalize_segments(segments: &[Segment3D], options: &NormalizeOptions) -> Vec<Segment3D> {
  let entries: Vec<SegmentEntry> = segments
    .iter()
    .map(|seg| SegmentEntry {
      start: seg.start,
      end: seg.end,
      mesh_index: 0,
    })
    .collect();

  normalize_entries(&entries, options)
    .into_iter()
    .map(|entry| entry.segment())
    .collect()
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod normalize_test;
