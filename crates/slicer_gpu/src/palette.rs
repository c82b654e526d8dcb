//! Per-mesh color tables for the 2D output path.

use slicer_core::MeshColor;

fn clamp01(value: f32) -> f32 {
  value.clamp(0.0, 1.0)
}

/// Evenly spaced HSV wheel, one color per mesh.
pub fn default_palette(count: usize) -> Vec<MeshColor> {
  let mut colors = Vec::with_capacity(count);

  for i in 0..count {
    let hue = if count <= 1 { 0.0 } else { i as f32 / count as f32 };
    let s = 0.8;
    let v = 0.95;

    let h = hue * 6.0;
    let c = v * s;
    let x = c * (1.0 - ((h % 2.0) - 1.0).abs());
    let m = v - c;

    let (r, g, b) = match h as u32 {
      0 => (c, x, 0.0),
      1 => (x, c, 0.0),
      2 => (0.0, c, x),
      3 => (0.0, x, c),
      4 => (x, 0.0, c),
      _ => (c, 0.0, x),
    };

    colors.push([r + m, g + m, b + m, 1.0]);
  }

  colors
}

/// Default palette with caller overrides applied (clamped to 0..=1).
pub fn build_palette(count: usize, overrides: Option<&[MeshColor]>) -> Vec<MeshColor> {
  let mut palette = default_palette(count);

  if let Some(overrides) = overrides {
    for (slot, color) in palette.iter_mut().zip(overrides) {
      *slot = [
        clamp01(color[0]),
        clamp01(color[1]),
        clamp01(color[2]),
        clamp01(color[3]),
      ];
    }
  }

  palette
}

#[cfg(test)]
#[path = "palette_test.rs"]
mod palette_test;
