//! Tests for the single-flight bitmap request queue.

use glam::{Vec2, Vec3};

use super::*;

fn options(scale: f32) -> BitmapOptions {
  BitmapOptions {
    view_up: Vec3::Y,
    width: 64,
    height: 64,
    scale,
    clear_color: None,
  }
}

fn image_with_marker(marker: f32) -> SliceImage {
  SliceImage {
    width: 64,
    height: 64,
    clear_color: [0.0; 4],
    segments: vec![ImageSegment {
      start: Vec2::splat(marker),
      end: Vec2::splat(marker),
      mesh_index: 0,
      color: [1.0, 0.0, 0.0, 1.0],
    }],
  }
}

#[test]
fn single_request_renders_and_delivers() {
  let mut queue = BitmapQueue::new();
  let ticket = queue.submit(Vec3::Z, Vec3::ZERO, options(1.0));

  let active = queue.begin().expect("request pending");
  assert_eq!(active.options.scale, 1.0);

  let outcome = queue.finish(active, Ok(image_with_marker(7.0)));
  assert_eq!(outcome, FinishOutcome::Delivered);

  let image = ticket.wait().unwrap();
  assert_eq!(image.segments[0].start.x, 7.0);
}

#[test]
fn back_to_back_requests_coalesce_to_latest() {
  let mut queue = BitmapQueue::new();

  // Both arrive before the loop picks anything up; the second replaces the
  // first's parameters but keeps its waiter.
  let first = queue.submit(Vec3::Z, Vec3::ZERO, options(1.0));
  let second = queue.submit(Vec3::Z, Vec3::new(0.0, 0.0, 5.0), options(2.0));

  let active = queue.begin().expect("coalesced request pending");
  assert_eq!(active.options.scale, 2.0);
  assert_eq!(active.anchor, Vec3::new(0.0, 0.0, 5.0));
  assert!(queue.begin().is_none(), "single flight");

  queue.finish(active, Ok(image_with_marker(2.0)));

  // Both callers receive the second request's result.
  let a = first.wait().unwrap();
  let b = second.wait().unwrap();
  assert_eq!(a.segments[0].start.x, 2.0);
  assert_eq!(b.segments[0].start.x, 2.0);
}

#[test]
fn mid_flight_request_supersedes_stale_render() {
  let mut queue = BitmapQueue::new();

  let first = queue.submit(Vec3::Z, Vec3::ZERO, options(1.0));
  let active = queue.begin().unwrap();

  // Arrives while the first render is in flight.
  let second = queue.submit(Vec3::Z, Vec3::new(0.0, 0.0, 9.0), options(3.0));

  // The finished frame is stale: discarded, waiters merged forward.
  let outcome = queue.finish(active, Ok(image_with_marker(1.0)));
  assert_eq!(outcome, FinishOutcome::Superseded);
  assert!(first.try_wait().is_none());

  let retry = queue.begin().expect("superseding request pending");
  assert_eq!(retry.options.scale, 3.0);
  queue.finish(retry, Ok(image_with_marker(3.0)));

  let a = first.wait().unwrap();
  let b = second.wait().unwrap();
  assert_eq!(a.segments[0].start.x, 3.0);
  assert_eq!(b.segments[0].start.x, 3.0);
}

#[test]
fn errors_fan_out_to_all_waiters() {
  let mut queue = BitmapQueue::new();

  let first = queue.submit(Vec3::Z, Vec3::ZERO, options(1.0));
  let second = queue.submit(Vec3::Z, Vec3::ZERO, options(1.0));

  let active = queue.begin().unwrap();
  queue.finish(active, Err(SliceError::Device("lost".into())));

  assert!(first.wait().is_err());
  assert!(second.wait().is_err());
}

#[test]
fn queue_depth_stays_bounded() {
  let mut queue = BitmapQueue::new();

  let tickets: Vec<_> = (0..16)
    .map(|i| queue.submit(Vec3::Z, Vec3::new(0.0, 0.0, i as f32), options(1.0)))
    .collect();

  // Sixteen submissions, one pending request.
  let active = queue.begin().unwrap();
  assert_eq!(active.anchor.z, 15.0);
  assert!(queue.begin().is_none());
  assert!(!queue.has_pending());

  queue.finish(active, Ok(image_with_marker(15.0)));
  for ticket in tickets {
    assert_eq!(ticket.wait().unwrap().segments[0].start.x, 15.0);
  }
}

#[test]
fn idle_queue_has_nothing_to_begin() {
  let mut queue = BitmapQueue::new();
  assert!(queue.begin().is_none());
  assert!(!queue.has_pending());
  assert!(!queue.is_rendering());
}
