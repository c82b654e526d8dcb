//! Single-flight, latest-wins coalescing for 2D slice output requests.
//!
//! Producing a slice image is expensive and supersede-able: during rapid
//! input (a slider sweeping the anchor) only the newest plane matters.
//! Requests therefore queue as **at most one pending slot**. A new request
//! arriving while one is in flight replaces the pending parameters and
//! appends its waiter instead of queuing unboundedly. When a render
//! finishes after a newer request already superseded it, the produced image
//! is discarded and the stale request's waiters are folded into the newer
//! one, which starts immediately. Every waiter attached to the request that
//! actually rendered receives a shared handle to that one result.
//!
//! The machine is driven explicitly - `submit`, `begin`, `finish` - so the
//! supersede path is testable without a device.

use std::sync::Arc;

use crossbeam_channel::{bounded, Receiver, Sender};
use glam::{Vec2, Vec3};

use slicer_core::{MeshColor, SliceError};

/// Parameters for a 2D slice output request.
#[derive(Clone, Debug)]
pub struct BitmapOptions {
  /// Up hint for the plane-local camera basis.
  pub view_up: Vec3,
  pub width: u32,
  pub height: u32,
  /// World units to pixels.
  pub scale: f32,
  pub clear_color: Option<MeshColor>,
}

/// One segment in pixel space, tagged with its mesh and display color.
#[derive(Clone, Copy, Debug)]
pub struct ImageSegment {
  pub start: Vec2,
  pub end: Vec2,
  pub mesh_index: u32,
  pub color: MeshColor,
}

/// A rendered slice: plane-local segments mapped to pixel space, ready for
/// a 2D compositor.
#[derive(Clone, Debug)]
pub struct SliceImage {
  pub width: u32,
  pub height: u32,
  pub clear_color: MeshColor,
  pub segments: Vec<ImageSegment>,
}

type BitmapResult = Result<Arc<SliceImage>, SliceError>;

/// Handle returned to each caller of `submit`; resolves once the request
/// (or the newer request that superseded it) has rendered.
pub struct BitmapTicket {
  receiver: Receiver<BitmapResult>,
}

impl BitmapTicket {
  /// Block until the coalesced result is delivered.
  pub fn wait(self) -> BitmapResult {
    self
      .receiver
      .recv()
      .map_err(|_| SliceError::Device("bitmap render loop dropped the request".into()))?
  }

  /// Non-blocking poll.
  pub fn try_wait(&self) -> Option<BitmapResult> {
    self.receiver.try_recv().ok()
  }
}

struct PendingRequest {
  seq: u64,
  normal: Vec3,
  anchor: Vec3,
  options: BitmapOptions,
  waiters: Vec<Sender<BitmapResult>>,
}

/// A request taken out of the pending slot for rendering.
pub struct ActiveRender {
  seq: u64,
  pub normal: Vec3,
  pub anchor: Vec3,
  pub options: BitmapOptions,
  waiters: Vec<Sender<BitmapResult>>,
}

/// What `finish` did with a completed render.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FinishOutcome {
  /// The result was delivered to every attached waiter.
  Delivered,

  /// A newer request superseded this render while it was in flight; the
  /// result was discarded and the waiters moved onto the newer request.
  Superseded,
}

/// The single-flight request queue.
#[derive(Default)]
pub struct BitmapQueue {
  pending: Option<PendingRequest>,
  rendering: bool,
  next_seq: u64,
}

impl BitmapQueue {
  pub fn new() -> Self {
    Self::default()
  }

  /// Enqueue a request, coalescing into the pending slot.
  ///
  /// The slot always holds the newest parameters; earlier waiters stay
  /// attached and will receive whatever request ends up rendering.
  pub fn submit(&mut self, normal: Vec3, anchor: Vec3, options: BitmapOptions) -> BitmapTicket {
    let (tx, rx) = bounded(1);
    self.next_seq += 1;

    match self.pending.as_mut() {
      Some(pending) => {
        pending.seq = self.next_seq;
        pending.normal = normal;
        pending.anchor = anchor;
        pending.options = options;
        pending.waiters.push(tx);
      }
      None => {
        self.pending = Some(PendingRequest {
          seq: self.next_seq,
          normal,
          anchor,
          options,
          waiters: vec![tx],
        });
      }
    }

    BitmapTicket { receiver: rx }
  }

  /// Take the pending request for rendering.
  ///
  /// Returns `None` when nothing is pending or a render is already in
  /// flight (single-flight invariant).
  pub fn begin(&mut self) -> Option<ActiveRender> {
    if self.rendering {
      return None;
    }
    let request = self.pending.take()?;
    self.rendering = true;
    Some(ActiveRender {
      seq: request.seq,
      normal: request.normal,
      anchor: request.anchor,
      options: request.options,
      waiters: request.waiters,
    })
  }

  /// Complete a render started with [`BitmapQueue::begin`].
  ///
  /// If a newer request arrived while this one rendered, the result is
  /// dropped and the active waiters merge onto the pending request, which
  /// `begin` will hand out next. Errors are fanned out to waiters exactly
  /// like results.
  pub fn finish(
    &mut self,
    active: ActiveRender,
    result: Result<SliceImage, SliceError>,
  ) -> FinishOutcome {
    self.rendering = false;

    if let Some(pending) = self.pending.as_mut() {
      if pending.seq > active.seq {
        pending.waiters.extend(active.waiters);
        return FinishOutcome::Superseded;
      }
    }

    let shared: BitmapResult = result.map(Arc::new);
    for waiter in active.waiters {
      let _ = waiter.send(shared.clone());
    }
    FinishOutcome::Delivered
  }

  /// True when a request is waiting to be rendered.
  pub fn has_pending(&self) -> bool {
    self.pending.is_some()
  }

  /// True while a taken request has not been finished.
  pub fn is_rendering(&self) -> bool {
    self.rendering
  }
}

#[cfg(test)]
#[path = "bitmap_test.rs"]
mod bitmap_test;
