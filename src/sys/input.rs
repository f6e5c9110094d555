//! Pointer capture and cross-thread input delivery.
//!
//! OS input hooks may fire on their own thread. They push [`InputEvent`]s into
//! an [`InputQueue`]; the UI thread drains the queue on its tick, so nothing
//! outside the UI thread ever touches engine state.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use super::geometry::Point;
use crate::model::WindowId;

/// Exclusive pointer capture primitives.
pub trait PointerCapture: Send + Sync {
    /// Routes all pointer input to `window`. Returns false if capture could
    /// not be acquired.
    fn capture(&self, window: &WindowId) -> bool;

    fn release(&self);

    /// Current pointer position in physical pixels.
    fn position(&self) -> Point;
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum InputEvent {
    PointerMoved(Point),
    PointerReleased,
    /// Capture was taken away involuntarily, e.g. by another process.
    CaptureLost,
}

struct Inner {
    events: Mutex<VecDeque<InputEvent>>,
    capacity: usize,
}

/// Bounded queue of input events. Clones share the same queue; hand one to
/// each producer thread.
#[derive(Clone)]
pub struct InputQueue(Arc<Inner>);

impl InputQueue {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self(Arc::new(Inner {
            events: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }))
    }

    /// Enqueues an event. When the queue is full, consecutive pointer moves
    /// are coalesced into the newest one, and a release or capture loss takes
    /// the place of a queued move. Only pointer moves are ever lost; false is
    /// returned when nothing could be made room for.
    pub fn push(&self, event: InputEvent) -> bool {
        let mut events = self.0.events.lock();
        if events.len() < self.0.capacity {
            events.push_back(event);
            return true;
        }
        if let (Some(InputEvent::PointerMoved(last)), InputEvent::PointerMoved(new)) =
            (events.back_mut(), &event)
        {
            *last = *new;
            return true;
        }
        if !matches!(event, InputEvent::PointerMoved(_)) {
            if let Some(index) = evictable_move(&events) {
                trace!(?event, index, "input queue full, evicting a pointer move");
                events.remove(index);
                events.push_back(event);
                return true;
            }
        }
        // Every queued event already ends the drag, so this one changes nothing.
        warn!(?event, capacity = self.0.capacity, "input queue full, dropping event");
        false
    }

    /// Takes every queued event, oldest first.
    pub fn drain(&self) -> Vec<InputEvent> { self.0.events.lock().drain(..).collect() }

    pub fn len(&self) -> usize { self.0.events.lock().len() }

    pub fn is_empty(&self) -> bool { self.0.events.lock().is_empty() }
}

/// A pointer move that is immediately superseded by another move, or failing
/// that the oldest move.
fn evictable_move(events: &VecDeque<InputEvent>) -> Option<usize> {
    let is_move = |e: &InputEvent| matches!(e, InputEvent::PointerMoved(_));
    events
        .iter()
        .zip(events.iter().skip(1))
        .position(|(a, b)| is_move(a) && is_move(b))
        .or_else(|| events.iter().position(is_move))
}

impl std::fmt::Debug for InputQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputQueue")
            .field("len", &self.len())
            .field("capacity", &self.0.capacity)
            .finish()
    }
}
