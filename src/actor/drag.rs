//! Turns pointer input into a window drag.
//!
//! There is at most one drag session at a time. Starting a drag while one is
//! active is ignored, as is starting one on a window that is not draggable.
//! Multiple simultaneous drags are not supported.

use std::sync::Arc;

use tracing::{debug, instrument, trace, warn};

use crate::actor::broadcast::{EventSender, PaletteEvent};
use crate::actor::reactor::CommandError;
use crate::model::WindowId;
use crate::sys::geometry::{Point, Rect};
use crate::sys::input::{InputEvent, PointerCapture};
use crate::sys::window::WindowDirectory;

/// Receives the lifecycle of every drag.
pub trait DragObserver {
    fn drag_began(&mut self, id: &WindowId);

    /// `frame` is the window's frame after the move.
    fn drag_moved(&mut self, id: &WindowId, frame: Rect);

    fn drag_ended(&mut self, id: &WindowId, frame: Rect);
}

#[derive(Debug, Clone, PartialEq)]
pub struct DragSession {
    pub window_id: WindowId,
    pub start_pointer: Point,
    pub start_origin: Point,
}

impl DragSession {
    fn origin_for(&self, pointer: Point) -> Point {
        self.start_origin + (pointer - self.start_pointer)
    }
}

#[derive(Debug, Default)]
enum DragState {
    #[default]
    Idle,
    Dragging(DragSession),
}

pub struct DragCoordinator {
    directory: Arc<WindowDirectory>,
    pointer: Arc<dyn PointerCapture>,
    events: EventSender,
    state: DragState,
}

impl DragCoordinator {
    pub fn new(
        directory: Arc<WindowDirectory>,
        pointer: Arc<dyn PointerCapture>,
        events: EventSender,
    ) -> Self {
        Self {
            directory,
            pointer,
            events,
            state: DragState::Idle,
        }
    }

    pub fn session(&self) -> Option<&DragSession> {
        match &self.state {
            DragState::Idle => None,
            DragState::Dragging(session) => Some(session),
        }
    }

    pub fn is_dragging(&self) -> bool { self.session().is_some() }

    pub fn is_dragging_window(&self, id: &WindowId) -> bool {
        self.session().is_some_and(|s| &s.window_id == id)
    }

    /// Begins dragging `id` from the current pointer position.
    ///
    /// Returns whether a session was started. An unknown window is an error;
    /// an active session or a non-draggable window is not.
    #[instrument(skip(self, observer))]
    pub fn start_drag(
        &mut self,
        id: &WindowId,
        observer: &mut impl DragObserver,
    ) -> Result<bool, CommandError> {
        let window = self.directory.get(id).ok_or_else(|| CommandError::NotFound(id.clone()))?;

        if let Some(active) = self.session() {
            debug!(active = %active.window_id, "drag already in progress, ignoring");
            return Ok(false);
        }
        if !window.is_draggable() {
            debug!("window is not draggable");
            return Ok(false);
        }
        if !self.pointer.capture(id) {
            warn!("could not capture pointer");
            return Ok(false);
        }

        let frame = window.frame();
        self.state = DragState::Dragging(DragSession {
            window_id: id.clone(),
            start_pointer: self.pointer.position(),
            start_origin: frame.origin,
        });
        debug!(?frame, "drag began");

        self.events.send(PaletteEvent::DragBegan { window_id: id.clone(), frame });
        observer.drag_began(id);
        Ok(true)
    }

    /// Feeds one input event into the active session, if any.
    pub fn handle_input(&mut self, event: InputEvent, observer: &mut impl DragObserver) {
        match event {
            InputEvent::PointerMoved(pointer) => self.pointer_moved(pointer, observer),
            InputEvent::PointerReleased | InputEvent::CaptureLost => {
                if matches!(event, InputEvent::CaptureLost) {
                    debug!("pointer capture lost");
                }
                self.end_drag(observer);
            }
        }
    }

    fn pointer_moved(&mut self, pointer: Point, observer: &mut impl DragObserver) {
        let DragState::Dragging(session) = &self.state else {
            return;
        };
        let id = session.window_id.clone();
        let origin = session.origin_for(pointer);

        let Some(window) = self.directory.get(&id) else {
            debug!(%id, "dragged window disappeared");
            self.abandon();
            return;
        };
        window.native().move_to(origin);
        let frame = window.frame();
        trace!(%id, ?frame, "drag moved");

        self.events.send(PaletteEvent::DragMoved { window_id: id.clone(), frame });
        observer.drag_moved(&id, frame);
    }

    /// Ends the active session and reports the final frame. Does nothing when
    /// idle.
    pub fn end_drag(&mut self, observer: &mut impl DragObserver) {
        let DragState::Dragging(session) = std::mem::take(&mut self.state) else {
            return;
        };
        self.pointer.release();
        let id = session.window_id;

        let Some(window) = self.directory.get(&id) else {
            debug!(%id, "dragged window disappeared before drag end");
            return;
        };
        let frame = window.frame();
        debug!(%id, ?frame, "drag ended");

        self.events.send(PaletteEvent::DragEnded { window_id: id.clone(), frame });
        observer.drag_ended(&id, frame);
    }

    /// Drops the session for a window that is going away, without notifying
    /// anyone.
    pub fn forget_window(&mut self, id: &WindowId) {
        if self.is_dragging_window(id) {
            self.abandon();
        }
    }

    fn abandon(&mut self) {
        self.state = DragState::Idle;
        self.pointer.release();
    }
}
