//! In-memory windows and pointer, for tests and the simulator.

use std::sync::Arc;

use parking_lot::Mutex;

use super::geometry::{Point, Rect, Size};
use super::input::PointerCapture;
use super::window::NativeWindow;
use crate::model::WindowId;

#[derive(Debug)]
struct WindowState {
    frame: Rect,
    alpha: f64,
    visible: bool,
    has_handle: bool,
    writes: usize,
}

/// A window that only exists as a record. Clones share state, so a test can
/// keep a handle to a window after giving it to the directory.
#[derive(Debug, Clone)]
pub struct HeadlessWindow(Arc<Mutex<WindowState>>);

impl HeadlessWindow {
    pub fn new(frame: Rect) -> Self {
        Self(Arc::new(Mutex::new(WindowState {
            frame,
            alpha: 1.0,
            visible: true,
            has_handle: true,
            writes: 0,
        })))
    }

    pub fn hidden(frame: Rect) -> Self {
        let window = Self::new(frame);
        window.0.lock().visible = false;
        window
    }

    /// Number of geometry or alpha writes issued against this window.
    pub fn writes(&self) -> usize { self.0.lock().writes }

    /// Simulates the native window disappearing underneath the directory.
    pub fn drop_handle(&self) { self.0.lock().has_handle = false; }
}

impl NativeWindow for HeadlessWindow {
    fn has_handle(&self) -> bool { self.0.lock().has_handle }

    fn frame(&self) -> Rect { self.0.lock().frame }

    fn move_to(&self, origin: Point) {
        let mut state = self.0.lock();
        state.frame.origin = origin;
        state.writes += 1;
    }

    fn resize(&self, size: Size) {
        let mut state = self.0.lock();
        state.frame.size = size;
        state.writes += 1;
    }

    fn set_bounds(&self, frame: Rect) {
        let mut state = self.0.lock();
        state.frame = frame;
        state.writes += 1;
    }

    fn alpha(&self) -> f64 { self.0.lock().alpha }

    fn set_alpha(&self, alpha: f64) {
        let mut state = self.0.lock();
        state.alpha = alpha.clamp(0.0, 1.0);
        state.writes += 1;
    }

    fn is_visible(&self) -> bool { self.0.lock().visible }

    fn set_visible(&self, visible: bool) { self.0.lock().visible = visible; }
}

#[derive(Debug, Default)]
struct PointerState {
    position: Point,
    captured: Option<WindowId>,
    captures: usize,
}

/// A pointer whose position is set by the caller.
#[derive(Debug, Clone, Default)]
pub struct HeadlessPointer(Arc<Mutex<PointerState>>);

impl HeadlessPointer {
    pub fn new() -> Self { Self::default() }

    pub fn set_position(&self, position: Point) { self.0.lock().position = position; }

    pub fn captured(&self) -> Option<WindowId> { self.0.lock().captured.clone() }

    /// How many times capture has been acquired.
    pub fn capture_count(&self) -> usize { self.0.lock().captures }
}

impl PointerCapture for HeadlessPointer {
    fn capture(&self, window: &WindowId) -> bool {
        let mut state = self.0.lock();
        state.captured = Some(window.clone());
        state.captures += 1;
        true
    }

    fn release(&self) { self.0.lock().captured = None; }

    fn position(&self) -> Point { self.0.lock().position }
}
