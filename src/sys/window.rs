//! The window directory: the registry of live palette windows.
//!
//! Windows are created and destroyed by the host. The engines in this crate
//! only look windows up here and issue geometry or alpha requests against
//! them.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use dashmap::DashMap;
use static_assertions::assert_impl_all;
use tracing::{debug, trace};

use super::geometry::{Point, Rect, Size};
use crate::model::WindowId;

/// Operations on a native window. All coordinates are physical pixels.
///
/// Implementations must be callable from any thread; they are invoked from
/// the UI thread tick as well as from command handlers.
pub trait NativeWindow: Send + Sync + std::fmt::Debug {
    /// False once the native handle has gone away. Such a window is treated as
    /// missing.
    fn has_handle(&self) -> bool;

    fn frame(&self) -> Rect;

    /// Moves without touching the size.
    fn move_to(&self, origin: Point);

    /// Resizes without touching the origin.
    fn resize(&self, size: Size);

    fn set_bounds(&self, frame: Rect);

    fn alpha(&self) -> f64;

    fn set_alpha(&self, alpha: f64);

    fn is_visible(&self) -> bool;

    fn set_visible(&self, visible: bool);
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowFlags {
    pub draggable: bool,
}

impl Default for WindowFlags {
    fn default() -> Self {
        Self { draggable: true }
    }
}

/// A directory entry: the native window plus per-window state the engines
/// consult.
pub struct PaletteWindow {
    id: WindowId,
    seq: u64,
    native: Box<dyn NativeWindow>,
    draggable: AtomicBool,
}

impl PaletteWindow {
    pub fn id(&self) -> &WindowId { &self.id }

    pub fn native(&self) -> &dyn NativeWindow { self.native.as_ref() }

    pub fn is_draggable(&self) -> bool { self.draggable.load(Ordering::Relaxed) }

    pub fn set_draggable(&self, draggable: bool) {
        self.draggable.store(draggable, Ordering::Relaxed);
    }

    pub fn frame(&self) -> Rect { self.native.frame() }

    pub fn is_visible(&self) -> bool { self.native.is_visible() }
}

impl std::fmt::Debug for PaletteWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaletteWindow")
            .field("id", &self.id)
            .field("seq", &self.seq)
            .field("draggable", &self.is_draggable())
            .finish_non_exhaustive()
    }
}

/// Thread-safe registry mapping window ids to live windows.
#[derive(Default)]
pub struct WindowDirectory {
    windows: DashMap<WindowId, Arc<PaletteWindow>>,
    next_seq: AtomicU64,
}

assert_impl_all!(WindowDirectory: Send, Sync);

impl WindowDirectory {
    pub fn new() -> Self { Self::default() }

    /// Registers a window, replacing any previous entry for `id`.
    pub fn insert(
        &self,
        id: WindowId,
        native: Box<dyn NativeWindow>,
        flags: WindowFlags,
    ) -> Arc<PaletteWindow> {
        let window = Arc::new(PaletteWindow {
            id: id.clone(),
            seq: self.next_seq.fetch_add(1, Ordering::Relaxed),
            native,
            draggable: AtomicBool::new(flags.draggable),
        });
        debug!(%id, seq = window.seq, "window registered");
        self.windows.insert(id, window.clone());
        window
    }

    pub fn remove(&self, id: &WindowId) -> Option<Arc<PaletteWindow>> {
        let removed = self.windows.remove(id).map(|(_, w)| w);
        if removed.is_some() {
            debug!(%id, "window removed");
        }
        removed
    }

    /// Looks up a window with a live native handle.
    pub fn get(&self, id: &WindowId) -> Option<Arc<PaletteWindow>> {
        let window = self.windows.get(id).map(|entry| entry.value().clone())?;
        if !window.native.has_handle() {
            trace!(%id, "window has no native handle");
            return None;
        }
        Some(window)
    }

    pub fn exists(&self, id: &WindowId) -> bool { self.windows.contains_key(id) }

    /// Snapshot of every registered window, in registration order.
    pub fn all(&self) -> Vec<Arc<PaletteWindow>> {
        let mut windows: Vec<_> = self.windows.iter().map(|e| e.value().clone()).collect();
        windows.sort_by_key(|w| w.seq);
        windows
    }

    pub fn len(&self) -> usize { self.windows.len() }

    pub fn is_empty(&self) -> bool { self.windows.is_empty() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sys::headless::HeadlessWindow;

    #[test]
    fn windows_without_handle_are_not_returned() {
        let dir = WindowDirectory::new();
        let native = HeadlessWindow::new(Rect::new(0.0, 0.0, 10.0, 10.0));
        let handle = native.clone();
        dir.insert("a".into(), Box::new(native), WindowFlags::default());

        assert!(dir.get(&"a".into()).is_some());
        handle.drop_handle();
        assert!(dir.get(&"a".into()).is_none());
        assert!(dir.exists(&"a".into()));
    }

    #[test]
    fn snapshot_is_in_registration_order() {
        let dir = WindowDirectory::new();
        for id in ["c", "a", "b"] {
            dir.insert(
                id.into(),
                Box::new(HeadlessWindow::new(Rect::ZERO)),
                WindowFlags::default(),
            );
        }
        let ids: Vec<_> = dir.all().iter().map(|w| w.id().to_string()).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }
}
