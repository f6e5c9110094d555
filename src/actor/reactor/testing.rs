use std::sync::Arc;
use std::time::{Duration, Instant};

use super::{Reactor, Request, Response};
use crate::actor;
use crate::actor::broadcast::{EventReceiver, PaletteEvent};
use crate::common::collections::HashMap;
use crate::common::config::Config;
use crate::model::WindowId;
use crate::sys::geometry::Rect;
use crate::sys::headless::{HeadlessPointer, HeadlessWindow};
use crate::sys::window::{NativeWindow, WindowFlags};

/// A reactor over headless windows, with a clock the test advances by hand.
pub struct Harness {
    pub reactor: Reactor,
    pub pointer: HeadlessPointer,
    pub natives: HashMap<WindowId, HeadlessWindow>,
    pub events: EventReceiver,
    pub now: Instant,
}

impl Harness {
    pub fn new() -> Self { Self::with_config(Config::default()) }

    pub fn with_config(config: Config) -> Self {
        let pointer = HeadlessPointer::new();
        let (tx, events) = actor::channel();
        let reactor = Reactor::new(
            config,
            Arc::default(),
            Arc::new(pointer.clone()),
            tx,
        );
        Harness {
            reactor,
            pointer,
            natives: HashMap::default(),
            events,
            now: Instant::now(),
        }
    }

    pub fn window(&mut self, id: &str, frame: Rect) -> HeadlessWindow {
        let native = HeadlessWindow::new(frame);
        self.reactor.register_window(id.into(), Box::new(native.clone()), WindowFlags::default());
        self.natives.insert(id.into(), native.clone());
        native
    }

    pub fn native(&self, id: &str) -> &HeadlessWindow { &self.natives[id] }

    pub fn frame(&self, id: &str) -> Rect { self.native(id).frame() }

    pub fn visible(&self, id: &str) -> bool { self.native(id).is_visible() }

    pub fn command(&mut self, request: Request) -> Response {
        self.reactor.handle_command_at(request, self.now)
    }

    pub fn tick_ms(&mut self, ms: u64) {
        self.now += Duration::from_millis(ms);
        self.reactor.tick(self.now);
    }

    pub fn events(&mut self) -> Vec<PaletteEvent> { drain(&mut self.events) }

    pub fn event_names(&mut self) -> Vec<String> { event_names(&self.events()) }
}

pub fn drain(events: &mut EventReceiver) -> Vec<PaletteEvent> {
    let mut out = Vec::new();
    while let Ok((_, event)) = events.try_recv() {
        out.push(event);
    }
    out
}

/// The wire name of each event, e.g. `proximityEntered`.
pub fn event_names(events: &[PaletteEvent]) -> Vec<String> {
    events
        .iter()
        .map(|e| match serde_json::to_value(e) {
            Ok(v) => v["event"].as_str().unwrap_or_default().to_string(),
            Err(_) => String::new(),
        })
        .collect()
}
