//! The reactor owns one instance of each engine and is the only thing that
//! touches them.
//!
//! Host commands and window notifications arrive as [`Event`]s on a channel.
//! Pointer input from other threads goes through the [`InputQueue`] and is
//! drained on the periodic tick, which also advances animations. The tick
//! only runs while something needs it: an animation, a drag, or queued
//! input.

mod command;
mod error;

#[cfg(test)]
mod testing;

use std::sync::Arc;
use std::time::Instant;

pub use command::{Anchor, Request, Response};
pub use error::CommandError;
use tokio::sync::oneshot;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, instrument, trace};

use crate::actor::animation::Animator;
use crate::actor::broadcast::EventSender;
use crate::actor::drag::DragCoordinator;
use crate::actor::{self};
use crate::common::config::Config;
use crate::model::WindowId;
use crate::snap_engine::SnapEngine;
use crate::sys::input::{InputQueue, PointerCapture};
use crate::sys::screen::{CoordinateConverter, Screen};
use crate::sys::window::{NativeWindow, WindowDirectory, WindowFlags};

pub type Sender = actor::Sender<Event>;
pub type Receiver = actor::Receiver<Event>;

#[derive(Debug)]
pub enum Event {
    /// A host command. The result is sent back if a response channel is
    /// given.
    Command(Request, Option<oneshot::Sender<Response>>),

    /// The host created a window.
    WindowCreated {
        id: WindowId,
        native: Box<dyn NativeWindow>,
        flags: WindowFlags,
    },
    WindowDestroyed(WindowId),

    /// The window was shown, hidden or moved by something other than a
    /// command.
    WindowShown(WindowId),
    WindowHidden(WindowId),
    WindowMoved(WindowId),

    /// The set of screens changed. The first screen is the primary one.
    ScreensChanged(Vec<Screen>),

    ConfigUpdated(Config),
}

pub struct Reactor {
    config: Config,
    directory: Arc<WindowDirectory>,
    converter: CoordinateConverter,
    snap: SnapEngine,
    drag: DragCoordinator,
    animator: Animator,
    input: InputQueue,
}

impl Reactor {
    pub fn new(
        config: Config,
        directory: Arc<WindowDirectory>,
        pointer: Arc<dyn PointerCapture>,
        events: EventSender,
    ) -> Self {
        let converter = CoordinateConverter::default();
        Reactor {
            snap: SnapEngine::new(
                directory.clone(),
                converter.clone(),
                events.clone(),
                config.snap.clone(),
            ),
            drag: DragCoordinator::new(directory.clone(), pointer, events.clone()),
            animator: Animator::new(
                directory.clone(),
                converter.clone(),
                events,
                config.animation.clone(),
            ),
            input: InputQueue::new(config.input.queue_capacity),
            converter,
            directory,
            config,
        }
    }

    /// A handle producers on other threads push pointer input into.
    pub fn input_queue(&self) -> InputQueue { self.input.clone() }

    pub fn directory(&self) -> &Arc<WindowDirectory> { &self.directory }

    pub fn snap_engine(&self) -> &SnapEngine { &self.snap }

    pub fn animator(&self) -> &Animator { &self.animator }

    pub fn drag(&self) -> &DragCoordinator { &self.drag }

    pub fn config(&self) -> &Config { &self.config }

    pub fn needs_tick(&self) -> bool {
        self.animator.is_ticking() || self.drag.is_dragging() || !self.input.is_empty()
    }

    pub async fn run(mut self, mut events: Receiver) {
        let mut interval = tokio::time::interval(self.config.animation.tick_interval());
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                event = events.recv() => {
                    let Some((span, event)) = event else { break };
                    let _guard = span.enter();
                    self.handle_event(event);
                }
                _ = interval.tick(), if self.needs_tick() => {
                    self.tick(Instant::now());
                }
            }
        }
        debug!("event channel closed, reactor exiting");
    }

    fn log_event(&self, event: &Event) {
        match event {
            Event::WindowMoved(..) => trace!(?event, "Event"),
            _ => debug!(?event, "Event"),
        }
    }

    #[instrument(name = "reactor::handle_event", skip(self, event))]
    pub fn handle_event(&mut self, event: Event) {
        self.log_event(&event);
        match event {
            Event::Command(request, response) => {
                let result = self.handle_command_at(request, Instant::now());
                if let Some(response) = response {
                    _ = response.send(result);
                }
            }
            Event::WindowCreated { id, native, flags } => self.register_window(id, native, flags),
            Event::WindowDestroyed(id) => self.destroy_window(&id),
            Event::WindowShown(id) => self.snap.on_window_shown(&id),
            Event::WindowHidden(id) => self.snap.on_window_hidden(&id),
            Event::WindowMoved(id) => self.snap.on_window_moved(&id),
            Event::ScreensChanged(screens) => self.screens_changed(screens),
            Event::ConfigUpdated(config) => self.config_updated(config),
        }
    }

    /// Runs one command as if it arrived at `now`.
    pub fn handle_command_at(&mut self, request: Request, now: Instant) -> Response {
        self.dispatch(request, now)
    }

    pub fn register_window(
        &mut self,
        id: WindowId,
        native: Box<dyn NativeWindow>,
        flags: WindowFlags,
    ) {
        if self.directory.exists(&id) {
            debug!(%id, "window id reused, dropping the old window first");
            self.destroy_window(&id);
        }
        self.directory.insert(id, native, flags);
    }

    /// Purges every reference to `id` from the engines, then removes it from
    /// the directory.
    pub fn destroy_window(&mut self, id: &WindowId) {
        self.drag.forget_window(id);
        self.animator.forget_window(id);
        self.snap.on_window_destroyed(id);
        self.directory.remove(id);
    }

    pub fn screens_changed(&mut self, screens: Vec<Screen>) {
        info!(count = screens.len(), "screens changed");
        self.converter = CoordinateConverter::new(screens);
        self.snap.set_converter(self.converter.clone());
        self.animator.set_converter(self.converter.clone());
        for window in self.directory.all() {
            self.snap.on_window_moved(window.id());
        }
    }

    fn config_updated(&mut self, mut config: Config) {
        let fixes = config.auto_fix_values();
        if fixes > 0 {
            info!(fixes, "repaired invalid config values");
        }
        self.snap.set_settings(config.snap.clone());
        self.animator.set_settings(config.animation.clone());
        if config.input.queue_capacity != self.config.input.queue_capacity
            || config.animation.tick_interval_ms != self.config.animation.tick_interval_ms
        {
            debug!("queue capacity and tick interval take effect on restart");
        }
        self.config = config;
    }

    /// Drains queued input into the drag coordinator, then advances
    /// animations. Followers of animated windows are redocked before this
    /// returns.
    pub fn tick(&mut self, now: Instant) {
        for event in self.input.drain() {
            self.drag.handle_input(event, &mut self.snap);
        }
        for id in self.animator.tick(now) {
            self.snap.on_window_moved(&id);
        }
    }
}
