//! Time-based interpolation of window properties.
//!
//! Animations are keyed by window and property; a new animation on a key
//! replaces the old one. The animator does not own a timer. Its owner calls
//! [`Animator::tick`] at the configured interval while
//! [`Animator::is_ticking`] is true, and stops once it turns false.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use serde_with::{DurationMilliSecondsWithFrac, serde_as};
use strum::{Display, EnumIter, EnumString};
use tracing::{debug, trace};

use crate::actor::broadcast::{EventSender, PaletteEvent};
use crate::actor::reactor::CommandError;
use crate::common::collections::BTreeMap;
use crate::common::config::{AnimationEasing, AnimationSettings};
use crate::model::WindowId;
use crate::sys::geometry::{Point, Size};
use crate::sys::screen::CoordinateConverter;
use crate::sys::window::{PaletteWindow, WindowDirectory};

#[derive(
    Serialize,
    Deserialize,
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum AnimatedProperty {
    X,
    Y,
    Width,
    Height,
    Opacity,
}

impl AnimatedProperty {
    pub fn is_geometry(self) -> bool { !matches!(self, AnimatedProperty::Opacity) }
}

/// One property animation as requested by the host. Geometry values are
/// logical pixels.
#[serde_as]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnimationRequest {
    pub property: AnimatedProperty,
    pub to: f64,
    /// Milliseconds.
    #[serde_as(as = "Option<DurationMilliSecondsWithFrac<f64>>")]
    #[serde(default)]
    pub duration: Option<Duration>,
    #[serde(default)]
    pub easing: Option<AnimationEasing>,
    /// Starting value; the window's current value when absent.
    #[serde(default)]
    pub from: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
struct ActiveAnimation {
    from: f64,
    to: f64,
    duration: Duration,
    easing: AnimationEasing,
    start: Instant,
}

impl ActiveAnimation {
    fn progress(&self, now: Instant) -> f64 {
        if self.duration.is_zero() {
            return 1.0;
        }
        now.saturating_duration_since(self.start).as_secs_f64() / self.duration.as_secs_f64()
    }

    fn value_at(&self, t: f64) -> f64 { self.from + (self.to - self.from) * self.easing.apply(t) }
}

pub struct Animator {
    directory: Arc<WindowDirectory>,
    converter: CoordinateConverter,
    events: EventSender,
    settings: AnimationSettings,
    animations: BTreeMap<(WindowId, AnimatedProperty), ActiveAnimation>,
}

impl Animator {
    pub fn new(
        directory: Arc<WindowDirectory>,
        converter: CoordinateConverter,
        events: EventSender,
        settings: AnimationSettings,
    ) -> Self {
        Self {
            directory,
            converter,
            events,
            settings,
            animations: BTreeMap::new(),
        }
    }

    pub fn set_converter(&mut self, converter: CoordinateConverter) { self.converter = converter; }

    pub fn set_settings(&mut self, settings: AnimationSettings) { self.settings = settings; }

    pub fn tick_interval(&self) -> Duration { self.settings.tick_interval() }

    /// Whether the periodic tick needs to run.
    pub fn is_ticking(&self) -> bool { !self.animations.is_empty() }

    pub fn is_animating(&self, id: &WindowId) -> bool {
        self.animations.keys().any(|(window, _)| window == id)
    }

    pub fn animate(
        &mut self,
        id: &WindowId,
        request: AnimationRequest,
        now: Instant,
    ) -> Result<(), CommandError> {
        self.animate_multiple(id, vec![request], now)
    }

    /// Starts several animations on one window. Either all of them start or,
    /// on error, none do.
    pub fn animate_multiple(
        &mut self,
        id: &WindowId,
        requests: Vec<AnimationRequest>,
        now: Instant,
    ) -> Result<(), CommandError> {
        let window = self.directory.get(id).ok_or_else(|| CommandError::NotFound(id.clone()))?;
        for request in &requests {
            if !request.to.is_finite() || request.from.is_some_and(|f| !f.is_finite()) {
                return Err(CommandError::InvalidParams(format!(
                    "{} animation needs finite values",
                    request.property
                )));
            }
        }

        for request in requests {
            let animation = ActiveAnimation {
                from: request.from.unwrap_or_else(|| self.current_value(&window, request.property)),
                to: request.to,
                duration: request.duration.unwrap_or_else(|| self.settings.default_duration()),
                easing: request.easing.unwrap_or(self.settings.default_easing),
                start: now,
            };
            debug!(%id, property = %request.property, ?animation, "animate");
            if self
                .animations
                .insert((id.clone(), request.property), animation)
                .is_some()
            {
                trace!(%id, property = %request.property, "replaced running animation");
            }
        }
        Ok(())
    }

    /// Cancels every animation on `id`. Values stay where they are.
    pub fn stop(&mut self, id: &WindowId) {
        let before = self.animations.len();
        self.animations.retain(|(window, _), _| window != id);
        if self.animations.len() != before {
            debug!(%id, stopped = before - self.animations.len(), "animations stopped");
        }
    }

    pub fn stop_all(&mut self) {
        if !self.animations.is_empty() {
            debug!(stopped = self.animations.len(), "all animations stopped");
        }
        self.animations.clear();
    }

    /// Advances every animation to `now`. Returns the windows whose geometry
    /// changed, in key order.
    pub fn tick(&mut self, now: Instant) -> Vec<WindowId> {
        let mut moved: Vec<WindowId> = Vec::new();
        let mut finished = Vec::new();

        for ((id, property), animation) in &self.animations {
            let Some(window) = self.directory.get(id) else {
                trace!(%id, "window gone, dropping animation");
                finished.push(((id.clone(), *property), false));
                continue;
            };
            let t = animation.progress(now);
            let (value, done) = if t >= 1.0 {
                (animation.to, true)
            } else {
                (animation.value_at(t), false)
            };
            self.apply(&window, *property, value);
            if property.is_geometry() && moved.last() != Some(id) {
                moved.push(id.clone());
            }
            if done {
                finished.push(((id.clone(), *property), true));
            }
        }

        for ((id, property), completed) in finished {
            self.animations.remove(&(id.clone(), property));
            if completed {
                debug!(%id, %property, "animation complete");
                self.events.send(PaletteEvent::Complete { window_id: id, property });
            }
        }
        moved
    }

    pub fn forget_window(&mut self, id: &WindowId) { self.stop(id); }

    fn current_value(&self, window: &PaletteWindow, property: AnimatedProperty) -> f64 {
        let frame = window.frame();
        let scale = self.converter.scale_for_frame(frame);
        let logical = |v: f64| CoordinateConverter::to_logical(v, scale);
        match property {
            AnimatedProperty::X => logical(frame.origin.x),
            AnimatedProperty::Y => logical(frame.origin.y),
            AnimatedProperty::Width => logical(frame.size.width),
            AnimatedProperty::Height => logical(frame.size.height),
            AnimatedProperty::Opacity => window.native().alpha(),
        }
    }

    fn apply(&self, window: &PaletteWindow, property: AnimatedProperty, value: f64) {
        let frame = window.frame();
        let scale = self.converter.scale_for_frame(frame);
        let physical = CoordinateConverter::to_physical(value, scale);
        let native = window.native();
        match property {
            AnimatedProperty::X => native.move_to(Point::new(physical, frame.origin.y)),
            AnimatedProperty::Y => native.move_to(Point::new(frame.origin.x, physical)),
            AnimatedProperty::Width => {
                native.resize(Size::new(physical.max(0.0), frame.size.height))
            }
            AnimatedProperty::Height => {
                native.resize(Size::new(frame.size.width, physical.max(0.0)))
            }
            AnimatedProperty::Opacity => native.set_alpha(value.clamp(0.0, 1.0)),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use test_log::test;

    use super::*;
    use crate::actor;
    use crate::sys::geometry::Rect;
    use crate::sys::headless::HeadlessWindow;
    use crate::sys::window::{NativeWindow, WindowFlags};

    struct Fixture {
        animator: Animator,
        native: HeadlessWindow,
        events: actor::Receiver<PaletteEvent>,
        start: Instant,
    }

    fn fixture() -> Fixture {
        let directory = Arc::new(WindowDirectory::new());
        let native = HeadlessWindow::new(Rect::new(0.0, 0.0, 100.0, 100.0));
        directory.insert("w".into(), Box::new(native.clone()), WindowFlags::default());
        let (tx, events) = actor::channel();
        let animator = Animator::new(
            directory,
            CoordinateConverter::default(),
            tx,
            AnimationSettings::default(),
        );
        Fixture {
            animator,
            native,
            events,
            start: Instant::now(),
        }
    }

    fn request(property: AnimatedProperty, to: f64, ms: u64) -> AnimationRequest {
        AnimationRequest {
            property,
            to,
            duration: Some(Duration::from_millis(ms)),
            easing: Some(AnimationEasing::Linear),
            from: None,
        }
    }

    fn at(f: &Fixture, ms: u64) -> Instant { f.start + Duration::from_millis(ms) }

    fn completions(f: &mut Fixture) -> Vec<PaletteEvent> {
        let mut out = Vec::new();
        while let Ok((_, event)) = f.events.try_recv() {
            out.push(event);
        }
        out
    }

    #[test]
    fn interpolates_and_finishes_exactly_on_target() {
        let mut f = fixture();
        let id = WindowId::from("w");
        f.animator.animate(&id, request(AnimatedProperty::X, 200.0, 100), f.start).unwrap();
        assert!(f.animator.is_animating(&id));

        assert_eq!(f.animator.tick(at(&f, 50)), vec![id.clone()]);
        assert_eq!(f.native.frame(), Rect::new(100.0, 0.0, 100.0, 100.0));

        f.animator.tick(at(&f, 150));
        assert_eq!(f.native.frame(), Rect::new(200.0, 0.0, 100.0, 100.0));
        assert!(!f.animator.is_animating(&id));
        assert_eq!(
            completions(&mut f),
            vec![PaletteEvent::Complete { window_id: id, property: AnimatedProperty::X }]
        );
    }

    #[test]
    fn resizing_keeps_the_other_axis() {
        let mut f = fixture();
        let id = WindowId::from("w");
        f.animator
            .animate_multiple(
                &id,
                vec![
                    request(AnimatedProperty::Height, 300.0, 100),
                    request(AnimatedProperty::Y, 40.0, 100),
                ],
                f.start,
            )
            .unwrap();
        f.animator.tick(at(&f, 100));
        assert_eq!(f.native.frame(), Rect::new(0.0, 40.0, 100.0, 300.0));
    }

    #[test]
    fn a_second_animate_on_the_same_key_replaces_the_first() {
        let mut f = fixture();
        let id = WindowId::from("w");
        f.animator.animate(&id, request(AnimatedProperty::Opacity, 0.0, 100), f.start).unwrap();
        f.animator.tick(at(&f, 50));
        f.animator
            .animate(&id, request(AnimatedProperty::Opacity, 1.0, 200), at(&f, 50))
            .unwrap();

        f.animator.tick(at(&f, 120));
        assert!(completions(&mut f).is_empty());
        f.animator.tick(at(&f, 260));
        assert_eq!(f.native.alpha(), 1.0);
        assert_eq!(completions(&mut f).len(), 1);
        assert!(!f.animator.is_ticking());
    }

    #[test]
    fn explicit_from_overrides_the_current_value() {
        let mut f = fixture();
        let id = WindowId::from("w");
        let mut req = request(AnimatedProperty::Width, 300.0, 100);
        req.from = Some(200.0);
        f.animator.animate(&id, req, f.start).unwrap();
        f.animator.tick(at(&f, 50));
        assert_eq!(f.native.frame().size.width, 250.0);
    }

    #[test]
    fn nothing_is_written_once_idle() {
        let mut f = fixture();
        let id = WindowId::from("w");
        f.animator.animate(&id, request(AnimatedProperty::X, 10.0, 20), f.start).unwrap();
        f.animator.tick(at(&f, 30));
        assert!(!f.animator.is_ticking());

        let writes = f.native.writes();
        assert!(f.animator.tick(at(&f, 60)).is_empty());
        assert_eq!(f.native.writes(), writes);
    }

    #[test]
    fn stop_is_immediate_and_idempotent() {
        let mut f = fixture();
        let id = WindowId::from("w");
        f.animator.animate(&id, request(AnimatedProperty::X, 100.0, 100), f.start).unwrap();
        f.animator.animate(&id, request(AnimatedProperty::Y, 100.0, 100), f.start).unwrap();
        f.animator.stop(&id);
        f.animator.stop(&id);
        assert!(!f.animator.is_animating(&id));
        f.animator.tick(at(&f, 200));
        assert!(completions(&mut f).is_empty());
        assert_eq!(f.native.frame().origin, Point::new(0.0, 0.0));

        f.animator.animate(&id, request(AnimatedProperty::X, 100.0, 100), f.start).unwrap();
        f.animator.stop_all();
        assert!(!f.animator.is_ticking());
    }

    #[test]
    fn unknown_window_is_rejected() {
        let mut f = fixture();
        let err = f
            .animator
            .animate(&"nope".into(), request(AnimatedProperty::X, 1.0, 10), f.start)
            .unwrap_err();
        assert_eq!(err.code(), "NOT_FOUND");
        assert!(!f.animator.is_ticking());
    }

    #[test]
    fn zero_duration_completes_on_the_next_tick() {
        let mut f = fixture();
        let id = WindowId::from("w");
        f.animator.animate(&id, request(AnimatedProperty::Opacity, 0.25, 0), f.start).unwrap();
        f.animator.tick(f.start);
        assert_eq!(f.native.alpha(), 0.25);
        assert_eq!(completions(&mut f).len(), 1);
    }

    #[test]
    fn request_wire_format() {
        let req: AnimationRequest =
            serde_json::from_str(r#"{"property":"opacity","to":0.5,"duration":150.5}"#).unwrap();
        assert_eq!(req.property, AnimatedProperty::Opacity);
        assert_eq!(req.duration, Some(Duration::from_micros(150_500)));
        assert_eq!(req.easing, None);
        assert!(serde_json::from_str::<AnimationRequest>(r#"{"property":"depth","to":1}"#).is_err());
    }
}
