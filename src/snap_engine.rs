//! The dock/snap engine.
//!
//! Keeps the follower → target bindings, repositions followers when their
//! targets move, and looks for a nearby target while an unbound window is
//! dragged. A window follows at most one target but may be the target of
//! any number of followers.
//!
//! All geometry here is physical; gaps, thresholds and reported distances are
//! logical and go through the [`CoordinateConverter`] using the scale of the
//! screen the relevant window is on.

mod binding;
mod edge;
mod proximity;

use std::sync::Arc;

pub use binding::{OnTargetDestroyed, OnTargetHidden, SnapBinding, SnapPolicy, docked_origin};
pub use edge::{Alignment, Edge, Edges, are_compatible, edge_distance};
pub use proximity::{
    AutoSnapConfig, Candidate, ProximityMatch, ProximityState, find_best_match,
};
use tracing::{debug, instrument, trace};

use crate::actor::broadcast::{EventSender, PaletteEvent};
use crate::actor::drag::DragObserver;
use crate::actor::reactor::CommandError;
use crate::common::collections::{BTreeMap, HashMap, HashSet};
use crate::common::config::SnapSettings;
use crate::model::WindowId;
use crate::sys::geometry::{Point, Rect};
use crate::sys::screen::CoordinateConverter;
use crate::sys::window::{PaletteWindow, WindowDirectory};

#[derive(Debug, Clone)]
struct RegisteredConfig {
    seq: u64,
    config: AutoSnapConfig,
}

pub struct SnapEngine {
    directory: Arc<WindowDirectory>,
    converter: CoordinateConverter,
    events: EventSender,
    settings: SnapSettings,
    bindings: BTreeMap<WindowId, SnapBinding>,
    auto_snap: HashMap<WindowId, RegisteredConfig>,
    next_config_seq: u64,
    proximity: Option<ProximityState>,
    /// Followers this engine hid because their target was hidden.
    hidden_followers: HashSet<WindowId>,
}

impl SnapEngine {
    pub fn new(
        directory: Arc<WindowDirectory>,
        converter: CoordinateConverter,
        events: EventSender,
        settings: SnapSettings,
    ) -> Self {
        Self {
            directory,
            converter,
            events,
            settings,
            bindings: BTreeMap::new(),
            auto_snap: HashMap::default(),
            next_config_seq: 0,
            proximity: None,
            hidden_followers: HashSet::default(),
        }
    }

    pub fn set_converter(&mut self, converter: CoordinateConverter) { self.converter = converter; }

    pub fn set_settings(&mut self, settings: SnapSettings) { self.settings = settings; }

    pub fn binding(&self, follower: &WindowId) -> Option<&SnapBinding> { self.bindings.get(follower) }

    pub fn bindings(&self) -> impl Iterator<Item = &SnapBinding> { self.bindings.values() }

    pub fn auto_snap_config(&self, id: &WindowId) -> Option<&AutoSnapConfig> {
        self.auto_snap.get(id).map(|r| &r.config)
    }

    pub fn proximity(&self) -> Option<&ProximityState> { self.proximity.as_ref() }

    /// Docks `binding.follower_id` against `binding.target_id`, replacing any
    /// binding the follower already had.
    #[instrument(skip(self), fields(follower = %binding.follower_id, target = %binding.target_id))]
    pub fn snap(&mut self, binding: SnapBinding) -> Result<(), CommandError> {
        if self.directory.get(&binding.follower_id).is_none() {
            return Err(CommandError::NotFound(binding.follower_id));
        }
        if self.directory.get(&binding.target_id).is_none() {
            return Err(CommandError::TargetNotFound(binding.target_id));
        }
        if binding.follower_id == binding.target_id {
            return Err(CommandError::InvalidParams("a window cannot snap to itself".into()));
        }
        if !binding.gap.is_finite() {
            return Err(CommandError::InvalidParams(format!("gap must be finite, got {}", binding.gap)));
        }

        let follower = binding.follower_id.clone();
        let target = binding.target_id.clone();
        self.hidden_followers.remove(&follower);
        if self.proximity.as_ref().is_some_and(|p| p.dragged_id == follower) {
            self.clear_proximity();
        }
        self.bindings.insert(follower.clone(), binding);
        self.reposition(&follower);
        self.events.send(PaletteEvent::Snapped { window_id: follower, target_id: target });
        Ok(())
    }

    /// Removes the follower's binding. Detaching an unbound window does
    /// nothing.
    pub fn detach(&mut self, follower: &WindowId) -> bool {
        let Some(binding) = self.bindings.remove(follower) else {
            return false;
        };
        debug!(%follower, target = %binding.target_id, "detached");
        self.hidden_followers.remove(follower);
        self.events.send(PaletteEvent::Detached { window_id: follower.clone() });
        true
    }

    /// Moves the follower back to its docked position.
    pub fn re_snap(&mut self, follower: &WindowId) -> Result<(), CommandError> {
        let Some(target) = self.bindings.get(follower).map(|b| b.target_id.clone()) else {
            return Err(CommandError::NoBinding(follower.clone()));
        };
        self.reposition(follower);
        self.events.send(PaletteEvent::Snapped { window_id: follower.clone(), target_id: target });
        Ok(())
    }

    /// Logical distance between where the follower is and where its binding
    /// would put it. Zero when unbound.
    pub fn snap_distance(&self, follower: &WindowId) -> f64 {
        let Some(binding) = self.bindings.get(follower) else {
            return 0.0;
        };
        let Some(window) = self.directory.get(follower) else {
            return 0.0;
        };
        let Some(docked) = self.docked_position(binding) else {
            return 0.0;
        };
        let frame = window.frame();
        let physical = frame.origin.distance_to(docked);
        CoordinateConverter::to_logical(physical, self.converter.scale_for_frame(frame))
    }

    /// Installs or clears a window's auto-snap config. A config without edges
    /// clears it. Replacing a config keeps the window's place in the
    /// tie-break order.
    pub fn set_auto_snap_config(
        &mut self,
        id: &WindowId,
        config: Option<AutoSnapConfig>,
    ) -> Result<(), CommandError> {
        match config.filter(|c| !c.is_empty()) {
            None => {
                if self.auto_snap.remove(id).is_some() {
                    debug!(%id, "auto-snap config cleared");
                }
            }
            Some(config) => {
                if !self.directory.exists(id) {
                    return Err(CommandError::NotFound(id.clone()));
                }
                if config.proximity_threshold.is_some_and(|t| !(t >= 0.0)) {
                    return Err(CommandError::InvalidParams(
                        "proximityThreshold must be non-negative".into(),
                    ));
                }
                debug!(%id, ?config, "auto-snap config set");
                match self.auto_snap.get_mut(id) {
                    Some(existing) => existing.config = config,
                    None => {
                        let seq = self.next_config_seq;
                        self.next_config_seq += 1;
                        self.auto_snap.insert(id.clone(), RegisteredConfig { seq, config });
                    }
                }
            }
        }

        if self.proximity.as_ref().is_some_and(|p| p.involves(id) && !self.still_allowed(p)) {
            debug!(%id, "config change invalidated the snap zone");
            self.clear_proximity();
        }
        Ok(())
    }

    /// Whether the current configs still permit docking through the recorded
    /// edge pair.
    fn still_allowed(&self, state: &ProximityState) -> bool {
        let dragged = self.auto_snap.get(&state.dragged_id).is_some_and(|r| {
            r.config.can_snap_from.has(state.dragged_edge) && r.config.allows_target(&state.target_id)
        });
        let target = self
            .auto_snap
            .get(&state.target_id)
            .is_some_and(|r| r.config.accepts_snap_on.has(state.target_edge));
        dragged && target
    }

    pub fn on_window_moved(&mut self, id: &WindowId) { self.reposition_followers_of(id); }

    /// Brings back followers hidden along with `id`, then redocks every
    /// follower of `id`.
    pub fn on_window_shown(&mut self, id: &WindowId) {
        let mut pending = vec![id.clone()];
        let mut seen = HashSet::default();
        while let Some(target) = pending.pop() {
            if !seen.insert(target.clone()) {
                continue;
            }
            for follower in self.followers_of(&target) {
                if self.hidden_followers.remove(&follower) {
                    if let Some(window) = self.directory.get(&follower) {
                        trace!(%follower, "showing follower with its target");
                        window.native().set_visible(true);
                    }
                    pending.push(follower);
                }
            }
        }
        self.reposition_followers_of(id);
    }

    /// Hides followers whose policy asks for it. Nothing is repositioned.
    pub fn on_window_hidden(&mut self, id: &WindowId) {
        let mut pending = vec![id.clone()];
        let mut seen = HashSet::default();
        while let Some(target) = pending.pop() {
            if !seen.insert(target.clone()) {
                continue;
            }
            for follower in self.followers_of(&target) {
                let hide = self.bindings.get(&follower).is_some_and(|b| {
                    b.policy.on_target_hidden == OnTargetHidden::HideFollower
                });
                if !hide {
                    continue;
                }
                let Some(window) = self.directory.get(&follower) else {
                    continue;
                };
                if window.is_visible() {
                    trace!(%follower, "hiding follower with its target");
                    window.native().set_visible(false);
                    self.hidden_followers.insert(follower.clone());
                    pending.push(follower);
                }
            }
        }
    }

    /// Forgets everything that refers to `id`. Must run before the window is
    /// removed from the directory so hidden-follower policies can still act.
    #[instrument(skip(self))]
    pub fn on_window_destroyed(&mut self, id: &WindowId) {
        self.bindings.remove(id);
        self.hidden_followers.remove(id);

        for follower in self.followers_of(id) {
            let Some(binding) = self.bindings.remove(&follower) else {
                continue;
            };
            self.hidden_followers.remove(&follower);
            if binding.policy.on_target_destroyed == OnTargetDestroyed::HideAndDetach {
                if let Some(window) = self.directory.get(&follower) {
                    window.native().set_visible(false);
                }
            }
            debug!(%follower, "target destroyed, detaching");
            self.events.send(PaletteEvent::Detached { window_id: follower });
        }

        self.auto_snap.remove(id);

        if let Some(state) = self.proximity.take_if(|p| p.involves(id)) {
            if state.dragged_id != *id {
                self.events.send(PaletteEvent::ProximityExited {
                    window_id: state.dragged_id,
                    target_id: state.target_id,
                });
            }
        }
    }

    /// Renders the binding graph, one tree per target that follows nothing.
    pub fn debug_tree(&self) -> String {
        let mut seen = HashSet::default();
        let mut roots: Vec<WindowId> = self
            .bindings
            .values()
            .map(|b| b.target_id.clone())
            .filter(|t| !self.bindings.contains_key(t))
            .collect();
        roots.sort();
        roots.dedup();

        let mut children: Vec<ascii_tree::Tree> =
            roots.iter().map(|r| self.tree_node(r, None, &mut seen)).collect();
        // Anything left over is part of a cycle.
        for follower in self.bindings.keys() {
            if !seen.contains(follower) {
                children.push(self.tree_node(follower, None, &mut seen));
            }
        }

        let root = if children.is_empty() {
            ascii_tree::Tree::Leaf(vec!["(no bindings)".to_string()])
        } else {
            ascii_tree::Tree::Node("bindings".to_string(), children)
        };
        let mut out = String::new();
        let _ = ascii_tree::write_tree(&mut out, &root);
        out
    }

    fn tree_node(
        &self,
        id: &WindowId,
        via: Option<&SnapBinding>,
        seen: &mut HashSet<WindowId>,
    ) -> ascii_tree::Tree {
        let desc = match via {
            Some(b) => format!(
                "{id} ({} to {}, {}, gap {})",
                b.follower_edge, b.target_edge, b.alignment, b.gap
            ),
            None => id.to_string(),
        };
        if !seen.insert(id.clone()) {
            return ascii_tree::Tree::Leaf(vec![format!("{desc} (cycle)")]);
        }
        let children: Vec<_> = self
            .followers_of(id)
            .iter()
            .filter_map(|f| self.bindings.get(f).map(|b| self.tree_node(f, Some(b), seen)))
            .collect();
        if children.is_empty() {
            ascii_tree::Tree::Leaf(vec![desc])
        } else {
            ascii_tree::Tree::Node(desc, children)
        }
    }

    fn followers_of(&self, target: &WindowId) -> Vec<WindowId> {
        self.bindings
            .values()
            .filter(|b| &b.target_id == target)
            .map(|b| b.follower_id.clone())
            .collect()
    }

    fn docked_position(&self, binding: &SnapBinding) -> Option<Point> {
        let follower = self.directory.get(&binding.follower_id)?;
        let target = self.directory.get(&binding.target_id)?;
        Some(self.docked_position_for(binding, &follower, &target))
    }

    fn docked_position_for(
        &self,
        binding: &SnapBinding,
        follower: &PaletteWindow,
        target: &PaletteWindow,
    ) -> Point {
        let target_frame = target.frame();
        let scale = self.converter.scale_for_frame(target_frame);
        let gap = CoordinateConverter::to_physical(binding.gap, scale);
        docked_origin(
            &target_frame,
            &follower.frame(),
            binding.follower_edge,
            binding.target_edge,
            binding.alignment,
            gap,
        )
    }

    /// Places `follower` at its docked position, then everything docked to
    /// it in turn.
    fn reposition(&mut self, follower: &WindowId) {
        self.place(follower);
        self.reposition_followers_of(follower);
    }

    fn place(&self, follower: &WindowId) {
        let Some(binding) = self.bindings.get(follower) else {
            return;
        };
        let (Some(window), Some(target)) =
            (self.directory.get(follower), self.directory.get(&binding.target_id))
        else {
            trace!(%follower, "follower or target unavailable, not repositioning");
            return;
        };
        let origin = self.docked_position_for(binding, &window, &target);
        if window.frame().origin != origin {
            trace!(%follower, ?origin, "repositioning follower");
            window.native().move_to(origin);
        }
    }

    fn reposition_followers_of(&mut self, target: &WindowId) {
        let mut pending = self.followers_of(target);
        let mut seen: HashSet<WindowId> = HashSet::default();
        seen.insert(target.clone());
        while let Some(follower) = pending.pop() {
            if !seen.insert(follower.clone()) {
                continue;
            }
            self.place(&follower);
            pending.extend(self.followers_of(&follower));
        }
    }

    fn clear_proximity(&mut self) {
        if let Some(state) = self.proximity.take() {
            self.events.send(PaletteEvent::ProximityExited {
                window_id: state.dragged_id,
                target_id: state.target_id,
            });
        }
    }

    fn candidates(&self, dragged: &WindowId, config: &AutoSnapConfig) -> Vec<Candidate> {
        let threshold = config
            .proximity_threshold
            .unwrap_or(self.settings.default_proximity_threshold);

        let mut registered: Vec<(&WindowId, &RegisteredConfig)> = self
            .auto_snap
            .iter()
            .filter(|(id, r)| *id != dragged && !r.config.accepts_snap_on.is_empty())
            .collect();
        registered.sort_by_key(|(_, r)| r.seq);

        registered
            .into_iter()
            .filter(|(id, _)| config.allows_target(id))
            .filter(|(id, _)| self.bindings.get(*id).is_none_or(|b| &b.target_id != dragged))
            .filter_map(|(id, r)| {
                let window = self.directory.get(id)?;
                if !window.is_visible() {
                    return None;
                }
                let frame = window.frame();
                Some(Candidate {
                    id: id.clone(),
                    frame,
                    accepts_snap_on: r.config.accepts_snap_on,
                    threshold: threshold * self.converter.scale_for_frame(frame),
                })
            })
            .collect()
    }

    fn check_proximity(&mut self, dragged: &WindowId, frame: Rect) {
        if self.proximity.as_ref().is_some_and(|p| &p.dragged_id != dragged) {
            trace!("dropping proximity state left over from another drag");
            self.proximity = None;
        }

        let Some(config) = self
            .auto_snap
            .get(dragged)
            .map(|r| r.config.clone())
            .filter(|c| !c.can_snap_from.is_empty())
        else {
            self.clear_proximity();
            return;
        };

        let candidates = self.candidates(dragged, &config);
        let Some(best) = find_best_match(&frame, config.can_snap_from, candidates) else {
            self.clear_proximity();
            return;
        };
        let distance = self.logical_distance(&best);

        if self.proximity.as_ref().is_some_and(|s| s.same_match(&best)) {
            self.events.send(PaletteEvent::ProximityUpdated {
                window_id: dragged.clone(),
                target_id: best.target_id,
                distance,
            });
            return;
        }

        self.clear_proximity();
        debug!(
            %dragged,
            target = %best.target_id,
            dragged_edge = %best.dragged_edge,
            target_edge = %best.target_edge,
            "entered snap zone"
        );
        self.proximity = Some(ProximityState {
            dragged_id: dragged.clone(),
            target_id: best.target_id.clone(),
            dragged_edge: best.dragged_edge,
            target_edge: best.target_edge,
        });
        self.events.send(PaletteEvent::ProximityEntered {
            window_id: dragged.clone(),
            target_id: best.target_id,
            dragged_edge: best.dragged_edge,
            target_edge: best.target_edge,
            distance,
            show_feedback: config.show_feedback,
        });
    }

    fn logical_distance(&self, m: &ProximityMatch) -> f64 {
        let scale = self
            .directory
            .get(&m.target_id)
            .map(|w| self.converter.scale_for_frame(w.frame()))
            .unwrap_or(1.0);
        CoordinateConverter::to_logical(m.distance, scale)
    }
}

impl DragObserver for SnapEngine {
    fn drag_began(&mut self, id: &WindowId) {
        self.detach(id);
        if self.proximity.as_ref().is_some_and(|p| &p.dragged_id == id) {
            self.proximity = None;
        }
    }

    fn drag_moved(&mut self, id: &WindowId, frame: Rect) {
        self.reposition_followers_of(id);
        if !self.bindings.contains_key(id) {
            self.check_proximity(id, frame);
        }
    }

    fn drag_ended(&mut self, id: &WindowId, _frame: Rect) {
        let Some(state) = self.proximity.take_if(|p| &p.dragged_id == id) else {
            return;
        };
        if self.directory.get(&state.target_id).is_none() {
            debug!(target = %state.target_id, "snap target vanished before drop");
            return;
        }
        let binding = SnapBinding {
            follower_id: id.clone(),
            target_id: state.target_id.clone(),
            follower_edge: state.dragged_edge,
            target_edge: state.target_edge,
            alignment: self.settings.default_alignment,
            gap: self.settings.default_gap,
            policy: SnapPolicy::default(),
        };
        debug!(%id, target = %state.target_id, "dropped in snap zone");
        self.bindings.insert(id.clone(), binding);
        self.reposition(id);
        self.events.send(PaletteEvent::Snapped { window_id: id.clone(), target_id: state.target_id });
    }
}
