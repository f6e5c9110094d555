//! Nearest-edge search used while a window is being dragged.

use serde::{Deserialize, Serialize};

use super::edge::{Edge, Edges, are_compatible, edge_distance};
use crate::model::WindowId;
use crate::sys::geometry::Rect;

/// Per-window declaration of how it takes part in auto-snapping.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AutoSnapConfig {
    /// Edges this window may dock with while it is being dragged.
    #[serde(default)]
    pub can_snap_from: Edges,
    /// Edges other windows may dock against.
    #[serde(default)]
    pub accepts_snap_on: Edges,
    /// Targets this window may dock to while dragged. Empty allows any.
    #[serde(default)]
    pub target_ids: Vec<WindowId>,
    /// Logical pixels. Falls back to the configured default when absent.
    #[serde(default)]
    pub proximity_threshold: Option<f64>,
    #[serde(default = "yes")]
    pub show_feedback: bool,
}

fn yes() -> bool { true }

impl Default for AutoSnapConfig {
    fn default() -> Self {
        Self {
            can_snap_from: Edges::empty(),
            accepts_snap_on: Edges::empty(),
            target_ids: Vec::new(),
            proximity_threshold: None,
            show_feedback: true,
        }
    }
}

impl AutoSnapConfig {
    /// A config with no edges at all is the same as having none.
    pub fn is_empty(&self) -> bool { self.can_snap_from.is_empty() && self.accepts_snap_on.is_empty() }

    pub fn allows_target(&self, id: &WindowId) -> bool {
        self.target_ids.is_empty() || self.target_ids.contains(id)
    }
}

/// The recorded nearest candidate for the window being dragged.
#[derive(Debug, Clone, PartialEq)]
pub struct ProximityState {
    pub dragged_id: WindowId,
    pub target_id: WindowId,
    pub dragged_edge: Edge,
    pub target_edge: Edge,
}

impl ProximityState {
    pub fn involves(&self, id: &WindowId) -> bool { &self.dragged_id == id || &self.target_id == id }

    /// Same target through the same pair of edges.
    pub fn same_match(&self, m: &ProximityMatch) -> bool {
        self.target_id == m.target_id
            && self.dragged_edge == m.dragged_edge
            && self.target_edge == m.target_edge
    }
}

/// A window the dragged window could dock to.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub id: WindowId,
    pub frame: Rect,
    pub accepts_snap_on: Edges,
    /// Physical pixels on the candidate's screen.
    pub threshold: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProximityMatch {
    pub target_id: WindowId,
    pub dragged_edge: Edge,
    pub target_edge: Edge,
    /// Physical pixels.
    pub distance: f64,
}

/// Finds the closest compatible edge pair strictly inside its candidate's
/// threshold. Candidates are visited in the given order and a later one only
/// wins with a strictly smaller distance.
pub fn find_best_match(
    dragged: &Rect,
    can_snap_from: Edges,
    candidates: impl IntoIterator<Item = Candidate>,
) -> Option<ProximityMatch> {
    let mut best: Option<ProximityMatch> = None;
    for candidate in candidates {
        for dragged_edge in can_snap_from.edges() {
            for target_edge in candidate.accepts_snap_on.edges() {
                if !are_compatible(dragged_edge, target_edge) {
                    continue;
                }
                let distance = edge_distance(dragged, dragged_edge, &candidate.frame, target_edge);
                if distance >= candidate.threshold {
                    continue;
                }
                if best.as_ref().is_none_or(|b| distance < b.distance) {
                    best = Some(ProximityMatch {
                        target_id: candidate.id.clone(),
                        dragged_edge,
                        target_edge,
                        distance,
                    });
                }
            }
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn candidate(id: &str, frame: Rect, accepts: Edges) -> Candidate {
        Candidate {
            id: id.into(),
            frame,
            accepts_snap_on: accepts,
            threshold: 50.0,
        }
    }

    #[test]
    fn picks_the_nearest_compatible_edge() {
        let dragged = Rect::new(100.0, 270.0, 50.0, 50.0);
        let candidates = vec![
            candidate("far", Rect::new(100.0, 0.0, 200.0, 230.0), Edges::all()),
            candidate("near", Rect::new(100.0, 100.0, 200.0, 160.0), Edges::BOTTOM),
        ];
        let best = find_best_match(&dragged, Edges::TOP, candidates).unwrap();
        assert_eq!(
            best,
            ProximityMatch {
                target_id: "near".into(),
                dragged_edge: Edge::Top,
                target_edge: Edge::Bottom,
                distance: 10.0,
            }
        );
    }

    #[test]
    fn ties_go_to_the_earlier_candidate() {
        let dragged = Rect::new(100.0, 270.0, 50.0, 50.0);
        let frame = Rect::new(100.0, 100.0, 200.0, 160.0);
        let candidates = vec![
            candidate("first", frame, Edges::BOTTOM),
            candidate("second", frame, Edges::BOTTOM),
        ];
        let best = find_best_match(&dragged, Edges::TOP, candidates).unwrap();
        assert_eq!(best.target_id, WindowId::from("first"));
    }

    #[test]
    fn threshold_is_exclusive() {
        let dragged = Rect::new(100.0, 310.0, 50.0, 50.0);
        let target = candidate("t", Rect::new(100.0, 100.0, 200.0, 160.0), Edges::BOTTOM);
        assert_eq!(find_best_match(&dragged, Edges::TOP, vec![target.clone()]), None);

        let dragged = Rect::new(100.0, 309.0, 50.0, 50.0);
        assert!(find_best_match(&dragged, Edges::TOP, vec![target]).is_some());
    }

    #[test]
    fn incompatible_or_non_overlapping_edges_never_match() {
        let dragged = Rect::new(100.0, 270.0, 50.0, 50.0);
        let target = candidate("t", Rect::new(100.0, 100.0, 200.0, 160.0), Edges::TOP);
        assert_eq!(find_best_match(&dragged, Edges::TOP, vec![target]), None);

        let aside = candidate("t", Rect::new(400.0, 100.0, 200.0, 160.0), Edges::BOTTOM);
        assert_eq!(find_best_match(&dragged, Edges::TOP, vec![aside]), None);
    }

    #[test]
    fn config_defaults_and_filters() {
        let config: AutoSnapConfig =
            serde_json::from_str(r#"{"canSnapFrom":["top"],"targetIds":["a"]}"#).unwrap();
        assert_eq!(config.can_snap_from, Edges::TOP);
        assert!(config.show_feedback);
        assert_eq!(config.proximity_threshold, None);
        assert!(config.allows_target(&"a".into()));
        assert!(!config.allows_target(&"b".into()));
        assert!(!config.is_empty());
        assert!(AutoSnapConfig::default().is_empty());
    }
}
