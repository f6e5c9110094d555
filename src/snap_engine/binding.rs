use serde::{Deserialize, Serialize};

use super::edge::{Alignment, Edge};
use crate::model::WindowId;
use crate::sys::geometry::{Point, Rect};

/// What happens to a follower when its target is hidden.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum OnTargetHidden {
    /// Hide the follower in place; it reappears when the target is shown.
    #[default]
    HideFollower,
    /// Leave the follower visible.
    None,
}

/// What happens to a follower when its target is destroyed. The binding is
/// always removed.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum OnTargetDestroyed {
    #[default]
    HideAndDetach,
    Detach,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SnapPolicy {
    #[serde(default)]
    pub on_target_hidden: OnTargetHidden,
    #[serde(default)]
    pub on_target_destroyed: OnTargetDestroyed,
}

/// Docks `follower` against `target`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SnapBinding {
    pub follower_id: WindowId,
    pub target_id: WindowId,
    pub follower_edge: Edge,
    pub target_edge: Edge,
    pub alignment: Alignment,
    /// Logical pixels between the two facing edges.
    pub gap: f64,
    pub policy: SnapPolicy,
}

/// Where a follower of the given frame goes when docked against `target`.
///
/// `gap` is in physical pixels. The edge pair is expected to be facing; for
/// any other pair only the cross-axis alignment is applied and the follower
/// keeps its current position on the constrained axis.
pub fn docked_origin(
    target: &Rect,
    follower: &Rect,
    follower_edge: Edge,
    target_edge: Edge,
    alignment: Alignment,
    gap: f64,
) -> Point {
    let (fw, fh) = (follower.size.width, follower.size.height);
    let (tw, th) = (target.size.width, target.size.height);
    let mut origin = follower.origin;

    match (follower_edge, target_edge) {
        // Follower below the target.
        (Edge::Top, Edge::Bottom) => origin.y = target.max_y() + gap,
        // Follower above the target.
        (Edge::Bottom, Edge::Top) => origin.y = target.min_y() - fh - gap,
        // Follower right of the target.
        (Edge::Left, Edge::Right) => origin.x = target.max_x() + gap,
        // Follower left of the target.
        (Edge::Right, Edge::Left) => origin.x = target.min_x() - fw - gap,
        _ => {}
    }

    if follower_edge.is_horizontal_edge() {
        origin.x = match alignment {
            Alignment::Leading => target.min_x(),
            Alignment::Trailing => target.max_x() - fw,
            Alignment::Center => target.min_x() + ((tw - fw) / 2.0).trunc(),
        };
    } else {
        origin.y = match alignment {
            Alignment::Leading => target.min_y(),
            Alignment::Trailing => target.max_y() - fh,
            Alignment::Center => target.min_y() + ((th - fh) / 2.0).trunc(),
        };
    }

    origin
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const TARGET: Rect = Rect::new(100.0, 100.0, 200.0, 150.0);
    const FOLLOWER: Rect = Rect::new(0.0, 0.0, 50.0, 50.0);

    #[test]
    fn below_and_centered() {
        let origin =
            docked_origin(&TARGET, &FOLLOWER, Edge::Top, Edge::Bottom, Alignment::Center, 4.0);
        assert_eq!(origin, Point::new(175.0, 254.0));
    }

    #[test]
    fn above_with_leading_and_trailing() {
        let origin =
            docked_origin(&TARGET, &FOLLOWER, Edge::Bottom, Edge::Top, Alignment::Leading, 0.0);
        assert_eq!(origin, Point::new(100.0, 50.0));
        let origin =
            docked_origin(&TARGET, &FOLLOWER, Edge::Bottom, Edge::Top, Alignment::Trailing, 2.0);
        assert_eq!(origin, Point::new(250.0, 48.0));
    }

    #[test]
    fn beside_aligns_vertically() {
        let origin =
            docked_origin(&TARGET, &FOLLOWER, Edge::Left, Edge::Right, Alignment::Center, 10.0);
        assert_eq!(origin, Point::new(310.0, 150.0));
        let origin =
            docked_origin(&TARGET, &FOLLOWER, Edge::Right, Edge::Left, Alignment::Trailing, 0.0);
        assert_eq!(origin, Point::new(50.0, 200.0));
    }

    #[test]
    fn center_truncates_odd_spans() {
        let follower = Rect::new(0.0, 0.0, 51.0, 50.0);
        let origin =
            docked_origin(&TARGET, &follower, Edge::Top, Edge::Bottom, Alignment::Center, 0.0);
        assert_eq!(origin.x, 174.0);
    }

    #[test]
    fn policy_defaults() {
        let policy: SnapPolicy = serde_json::from_str("{}").unwrap();
        assert_eq!(policy.on_target_hidden, OnTargetHidden::HideFollower);
        assert_eq!(policy.on_target_destroyed, OnTargetDestroyed::HideAndDetach);
        let policy: SnapPolicy =
            serde_json::from_str(r#"{"onTargetHidden":"none","onTargetDestroyed":"detach"}"#)
                .unwrap();
        assert_eq!(policy.on_target_hidden, OnTargetHidden::None);
        assert_eq!(policy.on_target_destroyed, OnTargetDestroyed::Detach);
    }
}
