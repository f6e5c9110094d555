use bitflags::bitflags;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use strum::{Display, EnumIter, EnumString};

use crate::sys::geometry::Rect;

/// One side of a window rectangle.
#[derive(
    Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Edge {
    Top,
    Bottom,
    Left,
    Right,
}

impl Edge {
    pub fn opposite(self) -> Edge {
        match self {
            Edge::Top => Edge::Bottom,
            Edge::Bottom => Edge::Top,
            Edge::Left => Edge::Right,
            Edge::Right => Edge::Left,
        }
    }

    /// Top and bottom edges constrain the vertical axis; the follower is then
    /// aligned horizontally.
    pub fn is_horizontal_edge(self) -> bool { matches!(self, Edge::Top | Edge::Bottom) }

    fn flag(self) -> Edges {
        match self {
            Edge::Top => Edges::TOP,
            Edge::Bottom => Edges::BOTTOM,
            Edge::Left => Edges::LEFT,
            Edge::Right => Edges::RIGHT,
        }
    }
}

bitflags! {
    /// A set of edges. Iteration follows declaration order.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Edges: u8 {
        const TOP = 1 << 0;
        const BOTTOM = 1 << 1;
        const LEFT = 1 << 2;
        const RIGHT = 1 << 3;
    }
}

impl Edges {
    pub fn has(&self, edge: Edge) -> bool { self.contains(edge.flag()) }

    pub fn edges(&self) -> impl Iterator<Item = Edge> + '_ {
        [Edge::Top, Edge::Bottom, Edge::Left, Edge::Right]
            .into_iter()
            .filter(|e| self.has(*e))
    }
}

impl FromIterator<Edge> for Edges {
    fn from_iter<I: IntoIterator<Item = Edge>>(iter: I) -> Self {
        iter.into_iter().fold(Edges::empty(), |acc, e| acc | e.flag())
    }
}

impl From<Edge> for Edges {
    fn from(edge: Edge) -> Self { edge.flag() }
}

// On the wire an edge set is a list of edge names.
impl Serialize for Edges {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.edges())
    }
}

impl<'de> Deserialize<'de> for Edges {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Vec::<Edge>::deserialize(deserializer)?.into_iter().collect())
    }
}

/// Placement of a follower along its target's span.
#[derive(
    Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Alignment {
    Leading,
    #[default]
    Center,
    Trailing,
}

/// Whether a dragged window's edge can dock against a target's edge: only
/// facing edges (top/bottom, left/right) can.
pub fn are_compatible(dragged: Edge, target: Edge) -> bool { dragged.opposite() == target }

/// Gap between `dragged_edge` of `dragged` and `target_edge` of `target`.
///
/// Returns infinity when the edges are incompatible or when the rects do not
/// overlap on the axis perpendicular to the gap.
pub fn edge_distance(dragged: &Rect, dragged_edge: Edge, target: &Rect, target_edge: Edge) -> f64 {
    if !are_compatible(dragged_edge, target_edge) {
        return f64::INFINITY;
    }

    let overlap = if dragged_edge.is_horizontal_edge() {
        dragged.horizontal_overlap(target)
    } else {
        dragged.vertical_overlap(target)
    };
    if overlap <= 0.0 {
        return f64::INFINITY;
    }

    match dragged_edge {
        Edge::Top => (dragged.min_y() - target.max_y()).abs(),
        Edge::Bottom => (dragged.max_y() - target.min_y()).abs(),
        Edge::Left => (dragged.min_x() - target.max_x()).abs(),
        Edge::Right => (dragged.max_x() - target.min_x()).abs(),
    }
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn compatibility_is_exactly_the_facing_pairs() {
        let compatible = [
            (Edge::Top, Edge::Bottom),
            (Edge::Bottom, Edge::Top),
            (Edge::Left, Edge::Right),
            (Edge::Right, Edge::Left),
        ];
        let mut incompatible = 0;
        for a in Edge::iter() {
            for b in Edge::iter() {
                let expected = compatible.contains(&(a, b));
                assert_eq!(are_compatible(a, b), expected, "({a}, {b})");
                if !expected {
                    incompatible += 1;
                }
            }
        }
        assert_eq!(incompatible, 12);
    }

    #[test]
    fn distance_requires_perpendicular_overlap() {
        let target = Rect::new(100.0, 100.0, 200.0, 150.0);
        // Directly below the target, 10px away.
        let below = Rect::new(150.0, 260.0, 50.0, 50.0);
        assert_eq!(edge_distance(&below, Edge::Top, &target, Edge::Bottom), 10.0);

        // Same vertical gap but shifted fully to the right of the target.
        let off_to_side = Rect::new(400.0, 260.0, 50.0, 50.0);
        assert_eq!(
            edge_distance(&off_to_side, Edge::Top, &target, Edge::Bottom),
            f64::INFINITY
        );
    }

    #[test]
    fn distance_for_horizontal_pairs() {
        let target = Rect::new(100.0, 100.0, 200.0, 150.0);
        let left_of = Rect::new(20.0, 120.0, 70.0, 50.0);
        assert_eq!(edge_distance(&left_of, Edge::Right, &target, Edge::Left), 10.0);
        let right_of = Rect::new(305.0, 120.0, 70.0, 50.0);
        assert_eq!(edge_distance(&right_of, Edge::Left, &target, Edge::Right), 5.0);
    }

    #[test]
    fn incompatible_pairs_are_infinitely_far() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert_eq!(edge_distance(&a, Edge::Top, &a, Edge::Top), f64::INFINITY);
    }

    #[test]
    fn edges_collect_and_iterate_in_order() {
        let edges: Edges = [Edge::Right, Edge::Top].into_iter().collect();
        assert_eq!(edges.edges().collect::<Vec<_>>(), vec![Edge::Top, Edge::Right]);
        assert!(Edges::empty().edges().next().is_none());
    }

    #[test]
    fn edge_sets_use_names_on_the_wire() {
        let edges: Edges = serde_json::from_str(r#"["left","bottom","left"]"#).unwrap();
        assert_eq!(edges, Edges::LEFT | Edges::BOTTOM);
        assert_eq!(serde_json::to_string(&edges).unwrap(), r#"["bottom","left"]"#);
    }

    #[test]
    fn edge_names_parse() {
        assert_eq!("bottom".parse::<Edge>().unwrap(), Edge::Bottom);
        assert_eq!("trailing".parse::<Alignment>().unwrap(), Alignment::Trailing);
        assert!("middle".parse::<Edge>().is_err());
    }
}
