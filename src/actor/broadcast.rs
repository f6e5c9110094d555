use serde::{Deserialize, Serialize};

use crate::actor::animation::AnimatedProperty;
use crate::model::WindowId;
use crate::snap_engine::Edge;
use crate::sys::geometry::Rect;

/// Events sent back to the host. Delivery is fire-and-forget.
///
/// Distances are in logical pixels; frames are physical.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "event", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum PaletteEvent {
    Snapped {
        window_id: WindowId,
        target_id: WindowId,
    },
    Detached {
        window_id: WindowId,
    },
    ProximityEntered {
        window_id: WindowId,
        target_id: WindowId,
        dragged_edge: Edge,
        target_edge: Edge,
        distance: f64,
        show_feedback: bool,
    },
    ProximityUpdated {
        window_id: WindowId,
        target_id: WindowId,
        distance: f64,
    },
    ProximityExited {
        window_id: WindowId,
        target_id: WindowId,
    },
    DragBegan {
        window_id: WindowId,
        frame: Rect,
    },
    DragMoved {
        window_id: WindowId,
        frame: Rect,
    },
    DragEnded {
        window_id: WindowId,
        frame: Rect,
    },
    /// An animation ran to completion. Stopped animations do not report.
    Complete {
        window_id: WindowId,
        property: AnimatedProperty,
    },
}

impl PaletteEvent {
    pub fn window_id(&self) -> &WindowId {
        match self {
            PaletteEvent::Snapped { window_id, .. }
            | PaletteEvent::Detached { window_id }
            | PaletteEvent::ProximityEntered { window_id, .. }
            | PaletteEvent::ProximityUpdated { window_id, .. }
            | PaletteEvent::ProximityExited { window_id, .. }
            | PaletteEvent::DragBegan { window_id, .. }
            | PaletteEvent::DragMoved { window_id, .. }
            | PaletteEvent::DragEnded { window_id, .. }
            | PaletteEvent::Complete { window_id, .. } => window_id,
        }
    }
}

pub type EventSender = crate::actor::Sender<PaletteEvent>;
pub type EventReceiver = crate::actor::Receiver<PaletteEvent>;
