//! Decoding and dispatch of host commands.
//!
//! A command names a service and an operation, optionally a window, and
//! carries its arguments as a JSON object. Window-scoped operations take the
//! window from the envelope; snap operations name their windows in params.

use std::time::Instant;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, instrument};

use super::Reactor;
use super::error::CommandError;
use crate::actor::animation::AnimationRequest;
use crate::model::WindowId;
use crate::snap_engine::{Alignment, AutoSnapConfig, Edge, SnapBinding, SnapPolicy};
use crate::sys::geometry::{Point, Rect, Size};
use crate::sys::screen::CoordinateConverter;
use crate::sys::window::PaletteWindow;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    pub service: String,
    pub command: String,
    #[serde(default)]
    pub window_id: Option<WindowId>,
    #[serde(default)]
    pub params: Value,
}

impl Request {
    pub fn new(service: &str, command: &str) -> Self {
        Self {
            service: service.to_string(),
            command: command.to_string(),
            window_id: None,
            params: Value::Null,
        }
    }

    pub fn window(mut self, id: impl Into<WindowId>) -> Self {
        self.window_id = Some(id.into());
        self
    }

    pub fn params(mut self, params: Value) -> Self {
        self.params = params;
        self
    }
}

pub type Response = Result<Value, CommandError>;

/// Point of a window that `setPosition` places at the given coordinates.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum Anchor {
    #[default]
    TopLeft,
    TopCenter,
    TopRight,
    CenterLeft,
    Center,
    CenterRight,
    BottomLeft,
    BottomCenter,
    BottomRight,
}

impl Anchor {
    /// Offset from the window origin to the anchor, for a window of `size`
    /// physical pixels. Halves are truncated.
    pub fn offset(self, size: Size) -> Point {
        let (w, h) = (size.width, size.height);
        let half = |v: f64| (v / 2.0).trunc();
        let x = match self {
            Anchor::TopLeft | Anchor::CenterLeft | Anchor::BottomLeft => 0.0,
            Anchor::TopCenter | Anchor::Center | Anchor::BottomCenter => half(w),
            Anchor::TopRight | Anchor::CenterRight | Anchor::BottomRight => w,
        };
        let y = match self {
            Anchor::TopLeft | Anchor::TopCenter | Anchor::TopRight => 0.0,
            Anchor::CenterLeft | Anchor::Center | Anchor::CenterRight => half(h),
            Anchor::BottomLeft | Anchor::BottomCenter | Anchor::BottomRight => h,
        };
        Point::new(x, y)
    }
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct SnapParams {
    #[serde(default)]
    follower_id: Option<WindowId>,
    #[serde(default)]
    target_id: Option<WindowId>,
    #[serde(default = "default_follower_edge")]
    follower_edge: Edge,
    #[serde(default = "default_target_edge")]
    target_edge: Edge,
    #[serde(default)]
    alignment: Alignment,
    #[serde(default)]
    gap: f64,
    #[serde(default)]
    config: SnapPolicy,
}

fn default_follower_edge() -> Edge { Edge::Top }

fn default_target_edge() -> Edge { Edge::Bottom }

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
struct FollowerParams {
    #[serde(default)]
    follower_id: Option<WindowId>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
struct AutoSnapParams {
    #[serde(default)]
    palette_id: Option<WindowId>,
    #[serde(default)]
    config: Option<AutoSnapConfig>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct AnimateMultipleParams {
    animations: Vec<AnimationRequest>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
struct PositionParams {
    #[serde(default)]
    x: f64,
    #[serde(default)]
    y: f64,
    #[serde(default)]
    anchor: Anchor,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
struct SizeParams {
    #[serde(default)]
    width: Option<f64>,
    #[serde(default)]
    height: Option<f64>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
struct BoundsParams {
    #[serde(default)]
    x: f64,
    #[serde(default)]
    y: f64,
    #[serde(default)]
    width: Option<f64>,
    #[serde(default)]
    height: Option<f64>,
}

#[derive(Deserialize, Debug)]
struct DraggableParams {
    draggable: bool,
}

#[derive(Deserialize, Debug)]
struct OpacityParams {
    opacity: f64,
}

/// Decodes `params`, treating a missing params value as an empty object.
fn decode<T: DeserializeOwned>(params: &Value) -> Result<T, CommandError> {
    match params {
        Value::Null => Ok(serde_json::from_value(json!({}))?),
        other => Ok(serde_json::from_value(other.clone())?),
    }
}

fn required(id: Option<WindowId>, what: &str) -> Result<WindowId, CommandError> {
    id.filter(|id| !id.is_empty())
        .ok_or_else(|| CommandError::InvalidParams(format!("{what} required")))
}

fn finite(value: f64, what: &str) -> Result<f64, CommandError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(CommandError::InvalidParams(format!("{what} must be a finite number")))
    }
}

fn bounds_json(rect: Rect) -> Value {
    json!({
        "x": rect.origin.x,
        "y": rect.origin.y,
        "width": rect.size.width,
        "height": rect.size.height,
    })
}

impl Reactor {
    #[instrument(name = "reactor::command", skip(self, request, now), fields(service = %request.service, command = %request.command, window = ?request.window_id))]
    pub(super) fn dispatch(&mut self, request: Request, now: Instant) -> Response {
        let result = match request.service.as_str() {
            "snap" => self.snap_command(&request),
            "animation" => self.animation_command(&request, now),
            "frame" => self.frame_command(&request),
            "visibility" => self.visibility_command(&request),
            _ => Err(unknown(&request)),
        };
        if let Err(err) = &result {
            debug!(code = err.code(), %err, "command rejected");
        }
        result
    }

    fn snap_command(&mut self, request: &Request) -> Response {
        match request.command.as_str() {
            "snap" => {
                let p: SnapParams = decode(&request.params)?;
                let follower_id = required(p.follower_id, "followerId")?;
                let target_id = required(p.target_id, "targetId")?;
                self.snap.snap(SnapBinding {
                    follower_id,
                    target_id,
                    follower_edge: p.follower_edge,
                    target_edge: p.target_edge,
                    alignment: p.alignment,
                    gap: p.gap,
                    policy: p.config,
                })?;
                Ok(Value::Null)
            }
            "detach" => {
                let p: FollowerParams = decode(&request.params)?;
                let follower = required(p.follower_id, "followerId")?;
                self.snap.detach(&follower);
                Ok(Value::Null)
            }
            "reSnap" => {
                let p: FollowerParams = decode(&request.params)?;
                let follower = required(p.follower_id, "followerId")?;
                self.snap.re_snap(&follower)?;
                Ok(Value::Null)
            }
            "getSnapDistance" => {
                let p: FollowerParams = decode(&request.params)?;
                let distance = p.follower_id.map(|f| self.snap.snap_distance(&f)).unwrap_or(0.0);
                Ok(json!(distance))
            }
            "setAutoSnapConfig" => {
                let p: AutoSnapParams = decode(&request.params)?;
                let id = required(p.palette_id.or_else(|| request.window_id.clone()), "paletteId")?;
                self.snap.set_auto_snap_config(&id, p.config)?;
                Ok(Value::Null)
            }
            _ => Err(unknown(request)),
        }
    }

    fn animation_command(&mut self, request: &Request, now: Instant) -> Response {
        match request.command.as_str() {
            "animate" => {
                let id = window_id(request)?;
                let p: AnimationRequest = decode(&request.params)?;
                self.animator.animate(&id, p, now)?;
                Ok(Value::Null)
            }
            "animateMultiple" => {
                let id = window_id(request)?;
                let p: AnimateMultipleParams = decode(&request.params)?;
                self.animator.animate_multiple(&id, p.animations, now)?;
                Ok(Value::Null)
            }
            "stop" => {
                let id = window_id(request)?;
                self.animator.stop(&id);
                Ok(Value::Null)
            }
            "stopAll" => {
                self.animator.stop_all();
                Ok(Value::Null)
            }
            "isAnimating" => {
                let animating =
                    request.window_id.as_ref().is_some_and(|id| self.animator.is_animating(id));
                Ok(json!(animating))
            }
            _ => Err(unknown(request)),
        }
    }

    fn frame_command(&mut self, request: &Request) -> Response {
        match request.command.as_str() {
            "getPosition" => {
                let frame = self.logical_frame(request.window_id.as_ref());
                Ok(json!({ "x": frame.origin.x, "y": frame.origin.y }))
            }
            "getSize" => {
                let frame = self.logical_frame(request.window_id.as_ref());
                Ok(json!({ "width": frame.size.width, "height": frame.size.height }))
            }
            "getBounds" => Ok(bounds_json(self.logical_frame(request.window_id.as_ref()))),
            "setPosition" => {
                let (id, window) = self.window_for(request)?;
                let p: PositionParams = decode(&request.params)?;
                let frame = window.frame();
                let scale = self.converter.scale_for_frame(frame);
                let anchor = Point::new(
                    CoordinateConverter::to_physical(finite(p.x, "x")?, scale),
                    CoordinateConverter::to_physical(finite(p.y, "y")?, scale),
                );
                window.native().move_to(anchor - p.anchor.offset(frame.size));
                self.snap.on_window_moved(&id);
                Ok(Value::Null)
            }
            "setSize" => {
                let (id, window) = self.window_for(request)?;
                let p: SizeParams = decode(&request.params)?;
                let frame = window.frame();
                let scale = self.converter.scale_for_frame(frame);
                let size = Size::new(
                    physical_or(p.width, frame.size.width, scale, "width")?,
                    physical_or(p.height, frame.size.height, scale, "height")?,
                );
                window.native().resize(size);
                self.snap.on_window_moved(&id);
                Ok(Value::Null)
            }
            "setBounds" => {
                let (id, window) = self.window_for(request)?;
                let p: BoundsParams = decode(&request.params)?;
                let frame = window.frame();
                let scale = self.converter.scale_for_frame(frame);
                let bounds = Rect::new(
                    CoordinateConverter::to_physical(finite(p.x, "x")?, scale),
                    CoordinateConverter::to_physical(finite(p.y, "y")?, scale),
                    physical_or(p.width, frame.size.width, scale, "width")?,
                    physical_or(p.height, frame.size.height, scale, "height")?,
                );
                window.native().set_bounds(bounds);
                self.snap.on_window_moved(&id);
                Ok(Value::Null)
            }
            "startDrag" => {
                let id = window_id(request)?;
                let started = self.drag.start_drag(&id, &mut self.snap)?;
                Ok(json!(started))
            }
            "setDraggable" => {
                let (_, window) = self.window_for(request)?;
                let p: DraggableParams = decode(&request.params)?;
                window.set_draggable(p.draggable);
                Ok(Value::Null)
            }
            _ => Err(unknown(request)),
        }
    }

    fn visibility_command(&mut self, request: &Request) -> Response {
        match request.command.as_str() {
            "show" => {
                let (id, window) = self.window_for(request)?;
                window.native().set_visible(true);
                self.snap.on_window_shown(&id);
                Ok(Value::Null)
            }
            "hide" => {
                let (id, window) = self.window_for(request)?;
                window.native().set_visible(false);
                self.snap.on_window_hidden(&id);
                Ok(Value::Null)
            }
            "setOpacity" => {
                let (_, window) = self.window_for(request)?;
                let p: OpacityParams = decode(&request.params)?;
                window.native().set_alpha(finite(p.opacity, "opacity")?.clamp(0.0, 1.0));
                Ok(Value::Null)
            }
            "getOpacity" => {
                let opacity = request
                    .window_id
                    .as_ref()
                    .and_then(|id| self.directory.get(id))
                    .map(|w| w.native().alpha())
                    .unwrap_or(1.0);
                Ok(json!(opacity))
            }
            _ => Err(unknown(request)),
        }
    }

    fn window_for(
        &self,
        request: &Request,
    ) -> Result<(WindowId, std::sync::Arc<PaletteWindow>), CommandError> {
        let id = window_id(request)?;
        let window = self.directory.get(&id).ok_or_else(|| CommandError::NotFound(id.clone()))?;
        Ok((id, window))
    }

    /// The window's frame in logical units, or a zero rect.
    fn logical_frame(&self, id: Option<&WindowId>) -> Rect {
        let Some(window) = id.and_then(|id| self.directory.get(id)) else {
            return Rect::ZERO;
        };
        let frame = window.frame();
        let scale = self.converter.scale_for_frame(frame);
        let logical = |v: f64| CoordinateConverter::to_logical(v, scale);
        Rect::new(
            logical(frame.origin.x),
            logical(frame.origin.y),
            logical(frame.size.width),
            logical(frame.size.height),
        )
    }
}

fn window_id(request: &Request) -> Result<WindowId, CommandError> {
    request.window_id.clone().filter(|id| !id.is_empty()).ok_or(CommandError::MissingId)
}

fn physical_or(
    logical: Option<f64>,
    current: f64,
    scale: f64,
    what: &str,
) -> Result<f64, CommandError> {
    match logical {
        None => Ok(current),
        Some(v) => Ok(CoordinateConverter::to_physical(finite(v, what)?, scale).max(0.0)),
    }
}

fn unknown(request: &Request) -> CommandError {
    CommandError::UnknownCommand {
        service: request.service.clone(),
        command: request.command.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anchor_offsets_truncate_halves() {
        let size = Size::new(101.0, 51.0);
        assert_eq!(Anchor::TopLeft.offset(size), Point::new(0.0, 0.0));
        assert_eq!(Anchor::Center.offset(size), Point::new(50.0, 25.0));
        assert_eq!(Anchor::BottomRight.offset(size), Point::new(101.0, 51.0));
        assert_eq!(Anchor::CenterRight.offset(size), Point::new(101.0, 25.0));
    }

    #[test]
    fn request_envelope() {
        let request: Request = serde_json::from_str(
            r#"{"service":"frame","command":"setPosition","windowId":"a","params":{"x":1}}"#,
        )
        .unwrap();
        assert_eq!(request.window_id, Some("a".into()));
        let p: PositionParams = decode(&request.params).unwrap();
        assert_eq!((p.x, p.y, p.anchor), (1.0, 0.0, Anchor::TopLeft));

        let p: FollowerParams = decode(&Value::Null).unwrap();
        assert!(p.follower_id.is_none());
        assert!(decode::<OpacityParams>(&json!({ "opacity": "high" })).is_err());
    }
}
