//! Tracked ball position and the decoding of inbound position payloads.
//!
//! Payloads carry coordinates in a 102 × 64 unit field. They are mapped
//! linearly onto the logical canvas without clamping, so a value outside the
//! field simply lands outside the visible area.

use serde::Deserialize;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info};

/// Logical canvas size everything is drawn in.
pub const CANVAS_WIDTH: f32 = 1200.0;
pub const CANVAS_HEIGHT: f32 = 800.0;

/// Extent of the source coordinate system.
pub const FIELD_UNITS_X: f32 = 102.0;
pub const FIELD_UNITS_Y: f32 = 64.0;

/// Age after which the last position is considered stale.
pub const STALE_AFTER: Duration = Duration::from_millis(3000);

/// Characters of the raw payload shown in the last-message panel.
pub const PREVIEW_CHARS: usize = 50;

#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("payload is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("{0}")]
    Json(#[from] serde_json::Error),

    #[error("coordinate ({x}, {y}) does not map to a finite canvas position")]
    NonFinite { x: f64, y: f64 },
}

/// Position on the logical canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub x: f32,
    pub y: f32,
}

impl Coordinate {
    pub const CENTER: Coordinate = Coordinate {
        x: CANVAS_WIDTH / 2.0,
        y: CANVAS_HEIGHT / 2.0,
    };

    /// Maps field units onto the canvas.
    pub fn from_field(x: f64, y: f64) -> Result<Self, PayloadError> {
        // multiply before dividing so whole field units land on exact pixels
        let coordinate = Coordinate {
            x: (x * f64::from(CANVAS_WIDTH) / f64::from(FIELD_UNITS_X)) as f32,
            y: (y * f64::from(CANVAS_HEIGHT) / f64::from(FIELD_UNITS_Y)) as f32,
        };

        if coordinate.x.is_finite() && coordinate.y.is_finite() {
            Ok(coordinate)
        } else {
            Err(PayloadError::NonFinite { x, y })
        }
    }
}

/// Wire format of a position message. Unknown fields are ignored.
#[derive(Debug, Deserialize)]
struct PositionPayload {
    #[serde(rename = "X")]
    x: Option<f64>,
    #[serde(rename = "Y")]
    y: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct PositionModel {
    coordinate: Coordinate,
    last_payload: Option<String>,
    last_accepted: Option<Instant>,
}

impl Default for PositionModel {
    fn default() -> Self {
        Self {
            coordinate: Coordinate::CENTER,
            last_payload: None,
            last_accepted: None,
        }
    }
}

impl PositionModel {
    /// Applies one inbound payload received at `now`.
    ///
    /// A message without both `X` and `Y` is ignored and yields `Ok(None)`.
    /// Decode failures leave the model untouched.
    pub fn on_message(
        &mut self,
        payload: &[u8],
        now: Instant,
    ) -> Result<Option<Coordinate>, PayloadError> {
        let text = std::str::from_utf8(payload)?;
        let decoded: PositionPayload = serde_json::from_str(text)?;

        let (Some(x), Some(y)) = (decoded.x, decoded.y) else {
            debug!("Message without X/Y ignored: {}", text);
            return Ok(None);
        };

        let coordinate = Coordinate::from_field(x, y)?;
        info!(
            "Received ball position: ({}, {}), Scaled: ({}, {})",
            x, y, coordinate.x, coordinate.y
        );

        self.coordinate = coordinate;
        self.last_payload = Some(text.to_owned());
        self.last_accepted = Some(now);
        Ok(Some(coordinate))
    }

    pub fn coordinate(&self) -> Coordinate {
        self.coordinate
    }

    pub fn last_payload(&self) -> Option<&str> {
        self.last_payload.as_deref()
    }

    /// Time since the last accepted message, if it exceeds [`STALE_AFTER`].
    ///
    /// `None` before the first message, so a fresh start never shows a warning.
    pub fn staleness(&self, now: Instant) -> Option<Duration> {
        let elapsed = now.saturating_duration_since(self.last_accepted?);
        (elapsed > STALE_AFTER).then_some(elapsed)
    }
}

/// Shortens `text` to `max_chars` characters, marking the cut with `...`.
pub fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_owned(),
    }
}

/// Banner text for a stale feed.
pub fn stale_banner(elapsed: Duration) -> String {
    format!("No data received for {} seconds", elapsed.as_secs())
}
