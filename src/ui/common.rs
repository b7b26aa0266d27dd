//! # UI Common Components and Utilities
//!
//! Shared colors and sizes for the settings panel and the field view.
//!
//! All canvas geometry is expressed in logical canvas units (1200 × 800) and
//! converted to screen points by [`super::field_view::CanvasTransform`], so the
//! overlays keep their proportions when the window is resized.

use eframe::egui::{Color32, CornerRadius, Frame, Stroke};

/// Centralized color palette.
///
/// Overlay colors reproduce the translucent black panels and the red/green
/// connection indicator of the tracker's display.
pub struct UiColors;

impl UiColors {
    /// Translucent black behind the status and last-message overlays
    pub const OVERLAY_BG: Color32 = Color32::from_rgba_premultiplied(0, 0, 0, 180);

    /// Staleness banner fill, red at alpha 200
    pub const STALE_BG: Color32 = Color32::from_rgba_premultiplied(200, 0, 0, 200);

    pub const OVERLAY_TEXT: Color32 = Color32::WHITE;

    /// Connection dot when connected
    pub const ACTIVE: Color32 = Color32::from_rgb(0, 255, 0);

    /// Connection dot otherwise
    pub const INACTIVE: Color32 = Color32::from_rgb(255, 0, 0);

    /// Connect button when it can be pressed (RGB: 0, 128, 55)
    pub const BUTTON_READY: Color32 = Color32::from_rgb(0, 128, 55);

    /// Connect button while disabled
    pub const BUTTON_DISABLED: Color32 = Color32::from_rgb(204, 204, 204);

    /// Plain field drawn when the background image is missing
    pub const FALLBACK_FIELD: Color32 = Color32::from_rgb(46, 125, 50);

    /// Plain disc drawn when the ball image is missing
    pub const FALLBACK_BALL: Color32 = Color32::from_rgb(200, 90, 30);

    pub const BORDER: Color32 = Color32::from_rgb(60, 60, 60);
}

/// Overlay geometry in canvas units.
pub struct Layout;

impl Layout {
    /// Marker diameter
    pub const BALL_SIZE: f32 = 65.0;

    pub const PANEL_WIDTH: f32 = 400.0;
    pub const PANEL_HEIGHT: f32 = 60.0;
    pub const PANEL_MARGIN: f32 = 10.0;
    pub const PANEL_PADDING: f32 = 10.0;
    pub const PANEL_RADIUS: u8 = 5;

    pub const STATUS_TEXT_SIZE: f32 = 16.0;
    pub const MESSAGE_TEXT_SIZE: f32 = 14.0;

    /// Connection dot, centered at (380, H - 40) with a 20 unit diameter
    pub const DOT_OFFSET_X: f32 = 380.0;
    pub const DOT_OFFSET_FROM_BOTTOM: f32 = 40.0;
    pub const DOT_DIAMETER: f32 = 20.0;

    pub const BANNER_WIDTH: f32 = 300.0;
    pub const BANNER_HEIGHT: f32 = 40.0;
    pub const BANNER_TEXT_SIZE: f32 = 18.0;

    /// Width of the settings side panel in screen points
    pub const SETTINGS_WIDTH: f32 = 300.0;
    pub const SETTINGS_FIELD_WIDTH: f32 = 280.0;
}

/// Frame around the settings panel sections.
pub fn section_frame() -> Frame {
    Frame::new()
        .stroke(Stroke::new(1.0, UiColors::BORDER))
        .corner_radius(CornerRadius::same(8))
        .inner_margin(10)
        .outer_margin(2)
}
