//! Per-frame drawing of the field, the ball and the status overlays.
//!
//! Everything is redrawn from scratch every frame from a read-only
//! [`FieldSnapshot`]; the view keeps no state of its own.

use eframe::egui::{
    pos2, vec2, Align2, Color32, CornerRadius, FontId, Painter, Pos2, Rect, Sense, Ui,
};
use std::time::Duration;

use super::assets::FieldAssets;
use super::common::{Layout, UiColors};
use crate::tracker::position::{
    preview, stale_banner, Coordinate, CANVAS_HEIGHT, CANVAS_WIDTH, PREVIEW_CHARS,
};

/// Read-only view of the state needed to draw one frame.
#[derive(Debug, Clone, Copy)]
pub struct FieldSnapshot<'a> {
    pub coordinate: Coordinate,
    pub connected: bool,
    pub status: &'a str,
    pub last_message: Option<&'a str>,
    pub stale_for: Option<Duration>,
}

/// Maps logical canvas units onto the screen, keeping the aspect ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasTransform {
    origin: Pos2,
    scale: f32,
}

impl CanvasTransform {
    /// Largest centered fit of the canvas into `available`.
    pub fn fit(available: Rect) -> Self {
        let scale = (available.width() / CANVAS_WIDTH).min(available.height() / CANVAS_HEIGHT);
        let size = vec2(CANVAS_WIDTH, CANVAS_HEIGHT) * scale;
        CanvasTransform {
            origin: available.center() - size / 2.0,
            scale,
        }
    }

    pub fn pos(&self, x: f32, y: f32) -> Pos2 {
        self.origin + vec2(x, y) * self.scale
    }

    pub fn rect(&self, x: f32, y: f32, width: f32, height: f32) -> Rect {
        Rect::from_min_size(self.pos(x, y), vec2(width, height) * self.scale)
    }

    pub fn len(&self, length: f32) -> f32 {
        length * self.scale
    }

    pub fn canvas(&self) -> Rect {
        self.rect(0.0, 0.0, CANVAS_WIDTH, CANVAS_HEIGHT)
    }
}

/// Screen rectangle the ball image is drawn into, centered on `coordinate`.
pub fn marker_rect(transform: &CanvasTransform, coordinate: Coordinate) -> Rect {
    let half = Layout::BALL_SIZE / 2.0;
    transform.rect(
        coordinate.x - half,
        coordinate.y - half,
        Layout::BALL_SIZE,
        Layout::BALL_SIZE,
    )
}

pub fn status_panel_rect(transform: &CanvasTransform) -> Rect {
    transform.rect(
        Layout::PANEL_MARGIN,
        CANVAS_HEIGHT - Layout::PANEL_HEIGHT - Layout::PANEL_MARGIN,
        Layout::PANEL_WIDTH,
        Layout::PANEL_HEIGHT,
    )
}

pub fn message_panel_rect(transform: &CanvasTransform) -> Rect {
    transform.rect(
        CANVAS_WIDTH - Layout::PANEL_WIDTH - Layout::PANEL_MARGIN,
        CANVAS_HEIGHT - Layout::PANEL_HEIGHT - Layout::PANEL_MARGIN,
        Layout::PANEL_WIDTH,
        Layout::PANEL_HEIGHT,
    )
}

pub fn banner_rect(transform: &CanvasTransform) -> Rect {
    transform.rect(
        CANVAS_WIDTH / 2.0 - Layout::BANNER_WIDTH / 2.0,
        Layout::PANEL_MARGIN,
        Layout::BANNER_WIDTH,
        Layout::BANNER_HEIGHT,
    )
}

/// Text of the last-message overlay.
pub fn last_message_text(payload: &str) -> String {
    format!("Last message: {}", preview(payload, PREVIEW_CHARS))
}

pub struct FieldView;

impl FieldView {
    /// Fills the remaining space of `ui` with the canvas and draws one frame.
    pub fn show(ui: &mut Ui, assets: &FieldAssets, snapshot: FieldSnapshot<'_>) {
        let (response, painter) = ui.allocate_painter(ui.available_size(), Sense::hover());
        let transform = CanvasTransform::fit(response.rect);
        let painter = painter.with_clip_rect(transform.canvas());

        Self::draw_field(&painter, &transform, assets);
        Self::draw_ball(&painter, &transform, assets, snapshot.coordinate);
        Self::draw_status(&painter, &transform, snapshot.status, snapshot.connected);
        if let Some(payload) = snapshot.last_message {
            Self::draw_last_message(&painter, &transform, payload);
        }
        if let Some(elapsed) = snapshot.stale_for {
            Self::draw_stale_banner(&painter, &transform, elapsed);
        }
    }

    fn draw_field(painter: &Painter, transform: &CanvasTransform, assets: &FieldAssets) {
        let canvas = transform.canvas();
        match &assets.field {
            Some(texture) => {
                painter.image(texture.id(), canvas, full_uv(), Color32::WHITE);
            }
            None => {
                painter.rect_filled(canvas, CornerRadius::ZERO, UiColors::FALLBACK_FIELD);
            }
        }
    }

    fn draw_ball(
        painter: &Painter,
        transform: &CanvasTransform,
        assets: &FieldAssets,
        coordinate: Coordinate,
    ) {
        let rect = marker_rect(transform, coordinate);
        match &assets.ball {
            Some(texture) => {
                painter.image(texture.id(), rect, full_uv(), Color32::WHITE);
            }
            None => {
                painter.circle_filled(rect.center(), rect.width() / 2.0, UiColors::FALLBACK_BALL);
            }
        }
    }

    fn draw_status(painter: &Painter, transform: &CanvasTransform, status: &str, connected: bool) {
        let panel = status_panel_rect(transform);
        painter.rect_filled(
            panel,
            CornerRadius::same(Layout::PANEL_RADIUS),
            UiColors::OVERLAY_BG,
        );

        // leave room for the connection dot on the right
        let text_width = transform.len(
            Layout::DOT_OFFSET_X - Layout::DOT_DIAMETER - 2.0 * Layout::PANEL_PADDING,
        );
        Self::panel_text(
            painter,
            transform,
            panel,
            format!("Status: {}", status),
            Layout::STATUS_TEXT_SIZE,
            text_width,
        );

        let dot_color = if connected {
            UiColors::ACTIVE
        } else {
            UiColors::INACTIVE
        };
        painter.circle_filled(
            transform.pos(
                Layout::DOT_OFFSET_X,
                CANVAS_HEIGHT - Layout::DOT_OFFSET_FROM_BOTTOM,
            ),
            transform.len(Layout::DOT_DIAMETER / 2.0),
            dot_color,
        );
    }

    fn draw_last_message(painter: &Painter, transform: &CanvasTransform, payload: &str) {
        let panel = message_panel_rect(transform);
        painter.rect_filled(
            panel,
            CornerRadius::same(Layout::PANEL_RADIUS),
            UiColors::OVERLAY_BG,
        );
        let text_width = transform.len(Layout::PANEL_WIDTH - 2.0 * Layout::PANEL_PADDING);
        Self::panel_text(
            painter,
            transform,
            panel,
            last_message_text(payload),
            Layout::MESSAGE_TEXT_SIZE,
            text_width,
        );
    }

    fn draw_stale_banner(painter: &Painter, transform: &CanvasTransform, elapsed: Duration) {
        let banner = banner_rect(transform);
        painter.rect_filled(
            banner,
            CornerRadius::same(Layout::PANEL_RADIUS),
            UiColors::STALE_BG,
        );
        painter.text(
            banner.center(),
            Align2::CENTER_CENTER,
            stale_banner(elapsed),
            FontId::proportional(transform.len(Layout::BANNER_TEXT_SIZE)),
            UiColors::OVERLAY_TEXT,
        );
    }

    fn panel_text(
        painter: &Painter,
        transform: &CanvasTransform,
        panel: Rect,
        text: String,
        size: f32,
        wrap_width: f32,
    ) {
        let galley = painter.layout(
            text,
            FontId::proportional(transform.len(size)),
            UiColors::OVERLAY_TEXT,
            wrap_width,
        );
        let padding = transform.len(Layout::PANEL_PADDING);
        painter.galley(
            panel.min + vec2(padding, padding),
            galley,
            UiColors::OVERLAY_TEXT,
        );
    }
}

fn full_uv() -> Rect {
    Rect::from_min_max(pos2(0.0, 0.0), pos2(1.0, 1.0))
}
