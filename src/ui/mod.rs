//! # Ball Tracker User Interface Module
//!
//! Hosts the eframe application: a settings side panel on the left and the
//! field canvas filling the rest of the window.
//!
//! ## Frame Loop
//!
//! Every frame, in order:
//! 1. Drain session events from the [`ConnectionManager`] and feed inbound
//!    messages into the [`PositionModel`]
//! 2. Handle the `C` shortcut
//! 3. Render the settings panel and apply what the user did there
//! 4. Redraw the field from a read-only snapshot of the state
//!
//! Repaints are requested at roughly 60 fps regardless of message traffic, so
//! the staleness banner appears and counts up without any timer.
//!
//! ## State Ownership
//!
//! All mutable state lives in [`AppState`], owned by [`BallTrackerUI`]. The
//! session worker runs on the tokio runtime and is reachable only through the
//! connection manager; the renderer and the settings panel never see it.

pub mod assets;
pub mod common;
pub mod field_view;
pub mod settings_panel;

use eframe::egui::{self, Event};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio::runtime::Handle;
use tracing::{error, info, warn};

use crate::config::TrackerConfig;
use crate::mqtt::{ConnectionManager, SessionNotice};
use crate::tracker::credentials::{CredentialKind, CredentialStore};
use crate::tracker::input::{action_for_key, InputAction, NEED_CREDENTIALS};
use crate::tracker::position::PositionModel;

use self::assets::FieldAssets;
use self::common::Layout;
use self::field_view::{FieldSnapshot, FieldView};
use self::settings_panel::{SettingsAction, SettingsPanel};

const FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Everything the tracker knows at runtime.
pub struct AppState {
    pub credentials: CredentialStore,
    pub connection: ConnectionManager,
    pub position: PositionModel,
    /// Human readable status line shown in the status overlay
    pub status: String,
}

impl AppState {
    pub fn new(runtime: Handle) -> Self {
        AppState {
            credentials: CredentialStore::default(),
            connection: ConnectionManager::new(runtime),
            position: PositionModel::default(),
            status: String::new(),
        }
    }

    pub fn load_credential(&mut self, kind: CredentialKind, path: PathBuf) {
        self.status = match self.credentials.load(kind, &path) {
            Ok(status) => status,
            Err(e) => e.to_string(),
        };
    }

    /// Connect/disconnect, shared by the button and the shortcut.
    pub fn toggle_connection(&mut self, topic: &str) {
        let outcome = self.connection.toggle(&self.credentials, topic);
        if let Some(status) = outcome.status() {
            self.status = status.to_string();
        }
    }

    pub fn handle_key(&mut self, key: egui::Key, modifiers: egui::Modifiers, topic: &str) {
        match action_for_key(key, modifiers, self.credentials.is_ready()) {
            InputAction::Toggle => self.toggle_connection(topic),
            InputAction::NeedCredentials => {
                warn!("Connect shortcut used before certificates were loaded");
                self.status = NEED_CREDENTIALS.to_string();
            }
            InputAction::Ignored => {}
        }
    }

    /// Applies pending session events. Messages count from when they arrived,
    /// not from when this frame drained them.
    pub fn poll_session(&mut self) {
        for notice in self.connection.poll_events() {
            match notice {
                SessionNotice::Status(status) => self.status = status,
                SessionNotice::Message(msg) => {
                    let accepted = self.position.on_message(&msg.content, msg.received_at);
                    if let Err(e) = accepted {
                        error!("Error parsing message from {}: {}", msg.topic, e);
                        self.status = format!("Error parsing message: {}", e);
                    }
                }
            }
        }
    }

    pub fn snapshot(&self, now: Instant) -> FieldSnapshot<'_> {
        FieldSnapshot {
            coordinate: self.position.coordinate(),
            connected: self.connection.is_connected(),
            status: &self.status,
            last_message: self.position.last_payload(),
            stale_for: self.position.staleness(now),
        }
    }
}

pub struct BallTrackerUI {
    state: AppState,
    settings: SettingsPanel,
    assets: FieldAssets,
}

impl BallTrackerUI {
    pub fn new(cc: &eframe::CreationContext<'_>, config: TrackerConfig, runtime: Handle) -> Self {
        cc.egui_ctx.set_theme(egui::Theme::Light);
        let assets = FieldAssets::load(&cc.egui_ctx, &config.field_image, &config.ball_image);
        info!("Tracker UI ready, default topic {}", config.default_topic);

        BallTrackerUI {
            state: AppState::new(runtime),
            settings: SettingsPanel::new(config.default_topic, config.certificate_dir),
            assets,
        }
    }

    /// Keys pressed this frame, unless a text field is being edited.
    fn pressed_keys(ctx: &egui::Context) -> Vec<(egui::Key, egui::Modifiers)> {
        if ctx.wants_keyboard_input() {
            return Vec::new();
        }
        ctx.input(|i| {
            i.events
                .iter()
                .filter_map(|event| match event {
                    Event::Key {
                        key,
                        pressed: true,
                        repeat: false,
                        modifiers,
                        ..
                    } => Some((*key, *modifiers)),
                    _ => None,
                })
                .collect()
        })
    }
}

impl eframe::App for BallTrackerUI {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        ctx.request_repaint_after(FRAME_INTERVAL);
        let now = Instant::now();

        self.state.poll_session();

        for (key, modifiers) in Self::pressed_keys(ctx) {
            self.state.handle_key(key, modifiers, self.settings.topic());
        }

        let actions = egui::SidePanel::left("settings_panel")
            .resizable(false)
            .exact_width(Layout::SETTINGS_WIDTH)
            .show(ctx, |ui| {
                self.settings.render(
                    ui,
                    &self.state.credentials,
                    self.state.connection.state(),
                    self.state.connection.subscribed_topic(),
                )
            })
            .inner;

        for action in actions {
            match action {
                SettingsAction::LoadCredential(kind, path) => {
                    self.state.load_credential(kind, path)
                }
                SettingsAction::Toggle => self.state.toggle_connection(self.settings.topic()),
            }
        }

        egui::CentralPanel::default()
            .frame(egui::Frame::new().fill(egui::Color32::BLACK))
            .show(ctx, |ui| {
                FieldView::show(ui, &self.assets, self.state.snapshot(now));
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mqtt::message_manager::{MQTTMessage, SessionUpdate};
    use crate::mqtt::ConnectionState;
    use crate::tracker::position::Coordinate;
    use std::path::Path;

    fn load_all(state: &mut AppState) {
        let dir = std::env::temp_dir().join("balltracker-ui-no-certs");
        state.load_credential(CredentialKind::Certificate, dir.join("device.pem.crt"));
        state.load_credential(CredentialKind::PrivateKey, dir.join("device.private.key"));
        state.load_credential(CredentialKind::RootCA, dir.join("AmazonRootCA1.pem"));
    }

    #[tokio::test]
    async fn invalid_file_reports_hint_and_keeps_slot_empty() {
        let mut state = AppState::new(Handle::current());
        state.load_credential(CredentialKind::PrivateKey, Path::new("/tmp/key.pem").into());
        assert_eq!(
            state.status,
            "Invalid private key file. Please use a .key file."
        );
        assert!(!state.credentials.is_loaded(CredentialKind::PrivateKey));
    }

    #[tokio::test]
    async fn shortcut_without_credentials_only_sets_status() {
        let mut state = AppState::new(Handle::current());
        state.handle_key(egui::Key::C, egui::Modifiers::NONE, "marvel_AUS/ai_pub");
        assert_eq!(state.status, NEED_CREDENTIALS);
        assert_eq!(state.connection.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn shortcut_with_credentials_starts_connecting() {
        let mut state = AppState::new(Handle::current());
        load_all(&mut state);
        assert_eq!(state.status, "Root CA loaded: AmazonRootCA1.pem");

        state.handle_key(egui::Key::C, egui::Modifiers::CTRL, "marvel_AUS/ai_pub");
        assert_eq!(state.status, "Root CA loaded: AmazonRootCA1.pem");
        assert_eq!(state.connection.state(), ConnectionState::Disconnected);

        state.handle_key(egui::Key::C, egui::Modifiers::NONE, "marvel_AUS/ai_pub");
        assert_eq!(state.status, "Reading certificates...");
        assert_eq!(state.connection.state(), ConnectionState::Connecting);
    }

    #[tokio::test]
    async fn bad_payload_sets_status_and_keeps_position() {
        let mut state = AppState::new(Handle::current());
        load_all(&mut state);
        state.toggle_connection("marvel_AUS/ai_pub");

        state
            .connection
            .inject_update(SessionUpdate::Message(MQTTMessage::from_topic(
                "marvel_AUS/ai_pub".to_string(),
                br#"{"X": 51, "Y": 32}"#.to_vec(),
            )));
        state
            .connection
            .inject_update(SessionUpdate::Message(MQTTMessage::from_topic(
                "marvel_AUS/ai_pub".to_string(),
                b"{broken".to_vec(),
            )));

        state.poll_session();
        let now = Instant::now();
        assert_eq!(
            state.position.coordinate(),
            Coordinate { x: 600.0, y: 400.0 }
        );
        assert!(state.status.starts_with("Error parsing message:"));

        let snapshot = state.snapshot(now);
        assert_eq!(snapshot.last_message, Some(r#"{"X": 51, "Y": 32}"#));
        assert!(snapshot.stale_for.is_none());
        assert!(!snapshot.connected);
    }

    #[tokio::test]
    async fn staleness_counts_from_arrival_not_from_drain() {
        let mut state = AppState::new(Handle::current());
        load_all(&mut state);
        state.toggle_connection("marvel_AUS/ai_pub");

        let msg = MQTTMessage::from_topic(
            "marvel_AUS/ai_pub".to_string(),
            br#"{"X": 10, "Y": 10}"#.to_vec(),
        );
        let arrived = msg.received_at;
        state.connection.inject_update(SessionUpdate::Message(msg));
        state.poll_session();

        let later = arrived + Duration::from_millis(3500);
        assert_eq!(
            state.snapshot(later).stale_for,
            Some(Duration::from_millis(3500))
        );
    }
}
