//! Settings side panel: broker endpoint, topic, certificate pickers and the
//! connect button.
//!
//! The panel never mutates application state directly. It returns the
//! [`SettingsAction`]s the user triggered this frame and the caller applies
//! them, so the button and the keyboard shortcut go through the same path.

use eframe::egui::{self, Button, Color32, RichText, TextEdit, Ui};
use std::path::{Path, PathBuf};
use tracing::debug;

use super::common::{section_frame, Layout, UiColors};
use crate::mqtt::config::AWS_IOT_ENDPOINT;
use crate::mqtt::ConnectionState;
use crate::tracker::credentials::{CredentialKind, CredentialStore};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsAction {
    LoadCredential(CredentialKind, PathBuf),
    Toggle,
}

/// Look of the connect button for the current state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectButton {
    pub label: &'static str,
    pub enabled: bool,
    pub fill: Color32,
}

impl ConnectButton {
    pub fn for_state(state: ConnectionState, credentials_ready: bool) -> Self {
        let (label, enabled) = match state {
            ConnectionState::Connected => ("Disconnect", true),
            ConnectionState::Connecting => ("Connecting...", false),
            ConnectionState::Disconnected | ConnectionState::Error => {
                ("Connect to AWS IoT", credentials_ready)
            }
        };
        let fill = if enabled {
            UiColors::BUTTON_READY
        } else {
            UiColors::BUTTON_DISABLED
        };
        ConnectButton {
            label,
            enabled,
            fill,
        }
    }
}

pub struct SettingsPanel {
    topic: String,
    certificate_dir: Option<PathBuf>,
}

impl SettingsPanel {
    pub fn new(default_topic: String, certificate_dir: Option<PathBuf>) -> Self {
        SettingsPanel {
            topic: default_topic,
            certificate_dir,
        }
    }

    /// Current content of the topic field.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn render(
        &mut self,
        ui: &mut Ui,
        credentials: &CredentialStore,
        state: ConnectionState,
        subscribed_topic: Option<&str>,
    ) -> Vec<SettingsAction> {
        let mut actions = Vec::new();

        section_frame().show(ui, |ui| {
            ui.label("AWS IoT Endpoint:");
            let mut endpoint = AWS_IOT_ENDPOINT;
            ui.add(TextEdit::singleline(&mut endpoint).desired_width(Layout::SETTINGS_FIELD_WIDTH));

            ui.label("MQTT Topic:");
            ui.add(TextEdit::singleline(&mut self.topic).desired_width(Layout::SETTINGS_FIELD_WIDTH));
            // the field is only read on connect, so show what is actually subscribed
            if let (ConnectionState::Connected, Some(topic)) = (state, subscribed_topic) {
                ui.small(format!("Subscribed to {}", topic));
            }
        });

        section_frame().show(ui, |ui| {
            ui.label(RichText::new("AWS IoT Certificates").strong());
            ui.add_space(5.0);

            for kind in CredentialKind::ALL {
                ui.label(kind.picker_label());
                let picked_name = credentials
                    .get(kind)
                    .map(|file| file.name.as_str())
                    .unwrap_or("No file chosen");
                ui.horizontal(|ui| {
                    if ui.button("Browse...").clicked() {
                        if let Some(path) = self.pick_file(kind) {
                            actions.push(SettingsAction::LoadCredential(kind, path));
                        }
                    }
                    ui.label(picked_name);
                });
                ui.add_space(10.0);
            }

            for kind in CredentialKind::ALL {
                let marker = if credentials.is_loaded(kind) {
                    "✅ Loaded"
                } else {
                    "❌ Missing"
                };
                ui.label(format!("{}: {}", kind, marker));
            }
        });

        ui.add_space(10.0);
        let look = ConnectButton::for_state(state, credentials.is_ready());
        let button = Button::new(RichText::new(look.label).color(Color32::WHITE))
            .fill(look.fill)
            .min_size(egui::vec2(Layout::SETTINGS_FIELD_WIDTH, 32.0));
        if ui.add_enabled(look.enabled, button).clicked() {
            actions.push(SettingsAction::Toggle);
        }

        actions
    }

    fn pick_file(&mut self, kind: CredentialKind) -> Option<PathBuf> {
        let mut dialog = rfd::FileDialog::new().set_title(kind.picker_label());
        if let Some(dir) = &self.certificate_dir {
            dialog = dialog.set_directory(dir);
        }

        let path = dialog.pick_file()?;
        debug!("Picked {} for {}", path.display(), kind);
        // open the next picker where this one left off
        self.certificate_dir = path.parent().map(Path::to_path_buf);
        Some(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn button_is_disabled_until_credentials_are_ready() {
        let idle = ConnectButton::for_state(ConnectionState::Disconnected, false);
        assert_eq!(idle.label, "Connect to AWS IoT");
        assert!(!idle.enabled);
        assert_eq!(idle.fill, UiColors::BUTTON_DISABLED);

        let ready = ConnectButton::for_state(ConnectionState::Disconnected, true);
        assert!(ready.enabled);
        assert_eq!(ready.fill, UiColors::BUTTON_READY);
    }

    #[test]
    fn button_is_disabled_while_connecting() {
        let connecting = ConnectButton::for_state(ConnectionState::Connecting, true);
        assert_eq!(connecting.label, "Connecting...");
        assert!(!connecting.enabled);
    }

    #[test]
    fn button_offers_disconnect_when_connected() {
        let connected = ConnectButton::for_state(ConnectionState::Connected, true);
        assert_eq!(connected.label, "Disconnect");
        assert!(connected.enabled);
    }

    #[test]
    fn error_state_allows_retry() {
        let errored = ConnectButton::for_state(ConnectionState::Error, true);
        assert_eq!(errored.label, "Connect to AWS IoT");
        assert!(errored.enabled);
    }
}
