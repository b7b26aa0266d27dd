//! Keyboard shortcut for the connect button.

use eframe::egui::{Key, Modifiers};

pub const NEED_CREDENTIALS: &str = "Please load all certificate files first";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAction {
    /// Same as pressing the connect/disconnect button
    Toggle,
    /// Shortcut pressed before all three certificate files were picked
    NeedCredentials,
    Ignored,
}

/// Maps a pressed key to an action.
///
/// egui reports `C` for both cases, so `c` and `C` behave the same. Chords
/// such as Ctrl+C are left to copy/paste.
pub fn action_for_key(key: Key, modifiers: Modifiers, credentials_ready: bool) -> InputAction {
    if modifiers.alt || modifiers.ctrl || modifiers.command || modifiers.mac_cmd {
        return InputAction::Ignored;
    }
    match key {
        Key::C if credentials_ready => InputAction::Toggle,
        Key::C => InputAction::NeedCredentials,
        _ => InputAction::Ignored,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn c_toggles_when_ready() {
        assert_eq!(
            action_for_key(Key::C, Modifiers::NONE, true),
            InputAction::Toggle
        );
    }

    #[test]
    fn c_asks_for_credentials_when_not_ready() {
        assert_eq!(
            action_for_key(Key::C, Modifiers::NONE, false),
            InputAction::NeedCredentials
        );
    }

    #[test]
    fn other_keys_do_nothing() {
        assert_eq!(
            action_for_key(Key::D, Modifiers::NONE, true),
            InputAction::Ignored
        );
        assert_eq!(
            action_for_key(Key::Enter, Modifiers::NONE, false),
            InputAction::Ignored
        );
    }

    #[test]
    fn shift_c_still_toggles() {
        assert_eq!(
            action_for_key(Key::C, Modifiers::SHIFT, true),
            InputAction::Toggle
        );
    }

    #[test]
    fn copy_chords_are_ignored() {
        assert_eq!(
            action_for_key(Key::C, Modifiers::CTRL, true),
            InputAction::Ignored
        );
        assert_eq!(
            action_for_key(Key::C, Modifiers::COMMAND, false),
            InputAction::Ignored
        );
        assert_eq!(
            action_for_key(Key::C, Modifiers::ALT, true),
            InputAction::Ignored
        );
    }
}
