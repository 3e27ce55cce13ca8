//! Keyboard emulation of the player buttons.
//!
//! The simulator takes a key script on the command line; each character is
//! one input poll. Unknown characters and `.` are idle polls.

use platform::{Button, InputDevice, InputEvent};

/// Emulated keyboard key for a button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmulatedKey {
    /// Space bar → [`Button::Play`].
    Space,
    /// K key → [`Button::Play`] (vi-style).
    KeyK,
    /// N key → [`Button::Next`].
    KeyN,
    /// L key → [`Button::Next`] (vi-style).
    KeyL,
    /// P key → [`Button::Previous`].
    KeyP,
    /// J key → [`Button::Previous`] (vi-style).
    KeyJ,
    /// `+` → [`Button::VolumeUp`].
    Plus,
    /// `-` → [`Button::VolumeDown`].
    Minus,
    /// M key → [`Button::Mode`].
    KeyM,
    /// Q key → [`Button::Back`].
    KeyQ,
}

impl EmulatedKey {
    /// Key for a script character.
    pub fn from_char(c: char) -> Option<Self> {
        Some(match c {
            ' ' => Self::Space,
            'k' => Self::KeyK,
            'n' => Self::KeyN,
            'l' => Self::KeyL,
            'p' => Self::KeyP,
            'j' => Self::KeyJ,
            '+' => Self::Plus,
            '-' => Self::Minus,
            'm' => Self::KeyM,
            'q' => Self::KeyQ,
            _ => return None,
        })
    }

    /// The button this key stands for.
    pub fn button(self) -> Button {
        match self {
            Self::Space | Self::KeyK => Button::Play,
            Self::KeyN | Self::KeyL => Button::Next,
            Self::KeyP | Self::KeyJ => Button::Previous,
            Self::Plus => Button::VolumeUp,
            Self::Minus => Button::VolumeDown,
            Self::KeyM => Button::Mode,
            Self::KeyQ => Button::Back,
        }
    }
}

/// [`InputDevice`] replaying a key script, one character per poll.
#[derive(Debug, Clone)]
pub struct KeyScript<'a> {
    keys: core::str::Chars<'a>,
}

impl<'a> KeyScript<'a> {
    /// Script over `keys`.
    pub fn new(keys: &'a str) -> Self {
        Self { keys: keys.chars() }
    }

    /// Every character has been consumed.
    pub fn is_done(&self) -> bool {
        self.keys.as_str().is_empty()
    }
}

impl InputDevice for KeyScript<'_> {
    fn poll_event(&mut self) -> Option<InputEvent> {
        let c = self.keys.next()?;
        let key = EmulatedKey::from_char(c.to_ascii_lowercase())?;
        tracing::debug!(?key, "key");
        Some(InputEvent::ButtonPress(key.button()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_button_has_a_key() {
        let buttons: Vec<Button> = " n p+-mq"
            .chars()
            .filter_map(EmulatedKey::from_char)
            .map(EmulatedKey::button)
            .collect();
        assert_eq!(
            buttons,
            vec![
                Button::Play,
                Button::Next,
                Button::Previous,
                Button::VolumeUp,
                Button::VolumeDown,
                Button::Mode,
                Button::Back
            ]
        );
    }

    #[test]
    fn script_polls_one_key_at_a_time() {
        let mut script = KeyScript::new("N.x+");
        assert_eq!(
            script.poll_event(),
            Some(InputEvent::ButtonPress(Button::Next))
        );
        assert_eq!(script.poll_event(), None);
        assert_eq!(script.poll_event(), None);
        assert!(!script.is_done());
        assert_eq!(
            script.poll_event(),
            Some(InputEvent::ButtonPress(Button::VolumeUp))
        );
        assert!(script.is_done());
        assert_eq!(script.poll_event(), None);
    }
}
