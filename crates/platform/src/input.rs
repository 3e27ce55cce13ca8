//! Input device abstraction

/// Input device trait for buttons
pub trait InputDevice {
    /// Poll for event (non-blocking)
    fn poll_event(&mut self) -> Option<InputEvent>;
}

impl<T: InputDevice + ?Sized> InputDevice for &mut T {
    fn poll_event(&mut self) -> Option<InputEvent> {
        (**self).poll_event()
    }
}

/// Input events from buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InputEvent {
    /// Button pressed
    ButtonPress(Button),
    /// Button released
    ButtonRelease(Button),
    /// Button held for extended period
    ButtonLongPress(Button),
}

impl InputEvent {
    /// The button of a press event, if this is one.
    pub fn pressed(self) -> Option<Button> {
        match self {
            Self::ButtonPress(b) => Some(b),
            Self::ButtonRelease(_) | Self::ButtonLongPress(_) => None,
        }
    }
}

/// Physical buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Button {
    /// Play/Pause button
    Play,
    /// Next track
    Next,
    /// Previous track
    Previous,
    /// Volume up
    VolumeUp,
    /// Volume down
    VolumeDown,
    /// Cycle play mode
    Mode,
    /// Back button (stop)
    Back,
}
