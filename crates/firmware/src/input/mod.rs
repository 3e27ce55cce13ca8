//! Input sources for the player.
//!
//! | Source            | Driver            | Used by              |
//! |-------------------|-------------------|----------------------|
//! | GPIO buttons      | [`ButtonScanner`] | board main loop      |
//! | Key script        | [`KeyScript`]     | desktop simulator    |
//!
//! Both implement [`platform::InputDevice`], so [`crate::app::DapApp`] is
//! identical across targets.

pub use platform::{Button, InputDevice, InputEvent};

pub mod buttons;
pub mod keys;

pub use buttons::ButtonScanner;
pub use keys::{EmulatedKey, KeyScript};
