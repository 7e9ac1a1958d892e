//! # Keyboard
//!
//! Cheat codes, hotkeys and modifier state on top of the window's
//! `keydown`/`keyup` events.
//!
//! ```rust
//! use tether_core::{Lifecycle, Store};
//! use tether_keyboard::{KeyPhase, Modifiers, track_keyboard};
//!
//! let lifecycle = Lifecycle::manual();
//! let keyboard = track_keyboard(&lifecycle);
//!
//! let god_mode = Store::new(false);
//! god_mode.on(&keyboard.sequence("iddqd", Modifiers::empty()), |_, _| true);
//!
//! let save = keyboard.hotkey(&["Control", "s"], KeyPhase::Down);
//! let shift = keyboard.modifier(Modifiers::SHIFT);
//!
//! lifecycle.setup.fire(());
//! assert!(!shift.get());
//! # drop(save);
//! ```

pub mod keyboard;
pub mod sequence;
pub mod tests;

pub use keyboard::{KeyPhase, Keyboard, KeyboardTracker, track_keyboard};
pub use sequence::Needle;
pub use tether_web::host::{KeyPress, Modifiers};
