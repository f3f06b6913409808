//! Clip playback
//!
//! [`PlaybackDriver`] owns the single active [`PlaybackState`] and the
//! transport (`Idle`, `Playing`, `Paused`).

pub mod driver;
pub mod state;

pub use driver::PlaybackDriver;
pub use state::{LoopMode, PlaybackState, PlaybackStatus};
