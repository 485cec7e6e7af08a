//! Shared value types for the openrail runtime.

pub mod date;
pub mod debug;
pub mod mode;
pub mod types;

pub use date::GameDate;
pub use debug::{DebugCategory, DebugLevels, UnknownDebugCategory};
pub use mode::{GameMode, SwitchMode};
pub use types::{MAX_PLAYERS, Owner, TileIndex};
