//! Runtime core: the session, its mode controller and the per-tick main loop.
//!
//! # Invariants
//! - At most one mode transition is pending; a newer request replaces it.
//! - Transitions only run inside the main loop, never reentrantly.
//! - Driver switches are applied between main-loop runs, never mid-tick.

pub mod config;
pub mod context;
mod game_loop;
pub mod interface;
pub mod mode;
pub mod network;
pub mod screenshot;
#[cfg(test)]
mod testing;

pub use config::{ConfigError, RuntimeConfig};
pub use context::{RuntimeContext, Services, Session};
pub use interface::{Cursor, Interface, Jukebox, Notice, ScreenshotKind, Viewport};
pub use mode::{ModeController, ModeError, ModeRequest, ModeRequestSender};
pub use network::{Network, OfflineNetwork};
pub use screenshot::{ScreenshotError, Screenshots, TextScreenshots};
