//! Savegame persistence: file format, migration, post-load normalisation.
//!
//! # Invariants
//! - Files newer than [`SaveVersion::CURRENT`] are never loaded.
//! - Migration steps run in ascending threshold order.
//! - A failed load returns no world; the caller's state is untouched.

pub mod after_load;
pub mod error;
pub mod files;
pub mod format;
pub mod load;
pub mod migration;
pub mod version;

pub use after_load::{AfterLoadContext, PostLoadError, after_load};
pub use error::{LoadError, LoadFailure, PersistError, SaveError};
pub use files::{AUTOSAVE_SLOTS, SaveEntry, SaveFiles};
pub use format::{SaveHeader, read_header, save_game};
pub use load::{LoadedGame, load_game, upgrade_file};
pub use migration::{MigrationError, MigrationPipeline, MigrationReport, MigrationStep};
pub use version::SaveVersion;
