//! Pluggable output backends.
//!
//! Every output kind (video, sound, music) has a table of backends and at
//! most one running instance. Backends are chosen by a driver string such
//! as `null:ticks=100`, or by priority when the string is empty.
//!
//! # Invariants
//! - Activating a backend stops the previous one of the same kind first.
//! - A backend that fails to start is never left active.

mod dedicated;
mod driver;
mod null;
pub mod options;
pub mod registry;
mod text;

pub use dedicated::DedicatedVideo;
pub use driver::{
    DirtyRect, Driver, FrameReport, LoopControl, MainLoopExit, MusicDriver, SoundDriver,
    VideoDriver,
};
pub use null::{NullMusic, NullSound, NullVideo};
pub use options::{DriverParam, DriverParams, DriverRequest, MAX_PARAMS, OptionError};
pub use registry::{
    DriverClass, DriverDesc, DriverError, DriverKind, DriverRegistry, detect_platform_version,
};
pub use text::TextVideo;
