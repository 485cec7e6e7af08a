use crate::after_load::PostLoadError;
use crate::migration::MigrationError;
use crate::version::SaveVersion;

/// How the caller should react to a failed load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadFailure {
    /// The blob decoded but the resulting world was rejected; the caller
    /// should rebuild a fresh world for the mode it was in before the attempt.
    Reinit,
    /// The file is not a usable savegame. Nothing was changed.
    InvalidFormat,
}

/// Errors from reading a savegame.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("not a savegame (bad magic)")]
    BadMagic,
    #[error("savegame is truncated")]
    Truncated,
    #[error("savegame version {found} is newer than supported version {current}")]
    UnsupportedVersion {
        found: SaveVersion,
        current: SaveVersion,
    },
    #[error("checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },
    #[error("zstd decompression error: {0}")]
    Decompress(String),
    #[error("CBOR deserialization error: {0}")]
    CborDecode(String),
    #[error("world layout is inconsistent with its map size")]
    Malformed,
    #[error("migration failed: {0}")]
    Migration(#[from] MigrationError),
    #[error(transparent)]
    Rejected(#[from] PostLoadError),
}

impl LoadError {
    pub fn disposition(&self) -> LoadFailure {
        match self {
            Self::Rejected(_) => LoadFailure::Reinit,
            _ => LoadFailure::InvalidFormat,
        }
    }
}

/// Errors from writing a savegame.
#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CBOR serialization error: {0}")]
    CborEncode(String),
}

/// Either side of a read-modify-write on a savegame.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Save(#[from] SaveError),
}
