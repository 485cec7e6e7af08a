//! Savegame container.
//!
//! ```text
//! offset  size  field
//! 0       4     magic b"ORSV"
//! 4       2     SaveVersion, little endian
//! 6       32    SHA-256 of the payload
//! 38      ..    payload: zstd(CBOR(World))
//! ```

use crate::error::{LoadError, SaveError};
use crate::version::SaveVersion;
use openrail_kernel::World;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::io::{Read, Write};
use std::path::Path;

pub const MAGIC: [u8; 4] = *b"ORSV";
const HEADER_LEN: usize = 4 + 2 + 32;

/// Fixed-size savegame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveHeader {
    pub version: SaveVersion,
    pub checksum: [u8; 32],
}

/// Serialize `world` into a complete savegame blob tagged with `version`.
pub fn encode(world: &World, version: SaveVersion) -> Result<Vec<u8>, SaveError> {
    let cbor = cbor_serialize(world)?;
    let payload = zstd_compress(&cbor)?;
    let checksum = sha256(&payload);

    let mut out = Vec::with_capacity(HEADER_LEN + payload.len());
    out.extend_from_slice(&MAGIC);
    out.extend_from_slice(&version.to_le_bytes());
    out.extend_from_slice(&checksum);
    out.extend_from_slice(&payload);
    Ok(out)
}

/// Split a blob into header and payload, checking magic and length.
pub fn decode_header(bytes: &[u8]) -> Result<(SaveHeader, &[u8]), LoadError> {
    if bytes.len() < MAGIC.len() {
        return Err(LoadError::Truncated);
    }
    if bytes[..4] != MAGIC {
        return Err(LoadError::BadMagic);
    }
    if bytes.len() < HEADER_LEN {
        return Err(LoadError::Truncated);
    }
    let version = SaveVersion::from_le_bytes([bytes[4], bytes[5]]);
    let mut checksum = [0u8; 32];
    checksum.copy_from_slice(&bytes[6..HEADER_LEN]);
    Ok((SaveHeader { version, checksum }, &bytes[HEADER_LEN..]))
}

/// Decode a blob into its version and the raw (not yet migrated) world.
pub fn decode(bytes: &[u8]) -> Result<(SaveVersion, World), LoadError> {
    let (header, payload) = decode_header(bytes)?;
    if header.version > SaveVersion::CURRENT {
        return Err(LoadError::UnsupportedVersion {
            found: header.version,
            current: SaveVersion::CURRENT,
        });
    }

    let actual = sha256(payload);
    if actual != header.checksum {
        return Err(LoadError::ChecksumMismatch {
            expected: hex(&header.checksum),
            actual: hex(&actual),
        });
    }

    let cbor = zstd_decompress(payload)?;
    let world: World = cbor_deserialize(&cbor)?;
    if !world.layout_is_consistent() {
        return Err(LoadError::Malformed);
    }
    Ok((header.version, world))
}

/// Read just the header of a savegame file.
pub fn read_header(path: impl AsRef<Path>) -> Result<SaveHeader, LoadError> {
    let mut file = std::fs::File::open(path)?;
    let mut buf = [0u8; HEADER_LEN];
    let mut filled = 0;
    while filled < HEADER_LEN {
        match file.read(&mut buf[filled..])? {
            0 => break,
            n => filled += n,
        }
    }
    decode_header(&buf[..filled]).map(|(header, _)| header)
}

/// Write `world` at the current format version.
///
/// The blob goes to a temporary file in the same directory and is renamed
/// into place. If the rename fails the temporary file is removed.
pub fn save_game(path: impl AsRef<Path>, world: &World) -> Result<(), SaveError> {
    let path = path.as_ref();
    let bytes = encode(world, SaveVersion::CURRENT)?;
    let dir = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => {
            std::fs::create_dir_all(parent)?;
            parent
        }
        None => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(&bytes)?;
    tmp.persist(path).map_err(|e| e.error)?;
    tracing::debug!(path = %path.display(), bytes = bytes.len(), "savegame written");
    Ok(())
}

fn cbor_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, SaveError> {
    let mut buf = Vec::new();
    ciborium::into_writer(value, &mut buf).map_err(|e| SaveError::CborEncode(e.to_string()))?;
    Ok(buf)
}

fn cbor_deserialize<T: for<'de> Deserialize<'de>>(data: &[u8]) -> Result<T, LoadError> {
    ciborium::from_reader(data).map_err(|e| LoadError::CborDecode(e.to_string()))
}

fn zstd_compress(data: &[u8]) -> Result<Vec<u8>, SaveError> {
    let mut encoder = zstd::Encoder::new(Vec::new(), 3)?;
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

fn zstd_decompress(data: &[u8]) -> Result<Vec<u8>, LoadError> {
    let mut decoder = zstd::Decoder::new(data).map_err(|e| LoadError::Decompress(e.to_string()))?;
    let mut buf = Vec::new();
    decoder
        .read_to_end(&mut buf)
        .map_err(|e| LoadError::Decompress(e.to_string()))?;
    Ok(buf)
}

fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use openrail_common::{Owner, TileIndex};

    fn sample_world() -> World {
        let mut world = World::with_seed(8, 8, 42);
        world.add_town("Fleethill", TileIndex(18), 300);
        world.start_new_player(false);
        world.tile_mut(TileIndex(3)).unwrap().owner = Owner(0);
        world.step();
        world
    }

    #[test]
    fn save_and_decode_preserves_state_hash() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("game.sav");
        let world = sample_world();

        save_game(&path, &world).unwrap();
        let (version, decoded) = decode(&std::fs::read(&path).unwrap()).unwrap();

        assert_eq!(version, SaveVersion::CURRENT);
        assert_eq!(decoded.state_hash(), world.state_hash());
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn failed_save_leaves_no_temporary_file() {
        let tmp = tempfile::tempdir().unwrap();
        let target = tmp.path().join("taken");
        std::fs::create_dir_all(target.join("inner")).unwrap();

        assert!(matches!(save_game(&target, &sample_world()), Err(SaveError::Io(_))));

        let names: Vec<_> = std::fs::read_dir(tmp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("taken")]);
    }

    #[test]
    fn header_is_readable_without_payload() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("old.sav");
        std::fs::write(&path, encode(&sample_world(), SaveVersion::new(2, 0)).unwrap()).unwrap();
        assert_eq!(read_header(&path).unwrap().version, SaveVersion::new(2, 0));
    }

    #[test]
    fn bad_magic_is_rejected() {
        let mut bytes = encode(&sample_world(), SaveVersion::CURRENT).unwrap();
        bytes[0] = b'X';
        assert!(matches!(decode(&bytes), Err(LoadError::BadMagic)));
    }

    #[test]
    fn short_file_is_truncated() {
        assert!(matches!(decode(b"OR"), Err(LoadError::Truncated)));
        assert!(matches!(decode(b"ORSV\x03\x04"), Err(LoadError::Truncated)));
    }

    #[test]
    fn corrupted_payload_fails_closed() {
        let mut bytes = encode(&sample_world(), SaveVersion::CURRENT).unwrap();
        if let Some(byte) = bytes.last_mut() {
            *byte ^= 0xff;
        }
        assert!(matches!(
            decode(&bytes),
            Err(LoadError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn future_versions_are_rejected() {
        let bytes = encode(&sample_world(), SaveVersion::new(9, 0)).unwrap();
        match decode(&bytes) {
            Err(LoadError::UnsupportedVersion { found, current }) => {
                assert_eq!(found, SaveVersion::new(9, 0));
                assert_eq!(current, SaveVersion::CURRENT);
            }
            other => panic!("expected UnsupportedVersion, got {other:?}"),
        }
    }
}
