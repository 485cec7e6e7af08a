use std::fmt;

/// Savegame format version: major in the high byte, minor in the low byte.
///
/// Legacy encodings, each fixed up by a migration step:
/// - up to 2.0: town property marked with the 0x80 owner bit
/// - up to 4.0: no stored player activity, a named player is active
/// - up to 4.1: old currency order
/// - up to 4.2: water tiles without the water owner
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SaveVersion(pub u16);

impl SaveVersion {
    pub const CURRENT: SaveVersion = SaveVersion::new(4, 3);

    pub const fn new(major: u8, minor: u8) -> Self {
        Self(((major as u16) << 8) | minor as u16)
    }

    pub fn major(self) -> u8 {
        (self.0 >> 8) as u8
    }

    pub fn minor(self) -> u8 {
        self.0 as u8
    }

    pub fn to_le_bytes(self) -> [u8; 2] {
        self.0.to_le_bytes()
    }

    pub fn from_le_bytes(bytes: [u8; 2]) -> Self {
        Self(u16::from_le_bytes(bytes))
    }
}

impl fmt::Display for SaveVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major(), self.minor())
    }
}
