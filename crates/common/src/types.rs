use glam::UVec2;
use serde::{Deserialize, Serialize};

/// Number of player slots in a world.
pub const MAX_PLAYERS: usize = 8;

/// Owner of a tile or piece of infrastructure.
///
/// Values below [`MAX_PLAYERS`] are player slots; the named constants cover
/// the non-player owners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Owner(pub u8);

impl Owner {
    pub const TOWN: Owner = Owner(0x0f);
    pub const NONE: Owner = Owner(0x10);
    pub const WATER: Owner = Owner(0x11);
    pub const SPECTATOR: Owner = Owner(0xff);

    /// Owner for the given player slot, if the slot exists.
    pub fn player(index: usize) -> Option<Self> {
        (index < MAX_PLAYERS).then_some(Self(index as u8))
    }

    pub fn is_player(self) -> bool {
        (self.0 as usize) < MAX_PLAYERS
    }

    pub fn player_index(self) -> Option<usize> {
        self.is_player().then_some(self.0 as usize)
    }
}

impl Default for Owner {
    fn default() -> Self {
        Self::NONE
    }
}

/// Row-major index of a tile on the map.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct TileIndex(pub u32);

impl TileIndex {
    pub fn from_xy(x: u32, y: u32, map_width: u32) -> Self {
        Self(y * map_width + x)
    }

    pub fn to_xy(self, map_width: u32) -> UVec2 {
        UVec2::new(self.0 % map_width, self.0 / map_width)
    }

    /// Manhattan distance between two tiles of the same map.
    pub fn manhattan(self, other: TileIndex, map_width: u32) -> u32 {
        let a = self.to_xy(map_width);
        let b = other.to_xy(map_width);
        a.x.abs_diff(b.x) + a.y.abs_diff(b.y)
    }
}
