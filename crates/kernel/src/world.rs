use crate::generate::splitmix64;
use glam::IVec2;
use openrail_common::{GameDate, MAX_PLAYERS, Owner, TileIndex};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Ticks per in-game day.
pub const DAY_TICKS: u16 = 74;

/// Size of a tile edge in world pixels, used for sign placement.
const TILE_PIXELS: i32 = 16;

/// Map width and height used by [`World::default`].
pub const DEFAULT_MAP_SIZE: u32 = 64;

/// What occupies a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileKind {
    Clear,
    Street,
    House,
    Water,
    TunnelBridge,
    Station,
}

/// One map tile.
///
/// `layout` carries kind-specific bits; for streets the high nibble `0x10`
/// marks a level crossing whose road part belongs to `road_owner`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    pub kind: TileKind,
    pub owner: Owner,
    pub layout: u8,
    pub road_owner: Owner,
}

impl Tile {
    pub const LEVEL_CROSSING: u8 = 0x10;

    pub fn clear() -> Self {
        Self {
            kind: TileKind::Clear,
            owner: Owner::NONE,
            layout: 0,
            road_owner: Owner::NONE,
        }
    }

    pub fn new(kind: TileKind, owner: Owner) -> Self {
        Self {
            kind,
            owner,
            ..Self::clear()
        }
    }

    pub fn is_level_crossing(&self) -> bool {
        self.kind == TileKind::Street && self.layout & 0xf0 == Self::LEVEL_CROSSING
    }
}

impl Default for Tile {
    fn default() -> Self {
        Self::clear()
    }
}

/// Display-only position of a town's name sign. Derived from the town tile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SignCoord {
    pub center: IVec2,
    pub width: u16,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Town {
    pub name: String,
    pub xy: TileIndex,
    pub population: u32,
    /// Player holding exclusive transport rights in this town.
    #[serde(default)]
    pub exclusivity: Option<Owner>,
    #[serde(skip)]
    pub sign: SignCoord,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub name: String,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub is_ai: bool,
    pub money: i64,
}

/// Game settings stored with the world.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameOptions {
    /// Index into the currency table.
    pub currency: u8,
    /// 0 drives on the left, 1 on the right.
    pub road_side: u8,
    pub diff_level: u8,
}

/// Main viewport position captured when the world is saved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedViewport {
    pub scroll: IVec2,
    pub zoom: u8,
}

impl SavedViewport {
    /// Most zoomed-out level; each level doubles the area shown.
    pub const MAX_ZOOM: u8 = 2;

    pub fn clamped(self) -> Self {
        Self {
            zoom: self.zoom.min(Self::MAX_ZOOM),
            ..self
        }
    }
}

/// The complete simulated world.
///
/// This is also the persisted body of a savegame. Fields added after the
/// first format carry `#[serde(default)]` so older blobs still decode; the
/// migration pipeline then fixes up what their defaults cannot express.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct World {
    width: u32,
    height: u32,
    tiles: Vec<Tile>,
    towns: Vec<Town>,
    players: Vec<Player>,
    #[serde(default)]
    options: GameOptions,
    date: GameDate,
    #[serde(default)]
    date_fract: u16,
    tick: u64,
    seed: u64,
    #[serde(default)]
    viewport: SavedViewport,
    /// Town lookup by tile. Rebuilt after load.
    #[serde(skip)]
    town_index: BTreeMap<TileIndex, usize>,
}

impl Default for World {
    fn default() -> Self {
        Self::new(DEFAULT_MAP_SIZE, DEFAULT_MAP_SIZE)
    }
}

impl World {
    /// Create an empty map of clear tiles with every player slot inactive.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            tiles: vec![Tile::clear(); width as usize * height as usize],
            towns: Vec::new(),
            players: vec![Player::default(); MAX_PLAYERS],
            options: GameOptions::default(),
            date: GameDate::default(),
            date_fract: 0,
            tick: 0,
            seed: 0,
            viewport: SavedViewport::default(),
            town_index: BTreeMap::new(),
        }
    }

    pub fn with_seed(width: u32, height: u32, seed: u64) -> Self {
        Self {
            seed,
            ..Self::new(width, height)
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn date(&self) -> GameDate {
        self.date
    }

    pub fn set_date(&mut self, date: GameDate) {
        self.date = date;
        self.date_fract = 0;
    }

    pub fn options(&self) -> &GameOptions {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut GameOptions {
        &mut self.options
    }

    pub fn saved_viewport(&self) -> SavedViewport {
        self.viewport
    }

    pub fn set_saved_viewport(&mut self, viewport: SavedViewport) {
        self.viewport = viewport;
    }

    pub fn tile_index(&self, x: u32, y: u32) -> TileIndex {
        TileIndex::from_xy(x, y, self.width)
    }

    pub fn tile(&self, index: TileIndex) -> Option<&Tile> {
        self.tiles.get(index.0 as usize)
    }

    pub fn tile_mut(&mut self, index: TileIndex) -> Option<&mut Tile> {
        self.tiles.get_mut(index.0 as usize)
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn tiles_mut(&mut self) -> &mut [Tile] {
        &mut self.tiles
    }

    pub fn towns(&self) -> &[Town] {
        &self.towns
    }

    pub fn towns_mut(&mut self) -> &mut [Town] {
        &mut self.towns
    }

    /// Found a town on the given tile. Returns its index.
    pub fn add_town(&mut self, name: impl Into<String>, xy: TileIndex, population: u32) -> usize {
        let index = self.towns.len();
        let mut town = Town {
            name: name.into(),
            xy,
            population,
            exclusivity: None,
            sign: SignCoord::default(),
        };
        town.sign = sign_for(&town, self.width);
        self.towns.push(town);
        self.town_index.insert(xy, index);
        index
    }

    pub fn town_at(&self, xy: TileIndex) -> Option<&Town> {
        self.town_index.get(&xy).map(|&i| &self.towns[i])
    }

    /// Town whose centre is nearest to `tile`, if any town exists.
    pub fn closest_town(&self, tile: TileIndex) -> Option<&Town> {
        self.towns
            .iter()
            .min_by_key(|t| t.xy.manhattan(tile, self.width))
    }

    /// Rebuild the tile-to-town lookup from the town list.
    pub fn rebuild_town_index(&mut self) {
        self.town_index = self
            .towns
            .iter()
            .enumerate()
            .map(|(i, t)| (t.xy, i))
            .collect();
    }

    /// Recompute the display position of every town sign.
    pub fn recompute_town_signs(&mut self) {
        let width = self.width;
        for town in &mut self.towns {
            town.sign = sign_for(town, width);
        }
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn players_mut(&mut self) -> &mut [Player] {
        &mut self.players
    }

    pub fn player(&self, owner: Owner) -> Option<&Player> {
        owner.player_index().and_then(|i| self.players.get(i))
    }

    /// Activate the first free player slot. Returns its owner id, or `None`
    /// when every slot is taken.
    pub fn start_new_player(&mut self, is_ai: bool) -> Option<Owner> {
        let index = self.players.iter().position(|p| !p.is_active)?;
        self.players[index] = Player {
            name: format!("Company {}", index + 1),
            is_active: true,
            is_ai,
            money: 100_000,
        };
        tracing::debug!(player = index, is_ai, "started new player");
        Owner::player(index)
    }

    /// Deactivate every player and strip their property.
    ///
    /// Player stations are cleared; all other player-owned tiles fall to
    /// [`Owner::NONE`].
    pub fn clear_player_property(&mut self) {
        for tile in &mut self.tiles {
            if !tile.owner.is_player() {
                continue;
            }
            if tile.kind == TileKind::Station {
                *tile = Tile::clear();
            } else {
                tile.owner = Owner::NONE;
            }
        }
        for player in &mut self.players {
            player.is_active = false;
        }
    }

    /// Whether the tile grid, player table and town positions agree with the
    /// map dimensions. Decoded worlds failing this are unusable.
    pub fn layout_is_consistent(&self) -> bool {
        let tile_count = self.width as usize * self.height as usize;
        self.tiles.len() == tile_count
            && self.players.len() == MAX_PLAYERS
            && self
                .towns
                .iter()
                .all(|t| (t.xy.0 as usize) < tile_count)
    }

    /// Advance the simulation by one tick.
    ///
    /// The seed advances with splitmix64 so that a given starting seed always
    /// produces the same sequence.
    pub fn step(&mut self) {
        self.tick += 1;
        self.seed = splitmix64(self.seed);
        self.date_fract += 1;
        if self.date_fract >= DAY_TICKS {
            self.date_fract = 0;
            self.date = self.date.next_day();
        }
    }

    /// Advance the tick counter without moving the calendar (editor mode).
    pub fn advance_frame(&mut self) {
        self.tick += 1;
    }

    /// Deterministic hash of the persisted state.
    pub fn state_hash(&self) -> u64 {
        let mut h: u64 = 0xcbf2_9ce4_8422_2325; // FNV offset basis
        let mix = |h: &mut u64, bytes: &[u8]| {
            for &b in bytes {
                *h ^= b as u64;
                *h = h.wrapping_mul(0x0100_0000_01b3);
            }
        };
        mix(&mut h, &self.width.to_le_bytes());
        mix(&mut h, &self.height.to_le_bytes());
        mix(&mut h, &self.tick.to_le_bytes());
        mix(&mut h, &self.seed.to_le_bytes());
        mix(&mut h, &self.date.0.to_le_bytes());
        mix(
            &mut h,
            &[
                self.options.currency,
                self.options.road_side,
                self.options.diff_level,
            ],
        );
        for tile in &self.tiles {
            mix(
                &mut h,
                &[
                    tile.kind as u8,
                    tile.owner.0,
                    tile.layout,
                    tile.road_owner.0,
                ],
            );
        }
        for town in &self.towns {
            mix(&mut h, town.name.as_bytes());
            mix(&mut h, &town.xy.0.to_le_bytes());
            mix(&mut h, &town.population.to_le_bytes());
            mix(&mut h, &[town.exclusivity.map_or(0xfe, |o| o.0)]);
        }
        for player in &self.players {
            mix(&mut h, player.name.as_bytes());
            mix(&mut h, &[player.is_active as u8, player.is_ai as u8]);
            mix(&mut h, &player.money.to_le_bytes());
        }
        h
    }
}

fn sign_for(town: &Town, map_width: u32) -> SignCoord {
    let xy = town.xy.to_xy(map_width).as_ivec2();
    SignCoord {
        center: xy * TILE_PIXELS + IVec2::splat(TILE_PIXELS / 2),
        width: (town.name.len() * 6).min(u16::MAX as usize) as u16,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn world_starts_empty() {
        let w = World::new(8, 8);
        assert_eq!(w.tick(), 0);
        assert_eq!(w.tiles().len(), 64);
        assert!(w.towns().is_empty());
        assert_eq!(w.players().len(), MAX_PLAYERS);
        assert!(w.players().iter().all(|p| !p.is_active));
    }

    #[test]
    fn step_advances_date_after_a_day_of_ticks() {
        let mut w = World::new(4, 4);
        for _ in 0..DAY_TICKS - 1 {
            w.step();
        }
        assert_eq!(w.date(), GameDate(0));
        w.step();
        assert_eq!(w.date(), GameDate(1));
        assert_eq!(w.tick(), DAY_TICKS as u64);
    }

    #[test]
    fn deterministic_steps_same_seed() {
        let mut w1 = World::with_seed(4, 4, 42);
        let mut w2 = World::with_seed(4, 4, 42);
        for _ in 0..100 {
            w1.step();
            w2.step();
        }
        assert_eq!(w1.seed(), w2.seed());
        assert_eq!(w1.state_hash(), w2.state_hash());
    }

    #[test]
    fn editor_frames_do_not_move_the_calendar() {
        let mut w = World::new(4, 4);
        for _ in 0..200 {
            w.advance_frame();
        }
        assert_eq!(w.tick(), 200);
        assert_eq!(w.date(), GameDate(0));
    }

    #[test]
    fn start_new_player_takes_first_free_slot() {
        let mut w = World::new(4, 4);
        assert_eq!(w.start_new_player(false), Some(Owner(0)));
        assert_eq!(w.start_new_player(true), Some(Owner(1)));
        assert!(w.player(Owner(1)).unwrap().is_ai);
        for _ in 2..MAX_PLAYERS {
            w.start_new_player(true);
        }
        assert_eq!(w.start_new_player(false), None);
    }

    #[test]
    fn town_index_and_signs() {
        let mut w = World::new(16, 16);
        let xy = w.tile_index(3, 4);
        w.add_town("Fleethill", xy, 500);
        assert_eq!(w.town_at(xy).unwrap().name, "Fleethill");
        assert_eq!(w.towns()[0].sign.center, IVec2::new(3 * 16 + 8, 4 * 16 + 8));

        // A decoded world has neither index nor signs until recomputed.
        let mut copy = w.clone();
        copy.town_index.clear();
        copy.towns_mut()[0].sign = SignCoord::default();
        assert!(copy.town_at(xy).is_none());
        copy.rebuild_town_index();
        copy.recompute_town_signs();
        assert_eq!(copy, w);
    }

    #[test]
    fn closest_town_by_distance() {
        let mut w = World::new(16, 16);
        let a = w.tile_index(1, 1);
        let b = w.tile_index(12, 12);
        w.add_town("A", a, 10);
        w.add_town("B", b, 10);
        assert_eq!(w.closest_town(w.tile_index(10, 9)).unwrap().name, "B");
        assert!(World::new(4, 4).closest_town(TileIndex(0)).is_none());
    }

    #[test]
    fn clear_player_property_removes_stations() {
        let mut w = World::new(4, 4);
        w.start_new_player(false);
        *w.tile_mut(TileIndex(0)).unwrap() = Tile::new(TileKind::Station, Owner(0));
        *w.tile_mut(TileIndex(1)).unwrap() = Tile::new(TileKind::Street, Owner(0));
        *w.tile_mut(TileIndex(2)).unwrap() = Tile::new(TileKind::Street, Owner::TOWN);

        w.clear_player_property();

        assert_eq!(*w.tile(TileIndex(0)).unwrap(), Tile::clear());
        assert_eq!(w.tile(TileIndex(1)).unwrap().owner, Owner::NONE);
        assert_eq!(w.tile(TileIndex(1)).unwrap().kind, TileKind::Street);
        assert_eq!(w.tile(TileIndex(2)).unwrap().owner, Owner::TOWN);
        assert!(w.players().iter().all(|p| !p.is_active));
    }

    #[test]
    fn level_crossing_detection() {
        let mut t = Tile::new(TileKind::Street, Owner(0));
        assert!(!t.is_level_crossing());
        t.layout = 0x13;
        assert!(t.is_level_crossing());
        t.kind = TileKind::Clear;
        assert!(!t.is_level_crossing());
    }

    #[test]
    fn layout_consistency() {
        let mut w = World::new(4, 4);
        assert!(w.layout_is_consistent());
        w.add_town("Out", TileIndex(16), 1);
        assert!(!w.layout_is_consistent());
        let mut w = World::new(4, 4);
        w.tiles.pop();
        assert!(!w.layout_is_consistent());
    }

    #[test]
    fn state_hash_tracks_tiles() {
        let mut w = World::new(4, 4);
        let before = w.state_hash();
        w.tile_mut(TileIndex(5)).unwrap().owner = Owner::WATER;
        assert_ne!(before, w.state_hash());
    }
}
