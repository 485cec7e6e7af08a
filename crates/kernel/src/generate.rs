use crate::world::{GameOptions, Tile, TileKind, World};
use openrail_common::{GameDate, Owner};

/// Kind of world to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerateMode {
    /// Playable world with towns.
    Game,
    /// Empty landscape for the scenario editor.
    Editor,
    /// Fresh random terrain for an editor session.
    RandomLand,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TerrainError {
    #[error("map of {width}x{height} tiles is too large")]
    MapTooLarge { width: u32, height: u32 },
    #[error("starting year {year} is out of range")]
    YearOutOfRange { year: u32 },
}

/// Builds fresh worlds for new games, the editor, and the intro fallback.
pub trait WorldGen {
    fn generate(&mut self, mode: GenerateMode) -> World;
}

/// Parameters for [`TerrainGenerator`].
#[derive(Debug, Clone)]
pub struct TerrainConfig {
    pub width: u32,
    pub height: u32,
    pub town_count: u32,
    pub starting_year: u32,
    pub options: GameOptions,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            width: 64,
            height: 64,
            town_count: 4,
            starting_year: 1950,
            options: GameOptions::default(),
        }
    }
}

const TOWN_NAMES: [&str; 12] = [
    "Fleethill",
    "Bridgemouth",
    "Scotfield",
    "Wrundbury",
    "Grondford",
    "Mallow Cross",
    "Kenvale",
    "Hatby",
    "Dunwick",
    "Ashmere",
    "Tolford",
    "Brindle",
];

/// Seeded generator producing a water border, scattered lakes, and towns
/// with a small street cross and houses around their centre.
#[derive(Debug, Clone)]
pub struct TerrainGenerator {
    config: TerrainConfig,
    start: GameDate,
    seed: u64,
}

impl TerrainGenerator {
    /// Tile indices are `u32`, so the whole map must fit in one.
    pub fn new(config: TerrainConfig, seed: u64) -> Result<Self, TerrainError> {
        if config.width.checked_mul(config.height).is_none() {
            return Err(TerrainError::MapTooLarge {
                width: config.width,
                height: config.height,
            });
        }
        let start = GameDate::from_year(config.starting_year).ok_or(TerrainError::YearOutOfRange {
            year: config.starting_year,
        })?;
        Ok(Self { config, start, seed })
    }

    pub fn config(&self) -> &TerrainConfig {
        &self.config
    }

    fn next(&mut self) -> u64 {
        self.seed = splitmix64(self.seed);
        self.seed
    }

    fn below(&mut self, bound: u32) -> u32 {
        (self.next() % bound.max(1) as u64) as u32
    }

    fn base_world(&mut self) -> World {
        let c = &self.config;
        let mut world = World::with_seed(c.width, c.height, self.seed);
        *world.options_mut() = c.options;
        world.set_date(self.start);

        for y in 0..c.height {
            for x in 0..c.width {
                if x == 0 || y == 0 || x + 1 == c.width || y + 1 == c.height {
                    let idx = world.tile_index(x, y);
                    if let Some(tile) = world.tile_mut(idx) {
                        *tile = Tile::new(TileKind::Water, Owner::WATER);
                    }
                }
            }
        }
        world
    }

    fn scatter_lakes(&mut self, world: &mut World) {
        let (w, h) = (self.config.width, self.config.height);
        if w < 8 || h < 8 {
            return;
        }
        let lakes = (w * h) / 512;
        for _ in 0..lakes {
            let cx = 2 + self.below(w - 4);
            let cy = 2 + self.below(h - 4);
            for (dx, dy) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
                let idx = world.tile_index((cx + dx).min(w - 2), (cy + dy).min(h - 2));
                if let Some(tile) = world.tile_mut(idx) {
                    *tile = Tile::new(TileKind::Water, Owner::WATER);
                }
            }
        }
    }

    fn place_towns(&mut self, world: &mut World) {
        let (w, h) = (self.config.width, self.config.height);
        if w < 8 || h < 8 {
            return;
        }
        let mut placed = 0;
        let mut attempts = 0;
        while placed < self.config.town_count && attempts < self.config.town_count * 16 {
            attempts += 1;
            let x = 3 + self.below(w - 6);
            let y = 3 + self.below(h - 6);
            let centre = world.tile_index(x, y);
            let clear = world
                .tile(centre)
                .is_some_and(|t| t.kind == TileKind::Clear);
            let crowded = world
                .closest_town(centre)
                .is_some_and(|t| t.xy.manhattan(centre, w) < 6);
            if !clear || crowded {
                continue;
            }

            build_town_centre(world, x, y);
            let name = TOWN_NAMES[placed as usize % TOWN_NAMES.len()];
            let population = 200 + self.below(1800);
            world.add_town(name, centre, population);
            placed += 1;
        }
        tracing::debug!(towns = placed, "placed towns");
    }
}

fn build_town_centre(world: &mut World, x: u32, y: u32) {
    for (dx, dy) in [(0, 0), (-1, 0), (1, 0), (0, -1), (0, 1)] {
        let idx = world.tile_index(x.wrapping_add_signed(dx), y.wrapping_add_signed(dy));
        if let Some(tile) = world.tile_mut(idx) {
            *tile = Tile::new(TileKind::Street, Owner::TOWN);
        }
    }
    for (dx, dy) in [(-1, -1), (1, -1), (-1, 1), (1, 1)] {
        let idx = world.tile_index(x.wrapping_add_signed(dx), y.wrapping_add_signed(dy));
        if let Some(tile) = world.tile_mut(idx) {
            if tile.kind == TileKind::Clear {
                *tile = Tile::new(TileKind::House, Owner::TOWN);
            }
        }
    }
}

impl WorldGen for TerrainGenerator {
    fn generate(&mut self, mode: GenerateMode) -> World {
        let _span = tracing::debug_span!("generate_world", ?mode).entered();
        let mut world = self.base_world();
        match mode {
            GenerateMode::Editor => {}
            GenerateMode::RandomLand => self.scatter_lakes(&mut world),
            GenerateMode::Game => {
                self.scatter_lakes(&mut world);
                self.place_towns(&mut world);
            }
        }
        // Every generated world starts from a fresh seed.
        self.next();
        world
    }
}

/// Splitmix64 step. Fast, deterministic across platforms.
pub fn splitmix64(mut state: u64) -> u64 {
    state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
    let mut z = state;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}
