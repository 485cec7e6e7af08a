//! World kernel: the in-memory world, world generation, and local simulation stepping.
//!
//! # Invariants
//! - Stepping is deterministic for a given seed.
//! - The world is also the savegame body; derived fields are `#[serde(skip)]`
//!   and rebuilt after load.

pub mod generate;
pub mod simulation;
pub mod world;

pub use generate::{
    GenerateMode, TerrainConfig, TerrainError, TerrainGenerator, WorldGen, splitmix64,
};
pub use simulation::{LocalSimulation, Simulation};
pub use world::{
    DAY_TICKS, GameOptions, Player, SavedViewport, SignCoord, Tile, TileKind, Town, World,
};
