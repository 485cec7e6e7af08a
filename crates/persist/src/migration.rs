//! Savegame migration pipeline.
//!
//! Each step fixes one legacy encoding. A step applies to every file whose
//! version is at or below its threshold, and steps always run in ascending
//! threshold order, so loading an old file replays every fix-up the format
//! has accumulated since.

use crate::version::SaveVersion;
use openrail_common::Owner;
use openrail_kernel::{TileKind, World};

/// Errors raised by a migration step.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MigrationError {
    #[error("currency index {index} has no counterpart in the current table")]
    UnknownCurrency { index: u8 },
}

pub type Transform = fn(&mut World) -> Result<(), MigrationError>;

/// One fix-up applied to files at or below `threshold`.
#[derive(Clone, Copy)]
pub struct MigrationStep {
    pub threshold: SaveVersion,
    pub name: &'static str,
    pub transform: Transform,
}

impl std::fmt::Debug for MigrationStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MigrationStep")
            .field("threshold", &self.threshold)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl MigrationStep {
    pub fn applies_to(&self, version: SaveVersion) -> bool {
        self.threshold >= version
    }
}

pub const STEPS: &[MigrationStep] = &[
    MigrationStep {
        threshold: SaveVersion::new(2, 0),
        name: "town_owner",
        transform: convert_town_owner,
    },
    MigrationStep {
        threshold: SaveVersion::new(4, 0),
        name: "exclusive_rights",
        transform: update_exclusive_rights,
    },
    MigrationStep {
        threshold: SaveVersion::new(4, 0),
        name: "player_active",
        transform: mark_named_players_active,
    },
    MigrationStep {
        threshold: SaveVersion::new(4, 1),
        name: "currency_order",
        transform: update_currencies,
    },
    MigrationStep {
        threshold: SaveVersion::new(4, 2),
        name: "water_owner",
        transform: fix_water_owner,
    },
];

/// What a pipeline run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationReport {
    pub from: SaveVersion,
    pub applied: Vec<&'static str>,
}

/// Ordered list of steps run against a decoded world.
#[derive(Debug, Clone, Copy)]
pub struct MigrationPipeline {
    steps: &'static [MigrationStep],
}

impl MigrationPipeline {
    pub fn standard() -> Self {
        Self { steps: STEPS }
    }

    pub fn steps(&self) -> &'static [MigrationStep] {
        self.steps
    }

    /// Bring a world decoded from a `from`-version file up to date.
    ///
    /// On error the world is left partially migrated; callers must discard it.
    pub fn run(&self, world: &mut World, from: SaveVersion) -> Result<MigrationReport, MigrationError> {
        let _span = tracing::debug_span!("migrate", %from).entered();
        let mut applied = Vec::new();
        for step in self.steps.iter().filter(|s| s.applies_to(from)) {
            tracing::trace!(step = step.name, threshold = %step.threshold, "applying migration");
            (step.transform)(world).inspect_err(|e| {
                tracing::warn!(step = step.name, error = %e, "migration step failed");
            })?;
            applied.push(step.name);
        }
        if !applied.is_empty() {
            tracing::debug!(steps = applied.len(), "savegame migrated");
        }
        Ok(MigrationReport { from, applied })
    }
}

const LEGACY_TOWN_BIT: u8 = 0x80;

fn is_legacy_town(owner: Owner) -> bool {
    owner.0 & LEGACY_TOWN_BIT != 0
}

fn convert_town_owner(world: &mut World) -> Result<(), MigrationError> {
    for tile in world.tiles_mut() {
        match tile.kind {
            TileKind::Street => {
                if tile.is_level_crossing() && is_legacy_town(tile.road_owner) {
                    tile.road_owner = Owner::TOWN;
                }
                if is_legacy_town(tile.owner) {
                    tile.owner = Owner::TOWN;
                }
            }
            TileKind::TunnelBridge => {
                if is_legacy_town(tile.owner) {
                    tile.owner = Owner::TOWN;
                }
            }
            _ => {}
        }
    }
    Ok(())
}

// Which player held exclusive rights is not recoverable from old files, so
// this step keeps whatever the blob carried.
fn update_exclusive_rights(_world: &mut World) -> Result<(), MigrationError> {
    Ok(())
}

fn mark_named_players_active(world: &mut World) -> Result<(), MigrationError> {
    for player in world.players_mut() {
        if !player.name.is_empty() {
            player.is_active = true;
        }
    }
    Ok(())
}

/// Old currency index to current index.
const CURRENCY_CONVERSION: [u8; 23] = [
    0, 1, 12, 8, 3, 10, 14, 19, 4, 5, 9, 11, 13, 6, 17, 16, 22, 21, 7, 15, 18, 2, 20,
];

fn update_currencies(world: &mut World) -> Result<(), MigrationError> {
    let options = world.options_mut();
    let index = options.currency;
    options.currency = *CURRENCY_CONVERSION
        .get(index as usize)
        .ok_or(MigrationError::UnknownCurrency { index })?;
    Ok(())
}

fn fix_water_owner(world: &mut World) -> Result<(), MigrationError> {
    for tile in world.tiles_mut() {
        if tile.kind == TileKind::Water {
            tile.owner = Owner::WATER;
        } else if tile.owner == Owner::WATER {
            tile.owner = Owner::NONE;
        }
    }
    Ok(())
}
