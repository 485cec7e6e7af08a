use crate::after_load::{AfterLoadContext, after_load};
use crate::error::LoadError;
use crate::format::decode;
use crate::migration::MigrationPipeline;
use crate::version::SaveVersion;
use openrail_kernel::World;
use std::path::Path;

/// A world read from disk and brought up to the current format.
#[derive(Debug)]
pub struct LoadedGame {
    pub world: World,
    /// Version the file was written with.
    pub version: SaveVersion,
    /// Names of the migration steps that ran.
    pub migrations: Vec<&'static str>,
}

/// Decode, migrate and normalise a savegame.
///
/// Nothing outside the returned value is touched, so a failed load leaves
/// the caller's state exactly as it was.
pub fn load_game(path: impl AsRef<Path>, ctx: AfterLoadContext) -> Result<LoadedGame, LoadError> {
    let path = path.as_ref();
    let _span = tracing::info_span!("load_game", path = %path.display()).entered();

    let bytes = std::fs::read(path)?;
    let (version, mut world) = decode(&bytes)?;
    let report = MigrationPipeline::standard().run(&mut world, version)?;
    after_load(&mut world, ctx)?;

    tracing::debug!(%version, migrations = report.applied.len(), "savegame loaded");
    Ok(LoadedGame {
        world,
        version,
        migrations: report.applied,
    })
}

/// Load `input` and write it back at the current version.
pub fn upgrade_file(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    ctx: AfterLoadContext,
) -> Result<LoadedGame, crate::PersistError> {
    let loaded = load_game(input, ctx)?;
    crate::format::save_game(output, &loaded.world)?;
    Ok(loaded)
}
