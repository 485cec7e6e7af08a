use openrail_common::{GameMode, Owner};
use openrail_kernel::{SavedViewport, World};

/// Settings that decide how a freshly migrated world is normalised.
#[derive(Debug, Clone, Copy)]
pub struct AfterLoadContext {
    /// Mode the world is being loaded into.
    pub mode: GameMode,
    /// Start player 0 if the file left that slot empty. Network clients
    /// receive their player from the server instead.
    pub create_default_player: bool,
}

/// The world decoded and migrated cleanly but cannot be played.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PostLoadError {
    #[error("savegame has no towns")]
    NoTown,
}

/// Rebuild derived state and apply the checks every loaded world must pass.
pub fn after_load(world: &mut World, ctx: AfterLoadContext) -> Result<(), PostLoadError> {
    let options = world.options_mut();
    options.road_side = options.road_side.min(1);

    let viewport = world.saved_viewport();
    world.set_saved_viewport(viewport.clamped());

    world.recompute_town_signs();
    world.rebuild_town_index();

    if ctx.mode == GameMode::Normal && world.towns().is_empty() {
        return Err(PostLoadError::NoTown);
    }

    let first_active = world
        .player(Owner(0))
        .is_some_and(|p| p.is_active);
    if !first_active && ctx.create_default_player {
        world.start_new_player(false);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use openrail_common::TileIndex;

    fn ctx(mode: GameMode) -> AfterLoadContext {
        AfterLoadContext {
            mode,
            create_default_player: true,
        }
    }

    #[test]
    fn normal_mode_requires_a_town() {
        let mut world = World::new(4, 4);
        assert_eq!(
            after_load(&mut world, ctx(GameMode::Normal)),
            Err(PostLoadError::NoTown)
        );
        assert!(after_load(&mut world, ctx(GameMode::Editor)).is_ok());
    }

    #[test]
    fn normalises_derived_state() {
        let mut world = World::new(8, 8);
        world.add_town("Hatby", TileIndex(9), 100);
        world.options_mut().road_side = 7;
        let mut decoded: World = world.clone();
        decoded.set_saved_viewport(SavedViewport {
            zoom: 40,
            ..world.saved_viewport()
        });
        decoded.towns_mut()[0].sign = Default::default();

        after_load(&mut decoded, ctx(GameMode::Normal)).unwrap();

        assert_eq!(decoded.options().road_side, 1);
        assert_eq!(decoded.towns()[0].sign, world.towns()[0].sign);
        assert_eq!(decoded.town_at(TileIndex(9)).unwrap().name, "Hatby");
        assert!(decoded.player(Owner(0)).unwrap().is_active);
        assert_eq!(decoded.saved_viewport().zoom, SavedViewport::MAX_ZOOM);
        assert_eq!(decoded.saved_viewport().scroll, world.saved_viewport().scroll);
    }

    #[test]
    fn network_clients_get_no_default_player() {
        let mut world = World::new(4, 4);
        let client = AfterLoadContext {
            mode: GameMode::Editor,
            create_default_player: false,
        };
        after_load(&mut world, client).unwrap();
        assert!(world.players().iter().all(|p| !p.is_active));
    }
}
