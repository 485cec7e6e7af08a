use crate::world::World;

/// The per-tick simulation rules, driven by the main loop when the process
/// is not part of a network game.
pub trait Simulation {
    /// One tick of regular play.
    fn tick(&mut self, world: &mut World);

    /// One tick while the scenario editor is open.
    fn editor_tick(&mut self, world: &mut World);

    /// Let computer-controlled players act.
    fn computer_players_tick(&mut self, world: &mut World);
}

/// Minimal local rules: advance the clock and the seed.
#[derive(Debug, Default)]
pub struct LocalSimulation;

impl Simulation for LocalSimulation {
    fn tick(&mut self, world: &mut World) {
        world.step();
    }

    fn editor_tick(&mut self, world: &mut World) {
        world.advance_frame();
    }

    fn computer_players_tick(&mut self, world: &mut World) {
        let active_ai = world
            .players()
            .iter()
            .filter(|p| p.is_active && p.is_ai)
            .count();
        tracing::trace!(target: "ai", active_ai, tick = world.tick(), "computer players tick");
    }
}
