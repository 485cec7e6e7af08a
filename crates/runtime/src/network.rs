use openrail_kernel::World;

/// Network lifecycle hooks consumed by the mode controller and main loop.
pub trait Network {
    /// Part of a multiplayer game, as server or client.
    fn is_networking(&self) -> bool;
    fn is_server(&self) -> bool;
    fn is_dedicated(&self) -> bool;

    fn is_client(&self) -> bool {
        self.is_networking() && !self.is_server()
    }

    /// This process wants to host games.
    fn wants_server(&self) -> bool;

    fn disconnect(&mut self);
    /// Ask connected clients to reconnect after the server reloads.
    fn reboot(&mut self);
    fn close_udp(&mut self);
    fn start_server(&mut self);
    /// Stop wanting to host.
    fn relinquish_server(&mut self);
    fn set_map_name(&mut self, name: &str);

    /// Server-list housekeeping, run every tick.
    fn udp_game_loop(&mut self);
    /// Multiplayer tick, replacing the local state tick while networking.
    fn game_loop(&mut self, world: &mut World);
    /// Count down a pending reconnect. Returns `true` when it fires.
    fn poll_reconnect(&mut self) -> bool;
}

/// Single-player stand-in: never networking.
#[derive(Debug, Default)]
pub struct OfflineNetwork {
    dedicated: bool,
}

impl OfflineNetwork {
    pub fn new(dedicated: bool) -> Self {
        Self { dedicated }
    }
}

impl Network for OfflineNetwork {
    fn is_networking(&self) -> bool {
        false
    }

    fn is_server(&self) -> bool {
        false
    }

    fn is_dedicated(&self) -> bool {
        self.dedicated
    }

    fn wants_server(&self) -> bool {
        false
    }

    fn disconnect(&mut self) {}

    fn reboot(&mut self) {}

    fn close_udp(&mut self) {}

    fn start_server(&mut self) {}

    fn relinquish_server(&mut self) {}

    fn set_map_name(&mut self, name: &str) {
        tracing::trace!(target: "net", name, "map name ignored offline");
    }

    fn udp_game_loop(&mut self) {}

    fn game_loop(&mut self, _world: &mut World) {}

    fn poll_reconnect(&mut self) -> bool {
        false
    }
}
