//! Mode controller.
//!
//! Transitions are requested at any time but only run from the main loop,
//! one per tick, under a reentrancy guard shared with the local state tick.

use crate::context::Session;
use crate::interface::Notice;
use crossbeam_channel::Sender;
use openrail_common::{GameMode, Owner, SwitchMode};
use openrail_kernel::GenerateMode;
use openrail_persist::{AfterLoadContext, LoadFailure, load_game, save_game};
use std::path::{Path, PathBuf};

/// A requested transition and the file it acts on, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModeRequest {
    pub target: SwitchMode,
    pub file: Option<PathBuf>,
}

impl ModeRequest {
    pub fn new(target: SwitchMode) -> Self {
        Self { target, file: None }
    }

    pub fn with_file(target: SwitchMode, file: impl Into<PathBuf>) -> Self {
        Self {
            target,
            file: Some(file.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModeError {
    #[error("a mode transition or state tick is already in progress")]
    TransitionInProgress,
}

/// Cloneable, `Send` handle that queues mode requests for the session.
#[derive(Debug, Clone)]
pub struct ModeRequestSender(Sender<ModeRequest>);

impl ModeRequestSender {
    pub(crate) fn new(sender: Sender<ModeRequest>) -> Self {
        Self(sender)
    }

    /// Returns `false` if the session is gone.
    pub fn send(&self, request: ModeRequest) -> bool {
        self.0.send(request).is_ok()
    }
}

/// Current mode, the single pending request and the reentrancy guard.
#[derive(Debug)]
pub struct ModeController {
    current: GameMode,
    pending: Option<ModeRequest>,
    in_transition: bool,
    switch_error: Option<String>,
}

impl Default for ModeController {
    fn default() -> Self {
        Self::new()
    }
}

impl ModeController {
    /// Starts in the menu with the intro load pending.
    pub fn new() -> Self {
        Self {
            current: GameMode::Menu,
            pending: Some(ModeRequest::new(SwitchMode::Menu)),
            in_transition: false,
            switch_error: None,
        }
    }

    pub fn current(&self) -> GameMode {
        self.current
    }

    pub fn pending(&self) -> Option<&ModeRequest> {
        self.pending.as_ref()
    }

    pub fn in_transition(&self) -> bool {
        self.in_transition
    }

    pub fn request(&mut self, request: ModeRequest) {
        if let Some(replaced) = self.pending.replace(request) {
            tracing::debug!(replaced = %replaced.target, "pending mode request replaced");
        }
    }

    pub fn set_switch_error(&mut self, message: String) {
        self.switch_error = Some(message);
    }

    pub(crate) fn take_pending(&mut self) -> Option<ModeRequest> {
        self.pending.take()
    }

    pub(crate) fn take_switch_error(&mut self) -> Option<String> {
        self.switch_error.take()
    }

    pub(crate) fn enter(&mut self) -> Result<(), ModeError> {
        if self.in_transition {
            return Err(ModeError::TransitionInProgress);
        }
        self.in_transition = true;
        Ok(())
    }

    pub(crate) fn leave(&mut self) {
        self.in_transition = false;
    }

    pub(crate) fn set_current(&mut self, mode: GameMode) {
        self.current = mode;
    }
}

impl Session {
    /// Run one transition. Only the main loop calls this.
    pub(crate) fn switch_mode(&mut self, request: ModeRequest) -> Result<(), ModeError> {
        self.mode.enter()?;
        let target = request.target;
        let _span = tracing::info_span!("switch_mode", from = %self.mode.current(), to = %target).entered();

        if target != SwitchMode::Save {
            self.coordinate_network(target);
        }

        match target {
            SwitchMode::Editor => self.make_new_editor_world(),
            SwitchMode::NewGame => {
                if self.services.network.is_server() {
                    self.services.network.set_map_name("Random");
                }
                self.make_new_game();
            }
            SwitchMode::StartScenario => self.start_scenario(request.file.as_deref()),
            SwitchMode::LoadGame => self.load_saved_game(request.file.as_deref()),
            SwitchMode::LoadScenario => {
                if self.mode.current() == GameMode::Menu {
                    self.load_saved_game(request.file.as_deref());
                } else {
                    self.load_scenario(request.file.as_deref());
                }
            }
            SwitchMode::Menu => self.load_intro_game(),
            SwitchMode::Save => self.save_current_game(request.file.as_deref()),
            SwitchMode::GenerateRandomLand => self.generate_random_land(),
        }

        if let Some(message) = self.mode.take_switch_error() {
            self.interface.notify(Notice::SwitchError(message));
        }
        tracing::info!(mode = %self.mode.current(), "mode switched");
        self.mode.leave();
        Ok(())
    }

    fn coordinate_network(&mut self, target: SwitchMode) {
        let net = &mut self.services.network;
        if net.is_networking() {
            if net.is_server() && matches!(target, SwitchMode::LoadGame | SwitchMode::NewGame) {
                net.reboot();
            } else {
                net.disconnect();
            }
            net.close_udp();
        }
        if net.wants_server() {
            if target != SwitchMode::Menu {
                net.start_server();
            } else {
                net.relinquish_server();
            }
        }
    }

    /// Load `file` into `new_mode`.
    ///
    /// A file that cannot be read changes nothing. A file that reads but is
    /// rejected leaves a fresh world for the mode that was active before.
    fn safe_load(&mut self, file: Option<&Path>, new_mode: GameMode) -> Result<(), String> {
        let Some(path) = file else {
            return Err("no file selected".to_string());
        };
        let previous = self.mode.current();
        let ctx = AfterLoadContext {
            mode: new_mode,
            create_default_player: !self.services.network.is_client(),
        };
        match load_game(path, ctx) {
            Ok(loaded) => {
                self.install_world(loaded.world);
                self.mode.set_current(new_mode);
                Ok(())
            }
            Err(err) => {
                if err.disposition() == LoadFailure::Reinit {
                    match previous {
                        GameMode::Menu => self.load_intro_game(),
                        GameMode::Editor => self.make_new_editor_world(),
                        GameMode::Normal => self.make_new_game(),
                    }
                }
                Err(err.to_string())
            }
        }
    }

    fn load_saved_game(&mut self, file: Option<&Path>) {
        match self.safe_load(file, GameMode::Normal) {
            Ok(()) => {
                self.local_player = Owner(0);
                // Opening the load dialog paused the game.
                self.unpause();
                if self.services.network.is_server() {
                    self.services.network.set_map_name("Loaded game");
                }
            }
            Err(reason) => self.interface.notify(Notice::GameLoadFailed(reason)),
        }
    }

    fn load_scenario(&mut self, file: Option<&Path>) {
        match self.safe_load(file, GameMode::Editor) {
            Ok(()) => {
                self.local_player = Owner::NONE;
                self.world.clear_player_property();
                if self.services.network.is_server() {
                    self.services.network.set_map_name("Loaded scenario");
                }
            }
            Err(reason) => self.interface.notify(Notice::GameLoadFailed(reason)),
        }
    }

    fn start_scenario(&mut self, file: Option<&Path>) {
        let ctx = AfterLoadContext {
            mode: GameMode::Normal,
            create_default_player: !self.services.network.is_client(),
        };
        let result = match file {
            Some(path) => load_game(path, ctx).map_err(|e| e.to_string()),
            None => Err("no file selected".to_string()),
        };
        match result {
            Ok(loaded) => {
                self.install_world(loaded.world);
                self.mode.set_current(GameMode::Normal);
                self.local_player = Owner(0);
            }
            Err(reason) => {
                self.load_intro_game();
                self.interface.notify(Notice::GameLoadFailed(reason));
            }
        }
    }

    pub(crate) fn load_intro_game(&mut self) {
        self.mode.set_current(GameMode::Menu);
        let intro = self.services.files.intro_path();
        let ctx = AfterLoadContext {
            mode: GameMode::Menu,
            create_default_player: !self.services.network.is_client(),
        };
        match load_game(&intro, ctx) {
            Ok(loaded) => self.install_world(loaded.world),
            Err(err) => {
                tracing::debug!(path = %intro.display(), error = %err, "no intro world, generating one");
                self.world = self.services.worldgen.generate(GenerateMode::Editor);
            }
        }
        self.pause = 0;
        self.local_player = Owner(0);
        self.interface.mark_whole_screen_dirty();
        self.jukebox.request_reset();
    }

    pub(crate) fn make_new_game(&mut self) {
        self.mode.set_current(GameMode::Normal);
        self.world = self.services.worldgen.generate(GenerateMode::Game);
        self.local_player = if self.services.network.is_dedicated() {
            Owner::SPECTATOR
        } else {
            self.world.start_new_player(false).unwrap_or(Owner::SPECTATOR)
        };
        self.interface.mark_whole_screen_dirty();
    }

    pub(crate) fn make_new_editor_world(&mut self) {
        self.mode.set_current(GameMode::Editor);
        self.world = self.services.worldgen.generate(GenerateMode::Editor);
        self.local_player = Owner::NONE;
        self.interface.mark_whole_screen_dirty();
    }

    fn generate_random_land(&mut self) {
        self.world = self.services.worldgen.generate(GenerateMode::RandomLand);
        self.local_player = Owner::NONE;
        self.interface.mark_whole_screen_dirty();
    }

    fn save_current_game(&mut self, file: Option<&Path>) {
        let Some(path) = file else {
            self.interface
                .notify(Notice::GameSaveFailed("no file selected".to_string()));
            return;
        };
        self.world.set_saved_viewport(self.viewport.saved());
        match save_game(path, &self.world) {
            Ok(()) => {
                tracing::info!(path = %path.display(), "game saved");
                self.interface.close_save_dialog();
            }
            Err(err) => self.interface.notify(Notice::GameSaveFailed(err.to_string())),
        }
    }
}
