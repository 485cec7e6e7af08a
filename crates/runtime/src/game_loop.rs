//! Main loop orchestration: the fixed sequence run once per tick.

use crate::context::Session;
use crate::interface::{Notice, ScreenshotKind};
use openrail_common::{GameDate, GameMode, Owner};
use openrail_driver::{DriverClass, FrameReport, LoopControl, MusicDriver};
use openrail_persist::{AUTOSAVE_SLOTS, save_game};

impl Session {
    /// Run one tick. Called by the video driver's main loop.
    ///
    /// Order: autosave, screenshot, pending mode switch, interface timers,
    /// network and state tick, palette animation, input and music.
    pub fn game_loop(&mut self, music: &mut DriverClass<dyn MusicDriver>) -> FrameReport {
        if self.interface.take_autosave_request() {
            self.do_autosave();
        }

        if let Some(kind) = self.interface.take_screenshot_request() {
            self.take_screenshot(kind);
        }

        while let Ok(request) = self.inbox.try_recv() {
            self.mode.request(request);
        }
        if let Some(request) = self.mode.take_pending() {
            if let Err(err) = self.switch_mode(request.clone()) {
                tracing::warn!(error = %err, requested = %request.target, "mode switch deferred");
                self.mode.request(request);
            }
        }

        self.interface.tick_timers();

        self.services.network.udp_game_loop();
        if self.services.network.is_networking() {
            self.services.network.game_loop(&mut self.world);
        } else {
            if self.services.network.poll_reconnect() {
                tracing::info!(target: "net", "reconnecting to last server");
            }
            self.state_game_loop();
        }

        if !self.is_paused() && self.config.full_animation {
            self.interface.animate_palette();
            self.interface.mark_whole_screen_dirty();
        }

        let moved = self.interface.sample_cursor();
        if moved != glam::IVec2::ZERO {
            tracing::trace!(dx = moved.x, dy = moved.y, "cursor moved");
        }
        self.jukebox
            .update(music, self.mode.current() != GameMode::Menu);

        let control = if self.quit_requested {
            LoopControl::Quit
        } else if !self.driver_switches.is_empty() {
            LoopControl::SwitchDriver
        } else {
            LoopControl::Continue
        };
        FrameReport {
            control,
            full_redraw: self.interface.take_full_redraw(),
        }
    }

    /// The local simulation tick. Skipped while paused, and shares the
    /// mode controller's reentrancy guard.
    pub(crate) fn state_game_loop(&mut self) {
        if self.is_paused() {
            return;
        }
        if let Err(err) = self.mode.enter() {
            tracing::warn!(error = %err, "state tick skipped");
            return;
        }

        let sim = &mut self.services.simulation;
        if self.mode.current() == GameMode::Editor {
            sim.editor_tick(&mut self.world);
        } else {
            let before = self.world.date();
            sim.tick(&mut self.world);
            if !self.config.disable_computer {
                sim.computer_players_tick(&mut self.world);
            }
            self.check_autosave_due(before);
        }
        self.frame_counter += 1;
        tracing::trace!(tick = self.world.tick(), "state tick");

        self.mode.leave();
    }

    fn check_autosave_due(&mut self, before: GameDate) {
        let (year, month, _) = self.world.date().ymd();
        let (prev_year, prev_month, _) = before.ymd();
        let interval = self.config.autosave_months;
        if (year, month) == (prev_year, prev_month)
            || interval == 0
            || self.mode.current() != GameMode::Normal
        {
            return;
        }
        if (month - 1) % interval == 0 {
            self.interface.request_autosave();
        }
    }

    fn do_autosave(&mut self) {
        let files = &self.services.files;
        let named = self.config.keep_all_autosave && self.local_player != Owner::SPECTATOR;
        let path = match self.world.player(self.local_player).filter(|_| named) {
            Some(player) => files.named_autosave_path(&player.name, self.world.date()),
            None => {
                let slot = self.autosave_slot;
                self.autosave_slot = (slot + 1) % AUTOSAVE_SLOTS;
                files.rotating_autosave_path(slot)
            }
        };
        tracing::debug!(target: "misc", path = %path.display(), "autosaving");

        self.world.set_saved_viewport(self.viewport.saved());
        if let Err(err) = save_game(&path, &self.world) {
            self.interface.notify(Notice::AutosaveFailed(err.to_string()));
        }
    }

    fn take_screenshot(&mut self, kind: ScreenshotKind) {
        let dir = self.services.files.screenshot_dir();
        let shots = &mut self.services.screenshots;
        let result = match kind {
            ScreenshotKind::Small => shots.small(&self.world, &self.viewport, &dir),
            ScreenshotKind::World => shots.world(&self.world, &dir),
        };
        match result {
            Ok(path) => self.interface.inform(Notice::ScreenshotSaved(path)),
            Err(err) => self.interface.notify(Notice::ScreenshotFailed(err.to_string())),
        }
    }
}
