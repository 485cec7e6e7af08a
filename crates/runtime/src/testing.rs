//! Test doubles shared by the runtime's unit tests.

use crate::config::RuntimeConfig;
use crate::context::{Services, Session};
use crate::network::Network;
use openrail_driver::{Driver, DriverParams, MusicDriver};
use openrail_kernel::World;
use std::cell::RefCell;
use std::rc::Rc;
use tempfile::TempDir;

pub(crate) fn config(root: &std::path::Path, dedicated: bool) -> RuntimeConfig {
    RuntimeConfig {
        save_root: root.join("home"),
        data_dir: root.join("data"),
        seed: Some(11),
        map_width: 32,
        map_height: 32,
        town_count: 3,
        dedicated,
        ..RuntimeConfig::default()
    }
}

pub(crate) fn session(dedicated: bool) -> (TempDir, Session) {
    let tmp = tempfile::tempdir().unwrap();
    let config = config(tmp.path(), dedicated);
    let services = Services::local(&config).unwrap();
    (tmp, Session::new(config, services))
}

#[derive(Debug, Clone, Default)]
pub(crate) struct NetLog(Rc<RefCell<Vec<String>>>);

impl NetLog {
    pub(crate) fn push(&self, entry: impl Into<String>) {
        self.0.borrow_mut().push(entry.into());
    }

    pub(crate) fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.0.borrow_mut())
    }
}

/// Records lifecycle calls, skipping the per-tick ones unless asked.
pub(crate) struct RecordingNetwork {
    log: NetLog,
    networking: bool,
    server: bool,
    pub(crate) log_ticks: bool,
    pub(crate) reconnect_in: u32,
}

impl RecordingNetwork {
    pub(crate) fn server(log: NetLog) -> Self {
        Self {
            log,
            networking: true,
            server: true,
            log_ticks: false,
            reconnect_in: 0,
        }
    }

    pub(crate) fn offline(log: NetLog) -> Self {
        Self {
            log,
            networking: false,
            server: false,
            log_ticks: true,
            reconnect_in: 0,
        }
    }
}

impl Network for RecordingNetwork {
    fn is_networking(&self) -> bool {
        self.networking
    }

    fn is_server(&self) -> bool {
        self.server
    }

    fn is_dedicated(&self) -> bool {
        false
    }

    fn wants_server(&self) -> bool {
        self.server
    }

    fn disconnect(&mut self) {
        self.log.push("disconnect");
    }

    fn reboot(&mut self) {
        self.log.push("reboot");
    }

    fn close_udp(&mut self) {
        self.log.push("close_udp");
    }

    fn start_server(&mut self) {
        self.log.push("start_server");
    }

    fn relinquish_server(&mut self) {
        self.log.push("relinquish_server");
    }

    fn set_map_name(&mut self, name: &str) {
        self.log.push(format!("map_name {name}"));
    }

    fn udp_game_loop(&mut self) {
        if self.log_ticks {
            self.log.push("udp");
        }
    }

    fn game_loop(&mut self, world: &mut World) {
        if self.log_ticks {
            self.log.push(format!("net_tick {}", world.tick()));
        }
    }

    fn poll_reconnect(&mut self) -> bool {
        if self.reconnect_in == 0 {
            return false;
        }
        self.reconnect_in -= 1;
        if self.reconnect_in == 0 {
            self.log.push("reconnect");
            return true;
        }
        false
    }
}

/// Music driver that records what it was asked to play.
#[derive(Default)]
pub(crate) struct RecordingMusic {
    pub(crate) log: NetLog,
    playing: bool,
}

impl Driver for RecordingMusic {
    fn start(&mut self, _params: &DriverParams) -> Result<(), String> {
        Ok(())
    }

    fn stop(&mut self) {}
}

impl MusicDriver for RecordingMusic {
    fn play_song(&mut self, name: &str) {
        self.log.push(format!("play {name}"));
        self.playing = true;
    }

    fn stop_song(&mut self) {
        self.log.push("stop");
        self.playing = false;
    }

    fn is_song_playing(&self) -> bool {
        self.playing
    }

    fn set_volume(&mut self, _volume: u8) {}
}

thread_local! {
    static MUSIC_LOG: RefCell<Option<NetLog>> = const { RefCell::new(None) };
}

/// Route music created by [`recording_music`] on this thread to `log`.
pub(crate) fn install_music_log(log: NetLog) {
    MUSIC_LOG.with(|slot| *slot.borrow_mut() = Some(log));
}

pub(crate) fn recording_music() -> Box<dyn MusicDriver> {
    let log = MUSIC_LOG.with(|slot| slot.borrow().clone()).unwrap_or_default();
    Box::new(RecordingMusic { log, playing: false })
}
