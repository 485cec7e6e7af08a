//! Backends that do nothing. Used for tests, benchmarks and machines
//! without audio.

use crate::driver::{DirtyRect, Driver, FrameReport, MainLoopExit, MusicDriver, SoundDriver, VideoDriver, run_tick};
use crate::options::DriverParams;

const DEFAULT_TICKS: i64 = 1000;

/// Runs a fixed number of ticks as fast as possible, then quits.
#[derive(Debug, Default)]
pub struct NullVideo {
    ticks: u64,
    width: u32,
    height: u32,
}

impl NullVideo {
    pub fn boxed() -> Box<dyn VideoDriver> {
        Box::new(Self::default())
    }
}

impl Driver for NullVideo {
    fn start(&mut self, params: &DriverParams) -> Result<(), String> {
        self.ticks = params.get_int("ticks", DEFAULT_TICKS).max(0) as u64;
        Ok(())
    }

    fn stop(&mut self) {}
}

impl VideoDriver for NullVideo {
    fn make_dirty(&mut self, _rect: DirtyRect) {}

    fn main_loop(&mut self, tick: &mut dyn FnMut() -> FrameReport) -> MainLoopExit {
        let screen = (self.width, self.height);
        for _ in 0..self.ticks {
            if let Some(exit) = run_tick(self, tick, screen) {
                return exit;
            }
        }
        MainLoopExit::Quit
    }

    fn change_resolution(&mut self, width: u32, height: u32) -> bool {
        self.width = width;
        self.height = height;
        true
    }
}

#[derive(Debug, Default)]
pub struct NullSound;

impl NullSound {
    pub fn boxed() -> Box<dyn SoundDriver> {
        Box::new(Self)
    }
}

impl Driver for NullSound {
    fn start(&mut self, _params: &DriverParams) -> Result<(), String> {
        Ok(())
    }

    fn stop(&mut self) {}
}

impl SoundDriver for NullSound {
    fn play_effect(&mut self, _effect: u32) {}
}

/// Always claims a song is playing so the jukebox never queues one.
#[derive(Debug, Default)]
pub struct NullMusic;

impl NullMusic {
    pub fn boxed() -> Box<dyn MusicDriver> {
        Box::new(Self)
    }
}

impl Driver for NullMusic {
    fn start(&mut self, _params: &DriverParams) -> Result<(), String> {
        Ok(())
    }

    fn stop(&mut self) {}
}

impl MusicDriver for NullMusic {
    fn play_song(&mut self, _name: &str) {}

    fn stop_song(&mut self) {}

    fn is_song_playing(&self) -> bool {
        true
    }

    fn set_volume(&mut self, _volume: u8) {}
}
