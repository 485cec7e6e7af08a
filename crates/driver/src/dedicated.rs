use crate::driver::{DirtyRect, Driver, FrameReport, MainLoopExit, VideoDriver, run_tick};
use crate::options::DriverParams;
use std::time::{Duration, Instant};

const DEFAULT_TICK_MS: i64 = 30;

/// Presentation driver for dedicated servers: no screen, real-time ticks.
#[derive(Debug, Default)]
pub struct DedicatedVideo {
    tick_length: Duration,
}

impl DedicatedVideo {
    pub fn boxed() -> Box<dyn VideoDriver> {
        Box::new(Self::default())
    }
}

impl Driver for DedicatedVideo {
    fn start(&mut self, params: &DriverParams) -> Result<(), String> {
        let ms = params.get_int("tick_ms", DEFAULT_TICK_MS).max(0) as u64;
        self.tick_length = Duration::from_millis(ms);
        tracing::info!(tick_ms = ms, "dedicated server video started");
        Ok(())
    }

    fn stop(&mut self) {}
}

impl VideoDriver for DedicatedVideo {
    fn make_dirty(&mut self, _rect: DirtyRect) {}

    fn main_loop(&mut self, tick: &mut dyn FnMut() -> FrameReport) -> MainLoopExit {
        let mut next = Instant::now();
        loop {
            if let Some(exit) = run_tick(self, tick, (0, 0)) {
                return exit;
            }
            next += self.tick_length;
            let now = Instant::now();
            if next > now {
                std::thread::sleep(next - now);
            } else {
                // Fell behind; don't try to catch up in a burst.
                next = now;
            }
        }
    }

    fn change_resolution(&mut self, _width: u32, _height: u32) -> bool {
        false
    }
}
