use crate::driver::{DirtyRect, Driver, FrameReport, MainLoopExit, VideoDriver, run_tick};
use crate::options::DriverParams;

/// Headless presentation driver that reports progress through the log.
///
/// Params: `interval=N` logs every N frames (default 100), `frames=N`
/// stops after N frames (default 0, run until quit).
#[derive(Debug, Default)]
pub struct TextVideo {
    interval: u64,
    frame_limit: u64,
    frames: u64,
    redraws: u64,
    width: u32,
    height: u32,
}

impl TextVideo {
    pub fn boxed() -> Box<dyn VideoDriver> {
        Box::new(Self::default())
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn redraws(&self) -> u64 {
        self.redraws
    }
}

impl Driver for TextVideo {
    fn start(&mut self, params: &DriverParams) -> Result<(), String> {
        let interval = params.get_int("interval", 100);
        if interval <= 0 {
            return Err(format!("interval must be positive, got {interval}"));
        }
        self.interval = interval as u64;
        self.frame_limit = params.get_int("frames", 0).max(0) as u64;
        self.frames = 0;
        self.redraws = 0;
        Ok(())
    }

    fn stop(&mut self) {
        tracing::debug!(frames = self.frames, redraws = self.redraws, "text video stopped");
    }
}

impl VideoDriver for TextVideo {
    fn make_dirty(&mut self, _rect: DirtyRect) {
        self.redraws += 1;
    }

    fn main_loop(&mut self, tick: &mut dyn FnMut() -> FrameReport) -> MainLoopExit {
        let screen = (self.width, self.height);
        loop {
            if self.frame_limit != 0 && self.frames >= self.frame_limit {
                return MainLoopExit::Quit;
            }
            let exit = run_tick(self, tick, screen);
            self.frames += 1;
            if self.frames % self.interval == 0 {
                tracing::info!(
                    frames = self.frames,
                    redraws = self.redraws,
                    "{}x{}",
                    self.width,
                    self.height
                );
            }
            if let Some(exit) = exit {
                return exit;
            }
        }
    }

    fn change_resolution(&mut self, width: u32, height: u32) -> bool {
        self.width = width;
        self.height = height;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::LoopControl;
    use crate::options::DriverRequest;

    #[test]
    fn counts_frames_and_redraws_until_quit() {
        let mut video = TextVideo::default();
        let params = DriverRequest::parse("text:interval=2").unwrap().unwrap().params;
        video.start(&params).unwrap();

        let mut n = 0;
        let exit = video.main_loop(&mut || {
            n += 1;
            FrameReport {
                control: if n == 5 { LoopControl::Quit } else { LoopControl::Continue },
                full_redraw: n % 2 == 0,
            }
        });
        assert_eq!(exit, MainLoopExit::Quit);
        assert_eq!(video.frames(), 5);
        assert_eq!(video.redraws(), 2);
    }

    #[test]
    fn frame_limit() {
        let mut video = TextVideo::default();
        let params = DriverRequest::parse("text:frames=7").unwrap().unwrap().params;
        video.start(&params).unwrap();
        video.main_loop(&mut FrameReport::default);
        assert_eq!(video.frames(), 7);
    }

    #[test]
    fn rejects_zero_interval() {
        let mut video = TextVideo::default();
        let params = DriverRequest::parse("text:interval=0").unwrap().unwrap().params;
        assert!(video.start(&params).is_err());
    }
}
