use crate::options::DriverParams;

/// Lifecycle shared by every backend.
pub trait Driver {
    /// Bring the backend up. The error string is shown to the user as is.
    fn start(&mut self, params: &DriverParams) -> Result<(), String>;
    fn stop(&mut self);
}

/// Screen area needing a repaint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirtyRect {
    pub left: i32,
    pub top: i32,
    pub width: u32,
    pub height: u32,
}

impl DirtyRect {
    pub fn full(width: u32, height: u32) -> Self {
        Self {
            left: 0,
            top: 0,
            width,
            height,
        }
    }
}

/// What the loop should do after a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopControl {
    #[default]
    Continue,
    Quit,
    /// Leave the main loop so queued driver switches can be applied.
    SwitchDriver,
}

/// Result of one orchestrated tick, as seen by the presentation driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameReport {
    pub control: LoopControl,
    /// The whole screen must be repainted.
    pub full_redraw: bool,
}

/// Why a presentation driver's main loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MainLoopExit {
    Quit,
    SwitchDriver,
}

/// Presentation backend. Owns the main loop and calls `tick` once per
/// simulation tick.
pub trait VideoDriver: Driver {
    fn make_dirty(&mut self, rect: DirtyRect);
    fn main_loop(&mut self, tick: &mut dyn FnMut() -> FrameReport) -> MainLoopExit;
    /// Returns `false` if the backend cannot switch to the given size.
    fn change_resolution(&mut self, width: u32, height: u32) -> bool;
}

/// Sample playback backend.
pub trait SoundDriver: Driver {
    fn play_effect(&mut self, effect: u32);
}

/// Music playback backend.
pub trait MusicDriver: Driver {
    fn play_song(&mut self, name: &str);
    fn stop_song(&mut self);
    fn is_song_playing(&self) -> bool;
    fn set_volume(&mut self, volume: u8);
}

/// Shared loop body for presentation backends: run one tick and translate
/// its report.
pub(crate) fn run_tick<V: VideoDriver + ?Sized>(
    video: &mut V,
    tick: &mut dyn FnMut() -> FrameReport,
    screen: (u32, u32),
) -> Option<MainLoopExit> {
    let report = tick();
    if report.full_redraw {
        video.make_dirty(DirtyRect::full(screen.0, screen.1));
    }
    match report.control {
        LoopControl::Continue => None,
        LoopControl::Quit => Some(MainLoopExit::Quit),
        LoopControl::SwitchDriver => Some(MainLoopExit::SwitchDriver),
    }
}
