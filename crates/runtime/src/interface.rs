//! Presentation-side state the main loop maintains between ticks.

use glam::{IVec2, UVec2};
use openrail_driver::{DriverClass, MusicDriver};
use openrail_kernel::SavedViewport;
use std::fmt;
use std::path::PathBuf;

/// Tile edge in screen pixels at zoom 0.
const TILE_PIXELS: u32 = 16;

/// Message shown to the player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    GameLoadFailed(String),
    GameSaveFailed(String),
    AutosaveFailed(String),
    ScreenshotSaved(PathBuf),
    ScreenshotFailed(String),
    /// Error queued by whoever requested the last mode switch.
    SwitchError(String),
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GameLoadFailed(reason) => write!(f, "game load failed: {reason}"),
            Self::GameSaveFailed(reason) => write!(f, "game save failed: {reason}"),
            Self::AutosaveFailed(reason) => write!(f, "autosave failed: {reason}"),
            Self::ScreenshotSaved(path) => write!(f, "screenshot saved as {}", path.display()),
            Self::ScreenshotFailed(reason) => write!(f, "screenshot failed: {reason}"),
            Self::SwitchError(msg) => f.write_str(msg),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenshotKind {
    /// What the main viewport shows.
    Small,
    /// The whole map.
    World,
}

/// Main viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    /// Top-left corner in world pixels.
    pub scroll: IVec2,
    pub zoom: u8,
    /// Screen size in pixels.
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            scroll: IVec2::ZERO,
            zoom: 0,
            width,
            height,
        }
    }

    pub fn virtual_width(&self) -> u32 {
        zoomed(self.width, self.zoom)
    }

    pub fn virtual_height(&self) -> u32 {
        zoomed(self.height, self.zoom)
    }

    pub fn saved(&self) -> SavedViewport {
        SavedViewport {
            scroll: self.scroll,
            zoom: self.zoom,
        }
    }

    pub fn restore(&mut self, saved: SavedViewport) {
        let saved = saved.clamped();
        self.scroll = saved.scroll;
        self.zoom = saved.zoom;
    }

    /// Tiles covered by the viewport: `(origin, size)`, clipped to the map.
    pub fn visible_tiles(&self, map: UVec2) -> (UVec2, UVec2) {
        let origin = (self.scroll.max(IVec2::ZERO).as_uvec2() / TILE_PIXELS).min(map);
        let size = UVec2::new(
            self.virtual_width().div_ceil(TILE_PIXELS),
            self.virtual_height().div_ceil(TILE_PIXELS),
        );
        (origin, size.min(map - origin))
    }
}

fn zoomed(pixels: u32, zoom: u8) -> u32 {
    pixels
        .checked_shl(u32::from(zoom))
        .filter(|v| v >> zoom == pixels)
        .unwrap_or(u32::MAX)
}

/// Pointer state sampled once per tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cursor {
    pub pos: IVec2,
    pub delta: IVec2,
    pub anim_frame: u32,
}

impl Cursor {
    pub fn move_to(&mut self, pos: IVec2) {
        self.delta += pos - self.pos;
        self.pos = pos;
    }
}

/// Flags and timers shared between the tick and the user interface.
#[derive(Debug, Default)]
pub struct Interface {
    notices: Vec<Notice>,
    autosave_requested: bool,
    screenshot_requested: Option<ScreenshotKind>,
    full_redraw: bool,
    save_dialog_open: bool,
    scroller_click_timeout: u8,
    caret_timer: u8,
    timer_counter: u16,
    palette_phase: u32,
    cursor: Cursor,
}

impl Interface {
    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    pub(crate) fn notify(&mut self, notice: Notice) {
        tracing::warn!("{notice}");
        self.notices.push(notice);
    }

    pub(crate) fn inform(&mut self, notice: Notice) {
        tracing::info!("{notice}");
        self.notices.push(notice);
    }

    pub fn request_autosave(&mut self) {
        self.autosave_requested = true;
    }

    pub fn autosave_requested(&self) -> bool {
        self.autosave_requested
    }

    pub(crate) fn take_autosave_request(&mut self) -> bool {
        std::mem::take(&mut self.autosave_requested)
    }

    pub fn request_screenshot(&mut self, kind: ScreenshotKind) {
        self.screenshot_requested = Some(kind);
    }

    pub fn screenshot_requested(&self) -> Option<ScreenshotKind> {
        self.screenshot_requested
    }

    pub(crate) fn take_screenshot_request(&mut self) -> Option<ScreenshotKind> {
        self.screenshot_requested.take()
    }

    pub fn mark_whole_screen_dirty(&mut self) {
        self.full_redraw = true;
    }

    pub(crate) fn take_full_redraw(&mut self) -> bool {
        std::mem::take(&mut self.full_redraw)
    }

    pub fn open_save_dialog(&mut self) {
        self.save_dialog_open = true;
    }

    pub fn save_dialog_open(&self) -> bool {
        self.save_dialog_open
    }

    pub(crate) fn close_save_dialog(&mut self) {
        self.save_dialog_open = false;
    }

    pub fn scroller_click_timeout(&self) -> u8 {
        self.scroller_click_timeout
    }

    pub fn caret_timer(&self) -> u8 {
        self.caret_timer
    }

    pub fn timer_counter(&self) -> u16 {
        self.timer_counter
    }

    pub fn palette_phase(&self) -> u32 {
        self.palette_phase
    }

    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    pub fn cursor_mut(&mut self) -> &mut Cursor {
        &mut self.cursor
    }

    pub(crate) fn tick_timers(&mut self) {
        self.scroller_click_timeout = self.scroller_click_timeout.saturating_sub(3);
        self.caret_timer = self.caret_timer.wrapping_add(3);
        self.timer_counter = self.timer_counter.wrapping_add(8);
        self.cursor.anim_frame = self.cursor.anim_frame.wrapping_add(1);
    }

    pub(crate) fn animate_palette(&mut self) {
        self.palette_phase = self.palette_phase.wrapping_add(1);
    }

    /// Consume the pointer movement accumulated since the last sample.
    pub(crate) fn sample_cursor(&mut self) -> IVec2 {
        std::mem::take(&mut self.cursor.delta)
    }
}

/// Walks the playlist on the active music driver.
#[derive(Debug, Default)]
pub struct Jukebox {
    title_theme: String,
    playlist: Vec<String>,
    position: usize,
    pub(crate) reset_pending: bool,
}

impl Jukebox {
    pub fn new(title_theme: impl Into<String>, playlist: Vec<String>) -> Self {
        Self {
            title_theme: title_theme.into(),
            playlist,
            position: 0,
            reset_pending: false,
        }
    }

    /// Restart with the title theme on the next update.
    pub fn request_reset(&mut self) {
        self.reset_pending = true;
    }

    pub(crate) fn update(&mut self, music: &mut DriverClass<dyn MusicDriver>, outside_menu: bool) {
        let Some(driver) = music.active_mut() else {
            return;
        };
        if std::mem::take(&mut self.reset_pending) {
            driver.stop_song();
            self.position = 0;
            if !self.title_theme.is_empty() {
                driver.play_song(&self.title_theme);
            }
        }
        if outside_menu && !self.playlist.is_empty() && !driver.is_song_playing() {
            let song = &self.playlist[self.position % self.playlist.len()];
            tracing::debug!(song = song.as_str(), "starting next song");
            driver.play_song(song);
            self.position = (self.position + 1) % self.playlist.len();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timers_advance_per_tick() {
        let mut ui = Interface::default();
        ui.scroller_click_timeout = 5;
        ui.tick_timers();
        assert_eq!(ui.scroller_click_timeout(), 2);
        ui.tick_timers();
        assert_eq!(ui.scroller_click_timeout(), 0);
        assert_eq!(ui.caret_timer(), 6);
        assert_eq!(ui.timer_counter(), 16);
        assert_eq!(ui.cursor().anim_frame, 2);
    }

    #[test]
    fn requests_are_taken_once() {
        let mut ui = Interface::default();
        ui.request_autosave();
        ui.request_screenshot(ScreenshotKind::World);
        assert!(ui.take_autosave_request());
        assert!(!ui.take_autosave_request());
        assert_eq!(ui.take_screenshot_request(), Some(ScreenshotKind::World));
        assert_eq!(ui.take_screenshot_request(), None);
    }

    #[test]
    fn cursor_delta_is_consumed_by_sampling() {
        let mut ui = Interface::default();
        ui.cursor_mut().move_to(IVec2::new(4, 2));
        ui.cursor_mut().move_to(IVec2::new(5, 5));
        assert_eq!(ui.sample_cursor(), IVec2::new(5, 5));
        assert_eq!(ui.sample_cursor(), IVec2::ZERO);
    }

    #[test]
    fn viewport_save_and_visible_area() {
        let mut vp = Viewport::new(64, 32);
        vp.scroll = IVec2::new(32, 16);
        vp.zoom = 1;
        assert_eq!(vp.virtual_width(), 128);
        let saved = vp.saved();

        let mut other = Viewport::new(64, 32);
        other.restore(saved);
        assert_eq!(other, vp);

        let (origin, size) = vp.visible_tiles(UVec2::new(8, 8));
        assert_eq!(origin, UVec2::new(2, 1));
        assert_eq!(size, UVec2::new(6, 4));
    }

    #[test]
    fn oversized_zoom_saturates_instead_of_overflowing() {
        let mut vp = Viewport::new(640, 480);
        vp.zoom = 40;
        assert_eq!(vp.virtual_width(), u32::MAX);
        vp.zoom = 30;
        assert_eq!(vp.virtual_height(), u32::MAX);
        let (origin, size) = vp.visible_tiles(UVec2::new(16, 16));
        assert_eq!((origin, size), (UVec2::ZERO, UVec2::new(16, 16)));

        let mut restored = Viewport::new(640, 480);
        restored.restore(SavedViewport { scroll: IVec2::ZERO, zoom: 200 });
        assert_eq!(restored.zoom, SavedViewport::MAX_ZOOM);
    }
}
