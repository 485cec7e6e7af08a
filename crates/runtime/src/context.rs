use crate::config::{ConfigError, RuntimeConfig};
use crate::interface::{Interface, Jukebox, Notice, ScreenshotKind, Viewport};
use crate::mode::{ModeController, ModeRequest, ModeRequestSender};
use crate::network::{Network, OfflineNetwork};
use crate::screenshot::{Screenshots, TextScreenshots};
use crossbeam_channel::{Receiver, Sender};
use openrail_common::{GameMode, Owner};
use openrail_driver::{DriverError, DriverKind, DriverRegistry, MainLoopExit};
use openrail_kernel::{
    GenerateMode, LocalSimulation, Simulation, TerrainConfig, TerrainGenerator, World, WorldGen,
};
use openrail_persist::SaveFiles;

/// External collaborators the runtime drives but does not implement.
pub struct Services {
    pub network: Box<dyn Network>,
    pub worldgen: Box<dyn WorldGen>,
    pub simulation: Box<dyn Simulation>,
    pub screenshots: Box<dyn Screenshots>,
    pub files: SaveFiles,
}

impl Services {
    /// Single-player services built from `config`.
    pub fn local(config: &RuntimeConfig) -> Result<Self, ConfigError> {
        let terrain = TerrainConfig {
            width: config.map_width,
            height: config.map_height,
            town_count: config.town_count,
            starting_year: config.starting_year,
            ..TerrainConfig::default()
        };
        let seed = config.seed.unwrap_or_else(clock_seed);
        Ok(Self {
            network: Box::new(OfflineNetwork::new(config.dedicated)),
            worldgen: Box::new(TerrainGenerator::new(terrain, seed)?),
            simulation: Box::new(LocalSimulation),
            screenshots: Box::new(TextScreenshots::new()),
            files: SaveFiles::open(&config.save_root, &config.data_dir)?,
        })
    }
}

fn clock_seed() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

/// Everything that changes from tick to tick: the world, the current mode
/// and the interface state around it.
pub struct Session {
    pub(crate) config: RuntimeConfig,
    pub(crate) services: Services,
    pub(crate) world: World,
    pub(crate) mode: ModeController,
    pub(crate) interface: Interface,
    pub(crate) viewport: Viewport,
    pub(crate) jukebox: Jukebox,
    pub(crate) local_player: Owner,
    pub(crate) pause: u8,
    pub(crate) frame_counter: u64,
    pub(crate) autosave_slot: u8,
    pub(crate) inbox: Receiver<ModeRequest>,
    outbox: Sender<ModeRequest>,
    pub(crate) driver_switches: Vec<(DriverKind, String)>,
    pub(crate) quit_requested: bool,
}

impl Session {
    /// A session in the menu, with the intro world queued to load on the
    /// first tick.
    pub fn new(config: RuntimeConfig, mut services: Services) -> Self {
        let world = services.worldgen.generate(GenerateMode::Editor);
        let (outbox, inbox) = crossbeam_channel::unbounded();
        let [width, height] = config.resolution;
        let jukebox = Jukebox::new(config.title_theme.clone(), config.playlist.clone());
        Self {
            config,
            services,
            world,
            mode: ModeController::new(),
            interface: Interface::default(),
            viewport: Viewport::new(width, height),
            jukebox,
            local_player: Owner(0),
            pause: 0,
            frame_counter: 0,
            autosave_slot: 0,
            inbox,
            outbox,
            driver_switches: Vec::new(),
            quit_requested: false,
        }
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut RuntimeConfig {
        &mut self.config
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn mode(&self) -> GameMode {
        self.mode.current()
    }

    pub fn controller(&self) -> &ModeController {
        &self.mode
    }

    pub fn local_player(&self) -> Owner {
        self.local_player
    }

    pub fn files(&self) -> &SaveFiles {
        &self.services.files
    }

    pub fn interface(&self) -> &Interface {
        &self.interface
    }

    pub fn interface_mut(&mut self) -> &mut Interface {
        &mut self.interface
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn notices(&self) -> &[Notice] {
        self.interface.notices()
    }

    pub fn frame_counter(&self) -> u64 {
        self.frame_counter
    }

    pub fn is_paused(&self) -> bool {
        self.pause > 0
    }

    /// Pausing nests: every `pause` needs a matching `unpause`.
    pub fn pause(&mut self) {
        self.pause = self.pause.saturating_add(1);
    }

    pub fn unpause(&mut self) {
        self.pause = self.pause.saturating_sub(1);
    }

    /// Queue a mode switch for the next tick. A later request replaces an
    /// earlier one that has not run yet.
    pub fn request_mode(&mut self, request: ModeRequest) {
        self.mode.request(request);
    }

    /// Handle for queueing mode switches from other threads.
    pub fn mode_sender(&self) -> ModeRequestSender {
        ModeRequestSender::new(self.outbox.clone())
    }

    /// Error to show once the next mode switch has run.
    pub fn set_switch_error(&mut self, message: impl Into<String>) {
        self.mode.set_switch_error(message.into());
    }

    pub fn request_autosave(&mut self) {
        self.interface.request_autosave();
    }

    pub fn request_screenshot(&mut self, kind: ScreenshotKind) {
        self.interface.request_screenshot(kind);
    }

    pub fn request_quit(&mut self) {
        self.quit_requested = true;
    }

    /// Replace a driver once the current main loop has returned.
    pub fn queue_driver_switch(&mut self, kind: DriverKind, spec: impl Into<String>) {
        self.driver_switches.push((kind, spec.into()));
    }

    pub(crate) fn take_driver_switches(&mut self) -> Vec<(DriverKind, String)> {
        std::mem::take(&mut self.driver_switches)
    }

    pub(crate) fn install_world(&mut self, world: World) {
        self.viewport.restore(world.saved_viewport());
        self.world = world;
        self.interface.mark_whole_screen_dirty();
    }
}

/// The running program: drivers plus the session they present.
pub struct RuntimeContext {
    pub drivers: DriverRegistry,
    pub session: Session,
}

impl RuntimeContext {
    pub fn new(drivers: DriverRegistry, session: Session) -> Self {
        Self { drivers, session }
    }

    /// Start sound and music, then video, using the configured driver
    /// strings.
    pub fn start_drivers(&mut self) -> Result<(), DriverError> {
        let config = self.session.config.clone();
        self.drivers.load(DriverKind::Sound, &config.sound_driver)?;
        self.drivers.load(DriverKind::Music, &config.music_driver)?;
        self.drivers.load(DriverKind::Video, &config.video_driver)?;
        self.apply_resolution();
        Ok(())
    }

    fn apply_resolution(&mut self) {
        let [width, height] = self.session.config.resolution;
        if let Some(video) = self.drivers.video.active_mut() {
            if !video.change_resolution(width, height) {
                tracing::debug!(width, height, "video driver kept its resolution");
            }
        }
    }

    pub fn request_mode(&mut self, request: ModeRequest) {
        self.session.request_mode(request);
    }

    /// Run the video driver's main loop until it quits, applying queued
    /// driver switches between runs.
    pub fn run(&mut self) -> Result<(), DriverError> {
        loop {
            let video = self.drivers.video.require_mut()?;
            let music = &mut self.drivers.music;
            let session = &mut self.session;
            let exit = video.main_loop(&mut || session.game_loop(music));
            match exit {
                MainLoopExit::Quit => return Ok(()),
                MainLoopExit::SwitchDriver => self.apply_driver_switches()?,
            }
        }
    }

    fn apply_driver_switches(&mut self) -> Result<(), DriverError> {
        for (kind, spec) in self.session.take_driver_switches() {
            tracing::info!(%kind, spec = spec.as_str(), "switching driver");
            self.drivers.load(kind, &spec)?;
            if kind == DriverKind::Video {
                self.apply_resolution();
            }
        }
        Ok(())
    }

    pub fn shutdown(&mut self) {
        self.drivers.shutdown();
    }
}
