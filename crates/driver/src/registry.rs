use crate::dedicated::DedicatedVideo;
use crate::driver::{Driver, MusicDriver, SoundDriver, VideoDriver};
use crate::null::{NullMusic, NullSound, NullVideo};
use crate::options::{DriverParams, DriverRequest, OptionError};
use crate::text::TextVideo;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DriverKind {
    Video,
    Sound,
    Music,
}

impl fmt::Display for DriverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Video => "video",
            Self::Sound => "sound",
            Self::Music => "music",
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error("invalid {kind} driver string: {source}")]
    Options {
        kind: DriverKind,
        #[source]
        source: OptionError,
    },
    #[error("no such {kind} driver: {name}")]
    UnknownDriver { kind: DriverKind, name: String },
    #[error("no {kind} driver is usable on this platform")]
    NoEligibleDriver { kind: DriverKind },
    #[error("unable to load {kind} driver '{name}' ({long_name}): {reason}")]
    StartFailed {
        kind: DriverKind,
        name: &'static str,
        long_name: &'static str,
        reason: String,
    },
    #[error("no {kind} driver is running")]
    NotStarted { kind: DriverKind },
}

/// Static description of one backend.
pub struct DriverDesc<D: ?Sized> {
    pub name: &'static str,
    pub long_name: &'static str,
    /// Higher wins when no driver is named.
    pub priority: u8,
    /// Lowest platform version the backend runs on.
    pub min_platform: u8,
    pub create: fn() -> Box<D>,
}

impl<D: ?Sized> Clone for DriverDesc<D> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<D: ?Sized> Copy for DriverDesc<D> {}

impl<D: ?Sized> fmt::Debug for DriverDesc<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DriverDesc")
            .field("name", &self.name)
            .field("priority", &self.priority)
            .field("min_platform", &self.min_platform)
            .finish_non_exhaustive()
    }
}

struct ActiveDriver<D: ?Sized> {
    desc: DriverDesc<D>,
    driver: Box<D>,
}

/// All backends of one kind plus the one currently running.
pub struct DriverClass<D: ?Sized + Driver> {
    kind: DriverKind,
    descs: Vec<DriverDesc<D>>,
    active: Option<ActiveDriver<D>>,
}

impl<D: ?Sized + Driver> DriverClass<D> {
    pub fn new(kind: DriverKind, descs: Vec<DriverDesc<D>>) -> Self {
        Self {
            kind,
            descs,
            active: None,
        }
    }

    pub fn kind(&self) -> DriverKind {
        self.kind
    }

    pub fn descs(&self) -> &[DriverDesc<D>] {
        &self.descs
    }

    /// Pick a backend: by exact name when requested, else the
    /// highest-priority one the platform supports. Ties go to the one
    /// registered first.
    pub fn resolve(
        &self,
        request: Option<&DriverRequest>,
        platform: u8,
    ) -> Result<DriverDesc<D>, DriverError> {
        match request {
            Some(req) => self
                .descs
                .iter()
                .find(|d| d.name == req.name)
                .copied()
                .ok_or_else(|| DriverError::UnknownDriver {
                    kind: self.kind,
                    name: req.name.clone(),
                }),
            None => {
                let mut best: Option<&DriverDesc<D>> = None;
                for desc in self.descs.iter().filter(|d| d.min_platform <= platform) {
                    if best.is_none_or(|b| desc.priority > b.priority) {
                        best = Some(desc);
                    }
                }
                best.copied()
                    .ok_or(DriverError::NoEligibleDriver { kind: self.kind })
            }
        }
    }

    /// Stop the running backend, then create and start `desc`.
    ///
    /// On failure the class is left with no active backend.
    pub fn activate(&mut self, desc: DriverDesc<D>, params: &DriverParams) -> Result<(), DriverError> {
        self.stop();
        let mut driver = (desc.create)();
        if let Err(reason) = driver.start(params) {
            return Err(DriverError::StartFailed {
                kind: self.kind,
                name: desc.name,
                long_name: desc.long_name,
                reason,
            });
        }
        tracing::info!(kind = %self.kind, driver = desc.name, "driver started");
        self.active = Some(ActiveDriver { desc, driver });
        Ok(())
    }

    /// Parse `spec`, pick a backend and start it.
    pub fn load(&mut self, spec: &str, platform: u8) -> Result<(), DriverError> {
        let request = DriverRequest::parse(spec).map_err(|source| DriverError::Options {
            kind: self.kind,
            source,
        })?;
        let desc = self.resolve(request.as_ref(), platform)?;
        let params = request.map(|r| r.params).unwrap_or_default();
        self.activate(desc, &params)
    }

    pub fn active_name(&self) -> Option<&'static str> {
        self.active.as_ref().map(|a| a.desc.name)
    }

    pub fn active(&self) -> Option<&D> {
        self.active.as_ref().map(|a| &*a.driver)
    }

    pub fn active_mut(&mut self) -> Option<&mut D> {
        self.active.as_mut().map(|a| &mut *a.driver)
    }

    pub fn require_mut(&mut self) -> Result<&mut D, DriverError> {
        let kind = self.kind;
        self.active_mut().ok_or(DriverError::NotStarted { kind })
    }

    pub fn stop(&mut self) {
        if let Some(mut active) = self.active.take() {
            active.driver.stop();
            tracing::debug!(kind = %self.kind, driver = active.desc.name, "driver stopped");
        }
    }

    fn describe(&self, out: &mut String) {
        out.push_str(&format!("List of {} drivers:\n", self.kind));
        for desc in &self.descs {
            out.push_str(&format!("{:>10}: {}\n", desc.name, desc.long_name));
        }
    }
}

/// Host platform version used to gate backends.
pub fn detect_platform_version() -> u8 {
    if cfg!(windows) { 2 } else { 1 }
}

/// One [`DriverClass`] per output kind.
pub struct DriverRegistry {
    pub video: DriverClass<dyn VideoDriver>,
    pub sound: DriverClass<dyn SoundDriver>,
    pub music: DriverClass<dyn MusicDriver>,
    platform: u8,
}

impl DriverRegistry {
    pub fn new(
        video: Vec<DriverDesc<dyn VideoDriver>>,
        sound: Vec<DriverDesc<dyn SoundDriver>>,
        music: Vec<DriverDesc<dyn MusicDriver>>,
        platform: u8,
    ) -> Self {
        Self {
            video: DriverClass::new(DriverKind::Video, video),
            sound: DriverClass::new(DriverKind::Sound, sound),
            music: DriverClass::new(DriverKind::Music, music),
            platform,
        }
    }

    /// Registry holding the backends shipped with this crate.
    pub fn builtin(platform: u8) -> Self {
        Self::new(
            vec![
                DriverDesc {
                    name: "text",
                    long_name: "Text Video Driver",
                    priority: 1,
                    min_platform: 0,
                    create: TextVideo::boxed,
                },
                DriverDesc {
                    name: "null",
                    long_name: "Null Video Driver",
                    priority: 0,
                    min_platform: 0,
                    create: NullVideo::boxed,
                },
                DriverDesc {
                    name: "dedicated",
                    long_name: "Dedicated Video Driver",
                    priority: 0,
                    min_platform: 0,
                    create: DedicatedVideo::boxed,
                },
            ],
            vec![DriverDesc {
                name: "null",
                long_name: "Null Sound Driver",
                priority: 0,
                min_platform: 0,
                create: NullSound::boxed,
            }],
            vec![DriverDesc {
                name: "null",
                long_name: "Null Music Driver",
                priority: 0,
                min_platform: 0,
                create: NullMusic::boxed,
            }],
            platform,
        )
    }

    pub fn platform(&self) -> u8 {
        self.platform
    }

    pub fn load(&mut self, kind: DriverKind, spec: &str) -> Result<(), DriverError> {
        let platform = self.platform;
        match kind {
            DriverKind::Video => self.video.load(spec, platform),
            DriverKind::Sound => self.sound.load(spec, platform),
            DriverKind::Music => self.music.load(spec, platform),
        }
    }

    pub fn active_name(&self, kind: DriverKind) -> Option<&'static str> {
        match kind {
            DriverKind::Video => self.video.active_name(),
            DriverKind::Sound => self.sound.active_name(),
            DriverKind::Music => self.music.active_name(),
        }
    }

    pub fn shutdown(&mut self) {
        self.video.stop();
        self.music.stop();
        self.sound.stop();
    }

    /// Human-readable listing of every registered backend.
    pub fn describe(&self) -> String {
        let mut out = String::new();
        self.video.describe(&mut out);
        out.push('\n');
        self.sound.describe(&mut out);
        out.push('\n');
        self.music.describe(&mut out);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{DirtyRect, FrameReport, MainLoopExit};
    use std::cell::RefCell;

    thread_local! {
        static LOG: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
    }

    fn log(entry: impl Into<String>) {
        LOG.with(|l| l.borrow_mut().push(entry.into()));
    }

    fn take_log() -> Vec<String> {
        LOG.with(|l| std::mem::take(&mut *l.borrow_mut()))
    }

    struct Probe {
        name: &'static str,
        fail: bool,
    }

    impl Driver for Probe {
        fn start(&mut self, params: &DriverParams) -> Result<(), String> {
            log(format!("start {} {}", self.name, params.len()));
            if self.fail {
                Err("device busy".into())
            } else {
                Ok(())
            }
        }

        fn stop(&mut self) {
            log(format!("stop {}", self.name));
        }
    }

    impl VideoDriver for Probe {
        fn make_dirty(&mut self, _rect: DirtyRect) {}
        fn main_loop(&mut self, _tick: &mut dyn FnMut() -> FrameReport) -> MainLoopExit {
            MainLoopExit::Quit
        }
        fn change_resolution(&mut self, _w: u32, _h: u32) -> bool {
            true
        }
    }

    fn desc(
        name: &'static str,
        priority: u8,
        min_platform: u8,
        create: fn() -> Box<dyn VideoDriver>,
    ) -> DriverDesc<dyn VideoDriver> {
        DriverDesc {
            name,
            long_name: "Probe Driver",
            priority,
            min_platform,
            create,
        }
    }

    fn low() -> Box<dyn VideoDriver> {
        Box::new(Probe { name: "low", fail: false })
    }
    fn fancy() -> Box<dyn VideoDriver> {
        Box::new(Probe { name: "fancy", fail: false })
    }
    fn mid() -> Box<dyn VideoDriver> {
        Box::new(Probe { name: "mid", fail: false })
    }
    fn mid2() -> Box<dyn VideoDriver> {
        Box::new(Probe { name: "mid2", fail: false })
    }
    fn broken() -> Box<dyn VideoDriver> {
        Box::new(Probe { name: "broken", fail: true })
    }

    fn class() -> DriverClass<dyn VideoDriver> {
        DriverClass::new(
            DriverKind::Video,
            vec![
                desc("low", 1, 0, low),
                desc("fancy", 9, 3, fancy),
                desc("mid", 5, 0, mid),
                desc("mid2", 5, 0, mid2),
                desc("broken", 0, 0, broken),
            ],
        )
    }

    #[test]
    fn exact_name_wins_over_priority() {
        let class = class();
        let req = DriverRequest::parse("low").unwrap();
        assert_eq!(class.resolve(req.as_ref(), 1).unwrap().name, "low");
    }

    #[test]
    fn unknown_name_is_an_error() {
        let class = class();
        let req = DriverRequest::parse("nope").unwrap();
        assert!(matches!(
            class.resolve(req.as_ref(), 1),
            Err(DriverError::UnknownDriver { name, .. }) if name == "nope"
        ));
    }

    #[test]
    fn priority_respects_platform_and_registration_order() {
        let class = class();
        assert_eq!(class.resolve(None, 1).unwrap().name, "mid");
        assert_eq!(class.resolve(None, 3).unwrap().name, "fancy");
    }

    #[test]
    fn no_eligible_driver() {
        let class: DriverClass<dyn VideoDriver> = DriverClass::new(
            DriverKind::Video,
            vec![desc("fancy", 9, 3, fancy)],
        );
        assert!(matches!(
            class.resolve(None, 1),
            Err(DriverError::NoEligibleDriver { kind: DriverKind::Video })
        ));
    }

    #[test]
    fn activation_stops_previous_instance_first() {
        take_log();
        let mut class = class();
        class.load("low:a,b=1", 1).unwrap();
        class.load("mid", 1).unwrap();
        assert_eq!(class.active_name(), Some("mid"));
        assert_eq!(take_log(), vec!["start low 2", "stop low", "start mid 0"]);
    }

    #[test]
    fn failed_start_is_reported_and_leaves_no_driver() {
        take_log();
        let mut class = class();
        class.load("low", 1).unwrap();
        let err = class.load("broken", 1).unwrap_err();
        match err {
            DriverError::StartFailed { name, reason, .. } => {
                assert_eq!(name, "broken");
                assert_eq!(reason, "device busy");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(class.active().is_none());
        assert!(matches!(class.require_mut(), Err(DriverError::NotStarted { .. })));
    }

    #[test]
    fn bad_option_string() {
        let mut class = class();
        assert!(matches!(
            class.load("low:,", 1),
            Err(DriverError::Options { source: OptionError::EmptyParam { index: 0 }, .. })
        ));
    }

    #[test]
    fn builtin_defaults_and_describe() {
        let mut registry = DriverRegistry::builtin(detect_platform_version());
        registry.load(DriverKind::Sound, "").unwrap();
        registry.load(DriverKind::Music, "").unwrap();
        registry.load(DriverKind::Video, "").unwrap();
        assert_eq!(registry.active_name(DriverKind::Video), Some("text"));
        assert_eq!(registry.active_name(DriverKind::Sound), Some("null"));
        assert!(registry.music.active().unwrap().is_song_playing());

        let listing = registry.describe();
        assert!(listing.contains("List of video drivers:"));
        assert!(listing.contains("      null: Null Video Driver"));
        assert!(listing.contains(" dedicated: Dedicated Video Driver"));

        registry.shutdown();
        assert_eq!(registry.active_name(DriverKind::Video), None);
        assert_eq!(registry.active_name(DriverKind::Music), None);
    }
}
