use anyhow::Context;
use clap::{Parser, Subcommand};
use openrail_common::{DebugLevels, GameMode, SwitchMode};
use openrail_driver::{DriverRegistry, detect_platform_version};
use openrail_persist::{AfterLoadContext, SaveFiles, load_game, read_header, upgrade_file};
use openrail_runtime::{ModeRequest, RuntimeConfig, RuntimeContext, Services, Session};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::Directive;

#[derive(Parser)]
#[command(name = "openrail", about = "Transport simulation runtime")]
struct Cli {
    /// Enable verbose logging
    #[arg(long)]
    verbose: bool,

    /// Configuration file, created on exit if missing
    #[arg(short, long, default_value = "openrail.json")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the game
    Run(RunArgs),
    /// List the available drivers
    Drivers,
    /// List savegames, autosaves and scenarios, newest first
    Saves,
    /// Print the header and contents of a savegame
    Info { path: PathBuf },
    /// Rewrite a savegame at the current version
    Upgrade {
        input: PathBuf,
        /// Defaults to overwriting the input
        output: Option<PathBuf>,
    },
}

#[derive(clap::Args)]
struct RunArgs {
    /// Video driver, e.g. `null:ticks=500`
    #[arg(short = 'v', long)]
    video: Option<String>,
    /// Sound driver
    #[arg(short = 's', long)]
    sound: Option<String>,
    /// Music driver
    #[arg(short = 'm', long)]
    music: Option<String>,
    /// Screen resolution, WIDTHxHEIGHT
    #[arg(short = 'r', long, value_parser = parse_resolution)]
    resolution: Option<[u32; 2]>,
    /// Start in the scenario editor
    #[arg(short = 'e', long)]
    editor: bool,
    /// Start a new game, or load the given savegame
    #[arg(short = 'g', long, num_args = 0..=1)]
    game: Option<Option<PathBuf>>,
    /// World generation seed
    #[arg(short = 'G', long)]
    seed: Option<u64>,
    /// Debug levels, e.g. `2` or `misc=2,net=3`
    #[arg(short = 'd', long, num_args = 0..=1, default_missing_value = "")]
    debug: Option<String>,
    /// Run as a dedicated server
    #[arg(short = 'D', long)]
    dedicated: bool,
    /// Starting year for new games
    #[arg(short = 't', long)]
    year: Option<u32>,
}

fn parse_resolution(s: &str) -> Result<[u32; 2], String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{s}'"))?;
    let parse = |v: &str| v.trim().parse::<u32>().map_err(|e| format!("'{v}': {e}"));
    Ok([parse(w)?, parse(h)?])
}

fn init_logging(verbose: bool, debug: Option<&str>) {
    let mut levels = DebugLevels::new();
    let unknown = debug.and_then(|s| levels.apply(s).err());

    let base = if verbose { "debug" } else { "info" };
    let mut filter = EnvFilter::new(base);
    for directive in levels.filter_directives() {
        match directive.parse::<Directive>() {
            Ok(d) => filter = filter.add_directive(d),
            Err(err) => eprintln!("ignoring filter '{directive}': {err}"),
        }
    }
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Some(err) = unknown {
        tracing::warn!("{err}");
    }
}

fn apply_overrides(config: &mut RuntimeConfig, args: &RunArgs) {
    if args.dedicated {
        config.video_driver = "dedicated".to_string();
        config.sound_driver = "null".to_string();
        config.music_driver = "null".to_string();
        config.dedicated = true;
    }
    if let Some(v) = &args.video {
        config.video_driver = v.clone();
    }
    if let Some(s) = &args.sound {
        config.sound_driver = s.clone();
    }
    if let Some(m) = &args.music {
        config.music_driver = m.clone();
    }
    if let Some(r) = args.resolution {
        config.resolution = r;
    }
    if let Some(year) = args.year {
        config.starting_year = year;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
}

fn startup_request(args: &RunArgs) -> ModeRequest {
    match &args.game {
        Some(Some(file)) => ModeRequest::with_file(SwitchMode::LoadGame, file.clone()),
        Some(None) => ModeRequest::new(SwitchMode::NewGame),
        None if args.editor => ModeRequest::new(SwitchMode::Editor),
        None => ModeRequest::new(SwitchMode::Menu),
    }
}

/// Read the config file. An unreadable file falls back to the defaults and
/// yields the message to show once the game is up.
fn load_config(path: &Path) -> (RuntimeConfig, Option<String>) {
    match RuntimeConfig::load(path) {
        Ok(config) => (config, None),
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "config unreadable, using defaults");
            let message = format!("{} could not be read ({err}); using default settings", path.display());
            (RuntimeConfig::default(), Some(message))
        }
    }
}

fn run(config_path: PathBuf, args: RunArgs) -> anyhow::Result<()> {
    let (mut config, config_error) = load_config(&config_path);
    apply_overrides(&mut config, &args);

    let services = Services::local(&config).context("preparing world generation and save directories")?;
    let mut session = Session::new(config, services);
    if let Some(message) = &config_error {
        session.set_switch_error(message.clone());
    }
    let drivers = DriverRegistry::builtin(detect_platform_version());
    let mut ctx = RuntimeContext::new(drivers, session);
    ctx.request_mode(startup_request(&args));

    tracing::debug!(target: "misc", "loading drivers");
    if let Err(err) = ctx.start_drivers() {
        ctx.shutdown();
        return Err(err).context("starting drivers");
    }
    let result = ctx.run();
    ctx.shutdown();
    result.context("main loop")?;

    // Keep a broken file around for the user to fix instead of clobbering it.
    if config_error.is_none() {
        ctx.session
            .config()
            .save(&config_path)
            .with_context(|| format!("writing {}", config_path.display()))?;
    }
    for notice in ctx.session.interface_mut().take_notices() {
        println!("{notice}");
    }
    Ok(())
}

fn list_saves(config_path: &Path) -> anyhow::Result<()> {
    let (config, _) = load_config(config_path);
    let files = SaveFiles::open(&config.save_root, &config.data_dir)
        .with_context(|| format!("opening {}", config.save_root.display()))?;
    for (label, dir) in [
        ("save", files.save_dir()),
        ("autosave", files.autosave_dir()),
        ("scenario", files.scenario_dir()),
    ] {
        for entry in files.list_saves(&dir)? {
            let version = read_header(&entry.path)
                .map(|h| h.version.to_string())
                .unwrap_or_else(|_| "?".to_string());
            println!("{label:>8}  {version:>4}  {}", entry.name);
        }
    }
    Ok(())
}

fn inspect_context() -> AfterLoadContext {
    AfterLoadContext {
        mode: GameMode::Editor,
        create_default_player: false,
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let debug = match &cli.command {
        Commands::Run(args) => args.debug.as_deref().map(|d| if d.is_empty() { "2" } else { d }),
        _ => None,
    };
    init_logging(cli.verbose, debug);

    match cli.command {
        Commands::Run(args) => run(cli.config, args)?,
        Commands::Saves => list_saves(&cli.config)?,
        Commands::Drivers => {
            let drivers = DriverRegistry::builtin(detect_platform_version());
            println!("{}", drivers.describe());
        }
        Commands::Info { path } => {
            let header = read_header(&path)?;
            let checksum: String = header.checksum.iter().map(|b| format!("{b:02x}")).collect();
            println!("{}: version {} sha256 {checksum}", path.display(), header.version);

            let loaded = load_game(&path, inspect_context())?;
            let world = &loaded.world;
            println!(
                "map {}x{}, date {}, tick {}, towns {}, players {}",
                world.width(),
                world.height(),
                world.date(),
                world.tick(),
                world.towns().len(),
                world.players().iter().filter(|p| p.is_active).count()
            );
            if !loaded.migrations.is_empty() {
                println!("migrations on load: {}", loaded.migrations.join(", "));
            }
        }
        Commands::Upgrade { input, output } => {
            let output = output.unwrap_or_else(|| input.clone());
            let loaded = upgrade_file(&input, &output, inspect_context())?;
            println!(
                "{} -> {}: {} to current ({} steps)",
                input.display(),
                output.display(),
                loaded.version,
                loaded.migrations.len()
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_args(args: &[&str]) -> RunArgs {
        let mut argv = vec!["openrail", "run"];
        argv.extend_from_slice(args);
        match Cli::parse_from(argv).command {
            Commands::Run(args) => args,
            _ => unreachable!(),
        }
    }

    #[test]
    fn resolution_parses() {
        assert_eq!(parse_resolution("800x600"), Ok([800, 600]));
        assert!(parse_resolution("800").is_err());
        assert!(parse_resolution("axb").is_err());
    }

    #[test]
    fn game_flag_with_and_without_file() {
        assert_eq!(startup_request(&run_args(&["-g"])), ModeRequest::new(SwitchMode::NewGame));
        assert_eq!(
            startup_request(&run_args(&["-g", "a.sav"])),
            ModeRequest::with_file(SwitchMode::LoadGame, "a.sav")
        );
        assert_eq!(startup_request(&run_args(&["-e"])), ModeRequest::new(SwitchMode::Editor));
        assert_eq!(startup_request(&run_args(&[])), ModeRequest::new(SwitchMode::Menu));
    }

    #[test]
    fn dedicated_forces_null_audio() {
        let mut config = RuntimeConfig::default();
        apply_overrides(&mut config, &run_args(&["-D", "-m", "null:x", "-t", "1990"]));
        assert_eq!(config.video_driver, "dedicated");
        assert_eq!(config.sound_driver, "null");
        assert_eq!(config.music_driver, "null:x");
        assert_eq!(config.starting_year, 1990);
        assert!(config.dedicated);
    }

    #[test]
    fn unreadable_config_falls_back_with_a_message() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("openrail.json");
        std::fs::write(&path, "{ not json").unwrap();

        let (config, message) = load_config(&path);
        assert_eq!(config, RuntimeConfig::default());
        assert!(message.unwrap().contains("openrail.json"));

        let (_, message) = load_config(&tmp.path().join("missing.json"));
        assert_eq!(message, None);
    }
}
