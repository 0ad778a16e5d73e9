use std::io::BufRead as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use halo::{
    ControlPath, Engine, EngineConfig, EngineHandle, EngineOpts, Fps, FrameSink,
    InMemoryVideoLibrary, MainState, ManualClock, NoVideo, NullSink, Outputs, RawFileSink,
    SchedulerOpts, StageLayout, StageMap, StateStore, SystemClock, Timestamp, VideoLibrary,
};

#[derive(Parser, Debug)]
#[command(name = "halo", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render the live output after N ticks as a PNG stage preview.
    Frame(FrameArgs),
    /// Run the engine in real time.
    Run(RunArgs),
    /// Parse and validate a state file.
    Validate(ValidateArgs),
}

#[derive(Args, Debug)]
struct EngineArgs {
    /// Engine config JSON.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the number of radial strips.
    #[arg(long)]
    strips: Option<u32>,

    /// Override the LED count per strip.
    #[arg(long)]
    pixels_per_strip: Option<u32>,

    /// Override the tick rate (ticks per second).
    #[arg(long)]
    fps: Option<u32>,

    /// Directory of `<track>.raw` video caches.
    #[arg(long)]
    video_dir: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Input state JSON.
    #[arg(long)]
    state: PathBuf,

    #[command(flatten)]
    engine: EngineArgs,

    /// Ticks to run before capturing (at the nominal cadence, starting at t=0).
    #[arg(long, default_value_t = 1)]
    ticks: u64,

    /// Preview image edge length in pixels.
    #[arg(long, default_value_t = 512)]
    size: u32,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct RunArgs {
    /// Initial state JSON. Defaults to the persisted state (or an empty state).
    #[arg(long)]
    state: Option<PathBuf>,

    #[command(flatten)]
    engine: EngineArgs,

    /// Persist state changes here (overrides the config's `statePath`).
    #[arg(long)]
    state_path: Option<PathBuf>,

    /// Stop after this many seconds.
    #[arg(long)]
    seconds: Option<f64>,

    /// Append live frames to this raw file.
    #[arg(long)]
    out_raw: Option<PathBuf>,

    /// Read control commands from stdin (`auto`, `scrub <v>`, `next <path>`,
    /// `bounce <path>`, `quit`).
    #[arg(long, default_value_t = false)]
    console: bool,
}

#[derive(Parser, Debug)]
struct ValidateArgs {
    /// State JSON to check.
    #[arg(long)]
    state: PathBuf,
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.cmd {
        Command::Frame(args) => cmd_frame(args),
        Command::Run(args) => cmd_run(args),
        Command::Validate(args) => cmd_validate(args),
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

impl EngineArgs {
    fn load_config(&self) -> anyhow::Result<EngineConfig> {
        let mut cfg = match &self.config {
            Some(path) => EngineConfig::from_path(path)
                .with_context(|| format!("load config '{}'", path.display()))?,
            None => EngineConfig::default(),
        };
        if let Some(strips) = self.strips {
            cfg.stage.strips = strips;
        }
        if let Some(pps) = self.pixels_per_strip {
            cfg.stage.pixels_per_strip = pps;
        }
        if let Some(fps) = self.fps {
            cfg.fps = Fps::new(fps, 1)?;
        }
        cfg.validate()?;
        Ok(cfg)
    }

    fn videos(&self, layout: &StageLayout) -> anyhow::Result<Box<dyn VideoLibrary>> {
        Ok(match &self.video_dir {
            Some(dir) => Box::new(
                InMemoryVideoLibrary::load_dir(dir, layout)
                    .with_context(|| format!("load videos from '{}'", dir.display()))?,
            ),
            None => Box::new(NoVideo),
        })
    }
}

fn load_state(path: &Path) -> anyhow::Result<MainState> {
    let state =
        MainState::from_path(path).with_context(|| format!("load state '{}'", path.display()))?;
    state
        .validate()
        .with_context(|| format!("validate state '{}'", path.display()))?;
    Ok(state)
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let cfg = args.engine.load_config()?;
    let state = load_state(&args.state)?;

    let clock = ManualClock::new(Timestamp(0));
    let mut engine = Engine::new(EngineOpts::from(&cfg), state, Arc::new(clock.clone()))?
        .with_videos(args.engine.videos(&cfg.stage)?);

    let tick_ms = cfg.fps.frame_duration_secs() * 1000.0;
    let mut last = None;
    for i in 0..args.ticks.max(1) {
        clock.set(Timestamp((i as f64 * tick_ms).round() as u64));
        last = Some(engine.tick());
    }
    let report = last.context("no tick was rendered")?;

    let preview = StageMap::new(cfg.stage).render_preview(&report.live, args.size);
    if let Some(parent) = args.out.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    preview
        .save_with_format(&args.out, image::ImageFormat::Png)
        .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_run(args: RunArgs) -> anyhow::Result<()> {
    let mut cfg = args.engine.load_config()?;
    if let Some(path) = &args.state_path {
        cfg.state_path = Some(path.clone());
    }

    let clock = Arc::new(SystemClock);
    let engine = match &args.state {
        Some(path) => {
            let engine = Engine::new(EngineOpts::from(&cfg), load_state(path)?, clock)?;
            match &cfg.state_path {
                Some(store) => engine.with_store(StateStore::new(store))?,
                None => engine,
            }
        }
        None => Engine::from_config(&cfg, clock)?,
    };

    let hardware: Box<dyn FrameSink> = match &args.out_raw {
        Some(path) => Box::new(
            RawFileSink::create(path)
                .with_context(|| format!("open raw output '{}'", path.display()))?,
        ),
        None => Box::new(NullSink),
    };
    let mut engine = engine
        .with_videos(args.engine.videos(&cfg.stage)?)
        .with_outputs(Outputs {
            hardware,
            ..Outputs::default()
        });

    if args.console {
        spawn_console(engine.handle());
    }

    let opts = SchedulerOpts {
        fps: cfg.fps,
        max_ticks: args
            .seconds
            .map(|s| (s.max(0.0) * cfg.fps.as_f64()).round() as u64),
        report_every: Some((cfg.fps.as_f64().round() as u64).max(1) * 10),
    };
    let stop = AtomicBool::new(false);
    let stats = halo::run(&mut engine, &opts, &stop);
    tracing::info!(
        ticks = stats.ticks,
        overruns = stats.overruns,
        "engine stopped"
    );
    Ok(())
}

fn cmd_validate(args: ValidateArgs) -> anyhow::Result<()> {
    let state = load_state(&args.state)?;
    println!(
        "ok: live={} ready={}",
        scene_kind(&state.live_scene),
        scene_kind(&state.ready_scene)
    );
    Ok(())
}

fn scene_kind(scene: &halo::Scene) -> &'static str {
    match scene {
        halo::Scene::Off(_) => "off",
        halo::Scene::Color(_) => "color",
        halo::Scene::Video(_) => "video",
        halo::Scene::Layers(_) => "layers",
        halo::Scene::Sequence(_) => "sequence",
        halo::Scene::Unknown => "unknown",
    }
}

/// Feed stdin lines to the engine as control commands until EOF or `quit`.
fn spawn_console(handle: EngineHandle) {
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else {
                break;
            };
            let mut words = line.split_whitespace();
            let sent = match (words.next(), words.next()) {
                (None, _) => continue,
                (Some("auto"), _) => handle.start_auto_transition(),
                (Some("scrub"), Some(v)) => match v.parse::<f64>() {
                    Ok(v) => handle.manual_scrub(v),
                    Err(_) => {
                        eprintln!("scrub expects a number in [0, 1]");
                        continue;
                    }
                },
                (Some("next"), path) => {
                    handle.advance_sequence(ControlPath::parse(path.unwrap_or("live")))
                }
                (Some("bounce"), Some(path)) => handle.bounce(ControlPath::parse(path)),
                (Some("quit"), _) => {
                    let _ = handle.shutdown();
                    break;
                }
                (Some(other), _) => {
                    eprintln!("unknown command '{other}'");
                    continue;
                }
            };
            if sent.is_err() {
                break;
            }
        }
    });
}
