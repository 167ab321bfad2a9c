//! Input Replay - keyboard and mouse recorder / replayer
//!
//! Records global input into JSON timelines and plays them back.

use anyhow::Context;
use input_replay::app::cli::{Cli, Commands, ConfigAction};
use input_replay::app::config::Config;
use input_replay::replay::{
    clamp_speed, countdown, CancellationToken, DryRunInjector, InputInjector, ReplayScheduler,
    ReplayStatus, TracingObserver,
};
use input_replay::time::SystemClock;
use input_replay::timeline::{list_recordings, most_recent, Timeline};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // Parse CLI arguments first so we can use --verbose to set log level
    let cli = Cli::parse_args();

    // Initialize tracing (--verbose enables debug-level output)
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let config = Config::load_from(cli.config.as_deref())?;

    match cli.command {
        Commands::Record {
            output,
            dir,
            duration,
        } => {
            run_record(output, dir, duration, &config)?;
        }
        Commands::Replay {
            path,
            speed,
            repeat,
            countdown,
            dry_run,
        } => {
            run_replay(path, speed, repeat, countdown, dry_run, &config)?;
        }
        Commands::Info { path } => {
            run_info(&path)?;
        }
        Commands::List { dir } => {
            run_list(dir, &config)?;
        }
        Commands::Init { force } => {
            run_init(force, &config_path, &config)?;
        }
        Commands::Config { action } => {
            run_config(action, &config_path, &config)?;
        }
    }

    Ok(())
}

#[cfg(feature = "native")]
fn run_record(
    output: Option<String>,
    dir: Option<PathBuf>,
    duration: u64,
    config: &Config,
) -> anyhow::Result<()> {
    use input_replay::capture::{CaptureSession, SessionState};
    use input_replay::platform::RdevSource;
    use std::time::{Duration, Instant};

    let bindings = config.capture.hotkey_bindings()?;
    let dir = dir.unwrap_or_else(|| config.storage.recordings_dir.clone());
    let output_path = Cli::output_path(&dir, output.as_deref());

    let session = Arc::new(
        CaptureSession::new(
            Box::new(RdevSource::new()),
            Arc::new(SystemClock::new()),
            config.capture.move_filter(),
        )
        .with_hotkeys(bindings.clone()),
    );

    // Ctrl+C ends the session the same way the stop hotkey does
    let handler_session = Arc::clone(&session);
    ctrlc::set_handler(move || {
        handler_session.stop();
    })?;

    session
        .arm()
        .context("Could not start capturing input")?;

    println!(
        "Press {} to start recording, {} to stop ({} for emergency stop)",
        bindings.start, bindings.stop, bindings.emergency_stop
    );
    if duration > 0 {
        println!("Recording stops automatically {duration}s after it starts");
    }

    while session.state() == SessionState::Armed {
        std::thread::sleep(Duration::from_millis(50));
    }
    if session.state() == SessionState::Stopped && session.event_count() == 0 {
        println!("Cancelled before recording started");
        return Ok(());
    }
    println!("Recording...");

    let started = Instant::now();
    while session.state() == SessionState::Recording {
        if duration > 0 && started.elapsed().as_secs() >= duration {
            info!("Duration limit reached");
            break;
        }
        std::thread::sleep(Duration::from_millis(50));
    }

    let timeline = session.stop();
    info!(
        "Recording stopped after {:.1}s ({} mouse moves filtered)",
        started.elapsed().as_secs_f64(),
        session.suppressed_count()
    );

    timeline
        .save(&output_path)
        .with_context(|| format!("Failed to save recording to {}", output_path.display()))?;

    println!("\nSaved {}", output_path.display());
    print!("{}", timeline.summary());
    Ok(())
}

#[cfg(not(feature = "native"))]
fn run_record(
    _output: Option<String>,
    _dir: Option<PathBuf>,
    _duration: u64,
    _config: &Config,
) -> anyhow::Result<()> {
    anyhow::bail!("Recording needs the native input backend; rebuild with `--features native`")
}

#[cfg(feature = "native")]
fn native_injector() -> Box<dyn InputInjector> {
    Box::new(input_replay::platform::RdevInjector::new())
}

#[cfg(not(feature = "native"))]
fn native_injector() -> Box<dyn InputInjector> {
    warn!("Built without the native backend; replaying as a dry run");
    Box::new(DryRunInjector::new())
}

fn resolve_recording(path: Option<PathBuf>, config: &Config) -> anyhow::Result<PathBuf> {
    if let Some(path) = path {
        return Ok(path);
    }
    let dir = &config.storage.recordings_dir;
    match most_recent(dir)? {
        Some(path) => {
            info!("Using most recent recording {}", path.display());
            Ok(path)
        }
        None => anyhow::bail!(
            "No recordings found in {}. Pass a file path or record one first.",
            dir.display()
        ),
    }
}

fn run_replay(
    path: Option<PathBuf>,
    speed: Option<f64>,
    repeat: Option<u32>,
    countdown_secs: Option<u32>,
    dry_run: bool,
    config: &Config,
) -> anyhow::Result<()> {
    let path = resolve_recording(path, config)?;
    let timeline = Timeline::load(&path)
        .with_context(|| format!("Could not load recording {}", path.display()))?;

    let mut replay_config = config.replay.replay_config();
    if let Some(speed) = speed {
        let clamped = clamp_speed(speed);
        if clamped != speed {
            warn!("Speed {speed} is out of range, using {clamped}");
        }
        replay_config.speed = clamped;
    }
    if let Some(repeat) = repeat {
        replay_config.repetitions = repeat;
    }

    println!(
        "Replaying {} ({} actions, {:.2}s) at {}x, {} time(s)",
        path.display(),
        timeline.total_actions(),
        timeline.duration(),
        replay_config.speed,
        replay_config.repetitions
    );

    let token = CancellationToken::new();
    let handler_token = token.clone();
    ctrlc::set_handler(move || handler_token.cancel())?;

    let clock = Arc::new(SystemClock::new());
    let secs = countdown_secs.unwrap_or(config.replay.countdown_secs);
    if !countdown(clock.as_ref(), secs, &token, |n| println!("Starting in {n}...")) {
        println!("Replay cancelled before it started");
        return Ok(());
    }

    let mut injector: Box<dyn InputInjector> = if dry_run {
        Box::new(DryRunInjector::new())
    } else {
        native_injector()
    };

    let scheduler = ReplayScheduler::new(clock, replay_config);
    let report = scheduler.run(&timeline, injector.as_mut(), &mut TracingObserver, &token)?;

    match report.status {
        ReplayStatus::Completed => println!(
            "\nReplay completed: {} events in {:.2}s",
            report.dispatched,
            report.elapsed.as_secs_f64()
        ),
        ReplayStatus::Cancelled => println!(
            "\nReplay cancelled after {} events ({} full repetitions)",
            report.dispatched, report.repetitions_completed
        ),
    }
    if report.failed > 0 {
        println!("{} events could not be injected (see warnings)", report.failed);
    }

    Ok(())
}

fn run_info(path: &Path) -> anyhow::Result<()> {
    let timeline = Timeline::load(path)
        .with_context(|| format!("Could not load recording {}", path.display()))?;
    println!("Recording: {}", path.display());
    print!("{}", timeline.summary());
    Ok(())
}

fn run_list(dir: Option<PathBuf>, config: &Config) -> anyhow::Result<()> {
    let dir = dir.unwrap_or_else(|| config.storage.recordings_dir.clone());
    let entries = list_recordings(&dir)?;

    if entries.is_empty() {
        println!("No recordings found in {}", dir.display());
        println!("Start a recording with: input-replay record");
        return Ok(());
    }

    println!("Recordings in {}:", dir.display());
    for entry in &entries {
        match &entry.summary {
            Some(summary) => println!(
                "  {}  ({} actions, {:.1}s, started {})",
                entry.file_name(),
                summary.total_actions,
                summary.duration,
                summary.start_time
            ),
            None => println!("  {}  (failed to parse)", entry.file_name()),
        }
    }

    Ok(())
}

fn run_init(force: bool, config_path: &Path, config: &Config) -> anyhow::Result<()> {
    if config_path.exists() && !force {
        anyhow::bail!(
            "Config already exists at {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    config.save(config_path)?;
    println!("Created config at {}", config_path.display());
    println!("\nConfig content:\n{}", config.to_toml()?);

    let recordings = &config.storage.recordings_dir;
    std::fs::create_dir_all(recordings)
        .with_context(|| format!("Failed to create {}", recordings.display()))?;
    println!("Recordings directory: {}", recordings.display());

    Ok(())
}

fn run_config(action: ConfigAction, config_path: &Path, config: &Config) -> anyhow::Result<()> {
    match action {
        ConfigAction::Show => {
            println!("Configuration ({}):\n", config_path.display());
            println!("{}", config.to_toml()?);
        }
        ConfigAction::Path => {
            println!("{}", config_path.display());
        }
    }
    Ok(())
}
