//! Costume controller: main entry point.
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                  Adapters (outer ring)                    │
//! │   rppal GPIO        MixerPlayer       LogEventSink        │
//! │   (pins + PWM)      (AudioPlayer)     (EventSink)         │
//! │                                                           │
//! │  ─────────────── Port trait boundary ──────────────────   │
//! │                                                           │
//! │   ┌───────────────────────────────────────────────────┐   │
//! │   │  CostumeMachine  · servo · strobe · laser · sound │   │
//! │   └───────────────────────────────────────────────────┘   │
//! │                                                           │
//! │   Supervisor (input poller → press queue → machine)       │
//! └───────────────────────────────────────────────────────────┘
//! ```
//!
//! Startup: config → signals → GPIO → audio → supervisor.  SIGINT / SIGTERM
//! raise the shutdown flag; the supervisor then releases every output
//! before exit.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use signal_hook::consts::{SIGINT, SIGTERM};
use tracing_subscriber::EnvFilter;

use costume::adapters::audio::MixerPlayer;
use costume::adapters::log_sink::LogEventSink;
use costume::adapters::rpi;
use costume::app::phrase::PhraseOrder;
use costume::config::CostumeConfig;
use costume::supervisor::Supervisor;

#[derive(Debug, Parser)]
#[command(name = "costume", version, about = "Wing / laser / sound costume controller")]
struct Cli {
    /// JSON config file; built-in defaults when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding the sound clips.
    #[arg(short, long)]
    audio_dir: Option<PathBuf>,

    /// Play phrases in order instead of at random.
    #[arg(long)]
    sequential: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    info!("Costume controller v{}", env!("CARGO_PKG_VERSION"));

    // ── Configuration ─────────────────────────────────────────
    let mut config = match &cli.config {
        Some(path) => CostumeConfig::from_json_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => CostumeConfig::default(),
    };
    if let Some(dir) = cli.audio_dir {
        config.audio_dir = dir;
    }
    if cli.sequential {
        config.phrase_order = PhraseOrder::Sequential;
    }
    config.validate().context("invalid configuration")?;

    // ── Signals ───────────────────────────────────────────────
    // Registered before any pin is claimed: a signal during startup only
    // raises the flag, and `run` then tears down through the normal path.
    let shutdown = Arc::new(AtomicBool::new(false));
    for sig in [SIGINT, SIGTERM] {
        signal_hook::flag::register(sig, Arc::clone(&shutdown))
            .with_context(|| format!("registering signal {sig}"))?;
    }

    // ── Hardware ──────────────────────────────────────────────
    let hardware = rpi::acquire(&config.pins, config.servo.pwm_frequency_hz, config.buttons_active_low)
        .context("acquiring GPIO")?;

    // ── Audio (optional) ──────────────────────────────────────
    let player = match MixerPlayer::open() {
        Ok(mut p) => {
            let paths: Vec<PathBuf> = config.clips.all().map(|c| config.audio_dir.join(c)).collect();
            p.preload(paths.iter().map(PathBuf::as_path).filter(|path| path.is_file()));
            Some(p)
        }
        Err(e) => {
            warn!("Audio unavailable, continuing silent: {}", e);
            None
        }
    };

    // ── Run ───────────────────────────────────────────────────
    let mut supervisor = Supervisor::start(&config, hardware, player, LogEventSink::new())
        .context("starting controller")?;
    supervisor.run(&shutdown);

    info!("Goodbye");
    Ok(())
}
