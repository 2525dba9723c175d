//! Duplexloop - full-duplex audio loopback tester
//!
//! Plays a clip out of the output device while recording the input device,
//! then optionally exports both directions as WAV files.

use anyhow::{Context, Result};
use clap::Parser;
use duplexloop::audio::{device, wav};
use duplexloop::{FullDuplexLoopback, LoopbackConfig, SessionEvent};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(version, about = "Full-duplex audio loopback tester", long_about = None)]
struct Opt {
    /// List available audio devices and exit
    #[arg(short, long)]
    list: bool,

    /// WAV clip to play through the output device
    #[arg(short, long, value_name = "FILE")]
    clip: Option<PathBuf>,

    /// Input device name (default device if omitted)
    #[arg(long, value_name = "DEVICE")]
    input_device: Option<String>,

    /// Output device name (default device if omitted)
    #[arg(long, value_name = "DEVICE")]
    output_device: Option<String>,

    /// Stop after this many seconds (runs until Ctrl+C if omitted)
    #[arg(short, long, value_name = "SECS")]
    duration: Option<f64>,

    /// Play the clip once instead of looping
    #[arg(long)]
    no_loop: bool,

    /// Directory to export played and recorded WAV files into
    #[arg(short, long, value_name = "DIR")]
    export_dir: Option<PathBuf>,

    /// JSON configuration file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Interval between status lines
    #[arg(long, value_name = "MS", default_value_t = 500)]
    status_interval_ms: u64,
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("duplexloop=info".parse()?),
        )
        .init();

    let opt = Opt::parse();

    if opt.list {
        return list_devices();
    }

    let mut config = opt
        .config
        .as_deref()
        .map(LoopbackConfig::load_from)
        .unwrap_or_default();
    if opt.no_loop {
        config.loop_playback = false;
    }

    run(&opt, config)
}

fn list_devices() -> Result<()> {
    let devices = device::list_devices()?;
    if devices.is_empty() {
        println!("No audio devices found.");
        return Ok(());
    }

    println!("Found {} device(s):", devices.len());
    println!();
    for (i, device) in devices.iter().enumerate() {
        let mut markers = String::new();
        if device.is_default_input {
            markers.push_str(" [DEFAULT IN]");
        }
        if device.is_default_output {
            markers.push_str(" [DEFAULT OUT]");
        }
        println!("  {}. {}{}", i + 1, device.name, markers);
        println!(
            "     Channels: {} in, {} out",
            device.input_channels, device.output_channels
        );
        if !device.sample_rates.is_empty() {
            println!("     Sample rates: {:?}", device.sample_rates);
        }
    }
    Ok(())
}

fn run(opt: &Opt, config: LoopbackConfig) -> Result<()> {
    let mut engine = FullDuplexLoopback::new(config);

    if let Some(path) = &opt.clip {
        let clip = wav::read_clip(path)?;
        engine
            .load_audio_data(
                &clip.samples,
                clip.frame_count(),
                clip.channel_count,
                clip.sample_rate,
            )
            .with_context(|| format!("Failed to load {}", path.display()))?;
        println!(
            "Clip: {} ({:.2} s, {} ch, {} Hz)",
            path.display(),
            clip.duration_secs(),
            clip.channel_count,
            clip.sample_rate
        );
    } else {
        warn!("No clip given, output will be silence");
    }

    let session = device::start_session(
        &mut engine,
        opt.input_device.as_deref(),
        opt.output_device.as_deref(),
    )?;

    // Set up Ctrl+C handler
    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    if let Err(e) = ctrlc::set_handler(move || r.store(false, Ordering::SeqCst)) {
        warn!("Failed to install Ctrl+C handler: {}", e);
    }

    println!(
        "Looping {} -> {}. Press Ctrl+C to stop.",
        session.output_name(),
        session.input_name()
    );

    let started = Instant::now();
    let deadline = opt.duration.map(Duration::from_secs_f64);
    let interval = Duration::from_millis(opt.status_interval_ms.max(10));

    while running.load(Ordering::SeqCst) {
        if deadline.is_some_and(|d| started.elapsed() >= d) {
            break;
        }
        std::thread::sleep(interval);

        for event in engine.poll_events() {
            match event {
                SessionEvent::PlaybackFinished { played_frames } => {
                    info!(played_frames, "Clip finished, playing silence")
                }
                SessionEvent::RecordingWrapped { direction } => {
                    warn!(?direction, "Recording full, oldest audio is being overwritten")
                }
            }
        }

        let levels: Vec<String> = engine
            .peak_levels()
            .iter()
            .map(|l| format!("{:.3}", l))
            .collect();
        info!(
            played = engine.played_frame_count(),
            recorded = engine.recorded_frame_count(),
            position = engine.playback_position(),
            underrun = session.stats().input_underrun_frames(),
            peaks = %levels.join(" "),
            "Status"
        );
    }

    let format = session.format();
    let recordings = session.stop()?;

    if let Some(dir) = &opt.export_dir {
        let played = wav::export_path(dir, "hfp_played");
        let recorded = wav::export_path(dir, "hfp_recorded");

        match wav::write_recording(&recordings.played, format.output.sample_rate, &played) {
            Ok(bytes) => println!("Saved played audio: {} ({} bytes)", played.display(), bytes),
            Err(e) => error!("Failed to save played audio: {:#}", e),
        }
        match wav::write_recording(&recordings.recorded, format.input.sample_rate, &recorded) {
            Ok(bytes) => println!(
                "Saved recorded audio: {} ({} bytes)",
                recorded.display(),
                bytes
            ),
            Err(e) => error!("Failed to save recorded audio: {:#}", e),
        }
    }

    println!(
        "Played {} frames, recorded {} frames.",
        engine.played_frame_count(),
        engine.recorded_frame_count()
    );
    Ok(())
}
