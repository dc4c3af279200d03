use anyhow::{Context, Result};
use clap::Parser;
use std::io::BufRead;
use std::path::Path;
use vismic::audio::{CaptureSource, CpalCaptureSource, list_devices};
use vismic::cli::{Cli, Commands};
use vismic::config::Config;
use vismic::driver::{Pipeline, PipelineConfig};
use vismic::render::StdoutSurface;

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Devices) => list_audio_devices(),
        None => run(cli),
    }
}

fn list_audio_devices() -> Result<()> {
    let devices = list_devices().context("Failed to enumerate audio devices")?;
    if devices.is_empty() {
        println!("No audio input devices found");
    } else {
        println!("Available audio input devices:");
        for device in devices {
            println!("  {device}");
        }
    }
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    let mut config = load_config(cli.config.as_deref())?;

    if let Some(device) = cli.device {
        config.audio.device = Some(device);
    }
    if let Some(model) = cli.model {
        config.classifier.model_path = Some(model);
    }
    if let Some(strength) = cli.smoothing {
        config.smoothing.strength = strength;
    }
    config.validate().context("Invalid configuration")?;

    let classifier = vismic::init_classifier(config.classifier.model_path.as_deref());

    let capture: Option<Box<dyn CaptureSource>> = if cli.no_audio {
        None
    } else {
        Some(Box::new(
            CpalCaptureSource::new(config.audio.device.as_deref(), config.audio.frame_ms)
                .context("Failed to open audio capture")?,
        ))
    };

    let handle = Pipeline::new(PipelineConfig::from_config(&config)).start(
        capture,
        classifier,
        Box::new(StdoutSurface),
    );

    let snapshot = handle.snapshot();
    eprintln!(
        "vismic: running with {} classifier{} — press Enter to stop",
        snapshot.classifier_name,
        if snapshot.fallback_active {
            " (fallback)"
        } else {
            ""
        }
    );

    // Block until the user hits Enter; the render loop runs in the background.
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read stdin")?;

    let snapshot = handle.snapshot();
    handle.stop();
    eprintln!(
        "vismic: stopped after {} ticks ({} classifications, {} dropped frames)",
        snapshot.ticks, snapshot.classifications, snapshot.dropped_frames
    );

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(path) => {
            Config::load(path).with_context(|| format!("Failed to load {}", path.display()))?
        }
        None => match Config::default_path() {
            Some(path) => Config::load_or_default(&path)
                .with_context(|| format!("Failed to load {}", path.display()))?,
            None => Config::default(),
        },
    };
    Ok(config.with_env_overrides())
}
