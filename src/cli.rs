//! Command-line interface for vismic
//!
//! Provides argument parsing using clap derive macros.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Microphone-driven viseme and blink animation
#[derive(Parser, Debug)]
#[command(name = "vismic", version, about = "Microphone-driven avatar animation")]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Audio input device (e.g., pipewire)
    #[arg(long, value_name = "DEVICE")]
    pub device: Option<String>,

    /// Path to a phoneme recognition model file
    #[arg(long, value_name = "PATH")]
    pub model: Option<PathBuf>,

    /// Smoothing strength override (0.0 = instant, 1.0 = locked)
    #[arg(long, value_name = "STRENGTH", value_parser = parse_strength)]
    pub smoothing: Option<f32>,

    /// Run without audio capture (blink-only mode)
    #[arg(long)]
    pub no_audio: bool,
}

/// Parse a smoothing strength, rejecting values outside [0.0, 1.0].
fn parse_strength(s: &str) -> Result<f32, String> {
    let value: f32 = s.parse().map_err(|e| format!("{e}"))?;
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err("must be within 0.0..=1.0".to_string())
    }
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List available audio input devices
    Devices,
}
