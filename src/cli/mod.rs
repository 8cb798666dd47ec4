//! CLI argument definitions for the `monologue` binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::types::Voice;

/// Spoken monologue generator
#[derive(Parser, Debug)]
#[command(name = "monologue", version, about = "Generate and play long-form spoken monologues")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a monologue on a topic, playing it as segments arrive
    Generate(GenerateArgs),
    /// List the available voices
    Voices,
}

/// Arguments for the `generate` subcommand.
#[derive(Parser, Debug)]
pub struct GenerateArgs {
    /// Topic description
    pub topic: String,

    /// Speaker voice
    #[arg(short, long, default_value_t = Voice::Alloy)]
    pub voice: Voice,

    /// Target length in minutes (1 - 10)
    #[arg(short, long, default_value_t = 5, value_parser = clap::value_parser!(u32).range(1..=10))]
    pub minutes: u32,

    /// Root directory for conversation assets
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Produce audio without playing it
    #[arg(long)]
    pub no_playback: bool,

    /// Start playback only after every segment is produced
    #[arg(long)]
    pub after_production: bool,

    /// Minimum segment cap; long targets raise it
    #[arg(long)]
    pub max_segments: Option<usize>,

    /// Conversation title (defaults to the topic)
    #[arg(long)]
    pub title: Option<String>,
}
