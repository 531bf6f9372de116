//! CLI module for WikiVox.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use crate::audio::AudioFormat;
use clap::{Args, Parser, Subcommand};

/// WikiVox - Wikipedia articles as Markdown, speech text and audio
///
/// Finds an article by URL or search term, writes a cleaned Markdown copy,
/// and optionally a speech-ready text and an audio rendition with chapters.
#[derive(Parser, Debug)]
#[command(name = "wikivox")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract an article to Markdown, speech text and audio
    Extract(ExtractArgs),

    /// List articles matching a search term
    Search {
        /// Search term
        term: String,

        /// Maximum number of results
        #[arg(short, long)]
        limit: Option<u32>,
    },

    /// Check the TTS server and external tools
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Flags for `wikivox extract`. Unset flags fall back to the config file.
#[derive(Args, Debug, Clone, Default)]
pub struct ExtractArgs {
    /// Article URL or search term
    pub article: String,

    /// Directory for output files
    #[arg(short, long)]
    pub output_dir: Option<String>,

    /// Base file name instead of the article title
    #[arg(short, long)]
    pub filename: Option<String>,

    /// Print Markdown to stdout instead of writing files
    #[arg(short, long)]
    pub no_save: bool,

    /// HTTP timeout for Wikipedia requests, in seconds
    #[arg(short, long)]
    pub timeout: Option<u64>,

    /// Only fetch the introduction
    #[arg(short, long)]
    pub lead_only: bool,

    /// Also write the speech text
    #[arg(long)]
    pub tts: bool,

    /// Text spoken before each heading
    #[arg(long)]
    pub heading_prefix: Option<String>,

    /// Also synthesize audio
    #[arg(long)]
    pub audio: bool,

    /// OpenAI-compatible TTS server base URL
    #[arg(long)]
    pub tts_server: Option<String>,

    /// Voice name or blend
    #[arg(long)]
    pub tts_voice: Option<String>,

    /// Audio format (mp3, wav, m4b)
    #[arg(long)]
    pub tts_format: Option<AudioFormat>,

    /// Pick the top search result without asking
    #[arg(short, long)]
    pub yolo: bool,

    /// Maximum number of search results
    #[arg(long)]
    pub search_limit: Option<u32>,

    /// Spell out years and centuries in the speech text
    #[arg(long)]
    pub tts_normalize: bool,

    /// Sections to keep, e.g. "1,3-4" (default: all)
    #[arg(long)]
    pub sections: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}
