//! WikiVox - Wikipedia articles as Markdown, speech text and audio
//!
//! # Overview
//!
//! WikiVox allows you to:
//! - Find an article by URL or by free-text search
//! - Save a cleaned Markdown copy of it
//! - Produce speech-ready text with pronunciation fixes
//! - Synthesize audio through an OpenAI-compatible TTS server, with chapter
//!   marks at section headings
//!
//! # Architecture
//!
//! - `config` - Configuration management
//! - `wiki` - Article resolution and retrieval
//! - `text` - Markup cleanup and pronunciation rules
//! - `tts` - Segmentation and speech synthesis
//! - `audio` - Containers, durations and chapter timing
//! - `output` - File naming and writes
//! - `pipeline` - Pipeline coordination
//!
//! # Example
//!
//! ```rust,no_run
//! use wikivox::config::Settings;
//! use wikivox::pipeline::Pipeline;
//! use wikivox::wiki::SectionSelection;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let pipeline = Pipeline::new(settings)?;
//!
//!     let extraction = pipeline.extract("Henry VIII", &SectionSelection::All).await?;
//!     let audio = pipeline
//!         .synthesize(&extraction.normalized, &extraction.article.title, None)
//!         .await?;
//!     println!("{} chapters, {} ms", audio.chapters.len(), audio.duration_ms);
//!
//!     Ok(())
//! }
//! ```

pub mod audio;
pub mod cli;
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod retry;
pub mod text;
pub mod tts;
pub mod wiki;

pub use error::{Result, WikiVoxError};
