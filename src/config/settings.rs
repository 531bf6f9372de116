//! Configuration settings for WikiVox.

use crate::audio::AudioFormat;
use crate::error::{Result, WikiVoxError};
use crate::retry::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub wiki: WikiSettings,
    pub search: SearchSettings,
    pub tts: TtsSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory where markdown, TTS text and audio are written.
    pub output_dir: String,
    /// HTTP timeout for search and content requests, in seconds.
    pub timeout_secs: u64,
    /// Fetch only the lead section.
    pub lead_only: bool,
    /// Print the Markdown to stdout instead of writing files.
    pub no_save: bool,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            output_dir: "./output".to_string(),
            timeout_secs: 15,
            lead_only: false,
            no_save: false,
        }
    }
}

/// Wikipedia endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WikiSettings {
    /// Language subdomain (en, de, fr, ...). Passed through as-is.
    pub language: String,
    /// Wiki host without the language subdomain.
    pub host: String,
    /// Retries after the first attempt for transient failures.
    pub max_retries: u32,
    /// Base delay for exponential backoff, in milliseconds.
    pub backoff_base_ms: u64,
    /// User agent sent with every request.
    pub user_agent: String,
}

impl Default for WikiSettings {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            host: "wikipedia.org".to_string(),
            max_retries: 3,
            backoff_base_ms: 500,
            user_agent: format!("wikivox/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Search behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Pick the top-ranked result when a search is ambiguous.
    pub auto_select: bool,
    /// Maximum number of results requested from the search endpoint.
    pub limit: u32,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            auto_select: false,
            limit: 10,
        }
    }
}

/// Speech synthesis settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TtsSettings {
    /// Base URL of the OpenAI-compatible TTS server.
    pub server_url: String,
    /// Model name sent with every request.
    pub model: String,
    /// Voice identifier.
    pub voice: String,
    /// Output format (mp3, wav, m4b).
    pub format: String,
    /// Prefix spoken before each heading, e.g. "Section: ".
    pub heading_prefix: String,
    /// Convert years and centuries to words.
    pub normalize: bool,
    /// Also write the speech text file next to the Markdown.
    pub file: bool,
    /// Also synthesize audio.
    pub audio: bool,
    /// Upper bound on characters per synthesis request.
    pub max_segment_chars: usize,
    /// Segments synthesized concurrently. 1 means strictly sequential.
    pub max_concurrent: usize,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Retries after the first attempt for each segment.
    pub max_retries: u32,
    /// API key, if the server wants one.
    pub api_key: Option<String>,
}

impl Default for TtsSettings {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:8880/v1".to_string(),
            model: "kokoro".to_string(),
            voice: "af_sky+af_bella".to_string(),
            format: "mp3".to_string(),
            heading_prefix: String::new(),
            normalize: false,
            file: false,
            audio: false,
            max_segment_chars: 4000,
            max_concurrent: 1,
            timeout_secs: 120,
            max_retries: 3,
            api_key: None,
        }
    }
}

impl TtsSettings {
    /// Parsed audio format.
    pub fn audio_format(&self) -> Result<AudioFormat> {
        self.format.parse().map_err(WikiVoxError::Config)
    }
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        let settings = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str::<Settings>(&content)?
        } else {
            Settings::default()
        };

        settings.validate()?;
        Ok(settings)
    }

    /// Reject values the pipeline cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.search.limit == 0 {
            return Err(WikiVoxError::Config(
                "search.limit must be greater than zero".to_string(),
            ));
        }
        if self.tts.max_segment_chars == 0 {
            return Err(WikiVoxError::Config(
                "tts.max_segment_chars must be greater than zero".to_string(),
            ));
        }
        if self.wiki.language.trim().is_empty() {
            return Err(WikiVoxError::Config("wiki.language is empty".to_string()));
        }
        self.tts.audio_format()?;
        Ok(())
    }

    /// Render settings as TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| WikiVoxError::Config(e.to_string()))
    }

    /// Write the default settings to `path`, creating parent directories.
    ///
    /// An existing file is only replaced when `force` is set.
    pub fn write_default(path: &Path, force: bool) -> Result<()> {
        if path.exists() && !force {
            return Err(WikiVoxError::Config(format!(
                "Config already exists at {}. Use --force to overwrite.",
                path.display()
            )));
        }

        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&parent)?;

        let content = Settings::default().to_toml()?;
        let mut tmp = tempfile::NamedTempFile::new_in(&parent)?;
        tmp.write_all(content.as_bytes())?;
        tmp.persist(path).map_err(|e| WikiVoxError::Io(e.error))?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("wikivox")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded output directory path.
    pub fn output_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.output_dir)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.general.timeout_secs)
    }

    pub fn tts_timeout(&self) -> Duration {
        Duration::from_secs(self.tts.timeout_secs)
    }

    /// Base delay between retried requests.
    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.wiki.backoff_base_ms)
    }

    /// Retry policy for individual synthesis segments.
    pub fn tts_retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.tts.max_retries + 1, self.backoff_base())
    }
}
