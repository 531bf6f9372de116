//! Output file naming and safe writes.

use crate::audio::AudioFormat;
use crate::error::{Result, WikiVoxError};
use regex::Regex;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::debug;

/// Used when a title sanitizes to nothing.
pub const FALLBACK_FILENAME: &str = "wikipedia_article";

/// Default length limit for [`sanitize_filename`].
pub const MAX_FILENAME_LEN: usize = 100;

static FORBIDDEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[\x00-\x1f\x7f\\/*?:"<>|]"#).expect("Invalid filename regex"));

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("Invalid whitespace regex"));

fn is_reserved(name: &str) -> bool {
    let upper = name.to_ascii_uppercase();
    if matches!(upper.as_str(), "CON" | "PRN" | "AUX" | "NUL") {
        return true;
    }
    ["COM", "LPT"].iter().any(|prefix| {
        upper
            .strip_prefix(prefix)
            .is_some_and(|n| n.len() == 1 && matches!(n.as_bytes()[0], b'1'..=b'9'))
    })
}

/// Turn an article title into a portable file name (without directory).
pub fn sanitize_filename(name: &str, max_len: usize) -> String {
    let decoded = urlencoding::decode(name)
        .map(|d| d.into_owned())
        .unwrap_or_else(|_| name.to_string());

    let stripped = FORBIDDEN.replace_all(&decoded, "");
    let joined = WHITESPACE.replace_all(&stripped, "_");
    let mut out = joined.trim_matches(|c: char| c == ' ' || c == '.').to_string();

    if out.is_empty() {
        out = FALLBACK_FILENAME.to_string();
    }
    if is_reserved(&out) {
        out.push_str("_file");
    }

    if out.chars().count() > max_len {
        out = truncate_keeping_extension(&out, max_len);
    }
    out
}

fn truncate_keeping_extension(name: &str, max_len: usize) -> String {
    if let Some((root, ext)) = name.rsplit_once('.') {
        let ext_len = ext.chars().count();
        if !root.is_empty() && ext_len < 10 && ext_len + 1 < max_len {
            let keep = max_len - ext_len - 1;
            let root: String = root.chars().take(keep).collect();
            return format!("{}.{}", root.trim_end_matches('_'), ext);
        }
    }
    let cut: String = name.chars().take(max_len).collect();
    cut.trim_end_matches('_').to_string()
}

/// Paths for one extraction's artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub markdown_path: PathBuf,
    pub tts_path: PathBuf,
    pub audio_path: PathBuf,
}

/// Owns an output directory and writes files only inside it.
pub struct OutputManager {
    base_dir: PathBuf,
    audio_format: AudioFormat,
}

impl OutputManager {
    /// Create the directory if needed.
    pub fn new(base_dir: impl AsRef<Path>, audio_format: AudioFormat) -> Result<Self> {
        std::fs::create_dir_all(base_dir.as_ref())?;
        let base_dir = base_dir.as_ref().canonicalize()?;
        Ok(Self { base_dir, audio_format })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Paths for `title` (or an explicit `filename`), avoiding existing markdown files.
    pub fn prepare_paths(&self, title: &str, filename: Option<&str>) -> Result<OutputPaths> {
        let base = sanitize_filename(filename.unwrap_or(title), MAX_FILENAME_LEN);
        let stem = self.unique_stem(&base)?;
        Ok(OutputPaths {
            markdown_path: self.base_dir.join(format!("{}.md", stem)),
            tts_path: self.base_dir.join(format!("{}.txt", stem)),
            audio_path: self.base_dir.join(format!("{}.{}", stem, self.audio_format.extension())),
        })
    }

    fn unique_stem(&self, base: &str) -> Result<String> {
        if !self.base_dir.join(format!("{}.md", base)).exists() {
            return Ok(base.to_string());
        }
        (1..1000)
            .map(|i| format!("{}_{}", base, i))
            .find(|stem| !self.base_dir.join(format!("{}.md", stem)).exists())
            .ok_or_else(|| WikiVoxError::InvalidInput(format!("Unable to allocate a unique filename for '{}'", base)))
    }

    pub fn write_text(&self, path: &Path, content: &str) -> Result<()> {
        self.write_bytes(path, content.as_bytes())
    }

    /// Write through a temporary file in the same directory, so a failed
    /// write never leaves a truncated file behind.
    pub fn write_bytes(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        let target = self.confine(path)?;
        let mut tmp = tempfile::NamedTempFile::new_in(&self.base_dir)?;
        tmp.write_all(bytes)?;
        tmp.persist(&target).map_err(|e| WikiVoxError::Io(e.error))?;
        debug!("Wrote {} bytes to {:?}", bytes.len(), target);
        Ok(())
    }

    /// Reject paths that resolve outside the base directory.
    fn confine(&self, path: &Path) -> Result<PathBuf> {
        let joined = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        };
        let outside = || WikiVoxError::InvalidInput(format!("Refusing to write outside {:?}: {:?}", self.base_dir, path));

        let parent = joined.parent().ok_or_else(outside)?;
        let file_name = joined.file_name().ok_or_else(outside)?;
        let parent = parent.canonicalize().map_err(|_| outside())?;
        if !parent.starts_with(&self.base_dir) {
            return Err(outside());
        }
        Ok(parent.join(file_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_sanitize_basic() {
        assert_eq!(sanitize_filename("Henry VIII", 100), "Henry_VIII");
        assert_eq!(sanitize_filename("AC/DC: Live?", 100), "ACDC_Live");
        assert_eq!(sanitize_filename("Mercury_%28planet%29", 100), "Mercury_(planet)");
        assert_eq!(sanitize_filename("..hidden..", 100), "hidden");
    }

    #[test]
    fn test_sanitize_fallback_and_reserved() {
        assert_eq!(sanitize_filename("", 100), FALLBACK_FILENAME);
        assert_eq!(sanitize_filename("???", 100), FALLBACK_FILENAME);
        assert_eq!(sanitize_filename("con", 100), "con_file");
        assert_eq!(sanitize_filename("LPT1", 100), "LPT1_file");
        assert_eq!(sanitize_filename("COM10", 100), "COM10");
    }

    #[test]
    fn test_sanitize_truncates() {
        let long = "a".repeat(150);
        assert_eq!(sanitize_filename(&long, 100).len(), 100);

        let with_ext = format!("{}.txt", "b".repeat(150));
        let out = sanitize_filename(&with_ext, 20);
        assert_eq!(out, format!("{}.txt", "b".repeat(16)));
    }

    #[test]
    fn test_prepare_paths_unique() {
        let dir = tempdir().unwrap();
        let manager = OutputManager::new(dir.path(), AudioFormat::M4b).unwrap();

        let first = manager.prepare_paths("Homer", None).unwrap();
        assert!(first.markdown_path.ends_with("Homer.md"));
        assert!(first.tts_path.ends_with("Homer.txt"));
        assert!(first.audio_path.ends_with("Homer.m4b"));

        manager.write_text(&first.markdown_path, "# Homer\n").unwrap();
        let second = manager.prepare_paths("Homer", None).unwrap();
        assert!(second.markdown_path.ends_with("Homer_1.md"));
        assert!(second.audio_path.ends_with("Homer_1.m4b"));
    }

    #[test]
    fn test_explicit_filename_wins() {
        let dir = tempdir().unwrap();
        let manager = OutputManager::new(dir.path(), AudioFormat::Mp3).unwrap();
        let paths = manager.prepare_paths("Homer", Some("my notes")).unwrap();
        assert!(paths.markdown_path.ends_with("my_notes.md"));
    }

    #[test]
    fn test_write_and_traversal_guard() {
        let dir = tempdir().unwrap();
        let manager = OutputManager::new(dir.path().join("out"), AudioFormat::Mp3).unwrap();

        let target = manager.base_dir().join("a.txt");
        manager.write_bytes(&target, b"hello").unwrap();
        assert_eq!(std::fs::read(&target).unwrap(), b"hello");

        let escape = manager.base_dir().join("..").join("escape.txt");
        assert!(manager.write_text(&escape, "x").is_err());
        assert!(!dir.path().join("escape.txt").exists());
        assert!(manager.write_text(Path::new("/etc/wikivox-test"), "x").is_err());
    }
}
