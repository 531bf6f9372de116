//! Turning raw article sections into a reading copy and speech text.

mod markup;
pub mod numbers;
pub mod rules;

pub use markup::{
    clean_for_reading, collapse_blank_lines, contains_marker, convert_wikitext_headers,
    split_wikitext_sections, strip_markup, strip_references, MARKER_CHARS,
};
pub use rules::{
    CenturyRule, LatinAbbreviationRule, PronunciationRule, RegnalNumeralRule, RuleSet, YearRule,
};

use crate::config::Settings;
use crate::wiki::RawArticle;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Where a spoken heading line starts in the speech text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadingOffset {
    pub heading_text: String,
    /// Offset in characters (not bytes) into `tts_text`.
    pub char_offset: usize,
}

/// Both output channels of one normalization pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedArticle {
    pub markdown_text: String,
    pub tts_text: String,
    /// Strictly increasing, one per spoken heading line.
    pub heading_offsets: Vec<HeadingOffset>,
}

#[derive(Debug, Clone)]
pub struct NormalizeOptions {
    /// Spoken before every heading, e.g. "Section: ". May be empty.
    pub heading_prefix: String,
    /// Convert years and centuries to words.
    pub enable_number_words: bool,
    /// Speak the article title as the first heading.
    pub include_title: bool,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            heading_prefix: String::new(),
            enable_number_words: false,
            include_title: true,
        }
    }
}

impl NormalizeOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            heading_prefix: settings.tts.heading_prefix.clone(),
            enable_number_words: settings.tts.normalize,
            ..Default::default()
        }
    }
}

/// Builds a [`NormalizedArticle`] from a [`RawArticle`]. Never fails.
pub struct TextNormalizer {
    rules: RuleSet,
}

impl TextNormalizer {
    pub fn new(rules: RuleSet) -> Self {
        Self { rules }
    }

    pub fn normalize(&self, raw: &RawArticle, options: &NormalizeOptions) -> NormalizedArticle {
        let markdown_text = render_markdown(raw);

        let prefix = speech_prefix(&options.heading_prefix);

        let mut speech = SpeechBuilder::default();
        if options.include_title {
            speech.heading(&prefix, &self.speak(&raw.title, options));
        }
        for section in &raw.sections {
            if !section.is_lead() {
                speech.heading(&prefix, &self.speak(&section.heading, options));
            }
            speech.paragraph(&self.speak(&section.body, options));
        }

        let (tts_text, heading_offsets) = speech.finish();
        debug!(
            "Normalized '{}': {} chars of speech, {} headings",
            raw.title,
            tts_text.chars().count(),
            heading_offsets.len()
        );

        NormalizedArticle {
            markdown_text,
            tts_text,
            heading_offsets,
        }
    }

    /// Markup removal followed by the pronunciation rules.
    pub fn normalize_text(&self, text: &str, enable_number_words: bool) -> String {
        let stripped = strip_markup(text);
        let rewritten = self.rules.apply(&stripped, enable_number_words);
        collapse_blank_lines(&rewritten).trim().to_string()
    }

    fn speak(&self, text: &str, options: &NormalizeOptions) -> String {
        self.normalize_text(text, options.enable_number_words)
    }
}

impl Default for TextNormalizer {
    fn default() -> Self {
        Self::new(RuleSet::standard())
    }
}

/// The heading prefix as spoken: marker characters dropped, line breaks
/// folded to spaces, nothing else touched.
fn speech_prefix(prefix: &str) -> String {
    let kept: String = prefix
        .chars()
        .filter(|c| !MARKER_CHARS.contains(c))
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .collect();
    kept.trim_start().to_string()
}

/// Normalize with the standard rule set.
pub fn normalize(raw: &RawArticle, options: &NormalizeOptions) -> NormalizedArticle {
    TextNormalizer::default().normalize(raw, options)
}

fn render_markdown(raw: &RawArticle) -> String {
    let mut blocks = vec![format!("# {}", raw.title.trim())];
    for section in &raw.sections {
        if !section.is_lead() {
            let level = section.level.clamp(2, 6) as usize;
            blocks.push(format!("{} {}", "#".repeat(level), section.heading.trim()));
        }
        let body = clean_for_reading(&section.body);
        if !body.is_empty() {
            blocks.push(body);
        }
    }
    let mut out = blocks.join("\n\n");
    out.push('\n');
    out
}

/// Accumulates speech text, recording heading offsets as they are written.
#[derive(Default)]
struct SpeechBuilder {
    text: String,
    chars: usize,
    offsets: Vec<HeadingOffset>,
}

impl SpeechBuilder {
    fn heading(&mut self, prefix: &str, heading: &str) {
        let heading = heading.replace('\n', " ");
        if heading.is_empty() {
            return;
        }
        self.separate();
        self.offsets.push(HeadingOffset {
            heading_text: heading.clone(),
            char_offset: self.chars,
        });
        self.push(prefix);
        self.push(&heading);
    }

    fn paragraph(&mut self, body: &str) {
        if body.is_empty() {
            return;
        }
        self.separate();
        self.push(body);
    }

    fn separate(&mut self) {
        if !self.text.is_empty() {
            self.push("\n\n");
        }
    }

    fn push(&mut self, s: &str) {
        self.text.push_str(s);
        self.chars += s.chars().count();
    }

    fn finish(self) -> (String, Vec<HeadingOffset>) {
        (self.text, self.offsets)
    }
}

/// Character offset to byte index, clamped to the end of `text`.
pub fn char_to_byte(text: &str, char_offset: usize) -> usize {
    text.char_indices()
        .nth(char_offset)
        .map(|(i, _)| i)
        .unwrap_or(text.len())
}
