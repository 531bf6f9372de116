//! Wikitext structure and markup cleanup.

use crate::wiki::Section;
use regex::Regex;
use std::sync::LazyLock;

/// Characters that must never reach the speech engine.
pub const MARKER_CHARS: &[char] = &['#', '*', '_', '|', '`', '[', ']', '{', '}'];

static HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(={2,6})\s*(.+?)\s*={2,6}\s*$").expect("Invalid heading regex")
});

static REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\[(?:\d{1,3}|[a-z]|note \d+|nb \d+|edit|citation needed|clarification needed|better source needed|page needed|dubious[^\]]*|who\?|when\?|by whom\?|according to whom\?|sic)\]",
    )
    .expect("Invalid reference regex")
});

static BLANK_LINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n[ \t]*(?:\n[ \t]*)+").expect("Invalid blank line regex"));

static MD_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\([^)]*\)").expect("Invalid link regex"));

static EMPHASIS: LazyLock<[Regex; 5]> = LazyLock::new(|| {
    [
        r"\*\*\*(.+?)\*\*\*",
        r"\*\*(.+?)\*\*",
        r"\*(\S.*?)\*",
        r"__(.+?)__",
        r"`([^`]+)`",
    ]
    .map(|p| Regex::new(p).expect("Invalid emphasis regex"))
});

static BULLET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*(?:[-*+•]|#+)[ \t]+").expect("Invalid bullet regex"));

static TABLE_PIPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t]*\|+[ \t]*").expect("Invalid pipe regex"));

static SPACES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t]{2,}").expect("Invalid space regex"));

/// Split a plain-text extract into sections.
///
/// Text before the first heading becomes the lead section. A section with no
/// body is dropped unless a deeper section follows it.
pub fn split_wikitext_sections(text: &str) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut current = Section::lead("");
    let mut body: Vec<&str> = Vec::new();

    for line in text.lines() {
        if let Some(caps) = HEADING.captures(line) {
            current.body = body.join("\n").trim().to_string();
            sections.push(current);
            body.clear();
            current = Section::new(caps[2].trim(), caps[1].len() as u8, "");
        } else {
            body.push(line);
        }
    }
    current.body = body.join("\n").trim().to_string();
    sections.push(current);

    drop_empty_sections(sections)
}

fn drop_empty_sections(sections: Vec<Section>) -> Vec<Section> {
    let mut kept = Vec::with_capacity(sections.len());
    let mut next_level: Option<u8> = None;

    for section in sections.into_iter().rev() {
        let has_children = !section.is_lead() && next_level.is_some_and(|l| l > section.level);
        if !section.body.is_empty() || has_children {
            next_level = Some(section.level);
            kept.push(section);
        }
    }
    kept.reverse();
    kept
}

/// Rewrite `== X ==` heading lines as markdown `## X`.
pub fn convert_wikitext_headers(text: &str) -> String {
    text.lines()
        .map(|line| match HEADING.captures(line) {
            Some(caps) => format!("{} {}", "#".repeat(caps[1].len()), caps[2].trim()),
            None => line.to_string(),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Remove reference and maintenance brackets such as `[1]` or `[citation needed]`.
pub fn strip_references(text: &str) -> String {
    REFERENCE.replace_all(text, "").into_owned()
}

/// Collapse runs of blank lines into one blank line.
pub fn collapse_blank_lines(text: &str) -> String {
    BLANK_LINES.replace_all(text, "\n\n").into_owned()
}

/// Light cleanup for the reading copy. Emphasis and headings survive.
pub fn clean_for_reading(text: &str) -> String {
    collapse_blank_lines(&strip_references(text)).trim().to_string()
}

/// Remove every structural marker, keeping the words they wrapped.
pub fn strip_markup(text: &str) -> String {
    let mut out = strip_references(text);
    out = MD_LINK.replace_all(&out, "$1").into_owned();
    for re in EMPHASIS.iter() {
        out = re.replace_all(&out, "$1").into_owned();
    }
    out = BULLET.replace_all(&out, "").into_owned();
    out = TABLE_PIPE.replace_all(&out, ", ").into_owned();

    let mut cleaned: String = out
        .chars()
        .filter_map(|c| match c {
            '_' => Some(' '),
            c if MARKER_CHARS.contains(&c) => None,
            c => Some(c),
        })
        .collect();

    cleaned = cleaned
        .lines()
        .map(|line| {
            let line = SPACES.replace_all(line, " ");
            line.trim().trim_start_matches(", ").trim_end_matches(',').trim().to_string()
        })
        .collect::<Vec<_>>()
        .join("\n");

    collapse_blank_lines(&cleaned).trim().to_string()
}

/// Whether `text` still holds a marker character.
pub fn contains_marker(text: &str) -> bool {
    text.contains(MARKER_CHARS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_lead_and_levels() {
        let text = "Homer was a poet.\n\n== Life ==\nUnknown.\n=== Birth ===\nIonia.\n";
        let sections = split_wikitext_sections(text);
        assert_eq!(sections.len(), 3);
        assert!(sections[0].is_lead());
        assert_eq!(sections[0].body, "Homer was a poet.");
        assert_eq!(sections[1].heading, "Life");
        assert_eq!(sections[1].level, 2);
        assert_eq!(sections[2].heading, "Birth");
        assert_eq!(sections[2].level, 3);
        assert_eq!(sections[2].body, "Ionia.");
    }

    #[test]
    fn test_split_drops_empty_sections() {
        let text = "Lead.\n== Works ==\n=== Iliad ===\nWar.\n== See also ==\n\n== References ==\n";
        let sections = split_wikitext_sections(text);
        let headings: Vec<_> = sections.iter().map(|s| s.heading.as_str()).collect();
        assert_eq!(headings, ["Introduction", "Works", "Iliad"]);
    }

    #[test]
    fn test_split_without_lead() {
        let sections = split_wikitext_sections("== Only ==\nBody");
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].heading, "Only");
    }

    #[test]
    fn test_convert_headers() {
        let text = "Intro\n== History ==\nText\n=== Early ===";
        assert_eq!(convert_wikitext_headers(text), "Intro\n## History\nText\n### Early");
    }

    #[test]
    fn test_strip_references() {
        assert_eq!(
            strip_references("Born in 1491.[1][a] Disputed.[citation needed]"),
            "Born in 1491. Disputed."
        );
        assert_eq!(strip_references("Keep [this phrase] intact"), "Keep [this phrase] intact");
    }

    #[test]
    fn test_strip_markup_removes_markers() {
        let text = "## Heading\n\n- **bold** item\n* *italic* item\n| a | b |\nSee [link](http://x) `code` snake_case";
        let out = strip_markup(text);
        assert!(!contains_marker(&out), "{out}");
        assert!(out.contains("bold item"));
        assert!(out.contains("italic item"));
        assert!(out.contains("a, b"));
        assert!(out.contains("See link code snake case"));
        assert!(out.starts_with("Heading"));
    }

    #[test]
    fn test_strip_markup_idempotent() {
        let once = strip_markup("* one\n\n\n\n| x | y |\n[2]Text");
        assert_eq!(strip_markup(&once), once);
    }

    #[test]
    fn test_clean_for_reading_keeps_emphasis() {
        assert_eq!(clean_for_reading("**Bold**[3]\n\n\n\nNext"), "**Bold**\n\nNext");
    }
}
