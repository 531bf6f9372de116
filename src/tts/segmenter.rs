//! Splitting speech text into request-sized segments.
//!
//! Segments keep their character position in the source text so chapter
//! offsets can be mapped onto per-segment audio durations.

/// One piece of speech text sent in a single request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSegment {
    pub index: usize,
    /// Character offset of the first character in the source text.
    pub char_start: usize,
    pub text: String,
}

impl TextSegment {
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Break preference, strongest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Break {
    Space,
    Clause,
    Sentence,
    Line,
    Paragraph,
}

#[inline]
fn is_sentence_end(ch: char) -> bool {
    matches!(ch, '.' | '?' | '!' | '。' | '？' | '！')
}

#[inline]
fn is_clause_end(ch: char) -> bool {
    matches!(ch, ',' | ';' | ':' | '，' | '；' | '：')
}

/// Classify the break that falls just before `chars[i]`.
fn break_before(chars: &[char], i: usize) -> Option<Break> {
    let prev = *chars.get(i.checked_sub(1)?)?;
    let cur = *chars.get(i)?;
    if cur == '\n' && prev == '\n' {
        return Some(Break::Paragraph);
    }
    if cur == '\n' {
        return Some(Break::Line);
    }
    if !cur.is_whitespace() {
        return None;
    }
    if is_sentence_end(prev) {
        Some(Break::Sentence)
    } else if is_clause_end(prev) {
        Some(Break::Clause)
    } else {
        Some(Break::Space)
    }
}

/// Split `text` into segments of at most `max_chars` characters.
///
/// Whole paragraphs are packed together while they fit. Longer stretches are
/// cut at the strongest break in the window: line, sentence, clause, then
/// word; a run with no break at all is cut hard. Whitespace between segments
/// is not part of any segment.
pub fn segment_text(text: &str, max_chars: usize) -> Vec<TextSegment> {
    let max_chars = max_chars.max(1);
    let chars: Vec<char> = text.chars().collect();
    let mut segments = Vec::new();
    let mut pos = 0;

    loop {
        while pos < chars.len() && chars[pos].is_whitespace() {
            pos += 1;
        }
        if pos >= chars.len() {
            break;
        }

        let limit = (pos + max_chars).min(chars.len());
        let end = if limit == chars.len() {
            limit
        } else {
            best_break(&chars, pos, limit).unwrap_or(limit)
        };

        let mut stop = end;
        while stop > pos && chars[stop - 1].is_whitespace() {
            stop -= 1;
        }

        segments.push(TextSegment {
            index: segments.len(),
            char_start: pos,
            text: chars[pos..stop].iter().collect(),
        });
        pos = end;
    }

    segments
}

/// Position of the strongest break before `limit`, latest on ties.
///
/// The back half of the window is searched first so segments stay close to
/// the size limit; the front half is only used when the back half has none.
fn best_break(chars: &[char], start: usize, limit: usize) -> Option<usize> {
    let middle = start + (limit - start) / 2;
    strongest_in(chars, middle + 1, limit).or_else(|| strongest_in(chars, start + 1, middle))
}

fn strongest_in(chars: &[char], from: usize, to: usize) -> Option<usize> {
    let mut best: Option<(Break, usize)> = None;
    for i in from..=to {
        if let Some(kind) = break_before(chars, i) {
            if best.map_or(true, |(b, _)| kind >= b) {
                best = Some((kind, i));
            }
        }
    }
    best.map(|(_, i)| i)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(segments: &[TextSegment]) -> Vec<&str> {
        segments.iter().map(|s| s.text.as_str()).collect()
    }

    /// Every segment must be found at its recorded char offset.
    fn assert_offsets(source: &str, segments: &[TextSegment]) {
        let chars: Vec<char> = source.chars().collect();
        for seg in segments {
            let at: String = chars[seg.char_start..seg.char_start + seg.char_len()].iter().collect();
            assert_eq!(at, seg.text);
        }
    }

    #[test]
    fn test_short_text_single_segment() {
        let segs = segment_text("  Hello world.  ", 100);
        assert_eq!(texts(&segs), ["Hello world."]);
        assert_eq!(segs[0].char_start, 2);
    }

    #[test]
    fn test_empty_text() {
        assert!(segment_text("", 10).is_empty());
        assert!(segment_text(" \n\n ", 10).is_empty());
    }

    #[test]
    fn test_packs_paragraphs() {
        let text = "Title\n\nFirst para.\n\nSecond para.\n\nThird paragraph here.";
        let segs = segment_text(text, 35);
        assert_eq!(texts(&segs), ["Title\n\nFirst para.\n\nSecond para.", "Third paragraph here."]);
        assert_offsets(text, &segs);
    }

    #[test]
    fn test_break_choice_within_window() {
        let text = "One two. Three, four five six seven";
        let segs = segment_text(text, 20);
        assert_eq!(segs[0].text, "One two. Three,");
        assert_offsets(text, &segs);

        let segs = segment_text(text, 12);
        assert_eq!(segs[0].text, "One two.");
    }

    #[test]
    fn test_hard_split_without_breaks() {
        let segs = segment_text("abcdefghij", 4);
        assert_eq!(texts(&segs), ["abcd", "efgh", "ij"]);
        assert_eq!(segs[2].char_start, 8);
    }

    #[test]
    fn test_segments_bounded_and_ordered() {
        let text = "Zoë saw the Tsar. ".repeat(50);
        let segs = segment_text(&text, 64);
        assert!(segs.iter().all(|s| s.char_len() <= 64));
        for (i, pair) in segs.windows(2).enumerate() {
            assert_eq!(pair[0].index, i);
            assert!(pair[0].char_start + pair[0].char_len() <= pair[1].char_start);
        }
        assert_offsets(&text, &segs);
    }
}
