//! Pronunciation rewrites for speech text.
//!
//! Each rule makes a single left-to-right pass, so nothing a rule writes is
//! fed back into the same rule. A rule that cannot make sense of a match
//! leaves it untouched.

use super::numbers;
use regex::{Captures, Regex};
use std::collections::HashSet;

/// A single text rewrite.
pub trait PronunciationRule: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    fn apply(&self, text: &str) -> String;

    /// Whether the rule only runs when number words are enabled.
    fn needs_number_words(&self) -> bool {
        false
    }
}

/// Names that take a regnal numeral ("Henry VIII", "Louis XIV", "Pius IX").
pub const DEFAULT_REGNAL_NAMES: &[&str] = &[
    "Alexander", "Alfonso", "Amenhotep", "Andronikos", "Anne", "Antiochus", "Baldwin", "Benedict",
    "Boniface", "Bolesław", "Canute", "Carlos", "Casimir", "Catherine", "Charles", "Christian",
    "Clement", "Constantine", "Darius", "David", "Edmund", "Edward", "Elizabeth", "Eric",
    "Felipe", "Ferdinand", "Francis", "Frederick", "George", "Gregory", "Gustav", "Gustavus",
    "Haakon", "Harald", "Henry", "Innocent", "Isabella", "Ivan", "James", "John", "Joseph",
    "Juan", "Karl", "Leo", "Leopold", "Louis", "Ludwig", "Malcolm", "Manuel", "Margaret", "Mary",
    "Mehmed", "Michael", "Murad", "Napoleon", "Nicholas", "Olaf", "Otto", "Paul", "Pedro",
    "Peter", "Philip", "Pius", "Ptolemy", "Ramesses", "Richard", "Robert", "Rudolf", "Sancho",
    "Selim", "Seti", "Sixtus", "Stephen", "Suleiman", "Thutmose", "Urban", "Victor", "Wilhelm",
    "William", "Xerxes",
];

/// Highest numeral read as a regnal number; "John MD" is not a king.
const MAX_REGNAL_NUMBER: u32 = 40;

/// "Henry VIII" -> "Henry the Eighth".
///
/// Fires only when the preceding word is in the name allow-list, so
/// "Article VIII" or "World War II" stay as written.
pub struct RegnalNumeralRule {
    names: HashSet<String>,
    pattern: Regex,
}

impl RegnalNumeralRule {
    pub fn new() -> Self {
        Self::with_names(DEFAULT_REGNAL_NAMES.iter().copied())
    }

    pub fn with_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            pattern: Regex::new(r"\b(\p{Lu}\p{Ll}+)([ \t]+)([IVXLCDM]+)\b").expect("Invalid regnal regex"),
        }
    }

    /// Add a name to the allow-list.
    pub fn allow(mut self, name: impl Into<String>) -> Self {
        self.names.insert(name.into());
        self
    }
}

impl Default for RegnalNumeralRule {
    fn default() -> Self {
        Self::new()
    }
}

impl PronunciationRule for RegnalNumeralRule {
    fn name(&self) -> &'static str {
        "regnal-numeral"
    }

    fn apply(&self, text: &str) -> String {
        self.pattern
            .replace_all(text, |caps: &Captures| {
                let name = &caps[1];
                if !self.names.contains(name) {
                    return caps[0].to_string();
                }
                let ordinal = numbers::roman_to_int(&caps[3])
                    .filter(|&n| n <= MAX_REGNAL_NUMBER)
                    .and_then(|n| numbers::ordinal(n as u64));
                match ordinal {
                    Some(words) => format!("{}{}the {}", name, &caps[2], capitalize(&words)),
                    None => caps[0].to_string(),
                }
            })
            .into_owned()
    }
}

/// "19th century" -> "nineteenth century", "3rd-millennium" -> "third-millennium".
pub struct CenturyRule {
    pattern: Regex,
}

impl CenturyRule {
    pub fn new() -> Self {
        Self {
            pattern: Regex::new(r"(?i)\b(\d{1,2})(st|nd|rd|th)([ \t-])(century|centuries|millennium|millennia)\b")
                .expect("Invalid century regex"),
        }
    }
}

impl Default for CenturyRule {
    fn default() -> Self {
        Self::new()
    }
}

impl PronunciationRule for CenturyRule {
    fn name(&self) -> &'static str {
        "century"
    }

    fn needs_number_words(&self) -> bool {
        true
    }

    fn apply(&self, text: &str) -> String {
        self.pattern
            .replace_all(text, |caps: &Captures| {
                let converted = caps[1]
                    .parse::<u64>()
                    .ok()
                    .filter(|&n| ordinal_suffix(n).eq_ignore_ascii_case(&caps[2]))
                    .and_then(numbers::ordinal);
                match converted {
                    Some(words) => format!("{}{}{}", words, &caps[3], &caps[4]),
                    None => caps[0].to_string(),
                }
            })
            .into_owned()
    }
}

/// "1066" -> "ten sixty-six", "1990s" -> "nineteen nineties".
///
/// Only 1000-2099 are treated as years. Digits that are part of a larger
/// number ("1,500", "3.1415") or an amount ("$1200") are left alone.
pub struct YearRule {
    pattern: Regex,
}

impl YearRule {
    pub fn new() -> Self {
        Self {
            pattern: Regex::new(r"\b(1\d{3}|20\d{2})(s)?\b").expect("Invalid year regex"),
        }
    }
}

impl Default for YearRule {
    fn default() -> Self {
        Self::new()
    }
}

impl PronunciationRule for YearRule {
    fn name(&self) -> &'static str {
        "year"
    }

    fn needs_number_words(&self) -> bool {
        true
    }

    fn apply(&self, text: &str) -> String {
        self.pattern
            .replace_all(text, |caps: &Captures| {
                let whole = caps.get(0).map(|m| (m.start(), m.end()));
                let embedded = whole.is_some_and(|(start, end)| is_embedded_number(text, start, end));
                let words = caps[1].parse::<u32>().ok().and_then(numbers::year);
                match words {
                    Some(words) if !embedded => match caps.get(2) {
                        Some(_) => numbers::pluralize_last(&words),
                        None => words,
                    },
                    _ => caps[0].to_string(),
                }
            })
            .into_owned()
    }
}

fn is_embedded_number(text: &str, start: usize, end: usize) -> bool {
    let mut before = text[..start].chars().rev();
    match (before.next(), before.next()) {
        (Some('$' | '£' | '€' | '¥' | '#'), _) => return true,
        (Some('.' | ','), Some(d)) if d.is_ascii_digit() => return true,
        _ => {}
    }
    let mut after = text[end..].chars();
    matches!(
        (after.next(), after.next()),
        (Some('.' | ','), Some(d)) if d.is_ascii_digit()
    )
}

/// "e.g." -> "for example", "c. 1500" -> "circa 1500" and friends.
pub struct LatinAbbreviationRule {
    pattern: Regex,
    circa: Regex,
}

const LATIN_ABBREVIATIONS: &[(&str, &str)] = &[
    ("e.g.", "for example"),
    ("i.e.", "that is"),
    ("etc.", "et cetera"),
    ("et al.", "and others"),
    ("cf.", "compare"),
    ("viz.", "namely"),
    ("vs.", "versus"),
    ("ca.", "circa"),
    ("fl.", "flourished"),
    ("n.b.", "note"),
];

impl LatinAbbreviationRule {
    pub fn new() -> Self {
        let alternatives = LATIN_ABBREVIATIONS
            .iter()
            .map(|(abbr, _)| regex::escape(abbr))
            .collect::<Vec<_>>()
            .join("|");
        Self {
            pattern: Regex::new(&format!(r"(?i)\b(?:{})", alternatives)).expect("Invalid abbreviation regex"),
            circa: Regex::new(r"\bc\.[ \t]?(\d)").expect("Invalid circa regex"),
        }
    }
}

impl Default for LatinAbbreviationRule {
    fn default() -> Self {
        Self::new()
    }
}

impl PronunciationRule for LatinAbbreviationRule {
    fn name(&self) -> &'static str {
        "latin-abbreviation"
    }

    fn apply(&self, text: &str) -> String {
        let expanded = self.pattern.replace_all(text, |caps: &Captures| {
            let Some(m) = caps.get(0) else {
                return String::new();
            };
            let Some((abbr, spoken)) = LATIN_ABBREVIATIONS
                .iter()
                .find(|(abbr, _)| abbr.eq_ignore_ascii_case(m.as_str()))
            else {
                return m.as_str().to_string();
            };
            // The abbreviation's period also closed the sentence.
            if ends_sentence(abbr, &text[m.end()..]) {
                format!("{}.", spoken)
            } else {
                spoken.to_string()
            }
        });
        self.circa.replace_all(&expanded, "circa $1").into_owned()
    }
}

/// Only "etc." and "et al." are read as closing a sentence mid-paragraph;
/// "e.g. Paris" keeps running on.
fn ends_sentence(abbr: &str, rest: &str) -> bool {
    let trimmed = rest.trim_start_matches([' ', '\t']);
    match trimmed.chars().next() {
        None | Some('\n') => true,
        Some(c) if matches!(abbr, "etc." | "et al.") => c.is_uppercase() && rest.len() > trimmed.len(),
        Some(_) => false,
    }
}

fn ordinal_suffix(n: u64) -> &'static str {
    match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Ordered list of rules applied to every piece of speech text.
pub struct RuleSet {
    rules: Vec<Box<dyn PronunciationRule>>,
}

impl RuleSet {
    pub fn new(rules: Vec<Box<dyn PronunciationRule>>) -> Self {
        Self { rules }
    }

    /// Regnal numerals, then centuries and years, then Latin abbreviations.
    pub fn standard() -> Self {
        Self::new(vec![
            Box::new(RegnalNumeralRule::new()),
            Box::new(CenturyRule::new()),
            Box::new(YearRule::new()),
            Box::new(LatinAbbreviationRule::new()),
        ])
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// Run every rule in order, skipping number rules unless `number_words` is set.
    pub fn apply(&self, text: &str, number_words: bool) -> String {
        self.rules
            .iter()
            .filter(|rule| number_words || !rule.needs_number_words())
            .fold(text.to_string(), |acc, rule| rule.apply(&acc))
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::standard()
    }
}
