//! Number-to-words conversion for speech.
//!
//! Every converter returns `None` for values it does not handle so callers can
//! leave the original digits in place.

const ONES: [&str; 20] = [
    "zero", "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten",
    "eleven", "twelve", "thirteen", "fourteen", "fifteen", "sixteen", "seventeen", "eighteen",
    "nineteen",
];

const TENS: [&str; 10] = [
    "", "", "twenty", "thirty", "forty", "fifty", "sixty", "seventy", "eighty", "ninety",
];

const SCALES: [(u64, &str); 3] = [
    (1_000_000_000, "billion"),
    (1_000_000, "million"),
    (1_000, "thousand"),
];

/// Largest value [`cardinal`] converts.
pub const MAX_CARDINAL: u64 = 999_999_999_999;

fn below_hundred(n: u64) -> String {
    debug_assert!(n < 100);
    if n < 20 {
        ONES[n as usize].to_string()
    } else if n % 10 == 0 {
        TENS[(n / 10) as usize].to_string()
    } else {
        format!("{}-{}", TENS[(n / 10) as usize], ONES[(n % 10) as usize])
    }
}

fn below_thousand(n: u64) -> String {
    debug_assert!(n < 1000);
    let hundreds = n / 100;
    let rest = n % 100;
    match (hundreds, rest) {
        (0, r) => below_hundred(r),
        (h, 0) => format!("{} hundred", ONES[h as usize]),
        (h, r) => format!("{} hundred {}", ONES[h as usize], below_hundred(r)),
    }
}

/// Cardinal words, e.g. `1066` -> "one thousand sixty-six".
pub fn cardinal(n: u64) -> Option<String> {
    if n > MAX_CARDINAL {
        return None;
    }
    if n < 1000 {
        return Some(below_thousand(n));
    }

    let mut parts = Vec::new();
    let mut rest = n;
    for (scale, name) in SCALES {
        if rest >= scale {
            parts.push(format!("{} {}", below_thousand(rest / scale), name));
            rest %= scale;
        }
    }
    if rest > 0 {
        parts.push(below_thousand(rest));
    }
    Some(parts.join(" "))
}

/// Ordinal words, e.g. `21` -> "twenty-first".
pub fn ordinal(n: u64) -> Option<String> {
    if n == 0 {
        return None;
    }
    let words = cardinal(n)?;
    let split = words.rfind([' ', '-']).map(|i| i + 1).unwrap_or(0);
    let (head, last) = words.split_at(split);

    let last = match last {
        "one" => "first".to_string(),
        "two" => "second".to_string(),
        "three" => "third".to_string(),
        "five" => "fifth".to_string(),
        "eight" => "eighth".to_string(),
        "nine" => "ninth".to_string(),
        "twelve" => "twelfth".to_string(),
        w if w.ends_with('y') => format!("{}ieth", &w[..w.len() - 1]),
        w => format!("{}th", w),
    };
    Some(format!("{}{}", head, last))
}

/// Year words the way years are read aloud.
///
/// `1066` -> "ten sixty-six", `1905` -> "nineteen oh five",
/// `1900` -> "nineteen hundred", `2005` -> "two thousand five".
pub fn year(y: u32) -> Option<String> {
    if !(1000..=9999).contains(&y) {
        return None;
    }
    let y = y as u64;
    if y % 1000 == 0 || (y > 2000 && y < 2010) {
        return cardinal(y);
    }

    let high = below_hundred(y / 100);
    let low = y % 100;
    Some(match low {
        0 => format!("{} hundred", high),
        1..=9 => format!("{} oh {}", high, ONES[low as usize]),
        _ => format!("{} {}", high, below_hundred(low)),
    })
}

/// Plural of the last word of a number phrase: "ninety" -> "nineties".
pub fn pluralize_last(words: &str) -> String {
    if let Some(stem) = words.strip_suffix('y') {
        format!("{}ies", stem)
    } else if words.ends_with('x') {
        format!("{}es", words)
    } else {
        format!("{}s", words)
    }
}

/// Parse a canonical Roman numeral (`I` to `MMMCMXCIX`).
///
/// Non-canonical spellings such as `IIII` or `VX` are rejected.
pub fn roman_to_int(s: &str) -> Option<u32> {
    if s.is_empty() {
        return None;
    }

    let value_of = |c: char| match c {
        'I' => Some(1),
        'V' => Some(5),
        'X' => Some(10),
        'L' => Some(50),
        'C' => Some(100),
        'D' => Some(500),
        'M' => Some(1000),
        _ => None,
    };

    let values: Vec<u32> = s.chars().map(value_of).collect::<Option<_>>()?;
    let mut total = 0;
    for (i, &v) in values.iter().enumerate() {
        match values.get(i + 1) {
            Some(&next) if next > v => total -= v as i64,
            _ => total += v as i64,
        }
    }

    let total = u32::try_from(total).ok().filter(|&t| t > 0 && t < 4000)?;
    (int_to_roman(total) == s).then_some(total)
}

fn int_to_roman(mut n: u32) -> String {
    const TABLE: [(u32, &str); 13] = [
        (1000, "M"), (900, "CM"), (500, "D"), (400, "CD"), (100, "C"), (90, "XC"),
        (50, "L"), (40, "XL"), (10, "X"), (9, "IX"), (5, "V"), (4, "IV"), (1, "I"),
    ];
    let mut out = String::new();
    for (value, numeral) in TABLE {
        while n >= value {
            out.push_str(numeral);
            n -= value;
        }
    }
    out
}
