//! Name and score hygiene.
//!
//! The client runs these before every write and again on every read. The server
//! checks incoming documents with [`is_valid_name`] and [`is_recordable_score`].

use serde_json::Value;

/// Name used when nothing usable is left after cleaning.
pub const DEFAULT_NAME: &str = "Player";

/// Longest stored name, in characters.
pub const MAX_NAME_LEN: usize = 24;

/// Highest storable score.
pub const MAX_SCORE: u32 = 1_000_000;

const URL_SCHEMES: [&str; 2] = ["http://", "https://"];
const WWW_PREFIX: [&str; 1] = ["www."];

fn is_allowed_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | ' ')
}

/// Remove every run that starts with one of `prefixes` (ASCII, case-insensitive)
/// and continues up to the next whitespace. A prefix followed directly by
/// whitespace or the end of input is left alone.
fn strip_prefixed_runs(input: &str, prefixes: &[&str]) -> String {
    let bytes = input.as_bytes();
    let mut out = String::with_capacity(input.len());
    let mut chars = input.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        let matched = prefixes.iter().find(|prefix| {
            let end = i + prefix.len();
            end <= bytes.len()
                && bytes[i..end].eq_ignore_ascii_case(prefix.as_bytes())
                && input[end..].chars().next().is_some_and(|next| !next.is_whitespace())
        });

        if matched.is_some() {
            while let Some((_, next)) = chars.peek() {
                if next.is_whitespace() {
                    break;
                }
                chars.next();
            }
        } else {
            out.push(c);
        }
    }

    out
}

fn collapse_whitespace(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_run = false;

    for c in input.chars() {
        if c.is_whitespace() {
            if !in_run {
                out.push(' ');
            }
            in_run = true;
        } else {
            out.push(c);
            in_run = false;
        }
    }

    out
}

/// Clean a player name for storage.
///
/// Trims, strips URLs, collapses whitespace, drops anything outside
/// `[A-Za-z0-9_.- ]`, falls back to [`DEFAULT_NAME`] and truncates to
/// [`MAX_NAME_LEN`]. URLs are gone before truncation so a long link can never
/// leave a fragment behind.
pub fn sanitize_name(input: &str) -> String {
    let stripped = strip_prefixed_runs(input.trim(), &URL_SCHEMES);
    let stripped = strip_prefixed_runs(&stripped, &WWW_PREFIX);

    let filtered: String = collapse_whitespace(&stripped)
        .chars()
        .filter(|c| is_allowed_char(*c))
        .collect();

    let mut name = filtered.trim().to_string();
    if name.is_empty() {
        return DEFAULT_NAME.to_string();
    }

    // Only ASCII survives the filter, so byte and char counts agree.
    name.truncate(MAX_NAME_LEN);
    name.truncate(name.trim_end().len());
    name
}

/// Truncate toward zero and clamp into `[0, MAX_SCORE]`. Non-finite input is 0.
pub fn clamp_score(input: f64) -> u32 {
    if !input.is_finite() {
        return 0;
    }

    let truncated = input.trunc();
    if truncated <= 0.0 {
        0
    } else if truncated >= MAX_SCORE as f64 {
        MAX_SCORE
    } else {
        truncated as u32
    }
}

/// Zero is a legal stored value on read but never worth recording.
pub fn is_recordable_score(score: u32) -> bool {
    score > 0 && score <= MAX_SCORE
}

/// Whether `name` is already in stored form.
pub fn is_valid_name(name: &str) -> bool {
    let len = name.chars().count();
    (1..=MAX_NAME_LEN).contains(&len) && name.chars().all(is_allowed_char)
}

/// Normalize a raw stored `score` field. Anything that is not a number reads as 0.
pub fn score_from_value(value: Option<&Value>) -> u32 {
    value.and_then(Value::as_f64).map(clamp_score).unwrap_or(0)
}

/// Normalize a raw stored `name` field. Strings and numbers are sanitized; any
/// other value reads as [`DEFAULT_NAME`].
pub fn name_from_value(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => sanitize_name(s),
        Some(Value::Number(n)) => sanitize_name(&n.to_string()),
        _ => DEFAULT_NAME.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_url_is_stripped_from_name() {
        assert_eq!(sanitize_name("Alice123 https://evil.com"), "Alice123");
        assert_eq!(sanitize_name("HTTP://EVIL.COM/x Bob"), "Bob");
        assert_eq!(sanitize_name("visit www.spam.io now"), "visit now");
    }

    #[test]
    fn test_url_stripped_before_truncation() {
        let input = format!("ab https://{}", "x".repeat(100));
        assert_eq!(sanitize_name(&input), "ab");
    }

    #[test]
    fn test_bare_scheme_is_not_a_url() {
        // Nothing follows the scheme, so only the punctuation filter applies.
        assert_eq!(sanitize_name("http://"), "http");
    }

    #[test]
    fn test_disallowed_characters_dropped() {
        assert_eq!(sanitize_name("<b>Zoë</b>!"), "bZob");
        assert_eq!(sanitize_name("  a   b\t\tc  "), "a b c");
        assert_eq!(sanitize_name("dash-dot.under_score"), "dash-dot.under_score");
    }

    #[test]
    fn test_empty_name_defaults() {
        assert_eq!(sanitize_name(""), DEFAULT_NAME);
        assert_eq!(sanitize_name("   "), DEFAULT_NAME);
        assert_eq!(sanitize_name("!!!@@@"), DEFAULT_NAME);
        assert_eq!(sanitize_name("https://only.a.link"), DEFAULT_NAME);
    }

    #[test]
    fn test_sanitized_names_are_always_valid() {
        let inputs = [
            "",
            "a",
            "Alice123 https://evil.com",
            "日本語のなまえ",
            "this name is definitely much longer than twenty four characters",
            "tab\tand\nnewline",
            "x                                                  y",
            "www.",
            "wWw.example.com",
        ];

        for input in inputs {
            let name = sanitize_name(input);
            assert!(is_valid_name(&name), "{:?} -> {:?}", input, name);
            assert_eq!(name, name.trim(), "{:?}", input);
        }
    }

    #[test]
    fn test_clamp_score_bounds() {
        assert_eq!(clamp_score(4_999_999.7), MAX_SCORE);
        assert_eq!(clamp_score(-5.0), 0);
        assert_eq!(clamp_score(-0.5), 0);
        assert_eq!(clamp_score(41.99), 41);
        assert_eq!(clamp_score(1_000_000.0), MAX_SCORE);
        assert_eq!(clamp_score(f64::NAN), 0);
        assert_eq!(clamp_score(f64::INFINITY), 0);
        assert_eq!(clamp_score(f64::NEG_INFINITY), 0);
    }

    #[test]
    fn test_recordable_score() {
        assert!(!is_recordable_score(0));
        assert!(is_recordable_score(1));
        assert!(is_recordable_score(MAX_SCORE));
        assert!(!is_recordable_score(MAX_SCORE + 1));
    }

    #[test]
    fn test_raw_field_normalization() {
        assert_eq!(score_from_value(Some(&json!(2_000_000))), MAX_SCORE);
        assert_eq!(score_from_value(Some(&json!("500"))), 0);
        assert_eq!(score_from_value(None), 0);

        assert_eq!(name_from_value(None), DEFAULT_NAME);
        assert_eq!(name_from_value(Some(&json!(""))), DEFAULT_NAME);
        assert_eq!(name_from_value(Some(&json!({ "nested": true }))), DEFAULT_NAME);
        assert_eq!(name_from_value(Some(&json!(7))), "7");
        assert_eq!(name_from_value(Some(&json!(true))), DEFAULT_NAME);
        assert_eq!(name_from_value(Some(&json!("Eve <3"))), "Eve 3");
    }
}
