//! Shared text normalization and comparison utilities
//!
//! Every title comparison in the crate goes through [`sanitize_title`] so that
//! release names ("The.Matrix.1999.1080p") and metadata titles ("The Matrix")
//! end up in the same token form.

use once_cell::sync::Lazy;
use regex::Regex;

static SEPARATORS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.\-_:\s]+").expect("separator regex"));
static BRACKETS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\[\](){}<>]").expect("bracket regex"));
// Word characters, whitespace and Latin accented letters survive.
static DISALLOWED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\w\s\u{00C0}-\u{024F}]").expect("disallowed regex"));
static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(19|20)\d{2}$").expect("year regex"));

/// Locale-specific transliteration applied after lowercasing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Transliteration {
    /// Accented letters are kept as-is
    #[default]
    None,
    /// German umlauts: ä→ae, ö→oe, ü→ue, ß→ss
    GermanUmlauts,
}

impl Transliteration {
    fn apply(self, text: &str) -> String {
        match self {
            Transliteration::None => text.to_string(),
            Transliteration::GermanUmlauts => {
                let mut out = String::with_capacity(text.len() + 4);
                for c in text.chars() {
                    match c {
                        'ä' => out.push_str("ae"),
                        'ö' => out.push_str("oe"),
                        'ü' => out.push_str("ue"),
                        'ß' => out.push_str("ss"),
                        other => out.push(other),
                    }
                }
                out
            }
        }
    }
}

/// Normalize a title into its comparison-safe token form.
///
/// `&` becomes `and`, separators and brackets become single spaces, anything
/// that is not a word character, whitespace or Latin accented letter is
/// dropped, and the result is lowercased and trimmed. Total: never fails.
pub fn sanitize_title(title: &str) -> String {
    sanitize_title_with(title, Transliteration::None)
}

/// [`sanitize_title`] with an explicit transliteration table
pub fn sanitize_title_with(title: &str, transliteration: Transliteration) -> String {
    let expanded = title.replace('&', " and ");
    let spaced = SEPARATORS_RE.replace_all(&expanded, " ");
    let unbracketed = BRACKETS_RE.replace_all(&spaced, " ");
    let stripped = DISALLOWED_RE.replace_all(&unbracketed, "");
    let lowered = transliteration.apply(&stripped.to_lowercase());

    lowered.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Split an already sanitized title into words
pub fn words(sanitized: &str) -> Vec<&str> {
    sanitized.split_whitespace().collect()
}

/// Whether a single token is a plausible release year (1900-2099)
pub fn is_year_token(token: &str) -> bool {
    YEAR_RE.is_match(token)
}

/// Drop every year token from a word list
pub fn without_years<'a>(tokens: &[&'a str]) -> Vec<&'a str> {
    tokens.iter().copied().filter(|t| !is_year_token(t)).collect()
}
