//! Title matcher: decides whether a file title corresponds to a search query
//!
//! Loose mode tolerates punctuation and ordering drift. Strict mode is the
//! anti-false-positive path: a file whose title merely *contains* the queried
//! title ("How The States Got Their Shapes S01E01" for "The States S01E01") must
//! never match.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::trace;

use super::metadata::{ContentKind, MediaQuery};
use super::release_parser::parse_release;
use super::text_utils::{Transliteration, is_year_token, sanitize_title_with, without_years, words};

static EPISODE_TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bs\d+e\d+\b").expect("episode token regex"));

/// Minimum share of significant query words a multi-word loose match needs
const LOOSE_WORD_RATIO: f64 = 0.7;
/// Words this short are ignored by loose matching
const MIN_SIGNIFICANT_LEN: usize = 2;

/// The query side of a match: display text plus the facts strict mode needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchQuery {
    /// Title, optionally followed by an "SxxEyy" token
    pub text: String,
    pub year: Option<u32>,
    pub kind: ContentKind,
}

impl MatchQuery {
    pub fn new(text: impl Into<String>, year: Option<u32>, kind: ContentKind) -> Self {
        Self {
            text: text.into(),
            year,
            kind,
        }
    }

    /// Build the query for one title variant of a media query
    pub fn for_variant(variant: &str, query: &MediaQuery) -> Self {
        let text = match query.episode_tag().filter(|_| query.is_series()) {
            Some(tag) => format!("{} {}", variant, tag),
            None => variant.to_string(),
        };
        Self::new(text, query.year, query.kind)
    }
}

/// Strict and loose title matching over sanitized titles
#[derive(Debug, Clone, Copy, Default)]
pub struct TitleMatcher {
    transliteration: Transliteration,
}

impl TitleMatcher {
    pub fn new(transliteration: Transliteration) -> Self {
        Self { transliteration }
    }

    fn sanitize(&self, text: &str) -> String {
        sanitize_title_with(text, self.transliteration)
    }

    /// Whether `candidate` is a file for `query`
    pub fn matches(&self, candidate: &str, query: &MatchQuery, strict: bool) -> bool {
        let candidate_clean = self.sanitize(candidate);
        let query_clean = self.sanitize(&query.text);
        if query_clean.is_empty() || candidate_clean.is_empty() {
            return false;
        }

        let matched = if strict {
            self.matches_strict(candidate, &candidate_clean, &query_clean, query)
        } else {
            matches_loose(&candidate_clean, &query_clean)
        };

        trace!(
            candidate = candidate,
            query = %query.text,
            strict = strict,
            matched = matched,
            "Title match"
        );
        matched
    }

    /// Whether `candidate` matches any of the queries
    pub fn matches_any(&self, candidate: &str, queries: &[MatchQuery], strict: bool) -> bool {
        queries.iter().any(|q| self.matches(candidate, q, strict))
    }

    fn matches_strict(
        &self,
        candidate_raw: &str,
        candidate: &str,
        query: &str,
        match_query: &MatchQuery,
    ) -> bool {
        let (query_title, query_episode) = split_episode_token(query);
        let query_words = words(query_title);
        if query_words.is_empty() {
            return false;
        }

        let (candidate_prefix, candidate_episode) = split_episode_token(candidate);

        if let Some(query_episode) = query_episode {
            // Episode queries: the words before the marker must be exactly the
            // query title, optionally followed by a release year.
            if candidate_episode != Some(query_episode) {
                return false;
            }
            return prefix_equals(&words(candidate_prefix), &query_words);
        }

        if let Some(candidate_episode) = candidate_episode
            && match_query.kind != ContentKind::Series
        {
            trace!(episode = candidate_episode, "Episode file rejected for non-episode query");
            return false;
        }

        if match_query.kind == ContentKind::Series {
            // Whole-series queries only anchor on the title prefix.
            let candidate_words = words(candidate_prefix);
            if candidate_words.len() < query_words.len() {
                return false;
            }
            return candidate_words[..query_words.len()] == query_words[..];
        }

        self.matches_parsed_title(candidate_raw, &query_words, match_query.year)
    }

    /// Movie path: the release title parsed from the file name must equal the
    /// query title, either exactly or with years removed and the years equal.
    fn matches_parsed_title(&self, candidate_raw: &str, query_words: &[&str], query_year: Option<u32>) -> bool {
        let parsed = parse_release(candidate_raw);
        let parsed_clean = self.sanitize(&parsed.title);
        let parsed_words = words(&parsed_clean);

        let significant = |ws: &[&str]| ws.iter().filter(|w| w.len() > MIN_SIGNIFICANT_LEN).count();
        if significant(&parsed_words) > significant(query_words) {
            return false;
        }

        if parsed_words == query_words {
            return true;
        }

        let parsed_no_year = without_years(&parsed_words);
        let query_no_year = without_years(query_words);
        if parsed_no_year.is_empty() || parsed_no_year != query_no_year {
            return false;
        }

        let candidate_year = parsed.year.or_else(|| {
            parsed_words
                .iter()
                .rev()
                .find(|w| is_year_token(w))
                .and_then(|w| w.parse().ok())
        });
        let query_year = query_year.or_else(|| {
            query_words
                .iter()
                .rev()
                .find(|w| is_year_token(w))
                .and_then(|w| w.parse().ok())
        });

        matches!((candidate_year, query_year), (Some(a), Some(b)) if a == b)
    }
}

/// Loose matching over sanitized strings
fn matches_loose(candidate: &str, query: &str) -> bool {
    if let Some(token) = EPISODE_TOKEN_RE.find(query) {
        return EPISODE_TOKEN_RE
            .find_iter(candidate)
            .any(|m| m.as_str() == token.as_str());
    }

    let query_words = words(query);
    let significant: Vec<&str> = query_words
        .iter()
        .copied()
        .filter(|w| w.len() > MIN_SIGNIFICANT_LEN)
        .collect();

    if significant.is_empty() {
        // "Up", "It": nothing to anchor on except the whole title as words
        return contains_word_sequence(&words(candidate), &query_words);
    }

    let found = significant.iter().filter(|w| candidate.contains(*w)).count();
    if found == significant.len() {
        return true;
    }

    query_words.len() > 1 && (found as f64 / significant.len() as f64) >= LOOSE_WORD_RATIO
}

/// Split a sanitized title at its first "sxxeyy" token
fn split_episode_token(sanitized: &str) -> (&str, Option<&str>) {
    match EPISODE_TOKEN_RE.find(sanitized) {
        Some(m) => (sanitized[..m.start()].trim_end(), Some(m.as_str())),
        None => (sanitized, None),
    }
}

/// Candidate words equal the query words, with an optional trailing year on
/// the candidate side
fn prefix_equals(candidate: &[&str], query: &[&str]) -> bool {
    if candidate == query {
        return true;
    }
    match candidate.split_last() {
        Some((last, rest)) if is_year_token(last) => rest == query,
        _ => false,
    }
}

fn contains_word_sequence(haystack: &[&str], needle: &[&str]) -> bool {
    !needle.is_empty() && haystack.windows(needle.len()).any(|w| w == needle)
}
