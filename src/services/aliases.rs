//! Title aliases and search-variant generation
//!
//! Both the custom title dictionary and the alternate names returned by a
//! metadata provider are [`AliasSource`]s. The variant generator only sees the
//! trait, so it never special-cases where an alias came from.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, info};

/// Something that knows other names for a title
pub trait AliasSource: Send + Sync {
    /// Aliases keyed by this exact title
    fn exact_aliases(&self, title: &str) -> Vec<String>;

    /// Titles produced by partial (substring) lookups. Empty by default.
    fn partial_aliases(&self, _title: &str) -> Vec<String> {
        Vec::new()
    }
}

/// Custom title dictionary: canonical title → ordered alternate titles.
///
/// Loaded once at startup from a JSON object and read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TitleDictionary {
    entries: BTreeMap<String, Vec<String>>,
}

impl TitleDictionary {
    pub fn new(entries: BTreeMap<String, Vec<String>>) -> Self {
        Self { entries }
    }

    /// Parse `{ "Title": ["Alias", ...] }`
    pub fn from_json(json: &str) -> Result<Self> {
        let entries: BTreeMap<String, Vec<String>> =
            serde_json::from_str(json).context("Invalid title dictionary JSON")?;
        Ok(Self::new(entries))
    }

    /// Load the dictionary file, or an empty dictionary when no path is configured
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            debug!("No custom title dictionary configured");
            return Ok(Self::default());
        };

        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read title dictionary {}", path.display()))?;
        let dictionary = Self::from_json(&json)
            .with_context(|| format!("Failed to parse title dictionary {}", path.display()))?;

        info!(
            path = %path.display(),
            entries = dictionary.len(),
            "Loaded custom title dictionary"
        );
        Ok(dictionary)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl AliasSource for TitleDictionary {
    fn exact_aliases(&self, title: &str) -> Vec<String> {
        self.entries.get(title).cloned().unwrap_or_default()
    }

    /// For every key that contains or is contained in the title
    /// (case-insensitive): if the title contains the key, the key is replaced by
    /// each alias; if the key contains the title, the aliases are taken as-is.
    fn partial_aliases(&self, title: &str) -> Vec<String> {
        let title_lower = title.to_lowercase();
        if title_lower.trim().is_empty() {
            return Vec::new();
        }

        let mut out = Vec::new();
        for (key, aliases) in &self.entries {
            if key == title {
                continue;
            }
            let key_lower = key.to_lowercase();
            if key_lower.trim().is_empty() {
                continue;
            }

            if let Some(pos) = title_lower.find(&key_lower) {
                for alias in aliases {
                    out.push(replace_at(title, &title_lower, pos, key_lower.len(), alias));
                }
            } else if key_lower.contains(&title_lower) {
                out.extend(aliases.iter().cloned());
            }
        }
        out
    }
}

/// Replace the byte range found in the lowercased title. Falls back to the
/// title unchanged when lowercasing shifted byte offsets (non-ASCII case maps).
fn replace_at(title: &str, title_lower: &str, pos: usize, len: usize, alias: &str) -> String {
    if title.len() != title_lower.len()
        || !title.is_char_boundary(pos)
        || !title.is_char_boundary(pos + len)
    {
        return title.to_string();
    }
    format!("{}{}{}", &title[..pos], alias, &title[pos + len..])
}

/// Alternate names supplied by a metadata provider for the resolved title
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderAliases {
    names: Vec<String>,
}

impl ProviderAliases {
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }
}

impl AliasSource for ProviderAliases {
    /// The provider already resolved these for the queried title
    fn exact_aliases(&self, _title: &str) -> Vec<String> {
        self.names.clone()
    }
}

/// Expands a canonical title into the ordered list of titles to search for
pub struct TitleVariantGenerator<'a> {
    sources: Vec<&'a dyn AliasSource>,
}

impl<'a> TitleVariantGenerator<'a> {
    /// Sources are consulted in the given order
    pub fn new(sources: Vec<&'a dyn AliasSource>) -> Self {
        Self { sources }
    }

    /// Canonical title first, then every source's exact aliases, then every
    /// source's partial aliases. Exact-string duplicates are dropped; the
    /// canonical title is always variant 0.
    pub fn generate(&self, canonical_title: &str) -> Vec<String> {
        let mut variants = vec![canonical_title.to_string()];

        let exact = self.sources.iter().flat_map(|s| s.exact_aliases(canonical_title));
        let partial = self.sources.iter().flat_map(|s| s.partial_aliases(canonical_title));

        for candidate in exact.chain(partial) {
            if !variants.contains(&candidate) {
                variants.push(candidate);
            }
        }

        debug!(
            title = canonical_title,
            variants = ?variants,
            "Generated title variants"
        );
        variants
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    fn dictionary() -> TitleDictionary {
        TitleDictionary::from_json(
            r#"{
                "La Casa de Papel": ["Money Heist", "Haus des Geldes"],
                "Casa": ["House"],
                "Money Heist Korea": ["Money Heist: Korea"]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_exact_aliases() {
        let dict = dictionary();
        assert_eq!(
            dict.exact_aliases("La Casa de Papel"),
            vec!["Money Heist".to_string(), "Haus des Geldes".to_string()]
        );
        assert!(dict.exact_aliases("la casa de papel").is_empty());
    }

    #[test]
    fn test_partial_aliases_substitute_key() {
        let dict = dictionary();
        assert_eq!(
            dict.partial_aliases("La Casa de Papel"),
            vec!["La House de Papel".to_string()]
        );
    }

    #[test]
    fn test_partial_aliases_key_contains_title() {
        let dict = dictionary();
        assert_eq!(
            dict.partial_aliases("money heist"),
            vec!["Money Heist: Korea".to_string()]
        );
    }

    #[test]
    fn test_variant_order_and_dedup() {
        let dict = dictionary();
        let provider = ProviderAliases::new(vec![
            "Money Heist".to_string(),
            "La casa de papel".to_string(),
            "La Casa de Papel".to_string(),
        ]);
        let sources: Vec<&dyn AliasSource> = vec![&dict, &provider];
        let generator = TitleVariantGenerator::new(sources);

        assert_eq!(
            generator.generate("La Casa de Papel"),
            vec![
                "La Casa de Papel".to_string(),
                "Money Heist".to_string(),
                "Haus des Geldes".to_string(),
                "La casa de papel".to_string(),
                "La House de Papel".to_string(),
            ]
        );
    }

    #[test]
    fn test_canonical_kept_when_dictionary_lists_it() {
        let dict = TitleDictionary::from_json(r#"{"Dark": ["Dark", "Dunkel"]}"#).unwrap();
        let generator = TitleVariantGenerator::new(vec![&dict]);
        assert_eq!(
            generator.generate("Dark"),
            vec!["Dark".to_string(), "Dunkel".to_string()]
        );
    }

    #[test]
    fn test_no_sources_yields_canonical_only() {
        let generator = TitleVariantGenerator::new(vec![]);
        assert_eq!(generator.generate("Dune"), vec!["Dune".to_string()]);
    }

    #[test]
    fn test_load_dictionary_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"Dark": ["Dunkel"]}}"#).unwrap();

        let dict = TitleDictionary::load(Some(file.path())).unwrap();
        assert_eq!(dict.len(), 1);
        assert!(TitleDictionary::load(None).unwrap().is_empty());
    }

    #[test]
    fn test_load_dictionary_rejects_bad_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(TitleDictionary::load(Some(file.path())).is_err());
    }
}
