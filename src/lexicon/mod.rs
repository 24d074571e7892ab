//! Lexicon Store
//!
//! Read-only keyword and weight tables that drive every classifier.
//! Built once at startup (from the built-in tables, optionally overridden
//! by a JSON file) and shared behind an `Arc` afterwards.

pub mod builtin;

use crate::error::CoachError;
use crate::models::OfftopicCategory;
use crate::Result;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

lazy_static! {
    static ref BUILTIN_LEXICON: Lexicon = Lexicon::compile(LexiconSource::default())
        .expect("built-in structural patterns are valid regexes");
}

/// Keywords for one off-topic category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryKeywords {
    pub category: OfftopicCategory,
    pub keywords: Vec<String>,
}

/// Keywords split into high / medium / low tiers
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TieredKeywords {
    pub high: Vec<String>,
    pub medium: Vec<String>,
    pub low: Vec<String>,
}

/// Points awarded per distinct keyword hit in each tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierWeights {
    pub high: u32,
    pub medium: u32,
    pub low: u32,
}

impl TieredKeywords {
    fn from_static(high: &[&str], medium: &[&str], low: &[&str]) -> Self {
        Self {
            high: owned(high),
            medium: owned(medium),
            low: owned(low),
        }
    }

    /// Presence-only score: each keyword counts once no matter how often it occurs
    pub fn score(&self, text: &str, weights: TierWeights) -> u32 {
        let hits = |tier: &[String]| tier.iter().filter(|kw| text.contains(kw.as_str())).count() as u32;

        hits(&self.high) * weights.high
            + hits(&self.medium) * weights.medium
            + hits(&self.low) * weights.low
    }
}

/// Serializable form of the lexicon. Missing fields fall back to the built-in tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LexiconSource {
    pub version: String,
    pub domain_keywords: Vec<String>,
    pub offtopic_categories: Vec<CategoryKeywords>,
    pub greeting_prefixes: Vec<String>,
    pub greeting_adjective: String,
    pub time_of_day_words: Vec<String>,
    pub interrogative_words: Vec<String>,
    pub interrogative_suffixes: Vec<String>,
    pub wellbeing_exceptions: Vec<String>,
    pub declarative_suffix: String,
    pub polite_endings: Vec<String>,
    pub complexity_markers: Vec<char>,
    pub frustrated: Vec<String>,
    pub resistant: Vec<String>,
    pub positive: Vec<String>,
    pub urgent: Vec<String>,
    pub despair: Vec<String>,
    pub emotional_tiers: TieredKeywords,
    pub action_tiers: TieredKeywords,
    pub advanced_tiers: TieredKeywords,
    pub structural_patterns: Vec<String>,
}

impl Default for LexiconSource {
    fn default() -> Self {
        use builtin::*;

        let category = |category, keywords: &[&str]| CategoryKeywords {
            category,
            keywords: owned(keywords),
        };

        Self {
            version: VERSION.to_string(),
            domain_keywords: owned(DOMAIN_KEYWORDS),
            offtopic_categories: vec![
                category(OfftopicCategory::Weather, OFFTOPIC_WEATHER),
                category(OfftopicCategory::Food, OFFTOPIC_FOOD),
                category(OfftopicCategory::Tech, OFFTOPIC_TECH),
                category(OfftopicCategory::Medical, OFFTOPIC_MEDICAL),
                category(OfftopicCategory::Legal, OFFTOPIC_LEGAL),
                category(OfftopicCategory::Meta, OFFTOPIC_META),
                category(OfftopicCategory::Daily, OFFTOPIC_DAILY),
                category(OfftopicCategory::Nonsense, OFFTOPIC_NONSENSE),
            ],
            greeting_prefixes: owned(GREETING_PREFIXES),
            greeting_adjective: GREETING_ADJECTIVE.to_string(),
            time_of_day_words: owned(TIME_OF_DAY_WORDS),
            interrogative_words: owned(INTERROGATIVE_WORDS),
            interrogative_suffixes: owned(INTERROGATIVE_SUFFIXES),
            wellbeing_exceptions: owned(WELLBEING_EXCEPTIONS),
            declarative_suffix: DECLARATIVE_SUFFIX.to_string(),
            polite_endings: owned(POLITE_ENDINGS),
            complexity_markers: COMPLEXITY_MARKERS.to_vec(),
            frustrated: owned(FRUSTRATED),
            resistant: owned(RESISTANT),
            positive: owned(POSITIVE),
            urgent: owned(URGENT),
            despair: owned(DESPAIR),
            emotional_tiers: TieredKeywords::from_static(EMOTIONAL_HIGH, EMOTIONAL_MEDIUM, EMOTIONAL_LOW),
            action_tiers: TieredKeywords::from_static(ACTION_HIGH, ACTION_MEDIUM, ACTION_LOW),
            advanced_tiers: TieredKeywords::from_static(ADVANCED_HIGH, ADVANCED_MEDIUM, ADVANCED_LOW),
            structural_patterns: owned(STRUCTURAL_PATTERNS),
        }
    }
}

/// Compiled, immutable lexicon
#[derive(Debug, Clone)]
pub struct Lexicon {
    source: LexiconSource,
    structural_patterns: Vec<Regex>,
}

impl Lexicon {
    /// The built-in tables (compiled once per process)
    pub fn builtin() -> Self {
        BUILTIN_LEXICON.clone()
    }

    pub fn compile(source: LexiconSource) -> Result<Self> {
        if source.offtopic_categories.is_empty() {
            return Err(CoachError::Lexicon(
                "at least one off-topic category is required".to_string(),
            ));
        }

        let structural_patterns = source
            .structural_patterns
            .iter()
            .map(|p| Regex::new(p))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Self {
            source,
            structural_patterns,
        })
    }

    /// Load a JSON override. Tables absent from the file keep their built-in values.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let source: LexiconSource = serde_json::from_str(&raw)?;

        info!(
            path = %path.display(),
            version = %source.version,
            "Loaded lexicon override"
        );

        Self::compile(source)
    }

    pub fn version(&self) -> &str {
        &self.source.version
    }

    pub fn source(&self) -> &LexiconSource {
        &self.source
    }

    pub fn domain_keywords(&self) -> &[String] {
        &self.source.domain_keywords
    }

    pub fn offtopic_categories(&self) -> &[CategoryKeywords] {
        &self.source.offtopic_categories
    }

    pub fn structural_patterns(&self) -> &[Regex] {
        &self.structural_patterns
    }
}

impl Default for Lexicon {
    fn default() -> Self {
        Self::builtin()
    }
}

/// True if any keyword occurs as a substring of `text`
pub fn contains_any(text: &str, keywords: &[String]) -> bool {
    keywords.iter().any(|kw| text.contains(kw.as_str()))
}

/// True if `text` ends with any of `suffixes`
pub fn ends_with_any(text: &str, suffixes: &[String]) -> bool {
    suffixes.iter().any(|s| text.ends_with(s.as_str()))
}

fn owned(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}
