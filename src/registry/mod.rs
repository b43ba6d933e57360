//! Ordered catalogue of recognized paste formats.
//!
//! Every rule pairs a pattern with an extractor. Rules are tried strictly in
//! table order and the first rule whose pattern matches owns the input:
//!
//! 1. [`Stage::Compound`] - editor share URLs (location + selections + layers)
//! 2. [`Stage::Provider`] - third-party map URLs carrying coordinates
//! 3. [`Stage::Coded`] - short links, word addresses and grid codes needing a lookup
//! 4. [`Stage::Identifier`] - bare object ids
//!
//! Extractors never panic. They return a [`RuleOutcome`]: either a typed
//! [`Extraction`], a `Malformed` reason, or `NoMatch` to decline the input and
//! let dispatch continue with the next rule.

pub mod extract;
pub mod rules;

use crate::types::{LocationRef, ObjectId, SelectionDirective};
use regex::Regex;
use std::fmt;

/// Coarse grouping of rules; the table is sorted by stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Compound,
    Provider,
    Coded,
    Identifier,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Compound => "compound",
            Stage::Provider => "provider",
            Stage::Coded => "coded",
            Stage::Identifier => "identifier",
        };
        f.write_str(name)
    }
}

/// Editor permalink contents
#[derive(Debug, Clone, PartialEq)]
pub struct ShareLink {
    pub location: LocationRef,
    /// One directive per object kind present in the link, in parameter order
    pub selections: Vec<SelectionDirective>,
    /// Map problem id, already percent-decoded
    pub problem: Option<ObjectId>,
}

/// Structured data pulled out of a matched input
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    /// Coordinates ready for the viewport
    Location(LocationRef),
    /// Editor share link
    Share(ShareLink),
    /// Redirecting short link, target unknown until followed
    ShortLink(String),
    /// Locally decoded target that must be dispatched again
    Redirect(String),
    /// Three-word address for the geocode service
    WordAddress(String),
    /// Grid code (Plus Code) for the decode service
    GridCode(String),
    /// Dotted venue / map comment id
    DottedId(ObjectId),
    /// Comma-separated segment ids
    IdList(Vec<ObjectId>),
}

/// Result of running one rule's extractor
#[derive(Debug, Clone, PartialEq)]
pub enum RuleOutcome {
    Matched(Extraction),
    Malformed(String),
    NoMatch,
}

impl RuleOutcome {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        RuleOutcome::Malformed(reason.into())
    }
}

/// Extractor signature shared by every rule
pub type Extractor = fn(&str) -> RuleOutcome;

/// A single recognizer: pattern plus extractor
pub struct RecognizerRule {
    name: &'static str,
    stage: Stage,
    priority: usize,
    pattern: Regex,
    extract: Extractor,
}

impl RecognizerRule {
    /// Compile a rule. Priority is assigned when the rule joins a registry.
    pub fn new(
        name: &'static str,
        stage: Stage,
        pattern: &str,
        extract: Extractor,
    ) -> Result<Self, regex::Error> {
        Ok(Self {
            name,
            stage,
            priority: 0,
            pattern: Regex::new(pattern)?,
            extract,
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Position in the registry; lower is tried first
    pub fn priority(&self) -> usize {
        self.priority
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn matches(&self, text: &str) -> bool {
        self.pattern.is_match(text)
    }

    pub fn extract(&self, text: &str) -> RuleOutcome {
        (self.extract)(text)
    }
}

impl fmt::Debug for RecognizerRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecognizerRule")
            .field("name", &self.name)
            .field("stage", &self.stage)
            .field("priority", &self.priority)
            .field("pattern", &self.pattern.as_str())
            .finish()
    }
}

/// The rule that claimed an input and what it extracted
#[derive(Debug)]
pub struct Classified<'a> {
    pub rule: &'a RecognizerRule,
    pub outcome: RuleOutcome,
}

/// Immutable, ordered rule table
#[derive(Debug)]
pub struct Registry {
    rules: Vec<RecognizerRule>,
}

impl Registry {
    /// Build a registry, assigning priorities from the given order
    pub fn from_rules(mut rules: Vec<RecognizerRule>) -> Self {
        for (priority, rule) in rules.iter_mut().enumerate() {
            rule.priority = priority;
        }
        Self { rules }
    }

    /// The built-in format table
    pub fn standard() -> Self {
        Self::from_rules(rules::standard_rules())
    }

    pub fn rules(&self) -> &[RecognizerRule] {
        &self.rules
    }

    pub fn get(&self, name: &str) -> Option<&RecognizerRule> {
        self.rules.iter().find(|r| r.name == name)
    }

    /// Find the first rule that claims `text` and run its extractor.
    ///
    /// A `Malformed` outcome still claims the input. `NoMatch` from an
    /// extractor hands the input to the next rule.
    pub fn classify(&self, text: &str) -> Option<Classified<'_>> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        for rule in &self.rules {
            if !rule.matches(text) {
                continue;
            }
            match rule.extract(text) {
                RuleOutcome::NoMatch => {
                    tracing::debug!(rule = rule.name, "pattern matched but extractor declined");
                    continue;
                }
                outcome => return Some(Classified { rule, outcome }),
            }
        }

        None
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ObjectKind;

    fn classify_name(text: &str) -> Option<&'static str> {
        let registry = Registry::standard();
        registry.classify(text).map(|c| c.rule.name())
    }

    #[test]
    fn test_priorities_follow_table_order() {
        let registry = Registry::standard();
        for (i, rule) in registry.rules().iter().enumerate() {
            assert_eq!(rule.priority(), i);
        }
    }

    #[test]
    fn test_stages_are_non_decreasing() {
        let registry = Registry::standard();
        let stages: Vec<Stage> = registry.rules().iter().map(|r| r.stage()).collect();
        assert!(stages.windows(2).all(|w| w[0] <= w[1]), "{:?}", stages);
    }

    #[test]
    fn test_rule_names_unique() {
        let registry = Registry::standard();
        let mut names: Vec<&str> = registry.rules().iter().map(|r| r.name()).collect();
        names.sort();
        let before = names.len();
        names.dedup();
        assert_eq!(before, names.len());
    }

    #[test]
    fn test_empty_and_blank_input() {
        assert_eq!(classify_name(""), None);
        assert_eq!(classify_name("   "), None);
    }

    #[test]
    fn test_unrecognized_text() {
        assert_eq!(classify_name("hello world"), None);
        assert_eq!(classify_name("Main St, Springfield"), None);
    }

    #[test]
    fn test_legacy_livemap_wins_over_current() {
        // Matches both live-map grammars; the legacy rule is declared first
        let url = "https://www.waze.com/livemap?zoom=5&lat=40.0&lon=-83.0";
        let registry = Registry::standard();
        assert!(registry.get("waze_livemap").unwrap().matches(url));
        assert_eq!(classify_name(url), Some("waze_livemap_legacy"));
    }

    #[test]
    fn test_current_bing_wins_over_legacy() {
        let url = "https://www.bing.com/maps?cp=40.0~-83.0&lvl=15&sp=point.41.0_-84.0_Pin";
        let registry = Registry::standard();
        assert!(registry.get("bing_maps_legacy").unwrap().matches(url));

        let classified = registry.classify(url).unwrap();
        assert_eq!(classified.rule.name(), "bing_maps");
        assert_eq!(
            classified.outcome,
            RuleOutcome::Matched(Extraction::Location(LocationRef::new(-83.0, 40.0, Some(15))))
        );
    }

    #[test]
    fn test_current_osm_wins_over_marker_params() {
        let url = "https://www.openstreetmap.org/?mlat=41.0&mlon=-84.0#map=17/40.0/-83.0";
        let registry = Registry::standard();
        let classified = registry.classify(url).unwrap();
        assert_eq!(classified.rule.name(), "openstreetmap");
        assert_eq!(
            classified.outcome,
            RuleOutcome::Matched(Extraction::Location(LocationRef::new(-83.0, 40.0, Some(17))))
        );
    }

    #[test]
    fn test_identifier_rules() {
        assert_eq!(classify_name("123.456.789"), Some("dotted_id"));
        assert_eq!(classify_name("111,222,333"), Some("id_list"));
        assert_eq!(classify_name("111"), Some("id_list"));
    }

    #[test]
    fn test_word_address_does_not_steal_dotted_ids() {
        assert_eq!(classify_name("index.home.raft"), Some("word_address"));
        assert_eq!(classify_name("1.2.3"), Some("dotted_id"));
    }

    #[test]
    fn test_highlight_query_is_not_a_format() {
        assert_eq!(classify_name("/abc/i"), None);
        assert_eq!(classify_name("/1.2.3/"), None);
    }

    #[test]
    fn test_malformed_claims_input() {
        // Editor link without coordinates: the share rule owns it, nothing else runs
        let registry = Registry::standard();
        let classified = registry
            .classify("https://www.waze.com/editor?env=usa&segments=1")
            .unwrap();
        assert_eq!(classified.rule.name(), "waze_share");
        assert!(matches!(classified.outcome, RuleOutcome::Malformed(_)));
    }

    #[test]
    fn test_declined_livemap_falls_through() {
        // No coordinates anywhere: the current live-map rule declines
        assert_eq!(classify_name("https://www.waze.com/live-map"), None);
    }

    #[test]
    fn test_share_link_selection_kinds() {
        let registry = Registry::standard();
        let classified = registry
            .classify("https://www.waze.com/editor?env=usa&lon=-83.0&lat=40.0&zoomLevel=17&segments=1,2&venues=3.4.5")
            .unwrap();
        match classified.outcome {
            RuleOutcome::Matched(Extraction::Share(link)) => {
                let kinds: Vec<ObjectKind> = link.selections.iter().map(|s| s.kind).collect();
                assert_eq!(kinds, vec![ObjectKind::Segment, ObjectKind::Venue]);
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }
}
