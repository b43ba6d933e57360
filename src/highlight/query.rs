use regex::{Regex, RegexBuilder};
use std::sync::LazyLock;

/// Shortest pattern that activates the live highlight
pub const MIN_PATTERN_CHARS: usize = 2;

static WRAPPER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^/(.*)/(i?)$").expect("static regex"));

/// A live `/pattern/` or `/pattern/i` query typed into the search box
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightQuery {
    pub pattern: String,
    pub case_insensitive: bool,
}

impl HighlightQuery {
    /// Whether the input uses the highlight wrapper at all, regardless of
    /// pattern length. Such input never reaches the resolver.
    pub fn is_wrapped(input: &str) -> bool {
        WRAPPER.is_match(input.trim())
    }

    /// Strip the wrapper. Too-short patterns are not a query.
    pub fn parse(input: &str) -> Option<Self> {
        let caps = WRAPPER.captures(input.trim())?;
        let pattern = caps.get(1)?.as_str();
        if pattern.chars().count() < MIN_PATTERN_CHARS {
            return None;
        }
        Some(Self {
            pattern: pattern.to_string(),
            case_insensitive: !caps[2].is_empty(),
        })
    }

    pub fn compile(&self) -> Result<Regex, regex::Error> {
        RegexBuilder::new(&self.pattern)
            .case_insensitive(self.case_insensitive)
            .build()
    }
}
