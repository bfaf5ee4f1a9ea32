//! Response Parser
//!
//! Extracts a 0-3 level from free-form model output. The model is asked to
//! answer "Level (0, 1, 2 or 3): N" but often does not, so an ordered table
//! of rules is tried from most to least specific and the first match wins.
//!
//! All rules run case-insensitive with `^`/`$` matching at line boundaries.
//! When no rule matches, the first digit 0-3 anywhere is used, and when there
//! is none the level defaults to 0.

use crate::types::Level;
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

/// Explanation used when the model returned nothing besides the echoed prompt
pub const EMPTY_EXPLANATION: &str = "Analysis completed.";

/// One entry of the extraction rule table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    /// "Level (0, 1, 2 or 3): 2"
    StrictFormat,
    /// "Level: 2"
    LevelColon,
    /// "2" at the start of a line
    LeadingDigit,
    /// "2 - ..." or "2."
    DigitSeparator,
    /// "Level" followed by a digit later on the line
    LevelAnywhere,
    /// "2 out of 3" or "2/3"
    OutOfThree,
    /// "score is 2", "my answer: 2", "rating of 2"
    KeywordDigit,
    /// Bare digit followed by whitespace, end of line or a period
    BareDigit,
}

impl RuleKind {
    /// Evaluation order
    pub const ORDERED: [RuleKind; 8] = [
        RuleKind::StrictFormat,
        RuleKind::LevelColon,
        RuleKind::LeadingDigit,
        RuleKind::DigitSeparator,
        RuleKind::LevelAnywhere,
        RuleKind::OutOfThree,
        RuleKind::KeywordDigit,
        RuleKind::BareDigit,
    ];

    /// Pattern with the level in capture group 1
    pub fn pattern(self) -> &'static str {
        match self {
            RuleKind::StrictFormat => r"Level\s*\(0,\s*1,\s*2\s*or\s*3\):\s*([0-3])",
            RuleKind::LevelColon => r"Level:\s*([0-3])",
            RuleKind::LeadingDigit => r"^([0-3])",
            RuleKind::DigitSeparator => r"([0-3])\s*[-.]",
            RuleKind::LevelAnywhere => r"Level.*?([0-3])",
            RuleKind::OutOfThree => r"([0-3])\s*(?:out of|/)\s*3",
            RuleKind::KeywordDigit => r"(?:answer|score|level|rating).*?([0-3])",
            RuleKind::BareDigit => r"([0-3])(?:\s|$|\.)",
        }
    }

    /// Apply this rule alone
    pub fn extract(self, text: &str) -> Option<Level> {
        let table = rule_table().ok()?;
        let (_, re) = table.iter().find(|(kind, _)| *kind == self)?;
        capture_level(re, text)
    }
}

static RULE_TABLE: LazyLock<Result<Vec<(RuleKind, Regex)>, regex::Error>> = LazyLock::new(|| {
    RuleKind::ORDERED
        .iter()
        .map(|kind| Regex::new(&format!("(?mi){}", kind.pattern())).map(|re| (*kind, re)))
        .collect()
});

fn rule_table() -> Result<&'static [(RuleKind, Regex)], regex::Error> {
    RULE_TABLE.as_deref().map_err(Clone::clone)
}

fn capture_level(re: &Regex, text: &str) -> Option<Level> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().chars().next())
        .and_then(Level::from_digit)
}

/// Where the extracted level came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "rule")]
pub enum LevelSource {
    Rule(RuleKind),
    /// First digit 0-3 anywhere in the text
    AnyDigit,
    /// Nothing matched; level defaulted to 0
    Default,
}

/// Parser output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedResponse {
    pub level: Level,
    pub explanation: String,
    pub source: LevelSource,
    /// False only when the parser itself failed
    pub assessed: bool,
}

/// Remove any echoed copy of the prompt and surrounding whitespace
pub fn strip_echo(response: &str, prompt: &str) -> String {
    if prompt.is_empty() {
        return response.trim().to_string();
    }
    response.replace(prompt, "").trim().to_string()
}

/// Extract level and explanation from a raw model response
pub fn parse_response(response: &str, prompt: &str) -> ParsedResponse {
    let table = match rule_table() {
        Ok(table) => table,
        Err(e) => {
            tracing::error!(error = %e, "level rule table failed to compile");
            return ParsedResponse {
                level: Level::Minimal,
                explanation: format!("Error parsing response: {}", e),
                source: LevelSource::Default,
                assessed: false,
            };
        }
    };

    let text = strip_echo(response, prompt);

    let (level, source) = table
        .iter()
        .find_map(|(kind, re)| capture_level(re, &text).map(|level| (level, LevelSource::Rule(*kind))))
        .or_else(|| {
            text.chars()
                .find_map(Level::from_digit)
                .map(|level| (level, LevelSource::AnyDigit))
        })
        .unwrap_or((Level::Minimal, LevelSource::Default));

    if source == LevelSource::Default {
        tracing::debug!(response_chars = text.len(), "no level found in response, defaulting to 0");
    }

    let explanation = if text.is_empty() {
        EMPTY_EXPLANATION.to_string()
    } else {
        text
    };

    ParsedResponse {
        level,
        explanation,
        source,
        assessed: true,
    }
}
