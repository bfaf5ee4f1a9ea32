//! Result types shared by the analyzer, the aggregator and front-ends.

use crate::catalog::SymptomDescriptor;
use serde::{Deserialize, Serialize};

/// Severity of a single symptom, as estimated by the model
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(into = "u8", try_from = "u8")]
pub enum Level {
    #[default]
    Minimal = 0,
    Mild = 1,
    Moderate = 2,
    Severe = 3,
}

impl Level {
    pub const ALL: [Level; 4] = [Level::Minimal, Level::Mild, Level::Moderate, Level::Severe];

    pub fn value(self) -> u8 {
        self as u8
    }

    /// Build from a digit character ('0'..='3')
    pub fn from_digit(c: char) -> Option<Self> {
        c.to_digit(10)
            .and_then(|d| u8::try_from(d).ok())
            .and_then(|d| Self::try_from(d).ok())
    }

    /// Human label shown next to the numeric level
    pub fn label(self) -> &'static str {
        match self {
            Level::Minimal => "Minimal",
            Level::Mild => "Mild",
            Level::Moderate => "Moderate",
            Level::Severe => "Severe",
        }
    }

    /// Level 2 and 3 symptoms need attention
    pub fn is_high(self) -> bool {
        self >= Level::Moderate
    }
}

impl From<Level> for u8 {
    fn from(level: Level) -> Self {
        level.value()
    }
}

impl TryFrom<u8> for Level {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Level::Minimal),
            1 => Ok(Level::Mild),
            2 => Ok(Level::Moderate),
            3 => Ok(Level::Severe),
            other => Err(format!("level out of range: {}", other)),
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value())
    }
}

/// Outcome of analysing one symptom
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymptomResult {
    pub id: String,
    pub question: String,
    pub level: Level,
    /// Model text after echo stripping, or the error that replaced it
    pub explanation: String,
    /// False when the level is a fallback because the symptom could not be assessed
    pub assessed: bool,
}

impl SymptomResult {
    pub fn assessed(descriptor: &SymptomDescriptor, level: Level, explanation: String) -> Self {
        Self {
            id: descriptor.id.to_string(),
            question: descriptor.question.to_string(),
            level,
            explanation,
            assessed: true,
        }
    }

    /// Degraded result: level 0 with the failure as explanation
    pub fn unassessed(descriptor: &SymptomDescriptor, explanation: String) -> Self {
        Self {
            id: descriptor.id.to_string(),
            question: descriptor.question.to_string(),
            level: Level::Minimal,
            explanation,
            assessed: false,
        }
    }
}
