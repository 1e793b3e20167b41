//! Structured analysis results

use serde::{Deserialize, Serialize};
use std::fmt;

/// Reply keys the prompt asks the model to use.
pub const KEY_JD_MATCH: &str = "JD Match";
pub const KEY_MISSING_KEYWORDS: &str = "MissingKeywords";
pub const KEY_PROFILE_SUMMARY: &str = "Profile Summary";

/// Match percentage as the model reported it: a bare number or a string
/// such as `"82%"`. Strings are kept verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MatchPercentage {
    Number(f64),
    Text(String),
}

impl MatchPercentage {
    /// Numeric value in percent, when one can be read from the reply.
    pub fn value(&self) -> Option<f64> {
        let value = match self {
            MatchPercentage::Number(n) => Some(*n),
            MatchPercentage::Text(text) => {
                let text = text.trim();
                let number = text.strip_suffix('%').unwrap_or(text).trim();
                number.parse::<f64>().ok()
            }
        };
        value.filter(|n| n.is_finite())
    }

    /// Value rounded and clamped to 0..=100, for badges.
    pub fn rounded(&self) -> Option<u8> {
        self.value().map(|n| n.round().clamp(0.0, 100.0) as u8)
    }
}

impl fmt::Display for MatchPercentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchPercentage::Number(n) => write!(f, "{}%", n),
            MatchPercentage::Text(text) => write!(f, "{}", text),
        }
    }
}

/// The three fields read from a model reply.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub match_percentage: Option<MatchPercentage>,
    pub missing_keywords: Vec<String>,
    pub profile_summary: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnalysisStatus {
    Success,
    ParseFailure,
    TransportFailure,
}

impl fmt::Display for AnalysisStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AnalysisStatus::Success => "success",
            AnalysisStatus::ParseFailure => "parse failure",
            AnalysisStatus::TransportFailure => "transport failure",
        };
        f.write_str(label)
    }
}

/// Outcome of one analysis request. Every consumer has to handle all three cases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AnalysisOutcome {
    Success(AnalysisResult),
    ParseFailure {
        /// The reply exactly as received
        raw_text: String,
        reason: String,
        /// Fields that could be read from a well-formed but incomplete object
        partial: Option<AnalysisResult>,
    },
    TransportFailure {
        message: String,
    },
}

impl AnalysisOutcome {
    pub fn status(&self) -> AnalysisStatus {
        match self {
            AnalysisOutcome::Success(_) => AnalysisStatus::Success,
            AnalysisOutcome::ParseFailure { .. } => AnalysisStatus::ParseFailure,
            AnalysisOutcome::TransportFailure { .. } => AnalysisStatus::TransportFailure,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, AnalysisOutcome::Success(_))
    }

    /// The record to display: the full result, or whatever a parse failure salvaged.
    pub fn result(&self) -> Option<&AnalysisResult> {
        match self {
            AnalysisOutcome::Success(result) => Some(result),
            AnalysisOutcome::ParseFailure { partial, .. } => partial.as_ref(),
            AnalysisOutcome::TransportFailure { .. } => None,
        }
    }

    /// One-line message for the error state, `None` on success.
    pub fn error_message(&self) -> Option<String> {
        match self {
            AnalysisOutcome::Success(_) => None,
            AnalysisOutcome::ParseFailure { reason, .. } => {
                Some(format!("Could not read the model's reply: {}", reason))
            }
            AnalysisOutcome::TransportFailure { message } => {
                Some(format!("The model could not be reached: {}", message))
            }
        }
    }
}
