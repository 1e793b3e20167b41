//! Turns the model's raw reply into an [`AnalysisOutcome`].
//!
//! The reply is untrusted text. It is trimmed, unwrapped from a markdown code
//! fence if there is one, and parsed as strict JSON. There is no secondary
//! recovery (no regex field scraping): anything that is not a JSON object is a
//! parse failure and keeps the reply verbatim for debugging.
//!
//! Field policy:
//! - `JD Match` is required. Without it the outcome is a parse failure, but the
//!   other fields are still surfaced as a partial record.
//! - `MissingKeywords` absent, `null` or `[]` all mean "no missing keywords".
//!   A comma separated string is split into keywords.
//! - `Profile Summary` absent or `null` is an empty summary.
//! - A key that is present with an unusable type is a parse failure.

use crate::processing::result::{
    AnalysisOutcome, AnalysisResult, MatchPercentage, KEY_JD_MATCH, KEY_MISSING_KEYWORDS,
    KEY_PROFILE_SUMMARY,
};
use log::debug;
use serde_json::{Map, Value};

const FENCE: &str = "```";

/// Strip a surrounding markdown code fence, with or without a language tag.
///
/// Only text that both opens and closes with a fence is unwrapped; anything
/// else comes back trimmed and otherwise untouched.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();

    let Some(inner) = trimmed.strip_prefix(FENCE) else {
        return trimmed;
    };
    let Some(inner) = inner.strip_suffix(FENCE) else {
        return trimmed;
    };

    // Info string, e.g. `json`, directly after the opening fence
    let tag_end = inner
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_'))
        .unwrap_or(inner.len());

    inner[tag_end..].trim()
}

/// Normalize a raw model reply.
pub fn normalize_reply(raw: &str) -> AnalysisOutcome {
    let body = strip_code_fence(raw);
    debug!("Normalizing reply: {} raw chars, {} after fence stripping", raw.len(), body.len());

    let value: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(e) => return parse_failure(raw, format!("reply is not valid JSON ({})", e), None),
    };

    let map = match value {
        Value::Object(map) => map,
        other => {
            return parse_failure(
                raw,
                format!("expected a JSON object, got {}", json_kind(&other)),
                None,
            );
        }
    };

    normalize_object(raw, &map)
}

fn normalize_object(raw: &str, map: &Map<String, Value>) -> AnalysisOutcome {
    let mut problems = Vec::new();
    let mut any_field = false;

    let match_percentage = match map.get(KEY_JD_MATCH) {
        None | Some(Value::Null) => {
            problems.push(format!("\"{}\" is missing", KEY_JD_MATCH));
            None
        }
        Some(value) => match read_match_percentage(value) {
            Some(percentage) => {
                any_field = true;
                Some(percentage)
            }
            None => {
                problems.push(format!("\"{}\" has unexpected type {}", KEY_JD_MATCH, json_kind(value)));
                None
            }
        },
    };

    let missing_keywords = match map.get(KEY_MISSING_KEYWORDS) {
        None | Some(Value::Null) => Vec::new(),
        Some(value) => match read_keywords(value) {
            Ok(keywords) => {
                any_field = true;
                keywords
            }
            Err(problem) => {
                problems.push(format!("\"{}\" {}", KEY_MISSING_KEYWORDS, problem));
                Vec::new()
            }
        },
    };

    let profile_summary = match map.get(KEY_PROFILE_SUMMARY) {
        None | Some(Value::Null) => String::new(),
        Some(value) => match scalar_text(value) {
            Some(summary) => {
                any_field = true;
                summary
            }
            None => {
                problems.push(format!(
                    "\"{}\" has unexpected type {}",
                    KEY_PROFILE_SUMMARY,
                    json_kind(value)
                ));
                String::new()
            }
        },
    };

    let result = AnalysisResult {
        match_percentage,
        missing_keywords,
        profile_summary,
    };

    if problems.is_empty() {
        debug!("Reply normalized: {} missing keywords", result.missing_keywords.len());
        AnalysisOutcome::Success(result)
    } else {
        let partial = any_field.then_some(result);
        parse_failure(raw, problems.join("; "), partial)
    }
}

fn read_match_percentage(value: &Value) -> Option<MatchPercentage> {
    match value {
        Value::Number(n) => n.as_f64().map(MatchPercentage::Number),
        Value::String(s) => Some(MatchPercentage::Text(s.clone())),
        _ => None,
    }
}

fn read_keywords(value: &Value) -> Result<Vec<String>, String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter(|item| !item.is_null())
            .map(|item| {
                scalar_text(item)
                    .ok_or_else(|| format!("contains an unexpected {}", json_kind(item)))
            })
            .collect(),
        Value::String(s) => Ok(s
            .split(',')
            .map(str::trim)
            .filter(|keyword| !keyword.is_empty())
            .map(str::to_string)
            .collect()),
        other => Err(format!("has unexpected type {}", json_kind(other))),
    }
}

/// Strings verbatim, numbers and booleans in their JSON spelling.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn parse_failure(raw: &str, reason: String, partial: Option<AnalysisResult>) -> AnalysisOutcome {
    debug!("Reply could not be normalized: {}", reason);
    AnalysisOutcome::ParseFailure {
        raw_text: raw.to_string(),
        reason,
        partial,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::result::AnalysisStatus;

    const FULL_REPLY: &str = r#"{"JD Match": "82%", "MissingKeywords": ["Docker","Kubernetes"], "Profile Summary": "Strong backend engineer."}"#;

    fn expected_full() -> AnalysisResult {
        AnalysisResult {
            match_percentage: Some(MatchPercentage::Text("82%".to_string())),
            missing_keywords: vec!["Docker".to_string(), "Kubernetes".to_string()],
            profile_summary: "Strong backend engineer.".to_string(),
        }
    }

    #[test]
    fn test_strip_code_fence_with_language_tag() {
        assert_eq!(strip_code_fence("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(strip_code_fence("```JSON\n{\"a\": 1}\n```"), "{\"a\": 1}");
    }

    #[test]
    fn test_strip_code_fence_without_tag() {
        assert_eq!(strip_code_fence("```\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(strip_code_fence("```{\"a\": 1}```"), "{\"a\": 1}");
    }

    #[test]
    fn test_strip_code_fence_no_fence() {
        assert_eq!(strip_code_fence("  {\"a\": 1}\n"), "{\"a\": 1}");
        assert_eq!(strip_code_fence("plain text"), "plain text");
    }

    #[test]
    fn test_strip_code_fence_unclosed_is_left_alone() {
        assert_eq!(strip_code_fence("```json\n{\"a\": 1}"), "```json\n{\"a\": 1}");
        assert_eq!(strip_code_fence("```"), "```");
    }

    #[test]
    fn test_strip_code_fence_is_idempotent() {
        let fenced = format!("```json\n{}\n```", FULL_REPLY);
        let once = strip_code_fence(&fenced);
        assert_eq!(strip_code_fence(once), once);
        assert_eq!(once, FULL_REPLY);
    }

    #[test]
    fn test_full_reply_is_success() {
        let outcome = normalize_reply(FULL_REPLY);
        assert_eq!(outcome, AnalysisOutcome::Success(expected_full()));
    }

    #[test]
    fn test_fenced_reply_matches_unfenced() {
        let fenced = format!("\n```json\n{}\n```\n", FULL_REPLY);
        assert_eq!(normalize_reply(&fenced), normalize_reply(FULL_REPLY));
    }

    #[test]
    fn test_non_json_keeps_raw_text() {
        let raw = "Sorry, I cannot help with that.";
        match normalize_reply(raw) {
            AnalysisOutcome::ParseFailure { raw_text, partial, .. } => {
                assert_eq!(raw_text, raw);
                assert!(partial.is_none());
            }
            other => panic!("expected parse failure, got {:?}", other),
        }
    }

    #[test]
    fn test_raw_text_is_not_trimmed() {
        let raw = "  {not json}\n";
        match normalize_reply(raw) {
            AnalysisOutcome::ParseFailure { raw_text, .. } => assert_eq!(raw_text, raw),
            other => panic!("expected parse failure, got {:?}", other),
        }
    }

    #[test]
    fn test_array_and_scalar_are_parse_failures() {
        assert_eq!(normalize_reply("[1, 2]").status(), AnalysisStatus::ParseFailure);
        assert_eq!(normalize_reply("\"82%\"").status(), AnalysisStatus::ParseFailure);
        assert_eq!(normalize_reply("42").status(), AnalysisStatus::ParseFailure);
    }

    #[test]
    fn test_missing_keywords_key_is_empty_list() {
        let outcome = normalize_reply(r#"{"JD Match": "70%", "Profile Summary": "Solid."}"#);
        match outcome {
            AnalysisOutcome::Success(result) => {
                assert!(result.missing_keywords.is_empty());
                assert_eq!(result.profile_summary, "Solid.");
            }
            other => panic!("expected success, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_keywords_empty_and_absent_are_identical() {
        let absent = normalize_reply(r#"{"JD Match": "70%", "Profile Summary": ""}"#);
        let empty = normalize_reply(r#"{"JD Match": "70%", "MissingKeywords": [], "Profile Summary": ""}"#);
        let null = normalize_reply(r#"{"JD Match": "70%", "MissingKeywords": null, "Profile Summary": ""}"#);
        assert_eq!(absent, empty);
        assert_eq!(absent, null);
    }

    #[test]
    fn test_missing_profile_summary_is_empty_text() {
        match normalize_reply(r#"{"JD Match": 64, "MissingKeywords": ["Go"]}"#) {
            AnalysisOutcome::Success(result) => {
                assert_eq!(result.match_percentage, Some(MatchPercentage::Number(64.0)));
                assert_eq!(result.profile_summary, "");
            }
            other => panic!("expected success, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_match_surfaces_partial_record() {
        let raw = r#"{"MissingKeywords": ["Terraform"], "Profile Summary": "Good fit."}"#;
        match normalize_reply(raw) {
            AnalysisOutcome::ParseFailure { raw_text, reason, partial } => {
                assert_eq!(raw_text, raw);
                assert!(reason.contains("JD Match"));
                let partial = partial.expect("partial record");
                assert_eq!(partial.missing_keywords, vec!["Terraform".to_string()]);
                assert_eq!(partial.profile_summary, "Good fit.");
                assert!(partial.match_percentage.is_none());
            }
            other => panic!("expected parse failure, got {:?}", other),
        }
    }

    #[test]
    fn test_unrelated_object_has_no_partial() {
        match normalize_reply(r#"{"answer": "yes"}"#) {
            AnalysisOutcome::ParseFailure { partial, .. } => assert!(partial.is_none()),
            other => panic!("expected parse failure, got {:?}", other),
        }
    }

    #[test]
    fn test_keyword_string_is_split() {
        match normalize_reply(r#"{"JD Match": "50%", "MissingKeywords": "Docker, Kubernetes,  ,AWS"}"#) {
            AnalysisOutcome::Success(result) => {
                assert_eq!(result.missing_keywords, vec!["Docker", "Kubernetes", "AWS"]);
            }
            other => panic!("expected success, got {:?}", other),
        }
    }

    #[test]
    fn test_keywords_with_wrong_type() {
        assert_eq!(
            normalize_reply(r#"{"JD Match": "50%", "MissingKeywords": 42}"#).status(),
            AnalysisStatus::ParseFailure
        );
        assert_eq!(
            normalize_reply(r#"{"JD Match": "50%", "MissingKeywords": [["nested"]]}"#).status(),
            AnalysisStatus::ParseFailure
        );
    }

    #[test]
    fn test_keywords_are_copied_verbatim() {
        match normalize_reply(r#"{"JD Match": "50%", "MissingKeywords": [" CI/CD ", "C++", 3]}"#) {
            AnalysisOutcome::Success(result) => {
                assert_eq!(result.missing_keywords, vec![" CI/CD ", "C++", "3"]);
            }
            other => panic!("expected success, got {:?}", other),
        }
    }

    #[test]
    fn test_match_with_wrong_type() {
        let outcome = normalize_reply(r#"{"JD Match": ["82%"], "MissingKeywords": []}"#);
        match outcome {
            AnalysisOutcome::ParseFailure { reason, partial, .. } => {
                assert!(reason.contains("unexpected type array"));
                assert!(partial.is_some());
            }
            other => panic!("expected parse failure, got {:?}", other),
        }
    }
}
