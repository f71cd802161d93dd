//! Document field matching
//!
//! The reasoner locates the typed form values on the document image and
//! reports per-field matches. Its answer is then normalized locally:
//! - "no id card recognized" forces `fail` and drops the field breakdown,
//!   whether it arrives inside JSON or as a bare sentence
//! - the ID number match is recomputed with whitespace and case ignored
//! - a nationality reported as "not found" is marked unfound, never a mismatch
//! - an unparseable reply becomes `error` with the raw text preserved

use super::Analyzer;
use crate::analysis::result::{AnalyzerName, AnalyzerResult, AnalyzerStatus};
use crate::error::KycError;
use crate::io::submission::{IdentityForm, Submission};
use crate::reasoner::parse::RAW_OUTPUT_KEY;
use crate::reasoner::prompts::ocr_prompt;
use crate::reasoner::{ImagePayload, ParsedResponse, ReasonerClient};
use serde_json::{json, Map, Value};
use std::sync::Arc;

/// Marker the reasoner uses for non-document images
pub const NO_ID_CARD: &str = "no id card recognized";

const NOT_FOUND: &str = "not found";

/// OCR-style matching of form values against the document
#[derive(Debug, Clone)]
pub struct DocumentFieldAnalyzer {
    reasoner: Arc<ReasonerClient>,
}

impl DocumentFieldAnalyzer {
    /// Create an analyzer backed by the shared reasoner
    pub fn new(reasoner: Arc<ReasonerClient>) -> Self {
        Self { reasoner }
    }
}

impl Analyzer for DocumentFieldAnalyzer {
    fn name(&self) -> AnalyzerName {
        AnalyzerName::Ocr
    }

    fn analyze(&self, submission: &Submission) -> Result<AnalyzerResult, KycError> {
        if submission.image().is_empty() {
            return Err(KycError::InvalidInput("Empty image data".to_string()));
        }

        let image = ImagePayload::from_bytes(submission.image());
        log::debug!(
            "Sending {} document ({} bytes) for field matching",
            image.mime_type,
            submission.image().len()
        );
        let reply = self
            .reasoner
            .ask_json(&ocr_prompt(submission.form()), Some(&image));

        Ok(interpret_reply(reply, submission.form()))
    }
}

/// Normalize the reasoner's field-matching reply
pub fn interpret_reply(reply: ParsedResponse, form: &IdentityForm) -> AnalyzerResult {
    let map = match reply {
        ParsedResponse::Json(map) => map,
        ParsedResponse::Raw(text) => {
            if mentions_no_id_card(&text) {
                return not_a_document();
            }
            log::warn!("Field-matching reply is not JSON ({} chars)", text.len());
            let mut result = AnalyzerResult::error("Reasoner reply could not be parsed");
            result.detail.insert(RAW_OUTPUT_KEY.to_string(), Value::String(text));
            return result;
        }
    };

    let message = map.get("message").and_then(Value::as_str).map(str::to_string);
    if message.as_deref().is_some_and(mentions_no_id_card) {
        return not_a_document();
    }

    let Some(status) = map
        .get("status")
        .and_then(Value::as_str)
        .and_then(AnalyzerStatus::parse_lenient)
    else {
        let mut result = AnalyzerResult::error("Reasoner reply has no recognizable status");
        result.detail = map;
        return result;
    };

    let mut result = AnalyzerResult::new(status);
    if let Some(score) = map.get("Similarity Score").and_then(number_like) {
        result = result.with_score(score);
    }
    if let Some(message) = message.filter(|m| !m.trim().is_empty()) {
        result = result.with_message(message);
    }

    let reported = map.get("detailed_result").and_then(Value::as_object);
    let fields = normalize_fields(reported, form);
    result.with_details(fields)
}

fn mentions_no_id_card(text: &str) -> bool {
    text.to_ascii_lowercase().contains(NO_ID_CARD)
}

fn not_a_document() -> AnalyzerResult {
    AnalyzerResult::new(AnalyzerStatus::Fail)
        .with_score(0.0)
        .with_message(NO_ID_CARD)
}

fn normalize_fields(reported: Option<&Map<String, Value>>, form: &IdentityForm) -> Map<String, Value> {
    let mut fields = Map::new();
    let entries = [
        ("full_name", &form.full_name),
        ("dob", &form.date_of_birth),
        ("nationality", &form.nationality),
        ("id_number", &form.id_number),
    ];

    for (key, form_value) in entries {
        let entry = reported.and_then(|r| r.get(key)).and_then(Value::as_object);
        let found_value = entry
            .and_then(|e| e.get("founded_value").or_else(|| e.get("found_value")))
            .and_then(Value::as_str)
            .map(str::trim)
            .unwrap_or("");
        let found = !found_value.is_empty() && !found_value.eq_ignore_ascii_case(NOT_FOUND);
        let reported_match = entry
            .and_then(|e| e.get("match"))
            .and_then(Value::as_bool)
            .unwrap_or(false);

        let matched = match key {
            "id_number" if found => {
                let recomputed = strip_whitespace(found_value) == strip_whitespace(form_value);
                if recomputed != reported_match {
                    log::warn!(
                        "ID number match corrected from {} to {} after whitespace normalization",
                        reported_match,
                        recomputed
                    );
                }
                recomputed
            }
            _ => found && reported_match,
        };

        let shown_value = if found { found_value } else { NOT_FOUND };
        fields.insert(
            key.to_string(),
            json!({
                "form_value": form_value,
                "founded_value": shown_value,
                "found": found,
                "match": matched,
            }),
        );
    }

    let mut detail = Map::new();
    detail.insert("detailed_result".to_string(), Value::Object(fields));
    detail
}

fn strip_whitespace(value: &str) -> String {
    value
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

fn number_like(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').parse().ok(),
        _ => None,
    }
}
