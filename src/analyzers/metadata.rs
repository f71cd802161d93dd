//! EXIF metadata analysis
//!
//! Extraction and the hard rules are local; the forensic narrative comes
//! from the reasoner.
//!
//! Rules applied before the reasoner's opinion counts:
//! - no readable EXIF at all fails without consulting the reasoner
//! - any required tag (default `Make`, `Model`, `ExifVersion`) absent fails
//! - a known editor in the `Software` tag is reported in detail and prompt

use super::Analyzer;
use crate::analysis::result::{AnalyzerName, AnalyzerResult, AnalyzerStatus};
use crate::config::MetadataConfig;
use crate::error::KycError;
use crate::io::submission::Submission;
use crate::reasoner::prompts::tampering_prompt;
use crate::reasoner::{ParsedResponse, ReasonerClient};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::io::Cursor;
use std::sync::Arc;

/// Readable EXIF fields of the primary image
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExifSummary {
    /// Non-GPS fields by tag name
    pub fields: BTreeMap<String, String>,
    /// GPS fields by tag name
    pub gps: BTreeMap<String, String>,
}

impl ExifSummary {
    /// True when nothing was readable
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.gps.is_empty()
    }

    /// Value of a non-GPS tag
    pub fn get(&self, tag: &str) -> Option<&str> {
        self.fields.get(tag).map(String::as_str)
    }

    /// Everything as one JSON object, GPS nested under `GPS`
    pub fn to_json(&self) -> Map<String, Value> {
        let mut map: Map<String, Value> = self
            .fields
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();
        if !self.gps.is_empty() {
            let gps = self
                .gps
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect();
            map.insert("GPS".to_string(), Value::Object(gps));
        }
        map
    }
}

/// Read the EXIF block of an encoded image
///
/// Files without EXIF, and files whose EXIF cannot be parsed, give an empty
/// summary.
pub fn extract_exif(bytes: &[u8]) -> ExifSummary {
    let parsed = match exif::Reader::new().read_from_container(&mut Cursor::new(bytes)) {
        Ok(parsed) => parsed,
        Err(exif::Error::NotFound(_)) => {
            log::debug!("No EXIF block in document image");
            return ExifSummary::default();
        }
        Err(err) => {
            log::warn!("Unreadable EXIF block: {}", err);
            return ExifSummary::default();
        }
    };

    let mut summary = ExifSummary::default();
    for field in parsed.fields().filter(|f| f.ifd_num == exif::In::PRIMARY) {
        let name = field.tag.to_string();
        let value = field_text(field, &parsed);
        if field.tag.context() == exif::Context::Gps {
            summary.gps.insert(name, value);
        } else {
            summary.fields.insert(name, value);
        }
    }

    log::debug!(
        "Extracted {} EXIF fields ({} GPS)",
        summary.fields.len(),
        summary.gps.len()
    );
    summary
}

fn field_text(field: &exif::Field, parsed: &exif::Exif) -> String {
    match field.value {
        exif::Value::Ascii(ref parts) => parts
            .iter()
            .map(|p| String::from_utf8_lossy(p).trim_end_matches('\0').trim().to_string())
            .collect::<Vec<_>>()
            .join(", "),
        _ => field.display_value().with_unit(parsed).to_string(),
    }
}

/// Required tags absent from the summary
pub fn missing_required(summary: &ExifSummary, config: &MetadataConfig) -> Vec<String> {
    config
        .required_fields
        .iter()
        .filter(|tag| summary.get(tag).map_or(true, |v| v.is_empty()))
        .cloned()
        .collect()
}

/// `Software` tag value when it names a known editor
pub fn detect_editing_software<'a>(summary: &'a ExifSummary, config: &MetadataConfig) -> Option<&'a str> {
    let software = summary.get("Software")?;
    let lowered = software.to_ascii_lowercase();
    config
        .editing_software
        .iter()
        .any(|editor| lowered.contains(&editor.to_ascii_lowercase()))
        .then_some(software)
}

/// EXIF tamper analysis
#[derive(Debug, Clone)]
pub struct MetadataAnalyzer {
    reasoner: Arc<ReasonerClient>,
    config: MetadataConfig,
}

impl MetadataAnalyzer {
    /// Create an analyzer with the given expectations
    pub fn new(reasoner: Arc<ReasonerClient>, config: MetadataConfig) -> Self {
        Self { reasoner, config }
    }
}

impl Analyzer for MetadataAnalyzer {
    fn name(&self) -> AnalyzerName {
        AnalyzerName::Metadata
    }

    fn analyze(&self, submission: &Submission) -> Result<AnalyzerResult, KycError> {
        let summary = extract_exif(submission.image());
        let missing = missing_required(&summary, &self.config);
        let editor = detect_editing_software(&summary, &self.config);

        let mut detail = Map::new();
        detail.insert("missing_fields".to_string(), Value::from(missing.clone()));
        detail.insert(
            "editing_software".to_string(),
            editor.map_or(Value::Null, |e| Value::String(e.to_string())),
        );
        detail.insert("gps_present".to_string(), Value::Bool(!summary.gps.is_empty()));

        if summary.is_empty() {
            return Ok(AnalyzerResult::new(AnalyzerStatus::Fail)
                .with_message(format!(
                    "No EXIF metadata found; missing required fields: {}",
                    missing.join(", ")
                ))
                .with_details(detail));
        }

        let metadata = summary.to_json();
        let metadata_json = serde_json::to_string_pretty(&metadata)?;
        detail.insert("metadata".to_string(), Value::Object(metadata));

        let reply = self
            .reasoner
            .ask_json(&tampering_prompt(&metadata_json, &missing, editor), None);

        Ok(combine(reply, &missing, detail))
    }
}

/// Merge the reasoner's narrative with the local findings
fn combine(reply: ParsedResponse, missing: &[String], mut detail: Map<String, Value>) -> AnalyzerResult {
    let narrative = reply.str_field("message").map(str::to_string);
    let reasoner_status = reply
        .str_field("status")
        .and_then(AnalyzerStatus::parse_lenient);

    if let ParsedResponse::Raw(text) = reply {
        detail.insert(
            crate::reasoner::parse::RAW_OUTPUT_KEY.to_string(),
            Value::String(text),
        );
    }

    if !missing.is_empty() {
        let mut message = format!("Missing required EXIF fields: {}", missing.join(", "));
        if let Some(narrative) = narrative.filter(|n| !n.trim().is_empty()) {
            message.push_str(". ");
            message.push_str(&narrative);
        }
        return AnalyzerResult::new(AnalyzerStatus::Fail)
            .with_message(message)
            .with_details(detail);
    }

    match reasoner_status {
        Some(status) => {
            let mut result = AnalyzerResult::new(status).with_details(detail);
            if let Some(narrative) = narrative {
                result = result.with_message(narrative);
            }
            result
        }
        None => {
            log::warn!("Metadata narrative has no recognizable status");
            let mut result = AnalyzerResult::error("Reasoner reply could not be parsed");
            result.detail.extend(detail);
            result
        }
    }
}
