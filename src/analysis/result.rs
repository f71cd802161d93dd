//! Verification result types

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Outcome of a single analyzer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalyzerStatus {
    /// Check completed and passed
    Success,
    /// Check completed with an ambiguous finding
    FlagForReview,
    /// Check completed and found a problem
    Fail,
    /// Check could not complete
    Error,
}

impl AnalyzerStatus {
    /// Parse a status as written by the reasoner
    ///
    /// Accepts `success`, `fail`, `error` and the review spellings
    /// `flag for review`, `flag_for_review`, `flag-for-review`, `flag`,
    /// ignoring case and surrounding whitespace.
    ///
    /// # Example
    ///
    /// ```
    /// use kyc_verify::analysis::result::AnalyzerStatus;
    ///
    /// assert_eq!(AnalyzerStatus::parse_lenient("Flag for Review"), Some(AnalyzerStatus::FlagForReview));
    /// assert_eq!(AnalyzerStatus::parse_lenient(" success "), Some(AnalyzerStatus::Success));
    /// assert_eq!(AnalyzerStatus::parse_lenient("maybe"), None);
    /// ```
    pub fn parse_lenient(text: &str) -> Option<Self> {
        let normalized: String = text
            .trim()
            .to_ascii_lowercase()
            .chars()
            .map(|c| if c == '_' || c == '-' { ' ' } else { c })
            .collect();

        match normalized.split_whitespace().collect::<Vec<_>>().join(" ").as_str() {
            "success" | "pass" | "passed" => Some(AnalyzerStatus::Success),
            "flag for review" | "flag" | "flagged" | "review" => Some(AnalyzerStatus::FlagForReview),
            "fail" | "failed" | "failure" => Some(AnalyzerStatus::Fail),
            "error" => Some(AnalyzerStatus::Error),
            _ => None,
        }
    }

    /// Severity rank of a completed check: success 0, flag 1, fail 2
    ///
    /// `None` for `Error`, which carries no signal about the document.
    pub fn severity(&self) -> Option<u8> {
        match self {
            AnalyzerStatus::Success => Some(0),
            AnalyzerStatus::FlagForReview => Some(1),
            AnalyzerStatus::Fail => Some(2),
            AnalyzerStatus::Error => None,
        }
    }

    /// Wire name (`success`, `flag_for_review`, `fail`, `error`)
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalyzerStatus::Success => "success",
            AnalyzerStatus::FlagForReview => "flag_for_review",
            AnalyzerStatus::Fail => "fail",
            AnalyzerStatus::Error => "error",
        }
    }
}

impl fmt::Display for AnalyzerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized output of any analyzer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerResult {
    /// Outcome; always present
    pub status: AnalyzerStatus,

    /// Analyzer-local score (not comparable across analyzers)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,

    /// Analyzer-specific payload, opaque to the pipeline
    #[serde(default)]
    pub detail: Map<String, Value>,

    /// Human-readable explanation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl AnalyzerResult {
    /// Result with the given status and nothing else
    pub fn new(status: AnalyzerStatus) -> Self {
        Self {
            status,
            score: None,
            detail: Map::new(),
            message: None,
        }
    }

    /// `error` result carrying the failure text as message and `detail.error`
    pub fn error(message: impl Into<String>) -> Self {
        let message = message.into();
        let mut detail = Map::new();
        detail.insert("error".to_string(), Value::String(message.clone()));
        Self {
            status: AnalyzerStatus::Error,
            score: None,
            detail,
            message: Some(message),
        }
    }

    /// Set the score
    pub fn with_score(mut self, score: f64) -> Self {
        self.score = Some(score);
        self
    }

    /// Set the message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Add one detail entry
    pub fn with_detail(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.detail.insert(key.to_string(), value.into());
        self
    }

    /// Replace the whole detail payload
    pub fn with_details(mut self, detail: Map<String, Value>) -> Self {
        self.detail = detail;
        self
    }
}

/// The fixed set of analyzers, in decision priority order (highest first)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AnalyzerName {
    /// Document-field (OCR) matching
    #[serde(rename = "OCR")]
    Ocr,
    /// EXIF metadata / tamper analysis
    Metadata,
    /// Error-level (recompression artifact) analysis
    ImageArtifact,
    /// Pixel-level forensics
    Forensics,
}

impl AnalyzerName {
    /// All analyzers in priority order
    pub const ALL: [AnalyzerName; 4] = [
        AnalyzerName::Ocr,
        AnalyzerName::Metadata,
        AnalyzerName::ImageArtifact,
        AnalyzerName::Forensics,
    ];

    /// Key used in the combined result (`OCR`, `Metadata`, `ImageArtifact`, `Forensics`)
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalyzerName::Ocr => "OCR",
            AnalyzerName::Metadata => "Metadata",
            AnalyzerName::ImageArtifact => "ImageArtifact",
            AnalyzerName::Forensics => "Forensics",
        }
    }

    /// Priority label communicated to the reasoner
    pub fn priority_label(&self) -> &'static str {
        match self {
            AnalyzerName::Ocr => "highest priority; overrides the others when present",
            AnalyzerName::Metadata => "high priority",
            AnalyzerName::ImageArtifact => "medium priority",
            AnalyzerName::Forensics => "low priority",
        }
    }
}

impl fmt::Display for AnalyzerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Results of all four analyzers for one submission
///
/// Always holds exactly one entry per [`AnalyzerName`]; a missing entry is
/// filled with an `error` result at construction.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CombinedResult {
    entries: BTreeMap<AnalyzerName, AnalyzerResult>,
}

impl CombinedResult {
    /// Build from whatever results were produced
    ///
    /// Duplicate names keep the last result.
    pub fn from_results(results: impl IntoIterator<Item = (AnalyzerName, AnalyzerResult)>) -> Self {
        let mut entries: BTreeMap<_, _> = results.into_iter().collect();
        for name in AnalyzerName::ALL {
            entries
                .entry(name)
                .or_insert_with(|| AnalyzerResult::error(format!("{} analyzer did not run", name)));
        }
        Self { entries }
    }

    /// Result for one analyzer
    pub fn get(&self, name: AnalyzerName) -> &AnalyzerResult {
        // from_results guarantees every key
        &self.entries[&name]
    }

    /// Entries in priority order
    pub fn iter(&self) -> impl Iterator<Item = (AnalyzerName, &AnalyzerResult)> {
        self.entries.iter().map(|(name, result)| (*name, result))
    }

    /// Names of the analyzers whose status is `error`
    pub fn errored(&self) -> Vec<AnalyzerName> {
        self.iter()
            .filter(|(_, r)| r.status == AnalyzerStatus::Error)
            .map(|(name, _)| name)
            .collect()
    }

    /// True when no analyzer produced a usable result
    pub fn all_errored(&self) -> bool {
        self.iter().all(|(_, r)| r.status == AnalyzerStatus::Error)
    }

    /// Highest-priority result that is not `error`
    pub fn dominant(&self) -> Option<(AnalyzerName, &AnalyzerResult)> {
        self.iter().find(|(_, r)| r.status != AnalyzerStatus::Error)
    }
}

/// Final verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Identity accepted
    Accept,
    /// Identity rejected
    Deny,
    /// Needs a human reviewer
    FlagForReview,
}

impl Verdict {
    /// Parse a verdict as written by the reasoner (`accept`, `deny`, `flag for review`, ...)
    pub fn parse_lenient(text: &str) -> Option<Self> {
        let normalized: String = text
            .trim()
            .to_ascii_lowercase()
            .chars()
            .map(|c| if c == '_' || c == '-' { ' ' } else { c })
            .collect();

        match normalized.split_whitespace().collect::<Vec<_>>().join(" ").as_str() {
            "accept" | "accepted" | "approve" | "approved" => Some(Verdict::Accept),
            "deny" | "denied" | "reject" | "rejected" => Some(Verdict::Deny),
            "flag for review" | "flag" | "flagged" | "review" => Some(Verdict::FlagForReview),
            _ => None,
        }
    }

    /// Wire name (`accept`, `deny`, `flag_for_review`)
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Accept => "accept",
            Verdict::Deny => "deny",
            Verdict::FlagForReview => "flag_for_review",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final decision for one submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    /// Verdict
    pub verdict: Verdict,

    /// Short, data-driven rationale
    pub reason: String,
}

impl Decision {
    /// Create a decision
    pub fn new(verdict: Verdict, reason: impl Into<String>) -> Self {
        Self {
            verdict,
            reason: reason.into(),
        }
    }
}
