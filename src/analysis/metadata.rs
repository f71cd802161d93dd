//! Verification report and run metadata

use super::result::{AnalyzerName, AnalyzerStatus, CombinedResult, Decision};
use serde::Serialize;

/// Run metadata attached to every report
#[derive(Debug, Clone, Serialize)]
pub struct VerificationMetadata {
    /// Engine version
    pub engine_version: String,

    /// Wall-clock time for analyzers and decision
    pub processing_time_ms: f32,

    /// Analyzers whose status is `error`
    pub analyzers_errored: Vec<AnalyzerName>,

    /// Whether analyzers ran concurrently
    pub parallel: bool,
}

impl Default for VerificationMetadata {
    fn default() -> Self {
        Self {
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            processing_time_ms: 0.0,
            analyzers_errored: vec![],
            parallel: true,
        }
    }
}

/// Per-check status summary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VerificationChecks {
    /// Document field matching
    pub ocr: AnalyzerStatus,
    /// EXIF metadata
    pub metadata: AnalyzerStatus,
    /// Error-level analysis
    pub image_integrity: AnalyzerStatus,
    /// Pixel forensics
    pub forensics: AnalyzerStatus,
}

impl VerificationChecks {
    /// Summarize a combined result
    pub fn from_combined(combined: &CombinedResult) -> Self {
        Self {
            ocr: combined.get(AnalyzerName::Ocr).status,
            metadata: combined.get(AnalyzerName::Metadata).status,
            image_integrity: combined.get(AnalyzerName::ImageArtifact).status,
            forensics: combined.get(AnalyzerName::Forensics).status,
        }
    }
}

/// Everything produced for one submission
#[derive(Debug, Clone, Serialize)]
pub struct VerificationReport {
    /// Final decision
    pub decision: Decision,

    /// Status summary
    pub checks: VerificationChecks,

    /// Full analyzer results
    pub results: CombinedResult,

    /// Run metadata
    pub metadata: VerificationMetadata,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::result::{AnalyzerResult, Verdict};

    #[test]
    fn test_checks_from_combined() {
        let combined = CombinedResult::from_results(vec![
            (AnalyzerName::Ocr, AnalyzerResult::new(AnalyzerStatus::Success)),
            (AnalyzerName::ImageArtifact, AnalyzerResult::new(AnalyzerStatus::FlagForReview)),
        ]);
        let checks = VerificationChecks::from_combined(&combined);
        assert_eq!(checks.ocr, AnalyzerStatus::Success);
        assert_eq!(checks.metadata, AnalyzerStatus::Error);
        assert_eq!(checks.image_integrity, AnalyzerStatus::FlagForReview);
    }

    #[test]
    fn test_report_serialization() {
        let combined = CombinedResult::from_results(Vec::new());
        let report = VerificationReport {
            decision: Decision::new(Verdict::FlagForReview, "outage"),
            checks: VerificationChecks::from_combined(&combined),
            metadata: VerificationMetadata {
                analyzers_errored: combined.errored(),
                ..Default::default()
            },
            results: combined,
        };

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["decision"]["verdict"], "flag_for_review");
        assert_eq!(value["checks"]["image_integrity"], "error");
        assert_eq!(value["metadata"]["analyzers_errored"][0], "OCR");
        assert_eq!(value["metadata"]["engine_version"], env!("CARGO_PKG_VERSION"));
        assert_eq!(value["results"].as_object().unwrap().len(), 4);
    }
}
