//! Analyzer adapters
//!
//! Each analyzer inspects one aspect of a submission and reports a normalized
//! [`AnalyzerResult`]:
//! - Document fields (reasoner-backed OCR matching)
//! - EXIF metadata (local extraction, reasoner narrative)
//! - Error-level analysis (local, deterministic)
//! - Pixel forensics (local, deterministic)

pub mod document;
pub mod ela;
pub mod forensics;
pub mod metadata;

pub use document::DocumentFieldAnalyzer;
pub use ela::RecompressionAnalyzer;
pub use forensics::PixelForensicsAnalyzer;
pub use metadata::MetadataAnalyzer;

use crate::analysis::result::{AnalyzerName, AnalyzerResult};
use crate::error::KycError;
use crate::io::submission::Submission;

/// A single verification check
///
/// Implementations hold no mutable state and may be called from several
/// threads at once.
pub trait Analyzer: Send + Sync {
    /// Key under which this analyzer's result is reported
    fn name(&self) -> AnalyzerName;

    /// Inspect the submission
    ///
    /// `Err` means the check could not complete; a completed check that finds
    /// a problem returns `Ok` with status `fail`.
    fn analyze(&self, submission: &Submission) -> Result<AnalyzerResult, KycError>;

    /// [`analyze`](Self::analyze) with errors folded into an `error` result
    fn run(&self, submission: &Submission) -> AnalyzerResult {
        match self.analyze(submission) {
            Ok(result) => {
                log::info!("{} analyzer: {}", self.name(), result.status);
                result
            }
            Err(err) => {
                log::warn!("{} analyzer could not complete: {}", self.name(), err);
                AnalyzerResult::error(err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::result::AnalyzerStatus;
    use crate::io::submission::IdentityForm;

    struct Broken;

    impl Analyzer for Broken {
        fn name(&self) -> AnalyzerName {
            AnalyzerName::Metadata
        }

        fn analyze(&self, _submission: &Submission) -> Result<AnalyzerResult, KycError> {
            Err(KycError::DecodingError("corrupt EXIF".to_string()))
        }
    }

    #[test]
    fn test_run_converts_errors() {
        let submission = Submission::new(IdentityForm::default(), vec![1u8, 2, 3]);
        let result = Broken.run(&submission);
        assert_eq!(result.status, AnalyzerStatus::Error);
        assert_eq!(result.detail["error"], "Decoding error: corrupt EXIF");
    }
}
