//! Analyzer orchestration
//!
//! Runs every registered analyzer against one submission and collects the
//! results into a [`CombinedResult`]. Each analyzer call is its own failure
//! domain: a returned error or a panic becomes an `error` entry under that
//! analyzer's name and the others carry on.

use super::result::{AnalyzerName, AnalyzerResult, CombinedResult};
use crate::analyzers::{
    Analyzer, DocumentFieldAnalyzer, MetadataAnalyzer, PixelForensicsAnalyzer,
    RecompressionAnalyzer,
};
use crate::config::VerificationConfig;
use crate::io::submission::Submission;
use crate::reasoner::ReasonerClient;
use rayon::prelude::*;
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

/// Fan-out over a fixed set of analyzers
pub struct Pipeline {
    analyzers: Vec<Box<dyn Analyzer>>,
    parallel: bool,
}

impl Pipeline {
    /// Pipeline with the four standard analyzers
    pub fn new(config: &VerificationConfig, reasoner: Arc<ReasonerClient>) -> Self {
        let analyzers: Vec<Box<dyn Analyzer>> = vec![
            Box::new(DocumentFieldAnalyzer::new(reasoner.clone())),
            Box::new(MetadataAnalyzer::new(reasoner, config.metadata.clone())),
            Box::new(RecompressionAnalyzer::new(config.ela.clone())),
            Box::new(PixelForensicsAnalyzer::new(config.forensics.clone())),
        ];
        Self::with_analyzers(analyzers, config.parallel_analyzers)
    }

    /// Pipeline over an arbitrary analyzer set
    ///
    /// Names not covered by `analyzers` show up as `error` entries.
    pub fn with_analyzers(analyzers: Vec<Box<dyn Analyzer>>, parallel: bool) -> Self {
        Self {
            analyzers,
            parallel,
        }
    }

    /// Whether analyzers run concurrently
    pub fn is_parallel(&self) -> bool {
        self.parallel
    }

    /// Run all analyzers and combine their results
    ///
    /// Never fails; the result always holds one entry per analyzer name.
    pub fn run(&self, submission: &Submission) -> CombinedResult {
        log::debug!(
            "Running {} analyzers ({})",
            self.analyzers.len(),
            if self.parallel { "parallel" } else { "sequential" }
        );

        let results: Vec<(AnalyzerName, AnalyzerResult)> = if self.parallel {
            self.analyzers
                .par_iter()
                .map(|analyzer| run_guarded(analyzer.as_ref(), submission))
                .collect()
        } else {
            self.analyzers
                .iter()
                .map(|analyzer| run_guarded(analyzer.as_ref(), submission))
                .collect()
        };

        CombinedResult::from_results(results)
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<AnalyzerName> = self.analyzers.iter().map(|a| a.name()).collect();
        f.debug_struct("Pipeline")
            .field("analyzers", &names)
            .field("parallel", &self.parallel)
            .finish()
    }
}

fn run_guarded(analyzer: &dyn Analyzer, submission: &Submission) -> (AnalyzerName, AnalyzerResult) {
    let name = analyzer.name();
    match catch_unwind(AssertUnwindSafe(|| analyzer.run(submission))) {
        Ok(result) => (name, result),
        Err(payload) => {
            let reason = panic_message(payload.as_ref());
            log::error!("{} analyzer panicked: {}", name, reason);
            (
                name,
                AnalyzerResult::error(format!("{} analyzer panicked: {}", name, reason)),
            )
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::result::AnalyzerStatus;
    use crate::error::KycError;
    use crate::io::submission::IdentityForm;

    struct Fixed(AnalyzerName, AnalyzerStatus);

    impl Analyzer for Fixed {
        fn name(&self) -> AnalyzerName {
            self.0
        }

        fn analyze(&self, _submission: &Submission) -> Result<AnalyzerResult, KycError> {
            Ok(AnalyzerResult::new(self.1))
        }
    }

    struct Panicking;

    impl Analyzer for Panicking {
        fn name(&self) -> AnalyzerName {
            AnalyzerName::Metadata
        }

        fn analyze(&self, _submission: &Submission) -> Result<AnalyzerResult, KycError> {
            panic!("EXIF parser blew up")
        }
    }

    fn submission() -> Submission {
        Submission::new(IdentityForm::default(), vec![0u8; 4])
    }

    fn analyzers() -> Vec<Box<dyn Analyzer>> {
        vec![
            Box::new(Fixed(AnalyzerName::Ocr, AnalyzerStatus::Success)),
            Box::new(Panicking),
            Box::new(Fixed(AnalyzerName::Forensics, AnalyzerStatus::FlagForReview)),
        ]
    }

    #[test]
    fn test_panic_is_isolated() {
        let combined = Pipeline::with_analyzers(analyzers(), false).run(&submission());

        assert_eq!(combined.get(AnalyzerName::Ocr).status, AnalyzerStatus::Success);
        let metadata = combined.get(AnalyzerName::Metadata);
        assert_eq!(metadata.status, AnalyzerStatus::Error);
        assert!(metadata.message.as_deref().unwrap().contains("EXIF parser blew up"));
        assert_eq!(
            combined.get(AnalyzerName::Forensics).status,
            AnalyzerStatus::FlagForReview
        );
    }

    #[test]
    fn test_unregistered_analyzer_is_error() {
        let combined = Pipeline::with_analyzers(analyzers(), true).run(&submission());
        assert_eq!(combined.iter().count(), 4);
        assert_eq!(
            combined.get(AnalyzerName::ImageArtifact).status,
            AnalyzerStatus::Error
        );
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let sequential = Pipeline::with_analyzers(analyzers(), false).run(&submission());
        let parallel = Pipeline::with_analyzers(analyzers(), true).run(&submission());
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn test_empty_pipeline_is_all_error() {
        let combined = Pipeline::with_analyzers(Vec::new(), true).run(&submission());
        assert!(combined.all_errored());
    }
}
