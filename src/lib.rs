//! # KYC Verify
//!
//! An identity-document verification engine: four independent forensic
//! analyzers inspect a submitted ID photograph against the applicant's form,
//! and a decision step turns their findings into accept, deny or
//! flag_for_review.
//!
//! ## Features
//!
//! - **Document fields**: reasoner-backed matching of the typed form values on the card
//! - **EXIF metadata**: required-tag and editing-software checks with a forensic narrative
//! - **Error-level analysis**: JPEG recompression difference, fully local
//! - **Pixel forensics**: clone detection, noise residual, edge strength, SSIM loss
//! - **Decision synthesis**: reasoner verdict with deterministic priority enforcement
//!
//! ## Quick Start
//!
//! ```no_run
//! use kyc_verify::{IdentityForm, KycVerifier, Submission, VerificationConfig};
//!
//! let form = IdentityForm {
//!     full_name: "Amina Benali".to_string(),
//!     date_of_birth: "1990-04-12".to_string(),
//!     nationality: "Algerian".to_string(),
//!     id_number: "1234 5678 9012".to_string(),
//! };
//! let submission = Submission::from_path(form, "id_card.jpg")?;
//!
//! let verifier = KycVerifier::new(VerificationConfig::default())?;
//! let report = verifier.verify(&submission);
//!
//! println!("{}: {}", report.decision.verdict, report.decision.reason);
//! # Ok::<(), kyc_verify::KycError>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Submission → Pipeline (OCR | Metadata | ImageArtifact | Forensics) → CombinedResult → Decision
//! ```
//!
//! Analyzers never fail the pipeline: an analyzer that cannot complete is
//! reported with status `error`, and the decision step degrades to
//! flag_for_review when nothing usable is left.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod analysis;
pub mod analyzers;
pub mod config;
pub mod error;
pub mod features;
pub mod io;
pub mod preprocessing;
pub mod reasoner;

use std::sync::Arc;
use std::time::Instant;

// Re-export main types
pub use analysis::decision::DecisionSynthesizer;
pub use analysis::metadata::{VerificationChecks, VerificationMetadata, VerificationReport};
pub use analysis::pipeline::Pipeline;
pub use analysis::result::{
    AnalyzerName, AnalyzerResult, AnalyzerStatus, CombinedResult, Decision, Verdict,
};
pub use analyzers::Analyzer;
pub use config::VerificationConfig;
pub use error::KycError;
pub use io::submission::{IdentityForm, Submission};
pub use reasoner::ReasonerClient;

/// Verification engine: pipeline plus decision step
///
/// Build once and reuse; `verify` only takes `&self`.
#[derive(Debug)]
pub struct KycVerifier {
    pipeline: Pipeline,
    synthesizer: DecisionSynthesizer,
}

impl KycVerifier {
    /// Engine talking to the configured reasoner over HTTP
    ///
    /// # Errors
    ///
    /// Returns `KycError::ConfigError` for invalid configuration and
    /// `KycError::TransportError` if the HTTP client cannot be built
    pub fn new(config: VerificationConfig) -> Result<Self, KycError> {
        config.validate()?;
        let reasoner = Arc::new(ReasonerClient::new(config.reasoner.clone())?);
        Ok(Self::with_reasoner(&config, reasoner))
    }

    /// Engine over an already-built reasoner client
    pub fn with_reasoner(config: &VerificationConfig, reasoner: Arc<ReasonerClient>) -> Self {
        Self {
            pipeline: Pipeline::new(config, reasoner.clone()),
            synthesizer: DecisionSynthesizer::new(reasoner),
        }
    }

    /// Engine over custom parts
    pub fn from_parts(pipeline: Pipeline, synthesizer: DecisionSynthesizer) -> Self {
        Self {
            pipeline,
            synthesizer,
        }
    }

    /// Run all analyzers and decide
    ///
    /// Never fails; analyzer and reasoner problems are reflected in the
    /// report instead.
    pub fn verify(&self, submission: &Submission) -> VerificationReport {
        let start_time = Instant::now();
        log::debug!(
            "Starting verification: {} image bytes",
            submission.image().len()
        );

        let results = self.pipeline.run(submission);
        let decision = self.synthesizer.decide(&results);

        let processing_time_ms = start_time.elapsed().as_secs_f32() * 1000.0;
        let analyzers_errored = results.errored();
        if !analyzers_errored.is_empty() {
            log::warn!("Analyzers with errors: {:?}", analyzers_errored);
        }

        VerificationReport {
            checks: VerificationChecks::from_combined(&results),
            decision,
            results,
            metadata: VerificationMetadata {
                processing_time_ms,
                analyzers_errored,
                parallel: self.pipeline.is_parallel(),
                ..Default::default()
            },
        }
    }
}

/// Main verification function
///
/// Builds a [`KycVerifier`] from `config` and verifies one submission.
///
/// # Errors
///
/// Returns `KycError` only for invalid configuration or an unbuildable HTTP
/// client
///
/// # Example
///
/// ```no_run
/// use kyc_verify::{verify_submission, IdentityForm, Submission, VerificationConfig};
///
/// let submission = Submission::from_path(IdentityForm::default(), "id_card.png")?;
/// let report = verify_submission(&submission, VerificationConfig::default())?;
/// # Ok::<(), kyc_verify::KycError>(())
/// ```
pub fn verify_submission(
    submission: &Submission,
    config: VerificationConfig,
) -> Result<VerificationReport, KycError> {
    let verifier = KycVerifier::new(config)?;
    Ok(verifier.verify(submission))
}
