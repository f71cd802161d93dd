//! Error-level analyzer

use super::Analyzer;
use crate::analysis::result::{AnalyzerName, AnalyzerResult, AnalyzerStatus};
use crate::config::ElaConfig;
use crate::error::KycError;
use crate::features::ela::{compute_error_level, render_error_level};
use crate::io::decoder::decode_rgb;
use crate::io::submission::Submission;
use image::RgbImage;

/// Status for a maximum error level
///
/// Below `flag_threshold` is success, from `flag_threshold` up to (not
/// including) `fail_threshold` is flag_for_review, anything higher is fail.
///
/// # Example
///
/// ```
/// use kyc_verify::analyzers::ela::classify_error_level;
/// use kyc_verify::analysis::result::AnalyzerStatus;
/// use kyc_verify::config::ElaConfig;
///
/// let config = ElaConfig::default();
/// assert_eq!(classify_error_level(49, &config), AnalyzerStatus::Success);
/// assert_eq!(classify_error_level(50, &config), AnalyzerStatus::FlagForReview);
/// assert_eq!(classify_error_level(150, &config), AnalyzerStatus::Fail);
/// ```
pub fn classify_error_level(max_difference: u8, config: &ElaConfig) -> AnalyzerStatus {
    if max_difference >= config.fail_threshold {
        AnalyzerStatus::Fail
    } else if max_difference >= config.flag_threshold {
        AnalyzerStatus::FlagForReview
    } else {
        AnalyzerStatus::Success
    }
}

/// Brightness-scaled error-level image of an encoded document
pub fn render_ela_image(bytes: &[u8], config: &ElaConfig) -> Result<RgbImage, KycError> {
    let image = decode_rgb(bytes)?;
    let level = compute_error_level(&image, config.quality)?;
    Ok(render_error_level(&level))
}

/// Recompression (ELA) analyzer; no reasoner involved
#[derive(Debug, Clone, Default)]
pub struct RecompressionAnalyzer {
    config: ElaConfig,
}

impl RecompressionAnalyzer {
    /// Create an analyzer with the given thresholds
    pub fn new(config: ElaConfig) -> Self {
        Self { config }
    }
}

impl Analyzer for RecompressionAnalyzer {
    fn name(&self) -> AnalyzerName {
        AnalyzerName::ImageArtifact
    }

    fn analyze(&self, submission: &Submission) -> Result<AnalyzerResult, KycError> {
        let image = decode_rgb(submission.image())?;
        let level = compute_error_level(&image, self.config.quality)?;
        let status = classify_error_level(level.max_difference, &self.config);

        let message = match status {
            AnalyzerStatus::Success => "Error levels are uniform",
            AnalyzerStatus::FlagForReview => "Elevated error levels; regions may have been edited",
            _ => "High error levels; strong sign of local editing",
        };

        Ok(AnalyzerResult::new(status)
            .with_score(f64::from(level.max_difference))
            .with_message(message)
            .with_detail("error_level", level.max_difference)
            .with_detail(
                "mean_error_level",
                (level.mean_difference * 100.0).round() / 100.0,
            )
            .with_detail("quality", self.config.quality))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::submission::IdentityForm;
    use image::Rgb;
    use std::io::Cursor;

    #[test]
    fn test_classification_boundaries() {
        let config = ElaConfig::default();
        assert_eq!(classify_error_level(0, &config), AnalyzerStatus::Success);
        assert_eq!(classify_error_level(49, &config), AnalyzerStatus::Success);
        assert_eq!(classify_error_level(50, &config), AnalyzerStatus::FlagForReview);
        assert_eq!(classify_error_level(149, &config), AnalyzerStatus::FlagForReview);
        assert_eq!(classify_error_level(150, &config), AnalyzerStatus::Fail);
        assert_eq!(classify_error_level(255, &config), AnalyzerStatus::Fail);
    }

    #[test]
    fn test_flat_png_succeeds() {
        let img = RgbImage::from_pixel(48, 48, Rgb([120, 130, 140]));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();

        let result = RecompressionAnalyzer::default()
            .run(&Submission::new(IdentityForm::default(), bytes));
        assert_eq!(result.status, AnalyzerStatus::Success);
        assert!(result.score.unwrap() < 50.0);
        assert!(result.detail.contains_key("error_level"));
        assert!(result.detail.contains_key("mean_error_level"));
    }

    #[test]
    fn test_undecodable_image_is_error() {
        let result = RecompressionAnalyzer::default()
            .run(&Submission::new(IdentityForm::default(), b"garbage".to_vec()));
        assert_eq!(result.status, AnalyzerStatus::Error);
    }
}
