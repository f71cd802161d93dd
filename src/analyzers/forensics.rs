//! Pixel-level forensics analyzer
//!
//! Four sub-scores on the BT.601 grayscale plane, each compared against a
//! threshold. Only the excess above a threshold counts:
//!
//! `aggregate = Σ max(0, metric - threshold) * weight`
//!
//! summed in the order clone, noise, edge, artifact. The aggregate is then
//! classified against `flag_score` and `fail_score`.

use super::Analyzer;
use crate::analysis::result::{AnalyzerName, AnalyzerResult, AnalyzerStatus};
use crate::config::{ForensicsConfig, ForensicsMetrics};
use crate::error::KycError;
use crate::features::cloning::clone_score;
use crate::features::edges::edge_strength;
use crate::features::noise::noise_residual;
use crate::features::ssim::{recompression_loss, WINDOW_SIZE};
use crate::io::decoder::decode_rgb;
use crate::io::submission::Submission;
use crate::preprocessing::grayscale::GrayPlane;
use image::RgbImage;

/// Measure the four sub-scores of an image
pub fn measure(image: &RgbImage, config: &ForensicsConfig) -> Result<ForensicsMetrics, KycError> {
    let plane = GrayPlane::from_rgb(image);

    let cloning = clone_score(
        &plane.downscale_to(config.clone_max_dimension),
        config.clone_block_size,
    );
    let noise = noise_residual(&plane);
    let edge = edge_strength(&plane);
    let artifact = if plane.width() < WINDOW_SIZE || plane.height() < WINDOW_SIZE {
        log::debug!(
            "Plane {}x{} too small for SSIM, artifact score 0",
            plane.width(),
            plane.height()
        );
        0.0
    } else {
        recompression_loss(&plane, config.artifact_quality)?
    };

    Ok(ForensicsMetrics {
        cloning,
        noise,
        edge,
        artifact,
    })
}

/// Weighted excess of the metrics over their thresholds
///
/// # Example
///
/// ```
/// use kyc_verify::analyzers::forensics::aggregate_score;
/// use kyc_verify::config::{ForensicsConfig, ForensicsMetrics};
///
/// let config = ForensicsConfig::default();
/// let metrics = ForensicsMetrics { cloning: 0.5, noise: 10.0, edge: 37.5, artifact: 0.05 };
/// assert_eq!(aggregate_score(&metrics, &config), 0.5);
/// ```
pub fn aggregate_score(metrics: &ForensicsMetrics, config: &ForensicsConfig) -> f64 {
    let t = &config.thresholds;
    let w = &config.weights;
    [
        (metrics.cloning, t.cloning, w.cloning),
        (metrics.noise, t.noise, w.noise),
        (metrics.edge, t.edge, w.edge),
        (metrics.artifact, t.artifact, w.artifact),
    ]
    .iter()
    .map(|&(value, threshold, weight)| (value - threshold).max(0.0) * weight)
    .sum()
}

/// Status for an aggregate score
pub fn classify_forensics_score(score: f64, config: &ForensicsConfig) -> AnalyzerStatus {
    if score >= config.fail_score {
        AnalyzerStatus::Fail
    } else if score >= config.flag_score {
        AnalyzerStatus::FlagForReview
    } else {
        AnalyzerStatus::Success
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Pixel forensics analyzer; no reasoner involved
#[derive(Debug, Clone, Default)]
pub struct PixelForensicsAnalyzer {
    config: ForensicsConfig,
}

impl PixelForensicsAnalyzer {
    /// Create an analyzer with the given thresholds and weights
    pub fn new(config: ForensicsConfig) -> Self {
        Self { config }
    }
}

impl Analyzer for PixelForensicsAnalyzer {
    fn name(&self) -> AnalyzerName {
        AnalyzerName::Forensics
    }

    fn analyze(&self, submission: &Submission) -> Result<AnalyzerResult, KycError> {
        let image = decode_rgb(submission.image())?;
        let metrics = measure(&image, &self.config)?;
        let score = aggregate_score(&metrics, &self.config);
        let status = classify_forensics_score(score, &self.config);

        log::debug!(
            "Forensics: clone={:.3} noise={:.3} edge={:.3} artifact={:.4} -> {:.3}",
            metrics.cloning,
            metrics.noise,
            metrics.edge,
            metrics.artifact,
            score
        );

        let message = match status {
            AnalyzerStatus::Success => "No pixel-level anomalies",
            AnalyzerStatus::FlagForReview => "Some pixel-level anomalies",
            _ => "Strong pixel-level anomalies",
        };

        Ok(AnalyzerResult::new(status)
            .with_score(score)
            .with_message(message)
            .with_detail("clone_score", round2(metrics.cloning))
            .with_detail("noise_score", round2(metrics.noise))
            .with_detail("edge_score", round2(metrics.edge))
            .with_detail("artifact_score", round2(metrics.artifact)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::submission::IdentityForm;
    use image::Rgb;
    use std::io::Cursor;

    fn metrics(cloning: f64, noise: f64, edge: f64, artifact: f64) -> ForensicsMetrics {
        ForensicsMetrics {
            cloning,
            noise,
            edge,
            artifact,
        }
    }

    #[test]
    fn test_aggregate_below_thresholds_is_zero() {
        let config = ForensicsConfig::default();
        let score = aggregate_score(&metrics(0.2, 5.0, 10.0, 0.01), &config);
        assert_eq!(score, 0.0);
        assert_eq!(classify_forensics_score(score, &config), AnalyzerStatus::Success);
    }

    #[test]
    fn test_aggregate_exact_boundaries() {
        let config = ForensicsConfig::default();

        let flag = aggregate_score(&metrics(0.0, 0.0, 37.5, 0.0), &config);
        assert_eq!(flag, 0.5);
        assert_eq!(classify_forensics_score(flag, &config), AnalyzerStatus::FlagForReview);

        let fail = aggregate_score(&metrics(0.0, 0.0, 40.0, 0.0), &config);
        assert_eq!(fail, 1.0);
        assert_eq!(classify_forensics_score(fail, &config), AnalyzerStatus::Fail);
    }

    #[test]
    fn test_aggregate_sums_weighted_excess() {
        let config = ForensicsConfig::default();
        // (1.0 - 0.9) * 0.4 + (30 - 25) * 0.3 = 0.04 + 1.5
        let score = aggregate_score(&metrics(1.0, 30.0, 0.0, 0.0), &config);
        assert!((score - 1.54).abs() < 1e-9);
    }

    #[test]
    fn test_flat_image_passes() {
        let img = RgbImage::from_pixel(64, 64, Rgb([200, 200, 200]));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();

        let result = PixelForensicsAnalyzer::default()
            .run(&Submission::new(IdentityForm::default(), bytes));
        assert_eq!(result.status, AnalyzerStatus::Success);
        assert_eq!(result.score, Some(0.0));
        assert_eq!(result.detail["clone_score"], 0.0);
        assert_eq!(result.detail["edge_score"], 0.0);
    }

    #[test]
    fn test_tiny_image_has_no_artifact_score() {
        let img = RgbImage::from_pixel(4, 4, Rgb([10, 10, 10]));
        let m = measure(&img, &ForensicsConfig::default()).unwrap();
        assert_eq!(m.artifact, 0.0);
        assert_eq!(m.cloning, 0.0);
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(0.123456), 0.12);
        assert_eq!(round2(37.499), 37.5);
    }
}
