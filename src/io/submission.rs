//! Verification submission: identity form plus one document image

use crate::error::KycError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// File extensions accepted by [`Submission::from_path`]
pub const ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// Identity form submitted alongside the document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityForm {
    /// Holder's full name
    pub full_name: String,

    /// Date of birth as typed by the user (any format)
    #[serde(alias = "dob")]
    pub date_of_birth: String,

    /// Nationality (adjective or country name)
    pub nationality: String,

    /// Document number
    pub id_number: String,
}

impl IdentityForm {
    /// Names of the fields that are empty or whitespace-only
    ///
    /// The calling layer rejects the request when this is non-empty; the
    /// pipeline itself never re-checks presence.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("full_name", &self.full_name),
            ("date_of_birth", &self.date_of_birth),
            ("nationality", &self.nationality),
            ("id_number", &self.id_number),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }

    /// `Err(InvalidInput)` listing the missing fields, if any
    pub fn require_complete(&self) -> Result<(), KycError> {
        let missing = self.missing_fields();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(KycError::InvalidInput(format!(
                "Missing required fields: {}",
                missing.join(", ")
            )))
        }
    }
}

/// One unit of verification work
///
/// Immutable once built. The image bytes are reference-counted so concurrent
/// analyzers share them without copying.
#[derive(Debug, Clone)]
pub struct Submission {
    form: IdentityForm,
    image: Arc<[u8]>,
}

impl Submission {
    /// Create a submission from a form and raw image bytes
    pub fn new(form: IdentityForm, image: impl Into<Arc<[u8]>>) -> Self {
        Self {
            form,
            image: image.into(),
        }
    }

    /// Read the document image from disk
    ///
    /// Only `png`, `jpg` and `jpeg` files are accepted.
    pub fn from_path(form: IdentityForm, path: impl AsRef<Path>) -> Result<Self, KycError> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
            return Err(KycError::InvalidInput(format!(
                "Invalid file type: {} (expected one of {})",
                path.display(),
                ALLOWED_EXTENSIONS.join(", ")
            )));
        }

        let bytes = std::fs::read(path)?;
        log::debug!("Loaded document image {} ({} bytes)", path.display(), bytes.len());
        Ok(Self::new(form, bytes))
    }

    /// Submitted identity form
    pub fn form(&self) -> &IdentityForm {
        &self.form
    }

    /// Raw document image bytes
    pub fn image(&self) -> &[u8] {
        &self.image
    }
}
