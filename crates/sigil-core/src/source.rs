//! Where signatures come from.
//!
//! Registry access lives outside this crate. A [`SignatureSource`] hands the
//! pipeline the signatures attached to a reference together with the
//! descriptor of the image that reference resolves to. [`BundleFile`] reads
//! both from a JSON file on disk.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::VerificationError;
use crate::payload::{ImageDescriptor, SignedPayload};

/// Supplies the signatures and descriptor for an image reference.
pub trait SignatureSource: Send + Sync {
    /// Fetch everything needed to verify `reference`.
    ///
    /// # Errors
    ///
    /// Returns [`VerificationError`] if the signatures cannot be retrieved.
    fn fetch(&self, reference: &str) -> Result<SignatureBundle, VerificationError>;
}

/// The signatures attached to one image, plus that image's descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureBundle {
    /// The reference this bundle was produced for, if recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    /// The image the signatures claim to describe.
    pub descriptor: ImageDescriptor,
    /// Candidate signatures, in attachment order.
    #[serde(default)]
    pub signatures: Vec<SignedPayload>,
}

impl SignatureBundle {
    /// An empty bundle for `descriptor`.
    pub const fn new(descriptor: ImageDescriptor) -> Self {
        Self {
            reference: None,
            descriptor,
            signatures: Vec::new(),
        }
    }

    /// Load a bundle from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`VerificationError::IoError`] or [`VerificationError::JsonError`]
    /// if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, VerificationError> {
        let data = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Write the bundle as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`VerificationError::IoError`] if the file cannot be written.
    pub fn write_file(&self, path: &Path) -> Result<(), VerificationError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Append a signature.
    pub fn attach(&mut self, signed: SignedPayload) {
        tracing::debug!(payload_digest = %signed.payload_digest(), "attaching signature");
        self.signatures.push(signed);
    }
}

impl SignatureSource for SignatureBundle {
    fn fetch(&self, reference: &str) -> Result<SignatureBundle, VerificationError> {
        if let Some(recorded) = &self.reference {
            if recorded != reference {
                return Err(VerificationError::InvalidBundle(format!(
                    "bundle is for `{recorded}`, not `{reference}`"
                )));
            }
        }
        Ok(self.clone())
    }
}

/// A [`SignatureSource`] backed by a bundle file.
#[derive(Debug, Clone)]
pub struct BundleFile {
    path: PathBuf,
}

impl BundleFile {
    /// Read bundles from `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SignatureSource for BundleFile {
    fn fetch(&self, reference: &str) -> Result<SignatureBundle, VerificationError> {
        let bundle = SignatureBundle::from_file(&self.path)?;
        tracing::debug!(
            path = %self.path.display(),
            signatures = bundle.signatures.len(),
            "loaded signature bundle"
        );
        bundle.fetch(reference)
    }
}
