//! Error types for the verification pipeline.

use std::collections::BTreeMap;
use std::fmt;

/// Errors surfaced to callers of the verification pipeline.
///
/// Only [`NoValidSignatures`](Self::NoValidSignatures) and
/// [`NoMatchingClaims`](Self::NoMatchingClaims) come out of the pipeline
/// itself. The remaining variants belong to the collaborators that load keys
/// and signature bundles.
#[derive(Debug, thiserror::Error)]
pub enum VerificationError {
    /// Every candidate failed signature verification.
    #[error("no matching signatures:{}", Reasons(.0))]
    NoValidSignatures(Vec<String>),

    /// Every signature-valid candidate failed claim verification.
    #[error("no matching claims:{}", Reasons(.0))]
    NoMatchingClaims(Vec<String>),

    /// Key material could not be loaded or parsed.
    #[error("key error: {0}")]
    KeyError(String),

    /// The signature bundle is structurally invalid.
    #[error("invalid bundle: {0}")]
    InvalidBundle(String),

    /// I/O error while reading keys or bundles.
    #[error("verification I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl VerificationError {
    /// The per-item reasons behind a batch failure, in candidate order.
    ///
    /// Empty for errors that are not batch failures.
    pub fn reasons(&self) -> &[String] {
        match self {
            Self::NoValidSignatures(r) | Self::NoMatchingClaims(r) => r,
            _ => &[],
        }
    }
}

/// Why a single candidate was dropped.
///
/// These are expected outcomes, recorded per item and folded into a
/// [`VerificationError`] only when a whole phase is eliminated.
#[derive(Debug, thiserror::Error)]
pub enum ItemFailure {
    /// The signature did not decode or did not verify.
    #[error("{0}")]
    SignatureInvalid(String),

    /// The descriptor's media type names no known payload format.
    #[error("unexpected mediaType for {digest}: {media_type}")]
    UnsupportedFormat {
        /// Digest of the image under inspection.
        digest: String,
        /// The unrecognized media type.
        media_type: String,
    },

    /// The payload is not a valid document of its declared format.
    #[error("malformed payload: {0}")]
    Malformed(#[source] serde_json::Error),

    /// The payload asserts a different digest.
    #[error("invalid or missing digest in claim: {found}")]
    DigestMismatch {
        /// The digest the payload asserted (empty if absent).
        found: String,
    },

    /// The payload lacks a wanted annotation or asserts a different value.
    #[error("invalid or missing annotation in claim: {found:?}")]
    AnnotationMismatch {
        /// The annotations the payload asserted.
        found: BTreeMap<String, String>,
    },
}

/// Renders reasons one per line, each indented under the heading.
struct Reasons<'a>(&'a [String]);

impl fmt::Display for Reasons<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for reason in self.0 {
            write!(f, "\n  {reason}")?;
        }
        Ok(())
    }
}
