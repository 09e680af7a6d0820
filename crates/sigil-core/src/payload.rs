//! Data carried through the verification pipeline.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::digest;

/// A payload blob together with the detached signature claimed to cover it.
///
/// The payload is kept as raw bytes: signatures are checked over exactly
/// these bytes, so nothing may re-encode them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedPayload {
    /// The signed bytes, base64-encoded when serialized.
    #[serde(with = "base64_bytes")]
    pub payload: Vec<u8>,
    /// The detached signature as standard base64 text.
    pub base64_signature: String,
}

impl SignedPayload {
    /// Create a signed payload from raw bytes and a base64 signature.
    pub fn new(payload: impl Into<Vec<u8>>, base64_signature: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
            base64_signature: base64_signature.into(),
        }
    }

    /// The `sha256:<hex>` digest of the payload bytes, for diagnostics.
    pub fn payload_digest(&self) -> String {
        digest::sha256_digest(&self.payload)
    }
}

/// Metadata identifying the image under inspection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageDescriptor {
    /// Content digest of the image, e.g. `sha256:…`.
    pub digest: String,
    /// Media type that selects how signed payloads are interpreted.
    pub media_type: String,
}

impl ImageDescriptor {
    /// Create a descriptor from a digest and a media type.
    pub fn new(digest: impl Into<String>, media_type: impl Into<String>) -> Self {
        Self {
            digest: digest.into(),
            media_type: media_type.into(),
        }
    }
}

/// The digest and annotations a payload asserts about an image.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedClaim {
    /// The asserted image digest.
    pub digest: String,
    /// The asserted annotations.
    pub annotations: BTreeMap<String, String>,
}

/// Serde adapter storing bytes as standard base64 text.
mod base64_bytes {
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&base64::engine::general_purpose::STANDARD.encode(bytes))
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        base64::engine::general_purpose::STANDARD
            .decode(text)
            .map_err(serde::de::Error::custom)
    }
}
