//! Claim extraction from signed payloads.
//!
//! A payload's format is chosen by the media type of the image descriptor.
//! The set of formats is closed: adding one means adding a
//! [`PayloadFormat`] variant and its decoder.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ItemFailure;
use crate::payload::{ExtractedClaim, ImageDescriptor};

/// Media type of an OCI image manifest.
pub const OCI_MANIFEST_MEDIA_TYPE: &str = "application/vnd.oci.image.manifest.v1+json";

/// Media type of a simple-signing payload.
pub const SIMPLE_SIGNING_MEDIA_TYPE: &str = "application/vnd.dev.cosign.simplesigning.v1+json";

/// Value of `critical.type` in simple-signing payloads.
pub const SIMPLE_SIGNING_TYPE: &str = "cosign container image signature";

/// The payload formats claims can be read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadFormat {
    /// The payload is an OCI descriptor carrying a digest and annotations.
    ManifestDigest,
    /// The payload is a simple-signing document.
    SimpleSigning,
}

impl PayloadFormat {
    /// Look up the format for a descriptor media type.
    pub fn from_media_type(media_type: &str) -> Option<Self> {
        match media_type {
            OCI_MANIFEST_MEDIA_TYPE => Some(Self::ManifestDigest),
            SIMPLE_SIGNING_MEDIA_TYPE => Some(Self::SimpleSigning),
            _ => None,
        }
    }

    /// The media type this format is selected by.
    pub const fn media_type(self) -> &'static str {
        match self {
            Self::ManifestDigest => OCI_MANIFEST_MEDIA_TYPE,
            Self::SimpleSigning => SIMPLE_SIGNING_MEDIA_TYPE,
        }
    }

    /// Decode `payload` into a normalized claim.
    ///
    /// # Errors
    ///
    /// Returns [`ItemFailure::Malformed`] if the bytes are not a valid
    /// document of this format.
    pub fn extract(self, payload: &[u8]) -> Result<ExtractedClaim, ItemFailure> {
        match self {
            Self::ManifestDigest => {
                let desc: EmbeddedDescriptor =
                    serde_json::from_slice(payload).map_err(ItemFailure::Malformed)?;
                Ok(ExtractedClaim {
                    digest: desc.digest,
                    annotations: desc.annotations.unwrap_or_default(),
                })
            }
            Self::SimpleSigning => {
                let ss: SimpleSigning =
                    serde_json::from_slice(payload).map_err(ItemFailure::Malformed)?;
                Ok(ExtractedClaim {
                    digest: ss.critical.image.docker_manifest_digest,
                    annotations: ss.optional.unwrap_or_default(),
                })
            }
        }
    }

    /// Build the payload a signer signs for `descriptor` in this format.
    ///
    /// # Errors
    ///
    /// Returns a [`serde_json::Error`] if serialization fails.
    pub fn payload_for(
        self,
        descriptor: &ImageDescriptor,
        annotations: &BTreeMap<String, String>,
    ) -> Result<Vec<u8>, serde_json::Error> {
        match self {
            Self::ManifestDigest => serde_json::to_vec(&EmbeddedDescriptor {
                media_type: Some(self.media_type().to_owned()),
                digest: descriptor.digest.clone(),
                annotations: (!annotations.is_empty()).then(|| annotations.clone()),
            }),
            Self::SimpleSigning => SimpleSigning::for_descriptor(descriptor, annotations).to_payload(),
        }
    }
}

/// Extract the claim a payload makes about the image described by `descriptor`.
///
/// # Errors
///
/// Returns [`ItemFailure::UnsupportedFormat`] for an unknown media type and
/// [`ItemFailure::Malformed`] for undecodable payloads.
pub fn extract_claim(
    descriptor: &ImageDescriptor,
    payload: &[u8],
) -> Result<ExtractedClaim, ItemFailure> {
    let format = PayloadFormat::from_media_type(&descriptor.media_type).ok_or_else(|| {
        ItemFailure::UnsupportedFormat {
            digest: descriptor.digest.clone(),
            media_type: descriptor.media_type.clone(),
        }
    })?;
    format.extract(payload)
}

/// An OCI descriptor embedded as a signed payload.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EmbeddedDescriptor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    media_type: Option<String>,
    #[serde(default)]
    digest: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    annotations: Option<BTreeMap<String, String>>,
}

/// A simple-signing payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimpleSigning {
    /// Claims a verifier must understand.
    pub critical: Critical,
    /// Free-form annotations.
    #[serde(default)]
    pub optional: Option<BTreeMap<String, String>>,
}

/// The `critical` section of a simple-signing payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Critical {
    /// Where the image was referenced from.
    #[serde(default)]
    pub identity: Identity,
    /// The image the signature is for.
    pub image: Image,
    /// Signature type marker.
    #[serde(rename = "type", default)]
    pub kind: String,
}

/// The `critical.identity` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Registry reference of the signed image.
    #[serde(rename = "docker-reference", default)]
    pub docker_reference: String,
}

/// The `critical.image` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    /// Digest of the signed manifest.
    #[serde(rename = "docker-manifest-digest")]
    pub docker_manifest_digest: String,
}

impl SimpleSigning {
    /// Build the payload a signer signs for `descriptor`.
    ///
    /// Empty `annotations` produce `"optional": null`.
    pub fn for_descriptor(
        descriptor: &ImageDescriptor,
        annotations: &BTreeMap<String, String>,
    ) -> Self {
        Self {
            critical: Critical {
                identity: Identity::default(),
                image: Image {
                    docker_manifest_digest: descriptor.digest.clone(),
                },
                kind: SIMPLE_SIGNING_TYPE.to_owned(),
            },
            optional: (!annotations.is_empty()).then(|| annotations.clone()),
        }
    }

    /// Serialize to the JSON bytes that get signed.
    ///
    /// # Errors
    ///
    /// Returns a [`serde_json::Error`] if serialization fails.
    pub fn to_payload(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}
