//! Loading Ed25519 key material.
//!
//! Public keys are accepted as SPKI, either PEM-wrapped in a file or as a
//! bare base64 string. Private keys are unencrypted PKCS#8 PEM.

use std::fmt;
use std::path::Path;

use aws_lc_rs::signature::{Ed25519KeyPair, KeyPair};
use base64::Engine;

use crate::error::VerificationError;

/// Size of a raw Ed25519 public key.
pub const PUBLIC_KEY_LEN: usize = 32;

/// DER prefix of an Ed25519 `SubjectPublicKeyInfo` (RFC 8410).
const ED25519_SPKI_PREFIX: [u8; 12] = [
    0x30, 0x2a, 0x30, 0x05, 0x06, 0x03, 0x2b, 0x65, 0x70, 0x03, 0x21, 0x00,
];

const PUBLIC_KEY_LABEL: &str = "PUBLIC KEY";
const PRIVATE_KEY_LABEL: &str = "PRIVATE KEY";

/// A raw Ed25519 public key.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct PublicKey([u8; PUBLIC_KEY_LEN]);

impl PublicKey {
    /// Wrap raw key bytes.
    ///
    /// # Errors
    ///
    /// Returns [`VerificationError::KeyError`] unless `bytes` is exactly
    /// 32 bytes long.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, VerificationError> {
        let raw: [u8; PUBLIC_KEY_LEN] = bytes.try_into().map_err(|_| {
            VerificationError::KeyError(format!(
                "Ed25519 public key must be {PUBLIC_KEY_LEN} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self(raw))
    }

    /// Parse an Ed25519 `SubjectPublicKeyInfo` DER structure.
    ///
    /// # Errors
    ///
    /// Returns [`VerificationError::KeyError`] if the DER is not an Ed25519 SPKI.
    pub fn from_spki_der(der: &[u8]) -> Result<Self, VerificationError> {
        let raw = der
            .strip_prefix(ED25519_SPKI_PREFIX.as_slice())
            .ok_or_else(|| VerificationError::KeyError("invalid public key".to_owned()))?;
        Self::from_bytes(raw)
    }

    /// Parse a PEM-encoded SPKI public key.
    ///
    /// # Errors
    ///
    /// Returns [`VerificationError::KeyError`] if the PEM cannot be decoded,
    /// is not labelled `PUBLIC KEY`, or does not hold an Ed25519 key.
    pub fn from_pem(pem: &str) -> Result<Self, VerificationError> {
        let (label, der) = pem_to_der(pem)
            .ok_or_else(|| VerificationError::KeyError("PEM decoding failed".to_owned()))?;
        if label != PUBLIC_KEY_LABEL {
            return Err(VerificationError::KeyError(format!("not public: {label:?}")));
        }
        Self::from_spki_der(&der)
    }

    /// The raw key bytes.
    pub const fn as_bytes(&self) -> &[u8; PUBLIC_KEY_LEN] {
        &self.0
    }

    /// Encode as SPKI DER.
    pub fn to_spki_der(&self) -> Vec<u8> {
        let mut der = ED25519_SPKI_PREFIX.to_vec();
        der.extend_from_slice(&self.0);
        der
    }

    /// Encode as a PEM `PUBLIC KEY` block.
    pub fn to_pem(&self) -> String {
        der_to_pem(&self.to_spki_der(), PUBLIC_KEY_LABEL)
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", hex::encode(self.0))
    }
}

/// Load a public key from a PEM file, or from base64 SPKI text.
///
/// `key_ref` is treated as a path when a file exists there; otherwise it is
/// decoded as base64 DER.
///
/// # Errors
///
/// Returns [`VerificationError::IoError`] if the file cannot be read and
/// [`VerificationError::KeyError`] if the material is not an Ed25519 key.
pub fn load_public_key(key_ref: &str) -> Result<PublicKey, VerificationError> {
    let path = Path::new(key_ref);
    if path.is_file() {
        let pem = std::fs::read_to_string(path)?;
        let key = PublicKey::from_pem(&pem)?;
        tracing::debug!(path = %path.display(), "loaded public key from file");
        return Ok(key);
    }

    let der = base64::engine::general_purpose::STANDARD
        .decode(key_ref.trim())
        .map_err(|e| VerificationError::KeyError(format!("invalid base64 public key: {e}")))?;
    PublicKey::from_spki_der(&der)
}

/// An Ed25519 private key used by `sign-blob`.
pub struct SigningKey {
    key_pair: Ed25519KeyPair,
}

impl SigningKey {
    /// Parse unencrypted PKCS#8 DER.
    ///
    /// # Errors
    ///
    /// Returns [`VerificationError::KeyError`] if the document is not an
    /// Ed25519 PKCS#8 key.
    pub fn from_pkcs8_der(der: &[u8]) -> Result<Self, VerificationError> {
        let key_pair = Ed25519KeyPair::from_pkcs8(der)
            .map_err(|e| VerificationError::KeyError(format!("failed to parse PKCS#8 key: {e}")))?;
        Ok(Self { key_pair })
    }

    /// Parse an unencrypted PKCS#8 `PRIVATE KEY` PEM block.
    ///
    /// # Errors
    ///
    /// Returns [`VerificationError::KeyError`] if the PEM is invalid or
    /// does not hold an Ed25519 key.
    pub fn from_pkcs8_pem(pem: &str) -> Result<Self, VerificationError> {
        let (label, der) = pem_to_der(pem)
            .ok_or_else(|| VerificationError::KeyError("PEM decoding failed".to_owned()))?;
        if label != PRIVATE_KEY_LABEL {
            return Err(VerificationError::KeyError(format!(
                "unsupported private key type: {label:?}"
            )));
        }
        Self::from_pkcs8_der(&der)
    }

    /// Read and parse a PKCS#8 PEM file.
    ///
    /// # Errors
    ///
    /// Returns [`VerificationError::IoError`] if the file cannot be read, or
    /// any error from [`SigningKey::from_pkcs8_pem`].
    pub fn load(path: &Path) -> Result<Self, VerificationError> {
        let pem = std::fs::read_to_string(path)?;
        Self::from_pkcs8_pem(&pem)
    }

    /// Sign `payload`, returning the raw 64-byte signature.
    pub fn sign(&self, payload: &[u8]) -> Vec<u8> {
        self.key_pair.sign(payload).as_ref().to_vec()
    }

    /// Sign `payload`, returning the signature as standard base64.
    pub fn sign_base64(&self, payload: &[u8]) -> String {
        base64::engine::general_purpose::STANDARD.encode(self.sign(payload))
    }

    /// The matching public key.
    ///
    /// # Errors
    ///
    /// Never fails for a well-formed key pair; the `Result` guards the
    /// conversion from the provider's byte representation.
    pub fn public_key(&self) -> Result<PublicKey, VerificationError> {
        PublicKey::from_bytes(self.key_pair.public_key().as_ref())
    }
}

// ── PEM helpers ──────────────────────────────────────────────────────

/// Wrap DER bytes in PEM with the given label.
pub fn der_to_pem(der: &[u8], label: &str) -> String {
    use std::fmt::Write;

    let b64 = base64::engine::general_purpose::STANDARD.encode(der);
    let mut pem = format!("-----BEGIN {label}-----\n");
    // base64 output is ASCII, so any byte offset is a char boundary
    let mut rest = b64.as_str();
    while !rest.is_empty() {
        let (line, tail) = rest.split_at(rest.len().min(64));
        pem.push_str(line);
        pem.push('\n');
        rest = tail;
    }
    let _ = writeln!(pem, "-----END {label}-----");
    pem
}

/// Extract the label and DER bytes from the first PEM block in `pem`.
pub fn pem_to_der(pem: &str) -> Option<(String, Vec<u8>)> {
    let mut label = None;
    let mut b64 = String::new();

    for line in pem.lines() {
        let trimmed = line.trim();
        if let Some(rest) = trimmed.strip_prefix("-----BEGIN ") {
            label = Some(rest.strip_suffix("-----")?.to_owned());
            continue;
        }
        if trimmed.starts_with("-----END ") {
            break;
        }
        if label.is_some() {
            b64.push_str(trimmed);
        }
    }

    let der = base64::engine::general_purpose::STANDARD.decode(&b64).ok()?;
    Some((label?, der))
}
