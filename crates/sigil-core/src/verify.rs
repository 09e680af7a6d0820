//! Top-level verification orchestrator.
//!
//! The [`Verifier`] runs two phases over the candidate signatures:
//! 1. every candidate's signature is checked against the public key;
//! 2. if claim checking is enabled, each survivor's payload is decoded and
//!    its digest and annotations are compared with the image.
//!
//! A candidate that fails a phase is dropped and its reason recorded. The
//! call only fails when a phase drops every candidate, and the error then
//! lists every reason in candidate order.

use std::collections::BTreeMap;

use crate::claims;
use crate::error::{ItemFailure, VerificationError};
use crate::keys::PublicKey;
use crate::matcher;
use crate::payload::{ImageDescriptor, SignedPayload};
use crate::signature;
use crate::source::SignatureSource;

/// Configuration for a verification run.
#[derive(Debug, Clone)]
pub struct VerifyConfig {
    /// Annotations every trusted payload must assert.
    pub annotations: BTreeMap<String, String>,
    /// Whether to check payload claims after signatures.
    pub check_claims: bool,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            annotations: BTreeMap::new(),
            check_claims: true,
        }
    }
}

/// Orchestrates signature and claim checks for one public key.
#[derive(Debug, Clone)]
pub struct Verifier {
    public_key: PublicKey,
    config: VerifyConfig,
}

impl Verifier {
    /// Create a verifier for `public_key` with the given configuration.
    pub const fn new(public_key: PublicKey, config: VerifyConfig) -> Self {
        Self { public_key, config }
    }

    /// The configuration this verifier runs with.
    pub const fn config(&self) -> &VerifyConfig {
        &self.config
    }

    /// Return the candidates that pass every requested check, in input order.
    ///
    /// # Errors
    ///
    /// Returns [`VerificationError::NoValidSignatures`] if no candidate has a
    /// valid signature, and [`VerificationError::NoMatchingClaims`] if claim
    /// checking is enabled and no signature-valid candidate makes matching
    /// claims.
    pub fn verify(
        &self,
        descriptor: &ImageDescriptor,
        candidates: &[SignedPayload],
    ) -> Result<Vec<SignedPayload>, VerificationError> {
        let valid = valid_signatures(&self.public_key, candidates)?;

        if !self.config.check_claims {
            tracing::debug!("claim checks disabled, accepting signature-valid payloads");
            return Ok(valid.into_iter().cloned().collect());
        }

        let verified = verify_claims(descriptor, &self.config.annotations, valid)?;
        Ok(verified.into_iter().cloned().collect())
    }

    /// Fetch the signatures for `reference` from `source` and verify them.
    ///
    /// # Errors
    ///
    /// Returns any error from the source, or from [`Verifier::verify`].
    pub fn verify_source(
        &self,
        source: &dyn SignatureSource,
        reference: &str,
    ) -> Result<Vec<SignedPayload>, VerificationError> {
        let bundle = source.fetch(reference)?;
        tracing::info!(
            reference,
            digest = %bundle.descriptor.digest,
            candidates = bundle.signatures.len(),
            "verifying signatures"
        );
        self.verify(&bundle.descriptor, &bundle.signatures)
    }
}

/// Phase 1: keep the candidates whose signature verifies under `public_key`.
///
/// # Errors
///
/// Returns [`VerificationError::NoValidSignatures`] with one reason per
/// candidate if none verify.
pub fn valid_signatures<'a>(
    public_key: &PublicKey,
    candidates: &'a [SignedPayload],
) -> Result<Vec<&'a SignedPayload>, VerificationError> {
    let (valid, reasons) = run_phase("signature", candidates.iter(), |sp| {
        signature::verify_signature(public_key, &sp.base64_signature, &sp.payload)
    });

    if valid.is_empty() {
        return Err(VerificationError::NoValidSignatures(reasons));
    }
    Ok(valid)
}

/// Phase 2: keep the candidates whose payload claims `descriptor`'s digest
/// and every wanted annotation.
///
/// # Errors
///
/// Returns [`VerificationError::NoMatchingClaims`] with one reason per
/// candidate if none match.
pub fn verify_claims<'a>(
    descriptor: &ImageDescriptor,
    wanted: &BTreeMap<String, String>,
    candidates: Vec<&'a SignedPayload>,
) -> Result<Vec<&'a SignedPayload>, VerificationError> {
    let (verified, reasons) = run_phase("claims", candidates, |sp| {
        let claim = claims::extract_claim(descriptor, &sp.payload)?;
        matcher::check_claim(&descriptor.digest, wanted, &claim)
    });

    if verified.is_empty() {
        return Err(VerificationError::NoMatchingClaims(reasons));
    }
    Ok(verified)
}

/// Split candidates into those `check` accepts and the reasons for the rest,
/// both in input order.
fn run_phase<'a, I, F>(phase: &'static str, candidates: I, check: F) -> (Vec<&'a SignedPayload>, Vec<String>)
where
    I: IntoIterator<Item = &'a SignedPayload>,
    F: Fn(&SignedPayload) -> Result<(), ItemFailure>,
{
    let mut passed = Vec::new();
    let mut reasons = Vec::new();

    for sp in candidates {
        match check(sp) {
            Ok(()) => {
                tracing::debug!(phase, payload_digest = %sp.payload_digest(), "candidate passed");
                passed.push(sp);
            }
            Err(e) => {
                tracing::debug!(phase, payload_digest = %sp.payload_digest(), reason = %e, "candidate rejected");
                reasons.push(e.to_string());
            }
        }
    }

    if passed.is_empty() {
        tracing::warn!(phase, rejected = reasons.len(), "no candidates survived");
    } else {
        tracing::info!(phase, passed = passed.len(), rejected = reasons.len(), "phase complete");
    }
    (passed, reasons)
}
