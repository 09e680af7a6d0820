//! Comparing extracted claims with the image under inspection.

use std::collections::BTreeMap;

use crate::error::ItemFailure;
use crate::payload::ExtractedClaim;

/// Returns `true` if `claim` asserts `expected_digest` and every wanted
/// annotation.
///
/// The digest comparison is exact. Annotations are a subset check: extra
/// annotations in the claim are ignored, and an empty `wanted` always matches.
pub fn claim_matches(
    expected_digest: &str,
    wanted: &BTreeMap<String, String>,
    claim: &ExtractedClaim,
) -> bool {
    check_claim(expected_digest, wanted, claim).is_ok()
}

/// Like [`claim_matches`], but says which part of the claim was wrong.
///
/// # Errors
///
/// Returns [`ItemFailure::DigestMismatch`] if the digests differ, otherwise
/// [`ItemFailure::AnnotationMismatch`] if a wanted annotation is missing or
/// has a different value.
pub fn check_claim(
    expected_digest: &str,
    wanted: &BTreeMap<String, String>,
    claim: &ExtractedClaim,
) -> Result<(), ItemFailure> {
    if claim.digest != expected_digest {
        return Err(ItemFailure::DigestMismatch {
            found: claim.digest.clone(),
        });
    }
    if !annotations_satisfied(wanted, &claim.annotations) {
        return Err(ItemFailure::AnnotationMismatch {
            found: claim.annotations.clone(),
        });
    }
    Ok(())
}

fn annotations_satisfied(wanted: &BTreeMap<String, String>, have: &BTreeMap<String, String>) -> bool {
    wanted.iter().all(|(k, v)| have.get(k) == Some(v))
}
