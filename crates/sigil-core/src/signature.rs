//! Detached Ed25519 signature checks.
//!
//! The signature covers the payload bytes exactly as received. Nothing is
//! canonicalized or hashed beyond what Ed25519 itself does.

use std::borrow::Cow;

use aws_lc_rs::signature::{self, ED25519};
use base64::Engine;

use crate::error::ItemFailure;
use crate::keys::PublicKey;

/// Verify a base64-encoded signature over `payload`.
///
/// # Errors
///
/// Returns [`ItemFailure::SignatureInvalid`] if the signature is not valid
/// standard base64 or does not verify under `public_key`. Line breaks in
/// the base64 text are skipped.
pub fn verify_signature(
    public_key: &PublicKey,
    signature_b64: &str,
    payload: &[u8],
) -> Result<(), ItemFailure> {
    let signature_b64 = strip_line_breaks(signature_b64);
    let sig_bytes = base64::engine::general_purpose::STANDARD
        .decode(signature_b64.as_bytes())
        .map_err(|e| ItemFailure::SignatureInvalid(format!("invalid base64 signature: {e}")))?;

    signature::UnparsedPublicKey::new(&ED25519, public_key.as_bytes())
        .verify(payload, &sig_bytes)
        .map_err(|_| ItemFailure::SignatureInvalid("unable to verify signature".to_owned()))
}

/// Drop `\r` and `\n`, which wrapped or newline-terminated base64 carries.
fn strip_line_breaks(text: &str) -> Cow<'_, str> {
    if text.contains(['\r', '\n']) {
        Cow::Owned(text.chars().filter(|c| !matches!(c, '\r' | '\n')).collect())
    } else {
        Cow::Borrowed(text)
    }
}
