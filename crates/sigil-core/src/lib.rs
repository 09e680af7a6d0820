//! Signature and claim verification for container image signatures.
//!
//! `sigil-core` decides which detached signatures attached to an image can
//! be trusted. Verification runs in two phases:
//! 1. **Signature** — Ed25519 over the exact payload bytes
//! 2. **Claims** — the payload's asserted digest and annotations must match
//!    the image under inspection (optional)
//!
//! Fetching signatures and parsing key material are collaborators at the
//! edge of this crate ([`source`] and [`keys`]); the pipeline itself is a
//! pure function of its inputs.

pub mod claims;
pub mod digest;
pub mod error;
pub mod keys;
pub mod matcher;
pub mod payload;
pub mod signature;
pub mod source;
pub mod verify;

// Re-export primary types for convenience.
pub use error::{ItemFailure, VerificationError};
pub use keys::PublicKey;
pub use payload::{ExtractedClaim, ImageDescriptor, SignedPayload};
pub use verify::{Verifier, VerifyConfig};
