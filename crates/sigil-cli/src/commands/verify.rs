//! The `sigil verify` subcommand.
//!
//! Verifies a signature bundle against a public key and prints the payloads
//! that can be trusted.

use std::path::PathBuf;

use clap::Args;
use color_eyre::eyre::{Result, WrapErr, eyre};
use sigil_core::keys;
use sigil_core::source::BundleFile;
use sigil_core::{SignedPayload, Verifier, VerifyConfig};

use super::parse_annotation;
use crate::config::Config;

/// Arguments for `sigil verify`.
#[derive(Args)]
pub struct VerifyArgs {
    /// Image reference the signatures are for.
    pub reference: String,

    /// Path to the signature bundle JSON file.
    #[arg(long, value_name = "PATH")]
    pub bundle: PathBuf,

    /// Public key: a PEM file path or base64 SPKI.
    #[arg(long, value_name = "KEY")]
    pub key: Option<String>,

    /// Annotation every trusted payload must assert (repeatable).
    #[arg(short = 'a', long = "annotation", value_name = "KEY=VALUE", value_parser = parse_annotation)]
    pub annotations: Vec<(String, String)>,

    /// Whether to check payload digests and annotations [default: true].
    #[arg(long, value_name = "BOOL")]
    pub check_claims: Option<bool>,

    /// Output results as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Execute the verify command.
pub fn execute(args: VerifyArgs, config: &Config) -> Result<()> {
    let key_ref = args
        .key
        .as_deref()
        .or(config.key.as_deref())
        .ok_or_else(|| eyre!("no public key given (use --key or set `key` in the config)"))?;
    let public_key =
        keys::load_public_key(key_ref).wrap_err_with(|| format!("failed to load key `{key_ref}`"))?;

    let mut annotations = config.annotations.clone();
    annotations.extend(args.annotations);

    let verify_config = VerifyConfig {
        annotations,
        check_claims: args.check_claims.or(config.check_claims).unwrap_or(true),
    };

    let verifier = Verifier::new(public_key, verify_config);
    let verified = verifier.verify_source(&BundleFile::new(&args.bundle), &args.reference)?;

    if args.json {
        let report: Vec<serde_json::Value> = verified.iter().map(payload_json).collect();
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        eprintln!("\nVerification for {} --", args.reference);
        eprintln!("The following checks were performed on these signatures:");
        if verifier.config().check_claims {
            eprintln!("  - The signed claims were validated");
        }
        eprintln!("  - The signatures were verified against the specified public key");
        for sp in &verified {
            println!("{}", String::from_utf8_lossy(&sp.payload));
        }
    }

    Ok(())
}

fn payload_json(sp: &SignedPayload) -> serde_json::Value {
    let payload = serde_json::from_slice(&sp.payload)
        .unwrap_or_else(|_| serde_json::Value::String(String::from_utf8_lossy(&sp.payload).into_owned()));
    serde_json::json!({
        "payloadDigest": sp.payload_digest(),
        "payload": payload,
        "base64Signature": sp.base64_signature,
    })
}
