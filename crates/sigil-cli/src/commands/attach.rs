//! The `sigil attach` subcommand.
//!
//! Adds a signature and the payload it covers to a bundle file, creating the
//! bundle when a digest is given.

use std::path::{Path, PathBuf};

use base64::Engine;
use clap::Args;
use color_eyre::eyre::{Result, WrapErr, eyre};
use sigil_core::claims::{PayloadFormat, SIMPLE_SIGNING_MEDIA_TYPE};
use sigil_core::source::SignatureBundle;
use sigil_core::{ImageDescriptor, SignedPayload};

use super::payload::default_payload;
use super::{parse_annotation, read_input};

/// Arguments for `sigil attach`.
#[derive(Args)]
pub struct AttachArgs {
    /// Path to the bundle file to update.
    #[arg(long, value_name = "PATH")]
    pub bundle: PathBuf,

    /// The base64 signature, a file containing it, or `-` for stdin.
    #[arg(long, value_name = "SIG")]
    pub signature: String,

    /// Path to the signed payload (defaults to the payload the bundle's
    /// media type selects for its digest).
    #[arg(long, value_name = "PATH")]
    pub payload: Option<PathBuf>,

    /// Annotation embedded in the generated payload (repeatable).
    #[arg(
        short = 'a',
        long = "annotation",
        value_name = "KEY=VALUE",
        value_parser = parse_annotation,
        conflicts_with = "payload"
    )]
    pub annotations: Vec<(String, String)>,

    /// Image digest, required when creating a new bundle.
    #[arg(long)]
    pub digest: Option<String>,

    /// Descriptor media type for a new bundle.
    #[arg(long, default_value = SIMPLE_SIGNING_MEDIA_TYPE)]
    pub media_type: String,

    /// Image reference the bundle is bound to. `sigil verify` refuses the
    /// bundle for any other reference.
    #[arg(long)]
    pub reference: Option<String>,
}

/// Execute the attach command.
pub fn execute(args: AttachArgs) -> Result<()> {
    let signature = signature_text(&args.signature)?;

    let mut bundle = if args.bundle.exists() {
        SignatureBundle::from_file(&args.bundle)
            .wrap_err_with(|| format!("failed to read bundle {}", args.bundle.display()))?
    } else {
        let digest = args
            .digest
            .clone()
            .ok_or_else(|| eyre!("bundle does not exist; --digest is required to create it"))?;
        let mut bundle = SignatureBundle::new(ImageDescriptor::new(digest, args.media_type.clone()));
        bundle.reference.clone_from(&args.reference);
        bundle
    };

    if let Some(digest) = &args.digest {
        if *digest != bundle.descriptor.digest {
            return Err(eyre!(
                "bundle is for {}, not {digest}",
                bundle.descriptor.digest
            ));
        }
    }

    if let Some(reference) = &args.reference {
        match &bundle.reference {
            Some(recorded) if recorded != reference => {
                return Err(eyre!("bundle is bound to {recorded}, not {reference}"));
            }
            Some(_) => {}
            None => bundle.reference = Some(reference.clone()),
        }
    }

    let payload = match &args.payload {
        Some(path) => std::fs::read(path)
            .wrap_err_with(|| format!("failed to read payload {}", path.display()))?,
        None => {
            if PayloadFormat::from_media_type(&bundle.descriptor.media_type).is_none() {
                return Err(eyre!(
                    "--payload is required for media type {}",
                    bundle.descriptor.media_type
                ));
            }
            default_payload(&bundle.descriptor, &args.annotations)?
        }
    };

    bundle.attach(SignedPayload::new(payload, signature));
    bundle.write_file(&args.bundle)?;
    eprintln!(
        "Attached signature to {} ({} total)",
        args.bundle.display(),
        bundle.signatures.len()
    );
    Ok(())
}

/// Resolve the signature argument to base64 text.
///
/// The argument is stdin for `-`, a file if one exists at that path, and
/// the literal signature otherwise.
fn signature_text(sig_ref: &str) -> Result<String> {
    let raw = if sig_ref == "-" || Path::new(sig_ref).is_file() {
        let bytes = read_input(sig_ref).wrap_err("failed to read signature")?;
        String::from_utf8(bytes).wrap_err("signature is not UTF-8 text")?
    } else {
        sig_ref.to_owned()
    };

    let signature = raw.trim();
    if signature.is_empty() {
        return Err(eyre!("empty signature"));
    }
    base64::engine::general_purpose::STANDARD
        .decode(signature)
        .wrap_err("signature is not valid base64")?;
    Ok(signature.to_owned())
}
