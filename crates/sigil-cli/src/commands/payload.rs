//! The `sigil payload` subcommand.
//!
//! Prints the payload a signer should sign for an image, in the format the
//! descriptor media type selects.

use std::collections::BTreeMap;
use std::io::Write;

use clap::Args;
use color_eyre::eyre::{Result, eyre};
use sigil_core::ImageDescriptor;
use sigil_core::claims::{PayloadFormat, SIMPLE_SIGNING_MEDIA_TYPE};

use super::parse_annotation;

/// Arguments for `sigil payload`.
#[derive(Args)]
pub struct PayloadArgs {
    /// Digest of the image manifest, e.g. `sha256:…`.
    #[arg(long)]
    pub digest: String,

    /// Annotation to embed in the payload (repeatable).
    #[arg(short = 'a', long = "annotation", value_name = "KEY=VALUE", value_parser = parse_annotation)]
    pub annotations: Vec<(String, String)>,

    /// Descriptor media type selecting the payload format.
    #[arg(long, default_value = SIMPLE_SIGNING_MEDIA_TYPE)]
    pub media_type: String,
}

/// Execute the payload command.
pub fn execute(args: &PayloadArgs) -> Result<()> {
    let descriptor = ImageDescriptor::new(args.digest.as_str(), args.media_type.as_str());
    let payload = default_payload(&descriptor, &args.annotations)?;
    std::io::stdout().lock().write_all(&payload)?;
    Ok(())
}

/// The payload for `descriptor` in the format its media type selects.
pub(super) fn default_payload(
    descriptor: &ImageDescriptor,
    annotations: &[(String, String)],
) -> Result<Vec<u8>> {
    let format = PayloadFormat::from_media_type(&descriptor.media_type)
        .ok_or_else(|| eyre!("no payload format for media type {}", descriptor.media_type))?;
    let annotations: BTreeMap<String, String> = annotations.iter().cloned().collect();
    Ok(format.payload_for(descriptor, &annotations)?)
}
