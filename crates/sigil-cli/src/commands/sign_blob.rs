//! The `sigil sign-blob` subcommand.
//!
//! Signs a blob with a PKCS#8 Ed25519 key and prints the signature.

use std::io::Write;
use std::path::PathBuf;

use clap::Args;
use color_eyre::eyre::{Result, WrapErr};
use sigil_core::keys::SigningKey;

use super::read_input;

/// Arguments for `sigil sign-blob`.
#[derive(Args)]
pub struct SignBlobArgs {
    /// Path to the blob to sign, or `-` for stdin.
    pub blob: String,

    /// Path to the PKCS#8 PEM private key.
    #[arg(long, value_name = "PATH")]
    pub key: PathBuf,

    /// Write the raw signature bytes instead of base64.
    #[arg(long)]
    pub raw: bool,
}

/// Execute the sign-blob command.
pub fn execute(args: &SignBlobArgs) -> Result<()> {
    let payload =
        read_input(&args.blob).wrap_err_with(|| format!("failed to read blob `{}`", args.blob))?;
    let key = SigningKey::load(&args.key)
        .wrap_err_with(|| format!("failed to load key {}", args.key.display()))?;

    let mut stdout = std::io::stdout().lock();
    if args.raw {
        stdout.write_all(&key.sign(&payload))?;
    } else {
        writeln!(stdout, "{}", key.sign_base64(&payload))?;
    }
    Ok(())
}
