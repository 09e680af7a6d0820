//! Sigil CLI — sign blobs and verify container image signatures.

mod commands;
mod config;

use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::Result;

/// Sigil — decide whether to trust a container image before running it.
///
/// Verifies detached Ed25519 signatures attached to an image and checks that
/// the signed payloads claim the right digest and annotations.
#[derive(Parser)]
#[command(name = "sigil", version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (repeat for more detail: -v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Output logs as JSON (for machine consumption).
    #[arg(long, global = true)]
    json_logs: bool,

    /// Configuration file (defaults to the user config directory).
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Verify the signatures in a bundle against a public key.
    Verify(commands::verify::VerifyArgs),
    /// Sign a blob with a PKCS#8 Ed25519 key.
    SignBlob(commands::sign_blob::SignBlobArgs),
    /// Print the simple-signing payload for an image digest.
    Payload(commands::payload::PayloadArgs),
    /// Attach a signature and its payload to a bundle file.
    Attach(commands::attach::AttachArgs),
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true);

    if cli.json_logs {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    let config = config::Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Verify(args) => commands::verify::execute(args, &config),
        Commands::SignBlob(args) => commands::sign_blob::execute(&args),
        Commands::Payload(args) => commands::payload::execute(&args),
        Commands::Attach(args) => commands::attach::execute(args),
    }
}
