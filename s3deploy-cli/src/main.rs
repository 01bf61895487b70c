//! s3-deploy: publish a static web build to S3 and refresh CloudFront.
//!
//! # Usage
//!
//! ```text
//! s3-deploy <PRODUCT> <DEPLOYMENT> <DIRECTORY>
//!           [--dry-run] [--force-transfer] [--invalidation-only]
//!           [--maintain-versions <VERSIONS>] [--config <PATH>]
//! ```

mod commands;

use anyhow::Result;
use clap::Parser;

use commands::deploy::DeployArgs;

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "s3-deploy",
    version,
    about = "Copy a production web build to S3 and invalidate its CloudFront distribution",
    long_about = None,
)]
struct Cli {
    #[command(flatten)]
    deploy: DeployArgs,
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    cli.deploy.run()
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
