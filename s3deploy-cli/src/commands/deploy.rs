//! `s3-deploy <product> <deployment> <dir>`: sync a build and invalidate the CDN.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use s3deploy_aws::AwsRemote;
use s3deploy_core::{
    config::{self, DeployConfig},
    DeploymentName, ProductName, RetentionPolicy,
};
use s3deploy_sync::{
    pipeline::{self, SyncOptions, SyncReport},
    TransferResult,
};

/// Arguments for a deployment run.
#[derive(Args, Debug)]
pub struct DeployArgs {
    /// Product to deploy (must be listed in the config's `general.products`).
    #[arg(value_name = "PRODUCT")]
    pub product: String,

    /// Deployment to target (must be listed in `general.deployments`).
    #[arg(value_name = "DEPLOYMENT")]
    pub deployment: String,

    /// Build directory containing index.html and asset-manifest.json.
    #[arg(value_name = "DIRECTORY")]
    pub build_dir: PathBuf,

    /// Run without transferring to S3 or invalidating CloudFront.
    #[arg(short = 'd', long)]
    pub dry_run: bool,

    /// Transfer all build files, ignoring existing files on S3.
    #[arg(short = 'f', long)]
    pub force_transfer: bool,

    /// Create the CloudFront invalidation only.
    #[arg(short = 'i', long)]
    pub invalidation_only: bool,

    /// Number of superseded versions whose files are kept.
    #[arg(short = 'm', long, value_name = "VERSIONS")]
    pub maintain_versions: Option<u32>,

    /// Configuration file.
    #[arg(
        short = 'c',
        long,
        env = "S3_DEPLOY_CONFIG",
        default_value = "s3-deploy.yaml",
        value_name = "PATH"
    )]
    pub config: PathBuf,
}

impl DeployArgs {
    pub fn run(self) -> Result<()> {
        let file = config::load_at(&self.config)
            .with_context(|| format!("cannot load configuration '{}'", self.config.display()))?;
        let settings = DeployConfig::from_env(file).context("invalid configuration")?;
        let target = settings
            .target(
                &ProductName::from(self.product.as_str()),
                &DeploymentName::from(self.deployment.as_str()),
            )
            .context("invalid deployment target")?;
        pipeline::validate_build_dir(&self.build_dir).context("invalid build directory")?;

        let options = SyncOptions {
            dry_run: self.dry_run,
            force_transfer: self.force_transfer,
            invalidation_only: self.invalidation_only,
            retention: RetentionPolicy::from(self.maintain_versions),
        };

        let remote = AwsRemote::connect(&settings.region, &settings.credentials)
            .context("cannot initialise AWS clients")?;
        let report = pipeline::run(&remote, &remote, &target, &self.build_dir, &options)
            .with_context(|| format!("deployment failed for '{}'", target.prefix()))?;

        print_report(&report, &options);
        Ok(())
    }
}

/// `deployments/<product>/<deployment> synced (N uploaded, M removed)`
fn summary_line(report: &SyncReport) -> String {
    format!(
        "{} synced ({} uploaded, {} removed)",
        report.prefix,
        report.uploaded(),
        report.removed()
    )
}

fn print_report(report: &SyncReport, options: &SyncOptions) {
    let prefix = if options.dry_run { "[dry-run] " } else { "" };

    if !options.invalidation_only {
        println!("{prefix}{} {}", "✓".green(), summary_line(report));

        for t in &report.transfers {
            match t {
                TransferResult::Uploaded { key, .. } => println!("  ↑  {key}"),
                TransferResult::WouldUpload { key, .. } => println!("  ~  {key}"),
                TransferResult::Deleted { key } => println!("  ✗  {key}"),
                TransferResult::WouldDelete { key } => println!("  -  {key}"),
            }
        }
    }

    match &report.invalidation {
        Some(id) => println!("{} CloudFront invalidation {id} created", "✓".green()),
        None => println!("{prefix}CloudFront invalidation skipped"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use s3deploy_sync::{upload::CachePolicy, Reconciliation};

    fn report(transfers: Vec<TransferResult>) -> SyncReport {
        SyncReport {
            prefix: "deployments/webapp/staging".to_string(),
            plan: Reconciliation::default(),
            transfers,
            invalidation: None,
        }
    }

    #[test]
    fn summary_names_the_bare_prefix_and_counts() {
        let report = report(vec![
            TransferResult::Uploaded {
                key: "index.html".to_string(),
                cache: CachePolicy::NoCache,
            },
            TransferResult::WouldDelete {
                key: "old.js".to_string(),
            },
        ]);
        assert_eq!(
            summary_line(&report),
            "deployments/webapp/staging synced (1 uploaded, 1 removed)"
        );
    }

    #[test]
    fn empty_run_uses_the_same_summary_shape() {
        assert_eq!(
            summary_line(&report(Vec::new())),
            "deployments/webapp/staging synced (0 uploaded, 0 removed)"
        );
    }
}
