//! Refreshment
//!
//! Renews the AWS credentials in `~/.aws/credentials`, either by exchanging
//! an MFA token for a temporary session via STS or by delegating to a
//! Substrate helper binary. Credentials that are still valid are reused
//! rather than replaced.
//!
//! A run is a single linear pass:
//! 1. Parse flags, environment variables and the optional YAML config file,
//!    and resolve them into one refresh mode
//! 2. Load the credentials file
//! 3. If the mode's cached profile still passes identity verification,
//!    promote it and stop
//! 4. Otherwise obtain new credentials for the mode and persist them
//!
//! Failures to locate or parse the credentials file are fatal. Identity
//! provider and helper failures are reported on stderr but exit zero, as
//! the tool always has.

use anyhow::Result;
use clap::Parser;
use log::{error, info};

mod cli;
mod config;
mod refresher;
mod store;
mod sts;

use cli::Args;
use config::{RefreshMode, Settings};
use refresher::Refresher;
use store::CredentialFile;
use sts::StsIdentity;

#[tokio::main]
async fn main() -> Result<()> {
    // INFO by default so progress lines show up on stderr; RUST_LOG overrides.
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args = Args::parse();
    let settings = Settings::load(args.config.as_deref())?;

    let mode = match RefreshMode::resolve(&args, &settings) {
        Ok(mode) => mode,
        Err(err) => {
            error!("{err:#}");
            return Ok(());
        }
    };
    match mode {
        RefreshMode::Mfa { .. } => info!("Using MFA-based creds"),
        RefreshMode::Substrate { .. } => info!("Using Substrate-based creds"),
    }

    let path = match args.credentials_path.or(settings.credentials_path) {
        Some(path) => path,
        None => CredentialFile::default_path()?,
    };
    let store = CredentialFile::load(path)?;

    if let Err(err) = Refresher::new(store, StsIdentity).run(&mode).await {
        error!("{err:#}");
    }
    Ok(())
}
