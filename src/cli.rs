//! Command-line interface definitions.

use std::path::PathBuf;

use clap::Parser;

/// AWS credential refresher.
///
/// Refreshment is a pleasant tool to renew your AWS credentials, either
/// with a fresh token from your multifactor auth device or by delegating
/// to a Substrate helper binary. Results are written to `~/.aws/credentials`.
#[derive(Debug, Parser)]
#[command(name = "refreshment", author, version, about)]
pub struct Args {
    /// Serial number (ARN) of your MFA device
    #[arg(short = 'm', long = "mfaSerial", env = "REFRESHMENT_MFA_SERIAL")]
    pub mfa_serial: Option<String>,

    /// Generated token from your MFA device
    #[arg(short = 't', long = "token", env = "REFRESHMENT_TOKEN")]
    pub token: Option<String>,

    /// Location of your Substrate binary
    #[arg(short = 'p', long = "pathToSubstrate", env = "REFRESHMENT_PATH_TO_SUBSTRATE")]
    pub path_to_substrate: Option<PathBuf>,

    /// Location of your Substrate root (containing your modules/ and root-modules/)
    #[arg(short = 'r', long = "terraformRootPath", env = "REFRESHMENT_TERRAFORM_ROOT_PATH")]
    pub terraform_root_path: Option<PathBuf>,

    /// Config file [default: ~/.refreshment.yaml]
    #[arg(long, env = "REFRESHMENT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Path to AWS credentials file [default: ~/.aws/credentials]
    #[arg(long, env = "AWS_SHARED_CREDENTIALS_FILE")]
    pub credentials_path: Option<PathBuf>,
}
