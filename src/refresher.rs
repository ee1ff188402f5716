//! The refresh flow: reuse valid credentials, or go get new ones.
//!
//! Each mode works against a pair of profiles in the credentials file. A
//! run first looks at the mode's working cache (`refreshment_mfa` or
//! `refreshment_substrate`); if that profile is complete and the identity
//! provider still accepts it, the credentials are promoted into the target
//! profile (`nlk_corp` for MFA, `default` for Substrate) and nothing else
//! happens. Valid credentials are never needlessly replaced.
//!
//! Only when the cache is incomplete or rejected does the mode's refresh
//! branch run:
//!
//! - MFA: an STS GetSessionToken exchange. New credentials are written to
//!   both `nlk_corp` and `refreshment_mfa`, keeping the promoted alias and
//!   the working cache in sync for the next run's reuse check.
//! - Substrate: the helper binary is run as `<binary> credentials` inside
//!   the Substrate root with our stdin/stdout/stderr, and its output goes
//!   straight to the user. The credentials file is not updated on this
//!   path.
//!
//! The file is saved at most once, after everything has succeeded; a
//! failed exchange leaves it untouched.

use std::process::Command;

use anyhow::{Context, Result};
use log::{info, warn};

use crate::config::RefreshMode;
use crate::store::{CORP_PROFILE, CredentialFile, MFA_PROFILE};
use crate::sts::IdentityProvider;

pub struct Refresher<P> {
    store: CredentialFile,
    provider: P,
}

impl<P: IdentityProvider> Refresher<P> {
    pub fn new(store: CredentialFile, provider: P) -> Self {
        Self { store, provider }
    }

    pub async fn run(mut self, mode: &RefreshMode) -> Result<()> {
        if self.reuse_existing(mode).await? {
            return Ok(());
        }

        match mode {
            RefreshMode::Mfa { serial, token } => {
                let credentials = self.provider.session_token(serial, token).await?;
                // Dual write: promoted alias and working cache stay in sync.
                for profile in [CORP_PROFILE, MFA_PROFILE] {
                    self.store.set_profile(profile, &credentials);
                }
                self.store.save()?;
                info!("Wrote fresh credentials to {CORP_PROFILE} and {MFA_PROFILE}");
            }
            RefreshMode::Substrate { binary, root } => {
                info!("Invoking {}", binary.display());
                // The helper talks to the user directly over our streams.
                // TODO: capture its stdout and write the parsed
                // credentials into the store instead of relying on a shell
                // wrapper to do it.
                let status = Command::new(binary)
                    .arg("credentials")
                    .current_dir(root)
                    .status()
                    .with_context(|| format!("Failed to run {}", binary.display()))?;
                if !status.success() {
                    warn!("{} exited with {status}", binary.display());
                }
            }
        }
        Ok(())
    }

    /// The reuse short-circuit. Returns `Ok(true)` when the mode's cached
    /// credentials are complete and still valid, after promoting them into
    /// the target profile.
    async fn reuse_existing(&mut self, mode: &RefreshMode) -> Result<bool> {
        let cache = mode.cache_profile();
        let Some(credentials) = self.store.complete_profile(cache) else {
            info!("Credentials values are empty, generating new creds!");
            return Ok(false);
        };

        info!("Found configuration for {cache}");
        match self.provider.verify(&credentials).await {
            Ok(()) => {
                let target = mode.target_profile();
                info!("Existing credentials are valid, updating {target}!");
                self.store.set_profile(target, &credentials);
                self.store.save()?;
                info!("Swapped in existing credentials, rock n' roll");
                Ok(true)
            }
            Err(err) => {
                info!("Existing credentials were rejected ({err:#}), generating new creds!");
                Ok(false)
            }
        }
    }
}
