//! STS calls: identity verification and the MFA session-token exchange.

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use aws_sdk_sts::{Client, config::Credentials};
use log::error;

use crate::store::CandidateCredentials;

/// Session lifetime requested from GetSessionToken, the STS maximum of 36 hours.
const SESSION_DURATION_SECONDS: i32 = 129_600;

/// The identity-provider operations the refresher depends on. Split out
/// so the decision flow can be exercised without the network.
#[async_trait]
pub trait IdentityProvider {
    /// Checks whether `credentials` are still accepted by the provider.
    async fn verify(&self, credentials: &CandidateCredentials) -> Result<()>;

    /// Exchanges an MFA serial and token code for fresh temporary credentials.
    async fn session_token(&self, serial: &str, token: &str) -> Result<CandidateCredentials>;
}

/// The real thing, backed by AWS STS.
pub struct StsIdentity;

#[async_trait]
impl IdentityProvider for StsIdentity {
    async fn verify(&self, credentials: &CandidateCredentials) -> Result<()> {
        let config = aws_config::from_env()
            .credentials_provider(Credentials::new(
                credentials.access_key_id.clone(),
                credentials.secret_access_key.clone(),
                Some(credentials.session_token.clone()),
                None,
                "refreshment",
            ))
            .load()
            .await;

        Client::new(&config)
            .get_caller_identity()
            .send()
            .await
            .context("GetCallerIdentity failed")?;
        Ok(())
    }

    async fn session_token(&self, serial: &str, token: &str) -> Result<CandidateCredentials> {
        let config = aws_config::from_env().load().await;
        let output = Client::new(&config)
            .get_session_token()
            .duration_seconds(SESSION_DURATION_SECONDS)
            .serial_number(serial)
            .token_code(token)
            .send()
            .await
            .map_err(|err| {
                let err = err.into_service_error();
                if err.is_region_disabled_exception() {
                    // STS is opt-in per region; call that case out by name.
                    error!("RegionDisabledException: {err}");
                }
                anyhow!(err).context("GetSessionToken failed")
            })?;

        let credentials = output
            .credentials()
            .context("No credentials in GetSessionToken response")?;
        Ok(CandidateCredentials {
            access_key_id: credentials.access_key_id().to_owned(),
            secret_access_key: credentials.secret_access_key().to_owned(),
            session_token: credentials.session_token().to_owned(),
        })
    }
}
