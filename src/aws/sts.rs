use async_trait::async_trait;
use aws_config::{
    environment::EnvironmentVariableRegionProvider, meta::region::RegionProviderChain,
    profile::ProfileFileRegionProvider,
};
use aws_sdk_sts::{
    Client as StsClient,
    config::{BehaviorVersion, Config as StsConfig, Region, retry::RetryConfig},
    error::{DisplayErrorContext, ProvideErrorMetadata},
};
use tracing::{debug, info};

use super::Credentials;
use crate::{
    config::{FederationConfig, parse_endpoint},
    constants::DEFAULT_AWS_REGION,
    error::FederationError,
    idp::IdToken,
};

/// Trades an identity assertion for temporary AWS credentials
#[async_trait]
pub trait CredentialExchange: Send + Sync {
    async fn exchange(
        &self,
        role_arn: &str,
        session_name: &str,
        id_token: &IdToken,
    ) -> Result<Credentials, FederationError>;
}

/// STS client that only ever authenticates with the supplied web identity token
#[derive(Debug, Clone)]
pub struct StsExchanger {
    client: StsClient,
    duration_seconds: Option<i32>,
}

impl StsExchanger {
    /// Build the client, resolving the region from the AWS provider chain if needed.
    pub async fn connect(config: &FederationConfig) -> Result<Self, FederationError> {
        let region = resolve_region(config.region.as_deref()).await;
        Self::with_region(config, region)
    }

    pub fn with_region(config: &FederationConfig, region: Region) -> Result<Self, FederationError> {
        debug!("STS region: {}", region);

        // No credentials provider: local AWS credentials must never reach the target account.
        let mut builder = StsConfig::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(region)
            .retry_config(RetryConfig::disabled());

        if let Some(endpoint) = &config.sts_endpoint {
            parse_endpoint(endpoint)?;
            debug!("STS endpoint: {}", endpoint);
            builder = builder.endpoint_url(endpoint);
        }

        Ok(Self {
            client: StsClient::from_conf(builder.build()),
            duration_seconds: config.duration_seconds,
        })
    }
}

#[async_trait]
impl CredentialExchange for StsExchanger {
    async fn exchange(
        &self,
        role_arn: &str,
        session_name: &str,
        id_token: &IdToken,
    ) -> Result<Credentials, FederationError> {
        info!("Calling AWS STS AssumeRoleWithWebIdentity");
        debug!("Role ARN: {}", role_arn);
        debug!("Session name: {}", session_name);

        let response = self
            .client
            .assume_role_with_web_identity()
            .role_arn(role_arn)
            .role_session_name(session_name)
            .web_identity_token(id_token.as_str())
            .set_duration_seconds(self.duration_seconds)
            .send()
            .await
            .map_err(|e| {
                let reason = match (e.code(), e.message()) {
                    (Some(code), Some(message)) => format!("{code}: {message}"),
                    (Some(code), None) => code.to_string(),
                    _ => DisplayErrorContext(&e).to_string(),
                };
                FederationError::ExchangeRejected {
                    role_arn: role_arn.to_string(),
                    reason,
                }
            })?;

        let sts_creds = response
            .credentials()
            .ok_or_else(|| FederationError::ExchangeRejected {
                role_arn: role_arn.to_string(),
                reason: "AWS STS returned no credentials".to_string(),
            })?;

        let credentials = Credentials {
            access_key_id: sts_creds.access_key_id().to_string(),
            secret_access_key: sts_creds.secret_access_key().to_string(),
            session_token: sts_creds.session_token().to_string(),
            expiration: Some(*sts_creds.expiration()),
        };

        info!("Successfully obtained AWS credentials");
        Ok(credentials)
    }
}

// Priority: explicit flag -> ENV vars -> Config file -> DEFAULT_AWS_REGION
// The IMDS step of the default chain is skipped: on GCE 169.254.169.254 is the Google metadata server.
async fn resolve_region(explicit: Option<&str>) -> Region {
    if let Some(region) = explicit {
        return Region::new(region.to_string());
    }

    let chain = RegionProviderChain::first_try(EnvironmentVariableRegionProvider::new())
        .or_else(ProfileFileRegionProvider::new());

    match chain.region().await {
        Some(region) => {
            info!("Using region: {}", region);
            region
        }
        None => {
            info!(
                "No region configured, using default {} for STS",
                DEFAULT_AWS_REGION
            );
            Region::new(DEFAULT_AWS_REGION)
        }
    }
}
