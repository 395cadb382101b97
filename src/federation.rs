use aws_smithy_types::date_time::Format;
use std::{
    future::{self, Future},
    path::PathBuf,
    pin::Pin,
};
use tokio::time::{self, Instant};
use tracing::{debug, info};

use crate::{
    aws::{self, CredentialExchange},
    config::FederationConfig,
    error::FederationError,
    idp::IdentityTokenSource,
};

/// Identity token -> STS exchange -> credentials file
pub struct Federation<I, X> {
    identity: I,
    exchanger: X,
    config: FederationConfig,
}

impl<I, X> Federation<I, X>
where
    I: IdentityTokenSource,
    X: CredentialExchange,
{
    pub fn new(identity: I, exchanger: X, config: FederationConfig) -> Self {
        Self {
            identity,
            exchanger,
            config,
        }
    }

    /// Run all three stages, stopping at the first failure.
    ///
    /// `shutdown` resolving, or the configured timeout elapsing, aborts the
    /// network stage in flight. The credentials file is only touched once
    /// both network stages have succeeded.
    pub async fn run<S>(&self, shutdown: S) -> Result<PathBuf, FederationError>
    where
        S: Future<Output = ()>,
    {
        let config = &self.config;
        config.validate()?;

        let deadline = config.timeout.map(|t| Instant::now() + t);
        tokio::pin!(shutdown);

        info!("Requesting Google ID token for audience: {}", config.audience);
        let id_token = guard(
            self.identity.id_token(&config.audience),
            deadline,
            &mut shutdown,
            |reason| FederationError::TokenRetrievalFailed {
                audience: config.audience.clone(),
                reason: reason.to_string(),
            },
        )
        .await?;
        debug!("Obtained {:?}", id_token);

        info!("Assuming AWS role: {}", config.role_arn);
        let credentials = guard(
            self.exchanger
                .exchange(&config.role_arn, &config.session_name, &id_token),
            deadline,
            &mut shutdown,
            |reason| FederationError::ExchangeRejected {
                role_arn: config.role_arn.clone(),
                reason: reason.to_string(),
            },
        )
        .await?;
        drop(id_token);

        if let Some(expiration) = &credentials.expiration {
            info!(
                "Credentials expire at: {}",
                expiration
                    .fmt(Format::DateTime)
                    .unwrap_or_else(|_| "unknown".to_string())
            );
        }

        aws::write_credentials(&credentials, &config.output_path).await?;
        Ok(config.output_path.clone())
    }
}

async fn guard<T, F, S>(
    stage: F,
    deadline: Option<Instant>,
    shutdown: &mut Pin<&mut S>,
    aborted: impl FnOnce(&str) -> FederationError,
) -> Result<T, FederationError>
where
    F: Future<Output = Result<T, FederationError>>,
    S: Future<Output = ()>,
{
    let expiry = async {
        match deadline {
            Some(deadline) => time::sleep_until(deadline).await,
            None => future::pending::<()>().await,
        }
    };

    tokio::select! {
        result = stage => result,
        _ = expiry => Err(aborted("deadline exceeded")),
        _ = shutdown.as_mut() => Err(aborted("interrupted")),
    }
}
