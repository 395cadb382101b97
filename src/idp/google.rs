use async_trait::async_trait;
use google_cloud_auth::credentials::idtoken::Builder;
use tracing::info;

use super::{IdToken, IdentityTokenSource};
use crate::error::FederationError;

/// Google application default credentials
///
/// Covers every ADC source the auth library understands: a key file named by
/// `GOOGLE_APPLICATION_CREDENTIALS` (service account, impersonated service
/// account, external account), the gcloud well-known file, and the metadata
/// server on Compute Engine, GKE, Cloud Run and Dataflow workers.
#[derive(Debug, Clone, Default)]
pub struct ApplicationDefault;

impl ApplicationDefault {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl IdentityTokenSource for ApplicationDefault {
    async fn id_token(&self, audience: &str) -> Result<IdToken, FederationError> {
        info!("Requesting Google ID token from application default credentials");

        // Built per call: tokens are never reused across runs.
        let credentials =
            Builder::new(audience)
                .build()
                .map_err(|e| FederationError::IdentityUnavailable {
                    audience: audience.to_string(),
                    reason: e.to_string(),
                })?;

        let token =
            credentials
                .id_token()
                .await
                .map_err(|e| FederationError::TokenRetrievalFailed {
                    audience: audience.to_string(),
                    reason: e.to_string(),
                })?;

        info!("Obtained Google ID token");
        Ok(IdToken::new(token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use serial_test::serial;
    use std::{env, path::Path};
    use tempfile::tempdir;

    const ADC_ENV: &str = "GOOGLE_APPLICATION_CREDENTIALS";

    async fn id_token_with_adc_file(path: &Path) -> Result<IdToken, FederationError> {
        let original = env::var(ADC_ENV).ok();

        unsafe {
            env::set_var(ADC_ENV, path);
        }
        let result = ApplicationDefault::new().id_token("gcp").await;

        unsafe {
            match original {
                Some(val) => env::set_var(ADC_ENV, val),
                None => env::remove_var(ADC_ENV),
            }
        }
        result
    }

    #[tokio::test]
    #[serial]
    async fn test_missing_adc_file_is_identity_unavailable() {
        let dir = tempdir().unwrap();

        let err = id_token_with_adc_file(&dir.path().join("missing.json"))
            .await
            .unwrap_err();

        match err {
            FederationError::IdentityUnavailable { audience, .. } => assert_eq!(audience, "gcp"),
            other => panic!("Expected IdentityUnavailable, got {other:?}"),
        }
    }

    #[tokio::test]
    #[serial]
    async fn test_malformed_adc_file_is_identity_unavailable() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("adc.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = id_token_with_adc_file(&path).await.unwrap_err();
        assert!(matches!(err, FederationError::IdentityUnavailable { .. }));
    }

    #[tokio::test]
    #[serial]
    async fn test_impersonated_service_account_file_is_accepted() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("adc.json");
        let adc = json!({
            "type": "impersonated_service_account",
            "service_account_impersonation_url": "https://iamcredentials.googleapis.com/v1/projects/-/serviceAccounts/federation@example-project.iam.gserviceaccount.com:generateAccessToken",
            "source_credentials": {
                "type": "authorized_user",
                "client_id": "client-id.apps.googleusercontent.com",
                "client_secret": "client-secret",
                "refresh_token": "refresh-token"
            },
            "delegates": []
        });
        std::fs::write(&path, adc.to_string()).unwrap();

        // The refresh token is fake, so the request itself fails, but only after
        // the credentials were understood.
        let err = id_token_with_adc_file(&path).await.unwrap_err();
        assert!(matches!(err, FederationError::TokenRetrievalFailed { .. }));
    }
}
