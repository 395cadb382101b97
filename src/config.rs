use crate::constants::{
    DEFAULT_AUDIENCE, DEFAULT_SESSION_NAME, MAX_SESSION_NAME_LEN, MIN_SESSION_NAME_LEN,
};
use crate::error::FederationError;
use std::{path::PathBuf, time::Duration};
use url::Url;

/// STS accepts DurationSeconds between 15 minutes and 12 hours
const MIN_DURATION_SECONDS: i32 = 900;
const MAX_DURATION_SECONDS: i32 = 43_200;

/// Settings for a single federation run
#[derive(Debug, Clone)]
pub struct FederationConfig {
    pub role_arn: String,
    pub session_name: String,
    pub audience: String,
    pub output_path: PathBuf,
    /// Falls back to the AWS region provider chain when unset
    pub region: Option<String>,
    pub sts_endpoint: Option<String>,
    pub duration_seconds: Option<i32>,
    /// Overall deadline for the network stages
    pub timeout: Option<Duration>,
}

impl FederationConfig {
    pub fn new(role_arn: impl Into<String>, output_path: impl Into<PathBuf>) -> Self {
        Self {
            role_arn: role_arn.into(),
            session_name: DEFAULT_SESSION_NAME.to_string(),
            audience: DEFAULT_AUDIENCE.to_string(),
            output_path: output_path.into(),
            region: None,
            sts_endpoint: None,
            duration_seconds: None,
            timeout: None,
        }
    }

    /// Reject settings the STS client could never be built from.
    pub fn validate(&self) -> Result<(), FederationError> {
        if self.role_arn.trim().is_empty() {
            return Err(FederationError::ConfigurationError(
                "role ARN must not be empty".to_string(),
            ));
        }

        if !is_valid_session_name(&self.session_name) {
            return Err(FederationError::ConfigurationError(format!(
                "session name '{}' must be {MIN_SESSION_NAME_LEN}-{MAX_SESSION_NAME_LEN} characters of [A-Za-z0-9+=,.@_-]",
                self.session_name
            )));
        }

        if let Some(region) = &self.region {
            if region.trim().is_empty() {
                return Err(FederationError::ConfigurationError(
                    "region must not be empty".to_string(),
                ));
            }
        }

        if let Some(endpoint) = &self.sts_endpoint {
            parse_endpoint(endpoint)?;
        }

        if let Some(duration) = self.duration_seconds {
            if !(MIN_DURATION_SECONDS..=MAX_DURATION_SECONDS).contains(&duration) {
                return Err(FederationError::ConfigurationError(format!(
                    "duration {duration}s is outside {MIN_DURATION_SECONDS}..={MAX_DURATION_SECONDS}"
                )));
            }
        }

        Ok(())
    }
}

pub(crate) fn parse_endpoint(endpoint: &str) -> Result<Url, FederationError> {
    let url = Url::parse(endpoint).map_err(|e| {
        FederationError::ConfigurationError(format!("invalid STS endpoint '{endpoint}': {e}"))
    })?;

    match url.scheme() {
        "http" | "https" if url.has_host() => Ok(url),
        _ => Err(FederationError::ConfigurationError(format!(
            "STS endpoint '{endpoint}' must be an http(s) URL"
        ))),
    }
}

fn is_valid_session_name(name: &str) -> bool {
    (MIN_SESSION_NAME_LEN..=MAX_SESSION_NAME_LEN).contains(&name.len())
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "+=,.@_-".contains(c))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROLE_ARN: &str = "arn:aws:iam::123456789012:role/example";

    #[test]
    fn test_new_uses_defaults() {
        let config = FederationConfig::new(ROLE_ARN, "/tmp/out/credentials");

        assert_eq!(config.session_name, "dataflow");
        assert_eq!(config.audience, "gcp");
        assert_eq!(config.output_path, PathBuf::from("/tmp/out/credentials"));
        assert!(config.region.is_none());
        assert!(config.timeout.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_valid_session_names() {
        assert!(is_valid_session_name("dataflow"));
        assert!(is_valid_session_name("flow.task@1700000000"));
        assert!(is_valid_session_name("a_b-c+d=e,f"));
        assert!(is_valid_session_name(&"x".repeat(64)));
    }

    #[test]
    fn test_invalid_session_names() {
        assert!(!is_valid_session_name(""));
        assert!(!is_valid_session_name("x"));
        assert!(!is_valid_session_name(&"x".repeat(65)));
        assert!(!is_valid_session_name("has space"));
        assert!(!is_valid_session_name("slash/name"));
    }

    #[test]
    fn test_empty_role_arn_is_configuration_error() {
        let config = FederationConfig::new("  ", "/tmp/creds");
        assert!(matches!(
            config.validate(),
            Err(FederationError::ConfigurationError(_))
        ));
    }

    #[test]
    fn test_invalid_endpoint_is_configuration_error() {
        let mut config = FederationConfig::new(ROLE_ARN, "/tmp/creds");

        config.sts_endpoint = Some("not a url".to_string());
        assert!(matches!(
            config.validate(),
            Err(FederationError::ConfigurationError(_))
        ));

        config.sts_endpoint = Some("ftp://sts.example.com".to_string());
        assert!(matches!(
            config.validate(),
            Err(FederationError::ConfigurationError(_))
        ));

        config.sts_endpoint = Some("https://sts.us-west-2.amazonaws.com".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_duration_bounds() {
        let mut config = FederationConfig::new(ROLE_ARN, "/tmp/creds");

        config.duration_seconds = Some(899);
        assert!(config.validate().is_err());

        config.duration_seconds = Some(43_201);
        assert!(config.validate().is_err());

        config.duration_seconds = Some(3600);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_blank_region_rejected() {
        let mut config = FederationConfig::new(ROLE_ARN, "/tmp/creds");
        config.region = Some(String::new());
        assert!(config.validate().is_err());
    }
}
