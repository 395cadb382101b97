use std::{fmt, io, path::PathBuf};

use thiserror::Error;

/// Pipeline stage an error originated from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Identity,
    Exchange,
    Materialize,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Identity => "identity token",
            Self::Exchange => "credential exchange",
            Self::Materialize => "credential materialization",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum FederationError {
    #[error("no ambient Google identity available for audience '{audience}': {reason}")]
    IdentityUnavailable { audience: String, reason: String },

    #[error("failed to retrieve Google ID token for audience '{audience}': {reason}")]
    TokenRetrievalFailed { audience: String, reason: String },

    #[error("invalid AWS STS client configuration: {0}")]
    ConfigurationError(String),

    #[error("failed to assume AWS role {role_arn}: {reason}")]
    ExchangeRejected { role_arn: String, reason: String },

    #[error("failed to create directory {}", .path.display())]
    DirectoryCreationFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write AWS credentials to {}", .path.display())]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl FederationError {
    pub fn stage(&self) -> Stage {
        match self {
            Self::IdentityUnavailable { .. } | Self::TokenRetrievalFailed { .. } => Stage::Identity,
            Self::ConfigurationError(_) | Self::ExchangeRejected { .. } => Stage::Exchange,
            Self::DirectoryCreationFailed { .. } | Self::WriteFailed { .. } => Stage::Materialize,
        }
    }
}
