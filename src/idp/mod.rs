pub mod google;

use async_trait::async_trait;
use std::fmt;

use crate::error::FederationError;

pub use self::google::ApplicationDefault;

/// Opaque Google-signed identity token
#[derive(Clone, PartialEq, Eq)]
pub struct IdToken(String);

impl IdToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for IdToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IdToken({} bytes)", self.0.len())
    }
}

/// Source of audience-scoped identity tokens for the running workload
#[async_trait]
pub trait IdentityTokenSource: Send + Sync {
    async fn id_token(&self, audience: &str) -> Result<IdToken, FederationError>;
}
