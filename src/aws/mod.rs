use aws_smithy_types::DateTime;

pub mod credentials;
pub mod sts;

/// AWS temporary credentials structure
#[derive(Debug, Clone, PartialEq)]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
    /// Assigned by STS; informational only
    pub expiration: Option<DateTime>,
}

pub use credentials::{render_credentials, write_credentials};
pub use sts::{CredentialExchange, StsExchanger};
