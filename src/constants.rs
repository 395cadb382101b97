/// Default audience requested for the Google identity token
pub const DEFAULT_AUDIENCE: &str = "gcp";

/// Default role session name passed to AWS STS
pub const DEFAULT_SESSION_NAME: &str = "dataflow";

/// Default AWS region for STS operations when no region is configured
pub const DEFAULT_AWS_REGION: &str = "us-east-1";

/// Profile section written to the credentials file
pub const CREDENTIALS_PROFILE: &str = "default";

/// AWS limits for RoleSessionName
pub const MIN_SESSION_NAME_LEN: usize = 2;
pub const MAX_SESSION_NAME_LEN: usize = 64;
