use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use std::{path::PathBuf, time::Duration};
use tokio::signal;
use tracing::{info, warn};

use crate::{
    aws::StsExchanger,
    config::FederationConfig,
    constants::{DEFAULT_AUDIENCE, DEFAULT_SESSION_NAME},
    federation::Federation,
    idp::ApplicationDefault,
};

#[derive(Debug, Clone, Parser)]
#[command(
    name = "gcp-aws-creds",
    version,
    about = "Exchange a Google identity token for temporary AWS credentials",
    long_about = None
)]
pub struct Cli {
    #[arg(
        long = "role-arn",
        visible_alias = "roleArn",
        value_name = "ARN",
        help = "ARN of AWS role to assume"
    )]
    pub role_arn: String,

    #[arg(
        long = "output-path",
        visible_alias = "outputPath",
        value_name = "PATH",
        help = "Path to output AWS credentials"
    )]
    pub output_path: PathBuf,

    #[arg(long, default_value = DEFAULT_AUDIENCE, help = "Audience of the Google ID token")]
    pub audience: String,

    #[arg(long, default_value = DEFAULT_SESSION_NAME, help = "AWS role session name")]
    pub session_name: String,

    #[arg(long, help = "AWS region for STS (defaults to the AWS region provider chain)")]
    pub region: Option<String>,

    #[arg(long, value_name = "URL", help = "Override the AWS STS endpoint")]
    pub sts_endpoint: Option<String>,

    #[arg(long, help = "Requested lifetime of the AWS credentials in seconds")]
    pub duration_seconds: Option<i32>,

    #[arg(long, value_name = "SECONDS", help = "Abort if the exchange takes longer than this")]
    pub timeout: Option<u64>,

    #[arg(short = 'v', long, action = ArgAction::Count, help = "Increase verbosity (-v debug, -vv trace)")]
    pub verbose: u8,
}

impl Cli {
    pub fn to_config(&self) -> FederationConfig {
        FederationConfig {
            role_arn: self.role_arn.clone(),
            session_name: self.session_name.clone(),
            audience: self.audience.clone(),
            output_path: self.output_path.clone(),
            region: self.region.clone(),
            sts_endpoint: self.sts_endpoint.clone(),
            duration_seconds: self.duration_seconds,
            timeout: self.timeout.map(Duration::from_secs),
        }
    }

    pub async fn execute(self) -> Result<()> {
        let config = self.to_config();

        let identity = ApplicationDefault::new();
        let exchanger = StsExchanger::connect(&config)
            .await
            .context("credential exchange stage failed")?;

        let federation = Federation::new(identity, exchanger, config);
        let path = federation.run(interrupted()).await.map_err(|e| {
            let stage = e.stage();
            anyhow::Error::new(e).context(format!("{stage} stage failed"))
        })?;

        info!("successfully wrote AWS credentials to: {}", path.display());
        Ok(())
    }
}

async fn interrupted() {
    if let Err(e) = signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}
