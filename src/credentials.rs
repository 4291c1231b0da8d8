//! AWS configuration and credential preflight
//!
//! The demos check credentials up front so a missing key fails with a
//! readable message instead of a mid-stream service error.

use aws_config::meta::region::RegionProviderChain;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CredentialsError {
    #[error(
        "AWS credentials not found or invalid: {0}. \
         Set AWS_ACCESS_KEY_ID and AWS_SECRET_ACCESS_KEY (a .env file works)."
    )]
    NotUsable(String),
}

/// Identity returned by a successful credential check
#[derive(Debug, Clone)]
pub struct CallerIdentity {
    pub account: String,
    pub user_id: String,
    pub arn: String,
}

/// Load the shared AWS config for the given region
///
/// Falls back to the environment/profile chain, then `us-east-1`.
pub async fn load_aws_config(region: &str) -> SdkConfig {
    let region_provider = RegionProviderChain::first_try(Region::new(region.to_string()))
        .or_default_provider()
        .or_else(Region::new(crate::config::DEFAULT_REGION));

    aws_config::defaults(BehaviorVersion::latest())
        .region(region_provider)
        .load()
        .await
}

/// Verify credentials by asking STS who we are
pub async fn verify_credentials(config: &SdkConfig) -> Result<CallerIdentity, CredentialsError> {
    let client = aws_sdk_sts::Client::new(config);

    let response = client
        .get_caller_identity()
        .send()
        .await
        .map_err(|e| CredentialsError::NotUsable(e.to_string()))?;

    let identity = CallerIdentity {
        account: response.account().unwrap_or_default().to_string(),
        user_id: response.user_id().unwrap_or_default().to_string(),
        arn: response.arn().unwrap_or_default().to_string(),
    };

    tracing::info!("AWS credentials verified for account {}", identity.account);
    Ok(identity)
}
