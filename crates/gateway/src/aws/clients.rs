//! AWS SDK client bundle.

use anyhow::Result;
use aws_config::BehaviorVersion;

/// Bundle of AWS SDK clients used by the gateway.
///
/// Both clients share the same underlying [`aws_config::SdkConfig`] so that
/// credentials are resolved once and reused.
#[derive(Clone)]
pub struct AwsClients {
    /// Secrets Manager client used to fetch the token encryption key.
    pub secretsmanager: aws_sdk_secretsmanager::Client,
    /// S3 client used to list the stored token envelopes.
    pub s3: aws_sdk_s3::Client,
}

impl AwsClients {
    /// Initialise all AWS SDK clients.
    ///
    /// Credentials and region are resolved via the standard AWS chain
    /// (environment, shared config, or the attached IAM role).
    ///
    /// # Errors
    ///
    /// Returns an error if the SDK config cannot be loaded.
    pub async fn init() -> Result<Self> {
        let config = aws_config::defaults(BehaviorVersion::latest()).load().await;

        let secretsmanager = aws_sdk_secretsmanager::Client::new(&config);
        let s3 = aws_sdk_s3::Client::new(&config);

        Ok(Self { secretsmanager, s3 })
    }
}
