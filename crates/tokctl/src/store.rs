//! S3 envelope store and Secrets Manager key persistence.
//!
//! The serialised envelope is the S3 object key (under a configurable
//! prefix); the object body is an opaque presence marker that is never read
//! back. The encryption key lives in Secrets Manager as its formatted hex
//! string under a well-known identifier.

use anyhow::{Context, Result};
use aws_config::BehaviorVersion;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_secretsmanager::error::SdkError;
use aws_sdk_secretsmanager::operation::create_secret::CreateSecretError;

use common::lifecycle::{StoreError, TokenStore};
use common::EncryptionKey;

/// Opaque body written for every envelope object.
const PRESENCE_MARKER: &[u8] = b"1";

/// Initialise the AWS SDK clients the CLI needs, sharing one resolved config.
pub async fn aws_clients() -> (aws_sdk_s3::Client, aws_sdk_secretsmanager::Client) {
    let config = aws_config::defaults(BehaviorVersion::latest()).load().await;
    (
        aws_sdk_s3::Client::new(&config),
        aws_sdk_secretsmanager::Client::new(&config),
    )
}

/// [`TokenStore`] implementation over an S3 bucket.
pub struct S3TokenStore {
    client: aws_sdk_s3::Client,
    bucket: String,
    prefix: String,
}

impl S3TokenStore {
    pub fn new(client: aws_sdk_s3::Client, bucket: String, prefix: String) -> Self {
        Self {
            client,
            bucket,
            prefix,
        }
    }
}

impl TokenStore for S3TokenStore {
    async fn put(&self, name: &str) -> Result<(), StoreError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(object_key(&self.prefix, name))
            .body(ByteStream::from_static(PRESENCE_MARKER))
            .send()
            .await
            .map_err(|e| StoreError::Write(e.to_string()))?;
        Ok(())
    }

    async fn list(&self) -> Result<Vec<String>, StoreError> {
        let mut names = Vec::new();
        let mut pages = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .prefix(&self.prefix)
            .into_paginator()
            .send();

        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| StoreError::List(e.to_string()))?;
            for obj in page.contents() {
                if let Some(key) = obj.key() {
                    names.push(envelope_name(&self.prefix, key));
                }
            }
        }
        Ok(names)
    }
}

fn object_key(prefix: &str, name: &str) -> String {
    format!("{prefix}{name}")
}

fn envelope_name(prefix: &str, key: &str) -> String {
    key.strip_prefix(prefix).unwrap_or(key).to_owned()
}

/// Read the encryption key from Secrets Manager and parse it.
pub async fn fetch_key(
    client: &aws_sdk_secretsmanager::Client,
    secret_id: &str,
) -> Result<EncryptionKey> {
    let secret = client
        .get_secret_value()
        .secret_id(secret_id)
        .send()
        .await
        .context("failed to fetch encryption key from Secrets Manager")?;

    let raw = secret
        .secret_string()
        .context("encryption key secret must be stored as a string")?;

    EncryptionKey::parse(raw).context("encryption key secret is not a valid 64-hex-character key")
}

/// Persist the key string under `secret_id`, creating the secret on first use
/// and updating it thereafter.
pub async fn store_key(
    client: &aws_sdk_secretsmanager::Client,
    secret_id: &str,
    key: &EncryptionKey,
) -> Result<()> {
    let formatted = key.format();
    match client
        .create_secret()
        .name(secret_id)
        .secret_string(&formatted)
        .send()
        .await
    {
        Ok(_) => Ok(()),
        Err(err) if secret_already_exists(&err) => {
            client
                .put_secret_value()
                .secret_id(secret_id)
                .secret_string(&formatted)
                .send()
                .await
                .context("failed to update existing encryption key secret")?;
            Ok(())
        }
        Err(err) => Err(err).context("failed to create encryption key secret"),
    }
}

fn secret_already_exists(err: &SdkError<CreateSecretError>) -> bool {
    err.as_service_error()
        .map(CreateSecretError::is_resource_exists_exception)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_key_appends_name_to_prefix() {
        assert_eq!(object_key("tokens/", "00aabb"), "tokens/00aabb");
        assert_eq!(object_key("", "00aabb"), "00aabb");
    }

    #[test]
    fn envelope_name_strips_prefix() {
        assert_eq!(envelope_name("tokens/", "tokens/00aabb"), "00aabb");
        assert_eq!(envelope_name("tokens/", "other/00aabb"), "other/00aabb");
    }

    #[test]
    fn object_key_and_envelope_name_round_trip() {
        let name = "00aabbccdd";
        assert_eq!(envelope_name("tokens/", &object_key("tokens/", name)), name);
    }
}
