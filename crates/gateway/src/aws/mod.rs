//! AWS SDK client initialisation for Secrets Manager and S3.
//!
//! Secrets Manager holds the token encryption key; S3 holds the stored
//! envelope set. Both clients share one resolved SDK configuration.

pub mod clients;

pub use clients::AwsClients;
