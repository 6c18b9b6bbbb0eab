//! Core library shared across `tokengate` crates: the token envelope codec,
//! the encryption-key codec, the validation scan, and the token lifecycle
//! (generation, persistence, rotation).
//!
//! # Module invariants
//!
//! - **No AWS or HTTP dependencies.** Collaborators (the envelope store, the
//!   secret facility) are reached through traits; the binaries own the
//!   concrete clients.
//! - The encryption key is always passed explicitly into codec and validator
//!   calls. Nothing in this crate reads ambient state.

pub mod envelope;
pub mod error;
pub mod keyfmt;
pub mod lifecycle;
pub mod protocol;
pub mod validate;

pub use envelope::{Envelope, EnvelopeError};
pub use error::ServiceError;
pub use keyfmt::EncryptionKey;
pub use lifecycle::{RotationReport, RotationStatus, TokenPolicy, TokenStore};
