//! Remote stack provider abstraction.
//!
//! Lifecycle tasks talk to the cloud only through the [`StackProvider`]
//! trait. Each call is atomic on the provider side; the orchestrator adds no
//! locking around it.

use crate::error::Result;
use crate::types::{CreateStackRequest, KeyMaterial, StackInfo};
use async_trait::async_trait;

pub mod aws_cli;

pub use aws_cli::AwsCliProvider;

/// Remote stack provider trait.
///
/// Implementations report failures of the call itself (throttling,
/// permissions, transport) as errors and do not retry internally unless that
/// is their own policy.
#[async_trait]
pub trait StackProvider: Send + Sync {
    /// Describe a stack by name.
    ///
    /// Returns `Ok(None)` when the stack does not exist.
    async fn describe(&self, name: &str) -> Result<Option<StackInfo>>;

    /// Start creating a stack. Returns once the request is accepted.
    async fn create(&self, request: &CreateStackRequest) -> Result<()>;

    /// Start deleting a stack. Returns once the request is accepted.
    async fn delete(&self, name: &str) -> Result<()>;

    /// Validate a template body.
    async fn validate_template(&self, body: &str) -> Result<()>;

    /// Create an SSH key pair.
    ///
    /// Returns `Ok(None)` when a key pair with that name already exists.
    async fn create_key_pair(&self, key_name: &str) -> Result<Option<KeyMaterial>>;

    /// Provider name (for logging).
    fn name(&self) -> &str;
}
