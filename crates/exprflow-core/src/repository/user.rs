//! User and API key repository trait definition.
//!
//! Authentication itself lives at the HTTP boundary; the core only needs a
//! way to mint credentials and to turn them back into a numeric user id.

use exprflow_types::error::RepositoryError;
use exprflow_types::expression::UserId;

/// A freshly created user and its plaintext API key (shown once).
#[derive(Debug, Clone)]
pub struct IssuedCredentials {
    pub user_id: UserId,
    pub api_key: String,
}

pub trait UserRepository: Send + Sync {
    /// Create a user and issue its first API key.
    fn create_user(
        &self,
        name: &str,
    ) -> impl std::future::Future<Output = Result<IssuedCredentials, RepositoryError>> + Send;

    /// Resolve a plaintext API key to its owner.
    fn authenticate(
        &self,
        api_key: &str,
    ) -> impl std::future::Future<Output = Result<Option<UserId>, RepositoryError>> + Send;
}
