use std::fmt::Debug;
use std::sync::Arc;

use tracing::error;

use crate::error::{AccessError, Result};

pub const DEFAULT_BCRYPT_COST: u32 = 10;

/// One-way password hashing used for user creation, updates and login.
pub trait PasswordHasher: Send + Sync + Debug {
    fn hash(&self, password: &str) -> Result<String>;
    fn verify(&self, password: &str, hash: &str) -> Result<bool>;
}

/// Hasher shared between requests.
pub type SharedHasher = Arc<dyn PasswordHasher>;

/// Hashes on the tokio blocking pool.
pub async fn hash_password(hasher: &SharedHasher, password: String) -> Result<String> {
    let hasher = Arc::clone(hasher);
    tokio::task::spawn_blocking(move || hasher.hash(&password))
        .await
        .map_err(join_failed)?
}

pub async fn verify_password(hasher: &SharedHasher, password: String, hash: String) -> Result<bool> {
    let hasher = Arc::clone(hasher);
    tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
        .await
        .map_err(join_failed)?
}

fn join_failed(err: tokio::task::JoinError) -> AccessError {
    error!(?err, "Password hashing task failed");
    AccessError::Hashing(err.to_string())
}

#[derive(Debug, Clone, Copy)]
pub struct BcryptHasher {
    cost: u32,
}

impl BcryptHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }
}

impl Default for BcryptHasher {
    fn default() -> Self {
        Self::new(DEFAULT_BCRYPT_COST)
    }
}

impl PasswordHasher for BcryptHasher {
    fn hash(&self, password: &str) -> Result<String> {
        Ok(bcrypt::hash(password, self.cost)?)
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool> {
        Ok(bcrypt::verify(password, hash)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AccessError;

    #[test]
    fn hash_round_trips_and_hides_plaintext() {
        let hasher = BcryptHasher::new(4);
        let hash = hasher.hash("Passw0rdX").unwrap();

        assert_ne!(hash, "Passw0rdX");
        assert!(hasher.verify("Passw0rdX", &hash).unwrap());
        assert!(!hasher.verify("Passw0rdY", &hash).unwrap());
    }

    #[test]
    fn invalid_cost_is_a_hashing_error() {
        let hasher = BcryptHasher::new(2);
        assert!(matches!(hasher.hash("Passw0rdX"), Err(AccessError::Hashing(_))));
    }

    #[tokio::test]
    async fn hashing_runs_off_the_runtime_thread() {
        let hasher: SharedHasher = Arc::new(BcryptHasher::new(4));
        let hash = hash_password(&hasher, "Passw0rdX".to_string()).await.unwrap();

        assert!(verify_password(&hasher, "Passw0rdX".to_string(), hash.clone()).await.unwrap());
        assert!(!verify_password(&hasher, "Passw0rdY".to_string(), hash).await.unwrap());
    }

    #[tokio::test]
    async fn malformed_hash_is_a_hashing_error() {
        let hasher: SharedHasher = Arc::new(BcryptHasher::new(4));
        let result = verify_password(&hasher, "Passw0rdX".to_string(), "not-a-hash".to_string()).await;
        assert!(matches!(result, Err(AccessError::Hashing(_))));
    }

    #[test]
    fn default_cost() {
        assert_eq!(BcryptHasher::default().cost(), DEFAULT_BCRYPT_COST);
    }
}
