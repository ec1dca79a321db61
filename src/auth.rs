//! Credential hashing and session tokens.
//!
//! This is deliberately a thin wrapper around `bcrypt` and `jsonwebtoken`:
//! the API layer only ever talks to [`Identity`] and does not care how
//! passwords are hashed or tokens are signed.

use std::time::Duration;

use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

use crate::{model::{Key, User}, prelude::*};


#[derive(Debug, confique::Config)]
pub(crate) struct AuthConfig {
    /// Secret used to sign session tokens (HMAC-SHA256). Anyone knowing this
    /// value can forge tokens for arbitrary users, so keep it private!
    pub(crate) token_secret: secrecy::SecretString,

    /// How long a session token stays valid after it was issued.
    #[config(default = "1d", deserialize_with = crate::config::deserialize_duration)]
    pub(crate) token_expiration: Duration,

    /// Bcrypt cost factor used when hashing passwords. Higher is slower and
    /// more resistant to brute forcing.
    #[config(default = 10)]
    pub(crate) hash_cost: u32,
}

/// The claims encoded into a session token.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct TokenClaims {
    pub(crate) sub: Key,
    pub(crate) username: String,
    pub(crate) exp: i64,
}

/// Hashes/verifies credentials and issues/validates session tokens. Created
/// once at startup and shared across all requests.
pub(crate) struct Identity {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_expiration: Duration,
    hash_cost: u32,
    dummy_hash: String,
}

impl Identity {
    pub(crate) fn new(config: &AuthConfig) -> Result<Self> {
        let secret = config.token_secret.expose_secret().as_bytes();

        // Hash of the empty string, used by `login` to always perform a
        // comparison even if no user was found for the given email. See
        // `User::login`.
        let dummy_hash = bcrypt::hash("", config.hash_cost)
            .context("failed to compute dummy password hash")?;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            token_expiration: config.token_expiration,
            hash_cost: config.hash_cost,
            dummy_hash,
        })
    }

    /// A syntactically valid bcrypt hash that no real password is ever
    /// stored as.
    pub(crate) fn dummy_hash(&self) -> &str {
        &self.dummy_hash
    }

    /// Hashes the given password. Bcrypt is CPU heavy by design, so this is
    /// offloaded to the blocking thread pool.
    pub(crate) async fn hash(&self, password: String) -> Result<String> {
        let cost = self.hash_cost;
        Ok(tokio::task::spawn_blocking(move || bcrypt::hash(password, cost)).await??)
    }

    /// Checks the given password against a stored hash.
    pub(crate) async fn verify(&self, password: String, hash: String) -> Result<bool> {
        Ok(tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash)).await??)
    }

    /// Creates a new session token for the given user.
    pub(crate) fn issue_token(&self, user: &User) -> Result<String> {
        let exp = chrono::Utc::now() + chrono::Duration::from_std(self.token_expiration)?;
        let claims = TokenClaims {
            sub: user.key,
            username: user.username.clone(),
            exp: exp.timestamp(),
        };

        jsonwebtoken::encode(&Header::default(), &claims, &self.encoding_key)
            .context("failed to sign session token")
    }

    /// Validates a session token (signature and expiry) and returns its
    /// claims.
    pub(crate) fn verify_token(&self, token: &str) -> Result<TokenClaims> {
        let data = jsonwebtoken::decode::<TokenClaims>(
            token,
            &self.decoding_key,
            &Validation::default(),
        ).context("invalid session token")?;

        Ok(data.claims)
    }
}


/// An identity service with fast settings for unit tests.
#[cfg(test)]
pub(crate) fn test_identity() -> Identity {
    Identity::new(&AuthConfig {
        token_secret: String::from("not-actually-a-secret").into(),
        token_expiration: Duration::from_secs(3600),
        // The minimum cost: tests don't need brute-force resistance.
        hash_cost: 4,
    }).expect("failed to create identity service")
}


#[cfg(test)]
mod tests {
    use super::*;

    fn test_user() -> User {
        User {
            key: Key(17),
            username: "alice".into(),
            email: "alice@example.org".into(),
            password_hash: String::new(),
        }
    }

    #[tokio::test]
    async fn hash_and_verify() {
        let identity = test_identity();
        let hash = identity.hash("hunter2".into()).await.unwrap();
        assert!(identity.verify("hunter2".into(), hash.clone()).await.unwrap());
        assert!(!identity.verify("hunter3".into(), hash).await.unwrap());
    }

    #[test]
    fn token_round_trip() {
        let identity = test_identity();
        let token = identity.issue_token(&test_user()).unwrap();
        assert!(!token.is_empty());

        let claims = identity.verify_token(&token).unwrap();
        assert_eq!(claims.sub, Key(17));
        assert_eq!(claims.username, "alice");
    }

    #[test]
    fn garbage_token_fails() {
        let identity = test_identity();
        assert!(identity.verify_token("not-a-token").is_err());
        assert!(identity.verify_token("").is_err());
    }
}
