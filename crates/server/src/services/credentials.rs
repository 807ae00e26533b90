//! Password hashing and bearer token issuance.
//!
//! Both primitives are configured once at startup and shared read-only
//! through [`AppState`](crate::state::AppState).

use std::sync::Arc;

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use nearu_core::AccountId;

use crate::config::PasswordParams;

/// Errors from the credential primitives.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// Signature, structure, or expiry check failed.
    #[error("invalid token")]
    InvalidToken,

    /// Hashing failed, or a stored hash could not be parsed.
    #[error("password hashing error")]
    PasswordHash,

    /// The token could not be signed.
    #[error("token issue failed: {0}")]
    TokenIssue(String),
}

/// Claims carried by a bearer token.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    /// Account id (owner or user).
    sub: String,
    iat: i64,
    exp: i64,
}

/// Signs and verifies HS256 bearer tokens.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenIssuer {
    /// Build an issuer from the signing secret and token lifetime.
    #[must_use]
    pub fn new(secret: &SecretString, ttl_days: u32) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
            ttl: Duration::days(i64::from(ttl_days)),
        }
    }

    /// Issue a token for `account`, valid for the configured lifetime.
    ///
    /// # Errors
    ///
    /// Returns `CredentialError::TokenIssue` if signing fails.
    pub fn issue(&self, account: AccountId) -> Result<String, CredentialError> {
        self.issue_at(account, Utc::now())
    }

    fn issue_at(&self, account: AccountId, now: DateTime<Utc>) -> Result<String, CredentialError> {
        let claims = Claims {
            sub: account.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| CredentialError::TokenIssue(e.to_string()))
    }

    /// Verify a token and return the account id it was issued for.
    ///
    /// # Errors
    ///
    /// Returns `CredentialError::InvalidToken` on a bad signature, a
    /// malformed token, or an expired one.
    pub fn verify(&self, token: &str) -> Result<AccountId, CredentialError> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::default())
            .map_err(|_| CredentialError::InvalidToken)?;
        data.claims
            .sub
            .parse()
            .map_err(|_| CredentialError::InvalidToken)
    }
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("keys", &"[REDACTED]")
            .field("ttl", &self.ttl)
            .finish()
    }
}

/// Password hashing plus token issuance.
#[derive(Debug, Clone)]
pub struct Credentials {
    argon2: Argon2<'static>,
    /// Hash with the configured cost, verified when no account matched.
    decoy_hash: Arc<str>,
    tokens: TokenIssuer,
}

impl Credentials {
    /// Build the credential primitives.
    ///
    /// # Errors
    ///
    /// Returns `CredentialError::PasswordHash` if the Argon2 cost parameters
    /// are out of range.
    pub fn new(params: PasswordParams, tokens: TokenIssuer) -> Result<Self, CredentialError> {
        let params = Params::new(params.memory_kib, params.iterations, 1, None)
            .map_err(|_| CredentialError::PasswordHash)?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
        let decoy_hash = argon2
            .hash_password(b"nearu-decoy", &SaltString::generate(&mut OsRng))
            .map_err(|_| CredentialError::PasswordHash)?
            .to_string();

        Ok(Self {
            argon2,
            decoy_hash: decoy_hash.into(),
            tokens,
        })
    }

    #[must_use]
    pub const fn tokens(&self) -> &TokenIssuer {
        &self.tokens
    }

    /// Hash a password using Argon2id on the blocking pool.
    ///
    /// # Errors
    ///
    /// Returns `CredentialError::PasswordHash` if hashing fails.
    pub async fn hash_password(&self, password: String) -> Result<String, CredentialError> {
        let argon2 = self.argon2.clone();
        tokio::task::spawn_blocking(move || {
            let salt = SaltString::generate(&mut OsRng);
            argon2
                .hash_password(password.as_bytes(), &salt)
                .map(|hash| hash.to_string())
                .map_err(|_| CredentialError::PasswordHash)
        })
        .await
        .map_err(|_| CredentialError::PasswordHash)?
    }

    /// Check a password against a stored hash on the blocking pool.
    ///
    /// # Errors
    ///
    /// Returns `CredentialError::PasswordHash` if the stored hash is unreadable.
    pub async fn verify_password(
        &self,
        password: String,
        hash: String,
    ) -> Result<bool, CredentialError> {
        let argon2 = self.argon2.clone();
        tokio::task::spawn_blocking(move || {
            let parsed = PasswordHash::new(&hash).map_err(|_| CredentialError::PasswordHash)?;
            Ok(argon2
                .verify_password(password.as_bytes(), &parsed)
                .is_ok())
        })
        .await
        .map_err(|_| CredentialError::PasswordHash)?
    }

    /// Check a login attempt against the account's hash, or against the
    /// decoy when no account matched so both paths cost the same.
    ///
    /// # Errors
    ///
    /// Returns `CredentialError::PasswordHash` if the stored hash is unreadable.
    pub async fn check_login(
        &self,
        password: String,
        stored_hash: Option<String>,
    ) -> Result<bool, CredentialError> {
        match stored_hash {
            Some(hash) => self.verify_password(password, hash).await,
            None => {
                self.verify_password(password, self.decoy_hash.to_string())
                    .await?;
                Ok(false)
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use uuid::Uuid;

    use super::*;

    const SECRET: &str = "aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6q";

    fn credentials() -> Credentials {
        let tokens = TokenIssuer::new(&SecretString::from(SECRET.to_owned()), 30);
        Credentials::new(
            PasswordParams {
                memory_kib: 64,
                iterations: 1,
            },
            tokens,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_hash_then_verify() {
        let creds = credentials();
        let hash = creds.hash_password("secret1".to_owned()).await.unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(
            creds
                .verify_password("secret1".to_owned(), hash.clone())
                .await
                .unwrap()
        );
        assert!(
            !creds
                .verify_password("secret2".to_owned(), hash)
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_hashes_are_salted() {
        let creds = credentials();
        let a = creds.hash_password("secret1".to_owned()).await.unwrap();
        let b = creds.hash_password("secret1".to_owned()).await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_verify_rejects_garbage_hash() {
        let creds = credentials();
        let result = creds
            .verify_password("secret1".to_owned(), "not-a-hash".to_owned())
            .await;
        assert!(matches!(result, Err(CredentialError::PasswordHash)));
    }

    #[tokio::test]
    async fn test_missing_account_never_matches() {
        let creds = credentials();
        assert!(
            !creds
                .check_login("nearu-decoy".to_owned(), None)
                .await
                .unwrap()
        );
        assert!(
            !creds
                .check_login("secret1".to_owned(), None)
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_decoy_uses_configured_cost() {
        let creds = credentials();
        let real = creds.hash_password("secret1".to_owned()).await.unwrap();

        let decoy = PasswordHash::new(&creds.decoy_hash).unwrap();
        let real = PasswordHash::new(&real).unwrap();
        assert_eq!(decoy.algorithm, real.algorithm);
        assert_eq!(decoy.params, real.params);
    }

    #[tokio::test]
    async fn test_check_login_with_account_hash() {
        let creds = credentials();
        let hash = creds.hash_password("secret1".to_owned()).await.unwrap();
        assert!(
            creds
                .check_login("secret1".to_owned(), Some(hash.clone()))
                .await
                .unwrap()
        );
        assert!(
            !creds
                .check_login("secret2".to_owned(), Some(hash))
                .await
                .unwrap()
        );
    }

    #[test]
    fn test_token_roundtrip() {
        let creds = credentials();
        let account = AccountId::from_uuid(Uuid::new_v4());
        let token = creds.tokens().issue(account).unwrap();
        assert_eq!(creds.tokens().verify(&token).unwrap(), account);
    }

    #[test]
    fn test_token_from_other_secret_is_rejected() {
        let creds = credentials();
        let other = TokenIssuer::new(
            &SecretString::from("Zq9!vL2#kP7$wM4&xR8*tN1^yB5@cF3h".to_owned()),
            30,
        );
        let token = other
            .issue(AccountId::from_uuid(Uuid::new_v4()))
            .unwrap();
        assert!(matches!(
            creds.tokens().verify(&token),
            Err(CredentialError::InvalidToken)
        ));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let creds = credentials();
        let issued = Utc::now() - Duration::days(31);
        let token = creds
            .tokens()
            .issue_at(AccountId::from_uuid(Uuid::new_v4()), issued)
            .unwrap();
        assert!(matches!(
            creds.tokens().verify(&token),
            Err(CredentialError::InvalidToken)
        ));
    }

    #[test]
    fn test_malformed_token_is_rejected() {
        let creds = credentials();
        assert!(creds.tokens().verify("abc.def.ghi").is_err());
        assert!(creds.tokens().verify("").is_err());
    }
}
