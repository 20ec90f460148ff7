//! Admin credentials: password digests and access tokens.
//!
//! Passwords are stored as Argon2id PHC strings. Access tokens are HMAC-signed
//! JWTs carrying the admin email and organization name.

use std::fmt;

use argon2::password_hash::SaltString;
use argon2::{Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version};
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::config::AppConfig;

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("password hashing failed: {0}")]
    Hash(String),
    #[error("stored password digest is malformed: {0}")]
    MalformedDigest(String),
    #[error("token signing failed: {0}")]
    Signing(String),
    #[error("token rejected: {0}")]
    InvalidToken(String),
    #[error("unsupported token algorithm '{0}'")]
    UnsupportedAlgorithm(String),
}

/// Claims embedded in admin access tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminClaims {
    /// Admin email
    pub sub: String,
    /// Organization name
    pub org: String,
    pub iat: i64,
    pub exp: i64,
}

/// Hashing and token operations the registry needs.
///
/// Implementations are CPU-bound and synchronous; callers on the async
/// runtime move them onto a blocking thread.
pub trait CredentialService: Send + Sync {
    /// Produce an opaque digest of `password`.
    fn hash(&self, password: &str) -> Result<String, CredentialError>;

    /// Check `password` against a digest produced by [`Self::hash`].
    fn verify(&self, password: &str, digest: &str) -> Result<bool, CredentialError>;

    /// Issue a signed token for the admin of `org`.
    fn issue_token(&self, subject: &str, org: &str) -> Result<String, CredentialError>;
}

#[derive(Clone, Zeroize, ZeroizeOnDrop)]
struct SigningSecret(Vec<u8>);

impl fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningSecret([REDACTED])")
    }
}

/// Argon2id digests plus HMAC-signed JWTs.
#[derive(Clone)]
pub struct Argon2JwtCredentials {
    argon2: Argon2<'static>,
    secret: SigningSecret,
    algorithm: Algorithm,
    token_lifetime_secs: i64,
}

impl fmt::Debug for Argon2JwtCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Argon2JwtCredentials")
            .field("secret", &self.secret)
            .field("algorithm", &self.algorithm)
            .field("token_lifetime_secs", &self.token_lifetime_secs)
            .finish()
    }
}

impl Argon2JwtCredentials {
    pub fn new(
        secret: impl Into<Vec<u8>>,
        algorithm: &str,
        token_lifetime_minutes: u64,
    ) -> Result<Self, CredentialError> {
        let algorithm = match algorithm.to_ascii_uppercase().as_str() {
            "HS256" => Algorithm::HS256,
            "HS384" => Algorithm::HS384,
            "HS512" => Algorithm::HS512,
            other => return Err(CredentialError::UnsupportedAlgorithm(other.to_string())),
        };

        Ok(Self {
            argon2: Argon2::default(),
            secret: SigningSecret(secret.into()),
            algorithm,
            token_lifetime_secs: i64::try_from(token_lifetime_minutes.saturating_mul(60))
                .unwrap_or(i64::MAX),
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, CredentialError> {
        Self::new(
            config.jwt_secret.as_bytes(),
            &config.jwt_algorithm,
            config.access_token_expire_minutes,
        )
    }

    /// Override the Argon2id cost parameters (memory in KiB, iterations, lanes).
    pub fn with_argon2_params(
        mut self,
        m_cost: u32,
        t_cost: u32,
        p_cost: u32,
    ) -> Result<Self, CredentialError> {
        let params = Params::new(m_cost, t_cost, p_cost, None)
            .map_err(|e| CredentialError::Hash(format!("invalid argon2 params: {e}")))?;
        self.argon2 = Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, params);
        Ok(self)
    }

    /// Decode and verify a token issued by this service.
    pub fn decode_token(&self, token: &str) -> Result<AdminClaims, CredentialError> {
        let mut validation = Validation::new(self.algorithm);
        validation.set_required_spec_claims(&["sub", "exp", "iat"]);

        jsonwebtoken::decode::<AdminClaims>(
            token,
            &DecodingKey::from_secret(&self.secret.0),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|e| CredentialError::InvalidToken(e.to_string()))
    }
}

impl CredentialService for Argon2JwtCredentials {
    fn hash(&self, password: &str) -> Result<String, CredentialError> {
        let salt = SaltString::encode_b64(Uuid::new_v4().as_bytes())
            .map_err(|e| CredentialError::Hash(e.to_string()))?;

        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|digest| digest.to_string())
            .map_err(|e| CredentialError::Hash(e.to_string()))
    }

    fn verify(&self, password: &str, digest: &str) -> Result<bool, CredentialError> {
        let parsed = PasswordHash::new(digest)
            .map_err(|e| CredentialError::MalformedDigest(e.to_string()))?;

        match self.argon2.verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(CredentialError::MalformedDigest(e.to_string())),
        }
    }

    fn issue_token(&self, subject: &str, org: &str) -> Result<String, CredentialError> {
        let now = Utc::now().timestamp();
        let claims = AdminClaims {
            sub: subject.to_string(),
            org: org.to_string(),
            iat: now,
            exp: now.saturating_add(self.token_lifetime_secs),
        };

        jsonwebtoken::encode(
            &Header::new(self.algorithm),
            &claims,
            &EncodingKey::from_secret(&self.secret.0),
        )
        .map_err(|e| CredentialError::Signing(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> Argon2JwtCredentials {
        Argon2JwtCredentials::new("unit-test-secret", "HS256", 30)
            .unwrap()
            .with_argon2_params(1024, 1, 1)
            .unwrap()
    }

    #[test]
    fn digest_is_opaque_and_verifies() {
        let creds = credentials();
        let digest = creds.hash("SecurePass123").unwrap();

        assert!(digest.starts_with("$argon2id$"));
        assert!(!digest.contains("SecurePass123"));
        assert!(creds.verify("SecurePass123", &digest).unwrap());
        assert!(!creds.verify("WrongPass", &digest).unwrap());
    }

    #[test]
    fn same_password_gets_distinct_salts() {
        let creds = credentials();
        assert_ne!(creds.hash("pw").unwrap(), creds.hash("pw").unwrap());
    }

    #[test]
    fn malformed_digest_is_an_error() {
        let result = credentials().verify("pw", "not-a-digest");
        assert!(matches!(result, Err(CredentialError::MalformedDigest(_))));
    }

    #[test]
    fn token_round_trips_claims() {
        let creds = credentials();
        let token = creds.issue_token("admin@techcorp.com", "TechCorp").unwrap();

        let claims = creds.decode_token(&token).unwrap();
        assert_eq!(claims.sub, "admin@techcorp.com");
        assert_eq!(claims.org, "TechCorp");
        assert_eq!(claims.exp - claims.iat, 30 * 60);
    }

    #[test]
    fn token_from_other_secret_is_rejected() {
        let other = Argon2JwtCredentials::new("another-secret", "HS256", 30).unwrap();
        let token = other.issue_token("admin@techcorp.com", "TechCorp").unwrap();

        assert!(matches!(
            credentials().decode_token(&token),
            Err(CredentialError::InvalidToken(_))
        ));
    }

    #[test]
    fn rejects_asymmetric_algorithms() {
        let result = Argon2JwtCredentials::new("secret", "RS256", 30);
        assert!(matches!(result, Err(CredentialError::UnsupportedAlgorithm(alg)) if alg == "RS256"));
    }

    #[test]
    fn debug_output_hides_secret() {
        let rendered = format!("{:?}", credentials());
        assert!(!rendered.contains("unit-test-secret"));
        assert!(rendered.contains("REDACTED"));
    }
}
