//! Registration, login and bearer-token validation.

use std::sync::Arc;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tracing::error;

use super::ServiceError;
use crate::models::{MAX_LOGIN_LEN, User};
use crate::store::{Ledger, StoreError};

const TOKEN_TTL_HOURS: i64 = 24;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    /// User id as a string.
    sub: String,
    exp: usize,
    iat: usize,
}

pub struct AuthService {
    ledger: Arc<dyn Ledger>,
    jwt_secret: String,
}

impl AuthService {
    pub fn new(ledger: Arc<dyn Ledger>, jwt_secret: &str) -> Self {
        Self {
            ledger,
            jwt_secret: jwt_secret.to_owned(),
        }
    }

    /// Creates the user with a hashed credential and returns a fresh token.
    pub async fn register(&self, login: &str, password: &str) -> Result<String, ServiceError> {
        let (login, password) = trimmed(login, password);
        validate_credentials(login, password)?;

        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|err| {
                error!(error = %err, "failed to hash password");
                ServiceError::Unexpected
            })?
            .to_string();

        let user = match self.ledger.create_user(login, &hash).await {
            Ok(user) => user,
            Err(StoreError::DuplicateKey) => return Err(ServiceError::UserAlreadyExists),
            Err(err) => {
                error!(error = %err, "failed to create user");
                return Err(ServiceError::Unexpected);
            }
        };

        self.generate_token(&user)
    }

    /// Verifies the credential pair and returns a fresh token.
    pub async fn login(&self, login: &str, password: &str) -> Result<String, ServiceError> {
        let (login, password) = trimmed(login, password);

        let user = match self.ledger.find_user_by_login(login).await {
            Ok(user) => user,
            Err(StoreError::NotFound) => {
                return Err(ServiceError::InvalidCredentials("unknown login".into()));
            }
            Err(err) => {
                error!(error = %err, "failed to find user");
                return Err(ServiceError::Unexpected);
            }
        };

        let parsed = PasswordHash::new(&user.hash).map_err(|err| {
            error!(error = %err, user = user.id, "stored credential hash is unreadable");
            ServiceError::Unexpected
        })?;
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .map_err(|_| ServiceError::InvalidCredentials("wrong password".into()))?;

        self.generate_token(&user)
    }

    /// Resolves a bearer token to its user. A token whose subject no longer
    /// exists is treated as invalid, not as a server fault.
    pub async fn authenticate(&self, token: &str) -> Result<User, ServiceError> {
        let decoded = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )
        .map_err(|err| match err.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => ServiceError::TokenExpired,
            _ => ServiceError::InvalidToken,
        })?;

        let user_id: i64 = decoded
            .claims
            .sub
            .parse()
            .map_err(|_| ServiceError::InvalidToken)?;

        match self.ledger.get_user(user_id).await {
            Ok(user) => Ok(user),
            Err(StoreError::NotFound) => Err(ServiceError::InvalidToken),
            Err(err) => {
                error!(error = %err, "failed to load token subject");
                Err(ServiceError::InvalidToken)
            }
        }
    }

    fn generate_token(&self, user: &User) -> Result<String, ServiceError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id.to_string(),
            exp: (now + Duration::hours(TOKEN_TTL_HOURS)).timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|err| {
            error!(error = %err, "failed to sign token");
            ServiceError::Unexpected
        })
    }
}

fn trimmed<'a>(login: &'a str, password: &'a str) -> (&'a str, &'a str) {
    (login.trim(), password.trim())
}

fn validate_credentials(login: &str, password: &str) -> Result<(), ServiceError> {
    if login.is_empty() {
        return Err(ServiceError::InvalidCredentials("login is empty".into()));
    }
    if password.is_empty() {
        return Err(ServiceError::InvalidCredentials("password is empty".into()));
    }
    if login.len() > MAX_LOGIN_LEN {
        return Err(ServiceError::InvalidCredentials(format!(
            "login too long, max {MAX_LOGIN_LEN} characters"
        )));
    }
    Ok(())
}
