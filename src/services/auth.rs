//! Authentication: password hashing and signed bearer tokens
//!
//! Tokens are HS256 JWTs carrying the user id as subject, valid for 24
//! hours. Passwords are stored as bcrypt hashes; a failed login never
//! reveals whether the email or the password was wrong.

use anyhow::{Context, Result, anyhow, bail};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::{CreateUser, UserRecord, UsersRepository};

const TOKEN_LIFETIME_HOURS: i64 = 24;
const BCRYPT_COST: u32 = bcrypt::DEFAULT_COST;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    iat: i64,
    exp: i64,
}

/// Issues and verifies bearer tokens for a fixed signing secret
#[derive(Clone)]
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl TokenCodec {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Issue a token identifying `user_id`
    pub fn issue(&self, user_id: Uuid) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::hours(TOKEN_LIFETIME_HOURS)).timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding).context("Failed to sign token")
    }

    /// Verify a token and extract the user id it identifies.
    ///
    /// Fails on bad signature, expiry, or a malformed subject.
    pub fn verify(&self, token: &str) -> Result<Uuid> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::default())
            .map_err(|e| anyhow!("Invalid token: {e}"))?;
        Uuid::parse_str(&data.claims.sub).map_err(|_| anyhow!("Invalid token subject"))
    }
}

/// A successful signup or login: the user plus a fresh token
pub struct AuthPayload {
    pub token: String,
    pub user: UserRecord,
}

/// Signup and login flows over the users repository
pub struct AuthService {
    users: UsersRepository,
    codec: TokenCodec,
}

impl AuthService {
    pub fn new(users: UsersRepository, codec: TokenCodec) -> Self {
        Self { users, codec }
    }

    /// Register a new account and issue a token for it
    pub async fn signup(&self, email: &str, name: &str, password: &str) -> Result<AuthPayload> {
        if password.len() < 8 {
            bail!("Password must be at least 8 characters");
        }
        if self.users.find_by_email(email).await?.is_some() {
            bail!("Email already in use");
        }

        let hash = bcrypt::hash(password, BCRYPT_COST)?;
        let user = self
            .users
            .create(CreateUser {
                email: email.to_string(),
                name: name.to_string(),
                password: hash,
            })
            .await?;

        tracing::info!(user_id = %user.id, "user signed up");
        let token = self.codec.issue(user.id)?;
        Ok(AuthPayload { token, user })
    }

    /// Authenticate an existing account and issue a token.
    ///
    /// Unknown email and wrong password fail with the same message.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthPayload> {
        let user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or_else(|| anyhow!("Invalid credentials"))?;

        if !bcrypt::verify(password, &user.password)? {
            bail!("Invalid credentials");
        }

        tracing::info!(user_id = %user.id, "user logged in");
        let token = self.codec.issue(user.id)?;
        Ok(AuthPayload { token, user })
    }
}
