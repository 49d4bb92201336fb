use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use jwt::{SignWithKey, VerifyWithKey};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::{
    error::CoreError,
    schema::{Id, User},
};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JwtSessionData {
    pub user_id: Id,
    pub username: String,
    iat: i64,
    exp: i64,
}

impl JwtSessionData {
    pub fn new(id: Id, username: String, ttl: Duration) -> Self {
        let now = Utc::now();
        let iat = now.timestamp();
        let exp = (now + ttl).timestamp();

        Self {
            user_id: id,
            username,
            iat,
            exp,
        }
    }
}

/// The verified caller identity handed to the core operations.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct SessionData {
    pub user_id: Id,
    pub username: String,
}

impl From<JwtSessionData> for SessionData {
    fn from(value: JwtSessionData) -> Self {
        SessionData {
            user_id: value.user_id,
            username: value.username,
        }
    }
}

fn signing_key(secret: &str) -> Result<Hmac<Sha256>, CoreError> {
    Hmac::new_from_slice(secret.as_bytes())
        .map_err(|_| CoreError::InvalidSession(String::from("Unusable signing key")))
}

pub fn issue_session(user: &User, secret: &str, ttl: Duration) -> Result<String, CoreError> {
    let key = signing_key(secret)?;
    let claims = JwtSessionData::new(user.id, user.username.to_owned(), ttl);

    claims
        .sign_with_key(&key)
        .map_err(|e| CoreError::InvalidSession(format!("Failed to sign token; {e}")))
}

pub fn verify_session(token: &str, secret: &str) -> Result<SessionData, CoreError> {
    let key = signing_key(secret)?;

    let session: JwtSessionData = token
        .verify_with_key(&key)
        .map_err(|_| CoreError::InvalidSession(String::from("Invalid token")))?;

    if session.exp <= Utc::now().timestamp() {
        return Err(CoreError::InvalidSession(String::from("Token expired")));
    }

    Ok(session.into())
}
