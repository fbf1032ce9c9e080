use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use thiserror::Error;
use tracing::debug;

use letter_types::api::Claims;
use letter_types::models::AccountId;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token signing failed: {0}")]
    Sign(#[from] jsonwebtoken::errors::Error),
}

/// Signing and verification keys for session tokens.
///
/// Built once from configuration at startup and shared read-only.
#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenKeys {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation: Validation::default(),
            ttl,
        }
    }

    pub fn issue(&self, account: AccountId) -> Result<String, TokenError> {
        let now = Utc::now();
        self.sign(account, now.timestamp(), (now + self.ttl).timestamp())
    }

    fn sign(&self, account: AccountId, iat: i64, exp: i64) -> Result<String, TokenError> {
        let claims = Claims {
            sub: account.0,
            iat: iat.max(0) as usize,
            exp: exp.max(0) as usize,
        };
        Ok(encode(&Header::default(), &claims, &self.encoding)?)
    }

    /// Resolves a token to the account it was issued for.
    ///
    /// Any failure (bad structure, bad signature, expired, non-positive
    /// subject) yields `None`; the reason is only logged at debug level.
    pub fn verify(&self, token: &str) -> Option<AccountId> {
        match decode::<Claims>(token, &self.decoding, &self.validation) {
            Ok(data) => Some(AccountId(data.claims.sub)).filter(|id| id.is_valid()),
            Err(e) => {
                debug!("Rejected session token: {}", e);
                None
            }
        }
    }
}
