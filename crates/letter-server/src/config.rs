use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use letter_crypto::credential::MIN_SALT_LEN;

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &[
    "change-me-to-a-random-string",
    "dev-secret-change-me",
];

pub const DEFAULT_CREDENTIAL_SALT: &str = "letter-default-credential-salt";

pub struct Config {
    pub jwt_secret: String,
    /// Server-wide salt for password encoding. Changing it invalidates every
    /// stored secret.
    pub credential_salt: String,
    pub db_path: PathBuf,
    pub host: String,
    pub port: u16,
    pub token_ttl: chrono::Duration,
    pub upload_dir: PathBuf,
    pub request_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let jwt_secret = get("LETTER_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("LETTER_JWT_SECRET is unset or still a placeholder");
        }

        let credential_salt =
            get("LETTER_CREDENTIAL_SALT").unwrap_or_else(|| DEFAULT_CREDENTIAL_SALT.into());
        if credential_salt.len() < MIN_SALT_LEN {
            bail!("LETTER_CREDENTIAL_SALT must be at least {} bytes", MIN_SALT_LEN);
        }

        let port: u16 = get("LETTER_PORT")
            .unwrap_or_else(|| "3000".into())
            .parse()
            .context("LETTER_PORT is not a valid port")?;
        let token_ttl_hours: i64 = get("LETTER_TOKEN_TTL_HOURS")
            .unwrap_or_else(|| "720".into())
            .parse()
            .context("LETTER_TOKEN_TTL_HOURS is not a number")?;
        if token_ttl_hours <= 0 {
            bail!("LETTER_TOKEN_TTL_HOURS must be positive");
        }
        let request_timeout_secs: u64 = get("LETTER_REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|| "30".into())
            .parse()
            .context("LETTER_REQUEST_TIMEOUT_SECS is not a number")?;

        Ok(Self {
            jwt_secret,
            credential_salt,
            db_path: get("LETTER_DB_PATH").unwrap_or_else(|| "letter.db".into()).into(),
            host: get("LETTER_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            token_ttl: chrono::Duration::hours(token_ttl_hours),
            upload_dir: get("LETTER_UPLOAD_DIR").unwrap_or_else(|| "./uploads".into()).into(),
            request_timeout: Duration::from_secs(request_timeout_secs),
        })
    }

    pub fn uses_default_salt(&self) -> bool {
        self.credential_salt == DEFAULT_CREDENTIAL_SALT
    }
}
