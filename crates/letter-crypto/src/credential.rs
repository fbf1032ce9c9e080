use argon2::{Algorithm, Argon2, Version};
use thiserror::Error;

pub use argon2::Params;

/// Argon2 rejects shorter salts.
pub const MIN_SALT_LEN: usize = 8;

const OUTPUT_LEN: usize = 32;

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("credential salt must be at least {} bytes", MIN_SALT_LEN)]
    SaltTooShort,

    #[error("argon2 failure: {0}")]
    Hash(argon2::Error),
}

/// Deterministic password encoder.
///
/// The same password always encodes to the same secret, which is what lets
/// login look accounts up by `(name, secret)`. The salt is shared by every
/// account, so identical passwords produce identical secrets.
#[derive(Clone)]
pub struct CredentialCodec {
    salt: Vec<u8>,
    params: Params,
}

impl CredentialCodec {
    pub fn new(salt: &[u8]) -> Result<Self, CredentialError> {
        Self::with_params(salt, Params::default())
    }

    pub fn with_params(salt: &[u8], params: Params) -> Result<Self, CredentialError> {
        if salt.len() < MIN_SALT_LEN {
            return Err(CredentialError::SaltTooShort);
        }
        Ok(Self {
            salt: salt.to_vec(),
            params,
        })
    }

    /// Hex-encoded Argon2id digest of `plaintext`.
    pub fn encode(&self, plaintext: &str) -> Result<String, CredentialError> {
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone());
        let mut out = [0u8; OUTPUT_LEN];
        argon2
            .hash_password_into(plaintext.as_bytes(), &self.salt, &mut out)
            .map_err(CredentialError::Hash)?;
        Ok(hex::encode(out))
    }
}
