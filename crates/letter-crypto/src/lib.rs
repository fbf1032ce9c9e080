//! Letter credential and session primitives.
//!
//! - `credential`: deterministic one-way password encoding (Argon2id with a
//!   server-wide salt), so a login can match on the stored secret.
//! - `token`: HS256 session tokens bound to an account id.

pub mod credential;
pub mod token;

pub use credential::{CredentialCodec, CredentialError};
pub use token::{TokenError, TokenKeys};
