use letter_crypto::{CredentialCodec, TokenKeys};
use letter_db::StoreError;
use letter_types::models::{Account, AccountId};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::CoreError;
use crate::store::Store;

pub const MAX_NAME_LEN: usize = 32;

/// Owns account records: registration, login, lookup, search and avatars.
pub struct AccountDirectory {
    store: Store,
    codec: CredentialCodec,
    tokens: TokenKeys,
}

impl AccountDirectory {
    pub(crate) fn new(store: Store, codec: CredentialCodec, tokens: TokenKeys) -> Self {
        Self { store, codec, tokens }
    }

    /// Creates an account. The name is claimed by the store's UNIQUE
    /// constraint, so of two concurrent registrations exactly one wins.
    pub async fn register(
        &self,
        name: &str,
        password: &str,
        cancel: &CancellationToken,
    ) -> Result<AccountId, CoreError> {
        validate_name(name)?;
        if password.is_empty() {
            return Err(CoreError::validation("password must not be empty"));
        }

        let codec = self.codec.clone();
        let owned_name = name.to_string();
        let password = password.to_string();
        let result = self
            .store
            .run("register", cancel, move |db| {
                let secret = encode(&codec, &password)?;
                db.create_account(&owned_name, &secret).map_err(|e| match e {
                    StoreError::Duplicate => CoreError::conflict("user already exists"),
                    other => other.into(),
                })
            })
            .await;

        match &result {
            Ok(id) => info!("Registered account {} as {}", id, name),
            Err(e) => warn!("Registration of {} rejected: {}", name, e),
        }
        result
    }

    /// Matches `(name, encoded password)` against the store and issues a
    /// session token for the account found.
    pub async fn login(
        &self,
        name: &str,
        password: &str,
        cancel: &CancellationToken,
    ) -> Result<String, CoreError> {
        let codec = self.codec.clone();
        let owned_name = name.to_string();
        let password = password.to_string();
        let account = self
            .store
            .run("login", cancel, move |db| {
                let secret = encode(&codec, &password)?;
                Ok(db.find_account_by_credentials(&owned_name, &secret)?)
            })
            .await?
            .ok_or_else(|| {
                warn!("Failed login for {}", name);
                CoreError::not_found("user does not exist")
            })?;

        let id = AccountId(account.id);
        let token = self
            .tokens
            .issue(id)
            .map_err(|e| CoreError::Internal(e.to_string()))?;

        info!("{} ({}) logged in", account.name, id);
        Ok(token)
    }

    pub async fn get_by_id(&self, id: AccountId, cancel: &CancellationToken) -> Result<Account, CoreError> {
        self.store
            .run("get_by_id", cancel, move |db| Ok(db.get_account(id)?))
            .await?
            .map(Account::from)
            .ok_or_else(|| CoreError::not_found("user does not exist"))
    }

    /// Accounts whose name contains `fragment` (SQL LIKE semantics).
    pub async fn search(&self, fragment: &str, cancel: &CancellationToken) -> Result<Vec<Account>, CoreError> {
        if fragment.is_empty() {
            return Err(CoreError::validation("invalid username"));
        }

        let owned = fragment.to_string();
        let rows = self
            .store
            .run("search", cancel, move |db| Ok(db.search_accounts(&owned)?))
            .await?;

        debug!("Search for '{}' matched {} accounts", fragment, rows.len());
        Ok(rows.into_iter().map(Account::from).collect())
    }

    pub async fn update_avatar(
        &self,
        id: AccountId,
        reference: &str,
        cancel: &CancellationToken,
    ) -> Result<Account, CoreError> {
        if reference.is_empty() {
            return Err(CoreError::validation("avatar reference must not be empty"));
        }

        let owned = reference.to_string();
        let account = self
            .store
            .run("update_avatar", cancel, move |db| Ok(db.set_avatar(id, &owned)?))
            .await?
            .map(Account::from)
            .ok_or_else(|| CoreError::not_found("user does not exist"))?;

        info!("Account {} avatar set to {}", id, reference);
        Ok(account)
    }
}

fn validate_name(name: &str) -> Result<(), CoreError> {
    if name.trim().is_empty() {
        return Err(CoreError::validation("invalid username"));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(CoreError::validation(format!(
            "username longer than {} characters",
            MAX_NAME_LEN
        )));
    }
    Ok(())
}

fn encode(codec: &CredentialCodec, password: &str) -> Result<String, CoreError> {
    codec
        .encode(password)
        .map_err(|e| CoreError::Internal(e.to_string()))
}
