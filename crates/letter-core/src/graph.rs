use letter_db::StoreError;
use letter_types::models::{Account, AccountId};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::CoreError;
use crate::store::Store;

/// Directed friendship edges. Adding A→B says nothing about B→A.
pub struct RelationshipGraph {
    store: Store,
}

impl RelationshipGraph {
    pub(crate) fn new(store: Store) -> Self {
        Self { store }
    }

    /// Inserts the edge `owner → friend`. The unique-pair violation is
    /// reported as `Conflict` so callers can say "already friends".
    pub async fn add_friend(
        &self,
        owner: AccountId,
        friend: AccountId,
        cancel: &CancellationToken,
    ) -> Result<(), CoreError> {
        let result = self
            .store
            .run("add_friend", cancel, move |db| {
                db.insert_friend_edge(owner, friend).map_err(|e| match e {
                    StoreError::Duplicate => CoreError::conflict("already friends"),
                    StoreError::MissingReference => CoreError::not_found("user does not exist"),
                    other => CoreError::Store(other),
                })
            })
            .await;

        match &result {
            Ok(()) => info!("{} added friend {}", owner, friend),
            Err(e) => warn!("{} could not add friend {}: {}", owner, friend, e),
        }
        result
    }

    /// Removes exactly the edge `owner → friend`; absent edges are not an error.
    pub async fn delete_friend(
        &self,
        owner: AccountId,
        friend: AccountId,
        cancel: &CancellationToken,
    ) -> Result<(), CoreError> {
        let removed = self
            .store
            .run("delete_friend", cancel, move |db| Ok(db.delete_friend_edge(owner, friend)?))
            .await?;

        if removed > 0 {
            info!("{} removed friend {}", owner, friend);
        } else {
            debug!("{} had no edge to {}", owner, friend);
        }
        Ok(())
    }

    /// Friends of `owner`, in the order the edges were added.
    pub async fn list_friends(&self, owner: AccountId, cancel: &CancellationToken) -> Result<Vec<Account>, CoreError> {
        let rows = self
            .store
            .run("list_friends", cancel, move |db| Ok(db.list_friends(owner)?))
            .await?;
        Ok(rows.into_iter().map(Account::from).collect())
    }
}
