use chrono::Utc;
use letter_db::StoreError;
use letter_types::models::{AccountId, Message};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::CoreError;
use crate::store::Store;

/// Append-only log of one-to-one messages.
pub struct MessageLedger {
    store: Store,
}

impl MessageLedger {
    pub(crate) fn new(store: Store) -> Self {
        Self { store }
    }

    /// Appends a message stamped with the server clock. Timestamps never
    /// run backwards across the ledger, even if the wall clock does.
    pub async fn append(
        &self,
        sender: AccountId,
        recipient: AccountId,
        body: &str,
        cancel: &CancellationToken,
    ) -> Result<Message, CoreError> {
        if body.trim().is_empty() {
            return Err(CoreError::validation("message body must not be empty"));
        }

        let owned = body.to_string();
        let now = Utc::now().timestamp();
        let result = self
            .store
            .run("append_message", cancel, move |db| {
                db.insert_message(sender, recipient, &owned, now).map_err(|e| match e {
                    StoreError::MissingReference => CoreError::not_found("user does not exist"),
                    other => CoreError::Store(other),
                })
            })
            .await
            .map(Message::from);

        match &result {
            Ok(message) => info!("Message {} appended {} -> {}", message.id, sender, recipient),
            Err(e) => warn!("Message {} -> {} rejected: {}", sender, recipient, e),
        }
        result
    }

    /// Every message exchanged between `viewer` and `other`, in either
    /// direction, oldest first.
    pub async fn list_conversation(
        &self,
        viewer: AccountId,
        other: AccountId,
        cancel: &CancellationToken,
    ) -> Result<Vec<Message>, CoreError> {
        let rows = self
            .store
            .run("list_conversation", cancel, move |db| Ok(db.list_conversation(viewer, other)?))
            .await?;

        debug!("Conversation {} <-> {}: {} messages", viewer, other, rows.len());
        Ok(rows.into_iter().map(Message::from).collect())
    }
}
