//! Row types, mapped directly from SQLite rows.

use chrono::{DateTime, Utc};
use letter_types::models::{Account, AccountId, Message};
use tracing::warn;

pub struct AccountRow {
    pub id: i64,
    pub name: String,
    pub avatar: Option<String>,
}

impl From<AccountRow> for Account {
    fn from(row: AccountRow) -> Self {
        Account {
            id: AccountId(row.id),
            name: row.name,
            avatar: row.avatar,
        }
    }
}

pub struct MessageRow {
    pub id: i64,
    pub sender_id: i64,
    pub recipient_id: i64,
    pub body: String,
    /// Unix seconds.
    pub created_at: i64,
}

impl From<MessageRow> for Message {
    fn from(row: MessageRow) -> Self {
        let created_at = DateTime::<Utc>::from_timestamp(row.created_at, 0).unwrap_or_else(|| {
            warn!("Corrupt created_at '{}' on message '{}'", row.created_at, row.id);
            DateTime::default()
        });

        Message {
            id: row.id,
            sender_id: AccountId(row.sender_id),
            recipient_id: AccountId(row.recipient_id),
            body: row.body,
            created_at,
        }
    }
}
