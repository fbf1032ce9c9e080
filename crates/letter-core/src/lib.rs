//! Identity and relationship core: accounts, friendship edges and the
//! message ledger, all backed by one store.
//!
//! Every operation takes a [`CancellationToken`](tokio_util::sync::CancellationToken)
//! and returns a typed [`CoreError`] on failure.

pub mod directory;
pub mod error;
pub mod graph;
pub mod ledger;
mod store;

use std::sync::Arc;

use letter_crypto::{CredentialCodec, TokenKeys};
use letter_db::Database;
use letter_types::models::AccountId;

pub use directory::AccountDirectory;
pub use error::CoreError;
pub use graph::RelationshipGraph;
pub use ledger::MessageLedger;

use crate::store::Store;

pub struct Core {
    directory: AccountDirectory,
    graph: RelationshipGraph,
    ledger: MessageLedger,
    tokens: TokenKeys,
}

impl Core {
    pub fn new(db: Database, codec: CredentialCodec, tokens: TokenKeys) -> Self {
        let store = Store::new(Arc::new(db));
        Self {
            directory: AccountDirectory::new(store.clone(), codec, tokens.clone()),
            graph: RelationshipGraph::new(store.clone()),
            ledger: MessageLedger::new(store),
            tokens,
        }
    }

    pub fn directory(&self) -> &AccountDirectory {
        &self.directory
    }

    pub fn graph(&self) -> &RelationshipGraph {
        &self.graph
    }

    pub fn ledger(&self) -> &MessageLedger {
        &self.ledger
    }

    /// `None` means "no identity": the token is absent, malformed, expired
    /// or not ours.
    pub fn verify_token(&self, token: &str) -> Option<AccountId> {
        self.tokens.verify(token)
    }
}

/// Turns a resolved identity into a caller id, or `Unauthorized`.
pub fn require_identity(identity: Option<AccountId>) -> Result<AccountId, CoreError> {
    identity.ok_or(CoreError::Unauthorized)
}
