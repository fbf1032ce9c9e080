use crate::models::{AccountRow, MessageRow};
use crate::{Database, StoreError};
use letter_types::models::AccountId;
use rusqlite::{Connection, params};

type Result<T> = std::result::Result<T, StoreError>;

impl Database {
    // -- Accounts --

    /// Inserts a new account. A taken name surfaces as [`StoreError::Duplicate`]
    /// straight from the UNIQUE constraint.
    pub fn create_account(&self, name: &str, secret: &str) -> Result<AccountId> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO accounts (name, secret) VALUES (?1, ?2)",
                (name, secret),
            )?;
            Ok(AccountId(conn.last_insert_rowid()))
        })
    }

    pub fn find_account_by_credentials(&self, name: &str, secret: &str) -> Result<Option<AccountRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT id, name, avatar FROM accounts WHERE name = ?1 AND secret = ?2",
                (name, secret),
                map_account,
            )
            .optional()
        })
    }

    pub fn get_account(&self, id: AccountId) -> Result<Option<AccountRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT id, name, avatar FROM accounts WHERE id = ?1",
                [id.0],
                map_account,
            )
            .optional()
        })
    }

    /// Substring match on names. `%` and `_` in `fragment` match literally.
    pub fn search_accounts(&self, fragment: &str) -> Result<Vec<AccountRow>> {
        let pattern = format!("%{}%", escape_like(fragment));
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, avatar FROM accounts WHERE name LIKE ?1 ESCAPE '\\' ORDER BY id",
            )?;
            let rows = stmt
                .query_map([&pattern], map_account)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Returns the updated row, or `None` if no account has this id.
    pub fn set_avatar(&self, id: AccountId, avatar: &str) -> Result<Option<AccountRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                "UPDATE accounts SET avatar = ?2 WHERE id = ?1 RETURNING id, name, avatar",
                params![id.0, avatar],
                map_account,
            )
            .optional()
        })
    }

    // -- Friend edges --

    pub fn insert_friend_edge(&self, owner: AccountId, friend: AccountId) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO friend_edges (owner_id, friend_id) VALUES (?1, ?2)",
                [owner.0, friend.0],
            )?;
            Ok(())
        })
    }

    /// Returns the number of edges removed (0 or 1).
    pub fn delete_friend_edge(&self, owner: AccountId, friend: AccountId) -> Result<usize> {
        self.with_conn(|conn| {
            let removed = conn.execute(
                "DELETE FROM friend_edges WHERE owner_id = ?1 AND friend_id = ?2",
                [owner.0, friend.0],
            )?;
            Ok(removed)
        })
    }

    pub fn list_friends(&self, owner: AccountId) -> Result<Vec<AccountRow>> {
        self.with_conn(|conn| query_friends(conn, owner))
    }

    // -- Messages --

    /// Appends a message stamped with `now` (unix seconds), clamped so it is
    /// never earlier than the newest stored message.
    pub fn insert_message(
        &self,
        sender: AccountId,
        recipient: AccountId,
        body: &str,
        now: i64,
    ) -> Result<MessageRow> {
        self.with_conn(|conn| {
            conn.query_row(
                "INSERT INTO messages (sender_id, recipient_id, body, created_at)
                 VALUES (?1, ?2, ?3, MAX(?4, COALESCE((SELECT MAX(created_at) FROM messages), 0)))
                 RETURNING id, sender_id, recipient_id, body, created_at",
                params![sender.0, recipient.0, body, now],
                map_message,
            )
            .map_err(StoreError::from)
        })
    }

    pub fn list_conversation(&self, a: AccountId, b: AccountId) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| query_conversation(conn, a, b))
    }
}

fn query_friends(conn: &Connection, owner: AccountId) -> Result<Vec<AccountRow>> {
    let mut stmt = conn.prepare(
        "SELECT a.id, a.name, a.avatar
         FROM friend_edges f
         JOIN accounts a ON f.friend_id = a.id
         WHERE f.owner_id = ?1
         ORDER BY f.id",
    )?;

    let rows = stmt
        .query_map([owner.0], map_account)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

fn query_conversation(conn: &Connection, a: AccountId, b: AccountId) -> Result<Vec<MessageRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, sender_id, recipient_id, body, created_at
         FROM messages
         WHERE (sender_id = ?1 AND recipient_id = ?2)
            OR (sender_id = ?2 AND recipient_id = ?1)
         ORDER BY created_at ASC, id ASC",
    )?;

    let rows = stmt
        .query_map([a.0, b.0], map_message)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

fn map_account(row: &rusqlite::Row<'_>) -> rusqlite::Result<AccountRow> {
    Ok(AccountRow {
        id: row.get(0)?,
        name: row.get(1)?,
        avatar: row.get(2)?,
    })
}

fn map_message(row: &rusqlite::Row<'_>) -> rusqlite::Result<MessageRow> {
    Ok(MessageRow {
        id: row.get(0)?,
        sender_id: row.get(1)?,
        recipient_id: row.get(2)?,
        body: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn escape_like(fragment: &str) -> String {
    let mut escaped = String::with_capacity(fragment.len());
    for c in fragment.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn db_with(names: &[&str]) -> (Database, Vec<AccountId>) {
        let db = Database::open_in_memory().unwrap();
        let ids = names
            .iter()
            .map(|name| db.create_account(name, "secret").unwrap())
            .collect();
        (db, ids)
    }

    #[test]
    fn duplicate_name_is_classified() {
        let (db, _) = db_with(&["anna"]);
        let err = db.create_account("anna", "other").unwrap_err();
        assert!(matches!(err, StoreError::Duplicate));
    }

    #[test]
    fn credentials_must_match_both_columns() {
        let (db, ids) = db_with(&["anna"]);
        let found = db.find_account_by_credentials("anna", "secret").unwrap().unwrap();
        assert_eq!(found.id, ids[0].0);
        assert!(db.find_account_by_credentials("anna", "nope").unwrap().is_none());
        assert!(db.find_account_by_credentials("bob", "secret").unwrap().is_none());
    }

    #[test]
    fn like_wildcards_are_literal() {
        let (db, _) = db_with(&["100%", "1000", "a_b", "axb"]);
        let names = |rows: Vec<AccountRow>| rows.into_iter().map(|r| r.name).collect::<Vec<_>>();

        assert_eq!(names(db.search_accounts("0%").unwrap()), vec!["100%"]);
        assert_eq!(names(db.search_accounts("_").unwrap()), vec!["a_b"]);
    }

    #[test]
    fn avatar_update_on_missing_account_returns_none() {
        let (db, ids) = db_with(&["anna"]);
        let row = db.set_avatar(ids[0], "a.png").unwrap().unwrap();
        assert_eq!(row.avatar.as_deref(), Some("a.png"));
        assert!(db.set_avatar(AccountId(999), "a.png").unwrap().is_none());
    }

    #[test]
    fn edge_constraints_are_classified() {
        let (db, ids) = db_with(&["anna", "bob"]);
        db.insert_friend_edge(ids[0], ids[1]).unwrap();

        let dup = db.insert_friend_edge(ids[0], ids[1]).unwrap_err();
        assert!(matches!(dup, StoreError::Duplicate));

        let missing = db.insert_friend_edge(ids[0], AccountId(999)).unwrap_err();
        assert!(matches!(missing, StoreError::MissingReference));
    }

    #[test]
    fn friends_come_back_in_edge_order() {
        let (db, ids) = db_with(&["anna", "bob", "cleo", "dan"]);
        db.insert_friend_edge(ids[0], ids[3]).unwrap();
        db.insert_friend_edge(ids[0], ids[1]).unwrap();
        db.insert_friend_edge(ids[0], ids[2]).unwrap();
        db.delete_friend_edge(ids[0], ids[1]).unwrap();

        let friends: Vec<_> = db.list_friends(ids[0]).unwrap().into_iter().map(|r| r.name).collect();
        assert_eq!(friends, vec!["dan", "cleo"]);
    }

    #[test]
    fn message_clock_never_goes_backwards() {
        let (db, ids) = db_with(&["anna", "bob"]);
        let first = db.insert_message(ids[0], ids[1], "hi", 1_700_000_100).unwrap();
        let second = db.insert_message(ids[1], ids[0], "yo", 1_700_000_050).unwrap();

        assert_eq!(first.created_at, 1_700_000_100);
        assert_eq!(second.created_at, 1_700_000_100);

        let convo = db.list_conversation(ids[1], ids[0]).unwrap();
        assert_eq!(
            convo.iter().map(|m| m.body.as_str()).collect::<Vec<_>>(),
            vec!["hi", "yo"]
        );
    }

    #[test]
    fn conversation_excludes_third_parties() {
        let (db, ids) = db_with(&["anna", "bob", "cleo"]);
        db.insert_message(ids[0], ids[1], "to bob", 10).unwrap();
        db.insert_message(ids[0], ids[2], "to cleo", 11).unwrap();
        db.insert_message(ids[2], ids[1], "cleo to bob", 12).unwrap();

        let convo = db.list_conversation(ids[0], ids[1]).unwrap();
        assert_eq!(convo.len(), 1);
        assert_eq!(convo[0].body, "to bob");
    }
}
