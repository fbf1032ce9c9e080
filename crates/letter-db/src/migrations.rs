use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 =
        conn.query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))?;

    if version < 1 {
        info!("Running migration v1 (accounts, friend edges, messages)");
        conn.execute_batch(
            "
            CREATE TABLE accounts (
                id      INTEGER PRIMARY KEY AUTOINCREMENT,
                name    TEXT NOT NULL UNIQUE,
                secret  TEXT NOT NULL,
                avatar  TEXT
            );

            CREATE TABLE friend_edges (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                owner_id    INTEGER NOT NULL REFERENCES accounts(id),
                friend_id   INTEGER NOT NULL REFERENCES accounts(id),
                UNIQUE(owner_id, friend_id)
            );

            CREATE TABLE messages (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                sender_id       INTEGER NOT NULL REFERENCES accounts(id),
                recipient_id    INTEGER NOT NULL REFERENCES accounts(id),
                body            TEXT NOT NULL,
                created_at      INTEGER NOT NULL
            );

            CREATE INDEX idx_messages_pair
                ON messages(sender_id, recipient_id, created_at);

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
