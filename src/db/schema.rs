//! Database schema and migrations.
//!
//! Migrations are applied in order when the database is opened; the
//! `schema_version` table records which ones already ran.

/// Database migrations.
pub const MIGRATIONS: &[&str] = &[
    // v1: access records
    r#"
-- One row per stored blob, keyed by the blob's file key
CREATE TABLE file_access (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    file_key        TEXT NOT NULL UNIQUE,
    user_name       TEXT NOT NULL,
    password_hash   TEXT NOT NULL,           -- Argon2 hash
    created_at      TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX idx_file_access_user_name ON file_access(user_name);
"#,
];
