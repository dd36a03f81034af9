//! Database schema and migrations for PinPin.
//!
//! Migrations are applied in order; the schema_version table tracks which
//! ones have already run.

/// Database migrations.
pub const MIGRATIONS: &[&str] = &[
    // v1: Users
    r#"
CREATE TABLE users (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    username      TEXT NOT NULL UNIQUE COLLATE NOCASE,
    password      TEXT NOT NULL,                     -- Argon2 hash
    display_name  TEXT NOT NULL,
    email         TEXT,
    role          TEXT NOT NULL DEFAULT 'user',      -- 'user', 'admin', 'founder'
    theme         TEXT NOT NULL DEFAULT 'dark',      -- 'dark', 'light'
    created_at    TEXT NOT NULL DEFAULT (datetime('now')),
    last_login    TEXT,
    is_active     INTEGER NOT NULL DEFAULT 1
);

CREATE INDEX idx_users_role ON users(role);
"#,
    // v2: Application config documents (maintenance mode lives here)
    r#"
CREATE TABLE app_config (
    key         TEXT PRIMARY KEY,
    value       TEXT NOT NULL,                       -- JSON document
    updated_at  TEXT NOT NULL DEFAULT (datetime('now'))
);
"#,
    // v3: Storage plans
    r#"
CREATE TABLE user_plans (
    user_id        INTEGER PRIMARY KEY REFERENCES users(id) ON DELETE CASCADE,
    plan_type      TEXT NOT NULL DEFAULT 'free',     -- 'free', 'premium'
    storage_limit  INTEGER NOT NULL,
    storage_used   INTEGER NOT NULL DEFAULT 0,
    validated_at   TEXT
);
"#,
    // v4: Premium activation keys
    r#"
CREATE TABLE activation_keys (
    key         TEXT PRIMARY KEY,
    used        INTEGER NOT NULL DEFAULT 0,
    used_by     INTEGER REFERENCES users(id) ON DELETE SET NULL,
    used_at     TEXT,
    created_by  INTEGER REFERENCES users(id) ON DELETE SET NULL,
    created_at  TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX idx_activation_keys_used ON activation_keys(used);
"#,
    // v5: File records
    r#"
CREATE TABLE files (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    owner_id      INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    name          TEXT NOT NULL,
    size          INTEGER NOT NULL,
    mime_type     TEXT NOT NULL,
    storage_path  TEXT NOT NULL UNIQUE,
    shared        INTEGER NOT NULL DEFAULT 0,
    share_token   TEXT UNIQUE,
    uploaded_at   TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX idx_files_owner_id ON files(owner_id);
"#,
];
