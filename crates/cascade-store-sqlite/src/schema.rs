//! SQL schema for the Cascade SQLite store.
//!
//! Applied at connection startup and gated on `PRAGMA user_version`: a database
//! at [`SCHEMA_VERSION`] is left alone, an older one gets [`SCHEMA`] applied.

pub const SCHEMA_VERSION: i64 = 1;

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS parameter (
    path        TEXT NOT NULL CHECK (path <> ''),
    org_id      TEXT NOT NULL CHECK (org_id <> ''),
    value       TEXT NOT NULL DEFAULT '{}',   -- JSON document, stored opaquely
    created_at  TEXT NOT NULL,                -- RFC 3339 UTC; server-assigned
    updated_at  TEXT NOT NULL,                -- RFC 3339 UTC; refreshed on write
    PRIMARY KEY (path, org_id)
);

-- Every query is scoped to one organization.
CREATE INDEX IF NOT EXISTS parameter_org_path_idx ON parameter(org_id, path);

PRAGMA user_version = 1;
";
