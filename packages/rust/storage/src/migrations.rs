//! SQL migration definitions for the lexcore database.
//!
//! Migrations are applied in order on database open. Each migration has a
//! version number and a set of SQL statements executed as one batch.

/// A database migration with a version and SQL statements.
pub(crate) struct Migration {
    pub version: u32,
    pub description: &'static str,
    pub sql: &'static str,
}

/// All migrations, in ascending version order.
pub(crate) fn all_migrations() -> Vec<Migration> {
    vec![
        Migration {
            version: 1,
            description: "Initial schema: core_units, meta",
            sql: r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_migrations (
    version    INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- One row per lexical core unit; list columns hold JSON arrays
CREATE TABLE IF NOT EXISTS core_units (
    id             TEXT PRIMARY KEY,
    stem           TEXT NOT NULL,
    concept        TEXT NOT NULL,
    pos            TEXT NOT NULL,
    main_pos       TEXT NOT NULL,
    definition_set TEXT NOT NULL,
    related        TEXT NOT NULL,
    source         TEXT NOT NULL,
    last_updated   TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_core_units_stem ON core_units(stem);
CREATE INDEX IF NOT EXISTS idx_core_units_concept ON core_units(concept);

-- Run bookkeeping
CREATE TABLE IF NOT EXISTS meta (
    key   TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

INSERT INTO schema_migrations (version) VALUES (1);
"#,
        },
        Migration {
            version: 2,
            description: "Mining tables: code_units, examples, definition_cache",
            sql: r#"
-- Vocabulary terms mined from code
CREATE TABLE IF NOT EXISTS code_units (
    id          TEXT PRIMARY KEY,
    term        TEXT NOT NULL,
    concept     TEXT NOT NULL,
    definition  TEXT NOT NULL,
    example_ids TEXT NOT NULL,
    language    TEXT NOT NULL,
    source      TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_code_units_term ON code_units(term);

-- Mined example metadata
CREATE TABLE IF NOT EXISTS examples (
    id            TEXT PRIMARY KEY,
    kind          TEXT NOT NULL,
    metadata_json TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_examples_kind ON examples(kind);

-- Definition provider cache
CREATE TABLE IF NOT EXISTS definition_cache (
    term        TEXT NOT NULL,
    model_id    TEXT NOT NULL,
    prompt_hash TEXT NOT NULL,
    definition  TEXT NOT NULL,
    created_at  TEXT NOT NULL,
    PRIMARY KEY (term, model_id, prompt_hash)
);

INSERT INTO schema_migrations (version) VALUES (2);
"#,
        },
    ]
}
