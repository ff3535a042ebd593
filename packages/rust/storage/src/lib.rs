//! libSQL storage layer (local file mode).
//!
//! The [`Storage`] struct wraps a libSQL database holding core units, run
//! metadata, mined code units and examples, and the definition cache.
//!
//! **Access rules:**
//! - pipeline runs: read-write (sole writer) via [`Storage::open`]
//! - lookups: read-only via [`Storage::open_readonly`]

mod migrations;

use std::path::Path;

use chrono::Utc;
use lexcore_shared::{CodeUnit, CoreUnit, LexCoreError, Result};
use libsql::{Connection, Database, params};

/// Primary storage handle wrapping a libSQL database.
pub struct Storage {
    #[allow(dead_code)]
    db: Database,
    conn: Connection,
    readonly: bool,
}

impl Storage {
    /// Open or create a database at `path` in read-write mode.
    pub async fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| LexCoreError::io(parent, e))?;
            }
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| LexCoreError::Storage(e.to_string()))?;

        let conn = db
            .connect()
            .map_err(|e| LexCoreError::Storage(e.to_string()))?;

        let storage = Self {
            db,
            conn,
            readonly: false,
        };
        storage.run_migrations().await?;
        Ok(storage)
    }

    /// Open an existing database at `path` in read-only mode.
    pub async fn open_readonly(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(LexCoreError::Storage(format!(
                "database not found: {}",
                path.display()
            )));
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| LexCoreError::Storage(e.to_string()))?;

        let conn = db
            .connect()
            .map_err(|e| LexCoreError::Storage(e.to_string()))?;

        Ok(Self {
            db,
            conn,
            readonly: true,
        })
    }

    /// Run pending schema migrations.
    async fn run_migrations(&self) -> Result<()> {
        let current_version = self.get_schema_version().await;

        for migration in migrations::all_migrations() {
            if migration.version > current_version {
                tracing::info!(
                    version = migration.version,
                    description = migration.description,
                    "applying migration"
                );
                self.conn
                    .execute_batch(migration.sql)
                    .await
                    .map_err(|e| {
                        LexCoreError::Storage(format!(
                            "migration v{} failed: {e}",
                            migration.version
                        ))
                    })?;
            }
        }
        Ok(())
    }

    /// Get the current schema version, or 0 if no migrations have been applied.
    async fn get_schema_version(&self) -> u32 {
        let result = self
            .conn
            .query("SELECT MAX(version) FROM schema_migrations", params![])
            .await;

        match result {
            Ok(mut rows) => {
                if let Ok(Some(row)) = rows.next().await {
                    row.get::<u32>(0).unwrap_or(0)
                } else {
                    0
                }
            }
            Err(_) => 0, // Table doesn't exist yet
        }
    }

    /// Ensure we're in read-write mode before writing.
    fn check_writable(&self) -> Result<()> {
        if self.readonly {
            return Err(LexCoreError::Storage(
                "database is opened in read-only mode".into(),
            ));
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Batches
    // -----------------------------------------------------------------------

    /// Start a write batch. Everything until [`commit_batch`](Self::commit_batch)
    /// lands atomically.
    pub async fn begin_batch(&self) -> Result<()> {
        self.check_writable()?;
        self.conn
            .execute_batch("BEGIN")
            .await
            .map_err(|e| LexCoreError::Storage(e.to_string()))?;
        Ok(())
    }

    /// Commit the current write batch.
    pub async fn commit_batch(&self) -> Result<()> {
        self.check_writable()?;
        self.conn
            .execute_batch("COMMIT")
            .await
            .map_err(|e| LexCoreError::Storage(e.to_string()))?;
        Ok(())
    }

    /// Discard the current write batch.
    pub async fn rollback_batch(&self) -> Result<()> {
        self.check_writable()?;
        self.conn
            .execute_batch("ROLLBACK")
            .await
            .map_err(|e| LexCoreError::Storage(e.to_string()))?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Core unit operations
    // -----------------------------------------------------------------------

    /// Insert a core unit, replacing any row with the same id.
    pub async fn insert_core_unit(&self, unit: &CoreUnit) -> Result<()> {
        self.check_writable()?;
        self.conn
            .execute(
                "INSERT OR REPLACE INTO core_units
                   (id, stem, concept, pos, main_pos, definition_set, related, source, last_updated)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    unit.id.as_str(),
                    unit.stem.as_str(),
                    unit.concept.as_str(),
                    to_json(&unit.pos)?,
                    unit.main_pos.as_str(),
                    to_json(&unit.definition_set)?,
                    to_json(&unit.related)?,
                    unit.source.as_str(),
                    unit.last_updated.to_rfc3339(),
                ],
            )
            .await
            .map_err(|e| LexCoreError::Storage(e.to_string()))?;
        Ok(())
    }

    /// Get a core unit by id.
    pub async fn get_core_unit(&self, id: &str) -> Result<Option<CoreUnit>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, stem, concept, pos, main_pos, definition_set, related, source, last_updated
                 FROM core_units WHERE id = ?1",
                params![id],
            )
            .await
            .map_err(|e| LexCoreError::Storage(e.to_string()))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row_to_core_unit(&row)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(LexCoreError::Storage(e.to_string())),
        }
    }

    /// All core units with the given stem, ordered by id.
    pub async fn find_by_stem(&self, stem: &str) -> Result<Vec<CoreUnit>> {
        self.query_core_units(
            "SELECT id, stem, concept, pos, main_pos, definition_set, related, source, last_updated
             FROM core_units WHERE stem = ?1 ORDER BY id",
            stem,
        )
        .await
    }

    /// All core units with the given concept, ordered by id.
    pub async fn find_by_concept(&self, concept: &str) -> Result<Vec<CoreUnit>> {
        self.query_core_units(
            "SELECT id, stem, concept, pos, main_pos, definition_set, related, source, last_updated
             FROM core_units WHERE concept = ?1 ORDER BY id",
            concept,
        )
        .await
    }

    async fn query_core_units(&self, sql: &str, key: &str) -> Result<Vec<CoreUnit>> {
        self.query_rows(sql, params![key], row_to_core_unit).await
    }

    /// Every stored core unit id, sorted.
    pub async fn list_core_unit_ids(&self) -> Result<Vec<String>> {
        self.query_rows("SELECT id FROM core_units ORDER BY id", params![], |row| {
            get_string(row, 0)
        })
        .await
    }

    /// Run `sql` and decode every row. A failure while stepping is an error.
    async fn query_rows<T>(
        &self,
        sql: &str,
        params: impl libsql::params::IntoParams,
        decode: impl Fn(&libsql::Row) -> Result<T>,
    ) -> Result<Vec<T>> {
        let mut rows = self
            .conn
            .query(sql, params)
            .await
            .map_err(|e| LexCoreError::Storage(e.to_string()))?;

        let mut results = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| LexCoreError::Storage(e.to_string()))?
        {
            results.push(decode(&row)?);
        }
        Ok(results)
    }

    /// Number of stored core units.
    pub async fn count_core_units(&self) -> Result<u64> {
        let mut rows = self
            .conn
            .query("SELECT COUNT(*) FROM core_units", params![])
            .await
            .map_err(|e| LexCoreError::Storage(e.to_string()))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(row_count(&row)),
            Ok(None) => Ok(0),
            Err(e) => Err(LexCoreError::Storage(e.to_string())),
        }
    }

    // -----------------------------------------------------------------------
    // Meta operations
    // -----------------------------------------------------------------------

    /// Set a meta value (upserts).
    pub async fn set_meta(&self, key: &str, value: &str) -> Result<()> {
        self.check_writable()?;
        self.conn
            .execute(
                "INSERT INTO meta (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                params![key, value],
            )
            .await
            .map_err(|e| LexCoreError::Storage(e.to_string()))?;
        Ok(())
    }

    /// Get a meta value.
    pub async fn get_meta(&self, key: &str) -> Result<Option<String>> {
        let mut rows = self
            .conn
            .query("SELECT value FROM meta WHERE key = ?1", params![key])
            .await
            .map_err(|e| LexCoreError::Storage(e.to_string()))?;

        match rows.next().await {
            Ok(Some(row)) => {
                let value: String = row
                    .get(0)
                    .map_err(|e| LexCoreError::Storage(e.to_string()))?;
                Ok(Some(value))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(LexCoreError::Storage(e.to_string())),
        }
    }

    /// All meta entries, sorted by key.
    pub async fn list_meta(&self) -> Result<Vec<(String, String)>> {
        self.query_rows("SELECT key, value FROM meta ORDER BY key", params![], |row| {
            Ok((get_string(row, 0)?, get_string(row, 1)?))
        })
        .await
    }

    // -----------------------------------------------------------------------
    // Mining operations
    // -----------------------------------------------------------------------

    /// Insert a code unit, replacing any row with the same id.
    pub async fn insert_code_unit(&self, unit: &CodeUnit) -> Result<()> {
        self.check_writable()?;
        self.conn
            .execute(
                "INSERT OR REPLACE INTO code_units
                   (id, term, concept, definition, example_ids, language, source)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    unit.id.as_str(),
                    unit.term.as_str(),
                    unit.concept.as_str(),
                    unit.definition.as_str(),
                    to_json(&unit.example_ids)?,
                    unit.language.as_str(),
                    unit.source.as_str(),
                ],
            )
            .await
            .map_err(|e| LexCoreError::Storage(e.to_string()))?;
        Ok(())
    }

    /// Get a code unit by id.
    pub async fn get_code_unit(&self, id: &str) -> Result<Option<CodeUnit>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, term, concept, definition, example_ids, language, source
                 FROM code_units WHERE id = ?1",
                params![id],
            )
            .await
            .map_err(|e| LexCoreError::Storage(e.to_string()))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(CodeUnit {
                id: get_string(&row, 0)?,
                term: get_string(&row, 1)?,
                concept: get_string(&row, 2)?,
                definition: get_string(&row, 3)?,
                example_ids: from_json(&get_string(&row, 4)?)?,
                language: get_string(&row, 5)?,
                source: get_string(&row, 6)?,
            })),
            Ok(None) => Ok(None),
            Err(e) => Err(LexCoreError::Storage(e.to_string())),
        }
    }

    /// Store one mined example's metadata JSON.
    pub async fn insert_example(&self, id: &str, kind: &str, metadata_json: &str) -> Result<()> {
        self.check_writable()?;
        self.conn
            .execute(
                "INSERT OR REPLACE INTO examples (id, kind, metadata_json) VALUES (?1, ?2, ?3)",
                params![id, kind, metadata_json],
            )
            .await
            .map_err(|e| LexCoreError::Storage(e.to_string()))?;
        Ok(())
    }

    /// Metadata JSON of one stored example.
    pub async fn get_example(&self, id: &str) -> Result<Option<String>> {
        let mut rows = self
            .conn
            .query(
                "SELECT metadata_json FROM examples WHERE id = ?1",
                params![id],
            )
            .await
            .map_err(|e| LexCoreError::Storage(e.to_string()))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(get_string(&row, 0)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(LexCoreError::Storage(e.to_string())),
        }
    }

    /// Number of stored examples of the given kind.
    pub async fn count_examples_by_kind(&self, kind: &str) -> Result<u64> {
        let mut rows = self
            .conn
            .query(
                "SELECT COUNT(*) FROM examples WHERE kind = ?1",
                params![kind],
            )
            .await
            .map_err(|e| LexCoreError::Storage(e.to_string()))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(row_count(&row)),
            Ok(None) => Ok(0),
            Err(e) => Err(LexCoreError::Storage(e.to_string())),
        }
    }

    // -----------------------------------------------------------------------
    // Definition cache operations
    // -----------------------------------------------------------------------

    /// Get a cached provider definition.
    pub async fn get_definition_cache(
        &self,
        term: &str,
        model_id: &str,
        prompt_hash: &str,
    ) -> Result<Option<String>> {
        let mut rows = self
            .conn
            .query(
                "SELECT definition FROM definition_cache
                 WHERE term = ?1 AND model_id = ?2 AND prompt_hash = ?3",
                params![term, model_id, prompt_hash],
            )
            .await
            .map_err(|e| LexCoreError::Storage(e.to_string()))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(get_string(&row, 0)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(LexCoreError::Storage(e.to_string())),
        }
    }

    /// Store a provider definition in the cache (upserts).
    pub async fn set_definition_cache(
        &self,
        term: &str,
        model_id: &str,
        prompt_hash: &str,
        definition: &str,
    ) -> Result<()> {
        self.check_writable()?;
        let now = Utc::now().to_rfc3339();
        self.conn
            .execute(
                "INSERT INTO definition_cache (term, model_id, prompt_hash, definition, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(term, model_id, prompt_hash) DO UPDATE SET
                   definition = excluded.definition,
                   created_at = excluded.created_at",
                params![term, model_id, prompt_hash, definition, now.as_str()],
            )
            .await
            .map_err(|e| LexCoreError::Storage(e.to_string()))?;
        Ok(())
    }
}

fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(|e| LexCoreError::Storage(format!("encode: {e}")))
}

fn from_json<T: serde::de::DeserializeOwned>(s: &str) -> Result<T> {
    serde_json::from_str(s).map_err(|e| LexCoreError::Storage(format!("decode: {e}")))
}

/// First column of a `COUNT(*)` row.
fn row_count(row: &libsql::Row) -> u64 {
    row.get::<i64>(0)
        .ok()
        .and_then(|n| u64::try_from(n).ok())
        .unwrap_or(0)
}

fn get_string(row: &libsql::Row, idx: i32) -> Result<String> {
    row.get::<String>(idx)
        .map_err(|e| LexCoreError::Storage(e.to_string()))
}

/// Convert a database row to a [`CoreUnit`].
fn row_to_core_unit(row: &libsql::Row) -> Result<CoreUnit> {
    Ok(CoreUnit {
        id: get_string(row, 0)?,
        stem: get_string(row, 1)?,
        concept: get_string(row, 2)?,
        pos: from_json(&get_string(row, 3)?)?,
        main_pos: get_string(row, 4)?,
        definition_set: from_json(&get_string(row, 5)?)?,
        related: from_json(&get_string(row, 6)?)?,
        source: get_string(row, 7)?,
        last_updated: {
            let s = get_string(row, 8)?;
            chrono::DateTime::parse_from_rfc3339(&s)
                .map(|dt| dt.with_timezone(&chrono::Utc))
                .map_err(|e| LexCoreError::Storage(format!("invalid date: {e}")))?
        },
    })
}
