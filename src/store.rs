//! Record store: SQLite-backed persistence for languages, translations and
//! tags, plus the filtered/paginated read queries behind the catalog API.
//!
//! All SQL lives here. Queries are built at runtime with `QueryBuilder` so
//! the filter engine can append its predicates with bound arguments.

use crate::config::PAGE_SIZE;
use crate::error::ApiError;
use crate::filters::{LanguageFilter, TranslationFilter};
use crate::models::{taken, Language, Paginated, Tag, Translation, TranslationWithTags};
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Open (or create) the database and bring the schema up to date.
    pub async fn connect(database_url: &str) -> Result<Self, ApiError> {
        let opts = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .foreign_keys(true)
            // Prevent transient "database is locked" errors under concurrent access.
            .busy_timeout(Duration::from_secs(5));

        // SQLite permits limited write concurrency; a single connection avoids
        // "database is locked" failures and keeps in-memory databases alive
        // for the lifetime of the pool.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(opts)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> Result<(), ApiError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS languages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                code TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS translations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                key TEXT NOT NULL,
                value TEXT NOT NULL,
                language_id INTEGER NOT NULL
                    REFERENCES languages(id) ON DELETE CASCADE,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_translations_language_id
             ON translations(language_id)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS tags (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS tag_translation (
                tag_id INTEGER NOT NULL REFERENCES tags(id) ON DELETE CASCADE,
                translation_id INTEGER NOT NULL
                    REFERENCES translations(id) ON DELETE CASCADE,
                PRIMARY KEY (tag_id, translation_id)
            )",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Store connectivity check for the health endpoint.
    pub async fn ping(&self) -> Result<(), ApiError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    // ==================== Languages ====================

    pub async fn list_languages(
        &self,
        filter: &LanguageFilter,
        page: u32,
    ) -> Result<Paginated<Language>, ApiError> {
        let mut count_qb =
            QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM languages WHERE 1 = 1");
        filter.apply(&mut count_qb);
        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        let mut qb = QueryBuilder::<Sqlite>::new(
            "SELECT id, code, name, created_at, updated_at FROM languages WHERE 1 = 1",
        );
        filter.apply(&mut qb);
        qb.push(" ORDER BY name ASC LIMIT ")
            .push_bind(i64::from(PAGE_SIZE))
            .push(" OFFSET ")
            .push_bind(i64::from(page - 1) * i64::from(PAGE_SIZE));

        let languages: Vec<Language> = qb.build_query_as().fetch_all(&self.pool).await?;
        Ok(Paginated::new(languages, page, total as u64))
    }

    /// Explicit fetch-or-not-found lookup, consumed by every handler that
    /// takes a language id.
    pub async fn get_language(&self, id: i64) -> Result<Language, ApiError> {
        sqlx::query_as::<_, Language>(
            "SELECT id, code, name, created_at, updated_at FROM languages WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ApiError::NotFound("Language not found".to_string()))
    }

    pub async fn find_language_by_code(&self, code: &str) -> Result<Option<Language>, ApiError> {
        Ok(sqlx::query_as::<_, Language>(
            "SELECT id, code, name, created_at, updated_at FROM languages WHERE code = ?",
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?)
    }

    /// `exclude_id` makes the uniqueness check ignore the row being updated.
    async fn code_is_taken(&self, code: &str, exclude_id: Option<i64>) -> Result<bool, ApiError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM languages WHERE code = ? AND id != ?",
        )
        .bind(code)
        .bind(exclude_id.unwrap_or(-1))
        .fetch_one(&self.pool)
        .await?;
        Ok(count > 0)
    }

    pub async fn create_language(&self, code: &str, name: &str) -> Result<Language, ApiError> {
        if self.code_is_taken(code, None).await? {
            return Err(taken("code"));
        }

        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO languages (code, name, created_at, updated_at) VALUES (?, ?, ?, ?)",
        )
        .bind(code)
        .bind(name)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.get_language(result.last_insert_rowid()).await
    }

    pub async fn update_language(
        &self,
        id: i64,
        code: &str,
        name: &str,
    ) -> Result<Language, ApiError> {
        self.get_language(id).await?;
        if self.code_is_taken(code, Some(id)).await? {
            return Err(taken("code"));
        }

        sqlx::query("UPDATE languages SET code = ?, name = ?, updated_at = ? WHERE id = ?")
            .bind(code)
            .bind(name)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;

        self.get_language(id).await
    }

    /// Delete a language; its translations go with it (explicit cascade).
    pub async fn delete_language(&self, id: i64) -> Result<(), ApiError> {
        let result = sqlx::query("DELETE FROM languages WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound("Language not found".to_string()));
        }
        Ok(())
    }

    // ==================== Translations ====================

    pub async fn list_translations(
        &self,
        filter: &TranslationFilter,
        page: u32,
    ) -> Result<Paginated<TranslationWithTags>, ApiError> {
        let mut count_qb =
            QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM translations WHERE 1 = 1");
        filter.apply(&mut count_qb);
        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        let mut qb = QueryBuilder::<Sqlite>::new(
            "SELECT id, key, value, language_id, created_at, updated_at \
             FROM translations WHERE 1 = 1",
        );
        filter.apply(&mut qb);
        // Deterministic store-default ordering: ascending id (insertion order).
        qb.push(" ORDER BY id ASC LIMIT ")
            .push_bind(i64::from(PAGE_SIZE))
            .push(" OFFSET ")
            .push_bind(i64::from(page - 1) * i64::from(PAGE_SIZE));

        let translations: Vec<Translation> = qb.build_query_as().fetch_all(&self.pool).await?;
        let mut tags_by_translation = self
            .tags_for(translations.iter().map(|t| t.id).collect())
            .await?;

        let data = translations
            .into_iter()
            .map(|translation| {
                let tags = tags_by_translation
                    .remove(&translation.id)
                    .unwrap_or_default();
                TranslationWithTags { translation, tags }
            })
            .collect();

        Ok(Paginated::new(data, page, total as u64))
    }

    /// Attached tags for a page of translations, grouped by translation id.
    async fn tags_for(&self, ids: Vec<i64>) -> Result<HashMap<i64, Vec<Tag>>, ApiError> {
        let mut grouped: HashMap<i64, Vec<Tag>> = HashMap::new();
        if ids.is_empty() {
            return Ok(grouped);
        }

        let mut qb = QueryBuilder::<Sqlite>::new(
            "SELECT tt.translation_id, tags.id, tags.name \
             FROM tags JOIN tag_translation tt ON tt.tag_id = tags.id \
             WHERE tt.translation_id IN (",
        );
        let mut separated = qb.separated(", ");
        for id in &ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(") ORDER BY tags.id ASC");

        for row in qb.build().fetch_all(&self.pool).await? {
            let translation_id: i64 = row.try_get(0)?;
            let tag = Tag {
                id: row.try_get(1)?,
                name: row.try_get(2)?,
            };
            grouped.entry(translation_id).or_default().push(tag);
        }
        Ok(grouped)
    }

    pub async fn get_translation(&self, id: i64) -> Result<Translation, ApiError> {
        sqlx::query_as::<_, Translation>(
            "SELECT id, key, value, language_id, created_at, updated_at \
             FROM translations WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ApiError::NotFound("Translation not found".to_string()))
    }

    /// The owning language must exist; a dangling id is a validation error,
    /// not a 5xx from the foreign key.
    async fn require_language(&self, language_id: i64) -> Result<(), ApiError> {
        match self.get_language(language_id).await {
            Ok(_) => Ok(()),
            Err(ApiError::NotFound(_)) => Err(ApiError::field(
                "language_id",
                "The selected language_id is invalid.",
            )),
            Err(err) => Err(err),
        }
    }

    pub async fn create_translation(
        &self,
        key: &str,
        value: &str,
        language_id: i64,
    ) -> Result<Translation, ApiError> {
        self.require_language(language_id).await?;

        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO translations (key, value, language_id, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(key)
        .bind(value)
        .bind(language_id)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.get_translation(result.last_insert_rowid()).await
    }

    /// Returns the language id the translation belonged to before the update
    /// alongside the updated row, so the caller can invalidate both sides of
    /// a language move.
    pub async fn update_translation(
        &self,
        id: i64,
        key: &str,
        value: &str,
        language_id: i64,
    ) -> Result<(i64, Translation), ApiError> {
        let previous = self.get_translation(id).await?;
        self.require_language(language_id).await?;

        sqlx::query(
            "UPDATE translations SET key = ?, value = ?, language_id = ?, updated_at = ? \
             WHERE id = ?",
        )
        .bind(key)
        .bind(value)
        .bind(language_id)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        let updated = self.get_translation(id).await?;
        Ok((previous.language_id, updated))
    }

    /// Returns the deleted row so the caller knows which language to
    /// invalidate.
    pub async fn delete_translation(&self, id: i64) -> Result<Translation, ApiError> {
        let translation = self.get_translation(id).await?;
        sqlx::query("DELETE FROM translations WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(translation)
    }

    /// All `(key, value)` pairs of a language in ascending id order. The
    /// export pipeline folds these into a map where later rows win for
    /// duplicate keys.
    pub async fn export_pairs(&self, language_id: i64) -> Result<Vec<(String, String)>, ApiError> {
        let rows = sqlx::query(
            "SELECT key, value FROM translations WHERE language_id = ? ORDER BY id ASC",
        )
        .bind(language_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| Ok((row.try_get(0)?, row.try_get(1)?)))
            .collect()
    }

    // ==================== Tags ====================

    // Tags have no HTTP surface; they are created here (seeding, tests) and
    // consumed by the tag_ids filter.

    pub async fn create_tag(&self, name: &str) -> Result<Tag, ApiError> {
        let result = sqlx::query("INSERT INTO tags (name) VALUES (?)")
            .bind(name)
            .execute(&self.pool)
            .await?;
        Ok(Tag {
            id: result.last_insert_rowid(),
            name: name.to_string(),
        })
    }

    pub async fn attach_tag(&self, translation_id: i64, tag_id: i64) -> Result<(), ApiError> {
        sqlx::query(
            "INSERT OR IGNORE INTO tag_translation (tag_id, translation_id) VALUES (?, ?)",
        )
        .bind(tag_id)
        .bind(translation_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
