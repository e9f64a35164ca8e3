//! libSQL storage layer for questions, candidate sources, and answer rounds.
//!
//! The [`Storage`] struct wraps a local libSQL database. Opening a database
//! does not touch the schema; call [`Storage::migrate`] once before serving.

mod migrations;

use std::path::Path;

use libsql::{Connection, Database, params};
use ragcurate_shared::{
    Answer, NewAnswer, Question, RagCurateError, Result, SourceKind, SourceUrl,
};

const ANSWER_COLUMNS: &str = "id, question_id, user_answer, llm_answer, llm_sources, \
                              final_answer, url_ranking, url_relevance";

/// Primary storage handle wrapping a libSQL database.
pub struct Storage {
    #[allow(dead_code)]
    db: Database,
    conn: Connection,
}

fn storage_err(e: libsql::Error) -> RagCurateError {
    RagCurateError::Storage(e.to_string())
}

impl Storage {
    /// Open or create a database at `path`.
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| RagCurateError::io(parent, e))?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(storage_err)?;
        let conn = db.connect().map_err(storage_err)?;

        Ok(Self { db, conn })
    }

    /// Apply pending schema migrations. Returns how many were applied;
    /// a fully migrated database is left untouched.
    pub async fn migrate(&self) -> Result<usize> {
        let current_version = self.schema_version().await;
        let mut applied = 0;

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
                        RagCurateError::Storage(format!(
                            "migration v{} failed: {e}",
                            migration.version
                        ))
                    })?;
                applied += 1;
            }
        }

        if applied == 0 {
            tracing::debug!(version = current_version, "schema up to date");
        }
        Ok(applied)
    }

    /// Get the current schema version, or 0 if no migrations have been applied.
    pub async fn schema_version(&self) -> u32 {
        let result = self
            .conn
            .query("SELECT MAX(version) FROM schema_migrations", params![])
            .await;

        match result {
            Ok(mut rows) => match rows.next().await {
                Ok(Some(row)) => row.get::<u32>(0).unwrap_or(0),
                _ => 0,
            },
            Err(_) => 0, // Table doesn't exist yet
        }
    }

    // -----------------------------------------------------------------------
    // Question operations
    // -----------------------------------------------------------------------

    /// List all questions in insertion order.
    pub async fn list_questions(&self) -> Result<Vec<Question>> {
        let mut rows = self
            .conn
            .query("SELECT id, text FROM questions ORDER BY id", params![])
            .await
            .map_err(storage_err)?;

        let mut results = Vec::new();
        while let Some(row) = rows.next().await.map_err(storage_err)? {
            results.push(row_to_question(&row)?);
        }
        Ok(results)
    }

    /// Get a question by id.
    pub async fn get_question(&self, id: i64) -> Result<Question> {
        let mut rows = self
            .conn
            .query("SELECT id, text FROM questions WHERE id = ?1", params![id])
            .await
            .map_err(storage_err)?;

        match rows.next().await.map_err(storage_err)? {
            Some(row) => row_to_question(&row),
            None => Err(RagCurateError::not_found("question", id)),
        }
    }

    /// Look up a question by its exact text.
    pub async fn find_question_by_text(&self, text: &str) -> Result<Option<Question>> {
        let mut rows = self
            .conn
            .query("SELECT id, text FROM questions WHERE text = ?1", params![text])
            .await
            .map_err(storage_err)?;

        match rows.next().await.map_err(storage_err)? {
            Some(row) => Ok(Some(row_to_question(&row)?)),
            None => Ok(None),
        }
    }

    /// Return the question with exactly this text, inserting it if absent.
    /// The flag is `true` when a new row was created.
    pub async fn get_or_create_question(&self, text: &str) -> Result<(Question, bool)> {
        let inserted = self
            .conn
            .execute(
                "INSERT INTO questions (text) VALUES (?1) ON CONFLICT(text) DO NOTHING",
                params![text],
            )
            .await
            .map_err(storage_err)?;

        let question = self.find_question_by_text(text).await?.ok_or_else(|| {
            RagCurateError::Storage(format!("question vanished after insert: {text:?}"))
        })?;
        Ok((question, inserted > 0))
    }

    // -----------------------------------------------------------------------
    // Source URL operations
    // -----------------------------------------------------------------------

    /// Insert a source URL for a question. No dedup is applied.
    pub async fn insert_url(
        &self,
        question_id: i64,
        url: &str,
        source: SourceKind,
    ) -> Result<SourceUrl> {
        let mut rows = self
            .conn
            .query(
                "INSERT INTO urls (question_id, url, source) VALUES (?1, ?2, ?3) RETURNING id",
                params![question_id, url, source.as_str()],
            )
            .await
            .map_err(storage_err)?;

        let id = returned_id(rows.next().await.map_err(storage_err)?)?;
        Ok(SourceUrl {
            id,
            question_id,
            url: url.to_string(),
            source,
        })
    }

    /// Insert a URL unless the same URL is already stored for the question.
    /// Returns `true` when a row was inserted.
    pub async fn insert_url_if_new(
        &self,
        question_id: i64,
        url: &str,
        source: SourceKind,
    ) -> Result<bool> {
        let inserted = self
            .conn
            .execute(
                "INSERT INTO urls (question_id, url, source)
                 SELECT ?1, ?2, ?3
                 WHERE NOT EXISTS (SELECT 1 FROM urls WHERE question_id = ?1 AND url = ?2)",
                params![question_id, url, source.as_str()],
            )
            .await
            .map_err(storage_err)?;
        Ok(inserted > 0)
    }

    /// List all source URLs for a question in insertion order.
    pub async fn list_urls(&self, question_id: i64) -> Result<Vec<SourceUrl>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, question_id, url, source FROM urls WHERE question_id = ?1 ORDER BY id",
                params![question_id],
            )
            .await
            .map_err(storage_err)?;

        let mut results = Vec::new();
        while let Some(row) = rows.next().await.map_err(storage_err)? {
            results.push(row_to_source_url(&row)?);
        }
        Ok(results)
    }

    // -----------------------------------------------------------------------
    // Answer operations
    // -----------------------------------------------------------------------

    /// Record a new answer round with empty curation fields.
    pub async fn insert_answer(&self, new: &NewAnswer<'_>) -> Result<Answer> {
        let llm_sources = new.llm_sources.join(",");
        let mut rows = self
            .conn
            .query(
                "INSERT INTO answers
                   (question_id, user_answer, llm_answer, llm_sources, final_answer, url_ranking, url_relevance)
                 VALUES (?1, ?2, ?3, ?4, '', '', '')
                 RETURNING id",
                params![new.question_id, new.user_answer, new.llm_answer, llm_sources.as_str()],
            )
            .await
            .map_err(storage_err)?;

        let id = returned_id(rows.next().await.map_err(storage_err)?)?;
        Ok(Answer {
            id,
            question_id: new.question_id,
            user_answer: new.user_answer.to_string(),
            llm_answer: new.llm_answer.to_string(),
            llm_sources,
            final_answer: String::new(),
            url_ranking: String::new(),
            url_relevance: String::new(),
        })
    }

    /// Get an answer round by id.
    pub async fn get_answer(&self, id: i64) -> Result<Answer> {
        let sql = format!("SELECT {ANSWER_COLUMNS} FROM answers WHERE id = ?1");
        let mut rows = self
            .conn
            .query(&sql, params![id])
            .await
            .map_err(storage_err)?;

        match rows.next().await.map_err(storage_err)? {
            Some(row) => row_to_answer(&row),
            None => Err(RagCurateError::not_found("answer", id)),
        }
    }

    /// List all answer rounds for a question in insertion order.
    pub async fn list_answers(&self, question_id: i64) -> Result<Vec<Answer>> {
        let sql =
            format!("SELECT {ANSWER_COLUMNS} FROM answers WHERE question_id = ?1 ORDER BY id");
        let mut rows = self
            .conn
            .query(&sql, params![question_id])
            .await
            .map_err(storage_err)?;

        let mut results = Vec::new();
        while let Some(row) = rows.next().await.map_err(storage_err)? {
            results.push(row_to_answer(&row)?);
        }
        Ok(results)
    }

    /// Count answer rounds per question, for every question with at least one.
    pub async fn count_rounds_by_question(&self) -> Result<Vec<(Question, usize)>> {
        let mut rows = self
            .conn
            .query(
                "SELECT q.id, q.text, COUNT(a.id)
                 FROM questions q
                 JOIN answers a ON a.question_id = q.id
                 GROUP BY q.id, q.text
                 ORDER BY q.id",
                params![],
            )
            .await
            .map_err(storage_err)?;

        let mut results = Vec::new();
        while let Some(row) = rows.next().await.map_err(storage_err)? {
            let count: i64 = row.get(2).map_err(storage_err)?;
            results.push((row_to_question(&row)?, count as usize));
        }
        Ok(results)
    }

    /// Set the curated answer and source ranking on one round.
    pub async fn update_final_answer(
        &self,
        answer_id: i64,
        final_answer: &str,
        url_ranking: &str,
    ) -> Result<()> {
        let updated = self
            .conn
            .execute(
                "UPDATE answers SET final_answer = ?1, url_ranking = ?2 WHERE id = ?3",
                params![final_answer, url_ranking, answer_id],
            )
            .await
            .map_err(storage_err)?;

        if updated == 0 {
            return Err(RagCurateError::not_found("answer", answer_id));
        }
        Ok(())
    }

    /// Overwrite `final_answer` on every round of a question. Returns rows changed.
    pub async fn set_final_answer_for_question(
        &self,
        question_id: i64,
        final_answer: &str,
    ) -> Result<u64> {
        self.conn
            .execute(
                "UPDATE answers SET final_answer = ?1 WHERE question_id = ?2",
                params![final_answer, question_id],
            )
            .await
            .map_err(storage_err)
    }

    /// Overwrite `url_ranking` on every round of a question. Returns rows changed.
    pub async fn set_url_ranking_for_question(
        &self,
        question_id: i64,
        url_ranking: &str,
    ) -> Result<u64> {
        self.conn
            .execute(
                "UPDATE answers SET url_ranking = ?1 WHERE question_id = ?2",
                params![url_ranking, question_id],
            )
            .await
            .map_err(storage_err)
    }
}

/// Extract the id from an `INSERT … RETURNING id` row.
fn returned_id(row: Option<libsql::Row>) -> Result<i64> {
    let row = row.ok_or_else(|| RagCurateError::Storage("insert returned no id".into()))?;
    row.get::<i64>(0).map_err(storage_err)
}

/// Text columns may be NULL in databases written by older builds.
fn text_or_empty(row: &libsql::Row, idx: i32) -> Result<String> {
    match row.get_value(idx).map_err(storage_err)? {
        libsql::Value::Text(text) => Ok(text),
        libsql::Value::Null => Ok(String::new()),
        other => Err(RagCurateError::Storage(format!(
            "column {idx}: expected text, found {other:?}"
        ))),
    }
}

fn row_to_question(row: &libsql::Row) -> Result<Question> {
    Ok(Question {
        id: row.get::<i64>(0).map_err(storage_err)?,
        text: text_or_empty(row, 1)?,
    })
}

fn row_to_source_url(row: &libsql::Row) -> Result<SourceUrl> {
    Ok(SourceUrl {
        id: row.get::<i64>(0).map_err(storage_err)?,
        question_id: row.get::<i64>(1).map_err(storage_err)?,
        url: text_or_empty(row, 2)?,
        source: text_or_empty(row, 3)?.parse()?,
    })
}

fn row_to_answer(row: &libsql::Row) -> Result<Answer> {
    Ok(Answer {
        id: row.get::<i64>(0).map_err(storage_err)?,
        question_id: row.get::<i64>(1).map_err(storage_err)?,
        user_answer: text_or_empty(row, 2)?,
        llm_answer: text_or_empty(row, 3)?,
        llm_sources: text_or_empty(row, 4)?,
        final_answer: text_or_empty(row, 5)?,
        url_ranking: text_or_empty(row, 6)?,
        url_relevance: text_or_empty(row, 7)?,
    })
}
