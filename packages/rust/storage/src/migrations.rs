//! SQL migration definitions for the curation database.
//!
//! Migrations are applied in ascending order by [`crate::Storage::migrate`].
//! Every statement is `IF NOT EXISTS` so a database created by an earlier,
//! unversioned build of the tool is adopted in place.

/// A database migration with a version and SQL statements.
pub(crate) struct Migration {
    pub version: u32,
    pub description: &'static str,
    pub sql: &'static str,
}

/// All migrations, in ascending version order.
pub(crate) fn all_migrations() -> Vec<Migration> {
    vec![Migration {
        version: 1,
        description: "Initial schema: questions, urls, answers",
        sql: r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_migrations (
    version    INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS questions (
    id   INTEGER PRIMARY KEY,
    text TEXT
);

-- Question text is the natural dedup key
CREATE UNIQUE INDEX IF NOT EXISTS idx_questions_text ON questions(text);

-- Candidate sources; user submissions may repeat, llm sources are deduped in code
CREATE TABLE IF NOT EXISTS urls (
    id          INTEGER PRIMARY KEY,
    question_id INTEGER,
    url         TEXT,
    source      TEXT
);

CREATE INDEX IF NOT EXISTS idx_urls_question ON urls(question_id, url);

-- One row per annotation round
CREATE TABLE IF NOT EXISTS answers (
    id            INTEGER PRIMARY KEY,
    question_id   INTEGER,
    user_answer   TEXT,
    llm_answer    TEXT,
    llm_sources   TEXT,
    final_answer  TEXT,
    url_ranking   TEXT,
    url_relevance TEXT
);

CREATE INDEX IF NOT EXISTS idx_answers_question ON answers(question_id);

INSERT INTO schema_migrations (version) VALUES (1);
"#,
    }]
}
