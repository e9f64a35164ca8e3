//! Core domain types: questions, their candidate sources, and answer rounds.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RagCurateError;

/// Every answer round holds one user answer and one generated answer.
pub const ANSWER_UNITS_PER_ROUND: usize = 2;

// ---------------------------------------------------------------------------
// Question
// ---------------------------------------------------------------------------

/// A question under annotation. `text` is unique across all questions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,
    pub text: String,
}

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

/// Who contributed a candidate source URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Typed in by the annotator.
    User,
    /// Returned alongside a generated answer.
    Llm,
}

impl SourceKind {
    /// Value stored in the `urls.source` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Llm => "llm",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceKind {
    type Err = RagCurateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "llm" => Ok(Self::Llm),
            other => Err(RagCurateError::parse(format!("unknown source kind '{other}'"))),
        }
    }
}

/// A candidate source URL attached to a question (a row of `urls`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceUrl {
    pub id: i64,
    pub question_id: i64,
    pub url: String,
    pub source: SourceKind,
}

// ---------------------------------------------------------------------------
// Answers
// ---------------------------------------------------------------------------

/// One annotation round: the annotator's answer paired with a generated one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub id: i64,
    pub question_id: i64,
    pub user_answer: String,
    pub llm_answer: String,
    /// Generated source URLs, comma-joined.
    pub llm_sources: String,
    /// Curated answer text; empty until curation or best-answer selection.
    pub final_answer: String,
    /// Comma-joined `url:rank:relevant` triples; see [`crate::ranking`].
    pub url_ranking: String,
    /// Reserved column, always written empty.
    pub url_relevance: String,
}

impl Answer {
    /// Generated source URLs as a list, skipping empty entries.
    pub fn llm_source_list(&self) -> Vec<&str> {
        self.llm_sources
            .split(',')
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Whether a final answer has been recorded for this round.
    pub fn is_curated(&self) -> bool {
        !self.final_answer.is_empty()
    }
}

/// Fields supplied when a new round is recorded.
#[derive(Debug, Clone)]
pub struct NewAnswer<'a> {
    pub question_id: i64,
    pub user_answer: &'a str,
    pub llm_answer: &'a str,
    pub llm_sources: &'a [String],
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answer(llm_sources: &str, final_answer: &str) -> Answer {
        Answer {
            id: 1,
            question_id: 1,
            user_answer: "mine".into(),
            llm_answer: "theirs".into(),
            llm_sources: llm_sources.into(),
            final_answer: final_answer.into(),
            url_ranking: String::new(),
            url_relevance: String::new(),
        }
    }

    #[test]
    fn source_kind_column_values() {
        assert_eq!(SourceKind::User.as_str(), "user");
        assert_eq!("llm".parse::<SourceKind>().unwrap(), SourceKind::Llm);
        assert!("robot".parse::<SourceKind>().is_err());
    }

    #[test]
    fn llm_source_list_skips_empty() {
        let a = answer("https://example.com/doc1,https://example.com/doc2", "");
        assert_eq!(
            a.llm_source_list(),
            vec!["https://example.com/doc1", "https://example.com/doc2"]
        );
        assert!(answer("", "").llm_source_list().is_empty());
    }

    #[test]
    fn curated_flag_follows_final_answer() {
        assert!(!answer("", "").is_curated());
        assert!(answer("", "gold").is_curated());
    }
}
