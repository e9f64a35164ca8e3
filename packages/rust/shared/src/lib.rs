//! Shared types, error model, and configuration for the RAG curation tool.
//!
//! This crate is the foundation depended on by all other ragcurate crates.
//! It provides:
//! - [`RagCurateError`]: the unified error type
//! - Domain types ([`Question`], [`SourceUrl`], [`Answer`], [`SourceKind`])
//! - The `url_ranking` codec ([`UrlRating`], [`encode_ranking`], [`parse_ranking`])
//! - Configuration ([`AppConfig`], config loading)

pub mod config;
pub mod error;
pub mod ranking;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DatabaseConfig, GeneratorConfig, GeneratorMode, ServerConfig, config_dir,
    config_file_path, init_config, init_config_at, load_config, load_config_from,
    validate_api_key,
};
pub use error::{RagCurateError, Result};
pub use ranking::{UrlRating, encode_ranking, parse_ranking};
pub use types::{ANSWER_UNITS_PER_ROUND, Answer, NewAnswer, Question, SourceKind, SourceUrl};
