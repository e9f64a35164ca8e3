//! Curation workflow and domain logic for the RAG curation tool.
//!
//! This crate ties the answer generator and storage together into the
//! annotation workflow (intake → sources → rounds → curation → selection)
//! and computes the leaderboard aggregates.

pub mod curation;
pub mod generator;
pub mod leaderboard;

pub use curation::{AnswerSide, BestAnswerPage, Curator, Round, TopAnswersPage};
pub use generator::{
    AnswerGenerator, ChatCompletionsGenerator, GeneratedAnswer, SimulatedGenerator,
    build_generator,
};
