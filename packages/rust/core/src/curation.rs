//! The annotation workflow: question intake, source collection, answer
//! rounds, final curation, best-answer selection, and source re-rating.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{info, instrument};

use ragcurate_shared::{
    ANSWER_UNITS_PER_ROUND, Answer, NewAnswer, Question, RagCurateError, Result, SourceKind,
    SourceUrl, UrlRating, encode_ranking,
};
use ragcurate_storage::Storage;

use crate::generator::{AnswerGenerator, GeneratedAnswer};
use crate::leaderboard;

/// Which half of a round was picked as the best answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerSide {
    User,
    Llm,
}

impl AnswerSide {
    /// Interpret the `answer_type` form value. Anything but `user` means the generated side.
    pub fn from_form(value: &str) -> Self {
        if value == "user" { Self::User } else { Self::Llm }
    }

    /// Form value for this side.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Llm => "llm",
        }
    }

    fn pick<'a>(&self, answer: &'a Answer) -> &'a str {
        match self {
            Self::User => &answer.user_answer,
            Self::Llm => &answer.llm_answer,
        }
    }
}

/// Result of submitting a user answer: the stored round plus what the
/// comparison view needs.
#[derive(Debug, Clone)]
pub struct Round {
    pub question: Question,
    pub answer: Answer,
    pub generated: GeneratedAnswer,
    /// Every source of the question after generated sources were stored.
    pub sources: Vec<SourceUrl>,
}

/// Data for the best-answer page of one question.
#[derive(Debug, Clone)]
pub struct BestAnswerPage {
    pub question: Question,
    pub rounds: Vec<Answer>,
    pub sources: Vec<SourceUrl>,
}

/// Data for the top answers/sources page of one question.
#[derive(Debug, Clone)]
pub struct TopAnswersPage {
    pub question: Question,
    pub round_count: usize,
    pub answers: Vec<(String, usize)>,
    pub sources: Vec<(String, usize)>,
}

/// Build ratings for `urls` from submitted `rank_{id}` / `relevant_{id}` fields.
///
/// Missing or non-integer ranks count as 0; a relevance checkbox counts as
/// set when its field is present and non-empty.
pub fn collect_ratings(urls: &[SourceUrl], form: &HashMap<String, String>) -> Vec<UrlRating> {
    urls.iter()
        .map(|u| {
            let rank = form
                .get(&format!("rank_{}", u.id))
                .and_then(|v| v.trim().parse::<i64>().ok())
                .unwrap_or(0);
            let relevant = form
                .get(&format!("relevant_{}", u.id))
                .is_some_and(|v| !v.is_empty());
            UrlRating::new(u.url.clone(), rank, relevant)
        })
        .collect()
}

/// Workflow entry point shared by all request handlers.
#[derive(Clone)]
pub struct Curator {
    storage: Arc<Storage>,
    generator: Arc<dyn AnswerGenerator>,
}

impl Curator {
    pub fn new(storage: Arc<Storage>, generator: Arc<dyn AnswerGenerator>) -> Self {
        Self { storage, generator }
    }

    /// Name of the injected generator.
    pub fn generator_name(&self) -> &str {
        self.generator.name()
    }

    // -----------------------------------------------------------------------
    // Intake and sources
    // -----------------------------------------------------------------------

    pub async fn questions(&self) -> Result<Vec<Question>> {
        self.storage.list_questions().await
    }

    pub async fn question(&self, id: i64) -> Result<Question> {
        self.storage.get_question(id).await
    }

    /// Find the question with exactly this text or create it.
    #[instrument(skip_all)]
    pub async fn submit_question(&self, text: &str) -> Result<Question> {
        let (question, created) = self.storage.get_or_create_question(text).await?;
        if created {
            info!(question_id = question.id, "question created");
        }
        Ok(question)
    }

    /// A question with its current sources.
    pub async fn question_with_sources(&self, id: i64) -> Result<(Question, Vec<SourceUrl>)> {
        let question = self.storage.get_question(id).await?;
        let urls = self.storage.list_urls(id).await?;
        Ok((question, urls))
    }

    /// Append a user-submitted URL and return the question's full source list.
    #[instrument(skip(self, url))]
    pub async fn add_user_url(&self, question_id: i64, url: &str) -> Result<Vec<SourceUrl>> {
        self.storage.get_question(question_id).await?;
        self.storage
            .insert_url(question_id, url, SourceKind::User)
            .await?;
        self.storage.list_urls(question_id).await
    }

    // -----------------------------------------------------------------------
    // Rounds and curation
    // -----------------------------------------------------------------------

    /// Record one round: generate a comparison answer, store its new sources,
    /// and persist both answers.
    #[instrument(skip(self, user_answer), fields(generator = self.generator.name()))]
    pub async fn submit_user_answer(&self, question_id: i64, user_answer: &str) -> Result<Round> {
        let question = self.storage.get_question(question_id).await?;
        let candidates: Vec<String> = self
            .storage
            .list_urls(question_id)
            .await?
            .into_iter()
            .map(|u| u.url)
            .collect();

        let generated = self.generator.generate(&question.text, &candidates).await?;

        let mut added = 0usize;
        for source in &generated.sources {
            if self
                .storage
                .insert_url_if_new(question_id, source, SourceKind::Llm)
                .await?
            {
                added += 1;
            }
        }

        let answer = self
            .storage
            .insert_answer(&NewAnswer {
                question_id,
                user_answer,
                llm_answer: &generated.answer,
                llm_sources: &generated.sources,
            })
            .await?;

        info!(answer_id = answer.id, new_sources = added, "round recorded");

        let sources = self.storage.list_urls(question_id).await?;
        Ok(Round {
            question,
            answer,
            generated,
            sources,
        })
    }

    /// Store the curated answer and per-source ratings on one round.
    #[instrument(skip(self, final_answer, form))]
    pub async fn submit_final_answer(
        &self,
        question_id: i64,
        answer_id: i64,
        final_answer: &str,
        form: &HashMap<String, String>,
    ) -> Result<Answer> {
        let answer = self.storage.get_answer(answer_id).await?;
        if answer.question_id != question_id {
            return Err(RagCurateError::not_found("answer", answer_id));
        }

        let urls = self.storage.list_urls(question_id).await?;
        let ranking = encode_ranking(&collect_ratings(&urls, form));
        self.storage
            .update_final_answer(answer_id, final_answer, &ranking)
            .await?;

        info!(rated = urls.len(), "final answer saved");
        self.storage.get_answer(answer_id).await
    }

    // -----------------------------------------------------------------------
    // Best-answer selection
    // -----------------------------------------------------------------------

    /// Questions with at least two answer units, with their unit counts.
    pub async fn best_answer_candidates(&self) -> Result<Vec<(Question, usize)>> {
        Ok(self
            .storage
            .count_rounds_by_question()
            .await?
            .into_iter()
            .map(|(q, rounds)| (q, rounds * ANSWER_UNITS_PER_ROUND))
            .filter(|(_, units)| *units >= 2)
            .collect())
    }

    pub async fn best_answer_page(&self, question_id: i64) -> Result<BestAnswerPage> {
        let question = self.storage.get_question(question_id).await?;
        let rounds = self.storage.list_answers(question_id).await?;
        let sources = self.storage.list_urls(question_id).await?;
        Ok(BestAnswerPage {
            question,
            rounds,
            sources,
        })
    }

    /// Apply one round's user or generated answer as the final answer of
    /// every round of the question. Returns the selected text.
    #[instrument(skip(self))]
    pub async fn select_best_answer(
        &self,
        question_id: i64,
        answer_id: i64,
        side: AnswerSide,
    ) -> Result<String> {
        let answer = self.storage.get_answer(answer_id).await?;
        if answer.question_id != question_id {
            return Err(RagCurateError::not_found("answer", answer_id));
        }

        let selected = side.pick(&answer).to_string();
        let updated = self
            .storage
            .set_final_answer_for_question(question_id, &selected)
            .await?;

        info!(updated, "best answer applied to all rounds");
        Ok(selected)
    }

    /// Re-rate every source of the question and store the same ranking on
    /// every round. Returns the number of rounds updated.
    #[instrument(skip(self, form))]
    pub async fn rate_sources(
        &self,
        question_id: i64,
        form: &HashMap<String, String>,
    ) -> Result<u64> {
        self.storage.get_question(question_id).await?;
        let urls = self.storage.list_urls(question_id).await?;
        let ranking = encode_ranking(&collect_ratings(&urls, form));

        let updated = self
            .storage
            .set_url_ranking_for_question(question_id, &ranking)
            .await?;
        info!(updated, rated = urls.len(), "source ratings applied to all rounds");
        Ok(updated)
    }

    // -----------------------------------------------------------------------
    // Leaderboards
    // -----------------------------------------------------------------------

    /// Questions with at least one round, with their round counts.
    pub async fn answered_questions(&self) -> Result<Vec<(Question, usize)>> {
        self.storage.count_rounds_by_question().await
    }

    pub async fn top_answers(&self, question_id: i64) -> Result<TopAnswersPage> {
        let question = self.storage.get_question(question_id).await?;
        let rounds = self.storage.list_answers(question_id).await?;
        Ok(TopAnswersPage {
            question,
            round_count: rounds.len(),
            answers: leaderboard::top_answers(&rounds),
            sources: leaderboard::top_sources(&rounds),
        })
    }
}
