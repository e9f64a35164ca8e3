//! Request handlers and the route table.

use std::collections::HashMap;

use axum::Router;
use axum::extract::rejection::FormRejection;
use axum::extract::{Form, FromRequest, Path, Request, State};
use axum::http::HeaderMap;
use axum::http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use axum::response::{Html, Redirect};
use axum::routing::{get, post};
use ragcurate_core::{AnswerSide, Curator};

use crate::error::{WebError, WebResult};
use crate::html::document;
use crate::views;

type FormFields = HashMap<String, String>;

/// Urlencoded form fields. A POST without a body carries no fields.
struct Fields(FormFields);

impl<S: Send + Sync> FromRequest<S> for Fields {
    type Rejection = FormRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let headers = req.headers();
        let bodyless = !headers.contains_key(CONTENT_TYPE)
            && headers
                .get(CONTENT_LENGTH)
                .is_none_or(|len| len.as_bytes() == b"0");
        if bodyless {
            return Ok(Self(FormFields::new()));
        }
        let Form(fields) = Form::<FormFields>::from_request(req, state).await?;
        Ok(Self(fields))
    }
}

/// Build the route table over a shared [`Curator`].
pub fn router(curator: Curator) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/questions", post(submit_question))
        .route("/questions/{id}", get(question_detail))
        .route("/questions/{id}/urls", post(add_url))
        .route("/questions/{id}/user-answer", post(submit_user_answer))
        .route("/questions/{qid}/final-answer/{aid}", post(submit_final_answer))
        .route("/best-answers", get(best_answer_index))
        .route("/best-answers/{id}", get(best_answer_detail))
        .route("/best-answers/{id}/select", post(select_best_answer))
        .route("/best-answers/{id}/rate-sources", post(rate_sources))
        .route("/top-answers", get(top_answer_index))
        .route("/top-answers/{id}", get(top_answer_detail))
        .with_state(curator)
}

/// Return a fragment as-is to htmx, or wrapped in a full page otherwise.
fn fragment(headers: &HeaderMap, title: &str, body: String) -> Html<String> {
    if headers.contains_key("hx-request") {
        Html(body)
    } else {
        Html(document(title, &body))
    }
}

/// A form field, or the empty string when it was not submitted.
fn field<'a>(form: &'a FormFields, name: &str) -> &'a str {
    form.get(name).map(String::as_str).unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Intake, sources, rounds
// ---------------------------------------------------------------------------

async fn home(State(curator): State<Curator>) -> WebResult<Html<String>> {
    let questions = curator.questions().await?;
    Ok(Html(document("RAG Evaluation Tool", &views::home(&questions))))
}

async fn submit_question(
    State(curator): State<Curator>,
    Fields(form): Fields,
) -> WebResult<Redirect> {
    let question = curator.submit_question(field(&form, "question")).await?;
    Ok(Redirect::to(&format!("/questions/{}", question.id)))
}

async fn question_detail(
    State(curator): State<Curator>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> WebResult<Html<String>> {
    let (question, urls) = curator.question_with_sources(id).await?;
    Ok(fragment(&headers, "Question", views::question_detail(&question, &urls)))
}

async fn add_url(
    State(curator): State<Curator>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    Fields(form): Fields,
) -> WebResult<Html<String>> {
    let urls = curator.add_user_url(id, field(&form, "url")).await?;
    Ok(fragment(&headers, "Submitted URLs", views::url_list(&urls)))
}

async fn submit_user_answer(
    State(curator): State<Curator>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    Fields(form): Fields,
) -> WebResult<Html<String>> {
    let round = curator
        .submit_user_answer(id, field(&form, "user_answer"))
        .await?;
    Ok(fragment(&headers, "Compare Answers", views::comparison(&round)))
}

async fn submit_final_answer(
    State(curator): State<Curator>,
    Path((qid, aid)): Path<(i64, i64)>,
    headers: HeaderMap,
    Fields(form): Fields,
) -> WebResult<Html<String>> {
    curator
        .submit_final_answer(qid, aid, field(&form, "final_answer"), &form)
        .await?;
    Ok(fragment(&headers, "Evaluation Complete", views::evaluation_complete()))
}

// ---------------------------------------------------------------------------
// Best answers
// ---------------------------------------------------------------------------

async fn best_answer_index(State(curator): State<Curator>) -> WebResult<Html<String>> {
    let candidates = curator.best_answer_candidates().await?;
    Ok(Html(document(
        "Questions with Multiple Answers",
        &views::best_answer_index(&candidates),
    )))
}

async fn best_answer_detail(
    State(curator): State<Curator>,
    Path(id): Path<i64>,
) -> WebResult<Html<String>> {
    let page = curator.best_answer_page(id).await?;
    let title = format!("Select Best Answer for: {}", page.question.text);
    Ok(Html(document(&title, &views::best_answer_detail(&page))))
}

async fn select_best_answer(
    State(curator): State<Curator>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    Fields(form): Fields,
) -> WebResult<Html<String>> {
    let answer_id = field(&form, "answer_id")
        .trim()
        .parse::<i64>()
        .map_err(|_| WebError::BadRequest("answer_id must be an integer".into()))?;
    let side = AnswerSide::from_form(field(&form, "answer_type"));

    let selected = curator.select_best_answer(id, answer_id, side).await?;
    Ok(fragment(&headers, "Best Answer Selected", views::best_answer_selected(&selected)))
}

async fn rate_sources(
    State(curator): State<Curator>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    Fields(form): Fields,
) -> WebResult<Html<String>> {
    let updated = curator.rate_sources(id, &form).await?;
    Ok(fragment(&headers, "Source Ratings Saved", views::sources_rated(updated)))
}

// ---------------------------------------------------------------------------
// Top answers
// ---------------------------------------------------------------------------

async fn top_answer_index(State(curator): State<Curator>) -> WebResult<Html<String>> {
    let questions = curator.answered_questions().await?;
    Ok(Html(document("Top Answers", &views::top_answer_index(&questions))))
}

async fn top_answer_detail(
    State(curator): State<Curator>,
    Path(id): Path<i64>,
) -> WebResult<Html<String>> {
    let page = curator.top_answers(id).await?;
    let title = format!("Top Answers for: {}", page.question.text);
    Ok(Html(document(&title, &views::top_answer_detail(&page))))
}
