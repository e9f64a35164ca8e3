//! HTTP front end for the RAG curation tool.
//!
//! Serves server-rendered HTML driven by htmx. Each route maps onto one
//! [`Curator`] operation; see [`routes::router`] for the route table.

mod error;
mod html;
mod routes;
mod views;

use ragcurate_core::Curator;
use ragcurate_shared::{RagCurateError, Result};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

pub use error::WebError;
pub use routes::router;

/// Router with request tracing applied.
pub fn app(curator: Curator) -> axum::Router {
    router(curator).layer(TraceLayer::new_for_http())
}

/// Bind `addr` and serve until Ctrl-C.
pub async fn serve(addr: &str, curator: Curator) -> Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| RagCurateError::Server(format!("cannot bind {addr}: {e}")))?;
    let local = listener
        .local_addr()
        .map_err(|e| RagCurateError::Server(format!("cannot read bound address: {e}")))?;

    info!(%local, generator = curator.generator_name(), "serving");

    axum::serve(listener, app(curator))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| RagCurateError::Server(e.to_string()))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::Router;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use ragcurate_core::SimulatedGenerator;
    use ragcurate_storage::Storage;
    use scraper::{Html, Selector};
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::*;

    async fn test_app() -> Router {
        let tmp = std::env::temp_dir().join(format!("ragcurate_web_{}.db", Uuid::now_v7()));
        let storage = Storage::open(&tmp).await.expect("open");
        storage.migrate().await.expect("migrate");
        router(Curator::new(Arc::new(storage), Arc::new(SimulatedGenerator)))
    }

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Option<String>, String) {
        let resp = app.clone().oneshot(req).await.expect("request");
        let status = resp.status();
        let location = resp
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.expect("body");
        (status, location, String::from_utf8_lossy(&bytes).into_owned())
    }

    fn get(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).unwrap()
    }

    fn htmx_get(uri: &str) -> Request<Body> {
        Request::get(uri)
            .header("HX-Request", "true")
            .body(Body::empty())
            .unwrap()
    }

    fn post_form(uri: &str, body: &str) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .header("HX-Request", "true")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn select_texts(html: &str, css: &str) -> Vec<String> {
        let doc = Html::parse_document(html);
        let selector = Selector::parse(css).unwrap();
        doc.select(&selector)
            .map(|el| el.text().collect::<String>().trim().to_string())
            .collect()
    }

    fn select_attr(html: &str, css: &str, attr: &str) -> Vec<String> {
        let doc = Html::parse_document(html);
        let selector = Selector::parse(css).unwrap();
        doc.select(&selector)
            .filter_map(|el| el.value().attr(attr).map(String::from))
            .collect()
    }

    #[tokio::test]
    async fn home_lists_questions() {
        let app = test_app().await;
        let (status, _, body) = send(&app, get("/")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("No questions yet"));

        send(&app, post_form("/questions", "question=What+is+%3Cb%3ERAG%3C%2Fb%3E%3F")).await;
        let (_, _, body) = send(&app, get("/")).await;
        assert_eq!(select_texts(&body, "#question-list li a"), vec!["What is <b>RAG</b>?"]);
        assert!(!body.contains("<b>RAG</b>"));
    }

    #[tokio::test]
    async fn duplicate_question_redirects_to_original() {
        let app = test_app().await;
        let (status, first, _) = send(&app, post_form("/questions", "question=Same")).await;
        assert_eq!(status, StatusCode::SEE_OTHER);
        let (_, second, _) = send(&app, post_form("/questions", "question=Same")).await;
        assert_eq!(first.as_deref(), Some("/questions/1"));
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn question_detail_is_fragment_for_htmx_and_page_otherwise() {
        let app = test_app().await;
        send(&app, post_form("/questions", "question=Q")).await;

        let (_, _, fragment) = send(&app, htmx_get("/questions/1")).await;
        assert!(!fragment.contains("<!doctype html>"));
        assert!(fragment.contains("Question: Q"));

        let (_, _, page) = send(&app, get("/questions/1")).await;
        assert!(page.starts_with("<!doctype html>"));
        assert!(page.contains("No URLs submitted yet"));
    }

    #[tokio::test]
    async fn unknown_question_is_404() {
        let app = test_app().await;
        let (status, _, _) = send(&app, get("/questions/999")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _, _) = send(&app, get("/best-answers/999")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn adding_same_url_twice_lists_it_twice() {
        let app = test_app().await;
        send(&app, post_form("/questions", "question=Q")).await;
        send(&app, post_form("/questions/1/urls", "url=https%3A%2F%2Fa.example")).await;
        let (status, _, body) =
            send(&app, post_form("/questions/1/urls", "url=https%3A%2F%2Fa.example")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            select_texts(&body, "li"),
            vec!["https://a.example", "https://a.example"]
        );
    }

    #[tokio::test]
    async fn full_round_then_curation() {
        let app = test_app().await;
        send(&app, post_form("/questions", "question=Q")).await;
        send(&app, post_form("/questions/1/urls", "url=https%3A%2F%2Fmine")).await;

        let (status, _, body) =
            send(&app, post_form("/questions/1/user-answer", "user_answer=My+answer")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("My answer"));
        assert!(body.contains("This is a simulated LLM answer"));
        assert_eq!(
            select_attr(&body, "input[type=number]", "name"),
            vec!["rank_1", "rank_2", "rank_3"]
        );
        assert_eq!(
            select_attr(&body, "form[hx-post]", "hx-post"),
            vec!["/questions/1/final-answer/1"]
        );

        let (status, _, body) = send(
            &app,
            post_form(
                "/questions/1/final-answer/1",
                "final_answer=Gold&rank_1=2&relevant_1=on&rank_3=1",
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Evaluation Complete"));

        let (_, _, body) = send(&app, get("/top-answers/1")).await;
        assert!(body.contains("Gold"));
        assert!(body.contains("https://mine"));
    }

    #[tokio::test]
    async fn best_answer_selection_and_rating() {
        let app = test_app().await;
        send(&app, post_form("/questions", "question=Q")).await;
        send(&app, post_form("/questions/1/user-answer", "user_answer=first")).await;
        send(&app, post_form("/questions/1/user-answer", "user_answer=second")).await;

        let (_, _, index) = send(&app, get("/best-answers")).await;
        assert_eq!(select_texts(&index, "main li a"), vec!["Q (4 answers)"]);

        let (_, _, detail) = send(&app, get("/best-answers/1")).await;
        assert_eq!(select_texts(&detail, "article h3").len(), 4);

        let (status, _, body) = send(
            &app,
            post_form("/best-answers/1/select", "answer_id=2&answer_type=user&question_id=1"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("second"));

        let (status, _, body) =
            send(&app, post_form("/best-answers/1/rate-sources", "relevant_2=on")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("applied to 2"));

        let (_, _, top) = send(&app, get("/top-answers/1")).await;
        let cells = select_texts(&top, "td");
        assert_eq!(cells, vec!["second", "2", "https://example.com/doc2", "2"]);
    }

    #[tokio::test]
    async fn select_without_answer_id_is_bad_request() {
        let app = test_app().await;
        send(&app, post_form("/questions", "question=Q")).await;
        let (status, _, _) =
            send(&app, post_form("/best-answers/1/select", "answer_type=user")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn bodyless_post_is_an_empty_form() {
        let app = test_app().await;
        let bare_post = |uri: &str| Request::post(uri).body(Body::empty()).unwrap();

        let (status, location, _) = send(&app, bare_post("/questions")).await;
        assert_eq!(status, StatusCode::SEE_OTHER);
        assert_eq!(location.as_deref(), Some("/questions/1"));

        let (status, _, body) = send(&app, bare_post("/questions/1/urls")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(select_texts(&body, "li").len(), 1);

        let json = Request::post("/questions")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{}"))
            .unwrap();
        let (status, _, _) = send(&app, json).await;
        assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }

    #[tokio::test]
    async fn top_answers_index_lists_answered_questions() {
        let app = test_app().await;
        send(&app, post_form("/questions", "question=Answered")).await;
        send(&app, post_form("/questions", "question=Fresh")).await;
        send(&app, post_form("/questions/1/user-answer", "user_answer=x")).await;

        let (_, _, body) = send(&app, get("/top-answers")).await;
        assert_eq!(select_texts(&body, "main li a"), vec!["Answered (1 round)"]);

        send(&app, post_form("/questions/1/user-answer", "user_answer=y")).await;
        let (_, _, body) = send(&app, get("/top-answers")).await;
        assert_eq!(select_texts(&body, "main li a"), vec!["Answered (2 rounds)"]);

        let (_, _, body) = send(&app, get("/top-answers/1")).await;
        assert!(select_texts(&body, "main p").contains(&"2 rounds recorded.".to_string()));
    }
}
