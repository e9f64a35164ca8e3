//! HTML views for every page and htmx fragment.

use std::fmt::Write;

use ragcurate_core::{AnswerSide, BestAnswerPage, Round, TopAnswersPage};
use ragcurate_shared::{Question, SourceUrl};

use crate::html::{button_link, escape, list};

// ---------------------------------------------------------------------------
// Home and question detail
// ---------------------------------------------------------------------------

pub fn home(questions: &[Question]) -> String {
    let question_list = list(questions, "No questions yet", |q| {
        format!(
            "<a href=\"/questions/{id}\" hx-get=\"/questions/{id}\" hx-target=\"#question-section\">{text}</a>",
            id = q.id,
            text = escape(&q.text)
        )
    });

    format!(
        "<h2>Submit a New Question</h2>\n\
         <form hx-post=\"/questions\" hx-target=\"#question-section\">\
         <fieldset role=\"group\">\
         <input id=\"question\" name=\"question\" placeholder=\"Enter your question\">\
         <button type=\"submit\">Submit Question</button>\
         </fieldset></form>\n\
         <h2>Or Choose an Existing Question</h2>\n\
         <p>{best} {top}</p>\n\
         <div id=\"question-list\">{question_list}</div>\n\
         <div id=\"question-section\"></div>",
        best = button_link("/best-answers", "View Questions with Multiple Answers"),
        top = button_link("/top-answers", "View Top Answers"),
    )
}

/// Heading plus list of the question's sources; the body of `#url-list`.
pub fn url_list(urls: &[SourceUrl]) -> String {
    format!(
        "<h3>Submitted URLs</h3>{}",
        list(urls, "No URLs submitted yet", |u| escape(&u.url))
    )
}

pub fn question_detail(question: &Question, urls: &[SourceUrl]) -> String {
    let id = question.id;
    format!(
        "<article>\n<h2>Question: {text}</h2>\n\
         <form hx-post=\"/questions/{id}/urls\" hx-target=\"#url-list\">\
         <fieldset role=\"group\">\
         <input id=\"url\" name=\"url\" placeholder=\"Enter a relevant URL\">\
         <button type=\"submit\">Add URL</button>\
         </fieldset></form>\n\
         <div id=\"url-list\">{urls}</div>\n\
         <form hx-post=\"/questions/{id}/user-answer\" hx-target=\"#answer-section\">\
         <h3>Write Your Perfect Answer</h3>\
         <textarea id=\"user_answer\" name=\"user_answer\" rows=\"10\" \
         placeholder=\"Write your answer here, referencing the URLs where appropriate\"></textarea>\
         <button type=\"submit\">Submit Answer</button></form>\n\
         <div id=\"answer-section\"></div>\n</article>",
        text = escape(&question.text),
        urls = url_list(urls),
    )
}

// ---------------------------------------------------------------------------
// Source rating inputs
// ---------------------------------------------------------------------------

/// One row of rank input, URL, relevance switch, and origin per source.
fn rating_inputs(urls: &[SourceUrl]) -> String {
    let max = urls.len();
    let mut out = String::from("<ul class=\"url-ranking\">");
    for u in urls {
        let _ = write!(
            out,
            "<li><div class=\"grid\">\
             <input type=\"number\" name=\"rank_{id}\" value=\"0\" min=\"0\" max=\"{max}\" style=\"width: 60px;\">\
             <p>{url}</p>\
             <label for=\"relevant_{id}\"><input type=\"checkbox\" role=\"switch\" \
             name=\"relevant_{id}\" id=\"relevant_{id}\"> Relevant</label>\
             <p style=\"color: var(--pico-muted-color);\">Source: {source}</p>\
             </div></li>",
            id = u.id,
            url = escape(&u.url),
            source = u.source,
        );
    }
    out.push_str("</ul>");
    out
}

// ---------------------------------------------------------------------------
// Round comparison and curation
// ---------------------------------------------------------------------------

pub fn comparison(round: &Round) -> String {
    let qid = round.question.id;
    let aid = round.answer.id;
    format!(
        "<article>\n<h3>Compare Answers</h3>\n<div class=\"grid\">\
         <article><header>User Generated</header><h4>Your Answer</h4><p>{user}</p></article>\
         <article><header>AI Generated</header><h4>LLM Answer</h4><p>{llm}</p>\
         <p>Sources: {sources}</p></article>\
         </div>\n\
         <form hx-post=\"/questions/{qid}/final-answer/{aid}\" hx-target=\"#final-section\">\
         <h3>Submit Final Perfect Answer</h3>\
         <p>Review and rate all sources:</p>\
         {ratings}\
         <h3>Write Final Answer</h3>\
         <textarea id=\"final_answer\" name=\"final_answer\" rows=\"10\" \
         placeholder=\"Write the perfect answer combining the best of both responses\"></textarea>\
         <button type=\"submit\">Submit Final Answer</button></form>\n\
         <div id=\"final-section\"></div>\n</article>",
        user = escape(&round.answer.user_answer),
        llm = escape(&round.answer.llm_answer),
        sources = escape(&round.generated.sources.join(", ")),
        ratings = rating_inputs(&round.sources),
    )
}

pub fn evaluation_complete() -> String {
    format!(
        "<article><h3>Evaluation Complete</h3>\
         <p>Your final answer and URL evaluations have been saved.</p>{}</article>",
        button_link("/", "Start New Evaluation")
    )
}

// ---------------------------------------------------------------------------
// Best answers
// ---------------------------------------------------------------------------

pub fn best_answer_index(candidates: &[(Question, usize)]) -> String {
    let question_list = list(candidates, "No questions with multiple answers yet", |(q, units)| {
        format!(
            "<a href=\"/best-answers/{}\">{} ({units} answers)</a>",
            q.id,
            escape(&q.text)
        )
    });
    format!(
        "<h2>Select Best Answer</h2>\n\
         <p>The following questions have multiple answers. Click to select the best one.</p>\n\
         {question_list}\n{}",
        button_link("/", "Back to Home")
    )
}

fn answer_option(
    question_id: i64,
    answer_id: i64,
    number: usize,
    side: AnswerSide,
    text: &str,
    sources: Option<&str>,
) -> String {
    let kind = match side {
        AnswerSide::User => "User Answer",
        AnswerSide::Llm => "LLM Answer",
    };
    let sources = match sources {
        Some(s) if !s.is_empty() => format!("<p>Sources: {}</p>", escape(s)),
        _ => String::new(),
    };
    format!(
        "<article><h3>Answer Option {number}</h3><p>{text}</p><p>Type: {kind}</p>{sources}\
         <form hx-post=\"/best-answers/{question_id}/select\" hx-target=\"#selection-result\">\
         <input type=\"hidden\" name=\"answer_id\" value=\"{answer_id}\">\
         <input type=\"hidden\" name=\"answer_type\" value=\"{side}\">\
         <input type=\"hidden\" name=\"question_id\" value=\"{question_id}\">\
         <button type=\"submit\">Select as Best Answer</button></form></article>",
        text = escape(text),
        side = side.as_str(),
    )
}

pub fn best_answer_detail(page: &BestAnswerPage) -> String {
    let qid = page.question.id;
    let mut rounds = String::new();
    for (i, answer) in page.rounds.iter().enumerate() {
        let _ = write!(
            rounds,
            "<section><h3>Round {round}</h3><div class=\"grid\">{user}{llm}</div></section>\n",
            round = i + 1,
            user = answer_option(
                qid,
                answer.id,
                2 * i + 1,
                AnswerSide::User,
                &answer.user_answer,
                None
            ),
            llm = answer_option(
                qid,
                answer.id,
                2 * i + 2,
                AnswerSide::Llm,
                &answer.llm_answer,
                Some(&answer.llm_sources)
            ),
        );
    }

    format!(
        "<h2>{text}</h2>\n{rounds}<div id=\"selection-result\"></div>\n\
         <form hx-post=\"/best-answers/{qid}/rate-sources\" hx-target=\"#rating-result\">\
         <h3>Rate Sources</h3><p>Ratings apply to every answer recorded for this question.</p>\
         {ratings}<button type=\"submit\">Save Source Ratings</button></form>\n\
         <div id=\"rating-result\"></div>\n{back}",
        text = escape(&page.question.text),
        ratings = rating_inputs(&page.sources),
        back = button_link("/best-answers", "Back to Questions"),
    )
}

pub fn best_answer_selected(selected: &str) -> String {
    format!(
        "<article><h3>Best Answer Selected</h3>\
         <p>The selected answer has been marked as the best answer for this question.</p>\
         <blockquote>{}</blockquote>{}</article>",
        escape(selected),
        button_link("/best-answers", "Back to Questions")
    )
}

pub fn sources_rated(rounds_updated: u64) -> String {
    format!(
        "<article><h3>Source Ratings Saved</h3>\
         <p>Ratings were applied to {rounds_updated} recorded answer(s).</p></article>"
    )
}

// ---------------------------------------------------------------------------
// Top answers
// ---------------------------------------------------------------------------

fn round_count(n: usize) -> String {
    if n == 1 {
        "1 round".into()
    } else {
        format!("{n} rounds")
    }
}

pub fn top_answer_index(questions: &[(Question, usize)]) -> String {
    let question_list = list(questions, "No answers recorded yet", |(q, rounds)| {
        format!(
            "<a href=\"/top-answers/{}\">{} ({})</a>",
            q.id,
            escape(&q.text),
            round_count(*rounds)
        )
    });
    format!("<h2>Questions</h2>\n{question_list}\n{}", button_link("/", "Back to Home"))
}

fn count_table(heading: &str, label: &str, rows: &[(String, usize)], empty: &str) -> String {
    if rows.is_empty() {
        return format!("<h3>{heading}</h3><p>{}</p>", escape(empty));
    }
    let mut body = String::new();
    for (value, count) in rows {
        let _ = write!(body, "<tr><td>{}</td><td>{count}</td></tr>", escape(value));
    }
    format!(
        "<h3>{heading}</h3><table><thead><tr><th>{label}</th><th>Count</th></tr></thead>\
         <tbody>{body}</tbody></table>"
    )
}

pub fn top_answer_detail(page: &TopAnswersPage) -> String {
    format!(
        "<h2>{text}</h2>\n<p>{rounds} recorded.</p>\n{answers}\n{sources}\n{back}",
        text = escape(&page.question.text),
        rounds = round_count(page.round_count),
        answers = count_table(
            "Top Answers",
            "Final answer",
            &page.answers,
            "No final answers yet"
        ),
        sources = count_table(
            "Top Sources",
            "URL",
            &page.sources,
            "No sources marked relevant yet"
        ),
        back = button_link("/top-answers", "Back to Questions"),
    )
}
