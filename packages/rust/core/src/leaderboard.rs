//! In-memory leaderboards over a question's answer rounds.

use std::collections::HashMap;

use ragcurate_shared::{Answer, parse_ranking};

/// Count occurrences and sort by count descending, ties in first-seen order.
fn tally<I>(items: I) -> Vec<(String, usize)>
where
    I: IntoIterator<Item = String>,
{
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut counts: Vec<(String, usize)> = Vec::new();

    for item in items {
        match index.get(&item) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(item.clone(), counts.len());
                counts.push((item, 1));
            }
        }
    }

    // Stable sort keeps first-seen order among equal counts.
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

/// Group rounds by identical final answer text. Uncurated rounds are skipped.
pub fn top_answers(answers: &[Answer]) -> Vec<(String, usize)> {
    tally(
        answers
            .iter()
            .filter(|a| a.is_curated())
            .map(|a| a.final_answer.clone()),
    )
}

/// Count how often each URL was marked relevant across all rounds' rankings.
pub fn top_sources(answers: &[Answer]) -> Vec<(String, usize)> {
    tally(
        answers
            .iter()
            .flat_map(|a| parse_ranking(&a.url_ranking))
            .filter(|r| r.relevant)
            .map(|r| r.url),
    )
}
