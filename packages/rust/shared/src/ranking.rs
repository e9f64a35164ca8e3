//! Codec for the `answers.url_ranking` column.
//!
//! A ranking is a comma-joined list of `url:rank:relevant` triples, where
//! `relevant` is `1` or `0`. Entries are split from the right so URLs may
//! contain colons. URLs may also contain commas, so the parser re-joins
//! comma-separated fragments until they form a valid triple.

use serde::{Deserialize, Serialize};

/// One source's rating as stored in `url_ranking`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlRating {
    pub url: String,
    pub rank: i64,
    pub relevant: bool,
}

impl UrlRating {
    pub fn new(url: impl Into<String>, rank: i64, relevant: bool) -> Self {
        Self {
            url: url.into(),
            rank,
            relevant,
        }
    }

    fn encode(&self) -> String {
        format!(
            "{}:{}:{}",
            self.url,
            self.rank,
            if self.relevant { "1" } else { "0" }
        )
    }

    /// Parse one `url:rank:relevant` entry. `None` if it is not a valid triple.
    fn decode(entry: &str) -> Option<Self> {
        let mut parts = entry.rsplitn(3, ':');
        let relevant = match parts.next()? {
            "1" => true,
            "0" => false,
            _ => return None,
        };
        let rank = parts.next()?.trim().parse::<i64>().ok()?;
        let url = parts.next()?;
        Some(Self::new(url, rank, relevant))
    }
}

/// Serialize ratings into the `url_ranking` column format.
pub fn encode_ranking(ratings: &[UrlRating]) -> String {
    ratings
        .iter()
        .map(UrlRating::encode)
        .collect::<Vec<_>>()
        .join(",")
}

/// Parse a `url_ranking` value. Unparseable trailing fragments are dropped.
pub fn parse_ranking(raw: &str) -> Vec<UrlRating> {
    let mut ratings = Vec::new();
    if raw.is_empty() {
        return ratings;
    }

    let mut pending = String::new();
    for fragment in raw.split(',') {
        if !pending.is_empty() {
            pending.push(',');
        }
        pending.push_str(fragment);

        if let Some(rating) = UrlRating::decode(&pending) {
            ratings.push(rating);
            pending.clear();
        }
    }

    if !pending.is_empty() {
        tracing::debug!(fragment = %pending, "dropping malformed url_ranking entry");
    }
    ratings
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_triples_joined_by_commas() {
        let ratings = vec![
            UrlRating::new("http://a", 1, true),
            UrlRating::new("http://b", 2, false),
        ];
        assert_eq!(encode_ranking(&ratings), "http://a:1:1,http://b:2:0");
        assert_eq!(encode_ranking(&[]), "");
    }

    #[test]
    fn parses_urls_containing_colons() {
        let parsed = parse_ranking("https://example.com:8080/doc:3:1");
        assert_eq!(
            parsed,
            vec![UrlRating::new("https://example.com:8080/doc", 3, true)]
        );
    }

    #[test]
    fn parses_urls_containing_commas() {
        let raw = "https://example.com/a?ids=1,2:4:0,http://b:0:1";
        let parsed = parse_ranking(raw);
        assert_eq!(
            parsed,
            vec![
                UrlRating::new("https://example.com/a?ids=1,2", 4, false),
                UrlRating::new("http://b", 0, true),
            ]
        );
        assert_eq!(encode_ranking(&parsed), raw);
    }

    #[test]
    fn empty_and_malformed_input() {
        assert!(parse_ranking("").is_empty());
        assert!(parse_ranking("no-triple-here").is_empty());
        // A non-numeric rank never forms a triple on its own.
        assert_eq!(
            parse_ranking("http://a:x:1,http://b:2:1"),
            vec![UrlRating::new("http://a:x:1,http://b", 2, true)]
        );
    }
}
