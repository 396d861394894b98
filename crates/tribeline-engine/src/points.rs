//! Interest points per genre and per keyword.

use std::collections::{BTreeMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;
use tribeline_core::{DocumentStore, PointsBucket, UserId};

use crate::{Engine, EngineError};

static WORD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\p{L}\p{N}]+(?:'[\p{L}\p{N}]+)*").expect("valid regex")
});

const STOPWORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "am", "an", "and", "any", "are",
    "as", "at", "be", "because", "been", "before", "being", "below", "between", "both", "but",
    "by", "can", "could", "did", "do", "does", "doing", "down", "during", "each", "few", "for",
    "from", "further", "had", "has", "have", "having", "he", "her", "here", "hers", "herself",
    "him", "himself", "his", "how", "i", "i'm", "if", "in", "into", "is", "it", "it's", "its",
    "itself", "just", "me", "more", "most", "my", "myself", "no", "nor", "not", "now", "of",
    "off", "on", "once", "only", "or", "other", "our", "ours", "ourselves", "out", "over", "own",
    "same", "she", "should", "so", "some", "such", "than", "that", "the", "their", "theirs",
    "them", "themselves", "then", "there", "these", "they", "this", "those", "through", "to",
    "too", "under", "until", "up", "very", "was", "we", "were", "what", "when", "where", "which",
    "while", "who", "whom", "why", "will", "with", "would", "you", "your", "yours", "yourself",
    "yourselves",
];

/// Distinct lowercased keywords of `sentence`, in order of first appearance.
///
/// Stopwords and purely numeric tokens are dropped.
#[must_use]
pub fn extract_keywords(sentence: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    WORD_RE
        .find_iter(sentence)
        .map(|m| m.as_str().to_lowercase())
        .filter(|word| !word.chars().all(|c| c.is_numeric()))
        .filter(|word| !STOPWORDS.contains(&word.as_str()))
        .filter(|word| seen.insert(word.clone()))
        .collect()
}

impl<S: DocumentStore> Engine<S> {
    /// Add `points` to the user's total for `genre`.
    ///
    /// # Errors
    ///
    /// [`EngineError::Validation`] for a blank genre;
    /// [`EngineError::DataSourceUnavailable`] if the write fails.
    pub async fn award_genre_points(
        &self,
        user: &UserId,
        genre: &str,
        points: i64,
    ) -> Result<(), EngineError> {
        let genre = genre.trim();
        if genre.is_empty() {
            return Err(EngineError::Validation("genre must not be empty".to_string()));
        }
        self.store
            .add_points(user, PointsBucket::Genre, &[(genre.to_string(), points)])
            .await?;
        tracing::debug!(user = %user, genre, points, "genre points awarded");
        Ok(())
    }

    /// Add `points` once per distinct keyword in `sentence`. Returns the
    /// keywords.
    ///
    /// # Errors
    ///
    /// [`EngineError::DataSourceUnavailable`] if the write fails.
    pub async fn award_keyword_points(
        &self,
        user: &UserId,
        sentence: &str,
        points: i64,
    ) -> Result<Vec<String>, EngineError> {
        let keywords = extract_keywords(sentence);
        if keywords.is_empty() {
            return Ok(keywords);
        }
        let entries: Vec<(String, i64)> = keywords.iter().map(|k| (k.clone(), points)).collect();
        self.store
            .add_points(user, PointsBucket::Keywords, &entries)
            .await?;
        tracing::debug!(user = %user, count = keywords.len(), points, "keyword points awarded");
        Ok(keywords)
    }

    /// Totals in one of the user's points buckets, keyed by genre or keyword.
    ///
    /// # Errors
    ///
    /// [`EngineError::DataSourceUnavailable`] if the read fails.
    pub async fn list_points(
        &self,
        user: &UserId,
        bucket: PointsBucket,
    ) -> Result<BTreeMap<String, i64>, EngineError> {
        Ok(self.store.list_points(user, bucket).await?)
    }
}

#[cfg(test)]
mod tests {
    use chrono::FixedOffset;

    use super::*;
    use crate::MemoryStore;

    #[test]
    fn extract_keywords_drops_stopwords_and_numbers() {
        assert_eq!(
            extract_keywords("The 3 best Tacos in Austin, and the tacos I'm eating!"),
            vec!["best", "tacos", "austin", "eating"]
        );
    }

    #[test]
    fn extract_keywords_keeps_apostrophe_words_whole() {
        assert_eq!(extract_keywords("Don't stop"), vec!["don't", "stop"]);
        assert!(extract_keywords("1999 2024").is_empty());
        assert!(extract_keywords("").is_empty());
    }

    #[tokio::test]
    async fn repeated_keyword_earns_once_per_sentence() {
        let store = MemoryStore::new();
        let engine = Engine::new(store.clone(), FixedOffset::east_opt(0).unwrap());
        let user = UserId::from("kw@example.com");

        let keywords = engine
            .award_keyword_points(&user, "Jazz night, jazz forever", 2)
            .await
            .unwrap();
        assert_eq!(keywords, vec!["jazz", "night", "forever"]);

        let totals = store.points(&user, PointsBucket::Keywords).await;
        assert_eq!(totals.get("jazz"), Some(&2));
        assert_eq!(totals.get("night"), Some(&2));

        engine.award_keyword_points(&user, "jazz jazz", 5).await.unwrap();
        let totals = engine.list_points(&user, PointsBucket::Keywords).await.unwrap();
        assert_eq!(totals.get("jazz"), Some(&7));
    }

    #[tokio::test]
    async fn list_points_reads_one_bucket() {
        let store = MemoryStore::new();
        let engine = Engine::new(store.clone(), FixedOffset::east_opt(0).unwrap());
        let user = UserId::from("lp@example.com");

        engine.award_genre_points(&user, "film", 4).await.unwrap();
        engine.award_keyword_points(&user, "popcorn", 1).await.unwrap();

        let genres = engine.list_points(&user, PointsBucket::Genre).await.unwrap();
        assert_eq!(genres.into_iter().collect::<Vec<_>>(), vec![("film".to_string(), 4)]);

        store.fail_operation("list_points").await;
        let err = engine.list_points(&user, PointsBucket::Genre).await.unwrap_err();
        assert!(matches!(err, EngineError::DataSourceUnavailable(_)));
    }

    #[tokio::test]
    async fn genre_points_accumulate() {
        let store = MemoryStore::new();
        let engine = Engine::new(store.clone(), FixedOffset::east_opt(0).unwrap());
        let user = UserId::from("genre@example.com");

        engine.award_genre_points(&user, "music", 5).await.unwrap();
        engine.award_genre_points(&user, "music", 3).await.unwrap();
        assert!(engine.award_genre_points(&user, " ", 3).await.is_err());

        let totals = store.points(&user, PointsBucket::Genre).await;
        assert_eq!(totals.get("music"), Some(&8));
        assert_eq!(totals.len(), 1);
    }
}
