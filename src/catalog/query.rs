//! Query strategies: the ordered ways of turning a beat into search text.

use crate::beats::vocabulary::{energy_qualifiers, mood_synonyms};
use crate::beats::Beat;
use serde::{Deserialize, Serialize};
use std::fmt;

const MAX_SYNONYM_QUERIES: usize = 2;
const MAX_DIRECT_KEYWORDS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryStrategy {
    /// `"{genre} {mood} {tempo}"` plus keywords.
    Direct,
    /// `"{synonym} {genre}"` for a couple of mood synonyms.
    SynonymExpanded,
    /// `genre:{genre}` filter with energy words.
    GenreQualified,
    /// Broad soundtrack-style queries.
    GenericFallback,
}

impl QueryStrategy {
    pub const DEFAULT_ORDER: [QueryStrategy; 4] = [
        QueryStrategy::Direct,
        QueryStrategy::SynonymExpanded,
        QueryStrategy::GenreQualified,
        QueryStrategy::GenericFallback,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QueryStrategy::Direct => "direct",
            QueryStrategy::SynonymExpanded => "synonym_expanded",
            QueryStrategy::GenreQualified => "genre_qualified",
            QueryStrategy::GenericFallback => "generic_fallback",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::DEFAULT_ORDER
            .into_iter()
            .find(|s| s.as_str().eq_ignore_ascii_case(name.trim()))
    }

    /// Query strings for a beat. Empty when the strategy has nothing to say
    /// (e.g. no synonyms for the mood).
    pub fn queries(&self, beat: &Beat) -> Vec<String> {
        let qualifiers = energy_qualifiers(beat.energy);
        let queries = match self {
            QueryStrategy::Direct => {
                let mut parts = vec![
                    beat.genre.clone(),
                    beat.mood.clone(),
                    beat.tempo.word().to_string(),
                ];
                parts.extend(beat.keywords.iter().take(MAX_DIRECT_KEYWORDS).cloned());
                vec![parts.join(" ")]
            }
            QueryStrategy::SynonymExpanded => mood_synonyms(&beat.mood)
                .into_iter()
                .take(MAX_SYNONYM_QUERIES)
                .map(|synonym| format!("{} {}", synonym, beat.genre))
                .collect(),
            QueryStrategy::GenreQualified => {
                vec![format!(
                    "genre:{} {}",
                    genre_filter(&beat.genre),
                    qualifiers.join(" ")
                )]
            }
            QueryStrategy::GenericFallback => {
                let mut queries = vec![format!("{} soundtrack", beat.mood)];
                if let Some(qualifier) = qualifiers.first() {
                    queries.push(format!("cinematic {}", qualifier));
                }
                queries
            }
        };

        queries
            .into_iter()
            .map(|q| q.split_whitespace().collect::<Vec<_>>().join(" "))
            .filter(|q| !q.is_empty())
            .collect()
    }
}

fn genre_filter(genre: &str) -> String {
    if genre.contains(char::is_whitespace) {
        format!("\"{}\"", genre)
    } else {
        genre.to_string()
    }
}

impl fmt::Display for QueryStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::beats::{EnergyLevel, Tempo};

    fn beat() -> Beat {
        Beat::new("Chase", "tense", "electronic", EnergyLevel::High, Tempo::Fast)
            .with_keywords(["night", "city", "neon"])
    }

    #[test]
    fn direct_query() {
        assert_eq!(
            QueryStrategy::Direct.queries(&beat()),
            vec!["electronic tense fast night city"]
        );
    }

    #[test]
    fn synonym_queries_are_capped() {
        let queries = QueryStrategy::SynonymExpanded.queries(&beat());
        assert_eq!(queries.len(), 2);
        assert!(queries.iter().all(|q| q.ends_with(" electronic")));
    }

    #[test]
    fn synonym_queries_empty_for_unknown_mood() {
        let beat = Beat::new("x", "quixotic", "folk", EnergyLevel::Low, Tempo::Slow);
        assert!(QueryStrategy::SynonymExpanded.queries(&beat).is_empty());
    }

    #[test]
    fn genre_qualified_quotes_multiword_genres() {
        assert_eq!(
            QueryStrategy::GenreQualified.queries(&beat()),
            vec!["genre:electronic upbeat energetic"]
        );
        let beat = Beat::new("x", "dark", "dark ambient", EnergyLevel::Low, Tempo::Slow);
        assert_eq!(
            QueryStrategy::GenreQualified.queries(&beat),
            vec!["genre:\"dark ambient\" calm soft"]
        );
    }

    #[test]
    fn generic_fallback_queries() {
        assert_eq!(
            QueryStrategy::GenericFallback.queries(&beat()),
            vec!["tense soundtrack", "cinematic upbeat"]
        );
    }

    #[test]
    fn strategies_deserialize_from_snake_case() {
        let parsed: Vec<QueryStrategy> =
            serde_json::from_str(r#"["generic_fallback", "direct"]"#).unwrap();
        assert_eq!(
            parsed,
            vec![QueryStrategy::GenericFallback, QueryStrategy::Direct]
        );
        assert_eq!(QueryStrategy::SynonymExpanded.to_string(), "synonym_expanded");
        assert_eq!(
            QueryStrategy::from_name("Genre_Qualified"),
            Some(QueryStrategy::GenreQualified)
        );
        assert_eq!(QueryStrategy::from_name("random"), None);
    }
}
