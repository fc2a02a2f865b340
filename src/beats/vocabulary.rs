//! Small mood/energy vocabulary shared by query generation and scoring.

use super::models::EnergyLevel;

const MOOD_SYNONYMS: &[(&str, &[&str])] = &[
    ("sad", &["melancholy", "somber", "heartbreak"]),
    ("melancholy", &["sad", "wistful", "somber"]),
    ("happy", &["joyful", "uplifting", "cheerful"]),
    ("joyful", &["happy", "uplifting", "bright"]),
    ("calm", &["peaceful", "serene", "tranquil"]),
    ("peaceful", &["calm", "serene", "gentle"]),
    ("tense", &["suspense", "ominous", "dark"]),
    ("suspense", &["tense", "ominous", "thriller"]),
    ("dark", &["ominous", "brooding", "haunting"]),
    ("romantic", &["love", "tender", "intimate"]),
    ("epic", &["heroic", "triumphant", "powerful"]),
    ("triumphant", &["victorious", "heroic", "anthem"]),
    ("hopeful", &["uplifting", "inspiring", "optimistic"]),
    ("angry", &["aggressive", "furious", "rage"]),
    ("mysterious", &["enigmatic", "eerie", "haunting"]),
    ("eerie", &["creepy", "haunting", "unsettling"]),
    ("nostalgic", &["wistful", "bittersweet", "memories"]),
    ("energetic", &["upbeat", "driving", "pumped"]),
    ("lonely", &["isolated", "solitude", "empty"]),
    ("dreamy", &["ethereal", "floating", "hazy"]),
];

/// Synonyms for a mood. A mood matches a table entry when either contains
/// the other ("suspenseful" matches "suspense").
pub fn mood_synonyms(mood: &str) -> Vec<&'static str> {
    let mood = mood.trim().to_lowercase();
    if mood.is_empty() {
        return Vec::new();
    }

    let mut synonyms = Vec::new();
    for (key, words) in MOOD_SYNONYMS {
        if mood.contains(key) || key.contains(mood.as_str()) {
            for word in words.iter() {
                if !synonyms.contains(word) && *word != mood {
                    synonyms.push(*word);
                }
            }
        }
    }
    synonyms
}

/// Descriptive words for an energy level, used in catalog queries.
pub fn energy_qualifiers(energy: EnergyLevel) -> &'static [&'static str] {
    match energy {
        EnergyLevel::Low => &["calm", "soft"],
        EnergyLevel::Medium => &["mellow", "groove"],
        EnergyLevel::High => &["upbeat", "energetic"],
        EnergyLevel::Intense => &["epic", "powerful"],
    }
}

/// Words suggesting a track belongs to a score or soundtrack.
pub const CINEMATIC_WORDS: &[&str] = &[
    "soundtrack",
    "score",
    "theme",
    "cinematic",
    "motion picture",
    "original",
    "ost",
    "suite",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synonyms_match_by_containment() {
        let synonyms = mood_synonyms("Suspenseful");
        assert!(synonyms.contains(&"ominous"));
        assert!(synonyms.contains(&"tense"));
    }

    #[test]
    fn synonyms_are_unique() {
        let synonyms = mood_synonyms("sad melancholy");
        let mut deduped = synonyms.clone();
        deduped.dedup();
        assert_eq!(synonyms.len(), deduped.len());
        assert!(!synonyms.is_empty());
    }

    #[test]
    fn unknown_mood_has_no_synonyms() {
        assert!(mood_synonyms("quixotic").is_empty());
        assert!(mood_synonyms("").is_empty());
    }

    #[test]
    fn every_energy_level_has_qualifiers() {
        for level in EnergyLevel::ALL {
            assert!(!energy_qualifiers(level).is_empty());
        }
    }
}
