//! Fixed beat list used when the model gives nothing usable.

use super::models::{Beat, EnergyLevel, Tempo};

pub fn default_beats() -> Vec<Beat> {
    vec![
        Beat::new(
            "Opening: the world of the story",
            "calm",
            "ambient",
            EnergyLevel::Low,
            Tempo::Slow,
        )
        .with_keywords(["atmospheric"]),
        Beat::new(
            "Rising tension",
            "suspenseful",
            "cinematic",
            EnergyLevel::Medium,
            Tempo::Medium,
        )
        .with_keywords(["tension"]),
        Beat::new(
            "Climax",
            "epic",
            "orchestral",
            EnergyLevel::Intense,
            Tempo::Fast,
        )
        .with_keywords(["dramatic"]),
        Beat::new(
            "Resolution",
            "hopeful",
            "piano",
            EnergyLevel::Low,
            Tempo::Slow,
        )
        .with_keywords(["reflective"]),
    ]
}
