//! Beat data model and field coercion.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Serialize, Serializer};
use std::fmt;

lazy_static! {
    static ref BPM_RANGE_RE: Regex =
        Regex::new(r"(\d{2,3})\s*(?:-|–|to)\s*(\d{2,3})").expect("valid bpm range regex");
    static ref BPM_SINGLE_RE: Regex = Regex::new(r"(\d{2,3})").expect("valid bpm regex");
}

/// Tolerance applied around a single BPM value ("120 BPM" -> 110-130).
const SINGLE_BPM_TOLERANCE: f64 = 10.0;
/// BPM values outside this window are treated as noise in model output.
const PLAUSIBLE_BPM: (f64, f64) = (40.0, 220.0);

pub const DEFAULT_MOOD: &str = "calm";
pub const DEFAULT_GENRE: &str = "ambient";

/// Energy level of a beat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EnergyLevel {
    Low,
    Medium,
    High,
    Intense,
}

impl EnergyLevel {
    pub const ALL: [EnergyLevel; 4] = [
        EnergyLevel::Low,
        EnergyLevel::Medium,
        EnergyLevel::High,
        EnergyLevel::Intense,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EnergyLevel::Low => "low",
            EnergyLevel::Medium => "medium",
            EnergyLevel::High => "high",
            EnergyLevel::Intense => "intense",
        }
    }

    /// Recognize an energy label in free text. Returns `None` when nothing
    /// in the vocabulary matches.
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim().to_lowercase();
        if label.is_empty() {
            return None;
        }

        const INTENSE: &[&str] = &[
            "intense", "very high", "explosive", "extreme", "frantic", "maximum", "chaotic",
        ];
        const HIGH: &[&str] = &["high", "energetic", "strong", "powerful", "lively"];
        const MEDIUM: &[&str] = &["medium", "moderate", "mid", "balanced", "steady"];
        const LOW: &[&str] = &["low", "soft", "gentle", "quiet", "calm", "subdued", "minimal"];

        let contains_any = |words: &[&str]| words.iter().any(|w| label.contains(w));

        if contains_any(INTENSE) {
            Some(EnergyLevel::Intense)
        } else if contains_any(HIGH) {
            Some(EnergyLevel::High)
        } else if contains_any(MEDIUM) {
            Some(EnergyLevel::Medium)
        } else if contains_any(LOW) {
            Some(EnergyLevel::Low)
        } else {
            None
        }
    }

    /// Coerce a label to an energy level, inferring from tempo when the
    /// label is outside the vocabulary.
    pub fn coerce(label: Option<&str>, tempo: Tempo) -> Self {
        if let Some(level) = label.and_then(Self::from_label) {
            return level;
        }
        match tempo.word() {
            "slow" => EnergyLevel::Low,
            "fast" => EnergyLevel::High,
            _ => EnergyLevel::Medium,
        }
    }

    /// BPM range a track should fall into for this energy level.
    pub fn ideal_bpm_range(&self) -> BpmRange {
        match self {
            EnergyLevel::Low => BpmRange::new(60.0, 90.0),
            EnergyLevel::Medium => BpmRange::new(90.0, 120.0),
            EnergyLevel::High => BpmRange::new(120.0, 150.0),
            EnergyLevel::Intense => BpmRange::new(140.0, 180.0),
        }
    }

    /// Band of the enrichment "energy" attribute (0-100) for this level.
    pub fn energy_band(&self) -> (f64, f64) {
        match self {
            EnergyLevel::Low => (0.0, 40.0),
            EnergyLevel::Medium => (30.0, 65.0),
            EnergyLevel::High => (60.0, 85.0),
            EnergyLevel::Intense => (75.0, 100.0),
        }
    }
}

impl fmt::Display for EnergyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inclusive BPM range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BpmRange {
    pub min: f64,
    pub max: f64,
}

impl BpmRange {
    pub fn new(a: f64, b: f64) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    pub fn contains(&self, bpm: f64) -> bool {
        bpm >= self.min && bpm <= self.max
    }

    /// Distance from the nearest edge; zero inside the range.
    pub fn distance(&self, bpm: f64) -> f64 {
        if bpm < self.min {
            self.min - bpm
        } else if bpm > self.max {
            bpm - self.max
        } else {
            0.0
        }
    }

    pub fn midpoint(&self) -> f64 {
        (self.min + self.max) / 2.0
    }
}

/// Target tempo of a beat, either a coarse word or an explicit BPM range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Tempo {
    Slow,
    Medium,
    Fast,
    Bpm(BpmRange),
}

impl Tempo {
    /// Recognize a tempo in free text ("slow", "moderate", "90-110 BPM").
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim().to_lowercase();
        if label.is_empty() {
            return None;
        }

        if let Some(caps) = BPM_RANGE_RE.captures(&label) {
            let a: f64 = caps[1].parse().ok()?;
            let b: f64 = caps[2].parse().ok()?;
            if is_plausible_bpm(a) && is_plausible_bpm(b) {
                return Some(Tempo::Bpm(BpmRange::new(a, b)));
            }
        }
        if let Some(caps) = BPM_SINGLE_RE.captures(&label) {
            let bpm: f64 = caps[1].parse().ok()?;
            if is_plausible_bpm(bpm) {
                return Some(Tempo::Bpm(BpmRange::new(
                    bpm - SINGLE_BPM_TOLERANCE,
                    bpm + SINGLE_BPM_TOLERANCE,
                )));
            }
        }

        const SLOW: &[&str] = &["slow", "ballad", "languid", "adagio", "largo", "calm"];
        const FAST: &[&str] = &["fast", "upbeat", "quick", "rapid", "driving", "allegro", "presto"];
        const MEDIUM: &[&str] = &["medium", "moderate", "mid", "andante", "steady"];

        let contains_any = |words: &[&str]| words.iter().any(|w| label.contains(w));

        if contains_any(SLOW) {
            Some(Tempo::Slow)
        } else if contains_any(FAST) {
            Some(Tempo::Fast)
        } else if contains_any(MEDIUM) {
            Some(Tempo::Medium)
        } else {
            None
        }
    }

    /// Coerce a label to a tempo, falling back to `Slow`.
    pub fn coerce(label: Option<&str>) -> Self {
        label.and_then(Self::from_label).unwrap_or(Tempo::Slow)
    }

    /// Coarse tempo word, used in search queries.
    pub fn word(&self) -> &'static str {
        match self {
            Tempo::Slow => "slow",
            Tempo::Medium => "medium",
            Tempo::Fast => "fast",
            Tempo::Bpm(range) => {
                let mid = range.midpoint();
                if mid < 90.0 {
                    "slow"
                } else if mid < 120.0 {
                    "medium"
                } else {
                    "fast"
                }
            }
        }
    }

    /// Explicit BPM range, if the model gave one.
    pub fn bpm_range(&self) -> Option<BpmRange> {
        match self {
            Tempo::Bpm(range) => Some(*range),
            _ => None,
        }
    }
}

fn is_plausible_bpm(bpm: f64) -> bool {
    bpm >= PLAUSIBLE_BPM.0 && bpm <= PLAUSIBLE_BPM.1
}

impl fmt::Display for Tempo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tempo::Bpm(range) => write!(f, "{:.0}-{:.0} BPM", range.min, range.max),
            other => f.write_str(other.word()),
        }
    }
}

impl Serialize for Tempo {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A single narrative/emotional segment of a title's story.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Beat {
    #[serde(rename = "beat")]
    pub description: String,
    pub mood: String,
    pub genre: String,
    pub energy: EnergyLevel,
    pub tempo: Tempo,
    pub keywords: Vec<String>,
}

impl Beat {
    pub fn new(
        description: impl Into<String>,
        mood: impl Into<String>,
        genre: impl Into<String>,
        energy: EnergyLevel,
        tempo: Tempo,
    ) -> Self {
        Self {
            description: description.into(),
            mood: mood.into(),
            genre: genre.into(),
            energy,
            tempo,
            keywords: Vec::new(),
        }
    }

    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    /// Target BPM range: the explicit tempo range if present, otherwise the
    /// ideal range of the energy level.
    pub fn target_bpm_range(&self) -> BpmRange {
        self.tempo
            .bpm_range()
            .unwrap_or_else(|| self.energy.ideal_bpm_range())
    }
}

/// Normalize a free-text mood or genre: trimmed, lowercase, markdown and
/// trailing punctuation removed, falling back to `default` when empty.
pub fn normalize_label(value: Option<&str>, default: &str) -> String {
    let cleaned = strip_markup(value.unwrap_or_default()).to_lowercase();
    if cleaned.is_empty() {
        default.to_string()
    } else {
        cleaned
    }
}

/// Trims emphasis markers, quotes and trailing punctuation in any nesting,
/// e.g. `**Jazz**.` or `"*noir*",`.
pub(crate) fn strip_markup(value: &str) -> &str {
    let mut current = value;
    loop {
        let next = current
            .trim_matches(|c: char| {
                c == '*' || c == '_' || c == '"' || c == '`' || c.is_whitespace()
            })
            .trim_end_matches(|c: char| c == '.' || c == ',' || c == ';');
        if next.len() == current.len() {
            return next;
        }
        current = next;
    }
}
