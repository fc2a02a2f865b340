//! Story beats: the emotional segments of a film or show that drive the
//! per-beat music search.

mod defaults;
mod extractor;
mod models;
mod parser;
pub mod vocabulary;

pub use defaults::default_beats;
pub use extractor::{BeatExtraction, BeatExtractor, BeatSource, FallbackReason};
pub use models::{normalize_label, Beat, BpmRange, EnergyLevel, Tempo};
pub use parser::{BeatParseError, BeatParser, JsonBeatParser, LineBeatParser};
