//! Tolerant parsers turning model output into beats.
//!
//! Parsers never reject a beat because of a bad field value: every field is
//! coerced (see [`Tempo::coerce`] and [`EnergyLevel::coerce`]). A parser
//! only fails when it finds no beat at all.

use super::models::{normalize_label, strip_markup, Beat, EnergyLevel, Tempo, DEFAULT_GENRE, DEFAULT_MOOD};
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value};
use thiserror::Error;

lazy_static! {
    static ref BEAT_HEADER_RE: Regex = Regex::new(
        r"(?im)^[ \t>#*_\-•]*(?:\d+[.)][ \t]*)?[*_]*beat(?:[ \t]*#?\d+)?[ \t]*[*_]*[ \t]*[:\-–.)][*_]*[ \t]*(.*)$"
    )
    .expect("valid beat header regex");
    static ref FIELD_RE: Regex = Regex::new(
        r"(?im)^[ \t>#*_\-•]*[*_]*(genre|mood|tempo|energy|keywords?|description)(?:[ \t]+level)?[*_]*[ \t]*[:\-–][*_]*[ \t]*(.*?)[ \t*_]*$"
    )
    .expect("valid beat field regex");
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BeatParseError {
    #[error("no JSON payload found")]
    NoPayload,
    #[error("invalid JSON: {0}")]
    InvalidJson(String),
    #[error("no beats found")]
    NoBeats,
}

/// Turns raw model output into a list of beats.
pub trait BeatParser: Send + Sync {
    fn name(&self) -> &'static str;

    /// Parse the content. `Ok` always carries at least one beat.
    fn parse(&self, content: &str) -> Result<Vec<Beat>, BeatParseError>;
}

/// Beat fields as found in the model output, before coercion.
#[derive(Debug, Default, Clone)]
struct RawBeat {
    description: Option<String>,
    mood: Option<String>,
    genre: Option<String>,
    energy: Option<String>,
    tempo: Option<String>,
    keywords: Vec<String>,
}

impl RawBeat {
    fn has_any_field(&self) -> bool {
        self.mood.is_some()
            || self.genre.is_some()
            || self.energy.is_some()
            || self.tempo.is_some()
            || !self.keywords.is_empty()
    }

    fn set_field(&mut self, label: &str, value: String) {
        let value = clean_text(&value);
        if value.is_empty() {
            return;
        }
        let slot = match label {
            "description" => &mut self.description,
            "mood" => &mut self.mood,
            "genre" => &mut self.genre,
            "energy" => &mut self.energy,
            "tempo" => &mut self.tempo,
            "keyword" | "keywords" => {
                self.keywords.extend(split_list(&value));
                return;
            }
            _ => return,
        };
        if slot.is_none() {
            *slot = Some(value);
        }
    }

    fn into_beat(self, index: usize) -> Beat {
        let tempo = Tempo::coerce(self.tempo.as_deref());
        let energy = EnergyLevel::coerce(self.energy.as_deref(), tempo);

        let (genre, extra_genres) = split_primary(self.genre.as_deref());
        let (mood, extra_moods) = split_primary(self.mood.as_deref());

        let mut keywords: Vec<String> = Vec::new();
        for keyword in self
            .keywords
            .iter()
            .map(String::as_str)
            .chain(extra_moods)
            .chain(extra_genres)
        {
            let keyword = normalize_label(Some(keyword), "");
            if !keyword.is_empty() && !keywords.contains(&keyword) {
                keywords.push(keyword);
            }
        }

        let description = self
            .description
            .map(|d| clean_text(&d))
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| format!("Beat {}", index + 1));

        Beat {
            description,
            mood: normalize_label(mood, DEFAULT_MOOD),
            genre: normalize_label(genre, DEFAULT_GENRE),
            energy,
            tempo,
            keywords,
        }
    }
}

/// Split "electronic, synthwave" into the primary value and the rest.
fn split_primary(value: Option<&str>) -> (Option<&str>, Vec<&str>) {
    let Some(value) = value else {
        return (None, Vec::new());
    };
    let mut parts = value
        .split(|c: char| c == ',' || c == '/' || c == ';')
        .map(str::trim)
        .filter(|p| !p.is_empty());
    let primary = parts.next();
    (primary, parts.collect())
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(|c: char| c == ',' || c == ';')
        .map(clean_text)
        .filter(|s| !s.is_empty())
        .collect()
}

fn clean_text(value: &str) -> String {
    strip_markup(value).to_string()
}

fn finish(raw: Vec<RawBeat>) -> Result<Vec<Beat>, BeatParseError> {
    if raw.is_empty() {
        return Err(BeatParseError::NoBeats);
    }
    Ok(raw
        .into_iter()
        .enumerate()
        .map(|(index, raw)| raw.into_beat(index))
        .collect())
}

/// Parses a JSON object `{"beats": [...]}` or a bare array of beat objects,
/// possibly wrapped in prose or code fences.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonBeatParser;

impl BeatParser for JsonBeatParser {
    fn name(&self) -> &'static str {
        "json"
    }

    fn parse(&self, content: &str) -> Result<Vec<Beat>, BeatParseError> {
        let payload = extract_json_payload(content).ok_or(BeatParseError::NoPayload)?;
        let value: Value = serde_json::from_str(payload)
            .map_err(|e| BeatParseError::InvalidJson(e.to_string()))?;

        let items = beat_items(&value).ok_or(BeatParseError::NoBeats)?;
        let raw = items
            .iter()
            .filter_map(|item| item.as_object())
            .map(raw_from_object)
            .filter(RawBeat::has_any_field)
            .collect();
        finish(raw)
    }
}

fn extract_json_payload(content: &str) -> Option<&str> {
    let start = content.find(|c: char| c == '{' || c == '[')?;
    let close = if content[start..].starts_with('{') {
        '}'
    } else {
        ']'
    };
    let end = content.rfind(close)?;
    (end > start).then(|| &content[start..=end])
}

fn normalize_key(key: &str) -> String {
    key.chars()
        .filter(|c| c.is_alphanumeric())
        .collect::<String>()
        .to_lowercase()
}

fn beat_items(value: &Value) -> Option<Vec<&Value>> {
    match value {
        Value::Array(items) => Some(items.iter().collect()),
        Value::Object(obj) => {
            const LIST_KEYS: &[&str] = &["beats", "storybeats", "emotionalbeats", "items"];
            let listed = obj
                .iter()
                .find(|(k, v)| LIST_KEYS.contains(&normalize_key(k).as_str()) && v.is_array())
                .or_else(|| {
                    obj.iter().find(|(_, v)| {
                        v.as_array()
                            .map(|a| a.iter().any(Value::is_object))
                            .unwrap_or(false)
                    })
                });
            match listed {
                Some((_, Value::Array(items))) => Some(items.iter().collect()),
                _ if raw_from_object(obj).has_any_field() => Some(vec![value]),
                _ => None,
            }
        }
        _ => None,
    }
}

fn raw_from_object(obj: &Map<String, Value>) -> RawBeat {
    let mut raw = RawBeat::default();
    for (key, value) in obj {
        let label = match normalize_key(key).as_str() {
            "description" | "beat" | "label" | "title" | "name" | "summary" | "scene" => {
                "description"
            }
            "mood" | "emotion" | "feeling" => "mood",
            "genre" | "genres" | "style" => "genre",
            "energy" | "energylevel" | "intensity" => "energy",
            "tempo" | "bpm" | "pace" => "tempo",
            "keywords" | "keyword" | "tags" => {
                raw.keywords.extend(value_list(value));
                continue;
            }
            _ => continue,
        };
        if let Some(text) = value_text(value) {
            raw.set_field(label, text);
        }
    }
    raw
}

fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(value_text).collect();
            (!parts.is_empty()).then(|| parts.join(", "))
        }
        _ => None,
    }
}

fn value_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(value_text)
            .map(|s| clean_text(&s))
            .filter(|s| !s.is_empty())
            .collect(),
        Value::String(s) => split_list(s),
        _ => Vec::new(),
    }
}

/// Parses prose in the `Beat: / Genre: / Mood: / Tempo:` layout. Labels can
/// be numbered, bulleted or bold, in any order and casing.
#[derive(Debug, Default, Clone, Copy)]
pub struct LineBeatParser;

impl BeatParser for LineBeatParser {
    fn name(&self) -> &'static str {
        "lines"
    }

    fn parse(&self, content: &str) -> Result<Vec<Beat>, BeatParseError> {
        let headers: Vec<(usize, usize, String)> = BEAT_HEADER_RE
            .captures_iter(content)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                let rest = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
                Some((whole.start(), whole.end(), rest.to_string()))
            })
            .collect();

        if headers.is_empty() {
            return finish(split_on_repeated_fields(content));
        }

        let raw = headers
            .iter()
            .enumerate()
            .map(|(i, (_, end, rest))| {
                let next_start = headers
                    .get(i + 1)
                    .map(|(start, _, _)| *start)
                    .unwrap_or(content.len());
                let mut raw = fields_from(&content[*end..next_start]);
                let heading = clean_text(rest);
                if !heading.is_empty() {
                    raw.description = Some(heading);
                }
                raw
            })
            .collect();
        finish(raw)
    }
}

fn fields_from(section: &str) -> RawBeat {
    let mut raw = RawBeat::default();
    for caps in FIELD_RE.captures_iter(section) {
        let label = caps[1].to_lowercase();
        raw.set_field(&label, caps[2].to_string());
    }
    raw
}

/// Without beat headings a new beat starts whenever a field label repeats.
fn split_on_repeated_fields(content: &str) -> Vec<RawBeat> {
    let mut beats = Vec::new();
    let mut current = RawBeat::default();
    let mut seen: Vec<String> = Vec::new();

    for caps in FIELD_RE.captures_iter(content) {
        let label = caps[1].to_lowercase();
        if seen.contains(&label) {
            beats.push(std::mem::take(&mut current));
            seen.clear();
        }
        seen.push(label.clone());
        current.set_field(&label, caps[2].to_string());
    }
    beats.push(current);

    beats.into_iter().filter(RawBeat::has_any_field).collect()
}
