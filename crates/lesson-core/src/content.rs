//! Lesson content shaping: JSON items into playable entries.
//!
//! Two item shapes are accepted:
//! - `{id?, text, audio}`: one segment.
//! - `{id?, text_a, audio_a, text_b, audio_b, ...}`: variant lines played in
//!   suffix order as one entry.
//!
//! Segments without both text and audio are dropped, and so are entries that
//! end up with no segments, so the sequencer never sees unplayable content.

use crate::gap::PlaybackMode;
use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use tracing::{debug, info};
use unicode_normalization::UnicodeNormalization;

static RE_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub text: String,
    pub audio_url: String,
}

impl Segment {
    pub fn new(text: impl Into<String>, audio_url: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            audio_url: audio_url.into(),
        }
    }
}

/// One playable unit: a sentence, a dialogue line, a card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub id: String,
    pub segments: Vec<Segment>,
}

impl Entry {
    pub fn single(id: impl Into<String>, text: impl Into<String>, audio_url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            segments: vec![Segment::new(text, audio_url)],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Lesson {
    pub title: Option<String>,
    pub mode: Option<PlaybackMode>,
    pub repeat_pause_ms: Option<u64>,
    pub entries: Vec<Entry>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LessonDocument {
    Items(Vec<Map<String, Value>>),
    Document {
        #[serde(default)]
        title: Option<String>,
        #[serde(default)]
        mode: Option<PlaybackMode>,
        #[serde(default)]
        repeat_pause_ms: Option<u64>,
        items: Vec<Map<String, Value>>,
    },
}

pub fn load_lesson(path: &Path) -> Result<Lesson> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Reading lesson file {}", path.display()))?;
    let lesson =
        parse_lesson(&raw).with_context(|| format!("Parsing lesson file {}", path.display()))?;
    info!(
        path = %path.display(),
        entries = lesson.entries.len(),
        mode = ?lesson.mode,
        "Loaded lesson"
    );
    Ok(lesson)
}

pub fn parse_lesson(raw: &str) -> Result<Lesson> {
    let document: LessonDocument =
        serde_json::from_str(raw).context("Lesson JSON must be an item array or an object with `items`")?;
    let lesson = match document {
        LessonDocument::Items(items) => Lesson {
            title: None,
            mode: None,
            repeat_pause_ms: None,
            entries: build_entries(&items),
        },
        LessonDocument::Document {
            title,
            mode,
            repeat_pause_ms,
            items,
        } => Lesson {
            title: title.map(|t| normalize_text(&t)).filter(|t| !t.is_empty()),
            mode,
            repeat_pause_ms,
            entries: build_entries(&items),
        },
    };
    Ok(lesson)
}

/// Turn raw lesson items into entries, dropping anything unplayable.
pub fn build_entries(items: &[Map<String, Value>]) -> Vec<Entry> {
    let entries: Vec<Entry> = items
        .iter()
        .enumerate()
        .filter_map(|(idx, item)| build_entry(idx, item))
        .collect();
    debug!(
        items = items.len(),
        entries = entries.len(),
        dropped = items.len().saturating_sub(entries.len()),
        "Normalized lesson items"
    );
    entries
}

fn build_entry(idx: usize, item: &Map<String, Value>) -> Option<Entry> {
    let id = item
        .get("id")
        .and_then(value_as_text)
        .map(|id| normalize_text(&id))
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| format!("entry-{}", idx + 1));

    let segments: Vec<Segment> = if item.contains_key("text") || item.contains_key("audio") {
        segment_from(item.get("text"), item.get("audio").or_else(|| item.get("audio_url")))
            .into_iter()
            .collect()
    } else {
        variant_suffixes(item)
            .into_iter()
            .filter_map(|suffix| {
                segment_from(
                    item.get(&format!("text_{suffix}")),
                    item.get(&format!("audio_{suffix}")),
                )
            })
            .collect()
    };

    if segments.is_empty() {
        debug!(id = %id, "Dropping lesson item without playable text and audio");
        return None;
    }
    Some(Entry { id, segments })
}

fn variant_suffixes(item: &Map<String, Value>) -> Vec<String> {
    let suffixes: BTreeSet<(usize, String)> = item
        .keys()
        .filter_map(|key| {
            key.strip_prefix("text_")
                .or_else(|| key.strip_prefix("audio_"))
                .filter(|suffix| !suffix.is_empty() && *suffix != "url")
        })
        .map(|suffix| (suffix.len(), suffix.to_string()))
        .collect();
    suffixes.into_iter().map(|(_, suffix)| suffix).collect()
}

fn segment_from(text: Option<&Value>, audio: Option<&Value>) -> Option<Segment> {
    let text = normalize_text(&text.and_then(value_as_text)?);
    let audio_url = audio.and_then(value_as_text)?.trim().to_string();
    if text.is_empty() || audio_url.is_empty() {
        return None;
    }
    Some(Segment { text, audio_url })
}

fn value_as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// NFC, single spaces, trimmed.
pub fn normalize_text(text: &str) -> String {
    let composed: String = text.nfc().collect();
    RE_WHITESPACE.replace_all(&composed, " ").trim().to_string()
}

/// Comparison form for typed or assembled answers: compatibility-folded,
/// lowercase, punctuation removed.
pub fn normalize_answer(text: &str) -> String {
    let folded: String = text
        .nfkc()
        .flat_map(char::to_lowercase)
        .map(|ch| if ch.is_alphanumeric() { ch } else { ' ' })
        .collect();
    RE_WHITESPACE.replace_all(&folded, " ").trim().to_string()
}

pub fn answers_match(given: &str, expected: &str) -> bool {
    let expected = normalize_answer(expected);
    !expected.is_empty() && normalize_answer(given) == expected
}
