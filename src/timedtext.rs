//! Parser of the timed-text payload served for caption tracks.
//!
//! The payload is a small XML document:
//!
//! ```xml
//! <transcript>
//!   <text start="0" dur="2.5">Hello &amp;amp; welcome</text>
//!   ...
//! </transcript>
//! ```

use miette::Diagnostic;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use thiserror::Error;

static TEXT_OPEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"<text[\s/>]").unwrap());

static TEXT_ELEMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)<text((?:\s+[^\s=/>]+\s*=\s*(?:"[^"]*"|'[^']*'))*)\s*(?:/>|>(.*?)</text\s*>)"#)
        .unwrap()
});

static ATTRIBUTE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"([^\s=/>]+)\s*=\s*(?:"([^"]*)"|'([^']*)')"#).unwrap());

static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());

#[derive(Debug, Error, Diagnostic, PartialEq, Eq)]
pub enum TimedTextError {
    #[error("The transcript is empty.")]
    EmptyTranscript,

    #[error("Caption track is malformed: {0}")]
    MalformedTimedText(String),
}

/// One timed caption unit.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Cue {
    /// Position in the track, starting from 1.
    pub index: usize,
    pub start_seconds: f64,
    pub duration_seconds: f64,
    /// Text with all entities decoded.
    pub text: String,
}

impl Cue {
    pub fn end_seconds(&self) -> f64 {
        self.start_seconds + self.duration_seconds
    }
}

/// Parse timed-text payload into cues, in the order they appear in the document.
pub fn parse(payload: &str) -> Result<Vec<Cue>, TimedTextError> {
    let cues = TEXT_ELEMENT
        .captures_iter(payload)
        .enumerate()
        .map(|(i, c)| {
            let index = i + 1;
            let attributes = c.get(1).map_or("", |m| m.as_str());
            let content = c.get(2).map_or("", |m| m.as_str());

            let start = match attribute(attributes, "start") {
                Some(s) => seconds(&s, index, "start")?,
                None => {
                    return Err(TimedTextError::MalformedTimedText(format!(
                        "cue {index} has no start time"
                    )))
                }
            };

            let duration = match attribute(attributes, "dur") {
                Some(s) => seconds(&s, index, "dur")?,
                None => 0.0,
            };

            Ok(Cue {
                index,
                start_seconds: start,
                duration_seconds: duration,
                text: text(content),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    if cues.len() != TEXT_OPEN.find_iter(payload).count() {
        return Err(TimedTextError::MalformedTimedText(
            "unterminated text element".to_string(),
        ));
    }

    if cues.is_empty() {
        Err(TimedTextError::EmptyTranscript)
    } else {
        Ok(cues)
    }
}

/// Value of attribute `name`, with entities decoded.
fn attribute(attributes: &str, name: &str) -> Option<String> {
    ATTRIBUTE
        .captures_iter(attributes)
        .find(|c| &c[1] == name)
        .and_then(|c| c.get(2).or_else(|| c.get(3)))
        .map(|m| html_escape::decode_html_entities(m.as_str()).into_owned())
}

fn seconds(value: &str, index: usize, name: &str) -> Result<f64, TimedTextError> {
    match value.trim().parse::<f64>() {
        Ok(s) if s.is_finite() && s >= 0.0 => Ok(s),
        _ => Err(TimedTextError::MalformedTimedText(format!(
            "cue {index} has invalid {name} '{value}'"
        ))),
    }
}

/// Plain text of an element. Entities are decoded once for the markup
/// itself and once more for the HTML escaping the platform applies on top.
fn text(content: &str) -> String {
    let stripped = TAG.replace_all(content, "");
    let unescaped = html_escape::decode_html_entities(&stripped);

    html_escape::decode_html_entities(&unescaped).into_owned()
}
