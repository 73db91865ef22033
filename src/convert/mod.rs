use std::fmt;
use std::str::FromStr;

use miette::Diagnostic;
use mime::Mime;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::timedtext::{self, Cue, TimedTextError};

pub mod timestamp;

use timestamp::Timestamp;

static TEXT_VTT: Lazy<Mime> = Lazy::new(|| "text/vtt; charset=utf-8".parse().unwrap());
static TEXT_SRT: Lazy<Mime> = Lazy::new(|| "text/srt; charset=utf-8".parse().unwrap());

/// Errors that happened during format conversions.
#[derive(Debug, Error, Diagnostic, PartialEq, Eq)]
pub enum ConvertError {
    #[error("Subtitle format '{0}' is not supported.")]
    #[diagnostic(help("Supported formats are vtt, srt and txt."))]
    UnsupportedFormat(String),

    #[error("The transcript is empty.")]
    EmptyTranscript,

    #[error("Caption track is malformed: {0}")]
    MalformedTimedText(String),
}

impl From<TimedTextError> for ConvertError {
    fn from(e: TimedTextError) -> Self {
        match e {
            TimedTextError::EmptyTranscript => ConvertError::EmptyTranscript,
            TimedTextError::MalformedTimedText(s) => ConvertError::MalformedTimedText(s),
        }
    }
}

/// Output subtitle formats.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// WebVTT.
    #[default]
    Vtt,
    /// SubRip.
    Srt,
    /// Plain text, one cue per line.
    Txt,
}

impl Format {
    /// File extension, without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Format::Vtt => "vtt",
            Format::Srt => "srt",
            Format::Txt => "txt",
        }
    }

    pub fn mime(&self) -> Mime {
        match self {
            Format::Vtt => TEXT_VTT.clone(),
            Format::Srt => TEXT_SRT.clone(),
            Format::Txt => mime::TEXT_PLAIN_UTF_8,
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for Format {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "vtt" => Ok(Format::Vtt),
            "srt" => Ok(Format::Srt),
            "txt" => Ok(Format::Txt),
            _ => Err(ConvertError::UnsupportedFormat(s.to_string())),
        }
    }
}

/// Convert raw timed-text payload into subtitles of given `format`.
pub fn convert(raw: &str, format: &str) -> Result<String, ConvertError> {
    let format = format.parse::<Format>()?;
    let cues = timedtext::parse(raw)?;

    serialize(&cues, format)
}

/// Render `cues` in given `format`.
pub fn serialize(cues: &[Cue], format: Format) -> Result<String, ConvertError> {
    if cues.is_empty() {
        return Err(ConvertError::EmptyTranscript);
    }

    let out = match format {
        Format::Vtt => format!("WEBVTT\n\n{}", blocks(cues, '.')),
        Format::Srt => blocks(cues, ','),
        Format::Txt => cues.iter().map(|cue| format!("{}\n", cue.text)).collect(),
    };

    Ok(out)
}

/// Numbered cue blocks shared by WebVTT and SubRip.
fn blocks(cues: &[Cue], separator: char) -> String {
    cues.iter()
        .enumerate()
        .map(|(i, cue)| {
            format!(
                "{}\n{} --> {}\n{}\n\n",
                i + 1,
                Timestamp::from_seconds(cue.start_seconds).display(separator),
                Timestamp::from_seconds(cue.end_seconds()).display(separator),
                cue.text
            )
        })
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;

    fn cue(index: usize, start: f64, duration: f64, text: &str) -> Cue {
        Cue {
            index,
            start_seconds: start,
            duration_seconds: duration,
            text: text.to_string(),
        }
    }

    const PAYLOAD: &str = r#"<?xml version="1.0" encoding="utf-8" ?><transcript><text start="0" dur="2">Hi</text><text start="2" dur="3">There</text></transcript>"#;

    #[test]
    fn srt() {
        assert_eq!(
            convert(PAYLOAD, "srt").unwrap(),
            "1\n00:00:00,000 --> 00:00:02,000\nHi\n\n2\n00:00:02,000 --> 00:00:05,000\nThere\n\n"
        );
    }

    #[test]
    fn vtt() {
        assert_eq!(
            convert(PAYLOAD, "vtt").unwrap(),
            "WEBVTT\n\n1\n00:00:00.000 --> 00:00:02.000\nHi\n\n2\n00:00:02.000 --> 00:00:05.000\nThere\n\n"
        );
    }

    #[test]
    fn txt() {
        let cues = [cue(1, 0.0, 1.0, "Hello"), cue(2, 1.0, 1.0, "World")];
        assert_eq!(serialize(&cues, Format::Txt).unwrap(), "Hello\nWorld\n");
    }

    #[test]
    fn zero_duration_cue() {
        let out = serialize(&[cue(1, 3661.25, 0.0, "x")], Format::Vtt).unwrap();
        assert!(out.contains("01:01:01.250 --> 01:01:01.250\n"));

        let out = serialize(&[cue(1, 3661.25, 0.0, "x")], Format::Srt).unwrap();
        assert!(out.starts_with("1\n01:01:01,250 --> 01:01:01,250\n"));
    }

    #[test]
    fn vtt_blocks_keep_texts_in_order() {
        let texts = ["one", "two & three", "four", "it's five"];
        let cues: Vec<_> = texts
            .iter()
            .enumerate()
            .map(|(i, t)| cue(i + 1, i as f64 * 1.5, 1.5, t))
            .collect();

        let out = serialize(&cues, Format::Vtt).unwrap();
        let body = out.strip_prefix("WEBVTT\n\n").unwrap();

        let blocks: Vec<_> = body
            .split("\n\n")
            .filter(|b| !b.is_empty())
            .map(|b| b.lines().collect::<Vec<_>>())
            .collect();

        assert_eq!(blocks.len(), texts.len());
        for (i, block) in blocks.iter().enumerate() {
            assert_eq!(block[0], (i + 1).to_string());
            assert!(block[1].contains(" --> "));
            assert_eq!(block[2], texts[i]);
        }
    }

    #[test]
    fn single_cue_in_every_format() {
        let cues = [cue(7, 0.5, 1.0, "Only")];

        assert_eq!(
            serialize(&cues, Format::Vtt).unwrap(),
            "WEBVTT\n\n1\n00:00:00.500 --> 00:00:01.500\nOnly\n\n"
        );
        assert_eq!(
            serialize(&cues, Format::Srt).unwrap(),
            "1\n00:00:00,500 --> 00:00:01,500\nOnly\n\n"
        );
        assert_eq!(serialize(&cues, Format::Txt).unwrap(), "Only\n");
    }

    #[test]
    fn empty_transcript() {
        for format in [Format::Vtt, Format::Srt, Format::Txt] {
            assert_eq!(serialize(&[], format), Err(ConvertError::EmptyTranscript));
        }
        for format in ["vtt", "srt", "txt"] {
            assert_eq!(
                convert("<transcript></transcript>", format),
                Err(ConvertError::EmptyTranscript)
            );
        }
    }

    #[test]
    fn unsupported_format() {
        assert_eq!(
            convert(PAYLOAD, "ass"),
            Err(ConvertError::UnsupportedFormat("ass".to_string()))
        );
        assert_eq!(
            convert("", "ass"),
            Err(ConvertError::UnsupportedFormat("ass".to_string()))
        );
        assert!(matches!(
            convert("<text>x</text>", "sub"),
            Err(ConvertError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn malformed_payload() {
        assert!(matches!(
            convert(r#"<text start="x">a</text>"#, "srt"),
            Err(ConvertError::MalformedTimedText(_))
        ));
    }

    #[test]
    fn format_names() {
        assert_eq!(" SRT".parse::<Format>(), Ok(Format::Srt));
        assert_eq!(Format::Txt.to_string(), "txt");
        assert_eq!(Format::Vtt.mime().essence_str(), "text/vtt");
        assert_eq!(Format::Txt.mime(), mime::TEXT_PLAIN_UTF_8);
    }

    #[test]
    fn format_serde() {
        use serde_test::{assert_tokens, Token};

        assert_tokens(
            &Format::Srt,
            &[Token::UnitVariant {
                name: "Format",
                variant: "srt",
            }],
        );
    }
}
