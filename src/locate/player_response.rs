use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use super::*;
use crate::video::ORIGIN;

/// Finds caption tracks in the JSON object a watch page assigns to a global
/// variable. All three steps (variable, path to the track list and origin
/// for relative track URLs) are configurable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerResponse {
    /// Name of the variable the JSON object is assigned to.
    pub variable: String,
    /// JSON pointer to the array of caption tracks.
    pub tracks_pointer: String,
    /// Prefix of track URLs that do not carry scheme and host.
    pub origin: String,
}

impl Default for PlayerResponse {
    fn default() -> Self {
        PlayerResponse {
            variable: "ytInitialPlayerResponse".to_string(),
            tracks_pointer: "/captions/playerCaptionsTracklistRenderer/captionTracks".to_string(),
            origin: ORIGIN.to_string(),
        }
    }
}

/// Caption track as it appears in the page.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTrack {
    base_url: String,
    language_code: String,
    kind: Option<String>,
    name: Option<RawName>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawName {
    simple_text: Option<String>,
    #[serde(default)]
    runs: Vec<RawRun>,
}

#[derive(Deserialize)]
struct RawRun {
    text: String,
}

impl RawName {
    fn into_text(self) -> Option<String> {
        self.simple_text.or_else(|| {
            let s = self.runs.into_iter().map(|r| r.text).collect::<String>();
            Some(s).filter(|s| !s.is_empty())
        })
    }
}

impl PlayerResponse {
    /// Find the JSON object assigned to the configured variable and parse it.
    pub fn player_response(&self, html: &str) -> Result<Value, LocateError> {
        let assignment = Regex::new(&format!(r"{}\s*=\s*", regex::escape(&self.variable)))
            .map_err(|e| LocateError::MalformedMetadata(e.to_string()))?;

        let json = assignment
            .find_iter(html)
            .map(|m| &html[m.end()..])
            .find(|rest| rest.starts_with('{'))
            .ok_or(LocateError::MetadataNotFound)?;

        // Only the first JSON value is read, whatever follows the object is ignored.
        match serde_json::Deserializer::from_str(json)
            .into_iter::<Value>()
            .next()
        {
            Some(Ok(value)) => Ok(value),
            Some(Err(e)) => Err(LocateError::MalformedMetadata(e.to_string())),
            None => Err(LocateError::MetadataNotFound),
        }
    }

    /// Make track URL absolute.
    fn absolute_url(&self, url: &str) -> Result<String, LocateError> {
        Url::parse(&self.origin)
            .and_then(|origin| origin.join(url))
            .map(String::from)
            .map_err(|e| LocateError::MalformedMetadata(format!("track URL '{url}': {e}")))
    }

    fn track(&self, raw: RawTrack) -> Result<CaptionTrack, LocateError> {
        Ok(CaptionTrack {
            kind: match raw.kind.as_deref() {
                Some("asr") => Kind::Auto,
                _ => Kind::Manual,
            },
            language_code: raw.language_code,
            source_url: self.absolute_url(&raw.base_url)?,
            name: raw.name.and_then(RawName::into_text),
        })
    }
}

#[typetag::serde(name = "player_response")]
impl Locate for PlayerResponse {
    fn tracks(&self, html: &str) -> Result<Vec<CaptionTrack>, LocateError> {
        let response = self.player_response(html)?;

        let tracks = match response.pointer(&self.tracks_pointer) {
            None | Some(Value::Null) => return Err(LocateError::NoCaptionsAvailable),
            Some(Value::Array(tracks)) if tracks.is_empty() => {
                return Err(LocateError::NoCaptionsAvailable)
            }
            Some(Value::Array(tracks)) => tracks,
            Some(_) => {
                return Err(LocateError::MalformedMetadata(
                    "caption tracks are not a list".to_string(),
                ))
            }
        };

        // Unreadable entries are skipped so they cannot hide a usable neighbour.
        let mut last_error = None;
        let readable: Vec<_> = tracks
            .iter()
            .enumerate()
            .filter_map(|(i, t)| {
                match RawTrack::deserialize(t)
                    .map_err(|e| LocateError::MalformedMetadata(e.to_string()))
                    .and_then(|raw| self.track(raw))
                {
                    Ok(track) => Some(track),
                    Err(e) => {
                        log::debug!("Skipping caption track {i}: {e}");
                        last_error = Some(e);
                        None
                    }
                }
            })
            .collect();

        match (readable.is_empty(), last_error) {
            (true, Some(e)) => Err(e),
            _ => Ok(readable),
        }
    }

    fn anchor(&self) -> Option<&str> {
        Some(&self.variable)
    }

    fn describe(&self) -> String {
        format!("Player response ({}{})", self.variable, self.tracks_pointer)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn page(player_response: &str) -> String {
        format!(
            r#"<html><head><script>var foo = {{"a": 1}};</script></head><body>
<script nonce="x">var ytInitialPlayerResponse = {player_response};var meta = document.createElement('meta');</script>
</body></html>"#
        )
    }

    const TRACKS: &str = r#"{"videoDetails":{"title":"Demo"},"captions":{"playerCaptionsTracklistRenderer":{"captionTracks":[
        {"baseUrl":"https://www.youtube.com/api/timedtext?v=GiEsyOyk1m4&lang=en&kind=asr","name":{"simpleText":"English (auto-generated)"},"vssId":"a.en","languageCode":"en","kind":"asr","isTranslatable":true},
        {"baseUrl":"/api/timedtext?v=GiEsyOyk1m4&lang=en","name":{"runs":[{"text":"English"}]},"vssId":".en","languageCode":"en","isTranslatable":true},
        {"baseUrl":"api/timedtext?v=GiEsyOyk1m4&lang=de","vssId":".de","languageCode":"de"}
    ]}}}"#;

    #[test]
    fn lists_tracks() {
        let tracks = PlayerResponse::default().tracks(&page(TRACKS)).unwrap();

        assert_eq!(
            tracks,
            vec![
                CaptionTrack {
                    kind: Kind::Auto,
                    language_code: "en".to_string(),
                    source_url:
                        "https://www.youtube.com/api/timedtext?v=GiEsyOyk1m4&lang=en&kind=asr"
                            .to_string(),
                    name: Some("English (auto-generated)".to_string()),
                },
                CaptionTrack {
                    kind: Kind::Manual,
                    language_code: "en".to_string(),
                    source_url: "https://www.youtube.com/api/timedtext?v=GiEsyOyk1m4&lang=en"
                        .to_string(),
                    name: Some("English".to_string()),
                },
                CaptionTrack {
                    kind: Kind::Manual,
                    language_code: "de".to_string(),
                    source_url: "https://www.youtube.com/api/timedtext?v=GiEsyOyk1m4&lang=de"
                        .to_string(),
                    name: None,
                },
            ]
        );
    }

    #[test]
    fn selects_manual_over_auto_when_asked() {
        let tracks = PlayerResponse::default().tracks(&page(TRACKS)).unwrap();
        let manual = select(&tracks, Kind::Manual, "en").unwrap();
        assert_eq!(manual.kind, Kind::Manual);
        assert!(!manual.source_url.contains("kind=asr"));
    }

    #[test]
    fn semicolon_brace_inside_string_does_not_truncate() {
        let json = r#"{"videoDetails":{"title":"a};b"},"captions":{"playerCaptionsTracklistRenderer":{"captionTracks":[{"baseUrl":"/api/timedtext?x=1","languageCode":"en"}]}}}"#;
        let tracks = PlayerResponse::default().tracks(&page(json)).unwrap();
        assert_eq!(tracks.len(), 1);
    }

    #[test]
    fn skips_non_object_assignments() {
        let html = format!(
            "<script>var ytInitialPlayerResponse = null;</script>{}",
            page(TRACKS)
        );
        assert_eq!(PlayerResponse::default().tracks(&html).unwrap().len(), 3);
    }

    #[test]
    fn scheme_relative_urls() {
        let url = PlayerResponse::default()
            .absolute_url("//www.youtube.com/api/timedtext?v=1")
            .unwrap();
        assert_eq!(url, "https://www.youtube.com/api/timedtext?v=1");
    }

    #[test]
    fn missing_metadata() {
        assert_eq!(
            PlayerResponse::default().tracks("<html><body>nothing</body></html>"),
            Err(LocateError::MetadataNotFound)
        );
    }

    #[test]
    fn malformed_metadata() {
        let html = "<script>var ytInitialPlayerResponse = {\"captions\": [1, 2;</script>";
        assert!(matches!(
            PlayerResponse::default().tracks(html),
            Err(LocateError::MalformedMetadata(_))
        ));
    }

    #[test]
    fn malformed_track() {
        let json = r#"{"captions":{"playerCaptionsTracklistRenderer":{"captionTracks":[{"languageCode":"en"}]}}}"#;
        assert!(matches!(
            PlayerResponse::default().tracks(&page(json)),
            Err(LocateError::MalformedMetadata(_))
        ));
    }

    #[test]
    fn unreadable_track_does_not_hide_others() {
        let json = r#"{"captions":{"playerCaptionsTracklistRenderer":{"captionTracks":[{"baseUrl":"/api/timedtext?lang=en","languageCode":"en"},{"languageCode":"fr"}]}}}"#;

        let track = PlayerResponse::default()
            .tracks(&page(json))
            .and_then(|t| select(&t, Kind::Manual, "en"))
            .unwrap();

        assert_eq!(track.source_url, "https://www.youtube.com/api/timedtext?lang=en");
        assert_eq!(track.language_code, "en");
    }

    #[test]
    fn unreadable_track_is_not_a_match() {
        let json = r#"{"captions":{"playerCaptionsTracklistRenderer":{"captionTracks":[{"baseUrl":"/api/timedtext?lang=en","languageCode":"en"},{"languageCode":"fr"}]}}}"#;

        let tracks = PlayerResponse::default().tracks(&page(json)).unwrap();

        assert_eq!(tracks.len(), 1);
        assert!(matches!(
            select(&tracks, Kind::Manual, "fr"),
            Err(LocateError::TrackNotFound { .. })
        ));
    }

    #[test]
    fn no_captions() {
        for json in [
            r#"{"videoDetails":{"title":"Demo"}}"#,
            r#"{"captions":{"playerCaptionsTracklistRenderer":{"captionTracks":[]}}}"#,
        ] {
            assert_eq!(
                PlayerResponse::default().tracks(&page(json)),
                Err(LocateError::NoCaptionsAvailable)
            );
        }
    }

    #[test]
    fn configurable_contract() {
        let locator = PlayerResponse {
            variable: "window.player".to_string(),
            tracks_pointer: "/tracks".to_string(),
            origin: "https://mirror.test".to_string(),
        };
        let html = r#"<script>window.player={"tracks":[{"baseUrl":"/t?id=1","languageCode":"en","kind":"asr"}]};</script>"#;

        let tracks = locator.tracks(html).unwrap();
        assert_eq!(tracks[0].source_url, "https://mirror.test/t?id=1");
        assert_eq!(tracks[0].kind, Kind::Auto);
    }

    #[test]
    fn location_from_toml() {
        let location: Location = toml::from_str(
            r#"
locator = "player_response"
variable = "ytPlayer"
"#,
        )
        .unwrap();

        assert_eq!(
            location.describe(),
            "Player response (ytPlayer/captions/playerCaptionsTracklistRenderer/captionTracks)"
        );
    }
}
