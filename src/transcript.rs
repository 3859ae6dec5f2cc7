#![forbid(unsafe_code)]

//! Transcript retrieval.
//!
//! A missing transcript is data, not an error: [`TranscriptOutcome`] carries
//! the two recognised "nothing to fetch" causes. Everything else (network
//! failures, unplayable videos, pages without player data) is returned as
//! `Err` and aborts the run.

use serde::Deserialize;
use tracing::debug;

use crate::config::Settings;
use crate::error::{HarvestError, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptSegment {
    pub text: String,
    pub start_secs: f64,
    pub duration_secs: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnavailableReason {
    /// Captions are turned off for the video.
    Disabled,
    /// Captions exist, but none in the requested languages.
    NotFound,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TranscriptOutcome {
    Segments(Vec<TranscriptSegment>),
    Unavailable(UnavailableReason),
}

impl TranscriptOutcome {
    /// Segment texts joined with `\n` in their original order; empty when
    /// the transcript is unavailable.
    pub fn into_text(self) -> String {
        match self {
            TranscriptOutcome::Segments(segments) => segments
                .into_iter()
                .map(|segment| segment.text)
                .collect::<Vec<_>>()
                .join("\n"),
            TranscriptOutcome::Unavailable(_) => String::new(),
        }
    }
}

pub trait TranscriptSource {
    fn fetch(&self, video_id: &str) -> Result<TranscriptOutcome>;
}

/// Reads the caption track list embedded in the public watch page and
/// downloads the chosen track as `json3` timed text.
pub struct WatchPageTranscripts {
    agent: ureq::Agent,
    watch_base: String,
    languages: Vec<String>,
}

impl WatchPageTranscripts {
    pub fn new(settings: &Settings) -> Self {
        let agent = ureq::AgentBuilder::new()
            .user_agent(concat!("channel-harvest/", env!("CARGO_PKG_VERSION")))
            .build();
        Self {
            agent,
            watch_base: settings.watch_base.clone(),
            languages: settings.transcript_languages.clone(),
        }
    }

    fn fetch_watch_page(&self, video_id: &str) -> Result<String> {
        let url = format!("{}/watch", self.watch_base);
        self.agent
            .get(&url)
            .query("v", video_id)
            .set("Accept-Language", "en-US")
            .call()?
            .into_string()
            .map_err(|err| HarvestError::upstream(format!("reading watch page {video_id}: {err}")))
    }

    fn fetch_track(&self, track: &CaptionTrack) -> Result<Vec<TranscriptSegment>> {
        let timed_text: TimedText = self
            .agent
            .get(&track.base_url)
            .query("fmt", "json3")
            .call()?
            .into_json()
            .map_err(|err| HarvestError::upstream(format!("decoding timed text: {err}")))?;
        Ok(timed_text.into_segments())
    }
}

impl TranscriptSource for WatchPageTranscripts {
    fn fetch(&self, video_id: &str) -> Result<TranscriptOutcome> {
        let html = self.fetch_watch_page(video_id)?;
        let player = extract_player_response(&html, video_id)?;
        match select_caption_track(player, &self.languages)? {
            TrackSelection::Track(track) => {
                debug!(
                    video_id,
                    language = %track.language_code,
                    kind = ?track.kind,
                    "fetching caption track"
                );
                Ok(TranscriptOutcome::Segments(self.fetch_track(&track)?))
            }
            TrackSelection::Unavailable(reason) => Ok(TranscriptOutcome::Unavailable(reason)),
        }
    }
}

const PLAYER_RESPONSE_MARKER: &str = "ytInitialPlayerResponse = ";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlayerResponse {
    #[serde(default)]
    playability_status: Option<PlayabilityStatus>,
    #[serde(default)]
    captions: Option<Captions>,
}

#[derive(Debug, Deserialize)]
struct PlayabilityStatus {
    status: String,
    #[serde(default)]
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Captions {
    #[serde(rename = "playerCaptionsTracklistRenderer", default)]
    tracklist: Option<CaptionTracklist>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CaptionTracklist {
    #[serde(default)]
    caption_tracks: Vec<CaptionTrack>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CaptionTrack {
    base_url: String,
    language_code: String,
    /// `"asr"` marks auto-generated captions.
    #[serde(default)]
    kind: Option<String>,
}

impl CaptionTrack {
    fn is_generated(&self) -> bool {
        self.kind.as_deref() == Some("asr")
    }
}

#[derive(Debug)]
enum TrackSelection {
    Track(CaptionTrack),
    Unavailable(UnavailableReason),
}

fn extract_player_response(html: &str, video_id: &str) -> Result<PlayerResponse> {
    let start = html
        .find(PLAYER_RESPONSE_MARKER)
        .map(|index| index + PLAYER_RESPONSE_MARKER.len())
        .ok_or_else(|| {
            HarvestError::upstream(format!("watch page for {video_id} has no player response"))
        })?;
    // The object is followed by more script; only the first JSON value is read.
    serde_json::Deserializer::from_str(&html[start..])
        .into_iter::<PlayerResponse>()
        .next()
        .unwrap_or_else(|| Err(serde::de::Error::custom("empty player response")))
        .map_err(|err| {
            HarvestError::upstream(format!("parsing player response for {video_id}: {err}"))
        })
}

fn select_caption_track(player: PlayerResponse, languages: &[String]) -> Result<TrackSelection> {
    if let Some(status) = &player.playability_status
        && status.status != "OK"
    {
        return Err(HarvestError::upstream(format!(
            "video is not playable ({}): {}",
            status.status,
            status.reason.as_deref().unwrap_or("no reason given")
        )));
    }

    let tracks = player
        .captions
        .and_then(|captions| captions.tracklist)
        .map(|tracklist| tracklist.caption_tracks)
        .unwrap_or_default();
    if tracks.is_empty() {
        return Ok(TrackSelection::Unavailable(UnavailableReason::Disabled));
    }

    for language in languages {
        let mut matching = tracks.iter().filter(|track| &track.language_code == language);
        let manual = matching.clone().find(|track| !track.is_generated());
        if let Some(track) = manual.or_else(|| matching.next()) {
            return Ok(TrackSelection::Track(track.clone()));
        }
    }
    Ok(TrackSelection::Unavailable(UnavailableReason::NotFound))
}

#[derive(Debug, Default, Deserialize)]
struct TimedText {
    #[serde(default)]
    events: Vec<TimedTextEvent>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TimedTextEvent {
    #[serde(default)]
    t_start_ms: u64,
    #[serde(default)]
    d_duration_ms: u64,
    #[serde(default)]
    segs: Vec<TimedTextSeg>,
}

#[derive(Debug, Deserialize)]
struct TimedTextSeg {
    #[serde(default)]
    utf8: String,
}

impl TimedText {
    fn into_segments(self) -> Vec<TranscriptSegment> {
        self.events
            .into_iter()
            .filter_map(|event| {
                let text: String = event.segs.into_iter().map(|seg| seg.utf8).collect();
                if text.trim().is_empty() {
                    return None;
                }
                Some(TranscriptSegment {
                    text,
                    start_secs: event.t_start_ms as f64 / 1000.0,
                    duration_secs: event.d_duration_ms as f64 / 1000.0,
                })
            })
            .collect()
    }
}
