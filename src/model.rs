//! Records that flow between the pipeline stages.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};

use crate::error::{HarvestError, Result};

/// Directory (relative to the output root) that holds transcript files.
pub const TRANSCRIPTS_SUBDIR: &str = "transcripts";

/// A video discovered in the uploads playlist, in scan order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoRef {
    pub video_id: String,
    pub published_at: DateTime<Utc>,
}

/// Snippet and statistics for one video. Counts are kept as the API's
/// decimal strings and default to `"0"` when a statistic is hidden.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoDetail {
    pub title: String,
    pub description: String,
    pub published_at: String,
    pub view_count: String,
    pub like_count: String,
    pub comment_count: String,
}

/// The merged per-video entity handed to the writer.
///
/// `detail` is `None` when the video vanished between listing and the
/// detail lookup. `transcript_path` is always populated, even when the
/// transcript is empty and no file gets written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoRecord {
    pub video_id: String,
    pub listed_at: DateTime<Utc>,
    pub detail: Option<VideoDetail>,
    pub transcript: String,
    pub transcript_path: String,
}

impl VideoRecord {
    pub fn new(video: VideoRef, detail: Option<VideoDetail>, transcript: String) -> Self {
        let transcript_path = transcript_path_for(&video.video_id);
        Self {
            video_id: video.video_id,
            listed_at: video.published_at,
            detail,
            transcript,
            transcript_path,
        }
    }

    pub fn has_transcript(&self) -> bool {
        !self.transcript.is_empty()
    }
}

/// Relative path of a video's transcript file. Always `/`-separated so the
/// CSV column is identical on every platform.
pub fn transcript_path_for(video_id: &str) -> String {
    format!("{TRANSCRIPTS_SUBDIR}/{video_id}.txt")
}

/// Inclusive publish-time window covering every instant of both boundary days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl DateWindow {
    pub fn from_dates(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(HarvestError::InvalidInput(format!(
                "start date {start} is after end date {end}"
            )));
        }
        let last_instant = NaiveTime::from_hms_nano_opt(23, 59, 59, 999_999_999)
            .ok_or_else(|| HarvestError::InvalidInput("invalid end-of-day time".into()))?;
        Ok(Self {
            start: Utc.from_utc_datetime(&start.and_time(NaiveTime::MIN)),
            end: Utc.from_utc_datetime(&end.and_time(last_instant)),
        })
    }

    /// Parses two `YYYY-MM-DD` strings.
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        Self::from_dates(parse_calendar_date(start)?, parse_calendar_date(end)?)
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant <= self.end
    }
}

pub fn parse_calendar_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|err| {
        HarvestError::InvalidInput(format!("expected YYYY-MM-DD date, got {value:?}: {err}"))
    })
}
