//! Attaches snippet/statistics and transcript text to listed videos.
//!
//! Videos are processed in chunks of [`MAX_RESULTS_PER_CALL`]: one batched
//! `videos.list` call per chunk, then one transcript fetch per video in the
//! chunk, strictly one after another. Nothing runs in parallel, which keeps
//! the request rate against the transcript endpoint low.

use std::collections::HashMap;

use tracing::{debug, info};

use crate::catalog::{MAX_RESULTS_PER_CALL, VideoCatalog, VideoResource};
use crate::error::Result;
use crate::model::{VideoDetail, VideoRecord, VideoRef};
use crate::transcript::{TranscriptOutcome, TranscriptSource};

const DEFAULT_COUNT: &str = "0";

impl From<VideoResource> for VideoDetail {
    fn from(resource: VideoResource) -> Self {
        let statistics = resource.statistics.unwrap_or_default();
        Self {
            title: resource.snippet.title,
            description: resource.snippet.description,
            published_at: resource.snippet.published_at,
            view_count: statistics.view_count.unwrap_or_else(|| DEFAULT_COUNT.into()),
            like_count: statistics.like_count.unwrap_or_else(|| DEFAULT_COUNT.into()),
            comment_count: statistics
                .comment_count
                .unwrap_or_else(|| DEFAULT_COUNT.into()),
        }
    }
}

/// Looks up details for at most one batch of ids. Ids upstream no longer
/// knows about are simply absent from the map.
pub fn fetch_details(
    catalog: &(impl VideoCatalog + ?Sized),
    video_ids: &[&str],
) -> Result<HashMap<String, VideoDetail>> {
    let response = catalog.videos(video_ids)?;
    Ok(response
        .items
        .into_iter()
        .map(|resource| (resource.id.clone(), VideoDetail::from(resource)))
        .collect())
}

/// Fetches one transcript and flattens it to text. The two "unavailable"
/// outcomes become an empty string; any `Err` is passed through untouched.
pub fn fetch_transcript_text(
    source: &(impl TranscriptSource + ?Sized),
    video_id: &str,
) -> Result<String> {
    let outcome = source.fetch(video_id)?;
    if let TranscriptOutcome::Unavailable(reason) = &outcome {
        debug!(video_id, ?reason, "no transcript");
    }
    Ok(outcome.into_text())
}

/// Produces one record per input video, in input order. A video missing from
/// the detail response keeps its record with `detail: None`.
pub fn enrich_videos(
    catalog: &(impl VideoCatalog + ?Sized),
    transcripts: &(impl TranscriptSource + ?Sized),
    videos: Vec<VideoRef>,
) -> Result<Vec<VideoRecord>> {
    let total = videos.len();
    let mut records = Vec::with_capacity(total);
    let mut pending = videos.into_iter().peekable();

    while pending.peek().is_some() {
        let chunk: Vec<VideoRef> = pending.by_ref().take(MAX_RESULTS_PER_CALL).collect();
        let ids: Vec<&str> = chunk.iter().map(|video| video.video_id.as_str()).collect();
        let details = fetch_details(catalog, &ids)?;
        if details.len() < chunk.len() {
            info!(
                requested = chunk.len(),
                returned = details.len(),
                "some videos disappeared before their details could be fetched"
            );
        }

        for video in chunk {
            let detail = details.get(&video.video_id).cloned();
            let transcript = fetch_transcript_text(transcripts, &video.video_id)?;
            records.push(VideoRecord::new(video, detail, transcript));
        }
        info!(done = records.len(), total, "enriched videos");
    }

    Ok(records)
}
