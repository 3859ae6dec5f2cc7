//! One complete run: resolve → locate → list → enrich.
//!
//! Writing is left to [`crate::output::write_output`] so callers decide
//! where the records go.

use tracing::info;

use crate::catalog::VideoCatalog;
use crate::channel::{resolve_channel_id, uploads_playlist_id};
use crate::enrich::enrich_videos;
use crate::error::Result;
use crate::listing::{ListingStats, list_videos};
use crate::model::{DateWindow, VideoRecord};
use crate::transcript::TranscriptSource;

#[derive(Debug, Clone)]
pub struct HarvestRequest {
    pub handle: String,
    pub window: DateWindow,
}

#[derive(Debug, Clone)]
pub struct Harvest {
    pub channel_id: String,
    pub playlist_id: String,
    pub listing: ListingStats,
    pub records: Vec<VideoRecord>,
}

pub fn run(
    catalog: &(impl VideoCatalog + ?Sized),
    transcripts: &(impl TranscriptSource + ?Sized),
    request: &HarvestRequest,
) -> Result<Harvest> {
    info!(
        handle = %request.handle,
        start = %request.window.start(),
        end = %request.window.end(),
        "starting harvest"
    );
    let channel_id = resolve_channel_id(catalog, &request.handle)?;
    let playlist_id = uploads_playlist_id(catalog, &channel_id)?;
    let listing = list_videos(catalog, &playlist_id, &request.window)?;
    let records = enrich_videos(catalog, transcripts, listing.videos)?;
    Ok(Harvest {
        channel_id,
        playlist_id,
        listing: listing.stats,
        records,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HarvestError;
    use crate::output::{CSV_FILE, write_output};
    use crate::testing::{FakeCatalog, FakeTranscripts, playlist_page};
    use crate::transcript::UnavailableReason;
    use serde_json::json;
    use std::fs;
    use tempfile::tempdir;

    fn example_catalog() -> FakeCatalog {
        FakeCatalog::default()
            .with_search(json!({
                "items": [{"snippet": {"channelId": "UCexample", "title": "Example Channel"}}]
            }))
            .with_channel(json!({
                "items": [{
                    "id": "UCexample",
                    "contentDetails": {"relatedPlaylists": {"uploads": "UUexample"}}
                }]
            }))
            .with_page(playlist_page(
                &[
                    ("feb01", "2024-02-01T09:00:00Z"),
                    ("jan30", "2024-01-30T18:00:00Z"),
                    ("jan15", "2024-01-15T12:00:00Z"),
                ],
                Some("page-2"),
            ))
            .with_page(playlist_page(
                &[
                    ("jan01", "2024-01-01T00:00:00Z"),
                    ("dec31", "2023-12-31T23:59:59Z"),
                ],
                None,
            ))
            .with_video(
                "jan30",
                "Thirtieth",
                Some(json!({"viewCount": "30", "likeCount": "3", "commentCount": "0"})),
            )
            .with_video("jan15", "Fifteenth", Some(json!({"viewCount": "15"})))
            .with_video("jan01", "First", None)
    }

    fn request() -> HarvestRequest {
        HarvestRequest {
            handle: "@ExampleChannel".into(),
            window: DateWindow::parse("2024-01-01", "2024-01-31").unwrap(),
        }
    }

    #[test]
    fn end_to_end_writes_in_range_rows_in_scan_order() {
        let catalog = example_catalog();
        let transcripts = FakeTranscripts::default()
            .with_lines("jan30", &["hello", "there"])
            .with_unavailable("jan15", UnavailableReason::NotFound)
            .with_lines("jan01", &["new year"]);

        let harvest = run(&catalog, &transcripts, &request()).unwrap();
        assert_eq!(harvest.channel_id, "UCexample");
        assert_eq!(harvest.playlist_id, "UUexample");
        assert_eq!(harvest.listing.scanned, 5);
        let with_transcript = harvest
            .records
            .iter()
            .filter(|record| record.has_transcript())
            .count();
        assert_eq!(with_transcript, 2);
        assert_eq!(catalog.search_queries.borrow()[0].0, "ExampleChannel");

        let dir = tempdir().unwrap();
        let summary = write_output(dir.path(), &harvest.records).unwrap();
        assert_eq!(summary.rows, 3);

        let mut reader = csv::Reader::from_path(dir.path().join(CSV_FILE)).unwrap();
        let ids: Vec<String> = reader
            .records()
            .map(|row| row.unwrap()[0].to_string())
            .collect();
        assert_eq!(ids, vec!["jan30", "jan15", "jan01"]);

        let transcripts_dir = dir.path().join("transcripts");
        assert_eq!(
            fs::read_to_string(transcripts_dir.join("jan30.txt")).unwrap(),
            "hello\nthere"
        );
        assert!(!transcripts_dir.join("jan15.txt").exists());
        assert!(transcripts_dir.join("jan01.txt").exists());
        assert_eq!(fs::read_dir(&transcripts_dir).unwrap().count(), 2);
    }

    #[test]
    fn unknown_handle_stops_before_listing() {
        let catalog = FakeCatalog::default().with_search(json!({"items": []}));
        let transcripts = FakeTranscripts::default();
        let err = run(&catalog, &transcripts, &request()).unwrap_err();
        assert!(matches!(err, HarvestError::NotFound(_)));
        assert!(catalog.page_tokens.borrow().is_empty());
        assert!(transcripts.requested.borrow().is_empty());
    }

    #[test]
    fn transcript_failure_aborts_whole_run() {
        let catalog = example_catalog();
        let transcripts = FakeTranscripts::default().with_failure("jan15");
        let err = run(&catalog, &transcripts, &request()).unwrap_err();
        assert!(matches!(err, HarvestError::Upstream(_)));
    }
}
