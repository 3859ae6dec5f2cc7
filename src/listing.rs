//! Walks an uploads playlist page by page and keeps the videos published
//! inside a [`DateWindow`].
//!
//! The whole playlist is always scanned. Uploads are usually newest-first,
//! but backfilled videos can carry older publish times, so stopping at the
//! first video older than the window could miss matches.
//!
//! There is no page cap: termination relies on upstream eventually omitting
//! `nextPageToken`. A playlist that keeps handing out tokens never ends.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::catalog::{PlaylistItemListResponse, VideoCatalog};
use crate::error::{HarvestError, Result};
use crate::model::{DateWindow, VideoRef};

/// Lazy sequence of playlist pages.
///
/// Yields each page once, stops after the page without a continuation token,
/// and fuses after the first error. It cannot be rewound.
pub struct PlaylistPages<'a, C: VideoCatalog + ?Sized> {
    catalog: &'a C,
    playlist_id: &'a str,
    next_token: Option<String>,
    finished: bool,
}

impl<'a, C: VideoCatalog + ?Sized> PlaylistPages<'a, C> {
    pub fn new(catalog: &'a C, playlist_id: &'a str) -> Self {
        Self {
            catalog,
            playlist_id,
            next_token: None,
            finished: false,
        }
    }
}

impl<C: VideoCatalog + ?Sized> Iterator for PlaylistPages<'_, C> {
    type Item = Result<PlaylistItemListResponse>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let page = match self
            .catalog
            .playlist_items(self.playlist_id, self.next_token.as_deref())
        {
            Ok(page) => page,
            Err(err) => {
                self.finished = true;
                return Some(Err(err));
            }
        };
        // An empty string token is treated like an absent one.
        self.next_token = page
            .next_page_token
            .clone()
            .filter(|token| !token.is_empty());
        self.finished = self.next_token.is_none();
        Some(Ok(page))
    }
}

/// Counters describing one full playlist scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListingStats {
    pub pages: usize,
    pub scanned: usize,
    pub kept: usize,
    pub skipped_unpublished: usize,
    /// In-window items whose id was already kept earlier in the scan.
    pub duplicates: usize,
}

#[derive(Debug, Clone, Default)]
pub struct Listing {
    pub videos: Vec<VideoRef>,
    pub stats: ListingStats,
}

/// Scans the whole playlist and returns the in-window videos in scan order.
/// An id seen twice (pages can shift while a new upload lands mid-scan)
/// keeps only its first occurrence.
pub fn list_videos(
    catalog: &(impl VideoCatalog + ?Sized),
    playlist_id: &str,
    window: &DateWindow,
) -> Result<Listing> {
    let mut listing = Listing::default();
    let mut seen = HashSet::new();
    for page in PlaylistPages::new(catalog, playlist_id) {
        let page = page?;
        listing.stats.pages += 1;
        listing.stats.scanned += page.items.len();
        debug!(
            page = listing.stats.pages,
            items = page.items.len(),
            "scanned playlist page"
        );
        for item in page.items {
            let details = item.content_details;
            let Some(raw) = details.video_published_at.as_deref() else {
                warn!(
                    video_id = %details.video_id,
                    "playlist item has no publish time; skipping"
                );
                listing.stats.skipped_unpublished += 1;
                continue;
            };
            let published_at = parse_published_at(raw)?;
            if !window.contains(published_at) {
                continue;
            }
            if !seen.insert(details.video_id.clone()) {
                debug!(video_id = %details.video_id, "duplicate playlist item; skipping");
                listing.stats.duplicates += 1;
                continue;
            }
            listing.videos.push(VideoRef {
                video_id: details.video_id,
                published_at,
            });
        }
    }
    listing.stats.kept = listing.videos.len();
    info!(
        playlist_id,
        pages = listing.stats.pages,
        scanned = listing.stats.scanned,
        kept = listing.stats.kept,
        "finished playlist scan"
    );
    Ok(listing)
}

fn parse_published_at(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|err| {
            HarvestError::upstream(format!("invalid videoPublishedAt {raw:?}: {err}"))
        })
}
