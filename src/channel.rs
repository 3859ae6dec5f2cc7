//! Handle → channel id → uploads playlist id.

use tracing::info;

use crate::catalog::VideoCatalog;
use crate::error::{HarvestError, Result};

/// Strips a leading `@` (if any) from a handle.
pub fn normalize_handle(handle: &str) -> &str {
    handle.trim().trim_start_matches('@')
}

/// Looks the handle up with a single channel search and takes the first hit.
/// There is no disambiguation: whatever upstream ranks first wins.
pub fn resolve_channel_id(catalog: &(impl VideoCatalog + ?Sized), handle: &str) -> Result<String> {
    let query = normalize_handle(handle);
    if query.is_empty() {
        return Err(HarvestError::InvalidInput("channel handle is empty".into()));
    }
    let response = catalog.search_channels(query, 1)?;
    let first = response
        .items
        .into_iter()
        .next()
        .ok_or_else(|| HarvestError::NotFound(format!("channel with handle {query} not found")))?;
    info!(
        handle = query,
        channel_id = %first.snippet.channel_id,
        title = %first.snippet.title,
        "resolved channel"
    );
    Ok(first.snippet.channel_id)
}

/// Returns the channel's auto-generated "uploads" playlist id.
pub fn uploads_playlist_id(
    catalog: &(impl VideoCatalog + ?Sized),
    channel_id: &str,
) -> Result<String> {
    let response = catalog.channel_content_details(channel_id)?;
    let channel = response
        .items
        .into_iter()
        .next()
        .ok_or_else(|| HarvestError::NotFound(format!("channel {channel_id} not found")))?;
    let uploads = channel.content_details.related_playlists.uploads;
    info!(channel_id, playlist_id = %uploads, "located uploads playlist");
    Ok(uploads)
}
