//! Writes `videos.csv` and the per-video transcript files.
//!
//! Layout under the output directory:
//!
//! ```text
//! videos.csv
//! transcripts/<video_id>.txt   (only for non-empty transcripts)
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};

use crate::error::{HarvestError, Result};
use crate::model::{TRANSCRIPTS_SUBDIR, VideoRecord};

pub const CSV_FILE: &str = "videos.csv";

pub const CSV_COLUMNS: [&str; 8] = [
    "video_id",
    "publishedAt",
    "title",
    "description",
    "viewCount",
    "likeCount",
    "commentCount",
    "transcript_path",
];

/// One CSV row. Detail columns are blank when the video had no detail.
#[derive(Serialize)]
struct CsvRow<'a> {
    video_id: &'a str,
    published_at: Option<&'a str>,
    title: Option<&'a str>,
    description: Option<&'a str>,
    view_count: Option<&'a str>,
    like_count: Option<&'a str>,
    comment_count: Option<&'a str>,
    transcript_path: &'a str,
}

impl<'a> From<&'a VideoRecord> for CsvRow<'a> {
    fn from(record: &'a VideoRecord) -> Self {
        let detail = record.detail.as_ref();
        Self {
            video_id: &record.video_id,
            published_at: detail.map(|d| d.published_at.as_str()),
            title: detail.map(|d| d.title.as_str()),
            description: detail.map(|d| d.description.as_str()),
            view_count: detail.map(|d| d.view_count.as_str()),
            like_count: detail.map(|d| d.like_count.as_str()),
            comment_count: detail.map(|d| d.comment_count.as_str()),
            transcript_path: &record.transcript_path,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputSummary {
    pub csv_path: PathBuf,
    pub rows: usize,
    pub transcript_files: usize,
}

/// Creates the directories (pre-existing ones are fine), writes one CSV row
/// per record in order, and writes each non-empty transcript, overwriting
/// any earlier file with the same name.
pub fn write_output(output_dir: &Path, records: &[VideoRecord]) -> Result<OutputSummary> {
    let transcripts_dir = output_dir.join(TRANSCRIPTS_SUBDIR);
    fs::create_dir_all(&transcripts_dir)
        .map_err(|err| HarvestError::io(&transcripts_dir, err))?;

    let csv_path = output_dir.join(CSV_FILE);
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(&csv_path)?;
    writer.write_record(CSV_COLUMNS)?;

    let mut transcript_files = 0;
    for record in records {
        if record.has_transcript() {
            let path = output_dir.join(&record.transcript_path);
            fs::write(&path, record.transcript.as_bytes())
                .map_err(|err| HarvestError::io(&path, err))?;
            debug!(path = %path.display(), "wrote transcript");
            transcript_files += 1;
        }
        writer.serialize(CsvRow::from(record))?;
    }
    writer.flush().map_err(|err| HarvestError::io(&csv_path, err))?;

    info!(
        csv = %csv_path.display(),
        rows = records.len(),
        transcript_files,
        "wrote output"
    );
    Ok(OutputSummary {
        csv_path,
        rows: records.len(),
        transcript_files,
    })
}
