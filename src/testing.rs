//! In-memory collaborators shared by the unit tests.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::path::PathBuf;
use std::thread::{self, JoinHandle};

use serde_json::{Value, json};

use crate::catalog::{
    ChannelListResponse, PlaylistItemListResponse, SearchListResponse, VideoCatalog,
    VideoListResponse,
};
use crate::config::Settings;
use crate::error::{HarvestError, Result};
use crate::transcript::{TranscriptOutcome, TranscriptSegment, TranscriptSource, UnavailableReason};

pub fn settings(api_base: &str) -> Settings {
    Settings {
        api_key: "test-key".into(),
        output_dir: PathBuf::from("output"),
        api_base: api_base.into(),
        watch_base: "http://127.0.0.1:9".into(),
        transcript_languages: vec!["en".into()],
    }
}

/// Builds a `playlistItems.list` page from `(video_id, videoPublishedAt)` pairs.
pub fn playlist_page(items: &[(&str, &str)], next_page_token: Option<&str>) -> Value {
    let items: Vec<Value> = items
        .iter()
        .map(|(id, published)| {
            json!({"contentDetails": {"videoId": id, "videoPublishedAt": published}})
        })
        .collect();
    match next_page_token {
        Some(token) => json!({"items": items, "nextPageToken": token}),
        None => json!({"items": items}),
    }
}

/// Scripted catalog. Pages are served in order; `videos` answers from a
/// fixed id → resource map so missing ids simply drop out of the response.
#[derive(Default)]
pub struct FakeCatalog {
    search: Option<Value>,
    channel: Option<Value>,
    pages: RefCell<VecDeque<Value>>,
    videos: HashMap<String, Value>,
    pub search_queries: RefCell<Vec<(String, usize)>>,
    pub page_tokens: RefCell<Vec<Option<String>>>,
    pub video_batches: RefCell<Vec<Vec<String>>>,
}

impl FakeCatalog {
    pub fn with_search(mut self, response: Value) -> Self {
        self.search = Some(response);
        self
    }

    pub fn with_channel(mut self, response: Value) -> Self {
        self.channel = Some(response);
        self
    }

    pub fn with_page(self, page: Value) -> Self {
        self.pages.borrow_mut().push_back(page);
        self
    }

    /// Registers a video the `videos` call knows about.
    pub fn with_video(mut self, id: &str, title: &str, statistics: Option<Value>) -> Self {
        let mut resource = json!({
            "id": id,
            "snippet": {
                "title": title,
                "description": format!("about {title}"),
                "publishedAt": "2024-01-15T00:00:00Z"
            }
        });
        if let Some(statistics) = statistics {
            resource["statistics"] = statistics;
        }
        self.videos.insert(id.to_string(), resource);
        self
    }

    fn scripted<T: serde::de::DeserializeOwned>(value: Option<&Value>, call: &str) -> Result<T> {
        let value = value
            .cloned()
            .ok_or_else(|| HarvestError::upstream(format!("no scripted {call} response")))?;
        serde_json::from_value(value)
            .map_err(|err| HarvestError::upstream(format!("bad scripted {call} response: {err}")))
    }
}

impl VideoCatalog for FakeCatalog {
    fn search_channels(&self, query: &str, max_results: usize) -> Result<SearchListResponse> {
        self.search_queries
            .borrow_mut()
            .push((query.to_string(), max_results));
        Self::scripted(self.search.as_ref(), "search")
    }

    fn channel_content_details(&self, _channel_id: &str) -> Result<ChannelListResponse> {
        Self::scripted(self.channel.as_ref(), "channels")
    }

    fn playlist_items(
        &self,
        _playlist_id: &str,
        page_token: Option<&str>,
    ) -> Result<PlaylistItemListResponse> {
        self.page_tokens
            .borrow_mut()
            .push(page_token.map(str::to_string));
        let page = self.pages.borrow_mut().pop_front();
        Self::scripted(page.as_ref(), "playlistItems")
    }

    fn videos(&self, video_ids: &[&str]) -> Result<VideoListResponse> {
        self.video_batches
            .borrow_mut()
            .push(video_ids.iter().map(|id| id.to_string()).collect());
        let items: Vec<Value> = video_ids
            .iter()
            .filter_map(|id| self.videos.get(*id).cloned())
            .collect();
        Self::scripted(Some(&json!({"items": items})), "videos")
    }
}

#[derive(Debug, Clone)]
pub enum FakeTranscript {
    Lines(Vec<String>),
    Unavailable(UnavailableReason),
    Fail,
}

/// Transcript source keyed by video id; unknown ids have captions disabled.
#[derive(Default)]
pub struct FakeTranscripts {
    scripted: HashMap<String, FakeTranscript>,
    pub requested: RefCell<Vec<String>>,
}

impl FakeTranscripts {
    pub fn with_lines(mut self, video_id: &str, lines: &[&str]) -> Self {
        self.scripted.insert(
            video_id.to_string(),
            FakeTranscript::Lines(lines.iter().map(|line| line.to_string()).collect()),
        );
        self
    }

    pub fn with_unavailable(mut self, video_id: &str, reason: UnavailableReason) -> Self {
        self.scripted
            .insert(video_id.to_string(), FakeTranscript::Unavailable(reason));
        self
    }

    pub fn with_failure(mut self, video_id: &str) -> Self {
        self.scripted.insert(video_id.to_string(), FakeTranscript::Fail);
        self
    }
}

impl TranscriptSource for FakeTranscripts {
    fn fetch(&self, video_id: &str) -> Result<TranscriptOutcome> {
        self.requested.borrow_mut().push(video_id.to_string());
        match self.scripted.get(video_id) {
            Some(FakeTranscript::Lines(lines)) => Ok(TranscriptOutcome::Segments(
                lines
                    .iter()
                    .enumerate()
                    .map(|(index, text)| TranscriptSegment {
                        text: text.clone(),
                        start_secs: index as f64,
                        duration_secs: 1.0,
                    })
                    .collect(),
            )),
            Some(FakeTranscript::Unavailable(reason)) => {
                Ok(TranscriptOutcome::Unavailable(*reason))
            }
            Some(FakeTranscript::Fail) => Err(HarvestError::upstream(format!(
                "too many requests while fetching {video_id}"
            ))),
            None => Ok(TranscriptOutcome::Unavailable(UnavailableReason::Disabled)),
        }
    }
}

/// Loopback HTTP server that answers one request per prepared body and hands
/// back the request lines it saw, so tests can check what went on the wire.
pub struct CaptureServer {
    listener: TcpListener,
    pub base: String,
}

impl CaptureServer {
    pub fn bind() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        Self { listener, base }
    }

    pub fn serve(self, bodies: Vec<String>) -> JoinHandle<Vec<String>> {
        thread::spawn(move || {
            bodies
                .iter()
                .map(|body| {
                    let (stream, _) = self.listener.accept().unwrap();
                    answer(stream, body)
                })
                .collect()
        })
    }
}

fn answer(mut stream: TcpStream, body: &str) -> String {
    let mut reader = BufReader::new(stream.try_clone().unwrap());
    let mut request_line = String::new();
    reader.read_line(&mut request_line).unwrap();
    loop {
        let mut header = String::new();
        reader.read_line(&mut header).unwrap();
        if header.trim().is_empty() {
            break;
        }
    }
    write!(
        stream,
        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\
         Connection: close\r\n\r\n{body}",
        body.len()
    )
    .unwrap();
    stream.flush().unwrap();
    request_line.trim_end().to_string()
}
