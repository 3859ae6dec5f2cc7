#![forbid(unsafe_code)]

//! Error taxonomy shared by every stage of a harvest run.
//!
//! Nothing here is retried. A transcript that simply does not exist is not
//! an error at all; see [`crate::transcript::TranscriptOutcome`].

use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, HarvestError>;

#[derive(Debug, thiserror::Error)]
pub enum HarvestError {
    /// A required setting is missing. Raised before any network call.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The handle matched no channel, or the channel id has no content details.
    #[error("not found: {0}")]
    NotFound(String),

    /// Any failure from the Data API or the transcript service that is not
    /// explicitly modelled: transport errors, quota errors, malformed bodies.
    #[error("upstream error: {0}")]
    Upstream(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl HarvestError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn upstream(message: impl Into<String>) -> Self {
        Self::Upstream(message.into())
    }
}

impl From<ureq::Error> for HarvestError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Status(code, response) => {
                let url = response.get_url().to_string();
                let body = response.into_string().unwrap_or_default();
                HarvestError::Upstream(format!(
                    "{} returned HTTP {code}: {}",
                    redact_key(&url),
                    body.trim()
                ))
            }
            ureq::Error::Transport(transport) => {
                let target = transport
                    .url()
                    .map(|url| redact_key(url.as_str()))
                    .unwrap_or_else(|| "upstream".to_string());
                let detail = transport.message().unwrap_or_default();
                HarvestError::Upstream(format!(
                    "transport failure calling {target}: {} {detail}",
                    transport.kind()
                ))
            }
        }
    }
}

/// Drops the `key=` query value so API keys never end up in error output.
fn redact_key(url: &str) -> String {
    let Some((base, query)) = url.split_once('?') else {
        return url.to_string();
    };
    let filtered: Vec<&str> = query
        .split('&')
        .filter(|pair| !pair.starts_with("key="))
        .collect();
    if filtered.is_empty() {
        base.to_string()
    } else {
        format!("{base}?{}", filtered.join("&"))
    }
}
