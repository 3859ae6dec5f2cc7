#![forbid(unsafe_code)]

//! Fetches a channel's uploads for a date window from the YouTube Data API,
//! attaches statistics and transcripts, and writes them out as a CSV plus
//! one text file per transcript.

pub mod catalog;
pub mod channel;
pub mod config;
pub mod enrich;
pub mod error;
pub mod harvest;
pub mod listing;
pub mod logging;
pub mod model;
pub mod output;
pub mod transcript;

#[cfg(test)]
mod testing;

pub use error::{HarvestError, Result};
