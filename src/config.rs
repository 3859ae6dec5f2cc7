#![forbid(unsafe_code)]

use crate::error::{HarvestError, Result};
use std::{
    collections::HashMap,
    env, fs,
    path::{Path, PathBuf},
};

pub const DEFAULT_ENV_PATH: &str = ".env";
pub const DEFAULT_OUTPUT_DIR: &str = "output";
pub const DEFAULT_API_BASE: &str = "https://www.googleapis.com/youtube/v3";
pub const DEFAULT_WATCH_BASE: &str = "https://www.youtube.com";
pub const DEFAULT_TRANSCRIPT_LANGUAGE: &str = "en";

/// Process-wide settings, resolved once at startup and handed to every
/// component that talks to the network or the filesystem.
#[derive(Clone)]
pub struct Settings {
    pub api_key: String,
    pub output_dir: PathBuf,
    pub api_base: String,
    pub watch_base: String,
    pub transcript_languages: Vec<String>,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("api_key", &"<redacted>")
            .field("output_dir", &self.output_dir)
            .field("api_base", &self.api_base)
            .field("watch_base", &self.watch_base)
            .field("transcript_languages", &self.transcript_languages)
            .finish()
    }
}

#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub output_dir: Option<PathBuf>,
    pub env_path: Option<PathBuf>,
}

pub fn resolve_settings(overrides: SettingsOverrides) -> Result<Settings> {
    let env_path = overrides
        .env_path
        .as_deref()
        .unwrap_or_else(|| Path::new(DEFAULT_ENV_PATH));
    let file_vars = read_env_file(env_path)?;
    build_settings(&file_vars, env_var_string, overrides)
}

fn build_settings(
    file_vars: &HashMap<String, String>,
    env_lookup: impl Fn(&str) -> Option<String>,
    overrides: SettingsOverrides,
) -> Result<Settings> {
    let api_key = setting("YOUTUBE_API_KEY", file_vars, &env_lookup).ok_or_else(|| {
        HarvestError::Configuration("YOUTUBE_API_KEY environment variable not set".into())
    })?;
    let output_dir = overrides
        .output_dir
        .or_else(|| setting("OUTPUT_DIR", file_vars, &env_lookup).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));
    let api_base = setting("YOUTUBE_API_BASE", file_vars, &env_lookup)
        .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
    let watch_base = setting("YOUTUBE_WATCH_BASE", file_vars, &env_lookup)
        .unwrap_or_else(|| DEFAULT_WATCH_BASE.to_string());
    let transcript_languages = setting("TRANSCRIPT_LANGUAGES", file_vars, &env_lookup)
        .map(|raw| parse_language_list(&raw))
        .filter(|languages| !languages.is_empty())
        .unwrap_or_else(|| vec![DEFAULT_TRANSCRIPT_LANGUAGE.to_string()]);

    Ok(Settings {
        api_key,
        output_dir,
        api_base: api_base.trim_end_matches('/').to_string(),
        watch_base: watch_base.trim_end_matches('/').to_string(),
        transcript_languages,
    })
}

fn parse_language_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|code| !code.is_empty())
        .map(str::to_string)
        .collect()
}

fn env_var_string(key: &str) -> Option<String> {
    env::var(key).ok()
}

/// Looks `key` up in the process environment first, then in the `.env`
/// variables. A blank value counts as unset in either place, so an empty
/// `OUTPUT_DIR=` line still falls back to the default.
fn setting(
    key: &str,
    file_vars: &HashMap<String, String>,
    env_lookup: &impl Fn(&str) -> Option<String>,
) -> Option<String> {
    let non_blank = |value: String| {
        let value = value.trim();
        (!value.is_empty()).then(|| value.to_string())
    };
    env_lookup(key)
        .and_then(non_blank)
        .or_else(|| file_vars.get(key).cloned().and_then(non_blank))
}

/// Parses a dotenv-style file into raw key/value pairs.
///
/// The file is the middle layer of settings resolution: process environment
/// variables override it, built-in defaults fill what it leaves out, and
/// command-line overrides win over everything. A missing file yields no
/// variables. Lines may start with `export `; values may be wrapped in
/// single or double quotes; comments and lines without `=` are ignored.
pub fn read_env_file(path: &Path) -> Result<HashMap<String, String>> {
    if !path.exists() {
        return Ok(HashMap::new());
    }
    let content = fs::read_to_string(path).map_err(|err| HarvestError::io(path, err))?;
    Ok(content
        .lines()
        .filter_map(parse_env_line)
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect())
}

fn parse_env_line(line: &str) -> Option<(&str, &str)> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    let line = line.strip_prefix("export ").unwrap_or(line);
    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    Some((key, unquote(value.trim())))
}

fn unquote(value: &str) -> &str {
    ['"', '\'']
        .into_iter()
        .find_map(|quote| value.strip_prefix(quote)?.strip_suffix(quote))
        .unwrap_or(value)
}
