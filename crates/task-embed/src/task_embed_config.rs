//! Rendering context for task embeds.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::task_embed_payload::EmbedColor;

pub const DEFAULT_EMBED_TITLE: &str = "Creating backup";
pub const DEFAULT_COMPLETED_FOOTER: &str = "Backup created successfully";
pub const DEFAULT_STATUS_LINE_MAX_CHARS: usize = 500;
pub const DEFAULT_STATUS_BLOCK_MAX_CHARS: usize = 2500;

/// How the per-status timestamp suffix is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimestampStyle {
    /// `` | `[Tue Nov 14 2023 22:13:20 UTC]` ``
    #[default]
    Utc,
    /// ` | <t:1700000000:R>`, rendered client-side by Discord.
    DiscordRelative,
}

impl TimestampStyle {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Utc => "utc",
            Self::DiscordRelative => "discord_relative",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskEmbedConfig {
    /// Base URL of the public API; download links hang off it.
    pub api_url: String,
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_completed_footer")]
    pub completed_footer: String,
    #[serde(default)]
    pub color: EmbedColor,
    #[serde(default = "default_status_line_max_chars")]
    pub max_status_line_chars: usize,
    #[serde(default = "default_status_block_max_chars")]
    pub max_status_block_chars: usize,
    #[serde(default)]
    pub timestamp_style: TimestampStyle,
}

impl TaskEmbedConfig {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            title: default_title(),
            completed_footer: default_completed_footer(),
            color: EmbedColor::default(),
            max_status_line_chars: DEFAULT_STATUS_LINE_MAX_CHARS,
            max_status_block_chars: DEFAULT_STATUS_BLOCK_MAX_CHARS,
            timestamp_style: TimestampStyle::default(),
        }
    }

    pub fn with_timestamp_style(mut self, timestamp_style: TimestampStyle) -> Self {
        self.timestamp_style = timestamp_style;
        self
    }

    pub fn from_json(source: &str) -> Result<Self, TaskEmbedConfigError> {
        let config = serde_json::from_str::<TaskEmbedConfig>(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, TaskEmbedConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| TaskEmbedConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&raw)
    }

    pub fn validate(&self) -> Result<(), TaskEmbedConfigError> {
        let api_url = self.api_url.trim();
        if api_url.is_empty() {
            return Err(TaskEmbedConfigError::EmptyApiUrl);
        }
        if !(api_url.starts_with("http://") || api_url.starts_with("https://")) {
            return Err(TaskEmbedConfigError::InvalidApiUrl {
                url: self.api_url.clone(),
            });
        }

        let limits = [
            ("max_status_line_chars", self.max_status_line_chars),
            ("max_status_block_chars", self.max_status_block_chars),
        ];
        for (field, value) in limits {
            if value == 0 {
                return Err(TaskEmbedConfigError::ZeroLimit { field });
            }
        }

        if self.max_status_line_chars > self.max_status_block_chars {
            return Err(TaskEmbedConfigError::LineCapExceedsBudget {
                line: self.max_status_line_chars,
                block: self.max_status_block_chars,
            });
        }

        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum TaskEmbedConfigError {
    #[error("failed to parse task embed config JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read task embed config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("api_url must not be empty")]
    EmptyApiUrl,
    #[error("api_url '{url}' must start with http:// or https://")]
    InvalidApiUrl { url: String },
    #[error("{field} must be greater than 0")]
    ZeroLimit { field: &'static str },
    #[error("max_status_line_chars ({line}) must not exceed max_status_block_chars ({block})")]
    LineCapExceedsBudget { line: usize, block: usize },
}

fn default_title() -> String {
    DEFAULT_EMBED_TITLE.to_string()
}

fn default_completed_footer() -> String {
    DEFAULT_COMPLETED_FOOTER.to_string()
}

fn default_status_line_max_chars() -> usize {
    DEFAULT_STATUS_LINE_MAX_CHARS
}

fn default_status_block_max_chars() -> usize {
    DEFAULT_STATUS_BLOCK_MAX_CHARS
}
