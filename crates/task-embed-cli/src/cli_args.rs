use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use task_embed::TimestampStyle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CliOutputFormat {
    Discord,
    Payload,
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CliTimestampStyle {
    Utc,
    DiscordRelative,
}

impl From<CliTimestampStyle> for TimestampStyle {
    fn from(value: CliTimestampStyle) -> Self {
        match value {
            CliTimestampStyle::Utc => TimestampStyle::Utc,
            CliTimestampStyle::DiscordRelative => TimestampStyle::DiscordRelative,
        }
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "task-embed",
    about = "Render task status snapshots into chat embeds",
    version
)]
pub struct Cli {
    #[arg(
        long,
        value_name = "PATH",
        help = "Task snapshot JSON file. Reads stdin when omitted or '-'."
    )]
    pub task: Option<PathBuf>,

    #[arg(
        long,
        value_name = "PATH",
        env = "TASK_EMBED_CONFIG",
        help = "Optional JSON render config (api_url, title, completed_footer, color, limits, timestamp_style)."
    )]
    pub config: Option<PathBuf>,

    #[arg(
        long = "api-url",
        value_name = "URL",
        env = "TASK_EMBED_API_URL",
        help = "Base API URL used for download links. Overrides api_url from --config."
    )]
    pub api_url: Option<String>,

    #[arg(
        long,
        value_enum,
        default_value = "discord",
        help = "Output format: Discord message body JSON, payload JSON, or plain text."
    )]
    pub format: CliOutputFormat,

    #[arg(
        long = "timestamp-style",
        value_enum,
        help = "Override the status timestamp style from --config."
    )]
    pub timestamp_style: Option<CliTimestampStyle>,

    #[arg(
        long,
        help = "Treat input as newline-delimited snapshots of one task and render only changed ones."
    )]
    pub ndjson: bool,
}

impl Cli {
    /// Returns the snapshot path, or `None` for stdin.
    pub fn task_path(&self) -> Option<&PathBuf> {
        self.task
            .as_ref()
            .filter(|path| path.as_os_str() != "-")
    }
}
