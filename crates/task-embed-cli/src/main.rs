mod cli_args;

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use task_embed::{
    render_task_embed, DisplayPayload, Task, TaskEmbedConfig, TaskSnapshotTracker,
};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::cli_args::{Cli, CliOutputFormat};

fn init_tracing() {
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn resolve_config(cli: &Cli) -> Result<TaskEmbedConfig> {
    let mut config = match &cli.config {
        Some(path) => TaskEmbedConfig::from_path(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => {
            let api_url = cli.api_url.clone().context(
                "--api-url (or TASK_EMBED_API_URL) is required when --config is not set",
            )?;
            TaskEmbedConfig::new(api_url)
        }
    };
    if let Some(api_url) = &cli.api_url {
        config.api_url = api_url.clone();
    }
    if let Some(style) = cli.timestamp_style {
        config = config.with_timestamp_style(style.into());
    }
    config.validate().context("invalid task embed config")?;

    tracing::debug!(
        api_url = %config.api_url,
        color = config.color.as_str(),
        timestamp_style = config.timestamp_style.as_str(),
        "resolved task embed config"
    );
    Ok(config)
}

fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read task snapshot {}", path.display())),
        None => {
            let mut raw = String::new();
            std::io::stdin()
                .read_to_string(&mut raw)
                .context("failed to read task snapshot from stdin")?;
            Ok(raw)
        }
    }
}

fn format_payload(payload: &DisplayPayload, format: CliOutputFormat, compact: bool) -> Result<String> {
    let rendered = match format {
        CliOutputFormat::Discord if compact => {
            serde_json::to_string(&payload.to_discord_message_body())?
        }
        CliOutputFormat::Discord => serde_json::to_string_pretty(&payload.to_discord_message_body())?,
        CliOutputFormat::Payload if compact => serde_json::to_string(payload)?,
        CliOutputFormat::Payload => serde_json::to_string_pretty(payload)?,
        CliOutputFormat::Text => payload.to_plain_text(),
    };
    Ok(rendered)
}

fn render_single(cli: &Cli, config: &TaskEmbedConfig, raw: &str) -> Result<()> {
    let task = Task::from_json(raw).context("failed to parse task snapshot")?;
    let payload = render_task_embed(config, &task);
    println!("{}", format_payload(&payload, cli.format, false)?);
    Ok(())
}

fn render_stream(cli: &Cli, config: &TaskEmbedConfig, raw: &str) -> Result<()> {
    let mut tracker = TaskSnapshotTracker::new();
    let mut rendered = 0usize;

    for (index, line) in raw.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let task = Task::from_json(line)
            .with_context(|| format!("failed to parse task snapshot on line {}", index + 1))?;
        let decision = tracker.observe(&task);
        tracing::info!(
            line = index + 1,
            task_id = %task.task_id,
            decision = decision.as_str(),
            "observed task snapshot"
        );

        if decision.should_render() {
            let payload = render_task_embed(config, &task);
            if rendered > 0 && cli.format == CliOutputFormat::Text {
                println!();
            }
            println!("{}", format_payload(&payload, cli.format, true)?);
            rendered += 1;
        }
        if tracker.is_finished() {
            break;
        }
    }

    tracing::info!(rendered, finished = tracker.is_finished(), "task snapshot stream done");
    Ok(())
}

fn run(cli: &Cli) -> Result<()> {
    let config = resolve_config(cli)?;
    let raw = read_input(cli.task_path().map(|path| path.as_path()))?;
    if cli.ndjson {
        render_stream(cli, &config, &raw)
    } else {
        render_single(cli, &config, &raw)
    }
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    if let Err(error) = run(&cli) {
        eprintln!("error: {error:#}");
        std::process::exit(1);
    }
}
