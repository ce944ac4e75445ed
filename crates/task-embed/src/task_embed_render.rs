//! Task status embed rendering.
//!
//! Status history is written oldest-first into a sliding window. Each accepted
//! line records `min(body chars, line cap)` against the block budget; the
//! timestamp suffix is never counted. Before every new line, and once after the
//! last one, the oldest lines are evicted until the recorded total fits the
//! budget again.

use std::collections::VecDeque;

use chrono::DateTime;
use serde_json::Value;

use crate::task_embed_config::{TaskEmbedConfig, TimestampStyle};
use crate::task_embed_payload::{DisplayPayload, EmbedAction};
use crate::task_embed_snapshot::{natural_number, StatusEvent, Task, TaskState};

const TRUNCATION_MARKER: &str = "...";
const INVALID_TIMESTAMP: &str = "Invalid Date";
const MISSING_STATE_LABEL: &str = "undefined";
const UTC_TIMESTAMP_FORMAT: &str = "%a %b %d %Y %H:%M:%S UTC";

const GLYPH_PENDING: &str = ":hourglass:";
const GLYPH_RUNNING: &str = ":hourglass_flowing_sand:";
const GLYPH_COMPLETED: &str = ":white_check_mark:";
const GLYPH_FAILED: &str = ":x:";

const DOWNLOAD_BUTTON_LABEL: &str = "Download";
const DOWNLOAD_BUTTON_EMOJI: &str = "📥";

/// Status lines that survived the window, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusBlock {
    pub lines: Vec<String>,
    /// Sum of the lengths recorded for `lines`.
    pub retained_chars: usize,
    pub evicted: usize,
}

#[derive(Debug)]
struct StatusWindow {
    budget: usize,
    entries: VecDeque<(String, usize)>,
    total: usize,
    evicted: usize,
}

impl StatusWindow {
    fn new(budget: usize) -> Self {
        Self {
            budget,
            entries: VecDeque::new(),
            total: 0,
            evicted: 0,
        }
    }

    fn evict_over_budget(&mut self) {
        let before = self.evicted;
        while self.total > self.budget {
            let Some((_, recorded)) = self.entries.pop_front() else {
                break;
            };
            self.total = self.total.saturating_sub(recorded);
            self.evicted += 1;
        }
        if self.evicted > before {
            tracing::debug!(
                evicted = self.evicted - before,
                retained = self.entries.len(),
                retained_chars = self.total,
                budget = self.budget,
                "evicted oldest task status lines"
            );
        }
    }

    fn accept(&mut self, line: String, recorded: usize) {
        self.total = self.total.saturating_add(recorded);
        self.entries.push_back((line, recorded));
    }

    fn finish(mut self) -> StatusBlock {
        self.evict_over_budget();
        StatusBlock {
            lines: self.entries.into_iter().map(|(line, _)| line).collect(),
            retained_chars: self.total,
            evicted: self.evicted,
        }
    }
}

/// Renders one task snapshot into an embed payload.
pub fn render_task_embed(config: &TaskEmbedConfig, task: &Task) -> DisplayPayload {
    let block = render_status_block(config, &task.statuses);
    let state = task.state.as_ref();
    let state_label = state.map(TaskState::as_str).unwrap_or(MISSING_STATE_LABEL);
    let completed = matches!(state, Some(TaskState::Completed));

    let mut description = format!(
        "{} Task state: {}\nTask ID: {}\n\n{}",
        state_glyph(state),
        state_label,
        task.task_id,
        block.lines.join("\n")
    );

    let mut actions = Vec::new();
    if completed && task.download_filename().is_some() {
        let url = download_link_url(&config.api_url, &task.task_id);
        description.push_str(&format!("\n\n:link: [{DOWNLOAD_BUTTON_LABEL}]({url})"));
        actions.push(EmbedAction::LinkButton {
            label: DOWNLOAD_BUTTON_LABEL.to_string(),
            url,
            emoji: DOWNLOAD_BUTTON_EMOJI.to_string(),
        });
    }

    tracing::debug!(
        task_id = %task.task_id,
        state = state_label,
        statuses = task.statuses.len(),
        retained = block.lines.len(),
        evicted = block.evicted,
        download = !actions.is_empty(),
        "rendered task embed"
    );

    DisplayPayload {
        title: config.title.clone(),
        description,
        color: config.color,
        footer: completed.then(|| config.completed_footer.clone()),
        actions,
    }
}

/// Formats `statuses` and applies the sliding window.
pub fn render_status_block(config: &TaskEmbedConfig, statuses: &[StatusEvent]) -> StatusBlock {
    let mut window = StatusWindow::new(config.max_status_block_chars);
    for status in statuses {
        window.evict_over_budget();
        let (line, recorded) = render_status_line(config, status);
        window.accept(line, recorded);
    }
    window.finish()
}

/// Returns the finished line and the length recorded against the block budget.
pub fn render_status_line(config: &TaskEmbedConfig, status: &StatusEvent) -> (String, usize) {
    let body = render_status_body(status);
    let (mut line, recorded) = truncate_status_body(&body, config.max_status_line_chars);
    line.push_str(&format_status_timestamp(status.ts, config.timestamp_style));
    (line, recorded)
}

/// `` `<level>` <msg> k1=v1, k2=v2 `` without truncation or timestamp.
pub fn render_status_body(status: &StatusEvent) -> String {
    let mut body = format!("`{}` {}", status.level, status.msg);
    let extras = status
        .extra
        .iter()
        .filter(|(key, _)| !status.is_display_ignored(key))
        .map(|(key, value)| format!("{key}={}", render_extra_value(value)))
        .collect::<Vec<_>>();
    if !extras.is_empty() {
        body.push(' ');
        body.push_str(&extras.join(", "));
    }
    body
}

fn render_extra_value(value: &Value) -> String {
    match value {
        Value::String(raw) => raw.clone(),
        Value::Number(number) => natural_number(number),
        Value::Bool(flag) => flag.to_string(),
        Value::Null | Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

fn truncate_status_body(body: &str, max_chars: usize) -> (String, usize) {
    let total_chars = body.chars().count();
    if total_chars <= max_chars {
        return (body.to_string(), total_chars);
    }
    let mut truncated = body.chars().take(max_chars).collect::<String>();
    truncated.push_str(TRUNCATION_MARKER);
    (truncated, max_chars)
}

fn format_status_timestamp(ts: Option<f64>, style: TimestampStyle) -> String {
    match (style, ts) {
        (TimestampStyle::DiscordRelative, Some(seconds)) => {
            format!(" | <t:{}:R>", seconds.floor() as i64)
        }
        _ => format!(" | `[{}]`", format_utc_timestamp(ts)),
    }
}

fn format_utc_timestamp(ts: Option<f64>) -> String {
    let Some(seconds) = ts else {
        return INVALID_TIMESTAMP.to_string();
    };
    let millis = (seconds * 1000.0).trunc();
    if !millis.is_finite() || millis.abs() >= i64::MAX as f64 {
        tracing::warn!(ts = seconds, "task status timestamp out of range");
        return INVALID_TIMESTAMP.to_string();
    }
    match DateTime::from_timestamp_millis(millis as i64) {
        Some(at) => at.format(UTC_TIMESTAMP_FORMAT).to_string(),
        None => {
            tracing::warn!(ts = seconds, "task status timestamp out of range");
            INVALID_TIMESTAMP.to_string()
        }
    }
}

/// Glyph shown before the state label. Unknown and absent states share the
/// completed glyph.
pub fn state_glyph(state: Option<&TaskState>) -> &'static str {
    match state {
        Some(TaskState::Pending) => GLYPH_PENDING,
        Some(TaskState::Running) => GLYPH_RUNNING,
        Some(TaskState::Failed) => GLYPH_FAILED,
        Some(TaskState::Completed) | Some(TaskState::Other(_)) | None => GLYPH_COMPLETED,
    }
}

/// `<api_url>/tasks/<task_id>/ioauth/download-link`; `task_id` is used as-is.
pub fn download_link_url(api_url: &str, task_id: &str) -> String {
    format!(
        "{}/tasks/{}/ioauth/download-link",
        api_url.trim_end_matches('/'),
        task_id
    )
}
