//! Task snapshot model consumed by the embed renderer.
//!
//! Snapshots are produced by the external task tracker and decoded here with
//! lossy field handling: absent or oddly typed fields fall back to empty values
//! instead of failing the whole snapshot. Only a non-object top level or
//! malformed JSON is rejected.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Number, Value};
use thiserror::Error;

/// Status event keys that are never rendered as extra fields.
pub const RESERVED_STATUS_FIELDS: [&str; 4] = ["level", "msg", "ts", "botDisplayIgnore"];

const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

#[derive(Debug, Error)]
pub enum TaskSnapshotError {
    #[error("failed to parse task snapshot JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read task snapshot {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Lifecycle state reported by the task tracker.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TaskState {
    Pending,
    Running,
    Completed,
    Failed,
    /// Any state string the tracker reports that this crate does not know.
    Other(String),
}

impl TaskState {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "pending" => Self::Pending,
            "running" => Self::Running,
            "completed" => Self::Completed,
            "failed" => Self::Failed,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Other(raw) => raw.as_str(),
        }
    }

    /// Returns true while the tracker may still append statuses.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Pending | Self::Running)
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output metadata attached to a finished task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskOutput {
    pub filename: Option<String>,
}

impl TaskOutput {
    /// Returns the artifact filename when one was produced.
    pub fn download_filename(&self) -> Option<&str> {
        self.filename
            .as_deref()
            .filter(|filename| !filename.is_empty())
    }

    fn from_map(map: Map<String, Value>) -> Self {
        let filename = match map.get("filename") {
            Some(Value::String(filename)) if !filename.is_empty() => Some(filename.clone()),
            _ => None,
        };
        Self { filename }
    }
}

/// One entry of a task's status history.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusEvent {
    pub level: String,
    pub msg: String,
    /// Unix timestamp in seconds, possibly fractional.
    pub ts: Option<f64>,
    pub bot_display_ignore: Option<Vec<String>>,
    /// Remaining fields in document order.
    pub extra: Map<String, Value>,
}

impl StatusEvent {
    pub fn new(level: impl Into<String>, msg: impl Into<String>, ts: f64) -> Self {
        Self {
            level: level.into(),
            msg: msg.into(),
            ts: Some(ts),
            bot_display_ignore: None,
            extra: Map::new(),
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    pub fn with_display_ignore<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.bot_display_ignore = Some(keys.into_iter().map(Into::into).collect());
        self
    }

    /// Returns true when `key` must not show up in the rendered extra fields.
    pub fn is_display_ignored(&self, key: &str) -> bool {
        RESERVED_STATUS_FIELDS.contains(&key)
            || self
                .bot_display_ignore
                .as_ref()
                .is_some_and(|ignored| ignored.iter().any(|name| name == key))
    }

    fn from_map(map: Map<String, Value>) -> Self {
        let mut event = Self::default();
        for (key, value) in map {
            match key.as_str() {
                "level" => event.level = lossy_string(&value),
                "msg" => event.msg = lossy_string(&value),
                "ts" => event.ts = lossy_timestamp(&value),
                "botDisplayIgnore" => event.bot_display_ignore = lossy_string_list(value),
                _ => {
                    event.extra.insert(key, value);
                }
            }
        }
        event
    }
}

impl<'de> Deserialize<'de> for StatusEvent {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let map = Map::<String, Value>::deserialize(deserializer)?;
        Ok(Self::from_map(map))
    }
}

/// Read-only task snapshot handed to the renderer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Task {
    pub task_id: String,
    pub state: Option<TaskState>,
    pub statuses: Vec<StatusEvent>,
    pub output: Option<TaskOutput>,
}

impl Task {
    pub fn new(task_id: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            ..Self::default()
        }
    }

    pub fn with_state(mut self, state: TaskState) -> Self {
        self.state = Some(state);
        self
    }

    pub fn with_status(mut self, status: StatusEvent) -> Self {
        self.statuses.push(status);
        self
    }

    pub fn with_output_filename(mut self, filename: impl Into<String>) -> Self {
        self.output = Some(TaskOutput {
            filename: Some(filename.into()),
        });
        self
    }

    pub fn from_json(source: &str) -> Result<Self, TaskSnapshotError> {
        Ok(serde_json::from_str::<Task>(source)?)
    }

    pub fn from_value(value: Value) -> Result<Self, TaskSnapshotError> {
        Ok(serde_json::from_value::<Task>(value)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, TaskSnapshotError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| TaskSnapshotError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&raw)
    }

    /// Filename of the downloadable artifact, if the output names one.
    pub fn download_filename(&self) -> Option<&str> {
        self.output.as_ref().and_then(TaskOutput::download_filename)
    }

    fn from_map(map: Map<String, Value>) -> Self {
        let mut task = Self::default();
        for (key, value) in map {
            match key.as_str() {
                "task_id" => task.task_id = lossy_string(&value),
                "state" => task.state = lossy_state(&value),
                "statuses" => task.statuses = lossy_statuses(value),
                "output" => {
                    task.output = match value {
                        Value::Object(map) => Some(TaskOutput::from_map(map)),
                        _ => None,
                    }
                }
                _ => {}
            }
        }
        task
    }
}

impl<'de> Deserialize<'de> for Task {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let map = Map::<String, Value>::deserialize(deserializer)?;
        Ok(Self::from_map(map))
    }
}

pub(crate) fn lossy_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(raw) => raw.clone(),
        Value::Number(number) => natural_number(number),
        other => other.to_string(),
    }
}

/// Integral floats print without a fractional part (`1.0` → `1`).
pub(crate) fn natural_number(number: &Number) -> String {
    if number.is_f64() {
        if let Some(value) = number.as_f64() {
            if value.fract() == 0.0 && value.abs() < MAX_SAFE_INTEGER {
                return format!("{}", value as i64);
            }
        }
    }
    number.to_string()
}

fn lossy_timestamp(value: &Value) -> Option<f64> {
    let seconds = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(raw) => raw.trim().parse::<f64>().ok(),
        _ => None,
    };
    seconds.filter(|seconds| seconds.is_finite())
}

fn lossy_string_list(value: Value) -> Option<Vec<String>> {
    match value {
        Value::Array(items) => Some(
            items
                .into_iter()
                .filter_map(|item| match item {
                    Value::String(name) => Some(name),
                    _ => None,
                })
                .collect(),
        ),
        _ => None,
    }
}

fn lossy_state(value: &Value) -> Option<TaskState> {
    match value {
        Value::Null => None,
        other => Some(TaskState::parse(&lossy_string(other))),
    }
}

fn lossy_statuses(value: Value) -> Vec<StatusEvent> {
    let Value::Array(items) = value else {
        return Vec::new();
    };
    let total = items.len();
    let statuses = items
        .into_iter()
        .filter_map(|item| match item {
            Value::Object(map) => Some(StatusEvent::from_map(map)),
            _ => None,
        })
        .collect::<Vec<_>>();
    if statuses.len() != total {
        tracing::debug!(
            skipped = total - statuses.len(),
            "ignored non-object entries in task statuses"
        );
    }
    statuses
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tempfile::tempdir;

    use super::{natural_number, StatusEvent, Task, TaskSnapshotError, TaskState};

    #[test]
    fn unit_task_state_parse_keeps_unknown_values() {
        assert_eq!(TaskState::parse("pending"), TaskState::Pending);
        assert_eq!(TaskState::parse("failed"), TaskState::Failed);
        let other = TaskState::parse("paused");
        assert_eq!(other, TaskState::Other("paused".to_string()));
        assert_eq!(other.to_string(), "paused");
        assert!(!other.is_active());
        assert!(TaskState::Running.is_active());
    }

    #[test]
    fn functional_task_from_json_splits_core_and_extra_fields() {
        let task = Task::from_json(
            r#"{
                "task_id": "abc123",
                "state": "running",
                "statuses": [
                    {
                        "level": "info",
                        "msg": "Created channel backup allocations",
                        "ts": 1700000000.25,
                        "zeta": 1,
                        "alloc": {"123": 100},
                        "alpha": "x",
                        "botDisplayIgnore": ["alloc"]
                    }
                ]
            }"#,
        )
        .expect("snapshot should parse");

        assert_eq!(task.task_id, "abc123");
        assert_eq!(task.state, Some(TaskState::Running));
        let status = &task.statuses[0];
        assert_eq!(status.level, "info");
        assert_eq!(status.ts, Some(1_700_000_000.25));
        assert_eq!(
            status.bot_display_ignore.as_deref(),
            Some(&["alloc".to_string()][..])
        );
        let keys = status.extra.keys().cloned().collect::<Vec<_>>();
        assert_eq!(keys, vec!["zeta", "alloc", "alpha"]);
    }

    #[test]
    fn functional_task_from_json_tolerates_missing_and_odd_fields() {
        let task = Task::from_json(
            r#"{
                "task_id": 42,
                "state": null,
                "statuses": [null, {"level": 3, "ts": "1700000000"}, {}],
                "output": {"filename": ""}
            }"#,
        )
        .expect("snapshot should parse");

        assert_eq!(task.task_id, "42");
        assert_eq!(task.state, None);
        assert_eq!(task.statuses.len(), 2);
        assert_eq!(task.statuses[0].level, "3");
        assert_eq!(task.statuses[0].msg, "");
        assert_eq!(task.statuses[0].ts, Some(1_700_000_000.0));
        assert_eq!(task.statuses[1], StatusEvent::default());
        assert_eq!(task.download_filename(), None);
    }

    #[test]
    fn regression_task_from_json_ignores_non_array_statuses() {
        let task = Task::from_json(r#"{"task_id":"t","statuses":"oops","output":7}"#)
            .expect("snapshot should parse");
        assert!(task.statuses.is_empty());
        assert!(task.output.is_none());
    }

    #[test]
    fn regression_task_from_json_rejects_non_object_snapshot() {
        let error = Task::from_json("[1,2,3]").expect_err("array snapshot must fail");
        assert!(matches!(error, TaskSnapshotError::Parse(_)));
    }

    #[test]
    fn regression_task_rejects_positional_array_snapshot() {
        let raw = r#"["abc123","completed",[],{"filename":"b.zip"}]"#;
        let error = Task::from_json(raw).expect_err("positional snapshot must fail");
        assert!(matches!(error, TaskSnapshotError::Parse(_)));

        let value = serde_json::from_str::<serde_json::Value>(raw).expect("valid json");
        let error = Task::from_value(value).expect_err("positional value must fail");
        assert!(matches!(error, TaskSnapshotError::Parse(_)));
    }

    #[test]
    fn regression_task_output_filename_requires_non_empty_string() {
        for filename in [json!(false), json!(0), json!(true), json!(["b.zip"]), json!("")] {
            let task = Task::from_value(json!({
                "task_id": "t",
                "state": "completed",
                "output": {"filename": filename.clone()}
            }))
            .expect("snapshot should parse");
            assert_eq!(task.download_filename(), None, "filename={filename}");
        }
    }

    #[test]
    fn regression_task_id_integral_float_prints_without_fraction() {
        let task = Task::from_json(r#"{"task_id": 42.0, "statuses": [{"level": 1.0}]}"#)
            .expect("snapshot should parse");
        assert_eq!(task.task_id, "42");
        assert_eq!(task.statuses[0].level, "1");

        let task = Task::from_json(r#"{"task_id": 42.5}"#).expect("snapshot should parse");
        assert_eq!(task.task_id, "42.5");
    }

    #[test]
    fn unit_natural_number_keeps_large_and_fractional_values() {
        let number = |raw: &str| serde_json::from_str::<serde_json::Number>(raw).expect("number");
        assert_eq!(natural_number(&number("1.0")), "1");
        assert_eq!(natural_number(&number("-3.0")), "-3");
        assert_eq!(natural_number(&number("7")), "7");
        assert_eq!(natural_number(&number("0.25")), "0.25");
        assert_eq!(natural_number(&number("1e300")), "1e300");
    }

    #[test]
    fn functional_task_from_path_reads_snapshot_file() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("task.json");
        std::fs::write(
            &path,
            json!({
                "task_id": "file-task",
                "state": "completed",
                "statuses": [],
                "output": {"filename": "backup.iblcli-backup"}
            })
            .to_string(),
        )
        .expect("write snapshot");

        let task = Task::from_path(&path).expect("snapshot should load");
        assert_eq!(task.task_id, "file-task");
        assert_eq!(task.download_filename(), Some("backup.iblcli-backup"));
    }

    #[test]
    fn regression_task_from_path_reports_missing_file() {
        let temp = tempdir().expect("tempdir");
        let error = Task::from_path(temp.path().join("missing.json")).expect_err("must fail");
        assert!(matches!(error, TaskSnapshotError::Io { .. }));
        assert!(error.to_string().contains("missing.json"));
    }

    #[test]
    fn unit_status_event_display_ignore_covers_reserved_and_listed_keys() {
        let status = StatusEvent::new("info", "done", 1.0)
            .with_field("kept", json!(1))
            .with_display_ignore(["hidden"]);
        assert!(status.is_display_ignored("level"));
        assert!(status.is_display_ignored("botDisplayIgnore"));
        assert!(status.is_display_ignored("hidden"));
        assert!(!status.is_display_ignored("kept"));
    }
}
