use serde_json::{json, Value};
use task_embed::{
    render_status_block, render_task_embed, Task, TaskEmbedConfig, TaskSnapshotDecision,
    TaskSnapshotTracker,
};

const API_URL: &str = "https://api.example.test";

fn backup_snapshot(state: &str, statuses: Vec<Value>, output: Value) -> Task {
    Task::from_value(json!({
        "task_id": "backup-7f3a",
        "task_name": "create_backup",
        "state": state,
        "statuses": statuses,
        "output": output,
    }))
    .expect("snapshot decodes")
}

#[test]
fn integration_backup_snapshot_renders_discord_message_body() {
    let task = backup_snapshot(
        "completed",
        vec![
            json!({"level": "info", "msg": "Starting backup", "ts": 1700000000}),
            json!({
                "level": "info",
                "msg": "Created channel backup allocations",
                "ts": 1700000030,
                "alloc": {"111": 500, "222": 100},
                "botDisplayIgnore": ["alloc"]
            }),
            json!({"level": "info", "msg": "Backed up channel", "ts": 1700000060, "channel_id": "111", "count": 500}),
        ],
        json!({"filename": "antiraid-backup.iblcli-backup"}),
    );

    let body = render_task_embed(&TaskEmbedConfig::new(API_URL), &task).to_discord_message_body();
    let description = body["embeds"][0]["description"].as_str().expect("description");
    let lines = description.lines().collect::<Vec<_>>();

    assert_eq!(lines[0], ":white_check_mark: Task state: completed");
    assert_eq!(lines[1], "Task ID: backup-7f3a");
    assert_eq!(lines[2], "");
    assert_eq!(
        lines[3],
        "`info` Starting backup | `[Tue Nov 14 2023 22:13:20 UTC]`"
    );
    assert_eq!(
        lines[4],
        "`info` Created channel backup allocations | `[Tue Nov 14 2023 22:13:50 UTC]`"
    );
    assert_eq!(
        lines[5],
        "`info` Backed up channel channel_id=111, count=500 | `[Tue Nov 14 2023 22:14:20 UTC]`"
    );
    assert!(description.ends_with(
        ":link: [Download](https://api.example.test/tasks/backup-7f3a/ioauth/download-link)"
    ));
    assert_eq!(body["embeds"][0]["title"], "Creating backup");
    assert_eq!(body["embeds"][0]["color"], 0x57F287);
    assert_eq!(
        body["components"][0]["components"][0]["url"],
        "https://api.example.test/tasks/backup-7f3a/ioauth/download-link"
    );
}

#[test]
fn integration_long_history_keeps_only_recent_events() {
    let statuses = (0..10)
        .map(|index| {
            json!({
                "level": "info",
                "msg": format!("event-{index:02} {}", "y".repeat(600)),
                "ts": 1700000000 + index * 60,
            })
        })
        .collect::<Vec<_>>();
    let task = backup_snapshot("running", statuses, Value::Null);
    let config = TaskEmbedConfig::new(API_URL);

    let block = render_status_block(&config, &task.statuses);
    assert!(block.retained_chars <= 2500);
    assert_eq!(block.evicted, 5);

    let payload = render_task_embed(&config, &task);
    assert!(!payload.description.contains("event-04"));
    for index in 5..10 {
        assert!(payload.description.contains(&format!("event-{index:02}")));
    }
    assert!(payload.actions.is_empty());
    assert_eq!(payload.footer, None);
}

#[test]
fn integration_tracker_and_renderer_follow_task_progress() {
    let config = TaskEmbedConfig::new(API_URL);
    let mut tracker = TaskSnapshotTracker::new();
    let first = json!({"level": "info", "msg": "queued", "ts": 1700000000});
    let second = json!({"level": "info", "msg": "packing", "ts": 1700000005});

    let snapshots = [
        backup_snapshot("pending", vec![first.clone()], Value::Null),
        backup_snapshot("pending", vec![first.clone()], Value::Null),
        backup_snapshot("running", vec![first.clone(), second.clone()], Value::Null),
        backup_snapshot("completed", vec![first, second], json!({"filename": "b.zip"})),
    ];

    let mut rendered = Vec::new();
    let mut decisions = Vec::new();
    for snapshot in &snapshots {
        let decision = tracker.observe(snapshot);
        decisions.push(decision);
        if decision.should_render() {
            rendered.push(render_task_embed(&config, snapshot));
        }
    }

    assert_eq!(
        decisions,
        vec![
            TaskSnapshotDecision::Render,
            TaskSnapshotDecision::Unchanged,
            TaskSnapshotDecision::Render,
            TaskSnapshotDecision::RenderFinal,
        ]
    );
    assert_eq!(rendered.len(), 3);
    assert!(rendered[0].description.starts_with(":hourglass: Task state: pending"));
    assert_eq!(rendered[2].actions.len(), 1);
    assert_eq!(
        rendered[2].footer.as_deref(),
        Some("Backup created successfully")
    );
}
