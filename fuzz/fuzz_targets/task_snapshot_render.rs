#![no_main]

use libfuzzer_sys::fuzz_target;
use task_embed::{render_status_block, render_task_embed, Task, TaskEmbedConfig, TaskState};

fuzz_target!(|data: &[u8]| {
    let raw = String::from_utf8_lossy(data);
    let Ok(task) = Task::from_json(&raw) else {
        return;
    };

    let config = TaskEmbedConfig::new("https://fuzz.example.test");
    let block = render_status_block(&config, &task.statuses);
    assert!(block.retained_chars <= config.max_status_block_chars);
    assert_eq!(block.lines.len() + block.evicted, task.statuses.len());

    let payload = render_task_embed(&config, &task);
    assert_eq!(payload, render_task_embed(&config, &task));

    let completed = matches!(task.state, Some(TaskState::Completed));
    assert_eq!(payload.footer.is_some(), completed);
    assert_eq!(
        payload.actions.len(),
        usize::from(completed && task.download_filename().is_some())
    );
    let body = payload.to_discord_message_body();
    assert!(body["embeds"].is_array());
});
