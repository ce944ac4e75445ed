//! Chat embed rendering for asynchronous task status.
//!
//! Turns a task snapshot (state, status history, output metadata) into a
//! display payload with a bounded status history and an optional download
//! button, plus the Discord message body for it.
//!
//! ```rust
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use task_embed::{render_task_embed, Task, TaskEmbedConfig};
//!
//! let task = Task::from_json(
//!     r#"{
//!   "task_id": "abc123",
//!   "state": "completed",
//!   "statuses": [{ "level": "info", "msg": "done", "ts": 1700000000 }],
//!   "output": { "filename": "backup.zip" }
//! }"#,
//! )?;
//!
//! let config = TaskEmbedConfig::new("https://api.example.test");
//! let payload = render_task_embed(&config, &task);
//! assert!(payload.description.contains("Task ID: abc123"));
//! assert_eq!(
//!     payload.download_url(),
//!     Some("https://api.example.test/tasks/abc123/ioauth/download-link")
//! );
//! assert_eq!(payload.footer.as_deref(), Some("Backup created successfully"));
//! # Ok(())
//! # }
//! ```

pub mod task_embed_config;
pub mod task_embed_payload;
pub mod task_embed_render;
pub mod task_embed_snapshot;
pub mod task_embed_watch;

pub use task_embed_config::*;
pub use task_embed_payload::*;
pub use task_embed_render::*;
pub use task_embed_snapshot::*;
pub use task_embed_watch::*;
