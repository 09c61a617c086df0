//! Core domain models: tasks, messages, and progress signals.

pub mod message;
pub mod signal;
pub mod task;

pub use message::{normalize_message_input, Message, Part};
pub use signal::ProgressSignal;
pub use task::{default_context_id, is_valid_timestamp, now_iso8601_millis, Task, TaskState, TaskStatus};
