// Task-Modul: Enthält alle Embassy Tasks
//
// Jeder Task läuft asynchron und unabhängig.
// Der Cycler-Task veröffentlicht Status-Snapshots, der Log-Task liest nur.

pub mod blink;
pub mod pattern_cycler;
pub mod status_log;

// Re-export Tasks für einfachen Import
pub use blink::blink_task;
pub use pattern_cycler::{gpio_pattern_task, pwm_pattern_task};
pub use status_log::status_log_task;
