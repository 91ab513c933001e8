//! # Watchbell Scheduler
//!
//! The monitor-and-notify core: a single-flight periodic scheduler, the
//! durable subscriber registry and artifact slot, change detection for the
//! status notifier and the day-bucketed capture/compile lifecycle for the
//! timelapse notifier.
//!
//! ## Architecture
//! ```text
//! Scheduler (tokio timers, one job at a time)
//!   ├── StatusJob  every 1h: fetch → format → compare → persist → Notifier
//!   └── CaptureJob every 10min: bucket → light on → capture → light off
//!                               └── after midnight: compile yesterday → Notifier
//!
//! CommandHandler (/start, /stopBot, /currentStatus, /help)
//!   └── same BotState mutex as the jobs
//!
//! Notifier → Transport::send_text / send_file, once per subscriber
//! ```

pub mod bucket;
pub mod commands;
pub mod compile;
pub mod engine;
pub mod notify;
pub mod state;
pub mod status;
pub mod store;
pub mod subscribers;
pub mod timelapse;

#[cfg(test)]
pub(crate) mod testing;

pub use bucket::{BucketDirectory, BucketKey};
pub use commands::{Command, CommandHandler};
pub use compile::GifCompiler;
pub use engine::{Job, Scheduler, SchedulerStats};
pub use notify::{DeliveryReport, Notifier};
pub use state::{BotState, SharedState};
pub use status::{StatusJob, StatusOutcome};
pub use store::ArtifactStore;
pub use subscribers::SubscriberRegistry;
pub use timelapse::{ActuationGate, CaptureJob, CaptureReport};
