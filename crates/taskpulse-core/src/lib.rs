//! # TaskPulse Core Library
//!
//! This library provides the smart-scheduling core of the TaskPulse task
//! manager. It decides how urgent each task really is, learns how far the
//! user's estimates tend to be off, and times reminders accordingly. The
//! `taskpulse` CLI is a thin layer over the same library.
//!
//! ## Architecture
//!
//! - **Pressure**: pure `(task, now)` urgency classification
//! - **Conflicts / Suggestions**: overcommitment windows and a prioritized
//!   list of things to do about them
//! - **Estimation**: learned multipliers, adjusted estimates, realistic
//!   deadlines and procrastination risk
//! - **Scheduler**: a logical timer queue turned into notifications when
//!   polled, plus a tokio driver that polls it on time
//! - **Storage**: TOML configuration and a JSON pattern store
//!
//! ## Key Components
//!
//! - [`Session`]: host-owned entry point wiring everything together
//! - [`EstimationModel`]: learned patterns plus local offset
//! - [`Scheduler`]: timer queue and dispatch gate
//! - [`Config`]: application configuration management

pub mod clock;
pub mod conflict;
pub mod error;
pub mod estimation;
pub mod events;
pub mod notify;
pub mod pressure;
pub mod scheduler;
pub mod session;
pub mod storage;
pub mod suggestions;
pub mod task;

pub use clock::{Clock, ManualClock, SystemClock};
pub use conflict::{find_conflicts, ConflictWindow, Severity, WindowKind};
pub use error::{ConfigError, CoreError, PressureError, StoreError, ValidationError};
pub use estimation::{EstimationModel, RiskLevel, UserPatterns};
pub use events::Event;
pub use notify::{
    LogSink, MemorySink, Notification, NotificationKind, NotificationSettings, NotificationSink,
    SettingsPatch,
};
pub use pressure::{classify, PressureClassification, PressureLevel};
pub use scheduler::{Scheduler, TimerKey};
pub use session::Session;
pub use storage::{Config, FileStore, MemoryStore, PatternStore};
pub use suggestions::{suggest, Suggestion, SuggestionType};
pub use task::{Priority, Task, TaskRef, TaskSource};
