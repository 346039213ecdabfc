//! Due-date reminders: the platform seam, a tokio-backed local platform,
//! and the scheduler that turns a task into zero, one, or two reminders.

pub mod desktop;
pub mod local;
pub mod scheduler;

use crate::domain::ReminderKind;
use crate::error::SchedulingError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub use local::LocalNotifier;
pub use scheduler::{ReminderScheduler, Reminders};

/// One reminder to be delivered at `fire_at`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderRequest {
    /// Correlation data routing the reminder back to its task
    pub task_id: String,
    pub kind: ReminderKind,
    pub title: String,
    pub body: String,
    pub fire_at: DateTime<Utc>,
}

/// Something that can deliver time-triggered local notifications
#[async_trait]
pub trait NotificationPlatform: Send + Sync {
    /// Schedule a reminder, returning an opaque handle
    async fn schedule(&self, request: ReminderRequest) -> Result<String, SchedulingError>;

    /// Cancel a previously scheduled reminder
    async fn cancel(&self, handle: &str) -> Result<(), SchedulingError>;
}
