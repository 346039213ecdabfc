use super::{NotificationPlatform, ReminderRequest};
use crate::domain::{split_handles, ReminderKind, Task};
use crate::error::SchedulingError;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Default lead time of the early reminder
pub const DEFAULT_EARLY_LEAD_MINUTES: i64 = 15;

/// Outcome of scheduling reminders for a task
#[derive(Debug)]
pub enum Reminders {
    /// Handles in order {early (if any), due}
    Scheduled(Vec<String>),
    /// No due date, or the due date is not in the future
    Skipped,
    /// The platform refused; nothing is left scheduled
    Failed(SchedulingError),
}

impl Reminders {
    /// Handles to persist as the task's `notification_id` (empty unless scheduled)
    pub fn handles(&self) -> &[String] {
        match self {
            Reminders::Scheduled(handles) => handles,
            Reminders::Skipped | Reminders::Failed(_) => &[],
        }
    }
}

/// Turns a task's due date into reminders on a [`NotificationPlatform`]
pub struct ReminderScheduler<P: ?Sized> {
    platform: Arc<P>,
    early_lead: Duration,
}

impl<P: NotificationPlatform + ?Sized> ReminderScheduler<P> {
    pub fn with_early_lead(platform: Arc<P>, early_lead: Duration) -> Self {
        Self { platform, early_lead }
    }

    /// Schedule reminders for `task` relative to the current time
    pub async fn schedule_reminders(&self, task: &Task) -> Reminders {
        self.schedule_reminders_at(task, Utc::now()).await
    }

    /// Schedule reminders for `task` relative to `now`
    pub async fn schedule_reminders_at(&self, task: &Task, now: DateTime<Utc>) -> Reminders {
        let due = match task.due_date {
            Some(due) if due > now => due,
            _ => {
                debug!(task_id = %task.id, "no future due date, no reminders");
                return Reminders::Skipped;
            }
        };

        let early_time = due - self.early_lead;
        let mut plan = Vec::with_capacity(2);
        if early_time > now {
            plan.push((ReminderKind::Early, early_time));
        } else {
            debug!(task_id = %task.id, %early_time, "early reminder time already passed, skipping it");
        }
        plan.push((ReminderKind::Due, due));

        let mut handles = Vec::with_capacity(plan.len());
        for (kind, fire_at) in plan {
            let request = ReminderRequest {
                task_id: task.id.clone(),
                kind,
                title: kind.title(&task.title),
                body: kind.body(&task.description, self.early_lead.num_minutes()),
                fire_at,
            };
            match self.platform.schedule(request).await {
                Ok(handle) => {
                    debug!(task_id = %task.id, kind = kind.to_tag(), %fire_at, handle = %handle, "reminder scheduled");
                    handles.push(handle);
                }
                Err(e) => {
                    error!(task_id = %task.id, kind = kind.to_tag(), error = %e, "scheduling failed");
                    // leave nothing orphaned: the task will carry no notification_id
                    for handle in &handles {
                        self.cancel_one(handle).await;
                    }
                    return Reminders::Failed(e);
                }
            }
        }

        info!(task_id = %task.id, count = handles.len(), "reminders scheduled");
        Reminders::Scheduled(handles)
    }

    /// Cancel every handle in a combined `notification_id`, best-effort.
    ///
    /// Returns how many handles were cancelled successfully.
    pub async fn cancel_reminders(&self, notification_id: Option<&str>) -> usize {
        let Some(combined) = notification_id else {
            return 0;
        };
        let mut cancelled = 0;
        for handle in split_handles(combined) {
            if self.cancel_one(handle).await {
                cancelled += 1;
            }
        }
        cancelled
    }

    async fn cancel_one(&self, handle: &str) -> bool {
        match self.platform.cancel(handle).await {
            Ok(()) => {
                debug!(handle, "reminder cancelled");
                true
            }
            Err(e) => {
                warn!(handle, error = %e, "failed to cancel reminder");
                false
            }
        }
    }
}
