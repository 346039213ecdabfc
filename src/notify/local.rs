use super::{NotificationPlatform, ReminderRequest};
use crate::error::SchedulingError;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

/// Callback run when a reminder fires
pub type DeliverFn = Arc<dyn Fn(&ReminderRequest) + Send + Sync>;

/// How many fired or cancelled handles are remembered for quiet re-cancels
const RETIRED_CAPACITY: usize = 256;

#[derive(Default)]
struct Timers {
    pending: HashMap<String, JoinHandle<()>>,
    /// Most recently fired or cancelled handles, oldest first
    retired: VecDeque<String>,
}

impl Timers {
    fn retire(&mut self, handle: String) {
        if self.retired.len() == RETIRED_CAPACITY {
            self.retired.pop_front();
        }
        self.retired.push_back(handle);
    }

    fn is_retired(&self, handle: &str) -> bool {
        self.retired.iter().any(|h| h == handle)
    }
}

/// In-process notification platform driven by tokio timers.
///
/// Each scheduled reminder is a sleeping task keyed by a fresh UUID handle.
/// Outstanding timers are aborted on [`LocalNotifier::shutdown`] and on drop.
pub struct LocalNotifier {
    timers: Arc<Mutex<Timers>>,
    deliver: DeliverFn,
}

impl LocalNotifier {
    /// Platform delivering through [`super::desktop::deliver`]
    pub fn new() -> Self {
        Self::with_delivery(Arc::new(super::desktop::deliver))
    }

    pub fn with_delivery(deliver: DeliverFn) -> Self {
        Self {
            timers: Arc::new(Mutex::new(Timers::default())),
            deliver,
        }
    }

    /// Number of reminders still waiting to fire
    pub fn pending_count(&self) -> usize {
        lock(&self.timers).pending.len()
    }

    /// Abort every outstanding reminder
    pub fn shutdown(&self) {
        let mut timers = lock(&self.timers);
        for (handle, timer) in timers.pending.drain() {
            debug!(handle = %handle, "aborting reminder on shutdown");
            timer.abort();
        }
    }
}

impl Default for LocalNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for LocalNotifier {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn lock(timers: &Mutex<Timers>) -> MutexGuard<'_, Timers> {
    // A panic in a delivery callback must not wedge the registry
    timers.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl NotificationPlatform for LocalNotifier {
    async fn schedule(&self, request: ReminderRequest) -> Result<String, SchedulingError> {
        let delay = (request.fire_at - Utc::now())
            .to_std()
            .ok()
            .filter(|d| !d.is_zero())
            .ok_or_else(|| {
                SchedulingError::Refused(format!("fire time {} is not in the future", request.fire_at))
            })?;

        let handle = Uuid::new_v4().to_string();
        let timers = Arc::clone(&self.timers);
        let deliver = Arc::clone(&self.deliver);
        let fired_handle = handle.clone();

        let mut guard = lock(&self.timers);
        let timer = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            {
                let mut timers = lock(&timers);
                timers.pending.remove(&fired_handle);
                timers.retire(fired_handle);
            }
            deliver(&request);
        });
        guard.pending.insert(handle.clone(), timer);

        Ok(handle)
    }

    async fn cancel(&self, handle: &str) -> Result<(), SchedulingError> {
        let mut timers = lock(&self.timers);
        if let Some(timer) = timers.pending.remove(handle) {
            timer.abort();
            timers.retire(handle.to_string());
            return Ok(());
        }
        if timers.is_retired(handle) {
            debug!(handle, "reminder already fired or cancelled");
            return Ok(());
        }
        warn!(handle, "cancel requested for unknown reminder");
        Err(SchedulingError::UnknownHandle(handle.to_string()))
    }
}
