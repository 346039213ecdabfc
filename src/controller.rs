use crate::config::Config;
use crate::deferred::DeferredDeletes;
use crate::domain::{join_handles, NewTask, Task, TaskPatch};
use crate::error::{RemoteError, TaskinError};
use crate::notify::{NotificationPlatform, ReminderScheduler, Reminders};
use crate::remote::TaskStore;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Observable controller state for rendering
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskSnapshot {
    pub tasks: Vec<Task>,
    /// True while at least one top-level operation is in flight
    pub loading: bool,
    /// Message for the last failed operation, cleared on the next success
    pub last_error: Option<String>,
}

/// Timing knobs for reminders and auto-delete
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifecycleSettings {
    pub early_lead: chrono::Duration,
    pub auto_delete_delay: Duration,
}

impl Default for LifecycleSettings {
    fn default() -> Self {
        Self {
            early_lead: chrono::Duration::minutes(crate::notify::scheduler::DEFAULT_EARLY_LEAD_MINUTES),
            auto_delete_delay: crate::deferred::auto_delete_delay(),
        }
    }
}

impl From<&Config> for LifecycleSettings {
    fn from(config: &Config) -> Self {
        Self {
            early_lead: config.early_reminder_lead(),
            auto_delete_delay: config.auto_delete_delay(),
        }
    }
}

struct Inner<S: ?Sized, P: ?Sized> {
    store: Arc<S>,
    reminders: ReminderScheduler<P>,
    deferred: DeferredDeletes,
    state: watch::Sender<TaskSnapshot>,
    in_flight: AtomicUsize,
}

/// Owns the local task collection and keeps it in step with the task store.
///
/// Every mutation goes to the store first and is followed by a full refresh;
/// the local collection is never edited speculatively. Cloning yields another
/// handle to the same controller. Dropping the last handle cancels pending
/// deferred deletes.
pub struct TaskController<S: ?Sized, P: ?Sized> {
    inner: Arc<Inner<S, P>>,
}

impl<S: ?Sized, P: ?Sized> Clone for TaskController<S, P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Marks an operation as in flight for as long as it lives
struct LoadingGuard<'a> {
    state: &'a watch::Sender<TaskSnapshot>,
    in_flight: &'a AtomicUsize,
}

impl<'a> LoadingGuard<'a> {
    fn begin(state: &'a watch::Sender<TaskSnapshot>, in_flight: &'a AtomicUsize) -> Self {
        state.send_modify(|s| {
            let running = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            s.loading = running > 0;
        });
        Self { state, in_flight }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        let in_flight = self.in_flight;
        self.state.send_modify(|s| {
            let running = in_flight.fetch_sub(1, Ordering::SeqCst) - 1;
            s.loading = running > 0;
        });
    }
}

impl<S, P> TaskController<S, P>
where
    S: TaskStore + ?Sized + 'static,
    P: NotificationPlatform + ?Sized + 'static,
{
    pub fn new(store: Arc<S>, platform: Arc<P>) -> Self {
        Self::with_settings(store, platform, LifecycleSettings::default())
    }

    pub fn with_settings(store: Arc<S>, platform: Arc<P>, settings: LifecycleSettings) -> Self {
        let (state, _) = watch::channel(TaskSnapshot::default());
        Self {
            inner: Arc::new(Inner {
                store,
                reminders: ReminderScheduler::with_early_lead(platform, settings.early_lead),
                deferred: DeferredDeletes::new(settings.auto_delete_delay),
                state,
                in_flight: AtomicUsize::new(0),
            }),
        }
    }

    /// Current state
    pub fn snapshot(&self) -> TaskSnapshot {
        self.inner.state.borrow().clone()
    }

    /// Receiver notified on every state change
    pub fn subscribe(&self) -> watch::Receiver<TaskSnapshot> {
        self.inner.state.subscribe()
    }

    pub fn tasks(&self) -> Vec<Task> {
        self.inner.state.borrow().tasks.clone()
    }

    pub fn find(&self, id: &str) -> Option<Task> {
        self.inner.state.borrow().tasks.iter().find(|t| t.id == id).cloned()
    }

    /// Task ids with a deferred delete pending
    pub fn pending_deletes(&self) -> Vec<String> {
        self.inner.deferred.pending_ids()
    }

    /// Cancel every pending deferred delete
    pub fn shutdown(&self) {
        info!("controller shutting down, cancelling deferred deletes");
        self.inner.deferred.cancel_all();
    }

    fn begin(&self) -> LoadingGuard<'_> {
        LoadingGuard::begin(&self.inner.state, &self.inner.in_flight)
    }

    /// Record a failed top-level operation and hand the error back
    fn fail(&self, operation: &str, err: impl Into<TaskinError>) -> TaskinError {
        let err = err.into();
        error!(operation, error = %err, "task operation failed");
        let message = err.user_message(operation);
        self.inner.state.send_modify(|s| s.last_error = Some(message));
        err
    }

    async fn sync(&self) -> Result<(), RemoteError> {
        let records = self.inner.store.list().await?;
        let tasks: Vec<Task> = records.into_iter().map(Task::from_record).collect();
        debug!(count = tasks.len(), "task list refreshed");
        self.inner.state.send_modify(|s| {
            s.tasks = tasks;
            s.last_error = None;
        });
        Ok(())
    }

    /// Replace the local collection with the store's
    pub async fn refresh(&self) -> Result<(), TaskinError> {
        let _loading = self.begin();
        self.sync().await.map_err(|e| self.fail("fetch tasks", e))
    }

    /// Create a task, schedule its reminders, and refresh.
    ///
    /// Reminder problems never fail the operation; the task is then simply
    /// left without reminders.
    pub async fn add_task(
        &self,
        title: &str,
        description: &str,
        due_date: Option<DateTime<Utc>>,
    ) -> Result<Task, TaskinError> {
        let _loading = self.begin();
        let body = NewTask::new(title.to_string(), description.to_string(), due_date);
        let record = self
            .inner
            .store
            .create(&body)
            .await
            .map_err(|e| self.fail("add task", e))?;

        let mut created = Task::from_record(record);
        info!(task_id = %created.id, title = %created.title, "task created");

        if due_date.is_some() {
            created.due_date = due_date;
            created.notification_id = self.attach_reminders(&created).await;
        }

        self.sync().await.map_err(|e| self.fail("add task", e))?;
        Ok(self.find(&created.id).unwrap_or(created))
    }

    /// Schedule reminders for a freshly created task and persist their handles
    async fn attach_reminders(&self, task: &Task) -> Option<String> {
        let outcome = self.inner.reminders.schedule_reminders(task).await;
        if let Reminders::Failed(e) = &outcome {
            warn!(task_id = %task.id, error = %e, "task created without reminders");
        }
        let notification_id = join_handles(outcome.handles())?;

        let patch = TaskPatch::with_notification_id(notification_id.clone());
        match self.inner.store.update(&task.id, &patch).await {
            Ok(()) => Some(notification_id),
            Err(e) => {
                warn!(task_id = %task.id, error = %e, "could not persist reminder handles, cancelling them");
                self.inner.reminders.cancel_reminders(Some(&notification_id)).await;
                None
            }
        }
    }

    /// Flip a task's completion.
    ///
    /// Completing cancels its reminders and schedules it for deletion after the
    /// auto-delete delay; un-completing cancels that pending deletion. Unknown
    /// ids are ignored.
    pub async fn toggle_task(&self, id: &str) -> Result<(), TaskinError> {
        let Some(task) = self.find(id) else {
            debug!(task_id = id, "toggle for unknown task ignored");
            return Ok(());
        };
        let _loading = self.begin();

        if task.completed {
            self.inner
                .store
                .update(id, &TaskPatch::uncomplete())
                .await
                .map_err(|e| self.fail("update task", e))?;
            if self.inner.deferred.cancel(id) {
                info!(task_id = id, "task reopened, auto-delete cancelled");
            }
        } else {
            self.inner
                .store
                .complete(id)
                .await
                .map_err(|e| self.fail("update task", e))?;
            self.inner
                .reminders
                .cancel_reminders(task.notification_id.as_deref())
                .await;
            self.schedule_deferred_delete(id);
            info!(
                task_id = id,
                delete_in_ms = self.inner.deferred.delay().as_millis() as u64,
                "task completed"
            );
        }

        self.sync().await.map_err(|e| self.fail("update task", e))
    }

    fn schedule_deferred_delete(&self, id: &str) {
        let controller = Arc::downgrade(&self.inner);
        let task_id = id.to_string();
        self.inner.deferred.register(id, async move {
            let Some(inner) = controller.upgrade() else {
                debug!(task_id = %task_id, "controller gone, skipping deferred delete");
                return;
            };
            let controller = TaskController { inner };
            if let Err(e) = controller.delete_task(&task_id).await {
                warn!(task_id = %task_id, error = %e, "deferred delete failed");
            }
        });
    }

    /// Delete a task and its reminders, then refresh. Unknown ids are ignored.
    pub async fn delete_task(&self, id: &str) -> Result<(), TaskinError> {
        let Some(task) = self.find(id) else {
            debug!(task_id = id, "delete for unknown task ignored");
            return Ok(());
        };
        let _loading = self.begin();

        self.inner.deferred.cancel(id);
        if task.notification_id.is_some() {
            self.inner
                .reminders
                .cancel_reminders(task.notification_id.as_deref())
                .await;
        }

        match self.inner.store.delete(id).await {
            Ok(()) => info!(task_id = id, "task deleted"),
            Err(RemoteError::Status { status: 404, .. }) => {
                debug!(task_id = id, "task already gone from store");
            }
            Err(e) => return Err(self.fail("delete task", e)),
        }

        self.sync().await.map_err(|e| self.fail("delete task", e))
    }
}
