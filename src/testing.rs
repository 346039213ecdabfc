//! In-memory fakes of the task store and notification platform for unit tests.

use crate::domain::{NewTask, TaskPatch, TaskRecord};
use crate::error::{RemoteError, SchedulingError};
use crate::notify::{NotificationPlatform, ReminderRequest};
use crate::remote::TaskStore;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// Ordered log of calls shared between fakes
#[derive(Debug, Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.0.lock().unwrap().clear();
    }
}

#[derive(Default)]
struct StoreState {
    records: Vec<TaskRecord>,
    next_id: u64,
    failing: HashSet<&'static str>,
}

#[derive(Default)]
pub struct FakeStore {
    state: Mutex<StoreState>,
    journal: Journal,
}

impl FakeStore {
    pub fn with_journal(journal: Journal) -> Self {
        Self {
            state: Mutex::default(),
            journal,
        }
    }

    pub fn seed(&self, id: &str, title: &str, completed: bool, notification_id: Option<&str>) {
        self.state.lock().unwrap().records.push(TaskRecord {
            id: id.to_string(),
            title: title.to_string(),
            description: String::new(),
            completed,
            due_date: None,
            notification_id: notification_id.map(str::to_string),
        });
    }

    /// Make every call to `op` ("list", "create", "update", "complete", "delete") fail
    pub fn fail(&self, op: &'static str) {
        self.state.lock().unwrap().failing.insert(op);
    }

    pub fn heal(&self, op: &'static str) {
        self.state.lock().unwrap().failing.remove(op);
    }

    pub fn records(&self) -> Vec<TaskRecord> {
        self.state.lock().unwrap().records.clone()
    }

    fn check(&self, op: &'static str) -> Result<(), RemoteError> {
        if self.state.lock().unwrap().failing.contains(op) {
            return Err(RemoteError::Transport(format!("{} unavailable", op)));
        }
        Ok(())
    }
}

fn not_found(method: &'static str, id: &str) -> RemoteError {
    RemoteError::Status {
        method,
        path: format!("/tasks/{}", id),
        status: 404,
    }
}

#[async_trait]
impl TaskStore for FakeStore {
    async fn list(&self) -> Result<Vec<TaskRecord>, RemoteError> {
        self.journal.push("list");
        self.check("list")?;
        Ok(self.records())
    }

    async fn create(&self, task: &NewTask) -> Result<TaskRecord, RemoteError> {
        self.journal.push(format!("create {}", task.title));
        self.check("create")?;
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let record = TaskRecord {
            id: state.next_id.to_string(),
            title: task.title.clone(),
            description: task.description.clone(),
            completed: false,
            due_date: task.due_date.clone(),
            notification_id: None,
        };
        state.records.push(record.clone());
        Ok(record)
    }

    async fn update(&self, id: &str, patch: &TaskPatch) -> Result<(), RemoteError> {
        self.journal.push(format!(
            "update {} {}",
            id,
            serde_json::to_string(patch).unwrap()
        ));
        self.check("update")?;
        let mut state = self.state.lock().unwrap();
        let record = state
            .records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| not_found("PUT", id))?;
        if let Some(completed) = patch.completed {
            record.completed = completed;
        }
        if let Some(notification_id) = &patch.notification_id {
            record.notification_id = Some(notification_id.clone());
        }
        Ok(())
    }

    async fn complete(&self, id: &str) -> Result<(), RemoteError> {
        self.journal.push(format!("complete {}", id));
        self.check("complete")?;
        let mut state = self.state.lock().unwrap();
        let record = state
            .records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| not_found("POST", id))?;
        record.completed = true;
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), RemoteError> {
        self.journal.push(format!("delete {}", id));
        self.check("delete")?;
        let mut state = self.state.lock().unwrap();
        let before = state.records.len();
        state.records.retain(|r| r.id != id);
        if state.records.len() == before {
            return Err(not_found("DELETE", id));
        }
        Ok(())
    }
}

#[derive(Default)]
struct PlatformState {
    next: u64,
    scheduled: Vec<(String, ReminderRequest)>,
    cancel_attempts: Vec<String>,
    cancelled: Vec<String>,
    fail_schedule_after: Option<usize>,
    fail_cancel: HashSet<String>,
}

#[derive(Default)]
pub struct FakePlatform {
    state: Mutex<PlatformState>,
    journal: Journal,
}

impl FakePlatform {
    pub fn with_journal(journal: Journal) -> Self {
        Self {
            state: Mutex::default(),
            journal,
        }
    }

    /// Refuse every schedule call once `n` reminders have been accepted
    pub fn fail_schedule_after(&self, n: usize) {
        self.state.lock().unwrap().fail_schedule_after = Some(n);
    }

    pub fn fail_cancel_for(&self, handle: &str) {
        self.state.lock().unwrap().fail_cancel.insert(handle.to_string());
    }

    pub fn scheduled(&self) -> Vec<(String, ReminderRequest)> {
        self.state.lock().unwrap().scheduled.clone()
    }

    pub fn cancel_attempts(&self) -> Vec<String> {
        self.state.lock().unwrap().cancel_attempts.clone()
    }

    pub fn cancelled(&self) -> Vec<String> {
        self.state.lock().unwrap().cancelled.clone()
    }
}

#[async_trait]
impl NotificationPlatform for FakePlatform {
    async fn schedule(&self, request: ReminderRequest) -> Result<String, SchedulingError> {
        let mut state = self.state.lock().unwrap();
        if state
            .fail_schedule_after
            .is_some_and(|n| state.scheduled.len() >= n)
        {
            self.journal.push("schedule refused");
            return Err(SchedulingError::Refused("permission denied".to_string()));
        }
        state.next += 1;
        let handle = format!("h{}", state.next);
        self.journal.push(format!("schedule {}", handle));
        state.scheduled.push((handle.clone(), request));
        Ok(handle)
    }

    async fn cancel(&self, handle: &str) -> Result<(), SchedulingError> {
        self.journal.push(format!("cancel {}", handle));
        let mut state = self.state.lock().unwrap();
        state.cancel_attempts.push(handle.to_string());
        if state.fail_cancel.contains(handle) {
            return Err(SchedulingError::UnknownHandle(handle.to_string()));
        }
        state.cancelled.push(handle.to_string());
        Ok(())
    }
}
