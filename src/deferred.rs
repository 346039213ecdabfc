use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

/// Default delay between completing a task and deleting it, in milliseconds
pub const DEFAULT_AUTO_DELETE_MS: u64 = 3000;

/// Get the default auto-delete delay
pub fn auto_delete_delay() -> Duration {
    Duration::from_millis(DEFAULT_AUTO_DELETE_MS)
}

struct Entry {
    generation: u64,
    timer: JoinHandle<()>,
}

#[derive(Default)]
struct Registry {
    next_generation: u64,
    entries: HashMap<String, Entry>,
}

/// Per-task delayed actions, at most one pending per task id.
///
/// Registering again for an id aborts the earlier timer. When a timer fires its
/// entry is detached before the action runs, so a later registration cannot
/// abort an action already in progress. Dropping the registry aborts all timers.
pub struct DeferredDeletes {
    delay: Duration,
    registry: Arc<Mutex<Registry>>,
}

fn lock(registry: &Mutex<Registry>) -> MutexGuard<'_, Registry> {
    registry.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl DeferredDeletes {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            registry: Arc::new(Mutex::new(Registry::default())),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Run `action` for `id` after the delay, replacing any pending timer for `id`.
    ///
    /// Returns true when an earlier timer was cancelled.
    pub fn register<F>(&self, id: &str, action: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let registry = Arc::clone(&self.registry);
        let key = id.to_string();
        let delay = self.delay;

        let mut guard = lock(&self.registry);
        let generation = guard.next_generation;
        guard.next_generation += 1;

        let timer = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let still_current = {
                let mut registry = lock(&registry);
                match registry.entries.get(&key) {
                    Some(entry) if entry.generation == generation => {
                        registry.entries.remove(&key);
                        true
                    }
                    _ => false,
                }
            };
            if still_current {
                debug!(task_id = %key, "deferred delete firing");
                action.await;
            }
        });

        match guard.entries.insert(id.to_string(), Entry { generation, timer }) {
            Some(previous) => {
                previous.timer.abort();
                debug!(task_id = id, "replaced pending deferred delete");
                true
            }
            None => {
                debug!(task_id = id, delay_ms = delay.as_millis() as u64, "deferred delete registered");
                false
            }
        }
    }

    /// Cancel the pending timer for `id`. Returns true if one was pending.
    pub fn cancel(&self, id: &str) -> bool {
        match lock(&self.registry).entries.remove(id) {
            Some(entry) => {
                entry.timer.abort();
                debug!(task_id = id, "deferred delete cancelled");
                true
            }
            None => false,
        }
    }

    /// Cancel every pending timer
    pub fn cancel_all(&self) {
        let mut registry = lock(&self.registry);
        for (id, entry) in registry.entries.drain() {
            entry.timer.abort();
            debug!(task_id = %id, "deferred delete cancelled on teardown");
        }
    }

    /// Ids with a pending timer, sorted
    pub fn pending_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = lock(&self.registry).entries.keys().cloned().collect();
        ids.sort();
        ids
    }
}

impl Default for DeferredDeletes {
    fn default() -> Self {
        Self::new(auto_delete_delay())
    }
}

impl Drop for DeferredDeletes {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
