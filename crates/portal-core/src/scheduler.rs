use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::task::JoinHandle;

struct Pending {
    ticket: u64,
    handle: JoinHandle<()>,
}

type PendingMap<K> = Arc<Mutex<HashMap<K, Pending>>>;

fn lock<K>(map: &Mutex<HashMap<K, Pending>>) -> MutexGuard<'_, HashMap<K, Pending>> {
    map.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ─── Scheduler ────────────────────────────────────────────────────────────

/// Keyed delayed execution on the Tokio timer.
///
/// `schedule(key, delay, action)` replaces whatever is pending under `key`:
/// the old timer is cancelled and its action never runs. Suppressed actions
/// are not queued. Once a timer fires, its action is detached from the key
/// and can no longer be cancelled.
///
/// Timers use `tokio::time`, so tests drive them with a paused clock.
pub struct Scheduler<K> {
    pending: PendingMap<K>,
    next_ticket: AtomicU64,
}

impl<K> Default for Scheduler<K> {
    fn default() -> Self {
        Self {
            pending: Arc::new(Mutex::new(HashMap::new())),
            next_ticket: AtomicU64::new(0),
        }
    }
}

impl<K> Scheduler<K>
where
    K: Eq + Hash + Clone + Send + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Must be called from within a Tokio runtime.
    pub fn schedule<F>(&self, key: K, delay: Duration, action: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let ticket = self.next_ticket.fetch_add(1, Ordering::Relaxed);
        let pending = self.pending.clone();
        let task_key = key.clone();

        // Held across spawn + insert so the timer task cannot look for its
        // entry before it exists.
        let mut map = lock(&self.pending);
        if let Some(prev) = map.remove(&key) {
            prev.handle.abort();
        }

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let fired = {
                let mut map = lock(&pending);
                match map.get(&task_key) {
                    Some(entry) if entry.ticket == ticket => {
                        map.remove(&task_key);
                        true
                    }
                    _ => false,
                }
            };
            if fired {
                action.await;
            }
        });

        map.insert(key, Pending { ticket, handle });
    }

    /// Cancel the pending action under `key`. Returns `true` if one existed.
    pub fn cancel(&self, key: &K) -> bool {
        match lock(&self.pending).remove(key) {
            Some(entry) => {
                entry.handle.abort();
                true
            }
            None => false,
        }
    }

    pub fn is_pending(&self, key: &K) -> bool {
        lock(&self.pending).contains_key(key)
    }

    pub fn pending_count(&self) -> usize {
        lock(&self.pending).len()
    }
}

impl<K> Drop for Scheduler<K> {
    fn drop(&mut self) {
        for (_, entry) in lock(&self.pending).drain() {
            entry.handle.abort();
        }
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use tokio::time::sleep;

    fn counter() -> (Arc<AtomicUsize>, impl Fn() -> std::pin::Pin<Box<dyn Future<Output = ()> + Send>>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let h = hits.clone();
        let make = move || {
            let h = h.clone();
            Box::pin(async move {
                h.fetch_add(1, Ordering::SeqCst);
            }) as std::pin::Pin<Box<dyn Future<Output = ()> + Send>>
        };
        (hits, make)
    }

    #[tokio::test(start_paused = true)]
    async fn fires_after_delay() {
        let scheduler = Scheduler::new();
        let (hits, action) = counter();
        scheduler.schedule("search", Duration::from_millis(250), action());

        sleep(Duration::from_millis(249)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert!(scheduler.is_pending(&"search"));

        sleep(Duration::from_millis(2)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(!scheduler.is_pending(&"search"));
    }

    #[tokio::test(start_paused = true)]
    async fn rescheduling_same_key_restarts_timer() {
        let scheduler = Scheduler::new();
        let (hits, action) = counter();
        scheduler.schedule("search", Duration::from_millis(250), action());
        sleep(Duration::from_millis(200)).await;
        scheduler.schedule("search", Duration::from_millis(250), action());
        sleep(Duration::from_millis(200)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        sleep(Duration::from_millis(100)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(scheduler.pending_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn different_keys_are_independent() {
        let scheduler = Scheduler::new();
        let (hits, action) = counter();
        scheduler.schedule("a", Duration::from_millis(100), action());
        scheduler.schedule("b", Duration::from_millis(100), action());
        assert_eq!(scheduler.pending_count(), 2);
        sleep(Duration::from_millis(150)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_prevents_action() {
        let scheduler = Scheduler::new();
        let (hits, action) = counter();
        scheduler.schedule("search", Duration::from_millis(100), action());
        assert!(scheduler.cancel(&"search"));
        assert!(!scheduler.cancel(&"search"));
        sleep(Duration::from_millis(500)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn fired_action_survives_later_schedule() {
        let scheduler = Scheduler::new();
        let done = Arc::new(AtomicUsize::new(0));
        let d = done.clone();
        scheduler.schedule("search", Duration::from_millis(10), async move {
            sleep(Duration::from_millis(1000)).await;
            d.fetch_add(1, Ordering::SeqCst);
        });
        sleep(Duration::from_millis(20)).await;
        let (_hits, action) = counter();
        scheduler.schedule("search", Duration::from_millis(10), action());
        sleep(Duration::from_millis(2000)).await;
        assert_eq!(done.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn drop_aborts_pending_timers() {
        let (hits, action) = counter();
        {
            let scheduler = Scheduler::new();
            scheduler.schedule(1u32, Duration::from_millis(50), action());
        }
        sleep(Duration::from_millis(100)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }
}
