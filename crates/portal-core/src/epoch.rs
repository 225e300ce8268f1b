use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Identifies one dispatched query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Epoch(u64);

impl Epoch {
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// What happened to one dispatched query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    Rendered(Epoch),
    /// A newer query was dispatched while this one was in flight.
    Stale(Epoch),
}

impl Dispatch {
    pub fn is_rendered(&self) -> bool {
        matches!(self, Dispatch::Rendered(_))
    }
}

/// Monotonic counter deciding which in-flight response may render.
///
/// Every dispatch calls [`advance`](Self::advance) and keeps the returned
/// [`Epoch`]. When the response arrives, only the holder of the latest epoch
/// may write; everything else is stale and dropped. The counter never
/// decreases, so it never needs resetting.
///
/// Writes go through [`commit`](Self::commit), which holds one lock across
/// the currency check and the write. Two responses finishing together on
/// different worker threads therefore cannot both pass the check and land
/// in the wrong order.
#[derive(Debug, Default)]
pub struct QueryEpochGuard {
    current: AtomicU64,
    commit: Mutex<()>,
}

impl QueryEpochGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new query, superseding every earlier one.
    pub fn advance(&self) -> Epoch {
        Epoch(self.current.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn current(&self) -> Epoch {
        Epoch(self.current.load(Ordering::SeqCst))
    }

    pub fn is_current(&self, epoch: Epoch) -> bool {
        self.current() == epoch
    }

    /// Run `write` if `epoch` is still the latest. Prepare everything before
    /// calling; `write` runs under the commit lock.
    pub fn commit(&self, epoch: Epoch, write: impl FnOnce()) -> Dispatch {
        let _commit = self.commit.lock().unwrap_or_else(|p| p.into_inner());
        if !self.is_current(epoch) {
            return Dispatch::Stale(epoch);
        }
        write();
        Dispatch::Rendered(epoch)
    }
}
