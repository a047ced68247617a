use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::OwnedMutexGuard;

#[derive(Default)]
struct Slot {
    lock: Arc<tokio::sync::Mutex<()>>,
    in_flight: Arc<AtomicBool>,
}

impl Slot {
    fn share(&self) -> Self {
        Self {
            lock: self.lock.clone(),
            in_flight: self.in_flight.clone(),
        }
    }
}

type SlotMap = Arc<Mutex<HashMap<String, Slot>>>;

/// Serializes event handling per user identity.
///
/// Events for one identity queue behind each other; events for different
/// identities never contend beyond a short map lookup. While a holder marks
/// itself [`InFlight`] (waiting on external I/O), new events for the same
/// identity are turned away instead of queued.
#[derive(Default, Clone)]
pub struct IdentityLocks {
    slots: SlotMap,
}

impl IdentityLocks {
    /// No identity held.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `user_id`.
    ///
    /// Returns `None` when the identity is busy with external I/O.
    pub async fn acquire(&self, user_id: &str) -> Option<IdentityGuard> {
        let slot = self
            .slots
            .lock()
            .entry(user_id.to_string())
            .or_default()
            .share();

        if slot.in_flight.load(Ordering::Acquire) {
            return None;
        }

        let guard = slot.lock.clone().lock_owned().await;
        Some(IdentityGuard {
            user_id: user_id.to_string(),
            slots: self.slots.clone(),
            slot,
            guard: Some(guard),
        })
    }

    /// Number of identities with a live slot.
    pub fn tracked(&self) -> usize {
        self.slots.lock().len()
    }
}

/// Exclusive access to one identity; released on drop.
pub struct IdentityGuard {
    user_id: String,
    slots: SlotMap,
    slot: Slot,
    guard: Option<OwnedMutexGuard<()>>,
}

impl IdentityGuard {
    /// Mark the identity busy until the returned marker is dropped.
    pub fn in_flight(&self) -> InFlight {
        self.slot.in_flight.store(true, Ordering::Release);
        InFlight {
            flag: self.slot.in_flight.clone(),
        }
    }
}

impl Drop for IdentityGuard {
    fn drop(&mut self) {
        drop(self.guard.take());
        let mut slots = self.slots.lock();
        // Only the map and this guard reference the lock: nobody is waiting.
        if Arc::strong_count(&self.slot.lock) == 2 {
            slots.remove(&self.user_id);
        }
    }
}

/// Busy marker for an identity; cleared on drop.
pub struct InFlight {
    flag: Arc<AtomicBool>,
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
