use std::sync::{Arc, Condvar, Mutex, PoisonError};

use derive_where::derive_where;

struct Slot<T> {
    value: Mutex<Option<T>>,
    ready: Condvar,
}

/// Creates a single-slot handoff. Each exchange must be received before the next one is sent.
pub fn rendezvous<T>() -> (RendezvousTx<T>, RendezvousRx<T>) {
    let slot = Arc::new(Slot {
        value: Mutex::new(None),
        ready: Condvar::new(),
    });

    (
        RendezvousTx { slot: slot.clone() },
        RendezvousRx { slot },
    )
}

#[derive_where(Clone)]
pub struct RendezvousTx<T> {
    slot: Arc<Slot<T>>,
}

impl<T> RendezvousTx<T> {
    pub fn send(&self, value: T) {
        let mut slot = self
            .slot
            .value
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        assert!(slot.is_none(), "rendezvous slot already holds a value");

        *slot = Some(value);
        self.slot.ready.notify_one();
    }
}

#[derive_where(Clone)]
pub struct RendezvousRx<T> {
    slot: Arc<Slot<T>>,
}

impl<T> RendezvousRx<T> {
    pub fn recv(&self) -> T {
        let mut slot = self
            .slot
            .value
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        loop {
            if let Some(value) = slot.take() {
                return value;
            }

            slot = self
                .slot
                .ready
                .wait(slot)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }
}
