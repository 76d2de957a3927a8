use std::{cell::Cell, mem, thread::LocalKey};

use bytemuck::Pod;

use crate::{HostCx, ProtocolError};

// === RelayState === //

/// The signature of a guest routine the host can enter: it receives the guest address of a
/// callback record and returns the value handed back to the native caller.
pub type GuestEntry = unsafe extern "C" fn(u64) -> u64;

/// Whether the current thread is inside a relayed callback.
///
/// A thread is `InCallback` from the moment a handler hands a guest callback to a native until
/// that native returns, and for as long as a guest routine entered on its behalf is running.
/// `depth` counts how many such relays are nested.
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq)]
pub enum RelayState {
    Idle,
    InCallback { depth: u32 },
}

thread_local! {
    /// Guest routines currently entered on this thread. This is what the depth limit bounds.
    static CROSSINGS: Cell<u32> = const { Cell::new(0) };

    /// Natives currently running on this thread with a guest callback in hand.
    static RELAYS: Cell<u32> = const { Cell::new(0) };
}

impl RelayState {
    pub fn current() -> Self {
        // The native's thread leads with relays, the guest's thread with crossings. On a shared
        // thread the two move in step.
        match CROSSINGS.get().max(RELAYS.get()) {
            0 => Self::Idle,
            depth => Self::InCallback { depth },
        }
    }
}

#[must_use]
pub struct RelayGuard {
    counter: &'static LocalKey<Cell<u32>>,
}

impl Drop for RelayGuard {
    fn drop(&mut self) {
        self.counter.set(self.counter.get() - 1);
    }
}

/// Marks the current thread as running one more level of guest callback.
pub fn enter(max_depth: u32) -> RelayGuard {
    let depth = CROSSINGS.get() + 1;

    if depth > max_depth {
        panic!("{}", ProtocolError::CallbackDepth { limit: max_depth });
    }

    CROSSINGS.set(depth);
    RelayGuard {
        counter: &CROSSINGS,
    }
}

/// Marks the current thread as running a native that may call back into the guest. Hold the
/// guard for the whole native call.
pub fn begin_relay() -> RelayGuard {
    RELAYS.set(RELAYS.get() + 1);
    RelayGuard { counter: &RELAYS }
}

/// Runs a guest routine on the current thread.
///
/// ## Safety
///
/// `entry` must be the address of a live [`GuestEntry`] and `arg` must be what that routine
/// expects.
///
pub unsafe fn execute_guest_entry(entry: u64, arg: u64, max_depth: u32) -> u64 {
    if entry == 0 {
        panic!("{}", ProtocolError::NullGuestEntry);
    }

    let _guard = enter(max_depth);
    let entry = unsafe { mem::transmute::<usize, GuestEntry>(entry as usize) };

    unsafe { entry(arg) }
}

// === GuestCallback === //

/// The per-call context a host trampoline needs to relay a native callback into the guest.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct GuestCallback {
    /// Guest entry that unpacks the callback record and calls `func`.
    pub wrapper: u64,
    pub func: u64,
    pub param: u64,
}

impl GuestCallback {
    /// Returns `None` for a null guest callback, in which case no relaying should happen at all.
    pub fn new(wrapper: u64, func: u64, param: u64) -> Option<Self> {
        (func != 0).then_some(Self {
            wrapper,
            func,
            param,
        })
    }

    /// Starts relaying this callback; see [`begin_relay`].
    pub fn relaying(&self) -> RelayGuard {
        begin_relay()
    }

    /// Crosses into the guest's `wrapper` with `record`. The record must live in shared memory
    /// for the duration of the call.
    pub fn invoke<T: Pod>(&self, cx: &HostCx<'_>, record: &mut T) -> u64 {
        let arg = cx.h2g(record as *const T);

        tracing::trace!(
            wrapper = self.wrapper,
            func = self.func,
            depth = ?RelayState::current(),
            "relaying callback to guest"
        );

        let ret = cx.guest().invoke(self.wrapper, arg);

        tracing::trace!(ret, "guest callback returned");

        ret
    }
}
