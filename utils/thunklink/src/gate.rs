//! The single guest-to-host crossing point.
//!
//! Guest stubs never talk to a dispatcher directly. They build a record and hand it to
//! [`forward`], which routes it through whichever [`Gate`] is current for the calling thread:
//! the one bound with [`scoped`] if any, otherwise the process-wide one from [`install`].

use std::{
    cell::RefCell,
    sync::{Arc, OnceLock},
};

use crate::{CallRecord, GateError, ProtocolError, RawCall};

// === Traits === //

/// Transports one call record to the host and returns once the host has finished with it,
/// including every callback it relayed back into the guest along the way.
pub trait Gate: Send + Sync {
    fn syscall(&self, call: RawCall<'_>);
}

/// The host's way back into the guest: runs guest routine `entry` with the guest address of a
/// callback record and returns the routine's result.
pub trait GuestInvoker {
    fn invoke(&self, entry: u64, arg: u64) -> u64;
}

// === Installation === //

static GLOBAL_GATE: OnceLock<Arc<dyn Gate>> = OnceLock::new();

thread_local! {
    static SCOPED_GATE: RefCell<Option<Arc<dyn Gate>>> = const { RefCell::new(None) };
}

pub fn install(gate: Arc<dyn Gate>) -> Result<(), GateError> {
    GLOBAL_GATE
        .set(gate)
        .map_err(|_| GateError::AlreadyInstalled)
}

/// Binds `gate` for the current thread while `f` runs, shadowing the process-wide gate.
pub fn scoped<R>(gate: Arc<dyn Gate>, f: impl FnOnce() -> R) -> R {
    let _guard = scopeguard::guard(
        SCOPED_GATE.with_borrow_mut(|v| v.replace(gate)),
        |old| {
            SCOPED_GATE.set(old);
        },
    );

    f()
}

pub fn current() -> Option<Arc<dyn Gate>> {
    SCOPED_GATE
        .with_borrow(|v| v.clone())
        .or_else(|| GLOBAL_GATE.get().cloned())
}

// === Crossing === //

pub fn syscall(call: RawCall<'_>) {
    let Some(gate) = current() else {
        panic!("{}", ProtocolError::NoGate);
    };

    gate.syscall(call);
}

/// Sends `record` across the current gate and returns the host's `iret`.
pub fn forward<T: CallRecord>(mut record: T) -> u64 {
    syscall(RawCall::new(&mut record));
    record.header().iret
}
