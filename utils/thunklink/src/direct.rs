use std::sync::Arc;

use crate::{
    Dispatcher, HostCx, RawCall, SharedRegion,
    gate::{Gate, GuestInvoker},
    relay,
};

/// A gate for guests that share the host's thread: every record is dispatched inline, and guest
/// callbacks are entered as plain function calls on the same stack.
#[derive(Debug, Clone)]
pub struct DirectGate {
    dispatcher: Arc<Dispatcher>,
    region: SharedRegion,
    max_callback_depth: u32,
}

impl DirectGate {
    pub fn new(dispatcher: Arc<Dispatcher>, region: SharedRegion, max_callback_depth: u32) -> Self {
        Self {
            dispatcher,
            region,
            max_callback_depth,
        }
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }
}

impl Gate for DirectGate {
    fn syscall(&self, call: RawCall<'_>) {
        let cx = HostCx::new(&self.region, self);

        self.dispatcher.dispatch(&cx, call);
    }
}

impl GuestInvoker for DirectGate {
    fn invoke(&self, entry: u64, arg: u64) -> u64 {
        unsafe { relay::execute_guest_entry(entry, arg, self.max_callback_depth) }
    }
}
