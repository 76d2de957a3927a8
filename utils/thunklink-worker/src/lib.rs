//! A call gate that services every guest thread on a dedicated host worker thread.
//!
//! Each guest thread that crosses a [`WorkerGate`] is paired with its own worker. A crossing is a
//! single exchange on the pair's rendezvous slots: the guest hands its record over and blocks
//! until the worker reports completion. When a handler relays a callback, the direction of the
//! exchange flips while the outer call stays blocked, and any call the guest makes from inside
//! that callback is serviced by the same worker.

use std::{
    any::Any,
    cell::RefCell,
    collections::HashMap,
    fmt,
    panic::{self, AssertUnwindSafe},
    rc::Rc,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering::Relaxed},
    },
    thread::{self, JoinHandle},
};

use thunklink::{
    Dispatcher, HostCx, RawCall, SharedRegion,
    gate::{Gate, GuestInvoker},
    relay,
};

use crate::rendezvous::{RendezvousRx, RendezvousTx, rendezvous};

pub mod rendezvous;

#[cfg(test)]
mod tests;

// === Messages === //

/// A record lent to the worker for the duration of one crossing.
struct CallPtr {
    words: *mut u64,
    len: usize,
}

// SAFETY: the guest thread that owns the record stays blocked on the rendezvous until the worker
// reports back, so the worker has exclusive access to it in the meantime.
unsafe impl Send for CallPtr {}

enum HostMsg {
    Call(CallPtr),
    CallbackReturned(u64),
    Shutdown,
}

enum GuestMsg {
    Callback { entry: u64, arg: u64 },
    Complete,
    Fault(String),
}

// === WorkerGate === //

static NEXT_GATE_ID: AtomicU64 = AtomicU64::new(0);

#[derive(Clone)]
pub struct WorkerGate {
    shared: Arc<Shared>,
}

struct Shared {
    id: u64,
    dispatcher: Arc<Dispatcher>,
    region: SharedRegion,
    max_callback_depth: u32,
}

impl fmt::Debug for WorkerGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerGate")
            .field("id", &self.shared.id)
            .field("region", &self.shared.region)
            .finish_non_exhaustive()
    }
}

impl WorkerGate {
    pub fn new(dispatcher: Arc<Dispatcher>, region: SharedRegion, max_callback_depth: u32) -> Self {
        Self {
            shared: Arc::new(Shared {
                id: NEXT_GATE_ID.fetch_add(1, Relaxed),
                dispatcher,
                region,
                max_callback_depth,
            }),
        }
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.shared.dispatcher
    }

    /// Stops and joins the worker paired with the calling thread, if it has one.
    pub fn disconnect(&self) {
        let owner = LINKS.with_borrow_mut(|links| links.remove(&self.shared.id));
        drop(owner);
    }

    fn link(&self) -> Rc<Link> {
        LINKS.with_borrow_mut(|links| {
            links
                .entry(self.shared.id)
                .or_insert_with(|| LinkOwner::spawn(self.shared.clone()))
                .link
                .clone()
        })
    }
}

impl Gate for WorkerGate {
    fn syscall(&self, call: RawCall<'_>) {
        let link = self.link();
        let (words, len) = call.into_raw_parts();

        link.to_host.send(HostMsg::Call(CallPtr { words, len }));

        loop {
            match link.from_host.recv() {
                GuestMsg::Callback { entry, arg } => {
                    let ret = unsafe {
                        relay::execute_guest_entry(entry, arg, self.shared.max_callback_depth)
                    };

                    link.to_host.send(HostMsg::CallbackReturned(ret));
                }
                GuestMsg::Complete => return,
                GuestMsg::Fault(msg) => panic!("host worker faulted: {msg}"),
            }
        }
    }
}

// === Links === //

struct Link {
    to_host: RendezvousTx<HostMsg>,
    from_host: RendezvousRx<GuestMsg>,
}

struct LinkOwner {
    link: Rc<Link>,
    worker: Option<JoinHandle<()>>,
}

thread_local! {
    static LINKS: RefCell<HashMap<u64, LinkOwner>> = RefCell::new(HashMap::new());
}

impl LinkOwner {
    fn spawn(shared: Arc<Shared>) -> Self {
        let (to_host, from_guest) = rendezvous();
        let (to_guest, from_host) = rendezvous();
        let gate = shared.id;

        let worker = thread::Builder::new()
            .name(format!("thunklink-host-{gate}"))
            .spawn(move || {
                Worker {
                    shared,
                    rx: from_guest,
                    tx: to_guest,
                }
                .serve()
            })
            .unwrap_or_else(|err| panic!("failed to spawn host worker: {err}"));

        tracing::debug!(
            gate,
            guest = ?thread::current().id(),
            worker = ?worker.thread().id(),
            "paired guest thread with host worker"
        );

        Self {
            link: Rc::new(Link { to_host, from_host }),
            worker: Some(worker),
        }
    }
}

impl Drop for LinkOwner {
    fn drop(&mut self) {
        self.link.to_host.send(HostMsg::Shutdown);

        if let Some(worker) = self.worker.take() {
            let id = worker.thread().id();

            if worker.join().is_err() {
                tracing::error!(worker = ?id, "host worker exited abnormally");
            } else {
                tracing::debug!(worker = ?id, "host worker stopped");
            }
        }
    }
}

// === Worker === //

struct Worker {
    shared: Arc<Shared>,
    rx: RendezvousRx<HostMsg>,
    tx: RendezvousTx<GuestMsg>,
}

impl Worker {
    fn serve(self) {
        loop {
            match self.rx.recv() {
                HostMsg::Call(call) => self.handle(call),
                HostMsg::CallbackReturned(_) => {
                    self.tx.send(GuestMsg::Fault(
                        "callback returned while no callback was pending".to_string(),
                    ));
                }
                HostMsg::Shutdown => break,
            }
        }
    }

    fn handle(&self, call: CallPtr) {
        let call = unsafe { RawCall::from_raw_parts(call.words, call.len) };
        let cx = HostCx::new(&self.shared.region, self);

        let res = panic::catch_unwind(AssertUnwindSafe(|| {
            self.shared.dispatcher.dispatch(&cx, call);
        }));

        match res {
            Ok(()) => self.tx.send(GuestMsg::Complete),
            Err(payload) => self.tx.send(GuestMsg::Fault(panic_message(&*payload))),
        }
    }
}

impl GuestInvoker for Worker {
    fn invoke(&self, entry: u64, arg: u64) -> u64 {
        let _depth = relay::enter(self.shared.max_callback_depth);

        self.tx.send(GuestMsg::Callback { entry, arg });

        loop {
            match self.rx.recv() {
                HostMsg::Call(call) => self.handle(call),
                HostMsg::CallbackReturned(ret) => return ret,
                HostMsg::Shutdown => panic!("guest thread detached while a callback was pending"),
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "<non-string panic payload>".to_string()
    }
}
