#![cfg(test)]

use std::{
    cell::Cell,
    panic,
    sync::{Arc, Mutex},
    thread::{self, ThreadId},
};

use thunklink::{
    CallRecord, Dispatcher, DllId, PointerWidth, SharedRegion, Verification, call_record, gate,
    relay::{GuestCallback, RelayState},
};

use super::*;

const TEST_DLL: DllId = DllId(9);

call_record! {
    struct WhoAmI[TEST_DLL, 0x00] {}
    struct Sum[TEST_DLL, 0x01] { a, b }
    struct Relay[TEST_DLL, 0x02] { wrapper, value }
    struct Unbound[TEST_DLL, 0x03] {}
}

#[derive(Default)]
struct Seen {
    workers: Mutex<Vec<ThreadId>>,
    names: Mutex<Vec<String>>,
}

fn worker_gate(seen: &Arc<Seen>) -> Arc<WorkerGate> {
    let dispatcher = Dispatcher::builder()
        .bind(Verification::Verified, {
            let seen = seen.clone();
            move |_cx, _call: &mut WhoAmI| {
                let current = thread::current();
                seen.workers.lock().unwrap().push(current.id());
                seen.names
                    .lock()
                    .unwrap()
                    .push(current.name().unwrap_or_default().to_string());
            }
        })
        .bind(Verification::Verified, |_cx, call: &mut Sum| call.a + call.b)
        .bind(Verification::Verified, |cx, call: &mut Relay| {
            let callback = GuestCallback::new(call.wrapper, call.wrapper, 0).unwrap();
            let mut value = call.value;
            let depth = match RelayState::current() {
                RelayState::Idle => 0,
                RelayState::InCallback { depth } => depth,
            };

            callback.invoke(cx, &mut value) + u64::from(depth) * 1000
        })
        .build();

    Arc::new(WorkerGate::new(
        Arc::new(dispatcher),
        SharedRegion::identity(PointerWidth::native()),
        4,
    ))
}

thread_local! {
    static GUEST_STATE: Cell<Option<(ThreadId, RelayState)>> = const { Cell::new(None) };
}

unsafe extern "C" fn observe_entry(arg: u64) -> u64 {
    GUEST_STATE.set(Some((thread::current().id(), RelayState::current())));

    unsafe { *(arg as usize as *const u64) + 1 }
}

unsafe extern "C" fn nested_entry(arg: u64) -> u64 {
    let value = unsafe { *(arg as usize as *const u64) };

    gate::forward(WhoAmI::new());
    gate::forward(Sum::new(value, 100))
}

#[test]
fn calls_run_on_a_named_worker() {
    let seen = Arc::new(Seen::default());
    let gate = worker_gate(&seen);

    gate::scoped(gate, || {
        assert_eq!(gate::forward(Sum::new(2, 3)), 5);
        gate::forward(WhoAmI::new());
        gate::forward(WhoAmI::new());
    });

    let workers = seen.workers.lock().unwrap();
    assert_eq!(workers.len(), 2);
    assert_eq!(workers[0], workers[1]);
    assert_ne!(workers[0], thread::current().id());
    assert!(seen.names.lock().unwrap()[0].starts_with("thunklink-host-"));
}

#[test]
fn each_guest_thread_gets_its_own_worker() {
    let seen = Arc::new(Seen::default());
    let gate = worker_gate(&seen);

    let guests = (0..2)
        .map(|_| {
            let gate = gate.clone();
            thread::spawn(move || gate::scoped(gate, || gate::forward(WhoAmI::new())))
        })
        .collect::<Vec<_>>();

    for guest in guests {
        guest.join().unwrap();
    }

    let workers = seen.workers.lock().unwrap();
    assert_eq!(workers.len(), 2);
    assert_ne!(workers[0], workers[1]);
}

#[test]
fn callbacks_run_on_the_guest_thread() {
    let seen = Arc::new(Seen::default());
    let gate = worker_gate(&seen);

    let ret = gate::scoped(gate, || {
        gate::forward(Relay::new(observe_entry as usize as u64, 41))
    });

    assert_eq!(ret, 42);
    assert_eq!(
        GUEST_STATE.get(),
        Some((thread::current().id(), RelayState::InCallback { depth: 1 }))
    );
    assert_eq!(RelayState::current(), RelayState::Idle);
}

#[test]
fn calls_made_inside_a_callback_reuse_the_worker() {
    let seen = Arc::new(Seen::default());
    let gate = worker_gate(&seen);

    let ret = gate::scoped(gate, || {
        gate::forward(WhoAmI::new());
        gate::forward(Relay::new(nested_entry as usize as u64, 7))
    });

    assert_eq!(ret, 107);

    let workers = seen.workers.lock().unwrap();
    assert_eq!(workers.len(), 2);
    assert_eq!(workers[0], workers[1]);
}

#[test]
fn nested_handlers_observe_callback_depth() {
    let seen = Arc::new(Seen::default());
    let gate = worker_gate(&seen);

    unsafe extern "C" fn relay_again(arg: u64) -> u64 {
        let value = unsafe { *(arg as usize as *const u64) };
        gate::forward(Relay::new(observe_entry as usize as u64, value))
    }

    // The inner `Relay` is dispatched by the worker while it is one callback deep.
    let ret = gate::scoped(gate, || {
        gate::forward(Relay::new(relay_again as usize as u64, 1))
    });

    assert_eq!(ret, 1002);
    assert_eq!(
        GUEST_STATE.get(),
        Some((thread::current().id(), RelayState::InCallback { depth: 2 }))
    );
}

#[test]
#[should_panic(expected = "unknown call")]
fn unknown_ids_fault_the_guest() {
    let gate = worker_gate(&Arc::new(Seen::default()));

    gate::scoped(gate, || gate::forward(Unbound::new()));
}

#[test]
fn worker_survives_a_fault() {
    let gate = worker_gate(&Arc::new(Seen::default()));

    gate::scoped(gate, || {
        let fault = panic::catch_unwind(|| gate::forward(Unbound::new())).unwrap_err();
        let msg = fault.downcast_ref::<String>().unwrap();
        assert!(msg.starts_with("host worker faulted: fatal protocol error"));

        assert_eq!(gate::forward(Sum::new(1, 1)), 2);
    });
}

#[test]
fn disconnect_releases_the_worker() {
    let seen = Arc::new(Seen::default());
    let gate = worker_gate(&seen);

    gate::scoped(gate.clone(), || gate::forward(WhoAmI::new()));
    gate.disconnect();
    gate::scoped(gate.clone(), || gate::forward(WhoAmI::new()));

    let workers = seen.workers.lock().unwrap();
    assert_ne!(workers[0], workers[1]);
    assert!(gate.dispatcher().contains(Sum::ID));
}

#[test]
fn rendezvous_hands_values_across_threads() {
    let (tx, rx) = rendezvous::<u32>();
    let (ack_tx, ack_rx) = rendezvous::<u32>();

    let echo = thread::spawn(move || {
        for _ in 0..3 {
            let value = rx.recv();
            ack_tx.send(value * 2);
        }
    });

    for i in 1..=3 {
        tx.send(i);
        assert_eq!(ack_rx.recv(), i * 2);
    }

    echo.join().unwrap();
}

#[test]
#[should_panic(expected = "already holds a value")]
fn rendezvous_rejects_overlapping_sends() {
    let (tx, _rx) = rendezvous::<u32>();

    tx.send(1);
    tx.send(2);
}
