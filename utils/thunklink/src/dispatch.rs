use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering::Relaxed},
    },
};

use bytemuck::Pod;

use crate::{
    CallId, CallRecord, DllId, FromSlot, GuestPtr, IntoSlot, ProtocolError, RawCall, SharedRegion,
    gate::GuestInvoker,
};

// === HostCx === //

/// Everything a handler may touch besides its own record: the address translator and a way to
/// call back into the guest.
#[derive(Copy, Clone)]
pub struct HostCx<'a> {
    region: &'a SharedRegion,
    guest: &'a dyn GuestInvoker,
}

impl fmt::Debug for HostCx<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostCx")
            .field("region", self.region)
            .finish_non_exhaustive()
    }
}

impl<'a> HostCx<'a> {
    pub fn new(region: &'a SharedRegion, guest: &'a dyn GuestInvoker) -> Self {
        Self { region, guest }
    }

    pub fn region(&self) -> &'a SharedRegion {
        self.region
    }

    pub fn guest(&self) -> &'a dyn GuestInvoker {
        self.guest
    }

    pub fn g2h<T>(&self, guest: u64) -> *mut T {
        self.region.g2h(guest)
    }

    pub fn h2g<T>(&self, host: *const T) -> u64 {
        self.region.h2g(host)
    }

    /// Widens a guest handle slot and reinterprets it as a native handle.
    pub fn handle<T: FromSlot>(&self, slot: u64) -> T {
        T::from_slot(self.region.handle_from_guest(slot))
    }

    pub fn handle_to_guest(&self, handle: impl IntoSlot) -> u64 {
        self.region.handle_to_guest(handle.into_slot())
    }

    /// Copies a guest-owned object into host memory.
    ///
    /// ## Safety
    ///
    /// `ptr` must point to a live, initialized `T` in the shared region.
    ///
    pub unsafe fn read<T: Pod>(&self, what: &'static str, ptr: GuestPtr<T>) -> T {
        if ptr.is_null() {
            panic!("{}", ProtocolError::NullObject(what));
        }

        unsafe { self.region.resolve(ptr).read_unaligned() }
    }
}

// === Verification === //

/// Whether a forwarded path has been exercised against a real native implementation.
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq)]
pub enum Verification {
    Verified,
    Unverified,
}

// === Dispatcher === //

type Handler = Box<dyn Fn(&HostCx<'_>, RawCall<'_>) -> Result<(), ProtocolError> + Send + Sync>;

fn handler(
    f: impl Fn(&HostCx<'_>, RawCall<'_>) -> Result<(), ProtocolError> + Send + Sync + 'static,
) -> Handler {
    Box::new(f)
}

struct Entry {
    name: &'static str,
    verification: Verification,
    warned: AtomicBool,
    handler: Handler,
}

#[derive(Default)]
pub struct DispatcherBuilder {
    unverified_warnings: bool,
    dlls: Vec<Vec<Option<Entry>>>,
}

impl fmt::Debug for DispatcherBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatcherBuilder")
            .field("unverified_warnings", &self.unverified_warnings)
            .finish_non_exhaustive()
    }
}

impl DispatcherBuilder {
    pub fn unverified_warnings(mut self, enabled: bool) -> Self {
        self.unverified_warnings = enabled;
        self
    }

    fn slot(&mut self, id: CallId) -> &mut Option<Entry> {
        let dll = id.dll().0 as usize;
        let call = id.call() as usize;

        if self.dlls.len() <= dll {
            self.dlls.resize_with(dll + 1, Vec::new);
        }

        let table = &mut self.dlls[dll];

        if table.len() <= call {
            table.resize_with(call + 1, || None);
        }

        &mut table[call]
    }

    /// Binds the handler for record type `T`. The handler's return value becomes `iret`.
    pub fn bind<T, R>(
        mut self,
        verification: Verification,
        f: impl Fn(&HostCx<'_>, &mut T) -> R + Send + Sync + 'static,
    ) -> Self
    where
        T: CallRecord,
        R: IntoSlot + 'static,
    {
        let slot = self.slot(T::ID);

        assert!(slot.is_none(), "{} ({:?}) bound twice", T::NAME, T::ID);

        *slot = Some(Entry {
            name: T::NAME,
            verification,
            warned: AtomicBool::new(false),
            handler: handler(move |cx, mut call| {
                let ret = f(cx, call.try_cast::<T>()?).into_slot();
                call.set_iret(ret);
                Ok(())
            }),
        });

        self
    }

    /// Like [`bind`](Self::bind), but for handlers that forward to a shared native backend.
    pub fn bind_api<T, A, R>(
        self,
        api: &Arc<A>,
        verification: Verification,
        f: impl Fn(&A, &HostCx<'_>, &mut T) -> R + Send + Sync + 'static,
    ) -> Self
    where
        T: CallRecord,
        A: ?Sized + Send + Sync + 'static,
        R: IntoSlot + 'static,
    {
        let api = api.clone();

        self.bind(verification, move |cx, call: &mut T| f(&*api, cx, call))
    }

    pub fn build(self) -> Dispatcher {
        Dispatcher {
            unverified_warnings: self.unverified_warnings,
            dlls: self
                .dlls
                .into_iter()
                .map(Vec::into_boxed_slice)
                .collect(),
        }
    }
}

/// The host's immutable call-id table.
pub struct Dispatcher {
    unverified_warnings: bool,
    dlls: Box<[Box<[Option<Entry>]>]>,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("len", &self.len())
            .field("unverified_warnings", &self.unverified_warnings)
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::default()
    }

    fn entry(&self, id: CallId) -> Option<&Entry> {
        self.dlls
            .get(id.dll().0 as usize)?
            .get(id.call() as usize)?
            .as_ref()
    }

    pub fn contains(&self, id: CallId) -> bool {
        self.entry(id).is_some()
    }

    pub fn name_of(&self, id: CallId) -> Option<&'static str> {
        self.entry(id).map(|entry| entry.name)
    }

    pub fn len(&self) -> usize {
        self.dlls
            .iter()
            .flat_map(|table| table.iter())
            .filter(|entry| entry.is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn ids(&self, dll: DllId) -> impl Iterator<Item = CallId> + '_ {
        self.dlls
            .get(dll.0 as usize)
            .into_iter()
            .flat_map(|table| table.iter().enumerate())
            .filter(|(_, entry)| entry.is_some())
            .map(move |(call, _)| CallId::new(dll, call as u32))
    }

    pub fn try_dispatch(&self, cx: &HostCx<'_>, call: RawCall<'_>) -> Result<(), ProtocolError> {
        let id = call.id();
        let entry = self.entry(id).ok_or(ProtocolError::UnknownCall(id))?;

        tracing::trace!(name = entry.name, ?id, "dispatching call");

        if entry.verification == Verification::Unverified
            && self.unverified_warnings
            && !entry.warned.swap(true, Relaxed)
        {
            tracing::warn!(name = entry.name, ?id, "forwarding unverified call");
        }

        (entry.handler)(cx, call)
    }

    /// Dispatches `call`, treating any protocol violation as fatal.
    pub fn dispatch(&self, cx: &HostCx<'_>, call: RawCall<'_>) {
        if let Err(err) = self.try_dispatch(cx, call) {
            panic!("fatal protocol error: {err}");
        }
    }
}
