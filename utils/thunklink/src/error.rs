use crate::CallId;

/// A violation of the guest/host call protocol.
///
/// None of these are recoverable at runtime: they mean the guest stub tables and the host
/// dispatcher were built from different layouts, or that the guest handed over a record that
/// no stub could have produced.
#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
pub enum ProtocolError {
    #[error("unknown call {0:?}")]
    UnknownCall(CallId),

    #[error("record for `{name}` has {actual} slot(s), expected {expected}")]
    MalformedRecord {
        name: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("record tagged {actual:?} was routed to `{name}` ({expected:?})")]
    MismatchedId {
        name: &'static str,
        expected: CallId,
        actual: CallId,
    },

    #[error("null object pointer passed to `{0}`")]
    NullObject(&'static str),

    #[error("host attempted to enter a null guest routine")]
    NullGuestEntry,

    #[error("callback nesting exceeded the limit of {limit}")]
    CallbackDepth { limit: u32 },

    #[error("no call gate is installed on this thread")]
    NoGate,
}

#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
pub enum RegionError {
    #[error("shared region must not be empty")]
    Empty,

    #[error("shared region {base:#x}+{size:#x} overflows the host address space")]
    Overflow { base: u64, size: u64 },

    #[error("shared region of {size:#x} bytes exceeds the {bits}-bit guest address space")]
    TooLarge { size: u64, bits: u32 },
}

#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
pub enum GateError {
    #[error("a process-wide call gate is already installed")]
    AlreadyInstalled,
}
