use std::{fmt, mem, slice};

use bytemuck::{Pod, Zeroable};

use crate::ProtocolError;

// === CallId === //

/// The module a forwarded function belongs to. Forms the upper half of a [`CallId`].
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct DllId(pub u32);

#[derive(Copy, Clone, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct CallId {
    dll: DllId,
    call: u32,
}

impl fmt::Debug for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CallId({}:{:#x})", self.dll.0, self.call)
    }
}

impl CallId {
    pub const fn new(dll: DllId, call: u32) -> Self {
        Self { dll, call }
    }

    pub const fn from_raw(raw: u64) -> Self {
        Self::new(DllId((raw >> 32) as u32), raw as u32)
    }

    pub const fn to_raw(self) -> u64 {
        ((self.dll.0 as u64) << 32) | self.call as u64
    }

    pub const fn dll(self) -> DllId {
        self.dll
    }

    pub const fn call(self) -> u32 {
        self.call
    }
}

// === Syscall === //

/// The header every call record starts with.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Syscall {
    pub id: u64,
    pub iret: u64,
}

impl Syscall {
    pub const WORDS: usize = mem::size_of::<Self>() / mem::size_of::<u64>();

    pub const fn new(id: CallId) -> Self {
        Self {
            id: id.to_raw(),
            iret: 0,
        }
    }

    pub const fn call_id(&self) -> CallId {
        CallId::from_raw(self.id)
    }
}

// === CallRecord === //

/// ## Safety
///
/// Implementors must be `#[repr(C)]`, start with a [`Syscall`] header, and contain nothing but
/// `u64` slots after it. Use [`call_record!`](crate::call_record) rather than implementing this
/// by hand.
///
pub unsafe trait CallRecord: Pod {
    const ID: CallId;
    const NAME: &'static str;
    const WORDS: usize = mem::size_of::<Self>() / mem::size_of::<u64>();

    fn header(&self) -> &Syscall;

    fn header_mut(&mut self) -> &mut Syscall;
}

#[doc(hidden)]
pub mod call_record_internals {
    pub use {
        bytemuck::{Pod, Zeroable},
        std::stringify,
    };
}

#[macro_export]
macro_rules! call_record {
    ($(
        $(#[$attr:meta])*
        $vis:vis struct $name:ident[$dll:expr, $call:expr] { $($field:ident),* $(,)? }
    )*) => {$(
        $(#[$attr])*
        #[derive(Debug, Copy, Clone, Eq, PartialEq)]
        #[repr(C)]
        $vis struct $name {
            pub header: $crate::Syscall,
            $(pub $field: u64,)*
        }

        impl $name {
            #[allow(clippy::too_many_arguments)]
            pub const fn new($($field: u64),*) -> Self {
                Self {
                    header: $crate::Syscall::new(<Self as $crate::CallRecord>::ID),
                    $($field,)*
                }
            }
        }

        // SAFETY: `#[repr(C)]` and every field is a `u64`-sized POD, so there is no padding.
        unsafe impl $crate::call_record_internals::Zeroable for $name {}
        unsafe impl $crate::call_record_internals::Pod for $name {}

        unsafe impl $crate::CallRecord for $name {
            const ID: $crate::CallId = $crate::CallId::new($dll, $call);
            const NAME: &'static str = $crate::call_record_internals::stringify!($name);

            fn header(&self) -> &$crate::Syscall {
                &self.header
            }

            fn header_mut(&mut self) -> &mut $crate::Syscall {
                &mut self.header
            }
        }
    )*};
}

// === RawCall === //

/// A call record in flight, viewed as its raw 64-bit slots.
///
/// This is what crosses the gate: the guest stub lends its stack-allocated record out for the
/// duration of one crossing and the host reinterprets it according to the id in slot 0.
#[derive(Debug)]
pub struct RawCall<'a> {
    words: &'a mut [u64],
}

impl<'a> RawCall<'a> {
    pub fn new<T: CallRecord>(record: &'a mut T) -> Self {
        Self {
            words: bytemuck::cast_slice_mut(bytemuck::bytes_of_mut(record)),
        }
    }

    /// ## Safety
    ///
    /// `words` must point to `len` initialized slots that stay valid and unaliased for `'a`.
    /// `len` must cover at least the [`Syscall`] header.
    ///
    pub unsafe fn from_raw_parts(words: *mut u64, len: usize) -> Self {
        assert!(len >= Syscall::WORDS, "call record shorter than its header");

        Self {
            words: unsafe { slice::from_raw_parts_mut(words, len) },
        }
    }

    pub fn into_raw_parts(self) -> (*mut u64, usize) {
        (self.words.as_mut_ptr(), self.words.len())
    }

    pub fn id(&self) -> CallId {
        CallId::from_raw(self.words[0])
    }

    pub fn iret(&self) -> u64 {
        self.words[1]
    }

    pub fn set_iret(&mut self, value: u64) {
        self.words[1] = value;
    }

    pub fn words(&self) -> &[u64] {
        self.words
    }

    pub fn try_cast<T: CallRecord>(&mut self) -> Result<&mut T, ProtocolError> {
        if self.words.len() != T::WORDS {
            return Err(ProtocolError::MalformedRecord {
                name: T::NAME,
                expected: T::WORDS,
                actual: self.words.len(),
            });
        }

        if self.id() != T::ID {
            return Err(ProtocolError::MismatchedId {
                name: T::NAME,
                expected: T::ID,
                actual: self.id(),
            });
        }

        Ok(bytemuck::from_bytes_mut(bytemuck::cast_slice_mut(
            self.words,
        )))
    }
}
