use std::{fmt, marker::PhantomData, mem};

use bytemuck::{Pod, Zeroable};
use derive_where::derive_where;

use crate::{FromSlot, IntoSlot, RegionError};

// === PointerWidth === //

#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum PointerWidth {
    Bits32,
    #[default]
    Bits64,
}

impl PointerWidth {
    pub const fn native() -> Self {
        if mem::size_of::<usize>() == 4 {
            Self::Bits32
        } else {
            Self::Bits64
        }
    }

    pub const fn bits(self) -> u32 {
        match self {
            Self::Bits32 => 32,
            Self::Bits64 => 64,
        }
    }

    /// The largest region a guest of this width can address.
    pub const fn space(self) -> u64 {
        match self {
            Self::Bits32 => 1 << 32,
            Self::Bits64 => u64::MAX,
        }
    }

    pub const fn truncate(self, value: u64) -> u64 {
        match self {
            Self::Bits32 => value as u32 as u64,
            Self::Bits64 => value,
        }
    }

    pub const fn sign_extend(self, value: u64) -> u64 {
        match self {
            Self::Bits32 => value as u32 as i32 as i64 as u64,
            Self::Bits64 => value,
        }
    }
}

// === SharedRegion === //

/// The window of host memory the guest can see, and the only place guest/host address arithmetic
/// happens.
///
/// Guest address `g` maps to host address `base + g`. Zero is null on both sides and maps to
/// itself. Handles are not addresses: they only have their width adjusted.
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq)]
pub struct SharedRegion {
    base: u64,
    size: u64,
    width: PointerWidth,
}

impl SharedRegion {
    pub fn new(base: u64, size: u64, width: PointerWidth) -> Result<Self, RegionError> {
        if size == 0 {
            return Err(RegionError::Empty);
        }

        if base.checked_add(size).is_none() {
            return Err(RegionError::Overflow { base, size });
        }

        if size > width.space() {
            return Err(RegionError::TooLarge {
                size,
                bits: width.bits(),
            });
        }

        Ok(Self { base, size, width })
    }

    /// A region for guests living in the host's own address space.
    pub const fn identity(width: PointerWidth) -> Self {
        Self {
            base: 0,
            size: width.space(),
            width,
        }
    }

    pub const fn base(&self) -> u64 {
        self.base
    }

    pub const fn size(&self) -> u64 {
        self.size
    }

    pub const fn width(&self) -> PointerWidth {
        self.width
    }

    pub const fn contains_guest(&self, guest: u64) -> bool {
        guest < self.size
    }

    pub const fn contains_host(&self, host: u64) -> bool {
        host >= self.base && host - self.base < self.size
    }

    pub fn g2h_addr(&self, guest: u64) -> u64 {
        let guest = self.width.truncate(guest);

        if guest == 0 {
            return 0;
        }

        debug_assert!(
            self.contains_guest(guest),
            "guest address {guest:#x} lies outside of {self:?}"
        );

        self.base.wrapping_add(guest)
    }

    pub fn h2g_addr(&self, host: u64) -> u64 {
        if host == 0 {
            return 0;
        }

        debug_assert!(
            self.contains_host(host),
            "host address {host:#x} lies outside of {self:?}"
        );

        host.wrapping_sub(self.base)
    }

    pub fn g2h<T>(&self, guest: u64) -> *mut T {
        self.g2h_addr(guest) as usize as *mut T
    }

    pub fn h2g<T>(&self, host: *const T) -> u64 {
        self.h2g_addr(host as usize as u64)
    }

    pub fn resolve<T>(&self, ptr: GuestPtr<T>) -> *mut T {
        self.g2h(ptr.addr())
    }

    pub fn guest_ptr<T>(&self, host: *const T) -> GuestPtr<T> {
        GuestPtr::new(self.h2g(host))
    }

    pub const fn handle_from_guest(&self, slot: u64) -> u64 {
        self.width.sign_extend(slot)
    }

    pub const fn handle_to_guest(&self, handle: u64) -> u64 {
        self.width.sign_extend(handle)
    }
}

// === GuestPtr === //

/// A typed guest address. It can only be dereferenced after being resolved through a
/// [`SharedRegion`].
#[derive_where(Copy, Clone, Hash, Eq, PartialEq)]
#[repr(transparent)]
pub struct GuestPtr<T> {
    _ty: PhantomData<fn(T) -> T>,
    addr: u64,
}

unsafe impl<T: 'static> Pod for GuestPtr<T> {}

unsafe impl<T: 'static> Zeroable for GuestPtr<T> {}

impl<T> fmt::Debug for GuestPtr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GuestPtr({:#x})", self.addr)
    }
}

impl<T> GuestPtr<T> {
    pub const NULL: Self = Self::new(0);

    pub const fn new(addr: u64) -> Self {
        Self {
            _ty: PhantomData,
            addr,
        }
    }

    pub const fn addr(self) -> u64 {
        self.addr
    }

    pub const fn is_null(self) -> bool {
        self.addr == 0
    }

    pub const fn cast<V>(self) -> GuestPtr<V> {
        GuestPtr::new(self.addr)
    }

    pub const fn add(self, cnt: u64) -> Self {
        Self::new(self.addr + cnt * mem::size_of::<T>() as u64)
    }
}

impl<T> IntoSlot for GuestPtr<T> {
    fn into_slot(self) -> u64 {
        self.addr
    }
}

impl<T> FromSlot for GuestPtr<T> {
    fn from_slot(slot: u64) -> Self {
        Self::new(slot)
    }
}
