// === Slot Conversions === //

/// A value that can be widened into a 64-bit call record slot.
///
/// Signed integers are sign-extended so that a 32-bit `-1` and a 64-bit `-1` occupy the same
/// slot value. Pointers are widened through `usize`.
pub trait IntoSlot {
    fn into_slot(self) -> u64;
}

/// The inverse of [`IntoSlot`]: narrows a slot back to its native type by truncation.
pub trait FromSlot: Sized {
    fn from_slot(slot: u64) -> Self;
}

macro_rules! impl_unsigned_slot {
    ($($ty:ty),*$(,)?) => {$(
        impl IntoSlot for $ty {
            fn into_slot(self) -> u64 {
                self as u64
            }
        }

        impl FromSlot for $ty {
            fn from_slot(slot: u64) -> Self {
                slot as $ty
            }
        }
    )*};
}

macro_rules! impl_signed_slot {
    ($($ty:ty),*$(,)?) => {$(
        impl IntoSlot for $ty {
            fn into_slot(self) -> u64 {
                self as i64 as u64
            }
        }

        impl FromSlot for $ty {
            fn from_slot(slot: u64) -> Self {
                slot as i64 as $ty
            }
        }
    )*};
}

impl_unsigned_slot!(u8, u16, u32, u64, usize);
impl_signed_slot!(i8, i16, i32, i64, isize);

impl IntoSlot for bool {
    fn into_slot(self) -> u64 {
        self as u64
    }
}

impl FromSlot for bool {
    fn from_slot(slot: u64) -> Self {
        slot != 0
    }
}

impl IntoSlot for () {
    fn into_slot(self) -> u64 {
        0
    }
}

impl FromSlot for () {
    fn from_slot(_slot: u64) -> Self {}
}

impl<T> IntoSlot for *const T {
    fn into_slot(self) -> u64 {
        self as usize as u64
    }
}

impl<T> IntoSlot for *mut T {
    fn into_slot(self) -> u64 {
        self as usize as u64
    }
}

impl<T> FromSlot for *const T {
    fn from_slot(slot: u64) -> Self {
        slot as usize as *const T
    }
}

impl<T> FromSlot for *mut T {
    fn from_slot(slot: u64) -> Self {
        slot as usize as *mut T
    }
}
