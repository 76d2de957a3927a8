//! Guest-side stand-ins for the forwarded Windows API surface.
//!
//! Each stub has the native signature, packs its arguments into the matching
//! [`winthunk_abi`] record and crosses the current [`thunklink::gate`] exactly once.

macro_rules! forward {
    ($record:ident($($arg:expr),*$(,)?)) => {
        thunklink::FromSlot::from_slot(thunklink::gate::forward($record::new(
            $(thunklink::IntoSlot::into_slot($arg)),*
        )))
    };
}

pub(crate) use forward;

pub mod d3d11;
pub mod user32;
