//! Call record layouts shared by the guest stubs and the host handlers.
//!
//! Every record here is the complete wire contract for one forwarded function: a [`Syscall`]
//! header followed by the function's arguments, each widened to a 64-bit slot, in declaration
//! order.
//!
//! [`Syscall`]: thunklink::Syscall

use thunklink::DllId;

pub mod d3d11;
pub mod types;
pub mod user32;

pub const D3D11: DllId = DllId(1);
pub const USER32: DllId = DllId(2);
