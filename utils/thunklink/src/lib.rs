#![allow(clippy::missing_safety_doc)]

mod addr;
pub use self::addr::*;

pub mod direct;

mod dispatch;
pub use self::dispatch::*;

mod error;
pub use self::error::*;

pub mod gate;

mod record;
pub use self::record::*;

pub mod relay;

mod slot;
pub use self::slot::*;
