use std::ffi::c_void;

use bytemuck::{Pod, Zeroable};

// === Scalars === //

pub type Bool = i32;
pub type HResult = i32;
pub type LParam = isize;
pub type LResult = isize;

pub const TRUE: Bool = 1;
pub const FALSE: Bool = 0;

pub const S_OK: HResult = 0;
pub const S_FALSE: HResult = 1;
pub const E_NOINTERFACE: HResult = 0x8000_4002_u32 as HResult;

// === Handles === //

pub type Handle = *mut c_void;
pub type Hwnd = *mut c_void;
pub type Hdc = *mut c_void;
pub type Hmonitor = *mut c_void;
pub type HdevNotify = *mut c_void;
pub type HpowerNotify = *mut c_void;
pub type Hwinsta = *mut c_void;
pub type Htask = *mut c_void;

pub const MONITOR_DEFAULTTONULL: u32 = 0;
pub const MONITOR_DEFAULTTOPRIMARY: u32 = 1;
pub const MONITOR_DEFAULTTONEAREST: u32 = 2;

pub const MONITORINFOF_PRIMARY: u32 = 1;

// === Structures === //

#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq, Default, Pod, Zeroable)]
#[repr(C)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq, Default, Pod, Zeroable)]
#[repr(C)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    pub const fn contains(&self, pt: Point) -> bool {
        pt.x >= self.left && pt.x < self.right && pt.y >= self.top && pt.y < self.bottom
    }

    pub const fn intersects(&self, other: &Rect) -> bool {
        self.left < other.right
            && other.left < self.right
            && self.top < other.bottom
            && other.top < self.bottom
    }
}

#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq, Default, Pod, Zeroable)]
#[repr(C)]
pub struct MonitorInfo {
    pub cb_size: u32,
    pub rc_monitor: Rect,
    pub rc_work: Rect,
    pub flags: u32,
}

#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq, Default, Pod, Zeroable)]
#[repr(C)]
pub struct Guid {
    pub data1: u32,
    pub data2: u16,
    pub data3: u16,
    pub data4: [u8; 8],
}

/// `D3D11_QUERY_DESC` and `D3D10_QUERY_DESC` share this layout.
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq, Default, Pod, Zeroable)]
#[repr(C)]
pub struct QueryDesc {
    pub query: u32,
    pub misc_flags: u32,
}

/// `MONITORENUMPROC`
pub type MonitorEnumProc = unsafe extern "system" fn(Hmonitor, Hdc, *mut Rect, LParam) -> Bool;
