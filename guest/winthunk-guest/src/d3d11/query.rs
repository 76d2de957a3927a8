use std::{ffi::c_void, mem, ptr::NonNull};

use winthunk_abi::{
    d3d11::*,
    types::{Guid, HResult, QueryDesc},
};

use crate::forward;

// === QueryObject === //

/// The guest-side wrapper of one native query.
///
/// Guest code sees the object through two interface pointers, one per API generation. Both lead
/// back to the same wrapper, whose first field carries the native handles the host operates on.
#[repr(C)]
pub struct QueryObject {
    host: QueryHostRefs,
    d3d11: D3d11Query,
    d3d10: D3d10Query,
}

#[repr(C)]
pub struct D3d11Query {
    pub vtbl: &'static D3d11QueryVtbl,
}

#[repr(C)]
pub struct D3d10Query {
    pub vtbl: &'static D3d10QueryVtbl,
}

impl QueryObject {
    /// Allocates a wrapper for the native query `host`. The wrapper frees itself when the native
    /// reference count reaches zero.
    pub fn create(host: QueryHostRefs) -> NonNull<QueryObject> {
        NonNull::from(Box::leak(Box::new(Self {
            host,
            d3d11: D3d11Query {
                vtbl: &D3D11_QUERY_VTBL,
            },
            d3d10: D3d10Query {
                vtbl: &D3D10_QUERY_VTBL,
            },
        })))
    }

    pub fn host(&self) -> QueryHostRefs {
        self.host
    }

    pub fn as_d3d11(this: NonNull<Self>) -> NonNull<D3d11Query> {
        unsafe { NonNull::new_unchecked(&raw mut (*this.as_ptr()).d3d11) }
    }

    pub fn as_d3d10(this: NonNull<Self>) -> NonNull<D3d10Query> {
        unsafe { NonNull::new_unchecked(&raw mut (*this.as_ptr()).d3d10) }
    }

    /// ## Safety
    ///
    /// `iface` must be the `ID3D11Query` view of a live wrapper.
    ///
    pub unsafe fn from_d3d11(iface: *mut D3d11Query) -> *mut Self {
        unsafe { iface.byte_sub(mem::offset_of!(Self, d3d11)).cast() }
    }

    /// ## Safety
    ///
    /// `iface` must be the `ID3D10Query` view of a live wrapper.
    ///
    pub unsafe fn from_d3d10(iface: *mut D3d10Query) -> *mut Self {
        unsafe { iface.byte_sub(mem::offset_of!(Self, d3d10)).cast() }
    }

    /// Frees the wrapper once the host reports that the native object is gone.
    unsafe fn release_with(this: *mut Self, refs: u32) -> u32 {
        if refs == 0 {
            drop(unsafe { Box::from_raw(this) });
        }

        refs
    }
}

// === Method Tables === //

#[repr(C)]
pub struct D3d11QueryVtbl {
    pub query_interface:
        unsafe extern "system" fn(*mut D3d11Query, *const Guid, *mut *mut c_void) -> HResult,
    pub add_ref: unsafe extern "system" fn(*mut D3d11Query) -> u32,
    pub release: unsafe extern "system" fn(*mut D3d11Query) -> u32,
    pub get_device: unsafe extern "system" fn(*mut D3d11Query, *mut *mut c_void),
    pub get_private_data:
        unsafe extern "system" fn(*mut D3d11Query, *const Guid, *mut u32, *mut c_void) -> HResult,
    pub set_private_data:
        unsafe extern "system" fn(*mut D3d11Query, *const Guid, u32, *const c_void) -> HResult,
    pub set_private_data_interface:
        unsafe extern "system" fn(*mut D3d11Query, *const Guid, *mut c_void) -> HResult,
    pub get_data_size: unsafe extern "system" fn(*mut D3d11Query) -> u32,
    pub get_desc: unsafe extern "system" fn(*mut D3d11Query, *mut QueryDesc),
}

#[repr(C)]
pub struct D3d10QueryVtbl {
    pub query_interface:
        unsafe extern "system" fn(*mut D3d10Query, *const Guid, *mut *mut c_void) -> HResult,
    pub add_ref: unsafe extern "system" fn(*mut D3d10Query) -> u32,
    pub release: unsafe extern "system" fn(*mut D3d10Query) -> u32,
    pub get_device: unsafe extern "system" fn(*mut D3d10Query, *mut *mut c_void),
    pub get_private_data:
        unsafe extern "system" fn(*mut D3d10Query, *const Guid, *mut u32, *mut c_void) -> HResult,
    pub set_private_data:
        unsafe extern "system" fn(*mut D3d10Query, *const Guid, u32, *const c_void) -> HResult,
    pub set_private_data_interface:
        unsafe extern "system" fn(*mut D3d10Query, *const Guid, *mut c_void) -> HResult,
    pub begin: unsafe extern "system" fn(*mut D3d10Query),
    pub end: unsafe extern "system" fn(*mut D3d10Query),
    pub get_data: unsafe extern "system" fn(*mut D3d10Query, *mut c_void, u32, u32) -> HResult,
    pub get_data_size: unsafe extern "system" fn(*mut D3d10Query) -> u32,
    pub get_desc: unsafe extern "system" fn(*mut D3d10Query, *mut QueryDesc),
}

pub static D3D11_QUERY_VTBL: D3d11QueryVtbl = D3d11QueryVtbl {
    query_interface: d3d11_query_interface,
    add_ref: d3d11_add_ref,
    release: d3d11_release,
    get_device: d3d11_get_device,
    get_private_data: d3d11_get_private_data,
    set_private_data: d3d11_set_private_data,
    set_private_data_interface: d3d11_set_private_data_interface,
    get_data_size: d3d11_get_data_size,
    get_desc: d3d11_get_desc,
};

pub static D3D10_QUERY_VTBL: D3d10QueryVtbl = D3d10QueryVtbl {
    query_interface: d3d10_query_interface,
    add_ref: d3d10_add_ref,
    release: d3d10_release,
    get_device: d3d10_get_device,
    get_private_data: d3d10_get_private_data,
    set_private_data: d3d10_set_private_data,
    set_private_data_interface: d3d10_set_private_data_interface,
    begin: d3d10_begin,
    end: d3d10_end,
    get_data: d3d10_get_data,
    get_data_size: d3d10_get_data_size,
    get_desc: d3d10_get_desc,
};

// === ID3D11Query === //

// QueryInterface goes to the native object as-is; the interface it writes back is a native one.
unsafe extern "system" fn d3d11_query_interface(
    iface: *mut D3d11Query,
    riid: *const Guid,
    object: *mut *mut c_void,
) -> HResult {
    let query = unsafe { QueryObject::from_d3d11(iface) };
    forward!(D3d11QueryQueryInterface(query, riid, object))
}

unsafe extern "system" fn d3d11_add_ref(iface: *mut D3d11Query) -> u32 {
    let query = unsafe { QueryObject::from_d3d11(iface) };
    forward!(D3d11QueryAddRef(query))
}

unsafe extern "system" fn d3d11_release(iface: *mut D3d11Query) -> u32 {
    let query = unsafe { QueryObject::from_d3d11(iface) };
    let refs = forward!(D3d11QueryRelease(query));

    unsafe { QueryObject::release_with(query, refs) }
}

unsafe extern "system" fn d3d11_get_device(iface: *mut D3d11Query, device: *mut *mut c_void) {
    let query = unsafe { QueryObject::from_d3d11(iface) };
    forward!(D3d11QueryGetDevice(query, device))
}

unsafe extern "system" fn d3d11_get_private_data(
    iface: *mut D3d11Query,
    guid: *const Guid,
    data_size: *mut u32,
    data: *mut c_void,
) -> HResult {
    let query = unsafe { QueryObject::from_d3d11(iface) };
    forward!(D3d11QueryGetPrivateData(query, guid, data_size, data))
}

unsafe extern "system" fn d3d11_set_private_data(
    iface: *mut D3d11Query,
    guid: *const Guid,
    data_size: u32,
    data: *const c_void,
) -> HResult {
    let query = unsafe { QueryObject::from_d3d11(iface) };
    forward!(D3d11QuerySetPrivateData(query, guid, data_size, data))
}

unsafe extern "system" fn d3d11_set_private_data_interface(
    iface: *mut D3d11Query,
    guid: *const Guid,
    data: *mut c_void,
) -> HResult {
    let query = unsafe { QueryObject::from_d3d11(iface) };
    forward!(D3d11QuerySetPrivateDataInterface(query, guid, data))
}

unsafe extern "system" fn d3d11_get_data_size(iface: *mut D3d11Query) -> u32 {
    let query = unsafe { QueryObject::from_d3d11(iface) };
    forward!(D3d11QueryGetDataSize(query))
}

unsafe extern "system" fn d3d11_get_desc(iface: *mut D3d11Query, desc: *mut QueryDesc) {
    let query = unsafe { QueryObject::from_d3d11(iface) };
    forward!(D3d11QueryGetDesc(query, desc))
}

// === ID3D10Query === //

unsafe extern "system" fn d3d10_query_interface(
    iface: *mut D3d10Query,
    riid: *const Guid,
    object: *mut *mut c_void,
) -> HResult {
    let query = unsafe { QueryObject::from_d3d10(iface) };
    forward!(D3d10QueryQueryInterface(query, riid, object))
}

unsafe extern "system" fn d3d10_add_ref(iface: *mut D3d10Query) -> u32 {
    let query = unsafe { QueryObject::from_d3d10(iface) };
    forward!(D3d10QueryAddRef(query))
}

unsafe extern "system" fn d3d10_release(iface: *mut D3d10Query) -> u32 {
    let query = unsafe { QueryObject::from_d3d10(iface) };
    let refs = forward!(D3d10QueryRelease(query));

    unsafe { QueryObject::release_with(query, refs) }
}

unsafe extern "system" fn d3d10_get_device(iface: *mut D3d10Query, device: *mut *mut c_void) {
    let query = unsafe { QueryObject::from_d3d10(iface) };
    forward!(D3d10QueryGetDevice(query, device))
}

unsafe extern "system" fn d3d10_get_private_data(
    iface: *mut D3d10Query,
    guid: *const Guid,
    data_size: *mut u32,
    data: *mut c_void,
) -> HResult {
    let query = unsafe { QueryObject::from_d3d10(iface) };
    forward!(D3d10QueryGetPrivateData(query, guid, data_size, data))
}

unsafe extern "system" fn d3d10_set_private_data(
    iface: *mut D3d10Query,
    guid: *const Guid,
    data_size: u32,
    data: *const c_void,
) -> HResult {
    let query = unsafe { QueryObject::from_d3d10(iface) };
    forward!(D3d10QuerySetPrivateData(query, guid, data_size, data))
}

unsafe extern "system" fn d3d10_set_private_data_interface(
    iface: *mut D3d10Query,
    guid: *const Guid,
    data: *mut c_void,
) -> HResult {
    let query = unsafe { QueryObject::from_d3d10(iface) };
    forward!(D3d10QuerySetPrivateDataInterface(query, guid, data))
}

unsafe extern "system" fn d3d10_begin(iface: *mut D3d10Query) {
    let query = unsafe { QueryObject::from_d3d10(iface) };
    forward!(D3d10QueryBegin(query))
}

unsafe extern "system" fn d3d10_end(iface: *mut D3d10Query) {
    let query = unsafe { QueryObject::from_d3d10(iface) };
    forward!(D3d10QueryEnd(query))
}

unsafe extern "system" fn d3d10_get_data(
    iface: *mut D3d10Query,
    data: *mut c_void,
    data_size: u32,
    flags: u32,
) -> HResult {
    let query = unsafe { QueryObject::from_d3d10(iface) };
    forward!(D3d10QueryGetData(query, data, data_size, flags))
}

unsafe extern "system" fn d3d10_get_data_size(iface: *mut D3d10Query) -> u32 {
    let query = unsafe { QueryObject::from_d3d10(iface) };
    forward!(D3d10QueryGetDataSize(query))
}

unsafe extern "system" fn d3d10_get_desc(iface: *mut D3d10Query, desc: *mut QueryDesc) {
    let query = unsafe { QueryObject::from_d3d10(iface) };
    forward!(D3d10QueryGetDesc(query, desc))
}
