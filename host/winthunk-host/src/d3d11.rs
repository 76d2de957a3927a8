//! Host handlers for `ID3D11Query` and `ID3D10Query`.
//!
//! Guest stubs pass the address of their wrapper object as `iface`. The wrapper starts with a
//! [`QueryHostRefs`], which is how the handlers find the native interface to call.

use std::{ffi::c_void, sync::Arc};

use thunklink::{DispatcherBuilder, FromSlot, GuestPtr, HostCx, Verification::Unverified};
use winthunk_abi::{
    d3d11::*,
    types::{Guid, HResult, QueryDesc},
};

// === Native Surface === //

/// A native interface pointer as stored in a guest wrapper.
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq)]
pub struct HostIface(pub u64);

pub trait D3d11QueryApi: Send + Sync {
    unsafe fn query_interface(
        &self,
        iface: HostIface,
        riid: *const Guid,
        object: *mut *mut c_void,
    ) -> HResult;

    unsafe fn add_ref(&self, iface: HostIface) -> u32;

    unsafe fn release(&self, iface: HostIface) -> u32;

    unsafe fn get_device(&self, iface: HostIface, device: *mut *mut c_void);

    unsafe fn get_private_data(
        &self,
        iface: HostIface,
        guid: *const Guid,
        data_size: *mut u32,
        data: *mut c_void,
    ) -> HResult;

    unsafe fn set_private_data(
        &self,
        iface: HostIface,
        guid: *const Guid,
        data_size: u32,
        data: *const c_void,
    ) -> HResult;

    unsafe fn set_private_data_interface(
        &self,
        iface: HostIface,
        guid: *const Guid,
        data: *mut c_void,
    ) -> HResult;

    unsafe fn get_data_size(&self, iface: HostIface) -> u32;

    unsafe fn get_desc(&self, iface: HostIface, desc: *mut QueryDesc);
}

/// The `ID3D10Query` view of a query. Shares every method with [`D3d11QueryApi`] and adds the
/// legacy `Begin`/`End`/`GetData` trio that moved to the device context in D3D11.
pub trait D3d10QueryApi: D3d11QueryApi {
    unsafe fn begin(&self, iface: HostIface);

    unsafe fn end(&self, iface: HostIface);

    unsafe fn get_data(
        &self,
        iface: HostIface,
        data: *mut c_void,
        data_size: u32,
        flags: u32,
    ) -> HResult;
}

fn host11(cx: &HostCx<'_>, iface: u64) -> HostIface {
    HostIface(unsafe { cx.read("ID3D11Query", GuestPtr::<QueryHostRefs>::new(iface)) }.host11)
}

fn host10(cx: &HostCx<'_>, iface: u64) -> HostIface {
    HostIface(unsafe { cx.read("ID3D10Query", GuestPtr::<QueryHostRefs>::new(iface)) }.host10)
}

// === ID3D11Query === //

pub fn bind_d3d11_query<A>(builder: DispatcherBuilder, api: &Arc<A>) -> DispatcherBuilder
where
    A: ?Sized + D3d11QueryApi + 'static,
{
    builder
        .bind_api(api, Unverified, |api, cx, call: &mut D3d11QueryQueryInterface| unsafe {
            api.query_interface(
                host11(cx, call.iface),
                cx.g2h(call.riid),
                cx.g2h(call.object),
            )
        })
        .bind_api(api, Unverified, |api, cx, call: &mut D3d11QueryAddRef| unsafe {
            api.add_ref(host11(cx, call.iface))
        })
        .bind_api(api, Unverified, |api, cx, call: &mut D3d11QueryRelease| unsafe {
            api.release(host11(cx, call.iface))
        })
        .bind_api(api, Unverified, |api, cx, call: &mut D3d11QueryGetDevice| unsafe {
            api.get_device(host11(cx, call.iface), cx.g2h(call.device))
        })
        .bind_api(api, Unverified, |api, cx, call: &mut D3d11QueryGetPrivateData| unsafe {
            api.get_private_data(
                host11(cx, call.iface),
                cx.g2h(call.guid),
                cx.g2h(call.data_size),
                cx.g2h(call.data),
            )
        })
        .bind_api(api, Unverified, |api, cx, call: &mut D3d11QuerySetPrivateData| unsafe {
            api.set_private_data(
                host11(cx, call.iface),
                cx.g2h(call.guid),
                FromSlot::from_slot(call.data_size),
                cx.g2h(call.data),
            )
        })
        .bind_api(api, Unverified, |api, cx, call: &mut D3d11QuerySetPrivateDataInterface| unsafe {
            api.set_private_data_interface(
                host11(cx, call.iface),
                cx.g2h(call.guid),
                cx.g2h(call.data),
            )
        })
        .bind_api(api, Unverified, |api, cx, call: &mut D3d11QueryGetDataSize| unsafe {
            api.get_data_size(host11(cx, call.iface))
        })
        .bind_api(api, Unverified, |api, cx, call: &mut D3d11QueryGetDesc| unsafe {
            api.get_desc(host11(cx, call.iface), cx.g2h(call.desc))
        })
}

// === ID3D10Query === //

pub fn bind_d3d10_query<A>(builder: DispatcherBuilder, api: &Arc<A>) -> DispatcherBuilder
where
    A: ?Sized + D3d10QueryApi + 'static,
{
    builder
        .bind_api(api, Unverified, |api, cx, call: &mut D3d10QueryQueryInterface| unsafe {
            api.query_interface(
                host10(cx, call.iface),
                cx.g2h(call.riid),
                cx.g2h(call.object),
            )
        })
        .bind_api(api, Unverified, |api, cx, call: &mut D3d10QueryAddRef| unsafe {
            api.add_ref(host10(cx, call.iface))
        })
        .bind_api(api, Unverified, |api, cx, call: &mut D3d10QueryRelease| unsafe {
            api.release(host10(cx, call.iface))
        })
        .bind_api(api, Unverified, |api, cx, call: &mut D3d10QueryGetDevice| unsafe {
            api.get_device(host10(cx, call.iface), cx.g2h(call.device))
        })
        .bind_api(api, Unverified, |api, cx, call: &mut D3d10QueryGetPrivateData| unsafe {
            api.get_private_data(
                host10(cx, call.iface),
                cx.g2h(call.guid),
                cx.g2h(call.data_size),
                cx.g2h(call.data),
            )
        })
        .bind_api(api, Unverified, |api, cx, call: &mut D3d10QuerySetPrivateData| unsafe {
            api.set_private_data(
                host10(cx, call.iface),
                cx.g2h(call.guid),
                FromSlot::from_slot(call.data_size),
                cx.g2h(call.data),
            )
        })
        .bind_api(api, Unverified, |api, cx, call: &mut D3d10QuerySetPrivateDataInterface| unsafe {
            api.set_private_data_interface(
                host10(cx, call.iface),
                cx.g2h(call.guid),
                cx.g2h(call.data),
            )
        })
        .bind_api(api, Unverified, |api, cx, call: &mut D3d10QueryBegin| unsafe {
            api.begin(host10(cx, call.iface))
        })
        .bind_api(api, Unverified, |api, cx, call: &mut D3d10QueryEnd| unsafe {
            api.end(host10(cx, call.iface))
        })
        .bind_api(api, Unverified, |api, cx, call: &mut D3d10QueryGetData| unsafe {
            api.get_data(
                host10(cx, call.iface),
                cx.g2h(call.data),
                FromSlot::from_slot(call.data_size),
                FromSlot::from_slot(call.flags),
            )
        })
        .bind_api(api, Unverified, |api, cx, call: &mut D3d10QueryGetDataSize| unsafe {
            api.get_data_size(host10(cx, call.iface))
        })
        .bind_api(api, Unverified, |api, cx, call: &mut D3d10QueryGetDesc| unsafe {
            api.get_desc(host10(cx, call.iface), cx.g2h(call.desc))
        })
}
