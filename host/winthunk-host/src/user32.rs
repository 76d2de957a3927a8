//! Host handlers for the forwarded `user32` surface.
//!
//! The native side is split into one trait per functional area so that a host only has to
//! provide the parts it actually backs. Areas that are never registered leave their call ids
//! unknown to the dispatcher.

use std::{ffi::c_void, sync::Arc};

use thunklink::{
    DispatcherBuilder, FromSlot, HostCx,
    Verification::{Unverified, Verified},
    relay::GuestCallback,
};
use winthunk_abi::{types::*, user32::*};

// === Native Surface === //

pub trait DisplayApi: Send + Sync {
    unsafe fn enum_display_devices_a(
        &self,
        device: *const u8,
        index: u32,
        display_device: *mut c_void,
        flags: u32,
    ) -> Bool;

    unsafe fn enum_display_devices_w(
        &self,
        device: *const u16,
        index: u32,
        display_device: *mut c_void,
        flags: u32,
    ) -> Bool;

    unsafe fn monitor_from_rect(&self, rect: *const Rect, flags: u32) -> Hmonitor;

    unsafe fn monitor_from_point(&self, pt: Point, flags: u32) -> Hmonitor;

    unsafe fn monitor_from_window(&self, hwnd: Hwnd, flags: u32) -> Hmonitor;

    unsafe fn get_monitor_info_a(&self, monitor: Hmonitor, info: *mut MonitorInfo) -> Bool;

    unsafe fn get_monitor_info_w(&self, monitor: Hmonitor, info: *mut MonitorInfo) -> Bool;

    /// Calls `func` once per monitor intersecting `clip`, stopping early when it returns
    /// [`FALSE`]. `func` may be `None`, in which case the monitors are walked without calling
    /// anything.
    unsafe fn enum_display_monitors(
        &self,
        hdc: Hdc,
        clip: *const Rect,
        func: Option<MonitorEnumProc>,
        data: LParam,
    ) -> Bool;

    unsafe fn query_display_config(
        &self,
        flags: u32,
        num_path_elements: *mut u32,
        path_info: *mut c_void,
        num_mode_elements: *mut u32,
        mode_info: *mut c_void,
        topology_id: *mut u32,
    ) -> i32;

    unsafe fn get_display_config_buffer_sizes(
        &self,
        flags: u32,
        num_path_info: *mut u32,
        num_mode_info: *mut u32,
    ) -> i32;
}

pub trait NotificationApi: Send + Sync {
    unsafe fn register_device_notification_a(
        &self,
        recipient: Handle,
        filter: *mut c_void,
        flags: u32,
    ) -> HdevNotify;

    unsafe fn register_device_notification_w(
        &self,
        recipient: Handle,
        filter: *mut c_void,
        flags: u32,
    ) -> HdevNotify;

    unsafe fn unregister_device_notification(&self, notify: HdevNotify) -> Bool;

    unsafe fn register_power_setting_notification(
        &self,
        recipient: Handle,
        guid: *const Guid,
        flags: u32,
    ) -> HpowerNotify;

    unsafe fn unregister_power_setting_notification(&self, notify: HpowerNotify) -> Bool;

    unsafe fn register_shell_hook_window(&self, hwnd: Hwnd) -> Bool;

    unsafe fn deregister_shell_hook_window(&self, hwnd: Hwnd) -> Bool;
}

pub trait ImeApi: Send + Sync {
    unsafe fn user32_initialize_imm_entry_table(&self, magic: u32) -> Bool;

    unsafe fn winnls_get_ime_hotkey(&self, hwnd: Hwnd) -> u32;

    unsafe fn winnls_enable_ime(&self, hwnd: Hwnd, enable: Bool) -> Bool;

    unsafe fn winnls_get_enable_status(&self, hwnd: Hwnd) -> Bool;

    unsafe fn send_ime_message_ex_a(&self, hwnd: Hwnd, lparam: LParam) -> LResult;

    unsafe fn send_ime_message_ex_w(&self, hwnd: Hwnd, lparam: LParam) -> LResult;
}

pub trait TouchApi: Send + Sync {
    unsafe fn get_gesture_config(
        &self,
        hwnd: Hwnd,
        reserved: u32,
        flags: u32,
        count: *mut u32,
        config: *mut c_void,
        size: u32,
    ) -> Bool;

    unsafe fn set_gesture_config(
        &self,
        hwnd: Hwnd,
        reserved: u32,
        id: u32,
        config: *mut c_void,
        size: u32,
    ) -> Bool;

    unsafe fn is_touch_window(&self, hwnd: Hwnd, flags: *mut u32) -> Bool;

    unsafe fn get_pointer_devices(&self, device_count: *mut u32, devices: *mut c_void) -> Bool;

    unsafe fn register_pointer_device_notifications(&self, hwnd: Hwnd, notify_range: Bool)
    -> Bool;

    unsafe fn register_touch_hit_testing_window(&self, hwnd: Hwnd, value: u32) -> Bool;
}

pub trait SystemApi: Send + Sync {
    unsafe fn user_signal_proc(
        &self,
        code: u32,
        thread_or_process_id: u32,
        flags: u32,
        module: Handle,
    ) -> u16;

    unsafe fn set_last_error_ex(&self, error: u32, kind: u32);

    unsafe fn get_alt_tab_info_a(
        &self,
        hwnd: Hwnd,
        item: i32,
        pati: *mut c_void,
        item_text: *mut u8,
        item_text_len: u32,
    ) -> Bool;

    unsafe fn get_alt_tab_info_w(
        &self,
        hwnd: Hwnd,
        item: i32,
        pati: *mut c_void,
        item_text: *mut u16,
        item_text_len: u32,
    ) -> Bool;

    unsafe fn set_debug_error_level(&self, level: u32);

    unsafe fn set_window_station_user(&self, x1: u32, x2: u32) -> u32;

    unsafe fn register_logon_process(&self, process: Handle, x: Bool) -> u32;

    unsafe fn set_logon_notify_window(&self, winsta: Hwinsta, hwnd: Hwnd) -> u32;

    unsafe fn register_system_thread(&self, flags: u32, reserved: u32);

    unsafe fn register_tasklist(&self, x: u32) -> u32;

    unsafe fn get_app_compat_flags(&self, task: Htask) -> u32;

    unsafe fn get_app_compat_flags2(&self, task: Htask) -> u32;

    unsafe fn align_rects(&self, rect: *mut Rect, b: u32, c: u32, d: u32) -> Bool;

    unsafe fn load_local_fonts(&self);

    unsafe fn disable_process_windows_ghosting(&self);

    unsafe fn user_handle_grant_access(&self, handle: Handle, job: Handle, grant: Bool) -> Bool;

    unsafe fn is_window_redirected_for_print(&self, hwnd: Hwnd) -> Bool;
}

// === Display === //

pub fn bind_display<A>(builder: DispatcherBuilder, api: &Arc<A>) -> DispatcherBuilder
where
    A: ?Sized + DisplayApi + 'static,
{
    builder
        .bind_api(api, Verified, |api, cx, call: &mut EnumDisplayDevicesA| unsafe {
            api.enum_display_devices_a(
                cx.g2h(call.device),
                FromSlot::from_slot(call.index),
                cx.g2h(call.display_device),
                FromSlot::from_slot(call.flags),
            )
        })
        .bind_api(api, Unverified, |api, cx, call: &mut EnumDisplayDevicesW| unsafe {
            api.enum_display_devices_w(
                cx.g2h(call.device),
                FromSlot::from_slot(call.index),
                cx.g2h(call.display_device),
                FromSlot::from_slot(call.flags),
            )
        })
        .bind_api(api, Verified, |api, cx, call: &mut MonitorFromRect| unsafe {
            cx.handle_to_guest(
                api.monitor_from_rect(cx.g2h(call.rect), FromSlot::from_slot(call.flags)),
            )
        })
        .bind_api(api, Verified, |api, cx, call: &mut MonitorFromPoint| unsafe {
            let pt = Point {
                x: FromSlot::from_slot(call.pt_x),
                y: FromSlot::from_slot(call.pt_y),
            };

            cx.handle_to_guest(api.monitor_from_point(pt, FromSlot::from_slot(call.flags)))
        })
        .bind_api(api, Verified, |api, cx, call: &mut MonitorFromWindow| unsafe {
            cx.handle_to_guest(
                api.monitor_from_window(cx.handle(call.hwnd), FromSlot::from_slot(call.flags)),
            )
        })
        .bind_api(api, Verified, |api, cx, call: &mut GetMonitorInfoA| unsafe {
            api.get_monitor_info_a(cx.handle(call.monitor), cx.g2h(call.info))
        })
        .bind_api(api, Verified, |api, cx, call: &mut GetMonitorInfoW| unsafe {
            api.get_monitor_info_w(cx.handle(call.monitor), cx.g2h(call.info))
        })
        .bind_api(api, Verified, |api, cx, call: &mut EnumDisplayMonitors| unsafe {
            let hdc = cx.handle(call.hdc);
            let clip = cx.g2h(call.clip);

            match GuestCallback::new(call.wrapper, call.func, call.data) {
                Some(callback) => {
                    let _relaying = callback.relaying();
                    let relay = MonitorEnumRelay { cx: *cx, callback };

                    api.enum_display_monitors(
                        hdc,
                        clip,
                        Some(monitor_enum_trampoline),
                        &relay as *const MonitorEnumRelay<'_> as LParam,
                    )
                }
                None => api.enum_display_monitors(hdc, clip, None, 0),
            }
        })
        .bind_api(api, Unverified, |api, cx, call: &mut QueryDisplayConfig| unsafe {
            api.query_display_config(
                FromSlot::from_slot(call.flags),
                cx.g2h(call.num_path_elements),
                cx.g2h(call.path_info),
                cx.g2h(call.num_mode_elements),
                cx.g2h(call.mode_info),
                cx.g2h(call.topology_id),
            )
        })
        .bind_api(api, Verified, |api, cx, call: &mut GetDisplayConfigBufferSizes| unsafe {
            api.get_display_config_buffer_sizes(
                FromSlot::from_slot(call.flags),
                cx.g2h(call.num_path_info),
                cx.g2h(call.num_mode_info),
            )
        })
}

/// What [`monitor_enum_trampoline`] receives through the native callback's `LPARAM`.
struct MonitorEnumRelay<'a> {
    cx: HostCx<'a>,
    callback: GuestCallback,
}

unsafe extern "system" fn monitor_enum_trampoline(
    monitor: Hmonitor,
    dc: Hdc,
    rect: *mut Rect,
    param: LParam,
) -> Bool {
    let relay = unsafe { &*(param as *const MonitorEnumRelay<'_>) };
    let cx = relay.cx;

    let mut call = EnumDisplayMonitorsCb {
        func: relay.callback.func,
        param: relay.callback.param,
        monitor: cx.handle_to_guest(monitor),
        dc: cx.handle_to_guest(dc),
        rect: cx.h2g(rect),
    };

    Bool::from_slot(relay.callback.invoke(&cx, &mut call))
}

// === Notifications === //

pub fn bind_notifications<A>(builder: DispatcherBuilder, api: &Arc<A>) -> DispatcherBuilder
where
    A: ?Sized + NotificationApi + 'static,
{
    builder
        .bind_api(api, Unverified, |api, cx, call: &mut RegisterDeviceNotificationA| unsafe {
            cx.handle_to_guest(api.register_device_notification_a(
                cx.handle(call.recipient),
                cx.g2h(call.filter),
                FromSlot::from_slot(call.flags),
            ))
        })
        .bind_api(api, Unverified, |api, cx, call: &mut RegisterDeviceNotificationW| unsafe {
            cx.handle_to_guest(api.register_device_notification_w(
                cx.handle(call.recipient),
                cx.g2h(call.filter),
                FromSlot::from_slot(call.flags),
            ))
        })
        .bind_api(api, Unverified, |api, cx, call: &mut UnregisterDeviceNotification| unsafe {
            api.unregister_device_notification(cx.handle(call.notify))
        })
        .bind_api(api, Unverified, |api, cx, call: &mut RegisterPowerSettingNotification| unsafe {
            cx.handle_to_guest(api.register_power_setting_notification(
                cx.handle(call.recipient),
                cx.g2h(call.guid),
                FromSlot::from_slot(call.flags),
            ))
        })
        .bind_api(api, Unverified, |api, cx, call: &mut UnregisterPowerSettingNotification| unsafe {
            api.unregister_power_setting_notification(cx.handle(call.notify))
        })
        .bind_api(api, Unverified, |api, cx, call: &mut RegisterShellHookWindow| unsafe {
            api.register_shell_hook_window(cx.handle(call.hwnd))
        })
        .bind_api(api, Unverified, |api, cx, call: &mut DeregisterShellHookWindow| unsafe {
            api.deregister_shell_hook_window(cx.handle(call.hwnd))
        })
}

// === IME === //

pub fn bind_ime<A>(builder: DispatcherBuilder, api: &Arc<A>) -> DispatcherBuilder
where
    A: ?Sized + ImeApi + 'static,
{
    builder
        .bind_api(api, Unverified, |api, _cx, call: &mut User32InitializeImmEntryTable| unsafe {
            api.user32_initialize_imm_entry_table(FromSlot::from_slot(call.magic))
        })
        .bind_api(api, Unverified, |api, cx, call: &mut WinnlsGetImeHotkey| unsafe {
            api.winnls_get_ime_hotkey(cx.handle(call.hwnd))
        })
        .bind_api(api, Unverified, |api, cx, call: &mut WinnlsEnableIme| unsafe {
            api.winnls_enable_ime(cx.handle(call.hwnd), FromSlot::from_slot(call.enable))
        })
        .bind_api(api, Unverified, |api, cx, call: &mut WinnlsGetEnableStatus| unsafe {
            api.winnls_get_enable_status(cx.handle(call.hwnd))
        })
        .bind_api(api, Unverified, |api, cx, call: &mut SendImeMessageExA| unsafe {
            api.send_ime_message_ex_a(cx.handle(call.hwnd), FromSlot::from_slot(call.lparam))
        })
        .bind_api(api, Unverified, |api, cx, call: &mut SendImeMessageExW| unsafe {
            api.send_ime_message_ex_w(cx.handle(call.hwnd), FromSlot::from_slot(call.lparam))
        })
}

// === Touch === //

pub fn bind_touch<A>(builder: DispatcherBuilder, api: &Arc<A>) -> DispatcherBuilder
where
    A: ?Sized + TouchApi + 'static,
{
    builder
        .bind_api(api, Unverified, |api, cx, call: &mut GetGestureConfig| unsafe {
            api.get_gesture_config(
                cx.handle(call.hwnd),
                FromSlot::from_slot(call.reserved),
                FromSlot::from_slot(call.flags),
                cx.g2h(call.count),
                cx.g2h(call.config),
                FromSlot::from_slot(call.size),
            )
        })
        .bind_api(api, Unverified, |api, cx, call: &mut SetGestureConfig| unsafe {
            api.set_gesture_config(
                cx.handle(call.hwnd),
                FromSlot::from_slot(call.reserved),
                FromSlot::from_slot(call.id),
                cx.g2h(call.config),
                FromSlot::from_slot(call.size),
            )
        })
        .bind_api(api, Unverified, |api, cx, call: &mut IsTouchWindow| unsafe {
            api.is_touch_window(cx.handle(call.hwnd), cx.g2h(call.flags))
        })
        .bind_api(api, Unverified, |api, cx, call: &mut GetPointerDevices| unsafe {
            api.get_pointer_devices(cx.g2h(call.device_count), cx.g2h(call.devices))
        })
        .bind_api(api, Unverified, |api, cx, call: &mut RegisterPointerDeviceNotifications| unsafe {
            api.register_pointer_device_notifications(
                cx.handle(call.hwnd),
                FromSlot::from_slot(call.notify_range),
            )
        })
        .bind_api(api, Unverified, |api, cx, call: &mut RegisterTouchHitTestingWindow| unsafe {
            api.register_touch_hit_testing_window(
                cx.handle(call.hwnd),
                FromSlot::from_slot(call.value),
            )
        })
}

// === System === //

pub fn bind_system<A>(builder: DispatcherBuilder, api: &Arc<A>) -> DispatcherBuilder
where
    A: ?Sized + SystemApi + 'static,
{
    builder
        .bind_api(api, Unverified, |api, cx, call: &mut UserSignalProc| unsafe {
            api.user_signal_proc(
                FromSlot::from_slot(call.code),
                FromSlot::from_slot(call.thread_or_process_id),
                FromSlot::from_slot(call.flags),
                cx.handle(call.module),
            )
        })
        .bind_api(api, Unverified, |api, _cx, call: &mut SetLastErrorEx| unsafe {
            api.set_last_error_ex(
                FromSlot::from_slot(call.error),
                FromSlot::from_slot(call.kind),
            )
        })
        .bind_api(api, Unverified, |api, cx, call: &mut GetAltTabInfoA| unsafe {
            api.get_alt_tab_info_a(
                cx.handle(call.hwnd),
                FromSlot::from_slot(call.item),
                cx.g2h(call.pati),
                cx.g2h(call.item_text),
                FromSlot::from_slot(call.item_text_len),
            )
        })
        .bind_api(api, Unverified, |api, cx, call: &mut GetAltTabInfoW| unsafe {
            api.get_alt_tab_info_w(
                cx.handle(call.hwnd),
                FromSlot::from_slot(call.item),
                cx.g2h(call.pati),
                cx.g2h(call.item_text),
                FromSlot::from_slot(call.item_text_len),
            )
        })
        .bind_api(api, Unverified, |api, _cx, call: &mut SetDebugErrorLevel| unsafe {
            api.set_debug_error_level(FromSlot::from_slot(call.level))
        })
        .bind_api(api, Unverified, |api, _cx, call: &mut SetWindowStationUser| unsafe {
            api.set_window_station_user(FromSlot::from_slot(call.x1), FromSlot::from_slot(call.x2))
        })
        .bind_api(api, Unverified, |api, cx, call: &mut RegisterLogonProcess| unsafe {
            api.register_logon_process(cx.handle(call.process), FromSlot::from_slot(call.x))
        })
        .bind_api(api, Unverified, |api, cx, call: &mut SetLogonNotifyWindow| unsafe {
            api.set_logon_notify_window(cx.handle(call.winsta), cx.handle(call.hwnd))
        })
        .bind_api(api, Unverified, |api, _cx, call: &mut RegisterSystemThread| unsafe {
            api.register_system_thread(
                FromSlot::from_slot(call.flags),
                FromSlot::from_slot(call.reserved),
            )
        })
        .bind_api(api, Unverified, |api, _cx, call: &mut RegisterTasklist| unsafe {
            api.register_tasklist(FromSlot::from_slot(call.x))
        })
        .bind_api(api, Unverified, |api, cx, call: &mut GetAppCompatFlags| unsafe {
            api.get_app_compat_flags(cx.handle(call.task))
        })
        .bind_api(api, Unverified, |api, cx, call: &mut GetAppCompatFlags2| unsafe {
            api.get_app_compat_flags2(cx.handle(call.task))
        })
        .bind_api(api, Unverified, |api, cx, call: &mut AlignRects| unsafe {
            api.align_rects(
                cx.g2h(call.rect),
                FromSlot::from_slot(call.b),
                FromSlot::from_slot(call.c),
                FromSlot::from_slot(call.d),
            )
        })
        .bind_api(api, Unverified, |api, _cx, _call: &mut LoadLocalFonts| unsafe {
            api.load_local_fonts()
        })
        .bind_api(api, Unverified, |api, _cx, _call: &mut DisableProcessWindowsGhosting| unsafe {
            api.disable_process_windows_ghosting()
        })
        .bind_api(api, Unverified, |api, cx, call: &mut UserHandleGrantAccess| unsafe {
            api.user_handle_grant_access(
                cx.handle(call.handle),
                cx.handle(call.job),
                FromSlot::from_slot(call.grant),
            )
        })
        .bind_api(api, Unverified, |api, cx, call: &mut IsWindowRedirectedForPrint| unsafe {
            api.is_window_redirected_for_print(cx.handle(call.hwnd))
        })
}
