use std::{ffi::c_void, mem};

use thunklink::{FromSlot, IntoSlot};
use winthunk_abi::{types::*, user32::*};

use crate::forward;

// === Process & Session === //

pub unsafe extern "system" fn user_signal_proc(
    code: u32,
    thread_or_process_id: u32,
    flags: u32,
    module: *mut c_void,
) -> u16 {
    forward!(UserSignalProc(code, thread_or_process_id, flags, module))
}

pub unsafe extern "system" fn set_last_error_ex(error: u32, kind: u32) {
    forward!(SetLastErrorEx(error, kind))
}

pub unsafe extern "system" fn get_alt_tab_info_a(
    hwnd: Hwnd,
    item: i32,
    pati: *mut c_void,
    item_text: *mut u8,
    item_text_len: u32,
) -> Bool {
    forward!(GetAltTabInfoA(hwnd, item, pati, item_text, item_text_len))
}

pub unsafe extern "system" fn get_alt_tab_info_w(
    hwnd: Hwnd,
    item: i32,
    pati: *mut c_void,
    item_text: *mut u16,
    item_text_len: u32,
) -> Bool {
    forward!(GetAltTabInfoW(hwnd, item, pati, item_text, item_text_len))
}

pub unsafe extern "system" fn set_debug_error_level(level: u32) {
    forward!(SetDebugErrorLevel(level))
}

pub unsafe extern "system" fn set_window_station_user(x1: u32, x2: u32) -> u32 {
    forward!(SetWindowStationUser(x1, x2))
}

pub unsafe extern "system" fn register_logon_process(process: Handle, x: Bool) -> u32 {
    forward!(RegisterLogonProcess(process, x))
}

pub unsafe extern "system" fn set_logon_notify_window(winsta: Hwinsta, hwnd: Hwnd) -> u32 {
    forward!(SetLogonNotifyWindow(winsta, hwnd))
}

// === Display & Monitors === //

pub unsafe extern "system" fn enum_display_devices_a(
    device: *const u8,
    index: u32,
    display_device: *mut c_void,
    flags: u32,
) -> Bool {
    forward!(EnumDisplayDevicesA(device, index, display_device, flags))
}

pub unsafe extern "system" fn enum_display_devices_w(
    device: *const u16,
    index: u32,
    display_device: *mut c_void,
    flags: u32,
) -> Bool {
    forward!(EnumDisplayDevicesW(device, index, display_device, flags))
}

pub unsafe extern "system" fn monitor_from_rect(rect: *const Rect, flags: u32) -> Hmonitor {
    forward!(MonitorFromRect(rect, flags))
}

pub unsafe extern "system" fn monitor_from_point(pt: Point, flags: u32) -> Hmonitor {
    forward!(MonitorFromPoint(pt.x, pt.y, flags))
}

pub unsafe extern "system" fn monitor_from_window(hwnd: Hwnd, flags: u32) -> Hmonitor {
    forward!(MonitorFromWindow(hwnd, flags))
}

pub unsafe extern "system" fn get_monitor_info_a(
    monitor: Hmonitor,
    info: *mut MonitorInfo,
) -> Bool {
    forward!(GetMonitorInfoA(monitor, info))
}

pub unsafe extern "system" fn get_monitor_info_w(
    monitor: Hmonitor,
    info: *mut MonitorInfo,
) -> Bool {
    forward!(GetMonitorInfoW(monitor, info))
}

pub unsafe extern "system" fn enum_display_monitors(
    hdc: Hdc,
    clip: *const Rect,
    func: Option<MonitorEnumProc>,
    data: LParam,
) -> Bool {
    let func = func.map_or(0, |func| func as usize as u64);
    let wrapper = enum_display_monitors_cb as usize as u64;

    forward!(EnumDisplayMonitors(hdc, clip, func, data, wrapper))
}

/// The guest entry the host relays every enumerated monitor through.
pub unsafe extern "C" fn enum_display_monitors_cb(arg: u64) -> u64 {
    let call = unsafe { &*<*const EnumDisplayMonitorsCb>::from_slot(arg) };
    let func = unsafe { mem::transmute::<usize, MonitorEnumProc>(call.func as usize) };

    let ret = unsafe {
        func(
            Hmonitor::from_slot(call.monitor),
            Hdc::from_slot(call.dc),
            <*mut Rect>::from_slot(call.rect),
            LParam::from_slot(call.param),
        )
    };

    ret.into_slot()
}

pub unsafe extern "system" fn query_display_config(
    flags: u32,
    num_path_elements: *mut u32,
    path_info: *mut c_void,
    num_mode_elements: *mut u32,
    mode_info: *mut c_void,
    topology_id: *mut u32,
) -> i32 {
    forward!(QueryDisplayConfig(
        flags,
        num_path_elements,
        path_info,
        num_mode_elements,
        mode_info,
        topology_id,
    ))
}

pub unsafe extern "system" fn get_display_config_buffer_sizes(
    flags: u32,
    num_path_info: *mut u32,
    num_mode_info: *mut u32,
) -> i32 {
    forward!(GetDisplayConfigBufferSizes(
        flags,
        num_path_info,
        num_mode_info
    ))
}

// === Shell & Notifications === //

pub unsafe extern "system" fn register_system_thread(flags: u32, reserved: u32) {
    forward!(RegisterSystemThread(flags, reserved))
}

pub unsafe extern "system" fn register_shell_hook_window(hwnd: Hwnd) -> Bool {
    forward!(RegisterShellHookWindow(hwnd))
}

pub unsafe extern "system" fn deregister_shell_hook_window(hwnd: Hwnd) -> Bool {
    forward!(DeregisterShellHookWindow(hwnd))
}

pub unsafe extern "system" fn register_tasklist(x: u32) -> u32 {
    forward!(RegisterTasklist(x))
}

pub unsafe extern "system" fn register_device_notification_a(
    recipient: Handle,
    filter: *mut c_void,
    flags: u32,
) -> HdevNotify {
    forward!(RegisterDeviceNotificationA(recipient, filter, flags))
}

pub unsafe extern "system" fn register_device_notification_w(
    recipient: Handle,
    filter: *mut c_void,
    flags: u32,
) -> HdevNotify {
    forward!(RegisterDeviceNotificationW(recipient, filter, flags))
}

pub unsafe extern "system" fn unregister_device_notification(notify: HdevNotify) -> Bool {
    forward!(UnregisterDeviceNotification(notify))
}

pub unsafe extern "system" fn register_power_setting_notification(
    recipient: Handle,
    guid: *const Guid,
    flags: u32,
) -> HpowerNotify {
    forward!(RegisterPowerSettingNotification(recipient, guid, flags))
}

pub unsafe extern "system" fn unregister_power_setting_notification(notify: HpowerNotify) -> Bool {
    forward!(UnregisterPowerSettingNotification(notify))
}

// === IME === //

pub unsafe extern "system" fn user32_initialize_imm_entry_table(magic: u32) -> Bool {
    forward!(User32InitializeImmEntryTable(magic))
}

pub unsafe extern "system" fn winnls_get_ime_hotkey(hwnd: Hwnd) -> u32 {
    forward!(WinnlsGetImeHotkey(hwnd))
}

pub unsafe extern "system" fn winnls_enable_ime(hwnd: Hwnd, enable: Bool) -> Bool {
    forward!(WinnlsEnableIme(hwnd, enable))
}

pub unsafe extern "system" fn winnls_get_enable_status(hwnd: Hwnd) -> Bool {
    forward!(WinnlsGetEnableStatus(hwnd))
}

pub unsafe extern "system" fn send_ime_message_ex_a(hwnd: Hwnd, lparam: LParam) -> LResult {
    forward!(SendImeMessageExA(hwnd, lparam))
}

pub unsafe extern "system" fn send_ime_message_ex_w(hwnd: Hwnd, lparam: LParam) -> LResult {
    forward!(SendImeMessageExW(hwnd, lparam))
}

// === Touch & Pointer === //

pub unsafe extern "system" fn get_gesture_config(
    hwnd: Hwnd,
    reserved: u32,
    flags: u32,
    count: *mut u32,
    config: *mut c_void,
    size: u32,
) -> Bool {
    forward!(GetGestureConfig(hwnd, reserved, flags, count, config, size))
}

pub unsafe extern "system" fn set_gesture_config(
    hwnd: Hwnd,
    reserved: u32,
    id: u32,
    config: *mut c_void,
    size: u32,
) -> Bool {
    forward!(SetGestureConfig(hwnd, reserved, id, config, size))
}

pub unsafe extern "system" fn is_touch_window(hwnd: Hwnd, flags: *mut u32) -> Bool {
    forward!(IsTouchWindow(hwnd, flags))
}

pub unsafe extern "system" fn get_pointer_devices(
    device_count: *mut u32,
    devices: *mut c_void,
) -> Bool {
    forward!(GetPointerDevices(device_count, devices))
}

pub unsafe extern "system" fn register_pointer_device_notifications(
    hwnd: Hwnd,
    notify_range: Bool,
) -> Bool {
    forward!(RegisterPointerDeviceNotifications(hwnd, notify_range))
}

pub unsafe extern "system" fn register_touch_hit_testing_window(hwnd: Hwnd, value: u32) -> Bool {
    forward!(RegisterTouchHitTestingWindow(hwnd, value))
}

// === System === //

pub unsafe extern "system" fn get_app_compat_flags(task: Htask) -> u32 {
    forward!(GetAppCompatFlags(task))
}

pub unsafe extern "system" fn get_app_compat_flags2(task: Htask) -> u32 {
    forward!(GetAppCompatFlags2(task))
}

pub unsafe extern "system" fn align_rects(rect: *mut Rect, b: u32, c: u32, d: u32) -> Bool {
    forward!(AlignRects(rect, b, c, d))
}

pub unsafe extern "system" fn load_local_fonts() {
    forward!(LoadLocalFonts())
}

pub unsafe extern "system" fn disable_process_windows_ghosting() {
    forward!(DisableProcessWindowsGhosting())
}

pub unsafe extern "system" fn user_handle_grant_access(
    handle: Handle,
    job: Handle,
    grant: Bool,
) -> Bool {
    forward!(UserHandleGrantAccess(handle, job, grant))
}

pub unsafe extern "system" fn is_window_redirected_for_print(hwnd: Hwnd) -> Bool {
    forward!(IsWindowRedirectedForPrint(hwnd))
}
