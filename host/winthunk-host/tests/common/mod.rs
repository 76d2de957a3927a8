#![allow(dead_code)]

use std::{
    ffi::c_void,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering::Relaxed},
    },
};

use thunklink::{
    Dispatcher, HostCx, IntoSlot, RawCall, SharedRegion,
    gate::{Gate, GuestInvoker},
    relay,
};
use winthunk_abi::types::*;
use winthunk_host::{
    config::{HostConfig, TransportKind},
    runtime::HostRuntime,
    synthetic::SyntheticDisplay,
    user32::{DisplayApi, ImeApi, NotificationApi, SystemApi, TouchApi},
};

// === Runtimes === //

pub const TRANSPORTS: [TransportKind; 2] = [TransportKind::Direct, TransportKind::Worker];

pub fn config(kind: TransportKind) -> HostConfig {
    let mut config = HostConfig::default();
    config.transport.kind = kind;
    config
}

pub fn display_runtime(kind: TransportKind, display: &Arc<SyntheticDisplay>) -> HostRuntime {
    HostRuntime::builder(config(kind))
        .display(display.clone())
        .build()
        .unwrap()
}

pub fn recording_runtime(config: HostConfig, recorder: &Arc<Recorder>) -> HostRuntime {
    HostRuntime::builder(config)
        .display(recorder.clone())
        .notifications(recorder.clone())
        .ime(recorder.clone())
        .touch(recorder.clone())
        .system(recorder.clone())
        .build()
        .unwrap()
}

// === CountingGate === //

/// An inline gate that counts every host-to-guest crossing.
pub struct CountingGate {
    dispatcher: Arc<Dispatcher>,
    region: SharedRegion,
    crossings: AtomicUsize,
}

impl CountingGate {
    pub fn new(runtime: &HostRuntime) -> Arc<Self> {
        Arc::new(Self {
            dispatcher: runtime.dispatcher().clone(),
            region: *runtime.region(),
            crossings: AtomicUsize::new(0),
        })
    }

    pub fn crossings(&self) -> usize {
        self.crossings.load(Relaxed)
    }
}

impl Gate for CountingGate {
    fn syscall(&self, call: RawCall<'_>) {
        self.dispatcher.dispatch(&HostCx::new(&self.region, self), call);
    }
}

impl GuestInvoker for CountingGate {
    fn invoke(&self, entry: u64, arg: u64) -> u64 {
        self.crossings.fetch_add(1, Relaxed);
        unsafe { relay::execute_guest_entry(entry, arg, 16) }
    }
}

// === Recorder === //

pub const RET_U32: u32 = 0xC0FFEE;
pub const RET_U16: u16 = 7;
pub const RET_I32: i32 = 0x5A;
pub const RET_LRESULT: LResult = -2;
pub const RET_HANDLE: usize = 0xBEEF0;

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Recorded {
    pub name: &'static str,
    pub args: Vec<u64>,
}

/// A native backend that remembers every call it receives, widened to slots.
#[derive(Debug, Default)]
pub struct Recorder {
    calls: Mutex<Vec<Recorded>>,
}

impl Recorder {
    fn push(&self, name: &'static str, args: &[u64]) {
        self.calls.lock().unwrap().push(Recorded {
            name,
            args: args.to_vec(),
        });
    }

    pub fn take(&self) -> Vec<Recorded> {
        std::mem::take(&mut *self.calls.lock().unwrap())
    }

    pub fn single(&self) -> Recorded {
        let mut calls = self.take();
        assert_eq!(calls.len(), 1, "expected exactly one native call, got {calls:?}");
        calls.remove(0)
    }
}

macro_rules! record {
    ($self:ident, $name:literal, $ret:expr; $($arg:expr),*$(,)?) => {{
        $self.push($name, &[$(IntoSlot::into_slot($arg)),*]);
        $ret
    }};
}

fn ret_handle() -> *mut c_void {
    RET_HANDLE as *mut c_void
}

impl DisplayApi for Recorder {
    unsafe fn enum_display_devices_a(
        &self,
        device: *const u8,
        index: u32,
        display_device: *mut c_void,
        flags: u32,
    ) -> Bool {
        record!(self, "EnumDisplayDevicesA", TRUE; device, index, display_device, flags)
    }

    unsafe fn enum_display_devices_w(
        &self,
        device: *const u16,
        index: u32,
        display_device: *mut c_void,
        flags: u32,
    ) -> Bool {
        record!(self, "EnumDisplayDevicesW", TRUE; device, index, display_device, flags)
    }

    unsafe fn monitor_from_rect(&self, rect: *const Rect, flags: u32) -> Hmonitor {
        record!(self, "MonitorFromRect", ret_handle(); rect, flags)
    }

    unsafe fn monitor_from_point(&self, pt: Point, flags: u32) -> Hmonitor {
        record!(self, "MonitorFromPoint", ret_handle(); pt.x, pt.y, flags)
    }

    unsafe fn monitor_from_window(&self, hwnd: Hwnd, flags: u32) -> Hmonitor {
        record!(self, "MonitorFromWindow", ret_handle(); hwnd, flags)
    }

    unsafe fn get_monitor_info_a(&self, monitor: Hmonitor, info: *mut MonitorInfo) -> Bool {
        record!(self, "GetMonitorInfoA", TRUE; monitor, info)
    }

    unsafe fn get_monitor_info_w(&self, monitor: Hmonitor, info: *mut MonitorInfo) -> Bool {
        record!(self, "GetMonitorInfoW", TRUE; monitor, info)
    }

    unsafe fn enum_display_monitors(
        &self,
        hdc: Hdc,
        clip: *const Rect,
        func: Option<MonitorEnumProc>,
        _data: LParam,
    ) -> Bool {
        record!(self, "EnumDisplayMonitors", TRUE; hdc, clip, func.is_some())
    }

    unsafe fn query_display_config(
        &self,
        flags: u32,
        num_path_elements: *mut u32,
        path_info: *mut c_void,
        num_mode_elements: *mut u32,
        mode_info: *mut c_void,
        topology_id: *mut u32,
    ) -> i32 {
        record!(
            self, "QueryDisplayConfig", RET_I32;
            flags, num_path_elements, path_info, num_mode_elements, mode_info, topology_id,
        )
    }

    unsafe fn get_display_config_buffer_sizes(
        &self,
        flags: u32,
        num_path_info: *mut u32,
        num_mode_info: *mut u32,
    ) -> i32 {
        record!(self, "GetDisplayConfigBufferSizes", RET_I32; flags, num_path_info, num_mode_info)
    }
}

impl NotificationApi for Recorder {
    unsafe fn register_device_notification_a(
        &self,
        recipient: Handle,
        filter: *mut c_void,
        flags: u32,
    ) -> HdevNotify {
        record!(self, "RegisterDeviceNotificationA", ret_handle(); recipient, filter, flags)
    }

    unsafe fn register_device_notification_w(
        &self,
        recipient: Handle,
        filter: *mut c_void,
        flags: u32,
    ) -> HdevNotify {
        record!(self, "RegisterDeviceNotificationW", ret_handle(); recipient, filter, flags)
    }

    unsafe fn unregister_device_notification(&self, notify: HdevNotify) -> Bool {
        record!(self, "UnregisterDeviceNotification", TRUE; notify)
    }

    unsafe fn register_power_setting_notification(
        &self,
        recipient: Handle,
        guid: *const Guid,
        flags: u32,
    ) -> HpowerNotify {
        record!(self, "RegisterPowerSettingNotification", ret_handle(); recipient, guid, flags)
    }

    unsafe fn unregister_power_setting_notification(&self, notify: HpowerNotify) -> Bool {
        record!(self, "UnregisterPowerSettingNotification", TRUE; notify)
    }

    unsafe fn register_shell_hook_window(&self, hwnd: Hwnd) -> Bool {
        record!(self, "RegisterShellHookWindow", TRUE; hwnd)
    }

    unsafe fn deregister_shell_hook_window(&self, hwnd: Hwnd) -> Bool {
        record!(self, "DeregisterShellHookWindow", TRUE; hwnd)
    }
}

impl ImeApi for Recorder {
    unsafe fn user32_initialize_imm_entry_table(&self, magic: u32) -> Bool {
        record!(self, "User32InitializeImmEntryTable", TRUE; magic)
    }

    unsafe fn winnls_get_ime_hotkey(&self, hwnd: Hwnd) -> u32 {
        record!(self, "WINNLSGetIMEHotkey", RET_U32; hwnd)
    }

    unsafe fn winnls_enable_ime(&self, hwnd: Hwnd, enable: Bool) -> Bool {
        record!(self, "WINNLSEnableIME", FALSE; hwnd, enable)
    }

    unsafe fn winnls_get_enable_status(&self, hwnd: Hwnd) -> Bool {
        record!(self, "WINNLSGetEnableStatus", TRUE; hwnd)
    }

    unsafe fn send_ime_message_ex_a(&self, hwnd: Hwnd, lparam: LParam) -> LResult {
        record!(self, "SendIMEMessageExA", RET_LRESULT; hwnd, lparam)
    }

    unsafe fn send_ime_message_ex_w(&self, hwnd: Hwnd, lparam: LParam) -> LResult {
        record!(self, "SendIMEMessageExW", RET_LRESULT; hwnd, lparam)
    }
}

impl TouchApi for Recorder {
    unsafe fn get_gesture_config(
        &self,
        hwnd: Hwnd,
        reserved: u32,
        flags: u32,
        count: *mut u32,
        config: *mut c_void,
        size: u32,
    ) -> Bool {
        record!(self, "GetGestureConfig", TRUE; hwnd, reserved, flags, count, config, size)
    }

    unsafe fn set_gesture_config(
        &self,
        hwnd: Hwnd,
        reserved: u32,
        id: u32,
        config: *mut c_void,
        size: u32,
    ) -> Bool {
        record!(self, "SetGestureConfig", TRUE; hwnd, reserved, id, config, size)
    }

    unsafe fn is_touch_window(&self, hwnd: Hwnd, flags: *mut u32) -> Bool {
        record!(self, "IsTouchWindow", TRUE; hwnd, flags)
    }

    unsafe fn get_pointer_devices(&self, device_count: *mut u32, devices: *mut c_void) -> Bool {
        record!(self, "GetPointerDevices", TRUE; device_count, devices)
    }

    unsafe fn register_pointer_device_notifications(
        &self,
        hwnd: Hwnd,
        notify_range: Bool,
    ) -> Bool {
        record!(self, "RegisterPointerDeviceNotifications", TRUE; hwnd, notify_range)
    }

    unsafe fn register_touch_hit_testing_window(&self, hwnd: Hwnd, value: u32) -> Bool {
        record!(self, "RegisterTouchHitTestingWindow", TRUE; hwnd, value)
    }
}

impl SystemApi for Recorder {
    unsafe fn user_signal_proc(
        &self,
        code: u32,
        thread_or_process_id: u32,
        flags: u32,
        module: Handle,
    ) -> u16 {
        record!(self, "UserSignalProc", RET_U16; code, thread_or_process_id, flags, module)
    }

    unsafe fn set_last_error_ex(&self, error: u32, kind: u32) {
        record!(self, "SetLastErrorEx", (); error, kind)
    }

    unsafe fn get_alt_tab_info_a(
        &self,
        hwnd: Hwnd,
        item: i32,
        pati: *mut c_void,
        item_text: *mut u8,
        item_text_len: u32,
    ) -> Bool {
        record!(self, "GetAltTabInfoA", TRUE; hwnd, item, pati, item_text, item_text_len)
    }

    unsafe fn get_alt_tab_info_w(
        &self,
        hwnd: Hwnd,
        item: i32,
        pati: *mut c_void,
        item_text: *mut u16,
        item_text_len: u32,
    ) -> Bool {
        record!(self, "GetAltTabInfoW", TRUE; hwnd, item, pati, item_text, item_text_len)
    }

    unsafe fn set_debug_error_level(&self, level: u32) {
        record!(self, "SetDebugErrorLevel", (); level)
    }

    unsafe fn set_window_station_user(&self, x1: u32, x2: u32) -> u32 {
        record!(self, "SetWindowStationUser", RET_U32; x1, x2)
    }

    unsafe fn register_logon_process(&self, process: Handle, x: Bool) -> u32 {
        record!(self, "RegisterLogonProcess", RET_U32; process, x)
    }

    unsafe fn set_logon_notify_window(&self, winsta: Hwinsta, hwnd: Hwnd) -> u32 {
        record!(self, "SetLogonNotifyWindow", RET_U32; winsta, hwnd)
    }

    unsafe fn register_system_thread(&self, flags: u32, reserved: u32) {
        record!(self, "RegisterSystemThread", (); flags, reserved)
    }

    unsafe fn register_tasklist(&self, x: u32) -> u32 {
        record!(self, "RegisterTasklist", RET_U32; x)
    }

    unsafe fn get_app_compat_flags(&self, task: Htask) -> u32 {
        record!(self, "GetAppCompatFlags", RET_U32; task)
    }

    unsafe fn get_app_compat_flags2(&self, task: Htask) -> u32 {
        record!(self, "GetAppCompatFlags2", RET_U32; task)
    }

    unsafe fn align_rects(&self, rect: *mut Rect, b: u32, c: u32, d: u32) -> Bool {
        record!(self, "AlignRects", TRUE; rect, b, c, d)
    }

    unsafe fn load_local_fonts(&self) {
        record!(self, "LoadLocalFonts", ();)
    }

    unsafe fn disable_process_windows_ghosting(&self) {
        record!(self, "DisableProcessWindowsGhosting", ();)
    }

    unsafe fn user_handle_grant_access(&self, handle: Handle, job: Handle, grant: Bool) -> Bool {
        record!(self, "UserHandleGrantAccess", TRUE; handle, job, grant)
    }

    unsafe fn is_window_redirected_for_print(&self, hwnd: Hwnd) -> Bool {
        record!(self, "IsWindowRedirectedForPrint", FALSE; hwnd)
    }
}
