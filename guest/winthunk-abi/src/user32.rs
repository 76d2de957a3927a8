use bytemuck::{Pod, Zeroable};
use thunklink::call_record;

use crate::USER32;

// === Process & Session === //

call_record! {
    pub struct UserSignalProc[USER32, 0x00] { code, thread_or_process_id, flags, module }
    pub struct SetLastErrorEx[USER32, 0x01] { error, kind }
    pub struct GetAltTabInfoA[USER32, 0x02] { hwnd, item, pati, item_text, item_text_len }
    pub struct GetAltTabInfoW[USER32, 0x03] { hwnd, item, pati, item_text, item_text_len }
    pub struct SetDebugErrorLevel[USER32, 0x04] { level }
    pub struct SetWindowStationUser[USER32, 0x05] { x1, x2 }
    pub struct RegisterLogonProcess[USER32, 0x06] { process, x }
    pub struct SetLogonNotifyWindow[USER32, 0x07] { winsta, hwnd }
}

// === Display & Monitors === //

call_record! {
    pub struct EnumDisplayDevicesA[USER32, 0x08] { device, index, display_device, flags }
    pub struct EnumDisplayDevicesW[USER32, 0x09] { device, index, display_device, flags }
    pub struct MonitorFromRect[USER32, 0x0a] { rect, flags }
    /// `POINT` is passed by value, so its two coordinates travel in their own slots.
    pub struct MonitorFromPoint[USER32, 0x0b] { pt_x, pt_y, flags }
    pub struct MonitorFromWindow[USER32, 0x0c] { hwnd, flags }
    pub struct GetMonitorInfoA[USER32, 0x0d] { monitor, info }
    pub struct GetMonitorInfoW[USER32, 0x0e] { monitor, info }
    /// `wrapper` is the guest entry the host enters for every monitor it relays.
    pub struct EnumDisplayMonitors[USER32, 0x0f] { hdc, clip, func, data, wrapper }
    pub struct QueryDisplayConfig[USER32, 0x10] {
        flags,
        num_path_elements,
        path_info,
        num_mode_elements,
        mode_info,
        topology_id,
    }
}

/// The record a host trampoline hands to the guest's monitor enumeration entry.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct EnumDisplayMonitorsCb {
    pub func: u64,
    pub param: u64,
    pub monitor: u64,
    pub dc: u64,
    pub rect: u64,
}

// === Shell & Notifications === //

call_record! {
    pub struct RegisterSystemThread[USER32, 0x11] { flags, reserved }
    pub struct RegisterShellHookWindow[USER32, 0x12] { hwnd }
    pub struct DeregisterShellHookWindow[USER32, 0x13] { hwnd }
    pub struct RegisterTasklist[USER32, 0x14] { x }
    pub struct RegisterDeviceNotificationA[USER32, 0x15] { recipient, filter, flags }
    pub struct RegisterDeviceNotificationW[USER32, 0x16] { recipient, filter, flags }
    pub struct UnregisterDeviceNotification[USER32, 0x17] { notify }
    pub struct GetAppCompatFlags[USER32, 0x18] { task }
    pub struct GetAppCompatFlags2[USER32, 0x19] { task }
    pub struct AlignRects[USER32, 0x1a] { rect, b, c, d }
    pub struct LoadLocalFonts[USER32, 0x1b] {}
}

// === IME === //

call_record! {
    pub struct User32InitializeImmEntryTable[USER32, 0x1c] { magic }
    pub struct WinnlsGetImeHotkey[USER32, 0x1d] { hwnd }
    pub struct WinnlsEnableIme[USER32, 0x1e] { hwnd, enable }
    pub struct WinnlsGetEnableStatus[USER32, 0x1f] { hwnd }
    pub struct SendImeMessageExA[USER32, 0x20] { hwnd, lparam }
    pub struct SendImeMessageExW[USER32, 0x21] { hwnd, lparam }
}

// === Misc === //

call_record! {
    pub struct DisableProcessWindowsGhosting[USER32, 0x22] {}
    pub struct UserHandleGrantAccess[USER32, 0x23] { handle, job, grant }
    pub struct RegisterPowerSettingNotification[USER32, 0x24] { recipient, guid, flags }
    pub struct UnregisterPowerSettingNotification[USER32, 0x25] { notify }
}

// === Touch & Pointer === //

call_record! {
    pub struct GetGestureConfig[USER32, 0x26] { hwnd, reserved, flags, count, config, size }
    pub struct SetGestureConfig[USER32, 0x27] { hwnd, reserved, id, config, size }
    pub struct IsTouchWindow[USER32, 0x28] { hwnd, flags }
    pub struct IsWindowRedirectedForPrint[USER32, 0x29] { hwnd }
    pub struct GetDisplayConfigBufferSizes[USER32, 0x2a] { flags, num_path_info, num_mode_info }
    pub struct GetPointerDevices[USER32, 0x2b] { device_count, devices }
    pub struct RegisterPointerDeviceNotifications[USER32, 0x2c] { hwnd, notify_range }
    pub struct RegisterTouchHitTestingWindow[USER32, 0x2d] { hwnd, value }
}
