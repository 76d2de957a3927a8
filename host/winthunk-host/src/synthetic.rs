//! In-process native backends with fixed, inspectable behaviour.
//!
//! These stand in for the real system libraries in the loopback demo and in tests: they only
//! have to behave like the natives at the level the forwarding layer can observe.

use std::{
    collections::HashMap,
    ffi::c_void,
    mem, ptr,
    sync::{
        Mutex, MutexGuard, PoisonError,
        atomic::{AtomicU64, Ordering::Relaxed},
    },
};

use thunklink::relay::RelayState;
use winthunk_abi::{d3d11::QueryHostRefs, types::*};

use crate::{
    d3d11::{D3d10QueryApi, D3d11QueryApi, HostIface},
    user32::DisplayApi,
};

const ERROR_SUCCESS: i32 = 0;
const ERROR_INVALID_PARAMETER: i32 = 87;

const E_INVALIDARG: HResult = 0x8007_0057_u32 as HResult;
const DXGI_ERROR_NOT_FOUND: HResult = 0x887A_0002_u32 as HResult;
const DXGI_ERROR_MORE_DATA: HResult = 0x887A_0003_u32 as HResult;

// === SyntheticDisplay === //

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct SyntheticMonitor {
    pub rect: Rect,
    pub work: Rect,
    pub primary: bool,
}

/// A fixed desktop of monitors. Monitor `i` has handle `MONITOR_HANDLE_BASE + i`.
#[derive(Debug)]
pub struct SyntheticDisplay {
    monitors: Vec<SyntheticMonitor>,
    steps: Mutex<Vec<RelayState>>,
}

impl Default for SyntheticDisplay {
    fn default() -> Self {
        Self::new(vec![
            SyntheticMonitor {
                rect: Rect {
                    left: 0,
                    top: 0,
                    right: 1920,
                    bottom: 1080,
                },
                work: Rect {
                    left: 0,
                    top: 0,
                    right: 1920,
                    bottom: 1040,
                },
                primary: true,
            },
            SyntheticMonitor {
                rect: Rect {
                    left: 1920,
                    top: 0,
                    right: 3840,
                    bottom: 1080,
                },
                work: Rect {
                    left: 1920,
                    top: 0,
                    right: 3840,
                    bottom: 1080,
                },
                primary: false,
            },
            SyntheticMonitor {
                rect: Rect {
                    left: -1280,
                    top: 56,
                    right: 0,
                    bottom: 1080,
                },
                work: Rect {
                    left: -1280,
                    top: 56,
                    right: 0,
                    bottom: 1080,
                },
                primary: false,
            },
        ])
    }
}

impl SyntheticDisplay {
    pub const MONITOR_HANDLE_BASE: usize = 0x1_0001;

    pub fn new(monitors: Vec<SyntheticMonitor>) -> Self {
        Self {
            monitors,
            steps: Mutex::default(),
        }
    }

    pub fn monitors(&self) -> &[SyntheticMonitor] {
        &self.monitors
    }

    pub fn handle_of(&self, index: usize) -> Hmonitor {
        (Self::MONITOR_HANDLE_BASE + index) as Hmonitor
    }

    pub fn index_of(&self, monitor: Hmonitor) -> Option<usize> {
        (monitor as usize)
            .checked_sub(Self::MONITOR_HANDLE_BASE)
            .filter(|&index| index < self.monitors.len())
    }

    /// How many monitors enumeration has visited so far, callback or not.
    pub fn steps(&self) -> usize {
        self.lock_steps().len()
    }

    /// The relay state enumeration observed at each step, taken just before the step's
    /// callback would run.
    pub fn relay_states(&self) -> Vec<RelayState> {
        self.lock_steps().clone()
    }

    fn lock_steps(&self) -> MutexGuard<'_, Vec<RelayState>> {
        self.steps.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn primary(&self) -> Option<usize> {
        self.monitors.iter().position(|m| m.primary)
    }

    fn nearest(&self, pt: Point) -> Option<usize> {
        // Any coordinate is valid here, so the distance is taken in wider integers.
        fn gap(low: i32, high: i32, at: i32) -> u128 {
            let (low, last, at) = (i64::from(low), i64::from(high) - 1, i64::from(at));
            (low - at).max(at - last).max(0) as u128
        }

        let distance = |rect: &Rect| {
            let dx = gap(rect.left, rect.right, pt.x);
            let dy = gap(rect.top, rect.bottom, pt.y);
            dx * dx + dy * dy
        };

        self.monitors
            .iter()
            .enumerate()
            .min_by_key(|(_, m)| distance(&m.rect))
            .map(|(index, _)| index)
    }

    fn fallback(&self, pt: Point, flags: u32) -> Hmonitor {
        let index = match flags {
            MONITOR_DEFAULTTOPRIMARY => self.primary(),
            MONITOR_DEFAULTTONEAREST => self.nearest(pt),
            _ => None,
        };

        index.map_or(ptr::null_mut(), |index| self.handle_of(index))
    }

    fn monitor_info(&self, monitor: Hmonitor, info: *mut MonitorInfo) -> Bool {
        let Some(index) = self.index_of(monitor) else {
            return FALSE;
        };

        if info.is_null() {
            return FALSE;
        }

        let info = unsafe { &mut *info };

        if (info.cb_size as usize) < mem::size_of::<MonitorInfo>() {
            return FALSE;
        }

        let monitor = &self.monitors[index];
        info.rc_monitor = monitor.rect;
        info.rc_work = monitor.work;
        info.flags = if monitor.primary { MONITORINFOF_PRIMARY } else { 0 };

        TRUE
    }

    fn display_device(&self, index: u32, display_device: *mut c_void) -> Bool {
        if display_device.is_null() || index as usize >= self.monitors.len() {
            FALSE
        } else {
            TRUE
        }
    }

    fn buffer_sizes(&self, num_path: *mut u32, num_mode: *mut u32) -> i32 {
        if num_path.is_null() || num_mode.is_null() {
            return ERROR_INVALID_PARAMETER;
        }

        let count = self.monitors.len() as u32;

        unsafe {
            num_path.write(count);
            num_mode.write(count * 2);
        }

        ERROR_SUCCESS
    }
}

impl DisplayApi for SyntheticDisplay {
    unsafe fn enum_display_devices_a(
        &self,
        _device: *const u8,
        index: u32,
        display_device: *mut c_void,
        _flags: u32,
    ) -> Bool {
        self.display_device(index, display_device)
    }

    unsafe fn enum_display_devices_w(
        &self,
        _device: *const u16,
        index: u32,
        display_device: *mut c_void,
        _flags: u32,
    ) -> Bool {
        self.display_device(index, display_device)
    }

    unsafe fn monitor_from_rect(&self, rect: *const Rect, flags: u32) -> Hmonitor {
        if rect.is_null() {
            return ptr::null_mut();
        }

        let rect = unsafe { *rect };

        match self.monitors.iter().position(|m| m.rect.intersects(&rect)) {
            Some(index) => self.handle_of(index),
            None => {
                let corner = Point {
                    x: rect.left,
                    y: rect.top,
                };

                self.fallback(corner, flags)
            }
        }
    }

    unsafe fn monitor_from_point(&self, pt: Point, flags: u32) -> Hmonitor {
        match self.monitors.iter().position(|m| m.rect.contains(pt)) {
            Some(index) => self.handle_of(index),
            None => self.fallback(pt, flags),
        }
    }

    unsafe fn monitor_from_window(&self, hwnd: Hwnd, flags: u32) -> Hmonitor {
        // Every window lives on the primary monitor.
        if hwnd.is_null() {
            self.fallback(Point::default(), flags)
        } else {
            self.fallback(Point::default(), MONITOR_DEFAULTTOPRIMARY)
        }
    }

    unsafe fn get_monitor_info_a(&self, monitor: Hmonitor, info: *mut MonitorInfo) -> Bool {
        self.monitor_info(monitor, info)
    }

    unsafe fn get_monitor_info_w(&self, monitor: Hmonitor, info: *mut MonitorInfo) -> Bool {
        self.monitor_info(monitor, info)
    }

    unsafe fn enum_display_monitors(
        &self,
        hdc: Hdc,
        clip: *const Rect,
        func: Option<MonitorEnumProc>,
        data: LParam,
    ) -> Bool {
        let clip = unsafe { clip.as_ref() };

        for (index, monitor) in self.monitors.iter().enumerate() {
            if clip.is_some_and(|clip| !clip.intersects(&monitor.rect)) {
                continue;
            }

            self.lock_steps().push(RelayState::current());

            let Some(func) = func else {
                continue;
            };

            let mut rect = monitor.rect;

            if unsafe { func(self.handle_of(index), hdc, &mut rect, data) } == FALSE {
                return FALSE;
            }
        }

        TRUE
    }

    unsafe fn query_display_config(
        &self,
        _flags: u32,
        num_path_elements: *mut u32,
        _path_info: *mut c_void,
        num_mode_elements: *mut u32,
        _mode_info: *mut c_void,
        _topology_id: *mut u32,
    ) -> i32 {
        self.buffer_sizes(num_path_elements, num_mode_elements)
    }

    unsafe fn get_display_config_buffer_sizes(
        &self,
        _flags: u32,
        num_path_info: *mut u32,
        num_mode_info: *mut u32,
    ) -> i32 {
        self.buffer_sizes(num_path_info, num_mode_info)
    }
}

// === SyntheticQueries === //

#[derive(Debug)]
struct QueryState {
    refs: u32,
    desc: QueryDesc,
    ended: bool,
    private: HashMap<Guid, Vec<u8>>,
}

/// A table of fake native queries. Each query's D3D10 view sits 8 bytes past its D3D11 view.
#[derive(Debug)]
pub struct SyntheticQueries {
    next: AtomicU64,
    queries: Mutex<HashMap<u64, QueryState>>,
}

impl Default for SyntheticQueries {
    fn default() -> Self {
        Self {
            next: AtomicU64::new(0x5000_0000),
            queries: Mutex::default(),
        }
    }
}

impl SyntheticQueries {
    pub const D3D11_QUERY_EVENT: u32 = 0;
    pub const D3D11_QUERY_OCCLUSION: u32 = 1;
    pub const D3D11_QUERY_TIMESTAMP: u32 = 2;
    pub const D3D11_QUERY_TIMESTAMP_DISJOINT: u32 = 3;

    fn lock(&self) -> MutexGuard<'_, HashMap<u64, QueryState>> {
        self.queries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Creates a query with a reference count of one.
    pub fn create(&self, desc: QueryDesc) -> QueryHostRefs {
        let host11 = self.next.fetch_add(0x10, Relaxed);

        self.lock().insert(
            host11,
            QueryState {
                refs: 1,
                desc,
                ended: false,
                private: HashMap::new(),
            },
        );

        QueryHostRefs {
            host11,
            host10: host11 + 8,
        }
    }

    /// The current reference count, or `None` once the query has been destroyed.
    pub fn refcount(&self, host11: u64) -> Option<u32> {
        self.lock().get(&host11).map(|query| query.refs)
    }

    pub fn live(&self) -> usize {
        self.lock().len()
    }

    fn with<R>(&self, iface: HostIface, default: R, f: impl FnOnce(&mut QueryState) -> R) -> R {
        match self.lock().get_mut(&(iface.0 & !0xF)) {
            Some(query) => f(query),
            None => default,
        }
    }

    fn data_size(desc: &QueryDesc) -> u32 {
        match desc.query {
            Self::D3D11_QUERY_EVENT => 4,
            Self::D3D11_QUERY_TIMESTAMP_DISJOINT => 16,
            _ => 8,
        }
    }
}

impl D3d11QueryApi for SyntheticQueries {
    unsafe fn query_interface(
        &self,
        _iface: HostIface,
        _riid: *const Guid,
        object: *mut *mut c_void,
    ) -> HResult {
        if !object.is_null() {
            unsafe { object.write(ptr::null_mut()) };
        }

        E_NOINTERFACE
    }

    unsafe fn add_ref(&self, iface: HostIface) -> u32 {
        self.with(iface, 0, |query| {
            query.refs += 1;
            query.refs
        })
    }

    unsafe fn release(&self, iface: HostIface) -> u32 {
        let mut queries = self.lock();
        let key = iface.0 & !0xF;

        let Some(query) = queries.get_mut(&key) else {
            return 0;
        };

        query.refs -= 1;
        let refs = query.refs;

        if refs == 0 {
            queries.remove(&key);
        }

        refs
    }

    unsafe fn get_device(&self, _iface: HostIface, device: *mut *mut c_void) {
        if !device.is_null() {
            unsafe { device.write(ptr::null_mut()) };
        }
    }

    unsafe fn get_private_data(
        &self,
        iface: HostIface,
        guid: *const Guid,
        data_size: *mut u32,
        data: *mut c_void,
    ) -> HResult {
        if guid.is_null() || data_size.is_null() {
            return E_INVALIDARG;
        }

        let guid = unsafe { *guid };

        self.with(iface, E_INVALIDARG, |query| {
            let Some(stored) = query.private.get(&guid) else {
                unsafe { data_size.write(0) };
                return DXGI_ERROR_NOT_FOUND;
            };

            let capacity = unsafe { data_size.read() } as usize;
            unsafe { data_size.write(stored.len() as u32) };

            if data.is_null() {
                return S_OK;
            }

            if capacity < stored.len() {
                return DXGI_ERROR_MORE_DATA;
            }

            unsafe { ptr::copy_nonoverlapping(stored.as_ptr(), data.cast(), stored.len()) };
            S_OK
        })
    }

    unsafe fn set_private_data(
        &self,
        iface: HostIface,
        guid: *const Guid,
        data_size: u32,
        data: *const c_void,
    ) -> HResult {
        if guid.is_null() {
            return E_INVALIDARG;
        }

        let guid = unsafe { *guid };
        let bytes = (!data.is_null()).then(|| {
            unsafe { std::slice::from_raw_parts(data.cast::<u8>(), data_size as usize) }.to_vec()
        });

        self.with(iface, E_INVALIDARG, |query| {
            match bytes {
                Some(bytes) => query.private.insert(guid, bytes),
                None => query.private.remove(&guid),
            };

            S_OK
        })
    }

    unsafe fn set_private_data_interface(
        &self,
        iface: HostIface,
        guid: *const Guid,
        data: *mut c_void,
    ) -> HResult {
        let addr = data as usize;
        unsafe {
            self.set_private_data(
                iface,
                guid,
                mem::size_of::<usize>() as u32,
                (&raw const addr).cast(),
            )
        }
    }

    unsafe fn get_data_size(&self, iface: HostIface) -> u32 {
        self.with(iface, 0, |query| Self::data_size(&query.desc))
    }

    unsafe fn get_desc(&self, iface: HostIface, desc: *mut QueryDesc) {
        if desc.is_null() {
            return;
        }

        if let Some(found) = self.with(iface, None, |query| Some(query.desc)) {
            unsafe { desc.write(found) };
        }
    }
}

impl D3d10QueryApi for SyntheticQueries {
    unsafe fn begin(&self, iface: HostIface) {
        self.with(iface, (), |query| query.ended = false)
    }

    unsafe fn end(&self, iface: HostIface) {
        self.with(iface, (), |query| query.ended = true)
    }

    /// Reports `S_FALSE` until the query has been ended. Event queries then read back `TRUE`,
    /// everything else reads back zeroes.
    unsafe fn get_data(
        &self,
        iface: HostIface,
        data: *mut c_void,
        data_size: u32,
        _flags: u32,
    ) -> HResult {
        self.with(iface, E_INVALIDARG, |query| {
            if !query.ended {
                return S_FALSE;
            }

            if data.is_null() {
                return S_OK;
            }

            let size = Self::data_size(&query.desc);

            if data_size < size {
                return E_INVALIDARG;
            }

            unsafe {
                ptr::write_bytes(data.cast::<u8>(), 0, size as usize);

                if query.desc.query == Self::D3D11_QUERY_EVENT {
                    data.cast::<Bool>().write_unaligned(TRUE);
                }
            }

            S_OK
        })
    }
}
