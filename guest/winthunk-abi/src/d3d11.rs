use bytemuck::{Pod, Zeroable};
use thunklink::call_record;

use crate::D3D11;

/// The host half of a guest query wrapper. Lives at offset 0 of the wrapper so the host can read
/// it straight from the guest address it is given as `iface`.
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct QueryHostRefs {
    /// The native `ID3D11Query` interface.
    pub host11: u64,
    /// The native `ID3D10Query` view of the same object.
    pub host10: u64,
}

// === ID3D11Query === //

call_record! {
    pub struct D3d11QueryQueryInterface[D3D11, 0x00] { iface, riid, object }
    pub struct D3d11QueryAddRef[D3D11, 0x01] { iface }
    pub struct D3d11QueryRelease[D3D11, 0x02] { iface }
    pub struct D3d11QueryGetDevice[D3D11, 0x03] { iface, device }
    pub struct D3d11QueryGetPrivateData[D3D11, 0x04] { iface, guid, data_size, data }
    pub struct D3d11QuerySetPrivateData[D3D11, 0x05] { iface, guid, data_size, data }
    pub struct D3d11QuerySetPrivateDataInterface[D3D11, 0x06] { iface, guid, data }
    pub struct D3d11QueryGetDataSize[D3D11, 0x07] { iface }
    pub struct D3d11QueryGetDesc[D3D11, 0x08] { iface, desc }
}

// === ID3D10Query === //

call_record! {
    pub struct D3d10QueryQueryInterface[D3D11, 0x10] { iface, riid, object }
    pub struct D3d10QueryAddRef[D3D11, 0x11] { iface }
    pub struct D3d10QueryRelease[D3D11, 0x12] { iface }
    pub struct D3d10QueryGetDevice[D3D11, 0x13] { iface, device }
    pub struct D3d10QueryGetPrivateData[D3D11, 0x14] { iface, guid, data_size, data }
    pub struct D3d10QuerySetPrivateData[D3D11, 0x15] { iface, guid, data_size, data }
    pub struct D3d10QuerySetPrivateDataInterface[D3D11, 0x16] { iface, guid, data }
    pub struct D3d10QueryBegin[D3D11, 0x17] { iface }
    pub struct D3d10QueryEnd[D3D11, 0x18] { iface }
    pub struct D3d10QueryGetData[D3D11, 0x19] { iface, data, data_size, flags }
    pub struct D3d10QueryGetDataSize[D3D11, 0x1a] { iface }
    pub struct D3d10QueryGetDesc[D3D11, 0x1b] { iface, desc }
}
