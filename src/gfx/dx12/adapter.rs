//! DXGI 适配器枚举
//!
//! 枚举所有适配器，逐个用空输出指针试探设备创建，
//! 然后交给 `renderer::adapter` 排序选择。

use tracing::{debug, info, warn};
use windows::Win32::Graphics::Direct3D12::{D3D12CreateDevice, ID3D12Device};
use windows::Win32::Graphics::Dxgi::{
    IDXGIAdapter1, IDXGIFactory6, DXGI_ADAPTER_DESC1, DXGI_ADAPTER_FLAG_SOFTWARE,
    DXGI_ERROR_NOT_FOUND,
};

use super::convert::feature_level_to_d3d;
use super::hresult_message;
use crate::core::error::{GraphicsError, Result};
use crate::renderer::adapter::{select_adapter, wide_to_string, AdapterCandidate, AdapterInfo};
use crate::renderer::format::FeatureLevel;

const MIB: u64 = 1024 * 1024;

/// 枚举全部适配器
pub fn enumerate_adapters(
    factory: &IDXGIFactory6,
    minimum: FeatureLevel,
) -> Result<Vec<AdapterCandidate<IDXGIAdapter1>>> {
    let mut candidates = Vec::new();

    for index in 0u32.. {
        let adapter = match unsafe { factory.EnumAdapters1(index) } {
            Ok(adapter) => adapter,
            Err(e) if e.code() == DXGI_ERROR_NOT_FOUND => break,
            Err(e) => {
                return Err(GraphicsError::Factory(hresult_message(
                    "failed to enumerate adapters",
                    &e,
                ))
                .into())
            }
        };

        // 单个适配器查询失败不影响其他适配器
        let info = match describe_adapter(index, unsafe { adapter.GetDesc1() }) {
            Some(info) => info,
            None => continue,
        };

        // 软件适配器不参与选择，无需试探
        let supported = !info.software && supports_feature_level(&adapter, minimum);

        debug!(
            index,
            name = %info.name,
            vendor_id = format_args!("{:#06x}", info.vendor_id),
            vram_mib = info.dedicated_video_memory / MIB,
            software = info.software,
            supported,
            "Enumerated adapter"
        );

        candidates.push(AdapterCandidate::new(info, supported, adapter));
    }

    Ok(candidates)
}

/// 把 `GetDesc1` 的结果转换为 `AdapterInfo`，失败时记录警告并返回 `None`
fn describe_adapter(
    index: u32,
    desc: windows::core::Result<DXGI_ADAPTER_DESC1>,
) -> Option<AdapterInfo> {
    match desc {
        Ok(desc) => Some(AdapterInfo {
            index,
            name: wide_to_string(&desc.Description),
            vendor_id: desc.VendorId,
            device_id: desc.DeviceId,
            dedicated_video_memory: desc.DedicatedVideoMemory as u64,
            dedicated_system_memory: desc.DedicatedSystemMemory as u64,
            shared_system_memory: desc.SharedSystemMemory as u64,
            software: desc.Flags & (DXGI_ADAPTER_FLAG_SOFTWARE.0 as u32) != 0,
        }),
        Err(e) => {
            warn!(
                index,
                error = %hresult_message("failed to query adapter description", &e),
                "Skipping adapter"
            );
            None
        }
    }
}

/// 试探适配器能否以 `minimum` 特性级别创建设备，不实际创建
fn supports_feature_level(adapter: &IDXGIAdapter1, minimum: FeatureLevel) -> bool {
    unsafe {
        D3D12CreateDevice(
            adapter,
            feature_level_to_d3d(minimum),
            std::ptr::null_mut::<Option<ID3D12Device>>(),
        )
    }
    .is_ok()
}

/// 选择显存最多的硬件适配器
pub fn select_hardware_adapter(
    factory: &IDXGIFactory6,
    minimum: FeatureLevel,
) -> Result<AdapterCandidate<IDXGIAdapter1>> {
    let candidates = enumerate_adapters(factory, minimum)?;
    let selected = select_adapter(candidates)?;

    info!(
        index = selected.info.index,
        name = %selected.info.name,
        vram_mib = selected.info.dedicated_video_memory / MIB,
        system_mib = selected.info.dedicated_system_memory / MIB,
        shared_mib = selected.info.shared_system_memory / MIB,
        "Selected adapter"
    );

    Ok(selected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use windows::Win32::Foundation::E_FAIL;

    #[test]
    fn test_failed_description_skips_adapter() {
        assert_eq!(describe_adapter(2, Err(E_FAIL.into())), None);
    }

    #[test]
    fn test_description_fields() {
        let mut desc = DXGI_ADAPTER_DESC1 {
            VendorId: 0x10de,
            DedicatedVideoMemory: 8 << 30,
            Flags: DXGI_ADAPTER_FLAG_SOFTWARE.0 as u32,
            ..Default::default()
        };
        for (dst, src) in desc.Description.iter_mut().zip("GPU 1".encode_utf16()) {
            *dst = src;
        }

        let info = describe_adapter(1, Ok(desc)).unwrap();
        assert_eq!(info.index, 1);
        assert_eq!(info.name, "GPU 1");
        assert_eq!(info.vendor_id, 0x10de);
        assert_eq!(info.dedicated_video_memory, 8 << 30);
        assert!(info.software);
    }
}
