//! 调试层与 DXGI 工厂

use tracing::{debug, info, warn};
use windows::core::Interface;
use windows::Win32::Graphics::Direct3D12::{D3D12GetDebugInterface, ID3D12Debug};
use windows::Win32::Graphics::Dxgi::{
    CreateDXGIFactory2, IDXGIFactory2, IDXGIFactory6, DXGI_CREATE_FACTORY_DEBUG,
    DXGI_CREATE_FACTORY_FLAGS,
};

use super::HResultExt;
use crate::core::error::Result;

/// 启用 D3D12 调试层
///
/// 必须在创建设备之前调用。调试层不可用（未安装图形工具）时只记录警告，
/// 返回 `false`。
pub fn enable_debug_layer() -> bool {
    let mut debug: Option<ID3D12Debug> = None;
    if let Err(e) = unsafe { D3D12GetDebugInterface(&mut debug) } {
        warn!(error = %e, "D3D12 debug layer unavailable, continuing without it");
        return false;
    }

    match debug {
        Some(debug) => {
            unsafe { debug.EnableDebugLayer() };
            info!("D3D12 debug layer enabled");
            true
        }
        None => {
            warn!("D3D12GetDebugInterface returned no interface");
            false
        }
    }
}

/// 创建 DXGI 工厂
///
/// 先创建 `IDXGIFactory2`，再转换为 `IDXGIFactory6`。
/// 只有调试层确实启用时才使用 DXGI 调试标志。
pub fn create_factory(debug_layer: bool) -> Result<IDXGIFactory6> {
    let debug_enabled = debug_layer && enable_debug_layer();
    let flags = if debug_enabled {
        DXGI_CREATE_FACTORY_DEBUG
    } else {
        DXGI_CREATE_FACTORY_FLAGS(0)
    };

    let factory: IDXGIFactory2 =
        unsafe { CreateDXGIFactory2(flags) }.or_factory("failed to create DXGI factory")?;
    let factory = factory
        .cast::<IDXGIFactory6>()
        .or_interface("DXGI factory does not support IDXGIFactory6")?;

    debug!(debug = debug_enabled, "DXGI factory created");
    Ok(factory)
}
