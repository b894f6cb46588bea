//! D3D12 设备创建与特性查询

use std::ffi::c_void;

use tracing::{debug, info};
use windows::Win32::Graphics::Direct3D::D3D_FEATURE_LEVEL;
use windows::Win32::Graphics::Direct3D12::*;
use windows::Win32::Graphics::Dxgi::Common::DXGI_FORMAT;
use windows::Win32::Graphics::Dxgi::IDXGIAdapter1;

use super::convert::{feature_level_from_d3d, feature_level_to_d3d};
use super::HResultExt;
use crate::core::error::{GraphicsError, Result};
use crate::renderer::format::FeatureLevel;

/// 在选中的适配器上创建设备
///
/// 创建后查询设备实际支持的最高特性级别，低于 `minimum`
/// 或无法识别时返回 `GraphicsError::Device`。
pub fn create_device(
    adapter: &IDXGIAdapter1,
    minimum: FeatureLevel,
) -> Result<(ID3D12Device, FeatureLevel)> {
    let mut device: Option<ID3D12Device> = None;
    unsafe { D3D12CreateDevice(adapter, feature_level_to_d3d(minimum), &mut device) }
        .or_device("failed to create D3D12 device")?;
    let device = device
        .ok_or_else(|| GraphicsError::Device("D3D12CreateDevice returned no device".into()))?;

    let max_level = max_supported_feature_level(&device)?;
    let feature_level = max_level
        .ensure_at_least(minimum)
        .map_err(GraphicsError::Device)?;

    info!(
        feature_level = %feature_level,
        minimum = %minimum,
        "D3D12 device created"
    );
    Ok((device, feature_level))
}

/// 查询设备支持的最高特性级别
pub fn max_supported_feature_level(device: &ID3D12Device) -> Result<FeatureLevel> {
    let requested: Vec<D3D_FEATURE_LEVEL> = FeatureLevel::DESCENDING
        .iter()
        .map(|level| feature_level_to_d3d(*level))
        .collect();

    let mut data = D3D12_FEATURE_DATA_FEATURE_LEVELS {
        NumFeatureLevels: requested.len() as u32,
        pFeatureLevelsRequested: requested.as_ptr(),
        MaxSupportedFeatureLevel: D3D_FEATURE_LEVEL(0),
    };

    unsafe {
        device.CheckFeatureSupport(
            D3D12_FEATURE_FEATURE_LEVELS,
            &mut data as *mut _ as *mut c_void,
            std::mem::size_of::<D3D12_FEATURE_DATA_FEATURE_LEVELS>() as u32,
        )
    }
    .or_device("failed to query supported feature levels")?;

    feature_level_from_d3d(data.MaxSupportedFeatureLevel).ok_or_else(|| {
        GraphicsError::Device(format!(
            "device reported unknown feature level {:#x}",
            data.MaxSupportedFeatureLevel.0
        ))
        .into()
    })
}

/// 查询给定格式和采样数的 MSAA 质量级别数
///
/// 返回 0 表示不支持该组合。
pub fn query_msaa_quality_levels(
    device: &ID3D12Device,
    format: DXGI_FORMAT,
    sample_count: u32,
) -> Result<u32> {
    let mut data = D3D12_FEATURE_DATA_MULTISAMPLE_QUALITY_LEVELS {
        Format: format,
        SampleCount: sample_count,
        Flags: D3D12_MULTISAMPLE_QUALITY_LEVELS_FLAG_NONE,
        NumQualityLevels: 0,
    };

    unsafe {
        device.CheckFeatureSupport(
            D3D12_FEATURE_MULTISAMPLE_QUALITY_LEVELS,
            &mut data as *mut _ as *mut c_void,
            std::mem::size_of::<D3D12_FEATURE_DATA_MULTISAMPLE_QUALITY_LEVELS>() as u32,
        )
    }
    .or_device("failed to query MSAA quality levels")?;

    debug!(
        sample_count,
        quality_levels = data.NumQualityLevels,
        "MSAA support queried"
    );
    Ok(data.NumQualityLevels)
}
