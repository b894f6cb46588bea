//! 通用枚举到 D3D12/DXGI 常量的映射

use windows::Win32::Graphics::Direct3D::*;
use windows::Win32::Graphics::Direct3D12::*;
use windows::Win32::Graphics::Dxgi::Common::*;

use crate::renderer::command::CommandListType;
use crate::renderer::descriptor::DescriptorHeapKind;
use crate::renderer::format::{DepthFormat, FeatureLevel, SurfaceFormat};
use crate::renderer::resource::ResourceState;

pub fn feature_level_to_d3d(level: FeatureLevel) -> D3D_FEATURE_LEVEL {
    match level {
        FeatureLevel::Level11_0 => D3D_FEATURE_LEVEL_11_0,
        FeatureLevel::Level11_1 => D3D_FEATURE_LEVEL_11_1,
        FeatureLevel::Level12_0 => D3D_FEATURE_LEVEL_12_0,
        FeatureLevel::Level12_1 => D3D_FEATURE_LEVEL_12_1,
        FeatureLevel::Level12_2 => D3D_FEATURE_LEVEL_12_2,
    }
}

pub fn feature_level_from_d3d(level: D3D_FEATURE_LEVEL) -> Option<FeatureLevel> {
    FeatureLevel::DESCENDING
        .iter()
        .copied()
        .find(|candidate| feature_level_to_d3d(*candidate) == level)
}

pub fn surface_format_to_dxgi(format: SurfaceFormat) -> DXGI_FORMAT {
    match format {
        SurfaceFormat::Rgba8Unorm => DXGI_FORMAT_R8G8B8A8_UNORM,
        SurfaceFormat::Bgra8Unorm => DXGI_FORMAT_B8G8R8A8_UNORM,
        SurfaceFormat::Rgba16Float => DXGI_FORMAT_R16G16B16A16_FLOAT,
        SurfaceFormat::Rgb10A2Unorm => DXGI_FORMAT_R10G10B10A2_UNORM,
    }
}

pub fn depth_format_to_dxgi(format: DepthFormat) -> DXGI_FORMAT {
    match format {
        DepthFormat::D24UnormS8 => DXGI_FORMAT_D24_UNORM_S8_UINT,
        DepthFormat::D32Float => DXGI_FORMAT_D32_FLOAT,
        DepthFormat::D32FloatS8 => DXGI_FORMAT_D32_FLOAT_S8X24_UINT,
    }
}

pub fn heap_kind_to_d3d12(kind: DescriptorHeapKind) -> D3D12_DESCRIPTOR_HEAP_TYPE {
    match kind {
        DescriptorHeapKind::RenderTarget => D3D12_DESCRIPTOR_HEAP_TYPE_RTV,
        DescriptorHeapKind::DepthStencil => D3D12_DESCRIPTOR_HEAP_TYPE_DSV,
        DescriptorHeapKind::CbvSrvUav => D3D12_DESCRIPTOR_HEAP_TYPE_CBV_SRV_UAV,
        DescriptorHeapKind::Sampler => D3D12_DESCRIPTOR_HEAP_TYPE_SAMPLER,
    }
}

pub fn list_type_to_d3d12(list_type: CommandListType) -> D3D12_COMMAND_LIST_TYPE {
    match list_type {
        CommandListType::Direct => D3D12_COMMAND_LIST_TYPE_DIRECT,
        CommandListType::Compute => D3D12_COMMAND_LIST_TYPE_COMPUTE,
        CommandListType::Copy => D3D12_COMMAND_LIST_TYPE_COPY,
    }
}

/// `Present` 和 `Common` 在 D3D12 中是同一个值
pub fn resource_state_to_d3d12(state: ResourceState) -> D3D12_RESOURCE_STATES {
    match state {
        ResourceState::Common => D3D12_RESOURCE_STATE_COMMON,
        ResourceState::RenderTarget => D3D12_RESOURCE_STATE_RENDER_TARGET,
        ResourceState::Present => D3D12_RESOURCE_STATE_PRESENT,
        ResourceState::DepthWrite => D3D12_RESOURCE_STATE_DEPTH_WRITE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_level_round_trip() {
        for level in FeatureLevel::DESCENDING {
            assert_eq!(feature_level_from_d3d(feature_level_to_d3d(level)), Some(level));
        }
        assert_eq!(feature_level_from_d3d(D3D_FEATURE_LEVEL_10_0), None);
    }

    #[test]
    fn test_present_is_common() {
        assert_eq!(
            resource_state_to_d3d12(ResourceState::Present),
            resource_state_to_d3d12(ResourceState::Common)
        );
    }
}
