//! 资源屏障

use std::mem::ManuallyDrop;

use windows::Win32::Graphics::Direct3D12::*;

use super::convert::resource_state_to_d3d12;
use crate::renderer::resource::Transition;

/// 构造覆盖全部子资源的状态转换屏障
///
/// 屏障只借用 `resource`，不增加引用计数，必须在 `resource` 存活期间记录。
pub fn transition_barrier(resource: &ID3D12Resource, transition: Transition) -> D3D12_RESOURCE_BARRIER {
    D3D12_RESOURCE_BARRIER {
        Type: D3D12_RESOURCE_BARRIER_TYPE_TRANSITION,
        Flags: D3D12_RESOURCE_BARRIER_FLAG_NONE,
        Anonymous: D3D12_RESOURCE_BARRIER_0 {
            Transition: ManuallyDrop::new(D3D12_RESOURCE_TRANSITION_BARRIER {
                pResource: unsafe { std::mem::transmute_copy(resource) },
                Subresource: D3D12_RESOURCE_BARRIER_ALL_SUBRESOURCES,
                StateBefore: resource_state_to_d3d12(transition.before),
                StateAfter: resource_state_to_d3d12(transition.after),
            }),
        },
    }
}
