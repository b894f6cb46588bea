//! DirectX 12 描述符堆实现
//!
//! 封装 `ID3D12DescriptorHeap`，槽位分配交给 `DescriptorAllocator`。

use tracing::debug;
use windows::Win32::Graphics::Direct3D12::*;

use super::convert::heap_kind_to_d3d12;
use super::{set_debug_name, HResultExt};
use crate::core::error::Result;
use crate::renderer::descriptor::{
    CpuDescriptorHandle, DescriptorAllocator, DescriptorHeapDescriptor, DescriptorHeapKind,
};

/// DX12 描述符堆
pub struct Dx12DescriptorHeap {
    /// 底层 DX12 描述符堆
    heap: ID3D12DescriptorHeap,
    /// 线性分配器，记录起始地址和增量
    allocator: DescriptorAllocator,
    shader_visible: bool,
}

impl Dx12DescriptorHeap {
    /// 创建新的 DX12 描述符堆
    ///
    /// 增量大小在创建时向设备查询一次，之后所有句柄都按它偏移。
    pub fn new(device: &ID3D12Device, desc: &DescriptorHeapDescriptor) -> Result<Self> {
        let heap_type = heap_kind_to_d3d12(desc.kind);
        let flags = if desc.shader_visible {
            D3D12_DESCRIPTOR_HEAP_FLAG_SHADER_VISIBLE
        } else {
            D3D12_DESCRIPTOR_HEAP_FLAG_NONE
        };

        let heap_desc = D3D12_DESCRIPTOR_HEAP_DESC {
            Type: heap_type,
            NumDescriptors: desc.num_descriptors,
            Flags: flags,
            NodeMask: 0,
        };

        let heap: ID3D12DescriptorHeap = unsafe { device.CreateDescriptorHeap(&heap_desc) }
            .or_device(&format!("failed to create {} descriptor heap", desc.kind.name()))?;

        if let Some(name) = &desc.name {
            set_debug_name(&heap, name);
        }

        let increment = unsafe { device.GetDescriptorHandleIncrementSize(heap_type) };
        let base = unsafe { heap.GetCPUDescriptorHandleForHeapStart() }.ptr;

        debug!(
            kind = desc.kind.name(),
            capacity = desc.num_descriptors,
            increment,
            "Descriptor heap created"
        );

        Ok(Self {
            heap,
            allocator: DescriptorAllocator::new(desc.kind, base, increment, desc.num_descriptors),
            shader_visible: desc.shader_visible,
        })
    }

    pub fn heap(&self) -> &ID3D12DescriptorHeap {
        &self.heap
    }

    pub fn kind(&self) -> DescriptorHeapKind {
        self.allocator.kind()
    }

    pub fn increment_size(&self) -> u32 {
        self.allocator.increment()
    }

    pub fn capacity(&self) -> u32 {
        self.allocator.capacity()
    }

    pub fn is_shader_visible(&self) -> bool {
        self.shader_visible
    }

    /// 分配下一个槽位
    pub fn allocate(&mut self) -> Result<CpuDescriptorHandle> {
        self.allocator.allocate()
    }

    pub fn handle_at(&self, index: u32) -> Option<CpuDescriptorHandle> {
        self.allocator.handle_at(index)
    }
}

/// 转换为 D3D12 句柄
pub fn to_d3d12(handle: CpuDescriptorHandle) -> D3D12_CPU_DESCRIPTOR_HANDLE {
    D3D12_CPU_DESCRIPTOR_HANDLE { ptr: handle.ptr }
}
