//! 描述符管理模块
//!
//! 描述符堆是固定容量的描述符槽位表，创建后不再调整大小。
//! 槽位地址 = 堆起始地址 + 索引 × 增量，增量是设备相关的常量，
//! 必须按堆类型向设备查询，不能假设。
//!
//! # DirectX 12 描述符堆类型
//!
//! - **RTV** (Render Target View)：渲染目标视图
//! - **DSV** (Depth Stencil View)：深度模板视图
//! - **CBV/SRV/UAV**：着色器可见的常量/资源/无序访问视图
//! - **Sampler**：采样器

use crate::core::error::{GraphicsError, Result};

/// 描述符堆类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DescriptorHeapKind {
    /// 渲染目标视图 (RTV)
    RenderTarget,
    /// 深度模板视图 (DSV)
    DepthStencil,
    /// 常量/着色资源/无序访问视图
    CbvSrvUav,
    /// 采样器
    Sampler,
}

impl DescriptorHeapKind {
    /// 只有 CBV/SRV/UAV 和采样器堆可以对着色器可见
    pub fn can_be_shader_visible(&self) -> bool {
        matches!(self, DescriptorHeapKind::CbvSrvUav | DescriptorHeapKind::Sampler)
    }

    /// 获取堆类型名称
    pub fn name(&self) -> &'static str {
        match self {
            DescriptorHeapKind::RenderTarget => "RTV",
            DescriptorHeapKind::DepthStencil => "DSV",
            DescriptorHeapKind::CbvSrvUav => "CBV/SRV/UAV",
            DescriptorHeapKind::Sampler => "Sampler",
        }
    }
}

/// 描述符堆描述信息
#[derive(Debug, Clone)]
pub struct DescriptorHeapDescriptor {
    /// 堆类型
    pub kind: DescriptorHeapKind,
    /// 描述符数量
    pub num_descriptors: u32,
    /// 是否着色器可见
    pub shader_visible: bool,
    /// 调试名称
    pub name: Option<String>,
}

impl DescriptorHeapDescriptor {
    /// 创建新的描述符堆描述符
    pub fn new(kind: DescriptorHeapKind, num_descriptors: u32) -> Self {
        Self {
            kind,
            num_descriptors,
            shader_visible: false,
            name: None,
        }
    }

    /// 设置调试名称
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// 设置着色器可见性，RTV/DSV 堆忽略此设置
    pub fn with_shader_visible(mut self, visible: bool) -> Self {
        self.shader_visible = visible && self.kind.can_be_shader_visible();
        self
    }

    /// 创建 RTV 堆描述符
    pub fn rtv(num_descriptors: u32) -> Self {
        Self::new(DescriptorHeapKind::RenderTarget, num_descriptors).with_name("RTV Heap")
    }

    /// 创建 DSV 堆描述符
    pub fn dsv(num_descriptors: u32) -> Self {
        Self::new(DescriptorHeapKind::DepthStencil, num_descriptors).with_name("DSV Heap")
    }
}

/// 描述符句柄（CPU 可见）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuDescriptorHandle {
    /// 句柄指针值
    pub ptr: usize,
    /// 描述符索引
    pub index: u32,
}

impl CpuDescriptorHandle {
    pub fn new(ptr: usize, index: u32) -> Self {
        Self { ptr, index }
    }
}

/// 线性描述符分配器
///
/// 持有堆的起始地址、增量和容量，按顺序分配槽位。
/// 每次分配写游标前进恰好一个增量。
#[derive(Debug, Clone)]
pub struct DescriptorAllocator {
    kind: DescriptorHeapKind,
    base: usize,
    increment: u32,
    capacity: u32,
    cursor: u32,
}

impl DescriptorAllocator {
    /// # 参数
    ///
    /// * `base` - `GetCPUDescriptorHandleForHeapStart` 返回的地址
    /// * `increment` - `GetDescriptorHandleIncrementSize` 查询到的增量
    /// * `capacity` - 堆的槽位数量
    pub fn new(kind: DescriptorHeapKind, base: usize, increment: u32, capacity: u32) -> Self {
        Self {
            kind,
            base,
            increment,
            capacity,
            cursor: 0,
        }
    }

    pub fn kind(&self) -> DescriptorHeapKind {
        self.kind
    }

    pub fn increment(&self) -> u32 {
        self.increment
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// 已分配的槽位数
    pub fn allocated(&self) -> u32 {
        self.cursor
    }

    pub fn remaining(&self) -> u32 {
        self.capacity - self.cursor
    }

    /// 写游标相对堆起始地址的字节偏移
    pub fn cursor_offset(&self) -> usize {
        self.cursor as usize * self.increment as usize
    }

    /// 指定索引处的句柄，超出容量返回 `None`
    ///
    /// 同一索引总是返回同一地址。
    pub fn handle_at(&self, index: u32) -> Option<CpuDescriptorHandle> {
        (index < self.capacity).then(|| {
            CpuDescriptorHandle::new(self.base + index as usize * self.increment as usize, index)
        })
    }

    /// 分配下一个槽位
    pub fn allocate(&mut self) -> Result<CpuDescriptorHandle> {
        let handle = self.handle_at(self.cursor).ok_or_else(|| {
            GraphicsError::ResourceCreation(format!(
                "{} descriptor heap exhausted ({} slots)",
                self.kind.name(),
                self.capacity
            ))
        })?;
        self.cursor += 1;
        Ok(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_heap_descriptor() {
        let desc = DescriptorHeapDescriptor::rtv(3);
        assert_eq!(desc.num_descriptors, 3);
        assert_eq!(desc.kind, DescriptorHeapKind::RenderTarget);
        assert!(!desc.shader_visible);

        // RTV 堆不能着色器可见
        let desc = DescriptorHeapDescriptor::rtv(3).with_shader_visible(true);
        assert!(!desc.shader_visible);

        let desc = DescriptorHeapDescriptor::new(DescriptorHeapKind::CbvSrvUav, 128)
            .with_shader_visible(true);
        assert!(desc.shader_visible);
    }

    #[test]
    fn test_allocation_is_linear() {
        const BASE: usize = 0x1000;
        const INCREMENT: u32 = 32;

        let mut allocator =
            DescriptorAllocator::new(DescriptorHeapKind::RenderTarget, BASE, INCREMENT, 3);

        let handles: Vec<_> = (0..3).map(|_| allocator.allocate().unwrap()).collect();

        assert_eq!(allocator.cursor_offset(), 3 * INCREMENT as usize);
        for (i, handle) in handles.iter().enumerate() {
            assert_eq!(handle.index, i as u32);
            assert_eq!(handle.ptr, BASE + i * INCREMENT as usize);
        }

        // 槽位互不重叠
        for pair in handles.windows(2) {
            assert!(pair[1].ptr - pair[0].ptr >= INCREMENT as usize);
        }
    }

    #[test]
    fn test_handle_at_is_idempotent() {
        let allocator = DescriptorAllocator::new(DescriptorHeapKind::DepthStencil, 64, 8, 1);
        assert_eq!(allocator.handle_at(0), allocator.handle_at(0));
        assert_eq!(allocator.handle_at(0).unwrap().ptr, 64);
        assert!(allocator.handle_at(1).is_none());
    }

    #[test]
    fn test_exhaustion() {
        let mut allocator = DescriptorAllocator::new(DescriptorHeapKind::DepthStencil, 0, 8, 1);
        assert!(allocator.allocate().is_ok());
        assert_eq!(allocator.remaining(), 0);

        let err = allocator.allocate().unwrap_err();
        assert!(matches!(
            err.as_graphics(),
            Some(GraphicsError::ResourceCreation(_))
        ));
        assert_eq!(allocator.allocated(), 1);
    }
}
