//! 渲染器通用模块
//!
//! 与具体图形 API 无关的 bring-up 模型：适配器排序、命令列表状态、
//! 描述符槽位寻址、资源状态跟踪、fence 账本和句柄生命周期。
//! DX12 后端（`gfx::dx12`）把这些模型和真实的驱动对象绑定在一起，
//! 因此这里的逻辑在任何平台上都可以单独测试。

pub mod adapter;
pub mod command;
pub mod descriptor;
pub mod format;
pub mod lifetime;
pub mod resource;
pub mod sync;

/// 二维尺寸（像素）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Extent2D {
    pub width: u32,
    pub height: u32,
}

impl Extent2D {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// 最小化的窗口尺寸为 0，不能用来创建交换链
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extent_empty() {
        assert!(Extent2D::new(0, 720).is_empty());
        assert!(!Extent2D::new(1280, 720).is_empty());
    }
}
