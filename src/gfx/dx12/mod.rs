//! DirectX 12 图形 API 实现模块
//!
//! 本模块包含了所有 DirectX 12 相关的代码，按 bring-up 顺序：
//! - factory: 调试层和 DXGI 工厂
//! - adapter: 适配器枚举
//! - device: 设备创建和特性查询
//! - sync: Fence 与 CPU 等待
//! - command: 命令队列、分配器、命令列表
//! - swapchain: 交换链和后台缓冲区
//! - descriptor: 描述符堆
//! - depth: 深度模板缓冲区
//! - context: 把以上组件按顺序组装起来
//!
//! 每个驱动调用的返回码都在调用点检查，失败时把 HRESULT 写进错误消息。

pub mod adapter;
pub mod barrier;
pub mod command;
pub mod context;
pub mod convert;
pub mod debug;
pub mod depth;
pub mod descriptor;
pub mod device;
pub mod factory;
pub mod swapchain;
pub mod sync;

// 重新导出常用类型
pub use context::Dx12Context;

use tracing::warn;
use windows::core::HSTRING;
use windows::Win32::Graphics::Direct3D12::ID3D12Object;

use crate::core::error::{BringupError, GraphicsError, Result};

/// 格式化驱动错误，保留原始 HRESULT
pub(crate) fn hresult_message(what: &str, err: &windows::core::Error) -> String {
    format!("{}: {:#010x} ({})", what, err.code().0 as u32, err.message())
}

/// 把 `windows::core::Result` 转换为带分类的 bring-up 错误
pub(crate) trait HResultExt<T> {
    fn or_factory(self, what: &str) -> Result<T>;
    fn or_device(self, what: &str) -> Result<T>;
    fn or_interface(self, what: &str) -> Result<T>;
    fn or_swapchain(self, what: &str) -> Result<T>;
    fn or_command(self, what: &str) -> Result<T>;
    fn or_sync(self, what: &str) -> Result<T>;
}

impl<T> HResultExt<T> for windows::core::Result<T> {
    fn or_factory(self, what: &str) -> Result<T> {
        self.map_err(|e| classify(GraphicsError::Factory, what, &e))
    }

    fn or_device(self, what: &str) -> Result<T> {
        self.map_err(|e| classify(GraphicsError::Device, what, &e))
    }

    fn or_interface(self, what: &str) -> Result<T> {
        self.map_err(|e| classify(GraphicsError::Interface, what, &e))
    }

    fn or_swapchain(self, what: &str) -> Result<T> {
        self.map_err(|e| classify(GraphicsError::Swapchain, what, &e))
    }

    fn or_command(self, what: &str) -> Result<T> {
        self.map_err(|e| classify(GraphicsError::CommandExecution, what, &e))
    }

    fn or_sync(self, what: &str) -> Result<T> {
        self.map_err(|e| classify(GraphicsError::Synchronization, what, &e))
    }
}

/// 设置调试名称，在调试层和 PIX 中显示
pub(crate) fn set_debug_name(object: &ID3D12Object, name: &str) {
    if let Err(e) = unsafe { object.SetName(&HSTRING::from(name)) } {
        warn!(name, error = %e, "Failed to set debug name");
    }
}

fn classify(
    kind: fn(String) -> GraphicsError,
    what: &str,
    err: &windows::core::Error,
) -> BringupError {
    BringupError::Graphics(kind(hresult_message(what, err)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use windows::Win32::Foundation::E_FAIL;

    #[test]
    fn test_hresult_embedded_in_message() {
        let result: windows::core::Result<()> = Err(windows::core::Error::from(E_FAIL));
        let err = result.or_device("failed to create a command queue").unwrap_err();
        let text = err.to_string();
        assert!(text.contains("failed to create a command queue"));
        assert!(text.contains("0x80004005"));
        assert!(matches!(err.as_graphics(), Some(GraphicsError::Device(_))));
    }
}
