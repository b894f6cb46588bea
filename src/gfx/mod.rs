//! 图形后端模块
//!
//! 目前只有 DirectX 12 后端，仅在 Windows 上编译。
//! 与驱动无关的模型在 `renderer` 模块中。

#[cfg(target_os = "windows")]
pub mod dx12;

#[cfg(target_os = "windows")]
pub use dx12::Dx12Context;
