//! 平台窗口模块
//!
//! - `window`：winit 窗口和消息循环
//! - `registry`：窗口 id 到尺寸回调的路由表

pub mod registry;
pub mod window;

pub use registry::HandlerRegistry;
pub use window::{Window, WindowSystem};
