//! DistRender bring-up - Direct3D 12 上下文初始化
//!
//! 为一个窗口完成 Direct3D 12 的最小初始化：选择硬件适配器、创建设备、
//! 命令队列/分配器/列表、fence、交换链、RTV/DSV 描述符堆和深度缓冲区，
//! 然后进入消息循环。
//!
//! # 模块结构
//!
//! - `core`: 配置、日志、错误处理
//! - `platform`: winit 窗口和消息循环
//! - `renderer`: 与驱动无关的 bring-up 模型（可在任何平台测试）
//! - `gfx`: DirectX 12 后端（仅 Windows）
//!
//! # 使用示例
//!
//! ```no_run
//! use dist_bringup::renderer::adapter::{select_adapter, AdapterCandidate, AdapterInfo};
//!
//! let gpu = AdapterInfo {
//!     name: "Discrete GPU".into(),
//!     dedicated_video_memory: 8 << 30,
//!     ..Default::default()
//! };
//! let selected = select_adapter(vec![AdapterCandidate::new(gpu, true, ())]).unwrap();
//! assert_eq!(selected.info.name, "Discrete GPU");
//! ```

pub mod core;
pub mod gfx;
pub mod platform;
pub mod renderer;
