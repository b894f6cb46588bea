//! DistRender bring-up 程序入口
//!
//! ```bash
//! # 使用配置文件
//! cargo run
//!
//! # 命令行覆盖
//! cargo run -- --width 1920 --height 1080 --buffers 2 --min-feature-level 12_0 --no-debug-layer
//! ```
//!
//! 初始化失败时打印错误并以退出码 1 结束。

use std::cell::Cell;
use std::rc::Rc;

use anyhow::Context;
use tracing::{error, info};

use dist_bringup::core::{log, Config};
use dist_bringup::platform::{Window, WindowSystem};
use dist_bringup::renderer::Extent2D;

/// 尚未处理的窗口尺寸变化
type PendingResize = Rc<Cell<Option<Extent2D>>>;

fn main() {
    if let Err(e) = run() {
        error!("Bring-up failed: {:#}", e);
        eprintln!("Bring-up failed: {:#}", e);
        std::process::exit(1);
    }
}

/// # 初始化流程
///
/// 1. 加载配置文件（config.toml）并应用命令行参数
/// 2. 初始化日志系统
/// 3. 创建窗口，注册尺寸回调
/// 4. 完成 DirectX 12 bring-up
/// 5. 运行消息循环，退出后按逆序释放
fn run() -> anyhow::Result<()> {
    // 1. 加载配置（在初始化日志之前）
    let mut config = Config::from_file_or_default("config.toml");
    config.apply_args(std::env::args());
    config.validate().context("invalid configuration")?;

    // 2. 初始化日志系统
    let log_file = config
        .logging
        .file_output
        .then_some(config.logging.log_file.as_str());
    log::init_logger(config.logging.level, config.logging.file_output, log_file)
        .context("failed to initialize logging")?;
    info!(version = env!("CARGO_PKG_VERSION"), "DistRender bring-up starting...");

    info!(
        width = config.window.width,
        height = config.window.height,
        buffers = config.graphics.buffer_count,
        format = config.graphics.back_buffer_format.name(),
        depth_format = config.graphics.depth_format.name(),
        min_feature_level = %config.graphics.min_feature_level,
        debug_layer = config.graphics.debug_layer,
        "Graphics configuration"
    );

    // 3. 创建窗口
    let mut windows = WindowSystem::new()?;
    let pending_resize: PendingResize = Rc::new(Cell::new(None));
    let on_resize = {
        let pending = Rc::clone(&pending_resize);
        move |width, height| pending.set(Some(Extent2D::new(width, height)))
    };
    let window = windows
        .create_window(&config.window, on_resize)
        .context("failed to create window")?;

    // 4-5. bring-up 和消息循环
    run_dx12(windows, window, &config, pending_resize)
}

#[cfg(target_os = "windows")]
fn run_dx12(
    windows: WindowSystem,
    window: Window,
    config: &Config,
    pending_resize: PendingResize,
) -> anyhow::Result<()> {
    use dist_bringup::gfx::dx12::{debug, Dx12Context};

    let mut context =
        Dx12Context::new(&window, &config.graphics).context("Direct3D 12 bring-up failed")?;

    info!("Entering main loop...");
    windows.update(window, move || {
        if let Some(extent) = pending_resize.take() {
            context.resize(extent);
        }
        context.draw()
    })?;

    // 此时所有图形句柄都已释放
    if cfg!(debug_assertions) {
        debug::report_live_objects();
    }

    info!("Shutdown complete");
    Ok(())
}

#[cfg(not(target_os = "windows"))]
fn run_dx12(
    _windows: WindowSystem,
    _window: Window,
    _config: &Config,
    _pending_resize: PendingResize,
) -> anyhow::Result<()> {
    anyhow::bail!("Direct3D 12 bring-up is only available on Windows")
}
