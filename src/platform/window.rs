//! 窗口外壳
//!
//! 基于 winit 的窗口和消息循环。图形部分只使用这里提供的三样东西：
//!
//! - `Window::native_handle()`：操作系统窗口句柄
//! - `WindowSystem::update(window, callback)`：消息循环，每次空闲调用一次 `callback`，
//!   直到收到关闭请求或按下 Esc
//! - 创建窗口时传入的尺寸回调

use raw_window_handle::{HasWindowHandle, RawWindowHandle};
use tracing::{debug, error, info};
use winit::dpi::LogicalSize;
use winit::event::{ElementState, Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{WindowBuilder, WindowId};

use super::registry::HandlerRegistry;
use crate::core::error::{BringupError, Result};
use crate::core::WindowConfig;
use crate::renderer::Extent2D;

/// 窗口子系统
///
/// 持有事件循环和窗口路由表。
pub struct WindowSystem {
    event_loop: EventLoop<()>,
    registry: HandlerRegistry<WindowId>,
}

/// 一个操作系统窗口
pub struct Window {
    inner: winit::window::Window,
}

impl WindowSystem {
    pub fn new() -> Result<Self> {
        let event_loop = EventLoop::new()
            .map_err(|e| BringupError::Window(format!("failed to create event loop: {}", e)))?;

        Ok(Self {
            event_loop,
            registry: HandlerRegistry::new(),
        })
    }

    /// 允许在非主线程创建事件循环，测试线程使用
    #[cfg(all(test, target_os = "windows"))]
    pub(crate) fn new_any_thread() -> Result<Self> {
        use winit::event_loop::EventLoopBuilder;
        use winit::platform::windows::EventLoopBuilderExtWindows;

        let event_loop = EventLoopBuilder::new()
            .with_any_thread(true)
            .build()
            .map_err(|e| BringupError::Window(format!("failed to create event loop: {}", e)))?;

        Ok(Self {
            event_loop,
            registry: HandlerRegistry::new(),
        })
    }

    /// 创建窗口并注册尺寸回调
    pub fn create_window<F>(&mut self, config: &WindowConfig, on_resize: F) -> Result<Window>
    where
        F: FnMut(u32, u32) + 'static,
    {
        let inner = WindowBuilder::new()
            .with_title(config.title.as_str())
            .with_inner_size(LogicalSize::new(config.width, config.height))
            .with_resizable(config.resizable)
            .build(&self.event_loop)
            .map_err(|e| BringupError::Window(format!("failed to create window: {}", e)))?;

        self.registry.register(inner.id(), Box::new(on_resize))?;

        let size = inner.inner_size();
        info!(
            title = %config.title,
            width = size.width,
            height = size.height,
            "Window created"
        );

        Ok(Window { inner })
    }

    /// 运行消息循环
    ///
    /// `callback` 返回错误时退出循环并返回该错误。
    /// 返回前先释放 `callback`（以及它持有的图形资源），再销毁窗口。
    pub fn update<F>(self, window: Window, mut callback: F) -> Result<()>
    where
        F: FnMut() -> Result<()>,
    {
        let WindowSystem {
            event_loop,
            mut registry,
        } = self;
        let window_id = window.id();
        let mut failure: Option<BringupError> = None;

        event_loop.set_control_flow(ControlFlow::Poll);

        event_loop
            .run(|event, elwt| match event {
                Event::WindowEvent { window_id: id, event } if id == window_id => match event {
                    WindowEvent::CloseRequested => {
                        info!("Close requested, shutting down...");
                        registry.unregister(&id);
                        elwt.exit();
                    }
                    WindowEvent::KeyboardInput { event: key, .. }
                        if key.physical_key == PhysicalKey::Code(KeyCode::Escape)
                            && key.state == ElementState::Pressed =>
                    {
                        info!("Escape pressed, shutting down...");
                        registry.unregister(&id);
                        elwt.exit();
                    }
                    WindowEvent::Resized(size) => {
                        debug!(width = size.width, height = size.height, "Window resized");
                        registry.notify_resize(&id, size.width, size.height);
                    }
                    _ => (),
                },
                Event::AboutToWait => {
                    if elwt.exiting() {
                        return;
                    }
                    if let Err(e) = callback() {
                        error!("Frame callback failed: {}", e);
                        failure = Some(e);
                        elwt.exit();
                    }
                }
                _ => (),
            })
            .map_err(|e| BringupError::Window(format!("event loop terminated: {}", e)))?;

        drop(callback);
        drop(window);

        match failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl Window {
    pub fn id(&self) -> WindowId {
        self.inner.id()
    }

    /// 客户区尺寸（物理像素）
    pub fn extent(&self) -> Extent2D {
        let size = self.inner.inner_size();
        Extent2D::new(size.width, size.height)
    }

    /// 操作系统窗口句柄
    pub fn native_handle(&self) -> Result<RawWindowHandle> {
        self.inner
            .window_handle()
            .map(|handle| handle.as_raw())
            .map_err(|e| BringupError::Window(format!("window handle unavailable: {}", e)))
    }
}
