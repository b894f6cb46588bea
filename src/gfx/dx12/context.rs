//! DirectX 12 上下文管理
//!
//! 按固定顺序完成 bring-up：
//! 调试层 → 工厂 → 适配器 → 设备 → fence → 命令队列/分配器/列表
//! → 交换链 → RTV 堆 → 后台缓冲区 → DSV 堆 → 深度缓冲区。
//!
//! 任一步失败都返回错误，已创建的句柄随之按逆序释放。

use std::ffi::c_void;
use std::mem::ManuallyDrop;

use raw_window_handle::RawWindowHandle;
use tracing::{debug, info, trace, warn};
use windows::Win32::Foundation::HWND;
use windows::Win32::Graphics::Direct3D12::ID3D12Device;
use windows::Win32::Graphics::Dxgi::{IDXGIAdapter1, IDXGIFactory6};

use super::adapter::select_hardware_adapter;
use super::command::CommandContext;
use super::convert::surface_format_to_dxgi;
use super::depth::DepthStencilBuffer;
use super::descriptor::Dx12DescriptorHeap;
use super::device::{create_device, query_msaa_quality_levels};
use super::factory::create_factory;
use super::swapchain::{BackBuffer, SwapChain};
use super::sync::Fence;
use crate::core::error::{BringupError, GraphicsError, Result};
use crate::core::GraphicsConfig;
use crate::platform::Window;
use crate::renderer::adapter::{AdapterCandidate, AdapterInfo};
use crate::renderer::command::CommandListType;
use crate::renderer::descriptor::{CpuDescriptorHandle, DescriptorHeapDescriptor};
use crate::renderer::format::FeatureLevel;
use crate::renderer::lifetime::{HandleKind, LifetimeLedger};
use crate::renderer::Extent2D;

/// DirectX 12 上下文
///
/// 持有 bring-up 产生的全部句柄。字段按释放顺序声明；
/// 析构时按 `LifetimeLedger` 给出的顺序逐个释放，子对象先于创建它的父对象。
pub struct Dx12Context {
    depth_buffer: ManuallyDrop<DepthStencilBuffer>,
    dsv_heap: ManuallyDrop<Dx12DescriptorHeap>,
    back_buffers: ManuallyDrop<Vec<BackBuffer>>,
    rtv_heap: ManuallyDrop<Dx12DescriptorHeap>,
    swap_chain: ManuallyDrop<SwapChain>,
    commands: ManuallyDrop<CommandContext>,
    fence: ManuallyDrop<Fence>,
    device: ManuallyDrop<ID3D12Device>,
    adapter: ManuallyDrop<IDXGIAdapter1>,
    factory: ManuallyDrop<IDXGIFactory6>,

    adapter_info: AdapterInfo,
    feature_level: FeatureLevel,
    msaa_quality_levels: u32,
    ledger: LifetimeLedger,
    extent: Extent2D,
    frame_count: u64,
}

impl Dx12Context {
    /// 为窗口完成 bring-up
    pub fn new(window: &Window, config: &GraphicsConfig) -> Result<Self> {
        info!("Initializing DirectX 12 context...");

        let extent = window.extent();
        if extent.is_empty() {
            return Err(BringupError::Initialization(format!(
                "window client area is empty ({}x{})",
                extent.width, extent.height
            )));
        }
        let hwnd = hwnd_from_raw(window.native_handle()?)?;

        let mut ledger = LifetimeLedger::new();

        let factory = create_factory(config.debug_layer)?;
        ledger.acquire(HandleKind::Factory)?;

        let AdapterCandidate {
            info: adapter_info,
            handle: adapter,
            ..
        } = select_hardware_adapter(&factory, config.min_feature_level)?;
        ledger.acquire(HandleKind::Adapter)?;

        let (device, feature_level) = create_device(&adapter, config.min_feature_level)?;
        ledger.acquire(HandleKind::Device)?;

        let msaa_quality_levels = query_msaa_quality_levels(
            &device,
            surface_format_to_dxgi(config.back_buffer_format),
            config.msaa_samples,
        )?;
        if msaa_quality_levels == 0 {
            warn!(
                samples = config.msaa_samples,
                format = config.back_buffer_format.name(),
                "MSAA sample count not supported for back buffer format"
            );
        }

        let mut fence = Fence::new(&device)?;
        ledger.acquire(HandleKind::Fence)?;

        let mut commands = CommandContext::new(&device, CommandListType::Direct)?;
        ledger.acquire(HandleKind::CommandQueue)?;
        ledger.acquire(HandleKind::CommandAllocator)?;
        ledger.acquire(HandleKind::CommandList)?;

        let swap_chain = SwapChain::new(
            &factory,
            commands.queue(),
            hwnd,
            extent,
            config.back_buffer_format,
            config.buffer_count,
        )?;
        ledger.acquire(HandleKind::SwapChain)?;

        let mut rtv_heap =
            Dx12DescriptorHeap::new(&device, &DescriptorHeapDescriptor::rtv(config.buffer_count))?;
        ledger.acquire(HandleKind::RtvHeap)?;

        let back_buffers = swap_chain.create_back_buffers(&device, &mut rtv_heap)?;
        ledger.acquire(HandleKind::BackBuffers)?;

        let mut dsv_heap = Dx12DescriptorHeap::new(&device, &DescriptorHeapDescriptor::dsv(1))?;
        ledger.acquire(HandleKind::DsvHeap)?;

        let mut depth_buffer =
            DepthStencilBuffer::new(&device, &mut dsv_heap, extent, config.depth_format)?;
        ledger.acquire(HandleKind::DepthBuffer)?;

        // 深度缓冲区转换完成前不可用，这里同步等待
        let transition = depth_buffer.transition_to_depth_write(&mut commands, &mut fence)?;
        fence.wait(transition)?;
        depth_buffer.observe(fence.completed_value());
        if depth_buffer.view().is_none() {
            return Err(GraphicsError::Synchronization(
                "depth buffer transition did not complete".into(),
            )
            .into());
        }

        info!(
            adapter = %adapter_info.name,
            feature_level = %feature_level,
            width = extent.width,
            height = extent.height,
            "DirectX 12 context initialized"
        );

        Ok(Self {
            depth_buffer: ManuallyDrop::new(depth_buffer),
            dsv_heap: ManuallyDrop::new(dsv_heap),
            back_buffers: ManuallyDrop::new(back_buffers),
            rtv_heap: ManuallyDrop::new(rtv_heap),
            swap_chain: ManuallyDrop::new(swap_chain),
            commands: ManuallyDrop::new(commands),
            fence: ManuallyDrop::new(fence),
            device: ManuallyDrop::new(device),
            adapter: ManuallyDrop::new(adapter),
            factory: ManuallyDrop::new(factory),
            adapter_info,
            feature_level,
            msaa_quality_levels,
            ledger,
            extent,
            frame_count: 0,
        })
    }

    /// 每帧调用一次
    ///
    /// 目前只推进 fence 观测，不录制绘制命令也不 present。
    pub fn draw(&mut self) -> Result<()> {
        self.frame_count += 1;
        let completed = self.fence.poll()?;
        self.depth_buffer.observe(completed);
        trace!(
            frame = self.frame_count,
            completed = completed.value(),
            back_buffer = self.swap_chain.current_back_buffer_index(),
            "Frame"
        );
        Ok(())
    }

    /// 窗口尺寸变化通知
    ///
    /// 交换链和深度缓冲区保持创建时的尺寸。
    pub fn resize(&mut self, extent: Extent2D) {
        if extent == self.extent {
            return;
        }
        debug!(
            width = extent.width,
            height = extent.height,
            current_width = self.extent.width,
            current_height = self.extent.height,
            "Resize requested, swap chain keeps its original size"
        );
    }

    pub fn device(&self) -> &ID3D12Device {
        &self.device
    }

    pub fn adapter(&self) -> &IDXGIAdapter1 {
        &self.adapter
    }

    pub fn factory(&self) -> &IDXGIFactory6 {
        &self.factory
    }

    pub fn adapter_info(&self) -> &AdapterInfo {
        &self.adapter_info
    }

    pub fn feature_level(&self) -> FeatureLevel {
        self.feature_level
    }

    pub fn msaa_quality_levels(&self) -> u32 {
        self.msaa_quality_levels
    }

    pub fn extent(&self) -> Extent2D {
        self.extent
    }

    pub fn back_buffers(&self) -> &[BackBuffer] {
        &self.back_buffers
    }

    pub fn rtv_heap(&self) -> &Dx12DescriptorHeap {
        &self.rtv_heap
    }

    pub fn dsv_heap(&self) -> &Dx12DescriptorHeap {
        &self.dsv_heap
    }

    /// 深度缓冲区视图，转换完成后才可用
    pub fn depth_view(&self) -> Option<CpuDescriptorHandle> {
        self.depth_buffer.view()
    }

    /// 已获取的句柄，按获取顺序
    pub fn acquired_handles(&self) -> &[HandleKind] {
        self.ledger.acquired()
    }

    /// 释放一种句柄
    ///
    /// # Safety
    ///
    /// 每种句柄只能释放一次，释放后不能再访问对应字段。
    /// 队列、分配器和命令列表由同一个 `CommandContext` 持有，
    /// 它按列表、分配器、队列的顺序析构，随 `CommandList` 一起释放。
    unsafe fn release(&mut self, kind: HandleKind) {
        match kind {
            HandleKind::DepthBuffer => ManuallyDrop::drop(&mut self.depth_buffer),
            HandleKind::DsvHeap => ManuallyDrop::drop(&mut self.dsv_heap),
            HandleKind::BackBuffers => ManuallyDrop::drop(&mut self.back_buffers),
            HandleKind::RtvHeap => ManuallyDrop::drop(&mut self.rtv_heap),
            HandleKind::SwapChain => ManuallyDrop::drop(&mut self.swap_chain),
            HandleKind::CommandList => ManuallyDrop::drop(&mut self.commands),
            HandleKind::CommandAllocator | HandleKind::CommandQueue => {}
            HandleKind::Fence => ManuallyDrop::drop(&mut self.fence),
            HandleKind::Device => ManuallyDrop::drop(&mut self.device),
            HandleKind::Adapter => ManuallyDrop::drop(&mut self.adapter),
            HandleKind::Factory => ManuallyDrop::drop(&mut self.factory),
        }
    }
}

impl Drop for Dx12Context {
    fn drop(&mut self) {
        // 释放前等待 GPU 完成所有已提交的工作
        if let Err(e) = self.fence.flush(self.commands.queue()) {
            warn!(error = %e, "Failed to flush GPU work before release");
        }

        // `new` 只在全部句柄获取成功后才构造 `Self`，账本中每种句柄恰好出现一次
        let order = self.ledger.take_release_order();
        for kind in &order {
            debug!(handle = %kind, "Releasing");
            unsafe { self.release(*kind) };
        }
        info!(handles = order.len(), frames = self.frame_count, "DirectX 12 context released");
    }
}

fn hwnd_from_raw(handle: RawWindowHandle) -> Result<HWND> {
    match handle {
        RawWindowHandle::Win32(win32) => Ok(HWND(win32.hwnd.get() as *mut c_void)),
        other => Err(BringupError::Window(format!(
            "expected a Win32 window handle, got {:?}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Config;
    use crate::platform::WindowSystem;
    use crate::renderer::format::DepthFormat;
    use crate::renderer::resource::ResourceState;

    #[test]
    #[ignore = "requires a D3D12 capable GPU and a desktop session"]
    fn test_full_bringup() {
        let config = Config::default();
        let mut graphics = config.graphics.clone();
        graphics.debug_layer = false;

        let mut windows = WindowSystem::new_any_thread().unwrap();
        let window = windows.create_window(&config.window, |_, _| {}).unwrap();
        let mut context = Dx12Context::new(&window, &graphics).unwrap();

        assert_eq!(context.acquired_handles(), &HandleKind::BRINGUP_ORDER);
        assert!(context.feature_level() >= graphics.min_feature_level);

        // 三个后台缓冲区，RTV 按增量连续排列
        let back_buffers = context.back_buffers();
        assert_eq!(back_buffers.len(), 3);
        let increment = context.rtv_heap().increment_size() as usize;
        assert_eq!(Some(back_buffers[0].rtv()), context.rtv_heap().handle_at(0));
        for pair in back_buffers.windows(2) {
            assert_eq!(pair[1].rtv().ptr - pair[0].rtv().ptr, increment);
        }
        for buffer in back_buffers {
            assert!(buffer.state().is_usable_as(ResourceState::Present));
        }

        assert_eq!(context.dsv_heap().capacity(), 1);
        assert_eq!(context.depth_view(), context.dsv_heap().handle_at(0));
        assert!(context.depth_view().is_some());

        context.draw().unwrap();
        drop(context);
    }

    #[test]
    #[ignore = "requires a D3D12 capable GPU"]
    fn test_depth_view_waits_for_fence() {
        let minimum = FeatureLevel::Level11_0;
        let factory = create_factory(false).unwrap();
        let adapter = select_hardware_adapter(&factory, minimum).unwrap().handle;
        let (device, _) = create_device(&adapter, minimum).unwrap();

        let mut fence = Fence::new(&device).unwrap();
        let mut commands = CommandContext::new(&device, CommandListType::Direct).unwrap();
        let mut dsv_heap =
            Dx12DescriptorHeap::new(&device, &DescriptorHeapDescriptor::dsv(1)).unwrap();
        let mut depth = DepthStencilBuffer::new(
            &device,
            &mut dsv_heap,
            Extent2D::new(64, 64),
            DepthFormat::D24UnormS8,
        )
        .unwrap();
        assert!(depth.view().is_none());

        let value = depth.transition_to_depth_write(&mut commands, &mut fence).unwrap();
        assert!(depth.view().is_none());

        // GPU 已完成，但 CPU 尚未观测
        fence.wait(value).unwrap();
        assert!(depth.view().is_none());

        assert!(depth.observe(fence.completed_value()));
        assert_eq!(depth.view(), dsv_heap.handle_at(0));

        // DSV 堆只有一个槽位
        assert!(dsv_heap.allocate().is_err());

        // 从未 signal 的值不能等待
        let err = fence.wait(fence.current_value().next()).unwrap_err();
        assert!(matches!(
            err.as_graphics(),
            Some(GraphicsError::Synchronization(_))
        ));
    }
}
