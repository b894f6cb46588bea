//! 交换链和后台缓冲区

use tracing::{debug, info};
use windows::core::Interface;
use windows::Win32::Foundation::HWND;
use windows::Win32::Graphics::Direct3D12::{ID3D12CommandQueue, ID3D12Device, ID3D12Resource};
use windows::Win32::Graphics::Dxgi::Common::DXGI_SAMPLE_DESC;
use windows::Win32::Graphics::Dxgi::{
    IDXGIFactory6, IDXGIOutput, IDXGISwapChain1, IDXGISwapChain4,
    DXGI_SWAP_CHAIN_DESC1, DXGI_SWAP_CHAIN_FLAG_ALLOW_MODE_SWITCH, DXGI_SWAP_EFFECT_FLIP_DISCARD,
    DXGI_USAGE_RENDER_TARGET_OUTPUT,
};

use super::convert::surface_format_to_dxgi;
use super::descriptor::{to_d3d12, Dx12DescriptorHeap};
use super::{set_debug_name, HResultExt};
use crate::core::error::Result;
use crate::renderer::descriptor::CpuDescriptorHandle;
use crate::renderer::format::SurfaceFormat;
use crate::renderer::resource::{ResourceState, ResourceStateTracker};
use crate::renderer::Extent2D;

/// 交换链的一个后台缓冲区及其 RTV
pub struct BackBuffer {
    resource: ID3D12Resource,
    rtv: CpuDescriptorHandle,
    state: ResourceStateTracker,
}

impl BackBuffer {
    pub fn resource(&self) -> &ID3D12Resource {
        &self.resource
    }

    pub fn rtv(&self) -> CpuDescriptorHandle {
        self.rtv
    }

    pub fn state(&self) -> &ResourceStateTracker {
        &self.state
    }
}

/// flip-discard 交换链
pub struct SwapChain {
    swap_chain: IDXGISwapChain4,
    format: SurfaceFormat,
    extent: Extent2D,
    buffer_count: u32,
}

impl SwapChain {
    /// 为窗口创建交换链
    ///
    /// 窗口模式、单采样、允许切换显示模式。
    pub fn new(
        factory: &IDXGIFactory6,
        queue: &ID3D12CommandQueue,
        hwnd: HWND,
        extent: Extent2D,
        format: SurfaceFormat,
        buffer_count: u32,
    ) -> Result<Self> {
        let desc = DXGI_SWAP_CHAIN_DESC1 {
            Width: extent.width,
            Height: extent.height,
            Format: surface_format_to_dxgi(format),
            SampleDesc: DXGI_SAMPLE_DESC {
                Count: 1,
                Quality: 0,
            },
            BufferUsage: DXGI_USAGE_RENDER_TARGET_OUTPUT,
            BufferCount: buffer_count,
            SwapEffect: DXGI_SWAP_EFFECT_FLIP_DISCARD,
            Flags: DXGI_SWAP_CHAIN_FLAG_ALLOW_MODE_SWITCH.0 as u32,
            ..Default::default()
        };

        let swap_chain: IDXGISwapChain1 = unsafe {
            factory.CreateSwapChainForHwnd(queue, hwnd, &desc, None, None::<&IDXGIOutput>)
        }
        .or_swapchain("failed to create swap chain")?;
        let swap_chain = swap_chain
            .cast::<IDXGISwapChain4>()
            .or_interface("swap chain does not support IDXGISwapChain4")?;

        info!(
            width = extent.width,
            height = extent.height,
            format = format.name(),
            buffers = buffer_count,
            "Swap chain created"
        );

        Ok(Self {
            swap_chain,
            format,
            extent,
            buffer_count,
        })
    }

    /// 取出全部后台缓冲区并在 `rtv_heap` 中为每个创建 RTV
    pub fn create_back_buffers(
        &self,
        device: &ID3D12Device,
        rtv_heap: &mut Dx12DescriptorHeap,
    ) -> Result<Vec<BackBuffer>> {
        (0..self.buffer_count)
            .map(|index| {
                let resource: ID3D12Resource = unsafe { self.swap_chain.GetBuffer(index) }
                    .or_swapchain(&format!("failed to get back buffer {}", index))?;
                let rtv = rtv_heap.allocate()?;
                unsafe { device.CreateRenderTargetView(&resource, None, to_d3d12(rtv)) };

                let name = format!("Back Buffer {}", index);
                set_debug_name(&resource, &name);
                debug!(index, rtv = rtv.ptr, "Back buffer view created");

                Ok(BackBuffer {
                    resource,
                    rtv,
                    state: ResourceStateTracker::new(name, ResourceState::Present),
                })
            })
            .collect()
    }

    pub fn current_back_buffer_index(&self) -> u32 {
        unsafe { self.swap_chain.GetCurrentBackBufferIndex() }
    }

    pub fn format(&self) -> SurfaceFormat {
        self.format
    }

    pub fn extent(&self) -> Extent2D {
        self.extent
    }

    pub fn buffer_count(&self) -> u32 {
        self.buffer_count
    }
}
