//! 深度模板缓冲区

use tracing::{debug, info};
use windows::Win32::Graphics::Direct3D12::*;
use windows::Win32::Graphics::Dxgi::Common::DXGI_SAMPLE_DESC;

use super::barrier::transition_barrier;
use super::command::CommandContext;
use super::convert::{depth_format_to_dxgi, resource_state_to_d3d12};
use super::descriptor::{to_d3d12, Dx12DescriptorHeap};
use super::sync::Fence;
use super::{set_debug_name, HResultExt};
use crate::core::error::{GraphicsError, Result};
use crate::renderer::descriptor::CpuDescriptorHandle;
use crate::renderer::format::DepthFormat;
use crate::renderer::resource::{ResourceState, ResourceStateTracker};
use crate::renderer::sync::FenceValue;
use crate::renderer::Extent2D;

/// 深度模板缓冲区
///
/// 以 `Common` 状态创建，转换到 `DepthWrite` 并等 fence 完成后视图才可用。
pub struct DepthStencilBuffer {
    resource: ID3D12Resource,
    view: CpuDescriptorHandle,
    state: ResourceStateTracker,
    format: DepthFormat,
    extent: Extent2D,
}

impl DepthStencilBuffer {
    /// 在默认堆上创建与后台缓冲区同尺寸的深度纹理，并在 `dsv_heap` 中创建 DSV
    pub fn new(
        device: &ID3D12Device,
        dsv_heap: &mut Dx12DescriptorHeap,
        extent: Extent2D,
        format: DepthFormat,
    ) -> Result<Self> {
        let dxgi_format = depth_format_to_dxgi(format);

        let heap_props = D3D12_HEAP_PROPERTIES {
            Type: D3D12_HEAP_TYPE_DEFAULT,
            ..Default::default()
        };

        let desc = D3D12_RESOURCE_DESC {
            Dimension: D3D12_RESOURCE_DIMENSION_TEXTURE2D,
            Alignment: 0,
            Width: extent.width as u64,
            Height: extent.height,
            DepthOrArraySize: 1,
            MipLevels: 1,
            Format: dxgi_format,
            SampleDesc: DXGI_SAMPLE_DESC {
                Count: 1,
                Quality: 0,
            },
            Layout: D3D12_TEXTURE_LAYOUT_UNKNOWN,
            Flags: D3D12_RESOURCE_FLAG_ALLOW_DEPTH_STENCIL,
        };

        // 优化清除值：深度 1.0，模板 0
        let clear_value = D3D12_CLEAR_VALUE {
            Format: dxgi_format,
            Anonymous: D3D12_CLEAR_VALUE_0 {
                DepthStencil: D3D12_DEPTH_STENCIL_VALUE {
                    Depth: 1.0,
                    Stencil: 0,
                },
            },
        };

        let mut resource: Option<ID3D12Resource> = None;
        unsafe {
            device.CreateCommittedResource(
                &heap_props,
                D3D12_HEAP_FLAG_NONE,
                &desc,
                resource_state_to_d3d12(ResourceState::Common),
                Some(&clear_value),
                &mut resource,
            )
        }
        .or_device("failed to create depth stencil buffer")?;
        let resource = resource.ok_or_else(|| {
            GraphicsError::ResourceCreation("CreateCommittedResource returned no resource".into())
        })?;
        set_debug_name(&resource, "Depth Stencil Buffer");

        let view = dsv_heap.allocate()?;
        let dsv_desc = D3D12_DEPTH_STENCIL_VIEW_DESC {
            Format: dxgi_format,
            ViewDimension: D3D12_DSV_DIMENSION_TEXTURE2D,
            Flags: D3D12_DSV_FLAG_NONE,
            Anonymous: D3D12_DEPTH_STENCIL_VIEW_DESC_0 {
                Texture2D: D3D12_TEX2D_DSV { MipSlice: 0 },
            },
        };
        unsafe { device.CreateDepthStencilView(&resource, Some(&dsv_desc), to_d3d12(view)) };

        info!(
            width = extent.width,
            height = extent.height,
            format = format.name(),
            stencil = format.has_stencil(),
            "Depth stencil buffer created"
        );

        Ok(Self {
            resource,
            view,
            state: ResourceStateTracker::new("Depth Stencil Buffer", ResourceState::Common),
            format,
            extent,
        })
    }

    /// 录制并提交 `Common -> DepthWrite` 转换
    ///
    /// 返回需要等待的 fence 值。转换在 fence 完成并调用 `observe` 之后才生效。
    pub fn transition_to_depth_write(
        &mut self,
        commands: &mut CommandContext,
        fence: &mut Fence,
    ) -> Result<FenceValue> {
        commands.begin(fence.poll()?)?;

        let recorded = match self.state.record_transition(ResourceState::DepthWrite)? {
            Some(transition) => {
                let barrier = transition_barrier(&self.resource, transition);
                unsafe { commands.list().ResourceBarrier(&[barrier]) };
                debug!(
                    before = %transition.before,
                    after = %transition.after,
                    "Depth buffer transition recorded"
                );
                true
            }
            None => false,
        };

        commands.close()?;
        let value = commands.submit(fence)?;
        if recorded {
            self.state.mark_submitted(value)?;
        }
        Ok(value)
    }

    /// 根据已完成的 fence 值更新状态
    pub fn observe(&mut self, completed: FenceValue) -> bool {
        self.state.observe(completed)
    }

    /// 可写入时返回 DSV 句柄
    pub fn view(&self) -> Option<CpuDescriptorHandle> {
        self.state
            .is_usable_as(ResourceState::DepthWrite)
            .then_some(self.view)
    }

    pub fn state(&self) -> &ResourceStateTracker {
        &self.state
    }

    pub fn format(&self) -> DepthFormat {
        self.format
    }

    pub fn extent(&self) -> Extent2D {
        self.extent
    }
}
