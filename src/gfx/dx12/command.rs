//! 命令队列、命令分配器和命令列表

use tracing::debug;
use windows::core::Interface;
use windows::Win32::Graphics::Direct3D12::*;

use super::convert::list_type_to_d3d12;
use super::sync::Fence;
use super::HResultExt;
use crate::core::error::{GraphicsError, Result};
use crate::renderer::command::{CommandListState, CommandListTracker, CommandListType};
use crate::renderer::sync::FenceValue;

/// 一条队列及其分配器和命令列表
///
/// 字段按释放顺序声明：列表、分配器、队列。
pub struct CommandContext {
    list: ID3D12GraphicsCommandList,
    allocator: ID3D12CommandAllocator,
    queue: ID3D12CommandQueue,
    tracker: CommandListTracker,
}

impl CommandContext {
    /// 创建队列、分配器和命令列表
    ///
    /// 新建的命令列表处于录制状态，这里立即关闭，
    /// 之后每次使用前调用 `begin`。
    pub fn new(device: &ID3D12Device, list_type: CommandListType) -> Result<Self> {
        let d3d_type = list_type_to_d3d12(list_type);

        let queue_desc = D3D12_COMMAND_QUEUE_DESC {
            Type: d3d_type,
            Flags: D3D12_COMMAND_QUEUE_FLAG_NONE,
            ..Default::default()
        };
        let queue: ID3D12CommandQueue = unsafe { device.CreateCommandQueue(&queue_desc) }
            .or_device("failed to create command queue")?;

        let allocator: ID3D12CommandAllocator = unsafe { device.CreateCommandAllocator(d3d_type) }
            .or_device("failed to create command allocator")?;

        let list: ID3D12GraphicsCommandList = unsafe {
            device.CreateCommandList(0, d3d_type, &allocator, None::<&ID3D12PipelineState>)
        }
        .or_device("failed to create command list")?;

        let mut tracker = CommandListTracker::new(list_type);
        unsafe { list.Close() }.or_command("failed to close new command list")?;
        tracker.close()?;

        debug!(list_type = list_type.name(), "Command context created");

        Ok(Self {
            list,
            allocator,
            queue,
            tracker,
        })
    }

    pub fn queue(&self) -> &ID3D12CommandQueue {
        &self.queue
    }

    pub fn list(&self) -> &ID3D12GraphicsCommandList {
        &self.list
    }

    pub fn state(&self) -> CommandListState {
        self.tracker.state()
    }

    /// 重置分配器和命令列表，开始录制
    ///
    /// 上一次提交的工作未完成时返回错误。驱动端重置失败时状态保持不变。
    pub fn begin(&mut self, completed: FenceValue) -> Result<()> {
        self.tracker.ensure_resettable(completed)?;
        unsafe { self.allocator.Reset() }.or_command("failed to reset command allocator")?;
        unsafe { self.list.Reset(&self.allocator, None::<&ID3D12PipelineState>) }
            .or_command("failed to reset command list")?;
        self.tracker.reset(completed)
    }

    pub fn close(&mut self) -> Result<()> {
        self.tracker.ensure_closable()?;
        unsafe { self.list.Close() }.or_command("failed to close command list")?;
        self.tracker.close()
    }

    /// 提交已关闭的命令列表并发出 fence
    pub fn submit(&mut self, fence: &mut Fence) -> Result<FenceValue> {
        if self.tracker.state() != CommandListState::Closed {
            return Err(GraphicsError::CommandExecution(format!(
                "cannot submit command list in state {:?}",
                self.tracker.state()
            ))
            .into());
        }

        let list = self
            .list
            .cast::<ID3D12CommandList>()
            .or_interface("command list does not support ID3D12CommandList")?;
        unsafe { self.queue.ExecuteCommandLists(&[Some(list)]) };

        let value = fence.signal(&self.queue)?;
        self.tracker.submit(value)?;
        Ok(value)
    }
}
