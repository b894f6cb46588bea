//! D3D12 Fence 同步
//!
//! 包装 `ID3D12Fence` 和一个 Win32 事件，用于 CPU 等待 GPU 完成。
//! fence 值的单调性由 `renderer::sync::FenceTracker` 保证。

use tracing::{trace, warn};
use windows::Win32::Foundation::{CloseHandle, HANDLE, WAIT_FAILED};
use windows::Win32::Graphics::Direct3D12::{
    ID3D12CommandQueue, ID3D12Device, ID3D12Fence, D3D12_FENCE_FLAG_NONE,
};
use windows::Win32::System::Threading::{CreateEventA, WaitForSingleObject, INFINITE};

use super::HResultExt;
use crate::core::error::{GraphicsError, Result};
use crate::renderer::sync::{FenceTracker, FenceValue};

/// GPU/CPU 同步 fence
pub struct Fence {
    fence: ID3D12Fence,
    event: HANDLE,
    tracker: FenceTracker,
}

impl Fence {
    /// 创建初始值为 0 的 fence 和一个自动复位事件
    pub fn new(device: &ID3D12Device) -> Result<Self> {
        let fence: ID3D12Fence = unsafe { device.CreateFence(0, D3D12_FENCE_FLAG_NONE) }
            .or_device("failed to create fence")?;
        let event = unsafe { CreateEventA(None, false, false, None) }
            .or_sync("failed to create fence event")?;

        Ok(Self {
            fence,
            event,
            tracker: FenceTracker::new(),
        })
    }

    /// 在队列上发出下一个 fence 值
    pub fn signal(&mut self, queue: &ID3D12CommandQueue) -> Result<FenceValue> {
        let value = self.tracker.next_value();
        unsafe { queue.Signal(&self.fence, value.value()) }
            .or_sync("failed to signal fence")?;
        trace!(value = value.value(), "Fence signaled");
        Ok(value)
    }

    /// 读取 GPU 已完成的值并更新跟踪器
    pub fn poll(&mut self) -> Result<FenceValue> {
        let completed = unsafe { self.fence.GetCompletedValue() };
        // 设备移除后 GetCompletedValue 返回全 1
        if completed == u64::MAX {
            return Err(GraphicsError::Device(
                "device removed while polling fence".into(),
            )
            .into());
        }
        self.tracker.observe_completed(FenceValue::new(completed));
        Ok(self.tracker.completed_value())
    }

    /// 阻塞直到 GPU 完成 `value`
    ///
    /// `value` 必须已经 signal 过，否则返回 `GraphicsError::Synchronization`。
    pub fn wait(&mut self, value: FenceValue) -> Result<()> {
        if !self.tracker.is_signaled(value) {
            return Err(GraphicsError::Synchronization(format!(
                "fence value {} has not been signaled (current {})",
                value.value(),
                self.tracker.current_value().value()
            ))
            .into());
        }
        if self.poll()? >= value {
            return Ok(());
        }

        unsafe { self.fence.SetEventOnCompletion(value.value(), self.event) }
            .or_sync("failed to set fence completion event")?;

        if unsafe { WaitForSingleObject(self.event, INFINITE) } == WAIT_FAILED {
            return Err(GraphicsError::Synchronization(format!(
                "waiting for fence value {} failed",
                value.value()
            ))
            .into());
        }

        let completed = self.poll()?;
        trace!(value = value.value(), completed = completed.value(), "Fence wait finished");
        Ok(())
    }

    /// 发出一个新值并等待它完成，之后队列上没有未完成的工作
    pub fn flush(&mut self, queue: &ID3D12CommandQueue) -> Result<FenceValue> {
        let value = self.signal(queue)?;
        self.wait(value)?;
        Ok(value)
    }

    /// 最近一次观测到的完成值
    pub fn completed_value(&self) -> FenceValue {
        self.tracker.completed_value()
    }

    pub fn current_value(&self) -> FenceValue {
        self.tracker.current_value()
    }
}

impl Drop for Fence {
    fn drop(&mut self) {
        if let Err(e) = unsafe { CloseHandle(self.event) } {
            warn!(error = %e, "Failed to close fence event");
        }
    }
}
