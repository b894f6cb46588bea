//! 命令列表状态机
//!
//! 一个队列、一个分配器、一个命令列表，三者类型相同。
//! 命令列表创建时处于录制状态，必须先关闭才算空闲；
//! 每次使用前先重置分配器再重置列表，而分配器只能在 GPU 用完之后重置。
//!
//! ```text
//! Recording ──close──► Closed ──submit(v)──► Submitted(v)
//!     ▲                  │                        │
//!     └──────reset───────┴────reset(completed>=v)─┘
//! ```

use super::sync::FenceValue;
use crate::core::error::{GraphicsError, Result};

/// 命令列表类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandListType {
    /// 图形 + 计算 + 复制
    Direct,
    Compute,
    Copy,
}

impl CommandListType {
    pub fn name(&self) -> &'static str {
        match self {
            CommandListType::Direct => "direct",
            CommandListType::Compute => "compute",
            CommandListType::Copy => "copy",
        }
    }
}

/// 命令列表状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandListState {
    /// 录制中
    Recording,
    /// 已关闭，可提交
    Closed,
    /// 已提交，GPU 完成对应 fence 值之前不能重置
    Submitted(FenceValue),
}

/// 命令列表状态跟踪
#[derive(Debug)]
pub struct CommandListTracker {
    list_type: CommandListType,
    state: CommandListState,
}

impl CommandListTracker {
    /// 新建的命令列表处于录制状态
    pub fn new(list_type: CommandListType) -> Self {
        Self {
            list_type,
            state: CommandListState::Recording,
        }
    }

    pub fn list_type(&self) -> CommandListType {
        self.list_type
    }

    pub fn state(&self) -> CommandListState {
        self.state
    }

    /// 关闭后或 GPU 完成后才算空闲
    pub fn is_idle(&self, completed: FenceValue) -> bool {
        match self.state {
            CommandListState::Recording => false,
            CommandListState::Closed => true,
            CommandListState::Submitted(fence) => completed >= fence,
        }
    }

    /// 检查能否结束录制，不改变状态
    pub fn ensure_closable(&self) -> Result<()> {
        match self.state {
            CommandListState::Recording => Ok(()),
            other => Err(self.invalid("close", other)),
        }
    }

    /// 结束录制
    pub fn close(&mut self) -> Result<()> {
        self.ensure_closable()?;
        self.state = CommandListState::Closed;
        Ok(())
    }

    /// 记录提交
    pub fn submit(&mut self, fence: FenceValue) -> Result<()> {
        match self.state {
            CommandListState::Closed => {
                self.state = CommandListState::Submitted(fence);
                Ok(())
            }
            other => Err(self.invalid("submit", other)),
        }
    }

    /// 开始新的录制
    ///
    /// `completed` 是当前已观察到完成的 fence 值。
    pub fn reset(&mut self, completed: FenceValue) -> Result<()> {
        self.ensure_resettable(completed)?;
        self.state = CommandListState::Recording;
        Ok(())
    }

    /// 检查能否开始新的录制，不改变状态
    ///
    /// 驱动端的重置成功之后再调用 `reset` 更新状态。
    pub fn ensure_resettable(&self, completed: FenceValue) -> Result<()> {
        if self.is_idle(completed) {
            Ok(())
        } else {
            Err(self.invalid("reset", self.state))
        }
    }

    fn invalid(&self, operation: &str, state: CommandListState) -> crate::core::BringupError {
        GraphicsError::CommandExecution(format!(
            "cannot {} {} command list in state {:?}",
            operation,
            self.list_type.name(),
            state
        ))
        .into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle() {
        let mut list = CommandListTracker::new(CommandListType::Direct);
        assert_eq!(list.state(), CommandListState::Recording);
        assert!(!list.is_idle(FenceValue::default()));

        list.close().unwrap();
        assert!(list.is_idle(FenceValue::default()));

        list.reset(FenceValue::default()).unwrap();
        list.close().unwrap();
        list.submit(FenceValue::new(1)).unwrap();
        assert_eq!(list.state(), CommandListState::Submitted(FenceValue::new(1)));
    }

    #[test]
    fn test_reset_waits_for_gpu() {
        let mut list = CommandListTracker::new(CommandListType::Direct);
        list.close().unwrap();
        list.submit(FenceValue::new(2)).unwrap();

        let err = list.reset(FenceValue::new(1)).unwrap_err();
        assert!(matches!(
            err.as_graphics(),
            Some(GraphicsError::CommandExecution(_))
        ));

        list.reset(FenceValue::new(2)).unwrap();
        assert_eq!(list.state(), CommandListState::Recording);
    }

    #[test]
    fn test_checks_leave_state_untouched() {
        let mut list = CommandListTracker::new(CommandListType::Direct);
        list.ensure_closable().unwrap();
        assert_eq!(list.state(), CommandListState::Recording);
        assert!(list.ensure_resettable(FenceValue::default()).is_err());

        list.close().unwrap();
        list.submit(FenceValue::new(4)).unwrap();
        assert!(list.ensure_closable().is_err());
        assert!(list.ensure_resettable(FenceValue::new(3)).is_err());

        // 检查通过也不进入录制状态
        list.ensure_resettable(FenceValue::new(4)).unwrap();
        assert_eq!(list.state(), CommandListState::Submitted(FenceValue::new(4)));
    }

    #[test]
    fn test_invalid_transitions() {
        let mut list = CommandListTracker::new(CommandListType::Copy);
        assert!(list.submit(FenceValue::new(1)).is_err());
        assert!(list.reset(FenceValue::new(0)).is_err());

        list.close().unwrap();
        assert!(list.close().is_err());
    }
}
