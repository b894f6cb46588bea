//! 资源状态跟踪
//!
//! GPU 资源只通过命令列表上显式记录的屏障改变状态，没有隐式转换。
//! 每个资源持有一个 [`ResourceStateTracker`]：当前状态是显式字段，
//! 只有在记录的屏障被提交、且其 fence 值被 CPU 观察到完成后才会更新。
//!
//! ```text
//! record_transition ──► Recorded ──mark_submitted(v)──► Submitted(v) ──observe(>= v)──► 当前状态更新
//! ```

use std::fmt;

use super::sync::FenceValue;
use crate::core::error::{GraphicsError, Result};

/// 资源状态（简化）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceState {
    /// 通用 / 创建时状态
    Common,
    RenderTarget,
    Present,
    DepthWrite,
}

impl fmt::Display for ResourceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceState::Common => "COMMON",
            ResourceState::RenderTarget => "RENDER_TARGET",
            ResourceState::Present => "PRESENT",
            ResourceState::DepthWrite => "DEPTH_WRITE",
        };
        f.write_str(name)
    }
}

/// 一次状态转换（对应一个 transition barrier）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub before: ResourceState,
    pub after: ResourceState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pending {
    /// 已记录到命令列表，尚未提交
    Recorded(ResourceState),
    /// 已提交，等待 fence 完成
    Submitted(ResourceState, FenceValue),
}

/// 单个资源的状态跟踪器
#[derive(Debug, Clone)]
pub struct ResourceStateTracker {
    name: String,
    current: ResourceState,
    pending: Option<Pending>,
}

impl ResourceStateTracker {
    /// # 参数
    ///
    /// * `name` - 调试名称
    /// * `initial` - 创建资源时传给驱动的初始状态
    pub fn new(name: impl Into<String>, initial: ResourceState) -> Self {
        Self {
            name: name.into(),
            current: initial,
            pending: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// 已确认完成的当前状态
    pub fn current_state(&self) -> ResourceState {
        self.current
    }

    /// 没有未完成的转换
    pub fn is_settled(&self) -> bool {
        self.pending.is_none()
    }

    /// 资源是否可以以 `state` 状态使用
    pub fn is_usable_as(&self, state: ResourceState) -> bool {
        self.is_settled() && self.current == state
    }

    /// 记录一次转换
    ///
    /// 目标状态等于当前状态时不需要屏障，返回 `Ok(None)`。
    /// 已有未完成的转换时返回错误，调用方必须先等待它完成。
    pub fn record_transition(&mut self, after: ResourceState) -> Result<Option<Transition>> {
        if let Some(pending) = self.pending {
            return Err(GraphicsError::CommandExecution(format!(
                "{}: transition to {} requested while {:?} is still pending",
                self.name, after, pending
            ))
            .into());
        }

        if after == self.current {
            return Ok(None);
        }

        self.pending = Some(Pending::Recorded(after));
        Ok(Some(Transition {
            before: self.current,
            after,
        }))
    }

    /// 标记已记录的转换随命令列表一起提交
    pub fn mark_submitted(&mut self, fence: FenceValue) -> Result<()> {
        match self.pending {
            Some(Pending::Recorded(after)) => {
                self.pending = Some(Pending::Submitted(after, fence));
                Ok(())
            }
            other => Err(GraphicsError::CommandExecution(format!(
                "{}: no recorded transition to submit (pending: {:?})",
                self.name, other
            ))
            .into()),
        }
    }

    /// 根据已完成的 fence 值更新状态
    ///
    /// 返回本次调用是否让转换生效。
    pub fn observe(&mut self, completed: FenceValue) -> bool {
        match self.pending {
            Some(Pending::Submitted(after, fence)) if completed >= fence => {
                self.current = after;
                self.pending = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_changes_only_after_fence() {
        let mut depth = ResourceStateTracker::new("depth", ResourceState::Common);

        let transition = depth.record_transition(ResourceState::DepthWrite).unwrap();
        assert_eq!(
            transition,
            Some(Transition {
                before: ResourceState::Common,
                after: ResourceState::DepthWrite,
            })
        );
        assert_eq!(depth.current_state(), ResourceState::Common);
        assert!(!depth.is_usable_as(ResourceState::DepthWrite));

        // 未提交前观察 fence 不会生效
        assert!(!depth.observe(FenceValue::new(100)));

        depth.mark_submitted(FenceValue::new(3)).unwrap();
        assert!(!depth.observe(FenceValue::new(2)));
        assert!(!depth.is_usable_as(ResourceState::DepthWrite));

        assert!(depth.observe(FenceValue::new(3)));
        assert_eq!(depth.current_state(), ResourceState::DepthWrite);
        assert!(depth.is_usable_as(ResourceState::DepthWrite));
    }

    #[test]
    fn test_noop_transition() {
        let mut buffer = ResourceStateTracker::new("back buffer 0", ResourceState::Present);
        assert_eq!(buffer.record_transition(ResourceState::Present).unwrap(), None);
        assert!(buffer.is_settled());
    }

    #[test]
    fn test_overlapping_transition_rejected() {
        let mut buffer = ResourceStateTracker::new("back buffer 1", ResourceState::Present);
        buffer.record_transition(ResourceState::RenderTarget).unwrap();
        assert!(buffer.record_transition(ResourceState::Present).is_err());

        buffer.mark_submitted(FenceValue::new(1)).unwrap();
        assert!(buffer.record_transition(ResourceState::Present).is_err());

        buffer.observe(FenceValue::new(1));
        let back = buffer.record_transition(ResourceState::Present).unwrap().unwrap();
        assert_eq!(back.before, ResourceState::RenderTarget);
    }

    #[test]
    fn test_submit_without_record_fails() {
        let mut depth = ResourceStateTracker::new("depth", ResourceState::Common);
        assert!(depth.mark_submitted(FenceValue::new(1)).is_err());
    }
}
