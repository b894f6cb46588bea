//! GPU 同步机制模块
//!
//! Fence 是唯一的 CPU-GPU 同步原语：一个单调递增的计数器，
//! GPU 队列在之前提交的工作全部完成后把它推进到 signal 的值。
//!
//! bring-up 阶段使用 "flush" 模式：提交后 signal 下一个值，
//! 然后 CPU 阻塞等待直到该值完成，才能复用命令分配器/命令列表。
//!
//! 这里只记录 CPU 侧的账本，真正的等待由 `gfx::dx12::sync::Fence` 完成。

/// Fence 值
///
/// 用于CPU-GPU同步的单调递增值。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct FenceValue(u64);

impl FenceValue {
    /// 创建新的Fence值
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// 获取内部值
    pub fn value(&self) -> u64 {
        self.0
    }

    /// 下一个Fence值
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

/// Fence 账本
///
/// 只有一个 CPU 线程会提交工作，所以这里不需要原子操作。
#[derive(Debug, Default)]
pub struct FenceTracker {
    /// 最近一次 signal 的值（CPU侧）
    current_value: FenceValue,
    /// 已观察到完成的值（GPU侧）
    completed_value: FenceValue,
}

impl FenceTracker {
    /// 创建新的账本，初始值为 0，与 `CreateFence(0, ..)` 一致
    pub fn new() -> Self {
        Self::default()
    }

    /// 最近一次 signal 的值
    pub fn current_value(&self) -> FenceValue {
        self.current_value
    }

    /// 已观察到完成的值
    pub fn completed_value(&self) -> FenceValue {
        self.completed_value
    }

    /// 获取下一个Fence值并递增计数器
    pub fn next_value(&mut self) -> FenceValue {
        self.current_value = self.current_value.next();
        self.current_value
    }

    /// 记录 GPU 报告的完成值
    ///
    /// 完成值只会前进，较旧的观察结果被忽略。
    pub fn observe_completed(&mut self, value: FenceValue) {
        if value > self.completed_value {
            self.completed_value = value;
        }
    }

    /// 检查特定Fence值是否已完成
    pub fn is_completed(&self, value: FenceValue) -> bool {
        self.completed_value >= value
    }

    /// 该值是否已经 signal 过，等待未 signal 的值永远不会返回
    pub fn is_signaled(&self, value: FenceValue) -> bool {
        value <= self.current_value
    }

    /// 所有已 signal 的工作是否都已完成
    pub fn is_idle(&self) -> bool {
        self.is_completed(self.current_value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fence_value() {
        let fence = FenceValue::new(0);
        assert_eq!(fence.value(), 0);
        assert_eq!(fence.next().value(), 1);
        assert!(FenceValue::new(1) < FenceValue::new(2));
    }

    #[test]
    fn test_fence_tracker() {
        let mut tracker = FenceTracker::new();
        assert!(tracker.is_idle());

        let v1 = tracker.next_value();
        let v2 = tracker.next_value();
        assert_eq!(v1.value(), 1);
        assert_eq!(v2.value(), 2);
        assert_eq!(tracker.current_value(), v2);
        assert!(!tracker.is_idle());

        // 模拟GPU完成
        tracker.observe_completed(v1);
        assert!(tracker.is_completed(v1));
        assert!(!tracker.is_completed(v2));

        tracker.observe_completed(v2);
        assert!(tracker.is_idle());
    }

    #[test]
    fn test_unsignaled_value_detected() {
        let mut tracker = FenceTracker::new();
        assert!(tracker.is_signaled(FenceValue::default()));
        assert!(!tracker.is_signaled(FenceValue::new(1)));

        let v1 = tracker.next_value();
        assert!(tracker.is_signaled(v1));
        assert!(!tracker.is_signaled(v1.next()));
    }

    #[test]
    fn test_completed_value_is_monotonic() {
        let mut tracker = FenceTracker::new();
        tracker.next_value();
        let v2 = tracker.next_value();

        tracker.observe_completed(v2);
        tracker.observe_completed(FenceValue::new(1));
        assert_eq!(tracker.completed_value(), v2);
    }
}
