//! 驱动句柄生命周期账本
//!
//! 所有驱动句柄必须按获取顺序的逆序释放（子对象先于父对象），
//! 否则驱动侧会留下悬空引用。`LifetimeLedger` 在 bring-up 时记录获取顺序，
//! 拒绝在父对象之前获取子对象，并给出 teardown 时的释放顺序。

use std::fmt;

use crate::core::error::{BringupError, Result};

/// 驱动句柄种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandleKind {
    Factory,
    Adapter,
    Device,
    Fence,
    CommandQueue,
    CommandAllocator,
    CommandList,
    SwapChain,
    RtvHeap,
    BackBuffers,
    DsvHeap,
    DepthBuffer,
}

impl HandleKind {
    /// 标准 bring-up 顺序
    pub const BRINGUP_ORDER: [HandleKind; 12] = [
        HandleKind::Factory,
        HandleKind::Adapter,
        HandleKind::Device,
        HandleKind::Fence,
        HandleKind::CommandQueue,
        HandleKind::CommandAllocator,
        HandleKind::CommandList,
        HandleKind::SwapChain,
        HandleKind::RtvHeap,
        HandleKind::BackBuffers,
        HandleKind::DsvHeap,
        HandleKind::DepthBuffer,
    ];

    /// 创建此句柄之前必须存在的句柄
    pub fn parents(&self) -> &'static [HandleKind] {
        match self {
            HandleKind::Factory => &[],
            HandleKind::Adapter => &[HandleKind::Factory],
            HandleKind::Device => &[HandleKind::Adapter],
            HandleKind::Fence
            | HandleKind::CommandQueue
            | HandleKind::CommandAllocator
            | HandleKind::RtvHeap
            | HandleKind::DsvHeap => &[HandleKind::Device],
            HandleKind::CommandList => &[HandleKind::CommandAllocator],
            HandleKind::SwapChain => &[HandleKind::Factory, HandleKind::CommandQueue],
            HandleKind::BackBuffers => &[HandleKind::SwapChain, HandleKind::RtvHeap],
            HandleKind::DepthBuffer => &[HandleKind::DsvHeap, HandleKind::CommandList, HandleKind::Fence],
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            HandleKind::Factory => "DXGI factory",
            HandleKind::Adapter => "adapter",
            HandleKind::Device => "device",
            HandleKind::Fence => "fence",
            HandleKind::CommandQueue => "command queue",
            HandleKind::CommandAllocator => "command allocator",
            HandleKind::CommandList => "command list",
            HandleKind::SwapChain => "swap chain",
            HandleKind::RtvHeap => "RTV heap",
            HandleKind::BackBuffers => "back buffers",
            HandleKind::DsvHeap => "DSV heap",
            HandleKind::DepthBuffer => "depth buffer",
        }
    }
}

impl fmt::Display for HandleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 获取顺序账本
#[derive(Debug, Default)]
pub struct LifetimeLedger {
    acquired: Vec<HandleKind>,
}

impl LifetimeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录获取一个句柄
    ///
    /// 父句柄缺失或重复获取都是初始化顺序错误。
    pub fn acquire(&mut self, kind: HandleKind) -> Result<()> {
        if self.is_acquired(kind) {
            return Err(BringupError::Initialization(format!("{} acquired twice", kind)));
        }

        if let Some(missing) = kind.parents().iter().find(|parent| !self.is_acquired(**parent)) {
            return Err(BringupError::Initialization(format!(
                "{} acquired before its parent {}",
                kind, missing
            )));
        }

        self.acquired.push(kind);
        Ok(())
    }

    pub fn is_acquired(&self, kind: HandleKind) -> bool {
        self.acquired.contains(&kind)
    }

    pub fn acquired(&self) -> &[HandleKind] {
        &self.acquired
    }

    /// teardown 释放顺序：获取顺序的逆序
    pub fn release_order(&self) -> Vec<HandleKind> {
        self.acquired.iter().rev().copied().collect()
    }

    /// 取出释放顺序并清空账本
    ///
    /// 每个句柄只会出现一次，再次调用返回空列表。
    pub fn take_release_order(&mut self) -> Vec<HandleKind> {
        let mut order = std::mem::take(&mut self.acquired);
        order.reverse();
        order
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_bringup() -> LifetimeLedger {
        let mut ledger = LifetimeLedger::new();
        for kind in HandleKind::BRINGUP_ORDER {
            ledger.acquire(kind).unwrap();
        }
        ledger
    }

    #[test]
    fn test_bringup_order_is_valid() {
        let ledger = full_bringup();
        assert_eq!(ledger.acquired(), &HandleKind::BRINGUP_ORDER);
    }

    #[test]
    fn test_release_order_is_strict_reverse() {
        let ledger = full_bringup();
        let order = ledger.release_order();

        assert_eq!(order.first(), Some(&HandleKind::DepthBuffer));
        assert_eq!(order.last(), Some(&HandleKind::Factory));

        let mut expected = HandleKind::BRINGUP_ORDER.to_vec();
        expected.reverse();
        assert_eq!(order, expected);

        // 每个句柄都在它的所有父句柄之前释放
        for (position, kind) in order.iter().enumerate() {
            for parent in kind.parents() {
                let parent_position = order.iter().position(|k| k == parent).unwrap();
                assert!(parent_position > position, "{} released after {}", kind, parent);
            }
        }
    }

    #[test]
    fn test_parent_required() {
        let mut ledger = LifetimeLedger::new();
        ledger.acquire(HandleKind::Factory).unwrap();
        assert!(ledger.acquire(HandleKind::Device).is_err());

        ledger.acquire(HandleKind::Adapter).unwrap();
        ledger.acquire(HandleKind::Device).unwrap();
        // 交换链需要命令队列
        assert!(ledger.acquire(HandleKind::SwapChain).is_err());
    }

    #[test]
    fn test_duplicate_acquire() {
        let mut ledger = LifetimeLedger::new();
        ledger.acquire(HandleKind::Factory).unwrap();
        assert!(ledger.acquire(HandleKind::Factory).is_err());
    }

    #[test]
    fn test_take_release_order_drains() {
        let mut ledger = full_bringup();
        let order = ledger.take_release_order();
        assert_eq!(order, full_bringup().release_order());
        assert_eq!(order.len(), HandleKind::BRINGUP_ORDER.len());

        assert!(ledger.take_release_order().is_empty());
        assert!(!ledger.is_acquired(HandleKind::Factory));
    }
}
