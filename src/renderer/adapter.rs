//! 适配器选择
//!
//! 对枚举到的 GPU 适配器进行过滤和排序，选出最合适的一个。
//! 这部分与驱动无关，DX12 后端负责枚举并填充 [`AdapterCandidate`]。
//!
//! # 过滤规则（按顺序）
//!
//! 1. 软件适配器（Basic Render Driver）
//! 2. 无法在最低特性等级上创建设备的适配器（仅探测，不保留设备）
//! 3. 专用显存为 0 的适配器
//!
//! 剩余适配器按 (专用显存, 专用系统内存, 共享系统内存) 降序排列。

use std::cmp::Ordering;
use std::fmt;

use crate::core::error::{GraphicsError, Result};

/// 适配器描述信息
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AdapterInfo {
    /// 枚举索引
    pub index: u32,
    /// 适配器名称
    pub name: String,
    pub vendor_id: u32,
    pub device_id: u32,
    /// 专用显存（字节）
    pub dedicated_video_memory: u64,
    /// 专用系统内存（字节）
    pub dedicated_system_memory: u64,
    /// 共享系统内存（字节）
    pub shared_system_memory: u64,
    /// 是否为软件适配器
    pub software: bool,
}

impl AdapterInfo {
    /// 排序键：三级降序比较
    fn memory_key(&self) -> (u64, u64, u64) {
        (
            self.dedicated_video_memory,
            self.dedicated_system_memory,
            self.shared_system_memory,
        )
    }

    /// 按内存大小比较，较大者排在前面
    pub fn rank_cmp(&self, other: &Self) -> Ordering {
        other.memory_key().cmp(&self.memory_key())
    }
}

/// 待选适配器
///
/// `H` 是底层句柄类型，DX12 后端中为 `IDXGIAdapter1`，测试中可以是任意类型。
#[derive(Debug, Clone)]
pub struct AdapterCandidate<H> {
    pub info: AdapterInfo,
    /// 最低特性等级探测结果
    pub supports_min_feature_level: bool,
    pub handle: H,
}

impl<H> AdapterCandidate<H> {
    pub fn new(info: AdapterInfo, supports_min_feature_level: bool, handle: H) -> Self {
        Self {
            info,
            supports_min_feature_level,
            handle,
        }
    }

    /// 返回该适配器被拒绝的原因，可用时返回 `None`
    pub fn rejection(&self) -> Option<AdapterRejection> {
        if self.info.software {
            Some(AdapterRejection::Software)
        } else if !self.supports_min_feature_level {
            Some(AdapterRejection::FeatureLevelUnsupported)
        } else if self.info.dedicated_video_memory == 0 {
            Some(AdapterRejection::NoDedicatedVideoMemory)
        } else {
            None
        }
    }
}

/// 适配器被拒绝的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterRejection {
    Software,
    FeatureLevelUnsupported,
    NoDedicatedVideoMemory,
}

impl fmt::Display for AdapterRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdapterRejection::Software => f.write_str("software adapter"),
            AdapterRejection::FeatureLevelUnsupported => {
                f.write_str("cannot create a device at the minimum feature level")
            }
            AdapterRejection::NoDedicatedVideoMemory => f.write_str("no dedicated video memory"),
        }
    }
}

/// 过滤并排序适配器
///
/// 排序是稳定的：三项内存完全相同的适配器保持枚举顺序。
pub fn rank_adapters<H>(candidates: Vec<AdapterCandidate<H>>) -> Vec<AdapterCandidate<H>> {
    let mut ranked: Vec<_> = candidates
        .into_iter()
        .filter(|candidate| match candidate.rejection() {
            Some(reason) => {
                tracing::debug!(
                    index = candidate.info.index,
                    name = %candidate.info.name,
                    %reason,
                    "Adapter rejected"
                );
                false
            }
            None => true,
        })
        .collect();

    ranked.sort_by(|a, b| a.info.rank_cmp(&b.info));
    ranked
}

/// 选出最合适的适配器
///
/// 没有任何可用适配器时返回 `GraphicsError::AdapterSelection`，
/// 不会退回到软件适配器。
pub fn select_adapter<H>(candidates: Vec<AdapterCandidate<H>>) -> Result<AdapterCandidate<H>> {
    let rejections: Vec<String> = candidates
        .iter()
        .filter_map(|candidate| {
            candidate.rejection().map(|reason| {
                format!("#{} \"{}\": {}", candidate.info.index, candidate.info.name, reason)
            })
        })
        .collect();

    rank_adapters(candidates)
        .into_iter()
        .next()
        .ok_or_else(|| {
            let detail = if rejections.is_empty() {
                "no adapters were enumerated".to_string()
            } else {
                rejections.join("; ")
            };
            GraphicsError::AdapterSelection(format!("no acceptable adapter ({})", detail)).into()
        })
}

/// 将以 NUL 结尾的 UTF-16 缓冲区转换为字符串
pub fn wide_to_string(wide: &[u16]) -> String {
    let len = wide.iter().position(|&c| c == 0).unwrap_or(wide.len());
    String::from_utf16_lossy(&wide[..len])
}
