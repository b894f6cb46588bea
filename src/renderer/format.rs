//! 像素格式与特性等级
//!
//! 与具体图形 API 无关的格式枚举，供配置文件和后端共同使用。
//! DX12 后端在 `gfx::dx12::convert` 中把它们映射为 DXGI/D3D 常量。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 硬件特性等级
///
/// 声明顺序即从低到高，`Ord` 依赖这一点。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FeatureLevel {
    #[serde(rename = "11_0")]
    Level11_0,
    #[serde(rename = "11_1")]
    Level11_1,
    #[serde(rename = "12_0")]
    Level12_0,
    #[serde(rename = "12_1")]
    Level12_1,
    #[serde(rename = "12_2")]
    Level12_2,
}

impl FeatureLevel {
    /// 查询设备支持等级时使用的候选列表（降序）
    pub const DESCENDING: [FeatureLevel; 5] = [
        FeatureLevel::Level12_2,
        FeatureLevel::Level12_1,
        FeatureLevel::Level12_0,
        FeatureLevel::Level11_1,
        FeatureLevel::Level11_0,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            FeatureLevel::Level11_0 => "11_0",
            FeatureLevel::Level11_1 => "11_1",
            FeatureLevel::Level12_0 => "12_0",
            FeatureLevel::Level12_1 => "12_1",
            FeatureLevel::Level12_2 => "12_2",
        }
    }

    /// 检查设备报告的最高等级是否满足最低要求
    ///
    /// 不满足时直接失败，不会降级到更低的等级。
    pub fn ensure_at_least(self, minimum: FeatureLevel) -> std::result::Result<FeatureLevel, String> {
        if self >= minimum {
            Ok(self)
        } else {
            Err(format!(
                "device reports feature level {} but {} is required",
                self.name(),
                minimum.name()
            ))
        }
    }
}

impl fmt::Display for FeatureLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FeatureLevel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let normalized = s.trim().replace('.', "_");
        FeatureLevel::DESCENDING
            .iter()
            .copied()
            .find(|level| level.name() == normalized)
            .ok_or_else(|| format!("unknown feature level '{}'", s))
    }
}

/// 交换链后台缓冲区格式
///
/// 只列出 flip 模型交换链允许的格式。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurfaceFormat {
    Rgba8Unorm,
    Bgra8Unorm,
    Rgba16Float,
    Rgb10A2Unorm,
}

impl SurfaceFormat {
    pub fn name(&self) -> &'static str {
        match self {
            SurfaceFormat::Rgba8Unorm => "R8G8B8A8_UNORM",
            SurfaceFormat::Bgra8Unorm => "B8G8R8A8_UNORM",
            SurfaceFormat::Rgba16Float => "R16G16B16A16_FLOAT",
            SurfaceFormat::Rgb10A2Unorm => "R10G10B10A2_UNORM",
        }
    }
}

/// 深度模板缓冲区格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepthFormat {
    D24UnormS8,
    D32Float,
    D32FloatS8,
}

impl DepthFormat {
    pub fn name(&self) -> &'static str {
        match self {
            DepthFormat::D24UnormS8 => "D24_UNORM_S8_UINT",
            DepthFormat::D32Float => "D32_FLOAT",
            DepthFormat::D32FloatS8 => "D32_FLOAT_S8X24_UINT",
        }
    }

    /// 是否带模板分量
    pub fn has_stencil(&self) -> bool {
        !matches!(self, DepthFormat::D32Float)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_level_ordering() {
        assert!(FeatureLevel::Level12_0 > FeatureLevel::Level11_1);
        assert!(FeatureLevel::Level11_0 < FeatureLevel::Level12_2);

        let mut sorted = FeatureLevel::DESCENDING.to_vec();
        sorted.sort_by(|a, b| b.cmp(a));
        assert_eq!(sorted, FeatureLevel::DESCENDING.to_vec());
    }

    #[test]
    fn test_ensure_at_least_hard_fails() {
        assert_eq!(
            FeatureLevel::Level12_1.ensure_at_least(FeatureLevel::Level11_0),
            Ok(FeatureLevel::Level12_1)
        );
        let err = FeatureLevel::Level11_0
            .ensure_at_least(FeatureLevel::Level12_0)
            .unwrap_err();
        assert!(err.contains("12_0"));
    }

    #[test]
    fn test_feature_level_from_str() {
        assert_eq!("12_0".parse::<FeatureLevel>(), Ok(FeatureLevel::Level12_0));
        assert_eq!("11.1".parse::<FeatureLevel>(), Ok(FeatureLevel::Level11_1));
        assert!("10_0".parse::<FeatureLevel>().is_err());
    }

    #[test]
    fn test_depth_format_stencil() {
        assert!(DepthFormat::D24UnormS8.has_stencil());
        assert!(!DepthFormat::D32Float.has_stencil());
    }
}
