//! 配置管理模块
//!
//! 提供 bring-up 配置的加载、解析和管理功能。
//! 支持从 TOML 配置文件加载，也支持命令行参数覆盖。
//!
//! # 配置文件格式 (config.toml)
//!
//! ```toml
//! [window]
//! width = 1280
//! height = 720
//! title = "DistRender"
//! resizable = true
//!
//! [graphics]
//! buffer_count = 3
//! back_buffer_format = "rgba8_unorm"
//! depth_format = "d24_unorm_s8"
//! min_feature_level = "11_0"
//! debug_layer = true
//! msaa_samples = 4
//!
//! [logging]
//! level = "info"      # trace, debug, info, warn, error
//! file_output = false
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::error::{ConfigError, Result};
use crate::renderer::format::{DepthFormat, FeatureLevel, SurfaceFormat};

/// flip 模型交换链允许的缓冲区数量范围
pub const MIN_BUFFER_COUNT: u32 = 2;
pub const MAX_BUFFER_COUNT: u32 = 16;

/// bring-up 配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// 窗口配置
    #[serde(default)]
    pub window: WindowConfig,

    /// 图形配置
    #[serde(default)]
    pub graphics: GraphicsConfig,

    /// 日志配置
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// 窗口配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowConfig {
    /// 窗口宽度
    #[serde(default = "default_width")]
    pub width: u32,

    /// 窗口高度
    #[serde(default = "default_height")]
    pub height: u32,

    /// 窗口标题
    #[serde(default = "default_title")]
    pub title: String,

    /// 是否可调整大小
    #[serde(default = "default_resizable")]
    pub resizable: bool,
}

/// 图形配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphicsConfig {
    /// 交换链缓冲区数量
    #[serde(default = "default_buffer_count")]
    pub buffer_count: u32,

    /// 后台缓冲区格式
    #[serde(default = "default_back_buffer_format")]
    pub back_buffer_format: SurfaceFormat,

    /// 深度模板格式
    #[serde(default = "default_depth_format")]
    pub depth_format: DepthFormat,

    /// 最低特性等级
    #[serde(default = "default_min_feature_level")]
    pub min_feature_level: FeatureLevel,

    /// 是否启用 D3D12 调试层
    #[serde(default = "default_debug_layer")]
    pub debug_layer: bool,

    /// 查询 MSAA 质量等级时使用的采样数
    #[serde(default = "default_msaa")]
    pub msaa_samples: u32,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: LogLevel,

    /// 是否输出到文件
    #[serde(default = "default_file_output")]
    pub file_output: bool,

    /// 日志文件路径
    #[serde(default = "default_log_file")]
    pub log_file: String,
}

/// 日志级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

// 默认值函数
fn default_width() -> u32 { 1280 }
fn default_height() -> u32 { 720 }
fn default_title() -> String { "DistRender".to_string() }
fn default_resizable() -> bool { true }
fn default_buffer_count() -> u32 { 3 }
fn default_back_buffer_format() -> SurfaceFormat { SurfaceFormat::Rgba8Unorm }
fn default_depth_format() -> DepthFormat { DepthFormat::D24UnormS8 }
fn default_min_feature_level() -> FeatureLevel { FeatureLevel::Level11_0 }
fn default_debug_layer() -> bool { cfg!(debug_assertions) }
fn default_msaa() -> u32 { 4 }
fn default_log_level() -> LogLevel { LogLevel::Info }
fn default_file_output() -> bool { false }
fn default_log_file() -> String { "bringup.log".to_string() }

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            title: default_title(),
            resizable: default_resizable(),
        }
    }
}

impl Default for GraphicsConfig {
    fn default() -> Self {
        Self {
            buffer_count: default_buffer_count(),
            back_buffer_format: default_back_buffer_format(),
            depth_format: default_depth_format(),
            min_feature_level: default_min_feature_level(),
            debug_layer: default_debug_layer(),
            msaa_samples: default_msaa(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file_output: default_file_output(),
            log_file: default_log_file(),
        }
    }
}

impl Config {
    /// 从配置文件加载
    ///
    /// # 示例
    ///
    /// ```no_run
    /// use dist_bringup::core::Config;
    ///
    /// let config = Config::from_file("config.toml")?;
    /// # Ok::<(), dist_bringup::core::BringupError>(())
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_str = path.as_ref().to_string_lossy().to_string();

        let contents = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound(path_str.clone()))?;

        Self::from_toml_str(&contents)
    }

    /// 从 TOML 字符串解析
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents)
            .map_err(|e| ConfigError::ParseError(e.to_string()).into())
    }

    /// 从配置文件加载，如果文件不存在或无法解析则使用默认配置
    ///
    /// 此时日志系统尚未初始化，因此解析失败只输出到 stderr。
    pub fn from_file_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::from_file(path) {
            Ok(config) => config,
            Err(crate::core::BringupError::Config(ConfigError::FileNotFound(_))) => Self::default(),
            Err(e) => {
                eprintln!("{}, falling back to defaults", e);
                Self::default()
            }
        }
    }

    /// 从命令行参数覆盖配置
    ///
    /// 支持的参数：
    /// - `--width <value>` / `--height <value>`: 窗口尺寸
    /// - `--buffers <value>`: 交换链缓冲区数量
    /// - `--min-feature-level <value>`: 最低特性等级，例如 `12_0`
    /// - `--debug-layer` / `--no-debug-layer`: 调试层开关
    pub fn apply_args<I>(&mut self, args: I)
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let args: Vec<String> = args.into_iter().map(|s| s.as_ref().to_string()).collect();
        let value_of = |flag: &str| {
            args.iter()
                .position(|a| a == flag)
                .and_then(|idx| args.get(idx + 1))
        };

        if let Some(width) = value_of("--width").and_then(|v| v.parse().ok()) {
            self.window.width = width;
        }

        if let Some(height) = value_of("--height").and_then(|v| v.parse().ok()) {
            self.window.height = height;
        }

        if let Some(count) = value_of("--buffers").and_then(|v| v.parse().ok()) {
            self.graphics.buffer_count = count;
        }

        if let Some(level) = value_of("--min-feature-level").and_then(|v| v.parse().ok()) {
            self.graphics.min_feature_level = level;
        }

        if args.iter().any(|a| a == "--debug-layer") {
            self.graphics.debug_layer = true;
        }

        if args.iter().any(|a| a == "--no-debug-layer") {
            self.graphics.debug_layer = false;
        }
    }

    /// 验证配置的有效性
    pub fn validate(&self) -> Result<()> {
        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::InvalidValue {
                field: "window.width/height".to_string(),
                reason: "Window dimensions must be greater than 0".to_string(),
            }.into());
        }

        if !(MIN_BUFFER_COUNT..=MAX_BUFFER_COUNT).contains(&self.graphics.buffer_count) {
            return Err(ConfigError::InvalidValue {
                field: "graphics.buffer_count".to_string(),
                reason: format!(
                    "Flip-model swap chains need between {} and {} buffers",
                    MIN_BUFFER_COUNT, MAX_BUFFER_COUNT
                ),
            }.into());
        }

        if !matches!(self.graphics.msaa_samples, 1 | 2 | 4 | 8 | 16) {
            return Err(ConfigError::InvalidValue {
                field: "graphics.msaa_samples".to_string(),
                reason: "MSAA samples must be 1, 2, 4, 8, or 16".to_string(),
            }.into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.window.width, 1280);
        assert_eq!(config.window.height, 720);
        assert_eq!(config.graphics.buffer_count, 3);
        assert_eq!(config.graphics.min_feature_level, FeatureLevel::Level11_0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        config.window.width = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.graphics.buffer_count = 1;
        assert!(config.validate().is_err());

        config.graphics.buffer_count = 17;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.graphics.msaa_samples = 3;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_partial_toml() {
        let config = Config::from_toml_str(
            r#"
            [window]
            width = 640

            [graphics]
            buffer_count = 2
            back_buffer_format = "bgra8_unorm"
            depth_format = "d32_float"
            min_feature_level = "12_0"
            "#,
        )
        .unwrap();

        assert_eq!(config.window.width, 640);
        assert_eq!(config.window.height, 720);
        assert_eq!(config.graphics.buffer_count, 2);
        assert_eq!(config.graphics.back_buffer_format, SurfaceFormat::Bgra8Unorm);
        assert_eq!(config.graphics.depth_format, DepthFormat::D32Float);
        assert_eq!(config.graphics.min_feature_level, FeatureLevel::Level12_0);
        assert_eq!(config.logging.level, LogLevel::Info);
    }

    #[test]
    fn test_parse_error() {
        let err = Config::from_toml_str("[graphics]\nmin_feature_level = \"9_3\"").unwrap_err();
        assert!(matches!(
            err,
            crate::core::BringupError::Config(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_apply_args() {
        let mut config = Config::default();
        config.apply_args([
            "dist_bringup",
            "--width",
            "1920",
            "--height",
            "1080",
            "--buffers",
            "2",
            "--min-feature-level",
            "12_1",
            "--no-debug-layer",
        ]);

        assert_eq!(config.window.width, 1920);
        assert_eq!(config.window.height, 1080);
        assert_eq!(config.graphics.buffer_count, 2);
        assert_eq!(config.graphics.min_feature_level, FeatureLevel::Level12_1);
        assert!(!config.graphics.debug_layer);
    }

    #[test]
    fn test_apply_args_ignores_garbage() {
        let mut config = Config::default();
        config.apply_args(["dist_bringup", "--width", "wide", "--buffers"]);
        assert_eq!(config.window.width, 1280);
        assert_eq!(config.graphics.buffer_count, 3);
    }
}
