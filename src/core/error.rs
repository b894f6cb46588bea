//! 错误处理模块
//!
//! 定义了 bring-up 过程中使用的统一错误类型。
//!
//! # 错误分类
//!
//! - 工厂/适配器错误：DXGI 层面的失败（工厂创建、适配器枚举、交换链创建）
//! - 设备错误：设备创建、特性等级/MSAA 查询、栅栏/堆/队列/分配器/命令列表创建
//! - 接口查询错误：无法将已创建对象转换为所需的新版本接口
//!
//! 所有驱动调用的返回码都在调用点立即检查，失败时将 HRESULT 写入错误消息并立即返回，
//! 不做重试，也没有部分成功的路径。

use std::fmt;

/// bring-up 统一的 Result 类型
pub type Result<T> = std::result::Result<T, BringupError>;

/// bring-up 过程的错误类型
#[derive(Debug)]
pub enum BringupError {
    /// 配置错误
    Config(ConfigError),

    /// 图形 API 错误
    Graphics(GraphicsError),

    /// 窗口系统错误
    Window(String),

    /// IO 错误
    Io(std::io::Error),

    /// 日志系统错误
    Log(String),

    /// 初始化错误
    Initialization(String),
}

/// 配置相关的错误
#[derive(Debug)]
pub enum ConfigError {
    /// 配置文件未找到
    FileNotFound(String),

    /// 配置文件解析失败
    ParseError(String),

    /// 配置值无效
    InvalidValue { field: String, reason: String },
}

/// 图形 API 相关的错误
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphicsError {
    /// DXGI 工厂创建或适配器枚举失败
    Factory(String),

    /// 没有可用的适配器
    AdapterSelection(String),

    /// 设备及设备子对象创建失败
    Device(String),

    /// 接口查询（cast）失败
    Interface(String),

    /// 交换链错误
    Swapchain(String),

    /// 资源创建失败
    ResourceCreation(String),

    /// 命令列表状态或提交错误
    CommandExecution(String),

    /// CPU-GPU 同步错误
    Synchronization(String),
}

impl fmt::Display for BringupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BringupError::Config(e) => write!(f, "Configuration error: {}", e),
            BringupError::Graphics(e) => write!(f, "Graphics error: {}", e),
            BringupError::Window(msg) => write!(f, "Window error: {}", msg),
            BringupError::Io(e) => write!(f, "IO error: {}", e),
            BringupError::Log(msg) => write!(f, "Log error: {}", msg),
            BringupError::Initialization(msg) => write!(f, "Initialization error: {}", msg),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::FileNotFound(path) => write!(f, "Config file not found: {}", path),
            ConfigError::ParseError(msg) => write!(f, "Failed to parse config: {}", msg),
            ConfigError::InvalidValue { field, reason } => {
                write!(f, "Invalid value for '{}': {}", field, reason)
            }
        }
    }
}

impl fmt::Display for GraphicsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphicsError::Factory(msg) => write!(f, "DXGI factory error: {}", msg),
            GraphicsError::AdapterSelection(msg) => write!(f, "Adapter selection failed: {}", msg),
            GraphicsError::Device(msg) => write!(f, "Device error: {}", msg),
            GraphicsError::Interface(msg) => write!(f, "Interface query failed: {}", msg),
            GraphicsError::Swapchain(msg) => write!(f, "Swapchain error: {}", msg),
            GraphicsError::ResourceCreation(msg) => write!(f, "Resource creation failed: {}", msg),
            GraphicsError::CommandExecution(msg) => write!(f, "Command execution failed: {}", msg),
            GraphicsError::Synchronization(msg) => write!(f, "Synchronization failed: {}", msg),
        }
    }
}

impl std::error::Error for BringupError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BringupError::Io(e) => Some(e),
            BringupError::Config(e) => Some(e),
            BringupError::Graphics(e) => Some(e),
            _ => None,
        }
    }
}

impl std::error::Error for ConfigError {}
impl std::error::Error for GraphicsError {}

impl From<std::io::Error> for BringupError {
    fn from(err: std::io::Error) -> Self {
        BringupError::Io(err)
    }
}

impl From<ConfigError> for BringupError {
    fn from(err: ConfigError) -> Self {
        BringupError::Config(err)
    }
}

impl From<GraphicsError> for BringupError {
    fn from(err: GraphicsError) -> Self {
        BringupError::Graphics(err)
    }
}

impl BringupError {
    /// 如果是图形错误，返回内部的 `GraphicsError`
    pub fn as_graphics(&self) -> Option<&GraphicsError> {
        match self {
            BringupError::Graphics(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_graphics_error_display_keeps_hresult() {
        let err: BringupError =
            GraphicsError::Device("failed to create a command queue: 0x887a0005".to_string()).into();
        let text = err.to_string();
        assert!(text.starts_with("Graphics error: Device error:"));
        assert!(text.contains("0x887a0005"));
    }

    #[test]
    fn test_as_graphics() {
        let err: BringupError = GraphicsError::AdapterSelection("none".into()).into();
        assert_eq!(
            err.as_graphics(),
            Some(&GraphicsError::AdapterSelection("none".into()))
        );

        let err = BringupError::Window("closed".into());
        assert!(err.as_graphics().is_none());
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::InvalidValue {
            field: "graphics.buffer_count".to_string(),
            reason: "too small".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid value for 'graphics.buffer_count': too small");
    }
}
