use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 浏览器相关错误
    #[error("浏览器错误: {0}")]
    Browser(#[from] BrowserError),
    /// PDF 地址解析错误
    #[error("定位错误: {0}")]
    Locator(#[from] LocatorError),
    /// 下载错误
    #[error("下载错误: {0}")]
    Download(#[from] DownloadError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 重试次数耗尽，携带最后一次的底层错误
    #[error("{label} 在 {attempts} 次尝试后仍失败: {source}")]
    RetryExhausted {
        label: String,
        attempts: usize,
        source: Box<AppError>,
    },
    /// 书籍条目不完整（标题或链接为空）
    #[error("书籍条目无效: {0}")]
    InvalidEntry(String),
    /// 初始化阶段失败，整个运行无法继续
    #[error("初始化失败 ({stage}): {source}")]
    Setup {
        stage: &'static str,
        source: Box<AppError>,
    },
    /// 文件操作错误
    #[error("文件操作失败 ({}): {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// JSON 序列化失败
    #[error("JSON 序列化失败: {0}")]
    Json(#[from] serde_json::Error),
}

/// 浏览器相关错误
#[derive(Debug, Error)]
pub enum BrowserError {
    /// 会话已失效，需要重新启动
    #[error("浏览器会话不可用 (session unavailable)")]
    SessionUnavailable,
    /// 启动浏览器失败
    #[error("启动浏览器失败: {0}")]
    LaunchFailed(String),
    /// 导航失败
    #[error("导航到 {url} 失败: {reason}")]
    NavigationFailed { url: String, reason: String },
    /// 等待页面元素超时
    #[error("等待元素 {selector} 超时 ({waited_ms}ms){}", last_error_suffix(.last_error))]
    ContentNotFound {
        selector: String,
        waited_ms: u128,
        last_error: Option<String>,
    },
    /// 页面上找不到可操作的元素
    #[error("未找到可操作的元素: {0}")]
    ElementNotFound(String),
    /// 通用等待超时
    #[error("{action} 超时 ({waited_ms}ms){}", last_error_suffix(.last_error))]
    Timeout {
        action: String,
        waited_ms: u128,
        last_error: Option<String>,
    },
    /// CDP 协议错误，保留原始消息
    #[error("{0}")]
    Protocol(String),
}

/// PDF 地址解析错误
#[derive(Debug, Error)]
pub enum LocatorError {
    /// 页面源码中没有匹配的 PDF 地址
    #[error("页面中未找到 {product}/{version} 的 PDF 链接")]
    PatternNotFound { product: String, version: String },
    /// 得到的地址不是绝对的 http(s) 地址
    #[error("PDF 地址不是绝对地址: {0}")]
    NotAbsolute(String),
    /// 地址匹配规则无法编译
    #[error("地址匹配规则无效: {0}")]
    InvalidPattern(String),
    /// 模拟界面操作的某一步失败
    #[error("界面交互失败 [{stage}]: {source}")]
    UiInteractionFailed {
        stage: UiStage,
        source: Box<AppError>,
    },
}

/// 界面交互的阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiStage {
    /// 等待格式选择控件出现
    ControlWait,
    /// 选择 pdf 格式
    Selection,
    /// 等待新标签页
    NewPageWait,
    /// 等待新页面地址变为 .pdf
    UrlWait,
    /// 等待新页面加载完成
    LoadWait,
}

impl fmt::Display for UiStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UiStage::ControlWait => "control-wait",
            UiStage::Selection => "selection",
            UiStage::NewPageWait => "new-page-wait",
            UiStage::UrlWait => "url-wait",
            UiStage::LoadWait => "load-wait",
        };
        f.write_str(name)
    }
}

/// 下载错误
#[derive(Debug, Error)]
pub enum DownloadError {
    /// 响应状态码不是 200
    #[error("HTTP 状态码 {status} ({url})")]
    HttpStatus { url: String, status: u16 },
    /// 响应体为空
    #[error("下载内容为空 ({url})")]
    EmptyContent { url: String },
    /// HTTP 客户端无法创建
    #[error("创建 HTTP 客户端失败: {0}")]
    ClientBuild(#[source] reqwest::Error),
    /// 网络请求失败
    #[error("请求 {url} 失败: {source}")]
    Request {
        url: String,
        source: reqwest::Error,
    },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 缺少必填项
    #[error("缺少必填配置: {0}")]
    Missing(&'static str),
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: &'static str,
        value: String,
        expected_type: &'static str,
    },
    /// 配置文件读取失败
    #[error("读取配置文件 {path} 失败: {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },
    /// TOML 解析失败
    #[error("解析配置文件 {path} 失败: {source}")]
    TomlParse {
        path: String,
        source: toml::de::Error,
    },
    /// 基础地址无效
    #[error("基础地址无效: {0}")]
    InvalidBaseUrl(String),
}

fn last_error_suffix(last_error: &Option<String>) -> String {
    match last_error {
        Some(e) => format!(", 最后错误: {}", e),
        None => String::new(),
    }
}

// ========== 从常见错误类型转换 ==========

impl From<chromiumoxide::error::CdpError> for BrowserError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        BrowserError::Protocol(err.to_string())
    }
}

impl From<regex::Error> for AppError {
    fn from(err: regex::Error) -> Self {
        AppError::Locator(LocatorError::InvalidPattern(err.to_string()))
    }
}

impl From<chromiumoxide::error::CdpError> for AppError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        AppError::Browser(err.into())
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建文件操作错误
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AppError::Io {
            path: path.into(),
            source,
        }
    }

    /// 创建界面交互错误
    pub fn ui_stage(stage: UiStage, source: AppError) -> Self {
        AppError::Locator(LocatorError::UiInteractionFailed {
            stage,
            source: Box::new(source),
        })
    }

    /// 创建初始化错误
    pub fn setup(stage: &'static str, source: AppError) -> Self {
        AppError::Setup {
            stage,
            source: Box::new(source),
        }
    }

    /// 会话是否已失效（沿着重试与阶段包装向下查找）
    pub fn is_session_unavailable(&self) -> bool {
        match self {
            AppError::Browser(BrowserError::SessionUnavailable) => true,
            AppError::RetryExhausted { source, .. } | AppError::Setup { source, .. } => {
                source.is_session_unavailable()
            }
            AppError::Locator(LocatorError::UiInteractionFailed { source, .. }) => {
                source.is_session_unavailable()
            }
            _ => false,
        }
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
