//! 浏览器能力层
//!
//! 只描述"页面能做什么"和"会话能做什么"，不绑定具体的自动化库。
//! 生产实现见 [`chromium`]，会话生命周期由 [`SessionManager`] 独占管理。

pub mod chromium;
pub mod session;

use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use serde::Serialize;

use crate::error::AppResult;

pub use chromium::ChromiumLauncher;
pub use session::{SessionIdentity, SessionManager, DEFAULT_SLOW_MO};

/// 从页面元素中提取一个字段
///
/// `selector` 为空时取元素本身；`attribute` 为空时取文本内容。
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: String,
    pub selector: Option<String>,
    pub attribute: Option<String>,
}

impl FieldSpec {
    pub fn text(name: impl Into<String>, selector: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            selector: Some(selector.into()),
            attribute: None,
        }
    }

    pub fn attribute(
        name: impl Into<String>,
        selector: impl Into<String>,
        attribute: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            selector: Some(selector.into()),
            attribute: Some(attribute.into()),
        }
    }
}

/// 提取结果中的一行：字段名 → 值
pub type ExtractedRow = std::collections::HashMap<String, String>;

/// 会话中的一个页面（标签页）
#[async_trait]
pub trait BrowserPage: Send + Sync {
    /// 导航到指定地址
    async fn goto(&self, url: &str, timeout: Duration) -> AppResult<()>;

    /// 等待选择器对应的元素可见
    async fn wait_for_visible(&self, selector: &str, timeout: Duration) -> AppResult<()>;

    /// 对每个匹配 `selector` 的元素按 `fields` 提取数据
    async fn extract_all(&self, selector: &str, fields: &[FieldSpec])
        -> AppResult<Vec<ExtractedRow>>;

    /// 渲染后的完整页面源码
    async fn content(&self) -> AppResult<String>;

    /// 在选择控件中选中 `value`
    async fn select_option(&self, selector: &str, value: &str) -> AppResult<()>;

    /// 当前地址
    async fn current_url(&self) -> AppResult<String>;

    /// 等待地址匹配 `pattern`
    async fn wait_for_url(&self, pattern: &Regex, timeout: Duration) -> AppResult<()>;

    /// 等待页面加载完成
    async fn wait_for_load(&self, timeout: Duration) -> AppResult<()>;

    /// 关闭页面
    async fn close(&self) -> AppResult<()>;
}

/// 一个浏览器会话（进程 + 上下文）
#[async_trait]
pub trait BrowserSession: Send + Sync {
    type Page: BrowserPage + 'static;
    /// 新标签页监听器，必须在触发操作之前创建
    type NewPageListener: Send;

    async fn new_page(&self) -> AppResult<Self::Page>;

    async fn arm_new_page_listener(&self) -> AppResult<Self::NewPageListener>;

    async fn wait_for_new_page(
        &self,
        listener: Self::NewPageListener,
        timeout: Duration,
    ) -> AppResult<Self::Page>;

    /// 关闭除 `keep` 之外的所有页面，返回关闭的数量
    ///
    /// 用于清理上一次等待超时之后才打开的标签页。
    async fn close_pages_except(&self, keep: &Self::Page) -> AppResult<usize>;

    async fn close_pages(&self) -> AppResult<()>;

    async fn close_context(&self) -> AppResult<()>;

    async fn close_browser(&mut self) -> AppResult<()>;
}

/// 启动选项
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    pub headed: bool,
    /// 交互操作前的额外等待，仅无头模式使用
    pub slow_mo: Option<Duration>,
    pub identity: SessionIdentity,
}

/// 浏览器启动器
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    type Session: BrowserSession;

    async fn launch(&self, options: &LaunchOptions) -> AppResult<Self::Session>;
}

/// 启动器产出的页面类型
pub type PageOf<L> = <<L as BrowserLauncher>::Session as BrowserSession>::Page;
