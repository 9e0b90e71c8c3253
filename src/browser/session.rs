//! 会话管理 - 基础设施层
//!
//! 唯一持有浏览器会话的地方。会话可以被强制重启，
//! 重启后直到下一次 `launch` 之前都不可用，旧会话上打开的页面随之失效。

use std::time::Duration;

use tracing::{debug, info, warn};

use super::{BrowserLauncher, BrowserSession, LaunchOptions, PageOf};
use crate::config::Config;
use crate::error::{AppResult, BrowserError, ConfigError};

/// 无头模式下每次交互操作前的等待
pub const DEFAULT_SLOW_MO: Duration = Duration::from_millis(250);

/// 一条挂在站点域名上的 cookie
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCookie {
    pub name: String,
    pub value: String,
    pub domain: String,
}

/// 会话身份：固定的 User-Agent 与同意/偏好 cookie
///
/// 没有这些 cookie 时列表页只会渲染 cookie 同意弹窗。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionIdentity {
    pub user_agent: String,
    pub cookies: Vec<SessionCookie>,
}

impl SessionIdentity {
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let domain = config.cookie_domain()?;
        let cookies = config
            .consent_cookies
            .iter()
            .map(|c| SessionCookie {
                name: c.name.clone(),
                value: c.value.clone(),
                domain: domain.clone(),
            })
            .collect();

        Ok(Self {
            user_agent: config.user_agent.clone(),
            cookies,
        })
    }
}

/// 会话管理器
pub struct SessionManager<L: BrowserLauncher> {
    launcher: L,
    identity: SessionIdentity,
    session: Option<L::Session>,
    headed: bool,
    slow_mo: Duration,
    /// 本次运行是否会在页面上做界面交互
    interactive: bool,
    launches: usize,
    restarts: usize,
}

impl<L: BrowserLauncher> SessionManager<L> {
    pub fn new(launcher: L, identity: SessionIdentity) -> Self {
        Self {
            launcher,
            identity,
            session: None,
            headed: false,
            slow_mo: DEFAULT_SLOW_MO,
            interactive: true,
            launches: 0,
            restarts: 0,
        }
    }

    /// 自定义无头模式下的交互等待
    pub fn with_slow_mo(mut self, slow_mo: Duration) -> Self {
        self.slow_mo = slow_mo;
        self
    }

    /// 声明本次运行是否需要界面交互，不需要时无头会话不放慢操作
    pub fn with_interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }

    /// 启动会话；已有会话时先关闭
    pub async fn launch(&mut self, headed: bool) -> AppResult<()> {
        if self.session.is_some() {
            debug!("启动前关闭已有会话");
            self.teardown().await;
        }

        self.headed = headed;
        let options = LaunchOptions {
            headed,
            slow_mo: (!headed && self.interactive).then_some(self.slow_mo),
            identity: self.identity.clone(),
        };

        let session = self.launcher.launch(&options).await?;
        self.session = Some(session);
        self.launches += 1;
        info!(
            "✓ 浏览器会话已启动 (第 {} 次, {})",
            self.launches,
            if headed { "有界面" } else { "无头" }
        );
        Ok(())
    }

    /// 用上一次的参数重新启动
    pub async fn relaunch(&mut self) -> AppResult<()> {
        self.launch(self.headed).await
    }

    /// 会话是否仍可使用
    pub fn is_usable(&self) -> bool {
        self.session.is_some()
    }

    /// 当前会话
    pub fn session(&self) -> AppResult<&L::Session> {
        self.session
            .as_ref()
            .ok_or_else(|| BrowserError::SessionUnavailable.into())
    }

    /// 在当前会话中打开新页面
    pub async fn new_page(&self) -> AppResult<PageOf<L>> {
        self.session()?.new_page().await
    }

    /// 强制关闭所有页面、上下文和浏览器，之后会话不可用
    ///
    /// 每一步失败都只记录日志。
    pub async fn restart(&mut self) {
        warn!("🔄 强制重启浏览器会话...");
        self.teardown().await;
        self.restarts += 1;
    }

    /// 程序结束时的清理
    pub async fn shutdown(&mut self) {
        if self.session.is_some() {
            info!("🧹 关闭浏览器会话");
            self.teardown().await;
        }
    }

    pub fn launch_count(&self) -> usize {
        self.launches
    }

    pub fn restart_count(&self) -> usize {
        self.restarts
    }

    async fn teardown(&mut self) {
        let Some(mut session) = self.session.take() else {
            return;
        };

        if let Err(e) = session.close_pages().await {
            warn!("关闭页面失败 (忽略): {}", e);
        }
        if let Err(e) = session.close_context().await {
            warn!("关闭上下文失败 (忽略): {}", e);
        }
        if let Err(e) = session.close_browser().await {
            warn!("关闭浏览器失败 (忽略): {}", e);
        }
    }
}
