//! 基于 chromiumoxide 的浏览器实现

use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::network::CookieParam;
use chromiumoxide::cdp::browser_protocol::target::{EventTargetCreated, TargetId};
use chromiumoxide::listeners::EventStream;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use regex::Regex;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, error, info};

use super::{
    BrowserLauncher, BrowserPage, BrowserSession, ExtractedRow, FieldSpec, LaunchOptions,
    SessionIdentity,
};
use crate::error::{AppError, AppResult, BrowserError};
use crate::infrastructure::JsExecutor;

/// 轮询页面状态的间隔
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// 启动 Chromium 的启动器
#[derive(Debug, Clone, Default)]
pub struct ChromiumLauncher {
    chrome_executable: Option<PathBuf>,
}

impl ChromiumLauncher {
    pub fn new(chrome_executable: Option<PathBuf>) -> Self {
        Self { chrome_executable }
    }

    fn browser_config(&self, options: &LaunchOptions) -> AppResult<BrowserConfig> {
        let mut builder = BrowserConfig::builder();
        builder = if options.headed {
            builder.with_head()
        } else {
            builder.new_headless_mode()
        };
        if let Some(path) = &self.chrome_executable {
            builder = builder.chrome_executable(path);
        }

        builder
            .args(vec![
                "--disable-gpu".to_string(),
                "--no-sandbox".to_string(),            // 容器内运行时必须
                "--disable-dev-shm-usage".to_string(), // 防止共享内存不足
                format!("--user-agent={}", options.identity.user_agent),
            ])
            .build()
            .map_err(|e| {
                error!("配置浏览器失败: {}", e);
                BrowserError::LaunchFailed(format!("配置浏览器失败: {}", e)).into()
            })
    }
}

#[async_trait]
impl BrowserLauncher for ChromiumLauncher {
    type Session = ChromiumSession;

    async fn launch(&self, options: &LaunchOptions) -> AppResult<ChromiumSession> {
        info!("🚀 启动浏览器...");
        let config = self.browser_config(options)?;

        let (browser, mut handler) = Browser::launch(config).await.map_err(|e| {
            error!("启动浏览器失败: {}", e);
            BrowserError::LaunchFailed(e.to_string())
        })?;
        debug!("浏览器启动成功");

        // 在后台处理浏览器事件，连接断开时流自然结束
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("浏览器事件处理出错: {}", e);
                }
            }
        });

        let session = ChromiumSession {
            browser,
            handler_task,
            slow_mo: options.slow_mo,
        };
        session.install_cookies(&options.identity).await?;

        Ok(session)
    }
}

/// 一个 Chromium 进程及其默认上下文
pub struct ChromiumSession {
    browser: Browser,
    handler_task: JoinHandle<()>,
    slow_mo: Option<Duration>,
}

impl ChromiumSession {
    async fn install_cookies(&self, identity: &SessionIdentity) -> AppResult<()> {
        if identity.cookies.is_empty() {
            return Ok(());
        }

        let cookies = identity
            .cookies
            .iter()
            .map(|c| {
                CookieParam::builder()
                    .name(c.name.clone())
                    .value(c.value.clone())
                    .domain(c.domain.clone())
                    .path("/")
                    .build()
                    .map_err(BrowserError::LaunchFailed)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let count = cookies.len();
        self.browser.set_cookies(cookies).await?;
        debug!("已写入 {} 个同意 cookie", count);
        Ok(())
    }

    fn wrap(&self, page: Page) -> ChromiumPage {
        ChromiumPage {
            executor: JsExecutor::new(page),
            slow_mo: self.slow_mo,
        }
    }

    /// 新目标刚创建时 handler 可能还没附加上，短暂重试
    async fn attach_page(&self, target_id: TargetId) -> AppResult<Page> {
        loop {
            match self.browser.get_page(target_id.clone()).await {
                Ok(page) => return Ok(page),
                Err(e) => {
                    debug!("新标签页尚未就绪: {}", e);
                    sleep(POLL_INTERVAL).await;
                }
            }
        }
    }
}

#[async_trait]
impl BrowserSession for ChromiumSession {
    type Page = ChromiumPage;
    type NewPageListener = EventStream<EventTargetCreated>;

    async fn new_page(&self) -> AppResult<ChromiumPage> {
        let page = self.browser.new_page("about:blank").await.map_err(|e| {
            error!("创建页面失败: {}", e);
            e
        })?;
        Ok(self.wrap(page))
    }

    async fn arm_new_page_listener(&self) -> AppResult<Self::NewPageListener> {
        Ok(self.browser.event_listener::<EventTargetCreated>().await?)
    }

    async fn wait_for_new_page(
        &self,
        mut listener: Self::NewPageListener,
        wait: Duration,
    ) -> AppResult<ChromiumPage> {
        let follow = async {
            while let Some(event) = listener.next().await {
                if event.target_info.r#type == "page" {
                    debug!("检测到新标签页: {}", event.target_info.url);
                    return self.attach_page(event.target_info.target_id.clone()).await;
                }
            }
            Err(BrowserError::Protocol("新标签页监听已结束 (channel closed)".to_string()).into())
        };

        match timeout(wait, follow).await {
            Ok(page) => Ok(self.wrap(page?)),
            Err(_) => Err(BrowserError::Timeout {
                action: "等待新标签页".to_string(),
                waited_ms: wait.as_millis(),
                last_error: None,
            }
            .into()),
        }
    }

    async fn close_pages_except(&self, keep: &ChromiumPage) -> AppResult<usize> {
        let keep_id = keep.executor.page().target_id().clone();
        let mut closed = 0;
        for page in self.browser.pages().await? {
            if *page.target_id() == keep_id {
                continue;
            }
            match page.close().await {
                Ok(()) => closed += 1,
                Err(e) => debug!("关闭页面失败: {}", e),
            }
        }
        Ok(closed)
    }

    async fn close_pages(&self) -> AppResult<()> {
        for page in self.browser.pages().await? {
            if let Err(e) = page.close().await {
                debug!("关闭页面失败: {}", e);
            }
        }
        Ok(())
    }

    async fn close_context(&self) -> AppResult<()> {
        self.browser.clear_cookies().await?;
        Ok(())
    }

    async fn close_browser(&mut self) -> AppResult<()> {
        let closed = self.browser.close().await;
        match &closed {
            Ok(_) => {
                if let Err(e) = self.browser.wait().await {
                    debug!("等待浏览器进程退出失败: {}", e);
                }
            }
            Err(_) => {
                if let Some(Err(e)) = self.browser.kill().await {
                    debug!("结束浏览器进程失败: {}", e);
                }
            }
        }
        self.handler_task.abort();
        closed?;
        Ok(())
    }
}

/// Chromium 页面，脚本通过 [`JsExecutor`] 执行
#[derive(Clone)]
pub struct ChromiumPage {
    executor: JsExecutor,
    slow_mo: Option<Duration>,
}

impl ChromiumPage {
    /// 无头模式下放慢交互操作
    async fn pace(&self) {
        if let Some(delay) = self.slow_mo {
            sleep(delay).await;
        }
    }
}

#[async_trait]
impl BrowserPage for ChromiumPage {
    async fn goto(&self, url: &str, wait: Duration) -> AppResult<()> {
        self.pace().await;
        debug!("导航到: {}", url);

        match timeout(wait, self.executor.page().goto(url)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(BrowserError::NavigationFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
            .into()),
            Err(_) => Err(BrowserError::NavigationFailed {
                url: url.to_string(),
                reason: format!("超时 ({}ms)", wait.as_millis()),
            }
            .into()),
        }
    }

    async fn wait_for_visible(&self, selector: &str, wait: Duration) -> AppResult<()> {
        let script = format!(
            r#"
            (() => {{
                const el = document.querySelector({});
                if (!el) return false;
                const style = window.getComputedStyle(el);
                const rect = el.getBoundingClientRect();
                return style.visibility !== 'hidden'
                    && style.display !== 'none'
                    && rect.width > 0
                    && rect.height > 0;
            }})()
            "#,
            serde_json::to_string(selector)?
        );

        poll_until("等待元素可见", wait, || self.executor.eval_as::<bool>(script.as_str()))
            .await
            .map_err(|e| match e {
                BrowserError::Timeout {
                    waited_ms,
                    last_error,
                    ..
                } => BrowserError::ContentNotFound {
                    selector: selector.to_string(),
                    waited_ms,
                    last_error,
                },
                other => other,
            })?;
        Ok(())
    }

    async fn extract_all(
        &self,
        selector: &str,
        fields: &[FieldSpec],
    ) -> AppResult<Vec<ExtractedRow>> {
        let script = format!(
            r#"
            (() => {{
                const fields = {};
                return Array.from(document.querySelectorAll({})).map((el) => {{
                    const row = {{}};
                    for (const f of fields) {{
                        let target = el;
                        if (f.selector) {{
                            target = el.matches(f.selector) ? el : el.querySelector(f.selector);
                        }}
                        let value = '';
                        if (target) {{
                            if (f.attribute) {{
                                const prop = target[f.attribute];
                                value = typeof prop === 'string' ? prop : (target.getAttribute(f.attribute) || '');
                            }} else {{
                                value = target.textContent || '';
                            }}
                        }}
                        row[f.name] = value.trim();
                    }}
                    return row;
                }});
            }})()
            "#,
            serde_json::to_string(fields)?,
            serde_json::to_string(selector)?
        );

        self.executor.eval_as(script).await
    }

    async fn content(&self) -> AppResult<String> {
        Ok(self.executor.page().content().await?)
    }

    async fn select_option(&self, selector: &str, value: &str) -> AppResult<()> {
        self.pace().await;

        let script = format!(
            r#"
            (() => {{
                const wanted = {value};
                const el = document.querySelector({selector});
                if (!el) return false;
                if (el.tagName === 'SELECT') {{
                    const option = Array.from(el.options).find(
                        (o) => o.value.toLowerCase() === wanted || o.textContent.trim().toLowerCase() === wanted
                    );
                    if (!option) return false;
                    el.value = option.value;
                    el.dispatchEvent(new Event('input', {{ bubbles: true }}));
                    el.dispatchEvent(new Event('change', {{ bubbles: true }}));
                    return true;
                }}
                const items = Array.from(el.querySelectorAll('option, [role="option"], [data-value], a, button'));
                const item = items.find((o) => {{
                    const v = (o.value || o.dataset.value || o.textContent || '').trim().toLowerCase();
                    return v === wanted;
                }});
                if (!item) return false;
                item.click();
                return true;
            }})()
            "#,
            value = serde_json::to_string(&value.to_lowercase())?,
            selector = serde_json::to_string(selector)?
        );

        if self.executor.eval_as::<bool>(script).await? {
            Ok(())
        } else {
            Err(BrowserError::ElementNotFound(format!("{} 中的选项 {}", selector, value)).into())
        }
    }

    async fn current_url(&self) -> AppResult<String> {
        Ok(self.executor.page().url().await?.unwrap_or_default())
    }

    async fn wait_for_url(&self, pattern: &Regex, wait: Duration) -> AppResult<()> {
        let action = format!("等待地址匹配 {}", pattern.as_str());
        poll_until(&action, wait, || async {
            let url = self.current_url().await?;
            Ok::<bool, AppError>(pattern.is_match(&url))
        })
        .await?;
        Ok(())
    }

    async fn wait_for_load(&self, wait: Duration) -> AppResult<()> {
        poll_until("等待页面加载完成", wait, || {
            self.executor
                .eval_as::<bool>("document.readyState === 'complete'")
        })
        .await?;
        Ok(())
    }

    async fn close(&self) -> AppResult<()> {
        self.executor.page().clone().close().await?;
        Ok(())
    }
}

/// 按固定间隔检查条件，直到满足或超时
///
/// 检查过程中的错误不会中断等待，但会作为最后错误附在超时信息里。
async fn poll_until<F, Fut>(action: &str, wait: Duration, mut check: F) -> Result<(), BrowserError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AppResult<bool>>,
{
    let deadline = Instant::now() + wait;
    let mut last_error = None;

    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match timeout(remaining, check()).await {
            Ok(Ok(true)) => return Ok(()),
            Ok(Ok(false)) => {}
            Ok(Err(e)) => last_error = Some(e.to_string()),
            Err(_) => {}
        }

        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(BrowserError::Timeout {
                action: action.to_string(),
                waited_ms: wait.as_millis(),
                last_error,
            });
        }
        sleep(POLL_INTERVAL.min(remaining)).await;
    }
}
