//! 批量书籍处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责一次完整运行的调度和资源管理。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：校验配置、组装各能力
//! 2. **启动会话**：通过 SessionManager 启动浏览器
//! 3. **扫描书单**：在独立页面上扫描列表页（可重试）
//! 4. **逐本处理**：严格顺序，委托 BookFlow 处理单本书
//! 5. **会话恢复**：出现会话级错误后立即重启，下一本书开始前重新启动
//! 6. **收尾**：无论如何都关闭会话，写出结果并打印统计
//!
//! 初始化阶段（启动、扫描）失败视为整体失败，已有结果不落盘。

use std::path::PathBuf;

use tracing::{error, info, warn};

use crate::browser::{
    BrowserLauncher, BrowserPage, SessionIdentity, SessionManager, DEFAULT_SLOW_MO,
};
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::{BookEntry, LedgerSummary, ProductTarget, ResultLedger};
use crate::services::{ListingScanner, ResultReporter, RetryExecutor};
use crate::utils::logging::{log_book_start, log_books_found, log_startup};
use crate::workflow::{BookCtx, BookFlow};

/// 一次运行的产出
#[derive(Debug)]
pub struct RunReport {
    pub ledger: ResultLedger,
    pub summary: LedgerSummary,
    /// 结果 JSON 的路径，写出失败时为空
    pub results_path: Option<PathBuf>,
}

impl RunReport {
    pub fn all_succeeded(&self) -> bool {
        self.summary.failed == 0
    }
}

/// 应用主结构
pub struct App<L: BrowserLauncher> {
    config: Config,
    product: ProductTarget,
    sessions: SessionManager<L>,
    scanner: ListingScanner,
    flow: BookFlow,
    reporter: ResultReporter,
    retry: RetryExecutor,
}

impl<L: BrowserLauncher> App<L> {
    /// 初始化应用
    pub fn initialize(config: Config, launcher: L) -> AppResult<Self> {
        config.validate()?;
        log_startup(&config);

        let identity = SessionIdentity::from_config(&config)?;
        let flow = BookFlow::new(&config)?;

        let interactive = config.extraction_mode.is_interactive();
        if interactive && config.headless {
            warn!(
                "⚠️ 界面交互模式在无头浏览器中运行，每次交互前等待 {}ms",
                DEFAULT_SLOW_MO.as_millis()
            );
        }
        let sessions = SessionManager::new(launcher, identity).with_interactive(interactive);

        Ok(Self {
            product: config.product(),
            sessions,
            scanner: ListingScanner::new(config.selectors.clone(), config.timeouts.clone()),
            flow,
            reporter: ResultReporter::new(&config.results_dir),
            retry: RetryExecutor::from_config(&config.retry),
            config,
        })
    }

    pub fn sessions(&self) -> &SessionManager<L> {
        &self.sessions
    }

    /// 运行应用主逻辑
    ///
    /// 只有初始化阶段的错误会返回 `Err`，单本书的失败都记录在结果里。
    pub async fn run(&mut self) -> AppResult<RunReport> {
        let outcome = self.process_all_books().await;

        // 无论成败都关闭会话
        self.sessions.shutdown().await;

        let ledger = match outcome {
            Ok(ledger) => ledger,
            Err(e) => {
                error!("❌ 运行中止: {}", e);
                return Err(e);
            }
        };

        let results_path = match self.reporter.report(&ledger, &self.product) {
            Ok(path) => Some(path),
            Err(e) => {
                error!("❌ 写出结果失败: {}", e);
                None
            }
        };

        Ok(RunReport {
            summary: ledger.summary(),
            ledger,
            results_path,
        })
    }

    async fn process_all_books(&mut self) -> AppResult<ResultLedger> {
        let headed = !self.config.headless;
        self.sessions
            .launch(headed)
            .await
            .map_err(|e| AppError::setup("启动浏览器", e))?;

        let listing_url = self.config.target_url();
        let entries = self
            .scan_listing(&listing_url)
            .await
            .map_err(|e| AppError::setup("扫描列表页", e))?;

        let total = entries.len();
        log_books_found(total, &listing_url);

        let mut ledger = ResultLedger::with_capacity(total);

        for (idx, entry) in entries.into_iter().enumerate() {
            let ctx = BookCtx::new(idx + 1, total, entry);
            log_book_start(ctx.index, ctx.total, &ctx.entry.title);

            if !self.sessions.is_usable() {
                info!("{} 🔌 重新启动浏览器会话", ctx);
                if let Err(e) = self.sessions.relaunch().await {
                    error!("{} ❌ 重新启动会话失败: {}", ctx, e);
                }
            }

            let result = self.flow.run(&self.sessions, &ctx).await;
            let critical = result.is_critical();
            ledger.push(result);

            if critical {
                warn!("{} ⚠️ 会话已损坏，处理下一本书之前重启", ctx);
                self.sessions.restart().await;
            }
        }

        Ok(ledger)
    }

    /// 在单独的页面上扫描列表页，用完即关
    async fn scan_listing(&self, listing_url: &str) -> AppResult<Vec<BookEntry>> {
        self.retry
            .run("扫描列表页", self.config.retry.listing_retries, || async {
                let page = self.sessions.new_page().await?;
                let scanned = self.scanner.scan(&page, listing_url).await;
                if let Err(e) = page.close().await {
                    warn!("关闭列表页失败 (忽略): {}", e);
                }
                scanned
            })
            .await
    }
}
