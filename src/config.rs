//! 程序配置
//!
//! 加载顺序：默认值 → `DOCS_CONFIG` 指向的 TOML 文件 → 环境变量。

use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::models::{ExtractionMode, ProductTarget};

/// 程序配置
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 产品名称（必填）
    pub product_name: String,
    /// 产品版本（必填）
    pub product_version: String,
    /// 文档站点基础地址，结尾的 `/` 可有可无
    pub base_url: String,
    /// 是否无头运行
    pub headless: bool,
    /// PDF 地址解析方式
    pub extraction_mode: ExtractionMode,
    /// PDF 保存目录
    pub output_dir: String,
    /// 结果 JSON 保存目录
    pub results_dir: String,
    /// 浏览器可执行文件（为空时由 chromiumoxide 自动查找）
    pub chrome_executable: Option<String>,
    /// 浏览器 User-Agent
    pub user_agent: String,
    /// 同意/偏好 cookie，挂在站点主域上
    pub consent_cookies: Vec<CookieConfig>,
    /// 判定会话已损坏的错误消息片段
    pub critical_error_patterns: Vec<String>,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    pub timeouts: Timeouts,
    pub retry: RetryConfig,
    pub selectors: Selectors,
}

/// cookie 配置
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct CookieConfig {
    pub name: String,
    pub value: String,
}

/// 各步骤的等待时间（毫秒）
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    pub navigation_ms: u64,
    pub listing_ms: u64,
    pub format_control_ms: u64,
    pub new_page_ms: u64,
    pub pdf_url_ms: u64,
    pub pdf_load_ms: u64,
    pub download_ms: u64,
}

/// 重试配置
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// 第一次重试前的等待
    pub base_delay_ms: u64,
    /// 单次等待上限
    pub max_delay_ms: u64,
    pub listing_retries: usize,
    pub navigation_retries: usize,
    pub locator_retries: usize,
    pub download_retries: usize,
}

/// 页面选择器
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Selectors {
    /// 列表页中每本书的卡片
    pub listing_tile: String,
    /// 卡片内的标题元素
    pub tile_title: String,
    /// 卡片内的链接元素
    pub tile_link: String,
    /// 详情页的格式选择控件
    pub format_control: String,
    /// 格式选项中代表 PDF 的值
    pub pdf_option: String,
}

/// 默认的会话损坏特征
///
/// 这些片段对应 chromiumoxide / CDP 的错误文本，更换浏览器驱动时需要重新整理。
pub const DEFAULT_CRITICAL_ERROR_PATTERNS: &[&str] = &[
    "target closed",
    "session closed",
    "browser has been closed",
    "session with given id not found",
    "no target with given id",
    "cannot find context with specified id",
    "execution context was destroyed",
    "channel closed",
    "receiver is gone",
    "send error",
    "received no response from the chromium instance",
    "connection closed",
    "websocket",
    "net::err_",
    "navigation failed",
    "context destroyed",
    "has been closed",
];

impl Default for Config {
    fn default() -> Self {
        Self {
            product_name: String::new(),
            product_version: String::new(),
            base_url: "https://docs.redhat.com/en/documentation".to_string(),
            headless: true,
            extraction_mode: ExtractionMode::DirectPattern,
            output_dir: "downloads".to_string(),
            results_dir: ".".to_string(),
            chrome_executable: None,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36".to_string(),
            consent_cookies: vec![
                CookieConfig {
                    name: "notice_behavior".to_string(),
                    value: "expressed,eu".to_string(),
                },
                CookieConfig {
                    name: "notice_gdpr_prefs".to_string(),
                    value: "0,1,2:".to_string(),
                },
                CookieConfig {
                    name: "notice_preferences".to_string(),
                    value: "2:".to_string(),
                },
                CookieConfig {
                    name: "cmapi_cookie_privacy".to_string(),
                    value: "permit 1,2,3".to_string(),
                },
            ],
            critical_error_patterns: DEFAULT_CRITICAL_ERROR_PATTERNS
                .iter()
                .map(|p| p.to_string())
                .collect(),
            verbose_logging: false,
            timeouts: Timeouts::default(),
            retry: RetryConfig::default(),
            selectors: Selectors::default(),
        }
    }
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            navigation_ms: 45_000,
            listing_ms: 30_000,
            format_control_ms: 15_000,
            new_page_ms: 60_000,
            pdf_url_ms: 60_000,
            pdf_load_ms: 90_000,
            download_ms: 120_000,
        }
    }
}

impl Timeouts {
    pub fn navigation(&self) -> Duration {
        Duration::from_millis(self.navigation_ms)
    }

    pub fn listing(&self) -> Duration {
        Duration::from_millis(self.listing_ms)
    }

    pub fn format_control(&self) -> Duration {
        Duration::from_millis(self.format_control_ms)
    }

    pub fn new_page(&self) -> Duration {
        Duration::from_millis(self.new_page_ms)
    }

    pub fn pdf_url(&self) -> Duration {
        Duration::from_millis(self.pdf_url_ms)
    }

    pub fn pdf_load(&self) -> Duration {
        Duration::from_millis(self.pdf_load_ms)
    }

    pub fn download(&self) -> Duration {
        Duration::from_millis(self.download_ms)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: 1_000,
            max_delay_ms: 10_000,
            listing_retries: 1,
            navigation_retries: 1,
            locator_retries: 1,
            download_retries: 1,
        }
    }
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            listing_tile: "[data-testid='book-tile'], .book-tile, .pf-c-card".to_string(),
            tile_title: "h2, h3, .title".to_string(),
            tile_link: "a[href]".to_string(),
            format_control: "select#format, select[name='format'], [data-testid='format-select']"
                .to_string(),
            pdf_option: "pdf".to_string(),
        }
    }
}

impl Config {
    /// 从配置文件与环境变量加载
    pub fn from_env() -> Result<Self, ConfigError> {
        let base = match std::env::var("DOCS_CONFIG") {
            Ok(path) => Self::from_toml_file(&path)?,
            Err(_) => Self::default(),
        };

        let config = base.apply_env(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// 读取 TOML 配置文件，缺省字段使用默认值
    pub fn from_toml_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
            path: path.to_string(),
            source,
        })?;
        Self::from_toml_str(&content).map_err(|source| ConfigError::TomlParse {
            path: path.to_string(),
            source,
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// 用环境变量覆盖配置
    ///
    /// `lookup` 通常是 `std::env::var`，测试时可替换。
    pub fn apply_env<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("PRODUCT_NAME") {
            self.product_name = v;
        }
        if let Some(v) = lookup("PRODUCT_VERSION") {
            self.product_version = v;
        }
        if let Some(v) = lookup("BASE_URL") {
            self.base_url = v;
        }
        if let Some(v) = lookup("HEADLESS") {
            self.headless = parse_env("HEADLESS", &v, "bool")?;
        }
        if let Some(v) = lookup("EXTRACTION_MODE") {
            self.extraction_mode = ExtractionMode::from_str(&v)?;
        }
        if let Some(v) = lookup("OUTPUT_DIR") {
            self.output_dir = v;
        }
        if let Some(v) = lookup("RESULTS_DIR") {
            self.results_dir = v;
        }
        if let Some(v) = lookup("CHROME_EXECUTABLE") {
            self.chrome_executable = Some(v).filter(|p| !p.is_empty());
        }
        if let Some(v) = lookup("VERBOSE_LOGGING") {
            self.verbose_logging = parse_env("VERBOSE_LOGGING", &v, "bool")?;
        }
        if let Some(v) = lookup("RETRY_BASE_DELAY_MS") {
            self.retry.base_delay_ms = parse_env("RETRY_BASE_DELAY_MS", &v, "u64")?;
        }
        if let Some(v) = lookup("CRITICAL_ERROR_PATTERNS") {
            self.critical_error_patterns = v
                .split(',')
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .collect();
        }
        Ok(self)
    }

    /// 检查必填项
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.product_name.trim().is_empty() {
            return Err(ConfigError::Missing("PRODUCT_NAME"));
        }
        if self.product_version.trim().is_empty() {
            return Err(ConfigError::Missing("PRODUCT_VERSION"));
        }
        self.doc_host()?;
        Ok(())
    }

    pub fn product(&self) -> ProductTarget {
        ProductTarget::new(self.product_name.trim(), self.product_version.trim())
    }

    /// 列表页地址
    pub fn target_url(&self) -> String {
        self.product().listing_url(&self.base_url)
    }

    /// 文档站点的主机名
    pub fn doc_host(&self) -> Result<String, ConfigError> {
        url::Url::parse(&self.base_url)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.to_string()))
            .ok_or_else(|| ConfigError::InvalidBaseUrl(self.base_url.clone()))
    }

    /// cookie 挂载的域：去掉主机名的第一段，`docs.example.com` → `.example.com`
    pub fn cookie_domain(&self) -> Result<String, ConfigError> {
        let host = self.doc_host()?;
        let labels: Vec<&str> = host.split('.').collect();
        if labels.len() > 2 {
            Ok(format!(".{}", labels[1..].join(".")))
        } else {
            Ok(format!(".{}", host))
        }
    }
}

fn parse_env<T: FromStr>(
    var_name: &'static str,
    value: &str,
    expected_type: &'static str,
) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::EnvVarParseFailed {
            var_name,
            value: value.to_string(),
            expected_type,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn test_env_overrides() {
        let config = Config::default()
            .apply_env(env(&[
                ("PRODUCT_NAME", "OpenShift Container Platform"),
                ("PRODUCT_VERSION", "4.14"),
                ("HEADLESS", "false"),
                ("EXTRACTION_MODE", "ui"),
                ("CRITICAL_ERROR_PATTERNS", "Target closed, ,socket hang up"),
            ]))
            .unwrap();

        assert!(config.validate().is_ok());
        assert!(!config.headless);
        assert_eq!(config.extraction_mode, ExtractionMode::UiInteraction);
        assert_eq!(
            config.critical_error_patterns,
            vec!["Target closed".to_string(), "socket hang up".to_string()]
        );
        assert_eq!(
            config.target_url(),
            "https://docs.redhat.com/en/documentation/openshift_container_platform/4.14"
        );
    }

    #[test]
    fn test_invalid_bool_is_rejected() {
        let err = Config::default()
            .apply_env(env(&[("HEADLESS", "maybe")]))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::EnvVarParseFailed {
                var_name: "HEADLESS",
                ..
            }
        ));
    }

    #[test]
    fn test_product_is_required() {
        let err = Config::default().validate().unwrap_err();
        assert!(matches!(err, ConfigError::Missing("PRODUCT_NAME")));
    }

    #[test]
    fn test_toml_partial_config() {
        let config = Config::from_toml_str(
            r#"
            product_name = "prod"
            product_version = "1.0"
            base_url = "https://docs.example.com/en/documentation/"
            extraction_mode = "ui_interaction"

            [timeouts]
            navigation_ms = 5000

            [retry]
            base_delay_ms = 10
            "#,
        )
        .unwrap();

        assert_eq!(config.extraction_mode, ExtractionMode::UiInteraction);
        assert_eq!(config.timeouts.navigation(), Duration::from_secs(5));
        assert_eq!(config.timeouts.pdf_load(), Duration::from_secs(90));
        assert_eq!(config.retry.base_delay_ms, 10);
        assert_eq!(config.retry.max_delay_ms, 10_000);
        assert_eq!(config.doc_host().unwrap(), "docs.example.com");
        assert_eq!(config.cookie_domain().unwrap(), ".example.com");
        assert_eq!(
            config.target_url(),
            "https://docs.example.com/en/documentation/prod/1.0"
        );
    }
}
