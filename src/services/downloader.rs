//! PDF 下载 - 业务能力层
//!
//! 普通 HTTP GET，不经过浏览器。只有状态码 200 且内容非空时才落盘，
//! 先写入 `.part` 临时文件，完成后改名，中途失败不会留下半截文件。

use std::path::PathBuf;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use tracing::{debug, info};

use crate::error::{AppError, AppResult, DownloadError};
use crate::utils::naming::sanitize_filename;

/// PDF 下载器
#[derive(Debug, Clone)]
pub struct Downloader {
    client: Client,
    output_dir: PathBuf,
}

impl Downloader {
    pub fn new(
        output_dir: impl Into<PathBuf>,
        user_agent: &str,
        timeout: Duration,
    ) -> Result<Self, DownloadError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(DownloadError::ClientBuild)?;

        Ok(Self {
            client,
            output_dir: output_dir.into(),
        })
    }

    /// 下载 `pdf_url` 到输出目录下的 `file_name`
    ///
    /// # 返回
    /// 写入的文件路径
    pub async fn download(&self, pdf_url: &str, file_name: &str) -> AppResult<PathBuf> {
        debug!("⬇️ 请求 {}", pdf_url);

        let response = self
            .client
            .get(pdf_url)
            .send()
            .await
            .map_err(|e| request_error(pdf_url, e))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(DownloadError::HttpStatus {
                url: pdf_url.to_string(),
                status: status.as_u16(),
            }
            .into());
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| request_error(pdf_url, e))?;
        if bytes.is_empty() {
            return Err(DownloadError::EmptyContent {
                url: pdf_url.to_string(),
            }
            .into());
        }

        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| AppError::io(&self.output_dir, e))?;

        let file_name = sanitize_filename(file_name);
        let destination = self.output_dir.join(&file_name);
        let partial = self.output_dir.join(format!("{}.part", file_name));

        tokio::fs::write(&partial, &bytes)
            .await
            .map_err(|e| AppError::io(&partial, e))?;
        if let Err(e) = tokio::fs::rename(&partial, &destination).await {
            let _ = tokio::fs::remove_file(&partial).await;
            return Err(AppError::io(&destination, e));
        }

        info!(
            "💾 已保存 {} ({} 字节)",
            destination.display(),
            bytes.len()
        );
        Ok(destination)
    }
}

fn request_error(url: &str, source: reqwest::Error) -> AppError {
    DownloadError::Request {
        url: url.to_string(),
        source,
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::TempDir;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn downloader(dir: &Path) -> Downloader {
        Downloader::new(dir, "test-agent/1.0", Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_download_writes_file() {
        let server = MockServer::start().await;
        let temp_dir = TempDir::new().unwrap();

        Mock::given(method("GET"))
            .and(path("/pdf/guide.pdf"))
            .and(header("user-agent", "test-agent/1.0"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF-1.7 body"))
            .mount(&server)
            .await;

        let out = temp_dir.path().join("nested");
        let url = format!("{}/pdf/guide.pdf", server.uri());
        let saved = downloader(&out)
            .download(&url, "Prod-1.0-Guide.pdf")
            .await
            .unwrap();

        assert_eq!(saved, out.join("Prod-1.0-Guide.pdf"));
        assert_eq!(std::fs::read(&saved).unwrap(), b"%PDF-1.7 body");
        assert!(!out.join("Prod-1.0-Guide.pdf.part").exists());
    }

    #[tokio::test]
    async fn test_download_rejects_non_200() {
        let server = MockServer::start().await;
        let temp_dir = TempDir::new().unwrap();

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let url = format!("{}/missing.pdf", server.uri());
        let err = downloader(temp_dir.path())
            .download(&url, "missing.pdf")
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            AppError::Download(DownloadError::HttpStatus { status: 404, .. })
        ));
        assert!(!temp_dir.path().join("missing.pdf").exists());
    }

    #[tokio::test]
    async fn test_download_rejects_empty_body() {
        let server = MockServer::start().await;
        let temp_dir = TempDir::new().unwrap();

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let url = format!("{}/empty.pdf", server.uri());
        let err = downloader(temp_dir.path())
            .download(&url, "empty.pdf")
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            AppError::Download(DownloadError::EmptyContent { .. })
        ));
        assert_eq!(std::fs::read_dir(temp_dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_download_sanitizes_file_name() {
        let server = MockServer::start().await;
        let temp_dir = TempDir::new().unwrap();

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"pdf"))
            .mount(&server)
            .await;

        let url = format!("{}/a.pdf", server.uri());
        let saved = downloader(temp_dir.path())
            .download(&url, "A/B:C.pdf")
            .await
            .unwrap();

        assert_eq!(saved.file_name().unwrap(), "A_B_C.pdf");
    }
}
