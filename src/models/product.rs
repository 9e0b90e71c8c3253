//! 产品标识：名称 + 版本，以及由它们派生的地址与文件名

use crate::utils::naming;

/// 要下载文档的产品
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductTarget {
    pub name: String,
    pub version: String,
}

impl ProductTarget {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }

    /// 地址中使用的产品名（小写、空白转下划线）
    pub fn slug(&self) -> String {
        naming::product_slug(&self.name)
    }

    /// 列表页地址: `{base_url}/{slug}/{version}`
    pub fn listing_url(&self, base_url: &str) -> String {
        format!(
            "{}/{}/{}",
            base_url.trim_end_matches('/'),
            self.slug(),
            self.version
        )
    }

    /// 某本书的 PDF 文件名
    pub fn pdf_file_name(&self, book_title: &str) -> String {
        naming::pdf_file_name(&self.name, &self.version, book_title)
    }

    /// 结果汇总 JSON 的文件名
    pub fn results_file_name(&self) -> String {
        naming::results_file_name(&self.name, &self.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_url_with_and_without_trailing_slash() {
        let product = ProductTarget::new("OpenShift Container Platform", "4.14");

        assert_eq!(
            product.listing_url("https://docs.example.com/en/documentation/"),
            "https://docs.example.com/en/documentation/openshift_container_platform/4.14"
        );
        assert_eq!(
            product.listing_url("https://docs.example.com/en/documentation"),
            "https://docs.example.com/en/documentation/openshift_container_platform/4.14"
        );
    }
}
