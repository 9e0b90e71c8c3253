//! 文件名与地址片段的规整

/// 文件系统中不允许出现的字符
const ILLEGAL_FILENAME_CHARS: [char; 9] = ['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// 把文件名中的非法字符替换为 `_`
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| if ILLEGAL_FILENAME_CHARS.contains(&c) { '_' } else { c })
        .collect()
}

/// 产品名转为地址片段：小写，连续空白变为 `_`，去掉 `[a-z0-9_]` 以外的字符
pub fn product_slug(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut in_whitespace = false;

    for c in name.to_lowercase().chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                slug.push('_');
            }
            in_whitespace = true;
            continue;
        }
        in_whitespace = false;
        if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' {
            slug.push(c);
        }
    }

    slug
}

/// `{产品}-{版本}-{书名}.pdf`，非法字符替换为 `_`
pub fn pdf_file_name(product_name: &str, product_version: &str, book_title: &str) -> String {
    sanitize_filename(&format!(
        "{}-{}-{}.pdf",
        product_name, product_version, book_title
    ))
}

/// `{产品}-{版本}-download-results.json`，名称中的非字母数字字符替换为 `_`
pub fn results_file_name(product_name: &str, product_version: &str) -> String {
    format!(
        "{}-{}-download-results.json",
        alphanumeric_only(product_name),
        alphanumeric_only(product_version)
    )
}

fn alphanumeric_only(value: &str) -> String {
    value
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pdf_file_name_replaces_illegal_chars() {
        assert_eq!(pdf_file_name("p", "v", "A/B:C*D"), "p-v-A_B_C_D.pdf");
        assert_eq!(
            pdf_file_name("p", "1.0", r#"a\b?"c"<d>|e"#),
            "p-1.0-a_b__c__d__e.pdf"
        );
    }

    #[test]
    fn test_product_slug() {
        assert_eq!(
            product_slug("Red Hat  Enterprise\tLinux"),
            "red_hat_enterprise_linux"
        );
        assert_eq!(product_slug("OpenShift (Dedicated) 4"), "openshift_dedicated_4");
        assert_eq!(product_slug("already_slug"), "already_slug");
    }

    #[test]
    fn test_results_file_name() {
        assert_eq!(
            results_file_name("Red Hat Linux", "9.2"),
            "Red_Hat_Linux-9_2-download-results.json"
        );
    }
}
