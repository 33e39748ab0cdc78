//! 页面标识匹配
//!
//! 模式中的 `*` 是通配符，其余字符按字面匹配，匹配不锚定首尾。

use regex::Regex;

use super::types::GLOBAL_PATTERN;

/// 页面标识是否匹配模式
pub fn is_match(href: &str, pattern: &str) -> bool {
    if pattern.is_empty() {
        return false;
    }
    if pattern == GLOBAL_PATTERN {
        return true;
    }

    let source = regex::escape(pattern).replace(r"\*", ".*");
    match Regex::new(&source) {
        Ok(re) => re.is_match(href),
        Err(e) => {
            tracing::warn!("无法编译匹配模式 {}: {}", pattern, e);
            false
        }
    }
}
