//! 统一错误处理
//!
//! 提供结构化错误类型。规则数据的大部分问题在校验阶段被清洗掉，
//! 只有顶层结构错误、配置错误和 IO 错误会以 `Err` 的形式传播出来。

use thiserror::Error;

/// 页面翻译错误类型
#[derive(Error, Debug)]
pub enum PageLingoError {
    /// 规则数据格式错误（顶层不是列表或无法解析）
    #[error("规则格式错误: {0}")]
    Format(String),

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(String),

    /// 子规则加载错误
    #[error("子规则加载失败: {0}")]
    SubRules(String),

    /// 翻译服务错误
    #[error("翻译失败: {0}")]
    Translate(String),

    /// IO 错误
    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),

    /// JSON 序列化错误
    #[error("JSON错误: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML 解析错误
    #[error("TOML解析错误: {0}")]
    Toml(#[from] toml::de::Error),
}

impl PageLingoError {
    /// 检查错误是否允许降级处理（记录日志后继续）
    pub fn is_fail_soft(&self) -> bool {
        matches!(
            self,
            PageLingoError::SubRules(_) | PageLingoError::Translate(_)
        )
    }
}

/// 结果类型别名
pub type Result<T> = std::result::Result<T, PageLingoError>;
