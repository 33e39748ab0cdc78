//! # PageLingo Library
//!
//! 按站点规则在网页中插入译文。
//!
//! ## 模块组织
//!
//! - `rules` - 站点规则的校验、匹配与解析
//! - `translation` - 节点发现、译文组装和注册/注销生命周期
//! - `parsers` - HTML DOM 操作与 CSS 选择器
//! - `config` - 翻译设置（配置文件、环境变量）
//! - `env` - 类型安全的环境变量访问
//! - `error` - 统一错误类型

pub mod config;
pub mod env;
pub mod error;
pub mod parsers;
pub mod rules;
pub mod translation;

// Re-export commonly used items for convenience
pub use config::{ConfigManager, InteractionMode, Setting};
pub use error::{PageLingoError, Result};
pub use rules::{match_rule, parse_rules, resolve_rule, ResolvedRule, Rule};
pub use translation::LifecycleController;
