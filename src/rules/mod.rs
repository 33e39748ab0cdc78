//! 站点规则
//!
//! - `types` - 规则数据模型和封闭枚举
//! - `validator` - 规则校验与清洗
//! - `matcher` - 页面标识匹配
//! - `resolver` - 为页面解析出唯一生效的规则
//! - `subrules` - 订阅规则加载

pub mod matcher;
pub mod resolver;
pub mod subrules;
pub mod types;
pub mod validator;

pub use matcher::is_match;
pub use resolver::{match_rule, resolve_rule, splice_subrules, ResolveOptions};
pub use subrules::{
    CachedSubRuleLoader, FileSubRuleLoader, NoSubRules, SubRuleLoader, SubRuleSource,
};
pub use types::{
    AsKey, Inherit, Lang, ResolvedRule, Rule, TextStyle, Translator, DEFAULT_KEEP_SELECTOR,
    DEFAULT_SELECTOR, GLOBAL_KEY, GLOBAL_PATTERN, SHADOW_KEY,
};
pub use validator::{check_rules, parse_rules, serialize_rules};
