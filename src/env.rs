//! 统一的环境变量管理系统
//!
//! 提供类型安全、可验证的环境变量访问。配置管理器用这里定义的变量
//! 覆盖配置文件中的值。

use std::env;
use std::fmt;
use std::time::Duration;

use crate::config::InteractionMode;

/// 环境变量解析错误
#[derive(Debug, Clone)]
pub struct EnvError {
    pub variable: String,
    pub message: String,
}

impl fmt::Display for EnvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Environment variable '{}': {}", self.variable, self.message)
    }
}

impl std::error::Error for EnvError {}

pub type EnvResult<T> = Result<T, EnvError>;

/// 环境变量访问器特性
pub trait EnvVar<T> {
    const NAME: &'static str;
    const DEFAULT: Option<T>;
    const DESCRIPTION: &'static str;

    fn parse(value: &str) -> EnvResult<T>;

    fn get() -> EnvResult<T> {
        match env::var(Self::NAME) {
            Ok(value) => Self::parse(&value),
            Err(_) => {
                if let Some(default) = Self::DEFAULT {
                    Ok(default)
                } else {
                    Err(EnvError {
                        variable: Self::NAME.to_string(),
                        message: "Required environment variable not set".to_string(),
                    })
                }
            }
        }
    }

    fn get_or_default(default: T) -> T {
        Self::get().unwrap_or(default)
    }

    /// 变量是否在环境中显式设置
    fn is_set() -> bool {
        env::var(Self::NAME).is_ok()
    }
}

/// 核心环境变量定义
pub mod core {
    use super::*;

    /// 日志级别
    pub struct LogLevel;
    impl EnvVar<String> for LogLevel {
        const NAME: &'static str = "PAGELINGO_LOG_LEVEL";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Log level: trace, debug, info, warn, error";

        fn get() -> EnvResult<String> {
            match env::var(Self::NAME) {
                Ok(value) => Self::parse(&value),
                Err(_) => Ok("warn".to_string()),
            }
        }

        fn parse(value: &str) -> EnvResult<String> {
            match value.to_lowercase().as_str() {
                "trace" | "debug" | "info" | "warn" | "error" => Ok(value.to_lowercase()),
                _ => Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: format!(
                        "Invalid log level '{}'. Use: trace, debug, info, warn, error",
                        value
                    ),
                }),
            }
        }
    }
}

/// 页面翻译行为相关环境变量
pub mod setting {
    use super::*;
    use crate::config::constants;

    /// 最短翻译长度
    pub struct MinLength;
    impl EnvVar<usize> for MinLength {
        const NAME: &'static str = "PAGELINGO_MIN_LENGTH";
        const DEFAULT: Option<usize> = Some(constants::TRANS_MIN_LENGTH);
        const DESCRIPTION: &'static str = "Minimum text length (characters) worth translating";

        fn parse(value: &str) -> EnvResult<usize> {
            parse_bounded_usize(value, Self::NAME, 0, 100_000)
        }
    }

    /// 最长翻译长度
    pub struct MaxLength;
    impl EnvVar<usize> for MaxLength {
        const NAME: &'static str = "PAGELINGO_MAX_LENGTH";
        const DEFAULT: Option<usize> = Some(constants::TRANS_MAX_LENGTH);
        const DESCRIPTION: &'static str = "Maximum text length (characters) sent for translation";

        fn parse(value: &str) -> EnvResult<usize> {
            parse_bounded_usize(value, Self::NAME, 1, 100_000)
        }
    }

    /// 触发方式
    pub struct MouseKey;
    impl EnvVar<InteractionMode> for MouseKey {
        const NAME: &'static str = "PAGELINGO_MOUSE_KEY";
        const DEFAULT: Option<InteractionMode> = Some(InteractionMode::Disabled);
        const DESCRIPTION: &'static str =
            "Trigger mode: mk_disable, mk_pageopen, mk_mouseover, mk_ctrlKey, mk_shiftKey, mk_altKey, mk_metaKey";

        fn parse(value: &str) -> EnvResult<InteractionMode> {
            InteractionMode::from_key(value.trim()).ok_or_else(|| EnvError {
                variable: Self::NAME.to_string(),
                message: format!("Unknown trigger mode '{}'", value),
            })
        }
    }

    /// 请求间隔
    pub struct FetchInterval;
    impl EnvVar<Duration> for FetchInterval {
        const NAME: &'static str = "PAGELINGO_FETCH_INTERVAL";
        const DEFAULT: Option<Duration> = Some(Duration::from_millis(constants::DEFAULT_FETCH_INTERVAL_MS));
        const DESCRIPTION: &'static str = "Delay between translation requests in milliseconds";

        fn parse(value: &str) -> EnvResult<Duration> {
            let millis: u64 = value.trim().parse().map_err(|_| EnvError {
                variable: Self::NAME.to_string(),
                message: "Must be a valid number of milliseconds".to_string(),
            })?;

            if millis > 60_000 {
                return Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "Interval too long (max 60000 ms)".to_string(),
                });
            }

            Ok(Duration::from_millis(millis))
        }
    }

    /// 最大并发请求数
    pub struct FetchLimit;
    impl EnvVar<usize> for FetchLimit {
        const NAME: &'static str = "PAGELINGO_FETCH_LIMIT";
        const DEFAULT: Option<usize> = Some(constants::DEFAULT_FETCH_LIMIT);
        const DESCRIPTION: &'static str = "Maximum concurrent translation requests";

        fn parse(value: &str) -> EnvResult<usize> {
            parse_bounded_usize(value, Self::NAME, 1, 100)
        }
    }

    /// 是否注入订阅规则
    pub struct InjectRules;
    impl EnvVar<bool> for InjectRules {
        const NAME: &'static str = "PAGELINGO_INJECT_RULES";
        const DEFAULT: Option<bool> = Some(true);
        const DESCRIPTION: &'static str = "Splice rules from the selected subscription before matching";

        fn parse(value: &str) -> EnvResult<bool> {
            parse_bool(value, Self::NAME)
        }
    }
}

fn parse_bool(value: &str, var_name: &str) -> EnvResult<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" | "enabled" => Ok(true),
        "false" | "0" | "no" | "off" | "disabled" => Ok(false),
        _ => Err(EnvError {
            variable: var_name.to_string(),
            message: format!(
                "Invalid boolean value '{}'. Use: true/false, 1/0, yes/no, on/off, enabled/disabled",
                value
            ),
        }),
    }
}

fn parse_bounded_usize(value: &str, var_name: &str, min: usize, max: usize) -> EnvResult<usize> {
    let num: usize = value.trim().parse().map_err(|_| EnvError {
        variable: var_name.to_string(),
        message: "Must be a valid positive number".to_string(),
    })?;

    if num < min {
        return Err(EnvError {
            variable: var_name.to_string(),
            message: format!("Value {} is below minimum {}", num, min),
        });
    }

    if num > max {
        return Err(EnvError {
            variable: var_name.to_string(),
            message: format!("Value {} exceeds maximum {}", num, max),
        });
    }

    Ok(num)
}

/// 生成环境变量说明文档
pub fn describe_variables() -> Vec<(&'static str, &'static str)> {
    vec![
        (core::LogLevel::NAME, core::LogLevel::DESCRIPTION),
        (setting::MinLength::NAME, setting::MinLength::DESCRIPTION),
        (setting::MaxLength::NAME, setting::MaxLength::DESCRIPTION),
        (setting::MouseKey::NAME, setting::MouseKey::DESCRIPTION),
        (setting::FetchInterval::NAME, setting::FetchInterval::DESCRIPTION),
        (setting::FetchLimit::NAME, setting::FetchLimit::DESCRIPTION),
        (setting::InjectRules::NAME, setting::InjectRules::DESCRIPTION),
    ]
}
