//! 配置管理模块
//!
//! 提供页面翻译行为的配置，支持配置文件、环境变量和默认值

pub mod manager;
pub mod mode;

// 重新导出主要类型
pub use manager::{ConfigManager, Setting};
pub use mode::{HoverKey, InteractionMode};

/// 配置常量
pub mod constants {
    // 长度门限
    pub const TRANS_MIN_LENGTH: usize = 5;
    pub const TRANS_MAX_LENGTH: usize = 5000;

    // 请求池
    pub const DEFAULT_FETCH_INTERVAL_MS: u64 = 100;
    pub const DEFAULT_FETCH_LIMIT: usize = 5;

    // 配置文件搜索路径
    pub const CONFIG_PATHS: &[&str] = &[
        "pagelingo.toml",
        ".pagelingo.toml",
        "~/.config/pagelingo/config.toml",
    ];

    // 环境变量文件
    pub const ENV_FILES: &[&str] = &[".env.local", ".env"];
}

/// 加载配置，失败时退回默认配置
pub fn load_setting() -> Setting {
    match ConfigManager::new() {
        Ok(manager) => manager.into_setting(),
        Err(e) => {
            tracing::warn!("配置加载失败，使用默认配置: {}", e);
            Setting::default()
        }
    }
}
