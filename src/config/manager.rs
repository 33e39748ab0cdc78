//! 配置管理器
//!
//! 提供统一的配置接口，支持文件配置、环境变量和默认值

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::constants;
use super::mode::InteractionMode;
use crate::env::{setting, EnvVar};
use crate::error::{PageLingoError, Result};
use crate::rules::subrules::SubRuleSource;

/// 页面翻译设置
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Setting {
    // 长度门限
    pub min_length: usize,
    pub max_length: usize,

    // 触发方式
    pub mouse_key: InteractionMode,

    // 请求池
    pub fetch_interval_ms: u64,
    pub fetch_limit: usize,

    // 订阅规则
    pub inject_rules: bool,
    pub subrules: Vec<SubRuleSource>,
}

impl Default for Setting {
    fn default() -> Self {
        Self {
            min_length: constants::TRANS_MIN_LENGTH,
            max_length: constants::TRANS_MAX_LENGTH,
            mouse_key: InteractionMode::default(),
            fetch_interval_ms: constants::DEFAULT_FETCH_INTERVAL_MS,
            fetch_limit: constants::DEFAULT_FETCH_LIMIT,
            inject_rules: true,
            subrules: Vec::new(),
        }
    }
}

impl Setting {
    /// 验证配置
    pub fn validate(&self) -> Result<()> {
        if self.max_length == 0 {
            return Err(PageLingoError::Config("最大长度不能为0".to_string()));
        }

        if self.min_length > self.max_length {
            return Err(PageLingoError::Config(format!(
                "最小长度 {} 大于最大长度 {}",
                self.min_length, self.max_length
            )));
        }

        if self.fetch_limit == 0 {
            return Err(PageLingoError::Config("最大并发数不能为0".to_string()));
        }

        if self.subrules.iter().filter(|source| source.selected).count() > 1 {
            tracing::warn!("选中了多个订阅规则，只使用第一个");
        }

        Ok(())
    }

    /// 应用环境变量覆盖
    pub fn apply_env_overrides(&mut self) {
        override_from::<usize, setting::MinLength>(&mut self.min_length);
        override_from::<usize, setting::MaxLength>(&mut self.max_length);
        override_from::<InteractionMode, setting::MouseKey>(&mut self.mouse_key);
        override_from::<usize, setting::FetchLimit>(&mut self.fetch_limit);
        override_from::<bool, setting::InjectRules>(&mut self.inject_rules);

        let mut interval = self.fetch_interval();
        override_from::<Duration, setting::FetchInterval>(&mut interval);
        self.fetch_interval_ms = interval.as_millis() as u64;
    }

    /// 转换为Duration类型
    pub fn fetch_interval(&self) -> Duration {
        Duration::from_millis(self.fetch_interval_ms)
    }

    /// 当前选中的订阅规则来源
    pub fn selected_subrules(&self) -> Option<&SubRuleSource> {
        self.subrules.iter().find(|source| source.selected)
    }
}

/// 仅在变量显式设置时覆盖，无效值记录后忽略
fn override_from<T, V: EnvVar<T>>(target: &mut T) {
    if !V::is_set() {
        return;
    }

    match V::get() {
        Ok(value) => {
            tracing::info!("环境变量覆盖配置: {}", V::NAME);
            *target = value;
        }
        Err(e) => tracing::warn!("忽略无效的环境变量: {}", e),
    }
}

/// 配置管理器
pub struct ConfigManager {
    setting: Setting,
}

impl ConfigManager {
    /// 创建新的配置管理器
    pub fn new() -> Result<Self> {
        let mut setting = Self::load_config()?;
        setting.apply_env_overrides();
        setting.validate()?;

        Ok(Self { setting })
    }

    /// 从指定文件创建配置管理器
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut setting = Self::load_from_file(path.as_ref())?;
        setting.apply_env_overrides();
        setting.validate()?;

        Ok(Self { setting })
    }

    /// 获取配置
    pub fn setting(&self) -> &Setting {
        &self.setting
    }

    pub fn into_setting(self) -> Setting {
        self.setting
    }

    /// 从默认路径加载配置
    fn load_config() -> Result<Setting> {
        Self::load_dotenv();

        for path in constants::CONFIG_PATHS {
            let expanded_path = shellexpand::tilde(path);
            let candidate = Path::new(expanded_path.as_ref());
            if candidate.exists() {
                tracing::info!("加载配置文件: {}", expanded_path);
                return Self::load_from_file(candidate);
            }
        }

        tracing::info!("未找到配置文件，使用默认配置");
        Ok(Setting::default())
    }

    /// 从指定文件加载配置
    pub fn load_from_file(path: &Path) -> Result<Setting> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            PageLingoError::Config(format!("读取配置文件失败 {}: {}", path.display(), e))
        })?;

        let is_toml = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("toml"))
            .unwrap_or(false);

        if is_toml {
            Ok(toml::from_str(&content)?)
        } else {
            Ok(serde_json::from_str(&content)?)
        }
    }

    /// 加载 .env 文件
    fn load_dotenv() {
        for env_file in constants::ENV_FILES {
            if Path::new(env_file).exists() && dotenv::from_filename(env_file).is_ok() {
                tracing::info!("已加载环境变量文件: {}", env_file);
                break;
            }
        }
    }

    /// 生成示例配置文件
    pub fn generate_example_config<P: AsRef<Path>>(path: P) -> Result<()> {
        let content = toml::to_string_pretty(&Setting::default())
            .map_err(|e| PageLingoError::Config(format!("序列化配置失败: {}", e)))?;

        std::fs::write(path, content)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_setting_is_valid() {
        let setting = Setting::default();
        assert!(setting.validate().is_ok());
        assert_eq!(setting.min_length, 5);
        assert_eq!(setting.max_length, 5000);
        assert_eq!(setting.mouse_key, InteractionMode::Disabled);
    }

    #[test]
    fn test_inverted_length_gate_is_rejected() {
        let setting = Setting {
            min_length: 10,
            max_length: 3,
            ..Setting::default()
        };
        assert!(matches!(setting.validate(), Err(PageLingoError::Config(_))));
    }

    #[test]
    fn test_load_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
min_length = 2
mouse_key = "mk_ctrlKey"

[[subrules]]
url = "https://rules.example.com/list.json"
selected = true
"#
        )
        .unwrap();

        let setting = ConfigManager::load_from_file(file.path()).unwrap();
        assert_eq!(setting.min_length, 2);
        assert_eq!(setting.max_length, 5000);
        assert_eq!(
            setting.mouse_key,
            InteractionMode::Hover(crate::config::HoverKey::Ctrl)
        );
        assert_eq!(
            setting.selected_subrules().map(|s| s.url.as_str()),
            Some("https://rules.example.com/list.json")
        );
    }

    #[test]
    fn test_load_json_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"mouse_key": "mk_pageopen", "fetch_limit": 2}}"#).unwrap();

        let setting = ConfigManager::load_from_file(file.path()).unwrap();
        assert_eq!(setting.mouse_key, InteractionMode::PageOpen);
        assert_eq!(setting.fetch_limit, 2);
    }

    #[test]
    fn test_unknown_mode_in_file_fails() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, r#"mouse_key = "hover""#).unwrap();

        assert!(matches!(
            ConfigManager::load_from_file(file.path()),
            Err(PageLingoError::Toml(_))
        ));
    }

    #[test]
    fn test_example_config_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pagelingo.toml");
        ConfigManager::generate_example_config(&path).unwrap();

        let setting = ConfigManager::load_from_file(&path).unwrap();
        assert_eq!(setting, Setting::default());
    }
}
