//! 规则数据模型
//!
//! `Rule` 是持久化/导入的原始规则，五个可继承字段可以取全局标记 `global`；
//! `ResolvedRule` 是针对某个页面解析后的结果，所有字段都是具体值。

use serde::{Serialize, Serializer};

/// 全局继承标记
pub const GLOBAL_KEY: &str = "global";

/// 穿透影子根的分隔符
pub const SHADOW_KEY: &str = ">>>";

/// 匹配所有页面的模式
pub const GLOBAL_PATTERN: &str = "*";

/// 内置默认选择器
pub const DEFAULT_SELECTOR: &str = "li, p, h1, h2, h3, h4, h5, h6, dd, blockquote, figcaption";

/// 内置默认保留选择器
pub const DEFAULT_KEEP_SELECTOR: &str = "code, img, svg, pre";

/// 可枚举配置值的字符串形式
pub trait AsKey {
    fn as_key(&self) -> &'static str;
}

impl AsKey for bool {
    fn as_key(&self) -> &'static str {
        if *self {
            "true"
        } else {
            "false"
        }
    }
}

/// 解析 `"true"` / `"false"`
pub fn parse_bool_key(value: &str) -> Option<bool> {
    match value {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

/// 可以继承全局规则的字段值
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Inherit<T> {
    Global,
    Value(T),
}

impl<T: Copy> Inherit<T> {
    /// 校验原始值：全局标记、合法值，其余一律退回全局标记
    pub fn from_raw<F>(raw: Option<&str>, parse: F) -> Self
    where
        F: Fn(&str) -> Option<T>,
    {
        match raw {
            Some(GLOBAL_KEY) => Inherit::Global,
            Some(value) => parse(value).map(Inherit::Value).unwrap_or(Inherit::Global),
            None => Inherit::Global,
        }
    }

    /// 具体值，全局标记时取 `global`
    pub fn or_inherit(self, global: T) -> T {
        match self {
            Inherit::Global => global,
            Inherit::Value(value) => value,
        }
    }

    pub fn is_global(&self) -> bool {
        matches!(self, Inherit::Global)
    }
}

impl<T: AsKey> Serialize for Inherit<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Inherit::Global => serializer.serialize_str(GLOBAL_KEY),
            Inherit::Value(value) => serializer.serialize_str(value.as_key()),
        }
    }
}

fn serialize_key<T: AsKey, S: Serializer>(value: &T, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(value.as_key())
}

/// 翻译服务
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Translator {
    Google,
    Microsoft,
    OpenAI,
}

impl Translator {
    pub const ALL: [Translator; 3] = [Translator::Google, Translator::Microsoft, Translator::OpenAI];

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_key() == value)
    }
}

impl AsKey for Translator {
    fn as_key(&self) -> &'static str {
        match self {
            Translator::Google => "Google",
            Translator::Microsoft => "Microsoft",
            Translator::OpenAI => "OpenAI",
        }
    }
}

/// 译文样式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextStyle {
    Plain,
    Underline,
    DotLine,
    DashLine,
    WavyLine,
    Fuzzy,
    Highlight,
}

impl TextStyle {
    pub const ALL: [TextStyle; 7] = [
        TextStyle::Plain,
        TextStyle::Underline,
        TextStyle::DotLine,
        TextStyle::DashLine,
        TextStyle::WavyLine,
        TextStyle::Fuzzy,
        TextStyle::Highlight,
    ];

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_key() == value)
    }
}

impl AsKey for TextStyle {
    fn as_key(&self) -> &'static str {
        match self {
            TextStyle::Plain => "none",
            TextStyle::Underline => "underline",
            TextStyle::DotLine => "dot_line",
            TextStyle::DashLine => "dash_line",
            TextStyle::WavyLine => "wavy_line",
            TextStyle::Fuzzy => "fuzzy",
            TextStyle::Highlight => "highlight",
        }
    }
}

/// 可作为翻译目标的语言
const TARGET_LANGS: &[&str] = &[
    "en", "zh-CN", "zh-TW", "ar", "bg", "ca", "hr", "cs", "da", "nl", "fi", "fr", "de", "el",
    "hi", "hu", "id", "it", "ja", "ko", "ms", "mt", "nb", "pl", "pt", "ro", "ru", "sl", "es",
    "sv", "ta", "te", "th", "tr", "uk", "vi",
];

/// 语言代码
///
/// 源语言额外允许 `auto`（自动检测），目标语言不允许。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Lang(&'static str);

impl Lang {
    pub const AUTO: Lang = Lang("auto");
    pub const ZH_CN: Lang = Lang("zh-CN");
    pub const EN: Lang = Lang("en");

    /// 校验源语言
    pub fn source(code: &str) -> Option<Self> {
        if code == Self::AUTO.0 {
            Some(Self::AUTO)
        } else {
            Self::target(code)
        }
    }

    /// 校验目标语言
    pub fn target(code: &str) -> Option<Self> {
        TARGET_LANGS
            .iter()
            .find(|lang| **lang == code)
            .map(|lang| Lang(lang))
    }

    pub fn code(&self) -> &'static str {
        self.0
    }
}

impl AsKey for Lang {
    fn as_key(&self) -> &'static str {
        self.0
    }
}

/// 原始规则
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    pub pattern: String,
    pub selector: String,
    pub bg_color: String,
    pub translator: Inherit<Translator>,
    pub from_lang: Inherit<Lang>,
    pub to_lang: Inherit<Lang>,
    pub text_style: Inherit<TextStyle>,
    pub trans_open: Inherit<bool>,
    pub keep_selector: String,
    pub terms: String,
}

impl Rule {
    /// 只有模式、其余字段全部继承的站点规则
    pub fn for_pattern(pattern: &str) -> Self {
        Self {
            pattern: pattern.trim().to_string(),
            selector: String::new(),
            bg_color: String::new(),
            translator: Inherit::Global,
            from_lang: Inherit::Global,
            to_lang: Inherit::Global,
            text_style: Inherit::Global,
            trans_open: Inherit::Global,
            keep_selector: String::new(),
            terms: String::new(),
        }
    }

    /// 内置全局规则
    pub fn builtin_global() -> Self {
        Self {
            pattern: GLOBAL_PATTERN.to_string(),
            selector: DEFAULT_SELECTOR.to_string(),
            bg_color: String::new(),
            translator: Inherit::Value(Translator::Google),
            from_lang: Inherit::Value(Lang::AUTO),
            to_lang: Inherit::Value(Lang::ZH_CN),
            text_style: Inherit::Value(TextStyle::Plain),
            trans_open: Inherit::Value(false),
            keep_selector: DEFAULT_KEEP_SELECTOR.to_string(),
            terms: String::new(),
        }
    }

    /// 逗号分隔的模式片段（已去除首尾空白）
    pub fn pattern_fragments(&self) -> impl Iterator<Item = &str> {
        self.pattern.split(',').map(str::trim)
    }

    /// 是否为全局规则
    pub fn is_global(&self) -> bool {
        self.pattern_fragments().any(|p| p == GLOBAL_PATTERN)
    }
}

/// 解析后的规则，所有字段都是具体值
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedRule {
    pub pattern: String,
    pub selector: String,
    pub bg_color: String,
    #[serde(serialize_with = "serialize_key")]
    pub translator: Translator,
    #[serde(serialize_with = "serialize_key")]
    pub from_lang: Lang,
    #[serde(serialize_with = "serialize_key")]
    pub to_lang: Lang,
    #[serde(serialize_with = "serialize_key")]
    pub text_style: TextStyle,
    #[serde(serialize_with = "serialize_key")]
    pub trans_open: bool,
    pub keep_selector: String,
    pub terms: String,
}

impl ResolvedRule {
    /// 源语言与目标语言相同，无需翻译
    pub fn is_same_lang(&self) -> bool {
        self.from_lang == self.to_lang
    }

    /// 转回可持久化的规则
    pub fn to_rule(&self) -> Rule {
        Rule {
            pattern: self.pattern.clone(),
            selector: self.selector.clone(),
            bg_color: self.bg_color.clone(),
            translator: Inherit::Value(self.translator),
            from_lang: Inherit::Value(self.from_lang),
            to_lang: Inherit::Value(self.to_lang),
            text_style: Inherit::Value(self.text_style),
            trans_open: Inherit::Value(self.trans_open),
            keep_selector: self.keep_selector.clone(),
            terms: self.terms.clone(),
        }
    }
}
