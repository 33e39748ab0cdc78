//! 触发方式
//!
//! 决定已发现的节点在什么时机被翻译：进入视口、页面打开即翻译，
//! 或者鼠标悬停（可附加按住修饰键的条件）。

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// 悬停模式下需要按住的修饰键
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HoverKey {
    /// 仅悬停即可
    None,
    Ctrl,
    Shift,
    Alt,
    Meta,
}

/// 触发方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum InteractionMode {
    /// 节点进入视口时翻译
    #[default]
    Disabled,
    /// 页面打开即翻译全部节点
    PageOpen,
    /// 鼠标悬停时翻译
    Hover(HoverKey),
}

impl InteractionMode {
    pub fn from_key(key: &str) -> Option<Self> {
        let mode = match key {
            "mk_disable" => InteractionMode::Disabled,
            "mk_pageopen" => InteractionMode::PageOpen,
            "mk_mouseover" => InteractionMode::Hover(HoverKey::None),
            "mk_ctrlKey" => InteractionMode::Hover(HoverKey::Ctrl),
            "mk_shiftKey" => InteractionMode::Hover(HoverKey::Shift),
            "mk_altKey" => InteractionMode::Hover(HoverKey::Alt),
            "mk_metaKey" => InteractionMode::Hover(HoverKey::Meta),
            _ => return None,
        };
        Some(mode)
    }

    pub fn as_key(&self) -> &'static str {
        match self {
            InteractionMode::Disabled => "mk_disable",
            InteractionMode::PageOpen => "mk_pageopen",
            InteractionMode::Hover(HoverKey::None) => "mk_mouseover",
            InteractionMode::Hover(HoverKey::Ctrl) => "mk_ctrlKey",
            InteractionMode::Hover(HoverKey::Shift) => "mk_shiftKey",
            InteractionMode::Hover(HoverKey::Alt) => "mk_altKey",
            InteractionMode::Hover(HoverKey::Meta) => "mk_metaKey",
        }
    }
}

impl fmt::Display for InteractionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_key())
    }
}

impl Serialize for InteractionMode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_key())
    }
}

impl<'de> Deserialize<'de> for InteractionMode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let key = String::deserialize(deserializer)?;
        InteractionMode::from_key(&key)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown trigger mode '{}'", key)))
    }
}
