//! 宿主事件
//!
//! 嵌入环境把页面变化、可见性变化和键鼠事件转换成这些结构交给控制器。

use markup5ever_rcdom::Handle;
use serde::Serialize;

use crate::config::HoverKey;
use crate::rules::ResolvedRule;

/// 子节点变化记录
#[derive(Debug, Clone)]
pub struct MutationRecord {
    pub target: Handle,
    pub added_nodes: Vec<Handle>,
}

impl MutationRecord {
    pub fn child_list(target: &Handle, added_nodes: &[Handle]) -> Self {
        Self {
            target: target.clone(),
            added_nodes: added_nodes.to_vec(),
        }
    }
}

/// 可见性变化
#[derive(Debug, Clone)]
pub struct IntersectionEntry {
    pub target: Handle,
    pub intersection_ratio: f64,
}

impl IntersectionEntry {
    pub fn new(target: &Handle, intersection_ratio: f64) -> Self {
        Self {
            target: target.clone(),
            intersection_ratio,
        }
    }
}

/// 事件发生时按下的修饰键
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        ctrl: false,
        shift: false,
        alt: false,
        meta: false,
    };

    pub fn ctrl() -> Self {
        Self {
            ctrl: true,
            ..Self::NONE
        }
    }

    pub fn shift() -> Self {
        Self {
            shift: true,
            ..Self::NONE
        }
    }

    pub fn alt() -> Self {
        Self {
            alt: true,
            ..Self::NONE
        }
    }

    pub fn meta() -> Self {
        Self {
            meta: true,
            ..Self::NONE
        }
    }

    /// 是否按住了指定的键，`HoverKey::None` 不对应任何键
    pub fn holds(&self, key: HoverKey) -> bool {
        match key {
            HoverKey::None => false,
            HoverKey::Ctrl => self.ctrl,
            HoverKey::Shift => self.shift,
            HoverKey::Alt => self.alt,
            HoverKey::Meta => self.meta,
        }
    }
}

/// 规则变更广播
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", content = "args")]
pub enum RuleEvent {
    CurrentRule(ResolvedRule),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_hover_key_is_never_held() {
        let all = Modifiers {
            ctrl: true,
            shift: true,
            alt: true,
            meta: true,
        };
        assert!(!all.holds(HoverKey::None));
        assert!(all.holds(HoverKey::Meta));
        assert!(Modifiers::alt().holds(HoverKey::Alt));
        assert!(!Modifiers::alt().holds(HoverKey::Ctrl));
    }
}
