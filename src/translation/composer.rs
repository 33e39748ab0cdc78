//! 译文组装
//!
//! 决定一个节点是否需要（重新）翻译，并生成带占位符的原文：
//! 需要保留的子元素和术语表命中的词都替换成 `[i]`，原内容按序号存进 `keeps`。

use std::collections::HashMap;
use std::sync::OnceLock;

use markup5ever_rcdom::{Handle, NodeData};
use regex::{Captures, Regex};
use serde::Serialize;

use super::collaborators::Presenter;
use super::state::TrackedNodes;
use super::{RELAX_LAYOUT_CSS, TRANSLATION_ELEMENT};
use crate::config::Setting;
use crate::parsers::html::{
    append_child, append_style, create_element, get_node_attr, get_node_name, get_parent_node, is_element, outer_html, remove_from_parent, text_content,
};
use crate::parsers::selector::SelectorList;
use crate::rules::{ResolvedRule, SHADOW_KEY};

/// 组装结果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Composition {
    /// 带占位符的原文
    pub text: String,
    /// 占位符 `[i]` 对应的原内容
    pub keeps: Vec<String>,
}

/// 跳过翻译的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// 已有译文且原文未变
    Unchanged,
    Empty,
    TooShort,
    TooLong,
}

/// 一次渲染的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Render {
    Skipped(SkipReason),
    Mounted,
}

/// 保留选择器
///
/// 写作 `匹配选择器 >>> 包含选择器`：子元素自身匹配前者，或者内部含有匹配后者的元素，
/// 就原样保留。
#[derive(Debug, Clone, Default)]
pub struct KeepSelector {
    matches: Option<SelectorList>,
    contains: Option<SelectorList>,
}

impl KeepSelector {
    pub fn parse(raw: &str) -> Self {
        let (matches, contains) = match raw.split_once(SHADOW_KEY) {
            Some((matches, contains)) => (matches, contains),
            None => (raw, ""),
        };

        Self {
            matches: compile_keep(matches),
            contains: compile_keep(contains),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_none() && self.contains.is_none()
    }

    fn keeps(&self, child: &Handle) -> bool {
        self.matches.as_ref().is_some_and(|list| list.matches(child))
            || self
                .contains
                .as_ref()
                .is_some_and(|list| list.query_first(child).is_some())
    }
}

fn compile_keep(selector: &str) -> Option<SelectorList> {
    let selector = selector.trim();
    if selector.is_empty() {
        return None;
    }
    match SelectorList::parse(selector) {
        Ok(list) => Some(list),
        Err(e) => {
            tracing::warn!("忽略无效的保留选择器: {}", e);
            None
        }
    }
}

/// 术语表
///
/// 每行（或 `;` 分隔）一条 `术语,替换`，替换为空时保留术语原文。
#[derive(Debug, Clone, Default)]
pub struct Glossary {
    pattern: Option<Regex>,
    replacements: HashMap<String, String>,
}

impl Glossary {
    pub fn parse(terms: &str) -> Self {
        let mut order = Vec::new();
        let mut replacements = HashMap::new();

        for entry in terms.split(['\n', ';']) {
            let mut parts = entry.split(',').map(str::trim);
            let term = parts.next().unwrap_or_default();
            if term.is_empty() {
                continue;
            }
            let replacement = parts.next().unwrap_or_default().to_string();
            if replacements.insert(term.to_string(), replacement).is_none() {
                order.push(regex::escape(term));
            }
        }

        if order.is_empty() {
            return Self::default();
        }

        let pattern = match Regex::new(&order.join("|")) {
            Ok(re) => Some(re),
            Err(e) => {
                tracing::warn!("术语表无法编译，已忽略: {}", e);
                None
            }
        };

        Self {
            pattern,
            replacements,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pattern.is_none()
    }

    pub fn len(&self) -> usize {
        self.replacements.len()
    }

    /// 把命中的术语替换成占位符
    pub fn substitute(&self, text: &str, keeps: &mut Vec<String>) -> String {
        let Some(pattern) = &self.pattern else {
            return text.to_string();
        };

        pattern
            .replace_all(text, |caps: &Captures| {
                let term = &caps[0];
                let placeholder = format!("[{}]", keeps.len());
                let replacement = match self.replacements.get(term) {
                    Some(replacement) if !replacement.is_empty() => replacement.clone(),
                    _ => term.to_string(),
                };
                keeps.push(replacement);
                placeholder
            })
            .into_owned()
    }
}

/// 译文组装器
#[derive(Debug, Clone)]
pub struct TextComposer {
    keep: KeepSelector,
    glossary: Glossary,
    min_length: usize,
    max_length: usize,
}

impl TextComposer {
    pub fn new(rule: &ResolvedRule, setting: &Setting) -> Self {
        Self {
            keep: KeepSelector::parse(&rule.keep_selector),
            glossary: Glossary::parse(&rule.terms),
            min_length: setting.min_length,
            max_length: setting.max_length,
        }
    }

    /// 按节点当前内容组装原文，不修改跟踪状态
    pub fn compose(&self, element: &Handle) -> Result<Composition, SkipReason> {
        let text = text_content(element).trim().to_string();
        self.compose_text(element, text)
    }

    fn compose_text(&self, element: &Handle, text: String) -> Result<Composition, SkipReason> {
        let mut keeps = Vec::new();
        let mut text = text;

        if !self.keep.is_empty() {
            let rebuilt = self.extract_keeps(element, &mut keeps);
            if !keeps.is_empty() {
                text = rebuilt.trim().to_string();
            }
        }

        self.check_length(&text)?;

        if !self.glossary.is_empty() {
            text = self.glossary.substitute(&text, &mut keeps);
        }

        Ok(Composition { text, keeps })
    }

    /// 直接子节点里需要保留的元素换成占位符，其余贡献文本
    fn extract_keeps(&self, element: &Handle, keeps: &mut Vec<String>) -> String {
        let mut text = String::new();
        let children: Vec<Handle> = element.children.borrow().clone();

        for child in &children {
            match &child.data {
                NodeData::Element { .. } if self.keep.keeps(child) => {
                    if get_node_name(child) == Some("img") {
                        pin_image_size(child);
                    }
                    text.push_str(&format!("[{}]", keeps.len()));
                    keeps.push(outer_html(child));
                }
                NodeData::Element { .. } => text.push_str(&text_content(child)),
                NodeData::Text { contents } => text.push_str(&contents.borrow()),
                _ => {}
            }
        }

        text
    }

    fn check_length(&self, text: &str) -> Result<(), SkipReason> {
        let bare = placeholder_regex().replace_all(text, "");
        let length = bare.trim().chars().count();

        if length == 0 {
            Err(SkipReason::Empty)
        } else if length < self.min_length {
            Err(SkipReason::TooShort)
        } else if length > self.max_length {
            Err(SkipReason::TooLong)
        } else {
            Ok(())
        }
    }

    /// 翻译一个节点：检查是否过期，组装原文，插入译文元素并交给展示组件
    pub fn render(
        &self,
        element: &Handle,
        tracked: &mut TrackedNodes,
        presenter: &dyn Presenter,
        rule: &ResolvedRule,
    ) -> Render {
        if let Some(existing) = translation_child(element) {
            let previous = tracked.text(element).unwrap_or_default();
            let current = text_content(element);
            if current.trim().starts_with(previous) {
                return Render::Skipped(SkipReason::Unchanged);
            }
            remove_from_parent(&existing);
        }

        let text = text_content(element).trim().to_string();
        tracked.set_text(element, text.clone());

        let composition = match self.compose_text(element, text) {
            Ok(composition) => composition,
            Err(reason) => return Render::Skipped(reason),
        };

        let translation = create_element(TRANSLATION_ELEMENT, &[("style", "visibility: visible;")]);
        append_child(element, &translation);
        append_style(element, RELAX_LAYOUT_CSS);
        if let Some(parent) = get_parent_node(element).filter(is_element) {
            append_style(&parent, RELAX_LAYOUT_CSS);
        }

        presenter.mount(&translation, &composition, rule);
        Render::Mounted
    }
}

/// 节点自己的译文元素（只看直接子节点）
pub fn translation_child(element: &Handle) -> Option<Handle> {
    element
        .children
        .borrow()
        .iter()
        .find(|child| get_node_name(child) == Some(TRANSLATION_ELEMENT))
        .cloned()
}

/// 图片按属性里的宽高固定像素尺寸
fn pin_image_size(img: &Handle) {
    for dimension in ["width", "height"] {
        let value = get_node_attr(img, dimension).and_then(|v| v.trim().parse::<u32>().ok());
        if let Some(pixels) = value {
            append_style(img, &format!("{}: {}px;", dimension, pixels));
        }
    }
}

/// 占位符 `[i]`
fn placeholder_regex() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER
        .get_or_init(|| Regex::new(r"\[(\d+)\]").expect("placeholder pattern is valid"))
}
