use std::cell::RefCell;
use std::rc::Rc;

use encoding_rs::Encoding;
use html5ever::interface::{Attribute, QualName};
use html5ever::parse_document;
use html5ever::tendril::{format_tendril, StrTendril, TendrilSink};
use html5ever::{namespace_url, ns, LocalName};
use markup5ever_rcdom::{Handle, Node, NodeData, RcDom};

/// 计算文本内容时跳过的元素
const NON_TEXT_ELEMENTS: &[&str] = &["script", "style", "template", "noscript"];

/// 将 HTML 字节转换为 DOM
pub fn html_to_dom(data: &[u8], document_encoding: &str) -> std::io::Result<RcDom> {
    let s: String = match Encoding::for_label(document_encoding.as_bytes()) {
        Some(encoding) => encoding.decode(data).0.to_string(),
        None => String::from_utf8_lossy(data).to_string(),
    };

    parse_document(RcDom::default(), Default::default())
        .from_utf8()
        .read_from(&mut s.as_bytes())
}

/// 获取节点属性值
pub fn get_node_attr(node: &Handle, attr_name: &str) -> Option<String> {
    match &node.data {
        NodeData::Element { attrs, .. } => attrs
            .borrow()
            .iter()
            .find(|attr| &*attr.name.local == attr_name)
            .map(|attr| attr.value.to_string()),
        _ => None,
    }
}

/// 获取节点名称
pub fn get_node_name(node: &Handle) -> Option<&'_ str> {
    match &node.data {
        NodeData::Element { name, .. } => Some(name.local.as_ref()),
        _ => None,
    }
}

pub fn is_element(node: &Handle) -> bool {
    matches!(node.data, NodeData::Element { .. })
}

/// 设置节点属性，`None` 表示移除
pub fn set_node_attr(node: &Handle, attr_name: &str, attr_value: Option<String>) {
    if let NodeData::Element { attrs, .. } = &node.data {
        let attrs_mut = &mut attrs.borrow_mut();
        let mut i = 0;
        let mut found_existing_attr: bool = false;

        while i < attrs_mut.len() {
            if &attrs_mut[i].name.local == attr_name {
                found_existing_attr = true;

                if let Some(attr_value) = attr_value.as_deref() {
                    attrs_mut[i].value.clear();
                    attrs_mut[i].value.push_slice(attr_value);
                } else {
                    attrs_mut.remove(i);
                    continue;
                }
            }

            i += 1;
        }

        if !found_existing_attr {
            if let Some(attr_value) = attr_value {
                attrs_mut.push(Attribute {
                    name: QualName::new(None, ns!(), LocalName::from(attr_name)),
                    value: format_tendril!("{}", attr_value),
                });
            }
        }
    };
}

/// 在元素的 style 属性后追加声明
pub fn append_style(node: &Handle, css: &str) {
    let mut style = get_node_attr(node, "style").unwrap_or_default();
    let trimmed_len = style.trim_end().len();
    style.truncate(trimmed_len);
    if !style.is_empty() && !style.ends_with(';') {
        style.push(';');
    }
    if !style.is_empty() {
        style.push(' ');
    }
    style.push_str(css);
    set_node_attr(node, "style", Some(style));
}

/// 创建一个游离的元素节点
pub fn create_element(name: &str, attrs: &[(&str, &str)]) -> Handle {
    Node::new(NodeData::Element {
        name: QualName::new(None, ns!(html), LocalName::from(name)),
        attrs: RefCell::new(
            attrs
                .iter()
                .map(|(key, value)| Attribute {
                    name: QualName::new(None, ns!(), LocalName::from(*key)),
                    value: StrTendril::from(*value),
                })
                .collect(),
        ),
        template_contents: RefCell::new(None),
        mathml_annotation_xml_integration_point: false,
    })
}

/// 创建一个游离的文本节点
pub fn create_text(text: &str) -> Handle {
    Node::new(NodeData::Text {
        contents: RefCell::new(StrTendril::from(text)),
    })
}

/// 获取父节点
///
/// `parent` 是 `Cell<Option<Weak>>`，读取时需要取出再放回。
pub fn get_parent_node(child: &Handle) -> Option<Handle> {
    let weak = child.parent.take();
    let parent = weak.as_ref().and_then(|node| node.upgrade());
    child.parent.set(weak);
    parent
}

/// 将节点追加为 `parent` 的最后一个子节点
pub fn append_child(parent: &Handle, child: &Handle) {
    remove_from_parent(child);
    child.parent.set(Some(Rc::downgrade(parent)));
    parent.children.borrow_mut().push(child.clone());
}

/// 把节点从父节点中摘除
pub fn remove_from_parent(node: &Handle) {
    if let Some(parent) = get_parent_node(node) {
        parent
            .children
            .borrow_mut()
            .retain(|child| !Rc::ptr_eq(child, node));
    }
    node.parent.set(None);
}

/// 节点所在树的根（文档节点或影子根）
pub fn root_of(node: &Handle) -> Handle {
    let mut current = node.clone();
    while let Some(parent) = get_parent_node(&current) {
        current = parent;
    }
    current
}

/// `ancestor` 是否是 `node` 的真祖先
pub fn is_ancestor_of(ancestor: &Handle, node: &Handle) -> bool {
    let mut current = get_parent_node(node);
    while let Some(parent) = current {
        if Rc::ptr_eq(&parent, ancestor) {
            return true;
        }
        current = get_parent_node(&parent);
    }
    false
}

/// 按文档顺序列出 `root` 下的所有后代元素（不含 `root` 本身，不进入 template 内容）
pub fn descendant_elements(root: &Handle) -> Vec<Handle> {
    let mut found = Vec::new();
    let mut stack: Vec<Handle> = root.children.borrow().iter().rev().cloned().collect();

    while let Some(node) = stack.pop() {
        if is_element(&node) {
            found.push(node.clone());
        }
        stack.extend(node.children.borrow().iter().rev().cloned());
    }

    found
}

/// 按文档顺序查找第一个满足条件的后代元素
pub fn find_descendant<F>(root: &Handle, predicate: F) -> Option<Handle>
where
    F: Fn(&Handle) -> bool,
{
    let mut stack: Vec<Handle> = root.children.borrow().iter().rev().cloned().collect();

    while let Some(node) = stack.pop() {
        if is_element(&node) && predicate(&node) {
            return Some(node);
        }
        stack.extend(node.children.borrow().iter().rev().cloned());
    }

    None
}

/// 根据名称查找第一个后代元素
pub fn find_element_by_name(root: &Handle, node_name: &str) -> Option<Handle> {
    find_descendant(root, |node| get_node_name(node) == Some(node_name))
}

/// 节点的文本内容
///
/// 跳过脚本、样式和 template（影子根）中的文本，近似浏览器中的 innerText。
pub fn text_content(node: &Handle) -> String {
    let mut text = String::new();
    let mut stack = vec![node.clone()];

    while let Some(current) = stack.pop() {
        match &current.data {
            NodeData::Text { contents } => text.push_str(&contents.borrow()),
            NodeData::Element { name, .. } if NON_TEXT_ELEMENTS.contains(&&*name.local) => {}
            _ => stack.extend(current.children.borrow().iter().rev().cloned()),
        }
    }

    text
}
