//! 影子根处理
//!
//! rcdom 没有原生的影子根，这里采用声明式影子 DOM 的表示：宿主元素的直接子元素
//! `<template shadowrootmode="open">` 的 `template_contents` 片段就是影子根。
//! 普通的子树遍历不会进入 template 内容，因此影子内容对普通查询不可见。

use markup5ever_rcdom::{Handle, Node, NodeData};

use super::dom::{append_child, create_element, get_node_attr, get_node_name};

/// 声明影子根的 template 属性（含旧版写法）
const SHADOW_MODE_ATTRS: &[&str] = &["shadowrootmode", "shadowroot"];

fn is_shadow_template(node: &Handle) -> bool {
    get_node_name(node) == Some("template")
        && SHADOW_MODE_ATTRS
            .iter()
            .any(|attr| get_node_attr(node, attr).is_some())
}

/// 获取宿主元素的影子根
pub fn shadow_root(host: &Handle) -> Option<Handle> {
    let children = host.children.borrow();
    children
        .iter()
        .filter(|child| is_shadow_template(child))
        .find_map(|template| match &template.data {
            NodeData::Element {
                template_contents, ..
            } => template_contents.borrow().clone(),
            _ => None,
        })
}

/// 为宿主元素附加一个开放的影子根，已存在时直接返回
pub fn attach_shadow(host: &Handle) -> Handle {
    if let Some(existing) = shadow_root(host) {
        return existing;
    }

    let template = create_element("template", &[("shadowrootmode", "open")]);
    let fragment = Node::new(NodeData::Document);
    if let NodeData::Element {
        template_contents, ..
    } = &template.data
    {
        *template_contents.borrow_mut() = Some(fragment.clone());
    }
    append_child(host, &template);

    fragment
}

/// 是否为影子根宿主
pub fn is_shadow_host(node: &Handle) -> bool {
    shadow_root(node).is_some()
}
