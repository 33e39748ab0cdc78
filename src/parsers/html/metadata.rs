//! HTML 文档元数据处理模块
//!
//! 页面标题的读取和改写。注册时标题会被翻译并带上固定后缀，
//! 注销时再恢复成原始标题。

use markup5ever_rcdom::{Handle, NodeData};

use super::dom::{append_child, create_text, find_element_by_name};

/// 获取文档标题
///
/// 从文档的第一个 `<title>` 标签中提取文本内容。
///
/// # 返回值
///
/// * `Some(String)` - 找到 title 标签时返回其文本（可能为空字符串）
/// * `None` - 文档没有 title 标签
pub fn get_title(document: &Handle) -> Option<String> {
    let title_node = find_element_by_name(document, "title")?;
    let mut title = String::new();
    for child_node in title_node.children.borrow().iter() {
        if let NodeData::Text { ref contents } = child_node.data {
            title.push_str(&contents.borrow());
        }
    }
    Some(title)
}

/// 设置文档标题
///
/// 替换第一个 `<title>` 标签的全部子节点。文档没有 title 标签时不做任何事，
/// 返回是否写入成功。
pub fn set_title(document: &Handle, title: &str) -> bool {
    let Some(title_node) = find_element_by_name(document, "title") else {
        return false;
    };

    let old_children: Vec<Handle> = title_node.children.borrow_mut().drain(..).collect();
    for child in old_children {
        child.parent.set(None);
    }
    append_child(&title_node, &create_text(title));

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::html::dom::html_to_dom;

    #[test]
    fn read_and_replace_title() {
        let dom = html_to_dom(
            b"<html><head><title>Hello</title></head><body></body></html>",
            "utf-8",
        )
        .unwrap();

        assert_eq!(get_title(&dom.document).as_deref(), Some("Hello"));
        assert!(set_title(&dom.document, "你好 | Hello"));
        assert_eq!(get_title(&dom.document).as_deref(), Some("你好 | Hello"));
    }

    #[test]
    fn missing_title_is_left_alone() {
        let dom = html_to_dom(b"<p>no title here</p>", "utf-8").unwrap();
        assert_eq!(get_title(&dom.document), None);
        assert!(!set_title(&dom.document, "x"));
    }
}
