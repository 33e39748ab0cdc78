//! HTML解析和处理模块
//!
//! - `dom`: 基础DOM操作
//! - `metadata`: 文档标题处理
//! - `serializer`: 序列化功能
//! - `shadow`: 影子根的表示与访问

pub mod dom;
pub mod metadata;
pub mod serializer;
pub mod shadow;

pub use dom::{
    append_child, append_style, create_element, create_text, descendant_elements,
    find_descendant, find_element_by_name, get_node_attr, get_node_name, get_parent_node,
    html_to_dom, is_ancestor_of, is_element, remove_from_parent, root_of, set_node_attr,
    text_content,
};
pub use metadata::{get_title, set_title};
pub use serializer::{outer_html, serialize_document};
pub use shadow::{attach_shadow, is_shadow_host, shadow_root};
