//! 解析器模块
//!
//! - `html`: DOM 解析与操作、标题、序列化、影子根
//! - `selector`: 在 rcdom 树上求值的 CSS 选择器

pub mod html;
pub mod selector;

pub use selector::{SelectorError, SelectorList};
