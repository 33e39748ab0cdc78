//! 扫描状态
//!
//! 一次注册期间发现的待翻译节点和被观察的根节点。注销时整体清空。

use std::collections::{HashMap, HashSet};
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use markup5ever_rcdom::Handle;

use crate::parsers::html::root_of;

/// 以指针身份比较的节点键
#[derive(Clone)]
pub struct NodeKey(Handle);

impl NodeKey {
    pub fn new(node: &Handle) -> Self {
        Self(node.clone())
    }

    pub fn handle(&self) -> &Handle {
        &self.0
    }
}

impl PartialEq for NodeKey {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for NodeKey {}

impl Hash for NodeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Rc::as_ptr(&self.0).hash(state);
    }
}

impl std::fmt::Debug for NodeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "NodeKey({:p})", Rc::as_ptr(&self.0))
    }
}

/// 节点集合
#[derive(Debug, Default, Clone)]
pub struct NodeSet(HashSet<NodeKey>);

impl NodeSet {
    pub fn insert(&mut self, node: &Handle) -> bool {
        self.0.insert(NodeKey::new(node))
    }

    pub fn remove(&mut self, node: &Handle) -> bool {
        self.0.remove(&NodeKey::new(node))
    }

    pub fn contains(&self, node: &Handle) -> bool {
        self.0.contains(&NodeKey::new(node))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}

/// 待翻译节点，按插入顺序记录，并保存每个节点上次翻译时的原文
#[derive(Debug, Default)]
pub struct TrackedNodes {
    order: Vec<Handle>,
    texts: HashMap<NodeKey, String>,
}

impl TrackedNodes {
    /// 节点不存在时插入，已存在时不改动记录的原文
    pub fn insert(&mut self, node: &Handle) -> bool {
        let key = NodeKey::new(node);
        if self.texts.contains_key(&key) {
            return false;
        }
        self.texts.insert(key, String::new());
        self.order.push(node.clone());
        true
    }

    pub fn contains(&self, node: &Handle) -> bool {
        self.texts.contains_key(&NodeKey::new(node))
    }

    /// 上次翻译时记录的原文
    pub fn text(&self, node: &Handle) -> Option<&str> {
        self.texts.get(&NodeKey::new(node)).map(String::as_str)
    }

    /// 记录原文，节点未被跟踪时同时插入
    pub fn set_text(&mut self, node: &Handle, text: String) {
        self.insert(node);
        self.texts.insert(NodeKey::new(node), text);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Handle> {
        self.order.iter()
    }

    /// 节点快照，遍历期间可以修改状态
    pub fn nodes(&self) -> Vec<Handle> {
        self.order.clone()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.texts.clear();
    }
}

/// 一次注册的扫描状态
#[derive(Debug, Default)]
pub struct ScanState {
    pub tracked: TrackedNodes,
    roots: Vec<Handle>,
    root_set: NodeSet,
}

impl ScanState {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录一个被观察的根节点（文档或影子根）
    pub fn add_root(&mut self, root: &Handle) -> bool {
        if !self.root_set.insert(root) {
            return false;
        }
        self.roots.push(root.clone());
        true
    }

    pub fn roots(&self) -> &[Handle] {
        &self.roots
    }

    pub fn is_root(&self, node: &Handle) -> bool {
        self.root_set.contains(node)
    }

    /// 节点是否位于某个被记录的根之下
    pub fn is_under_root(&self, node: &Handle) -> bool {
        self.is_root(&root_of(node))
    }

    pub fn clear(&mut self) {
        self.tracked.clear();
        self.roots.clear();
        self.root_set.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::html::{create_element, html_to_dom};

    #[test]
    fn tracked_insert_is_idempotent_and_ordered() {
        let a = create_element("p", &[]);
        let b = create_element("p", &[]);
        let mut tracked = TrackedNodes::default();

        assert!(tracked.insert(&a));
        assert!(tracked.insert(&b));
        tracked.set_text(&a, "hello".to_string());
        assert!(!tracked.insert(&a));

        assert_eq!(tracked.len(), 2);
        assert_eq!(tracked.text(&a), Some("hello"));
        assert_eq!(tracked.text(&b), Some(""));
        assert!(Rc::ptr_eq(&tracked.nodes()[0], &a));
    }

    #[test]
    fn structurally_equal_nodes_are_distinct() {
        let mut set = NodeSet::default();
        assert!(set.insert(&create_element("p", &[])));
        assert!(set.insert(&create_element("p", &[])));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn roots_are_recorded_once() {
        let dom = html_to_dom(b"<p>x</p>", "utf-8").unwrap();
        let mut state = ScanState::new();
        assert!(state.add_root(&dom.document));
        assert!(!state.add_root(&dom.document));
        assert_eq!(state.roots().len(), 1);

        let detached = create_element("div", &[]);
        assert!(!state.is_under_root(&detached));

        state.clear();
        assert!(state.roots().is_empty());
        assert!(state.tracked.is_empty());
    }
}
