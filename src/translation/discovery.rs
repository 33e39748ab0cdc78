//! 节点发现
//!
//! 按规则的 `selector` 找出需要翻译的最小节点集合，并穿透影子根。
//!
//! - `;` 分隔多个子句，结果取并集
//! - 含 `>>>` 的子句：先在当前根里查询外层部分，再把内层部分带进每个命中元素的影子根
//! - 不含 `>>>` 的子句：直接查询，只保留内部没有其他命中的元素（叶子规则）
//! - 另外，每个根里所有影子宿主的影子根都会用同一组子句再扫描一遍
//!
//! 遍历使用显式工作队列，影子嵌套超过上限的根会被跳过。

use std::collections::{HashSet, VecDeque};
use std::rc::Rc;

use markup5ever_rcdom::Handle;

use super::state::{NodeSet, ScanState};
use super::MAX_SHADOW_DEPTH;
use crate::parsers::html::{descendant_elements, get_parent_node, shadow_root};
use crate::parsers::selector::SelectorList;
use crate::rules::SHADOW_KEY;

/// 一次扫描的统计
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DiscoveryStats {
    /// 扫描过的根（文档与影子根）
    pub roots: usize,
    /// 新加入跟踪的节点
    pub added: usize,
    /// 无效子句次数
    pub invalid_clauses: usize,
    /// 因嵌套过深而跳过的根
    pub skipped_roots: usize,
}

struct Task {
    root: Handle,
    clauses: Rc<[String]>,
    depth: usize,
}

/// 节点选择器
#[derive(Debug, Clone, Copy)]
pub struct NodeSelector {
    max_depth: usize,
}

impl Default for NodeSelector {
    fn default() -> Self {
        Self {
            max_depth: MAX_SHADOW_DEPTH,
        }
    }
}

impl NodeSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_depth(max_depth: usize) -> Self {
        Self { max_depth }
    }

    /// 从 `root` 开始发现节点，结果写入 `state`
    pub fn discover(&self, selector: &str, root: &Handle, state: &mut ScanState) -> DiscoveryStats {
        let mut stats = DiscoveryStats::default();
        let mut visited: HashSet<(*const markup5ever_rcdom::Node, Rc<[String]>)> = HashSet::new();
        let mut queue = VecDeque::new();

        queue.push_back(Task {
            root: root.clone(),
            clauses: split_clauses(selector).into(),
            depth: 0,
        });

        while let Some(task) = queue.pop_front() {
            if task.depth > self.max_depth {
                tracing::warn!("影子根嵌套超过 {} 层，跳过", self.max_depth);
                stats.skipped_roots += 1;
                continue;
            }
            if !visited.insert((Rc::as_ptr(&task.root), task.clauses.clone())) {
                continue;
            }

            state.add_root(&task.root);
            stats.roots += 1;

            for clause in task.clauses.iter() {
                match clause.split_once(SHADOW_KEY) {
                    Some((outer, inner)) => {
                        let (outer, inner) = (outer.trim(), inner.trim());
                        if outer.is_empty() || inner.is_empty() {
                            continue;
                        }
                        let Some(hosts) = query(outer, &task.root, &mut stats) else {
                            continue;
                        };
                        for host in hosts {
                            if let Some(shadow) = shadow_root(&host) {
                                queue.push_back(Task {
                                    root: shadow,
                                    clauses: vec![inner.to_string()].into(),
                                    depth: task.depth + 1,
                                });
                            }
                        }
                    }
                    None => {
                        let Some(matches) = query(clause, &task.root, &mut stats) else {
                            continue;
                        };
                        for node in leaves(matches, &task.root) {
                            if state.tracked.insert(&node) {
                                stats.added += 1;
                            }
                        }
                    }
                }
            }

            for host in descendant_elements(&task.root) {
                if let Some(shadow) = shadow_root(&host) {
                    queue.push_back(Task {
                        root: shadow,
                        clauses: task.clauses.clone(),
                        depth: task.depth + 1,
                    });
                }
            }
        }

        tracing::debug!(
            "节点扫描完成: 根 {} 个，新增节点 {} 个，共跟踪 {} 个",
            stats.roots,
            stats.added,
            state.tracked.len()
        );

        stats
    }
}

/// 按 `;` 拆分子句
pub fn split_clauses(selector: &str) -> Vec<String> {
    selector
        .split(';')
        .map(str::trim)
        .filter(|clause| !clause.is_empty())
        .map(str::to_string)
        .collect()
}

/// 子句无效时记录日志并视为没有命中
fn query(selector: &str, root: &Handle, stats: &mut DiscoveryStats) -> Option<Vec<Handle>> {
    match SelectorList::parse(selector) {
        Ok(list) => Some(list.query_all(root)),
        Err(e) => {
            tracing::warn!("跳过无效的选择器子句: {}", e);
            stats.invalid_clauses += 1;
            None
        }
    }
}

/// 去掉内部还有其他命中的元素
fn leaves(matches: Vec<Handle>, root: &Handle) -> Vec<Handle> {
    let mut matched = NodeSet::default();
    for node in &matches {
        matched.insert(node);
    }

    let mut containers = NodeSet::default();
    for node in &matches {
        let mut current = get_parent_node(node);
        while let Some(parent) = current {
            if Rc::ptr_eq(&parent, root) {
                break;
            }
            if matched.contains(&parent) && !containers.insert(&parent) {
                // 更上层的祖先已经在之前的遍历中标记过
                break;
            }
            current = get_parent_node(&parent);
        }
    }

    matches
        .into_iter()
        .filter(|node| !containers.contains(node))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::html::{find_element_by_name, get_node_attr, html_to_dom};

    fn ids(state: &ScanState) -> Vec<String> {
        state
            .tracked
            .iter()
            .filter_map(|node| get_node_attr(node, "id"))
            .collect()
    }

    #[test]
    fn clauses_are_trimmed_and_empty_ones_dropped() {
        assert_eq!(split_clauses(" p ; ;div>>>span;"), vec!["p", "div>>>span"]);
    }

    #[test]
    fn only_leaf_matches_are_kept() {
        let dom = html_to_dom(
            br#"<div id="a"><div id="b"><p id="c">x</p></div></div><div id="d">y</div>"#,
            "utf-8",
        )
        .unwrap();
        let mut state = ScanState::new();
        NodeSelector::new().discover("div", &dom.document, &mut state);
        assert_eq!(ids(&state), vec!["b", "d"]);
    }

    #[test]
    fn rescan_is_idempotent() {
        let dom = html_to_dom(br#"<p id="a">1</p><p id="b">2</p>"#, "utf-8").unwrap();
        let mut state = ScanState::new();
        let selector = NodeSelector::new();

        assert_eq!(selector.discover("p", &dom.document, &mut state).added, 2);
        assert_eq!(selector.discover("p", &dom.document, &mut state).added, 0);
        assert_eq!(state.tracked.len(), 2);
    }

    #[test]
    fn invalid_clause_does_not_poison_others() {
        let dom = html_to_dom(br#"<p id="a">1</p><li id="b">2</li>"#, "utf-8").unwrap();
        let mut state = ScanState::new();
        let stats = NodeSelector::new().discover("p; li[; li", &dom.document, &mut state);
        assert_eq!(stats.invalid_clauses, 1);
        assert_eq!(ids(&state), vec!["a", "b"]);
    }

    #[test]
    fn depth_limit_skips_deep_shadow_roots() {
        let dom = html_to_dom(
            br#"<div><template shadowrootmode="open"><section><template shadowrootmode="open"><p id="deep">x</p></template></section></template></div>"#,
            "utf-8",
        )
        .unwrap();
        let host = find_element_by_name(&dom.document, "div").unwrap();
        assert!(shadow_root(&host).is_some());

        let mut state = ScanState::new();
        let stats = NodeSelector::with_max_depth(1).discover("p", &dom.document, &mut state);
        assert_eq!(stats.skipped_roots, 1);
        assert!(state.tracked.is_empty());

        let mut state = ScanState::new();
        NodeSelector::new().discover("p", &dom.document, &mut state);
        assert_eq!(ids(&state), vec!["deep"]);
        assert_eq!(state.roots().len(), 3);
    }
}
