//! 节点发现集成测试
//!
//! 叶子规则、影子根穿透、影子根全量扫描和无效子句

use std::rc::Rc;

use pagelingo::parsers::html::{
    append_child, attach_shadow, create_element, create_text, set_node_attr, shadow_root,
};
use pagelingo::translation::{NodeSelector, ScanState};

#[allow(dead_code)]
mod common {
    include!("common/mod.rs");
}

use common::{body, by_id, ids, parse};

const CARD_PAGE: &str = r#"<html><body>
<x-card id="card"><template shadowrootmode="open"><h2 class="title" id="title">Card title</h2><p id="inner">Card body text</p></template></x-card>
<p id="outside">Outside text</p>
</body></html>"#;

fn discover(selector: &str, dom: &markup5ever_rcdom::RcDom) -> ScanState {
    let mut state = ScanState::new();
    NodeSelector::new().discover(selector, &dom.document, &mut state);
    state
}

#[test]
fn test_nested_matches_keep_only_the_descendant() {
    let dom = parse(r#"<div id="a"><p>x</p><div id="b">inner</div></div><section><div id="c">y</div></section>"#);
    let state = discover("div", &dom);
    assert_eq!(ids(state.tracked.iter()), vec!["b", "c"]);
}

#[test]
fn test_leaf_rule_is_per_clause() {
    // 不同子句之间不互相过滤
    let dom = parse(r#"<blockquote id="q"><p id="p">quoted</p></blockquote>"#);
    let state = discover("blockquote; p", &dom);
    assert_eq!(ids(state.tracked.iter()), vec!["q", "p"]);

    let state = discover("blockquote, p", &dom);
    assert_eq!(ids(state.tracked.iter()), vec!["p"]);
}

#[test]
fn test_shadow_piercing_clause_queries_inside_host() {
    let dom = parse(CARD_PAGE);
    let state = discover("x-card >>> .title", &dom);

    assert_eq!(ids(state.tracked.iter()), vec!["title"]);
    assert_eq!(state.roots().len(), 2);

    let card = by_id(&dom.document, "card");
    let shadow = shadow_root(&card).unwrap();
    assert!(state.is_root(&shadow));
    assert!(state.is_root(&dom.document));
}

#[test]
fn test_blanket_walk_reaches_untargeted_shadow_content() {
    let dom = parse(CARD_PAGE);
    let state = discover("p", &dom);
    assert_eq!(ids(state.tracked.iter()), vec!["outside", "inner"]);
}

#[test]
fn test_piercing_and_blanket_walk_are_unioned() {
    let dom = parse(CARD_PAGE);
    let state = discover("p; x-card >>> .title", &dom);
    assert_eq!(ids(state.tracked.iter()), vec!["outside", "title", "inner"]);
    assert_eq!(state.roots().len(), 2);
}

#[test]
fn test_hosts_without_shadow_root_are_ignored() {
    let dom = parse(r#"<x-card id="card"><h2 class="title">Light DOM title</h2></x-card>"#);
    let state = discover("x-card >>> .title", &dom);
    assert!(state.tracked.is_empty());
    assert_eq!(state.roots().len(), 1);
}

#[test]
fn test_programmatic_shadow_roots_are_discovered() {
    let dom = parse(r#"<div id="host"></div>"#);
    let host = by_id(&dom.document, "host");
    let shadow = attach_shadow(&host);

    let nested_host = create_element("span", &[("id", "nested-host")]);
    append_child(&shadow, &nested_host);
    let nested = attach_shadow(&nested_host);
    let p = create_element("p", &[]);
    set_node_attr(&p, "id", Some("deep".to_string()));
    append_child(&p, &create_text("Deep shadow text"));
    append_child(&nested, &p);

    let state = discover("p", &dom);
    assert_eq!(ids(state.tracked.iter()), vec!["deep"]);
    assert_eq!(state.roots().len(), 3);
}

#[test]
fn test_invalid_clauses_count_as_zero_matches() {
    let dom = parse(r#"<p id="a">one</p><li id="b">two</li>"#);
    let mut state = ScanState::new();
    let stats = NodeSelector::new().discover("p::before; li; :hover; ##x", &dom.document, &mut state);

    assert_eq!(stats.invalid_clauses, 3);
    assert_eq!(ids(state.tracked.iter()), vec!["b"]);
}

#[test]
fn test_rescan_only_adds_new_nodes() {
    let dom = parse(r#"<p id="a">one</p>"#);
    let mut state = ScanState::new();
    let selector = NodeSelector::new();
    selector.discover("p", &dom.document, &mut state);
    state.tracked.set_text(&by_id(&dom.document, "a"), "one".to_string());

    let p = create_element("p", &[("id", "b")]);
    append_child(&body(&dom), &p);
    let stats = selector.discover("p", &dom.document, &mut state);

    assert_eq!(stats.added, 1);
    assert_eq!(ids(state.tracked.iter()), vec!["a", "b"]);
    // 已跟踪节点记录的原文不会被重置
    assert_eq!(
        state.tracked.text(&by_id(&dom.document, "a")),
        Some("one")
    );
    assert!(Rc::ptr_eq(&state.roots()[0], &dom.document));
}

#[test]
fn test_empty_selector_finds_nothing() {
    let dom = parse(r#"<p>text</p>"#);
    let state = discover(" ; ;", &dom);
    assert!(state.tracked.is_empty());
    assert_eq!(state.roots().len(), 1);
}
