//! 页面翻译
//!
//! 按解析后的规则在页面上插入译文：
//! - **discovery**: 节点发现，穿透影子根
//! - **composer**: 组装带占位符的原文并挂载译文元素
//! - **lifecycle**: 注册/注销状态机，防抖重扫
//! - **collaborators**: 翻译接口、展示组件等外部协作者
//!
//! # 基本用法
//!
//! ```rust,no_run
//! use std::rc::Rc;
//! use pagelingo::config::Setting;
//! use pagelingo::parsers::html::html_to_dom;
//! use pagelingo::rules::match_rule;
//! use pagelingo::translation::{Collaborators, LifecycleController, PassthroughTranslator, Presenter};
//!
//! # struct Print;
//! # impl Presenter for Print {
//! #     fn mount(&self, _: &markup5ever_rcdom::Handle, c: &pagelingo::translation::Composition, _: &pagelingo::rules::ResolvedRule) {
//! #         println!("{}", c.text);
//! #     }
//! # }
//! # async fn example() -> std::io::Result<()> {
//! let dom = html_to_dom(b"<p>Hello world</p>", "utf-8")?;
//! let mut rule = match_rule(&[], "https://example.com");
//! rule.trans_open = true;
//!
//! let collaborators = Collaborators::new(Rc::new(PassthroughTranslator), Rc::new(Print));
//! let controller =
//!     LifecycleController::new(dom.document.clone(), rule, Setting::default(), collaborators).await;
//! assert!(controller.is_registered());
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

pub mod collaborators;
pub mod composer;
pub mod debounce;
pub mod discovery;
pub mod events;
pub mod lifecycle;
pub mod state;

pub use collaborators::{
    Collaborators, FetchPool, NoopFetchPool, PageFixer, PassthroughTranslator, Presenter,
    Translate,
};
pub use composer::{Composition, Glossary, KeepSelector, Render, SkipReason, TextComposer};
pub use debounce::Debouncer;
pub use discovery::{DiscoveryStats, NodeSelector};
pub use events::{IntersectionEntry, Modifiers, MutationRecord, RuleEvent};
pub use lifecycle::LifecycleController;
pub use state::{NodeKey, NodeSet, ScanState, TrackedNodes};

/// 译文元素名
pub const TRANSLATION_ELEMENT: &str = "pagelingo-tr";

/// 已翻译标题的后缀
pub const TITLE_SUFFIX: &str = "[PageLingo]";

/// 重扫防抖间隔
pub const DEBOUNCE_DELAY: Duration = Duration::from_millis(500);

/// 可见比例达到该值时翻译
pub const INTERSECTION_THRESHOLD: f64 = 0.1;

/// 影子根最大嵌套层数
pub const MAX_SHADOW_DEPTH: usize = 64;

/// 放开截断样式，让译文完整显示
pub const RELAX_LAYOUT_CSS: &str = "-webkit-line-clamp: unset; max-height: none; height: auto;";

/// 这些元素内部的变化不触发重扫
pub const SKIP_NODE_NAMES: &[&str] = &[
    TRANSLATION_ELEMENT,
    "style",
    "svg",
    "img",
    "audio",
    "video",
    "textarea",
    "input",
    "button",
    "select",
    "option",
    "head",
    "script",
    "iframe",
];
