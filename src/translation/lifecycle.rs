//! 生命周期控制
//!
//! 控制器在“未注册”和“已注册”两个状态之间切换。注册时扫描节点、登记观察关系，
//! 并按触发方式安排翻译；注销时撤销全部观察关系、移除译文元素并清空状态。
//!
//! 观察者由宿主驱动：页面变化、可见性变化和键鼠事件通过 `on_*` 方法送进来，
//! 控制器只处理自己当前登记过的对象。

use std::time::{Duration, Instant};

use markup5ever_rcdom::Handle;
use tokio::sync::broadcast;

use super::collaborators::Collaborators;
use super::composer::{translation_child, Render, TextComposer};
use super::debounce::Debouncer;
use super::discovery::{DiscoveryStats, NodeSelector};
use super::events::{IntersectionEntry, Modifiers, MutationRecord, RuleEvent};
use super::state::{NodeSet, ScanState, TrackedNodes};
use super::{
    DEBOUNCE_DELAY, INTERSECTION_THRESHOLD, SKIP_NODE_NAMES, TITLE_SUFFIX, TRANSLATION_ELEMENT,
};
use crate::config::{HoverKey, InteractionMode, Setting};
use crate::error::Result;
use crate::parsers::html::{
    get_node_name, get_title, remove_from_parent, root_of, set_title,
};
use crate::rules::{ResolvedRule, TextStyle};

const EVENT_CAPACITY: usize = 16;

/// 当前登记的观察关系
#[derive(Debug, Default)]
struct Observers {
    mutation_roots: NodeSet,
    intersection: NodeSet,
    hover: NodeSet,
    keydown: bool,
    hovered: Option<Handle>,
}

impl Observers {
    fn clear(&mut self) {
        self.mutation_roots.clear();
        self.intersection.clear();
        self.hover.clear();
        self.keydown = false;
        self.hovered = None;
    }
}

/// 页面翻译生命周期控制器
pub struct LifecycleController {
    document: Handle,
    rule: ResolvedRule,
    setting: Setting,
    composer: TextComposer,
    selector: NodeSelector,
    state: ScanState,
    observers: Observers,
    registered: bool,
    doc_title: Option<String>,
    debouncer: Debouncer,
    events: broadcast::Sender<RuleEvent>,
    collaborators: Collaborators,
}

impl LifecycleController {
    /// 创建控制器，规则为开启状态时立即注册
    pub async fn new(
        document: Handle,
        rule: ResolvedRule,
        setting: Setting,
        collaborators: Collaborators,
    ) -> Self {
        collaborators
            .fetch_pool
            .update(setting.fetch_interval(), setting.fetch_limit);

        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let mut controller = Self {
            document,
            composer: TextComposer::new(&rule, &setting),
            rule,
            setting,
            selector: NodeSelector::new(),
            state: ScanState::new(),
            observers: Observers::default(),
            registered: false,
            doc_title: None,
            debouncer: Debouncer::new(DEBOUNCE_DELAY),
            events,
            collaborators,
        };

        if controller.rule.trans_open {
            controller.register().await;
        }

        controller
    }

    /// 替换默认的节点选择器（影子根嵌套上限等）
    pub fn with_selector(mut self, selector: NodeSelector) -> Self {
        self.selector = selector;
        self
    }

    pub fn rule(&self) -> &ResolvedRule {
        &self.rule
    }

    pub fn setting(&self) -> &Setting {
        &self.setting
    }

    pub fn document(&self) -> &Handle {
        &self.document
    }

    pub fn is_registered(&self) -> bool {
        self.registered
    }

    pub fn tracked_nodes(&self) -> &TrackedNodes {
        &self.state.tracked
    }

    pub fn roots(&self) -> &[Handle] {
        self.state.roots()
    }

    /// 悬停模式下当前悬停的节点
    pub fn hovered(&self) -> Option<&Handle> {
        self.observers.hovered.as_ref()
    }

    pub fn is_observing_intersection(&self, node: &Handle) -> bool {
        self.observers.intersection.contains(node)
    }

    pub fn is_observing_hover(&self, node: &Handle) -> bool {
        self.observers.hover.contains(node)
    }

    pub fn is_observing_mutations(&self, root: &Handle) -> bool {
        self.observers.mutation_roots.contains(root)
    }

    pub fn is_rescan_pending(&self) -> bool {
        self.debouncer.is_armed()
    }

    /// 订阅规则变更
    pub fn subscribe(&self) -> broadcast::Receiver<RuleEvent> {
        self.events.subscribe()
    }

    /// 合并修改规则并广播
    pub fn update_rule<F>(&mut self, patch: F)
    where
        F: FnOnce(&mut ResolvedRule),
    {
        let mut rule = self.rule.clone();
        patch(&mut rule);
        self.set_rule(rule);
    }

    /// 开关翻译
    pub async fn toggle(&mut self) {
        if self.rule.trans_open {
            self.update_rule(|rule| rule.trans_open = false);
            self.unregister();
        } else {
            self.update_rule(|rule| rule.trans_open = true);
            self.register().await;
        }
    }

    /// 在模糊和虚线样式之间切换
    pub fn toggle_style(&mut self) {
        let text_style = if self.rule.text_style == TextStyle::Fuzzy {
            TextStyle::DashLine
        } else {
            TextStyle::Fuzzy
        };
        self.update_rule(|rule| rule.text_style = text_style);
    }

    /// 用当前规则的翻译服务和语言翻译一段文本
    pub async fn translate_text(&self, text: &str) -> Result<String> {
        self.collaborators
            .translator
            .translate(
                text,
                self.rule.translator,
                self.rule.from_lang,
                self.rule.to_lang,
            )
            .await
    }

    fn set_rule(&mut self, rule: ResolvedRule) {
        self.rule = rule;
        // 没有订阅者时发送失败，忽略即可
        let _ = self.events.send(RuleEvent::CurrentRule(self.rule.clone()));
    }

    /// 注册：扫描节点、登记观察关系、按触发方式安排翻译、翻译标题
    pub async fn register(&mut self) {
        if self.rule.is_same_lang() {
            tracing::debug!("源语言与目标语言相同，跳过注册");
            return;
        }

        if let Some(fixer) = &self.collaborators.page_fixer {
            fixer.fix(&self.document);
        }

        let stats = self.scan();

        for root in self.state.roots() {
            self.observers.mutation_roots.insert(root);
        }

        match self.setting.mouse_key {
            InteractionMode::Disabled => {
                for node in self.state.tracked.iter() {
                    self.observers.intersection.insert(node);
                }
            }
            InteractionMode::PageOpen => {
                for node in self.state.tracked.nodes() {
                    self.render(&node);
                }
            }
            InteractionMode::Hover(_) => {
                self.observers.keydown = true;
                for node in self.state.tracked.iter() {
                    self.observers.hover.insert(node);
                }
            }
        }

        if !self.registered {
            tracing::info!(
                "页面翻译已注册: 模式 {}，节点 {} 个，根 {} 个",
                self.setting.mouse_key,
                self.state.tracked.len(),
                stats.roots
            );
        }
        self.registered = true;

        self.translate_title().await;
    }

    /// 注销：恢复标题、撤销观察关系、移除译文元素、清空状态
    pub fn unregister(&mut self) {
        if let Some(title) = self.doc_title.take() {
            set_title(&self.document, &title);
        }

        self.observers.clear();

        for node in self.state.tracked.iter() {
            if let Some(translation) = translation_child(node) {
                remove_from_parent(&translation);
            }
        }

        self.state.clear();
        self.debouncer.cancel();
        self.collaborators.fetch_pool.clear();

        if self.registered {
            tracing::info!("页面翻译已注销");
        }
        self.registered = false;
    }

    fn scan(&mut self) -> DiscoveryStats {
        self.selector
            .discover(&self.rule.selector, &self.document, &mut self.state)
    }

    fn render(&mut self, node: &Handle) -> Render {
        self.composer.render(
            node,
            &mut self.state.tracked,
            self.collaborators.presenter.as_ref(),
            &self.rule,
        )
    }

    /// 标题只翻译一次，已带后缀的标题不再处理
    async fn translate_title(&mut self) {
        let Some(title) = get_title(&self.document) else {
            return;
        };
        if title.ends_with(TITLE_SUFFIX) || title.trim().is_empty() {
            return;
        }

        self.doc_title = Some(title.clone());
        match self.translate_text(&title).await {
            Ok(translated) => {
                set_title(
                    &self.document,
                    &format!("{} | {} {}", translated, title, TITLE_SUFFIX),
                );
            }
            Err(e) => tracing::warn!("标题翻译失败: {}", e),
        }
    }

    /// 页面结构变化，符合条件时安排一次防抖重扫
    pub fn on_mutations(&mut self, records: &[MutationRecord], now: Instant) -> bool {
        let qualifying = records
            .iter()
            .filter(|record| self.is_qualifying(record))
            .count();

        if qualifying == 0 {
            return false;
        }

        tracing::debug!("检测到 {} 条页面变化，重新计时", qualifying);
        self.debouncer.rearm(now);
        true
    }

    fn is_qualifying(&self, record: &MutationRecord) -> bool {
        if self.observers.mutation_roots.is_empty() || is_skipped(&record.target) {
            return false;
        }
        if !self.is_under_observed_root(&record.target) {
            return false;
        }
        record.added_nodes.iter().any(|node| !is_skipped(node))
    }

    fn is_under_observed_root(&self, node: &Handle) -> bool {
        self.observers
            .mutation_roots
            .contains(&root_of(node))
    }

    /// 宿主新建了影子根
    pub fn notify_shadow_attached(&mut self, host: &Handle, now: Instant) {
        if !self.registered {
            return;
        }
        tracing::debug!(
            "影子根已附加到 <{}>，重新计时",
            get_node_name(host).unwrap_or("?")
        );
        self.debouncer.rearm(now);
    }

    /// 节点可见性变化，首次可见时翻译并停止观察
    pub fn on_intersection(&mut self, entries: &[IntersectionEntry]) -> usize {
        let mut rendered = 0;
        for entry in entries {
            if entry.intersection_ratio < INTERSECTION_THRESHOLD {
                continue;
            }
            if !self.observers.intersection.remove(&entry.target) {
                continue;
            }
            if self.render(&entry.target) == Render::Mounted {
                rendered += 1;
            }
        }
        rendered
    }

    /// 鼠标进入节点
    pub fn on_mouse_enter(&mut self, node: &Handle, modifiers: Modifiers) -> Option<Render> {
        if !self.observers.hover.contains(node) {
            return None;
        }

        let key = self.hover_key();
        if key == HoverKey::None || modifiers.holds(key) {
            self.observers.hover.remove(node);
            Some(self.render(node))
        } else {
            self.observers.hovered = Some(node.clone());
            None
        }
    }

    /// 鼠标离开节点
    pub fn on_mouse_leave(&mut self, node: &Handle) {
        if self.observers.hover.contains(node) {
            self.observers.hovered = None;
        }
    }

    /// 按下按键，悬停节点满足条件时翻译
    pub fn on_keydown(&mut self, modifiers: Modifiers) -> Option<Render> {
        if !self.observers.keydown || !modifiers.holds(self.hover_key()) {
            return None;
        }

        let node = self.observers.hovered.take()?;
        self.observers.hover.remove(&node);
        Some(self.render(&node))
    }

    fn hover_key(&self) -> HoverKey {
        match self.setting.mouse_key {
            InteractionMode::Hover(key) => key,
            _ => HoverKey::None,
        }
    }

    /// 到期时执行重扫，返回是否执行
    pub async fn tick(&mut self, now: Instant) -> bool {
        if !self.debouncer.poll(now) {
            return false;
        }
        self.rescan().await;
        true
    }

    /// 立即执行挂起的重扫
    pub async fn flush(&mut self) -> bool {
        if !self.debouncer.fire_now() {
            return false;
        }
        self.rescan().await;
        true
    }

    /// 距离下一次重扫的时间
    pub fn time_until_rescan(&self, now: Instant) -> Option<Duration> {
        self.debouncer
            .deadline()
            .map(|deadline| deadline.saturating_duration_since(now))
    }

    async fn rescan(&mut self) {
        if self.registered && self.rule.trans_open {
            tracing::debug!("执行防抖重扫");
            self.register().await;
        }
    }
}

fn is_skipped(node: &Handle) -> bool {
    get_node_name(node).is_some_and(|name| SKIP_NODE_NAMES.contains(&name))
}
