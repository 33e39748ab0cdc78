// 集成测试公共模块
//
// 提供测试用的协作者实现和 DOM 辅助函数

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use async_trait::async_trait;
use markup5ever_rcdom::{Handle, RcDom};

use pagelingo::config::{InteractionMode, Setting};
use pagelingo::error::{PageLingoError, Result};
use pagelingo::parsers::html::{find_descendant, find_element_by_name, get_node_attr, html_to_dom};
use pagelingo::rules::{match_rule, Lang, ResolvedRule, Rule, SubRuleLoader, Translator};
use pagelingo::translation::{
    Collaborators, Composition, FetchPool, PageFixer, Presenter, Translate, TRANSLATION_ELEMENT,
};

/// 解析 HTML 文本
pub fn parse(html: &str) -> RcDom {
    html_to_dom(html.as_bytes(), "utf-8").expect("HTML should parse")
}

/// 按 id 查找元素（不进入影子根）
pub fn by_id(root: &Handle, id: &str) -> Handle {
    find_descendant(root, |node| get_node_attr(node, "id").as_deref() == Some(id))
        .unwrap_or_else(|| panic!("element #{} not found", id))
}

pub fn body(dom: &RcDom) -> Handle {
    find_element_by_name(&dom.document, "body").expect("document should have a body")
}

/// 节点的 id 列表
pub fn ids<'a>(nodes: impl IntoIterator<Item = &'a Handle>) -> Vec<String> {
    nodes
        .into_iter()
        .filter_map(|node| get_node_attr(node, "id"))
        .collect()
}

/// 节点内的译文元素个数
pub fn translation_count(node: &Handle) -> usize {
    pagelingo::parsers::html::descendant_elements(node)
        .iter()
        .filter(|el| pagelingo::parsers::html::get_node_name(el) == Some(TRANSLATION_ELEMENT))
        .count()
}

/// 开启状态的规则
pub fn open_rule(selector: &str) -> ResolvedRule {
    let mut rule = match_rule(&[], "https://example.com/");
    rule.selector = selector.to_string();
    rule.trans_open = true;
    rule
}

pub fn setting(mode: InteractionMode) -> Setting {
    Setting {
        mouse_key: mode,
        ..Setting::default()
    }
}

/// 记录每次挂载的展示组件
#[derive(Default)]
pub struct RecordingPresenter {
    pub mounts: RefCell<Vec<(Handle, Composition)>>,
}

impl RecordingPresenter {
    pub fn count(&self) -> usize {
        self.mounts.borrow().len()
    }

    pub fn texts(&self) -> Vec<String> {
        self.mounts
            .borrow()
            .iter()
            .map(|(_, composition)| composition.text.clone())
            .collect()
    }
}

impl Presenter for RecordingPresenter {
    fn mount(&self, translation: &Handle, composition: &Composition, _rule: &ResolvedRule) {
        self.mounts
            .borrow_mut()
            .push((translation.clone(), composition.clone()));
    }
}

/// 给文本加前缀的翻译接口，可设置为总是失败
#[derive(Default)]
pub struct EchoTranslator {
    pub calls: Cell<usize>,
    pub fail: bool,
    pub last: RefCell<Option<(String, Translator, Lang, Lang)>>,
}

impl EchoTranslator {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }
}

#[async_trait(?Send)]
impl Translate for EchoTranslator {
    async fn translate(
        &self,
        text: &str,
        translator: Translator,
        from_lang: Lang,
        to_lang: Lang,
    ) -> Result<String> {
        self.calls.set(self.calls.get() + 1);
        *self.last.borrow_mut() = Some((text.to_string(), translator, from_lang, to_lang));
        if self.fail {
            return Err(PageLingoError::Translate("service unavailable".to_string()));
        }
        Ok(format!("译:{}", text))
    }
}

/// 记录调用的请求池
#[derive(Default)]
pub struct RecordingPool {
    pub updates: RefCell<Vec<(Duration, usize)>>,
    pub clears: Cell<usize>,
}

impl FetchPool for RecordingPool {
    fn update(&self, interval: Duration, limit: usize) {
        self.updates.borrow_mut().push((interval, limit));
    }

    fn clear(&self) {
        self.clears.set(self.clears.get() + 1);
    }
}

#[derive(Default)]
pub struct RecordingFixer {
    pub calls: Cell<usize>,
}

impl PageFixer for RecordingFixer {
    fn fix(&self, _document: &Handle) {
        self.calls.set(self.calls.get() + 1);
    }
}

/// 一组可在测试中检查的协作者
pub struct Harness {
    pub translator: Rc<EchoTranslator>,
    pub presenter: Rc<RecordingPresenter>,
    pub pool: Rc<RecordingPool>,
    pub fixer: Rc<RecordingFixer>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_translator(EchoTranslator::default())
    }

    pub fn with_translator(translator: EchoTranslator) -> Self {
        Self {
            translator: Rc::new(translator),
            presenter: Rc::new(RecordingPresenter::default()),
            pool: Rc::new(RecordingPool::default()),
            fixer: Rc::new(RecordingFixer::default()),
        }
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators::new(self.translator.clone(), self.presenter.clone())
            .with_fetch_pool(self.pool.clone())
            .with_page_fixer(self.fixer.clone())
    }
}

/// 按来源返回固定规则的订阅规则加载器
#[derive(Default)]
pub struct StaticLoader {
    pub sources: HashMap<String, Vec<Rule>>,
    pub calls: Cell<usize>,
}

impl StaticLoader {
    pub fn with(source: &str, rules: Vec<Rule>) -> Self {
        let mut sources = HashMap::new();
        sources.insert(source.to_string(), rules);
        Self {
            sources,
            calls: Cell::new(0),
        }
    }
}

#[async_trait(?Send)]
impl SubRuleLoader for StaticLoader {
    async fn load(&self, source: &str) -> Result<Vec<Rule>> {
        self.calls.set(self.calls.get() + 1);
        self.sources
            .get(source)
            .cloned()
            .ok_or_else(|| PageLingoError::SubRules(format!("unknown source {}", source)))
    }
}
