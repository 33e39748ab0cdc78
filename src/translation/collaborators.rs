//! 外部协作者
//!
//! 翻译接口、译文展示、页面修复和请求池都由嵌入环境提供。
//! DOM 句柄是 `Rc`，所以异步接口不要求 `Send`。

use std::rc::Rc;
use std::time::Duration;

use async_trait::async_trait;
use markup5ever_rcdom::Handle;

use super::composer::Composition;
use crate::error::Result;
use crate::rules::{Lang, ResolvedRule, Translator};

/// 翻译接口
#[async_trait(?Send)]
pub trait Translate {
    async fn translate(
        &self,
        text: &str,
        translator: Translator,
        from_lang: Lang,
        to_lang: Lang,
    ) -> Result<String>;
}

/// 译文展示
///
/// `translation` 是刚插入到原节点末尾的译文元素，展示组件负责发起翻译并填充它，
/// 同时把占位符 `[i]` 还原成 `composition.keeps[i]`。
pub trait Presenter {
    fn mount(&self, translation: &Handle, composition: &Composition, rule: &ResolvedRule);
}

/// 注册前对页面做的修复
pub trait PageFixer {
    fn fix(&self, document: &Handle);
}

/// 请求池
pub trait FetchPool {
    fn update(&self, interval: Duration, limit: usize);

    /// 取消所有排队中的请求
    fn clear(&self);
}

/// 原样返回文本，用于演练
#[derive(Debug, Default, Clone, Copy)]
pub struct PassthroughTranslator;

#[async_trait(?Send)]
impl Translate for PassthroughTranslator {
    async fn translate(
        &self,
        text: &str,
        _translator: Translator,
        _from_lang: Lang,
        _to_lang: Lang,
    ) -> Result<String> {
        Ok(text.to_string())
    }
}

/// 不做任何调度的请求池
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopFetchPool;

impl FetchPool for NoopFetchPool {
    fn update(&self, _interval: Duration, _limit: usize) {}

    fn clear(&self) {}
}

/// 控制器使用的全部协作者
#[derive(Clone)]
pub struct Collaborators {
    pub translator: Rc<dyn Translate>,
    pub presenter: Rc<dyn Presenter>,
    pub fetch_pool: Rc<dyn FetchPool>,
    pub page_fixer: Option<Rc<dyn PageFixer>>,
}

impl Collaborators {
    pub fn new(translator: Rc<dyn Translate>, presenter: Rc<dyn Presenter>) -> Self {
        Self {
            translator,
            presenter,
            fetch_pool: Rc::new(NoopFetchPool),
            page_fixer: None,
        }
    }

    pub fn with_fetch_pool(mut self, fetch_pool: Rc<dyn FetchPool>) -> Self {
        self.fetch_pool = fetch_pool;
        self
    }

    pub fn with_page_fixer(mut self, page_fixer: Rc<dyn PageFixer>) -> Self {
        self.page_fixer = Some(page_fixer);
        self
    }
}
