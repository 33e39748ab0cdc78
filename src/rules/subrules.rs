//! 订阅规则
//!
//! 订阅规则由外部来源提供，解析时插入到本地规则列表的末尾之前。
//! 远程获取不在本 crate 内实现，这里只定义加载接口、本地文件加载器和 LRU 缓存。

use std::cell::{Cell, RefCell};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use lru::LruCache;
use serde::{Deserialize, Serialize};
use url::Url;

use super::types::Rule;
use super::validator::parse_rules;
use crate::error::{PageLingoError, Result};

/// 订阅规则来源
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubRuleSource {
    pub url: String,
    #[serde(default)]
    pub selected: bool,
}

impl SubRuleSource {
    pub fn selected(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            selected: true,
        }
    }
}

/// 订阅规则加载器
#[async_trait(?Send)]
pub trait SubRuleLoader {
    /// 按来源标识加载已校验的规则
    async fn load(&self, source: &str) -> Result<Vec<Rule>>;
}

/// 不加载任何订阅规则
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSubRules;

#[async_trait(?Send)]
impl SubRuleLoader for NoSubRules {
    async fn load(&self, _source: &str) -> Result<Vec<Rule>> {
        Ok(Vec::new())
    }
}

/// 从本地 JSON 文件加载订阅规则
///
/// 来源可以是 `file://` URL 或文件路径，相对路径基于 `base_dir`。
#[derive(Debug, Default, Clone)]
pub struct FileSubRuleLoader {
    base_dir: Option<PathBuf>,
}

impl FileSubRuleLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_dir<P: AsRef<Path>>(base_dir: P) -> Self {
        Self {
            base_dir: Some(base_dir.as_ref().to_path_buf()),
        }
    }

    fn resolve_path(&self, source: &str) -> Result<PathBuf> {
        if let Ok(url) = Url::parse(source) {
            // Windows 盘符也能解析成 URL，单字母 scheme 按路径处理
            if url.scheme().len() > 1 {
                if url.scheme() != "file" {
                    return Err(PageLingoError::SubRules(format!(
                        "不支持的订阅规则来源: {}",
                        source
                    )));
                }
                return url.to_file_path().map_err(|_| {
                    PageLingoError::SubRules(format!("无效的文件地址: {}", source))
                });
            }
        }

        let path = PathBuf::from(source);
        Ok(match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path,
        })
    }
}

#[async_trait(?Send)]
impl SubRuleLoader for FileSubRuleLoader {
    async fn load(&self, source: &str) -> Result<Vec<Rule>> {
        let path = self.resolve_path(source)?;
        let content = tokio::fs::read_to_string(&path).await.map_err(|e| {
            PageLingoError::SubRules(format!("读取 {} 失败: {}", path.display(), e))
        })?;

        let rules = parse_rules(&content)?;
        tracing::debug!("从 {} 加载了 {} 条订阅规则", path.display(), rules.len());
        Ok(rules)
    }
}

/// 缓存统计
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
}

/// 带 LRU 缓存的加载器
///
/// 成功的结果按来源标识缓存，失败不缓存。
pub struct CachedSubRuleLoader<L> {
    inner: L,
    cache: RefCell<LruCache<String, Vec<Rule>>>,
    hits: Cell<usize>,
    misses: Cell<usize>,
}

impl<L: SubRuleLoader> CachedSubRuleLoader<L> {
    pub fn new(inner: L, capacity: usize) -> Self {
        Self {
            inner,
            cache: RefCell::new(LruCache::new(
                NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN),
            )),
            hits: Cell::new(0),
            misses: Cell::new(0),
        }
    }

    /// 使某个来源的缓存失效
    pub fn invalidate(&self, source: &str) -> bool {
        self.cache.borrow_mut().pop(source).is_some()
    }

    pub fn clear(&self) {
        self.cache.borrow_mut().clear();
    }

    pub fn len(&self) -> usize {
        self.cache.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.borrow().is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.get(),
            misses: self.misses.get(),
        }
    }
}

#[async_trait(?Send)]
impl<L: SubRuleLoader> SubRuleLoader for CachedSubRuleLoader<L> {
    async fn load(&self, source: &str) -> Result<Vec<Rule>> {
        let cached = self.cache.borrow_mut().get(source).cloned();
        if let Some(rules) = cached {
            self.hits.set(self.hits.get() + 1);
            return Ok(rules);
        }

        self.misses.set(self.misses.get() + 1);
        let rules = self.inner.load(source).await?;
        self.cache
            .borrow_mut()
            .put(source.to_string(), rules.clone());
        Ok(rules)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    struct CountingLoader {
        calls: Cell<usize>,
    }

    #[async_trait(?Send)]
    impl SubRuleLoader for CountingLoader {
        async fn load(&self, source: &str) -> Result<Vec<Rule>> {
            self.calls.set(self.calls.get() + 1);
            if source == "broken" {
                return Err(PageLingoError::SubRules("boom".to_string()));
            }
            Ok(vec![Rule::for_pattern(source)])
        }
    }

    #[tokio::test]
    async fn cache_serves_repeated_sources() {
        let loader = CachedSubRuleLoader::new(
            CountingLoader {
                calls: Cell::new(0),
            },
            4,
        );

        loader.load("a.com").await.unwrap();
        let rules = loader.load("a.com").await.unwrap();
        assert_eq!(rules[0].pattern, "a.com");
        assert_eq!(loader.inner.calls.get(), 1);
        assert_eq!(loader.stats(), CacheStats { hits: 1, misses: 1 });

        assert!(loader.invalidate("a.com"));
        loader.load("a.com").await.unwrap();
        assert_eq!(loader.inner.calls.get(), 2);
    }

    #[tokio::test]
    async fn failures_are_not_cached() {
        let loader = CachedSubRuleLoader::new(
            CountingLoader {
                calls: Cell::new(0),
            },
            4,
        );

        assert!(loader.load("broken").await.is_err());
        assert!(loader.load("broken").await.is_err());
        assert_eq!(loader.inner.calls.get(), 2);
        assert!(loader.is_empty());
    }

    #[tokio::test]
    async fn file_loader_reads_relative_and_file_urls() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("subrules.json");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(file, r#"[{{"pattern": "docs.rs", "selector": "p"}}, 1]"#).unwrap();

        let loader = FileSubRuleLoader::with_base_dir(dir.path());
        let rules = loader.load("subrules.json").await.unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].selector, "p");

        let url = Url::from_file_path(&path).unwrap();
        let rules = FileSubRuleLoader::new().load(url.as_str()).await.unwrap();
        assert_eq!(rules[0].pattern, "docs.rs");
    }

    #[tokio::test]
    async fn file_loader_rejects_remote_sources() {
        let err = FileSubRuleLoader::new()
            .load("https://rules.example.com/list.json")
            .await
            .unwrap_err();
        assert!(err.is_fail_soft());
    }
}
