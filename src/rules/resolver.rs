//! 规则解析
//!
//! 为页面挑选一条规则（按列表顺序第一个命中的），并用全局规则补全
//! 空的选择器、背景色和所有全局标记字段。

use super::matcher::is_match;
use super::subrules::{SubRuleLoader, SubRuleSource};
use super::types::{Rule, ResolvedRule};

/// 解析选项
#[derive(Debug, Clone, Default)]
pub struct ResolveOptions {
    /// 是否注入订阅规则
    pub inject_rules: bool,
    pub subrules: Vec<SubRuleSource>,
}

impl ResolveOptions {
    pub fn selected_source(&self) -> Option<&SubRuleSource> {
        self.subrules.iter().find(|source| source.selected)
    }
}

/// 解析页面规则，必要时先注入订阅规则
///
/// 订阅规则加载失败只记录日志，本地规则照常生效。
pub async fn resolve_rule<L>(
    rules: &[Rule],
    href: &str,
    options: &ResolveOptions,
    loader: &L,
) -> ResolvedRule
where
    L: SubRuleLoader + ?Sized,
{
    if !options.inject_rules {
        return match_rule(rules, href);
    }

    let Some(source) = options.selected_source() else {
        return match_rule(rules, href);
    };

    match loader.load(&source.url).await {
        Ok(subrules) => {
            tracing::debug!("注入 {} 条订阅规则: {}", subrules.len(), source.url);
            match_rule(&splice_subrules(rules, subrules), href)
        }
        Err(e) => {
            tracing::warn!("加载订阅规则失败 {}: {}", source.url, e);
            match_rule(rules, href)
        }
    }
}

/// 把订阅规则插到最后一条规则之前
pub fn splice_subrules(rules: &[Rule], subrules: Vec<Rule>) -> Vec<Rule> {
    let mut working = rules.to_vec();
    let at = working.len().saturating_sub(1);
    working.splice(at..at, subrules);
    working
}

/// 在规则列表中解析页面规则
pub fn match_rule(rules: &[Rule], href: &str) -> ResolvedRule {
    let builtin = Rule::builtin_global();
    let global = resolve_global(rules.iter().find(|rule| rule.is_global()), &builtin);

    let matched = rules
        .iter()
        .find(|rule| rule.pattern_fragments().any(|pattern| is_match(href, pattern)));

    match matched {
        Some(rule) => inherit_from(rule, &global),
        None => global,
    }
}

/// 全局规则自身剩下的全局标记退回内置默认值
fn resolve_global(global: Option<&Rule>, builtin: &Rule) -> ResolvedRule {
    let fallback = concrete(builtin);
    match global {
        Some(rule) => inherit_from(rule, &fallback),
        None => fallback,
    }
}

fn inherit_from(rule: &Rule, global: &ResolvedRule) -> ResolvedRule {
    ResolvedRule {
        pattern: rule.pattern.clone(),
        selector: non_empty_or(&rule.selector, &global.selector),
        bg_color: non_empty_or(&rule.bg_color, &global.bg_color),
        translator: rule.translator.or_inherit(global.translator),
        from_lang: rule.from_lang.or_inherit(global.from_lang),
        to_lang: rule.to_lang.or_inherit(global.to_lang),
        text_style: rule.text_style.or_inherit(global.text_style),
        trans_open: rule.trans_open.or_inherit(global.trans_open),
        keep_selector: rule.keep_selector.clone(),
        terms: rule.terms.clone(),
    }
}

/// 内置规则不含全局标记
fn concrete(builtin: &Rule) -> ResolvedRule {
    use super::types::{Lang, TextStyle, Translator};

    ResolvedRule {
        pattern: builtin.pattern.clone(),
        selector: builtin.selector.clone(),
        bg_color: builtin.bg_color.clone(),
        translator: builtin.translator.or_inherit(Translator::Google),
        from_lang: builtin.from_lang.or_inherit(Lang::AUTO),
        to_lang: builtin.to_lang.or_inherit(Lang::ZH_CN),
        text_style: builtin.text_style.or_inherit(TextStyle::Plain),
        trans_open: builtin.trans_open.or_inherit(false),
        keep_selector: builtin.keep_selector.clone(),
        terms: builtin.terms.clone(),
    }
}

fn non_empty_or(value: &str, fallback: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        fallback.trim().to_string()
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::types::{Inherit, Lang, TextStyle, Translator, DEFAULT_SELECTOR};

    fn site(pattern: &str, selector: &str) -> Rule {
        Rule {
            selector: selector.to_string(),
            ..Rule::for_pattern(pattern)
        }
    }

    #[test]
    fn empty_rule_set_resolves_to_builtin() {
        let resolved = match_rule(&[], "https://example.com");
        assert_eq!(resolved.pattern, "*");
        assert_eq!(resolved.selector, DEFAULT_SELECTOR);
        assert_eq!(resolved.translator, Translator::Google);
        assert_eq!(resolved.to_lang, Lang::ZH_CN);
        assert!(!resolved.trans_open);
    }

    #[test]
    fn first_match_wins() {
        let rules = vec![
            site("example.com", "p"),
            site("example.com/docs", "article"),
            site("*", "div"),
        ];
        assert_eq!(match_rule(&rules, "https://example.com/docs").selector, "p");
    }

    #[test]
    fn pattern_fragments_are_trimmed() {
        let rules = vec![site("a.com,  b.com ", "main"), site("*", "div")];
        assert_eq!(match_rule(&rules, "https://b.com/x").selector, "main");
        assert_eq!(match_rule(&rules, "https://c.com/x").selector, "div");
    }

    #[test]
    fn sentinels_inherit_from_global_rule() {
        let mut global = site("*", "div");
        global.from_lang = Inherit::Value(Lang::EN);
        global.text_style = Inherit::Value(TextStyle::Fuzzy);
        global.bg_color = "#eee".to_string();

        let rules = vec![site("example.com", "  "), global];
        let resolved = match_rule(&rules, "http://example.com/");
        assert_eq!(resolved.pattern, "example.com");
        assert_eq!(resolved.selector, "div");
        assert_eq!(resolved.bg_color, "#eee");
        assert_eq!(resolved.from_lang, Lang::EN);
        assert_eq!(resolved.text_style, TextStyle::Fuzzy);
        // 全局规则里的全局标记退回内置默认值
        assert_eq!(resolved.translator, Translator::Google);
        assert_eq!(resolved.to_lang, Lang::ZH_CN);
    }

    #[test]
    fn global_without_selector_uses_builtin_selector() {
        let rules = vec![Rule::for_pattern("example.com")];
        let resolved = match_rule(&rules, "https://example.com");
        assert_eq!(resolved.selector, DEFAULT_SELECTOR);
    }

    #[test]
    fn splice_inserts_before_last_rule() {
        let rules = vec![site("a", ""), site("*", "")];
        let spliced = splice_subrules(&rules, vec![site("s1", ""), site("s2", "")]);
        let patterns: Vec<&str> = spliced.iter().map(|r| r.pattern.as_str()).collect();
        assert_eq!(patterns, vec!["a", "s1", "s2", "*"]);

        let spliced = splice_subrules(&[], vec![site("s1", "")]);
        assert_eq!(spliced.len(), 1);
    }
}
