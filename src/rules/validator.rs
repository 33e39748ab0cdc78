//! 规则校验
//!
//! 把任意来源的规则数据清洗成封闭的规则结构。只有顶层结构错误会失败，
//! 单条规则里的非法值一律退回全局标记。

use std::collections::HashSet;

use serde_json::{Map, Value};

use super::types::{parse_bool_key, Inherit, Lang, Rule, TextStyle, Translator};
use crate::error::{PageLingoError, Result};

/// 解析并校验 JSON 形式的规则列表
pub fn parse_rules(text: &str) -> Result<Vec<Rule>> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| PageLingoError::Format(format!("无法解析规则数据: {}", e)))?;
    check_rules(&value)
}

/// 校验规则列表
pub fn check_rules(value: &Value) -> Result<Vec<Rule>> {
    let entries = value
        .as_array()
        .ok_or_else(|| PageLingoError::Format("规则数据不是列表".to_string()))?;

    let mut seen = HashSet::new();
    let mut rules = Vec::with_capacity(entries.len());

    for entry in entries {
        let Some(object) = entry.as_object() else {
            continue;
        };
        let Some(pattern) = object.get("pattern").and_then(Value::as_str) else {
            continue;
        };

        let pattern = pattern.trim();
        if !seen.insert(pattern.to_string()) {
            tracing::debug!("丢弃重复规则: {}", pattern);
            continue;
        }

        rules.push(sanitize_entry(pattern, object));
    }

    Ok(rules)
}

/// 序列化规则列表，输出可以再次通过校验
pub fn serialize_rules(rules: &[Rule]) -> Result<String> {
    Ok(serde_json::to_string_pretty(rules)?)
}

fn sanitize_entry(pattern: &str, object: &Map<String, Value>) -> Rule {
    Rule {
        pattern: pattern.to_string(),
        selector: string_field(object, "selector"),
        bg_color: string_field(object, "bgColor"),
        translator: Inherit::from_raw(raw_field(object, "translator"), Translator::parse),
        from_lang: Inherit::from_raw(raw_field(object, "fromLang"), Lang::source),
        to_lang: Inherit::from_raw(raw_field(object, "toLang"), Lang::target),
        text_style: Inherit::from_raw(raw_field(object, "textStyle"), TextStyle::parse),
        trans_open: trans_open_field(object),
        keep_selector: string_field(object, "keepSelector"),
        terms: string_field(object, "terms"),
    }
}

fn raw_field<'a>(object: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    object.get(key).and_then(Value::as_str)
}

/// 非字符串一律视为空字符串
fn string_field(object: &Map<String, Value>, key: &str) -> String {
    raw_field(object, key).unwrap_or_default().to_string()
}

/// `transOpen` 也接受 JSON 布尔值
fn trans_open_field(object: &Map<String, Value>) -> Inherit<bool> {
    match object.get("transOpen") {
        Some(Value::Bool(open)) => Inherit::Value(*open),
        other => Inherit::from_raw(other.and_then(Value::as_str), parse_bool_key),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rejects_non_list_input() {
        assert!(matches!(
            check_rules(&json!({"pattern": "*"})),
            Err(PageLingoError::Format(_))
        ));
        assert!(matches!(
            parse_rules("not json"),
            Err(PageLingoError::Format(_))
        ));
        assert!(matches!(parse_rules("\"[]\""), Err(PageLingoError::Format(_))));
    }

    #[test]
    fn drops_non_objects_and_duplicate_patterns() {
        let rules = check_rules(&json!([
            "junk",
            42,
            {"selector": "p"},
            {"pattern": 7},
            {"pattern": " a.com ", "selector": "p"},
            {"pattern": "a.com", "selector": "div"},
            {"pattern": "*"},
        ]))
        .unwrap();

        let patterns: Vec<&str> = rules.iter().map(|r| r.pattern.as_str()).collect();
        assert_eq!(patterns, vec!["a.com", "*"]);
        assert_eq!(rules[0].selector, "p");
    }

    #[test]
    fn coerces_fields_to_closed_schema() {
        let rules = check_rules(&json!([{
            "pattern": "x.org",
            "selector": 12,
            "bgColor": "#fff",
            "translator": "DeepL",
            "fromLang": "auto",
            "toLang": "auto",
            "textStyle": "wavy_line",
            "transOpen": "yes",
            "terms": ["a"],
        }]))
        .unwrap();

        let rule = &rules[0];
        assert_eq!(rule.selector, "");
        assert_eq!(rule.bg_color, "#fff");
        assert_eq!(rule.translator, Inherit::Global);
        assert_eq!(rule.from_lang, Inherit::Value(Lang::AUTO));
        assert_eq!(rule.to_lang, Inherit::Global);
        assert_eq!(rule.text_style, Inherit::Value(TextStyle::WavyLine));
        assert_eq!(rule.trans_open, Inherit::Global);
        assert_eq!(rule.terms, "");
    }

    #[test]
    fn boolean_trans_open_is_accepted() {
        let rules = check_rules(&json!([{"pattern": "*", "transOpen": true}])).unwrap();
        assert_eq!(rules[0].trans_open, Inherit::Value(true));
    }

    #[test]
    fn validation_is_idempotent() {
        let first = parse_rules(
            r#"[
                {"pattern": "example.com, *.example.com", "selector": "p; main >>> p",
                 "translator": "OpenAI", "toLang": "ja", "transOpen": "true",
                 "keepSelector": "code >>> b", "terms": "Rust,锈\nCargo"},
                {"pattern": "*", "fromLang": "nope"}
            ]"#,
        )
        .unwrap();

        let serialized = serialize_rules(&first).unwrap();
        let second = parse_rules(&serialized).unwrap();
        assert_eq!(first, second);
    }
}
