//! CSS 选择器模块
//!
//! 规则里的 `selector` 与 `keepSelector` 都是 CSS 选择器。本模块用 cssparser
//! 把选择器文本切分成记号，编译成可以直接在 rcdom 树上求值的结构，并提供
//! `querySelectorAll` / `matches` 语义的查询。
//!
//! # 支持的语法
//!
//! - 类型选择器、`*`、`#id`、`.class`
//! - 属性选择器：`[a]`、`[a=v]`、`[a~=v]`、`[a|=v]`、`[a^=v]`、`[a$=v]`、`[a*=v]`，可带 `i` 标志
//! - 伪类：`:first-child`、`:last-child`、`:only-child`、`:empty`、`:root`、
//!   `:not(...)`、`:is(...)`、`:where(...)`
//! - 组合符：后代（空白）、`>`、`+`、`~`，以及逗号分隔的选择器列表
//!
//! 与浏览器一致，组合符的祖先匹配在影子根处终止，查询从不进入 template 内容。

use std::rc::Rc;

use cssparser::{ParseError, ParseErrorKind, Parser, ParserInput, Token};
use markup5ever_rcdom::{Handle, NodeData};
use thiserror::Error;

use crate::parsers::html::dom::{
    descendant_elements, find_descendant, get_node_attr, get_parent_node, is_element,
};

/// 选择器编译错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("选择器无效 `{selector}`: {reason}")]
pub struct SelectorError {
    pub selector: String,
    pub reason: String,
}

type ParseResult<'i, T> = Result<T, ParseError<'i, &'static str>>;

/// 编译后的选择器列表
#[derive(Debug, Clone, PartialEq)]
pub struct SelectorList {
    selectors: Vec<ComplexSelector>,
}

/// 复合选择器链，按从右到左存放
#[derive(Debug, Clone, PartialEq)]
struct ComplexSelector {
    subject: Compound,
    /// 每一项描述“右侧复合选择器与其左侧复合选择器的关系”
    ancestors: Vec<(Combinator, Compound)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
    NextSibling,
    SubsequentSibling,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct Compound {
    tag: Option<String>,
    universal: bool,
    simples: Vec<Simple>,
}

#[derive(Debug, Clone, PartialEq)]
enum Simple {
    Id(String),
    Class(String),
    Attr(AttrSelector),
    FirstChild,
    LastChild,
    OnlyChild,
    Empty,
    Root,
    Not(SelectorList),
    Is(SelectorList),
}

#[derive(Debug, Clone, PartialEq)]
struct AttrSelector {
    name: String,
    condition: Option<AttrCondition>,
}

#[derive(Debug, Clone, PartialEq)]
struct AttrCondition {
    op: AttrOp,
    value: String,
    case_insensitive: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttrOp {
    Equals,
    Includes,
    DashMatch,
    Prefix,
    Suffix,
    Substring,
}

impl SelectorList {
    /// 编译选择器文本
    pub fn parse(selector: &str) -> Result<Self, SelectorError> {
        let mut input = ParserInput::new(selector);
        let mut parser = Parser::new(&mut input);

        parse_selector_list(&mut parser)
            .map(|selectors| SelectorList { selectors })
            .map_err(|e| SelectorError {
                selector: selector.to_string(),
                reason: describe_error(&e),
            })
    }

    /// 元素是否匹配（`Element.matches`）
    pub fn matches(&self, element: &Handle) -> bool {
        is_element(element) && self.selectors.iter().any(|s| s.matches(element))
    }

    /// `root` 子树内所有匹配的元素，按文档顺序（`querySelectorAll`）
    pub fn query_all(&self, root: &Handle) -> Vec<Handle> {
        descendant_elements(root)
            .into_iter()
            .filter(|node| self.matches(node))
            .collect()
    }

    /// `root` 子树内第一个匹配的元素（`querySelector`）
    pub fn query_first(&self, root: &Handle) -> Option<Handle> {
        find_descendant(root, |node| self.matches(node))
    }
}

impl ComplexSelector {
    fn matches(&self, element: &Handle) -> bool {
        self.subject.matches(element) && matches_chain(&self.ancestors, element)
    }
}

fn matches_chain(chain: &[(Combinator, Compound)], element: &Handle) -> bool {
    let Some(((combinator, compound), rest)) = chain.split_first() else {
        return true;
    };

    match combinator {
        Combinator::Child => parent_element(element)
            .map(|parent| compound.matches(&parent) && matches_chain(rest, &parent))
            .unwrap_or(false),
        Combinator::Descendant => {
            let mut current = parent_element(element);
            while let Some(ancestor) = current {
                if compound.matches(&ancestor) && matches_chain(rest, &ancestor) {
                    return true;
                }
                current = parent_element(&ancestor);
            }
            false
        }
        Combinator::NextSibling => previous_element_siblings(element)
            .first()
            .map(|sibling| compound.matches(sibling) && matches_chain(rest, sibling))
            .unwrap_or(false),
        Combinator::SubsequentSibling => previous_element_siblings(element)
            .iter()
            .any(|sibling| compound.matches(sibling) && matches_chain(rest, sibling)),
    }
}

impl Compound {
    fn is_empty(&self) -> bool {
        self.tag.is_none() && !self.universal && self.simples.is_empty()
    }

    fn matches(&self, element: &Handle) -> bool {
        let NodeData::Element { name, .. } = &element.data else {
            return false;
        };

        if let Some(tag) = &self.tag {
            if !str::eq_ignore_ascii_case(&name.local, tag) {
                return false;
            }
        }

        self.simples.iter().all(|simple| simple.matches(element))
    }
}

impl Simple {
    fn matches(&self, element: &Handle) -> bool {
        match self {
            Simple::Id(id) => get_node_attr(element, "id").as_deref() == Some(id.as_str()),
            Simple::Class(class) => get_node_attr(element, "class")
                .map(|value| value.split_ascii_whitespace().any(|c| c == class.as_str()))
                .unwrap_or(false),
            Simple::Attr(attr) => attr.matches(element),
            Simple::FirstChild => previous_element_siblings(element).is_empty(),
            Simple::LastChild => next_element_sibling_count(element) == 0,
            Simple::OnlyChild => {
                previous_element_siblings(element).is_empty()
                    && next_element_sibling_count(element) == 0
            }
            Simple::Empty => element.children.borrow().iter().all(|child| match &child.data {
                NodeData::Element { .. } => false,
                NodeData::Text { contents } => contents.borrow().is_empty(),
                _ => true,
            }),
            Simple::Root => get_parent_node(element)
                .map(|parent| matches!(parent.data, NodeData::Document))
                .unwrap_or(false),
            Simple::Not(list) => !list.matches(element),
            Simple::Is(list) => list.matches(element),
        }
    }
}

impl AttrSelector {
    fn matches(&self, element: &Handle) -> bool {
        let Some(actual) = get_node_attr(element, &self.name) else {
            return false;
        };
        let Some(condition) = &self.condition else {
            return true;
        };

        let (actual, expected) = if condition.case_insensitive {
            (actual.to_lowercase(), condition.value.to_lowercase())
        } else {
            (actual, condition.value.clone())
        };

        match condition.op {
            AttrOp::Equals => actual == expected,
            AttrOp::Includes => actual.split_ascii_whitespace().any(|word| word == expected),
            AttrOp::DashMatch => {
                actual == expected || actual.starts_with(&format!("{}-", expected))
            }
            AttrOp::Prefix => !expected.is_empty() && actual.starts_with(&expected),
            AttrOp::Suffix => !expected.is_empty() && actual.ends_with(&expected),
            AttrOp::Substring => !expected.is_empty() && actual.contains(&expected),
        }
    }
}

fn parent_element(element: &Handle) -> Option<Handle> {
    get_parent_node(element).filter(is_element)
}

/// 之前的兄弟元素，离自身最近的排在最前
fn previous_element_siblings(element: &Handle) -> Vec<Handle> {
    let Some(parent) = get_parent_node(element) else {
        return Vec::new();
    };
    let children = parent.children.borrow();
    let position = children
        .iter()
        .position(|child| Rc::ptr_eq(child, element))
        .unwrap_or(0);

    children[..position]
        .iter()
        .rev()
        .filter(|child| is_element(child))
        .cloned()
        .collect()
}

fn next_element_sibling_count(element: &Handle) -> usize {
    let Some(parent) = get_parent_node(element) else {
        return 0;
    };
    let children = parent.children.borrow();
    match children.iter().position(|child| Rc::ptr_eq(child, element)) {
        Some(position) => children[position + 1..]
            .iter()
            .filter(|child| is_element(child))
            .count(),
        None => 0,
    }
}

fn describe_error(error: &ParseError<'_, &'static str>) -> String {
    let reason = match &error.kind {
        ParseErrorKind::Basic(kind) => format!("{:?}", kind),
        ParseErrorKind::Custom(message) => message.to_string(),
    };
    format!("{} (第 {} 列)", reason, error.location.column)
}

fn parse_selector_list<'i, 't>(parser: &mut Parser<'i, 't>) -> ParseResult<'i, Vec<ComplexSelector>> {
    let mut selectors = Vec::new();
    loop {
        let (selector, more) = parse_complex_selector(parser)?;
        selectors.push(selector);
        if !more {
            return Ok(selectors);
        }
    }
}

/// 解析一个复合选择器链，返回是否后面还跟着逗号
fn parse_complex_selector<'i, 't>(
    parser: &mut Parser<'i, 't>,
) -> ParseResult<'i, (ComplexSelector, bool)> {
    // 从左到右收集：复合选择器及其右侧的组合符
    let mut chain: Vec<(Compound, Combinator)> = Vec::new();
    let mut current: Option<Compound> = None;
    // (组合符, 是否显式写出)
    let mut pending: Option<(Combinator, bool)> = None;
    let mut more = false;

    loop {
        let token = match parser.next_including_whitespace() {
            Ok(token) => token.clone(),
            Err(_) => break,
        };

        let combinator = match token {
            Token::WhiteSpace(_) => {
                if current.is_some() && pending.is_none() {
                    pending = Some((Combinator::Descendant, false));
                }
                continue;
            }
            Token::Comma => {
                more = true;
                break;
            }
            Token::Delim('>') => Some(Combinator::Child),
            Token::Delim('+') => Some(Combinator::NextSibling),
            Token::Delim('~') => Some(Combinator::SubsequentSibling),
            _ => None,
        };

        if let Some(combinator) = combinator {
            if current.is_none() || matches!(pending, Some((_, true))) {
                return Err(parser.new_custom_error("组合符位置错误"));
            }
            pending = Some((combinator, true));
            continue;
        }

        if let Some((combinator, _)) = pending.take() {
            if let Some(finished) = current.take() {
                chain.push((finished, combinator));
            }
        }
        let compound = current.get_or_insert_with(Compound::default);
        parse_simple_selector(parser, token, compound)?;
    }

    if matches!(pending, Some((_, true))) {
        return Err(parser.new_custom_error("选择器以组合符结尾"));
    }
    let Some(subject) = current else {
        return Err(parser.new_custom_error("空选择器"));
    };

    let ancestors = chain
        .into_iter()
        .rev()
        .map(|(compound, combinator)| (combinator, compound))
        .collect();

    Ok((ComplexSelector { subject, ancestors }, more))
}

fn parse_simple_selector<'i, 't>(
    parser: &mut Parser<'i, 't>,
    token: Token<'i>,
    compound: &mut Compound,
) -> ParseResult<'i, ()> {
    match token {
        Token::Ident(name) => {
            if !compound.is_empty() {
                return Err(parser.new_custom_error("类型选择器必须位于复合选择器开头"));
            }
            compound.tag = Some(name.to_ascii_lowercase());
        }
        Token::Delim('*') => {
            if !compound.is_empty() {
                return Err(parser.new_custom_error("通配符必须位于复合选择器开头"));
            }
            compound.universal = true;
        }
        Token::IDHash(id) => compound.simples.push(Simple::Id(id.to_string())),
        Token::Delim('.') => match parser.next_including_whitespace()?.clone() {
            Token::Ident(class) => compound.simples.push(Simple::Class(class.to_string())),
            _ => return Err(parser.new_custom_error("类名无效")),
        },
        Token::SquareBracketBlock => {
            let attr = parser.parse_nested_block(|p| parse_attribute(p))?;
            compound.simples.push(Simple::Attr(attr));
        }
        Token::Colon => match parser.next_including_whitespace()?.clone() {
            Token::Ident(name) => {
                let simple = match name.to_ascii_lowercase().as_str() {
                    "first-child" => Simple::FirstChild,
                    "last-child" => Simple::LastChild,
                    "only-child" => Simple::OnlyChild,
                    "empty" => Simple::Empty,
                    "root" => Simple::Root,
                    _ => return Err(parser.new_custom_error("不支持的伪类")),
                };
                compound.simples.push(simple);
            }
            Token::Function(name) => {
                let name = name.to_ascii_lowercase();
                let list = parser.parse_nested_block(|p| parse_selector_list(p))?;
                let list = SelectorList { selectors: list };
                match name.as_str() {
                    "not" => compound.simples.push(Simple::Not(list)),
                    "is" | "where" | "matches" => compound.simples.push(Simple::Is(list)),
                    _ => return Err(parser.new_custom_error("不支持的伪类函数")),
                }
            }
            _ => return Err(parser.new_custom_error("不支持伪元素")),
        },
        _ => return Err(parser.new_custom_error("无法识别的记号")),
    }

    Ok(())
}

fn parse_attribute<'i, 't>(parser: &mut Parser<'i, 't>) -> ParseResult<'i, AttrSelector> {
    let name = match parser.next()?.clone() {
        Token::Ident(name) => name.to_ascii_lowercase(),
        _ => return Err(parser.new_custom_error("缺少属性名")),
    };

    if parser.is_exhausted() {
        return Ok(AttrSelector {
            name,
            condition: None,
        });
    }

    let op = match parser.next()?.clone() {
        Token::Delim('=') => AttrOp::Equals,
        Token::IncludeMatch => AttrOp::Includes,
        Token::DashMatch => AttrOp::DashMatch,
        Token::PrefixMatch => AttrOp::Prefix,
        Token::SuffixMatch => AttrOp::Suffix,
        Token::SubstringMatch => AttrOp::Substring,
        _ => return Err(parser.new_custom_error("属性运算符无效")),
    };

    let value = match parser.next()?.clone() {
        Token::Ident(value) | Token::QuotedString(value) => value.to_string(),
        _ => return Err(parser.new_custom_error("属性值无效")),
    };

    let case_insensitive = if parser.is_exhausted() {
        false
    } else {
        match parser.next()?.clone() {
            Token::Ident(flag) if flag.eq_ignore_ascii_case("i") => true,
            Token::Ident(flag) if flag.eq_ignore_ascii_case("s") => false,
            _ => return Err(parser.new_custom_error("属性标志无效")),
        }
    };
    parser.expect_exhausted()?;

    Ok(AttrSelector {
        name,
        condition: Some(AttrCondition {
            op,
            value,
            case_insensitive,
        }),
    })
}
