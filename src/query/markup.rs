//! Simplified XPath over HTML element trees.
//!
//! Supported syntax, relative to the context element:
//!
//! - `tag`, `*`, `.`, `..` steps separated by `/`
//! - `//` between steps selects descendants, e.g. `.//li` or `div//a`
//! - predicates `[N]`, `[last()]`, `[last()-N]`, `[@attr]`, `[@attr='value']`
//!   and `[tag]` (has a child element `tag`)
//! - a final pseudo step `@attr` (the attribute value) or `tail()` (the text
//!   directly following the element)

use std::collections::{HashMap, HashSet};

use scraper::{ElementRef, Node};

use super::{QueryNode, Scalar};
use crate::error::{AppError, Result};

/// A matched markup node.
#[derive(Debug, Clone)]
pub enum MarkupNode<'a> {
    /// An element of the document
    Element(ElementRef<'a>),
    /// A synthetic node holding an attribute value or tail text
    Text { name: String, text: String },
}

impl<'a> MarkupNode<'a> {
    /// All text of the node, including that of descendants.
    pub fn text(&self) -> String {
        match self {
            MarkupNode::Element(element) => element.text().collect(),
            MarkupNode::Text { text, .. } => text.clone(),
        }
    }
}

impl QueryNode for MarkupNode<'_> {
    type Path = MarkupPath;

    fn parse_path(path: &str) -> Result<MarkupPath> {
        MarkupPath::parse(path)
    }

    fn select(&self, path: &MarkupPath) -> Vec<Self> {
        match self {
            MarkupNode::Element(element) => path.evaluate(*element),
            MarkupNode::Text { .. } if path.is_current() => vec![self.clone()],
            MarkupNode::Text { .. } => Vec::new(),
        }
    }

    fn scalar(&self) -> Option<Scalar> {
        Some(Scalar::Text(self.text()))
    }

    fn type_name(&self) -> &'static str {
        "element"
    }

    fn describe(&self) -> String {
        match self {
            MarkupNode::Element(element) => {
                let element = element.value();
                let attrs: String = element
                    .attrs()
                    .map(|(name, value)| format!(" {name}=\"{value}\""))
                    .collect();
                format!("<{}{} />", element.name(), attrs)
            }
            MarkupNode::Text { name, text } => format!("<{name}>{text}</{name}>"),
        }
    }
}

/// A parsed markup path.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkupPath {
    steps: Vec<Step>,
    pseudo: Option<Pseudo>,
}

#[derive(Debug, Clone, PartialEq)]
struct Step {
    descendant: bool,
    test: NodeTest,
    predicates: Vec<Predicate>,
}

#[derive(Debug, Clone, PartialEq)]
enum NodeTest {
    Current,
    Parent,
    Any,
    Name(String),
}

#[derive(Debug, Clone, PartialEq)]
enum Predicate {
    /// 1-based position
    Position(usize),
    /// Offset from the last position
    Last(usize),
    HasAttr(String),
    AttrEquals(String, String),
    HasChild(String),
}

#[derive(Debug, Clone, PartialEq)]
enum Pseudo {
    Attribute(String),
    Tail,
}

impl MarkupPath {
    /// Parse a path expression.
    pub fn parse(path: &str) -> Result<Self> {
        let trimmed = path.trim();
        if trimmed.is_empty() {
            return Err(AppError::path(path, "empty path"));
        }
        if trimmed.starts_with('/') {
            return Err(AppError::path(path, "absolute path"));
        }

        let mut segments = split_segments(trimmed).map_err(|e| AppError::path(path, e))?;

        let mut pseudo = None;
        if let Some(last) = segments.last() {
            if let Some(name) = last.strip_prefix('@') {
                if !is_name(name) {
                    return Err(AppError::path(path, format!("bad attribute {last}")));
                }
                pseudo = Some(Pseudo::Attribute(name.to_string()));
            } else if *last == "tail()" {
                pseudo = Some(Pseudo::Tail);
            }
        }
        if pseudo.is_some() {
            segments.pop();
            if segments.last().is_some_and(|s| s.is_empty()) {
                return Err(AppError::path(path, "empty step"));
            }
        }

        let mut steps = Vec::new();
        let mut descendant = false;
        let count = segments.len();
        for (i, segment) in segments.into_iter().enumerate() {
            if segment.is_empty() {
                if i == 0 || i + 1 == count || descendant {
                    return Err(AppError::path(path, "empty step"));
                }
                descendant = true;
                continue;
            }
            let step = parse_step(segment, descendant).map_err(|e| AppError::path(path, e))?;
            steps.push(step);
            descendant = false;
        }
        if steps.is_empty() {
            steps.push(Step {
                descendant: false,
                test: NodeTest::Current,
                predicates: Vec::new(),
            });
        }

        Ok(Self { steps, pseudo })
    }

    fn is_current(&self) -> bool {
        self.pseudo.is_none()
            && self.steps.len() == 1
            && self.steps[0].test == NodeTest::Current
            && self.steps[0].predicates.is_empty()
    }

    /// Evaluate the path against `root`.
    ///
    /// Each step is applied to every current match and the results are
    /// flattened in encounter order before the next step.
    pub fn evaluate<'a>(&self, root: ElementRef<'a>) -> Vec<MarkupNode<'a>> {
        let mut matches = vec![root];
        for step in &self.steps {
            let mut seen = HashSet::new();
            let mut next = Vec::new();
            for element in matches {
                let mut found = Vec::new();
                step.apply(element, &mut found);
                next.extend(found.into_iter().filter(|e| seen.insert(e.id())));
            }
            matches = next;
        }

        matches
            .into_iter()
            .filter_map(|element| match &self.pseudo {
                None => Some(MarkupNode::Element(element)),
                Some(Pseudo::Attribute(name)) => {
                    element.value().attr(name).map(|value| MarkupNode::Text {
                        name: name.clone(),
                        text: value.to_string(),
                    })
                }
                Some(Pseudo::Tail) => tail(element).map(|text| MarkupNode::Text {
                    name: "#text".to_string(),
                    text,
                }),
            })
            .collect()
    }
}

impl Step {
    fn apply<'a>(&self, context: ElementRef<'a>, out: &mut Vec<ElementRef<'a>>) {
        if !self.descendant {
            return self.apply_child(context, out);
        }
        if matches!(self.test, NodeTest::Current | NodeTest::Parent) {
            for element in context.descendants().filter_map(ElementRef::wrap) {
                self.apply_child(element, out);
            }
            return;
        }

        // Visit descendants in document order; position predicates still
        // count among the children of each parent.
        let mut selected = HashMap::new();
        for element in context.descendants().skip(1).filter_map(ElementRef::wrap) {
            let Some(parent) = element.parent().and_then(ElementRef::wrap) else {
                continue;
            };
            let chosen = selected.entry(parent.id()).or_insert_with(|| {
                let mut children = Vec::new();
                self.apply_child(parent, &mut children);
                children.iter().map(|child| child.id()).collect::<HashSet<_>>()
            });
            if chosen.contains(&element.id()) {
                out.push(element);
            }
        }
    }

    fn apply_child<'a>(&self, context: ElementRef<'a>, out: &mut Vec<ElementRef<'a>>) {
        let mut candidates: Vec<ElementRef<'a>> = match &self.test {
            NodeTest::Current => vec![context],
            NodeTest::Parent => context.parent().and_then(ElementRef::wrap).into_iter().collect(),
            NodeTest::Any => context.children().filter_map(ElementRef::wrap).collect(),
            NodeTest::Name(name) => context
                .children()
                .filter_map(ElementRef::wrap)
                .filter(|child| child.value().name().eq_ignore_ascii_case(name))
                .collect(),
        };

        for predicate in &self.predicates {
            candidates = match predicate {
                Predicate::Position(n) => candidates.get(n - 1).copied().into_iter().collect(),
                Predicate::Last(offset) => candidates
                    .len()
                    .checked_sub(offset + 1)
                    .and_then(|i| candidates.get(i).copied())
                    .into_iter()
                    .collect(),
                Predicate::HasAttr(name) => candidates
                    .into_iter()
                    .filter(|e| e.value().attr(name).is_some())
                    .collect(),
                Predicate::AttrEquals(name, value) => candidates
                    .into_iter()
                    .filter(|e| e.value().attr(name) == Some(value.as_str()))
                    .collect(),
                Predicate::HasChild(name) => candidates
                    .into_iter()
                    .filter(|e| {
                        e.children()
                            .filter_map(ElementRef::wrap)
                            .any(|c| c.value().name().eq_ignore_ascii_case(name))
                    })
                    .collect(),
            };
        }

        out.extend(candidates);
    }
}

/// Text directly following `element`, up to its next sibling element.
fn tail(element: ElementRef<'_>) -> Option<String> {
    let text: String = element
        .next_siblings()
        .take_while(|node| !node.value().is_element())
        .filter_map(|node| match node.value() {
            Node::Text(text) => Some(&**text),
            _ => None,
        })
        .collect();
    (!text.is_empty()).then_some(text)
}

/// Split on `/` outside of predicates and quotes.
fn split_segments(path: &str) -> std::result::Result<Vec<&str>, String> {
    let mut segments = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;

    for (i, c) in path.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, '[') => depth += 1,
            (None, ']') => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| "unbalanced ]".to_string())?;
            }
            (None, '/') if depth == 0 => {
                segments.push(&path[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if quote.is_some() {
        return Err("unclosed quote".to_string());
    }
    if depth > 0 {
        return Err("unclosed predicate".to_string());
    }
    segments.push(&path[start..]);
    Ok(segments)
}

fn parse_step(segment: &str, descendant: bool) -> std::result::Result<Step, String> {
    let (test, rest) = match segment.find('[') {
        Some(i) => (&segment[..i], &segment[i..]),
        None => (segment, ""),
    };
    let test = match test {
        "." => NodeTest::Current,
        ".." => NodeTest::Parent,
        "*" => NodeTest::Any,
        name if is_name(name) => NodeTest::Name(name.to_string()),
        other => return Err(format!("bad step {other}")),
    };

    let mut predicates = Vec::new();
    let mut rest = rest;
    while !rest.is_empty() {
        let body = rest
            .strip_prefix('[')
            .ok_or_else(|| format!("unexpected {rest}"))?;
        let end = predicate_end(body).ok_or_else(|| "unclosed predicate".to_string())?;
        predicates.push(parse_predicate(body[..end].trim())?);
        rest = &body[end + 1..];
    }

    Ok(Step {
        descendant,
        test,
        predicates,
    })
}

/// Index of the `]` closing a predicate body.
fn predicate_end(body: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    for (i, c) in body.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, ']') => return Some(i),
            _ => {}
        }
    }
    None
}

fn parse_predicate(body: &str) -> std::result::Result<Predicate, String> {
    if !body.is_empty() && body.bytes().all(|b| b.is_ascii_digit()) {
        return match body.parse::<usize>() {
            Ok(n) if n >= 1 => Ok(Predicate::Position(n)),
            _ => Err(format!("bad position {body}")),
        };
    }

    if let Some(offset) = body.strip_prefix("last()") {
        let offset = offset.trim();
        if offset.is_empty() {
            return Ok(Predicate::Last(0));
        }
        return offset
            .strip_prefix('-')
            .and_then(|n| n.trim().parse::<usize>().ok())
            .map(Predicate::Last)
            .ok_or_else(|| format!("bad predicate {body}"));
    }

    if let Some(attr) = body.strip_prefix('@') {
        return match attr.split_once('=') {
            None if is_name(attr.trim()) => Ok(Predicate::HasAttr(attr.trim().to_string())),
            Some((name, value)) if is_name(name.trim()) => {
                let value = unquote(value.trim()).ok_or_else(|| format!("bad value {value}"))?;
                Ok(Predicate::AttrEquals(name.trim().to_string(), value.to_string()))
            }
            _ => Err(format!("bad predicate {body}")),
        };
    }

    if is_name(body) {
        return Ok(Predicate::HasChild(body.to_string()));
    }
    Err(format!("bad predicate {body}"))
}

fn unquote(value: &str) -> Option<&str> {
    ['\'', '"'].into_iter().find_map(|q| {
        value
            .strip_prefix(q)
            .and_then(|v| v.strip_suffix(q))
            .filter(|v| !v.contains(q))
    })
}

fn is_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    const ADS: &str = r#"<ul>
        <li class="ad"><a href="x.html">Title</a><span>Loc</span></li>
        <li class="ad promoted"><a href="y.html">Other</a><span>Elsewhere</span></li>
        <li class="ad"><a>No link</a><span>Nowhere</span> 3 rooms<em>!</em></li>
    </ul>"#;

    fn texts(nodes: &[MarkupNode<'_>]) -> Vec<String> {
        nodes.iter().map(MarkupNode::text).collect()
    }

    fn query(doc: &Html, path: &str) -> Vec<String> {
        texts(&MarkupPath::parse(path).unwrap().evaluate(doc.root_element()))
    }

    #[test]
    fn test_ad_fields() {
        let doc = Html::parse_document(ADS);
        let root = MarkupNode::Element(doc.root_element());
        let ads = root.query(".//li[@class='ad']").unwrap();
        assert_eq!(ads.len(), 2);

        assert_eq!(texts(&ads[0].query("a/@href").unwrap()), ["x.html"]);
        assert_eq!(texts(&ads[0].query("a").unwrap()), ["Title"]);
        assert!(ads[1].query("a/@href").unwrap().is_empty());
    }

    #[test]
    fn test_flattens_in_encounter_order() {
        let doc = Html::parse_document(ADS);
        assert_eq!(query(&doc, ".//li/span"), ["Loc", "Elsewhere", "Nowhere"]);
        assert_eq!(query(&doc, ".//li/a/@href"), ["x.html", "y.html"]);
    }

    #[test]
    fn test_position_predicates() {
        let doc = Html::parse_document(ADS);
        assert_eq!(query(&doc, "body/ul/li[2]/a"), ["Other"]);
        assert_eq!(query(&doc, "body/ul/li[last()]/span"), ["Nowhere"]);
        assert_eq!(query(&doc, "body/ul/li[last()-1]/span"), ["Elsewhere"]);
        assert!(query(&doc, "body/ul/li[4]").is_empty());
    }

    #[test]
    fn test_attribute_and_child_predicates() {
        let doc = Html::parse_document(ADS);
        assert_eq!(query(&doc, ".//li[em]/a"), ["No link"]);
        assert_eq!(query(&doc, ".//a[@href]"), ["Title", "Other"]);
        assert_eq!(query(&doc, ".//a[@href=\"y.html\"]"), ["Other"]);
    }

    #[test]
    fn test_tail() {
        let doc = Html::parse_document(ADS);
        assert_eq!(query(&doc, ".//li/span/tail()"), [" 3 rooms"]);
    }

    #[test]
    fn test_tail_absent_between_elements() {
        let doc = Html::parse_document("<p><b>a</b><i>b</i></p>");
        assert!(query(&doc, ".//b/tail()").is_empty());
    }

    #[test]
    fn test_current_parent_and_wildcard() {
        let doc = Html::parse_document(ADS);
        let root = MarkupNode::Element(doc.root_element());
        let li = root.query(".//li[1]").unwrap();
        assert_eq!(li.len(), 1);
        assert_eq!(texts(&li[0].query(".").unwrap()), ["TitleLoc"]);
        assert_eq!(texts(&li[0].query("*").unwrap()), ["Title", "Loc"]);
        assert_eq!(texts(&li[0].query("a/../span").unwrap()), ["Loc"]);
        assert_eq!(texts(&li[0].query("@class").unwrap()), ["ad"]);
    }

    #[test]
    fn test_descendants_in_document_order() {
        let doc = Html::parse_document("<div><p><span>A</span></p><span>B</span></div>");
        assert_eq!(query(&doc, ".//span"), ["A", "B"]);
        assert_eq!(query(&doc, "body/div//span"), ["A", "B"]);

        let root = MarkupNode::Element(doc.root_element());
        let div = &root.query(".//div").unwrap()[0];
        assert_eq!(crate::query::field::extract(div, ".//span", false).unwrap(), "A");
    }

    #[test]
    fn test_descendant_position_counts_per_parent() {
        let doc = Html::parse_document(
            r#"<ul><li id="a"><ul><li id="b"></li><li id="c"></li></ul></li><li id="d"></li></ul>"#,
        );
        assert_eq!(query(&doc, ".//li[1]/@id"), ["a", "b"]);
        assert_eq!(query(&doc, ".//li[last()]/@id"), ["c", "d"]);
        assert_eq!(query(&doc, ".//li/@id"), ["a", "b", "c", "d"]);
    }

    #[test]
    fn test_inner_descendant_deduplicates() {
        let doc = Html::parse_document("<div><div><a>x</a></div></div>");
        assert_eq!(query(&doc, ".//div//a"), ["x"]);
    }

    #[test]
    fn test_describe() {
        let doc = Html::parse_document(ADS);
        let root = MarkupNode::Element(doc.root_element());
        let ads = root.query(".//li[1]").unwrap();
        assert_eq!(ads[0].describe(), "<li class=\"ad\" />");
    }

    #[test]
    fn test_malformed_paths() {
        for path in ["", "/html", "div[2", "div]", "a//", "a///b", "div[@class='x]", "a/b c", "li[0]", "li[foo()]", "@"] {
            let err = MarkupPath::parse(path).unwrap_err();
            assert!(matches!(err, AppError::Path { .. }), "{path}");
        }
    }

    #[test]
    fn test_slash_inside_predicate() {
        let doc = Html::parse_document(r#"<p><a href="/x/y">link</a></p>"#);
        assert_eq!(query(&doc, ".//a[@href='/x/y']"), ["link"]);
    }
}
