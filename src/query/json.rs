//! Dotted paths over JSON values.
//!
//! A path is a `.`-separated list of steps: a key selects an object member,
//! an integer selects an array element and `*` selects all members or
//! elements, e.g. `immoobjects.*.title`.

use serde_json::Value;

use super::{QueryNode, Scalar};
use crate::error::{AppError, Result};

/// Maximum length of a node serialization in diagnostics.
const DESCRIBE_LIMIT: usize = 200;

/// A matched JSON value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JsonNode<'a>(pub &'a Value);

impl<'a> JsonNode<'a> {
    pub fn value(&self) -> &'a Value {
        self.0
    }
}

impl QueryNode for JsonNode<'_> {
    type Path = JsonPath;

    fn parse_path(path: &str) -> Result<JsonPath> {
        JsonPath::parse(path)
    }

    fn select(&self, path: &JsonPath) -> Vec<Self> {
        path.evaluate(self.0).into_iter().map(JsonNode).collect()
    }

    fn scalar(&self) -> Option<Scalar> {
        match self.0 {
            Value::String(s) => Some(Scalar::Text(s.clone())),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Some(Scalar::Integer(i)),
                None => n.as_f64().map(Scalar::Float),
            },
            _ => None,
        }
    }

    fn type_name(&self) -> &'static str {
        match self.0 {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(n) if n.is_i64() || n.is_u64() => "int",
            Value::Number(_) => "float",
            Value::String(_) => "str",
            Value::Array(_) => "list",
            Value::Object(_) => "dict",
        }
    }

    fn describe(&self) -> String {
        let text = self.0.to_string();
        match text.char_indices().nth(DESCRIBE_LIMIT) {
            Some((end, _)) => format!("{}...", &text[..end]),
            None => text,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Name(String),
    Wildcard,
}

/// A parsed dotted JSON path.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonPath {
    segments: Vec<Segment>,
}

impl JsonPath {
    /// Parse a dotted path expression.
    pub fn parse(path: &str) -> Result<Self> {
        if path.trim().is_empty() {
            return Err(AppError::path(path, "empty path"));
        }
        let segments = path
            .split('.')
            .map(|segment| match segment {
                "" => Err(AppError::path(path, "empty step")),
                "*" => Ok(Segment::Wildcard),
                name => Ok(Segment::Name(name.to_string())),
            })
            .collect::<Result<_>>()?;
        Ok(Self { segments })
    }

    /// Evaluate the path against `root`, flattening matches step by step.
    pub fn evaluate<'a>(&self, root: &'a Value) -> Vec<&'a Value> {
        let mut matches = vec![root];
        for segment in &self.segments {
            matches = matches
                .into_iter()
                .flat_map(|value| Self::step(value, segment))
                .collect();
        }
        matches
    }

    fn step<'a>(value: &'a Value, segment: &Segment) -> Vec<&'a Value> {
        match (value, segment) {
            (Value::Object(map), Segment::Wildcard) => map.values().collect(),
            (Value::Object(map), Segment::Name(name)) => map.get(name).into_iter().collect(),
            (Value::Array(items), Segment::Wildcard) => items.iter().collect(),
            (Value::Array(items), Segment::Name(name)) => name
                .parse::<usize>()
                .ok()
                .and_then(|i| items.get(i))
                .into_iter()
                .collect(),
            _ => Vec::new(),
        }
    }
}
