//! Field extraction.
//!
//! A field path is a path expression with an optional trailing regex
//! post-filter, `path[:pattern]`. The first match of the path wins; if a
//! pattern is given, the first regex match within its text is the value.

use std::fmt;

use regex::Regex;

use super::{JsonPath, Lookup, MarkupPath, QueryNode};
use crate::error::{AppError, Result};

/// A scalar field value.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Text(String),
    Integer(i64),
    Float(f64),
}

/// Kinds of [`Scalar`] a field may accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    Text,
    Integer,
    Float,
}

impl ScalarKind {
    /// Only strings.
    pub const TEXT: &'static [ScalarKind] = &[ScalarKind::Text];

    /// Strings and numbers, for fields coerced with [`fuzzy_float`].
    pub const NUMBER: &'static [ScalarKind] =
        &[ScalarKind::Text, ScalarKind::Integer, ScalarKind::Float];
}

impl Scalar {
    pub fn kind(&self) -> ScalarKind {
        match self {
            Scalar::Text(_) => ScalarKind::Text,
            Scalar::Integer(_) => ScalarKind::Integer,
            Scalar::Float(_) => ScalarKind::Float,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Scalar::Text(text) => text,
            other => other.to_string(),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Text(text) => f.write_str(text),
            Scalar::Integer(i) => write!(f, "{i}"),
            Scalar::Float(x) => write!(f, "{x}"),
        }
    }
}

/// Decimal and group separators used when reading numbers from text.
#[derive(Debug, Clone)]
pub struct NumberFormat {
    decimal_point: String,
    thousands_sep: String,
    number: Regex,
}

impl NumberFormat {
    /// Create a format; an empty decimal point means `.`.
    pub fn new(decimal_point: impl Into<String>, thousands_sep: impl Into<String>) -> Result<Self> {
        let mut decimal_point = decimal_point.into();
        if decimal_point.is_empty() {
            decimal_point = ".".to_string();
        }
        let thousands_sep = thousands_sep.into();

        // Simplified float grammar, e.g. `\d[,\d]*(\.\d+)?`
        let decimal = regex::escape(&decimal_point);
        let pattern = if thousands_sep.is_empty() {
            format!(r"\d+({decimal}\d+)?")
        } else {
            let group = regex::escape(&thousands_sep);
            format!(r"\d(?:{group}|\d)*({decimal}\d+)?")
        };
        let number = Regex::new(&pattern).map_err(|e| AppError::config(e.to_string()))?;

        Ok(Self {
            decimal_point,
            thousands_sep,
            number,
        })
    }

    pub fn decimal_point(&self) -> &str {
        &self.decimal_point
    }

    pub fn thousands_sep(&self) -> &str {
        &self.thousands_sep
    }

    /// Parse the first number in `text`, 0 if there is none.
    pub fn parse(&self, text: &str) -> f64 {
        self.number
            .find(text)
            .and_then(|m| {
                let mut number = m.as_str().to_string();
                if !self.thousands_sep.is_empty() {
                    number = number.replace(&self.thousands_sep, "");
                }
                number.replace(&self.decimal_point, ".").parse().ok()
            })
            .unwrap_or(0.0)
    }
}

/// Coerce a field value to a float.
///
/// Numbers are used as-is; text is searched for its first number.
pub fn fuzzy_float(value: &Scalar, format: &NumberFormat) -> f64 {
    match value {
        Scalar::Integer(i) => *i as f64,
        Scalar::Float(x) => *x,
        Scalar::Text(text) => format.parse(text),
    }
}

/// A parsed field path.
#[derive(Debug, Clone)]
pub struct FieldPath {
    path: String,
    pattern: Option<Regex>,
}

impl FieldPath {
    /// Split `field` into path and pattern and compile the pattern.
    pub fn parse(field: &str) -> Result<Self> {
        let (path, pattern) = match field.split_once(':') {
            Some((path, pattern)) => (path, Some(pattern)),
            None => (field, None),
        };
        let pattern = pattern
            .filter(|p| !p.is_empty())
            .map(Regex::new)
            .transpose()
            .map_err(|e| AppError::path(field, e))?;
        Ok(Self {
            path: path.to_string(),
            pattern,
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn pattern(&self) -> Option<&str> {
        self.pattern.as_ref().map(Regex::as_str)
    }

    /// Check that the path is valid in at least one path language.
    pub fn check(&self) -> Result<()> {
        match MarkupPath::parse(&self.path) {
            Ok(_) => Ok(()),
            Err(error) => JsonPath::parse(&self.path).map(|_| ()).map_err(|_| error),
        }
    }

    /// Parse the path for documents of node type `N`.
    pub fn compile<N: QueryNode>(&self) -> Result<CompiledField<N>> {
        Ok(CompiledField {
            selector: N::parse_path(&self.path)?,
            field: self.clone(),
        })
    }

    /// Look the field up in `node`, accepting only scalars of `accept` kinds.
    pub fn lookup<N: QueryNode>(&self, node: &N, accept: &[ScalarKind]) -> Lookup<Scalar> {
        match self.compile::<N>() {
            Ok(field) => field.lookup(node, accept),
            Err(error) => Lookup::Malformed(error),
        }
    }

    /// Extract the field as text; an absent optional field is empty.
    pub fn extract_text<N: QueryNode>(&self, node: &N, optional: bool) -> Result<String> {
        self.compile::<N>()?.extract_text(node, optional)
    }
}

/// A field path with its path parsed for node type `N`, reusable across
/// nodes of one document.
pub struct CompiledField<N: QueryNode> {
    field: FieldPath,
    selector: N::Path,
}

impl<N: QueryNode> CompiledField<N> {
    pub fn field(&self) -> &FieldPath {
        &self.field
    }

    /// Look the field up in `node`, accepting only scalars of `accept` kinds.
    pub fn lookup(&self, node: &N, accept: &[ScalarKind]) -> Lookup<Scalar> {
        let path = &self.field.path;
        let matches = node.select(&self.selector);
        let Some(first) = matches.first() else {
            return Lookup::NotFound {
                path: path.clone(),
                context: node.describe(),
            };
        };
        let Some(scalar) = first.scalar().filter(|s| accept.contains(&s.kind())) else {
            return Lookup::Invalid(format!("Bad item type {} at {}", first.type_name(), path));
        };

        match (&self.field.pattern, scalar) {
            (None, scalar) => Lookup::Found(scalar),
            (Some(re), Scalar::Text(text)) => match re.find(&text) {
                Some(m) => Lookup::Found(Scalar::Text(m.as_str().to_string())),
                None => Lookup::Invalid(format!("No {} in {}", re.as_str(), text)),
            },
            (Some(re), other) => Lookup::Invalid(format!("No {} in {}", re.as_str(), other)),
        }
    }

    /// Extract the field, applying the required/optional policy.
    pub fn extract(&self, node: &N, accept: &[ScalarKind], optional: bool) -> Result<Option<Scalar>> {
        self.lookup(node, accept).require(optional)
    }

    /// Extract the field as text; an absent optional field is empty.
    pub fn extract_text(&self, node: &N, optional: bool) -> Result<String> {
        Ok(self
            .extract(node, ScalarKind::TEXT, optional)?
            .map(Scalar::into_text)
            .unwrap_or_default())
    }
}

/// Extract the text of `field` from `node`.
pub fn extract<N: QueryNode>(node: &N, field: &str, optional: bool) -> Result<String> {
    FieldPath::parse(field)?.extract_text(node, optional)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::query::{JsonNode, MarkupNode};
    use scraper::Html;
    use serde_json::json;

    const AD: &str = r#"<li class="ad"><a href="x.html">Title</a>
        <span>Mitte, Berlin</span><span>3,5 rooms</span></li>"#;

    #[test]
    fn test_parse_field() {
        let field = FieldPath::parse("span[1]:[^,]*").unwrap();
        assert_eq!(field.path(), "span[1]");
        assert_eq!(field.pattern(), Some("[^,]*"));

        let field = FieldPath::parse("a/@href").unwrap();
        assert_eq!(field.pattern(), None);
        assert_eq!(FieldPath::parse("a:").unwrap().pattern(), None);
    }

    #[test]
    fn test_parse_field_bad_pattern() {
        let err = FieldPath::parse("a:(").unwrap_err();
        assert!(matches!(err, AppError::Path { .. }));
    }

    #[test]
    fn test_check() {
        assert!(FieldPath::parse(".//li[@class='ad']").unwrap().check().is_ok());
        assert!(FieldPath::parse("immoobjects.*").unwrap().check().is_ok());
        assert!(FieldPath::parse("").unwrap().check().is_err());
    }

    #[test]
    fn test_extract_markup() {
        let doc = Html::parse_fragment(AD);
        let root = MarkupNode::Element(doc.root_element());
        let ad = &root.query(".//li").unwrap()[0];

        assert_eq!(extract(ad, "a", false).unwrap(), "Title");
        assert_eq!(extract(ad, "a/@href", false).unwrap(), "x.html");
        assert_eq!(extract(ad, "span[1]:[^,]*", false).unwrap(), "Mitte");
    }

    #[test]
    fn test_extract_missing() {
        let doc = Html::parse_fragment(AD);
        let root = MarkupNode::Element(doc.root_element());
        let ad = &root.query(".//li").unwrap()[0];

        assert_eq!(extract(ad, "p", true).unwrap(), "");
        let err = extract(ad, "p", false).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Lookup);
        assert_eq!(err.to_string(), "No p in <li class=\"ad\" />");
    }

    #[test]
    fn test_pattern_miss_is_fatal_even_if_optional() {
        let doc = Html::parse_fragment(AD);
        let root = MarkupNode::Element(doc.root_element());
        let ad = &root.query(".//li").unwrap()[0];

        let err = extract(ad, r"a:\d+", true).unwrap_err();
        assert_eq!(err.to_string(), r"No \d+ in Title");
    }

    #[test]
    fn test_extract_json_types() {
        let ad = json!({"title": "Lodge", "rooms": 7, "rent": "499,99 €", "tags": []});
        let node = JsonNode(&ad);

        let rooms = FieldPath::parse("rooms").unwrap().compile::<JsonNode>().unwrap();
        assert_eq!(
            rooms.extract(&node, ScalarKind::NUMBER, false).unwrap(),
            Some(Scalar::Integer(7))
        );

        let err = FieldPath::parse("rooms")
            .unwrap()
            .extract_text(&node, false)
            .unwrap_err();
        assert_eq!(err.to_string(), "Bad item type int at rooms");

        let err = FieldPath::parse("tags").unwrap().extract_text(&node, true).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Lookup);

        let err = FieldPath::parse(r"rooms:\d")
            .unwrap()
            .lookup(&node, ScalarKind::NUMBER)
            .require(false)
            .unwrap_err();
        assert_eq!(err.to_string(), r"No \d in 7");
    }

    #[test]
    fn test_fuzzy_float() {
        let format = NumberFormat::new(".", "").unwrap();
        assert_eq!(fuzzy_float(&Scalar::Integer(7), &format), 7.0);
        assert_eq!(fuzzy_float(&Scalar::Float(1.5), &format), 1.5);
        assert_eq!(fuzzy_float(&Scalar::Text("ca. 499.99 €".into()), &format), 499.99);
        assert_eq!(fuzzy_float(&Scalar::Text("1.5 Zimmer".into()), &format), 1.5);
        assert_eq!(fuzzy_float(&Scalar::Text("auf Anfrage".into()), &format), 0.0);
    }

    #[test]
    fn test_fuzzy_float_locale() {
        let format = NumberFormat::new(",", ".").unwrap();
        assert_eq!(fuzzy_float(&Scalar::Text("1.250,50 €".into()), &format), 1250.5);
        assert_eq!(fuzzy_float(&Scalar::Text("3,5 Zimmer".into()), &format), 3.5);
        assert_eq!(fuzzy_float(&Scalar::Text("2 Zimmer".into()), &format), 2.0);
    }

    #[test]
    fn test_number_format_defaults_decimal_point() {
        let format = NumberFormat::new("", "").unwrap();
        assert_eq!(format.decimal_point(), ".");
        assert_eq!(format.thousands_sep(), "");
        assert_eq!(format.parse("12.5 m²"), 12.5);
    }

    #[test]
    fn test_compiled_field_reused_across_nodes() {
        let ads = json!([{"title": "Lodge"}, {"title": "Cottage"}, {}]);
        let title = FieldPath::parse("title").unwrap().compile::<JsonNode>().unwrap();
        let titles: Vec<String> = ads
            .as_array()
            .unwrap()
            .iter()
            .map(|ad| title.extract_text(&JsonNode(ad), true).unwrap())
            .collect();
        assert_eq!(titles, ["Lodge", "Cottage", ""]);
        assert_eq!(title.field().path(), "title");
    }

    #[test]
    fn test_compile_malformed_path() {
        let err = FieldPath::parse("div[2").unwrap().compile::<MarkupNode>().err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Lookup);
    }
}
