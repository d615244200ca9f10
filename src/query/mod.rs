//! Path query engine.
//!
//! A small path language addresses fields in two document shapes through one
//! interface, [`QueryNode`]:
//!
//! - markup trees ([`MarkupNode`]): a simplified XPath subset, e.g.
//!   `.//li[@class='ad']/a/@href` or `div/span[2]/tail()`
//! - JSON values ([`JsonNode`]): dotted paths, e.g. `ads.*.url`
//!
//! Matching nothing is an empty result, not an error. A path that cannot be
//! parsed is an [`AppError::Path`](crate::error::AppError::Path).

pub mod field;
pub mod json;
pub mod markup;

pub use field::{CompiledField, FieldPath, NumberFormat, Scalar, ScalarKind, fuzzy_float};
pub use json::{JsonNode, JsonPath};
pub use markup::{MarkupNode, MarkupPath};

use crate::error::{AppError, Result};

/// A node of a queryable document.
pub trait QueryNode: Sized {
    /// Parsed form of a path expression for this kind of node.
    type Path;

    /// Parse a path expression.
    fn parse_path(path: &str) -> Result<Self::Path>;

    /// Evaluate a parsed path against this node, returning matches in
    /// document order.
    fn select(&self, path: &Self::Path) -> Vec<Self>;

    /// Parse and evaluate `path` against this node.
    fn query(&self, path: &str) -> Result<Vec<Self>> {
        Ok(self.select(&Self::parse_path(path)?))
    }

    /// Scalar value of the node, if it has one.
    fn scalar(&self) -> Option<Scalar>;

    /// Short type name, used in diagnostics.
    fn type_name(&self) -> &'static str;

    /// Serialization of the node for diagnostics.
    fn describe(&self) -> String;
}

/// Outcome of looking up a single field.
#[derive(Debug)]
pub enum Lookup<T> {
    /// The field was found
    Found(T),
    /// The path matched nothing in `context`
    NotFound { path: String, context: String },
    /// The field exists but does not have the expected shape
    Invalid(String),
    /// The path expression itself is broken
    Malformed(AppError),
}

impl<T> Lookup<T> {
    /// Apply the required/optional policy.
    ///
    /// Only a missing field is waived by `optional`; an invalid field is
    /// always an error.
    pub fn require(self, optional: bool) -> Result<Option<T>> {
        match self {
            Lookup::Found(value) => Ok(Some(value)),
            Lookup::NotFound { .. } if optional => Ok(None),
            Lookup::NotFound { path, context } => {
                Err(AppError::lookup(format!("No {path} in {context}")))
            }
            Lookup::Invalid(message) => Err(AppError::lookup(message)),
            Lookup::Malformed(error) => Err(error),
        }
    }
}
