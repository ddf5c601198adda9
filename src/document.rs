/*!
# JSON Document AST

A parsed JSON document keeps enough of its source text to serve the matcher:
numbers keep their lexical form (so `123` and `123.0` can be told apart),
strings keep both the literal and the decoded value, and object keys keep
their literal text including quotes. Every value is a node of a flat arena;
[`NodeId`]s index both the values and their parent links.

Documents are read with [`str::parse`] (or [`crate::parse_document`]), which
runs the duplicate-key validation before handing out a [`Json`]:

```
use jsonmatch::{Error, Json};

let json: Json = r#"{"name": "Smith", "tags": ["a", "b"]}"#.parse().unwrap();
assert!(json.value(json.root()).is_object());

let err = r#"{"a": 1, "a": 2}"#.parse::<Json>().unwrap_err();
assert!(matches!(err, Error::DuplicateKey { ref key, ref path } if key == "\"a\"" && path == "$"));
```
*/
use std::str::FromStr;

use crate::error::Error;
use crate::parser::parse_document;
use crate::tree::{Links, Locate, NodeId};

/// A JSON number, kept as written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonNumber {
    literal: String,
}

impl JsonNumber {
    pub(crate) const fn new(literal: String) -> Self {
        Self { literal }
    }

    /// The number exactly as it appears in the source.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.literal
    }

    /// Whether the literal has neither a fractional part nor an exponent.
    #[must_use]
    pub fn is_integral(&self) -> bool {
        !self.literal.contains(['.', 'e', 'E'])
    }

    /// The value as a float. Literals accepted by the grammar always parse.
    #[must_use]
    pub fn as_f64(&self) -> f64 {
        self.literal.parse().unwrap_or(f64::NAN)
    }

    /// The value of an integral literal, saturated to the `i64` range.
    #[must_use]
    pub fn as_i64_saturating(&self) -> i64 {
        self.literal.parse().unwrap_or_else(|_| {
            if self.literal.starts_with('-') { i64::MIN } else { i64::MAX }
        })
    }
}

/// A JSON string: the quoted literal and its decoded value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonString {
    literal: String,
    value: String,
}

impl JsonString {
    pub(crate) const fn new(literal: String, value: String) -> Self {
        Self { literal, value }
    }

    /// The string as written, quotes and escapes included.
    #[must_use]
    pub fn literal(&self) -> &str {
        &self.literal
    }

    /// The decoded string.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }
}

/// A key/value pair of an object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    /// Key text as written, including quotes.
    pub key: String,
    /// The member's value.
    pub value: NodeId,
}

/// One value of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JsonValue {
    /// `null`
    Null,
    /// `true` or `false`
    Boolean(bool),
    /// A number, see [`JsonNumber`]
    Number(JsonNumber),
    /// A string, see [`JsonString`]
    String(JsonString),
    /// Members in source order
    Object(Vec<Member>),
    /// Elements in source order
    Array(Vec<NodeId>),
}

impl JsonValue {
    /// Human readable name of the value's kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Boolean(_) => "boolean",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Object(_) => "object",
            Self::Array(_) => "array",
        }
    }

    /// Whether the value is an object.
    #[must_use]
    pub const fn is_object(&self) -> bool {
        matches!(self, Self::Object(_))
    }

    /// Whether the value is an array.
    #[must_use]
    pub const fn is_array(&self) -> bool {
        matches!(self, Self::Array(_))
    }
}

/// A validated JSON document.
///
/// Immutable once built; it can be shared between threads and matched
/// against any number of patterns.
#[derive(Debug, Clone)]
pub struct Json {
    links: Links,
    values: Vec<JsonValue>,
}

impl Json {
    /// Assemble a document from its arena and validate it.
    ///
    /// `values[i]` is the value of node `i`; `links` must hold exactly one
    /// link per value.
    pub(crate) fn new(links: Links, values: Vec<JsonValue>) -> Result<Self, Error> {
        debug_assert_eq!(links.len(), values.len());
        let json = Self { links, values };
        json.validate(json.root())?;
        log::debug!("validated document with {} nodes", json.values.len());
        Ok(json)
    }

    /// The root value.
    #[must_use]
    pub const fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// The value of node `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` does not belong to this document.
    #[must_use]
    pub fn value(&self, id: NodeId) -> &JsonValue {
        &self.values[id.index()]
    }

    /// The parent of node `id`, `None` for the root.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.links.parent(id)
    }

    /// All node ids, in document order (parents before children).
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.values.len()).map(NodeId)
    }

    /// Reject objects holding the same key twice, at any depth.
    fn validate(&self, id: NodeId) -> Result<(), Error> {
        match self.value(id) {
            JsonValue::Object(members) => {
                let mut keys: Vec<&str> =
                    members.iter().map(|m| m.key.as_str()).collect();
                keys.sort_unstable();
                if let Some(pair) = keys.windows(2).find(|w| w[0] == w[1]) {
                    return Err(Error::DuplicateKey {
                        key: pair[0].to_string(),
                        path: self.locate(id),
                    });
                }
                members.iter().try_for_each(|m| self.validate(m.value))
            }
            JsonValue::Array(elements) => {
                elements.iter().try_for_each(|&e| self.validate(e))
            }
            _ => Ok(()),
        }
    }
}

impl Locate for Json {
    fn locate(&self, id: NodeId) -> String {
        self.links.locate(id)
    }
}

impl FromStr for Json {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_document(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_valid_documents() {
        let inputs = [
            "{ }",
            r#"{"firstName": null, "lastName": "Smith", "weight": 123.5E+10}"#,
            "[ ]",
            r#"["John", null]"#,
            r#"{
                "firstName": "John",
                "children": [
                    {"firstName": "Henry", "student": true},
                    {"firstName": "Mary", "student": false}
                ]
            }"#,
            "42",
        ];
        for input in inputs {
            assert!(input.parse::<Json>().is_ok(), "rejected: {input}");
        }
    }

    #[test]
    fn rejects_malformed_documents() {
        let inputs = [
            "",
            r#"{"lastName": "Smith, "weight": 1}"#,
            "{ ]",
            r#"["John" null]"#,
            r#"{"lastName: "Smith"}"#,
        ];
        for input in inputs {
            let result = input.parse::<Json>();
            assert!(
                matches!(result, Err(Error::Syntax(_))),
                "accepted: {input}, got {result:?}"
            );
        }
    }

    #[test]
    fn duplicate_key_at_root() {
        let err = r#"{"a":1,"a":2}"#.parse::<Json>().unwrap_err();
        assert_eq!(
            err,
            Error::DuplicateKey { key: "\"a\"".into(), path: "$".into() }
        );
    }

    #[test]
    fn duplicate_key_nested_in_array() {
        let input = r#"{
            "children": [
                {"firstName": "John"},
                {"firstName": "John", "firstName": "Smith"}
            ]
        }"#;
        let err = input.parse::<Json>().unwrap_err();
        assert_eq!(err.path(), Some("$.\"children\"[1]"));
    }

    #[test]
    fn same_key_in_sibling_objects_is_fine() {
        let input = r#"[{"a": 1}, {"a": 2}]"#;
        assert!(input.parse::<Json>().is_ok());
    }

    #[test]
    fn number_lexical_forms() {
        let json: Json = "[123, 123.0, 123E5, -7, 99999999999999999999]"
            .parse()
            .unwrap();
        let JsonValue::Array(elements) = json.value(json.root()) else {
            panic!("expected array");
        };
        let numbers: Vec<&JsonNumber> = elements
            .iter()
            .map(|&e| match json.value(e) {
                JsonValue::Number(n) => n,
                other => panic!("expected number, got {other:?}"),
            })
            .collect();
        assert!(numbers[0].is_integral());
        assert!(!numbers[1].is_integral());
        assert!(!numbers[2].is_integral());
        assert_eq!(numbers[3].as_i64_saturating(), -7);
        assert_eq!(numbers[4].as_i64_saturating(), i64::MAX);
        assert!((numbers[2].as_f64() - 12_300_000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn strings_are_decoded() {
        let json: Json = r#"["AB\n"]"#.parse().unwrap();
        let JsonValue::Array(elements) = json.value(json.root()) else {
            panic!("expected array");
        };
        let JsonValue::String(s) = json.value(elements[0]) else {
            panic!("expected string");
        };
        assert_eq!(s.literal(), r#""AB\n""#);
        assert_eq!(s.value(), "AB\n");
    }

    #[test]
    fn parents_and_paths() {
        let json: Json = r#"{"son": {"names": ["a", "b"]}}"#.parse().unwrap();
        let last = json.node_ids().last().unwrap();
        assert_eq!(json.locate(last), "$.\"son\".\"names\"[1]");
        let names = json.parent(last).unwrap();
        assert_eq!(json.locate(names), "$.\"son\".\"names\"");
        assert_eq!(json.parent(json.root()), None);
    }
}
