/*!
# Parser

Turns raw text into validated [`Json`] documents and [`JsonMatcher`]
patterns. A single pest grammar covers both languages; the functions here
walk the pest parse tree and build the arena-backed ASTs, recording a parent
link for every node that diagnostics may point at.

## Examples

```rust
use jsonmatch::parser;

let pattern = parser::parse_pattern(r#"{"name": string, *: *}"#).expect("invalid pattern");
let document = parser::parse_document(r#"{"name": "Smith", "age": 40}"#).expect("invalid JSON");
assert!(pattern.matches(&document).is_match());
```

## Errors

Malformed text yields [`Error::Syntax`]; well-formed text that breaks a
structural rule yields the corresponding validation error:

```rust
use jsonmatch::{parser, Error};

let result = parser::parse_pattern(r#"{"a": 1,"#);
assert!(matches!(result, Err(Error::Syntax(_))));

let result = parser::parse_pattern(r#"[*, "John"]"#);
assert!(matches!(result, Err(Error::MisplacedWildcard { .. })));
```
*/

use pest::Parser;
use pest::iterators::{Pair, Pairs};
use pest_derive::Parser;
use std::str::FromStr;

use crate::document::{Json, JsonNumber, JsonString, JsonValue, Member};
use crate::error::Error;
use crate::pattern::{
    ArrayEntryMatch, ArrayMatch, Bound, JsonMatch, JsonMatcher, KeyMatch,
    LiteralKey, ObjectMatch, PairMatch, Quantifier, Range, RegexMatch,
    SingleValueMatch, SizeRange, ValueMatch,
};
use crate::tree::{Links, NodeId, Step};

/// Parser for JSON documents and JSON-Match patterns.
#[derive(Parser)]
#[grammar = "grammar/jsonm.pest"]
pub struct JsonmParser;

/// Parse and validate a JSON document.
///
/// # Errors
///
/// Returns [`Error::Syntax`] for malformed input and [`Error::DuplicateKey`]
/// if an object repeats a key.
pub fn parse_document(input: &str) -> Result<Json, Error> {
    let mut pairs = JsonmParser::parse(Rule::document, input)?;
    let document = next(&mut pairs)?;
    let value = next(&mut document.into_inner())?;

    let mut builder = DocumentBuilder::new();
    builder.value(value, NodeId::ROOT)?;
    Json::new(builder.links, builder.values)
}

/// Parse and validate a JSON-Match pattern.
///
/// # Errors
///
/// Returns [`Error::Syntax`] for malformed input, [`Error::InvalidRegex`] for
/// a regex literal that does not compile, and the pattern validation errors
/// described on [`JsonMatcher`].
pub fn parse_pattern(input: &str) -> Result<JsonMatcher, Error> {
    let mut pairs = JsonmParser::parse(Rule::pattern, input)?;
    let pattern = next(&mut pairs)?;
    let top = next(&mut pattern.into_inner())?;

    let mut builder = PatternBuilder { links: Links::new() };
    let root = builder.json_match(top)?;
    JsonMatcher::new(builder.links, root)
}

/// Take the next pair, failing on a truncated parse tree.
fn next<'i>(pairs: &mut Pairs<'i, Rule>) -> Result<Pair<'i, Rule>, Error> {
    pairs
        .next()
        .ok_or_else(|| Error::Syntax("Unexpected end of input".to_string()))
}

fn unexpected(pair: &Pair<'_, Rule>) -> Error {
    let (line, col) = pair.line_col();
    Error::Syntax(format!(
        "Unexpected {:?} at {line}:{col}",
        pair.as_rule()
    ))
}

/// Decode a quoted JSON string literal.
fn decode_string(pair: &Pair<'_, Rule>) -> Result<JsonString, Error> {
    let literal = pair.as_str();
    let value: String = serde_json::from_str(literal).map_err(|e| {
        let (line, col) = pair.line_col();
        Error::Syntax(format!("Invalid string {literal} at {line}:{col}: {e}"))
    })?;
    Ok(JsonString::new(literal.to_string(), value))
}

/// Builds the value arena of a document in pre-order.
struct DocumentBuilder {
    links: Links,
    values: Vec<JsonValue>,
}

impl DocumentBuilder {
    fn new() -> Self {
        Self { links: Links::new(), values: vec![JsonValue::Null] }
    }

    /// Reserve a node for a child of `parent`.
    fn child(&mut self, parent: NodeId, step: Step) -> NodeId {
        let id = self.links.push(parent, step);
        self.values.push(JsonValue::Null);
        id
    }

    fn value(&mut self, pair: Pair<'_, Rule>, id: NodeId) -> Result<(), Error> {
        let value = match pair.as_rule() {
            Rule::null => JsonValue::Null,
            Rule::boolean => JsonValue::Boolean(pair.as_str() == "true"),
            Rule::number => {
                JsonValue::Number(JsonNumber::new(pair.as_str().to_string()))
            }
            Rule::string => JsonValue::String(decode_string(&pair)?),
            Rule::object => {
                let mut members = Vec::new();
                for member in pair.into_inner() {
                    let mut inner = member.into_inner();
                    let key = next(&mut inner)?.as_str().to_string();
                    let child = self.child(id, Step::Key(key.clone()));
                    self.value(next(&mut inner)?, child)?;
                    members.push(Member { key, value: child });
                }
                JsonValue::Object(members)
            }
            Rule::array => {
                let mut elements = Vec::new();
                for (i, element) in pair.into_inner().enumerate() {
                    let child = self.child(id, Step::Index(i));
                    self.value(element, child)?;
                    elements.push(child);
                }
                JsonValue::Array(elements)
            }
            _ => return Err(unexpected(&pair)),
        };
        self.values[id.index()] = value;
        Ok(())
    }
}

/// Builds a pattern tree, recording parent links as it descends.
struct PatternBuilder {
    links: Links,
}

impl PatternBuilder {
    fn json_match(&mut self, pair: Pair<'_, Rule>) -> Result<JsonMatch, Error> {
        match pair.as_rule() {
            Rule::wildcard => Ok(JsonMatch::Wildcard),
            Rule::object_match => {
                Ok(JsonMatch::Object(self.object_match(pair, NodeId::ROOT)?))
            }
            Rule::array_match => {
                Ok(JsonMatch::Array(self.array_match(pair, NodeId::ROOT)?))
            }
            _ => Err(unexpected(&pair)),
        }
    }

    fn object_match(
        &mut self,
        pair: Pair<'_, Rule>,
        node: NodeId,
    ) -> Result<ObjectMatch, Error> {
        let mut pairs = Vec::new();
        for pair_match in pair.into_inner() {
            let mut inner = pair_match.into_inner();
            let key = Self::key_match(next(&mut inner)?)?;
            let pair_node =
                self.links.push(node, Step::Key(key.text().to_string()));
            let value = self.value_match(next(&mut inner)?, pair_node)?;
            pairs.push(PairMatch { node: pair_node, key, value });
        }
        Ok(ObjectMatch { node, pairs })
    }

    fn key_match(pair: Pair<'_, Rule>) -> Result<KeyMatch, Error> {
        let mut text = None;
        let mut optional = false;
        let mut negated = false;
        for part in pair.into_inner() {
            match part.as_rule() {
                Rule::wildcard => return Ok(KeyMatch::Wildcard),
                Rule::negated => negated = true,
                Rule::optional => optional = true,
                Rule::string => {
                    // Validate the escapes even though keys compare on text
                    decode_string(&part)?;
                    text = Some(part.as_str().to_string());
                }
                _ => return Err(unexpected(&part)),
            }
        }
        let text = text.ok_or_else(|| {
            Error::Syntax("Key match without a key".to_string())
        })?;
        Ok(KeyMatch::Literal(LiteralKey { text, optional, negated }))
    }

    fn value_match(
        &mut self,
        pair: Pair<'_, Rule>,
        node: NodeId,
    ) -> Result<ValueMatch, Error> {
        let mut alternatives = Vec::new();
        for alternative in pair.into_inner() {
            if alternative.as_rule() == Rule::wildcard {
                return Ok(ValueMatch::Wildcard);
            }
            alternatives.push(self.single_value(alternative, node)?);
        }
        Ok(ValueMatch::Alternatives(alternatives))
    }

    fn single_value(
        &mut self,
        pair: Pair<'_, Rule>,
        node: NodeId,
    ) -> Result<SingleValueMatch, Error> {
        let single = match pair.as_rule() {
            Rule::null => SingleValueMatch::NullLiteral,
            Rule::boolean_type => SingleValueMatch::BooleanType,
            Rule::string_type => SingleValueMatch::StringType,
            Rule::number_type => {
                SingleValueMatch::NumberType(optional_range(pair)?)
            }
            Rule::float_type => {
                SingleValueMatch::FloatType(optional_range(pair)?)
            }
            Rule::integer_type => {
                SingleValueMatch::IntType(optional_range(pair)?)
            }
            Rule::boolean => {
                SingleValueMatch::BooleanLiteral(pair.as_str() == "true")
            }
            Rule::number => {
                SingleValueMatch::NumberLiteral(pair.as_str().to_string())
            }
            Rule::string => SingleValueMatch::StringLiteral(decode_string(&pair)?),
            Rule::regex => {
                let text = pair.as_str();
                let source = text[1..text.len() - 1].replace("\\/", "/");
                let regex = RegexMatch::new(&source).map_err(|e| {
                    Error::InvalidRegex {
                        path: self.links.locate(node),
                        reason: e.to_string(),
                        pattern: source.clone(),
                    }
                })?;
                SingleValueMatch::Regex(regex)
            }
            Rule::object_match => {
                let nested = self.links.push(node, Step::Inherit);
                SingleValueMatch::Object(self.object_match(pair, nested)?)
            }
            Rule::array_match => {
                let nested = self.links.push(node, Step::Inherit);
                SingleValueMatch::Array(self.array_match(pair, nested)?)
            }
            _ => return Err(unexpected(&pair)),
        };
        Ok(single)
    }

    fn array_match(
        &mut self,
        pair: Pair<'_, Rule>,
        node: NodeId,
    ) -> Result<ArrayMatch, Error> {
        let mut entries = Vec::new();
        let mut size = None;
        for part in pair.into_inner() {
            match part.as_rule() {
                Rule::array_entry => {
                    let entry_node =
                        self.links.push(node, Step::Index(entries.len()));
                    let mut inner = part.into_inner();
                    let value = self.value_match(next(&mut inner)?, entry_node)?;
                    let quantifier = match inner.next().map(|q| q.as_str()) {
                        None => Quantifier::One,
                        Some("?") => Quantifier::Optional,
                        Some("+") => Quantifier::OneOrMore,
                        Some("*") => Quantifier::ZeroOrMore,
                        Some(other) => {
                            return Err(Error::Syntax(format!(
                                "Unknown quantifier: {other}"
                            )));
                        }
                    };
                    entries.push(ArrayEntryMatch { node: entry_node, value, quantifier });
                }
                Rule::size_range => size = size_range(part)?,
                _ => return Err(unexpected(&part)),
            }
        }
        Ok(ArrayMatch { node, size, entries })
    }
}

/// Parse the range following a `number`, `float` or `int` keyword, if any.
fn optional_range<T: FromStr>(
    pair: Pair<'_, Rule>,
) -> Result<Option<Range<T>>, Error> {
    let Some(range) = pair.into_inner().next() else {
        return Ok(None);
    };

    let mut lower = None;
    let mut upper = None;
    let mut lower_inclusive = false;
    let mut upper_inclusive = false;
    for part in range.into_inner() {
        match part.as_rule() {
            Rule::range_open => lower_inclusive = part.as_str() == "[",
            Rule::range_close => upper_inclusive = part.as_str() == "]",
            Rule::lower_bound => lower = Some(bound(&part)?),
            Rule::upper_bound => upper = Some(bound(&part)?),
            _ => return Err(unexpected(&part)),
        }
    }
    Ok(Some(Range { lower, lower_inclusive, upper, upper_inclusive }))
}

fn bound<T: FromStr>(pair: &Pair<'_, Rule>) -> Result<Bound<T>, Error> {
    let literal = pair.as_str().trim();
    let value = literal.parse().map_err(|_| {
        let (line, col) = pair.line_col();
        Error::Syntax(format!("Invalid range bound {literal} at {line}:{col}"))
    })?;
    Ok(Bound { value, literal: literal.to_string() })
}

/// Parse `(n)`, `(min,max)` and their partial forms; `()` constrains nothing.
fn size_range(pair: Pair<'_, Rule>) -> Result<Option<SizeRange>, Error> {
    // pest drops the comma, so `(,)` and `()` only differ in the source text
    let has_comma = pair.as_str().contains(',');
    let mut min = None;
    let mut max = None;
    for part in pair.into_inner() {
        let n = part.as_str().parse::<usize>().map_err(|_| {
            Error::Syntax(format!("Invalid array size: {}", part.as_str()))
        })?;
        match part.as_rule() {
            Rule::size_exact => return Ok(Some(SizeRange::Exact(n))),
            Rule::size_min => min = Some(n),
            Rule::size_max => max = Some(n),
            _ => return Err(unexpected(&part)),
        }
    }
    Ok(has_comma.then_some(SizeRange::Between { min, max }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::Locate;

    #[test]
    fn document_keys_keep_their_quotes() {
        let json = parse_document(r#"{ "a b" : [true, false, null] }"#).unwrap();
        let JsonValue::Object(members) = json.value(json.root()) else {
            panic!("expected object");
        };
        assert_eq!(members[0].key, "\"a b\"");
        let JsonValue::Array(elements) = json.value(members[0].value) else {
            panic!("expected array");
        };
        assert_eq!(json.value(elements[0]), &JsonValue::Boolean(true));
        assert_eq!(json.value(elements[1]), &JsonValue::Boolean(false));
        assert_eq!(json.value(elements[2]), &JsonValue::Null);
        assert_eq!(json.locate(elements[2]), "$.\"a b\"[2]");
    }

    #[test]
    fn document_rejects_trailing_input() {
        assert!(matches!(parse_document("{} {}"), Err(Error::Syntax(_))));
        assert!(matches!(parse_document("[1,]"), Err(Error::Syntax(_))));
        assert!(matches!(parse_document("01"), Err(Error::Syntax(_))));
        assert!(matches!(parse_document(r#""\x""#), Err(Error::Syntax(_))));
    }

    #[test]
    fn document_rejects_lone_surrogate() {
        let result = parse_document(r#"["\ud800"]"#);
        assert!(matches!(result, Err(Error::Syntax(_))), "got {result:?}");
    }

    #[test]
    fn key_modifiers() {
        let matcher = parse_pattern(r#"{!"a": *, "b"?: 1, "c": 2, *: *}"#).unwrap();
        let JsonMatch::Object(object) = matcher.root() else {
            panic!("expected object match");
        };
        let keys: Vec<&KeyMatch> = object.pairs.iter().map(|p| &p.key).collect();
        assert!(keys[0].is_negated() && !keys[0].is_optional());
        assert!(keys[1].is_optional() && !keys[1].is_negated());
        assert_eq!(keys[2].text(), "\"c\"");
        assert_eq!(keys[3], &KeyMatch::Wildcard);
    }

    #[test]
    fn alternatives_keep_source_order() {
        let matcher = parse_pattern(r#"["male" | "female" | null | 3.5 | true]"#).unwrap();
        let JsonMatch::Array(array) = matcher.root() else {
            panic!("expected array match");
        };
        let alternatives = array.entries[0].value.alternatives();
        assert_eq!(alternatives.len(), 5);
        assert!(matches!(&alternatives[0], SingleValueMatch::StringLiteral(s) if s.value() == "male"));
        assert!(matches!(alternatives[2], SingleValueMatch::NullLiteral));
        assert!(matches!(&alternatives[3], SingleValueMatch::NumberLiteral(n) if n == "3.5"));
        assert!(matches!(alternatives[4], SingleValueMatch::BooleanLiteral(true)));
    }

    #[test]
    fn regex_slashes_are_unescaped() {
        let matcher = parse_pattern(r"[/a\/b/]").unwrap();
        let JsonMatch::Array(array) = matcher.root() else {
            panic!("expected array match");
        };
        let SingleValueMatch::Regex(regex) = &array.entries[0].value.alternatives()[0] else {
            panic!("expected regex");
        };
        assert_eq!(regex.source(), "a/b");
        assert!(regex.is_match("a/b"));
        assert!(!regex.is_match("xa/bx"));
    }

    #[test]
    fn ranges_print_without_whitespace() {
        let matcher = parse_pattern(r#"{"w": number( -1.5 , 2E3 ], "n": int[ , 10)}"#).unwrap();
        let JsonMatch::Object(object) = matcher.root() else {
            panic!("expected object match");
        };
        let SingleValueMatch::NumberType(Some(w)) = &object.pairs[0].value.alternatives()[0] else {
            panic!("expected number range");
        };
        assert_eq!(w.to_string(), "(-1.5,2E3]");
        let SingleValueMatch::IntType(Some(n)) = &object.pairs[1].value.alternatives()[0] else {
            panic!("expected int range");
        };
        assert_eq!(n.to_string(), "[,10)");
        assert!(n.lower.is_none());
    }

    #[test]
    fn keywords_without_range() {
        let matcher = parse_pattern("[number, float, int, integer, boolean, string, null]").unwrap();
        let JsonMatch::Array(array) = matcher.root() else {
            panic!("expected array match");
        };
        let kinds: Vec<&SingleValueMatch> =
            array.entries.iter().map(|e| &e.value.alternatives()[0]).collect();
        assert!(matches!(kinds[0], SingleValueMatch::NumberType(None)));
        assert!(matches!(kinds[1], SingleValueMatch::FloatType(None)));
        assert!(matches!(kinds[2], SingleValueMatch::IntType(None)));
        assert!(matches!(kinds[3], SingleValueMatch::IntType(None)));
        assert!(matches!(kinds[4], SingleValueMatch::BooleanType));
        assert!(matches!(kinds[5], SingleValueMatch::StringType));
        assert!(matches!(kinds[6], SingleValueMatch::NullLiteral));
    }

    #[test]
    fn size_range_only_after_non_empty_array() {
        assert!(matches!(parse_pattern("[](1)"), Err(Error::Syntax(_))));
        assert!(parse_pattern("[*](1)").is_ok());
    }
}
