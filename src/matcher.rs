/*!
# Matching Engine

Checks a validated document against a validated pattern and reports the
first discrepancy found, with the `$`-rooted path of the offending node.

- Objects are matched with a merge-join over the pattern's pairs in
  [`canonical_order`](crate::pattern::canonical_order) and the document's
  members sorted by key.
- Arrays are matched with a single greedy left-to-right scan. Quantified
  entries absorb as many consecutive elements as they can and never give
  them back, so some arrays a backtracking matcher would accept are
  rejected.

```
use jsonmatch::{Json, JsonMatcher, MatchOutcome};

let pattern: JsonMatcher = r#"{"name": *, "weight": float}"#.parse().unwrap();
let document: Json = r#"{"name": "Smith", "weight": 123}"#.parse().unwrap();

assert_eq!(
    pattern.matches(&document),
    MatchOutcome::Mismatched {
        reason: r#"expect float at $."weight""#.to_string(),
        path: r#"$."weight""#.to_string(),
    }
);
```
*/
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt::Display;

use crate::document::{Json, JsonValue, Member};
use crate::pattern::{
    ArrayMatch, JsonMatch, JsonMatcher, KeyMatch, ObjectMatch, PairMatch,
    Quantifier, Range, SingleValueMatch, SizeRange, ValueMatch,
};
use crate::tree::{Locate, NodeId};

/// The first discrepancy between a document and a pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mismatch {
    /// Human readable reason, embedding the path.
    pub reason: String,
    /// Path of the offending node.
    pub path: String,
}

impl Mismatch {
    /// Build a mismatch at `path`; `reason` receives the path to embed.
    fn at(path: String, reason: impl FnOnce(&str) -> String) -> Self {
        Self { reason: reason(&path), path }
    }
}

impl Display for Mismatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.reason)
    }
}

/// Outcome of matching one document against one pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MatchOutcome {
    /// The document satisfies the pattern.
    Matched,
    /// The document does not satisfy the pattern.
    Mismatched {
        /// Human readable reason, embedding the path.
        reason: String,
        /// Path of the offending node.
        path: String,
    },
}

impl MatchOutcome {
    /// Whether the document matched.
    #[must_use]
    pub const fn is_match(&self) -> bool {
        matches!(self, Self::Matched)
    }

    /// Reason and path of a mismatch, `None` if the document matched.
    #[must_use]
    pub fn mismatch(&self) -> Option<(&str, &str)> {
        match self {
            Self::Matched => None,
            Self::Mismatched { reason, path } => Some((reason, path)),
        }
    }
}

impl From<Result<(), Mismatch>> for MatchOutcome {
    fn from(result: Result<(), Mismatch>) -> Self {
        match result {
            Ok(()) => Self::Matched,
            Err(Mismatch { reason, path }) => Self::Mismatched { reason, path },
        }
    }
}

impl Display for MatchOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Matched => write!(f, "matched"),
            Self::Mismatched { reason, .. } => write!(f, "{reason}"),
        }
    }
}

type MatchResult = Result<(), Mismatch>;

/// Match `document` against `pattern`.
///
/// Pure and deterministic: neither tree is modified, and the same inputs
/// always give the same outcome.
#[must_use]
pub fn match_json(pattern: &JsonMatcher, document: &Json) -> MatchOutcome {
    let outcome: MatchOutcome =
        Matcher { pattern, json: document }.json_match().into();
    if let MatchOutcome::Mismatched { reason, .. } = &outcome {
        log::debug!("mismatch: {reason}");
    }
    outcome
}

impl JsonMatcher {
    /// Match `document` against this pattern. See [`match_json`].
    #[must_use]
    pub fn matches(&self, document: &Json) -> MatchOutcome {
        match_json(self, document)
    }
}

/// Call-local state of one match: the two trees.
struct Matcher<'a> {
    pattern: &'a JsonMatcher,
    json: &'a Json,
}

impl Matcher<'_> {
    fn fail(&self, id: NodeId, reason: impl FnOnce(&str) -> String) -> Mismatch {
        Mismatch::at(self.json.locate(id), reason)
    }

    fn json_match(&self) -> MatchResult {
        let root = self.json.root();
        match (self.pattern.root(), self.json.value(root)) {
            (JsonMatch::Wildcard, _) => Ok(()),
            (JsonMatch::Object(object), JsonValue::Object(members)) => {
                self.object(object, root, members)
            }
            (JsonMatch::Array(array), JsonValue::Array(elements)) => {
                self.array(array, root, elements)
            }
            (JsonMatch::Object(_), JsonValue::Array(_)) => {
                Err(self.fail(root, |p| format!("object mismatched with array at {p}")))
            }
            (JsonMatch::Array(_), JsonValue::Object(_)) => {
                Err(self.fail(root, |p| format!("array mismatched with object at {p}")))
            }
            _ => Err(self.fail(root, |p| {
                format!("json must be either object or array at {p}")
            })),
        }
    }

    fn object(
        &self,
        pattern: &ObjectMatch,
        id: NodeId,
        members: &[Member],
    ) -> MatchResult {
        // Negated keys are checked on presence alone and take no part in
        // the walk below
        let (forbidden, pairs): (Vec<&PairMatch>, Vec<&PairMatch>) = pattern
            .sorted_pairs()
            .into_iter()
            .partition(|pair| pair.key.is_negated());
        for pair in forbidden {
            let key = pair.key.text();
            if members.iter().any(|m| m.key == key) {
                return Err(self.fail(id, |p| {
                    format!("The field {key} cannot appear in {p}")
                }));
            }
        }

        let catch_all = pairs
            .last()
            .filter(|pair| pair.key == KeyMatch::Wildcard)
            .map(|pair| &pair.value);

        let mut members: Vec<&Member> = members.iter().collect();
        members.sort_by(|a, b| a.key.cmp(&b.key));

        let (mut p, mut d) = (0, 0);
        while p < pairs.len() && d < members.len() {
            let (pair, member) = (pairs[p], members[d]);
            let KeyMatch::Literal(key) = &pair.key else {
                // The wildcard sorts last and takes every remaining member
                self.value(&pair.value, member.value)?;
                d += 1;
                continue;
            };
            match key.text.cmp(&member.key) {
                Ordering::Less => {
                    if !key.optional {
                        return Err(self.missing_field(&key.text, id));
                    }
                    p += 1;
                }
                Ordering::Equal => {
                    self.value(&pair.value, member.value)?;
                    p += 1;
                    d += 1;
                }
                Ordering::Greater => {
                    let Some(catch_all) = catch_all else {
                        return Err(self.unexpected_field(&member.key, id));
                    };
                    self.value(catch_all, member.value)?;
                    d += 1;
                }
            }
        }

        if let Some(member) = members.get(d) {
            return Err(self.unexpected_field(&member.key, id));
        }
        let required = pairs[p..].iter().find_map(|pair| match &pair.key {
            KeyMatch::Literal(key) if !key.optional => Some(&key.text),
            _ => None,
        });
        match required {
            Some(key) => Err(self.missing_field(key, id)),
            None => Ok(()),
        }
    }

    fn missing_field(&self, key: &str, id: NodeId) -> Mismatch {
        self.fail(id, |p| format!("required field {key} missing from {p}"))
    }

    fn unexpected_field(&self, key: &str, id: NodeId) -> Mismatch {
        self.fail(id, |p| format!("unexpected field {key} in object {p}"))
    }

    fn array(
        &self,
        pattern: &ArrayMatch,
        id: NodeId,
        elements: &[NodeId],
    ) -> MatchResult {
        let entries = &pattern.entries;
        if entries.is_empty() {
            if elements.is_empty() {
                return Ok(());
            }
            return Err(self.fail(id, |p| format!("unexpected non-empty array at {p}")));
        }
        self.array_size(pattern.size, id, elements.len())?;

        let (mut e, mut v) = (0, 0);
        // Whether the current `+` entry has absorbed an element yet
        let mut repeated = false;
        while e < entries.len() && v < elements.len() {
            let (entry, element) = (&entries[e], elements[v]);
            if entry.value.is_wildcard() {
                v += 1;
                continue;
            }

            let matched = self.value(&entry.value, element).is_ok();
            log::trace!(
                "entry {e} ({:?}) against {}: {matched}",
                entry.quantifier,
                self.json.locate(element)
            );
            match (entry.quantifier, matched) {
                (Quantifier::One | Quantifier::Optional, true) => {
                    e += 1;
                    v += 1;
                    repeated = false;
                }
                (Quantifier::OneOrMore, true) => {
                    repeated = true;
                    v += 1;
                }
                (Quantifier::ZeroOrMore, true) => v += 1,
                (Quantifier::One, false) | (Quantifier::OneOrMore, false)
                    if !repeated =>
                {
                    return Err(self.unexpected_value(element));
                }
                (_, false) => {
                    e += 1;
                    repeated = false;
                }
            }
        }

        if let Some(&element) = elements.get(v) {
            return Err(self.unexpected_value(element));
        }
        let missing = entries.iter().enumerate().skip(e).find(|(i, entry)| {
            !entry.value.is_wildcard()
                && match entry.quantifier {
                    Quantifier::One => true,
                    Quantifier::OneOrMore => !(*i == e && repeated),
                    Quantifier::Optional | Quantifier::ZeroOrMore => false,
                }
        });
        match missing {
            Some((_, entry)) => Err(Mismatch::at(
                self.pattern.locate(entry.node()),
                |p| format!("required value missed in array {p}"),
            )),
            None => Ok(()),
        }
    }

    fn unexpected_value(&self, element: NodeId) -> Mismatch {
        self.fail(element, |p| format!("unexpected value in array {p}"))
    }

    fn array_size(
        &self,
        size: Option<SizeRange>,
        id: NodeId,
        len: usize,
    ) -> MatchResult {
        let violation = match size {
            Some(SizeRange::Exact(n)) if n != len => {
                format!("required array size={n}")
            }
            Some(SizeRange::Between { min: Some(min), .. }) if len < min => {
                format!("required minimum array size={min}")
            }
            Some(SizeRange::Between { max: Some(max), .. }) if len > max => {
                format!("required maximum array size={max}")
            }
            _ => return Ok(()),
        };
        Err(self.fail(id, |p| {
            format!("{violation}, but the actual array size={len} in array {p}")
        }))
    }

    fn value(&self, value: &ValueMatch, id: NodeId) -> MatchResult {
        match value {
            ValueMatch::Wildcard => Ok(()),
            ValueMatch::Alternatives(alternatives) => match alternatives.as_slice() {
                [single] => self.single_value(single, id),
                _ if alternatives.iter().any(|a| self.single_value(a, id).is_ok()) => Ok(()),
                _ => Err(self.fail(id, |p| format!("mismatched value at {p}"))),
            },
        }
    }

    fn single_value(&self, single: &SingleValueMatch, id: NodeId) -> MatchResult {
        let expect = |what: &str| -> MatchResult {
            Err(self.fail(id, |p| format!("expect {what} at {p}")))
        };
        match (single, self.json.value(id)) {
            (SingleValueMatch::NullLiteral, JsonValue::Null)
            | (SingleValueMatch::BooleanType, JsonValue::Boolean(_))
            | (SingleValueMatch::StringType, JsonValue::String(_)) => Ok(()),
            (SingleValueMatch::NullLiteral, _) => expect("null"),
            (SingleValueMatch::BooleanType, _) => expect("boolean"),
            (SingleValueMatch::StringType, _) => expect("string"),

            (SingleValueMatch::NumberType(range), JsonValue::Number(n)) => {
                self.within(range.as_ref(), &n.as_f64(), n.as_str(), id)
            }
            (SingleValueMatch::NumberType(_), _) => expect("number"),
            (SingleValueMatch::FloatType(range), JsonValue::Number(n))
                if !n.is_integral() =>
            {
                self.within(range.as_ref(), &n.as_f64(), n.as_str(), id)
            }
            (SingleValueMatch::FloatType(_), _) => expect("float"),
            (SingleValueMatch::IntType(range), JsonValue::Number(n))
                if n.is_integral() =>
            {
                self.within(range.as_ref(), &n.as_i64_saturating(), n.as_str(), id)
            }
            (SingleValueMatch::IntType(_), _) => expect("integer"),

            (SingleValueMatch::BooleanLiteral(expected), JsonValue::Boolean(b))
                if b == expected =>
            {
                Ok(())
            }
            (SingleValueMatch::BooleanLiteral(expected), _) => {
                Err(self.fail(id, |p| format!("expect boolean value {expected} at {p}")))
            }
            (SingleValueMatch::NumberLiteral(expected), JsonValue::Number(n))
                if n.as_str() == expected =>
            {
                Ok(())
            }
            (SingleValueMatch::NumberLiteral(expected), _) => {
                Err(self.fail(id, |p| format!("expect number value {expected} at {p}")))
            }
            (SingleValueMatch::StringLiteral(expected), JsonValue::String(s))
                if s.value() == expected.value() =>
            {
                Ok(())
            }
            (SingleValueMatch::StringLiteral(expected), _) => Err(self.fail(id, |p| {
                format!("expect string value {} at {p}", expected.literal())
            })),
            (SingleValueMatch::Regex(regex), JsonValue::String(s))
                if regex.is_match(s.value()) =>
            {
                Ok(())
            }
            (SingleValueMatch::Regex(regex), _) => Err(self.fail(id, |p| {
                format!(
                    "expect string value matched with the regex /{}/ at {p}",
                    regex.source()
                )
            })),

            (SingleValueMatch::Object(object), JsonValue::Object(members)) => {
                self.object(object, id, members)
            }
            (SingleValueMatch::Object(_), _) => expect("object"),
            (SingleValueMatch::Array(array), JsonValue::Array(elements)) => {
                self.array(array, id, elements)
            }
            (SingleValueMatch::Array(_), _) => expect("array"),
        }
    }

    /// Check a number against an optional range; `literal` is the number as
    /// written, for the message.
    fn within<T: PartialOrd>(
        &self,
        range: Option<&Range<T>>,
        value: &T,
        literal: &str,
        id: NodeId,
    ) -> MatchResult {
        match range {
            Some(range) if !range.contains(value) => Err(self.fail(id, |p| {
                format!("{literal} is beyond the range {range} at {p}")
            })),
            _ => Ok(()),
        }
    }
}
