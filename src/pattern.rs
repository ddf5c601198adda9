/*!
# Pattern AST

The compiled form of a JSON-Match expression. A pattern mirrors the shape of
the documents it accepts, but any position may hold a constraint instead of
a literal value:

```text
{
    "lastName": "Smith",              // required, exact value
    "firstName"?: /[A-Z][a-z]+/,      // optional, full-string regex
    !"password": *,                   // forbidden
    "age": integer[0,150),            // integer within a range
    "tags": [(string)*](,10),         // up to ten strings
    *: *                              // anything else is allowed
}
```

Patterns are read with [`str::parse`] (or [`crate::parse_pattern`]), which
runs the structural validation described on [`JsonMatcher`]. The resulting
tree is immutable; matching never changes it.

## Canonical order

Pair matches of an object match are compared with [`canonical_order`]:
literal keys first, in lexicographic order of their key text, a required key
before an optional one with the same text, and wildcard keys last. The
validator and the matching engine both walk pairs in this order.
*/
use std::{cmp::Ordering, fmt::Display, str::FromStr};

use regex::Regex;

use crate::document::JsonString;
use crate::error::Error;
use crate::parser::parse_pattern;
use crate::tree::{Links, Locate, NodeId};

/// One side of a [`Range`]: the bound's value and its source text.
#[derive(Debug, Clone, PartialEq)]
pub struct Bound<T> {
    /// Parsed value of the bound.
    pub value: T,
    /// The bound as written in the pattern.
    pub literal: String,
}

/// An interval with optional, open or closed ends.
#[derive(Debug, Clone, PartialEq)]
pub struct Range<T> {
    /// Lower bound, `None` when unbounded below.
    pub lower: Option<Bound<T>>,
    /// `[` when `true`, `(` when `false`.
    pub lower_inclusive: bool,
    /// Upper bound, `None` when unbounded above.
    pub upper: Option<Bound<T>>,
    /// `]` when `true`, `)` when `false`.
    pub upper_inclusive: bool,
}

impl<T: PartialOrd> Range<T> {
    /// Whether `value` lies within the range.
    ///
    /// ```
    /// use jsonmatch::pattern::{Bound, Range};
    /// let range = Range {
    ///     lower: Some(Bound { value: 1, literal: "1".into() }),
    ///     lower_inclusive: true,
    ///     upper: Some(Bound { value: 100, literal: "100".into() }),
    ///     upper_inclusive: false,
    /// };
    /// assert!(range.contains(&1));
    /// assert!(!range.contains(&100));
    /// assert_eq!(range.to_string(), "[1,100)");
    /// ```
    pub fn contains(&self, value: &T) -> bool {
        let above_lower = self.lower.as_ref().is_none_or(|bound| {
            if self.lower_inclusive {
                *value >= bound.value
            } else {
                *value > bound.value
            }
        });
        let below_upper = self.upper.as_ref().is_none_or(|bound| {
            if self.upper_inclusive {
                *value <= bound.value
            } else {
                *value < bound.value
            }
        });
        above_lower && below_upper
    }
}

impl<T> Display for Range<T> {
    /// Rebuilds the range without whitespace, e.g. `[1,100)` or `(,5]`.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let open = if self.lower_inclusive { '[' } else { '(' };
        let close = if self.upper_inclusive { ']' } else { ')' };
        let lower = self.lower.as_ref().map_or("", |b| b.literal.as_str());
        let upper = self.upper.as_ref().map_or("", |b| b.literal.as_str());
        write!(f, "{open}{lower},{upper}{close}")
    }
}

/// Size constraint that may follow an array match, e.g. `(3)` or `(1,5)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeRange {
    /// `(n)`: exactly `n` elements.
    Exact(usize),
    /// `(min,max)` with either side optional.
    Between {
        /// Minimum number of elements, inclusive.
        min: Option<usize>,
        /// Maximum number of elements, inclusive.
        max: Option<usize>,
    },
}

/// Postfix operator of a parenthesized array entry, e.g. `(int)+`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Quantifier {
    /// No operator: exactly one element.
    #[default]
    One,
    /// `?`: zero or one element.
    Optional,
    /// `+`: one or more consecutive elements.
    OneOrMore,
    /// `*`: zero or more consecutive elements.
    ZeroOrMore,
}

/// A compiled regex literal. Matches whole strings only.
#[derive(Debug, Clone)]
pub struct RegexMatch {
    source: String,
    regex: Regex,
}

impl RegexMatch {
    /// Compile `source`, anchored at both ends.
    ///
    /// # Errors
    ///
    /// Returns the regex engine's error if `source` is not a valid pattern.
    pub fn new(source: &str) -> Result<Self, regex::Error> {
        let regex = Regex::new(&format!("^(?:{source})$"))?;
        Ok(Self { source: source.to_string(), regex })
    }

    /// The pattern as written between the delimiters.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Whether the entire `text` matches.
    #[must_use]
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

/// A single constraint on a value.
#[derive(Debug, Clone)]
pub enum SingleValueMatch {
    /// `null`
    NullLiteral,
    /// `number`, optionally with a range
    NumberType(Option<Range<f64>>),
    /// `float`: a number written with a fraction or an exponent
    FloatType(Option<Range<f64>>),
    /// `int` / `integer`: a number written without fraction or exponent
    IntType(Option<Range<i64>>),
    /// `boolean`
    BooleanType,
    /// `string`
    StringType,
    /// `true` / `false`
    BooleanLiteral(bool),
    /// A number literal, compared on its text
    NumberLiteral(String),
    /// A string literal, compared on its decoded value
    StringLiteral(JsonString),
    /// `/regex/`
    Regex(RegexMatch),
    /// A nested object match
    Object(ObjectMatch),
    /// A nested array match
    Array(ArrayMatch),
}

/// Constraint on a value: anything, or any one of several alternatives.
#[derive(Debug, Clone)]
pub enum ValueMatch {
    /// `*`
    Wildcard,
    /// `a | b | c`, never empty
    Alternatives(Vec<SingleValueMatch>),
}

impl ValueMatch {
    /// Whether this is the `*` value match.
    #[must_use]
    pub const fn is_wildcard(&self) -> bool {
        matches!(self, Self::Wildcard)
    }

    /// The alternatives, empty for a wildcard.
    #[must_use]
    pub fn alternatives(&self) -> &[SingleValueMatch] {
        match self {
            Self::Wildcard => &[],
            Self::Alternatives(alternatives) => alternatives,
        }
    }
}

/// A literal key of a pair match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiteralKey {
    /// Key text as written, including quotes.
    pub text: String,
    /// Trailing `?`: the field may be absent.
    pub optional: bool,
    /// Leading `!`: the field must be absent.
    pub negated: bool,
}

/// The key side of a pair match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyMatch {
    /// `*`: any key not named by another pair match.
    Wildcard,
    /// A named key.
    Literal(LiteralKey),
}

impl KeyMatch {
    /// The key as written (`*` for a wildcard).
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Wildcard => "*",
            Self::Literal(key) => &key.text,
        }
    }

    /// Whether the key is marked optional.
    #[must_use]
    pub const fn is_optional(&self) -> bool {
        matches!(self, Self::Literal(LiteralKey { optional: true, .. }))
    }

    /// Whether the key is marked forbidden.
    #[must_use]
    pub const fn is_negated(&self) -> bool {
        matches!(self, Self::Literal(LiteralKey { negated: true, .. }))
    }
}

/// `key: value` inside an object match.
#[derive(Debug, Clone)]
pub struct PairMatch {
    pub(crate) node: NodeId,
    /// Key constraint.
    pub key: KeyMatch,
    /// Value constraint.
    pub value: ValueMatch,
}

impl PairMatch {
    /// Node of this pair match in its pattern.
    #[must_use]
    pub const fn node(&self) -> NodeId {
        self.node
    }
}

/// `{ ... }` in a pattern.
#[derive(Debug, Clone)]
pub struct ObjectMatch {
    pub(crate) node: NodeId,
    /// Pair matches in source order.
    pub pairs: Vec<PairMatch>,
}

impl ObjectMatch {
    /// Node of this object match in its pattern.
    #[must_use]
    pub const fn node(&self) -> NodeId {
        self.node
    }

    /// The pair matches in [`canonical_order`].
    #[must_use]
    pub fn sorted_pairs(&self) -> Vec<&PairMatch> {
        let mut pairs: Vec<&PairMatch> = self.pairs.iter().collect();
        pairs.sort_by(|a, b| canonical_order(a, b));
        pairs
    }
}

/// One entry of an array match, with its quantifier.
#[derive(Debug, Clone)]
pub struct ArrayEntryMatch {
    pub(crate) node: NodeId,
    /// Constraint on the element(s).
    pub value: ValueMatch,
    /// How many consecutive elements the entry may absorb.
    pub quantifier: Quantifier,
}

impl ArrayEntryMatch {
    /// Node of this entry in its pattern.
    #[must_use]
    pub const fn node(&self) -> NodeId {
        self.node
    }
}

/// `[ ... ]` in a pattern, with an optional size constraint.
#[derive(Debug, Clone)]
pub struct ArrayMatch {
    pub(crate) node: NodeId,
    /// Constraint on the number of elements.
    pub size: Option<SizeRange>,
    /// Entry matches in source order.
    pub entries: Vec<ArrayEntryMatch>,
}

impl ArrayMatch {
    /// Node of this array match in its pattern.
    #[must_use]
    pub const fn node(&self) -> NodeId {
        self.node
    }
}

/// Top level of a pattern.
#[derive(Debug, Clone)]
pub enum JsonMatch {
    /// `*`: any document.
    Wildcard,
    /// The document must be an object.
    Object(ObjectMatch),
    /// The document must be an array.
    Array(ArrayMatch),
}

/// Total order over pair matches shared by validation and matching.
///
/// Wildcard keys sort after every literal key and are equal to each other.
/// Literal keys compare on their text; for equal text a required key sorts
/// before an optional one.
#[must_use]
pub fn canonical_order(a: &PairMatch, b: &PairMatch) -> Ordering {
    match (&a.key, &b.key) {
        (KeyMatch::Wildcard, KeyMatch::Wildcard) => Ordering::Equal,
        (KeyMatch::Wildcard, KeyMatch::Literal(_)) => Ordering::Greater,
        (KeyMatch::Literal(_), KeyMatch::Wildcard) => Ordering::Less,
        (KeyMatch::Literal(x), KeyMatch::Literal(y)) => {
            x.text.cmp(&y.text).then(x.optional.cmp(&y.optional))
        }
    }
}

/// A validated pattern, ready to be matched against documents.
///
/// Validation guarantees that:
/// - no object match names the same key twice, whether the duplicates are
///   both required, both optional, one of each, or both wildcards;
/// - every negated key is paired with the `*` value match;
/// - an array match holds at most one wildcard entry, and only as its last
///   entry.
#[derive(Debug, Clone)]
pub struct JsonMatcher {
    links: Links,
    root: JsonMatch,
}

impl JsonMatcher {
    /// Assemble a pattern from its arena and validate it.
    pub(crate) fn new(links: Links, root: JsonMatch) -> Result<Self, Error> {
        let matcher = Self { links, root };
        match &matcher.root {
            JsonMatch::Wildcard => {}
            JsonMatch::Object(object) => matcher.validate_object(object)?,
            JsonMatch::Array(array) => matcher.validate_array(array)?,
        }
        log::debug!("validated pattern with {} nodes", matcher.links.len());
        Ok(matcher)
    }

    /// The top level of the pattern.
    #[must_use]
    pub const fn root(&self) -> &JsonMatch {
        &self.root
    }

    /// The parent of node `id`, `None` for the root.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.links.parent(id)
    }

    fn validate_object(&self, object: &ObjectMatch) -> Result<(), Error> {
        let pairs = object.sorted_pairs();
        for window in pairs.windows(2) {
            let (prev, next) = (window[0], window[1]);
            if canonical_order(prev, next) == Ordering::Equal
                || prev.key.text() == next.key.text()
            {
                return Err(Error::DuplicateOrConflictingKey {
                    key: next.key.text().to_string(),
                    path: self.locate(object.node),
                });
            }
        }

        for pair in pairs {
            if pair.key.is_negated() && !pair.value.is_wildcard() {
                return Err(Error::IllegalNegation {
                    key: pair.key.text().to_string(),
                    path: self.locate(pair.node),
                });
            }
            self.validate_value(&pair.value)?;
        }
        Ok(())
    }

    fn validate_array(&self, array: &ArrayMatch) -> Result<(), Error> {
        let last = array.entries.len().saturating_sub(1);
        if let Some(misplaced) = array
            .entries
            .iter()
            .enumerate()
            .find(|(i, entry)| entry.value.is_wildcard() && *i != last)
        {
            return Err(Error::MisplacedWildcard {
                path: self.locate(misplaced.1.node),
            });
        }
        array
            .entries
            .iter()
            .try_for_each(|entry| self.validate_value(&entry.value))
    }

    fn validate_value(&self, value: &ValueMatch) -> Result<(), Error> {
        for alternative in value.alternatives() {
            match alternative {
                SingleValueMatch::Object(object) => {
                    self.validate_object(object)?;
                }
                SingleValueMatch::Array(array) => self.validate_array(array)?,
                _ => {}
            }
        }
        Ok(())
    }
}

impl Locate for JsonMatcher {
    fn locate(&self, id: NodeId) -> String {
        self.links.locate(id)
    }
}

impl FromStr for JsonMatcher {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_pattern(s)
    }
}
