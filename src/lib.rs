/*!
# `jsonmatch` Library

A compact pattern language describing the shape, types and cardinality of
JSON documents, and the engine that checks documents against it.

A pattern looks like JSON with placeholders:

```text
{
    "name": string,
    "age"?: integer[0,150),
    "gender": "male" | "female" | "other",
    !"password": *,
    "tags": [(/[a-z]+/)*](,10),
    *: *
}
```

Documents and patterns are read into immutable, validated trees; matching
reports either success or the first discrepancy found, with the `$`-rooted
path of the offending node.

```
use jsonmatch::{matches_str, MatchOutcome};

let outcome = matches_str(
    r#"{"firstName"?: "John", "lastName": "Smith"}"#,
    r#"{"firstName": "John"}"#,
)
.unwrap();
assert_eq!(
    outcome,
    MatchOutcome::Mismatched {
        reason: r#"required field "lastName" missing from $"#.to_string(),
        path: "$".to_string(),
    }
);
```
*/

pub mod commands;
pub mod document;
pub mod error;
pub mod matcher;
pub mod parser;
pub mod pattern;
pub mod tree;
pub mod utils;

pub use document::Json;
pub use error::Error;
pub use matcher::{MatchOutcome, Mismatch, match_json};
pub use parser::{parse_document, parse_pattern};
pub use pattern::JsonMatcher;
pub use tree::{Locate, NodeId};

/// Read `pattern` and `document`, then match them.
///
/// # Errors
///
/// Returns the first [`Error`] raised while reading the pattern, then the
/// document. A mismatch is not an error.
pub fn matches_str(pattern: &str, document: &str) -> Result<MatchOutcome, Error> {
    let pattern = parse_pattern(pattern)?;
    let document = parse_document(document)?;
    Ok(pattern.matches(&document))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern_errors_come_first() {
        let err = matches_str("{", "{").unwrap_err();
        assert!(matches!(err, Error::Syntax(_)));
        let err = matches_str("{}", r#"{"a": 1, "a": 1}"#).unwrap_err();
        assert!(matches!(err, Error::DuplicateKey { .. }));
    }

    #[test]
    fn wildcard_pattern_still_validates_document() {
        let err = matches_str("*", r#"[{"k": 1, "k": 2}]"#).unwrap_err();
        assert_eq!(err.path(), Some("$[0]"));
    }

    #[test]
    fn trees_are_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Json>();
        assert_send_sync::<JsonMatcher>();
        assert_send_sync::<MatchOutcome>();
    }
}
