//! Checking API responses against a contract written as a pattern.
use jsonmatch::{Json, JsonMatcher, MatchOutcome};

const CONTRACT: &str = r#"{
    "status": "ok" | "error",
    "items": [({"id": int[1,), "title": string, *: *})*](,50),
    "next"?: string | null,
    !"debug": *
}"#;

fn main() {
    let contract: JsonMatcher = CONTRACT.parse().expect("contract is valid");

    let good: Json = r#"{"status": "ok", "items": [{"id": 1, "title": "a"}], "next": null}"#
        .parse()
        .expect("document is valid");
    assert!(contract.matches(&good).is_match());

    let leaky: Json = r#"{"status": "ok", "items": [], "debug": {"sql": "..."}}"#
        .parse()
        .expect("document is valid");
    assert_eq!(
        contract.matches(&leaky),
        MatchOutcome::Mismatched {
            reason: r#"The field "debug" cannot appear in $"#.to_string(),
            path: "$".to_string(),
        }
    );

    let bad_id: Json = r#"{"status": "ok", "items": [{"id": 0, "title": "a"}]}"#
        .parse()
        .expect("document is valid");
    println!("{}", contract.matches(&bad_id));
}
