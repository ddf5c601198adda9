/*!
# Parent Links and Locators

Both parsed trees (documents and patterns) record, for every node that can be
reported in a diagnostic, a link to its parent and the step taken from that
parent. The links live in a flat arena owned by the tree, so the upward walk
needed to print a `$`-rooted path never requires back-references between the
nodes themselves.

```
use jsonmatch::{Json, Locate};

let json: Json = r#"{"a": [1, {"b": null}]}"#.parse().unwrap();
let paths: Vec<String> = json.node_ids().map(|id| json.locate(id)).collect();
assert_eq!(paths, ["$", "$.\"a\"", "$.\"a\"[0]", "$.\"a\"[1]", "$.\"a\"[1].\"b\""]);
```
*/
use std::fmt::Write as _;

/// Index of a node inside the arena of one parsed tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// The root of every tree.
    pub const ROOT: Self = Self(0);

    /// Position of the node in its arena.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// How a node is reached from its parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// The root has no parent.
    Root,
    /// Zero-based position among the elements (or entry matches) of an array.
    Index(usize),
    /// Literal key text, quotes included, of an object member or pair match.
    Key(String),
    /// Same position as the parent (e.g. an object match nested in the value
    /// of a pair match is reported at the pair).
    Inherit,
}

#[derive(Debug, Clone)]
struct Link {
    parent: Option<NodeId>,
    step: Step,
}

/// Arena of parent links for a single tree.
#[derive(Debug, Clone, Default)]
pub struct Links {
    links: Vec<Link>,
}

impl Links {
    /// Create an arena holding only the root.
    #[must_use]
    pub fn new() -> Self {
        Self { links: vec![Link { parent: None, step: Step::Root }] }
    }

    /// Record a child of `parent` and return its id.
    pub fn push(&mut self, parent: NodeId, step: Step) -> NodeId {
        let id = NodeId(self.links.len());
        self.links.push(Link { parent: Some(parent), step });
        id
    }

    /// Parent of `id`, `None` for the root.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.links.get(id.0).and_then(|link| link.parent)
    }

    /// Step taken from the parent to reach `id`.
    #[must_use]
    pub fn step(&self, id: NodeId) -> Option<&Step> {
        self.links.get(id.0).map(|link| &link.step)
    }

    /// Number of nodes recorded, root included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.links.len()
    }

    /// Whether the arena is empty. Never true for an arena built by
    /// [`Links::new`].
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Build the `$`-rooted path of `id`.
    ///
    /// Array positions print as `[i]`, object members as `.` followed by the
    /// key exactly as written in the source, quotes included.
    #[must_use]
    pub fn locate(&self, id: NodeId) -> String {
        let mut steps = Vec::new();
        let mut current = Some(id);
        while let Some(node) = current {
            let Some(link) = self.links.get(node.0) else {
                break;
            };
            steps.push(&link.step);
            current = link.parent;
        }

        let mut path = String::from("$");
        for step in steps.into_iter().rev() {
            match step {
                Step::Root | Step::Inherit => {}
                // Writing to a String cannot fail
                Step::Index(i) => {
                    let _ = write!(path, "[{i}]");
                }
                Step::Key(key) => {
                    path.push('.');
                    path.push_str(key);
                }
            }
        }
        path
    }
}

/// Anything that can print the location of one of its nodes.
///
/// Implemented by both [`crate::Json`] and [`crate::JsonMatcher`], since a
/// diagnostic may point into either tree.
pub trait Locate {
    /// Return the `$`-rooted path of the node `id`.
    fn locate(&self, id: NodeId) -> String;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_is_dollar() {
        let links = Links::new();
        assert_eq!(links.locate(NodeId::ROOT), "$");
        assert_eq!(links.parent(NodeId::ROOT), None);
    }

    #[test]
    fn mixed_steps() {
        let mut links = Links::new();
        let son = links.push(NodeId::ROOT, Step::Key("\"son\"".into()));
        let names = links.push(son, Step::Key("\"names\"".into()));
        let second = links.push(names, Step::Index(1));
        assert_eq!(links.locate(second), "$.\"son\".\"names\"[1]");
        assert_eq!(links.parent(second), Some(names));
    }

    #[test]
    fn inherited_steps_add_nothing() {
        let mut links = Links::new();
        let entry = links.push(NodeId::ROOT, Step::Index(0));
        let nested = links.push(entry, Step::Inherit);
        let pair = links.push(nested, Step::Key("*".into()));
        assert_eq!(links.locate(nested), "$[0]");
        assert_eq!(links.locate(pair), "$[0].*");
    }

    #[test]
    fn unknown_id_locates_to_root() {
        let links = Links::new();
        assert_eq!(links.locate(NodeId(42)), "$");
    }
}
