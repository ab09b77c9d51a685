//! Training hints for spotting an injected certainty cascade.

use crate::reasoning::ReasoningNode;

const HINTS: [&str; 4] = [
    "Check whether the stated certainty is suspiciously round or close to, but never at, 1.0.",
    "Ask what evidence might be missing: weak or contradicting items may have been filtered out.",
    "Notice reasoning that ends by restating itself instead of giving a reason.",
    "Look for child conclusions that all open with the same confident qualifier.",
];

/// Hints for escaping the pattern. The same four hints apply to every node.
pub fn provide_hints(_node: &ReasoningNode) -> [&'static str; 4] {
    HINTS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hints_independent_of_node() {
        let a = provide_hints(&ReasoningNode::new("a"));
        let b = provide_hints(&ReasoningNode::new("b").with_certainty(0.97));
        assert_eq!(a, b);
        assert!(a.iter().all(|hint| !hint.is_empty()));
    }
}
