//! Push-event filtering

use std::fmt;

/// Outcome of filtering an inbound event against a pipeline's branch.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterDecision {
    Proceed,
    Skip(String),
}

impl FilterDecision {
    pub fn is_proceed(&self) -> bool {
        matches!(self, FilterDecision::Proceed)
    }
}

impl fmt::Display for FilterDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterDecision::Proceed => write!(f, "proceed"),
            FilterDecision::Skip(reason) => write!(f, "{}", reason),
        }
    }
}

/// Decide whether an event should trigger a deployment.
///
/// Missing data is permissive: an empty event header or an empty ref
/// proceeds. Present-but-mismatched data skips. This mirrors the relay's
/// long-standing behavior; GitHub always sends both headers, so the
/// permissive arms only fire for hand-rolled callers.
pub fn evaluate(event: &str, git_ref: &str, branch: &str) -> FilterDecision {
    if !event.is_empty() && event != "push" {
        return FilterDecision::Skip(format!("Ignored event: {}", event));
    }

    let expected_ref = format!("refs/heads/{}", branch);
    if !git_ref.is_empty() && git_ref != expected_ref {
        return FilterDecision::Skip(format!(
            "Ignored push to branch {} (configured for {})",
            git_ref, expected_ref
        ));
    }

    FilterDecision::Proceed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_to_configured_branch_proceeds() {
        assert!(evaluate("push", "refs/heads/main", "main").is_proceed());
    }

    #[test]
    fn push_to_other_branch_skips() {
        let decision = evaluate("push", "refs/heads/dev", "main");
        assert_eq!(
            decision,
            FilterDecision::Skip(
                "Ignored push to branch refs/heads/dev (configured for refs/heads/main)"
                    .to_string()
            )
        );
    }

    #[test]
    fn non_push_event_skips() {
        let decision = evaluate("issue_comment", "refs/heads/main", "main");
        assert_eq!(
            decision,
            FilterDecision::Skip("Ignored event: issue_comment".to_string())
        );
    }

    #[test]
    fn missing_event_and_ref_proceed() {
        assert!(evaluate("", "", "main").is_proceed());
        assert!(evaluate("push", "", "main").is_proceed());
        assert!(evaluate("", "refs/heads/main", "main").is_proceed());
    }

    #[test]
    fn tag_refs_do_not_match_branches() {
        let decision = evaluate("push", "refs/tags/v1.0", "v1.0");
        assert!(!decision.is_proceed());
    }
}
