//! Order/question classification for user prompts.
//!
//! Pure functions, no state. The classifier decides whether a prompt is an
//! imperative instruction (proposed changes should reach disk) or an
//! exploratory question (keep changes in memory). Question indicators always
//! win over order indicators, so mixed prompts never auto-apply.

/// Classification of a user prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    /// Imperative instruction.
    Order,
    /// Exploratory or informational request.
    Question,
    /// No indicator matched either way.
    Unknown,
}

/// Words and punctuation that mark a prompt as a question.
const QUESTION_INDICATORS: &[&str] = &[
    "?",
    "what",
    "how",
    "why",
    "when",
    "where",
    "which",
    "should",
    "could",
    "would",
    "can you explain",
    "tell me",
    "describe",
    "analyze",
];

/// Imperative verbs that mark a prompt as an order.
const ORDER_INDICATORS: &[&str] = &[
    "create",
    "write",
    "make",
    "build",
    "set up",
    "modify",
    "add",
    "implement",
    "generate",
    "do",
    "ensure",
    "verify",
    "test",
    "run",
    "execute",
    "delete",
    "remove",
    "eliminate",
];

/// Classify a prompt as an order, a question, or unknown.
///
/// Matching is substring containment on the lowercased prompt. The matching
/// is deliberately loose (downstream behavior depends on it), so do not
/// tighten it to word boundaries.
pub fn classify(prompt: &str) -> Intent {
    let lower = prompt.to_lowercase();
    let is_question = QUESTION_INDICATORS.iter().any(|w| lower.contains(w));
    let is_order = ORDER_INDICATORS.iter().any(|w| lower.contains(w));

    match (is_question, is_order) {
        (true, _) => Intent::Question,
        (false, true) => Intent::Order,
        (false, false) => Intent::Unknown,
    }
}

/// Decide whether a proposed change should be promoted to disk.
///
/// Strict priority order:
/// 1. An explicit `auto_apply` flag on the call always wins.
/// 2. Otherwise a pre-classified signal from the caller, when present.
/// 3. Otherwise the prompt heuristic; only a clear order promotes.
///
/// With no signal at all the answer is false.
pub fn resolve_auto_apply(
    explicit: Option<bool>,
    pre_classified: Option<bool>,
    prompt: Option<&str>,
) -> bool {
    match (explicit, pre_classified, prompt) {
        (Some(flag), _, _) => flag,
        (None, Some(flag), _) => flag,
        (None, None, Some(p)) => classify(p) == Intent::Order,
        (None, None, None) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_orders() {
        assert_eq!(classify("Create a new file called test.rs"), Intent::Order);
        assert_eq!(classify("write a function to calculate sums"), Intent::Order);
        assert_eq!(classify("Set up the database schema"), Intent::Order);
        assert_eq!(classify("DELETE the old config"), Intent::Order);
    }

    #[test]
    fn classify_questions() {
        assert_eq!(classify("What does this function do?"), Intent::Question);
        assert_eq!(classify("tell me about the parser"), Intent::Question);
        assert_eq!(classify("Describe the error handling"), Intent::Question);
    }

    #[test]
    fn questions_take_precedence_over_orders() {
        // Contains both "how"/"should"/"implement" markers.
        assert_eq!(
            classify("How should I implement this feature?"),
            Intent::Question
        );
        assert_eq!(classify("Should we create a new module"), Intent::Question);
    }

    #[test]
    fn classify_unknown_when_nothing_matches() {
        assert_eq!(classify("the quick brown fox"), Intent::Unknown);
        assert_eq!(classify(""), Intent::Unknown);
    }

    #[test]
    fn classify_is_case_insensitive() {
        assert_eq!(classify("CREATE THE FILE"), Intent::Order);
        assert_eq!(classify("WHAT is going on"), Intent::Question);
    }

    #[test]
    fn explicit_flag_always_wins() {
        assert!(resolve_auto_apply(Some(true), Some(false), Some("What is this?")));
        assert!(!resolve_auto_apply(Some(false), Some(true), Some("Create a file")));
    }

    #[test]
    fn pre_classified_used_when_no_explicit_flag() {
        assert!(resolve_auto_apply(None, Some(true), Some("What is this?")));
        assert!(!resolve_auto_apply(None, Some(false), Some("Create a file")));
    }

    #[test]
    fn heuristic_is_the_last_resort() {
        assert!(resolve_auto_apply(None, None, Some("Create a new file")));
        assert!(!resolve_auto_apply(None, None, Some("What does this do?")));
        // Mixed prompts classify as questions, so no promotion.
        assert!(!resolve_auto_apply(
            None,
            None,
            Some("How should I implement this feature?")
        ));
        // No indicator at all defaults to false.
        assert!(!resolve_auto_apply(None, None, Some("the weather is nice")));
    }

    #[test]
    fn no_signal_means_no_promotion() {
        assert!(!resolve_auto_apply(None, None, None));
    }
}
