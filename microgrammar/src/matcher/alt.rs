//! Alternation, optionality, and negative look-ahead.

use itertools::Itertools;

use crate::input::InputState;
use crate::matcher::{Matcher, MatchingLogic};
use crate::report::{MatchPrefixResult, PatternMatch};

/// Tries alternatives in order at the same offset; first success wins.
#[derive(Clone, Debug)]
pub struct Alt {
    id: String,
    alternatives: Vec<Matcher>,
}

impl Alt {
    pub fn new(alternatives: Vec<Matcher>) -> Self {
        let id = format!(
            "Alt[{}]",
            alternatives.iter().map(MatchingLogic::id).join("|")
        );
        Self { id, alternatives }
    }

    pub fn of(a: impl Into<Matcher>, b: impl Into<Matcher>) -> Self {
        Self::new(vec![a.into(), b.into()])
    }
}

impl MatchingLogic for Alt {
    fn id(&self) -> &str {
        &self.id
    }

    fn match_prefix(&self, state: &InputState<'_>) -> MatchPrefixResult {
        for alternative in &self.alternatives {
            if let Some(c) = state.current_char() {
                if !alternative.can_start_with(c) {
                    continue;
                }
            }
            if let MatchPrefixResult::Matched(m) = alternative.match_prefix(state) {
                return MatchPrefixResult::Matched(m);
            }
        }
        MatchPrefixResult::failed(&self.id, state.offset(), "no alternative matched")
    }

    fn can_start_with(&self, c: char) -> bool {
        self.alternatives.iter().any(|a| a.can_start_with(c))
    }
}

/// Matches its inner matcher, or succeeds with a zero-width undefined match.
#[derive(Clone, Debug)]
pub struct Opt {
    id: String,
    inner: Box<Matcher>,
}

impl Opt {
    pub fn new(inner: Matcher) -> Self {
        Self {
            id: format!("Opt[{}]", inner.id()),
            inner: Box::new(inner),
        }
    }
}

impl MatchingLogic for Opt {
    fn id(&self) -> &str {
        &self.id
    }

    fn match_prefix(&self, state: &InputState<'_>) -> MatchPrefixResult {
        match self.inner.match_prefix(state) {
            MatchPrefixResult::Matched(m) => MatchPrefixResult::Matched(m),
            MatchPrefixResult::Failed(_) => {
                MatchPrefixResult::Matched(PatternMatch::Undefined {
                    matcher_id: self.id.clone(),
                    offset: state.offset(),
                })
            }
        }
    }
}

/// Zero-width negative look-ahead: succeeds without consuming anything iff
/// the inner matcher fails at the cursor.
#[derive(Clone, Debug)]
pub struct Not {
    id: String,
    inner: Box<Matcher>,
}

impl Not {
    pub fn new(inner: Matcher) -> Self {
        Self {
            id: format!("Not[{}]", inner.id()),
            inner: Box::new(inner),
        }
    }
}

impl MatchingLogic for Not {
    fn id(&self) -> &str {
        &self.id
    }

    fn match_prefix(&self, state: &InputState<'_>) -> MatchPrefixResult {
        match self.inner.match_prefix(state) {
            MatchPrefixResult::Matched(_) => MatchPrefixResult::failed(
                &self.id,
                state.offset(),
                format!("`{}` matched where it must not", self.inner.id()),
            ),
            MatchPrefixResult::Failed(_) => MatchPrefixResult::Matched(PatternMatch::Undefined {
                matcher_id: self.id.clone(),
                offset: state.offset(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{InputStateManager, StringInput};
    use crate::matcher::{integer, literal, lowercase_boolean};

    fn prefix(m: &impl MatchingLogic, content: &str) -> MatchPrefixResult {
        let manager = InputStateManager::new(Box::new(StringInput::new(content)));
        let state = InputState::new(&manager, 0);
        m.match_prefix(&state)
    }

    #[test]
    fn first_success_wins() {
        let alt = Alt::new(vec![lowercase_boolean(), integer()]);
        let m = prefix(&alt, "true").into_match().unwrap();
        assert_eq!(m.as_terminal().unwrap().value().as_boolean(), Some(true));
        let m = prefix(&alt, "42").into_match().unwrap();
        assert_eq!(m.as_terminal().unwrap().value().as_integer(), Some(42));
        assert!(!prefix(&alt, "maybe").is_matched());
    }

    #[test]
    fn alternatives_try_at_the_same_offset() {
        let alt = Alt::of(literal("ab"), literal("ax"));
        let m = prefix(&alt, "ax").into_match().unwrap();
        assert_eq!(m.matched(), "ax");
    }

    #[test]
    fn alt_can_start_with_unions_children() {
        let alt = Alt::of(literal("x"), literal("y"));
        assert!(alt.can_start_with('x'));
        assert!(alt.can_start_with('y'));
        assert!(!alt.can_start_with('z'));
    }

    #[test]
    fn opt_succeeds_as_undefined() {
        let o = Opt::new(literal("x"));
        let m = prefix(&o, "y").into_match().unwrap();
        assert!(matches!(m, PatternMatch::Undefined { .. }));
        assert_eq!(m.len(), 0);
        let m = prefix(&o, "xy").into_match().unwrap();
        assert_eq!(m.matched(), "x");
    }

    #[test]
    fn not_is_zero_width() {
        let n = Not::new(literal("x"));
        let m = prefix(&n, "y").into_match().unwrap();
        assert_eq!(m.len(), 0);
        assert!(!prefix(&n, "x").is_matched());
    }
}
