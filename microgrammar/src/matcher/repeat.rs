//! Repetition, with or without a separator.

use crate::input::InputState;
use crate::matcher::{Matcher, MatchingLogic};
use crate::report::{ArrayMatch, MatchPrefixResult, PatternMatch};

/// Matches the inner matcher at least `min` times, optionally separated.
///
/// A separator that matches with no following element is rolled back: the
/// array match always ends after its last inner match.
///
/// # Panics
///
/// Matching panics if the inner matcher succeeds without consuming input; a
/// repetition over a zero-width matcher would never terminate, and that is a
/// grammar bug rather than a data mismatch.
#[derive(Clone, Debug)]
pub struct Rep {
    id: String,
    inner: Box<Matcher>,
    min: usize,
    separator: Option<Box<Matcher>>,
    consume_white_space: bool,
}

impl Rep {
    pub fn new(inner: Matcher, min: usize) -> Self {
        Self {
            id: format!("Rep[{}]", inner.id()),
            inner: Box::new(inner),
            min,
            separator: None,
            consume_white_space: true,
        }
    }

    pub fn with_separator(inner: Matcher, separator: Matcher, min: usize) -> Self {
        Self {
            id: format!("RepSep[{};{}]", inner.id(), separator.id()),
            separator: Some(Box::new(separator)),
            ..Self::new(inner, min)
        }
    }

    pub fn consume_white_space(mut self, yes: bool) -> Self {
        self.consume_white_space = yes;
        self
    }
}

impl MatchingLogic for Rep {
    fn id(&self) -> &str {
        &self.id
    }

    fn match_prefix(&self, state: &InputState<'_>) -> MatchPrefixResult {
        let initial = *state;
        let mut current = *state;
        let mut contents: Vec<PatternMatch> = Vec::new();

        loop {
            let mut attempt = current;
            if self.consume_white_space {
                attempt = attempt.skip_whitespace().1;
            }
            if !contents.is_empty() {
                if let Some(separator) = &self.separator {
                    match separator.match_prefix(&attempt) {
                        MatchPrefixResult::Matched(sm) => {
                            attempt = attempt.at(sm.end());
                            if self.consume_white_space {
                                attempt = attempt.skip_whitespace().1;
                            }
                        }
                        MatchPrefixResult::Failed(_) => break,
                    }
                }
            }
            match self.inner.match_prefix(&attempt) {
                MatchPrefixResult::Matched(m) => {
                    assert!(
                        !m.is_empty(),
                        "degenerate grammar: `{}` matched the empty string inside `{}`; \
                         this repetition would never terminate",
                        self.inner.id(),
                        self.id
                    );
                    current = attempt.at(m.end());
                    contents.push(m);
                }
                MatchPrefixResult::Failed(_) => break,
            }
        }

        if contents.len() < self.min {
            return MatchPrefixResult::failed(
                &self.id,
                initial.offset(),
                format!(
                    "expected at least {} occurrences of `{}`, found {}",
                    self.min,
                    self.inner.id(),
                    contents.len()
                ),
            );
        }

        let matched = initial
            .manager()
            .slice(initial.offset(), current.offset());
        MatchPrefixResult::Matched(PatternMatch::Array(ArrayMatch {
            matcher_id: self.id.clone(),
            matched,
            offset: initial.offset(),
            contents,
        }))
    }

    fn can_start_with(&self, c: char) -> bool {
        if self.min == 0 {
            return true;
        }
        self.inner.can_start_with(c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{InputStateManager, StringInput};
    use crate::matcher::{integer, literal};

    fn prefix(m: &Rep, content: &str) -> MatchPrefixResult {
        let manager = InputStateManager::new(Box::new(StringInput::new(content)));
        let state = InputState::new(&manager, 0);
        m.match_prefix(&state)
    }

    fn values(m: &PatternMatch) -> Vec<i64> {
        m.as_array()
            .unwrap()
            .contents()
            .iter()
            .map(|c| c.as_terminal().unwrap().value().as_integer().unwrap())
            .collect()
    }

    #[test]
    fn plain_repetition() {
        let r = Rep::new(integer(), 1);
        let m = prefix(&r, "1 2 3 stop").into_match().unwrap();
        assert_eq!(values(&m), [1, 2, 3]);
        assert_eq!(m.matched(), "1 2 3");
    }

    #[test]
    fn min_zero_succeeds_empty() {
        let r = Rep::new(integer(), 0);
        let m = prefix(&r, "none here").into_match().unwrap();
        assert_eq!(m.len(), 0);
        assert!(m.as_array().unwrap().is_empty());
    }

    #[test]
    fn min_unmet_fails() {
        let r = Rep::new(integer(), 2);
        assert!(!prefix(&r, "1 and done").is_matched());
    }

    #[test]
    fn separated_repetition() {
        let r = Rep::with_separator(integer(), literal(","), 1);
        let m = prefix(&r, "1, 2 ,3]").into_match().unwrap();
        assert_eq!(values(&m), [1, 2, 3]);
        assert_eq!(m.matched(), "1, 2 ,3");
    }

    #[test]
    fn trailing_separator_is_rolled_back() {
        let r = Rep::with_separator(integer(), literal(","), 1);
        let m = prefix(&r, "1, 2, stop").into_match().unwrap();
        assert_eq!(values(&m), [1, 2]);
        // the dangling `,` is not part of the match
        assert_eq!(m.matched(), "1, 2");
    }

    #[test]
    #[should_panic(expected = "degenerate grammar")]
    fn zero_width_inner_match_panics() {
        let r = Rep::new(literal(""), 0);
        let _ = prefix(&r, "anything");
    }
}
