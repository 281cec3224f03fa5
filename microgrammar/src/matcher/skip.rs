//! Skip-until: consume arbitrary text up to a terminator.
//!
//! This is the substrate for template gaps and for undefined holes between
//! anchors; the non-greedy "anything" those lower to is a `Skip` whose
//! terminator is the next anchor.

use crate::input::InputState;
use crate::matcher::{Matcher, MatchingLogic};
use crate::report::{MatchFailure, MatchPrefixResult, PatternMatch, ScalarValue, TerminalMatch};

/// Scan forward from `state` until `terminator` matches, failing early if
/// `excluded` matches first. Returns the skipped prefix, the terminator's
/// match, and the cursor at the terminator's start. The terminator is tried
/// before `excluded` at each position.
pub(crate) fn scan_until<'a>(
    scanner_id: &str,
    terminator: &Matcher,
    excluded: Option<&Matcher>,
    state: &InputState<'a>,
) -> Result<(String, PatternMatch, InputState<'a>), MatchFailure> {
    let mut skipped = String::new();
    let mut cur = *state;
    loop {
        let Some(c) = cur.current_char() else {
            return Err(MatchFailure {
                matcher_id: scanner_id.to_owned(),
                offset: state.offset(),
                description: format!("`{}` never matched before end of input", terminator.id()),
            });
        };
        if terminator.can_start_with(c) {
            if let MatchPrefixResult::Matched(m) = terminator.match_prefix(&cur) {
                return Ok((skipped, m, cur));
            }
        }
        if let Some(ex) = excluded {
            if ex.can_start_with(c) && ex.match_prefix(&cur).is_matched() {
                return Err(MatchFailure {
                    matcher_id: scanner_id.to_owned(),
                    offset: state.offset(),
                    description: format!(
                        "excluded `{}` appeared before `{}`",
                        ex.id(),
                        terminator.id()
                    ),
                });
            }
        }
        skipped.push(c);
        cur = cur.advance();
    }
}

/// Consumes characters until its terminator matches at the cursor.
///
/// Three shapes, per constructor:
/// - [`until`](Skip::until): value is the skipped prefix, terminator consumed
///   as part of the match;
/// - [`up_to`](Skip::up_to): value is the skipped prefix, terminator left for
///   the next step (how undefined holes lower);
/// - [`yada`](Skip::yada): value is the terminator's own match, junk before
///   it discarded (how gap markers lower).
///
/// An `excluded` matcher turns "A eventually" into "A eventually, unless B
/// shows up first".
#[derive(Clone, Debug)]
pub struct Skip {
    id: String,
    terminator: Box<Matcher>,
    consume_terminator: bool,
    bind_terminator: bool,
    excluded: Option<Box<Matcher>>,
}

impl Skip {
    pub fn until(terminator: Matcher) -> Self {
        Self {
            id: format!("Skip[{}]", terminator.id()),
            terminator: Box::new(terminator),
            consume_terminator: true,
            bind_terminator: false,
            excluded: None,
        }
    }

    pub fn up_to(terminator: Matcher) -> Self {
        Self {
            consume_terminator: false,
            ..Self::until(terminator)
        }
    }

    pub fn yada(terminator: Matcher) -> Self {
        Self {
            bind_terminator: true,
            ..Self::until(terminator)
        }
    }

    pub fn excluding(mut self, excluded: Matcher) -> Self {
        self.excluded = Some(Box::new(excluded));
        self
    }
}

impl MatchingLogic for Skip {
    fn id(&self) -> &str {
        &self.id
    }

    fn match_prefix(&self, state: &InputState<'_>) -> MatchPrefixResult {
        let scanned = scan_until(
            &self.id,
            &self.terminator,
            self.excluded.as_deref(),
            state,
        );
        let (skipped, term, _at) = match scanned {
            Ok(hit) => hit,
            Err(f) => return MatchPrefixResult::Failed(f),
        };
        if self.bind_terminator {
            // the terminator's match stands on its own; the caller accounts
            // for the gap through the match's true offset
            return MatchPrefixResult::Matched(term);
        }
        let matched = if self.consume_terminator {
            let mut all = skipped.clone();
            all.push_str(term.matched());
            all
        } else {
            skipped.clone()
        };
        MatchPrefixResult::Matched(PatternMatch::Terminal(
            TerminalMatch::new(&self.id, matched, state.offset())
                .with_value(ScalarValue::Text(skipped)),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{InputStateManager, StringInput};
    use crate::matcher::{integer, literal};

    fn prefix(m: &Skip, content: &str) -> MatchPrefixResult {
        let manager = InputStateManager::new(Box::new(StringInput::new(content)));
        let state = InputState::new(&manager, 0);
        m.match_prefix(&state)
    }

    #[test]
    fn until_consumes_terminator() {
        let skip = Skip::until(literal(";"));
        let m = prefix(&skip, "junk here; rest").into_match().unwrap();
        assert_eq!(m.matched(), "junk here;");
        let t = m.as_terminal().unwrap();
        assert_eq!(t.value().as_text(), Some("junk here"));
    }

    #[test]
    fn up_to_leaves_terminator() {
        let skip = Skip::up_to(literal("<-"));
        let m = prefix(&skip, "banana<-").into_match().unwrap();
        assert_eq!(m.matched(), "banana");
        assert_eq!(m.end(), 6);
    }

    #[test]
    fn yada_binds_the_terminator_match() {
        let skip = Skip::yada(integer());
        let m = prefix(&skip, "(and some junk) 63 more").into_match().unwrap();
        assert_eq!(m.matched(), "63");
        assert_eq!(m.offset(), 16);
        assert_eq!(m.as_terminal().unwrap().value().as_integer(), Some(63));
    }

    #[test]
    fn zero_length_skip_is_fine() {
        let skip = Skip::up_to(literal(">"));
        let m = prefix(&skip, ">").into_match().unwrap();
        assert_eq!(m.matched(), "");
    }

    #[test]
    fn missing_terminator_fails() {
        let skip = Skip::until(literal(";"));
        assert!(!prefix(&skip, "no stop sign").is_matched());
    }

    #[test]
    fn excluded_aborts_the_scan() {
        let skip = Skip::until(literal("</p>")).excluding(literal("<div"));
        assert!(prefix(&skip, "some text</p>").is_matched());
        assert!(!prefix(&skip, "text <div>text</p>").is_matched());
    }

    #[test]
    fn terminator_wins_over_excluded_at_same_position() {
        let skip = Skip::until(literal("ab")).excluding(literal("a"));
        let m = prefix(&skip, "xxab").into_match().unwrap();
        assert_eq!(m.matched(), "xxab");
    }
}
