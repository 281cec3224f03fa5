//! Primitive matchers. All of them produce terminal matches.

use regex_automata::{meta, Anchored, Input, MatchKind};

use crate::error::DefinitionError;
use crate::input::InputState;
use crate::matcher::MatchingLogic;
use crate::report::{MatchPrefixResult, PatternMatch, ScalarValue, TerminalMatch};

/// Matches an exact string.
#[derive(Clone, Debug)]
pub struct Literal {
    id: String,
    text: String,
}

impl Literal {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            id: format!("Literal[{text}]"),
            text,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

impl MatchingLogic for Literal {
    fn id(&self) -> &str {
        &self.id
    }

    fn match_prefix(&self, state: &InputState<'_>) -> MatchPrefixResult {
        if state.starts_with(&self.text) {
            MatchPrefixResult::Matched(PatternMatch::Terminal(TerminalMatch::new(
                &self.id,
                self.text.clone(),
                state.offset(),
            )))
        } else {
            MatchPrefixResult::failed(
                &self.id,
                state.offset(),
                format!("expected `{}`", self.text),
            )
        }
    }

    fn can_start_with(&self, c: char) -> bool {
        match self.text.chars().next() {
            Some(first) => first == c,
            None => true,
        }
    }

    fn required_prefix(&self) -> Option<&str> {
        Some(&self.text)
    }
}

/// Bytes of input an anchored regex search may look ahead over. Patterns
/// needing more than this to settle a prefix match are out of contract on
/// streaming inputs.
pub(crate) const DEFAULT_LOOKAHEAD: usize = 64 * 1024;

/// Regular expression anchored at the cursor; succeeds with the longest
/// matching prefix, so alternation picks the longest branch rather than the
/// earliest.
#[derive(Clone, Debug)]
pub struct RegexMatcher {
    id: String,
    re: meta::Regex,
    lookahead: usize,
}

impl RegexMatcher {
    pub fn new(pattern: &str) -> Result<Self, DefinitionError> {
        Self::with_lookahead(pattern, DEFAULT_LOOKAHEAD)
    }

    /// Like [`new`](Self::new) with an explicit lookahead window in bytes.
    pub fn with_lookahead(pattern: &str, lookahead: usize) -> Result<Self, DefinitionError> {
        // leftmost-longest, not the default leftmost-first: `a|aa` on `aa`
        // must take `aa`
        let re = meta::Regex::builder()
            .configure(meta::Config::new().match_kind(MatchKind::All))
            .build(pattern)
            .map_err(|source| DefinitionError::InvalidRegex {
                pattern: pattern.to_owned(),
                source,
            })?;
        Ok(Self {
            id: format!("Regex[{pattern}]"),
            re,
            lookahead,
        })
    }
}

impl MatchingLogic for RegexMatcher {
    fn id(&self) -> &str {
        &self.id
    }

    fn match_prefix(&self, state: &InputState<'_>) -> MatchPrefixResult {
        let window = state.lookahead(self.lookahead);
        let input = Input::new(window.as_str()).anchored(Anchored::Yes);
        match self.re.search(&input) {
            Some(m) => MatchPrefixResult::Matched(PatternMatch::Terminal(TerminalMatch::new(
                &self.id,
                &window[..m.end()],
                state.offset(),
            ))),
            None => MatchPrefixResult::failed(&self.id, state.offset(), "input does not match"),
        }
    }
}

const INTEGER_PATTERN: &str = r"-?(?:0|[1-9][0-9]*)";

/// Matches a decimal integer and binds it as a typed value.
#[derive(Clone, Debug)]
pub struct Integer {
    inner: RegexMatcher,
}

impl Integer {
    pub fn new() -> Self {
        let mut inner = RegexMatcher::new(INTEGER_PATTERN).expect("integer pattern compiles");
        inner.id = "Integer".to_owned();
        Self { inner }
    }
}

impl Default for Integer {
    fn default() -> Self {
        Self::new()
    }
}

impl MatchingLogic for Integer {
    fn id(&self) -> &str {
        &self.inner.id
    }

    fn match_prefix(&self, state: &InputState<'_>) -> MatchPrefixResult {
        match self.inner.match_prefix(state) {
            MatchPrefixResult::Matched(PatternMatch::Terminal(t)) => {
                match t.matched().parse::<i64>() {
                    Ok(n) => MatchPrefixResult::Matched(PatternMatch::Terminal(
                        t.with_value(ScalarValue::Integer(n)),
                    )),
                    Err(_) => MatchPrefixResult::failed(
                        self.id(),
                        state.offset(),
                        "integer out of range",
                    ),
                }
            }
            other => other,
        }
    }

    fn can_start_with(&self, c: char) -> bool {
        c.is_ascii_digit() || c == '-'
    }
}

/// Matches `true` or `false` and binds the boolean.
#[derive(Clone, Debug)]
pub struct LowercaseBoolean {
    inner: RegexMatcher,
}

impl LowercaseBoolean {
    pub fn new() -> Self {
        let mut inner = RegexMatcher::new("true|false").expect("boolean pattern compiles");
        inner.id = "LowercaseBoolean".to_owned();
        Self { inner }
    }
}

impl Default for LowercaseBoolean {
    fn default() -> Self {
        Self::new()
    }
}

impl MatchingLogic for LowercaseBoolean {
    fn id(&self) -> &str {
        &self.inner.id
    }

    fn match_prefix(&self, state: &InputState<'_>) -> MatchPrefixResult {
        match self.inner.match_prefix(state) {
            MatchPrefixResult::Matched(PatternMatch::Terminal(t)) => {
                let value = t.matched() == "true";
                MatchPrefixResult::Matched(PatternMatch::Terminal(
                    t.with_value(ScalarValue::Boolean(value)),
                ))
            }
            other => other,
        }
    }

    fn can_start_with(&self, c: char) -> bool {
        c == 't' || c == 'f'
    }
}

/// Matches a non-empty run of whitespace.
#[derive(Clone, Debug)]
pub struct Whitespace {
    id: String,
}

impl Whitespace {
    pub fn new() -> Self {
        Self {
            id: "Whitespace".to_owned(),
        }
    }
}

impl Default for Whitespace {
    fn default() -> Self {
        Self::new()
    }
}

impl MatchingLogic for Whitespace {
    fn id(&self) -> &str {
        &self.id
    }

    fn match_prefix(&self, state: &InputState<'_>) -> MatchPrefixResult {
        match state.skip_while(char::is_whitespace, 1) {
            Some((ws, _)) => MatchPrefixResult::Matched(PatternMatch::Terminal(
                TerminalMatch::new(&self.id, ws, state.offset()),
            )),
            None => MatchPrefixResult::failed(&self.id, state.offset(), "expected whitespace"),
        }
    }

    fn can_start_with(&self, c: char) -> bool {
        c.is_whitespace()
    }
}

/// Always succeeds, consuming everything that remains.
#[derive(Clone, Debug)]
pub struct RestOfInput {
    id: String,
}

impl RestOfInput {
    pub fn new() -> Self {
        Self {
            id: "RestOfInput".to_owned(),
        }
    }
}

impl Default for RestOfInput {
    fn default() -> Self {
        Self::new()
    }
}

impl MatchingLogic for RestOfInput {
    fn id(&self) -> &str {
        &self.id
    }

    fn match_prefix(&self, state: &InputState<'_>) -> MatchPrefixResult {
        let rest = state.rest();
        MatchPrefixResult::Matched(PatternMatch::Terminal(TerminalMatch::new(
            &self.id,
            rest,
            state.offset(),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{InputStateManager, StringInput};

    fn state_over(content: &str) -> InputStateManager {
        InputStateManager::new(Box::new(StringInput::new(content)))
    }

    fn prefix(m: &impl MatchingLogic, content: &str) -> MatchPrefixResult {
        let manager = state_over(content);
        let state = InputState::new(&manager, 0);
        m.match_prefix(&state)
    }

    fn matched_text(r: MatchPrefixResult) -> String {
        r.into_match().expect("expected a match").matched().to_owned()
    }

    #[test]
    fn literal_matches_exactly() {
        let lit = Literal::new("foo");
        assert_eq!(matched_text(prefix(&lit, "foobar")), "foo");
        assert!(!prefix(&lit, "fob").is_matched());
        assert!(lit.can_start_with('f'));
        assert!(!lit.can_start_with('g'));
        assert_eq!(lit.required_prefix(), Some("foo"));
    }

    #[test]
    fn regex_is_anchored() {
        let re = RegexMatcher::new("[a-z]+").unwrap();
        assert_eq!(matched_text(prefix(&re, "abc123")), "abc");
        // a hit further in does not count
        assert!(!prefix(&re, "123abc").is_matched());
    }

    #[test]
    fn regex_takes_longest_greedy_prefix() {
        let re = RegexMatcher::new("a+b?").unwrap();
        assert_eq!(matched_text(prefix(&re, "aaab!")), "aaab");
    }

    #[test]
    fn regex_alternation_prefers_the_longest_branch() {
        let re = RegexMatcher::new("a|aa").unwrap();
        assert_eq!(matched_text(prefix(&re, "aa")), "aa");
        let re = RegexMatcher::new("in|int|integer").unwrap();
        assert_eq!(matched_text(prefix(&re, "integers")), "integer");
    }

    #[test]
    fn invalid_regex_fails_at_construction() {
        assert!(matches!(
            RegexMatcher::new("("),
            Err(DefinitionError::InvalidRegex { .. })
        ));
    }

    #[test]
    fn integer_binds_typed_value() {
        let int = Integer::new();
        let m = prefix(&int, "63 trailing").into_match().unwrap();
        assert_eq!(m.matched(), "63");
        let t = m.as_terminal().unwrap();
        assert_eq!(t.value().as_integer(), Some(63));

        let m = prefix(&int, "-12x").into_match().unwrap();
        assert_eq!(m.as_terminal().unwrap().value().as_integer(), Some(-12));

        assert!(!prefix(&int, "x1").is_matched());
    }

    #[test]
    fn integer_rejects_leading_zeros() {
        let int = Integer::new();
        let m = prefix(&int, "0123").into_match().unwrap();
        assert_eq!(m.matched(), "0");
    }

    #[test]
    fn boolean_binds_typed_value() {
        let b = LowercaseBoolean::new();
        let m = prefix(&b, "true,").into_match().unwrap();
        assert_eq!(m.as_terminal().unwrap().value().as_boolean(), Some(true));
        let m = prefix(&b, "false").into_match().unwrap();
        assert_eq!(m.as_terminal().unwrap().value().as_boolean(), Some(false));
        assert!(!prefix(&b, "True").is_matched());
    }

    #[test]
    fn whitespace_requires_one_char() {
        let ws = Whitespace::new();
        assert_eq!(matched_text(prefix(&ws, " \t\nx")), " \t\n");
        assert!(!prefix(&ws, "x").is_matched());
    }

    #[test]
    fn rest_of_input_always_succeeds() {
        let rest = RestOfInput::new();
        assert_eq!(matched_text(prefix(&rest, "anything at all")), "anything at all");
        assert_eq!(matched_text(prefix(&rest, "")), "");
    }
}
