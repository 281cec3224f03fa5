//! The matching algebra: a uniform [`MatchingLogic`] contract and the closed
//! set of [`Matcher`] variants the engine is built from.
//!
//! Every matcher is polymorphic over the same small capability set:
//! `match_prefix` plus the optional fast-reject hooks `can_start_with` and
//! `required_prefix`, and a stable `id` used in diagnostics and match
//! reports. Composite matchers own their children; there are no
//! back-pointers.

use crate::input::InputState;
use crate::report::MatchPrefixResult;

mod alt;
mod concat;
mod primitives;
mod repeat;
mod skip;

pub use alt::{Alt, Not, Opt};
pub use concat::{Concat, ComputeFn, Step, VetoFn};
pub(crate) use concat::validate_name;
pub use primitives::{Integer, Literal, LowercaseBoolean, RegexMatcher, RestOfInput, Whitespace};
pub use repeat::Rep;
pub use skip::Skip;

/// The core matching contract.
pub trait MatchingLogic {
    /// Stable identifier, used in diagnostics and match reports.
    fn id(&self) -> &str;

    /// Try to match a prefix of the input at `state`. A failure never
    /// advances the caller's cursor and never mutates shared state.
    fn match_prefix(&self, state: &InputState<'_>) -> MatchPrefixResult;

    /// Fast reject: can a match possibly begin with `c`? `true` when
    /// unknown.
    fn can_start_with(&self, _c: char) -> bool {
        true
    }

    /// The literal prefix every match must begin with, when one exists.
    fn required_prefix(&self) -> Option<&str> {
        None
    }
}

/// The closed set of matchers. Owns its children; cheap to clone.
#[derive(Clone, Debug)]
pub enum Matcher {
    Literal(Literal),
    Regex(RegexMatcher),
    Integer(Integer),
    Boolean(LowercaseBoolean),
    Whitespace(Whitespace),
    RestOfInput(RestOfInput),
    Concat(Concat),
    Rep(Rep),
    Alt(Alt),
    Opt(Opt),
    Skip(Skip),
    Not(Not),
    Named(Named),
}

macro_rules! each_variant {
    ($self:ident, $m:ident => $e:expr) => {
        match $self {
            Matcher::Literal($m) => $e,
            Matcher::Regex($m) => $e,
            Matcher::Integer($m) => $e,
            Matcher::Boolean($m) => $e,
            Matcher::Whitespace($m) => $e,
            Matcher::RestOfInput($m) => $e,
            Matcher::Concat($m) => $e,
            Matcher::Rep($m) => $e,
            Matcher::Alt($m) => $e,
            Matcher::Opt($m) => $e,
            Matcher::Skip($m) => $e,
            Matcher::Not($m) => $e,
            Matcher::Named($m) => $e,
        }
    };
}

impl MatchingLogic for Matcher {
    fn id(&self) -> &str {
        each_variant!(self, m => m.id())
    }

    fn match_prefix(&self, state: &InputState<'_>) -> MatchPrefixResult {
        each_variant!(self, m => m.match_prefix(state))
    }

    fn can_start_with(&self, c: char) -> bool {
        each_variant!(self, m => m.can_start_with(c))
    }

    fn required_prefix(&self) -> Option<&str> {
        each_variant!(self, m => m.required_prefix())
    }
}

/// Wrapper renaming a matcher for diagnostics and match reports.
#[derive(Clone, Debug)]
pub struct Named {
    id: String,
    inner: Box<Matcher>,
}

impl Named {
    pub fn new(id: impl Into<String>, inner: Matcher) -> Self {
        Self {
            id: id.into(),
            inner: Box::new(inner),
        }
    }
}

impl MatchingLogic for Named {
    fn id(&self) -> &str {
        &self.id
    }

    fn match_prefix(&self, state: &InputState<'_>) -> MatchPrefixResult {
        match self.inner.match_prefix(state) {
            MatchPrefixResult::Matched(mut m) => {
                m.set_matcher_id(&self.id);
                MatchPrefixResult::Matched(m)
            }
            MatchPrefixResult::Failed(mut f) => {
                f.matcher_id = self.id.clone();
                MatchPrefixResult::Failed(f)
            }
        }
    }

    fn can_start_with(&self, c: char) -> bool {
        self.inner.can_start_with(c)
    }

    fn required_prefix(&self) -> Option<&str> {
        self.inner.required_prefix()
    }
}

impl From<Literal> for Matcher {
    fn from(m: Literal) -> Self {
        Matcher::Literal(m)
    }
}

impl From<RegexMatcher> for Matcher {
    fn from(m: RegexMatcher) -> Self {
        Matcher::Regex(m)
    }
}

impl From<Concat> for Matcher {
    fn from(m: Concat) -> Self {
        Matcher::Concat(m)
    }
}

impl From<Rep> for Matcher {
    fn from(m: Rep) -> Self {
        Matcher::Rep(m)
    }
}

impl From<Alt> for Matcher {
    fn from(m: Alt) -> Self {
        Matcher::Alt(m)
    }
}

impl From<Skip> for Matcher {
    fn from(m: Skip) -> Self {
        Matcher::Skip(m)
    }
}

/// Strings convert to literal matchers, so step tables read naturally.
impl From<&str> for Matcher {
    fn from(s: &str) -> Self {
        Matcher::Literal(Literal::new(s))
    }
}

impl From<String> for Matcher {
    fn from(s: String) -> Self {
        Matcher::Literal(Literal::new(s))
    }
}

// Ergonomic constructors.

pub fn literal(text: impl Into<String>) -> Matcher {
    Matcher::Literal(Literal::new(text))
}

/// Anchored regular expression matcher. Fails at construction on an invalid
/// pattern.
pub fn regex(pattern: &str) -> Result<Matcher, crate::DefinitionError> {
    Ok(Matcher::Regex(RegexMatcher::new(pattern)?))
}

pub fn integer() -> Matcher {
    Matcher::Integer(Integer::new())
}

pub fn lowercase_boolean() -> Matcher {
    Matcher::Boolean(LowercaseBoolean::new())
}

pub fn whitespace() -> Matcher {
    Matcher::Whitespace(Whitespace::new())
}

pub fn rest_of_input() -> Matcher {
    Matcher::RestOfInput(RestOfInput::new())
}

pub fn opt(inner: impl Into<Matcher>) -> Matcher {
    Matcher::Opt(Opt::new(inner.into()))
}

pub fn alt(alternatives: Vec<Matcher>) -> Matcher {
    Matcher::Alt(Alt::new(alternatives))
}

pub fn not(inner: impl Into<Matcher>) -> Matcher {
    Matcher::Not(Not::new(inner.into()))
}

pub fn rep(inner: impl Into<Matcher>, min: usize) -> Matcher {
    Matcher::Rep(Rep::new(inner.into(), min))
}

pub fn rep_sep(inner: impl Into<Matcher>, separator: impl Into<Matcher>, min: usize) -> Matcher {
    Matcher::Rep(Rep::with_separator(inner.into(), separator.into(), min))
}

/// Skip arbitrary text until `terminator` matches, consuming the terminator.
pub fn skip_until(terminator: impl Into<Matcher>) -> Matcher {
    Matcher::Skip(Skip::until(terminator.into()))
}

pub fn named(id: impl Into<String>, inner: impl Into<Matcher>) -> Matcher {
    Matcher::Named(Named::new(id, inner.into()))
}
