//! Match result model: the tree of matches a grammar produces, and the
//! success/failure report types every matcher returns.

use std::fmt;

/// A typed scalar carried by a terminal or computed slot.
///
/// Most matchers bind raw text; value-converting primitives such as
/// [`integer`](crate::matcher::integer) and
/// [`lowercase_boolean`](crate::matcher::lowercase_boolean) bind typed values
/// instead.
#[derive(Clone, Debug, PartialEq)]
pub enum ScalarValue {
    Text(String),
    Integer(i64),
    Boolean(bool),
}

impl ScalarValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ScalarValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            ScalarValue::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            ScalarValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarValue::Text(s) => f.write_str(s),
            ScalarValue::Integer(n) => write!(f, "{n}"),
            ScalarValue::Boolean(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for ScalarValue {
    fn from(s: &str) -> Self {
        ScalarValue::Text(s.to_owned())
    }
}

impl From<String> for ScalarValue {
    fn from(s: String) -> Self {
        ScalarValue::Text(s)
    }
}

impl From<i64> for ScalarValue {
    fn from(n: i64) -> Self {
        ScalarValue::Integer(n)
    }
}

impl From<bool> for ScalarValue {
    fn from(b: bool) -> Self {
        ScalarValue::Boolean(b)
    }
}

/// An atomic match produced by a primitive matcher.
#[derive(Clone, Debug)]
pub struct TerminalMatch {
    pub(crate) matcher_id: String,
    pub(crate) matched: String,
    pub(crate) offset: usize,
    pub(crate) value: ScalarValue,
}

impl TerminalMatch {
    pub(crate) fn new(matcher_id: &str, matched: impl Into<String>, offset: usize) -> Self {
        let matched = matched.into();
        let value = ScalarValue::Text(matched.clone());
        Self {
            matcher_id: matcher_id.to_owned(),
            matched,
            offset,
            value,
        }
    }

    pub(crate) fn with_value(mut self, value: ScalarValue) -> Self {
        self.value = value;
        self
    }

    pub fn matcher_id(&self) -> &str {
        &self.matcher_id
    }

    pub fn matched(&self) -> &str {
        &self.matched
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Byte offset one past the end of the matched text.
    pub fn end(&self) -> usize {
        self.offset + self.matched.len()
    }

    pub fn value(&self) -> &ScalarValue {
        &self.value
    }
}

/// One bound position inside a [`TreeMatch`].
///
/// Slot names beginning with `_` are internal (anchors, discardable steps)
/// and are hidden from [`TreeMatch::slots`] and the value accessors.
#[derive(Clone, Debug)]
pub enum Slot {
    /// A named sub-match whose value is a scalar.
    Scalar { name: String, value: TerminalMatch },
    /// A named sub-match whose value is another tree.
    Nested { name: String, value: TreeMatch },
    /// A named repetition sub-match.
    Sequence { name: String, value: ArrayMatch },
    /// A derived, non-consuming value computed from earlier slots.
    Computed { name: String, value: ScalarValue },
}

impl Slot {
    pub fn name(&self) -> &str {
        match self {
            Slot::Scalar { name, .. }
            | Slot::Nested { name, .. }
            | Slot::Sequence { name, .. }
            | Slot::Computed { name, .. } => name,
        }
    }

    pub(crate) fn is_hidden(&self) -> bool {
        self.name().starts_with('_')
    }
}

/// A structured match produced by a concatenation: the matched span plus the
/// ordered slots bound inside it.
///
/// `matched` is always the exact input slice `[offset, offset + len)`, so
/// whitespace and skipped gaps between steps are included.
#[derive(Clone, Debug)]
pub struct TreeMatch {
    pub(crate) matcher_id: String,
    pub(crate) matched: String,
    pub(crate) offset: usize,
    pub(crate) slots: Vec<Slot>,
}

impl TreeMatch {
    pub(crate) fn new(
        matcher_id: &str,
        matched: String,
        offset: usize,
        slots: Vec<Slot>,
    ) -> Self {
        Self {
            matcher_id: matcher_id.to_owned(),
            matched,
            offset,
            slots,
        }
    }

    pub fn matcher_id(&self) -> &str {
        &self.matcher_id
    }

    pub fn matched(&self) -> &str {
        &self.matched
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn end(&self) -> usize {
        self.offset + self.matched.len()
    }

    /// The non-internal slots, in binding order.
    pub fn slots(&self) -> impl Iterator<Item = &Slot> {
        self.slots.iter().filter(|s| !s.is_hidden())
    }

    /// Look a slot up by name, internal slots included.
    pub fn slot(&self, name: &str) -> Option<&Slot> {
        self.slots.iter().find(|s| s.name() == name)
    }

    /// The scalar value of a slot: a bound terminal's value or a computed
    /// value. `None` for nested/sequence slots and unknown names.
    pub fn value(&self, name: &str) -> Option<&ScalarValue> {
        match self.slot(name)? {
            Slot::Scalar { value, .. } => Some(&value.value),
            Slot::Computed { value, .. } => Some(value),
            _ => None,
        }
    }

    /// The matched text of a slot, whatever its kind. Computed slots render
    /// their value.
    pub fn text(&self, name: &str) -> Option<&str> {
        match self.slot(name)? {
            Slot::Scalar { value, .. } => Some(value.matched()),
            Slot::Nested { value, .. } => Some(value.matched()),
            Slot::Sequence { value, .. } => Some(value.matched()),
            Slot::Computed { value, .. } => value.as_text(),
        }
    }

    pub fn integer(&self, name: &str) -> Option<i64> {
        self.value(name)?.as_integer()
    }

    pub fn boolean(&self, name: &str) -> Option<bool> {
        self.value(name)?.as_boolean()
    }

    /// The nested tree bound under `name`, if any.
    pub fn tree(&self, name: &str) -> Option<&TreeMatch> {
        match self.slot(name)? {
            Slot::Nested { value, .. } => Some(value),
            _ => None,
        }
    }

    /// The sequence bound under `name`, if any.
    pub fn sequence(&self, name: &str) -> Option<&ArrayMatch> {
        match self.slot(name)? {
            Slot::Sequence { value, .. } => Some(value),
            _ => None,
        }
    }

    /// The underlying terminal matches of scalar slots, offsets intact.
    /// This is what the update overlay walks to locate slot spans.
    pub fn value_matches(&self) -> impl Iterator<Item = (&str, &TerminalMatch)> {
        self.slots.iter().filter_map(|s| match s {
            Slot::Scalar { name, value } if !s.is_hidden() => Some((name.as_str(), value)),
            _ => None,
        })
    }
}

/// A repetition match: the matched span plus each inner match in order.
#[derive(Clone, Debug)]
pub struct ArrayMatch {
    pub(crate) matcher_id: String,
    pub(crate) matched: String,
    pub(crate) offset: usize,
    pub(crate) contents: Vec<PatternMatch>,
}

impl ArrayMatch {
    pub fn matcher_id(&self) -> &str {
        &self.matcher_id
    }

    pub fn matched(&self) -> &str {
        &self.matched
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn end(&self) -> usize {
        self.offset + self.matched.len()
    }

    pub fn contents(&self) -> &[PatternMatch] {
        &self.contents
    }

    pub fn len(&self) -> usize {
        self.contents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }
}

/// Any match a matcher can produce.
#[derive(Clone, Debug)]
pub enum PatternMatch {
    Terminal(TerminalMatch),
    Tree(TreeMatch),
    Array(ArrayMatch),
    /// Zero-width placeholder for an optional matcher that did not match, or
    /// a satisfied negative look-ahead.
    Undefined { matcher_id: String, offset: usize },
}

impl PatternMatch {
    pub fn matcher_id(&self) -> &str {
        match self {
            PatternMatch::Terminal(m) => &m.matcher_id,
            PatternMatch::Tree(m) => &m.matcher_id,
            PatternMatch::Array(m) => &m.matcher_id,
            PatternMatch::Undefined { matcher_id, .. } => matcher_id,
        }
    }

    pub fn matched(&self) -> &str {
        match self {
            PatternMatch::Terminal(m) => &m.matched,
            PatternMatch::Tree(m) => &m.matched,
            PatternMatch::Array(m) => &m.matched,
            PatternMatch::Undefined { .. } => "",
        }
    }

    pub fn offset(&self) -> usize {
        match self {
            PatternMatch::Terminal(m) => m.offset,
            PatternMatch::Tree(m) => m.offset,
            PatternMatch::Array(m) => m.offset,
            PatternMatch::Undefined { offset, .. } => *offset,
        }
    }

    pub fn len(&self) -> usize {
        self.matched().len()
    }

    pub fn is_empty(&self) -> bool {
        self.matched().is_empty()
    }

    pub fn end(&self) -> usize {
        self.offset() + self.len()
    }

    pub fn as_tree(&self) -> Option<&TreeMatch> {
        match self {
            PatternMatch::Tree(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_terminal(&self) -> Option<&TerminalMatch> {
        match self {
            PatternMatch::Terminal(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&ArrayMatch> {
        match self {
            PatternMatch::Array(a) => Some(a),
            _ => None,
        }
    }

    pub(crate) fn set_matcher_id(&mut self, id: &str) {
        match self {
            PatternMatch::Terminal(m) => m.matcher_id = id.to_owned(),
            PatternMatch::Tree(m) => m.matcher_id = id.to_owned(),
            PatternMatch::Array(m) => m.matcher_id = id.to_owned(),
            PatternMatch::Undefined { matcher_id, .. } => *matcher_id = id.to_owned(),
        }
    }
}

/// Why a matcher declined the input at some offset.
///
/// Failures are ordinary values: they never advance the caller's cursor and
/// never mutate shared state.
#[derive(Clone, Debug)]
pub struct MatchFailure {
    pub matcher_id: String,
    pub offset: usize,
    pub description: String,
}

impl fmt::Display for MatchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "`{}` did not match at offset {}: {}",
            self.matcher_id, self.offset, self.description
        )
    }
}

/// The outcome of [`MatchingLogic::match_prefix`](crate::matcher::MatchingLogic::match_prefix).
#[derive(Debug)]
pub enum MatchPrefixResult {
    Matched(PatternMatch),
    Failed(MatchFailure),
}

impl MatchPrefixResult {
    pub(crate) fn failed(
        matcher_id: &str,
        offset: usize,
        description: impl Into<String>,
    ) -> Self {
        MatchPrefixResult::Failed(MatchFailure {
            matcher_id: matcher_id.to_owned(),
            offset,
            description: description.into(),
        })
    }

    pub fn is_matched(&self) -> bool {
        matches!(self, MatchPrefixResult::Matched(_))
    }

    pub fn into_match(self) -> Option<PatternMatch> {
        match self {
            MatchPrefixResult::Matched(m) => Some(m),
            MatchPrefixResult::Failed(_) => None,
        }
    }
}

/// Read-only by-name view of the slots a concatenation has bound so far.
/// Veto and compute steps receive this.
pub struct BoundSlots<'a> {
    slots: &'a [Slot],
}

impl<'a> BoundSlots<'a> {
    pub(crate) fn new(slots: &'a [Slot]) -> Self {
        Self { slots }
    }

    pub fn value(&self, name: &str) -> Option<&'a ScalarValue> {
        self.slots.iter().find_map(|s| match s {
            Slot::Scalar { name: n, value } if n == name => Some(&value.value),
            Slot::Computed { name: n, value } if n == name => Some(value),
            _ => None,
        })
    }

    pub fn text(&self, name: &str) -> Option<&'a str> {
        self.slots.iter().find_map(|s| match s {
            Slot::Scalar { name: n, value } if n == name => Some(value.matched()),
            Slot::Nested { name: n, value } if n == name => Some(value.matched()),
            Slot::Computed { name: n, value } if n == name => value.as_text(),
            _ => None,
        })
    }

    pub fn integer(&self, name: &str) -> Option<i64> {
        self.value(name)?.as_integer()
    }

    pub fn boolean(&self, name: &str) -> Option<bool> {
        self.value(name)?.as_boolean()
    }

    pub fn tree(&self, name: &str) -> Option<&'a TreeMatch> {
        self.slots.iter().find_map(|s| match s {
            Slot::Nested { name: n, value } if n == name => Some(value),
            _ => None,
        })
    }
}

/// Report returned by the exact-match façade when the whole input was not
/// consumed.
#[derive(Debug)]
pub struct DismatchReport {
    pub matcher_id: String,
    /// How far a prefix match reached, in bytes. Zero if nothing matched.
    pub consumed: usize,
    /// Preview of the input left over (or at the failure point).
    pub remaining: String,
    /// The inner failure, when the prefix itself did not match.
    pub failure: Option<MatchFailure>,
}

impl fmt::Display for DismatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.failure {
            Some(inner) => write!(f, "`{}` did not match: {inner}", self.matcher_id),
            None => write!(
                f,
                "`{}` matched {} bytes but input remains: `{}`",
                self.matcher_id, self.consumed, self.remaining
            ),
        }
    }
}
