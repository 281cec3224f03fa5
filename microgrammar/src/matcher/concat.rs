//! Concatenation: the structural core of the algebra.
//!
//! A `Concat` runs its steps in declaration order, consulting the whitespace
//! strategy before each one, and produces a tree match whose slots are the
//! steps' bound values. Failure at any step fails the whole concatenation at
//! its initial offset; no partial consumption is visible to the caller.

use std::fmt;
use std::sync::Arc;

use crate::error::DefinitionError;
use crate::input::InputState;
use crate::matcher::skip::scan_until;
use crate::matcher::{Matcher, MatchingLogic};
use crate::report::{
    BoundSlots, MatchPrefixResult, PatternMatch, ScalarValue, Slot, TreeMatch,
};

/// Veto predicate: sees the slots bound so far; `false` fails the match.
pub type VetoFn = Arc<dyn Fn(&BoundSlots<'_>) -> bool>;

/// Computed step: derives a value from the slots bound so far.
pub type ComputeFn = Arc<dyn Fn(&BoundSlots<'_>) -> ScalarValue>;

/// One step of a concatenation.
#[derive(Clone)]
pub enum Step {
    /// Run a matcher and bind its match under `name`.
    Match { name: String, matcher: Matcher },
    /// Inspect the slots bound so far; a `false` return fails the match.
    Veto { name: String, test: VetoFn },
    /// Derive a value from the slots bound so far and bind it under `name`.
    Compute { name: String, compute: ComputeFn },
}

impl Step {
    pub fn name(&self) -> &str {
        match self {
            Step::Match { name, .. } | Step::Veto { name, .. } | Step::Compute { name, .. } => name,
        }
    }
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Match { name, matcher } => f
                .debug_struct("Match")
                .field("name", name)
                .field("matcher", &matcher.id())
                .finish(),
            Step::Veto { name, .. } => f.debug_struct("Veto").field("name", name).finish(),
            Step::Compute { name, .. } => f.debug_struct("Compute").field("name", name).finish(),
        }
    }
}

pub(crate) fn validate_name(name: &str) -> Result<(), DefinitionError> {
    if name.starts_with('$') {
        return Err(DefinitionError::ReservedName(name.to_owned()));
    }
    let mut chars = name.chars();
    let head_ok = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    if !head_ok || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(DefinitionError::InvalidSlotName(name.to_owned()));
    }
    Ok(())
}

/// Ordered sequence of named steps producing a [`TreeMatch`].
#[derive(Clone, Debug)]
pub struct Concat {
    id: String,
    steps: Vec<Step>,
    consume_white_space: bool,
    skip_gaps: bool,
}

impl Concat {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            steps: Vec::new(),
            consume_white_space: true,
            skip_gaps: false,
        }
    }

    /// Append a matcher step bound under `name`. Names beginning with `_`
    /// are bound but hidden from the produced tree's public accessors.
    pub fn step(
        mut self,
        name: impl Into<String>,
        matcher: impl Into<Matcher>,
    ) -> Result<Self, DefinitionError> {
        let name = name.into();
        validate_name(&name)?;
        if self.steps.iter().any(|s| s.name() == name) {
            return Err(DefinitionError::DuplicateSlot(name));
        }
        self.steps.push(Step::Match {
            name,
            matcher: matcher.into(),
        });
        Ok(self)
    }

    /// Append a veto predicate over the slots bound so far.
    pub fn veto(
        mut self,
        name: impl Into<String>,
        test: impl Fn(&BoundSlots<'_>) -> bool + 'static,
    ) -> Result<Self, DefinitionError> {
        let name = name.into();
        validate_name(&name)?;
        self.steps.push(Step::Veto {
            name,
            test: Arc::new(test),
        });
        Ok(self)
    }

    /// Append a computed slot derived from the slots bound so far.
    pub fn compute(
        mut self,
        name: impl Into<String>,
        compute: impl Fn(&BoundSlots<'_>) -> ScalarValue + 'static,
    ) -> Result<Self, DefinitionError> {
        let name = name.into();
        validate_name(&name)?;
        if self.steps.iter().any(|s| s.name() == name) {
            return Err(DefinitionError::DuplicateSlot(name));
        }
        self.steps.push(Step::Compute {
            name,
            compute: Arc::new(compute),
        });
        Ok(self)
    }

    /// Whether to skip whitespace before each step. Default: on.
    pub fn consume_white_space(mut self, yes: bool) -> Self {
        self.consume_white_space = yes;
        self
    }

    /// Whether every step may be preceded by arbitrary intervening text.
    /// Default: off.
    pub fn skip_gaps(mut self, yes: bool) -> Self {
        self.skip_gaps = yes;
        self
    }

    pub(crate) fn push_step(&mut self, step: Step) {
        self.steps.push(step);
    }

    fn first_matcher(&self) -> Option<&Matcher> {
        self.steps.iter().find_map(|s| match s {
            Step::Match { matcher, .. } => Some(matcher),
            _ => None,
        })
    }
}

impl MatchingLogic for Concat {
    fn id(&self) -> &str {
        &self.id
    }

    fn match_prefix(&self, state: &InputState<'_>) -> MatchPrefixResult {
        let initial = *state;
        let mut current = *state;
        let mut slots: Vec<Slot> = Vec::new();

        for step in &self.steps {
            match step {
                Step::Match { name, matcher } => {
                    if self.consume_white_space {
                        let (_, next) = current.skip_whitespace();
                        current = next;
                    }
                    let result = if self.skip_gaps {
                        match scan_until(&self.id, matcher, None, &current) {
                            Ok((_, m, _)) => MatchPrefixResult::Matched(m),
                            Err(f) => MatchPrefixResult::Failed(f),
                        }
                    } else {
                        matcher.match_prefix(&current)
                    };
                    match result {
                        MatchPrefixResult::Matched(m) => {
                            let end = m.end();
                            match m {
                                PatternMatch::Terminal(t) => slots.push(Slot::Scalar {
                                    name: name.clone(),
                                    value: t,
                                }),
                                PatternMatch::Tree(t) => slots.push(Slot::Nested {
                                    name: name.clone(),
                                    value: t,
                                }),
                                PatternMatch::Array(a) => slots.push(Slot::Sequence {
                                    name: name.clone(),
                                    value: a,
                                }),
                                // an optional step that did not match binds
                                // nothing
                                PatternMatch::Undefined { .. } => {}
                            }
                            current = current.at(end);
                        }
                        MatchPrefixResult::Failed(f) => {
                            return MatchPrefixResult::failed(
                                &self.id,
                                initial.offset(),
                                format!("failed at step `{name}`: {}", f.description),
                            );
                        }
                    }
                }
                Step::Veto { name, test } => {
                    if !test(&BoundSlots::new(&slots)) {
                        return MatchPrefixResult::failed(
                            &self.id,
                            initial.offset(),
                            format!("match vetoed by `{name}`"),
                        );
                    }
                }
                Step::Compute { name, compute } => {
                    let value = compute(&BoundSlots::new(&slots));
                    slots.push(Slot::Computed {
                        name: name.clone(),
                        value,
                    });
                }
            }
        }

        let matched = initial
            .manager()
            .slice(initial.offset(), current.offset());
        MatchPrefixResult::Matched(PatternMatch::Tree(TreeMatch::new(
            &self.id,
            matched,
            initial.offset(),
            slots,
        )))
    }

    fn can_start_with(&self, c: char) -> bool {
        match self.first_matcher() {
            Some(m) => m.can_start_with(c),
            None => true,
        }
    }

    fn required_prefix(&self) -> Option<&str> {
        if self.consume_white_space {
            // input whitespace may precede the first step's literal prefix
            return None;
        }
        self.first_matcher()?.required_prefix()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{InputStateManager, StringInput};
    use crate::matcher::{integer, literal, regex};

    fn prefix(m: &Concat, content: &str) -> MatchPrefixResult {
        let manager = InputStateManager::new(Box::new(StringInput::new(content)));
        let state = InputState::new(&manager, 0);
        m.match_prefix(&state)
    }

    fn pair() -> Concat {
        Concat::new("pair")
            .step("key", regex("[a-z_]+").unwrap())
            .unwrap()
            .step("_eq", literal("="))
            .unwrap()
            .step("value", integer())
            .unwrap()
    }

    #[test]
    fn whitespace_between_steps_is_elastic() {
        let tree = prefix(&pair(), "count   =\t2;")
            .into_match()
            .unwrap();
        let tree = tree.as_tree().unwrap().clone();
        assert_eq!(tree.matched(), "count   =\t2");
        assert_eq!(tree.text("key"), Some("count"));
        assert_eq!(tree.integer("value"), Some(2));
        // tree matched text is the exact input slice
        assert_eq!(tree.offset(), 0);
    }

    #[test]
    fn whitespace_off_requires_adjacency() {
        let strict = pair().consume_white_space(false);
        assert!(!prefix(&strict, "count = 2").is_matched());
        assert!(prefix(&strict, "count=2").is_matched());
    }

    #[test]
    fn failure_reports_step_and_initial_offset() {
        let result = prefix(&pair(), "count = x");
        let MatchPrefixResult::Failed(f) = result else {
            panic!("expected failure");
        };
        assert_eq!(f.offset, 0);
        assert!(f.description.contains("value"), "got: {}", f.description);
    }

    #[test]
    fn veto_false_fails_the_match() {
        let guarded = pair()
            .veto("_no_count", |slots| slots.text("key") != Some("count"))
            .unwrap();
        assert!(!prefix(&guarded, "count = 2").is_matched());
        assert!(prefix(&guarded, "size = 2").is_matched());

        let MatchPrefixResult::Failed(f) = prefix(&guarded, "count = 2") else {
            panic!("expected failure");
        };
        assert!(f.description.contains("vetoed"), "got: {}", f.description);
    }

    #[test]
    fn computed_slots_bind_derived_values() {
        let computed = pair()
            .compute("doubled", |slots| {
                ScalarValue::Integer(slots.integer("value").unwrap_or(0) * 2)
            })
            .unwrap();
        let m = prefix(&computed, "n = 21").into_match().unwrap();
        let tree = m.as_tree().unwrap();
        assert_eq!(tree.integer("doubled"), Some(42));
        // computed slots take no span
        assert_eq!(tree.matched(), "n = 21");
    }

    #[test]
    fn skip_gaps_allows_intervening_text() {
        let gappy = Concat::new("gappy")
            .step("_open", literal("("))
            .unwrap()
            .step("num", integer())
            .unwrap()
            .skip_gaps(true);
        let m = prefix(&gappy, "( lots of junk 42").into_match().unwrap();
        let tree = m.as_tree().unwrap();
        assert_eq!(tree.integer("num"), Some(42));
        assert_eq!(tree.matched(), "( lots of junk 42");
    }

    #[test]
    fn construction_rejects_bad_names() {
        assert!(matches!(
            Concat::new("c").step("$meta", literal("x")),
            Err(DefinitionError::ReservedName(_))
        ));
        assert!(matches!(
            Concat::new("c").step("1bad", literal("x")),
            Err(DefinitionError::InvalidSlotName(_))
        ));
        assert!(matches!(
            Concat::new("c")
                .step("dup", literal("x"))
                .unwrap()
                .step("dup", literal("y")),
            Err(DefinitionError::DuplicateSlot(_))
        ));
    }

    #[test]
    fn can_start_with_delegates_to_first_step() {
        let c = Concat::new("c")
            .step("_kw", literal("let"))
            .unwrap()
            .step("name", regex("[a-z]+").unwrap())
            .unwrap();
        assert!(c.can_start_with('l'));
        assert!(!c.can_start_with('x'));
        // regexes advertise no first character, so the whole concat stays open
        assert!(pair().can_start_with('1'));
    }

    #[test]
    fn required_prefix_only_without_whitespace_consumption() {
        let c = Concat::new("c").step("_x", literal("let")).unwrap();
        assert_eq!(c.required_prefix(), None);
        let strict = c.consume_white_space(false);
        assert_eq!(strict.required_prefix(), Some("let"));
    }
}
