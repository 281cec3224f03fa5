//! The matching driver: scans an entire input for matches, supports swapping
//! the active matcher between matches, and can run an observer matcher in
//! parallel with the primary one.

use crate::input::{InputState, InputStateManager, InputStream, SharedListener, StringInput};
use crate::matcher::{Matcher, MatchingLogic};
use crate::report::{DismatchReport, MatchPrefixResult, PatternMatch, Slot, TreeMatch};

/// What the driver should do after a match.
pub enum NextMatcher {
    /// Keep scanning with the current matcher.
    Continue,
    /// Keep scanning with a different matcher.
    Swap(Matcher),
    /// Stop the run.
    Stop,
}

/// Hooks a matching run reports through.
///
/// `on_match` receives every non-empty primary match, in offset order, and
/// steers the run through its return value. `observe_match` receives hits of
/// the observer matcher, always after the primary callback for the region
/// they fall in.
pub trait MachineHooks {
    fn on_match(&mut self, m: PatternMatch) -> NextMatcher;

    fn observe_match(&mut self, _m: PatternMatch) {}
}

/// Scan the whole stream with `matcher`, reporting through `hooks`.
///
/// Failed offsets advance by one character; zero-length successes are
/// treated as failures to keep the scan moving. Window text behind the
/// cursor is released after every advance, so memory stays bounded by the
/// largest match span.
pub fn scan<H: MachineHooks>(
    matcher: &Matcher,
    observer: Option<&Matcher>,
    stream: Box<dyn InputStream>,
    listeners: Vec<SharedListener>,
    hooks: &mut H,
) {
    let manager = InputStateManager::with_listeners(stream, listeners);
    let mut state = InputState::new(&manager, 0);
    let mut current: Matcher = matcher.clone();

    while !state.exhausted() {
        let rejected = state
            .current_char()
            .is_some_and(|c| !current.can_start_with(c));
        let result = if rejected {
            None
        } else {
            Some(current.match_prefix(&state))
        };

        match result {
            Some(MatchPrefixResult::Matched(m)) if !m.is_empty() => {
                let region_start = m.offset();
                let region_end = m.end();
                emit_match_events(&manager, &m, 0);
                let next = hooks.on_match(m);
                if let Some(observer) = observer {
                    observe_region(observer, &manager, region_start, region_end, hooks);
                }
                match next {
                    NextMatcher::Stop => return,
                    NextMatcher::Swap(replacement) => current = replacement,
                    NextMatcher::Continue => {}
                }
                state = state.at(region_end);
            }
            _ => {
                // failure, fast-reject, or zero-length success
                if let Some(observer) = observer {
                    observe_at(observer, &state, hooks);
                }
                state = state.advance();
            }
        }
        manager.drop_left(state.offset());
    }
}

/// Run the observer over a matched region, reporting each hit.
fn observe_region<H: MachineHooks>(
    observer: &Matcher,
    manager: &InputStateManager,
    start: usize,
    end: usize,
    hooks: &mut H,
) {
    let mut state = InputState::new(manager, start);
    while state.offset() < end {
        match observe_at(observer, &state, hooks) {
            Some(hit_end) if hit_end > state.offset() => state = state.at(hit_end),
            _ => state = state.advance(),
        }
    }
}

fn observe_at<H: MachineHooks>(
    observer: &Matcher,
    state: &InputState<'_>,
    hooks: &mut H,
) -> Option<usize> {
    if state
        .current_char()
        .is_some_and(|c| !observer.can_start_with(c))
    {
        return None;
    }
    match observer.match_prefix(state) {
        MatchPrefixResult::Matched(m) if !m.is_empty() => {
            let end = m.end();
            hooks.observe_match(m);
            Some(end)
        }
        _ => None,
    }
}

/// Emit listener match events for a match node and its children, parents
/// first, in offset order.
fn emit_match_events(manager: &InputStateManager, m: &PatternMatch, depth: usize) {
    manager.notify_match(m.matcher_id(), m.offset(), m.matched(), depth);
    match m {
        PatternMatch::Tree(tree) => emit_tree_events(manager, tree, depth + 1),
        PatternMatch::Array(array) => {
            for inner in array.contents() {
                emit_match_events(manager, inner, depth + 1);
            }
        }
        _ => {}
    }
}

fn emit_tree_events(manager: &InputStateManager, tree: &TreeMatch, depth: usize) {
    for slot in tree.slots() {
        match slot {
            Slot::Scalar { value, .. } => {
                manager.notify_match(value.matcher_id(), value.offset(), value.matched(), depth);
            }
            Slot::Nested { value, .. } => {
                manager.notify_match(value.matcher_id(), value.offset(), value.matched(), depth);
                emit_tree_events(manager, value, depth + 1);
            }
            Slot::Sequence { value, .. } => {
                manager.notify_match(value.matcher_id(), value.offset(), value.matched(), depth);
                for inner in value.contents() {
                    emit_match_events(manager, inner, depth + 1);
                }
            }
            Slot::Computed { .. } => {}
        }
    }
}

/// Collects matches until an optional predicate says stop.
pub(crate) struct Collector<'f> {
    pub matches: Vec<PatternMatch>,
    stop_after: Option<&'f dyn Fn(&PatternMatch) -> bool>,
}

impl<'f> Collector<'f> {
    pub fn new(stop_after: Option<&'f dyn Fn(&PatternMatch) -> bool>) -> Self {
        Self {
            matches: Vec::new(),
            stop_after,
        }
    }
}

impl MachineHooks for Collector<'_> {
    fn on_match(&mut self, m: PatternMatch) -> NextMatcher {
        let stop = self.stop_after.is_some_and(|f| f(&m));
        self.matches.push(m);
        if stop {
            NextMatcher::Stop
        } else {
            NextMatcher::Continue
        }
    }
}

/// Whole-input parse: succeeds only if the match (plus trailing whitespace)
/// consumes the entire input.
pub fn exact_match(matcher: &Matcher, input: &str) -> Result<PatternMatch, DismatchReport> {
    let manager = InputStateManager::new(Box::new(StringInput::new(input)));
    let state = InputState::new(&manager, 0);
    match matcher.match_prefix(&state) {
        MatchPrefixResult::Matched(m) => {
            let (_, after) = state.at(m.end()).skip_whitespace();
            if after.exhausted() {
                Ok(m)
            } else {
                Err(DismatchReport {
                    matcher_id: matcher.id().to_owned(),
                    consumed: m.end(),
                    remaining: after.peek(50),
                    failure: None,
                })
            }
        }
        MatchPrefixResult::Failed(failure) => Err(DismatchReport {
            matcher_id: matcher.id().to_owned(),
            consumed: 0,
            remaining: state.peek(50),
            failure: Some(failure),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::{integer, literal, Concat};
    use crate::Definitions;

    fn number_after(prefix_text: &str) -> Matcher {
        Matcher::Concat(
            Concat::new("number_after")
                .step("_tag", literal(prefix_text))
                .unwrap()
                .step("num", integer())
                .unwrap(),
        )
    }

    fn find_all(matcher: &Matcher, input: &str) -> Vec<PatternMatch> {
        let mut collector = Collector::new(None);
        scan(
            matcher,
            None,
            Box::new(StringInput::new(input)),
            Vec::new(),
            &mut collector,
        );
        collector.matches
    }

    #[test]
    fn finds_every_occurrence_in_offset_order() {
        let matcher = number_after("#");
        let found = find_all(&matcher, "x # 1 yy # 2 z #3");
        assert_eq!(found.len(), 3);
        let offsets: Vec<_> = found.iter().map(PatternMatch::offset).collect();
        assert!(offsets.windows(2).all(|w| w[0] < w[1]));
        let nums: Vec<_> = found
            .iter()
            .map(|m| m.as_tree().unwrap().integer("num").unwrap())
            .collect();
        assert_eq!(nums, [1, 2, 3]);
    }

    #[test]
    fn matches_do_not_overlap() {
        let matcher = Matcher::from("aa");
        let found = find_all(&matcher, "aaaa");
        assert_eq!(found.len(), 2);
        assert_eq!(
            found.iter().map(PatternMatch::offset).collect::<Vec<_>>(),
            [0, 2]
        );
    }

    #[test]
    fn empty_input_yields_no_matches() {
        let matcher = number_after("#");
        assert!(find_all(&matcher, "").is_empty());
    }

    #[test]
    fn impossible_first_char_scans_cheaply_to_the_end() {
        let matcher = number_after("#");
        assert!(find_all(&matcher, &"abc ".repeat(1000)).is_empty());
    }

    #[test]
    fn stop_after_cuts_the_run_short() {
        let matcher = number_after("#");
        let stop = |_: &PatternMatch| true;
        let mut collector = Collector::new(Some(&stop));
        scan(
            &matcher,
            None,
            Box::new(StringInput::new("# 1 # 2 # 3")),
            Vec::new(),
            &mut collector,
        );
        assert_eq!(collector.matches.len(), 1);
    }

    struct Swapper {
        seen: Vec<String>,
        replacement: Option<Matcher>,
    }

    impl MachineHooks for Swapper {
        fn on_match(&mut self, m: PatternMatch) -> NextMatcher {
            self.seen.push(m.matched().to_owned());
            match self.replacement.take() {
                Some(next) => NextMatcher::Swap(next),
                None => NextMatcher::Continue,
            }
        }
    }

    #[test]
    fn on_match_can_swap_the_active_matcher() {
        let mut hooks = Swapper {
            seen: Vec::new(),
            replacement: Some(Matcher::from("b")),
        };
        scan(
            &Matcher::from("a"),
            None,
            Box::new(StringInput::new("a a b a b")),
            Vec::new(),
            &mut hooks,
        );
        // after the first `a`, only `b`s count
        assert_eq!(hooks.seen, ["a", "b", "b"]);
    }

    struct Observing {
        primary: Vec<String>,
        observed: Vec<String>,
    }

    impl MachineHooks for Observing {
        fn on_match(&mut self, m: PatternMatch) -> NextMatcher {
            self.primary.push(m.matched().to_owned());
            NextMatcher::Continue
        }

        fn observe_match(&mut self, m: PatternMatch) {
            self.observed.push(m.matched().to_owned());
        }
    }

    #[test]
    fn observer_sees_hits_inside_and_outside_matched_regions() {
        // primary: bracketed number; observer: every integer
        let primary = Matcher::Concat(
            Concat::new("bracketed")
                .step("_open", literal("["))
                .unwrap()
                .step("num", integer())
                .unwrap()
                .step("_close", literal("]"))
                .unwrap(),
        );
        let mut hooks = Observing {
            primary: Vec::new(),
            observed: Vec::new(),
        };
        scan(
            &primary,
            Some(&integer()),
            Box::new(StringInput::new("7 [42] 9")),
            Vec::new(),
            &mut hooks,
        );
        assert_eq!(hooks.primary, ["[42]"]);
        // 7 and 9 seen while scanning failures, 42 inside the match region
        assert!(hooks.observed.contains(&"42".to_owned()));
        assert!(hooks.observed.contains(&"7".to_owned()));
        assert!(hooks.observed.contains(&"9".to_owned()));
    }

    #[test]
    fn exact_match_requires_full_consumption() {
        let mg = crate::Microgrammar::from_string("->${fruit}<-")
            .definitions(Definitions::new())
            .compile()
            .unwrap();
        assert!(exact_match(mg.matcher(), "->banana<-").is_ok());
        let err = exact_match(mg.matcher(), "->banana<- extra").unwrap_err();
        assert!(err.consumed > 0);
        assert_eq!(err.remaining, "extra");
        assert!(err.failure.is_none());
    }

    #[test]
    fn exact_match_reports_inner_failure() {
        let err = exact_match(&number_after("#"), "nope").unwrap_err();
        assert_eq!(err.consumed, 0);
        assert!(err.failure.is_some());
    }
}
