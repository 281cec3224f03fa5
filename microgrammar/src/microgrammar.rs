//! The user-facing façade: build a grammar from a template or a step table,
//! then find, exactly match, or rewrite its matches.

use bon::bon;
use indexmap::IndexMap;

use crate::error::DefinitionError;
use crate::input::{InputStream, SharedListener, StringInput};
use crate::machine::{self, Collector};
use crate::matcher::{validate_name, Concat, Matcher, MatchingLogic, Named};
use crate::report::{DismatchReport, PatternMatch, TreeMatch};
use crate::update::{BulkUpdater, MatchUpdater};

/// Ordered slot-name → matcher table, used both as a template's hole
/// definitions and as a step table for [`Microgrammar::from_definitions`].
#[derive(Clone, Debug, Default)]
pub struct Definitions {
    map: IndexMap<String, Matcher>,
}

impl Definitions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name` to a matcher. Names must be identifier-shaped; `$` is
    /// reserved and duplicates are rejected.
    pub fn define(
        mut self,
        name: impl Into<String>,
        matcher: impl Into<Matcher>,
    ) -> Result<Self, DefinitionError> {
        let name = name.into();
        validate_name(&name)?;
        if self.map.contains_key(&name) {
            return Err(DefinitionError::DuplicateSlot(name));
        }
        self.map.insert(name, matcher.into());
        Ok(self)
    }

    pub(crate) fn get(&self, name: &str) -> Option<&Matcher> {
        self.map.get(name)
    }

    pub(crate) fn names(&self) -> impl Iterator<Item = &str> {
        self.map.keys().map(String::as_str)
    }

    pub(crate) fn entries(&self) -> impl Iterator<Item = (&str, &Matcher)> {
        self.map.iter().map(|(n, m)| (n.as_str(), m))
    }
}

/// A compiled microgrammar: a declarative pattern that can be found anywhere
/// inside a larger input, matched exactly against a whole input, or used to
/// rewrite the regions it matched.
#[derive(Clone, Debug)]
pub struct Microgrammar {
    id: String,
    matcher: Matcher,
}

#[bon]
impl Microgrammar {
    /// Compile a template string such as `"${name} = ${value}"` into a
    /// grammar. Holes with no entry in `definitions` become non-greedy skips
    /// up to the next anchor; `⤞` allows arbitrary text before the following
    /// anchor.
    ///
    /// ```
    /// use microgrammar::{matcher::integer, Definitions, Microgrammar};
    ///
    /// let mg = Microgrammar::from_string("foo⤞${num}")
    ///     .definitions(Definitions::new().define("num", integer())?)
    ///     .compile()?;
    /// let matches = mg.find_matches("foo (and some junk) 63");
    /// assert_eq!(matches[0].matched(), "foo (and some junk) 63");
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    #[builder(finish_fn = compile)]
    pub fn from_string(
        #[builder(start_fn)] template: &str,

        /// Matchers for the template's holes. Unreferenced entries are
        /// construction errors.
        definitions: Option<Definitions>,

        /// Skip whitespace before each step, and treat template whitespace
        /// as elastic. Default: on.
        #[builder(default = true)]
        consume_white_space: bool,

        /// Identifier used in diagnostics and match reports.
        #[builder(into)]
        name: Option<String>,
    ) -> Result<Microgrammar, DefinitionError> {
        let id = name.unwrap_or_else(|| "microgrammar".to_owned());
        let definitions = definitions.unwrap_or_default();
        let concat = crate::syntax::compile(template, &definitions, consume_white_space, &id)?;
        Ok(Microgrammar {
            id,
            matcher: Matcher::Concat(concat),
        })
    }
}

impl Microgrammar {
    /// Build a grammar directly from an ordered step table.
    pub fn from_definitions(
        name: &str,
        definitions: Definitions,
    ) -> Result<Self, DefinitionError> {
        let mut concat = Concat::new(name);
        for (step_name, matcher) in definitions.entries() {
            concat = concat.step(step_name, matcher.clone())?;
        }
        Ok(Self {
            id: name.to_owned(),
            matcher: Matcher::Concat(concat),
        })
    }

    /// Wrap an explicitly built concatenation (the way to get veto and
    /// computed steps into a grammar).
    pub fn from_concat(concat: Concat) -> Self {
        Self {
            id: concat.id().to_owned(),
            matcher: Matcher::Concat(concat),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    /// Every match in `input`, in strictly increasing offset order.
    pub fn find_matches(&self, input: &str) -> Vec<PatternMatch> {
        self.find_matches_with(input, Vec::new(), None)
    }

    /// Like [`find_matches`](Self::find_matches), with listeners and an
    /// optional early stop.
    pub fn find_matches_with(
        &self,
        input: &str,
        listeners: Vec<SharedListener>,
        stop_after: Option<&dyn Fn(&PatternMatch) -> bool>,
    ) -> Vec<PatternMatch> {
        self.find_matches_in_stream(Box::new(StringInput::new(input)), listeners, stop_after)
    }

    /// Scan a stream instead of an in-memory string; the window behind the
    /// scan cursor is released as matching proceeds.
    pub fn find_matches_in(&self, stream: Box<dyn InputStream>) -> Vec<PatternMatch> {
        self.find_matches_in_stream(stream, Vec::new(), None)
    }

    fn find_matches_in_stream(
        &self,
        stream: Box<dyn InputStream>,
        listeners: Vec<SharedListener>,
        stop_after: Option<&dyn Fn(&PatternMatch) -> bool>,
    ) -> Vec<PatternMatch> {
        let mut collector = Collector::new(stop_after);
        machine::scan(&self.matcher, None, stream, listeners, &mut collector);
        collector.matches
    }

    /// The first match in `input`, if any.
    pub fn first_match(&self, input: &str) -> Option<PatternMatch> {
        let stop = |_: &PatternMatch| true;
        self.find_matches_with(input, Vec::new(), Some(&stop))
            .into_iter()
            .next()
    }

    /// Whole-input parse: fails with a report if anything but trailing
    /// whitespace remains.
    pub fn exact_match(&self, input: &str) -> Result<PatternMatch, DismatchReport> {
        machine::exact_match(&self.matcher, input)
    }

    /// Setter overlay for one match of `content`.
    pub fn updatable_match(tree: &TreeMatch, content: &str) -> MatchUpdater {
        MatchUpdater::new(tree, content)
    }

    /// Shared overlay for several matches of the same `content`.
    pub fn updatable(trees: &[&TreeMatch], content: &str) -> BulkUpdater {
        BulkUpdater::new(trees, content)
    }
}

/// A microgrammar can stand in anywhere a matcher is expected, carrying its
/// own name into diagnostics.
impl From<&Microgrammar> for Matcher {
    fn from(mg: &Microgrammar) -> Self {
        Matcher::Named(Named::new(mg.id.clone(), mg.matcher.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::integer;

    #[test]
    fn from_definitions_builds_an_ordered_concat() {
        let mg = Microgrammar::from_definitions(
            "range",
            Definitions::new()
                .define("low", integer())
                .unwrap()
                .define("_dots", crate::matcher::literal(".."))
                .unwrap()
                .define("high", integer())
                .unwrap(),
        )
        .unwrap();
        let m = mg.exact_match("1..10").unwrap();
        let tree = m.as_tree().unwrap();
        assert_eq!(tree.integer("low"), Some(1));
        assert_eq!(tree.integer("high"), Some(10));
    }

    #[test]
    fn duplicate_definitions_are_rejected() {
        let result = Definitions::new()
            .define("x", integer())
            .unwrap()
            .define("x", integer());
        assert!(matches!(result, Err(DefinitionError::DuplicateSlot(_))));
    }

    #[test]
    fn grammar_name_reaches_reports() {
        let mg = Microgrammar::from_string("n=${num}")
            .definitions(Definitions::new().define("num", integer()).unwrap())
            .name("assignment")
            .compile()
            .unwrap();
        let m = mg.first_match("say n=1 ok").unwrap();
        assert_eq!(m.matcher_id(), "assignment");
    }

    #[test]
    fn first_match_stops_early() {
        let mg = Microgrammar::from_string("#${num}")
            .definitions(Definitions::new().define("num", integer()).unwrap())
            .compile()
            .unwrap();
        let m = mg.first_match("#1 #2 #3").unwrap();
        assert_eq!(m.as_tree().unwrap().integer("num"), Some(1));
        assert!(mg.first_match("no tags").is_none());
    }
}
