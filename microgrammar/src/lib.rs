/*!
A parser-combinator engine for the territory between regular expressions and
full grammars: declarative patterns made of literal anchors, named holes and
sub-matchers that find every occurrence inside a larger text, skip arbitrary
junk between anchors when told to, and rewrite the regions they matched with
byte-accurate edits.

## Features
- Template grammars: `"${name} = ${value}"` compiles into a matcher tree. An
  undefined hole becomes a non-greedy "anything up to the next anchor"; `⤞`
  allows arbitrary text before the next anchor.
- A small combinator algebra under [`matcher`]: literals, anchored regexes,
  concatenation with an elastic whitespace strategy, repetition with
  separators, alternation, optionality, skip-until and negative look-ahead,
  plus typed veto predicates and computed slots.
- Structured matches: a [tree of typed nodes](report::PatternMatch) whose
  leaves carry slot values and exact byte spans.
- In-place rewriting: an [update overlay](update) records slot assignments as
  non-overlapping span edits and stitches them into the rewritten text.
- Streaming inputs: a sliding window releases consumed text, so memory stays
  bounded by the largest match span rather than the input length.
*/
//! ## Usage
//! ```
//! use microgrammar::{matcher::integer, Definitions, Microgrammar};
//!
//! let mg = Microgrammar::from_string("${key} = ${value}")
//!     .definitions(
//!         Definitions::new()
//!             .define("key", microgrammar::matcher::regex("[a-z_]+")?)?
//!             .define("value", integer())?,
//!     )
//!     .compile()?;
//!
//! let matches = mg.find_matches("retries = 3, delay = 20");
//! assert_eq!(matches.len(), 2);
//! let first = matches[0].as_tree().unwrap();
//! assert_eq!(first.text("key"), Some("retries"));
//! assert_eq!(first.integer("value"), Some(3));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
/*!
## Rewriting matched regions
```
use microgrammar::Microgrammar;

let mg = Microgrammar::from_string("<${name}>").compile()?;
let content = "<first><second>";
let matches = mg.find_matches(content);

let tree = matches[1].as_tree().unwrap();
let mut updater = Microgrammar::updatable_match(tree, content);
updater.set("name", "renamed")?;
assert_eq!(updater.new_content(), "<first><renamed>");
# Ok::<(), Box<dyn std::error::Error>>(())
```

## Scanning with a state machine
The [`machine`] module exposes the underlying driver: implement
[`machine::MachineHooks`] to swap the active matcher between matches or to
run an observer matcher in parallel with the primary one (e.g. tracking
element depth while searching for something else).
*/

pub mod input;
pub mod machine;
pub mod matcher;
pub mod report;
pub mod update;

mod error;
mod microgrammar;
mod syntax;

pub use error::DefinitionError;
pub use microgrammar::{Definitions, Microgrammar};
pub use report::{
    ArrayMatch, BoundSlots, DismatchReport, MatchFailure, MatchPrefixResult, PatternMatch,
    ScalarValue, Slot, TerminalMatch, TreeMatch,
};
pub use update::{BulkUpdater, ChangeSet, MatchUpdater, UpdateError};
