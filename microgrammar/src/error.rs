//! Construction-time errors.
//!
//! Grammar construction bugs surface synchronously as [`DefinitionError`]s;
//! data-dependent mismatches surface as failure reports, never as errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DefinitionError {
    #[error("invalid regular expression /{pattern}/: {source}")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex_automata::meta::BuildError,
    },

    #[error("slot name `{0}` is not identifier-shaped ([A-Za-z_][A-Za-z0-9_]*)")]
    InvalidSlotName(String),

    #[error("name `{0}` is reserved: `$`-prefixed names belong to the engine")]
    ReservedName(String),

    #[error("slot `{0}` is defined more than once")]
    DuplicateSlot(String),

    #[error("template hole near `{0}` is malformed; holes look like ${{name}}")]
    MalformedHole(String),

    #[error("holes `${{{0}}}` and `${{{1}}}` are both undefined and adjacent; separate them with a literal anchor or a defined matcher")]
    AdjacentHoles(String, String),

    #[error("undefined hole `${{{0}}}` has no following anchor to terminate it")]
    UnterminatedHole(String),

    #[error("gap marker must be followed by a literal anchor or a defined hole")]
    DanglingGap,

    #[error("definition `{0}` is not referenced by the template")]
    UnusedDefinition(String),

    #[error("template contains no steps")]
    EmptyTemplate,
}
