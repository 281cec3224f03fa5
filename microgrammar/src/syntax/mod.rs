//! Template compiler: turns a template string like `"foo⤞${name} = ${value}"`
//! into a [`Concat`].
//!
//! Template syntax:
//! - `${name}` introduces a hole. A hole with a definition uses the supplied
//!   matcher; an undefined hole becomes a non-greedy skip up to the next
//!   anchor (the terminator is matched but not consumed).
//! - `⤞` marks an explicit gap: arbitrary text may precede the following
//!   anchor or defined hole.
//! - literal text matches verbatim; a lone `$` is literal.
//! - whitespace in the template is elastic (any input whitespace run) while
//!   whitespace consumption is on, and verbatim when off.
//!
//! Construction errors (malformed holes, adjacent undefined holes, a
//! trailing undefined hole, dangling gaps, unused definitions) surface
//! synchronously as [`DefinitionError`]s.

use std::collections::HashSet;

use logos::Logos;

use crate::error::DefinitionError;
use crate::matcher::{Concat, Matcher, Skip};
use crate::microgrammar::Definitions;

#[derive(Logos, Clone, Copy, Debug, PartialEq)]
enum TemplateToken {
    #[regex(r"\$\{[A-Za-z_][A-Za-z0-9_]*\}")]
    Hole,

    #[token("⤞")]
    Gap,

    #[regex(r"[ \t\r\n]+")]
    Whitespace,

    /// Plain text.
    #[regex(r"[^$⤞ \t\r\n]+")]
    Text,

    /// A `$` that does not open a hole.
    #[token("$")]
    Dollar,
}

#[derive(Debug, PartialEq)]
enum Element {
    Anchor(String),
    Ws(String),
    Hole(String),
    Gap,
}

fn tokenize(template: &str) -> Result<Vec<Element>, DefinitionError> {
    let mut lex = TemplateToken::lexer(template);
    let mut elements: Vec<Element> = Vec::new();
    while let Some(token) = lex.next() {
        let Ok(token) = token else {
            return Err(DefinitionError::MalformedHole(lex.slice().to_owned()));
        };
        match token {
            TemplateToken::Hole => {
                let slice = lex.slice();
                elements.push(Element::Hole(slice[2..slice.len() - 1].to_owned()));
            }
            TemplateToken::Gap => elements.push(Element::Gap),
            TemplateToken::Whitespace => elements.push(Element::Ws(lex.slice().to_owned())),
            TemplateToken::Text | TemplateToken::Dollar => match elements.last_mut() {
                Some(Element::Anchor(anchor)) => anchor.push_str(lex.slice()),
                _ => elements.push(Element::Anchor(lex.slice().to_owned())),
            },
        }
    }
    // a `$` that ran into `{` without forming a valid hole ends up inside an
    // anchor; reject it instead of matching it literally
    for element in &elements {
        if let Element::Anchor(anchor) = element {
            if let Some(pos) = anchor.find("${") {
                return Err(DefinitionError::MalformedHole(
                    anchor[pos..].chars().take(16).collect(),
                ));
            }
        }
    }
    Ok(elements)
}

fn anchor_matcher(element: &Element, definitions: &Definitions) -> Option<Matcher> {
    match element {
        Element::Anchor(text) => Some(Matcher::from(text.as_str())),
        Element::Hole(name) => definitions.get(name).cloned(),
        _ => None,
    }
}

/// Compile a template into a concatenation over `definitions`.
pub(crate) fn compile(
    template: &str,
    definitions: &Definitions,
    consume_white_space: bool,
    id: &str,
) -> Result<Concat, DefinitionError> {
    let raw = tokenize(template)?;

    // elastic whitespace disappears from the step list; verbatim whitespace
    // folds into the neighbouring anchors
    let mut elements: Vec<Element> = Vec::new();
    for element in raw {
        match element {
            Element::Ws(_) if consume_white_space => {}
            Element::Ws(text) | Element::Anchor(text) => match elements.last_mut() {
                Some(Element::Anchor(anchor)) => anchor.push_str(&text),
                _ => elements.push(Element::Anchor(text)),
            },
            other => elements.push(other),
        }
    }

    if elements.is_empty() {
        return Err(DefinitionError::EmptyTemplate);
    }

    let mut concat = Concat::new(id).consume_white_space(consume_white_space);
    let mut used: HashSet<String> = HashSet::new();
    let mut gap_pending = false;
    let mut literal_count = 0usize;

    for i in 0..elements.len() {
        match &elements[i] {
            Element::Ws(_) => {}
            Element::Gap => {
                if gap_pending {
                    return Err(DefinitionError::DanglingGap);
                }
                gap_pending = true;
            }
            Element::Anchor(text) => {
                let name = format!("_lit{literal_count}");
                literal_count += 1;
                let mut matcher = Matcher::from(text.as_str());
                if std::mem::take(&mut gap_pending) {
                    matcher = Matcher::Skip(Skip::yada(matcher));
                }
                concat = concat.step(name, matcher)?;
            }
            Element::Hole(hole) => {
                if let Some(defined) = definitions.get(hole) {
                    used.insert(hole.clone());
                    let mut matcher = defined.clone();
                    if std::mem::take(&mut gap_pending) {
                        matcher = Matcher::Skip(Skip::yada(matcher));
                    }
                    concat = concat.step(hole.clone(), matcher)?;
                } else {
                    if gap_pending {
                        return Err(DefinitionError::DanglingGap);
                    }
                    let terminator = match elements.get(i + 1) {
                        None => return Err(DefinitionError::UnterminatedHole(hole.clone())),
                        Some(Element::Hole(next)) if definitions.get(next).is_none() => {
                            return Err(DefinitionError::AdjacentHoles(
                                hole.clone(),
                                next.clone(),
                            ));
                        }
                        Some(next) => anchor_matcher(next, definitions)
                            .ok_or_else(|| DefinitionError::UnterminatedHole(hole.clone()))?,
                    };
                    concat =
                        concat.step(hole.clone(), Matcher::Skip(Skip::up_to(terminator)))?;
                }
            }
        }
    }

    if gap_pending {
        return Err(DefinitionError::DanglingGap);
    }
    for name in definitions.names() {
        if !used.contains(name) {
            return Err(DefinitionError::UnusedDefinition(name.to_owned()));
        }
    }
    Ok(concat)
}
