//! Update overlay: byte-accurate rewriting of matched regions.
//!
//! A [`ChangeSet`] owns the original text plus an ordered set of
//! non-overlapping span edits. A [`MatchUpdater`] exposes a match tree's
//! slots for assignment by dot-path; every write lands in the change set,
//! and [`MatchUpdater::new_content`] stitches the edits into the rewritten
//! output. Assigning to a nested slot invalidates everything under it.

use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;
use thiserror::Error;

use crate::report::{ScalarValue, Slot, TreeMatch};

#[derive(Debug, Error)]
pub enum UpdateError {
    #[error("no slot `{0}` here")]
    UnknownSlot(String),

    #[error("slot `{0}` is computed and cannot be assigned")]
    ComputedSlot(String),

    #[error("slot `{0}` is not a nested match; its parts cannot be addressed")]
    NotNested(String),

    #[error("overlay under `{0}` was invalidated by an enclosing update")]
    Invalidated(String),

    #[error("edit {start}..{end} overlaps an existing edit")]
    OverlappingEdit { start: usize, end: usize },
}

#[derive(Clone, Debug)]
struct Edit {
    start: usize,
    end: usize,
    text: String,
}

/// The original text plus an ordered set of non-overlapping edits.
#[derive(Debug)]
pub struct ChangeSet {
    original: String,
    edits: Vec<Edit>,
}

impl ChangeSet {
    pub fn new(original: impl Into<String>) -> Self {
        Self {
            original: original.into(),
            edits: Vec::new(),
        }
    }

    /// Record `[start, end) -> text`. Re-recording the same span replaces the
    /// earlier edit; an edit whose span strictly contains existing edits
    /// supersedes them. Partial overlaps, and edits inside an already
    /// replaced region, are usage errors.
    pub fn change(
        &mut self,
        start: usize,
        end: usize,
        text: impl Into<String>,
    ) -> Result<(), UpdateError> {
        let text = text.into();
        if let Some(existing) = self
            .edits
            .iter_mut()
            .find(|e| e.start == start && e.end == end)
        {
            existing.text = text;
            return Ok(());
        }
        if self.edits.iter().any(|e| e.start <= start && end <= e.end) {
            return Err(UpdateError::OverlappingEdit { start, end });
        }
        let partial = self.edits.iter().any(|e| {
            e.start < end && start < e.end && !(start <= e.start && e.end <= end)
        });
        if partial {
            return Err(UpdateError::OverlappingEdit { start, end });
        }
        self.edits
            .retain(|e| !(start <= e.start && e.end <= end));
        self.edits.push(Edit { start, end, text });
        Ok(())
    }

    /// The original text with all edits applied left to right.
    pub fn updated(&self) -> String {
        self.updated_range(0, self.original.len())
    }

    /// The current text of `[start, end)`: the original slice with the edits
    /// recorded inside that span applied.
    pub fn updated_range(&self, start: usize, end: usize) -> String {
        let mut edits: Vec<&Edit> = self
            .edits
            .iter()
            .filter(|e| start <= e.start && e.end <= end)
            .collect();
        edits.sort_by_key(|e| e.start);
        let mut out = String::with_capacity(end - start);
        let mut at = start;
        for edit in edits {
            out.push_str(&self.original[at..edit.start]);
            out.push_str(&edit.text);
            at = edit.end;
        }
        out.push_str(&self.original[at..end]);
        out
    }
}

#[derive(Clone, Debug)]
enum UpdaterSlot {
    /// A scalar or sequence slot: a flat replaceable span.
    Span {
        start: usize,
        end: usize,
        original: String,
        current: Option<String>,
    },
    /// A nested tree slot with its own addressable parts.
    Nested {
        node: UpdaterNode,
        replaced: bool,
    },
    Computed {
        value: ScalarValue,
    },
}

#[derive(Clone, Debug)]
struct UpdaterNode {
    start: usize,
    end: usize,
    slots: IndexMap<String, UpdaterSlot>,
}

impl UpdaterNode {
    fn build(tree: &TreeMatch) -> Self {
        let mut slots = IndexMap::new();
        for slot in tree.slots() {
            match slot {
                Slot::Scalar { name, value } => {
                    slots.insert(
                        name.clone(),
                        UpdaterSlot::Span {
                            start: value.offset(),
                            end: value.end(),
                            original: value.matched().to_owned(),
                            current: None,
                        },
                    );
                }
                Slot::Sequence { name, value } => {
                    slots.insert(
                        name.clone(),
                        UpdaterSlot::Span {
                            start: value.offset(),
                            end: value.end(),
                            original: value.matched().to_owned(),
                            current: None,
                        },
                    );
                }
                Slot::Nested { name, value } => {
                    slots.insert(
                        name.clone(),
                        UpdaterSlot::Nested {
                            node: UpdaterNode::build(value),
                            replaced: false,
                        },
                    );
                }
                Slot::Computed { name, value } => {
                    slots.insert(
                        name.clone(),
                        UpdaterSlot::Computed {
                            value: value.clone(),
                        },
                    );
                }
            }
        }
        Self {
            start: tree.offset(),
            end: tree.end(),
            slots,
        }
    }

    fn set(
        &mut self,
        path: &[&str],
        value: &str,
        change_set: &Rc<RefCell<ChangeSet>>,
    ) -> Result<(), UpdateError> {
        let (head, rest) = path
            .split_first()
            .expect("paths are non-empty by construction");
        let slot = self
            .slots
            .get_mut(*head)
            .ok_or_else(|| UpdateError::UnknownSlot((*head).to_owned()))?;
        match slot {
            UpdaterSlot::Span {
                start,
                end,
                current,
                ..
            } => {
                if !rest.is_empty() {
                    return Err(UpdateError::NotNested((*head).to_owned()));
                }
                change_set.borrow_mut().change(*start, *end, value)?;
                *current = Some(value.to_owned());
                Ok(())
            }
            UpdaterSlot::Nested { node, replaced } => {
                if *replaced {
                    return Err(UpdateError::Invalidated((*head).to_owned()));
                }
                if rest.is_empty() {
                    change_set
                        .borrow_mut()
                        .change(node.start, node.end, value)?;
                    *replaced = true;
                    Ok(())
                } else {
                    node.set(rest, value, change_set)
                }
            }
            UpdaterSlot::Computed { .. } => Err(UpdateError::ComputedSlot((*head).to_owned())),
        }
    }

    fn get(
        &self,
        path: &[&str],
        change_set: &Rc<RefCell<ChangeSet>>,
    ) -> Result<String, UpdateError> {
        let (head, rest) = path
            .split_first()
            .expect("paths are non-empty by construction");
        let slot = self
            .slots
            .get(*head)
            .ok_or_else(|| UpdateError::UnknownSlot((*head).to_owned()))?;
        match slot {
            UpdaterSlot::Span {
                original, current, ..
            } => {
                if !rest.is_empty() {
                    return Err(UpdateError::NotNested((*head).to_owned()));
                }
                Ok(current.clone().unwrap_or_else(|| original.clone()))
            }
            UpdaterSlot::Nested { node, replaced } => {
                if *replaced {
                    return Err(UpdateError::Invalidated((*head).to_owned()));
                }
                if rest.is_empty() {
                    // current value: the node's span with any edits already
                    // written to its descendants stitched in
                    Ok(change_set.borrow().updated_range(node.start, node.end))
                } else {
                    node.get(rest, change_set)
                }
            }
            UpdaterSlot::Computed { value } => {
                if !rest.is_empty() {
                    return Err(UpdateError::NotNested((*head).to_owned()));
                }
                Ok(value.to_string())
            }
        }
    }
}

/// Setter overlay over one match tree.
pub struct MatchUpdater {
    change_set: Rc<RefCell<ChangeSet>>,
    root: UpdaterNode,
    root_replaced: bool,
}

impl MatchUpdater {
    /// Overlay `tree` on the text it was matched against.
    pub fn new(tree: &TreeMatch, content: &str) -> Self {
        Self::sharing(tree, Rc::new(RefCell::new(ChangeSet::new(content))))
    }

    pub(crate) fn sharing(tree: &TreeMatch, change_set: Rc<RefCell<ChangeSet>>) -> Self {
        Self {
            change_set,
            root: UpdaterNode::build(tree),
            root_replaced: false,
        }
    }

    /// Assign a slot by dot-path, e.g. `set("second.name", "x")`.
    pub fn set(&mut self, path: &str, value: &str) -> Result<(), UpdateError> {
        if self.root_replaced {
            return Err(UpdateError::Invalidated(path.to_owned()));
        }
        let parts: Vec<&str> = path.split('.').collect();
        self.root.set(&parts, value, &self.change_set)
    }

    /// Read a slot's current (possibly overridden) value by dot-path.
    pub fn get(&self, path: &str) -> Result<String, UpdateError> {
        if self.root_replaced {
            return Err(UpdateError::Invalidated(path.to_owned()));
        }
        let parts: Vec<&str> = path.split('.').collect();
        self.root.get(&parts, &self.change_set)
    }

    /// Replace the entire matched span.
    pub fn replace_all(&mut self, text: &str) -> Result<(), UpdateError> {
        self.change_set
            .borrow_mut()
            .change(self.root.start, self.root.end, text)?;
        self.root_replaced = true;
        Ok(())
    }

    /// The original text with every recorded edit applied.
    pub fn new_content(&self) -> String {
        self.change_set.borrow().updated()
    }
}

/// Overlay over several matches of the same text, sharing one change set.
pub struct BulkUpdater {
    change_set: Rc<RefCell<ChangeSet>>,
    updaters: Vec<MatchUpdater>,
}

impl BulkUpdater {
    pub fn new(trees: &[&TreeMatch], content: &str) -> Self {
        let change_set = Rc::new(RefCell::new(ChangeSet::new(content)));
        let updaters = trees
            .iter()
            .map(|tree| MatchUpdater::sharing(tree, change_set.clone()))
            .collect();
        Self {
            change_set,
            updaters,
        }
    }

    pub fn len(&self) -> usize {
        self.updaters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.updaters.is_empty()
    }

    /// The overlay for the `i`-th match.
    pub fn updater(&mut self, i: usize) -> &mut MatchUpdater {
        &mut self.updaters[i]
    }

    /// The original text with edits from every overlay applied.
    pub fn updated(&self) -> String {
        self.change_set.borrow().updated()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_edits_round_trips() {
        let cs = ChangeSet::new("unchanged text");
        assert_eq!(cs.updated(), "unchanged text");
    }

    #[test]
    fn edits_apply_left_to_right() {
        let mut cs = ChangeSet::new("a = 1, b = 2");
        cs.change(4, 5, "10").unwrap();
        cs.change(11, 12, "20").unwrap();
        assert_eq!(cs.updated(), "a = 10, b = 20");
    }

    #[test]
    fn same_span_replaces() {
        let mut cs = ChangeSet::new("x");
        cs.change(0, 1, "first").unwrap();
        cs.change(0, 1, "second").unwrap();
        assert_eq!(cs.updated(), "second");
    }

    #[test]
    fn containing_edit_supersedes_contained_ones() {
        let mut cs = ChangeSet::new("<first><second>");
        cs.change(8, 14, "inner").unwrap();
        cs.change(7, 15, "<outer>").unwrap();
        assert_eq!(cs.updated(), "<first><outer>");
    }

    #[test]
    fn updated_range_applies_only_contained_edits() {
        let mut cs = ChangeSet::new("<first><second>");
        cs.change(1, 6, "one").unwrap();
        cs.change(8, 14, "two").unwrap();
        assert_eq!(cs.updated_range(0, 7), "<one>");
        assert_eq!(cs.updated_range(7, 15), "<two>");
        assert_eq!(cs.updated(), "<one><two>");
    }

    #[test]
    fn partial_overlap_is_an_error() {
        let mut cs = ChangeSet::new("abcdef");
        cs.change(0, 4, "x").unwrap();
        assert!(matches!(
            cs.change(2, 6, "y"),
            Err(UpdateError::OverlappingEdit { .. })
        ));
    }

    #[test]
    fn edit_inside_replaced_region_is_an_error() {
        let mut cs = ChangeSet::new("abcdef");
        cs.change(0, 6, "whole").unwrap();
        assert!(matches!(
            cs.change(2, 4, "part"),
            Err(UpdateError::OverlappingEdit { .. })
        ));
    }
}
