//! Listener protocol: side-effect-only observation hooks.
//!
//! Listeners see (a) each character the first time it is read past the
//! window's right edge, in offset order, and (b) each match node the driver
//! produces, parents before children, annotated with its tree depth. Return
//! values are deliberately absent; listeners cannot steer matching.

use std::cell::RefCell;
use std::rc::Rc;

pub trait MatchListener {
    fn on_character(&mut self, _c: char, _offset: usize) {}

    fn on_match(&mut self, _matcher_id: &str, _offset: usize, _matched: &str, _depth: usize) {}
}

/// Shared handle to a listener. Callers keep a clone to inspect listener
/// state after a run finishes.
pub type SharedListener = Rc<RefCell<dyn MatchListener>>;
