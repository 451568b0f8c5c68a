//! Selection conditions: pairtools-style expressions translated to SQL.
//!
//! See [`predicate`] for the grammar and the helper functions.

pub mod predicate;
