//! Few-shot exemplars
//!
//! Exemplars are (input, expected output) pairs produced offline and bound
//! to one pipeline [`Stage`]. They are loaded once at startup and only ever
//! read afterwards. A stage without exemplars runs zero-shot.

mod set;

pub use set::{Exemplar, ExemplarLibrary, ExemplarSet, Stage};
