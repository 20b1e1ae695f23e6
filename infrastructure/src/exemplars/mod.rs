//! Few-shot exemplar artifacts

mod loader;

pub use loader::{ExemplarError, ExemplarLoader};
