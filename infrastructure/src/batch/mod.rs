//! Batch file formats

mod jsonl;

pub use jsonl::{BatchIoError, read_questions, write_records};
