//! Use cases
//!
//! One per pipeline stage, plus the orchestrator that sequences them and
//! the batch runner on top of it.

pub mod answer_batch;
pub mod answer_question;
pub mod classify_route;
pub mod generate_query;
pub mod repair_loop;
pub(crate) mod shared;
pub mod synthesize_answer;
