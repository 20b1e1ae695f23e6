//! Core domain concepts shared across all subdomains.
//!
//! - [`model::Model`]: inference backend model tags (router, coder, synthesizer)
//! - [`question::Question`]: a validated question with an optional format hint
//! - [`format_hint::FormatHint`]: the caller's expected answer shape
//! - [`error::DomainError`]: domain-level errors

pub mod error;
pub mod format_hint;
pub mod model;
pub mod question;
pub mod string;
