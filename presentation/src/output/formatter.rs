//! Output formatter trait

use crate::cli::commands::OutputFormat;
use retail_application::AnswerOutcome;
use retail_domain::Question;

/// Trait for formatting answered questions
pub trait OutputFormatter {
    /// Format the answer with route, evidence, query and confidence
    fn format(&self, question: &Question, outcome: &AnswerOutcome) -> String;

    /// Format as JSON
    fn format_json(&self, question: &Question, outcome: &AnswerOutcome) -> String;

    /// Format the answer value only (concise output)
    fn format_answer_only(&self, outcome: &AnswerOutcome) -> String;

    /// Dispatch on the selected output format
    fn render(&self, format: OutputFormat, question: &Question, outcome: &AnswerOutcome) -> String {
        match format {
            OutputFormat::Full => self.format(question, outcome),
            OutputFormat::Answer => self.format_answer_only(outcome),
            OutputFormat::Json => self.format_json(question, outcome),
        }
    }
}
