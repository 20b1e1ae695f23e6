//! Console output formatter for answered questions

use crate::output::formatter::OutputFormatter;
use colored::Colorize;
use retail_application::{AnswerOutcome, BatchRecord};
use retail_domain::{QueryResult, Question};
use serde_json::json;

/// Formats answers for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Format the complete answer
    pub fn format(question: &Question, outcome: &AnswerOutcome) -> String {
        let answer = &outcome.answer;
        let trace = &outcome.trace;
        let mut output = String::new();

        output.push_str(&Self::header("Retail Copilot"));
        output.push('\n');

        output.push_str(&format!(
            "{} {}\n",
            "Question:".cyan().bold(),
            question.content()
        ));
        if let Some(hint) = question.format_hint() {
            output.push_str(&format!("{} {}\n", "Format:".cyan().bold(), hint));
        }

        let route = if trace.route_fell_back {
            format!("{} {}", answer.route, "(fallback)".dimmed())
        } else {
            answer.route.to_string()
        };
        output.push_str(&format!("{} {}\n", "Route:".cyan().bold(), route));

        // Retrieved evidence
        if let Some(retrieval) = &trace.retrieval {
            output.push_str(&Self::section_header("Retrieved Chunks"));
            if retrieval.is_empty() {
                output.push_str(&format!("{}\n", "  no matching chunks".dimmed()));
            }
            for scored in &retrieval.chunks {
                output.push_str(&format!(
                    "  {} {}\n",
                    format!("{:>6.2}", scored.score).yellow(),
                    scored.chunk.id
                ));
            }
        }

        // Query attempts
        if let Some(repair) = &trace.repair {
            output.push_str(&Self::section_header("Query Attempts"));
            if repair.is_empty() {
                output.push_str(&format!("{}\n", "  no query could be generated".dimmed()));
            }
            for step in repair.steps() {
                let label = if step.attempt.index == 0 {
                    "initial".to_string()
                } else {
                    format!("repair {}", step.attempt.index)
                };
                let status = match &step.result {
                    QueryResult::Success { rows, .. } => {
                        format!("{} {} row(s)", "v".green(), rows.len())
                    }
                    QueryResult::Failure { error } if !step.executed => {
                        format!("{} {} {}", "x".red(), error, "(not executed)".dimmed())
                    }
                    QueryResult::Failure { error } => format!("{} {}", "x".red(), error),
                };
                let title = format!("── {label} ──").yellow().bold();
                output.push_str(&format!("\n{} {}\n", title, status));
                output.push_str(&Self::indent(&step.attempt.sql, "    "));
                output.push('\n');
            }
        }

        // Answer
        output.push_str(&Self::section_header("Answer"));
        let value = if answer.insufficient_evidence {
            format!("{} {}", answer.value_display(), "(insufficient evidence)".red())
        } else if answer.format_mismatch {
            format!("{} {}", answer.value_display(), "(format mismatch)".yellow())
        } else {
            answer.value_display().bold().to_string()
        };
        output.push_str(&format!("\n{}\n", value));
        if !answer.explanation.is_empty() {
            output.push_str(&format!("\n{}\n", answer.explanation));
        }

        let confidence = format!("{:.2}", answer.confidence);
        let confidence = if answer.confidence >= 0.7 {
            confidence.green()
        } else if answer.confidence >= 0.4 {
            confidence.yellow()
        } else {
            confidence.red()
        };
        let b = &outcome.breakdown;
        output.push_str(&format!(
            "\n{} {} {}\n",
            "Confidence:".cyan().bold(),
            confidence,
            format!(
                "(base {:.1} + retrieval {:.2} + query {:.1} + rows {:.1} - repairs {:.1})",
                b.base, b.retrieval, b.query_success, b.non_empty, b.repair_penalty
            )
            .dimmed()
        ));

        if !answer.citations.is_empty() {
            output.push_str(&format!("\n{}\n", "Citations:".cyan().bold()));
            for citation in &answer.citations {
                output.push_str(&format!("  * {}\n", citation));
            }
        }

        output.push_str(&Self::footer());

        output
    }

    /// Format as JSON
    pub fn format_json(question: &Question, outcome: &AnswerOutcome) -> String {
        let answer = &outcome.answer;
        let value = json!({
            "id": question.id(),
            "question": question.content(),
            "route": answer.route,
            "route_fell_back": outcome.trace.route_fell_back,
            "final_answer": answer.value,
            "sql": answer.sql.as_deref().unwrap_or_default(),
            "confidence": answer.confidence,
            "confidence_breakdown": outcome.breakdown,
            "explanation": answer.explanation,
            "citations": answer.citations,
            "insufficient_evidence": answer.insufficient_evidence,
            "format_mismatch": answer.format_mismatch,
        });
        serde_json::to_string_pretty(&value).unwrap_or_else(|_| "{}".to_string())
    }

    /// Format the answer value only (concise output)
    pub fn format_answer_only(outcome: &AnswerOutcome) -> String {
        format!("{}\n", outcome.answer.value_display())
    }

    /// One-line summary printed after a batch run
    pub fn format_batch_summary(records: &[BatchRecord], out: &std::path::Path) -> String {
        let total = records.len();
        let mean = if total == 0 {
            0.0
        } else {
            records.iter().map(|r| r.confidence).sum::<f64>() / total as f64
        };
        let low = records.iter().filter(|r| r.confidence < 0.4).count();
        let mut output = format!(
            "{} {} answer(s) written to {} (mean confidence {:.2})\n",
            "Done:".green().bold(),
            total,
            out.display(),
            mean
        );
        if low > 0 {
            output.push_str(&format!(
                "{} {} answer(s) below 0.40 confidence\n",
                "Note:".yellow().bold(),
                low
            ));
        }
        output
    }

    /// Force colors off (`--no-color`, `[output] color = false`)
    pub fn disable_color() {
        colored::control::set_override(false);
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    fn footer() -> String {
        format!("\n{}\n", "=".repeat(60).cyan())
    }

    /// Indent a multi-line string
    pub fn indent(text: &str, prefix: &str) -> String {
        text.lines()
            .map(|line| format!("{}{}", prefix, line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn format(&self, question: &Question, outcome: &AnswerOutcome) -> String {
        Self::format(question, outcome)
    }

    fn format_json(&self, question: &Question, outcome: &AnswerOutcome) -> String {
        Self::format_json(question, outcome)
    }

    fn format_answer_only(&self, outcome: &AnswerOutcome) -> String {
        Self::format_answer_only(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands::OutputFormat;
    use retail_domain::{
        Citation, ConfidenceBreakdown, FinalAnswer, FormatHint, PipelineTrace, QueryAttempt,
        RepairTrace, RouteDecision, Row, Scalar,
    };

    fn outcome() -> AnswerOutcome {
        let mut repair = RepairTrace::new();
        repair
            .record(
                QueryAttempt {
                    sql: "SELECT Nam FROM Products".to_string(),
                    index: 0,
                    prior_error: None,
                },
                QueryResult::failure("no such column: Nam"),
            )
            .unwrap();
        repair
            .record(
                QueryAttempt {
                    sql: "SELECT COUNT(*) AS n FROM Products".to_string(),
                    index: 1,
                    prior_error: Some("no such column: Nam".to_string()),
                },
                QueryResult::success(
                    vec!["n".to_string()],
                    vec![Row::new(vec![("n".to_string(), Scalar::Integer(77))])],
                ),
            )
            .unwrap();

        let mut trace = PipelineTrace::new(RouteDecision::Query);
        trace.repair = Some(repair);
        let breakdown = ConfidenceBreakdown::from_trace(&trace);

        AnswerOutcome {
            answer: FinalAnswer {
                value: serde_json::json!(77),
                citations: vec![Citation::Query, Citation::Table("Products".to_string())],
                confidence: breakdown.total(),
                explanation: "Counted rows in Products.".to_string(),
                sql: Some("SELECT COUNT(*) AS n FROM Products".to_string()),
                route: RouteDecision::Query,
                insufficient_evidence: false,
                format_mismatch: false,
            },
            trace,
            breakdown,
        }
    }

    fn question() -> Question {
        Question::new("How many products are there?")
            .with_id("q1")
            .with_format_hint(FormatHint::Integer)
    }

    #[test]
    fn test_full_format_shows_attempts_and_citations() {
        colored::control::set_override(false);
        let text = ConsoleFormatter::format(&question(), &outcome());
        assert!(text.contains("Route: query"));
        assert!(text.contains("── repair 1 ──"));
        assert!(text.contains("no such column: Nam"));
        assert!(text.contains("    SELECT COUNT(*) AS n FROM Products"));
        assert!(text.contains("* Products"));
        assert!(text.contains("Confidence: 0.70"));
    }

    #[test]
    fn test_answer_only() {
        assert_eq!(ConsoleFormatter::format_answer_only(&outcome()), "77\n");
    }

    #[test]
    fn test_json_format() {
        let text = ConsoleFormatter.render(OutputFormat::Json, &question(), &outcome());
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["id"], "q1");
        assert_eq!(value["final_answer"], 77);
        assert_eq!(value["route"], "query");
        assert_eq!(value["citations"], serde_json::json!(["query", "Products"]));
        assert_eq!(value["confidence_breakdown"]["query_success"], 0.3);
    }

    #[test]
    fn test_indent() {
        assert_eq!(ConsoleFormatter::indent("a\nb", "  "), "  a\n  b");
    }
}
