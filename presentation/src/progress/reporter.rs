//! Progress reporting for question answering

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use retail_application::ProgressNotifier;
use retail_domain::{PipelineStage, RouteDecision};
use std::sync::Mutex;

/// Reports batch progress with a progress bar
pub struct ProgressReporter {
    batch_bar: Mutex<Option<ProgressBar>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            batch_bar: Mutex::new(None),
        }
    }

    fn batch_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{spinner:.green} {prefix:.bold.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-")
    }

    fn confidence_mark(confidence: f64) -> String {
        let text = format!("{confidence:.2}");
        if confidence >= 0.7 {
            format!("{} {}", "v".green(), text)
        } else if confidence >= 0.4 {
            format!("{} {}", "~".yellow(), text)
        } else {
            format!("{} {}", "x".red(), text)
        }
    }

    fn with_bar(&self, f: impl FnOnce(&ProgressBar)) {
        if let Ok(guard) = self.batch_bar.lock()
            && let Some(pb) = guard.as_ref()
        {
            f(pb);
        }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressNotifier for ProgressReporter {
    fn on_batch_start(&self, total: usize) {
        let pb = ProgressBar::new(total as u64);
        pb.set_style(Self::batch_style());
        pb.set_prefix("Answering");
        pb.set_message("Starting...");

        if let Ok(mut guard) = self.batch_bar.lock() {
            *guard = Some(pb);
        }
    }

    fn on_question_complete(&self, question_id: &str, confidence: f64) {
        self.with_bar(|pb| {
            pb.set_message(format!("{} {}", question_id, Self::confidence_mark(confidence)));
            pb.inc(1);
        });
    }

    fn on_batch_complete(&self) {
        if let Ok(mut guard) = self.batch_bar.lock()
            && let Some(pb) = guard.take()
        {
            pb.finish_with_message(format!("{}", "Batch complete!".green()));
        }
    }
}

/// Simple text-based progress for a single question (no fancy UI)
///
/// Writes to stderr so answer output on stdout stays clean.
pub struct SimpleProgress;

impl ProgressNotifier for SimpleProgress {
    fn on_stage_start(&self, _question_id: &str, stage: PipelineStage) {
        eprintln!("{} {}", "->".cyan(), stage.as_str().bold());
    }

    fn on_route(&self, _question_id: &str, route: RouteDecision, fell_back: bool) {
        if fell_back {
            eprintln!("  {} {} (classifier fallback)", "~".yellow(), route);
        } else {
            eprintln!("  {} {}", "v".green(), route);
        }
    }

    fn on_query_attempt(&self, _question_id: &str, attempt: u8, success: bool) {
        let label = if attempt == 0 {
            "initial query".to_string()
        } else {
            format!("repair {attempt}")
        };
        if success {
            eprintln!("  {} {}", "v".green(), label);
        } else {
            eprintln!("  {} {} (failed)", "x".red(), label);
        }
    }

    fn on_question_complete(&self, _question_id: &str, confidence: f64) {
        eprintln!(
            "  {} confidence {}",
            "=".cyan(),
            ProgressReporter::confidence_mark(confidence)
        );
        eprintln!();
    }
}
