use indicatif::{ProgressBar, ProgressStyle};
use media_trends_core::MovieOutcome;
use std::io::IsTerminal;

/// Progress display for a recompute run; falls back to structured logging
/// when not attached to a terminal.
pub struct AnalyzeUI {
    bar: ProgressBar,
    interactive: bool,
}

impl AnalyzeUI {
    pub fn new(enabled: bool) -> Self {
        let interactive = enabled && is_interactive();
        let bar = if interactive {
            ProgressBar::new(0)
        } else {
            ProgressBar::hidden()
        };
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▉▊▋▌▍▎▏  "),
        );
        bar.set_message("Loading movies...");

        if !interactive {
            tracing::info!(
                operation = "ui_init",
                mode = "non_interactive",
                "Progress bar disabled, using structured logging"
            );
        }

        Self { bar, interactive }
    }

    pub fn start(&self, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.set_message("Analyzing");
    }

    pub fn record(&self, outcome: &MovieOutcome) {
        self.bar.inc(1);
        if self.interactive {
            if let MovieOutcome::Analyzed { movie_id, status } = outcome {
                self.bar.set_message(format!("movie {} → {}", movie_id, status.label()));
            }
        } else {
            let total = self.bar.length().unwrap_or(0);
            tracing::info!(
                operation = "progress",
                current = self.bar.position(),
                total = total,
                movie_id = outcome.movie_id(),
                "Recompute progress update"
            );
        }
    }

    pub fn finish(&self) {
        if self.interactive {
            self.bar.finish_and_clear();
        }
    }
}

pub fn is_interactive() -> bool {
    std::io::stdout().is_terminal() && std::io::stderr().is_terminal()
}
