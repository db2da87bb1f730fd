use std::time::Duration;

/// Separator line framing the banner logged at the start of each cycle.
const BANNER_RULE: &str = "------------------------------";

/// Counters of one polling cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CollectionSummary {
    /// Number of enabled repositories processed.
    pub repo_count: usize,
    /// Number of commits stored for the first time.
    pub commit_count: usize,
    /// Wall clock time the cycle took.
    pub elapsed: Duration,
}

impl CollectionSummary {
    /// Log the end-of-cycle summary lines.
    pub fn log(&self) {
        tracing::info!("{}", format_line("Repo Count", self.elapsed, Some(self.repo_count)));
        tracing::info!("{}", format_line("New Commits", self.elapsed, Some(self.commit_count)));
        tracing::info!("{}", format_line("Finished", self.elapsed, None));
    }
}

/// Log `text` framed by separator lines.
pub fn log_banner(text: &str) {
    tracing::info!("{BANNER_RULE}");
    tracing::info!("{text}");
    tracing::info!("{BANNER_RULE}");
}

/// Format a summary line: `text`, then `count` right aligned to column 20 and the elapsed
/// seconds right aligned in the next 10 columns. Without a count the elapsed seconds are right
/// aligned to column 30.
#[must_use]
pub fn format_line(text: &str, elapsed: Duration, count: Option<usize>) -> String {
    let elapsed = format!("{}s", elapsed.as_secs());
    let width = text.chars().count();
    match count {
        Some(count) => {
            let count_width = 20_usize.saturating_sub(width);
            format!("{text}{count:>count_width$}{elapsed:>10}")
        }
        None => {
            let elapsed_width = 30_usize.saturating_sub(width);
            format!("{text}{elapsed:>elapsed_width$}")
        }
    }
}
