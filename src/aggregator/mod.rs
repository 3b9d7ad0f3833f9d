use std::time::Duration;

use colored::Colorize;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::cancel::CancellationFlag;
use crate::executor::ProbeResult;
use crate::output;
use crate::runner::ScanError;

pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StatusClass {
    Success,
    Redirect,
    ClientError,
    ServerError,
}

impl StatusClass {
    pub const ALL: [StatusClass; 4] = [
        StatusClass::Success,
        StatusClass::Redirect,
        StatusClass::ClientError,
        StatusClass::ServerError,
    ];

    // anything outside 200..500, 1xx included, lands in the 5xx bucket
    pub fn of(status: u16) -> Self {
        match status {
            200..=299 => Self::Success,
            300..=399 => Self::Redirect,
            400..=499 => Self::ClientError,
            _ => Self::ServerError,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Success => "2xx",
            Self::Redirect => "3xx",
            Self::ClientError => "4xx",
            Self::ServerError => "5xx",
        }
    }

    fn index(self) -> usize {
        match self {
            Self::Success => 0,
            Self::Redirect => 1,
            Self::ClientError => 2,
            Self::ServerError => 3,
        }
    }
}

/// Running statistics for one scan. Owned and mutated by the aggregator only.
///
/// Transport failures are tallied in `failures` and never reach the
/// per-class counts.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunStats {
    counts: [usize; 4],
    pub success_paths: Vec<String>,
    pub failures: usize,
}

impl RunStats {
    pub fn record(&mut self, result: &ProbeResult) {
        let status = match result.status {
            Some(status) => status,
            None => {
                self.failures += 1;
                return;
            }
        };
        let class = StatusClass::of(status);
        self.counts[class.index()] += 1;
        if class == StatusClass::Success {
            self.success_paths.push(result.path.clone());
        }
    }

    pub fn count(&self, class: StatusClass) -> usize {
        self.counts[class.index()]
    }

    pub fn classified(&self) -> usize {
        self.counts.iter().sum()
    }

    pub fn summary_lines(&self) -> Vec<String> {
        let mut out = vec![String::new(), "Scan summary:".to_string()];
        for class in StatusClass::ALL {
            out.push(format!("  {}: {}", class.label(), self.count(class)));
        }
        if !self.success_paths.is_empty() {
            out.push(format!("\n{}", "[+] Paths with 200 OK:".green()));
            for p in &self.success_paths {
                out.push(format!("    {p}").as_str().green().to_string());
            }
        }
        out
    }
}

// owns every byte written to the terminal while the scan runs. result lines go
// through the progress bar so the bar is erased and redrawn around them.
pub struct Reporter {
    pb: ProgressBar,
    started: Instant,
    total: u64,
    show_failures: bool,
    print_lines: bool,
}

impl Reporter {
    pub fn interactive(total: usize, no_color: bool, show_failures: bool) -> Result<Self, ScanError> {
        let pb = ProgressBar::with_draw_target(Some(total as u64), ProgressDrawTarget::stdout());
        pb.set_style(
            ProgressStyle::with_template(output::progress_template(no_color))
                .map_err(|e| ScanError::ProgressStyle { source: e })?
                .progress_chars("# "),
        );
        Ok(Self::with_bar(pb, total, show_failures, true))
    }

    // result lines and summary without a live bar
    pub fn plain(total: usize, show_failures: bool) -> Self {
        Self::with_bar(ProgressBar::hidden(), total, show_failures, true)
    }

    pub fn silent(total: usize) -> Self {
        Self::with_bar(ProgressBar::hidden(), total, false, false)
    }

    fn with_bar(pb: ProgressBar, total: usize, show_failures: bool, print_lines: bool) -> Self {
        Self {
            pb,
            started: Instant::now(),
            total: total as u64,
            show_failures,
            print_lines,
        }
    }

    fn emit(&self, line: String) {
        if !self.print_lines {
            return;
        }
        if self.pb.is_hidden() {
            println!("{line}");
        } else {
            self.pb.println(line);
        }
    }

    pub fn refresh(&self, done: usize) {
        let elapsed = self.started.elapsed().as_secs_f64();
        self.pb.set_position(done as u64);
        self.pb
            .set_message(output::progress_meta(done as u64, self.total, elapsed));
    }

    pub fn record(&self, result: &ProbeResult, done: usize) {
        match result.status {
            Some(status) => self.emit(output::result_line(status, result.size, &result.path)),
            None if self.show_failures => self.emit(output::failure_line(&result.path)),
            None => {}
        }
        self.refresh(done);
    }

    pub fn finish(&self, stats: &RunStats, cancelled: bool) {
        self.pb.finish();
        if !self.print_lines {
            return;
        }
        println!();
        if cancelled {
            println!("{}", "[!] Scan interrupted".red());
        }
        for line in stats.summary_lines() {
            println!("{line}");
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct AggregateOutcome {
    pub stats: RunStats,
    pub consumed: usize,
}

// single consumer of the result channel. stops once `total` results were
// consumed, or once the channel is drained and closed, which is how a
// cancelled run ends: every submitted task has reported and the dispatcher
// has released its sender. the poll timeout keeps rate and ETA moving while
// no results arrive.
pub async fn aggregate(
    mut rx: mpsc::Receiver<ProbeResult>,
    total: usize,
    cancel: CancellationFlag,
    reporter: Reporter,
) -> AggregateOutcome {
    let mut outcome = AggregateOutcome::default();
    let mut stop_logged = false;
    reporter.refresh(0);

    while outcome.consumed < total {
        match tokio::time::timeout(POLL_INTERVAL, rx.recv()).await {
            Ok(Some(result)) => {
                outcome.consumed += 1;
                outcome.stats.record(&result);
                reporter.record(&result, outcome.consumed);
            }
            Ok(None) => break,
            Err(_) => {
                if cancel.is_triggered() && !stop_logged {
                    tracing::info!(
                        consumed = outcome.consumed,
                        "draining in-flight results before stopping"
                    );
                    stop_logged = true;
                }
                reporter.refresh(outcome.consumed);
            }
        }
    }

    reporter.finish(&outcome.stats, cancel.is_triggered());
    outcome
}
