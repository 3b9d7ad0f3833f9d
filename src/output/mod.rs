use colored::{ColoredString, Colorize};

// display-only colour bucket. coarser than the stats classes on purpose:
// 300 shows as a notice here but counts as 3xx in the summary.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DisplayColor {
    Success,
    Notice,
    Error,
}

impl DisplayColor {
    pub fn for_status(status: u16) -> Self {
        match status {
            200 => Self::Success,
            300..=499 => Self::Notice,
            _ => Self::Error,
        }
    }

    pub fn paint(self, text: &str) -> ColoredString {
        match self {
            Self::Success => text.green(),
            Self::Notice => text.blue(),
            Self::Error => text.red(),
        }
    }
}

/// Formats a remaining-time estimate as `MM:SS`, or `HH:MM:SS` from one hour on.
/// Non-positive (or non-finite) values render as `00:00`.
pub fn format_eta(seconds: f64) -> String {
    if !seconds.is_finite() || seconds <= 0.0 {
        return "00:00".to_string();
    }
    let total = seconds as u64;
    let (m, s) = (total / 60, total % 60);
    let (h, m) = (m / 60, m % 60);
    if h > 0 {
        format!("{h:02}:{m:02}:{s:02}")
    } else {
        format!("{m:02}:{s:02}")
    }
}

pub fn format_size(size: usize) -> String {
    if size >= 1024 {
        format!("{}KB", size / 1024)
    } else {
        format!("{size}B")
    }
}

pub fn timestamp() -> String {
    chrono::Local::now().format("%H:%M:%S").to_string()
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProgressSnapshot {
    pub percent: f64,
    pub rate: f64,
    pub eta_seconds: f64,
}

impl ProgressSnapshot {
    pub fn compute(done: u64, total: u64, elapsed_secs: f64) -> Self {
        let percent = if total == 0 {
            100.0
        } else {
            done as f64 / total as f64 * 100.0
        };
        let rate = if elapsed_secs > 0.0 {
            done as f64 / elapsed_secs
        } else {
            0.0
        };
        let remaining = total.saturating_sub(done) as f64;
        let eta_seconds = if rate > 0.0 { remaining / rate } else { 0.0 };
        Self {
            percent,
            rate,
            eta_seconds,
        }
    }
}

// numeric part of the progress line; the bar itself fills whatever width is left
pub fn progress_meta(done: u64, total: u64, elapsed_secs: f64) -> String {
    let snap = ProgressSnapshot::compute(done, total, elapsed_secs);
    format!(
        "{:.1}% | {:5.1} req/s | {}/{} | ETA {}",
        snap.percent,
        snap.rate,
        done,
        total,
        format_eta(snap.eta_seconds)
    )
}

pub fn progress_template(no_color: bool) -> &'static str {
    if no_color {
        "Progress: [{wide_bar}] {msg}"
    } else {
        "Progress: [{wide_bar:.green}] {msg:.green}"
    }
}

pub fn result_line(status: u16, size: usize, path: &str) -> String {
    let line = format!(
        "[{}] {} - {:>6} - {}",
        timestamp(),
        status,
        format_size(size),
        path
    );
    DisplayColor::for_status(status).paint(&line).to_string()
}

pub fn failure_line(path: &str) -> String {
    let line = format!("[{}] ERR - {:>6} - {}", timestamp(), format_size(0), path);
    DisplayColor::Error.paint(&line).to_string()
}
