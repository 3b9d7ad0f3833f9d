use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::fs::File;
use tokio::io::AsyncBufReadExt;
use tokio::io::BufReader;
use tokio::sync::mpsc;
use tokio::task;
use tokio::time::Instant;

use crate::aggregator::{self, Reporter, RunStats};
use crate::cancel::CancellationFlag;
use crate::dispatcher::{self, DispatchConfig};
use crate::executor::{self, ProbeResult, Target};
use crate::utils;

pub const DEFAULT_THREADS: usize = 50;
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 5;

const RESULT_CHANNEL_CAPACITY: usize = 1024;

#[derive(Clone, Debug)]
pub enum WordlistSource {
    FilePath(String),
    Inline(Vec<String>),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputMode {
    /// Live progress bar plus result lines.
    #[default]
    Interactive,
    /// Result lines and summary only.
    Plain,
    /// Nothing is written to the terminal.
    Silent,
}

#[derive(Clone, Debug)]
pub struct Options {
    pub url: String,
    pub wordlist: WordlistSource,
    pub threads: usize,
    pub timeout_seconds: u64,
    pub display: OutputMode,
    pub no_color: bool,
    pub show_failures: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            url: String::new(),
            wordlist: WordlistSource::Inline(Vec::new()),
            threads: DEFAULT_THREADS,
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            display: OutputMode::Interactive,
            no_color: false,
            show_failures: false,
        }
    }
}

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("invalid URL: {url}")]
    InvalidUrl { url: String },

    #[error("invalid threads {value}, expected positive integer")]
    InvalidThreads { value: usize },

    #[error("invalid timeout {value}, expected positive number of seconds")]
    InvalidTimeout { value: u64 },

    #[error("failed to open wordlist: {path}: {source}")]
    WordlistOpen {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read wordlist: {path}: {source}")]
    WordlistRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to build HTTP client: {source}")]
    HttpClientBuild {
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to build progress bar style: {source}")]
    ProgressStyle {
        #[source]
        source: indicatif::style::TemplateError,
    },

    #[error("task join failed: {source}")]
    TaskJoin {
        #[source]
        source: tokio::task::JoinError,
    },
}

#[derive(Clone, Debug)]
pub struct ScanResult {
    pub stats: RunStats,
    pub total: usize,
    pub submitted: usize,
    pub consumed: usize,
    pub cancelled: bool,
    pub elapsed: Duration,
}

#[derive(Clone, Debug)]
pub struct Runner {
    options: Options,
    target: Arc<Target>,
    cancel: CancellationFlag,
}

impl Runner {
    pub fn new(options: Options) -> Result<Self, ScanError> {
        if options.threads == 0 {
            return Err(ScanError::InvalidThreads {
                value: options.threads,
            });
        }
        if options.timeout_seconds == 0 {
            return Err(ScanError::InvalidTimeout {
                value: options.timeout_seconds,
            });
        }
        let target = Arc::new(Target::parse(&options.url)?);
        Ok(Self {
            options,
            target,
            cancel: CancellationFlag::new(),
        })
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    // hand this to a signal listener to stop the run cooperatively
    pub fn cancellation(&self) -> CancellationFlag {
        self.cancel.clone()
    }

    pub async fn run(&self) -> Result<ScanResult, ScanError> {
        let words = load_wordlist(&self.options.wordlist).await?;
        self.run_words(words).await
    }

    pub async fn run_words(&self, words: Vec<String>) -> Result<ScanResult, ScanError> {
        let started_at = Instant::now();
        let total = words.len();
        let timeout = Duration::from_secs(self.options.timeout_seconds);
        let client = executor::build_client(timeout)?;

        let reporter = match self.options.display {
            OutputMode::Interactive => {
                Reporter::interactive(total, self.options.no_color, self.options.show_failures)?
            }
            OutputMode::Plain => Reporter::plain(total, self.options.show_failures),
            OutputMode::Silent => Reporter::silent(total),
        };

        let (result_tx, result_rx) = mpsc::channel::<ProbeResult>(RESULT_CHANNEL_CAPACITY);
        let collect_handle = task::spawn(aggregator::aggregate(
            result_rx,
            total,
            self.cancel.clone(),
            reporter,
        ));

        let dispatched = dispatcher::dispatch(
            client,
            self.target.clone(),
            words,
            DispatchConfig {
                threads: self.options.threads,
                timeout,
            },
            result_tx,
            self.cancel.clone(),
        )
        .await;

        let collected = collect_handle
            .await
            .map_err(|e| ScanError::TaskJoin { source: e })?;

        tracing::debug!(
            total,
            submitted = dispatched.submitted,
            consumed = collected.consumed,
            failures = collected.stats.failures,
            "scan finished"
        );

        Ok(ScanResult {
            stats: collected.stats,
            total,
            submitted: dispatched.submitted,
            consumed: collected.consumed,
            cancelled: self.cancel.is_triggered(),
            elapsed: started_at.elapsed(),
        })
    }
}

pub async fn load_wordlist(source: &WordlistSource) -> Result<Vec<String>, ScanError> {
    match source {
        WordlistSource::Inline(words) => Ok(utils::clean_wordlist(words.iter())),
        WordlistSource::FilePath(path) => {
            let path = crate::config::expand_tilde_string(path);
            let handle = File::open(&path)
                .await
                .map_err(|e| ScanError::WordlistOpen {
                    path: path.clone(),
                    source: e,
                })?;
            let mut lines = BufReader::new(handle).split(b'\n');
            let mut raw: Vec<String> = Vec::new();
            loop {
                match lines.next_segment().await {
                    Ok(Some(line)) => raw.push(String::from_utf8_lossy(&line).into_owned()),
                    Ok(None) => break,
                    Err(e) => {
                        return Err(ScanError::WordlistRead { path, source: e });
                    }
                }
            }
            Ok(utils::clean_wordlist(raw.iter()))
        }
    }
}
