use clap::{error::ErrorKind, CommandFactory, Parser};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use crate::cancel;
use crate::cli::args::CliArgs;
use crate::cli::validation;
use crate::config::{self, ConfigFile};
use crate::runner::{self, Options, OutputMode, Runner, WordlistSource};

fn print_banner() {
    const BANNER: &str = r#"
       ___           ____          __
  ____/ (_)_________/ __/(_)___  / /___/ /__  _____
 / __  / / ___/ ___/ /_ / / __ \/ __/ __  / _ \/ ___/
/ /_/ / / /  (__  ) __// / / / / /_/ /_/ /  __/ /
\__,_/_/_/  /____/_/  /_/_/ /_/\__/\__,_/\___/_/
        fast - threaded - web directory fuzzer
    "#;
    print!("{}", BANNER.green());
    println!();
}

fn format_kv_line(label: &str, value: &str) {
    println!(":: {:<10}: {}", label, value);
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct RunConfig {
    url: String,
    wordlist_path: String,
    threads: usize,
    timeout: u64,
    no_color: bool,
    quiet: bool,
    verbose: u8,
}

fn build_run_config(args: CliArgs, cfg: ConfigFile) -> Result<RunConfig, String> {
    validation::validate(&args)?;

    let url = args
        .url
        .or(cfg.url)
        .map(|u| crate::utils::trim_url(&u))
        .filter(|u| !u.is_empty())
        .ok_or_else(|| "target URL is required".to_string())?;
    let wordlist_path = args
        .wordlist
        .or(cfg.wordlist)
        .map(|p| config::expand_tilde_string(p.trim()))
        .filter(|p| !p.is_empty())
        .ok_or_else(|| "wordlist is required (-w/--wordlist)".to_string())?;

    let threads = args
        .threads
        .or(cfg.threads)
        .unwrap_or(runner::DEFAULT_THREADS);
    if threads == 0 {
        return Err("invalid threads, expected positive integer".to_string());
    }
    let timeout = args
        .timeout
        .or(cfg.timeout)
        .unwrap_or(runner::DEFAULT_TIMEOUT_SECONDS);
    if timeout == 0 {
        return Err("invalid timeout, expected positive number of seconds".to_string());
    }

    let no_color = args.no_color || cfg.no_color.unwrap_or(false);
    let quiet = args.quiet || cfg.quiet.unwrap_or(false);
    let verbose = args.verbose.max(cfg.verbose.unwrap_or(0));

    Ok(RunConfig {
        url,
        wordlist_path,
        threads,
        timeout,
        no_color,
        quiet,
        verbose,
    })
}

fn log_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}

// diagnostics go to stderr so they never land inside the stdout progress line
fn init_tracing(verbose: u8, no_color: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("dirfinder={}", log_filter(verbose))));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(!no_color)
        .with_writer(std::io::stderr)
        .try_init();
}

async fn run_async(run: RunConfig) -> Result<(), String> {
    if run.no_color {
        colored::control::set_override(false);
    }
    if !run.quiet {
        print_banner();
    }

    let options = Options {
        url: run.url.clone(),
        wordlist: WordlistSource::FilePath(run.wordlist_path.clone()),
        threads: run.threads,
        timeout_seconds: run.timeout,
        display: if run.quiet {
            OutputMode::Plain
        } else {
            OutputMode::Interactive
        },
        no_color: run.no_color,
        show_failures: run.verbose > 0,
    };
    let runner = Runner::new(options).map_err(|e| e.to_string())?;

    let words = runner::load_wordlist(&runner.options().wordlist)
        .await
        .map_err(|e| e.to_string())?;

    format_kv_line("Target", &runner.target().origin());
    format_kv_line(
        "Wordlist",
        &format!("{} entries from {}", words.len(), run.wordlist_path),
    );
    format_kv_line(
        "HTTP",
        &format!("threads={} timeout={}s", run.threads, run.timeout),
    );
    println!();

    let listener = cancel::install_interrupt_handler(runner.cancellation());
    let result = runner.run_words(words).await.map_err(|e| e.to_string())?;
    listener.abort();

    println!();
    println!(
        ":: Completed :: {}/{} requests in {}s ::",
        result.consumed,
        result.total,
        result.elapsed.as_secs()
    );

    Ok(())
}

pub fn run_cli() -> Result<(), String> {
    let args = match CliArgs::try_parse() {
        Ok(args) => args,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp => {
                print!("{}", CliArgs::command().render_long_help());
                return Ok(());
            }
            ErrorKind::DisplayVersion => {
                let cmd = CliArgs::command();
                print!("{}", cmd.render_version());
                return Ok(());
            }
            _ => return Err(e.to_string()),
        },
    };

    let cfg = match args.config.as_ref() {
        Some(path) => config::load_config(&config::expand_tilde(path), false)?,
        None => match config::default_config_path() {
            Some(path) => config::load_config(&path, true)?,
            None => ConfigFile::default(),
        },
    };

    let run = build_run_config(args, cfg)?;
    init_tracing(run.verbose, run.no_color);

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("failed to build runtime: {e}"))?;

    rt.block_on(run_async(run))?;
    Ok(())
}
