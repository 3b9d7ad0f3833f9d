use clap::{ArgAction, Parser};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "dirfinder",
    version,
    about = "fast threaded web directory fuzzer",
    long_about = "Dirfinder probes a target for existing paths from a wordlist, one GET per entry, and reports hits live.\n\nExamples:\n  dirfinder http://target.tld -w wordlists/common.txt\n  dirfinder https://target.tld -w common.txt -t 100 --timeout 10\n  dirfinder target.tld --config ~/.dirfinder/config.yml\n\nTip: press Ctrl-C to stop early; in-flight requests finish and the summary is still printed."
)]
pub struct CliArgs {
    #[arg(
        value_name = "URL",
        help_heading = "Input",
        help = "Target base URL (scheme defaults to http)."
    )]
    pub url: Option<String>,

    #[arg(
        short = 'w',
        long = "wordlist",
        value_name = "FILE",
        help_heading = "Input",
        help = "Wordlist file path (one path segment per line)."
    )]
    pub wordlist: Option<String>,

    #[arg(
        short = 'C',
        long = "config",
        value_name = "FILE",
        help_heading = "Input",
        help = "Path to a YAML config file (defaults to ~/.dirfinder/config.yml when present)."
    )]
    pub config: Option<String>,

    #[arg(
        short = 't',
        long = "threads",
        value_name = "N",
        help_heading = "Performance",
        help = "Number of concurrent requests [default: 50]."
    )]
    pub threads: Option<usize>,

    #[arg(
        long = "timeout",
        value_name = "SECONDS",
        help_heading = "Performance",
        help = "Per-request timeout in seconds [default: 5]."
    )]
    pub timeout: Option<u64>,

    #[arg(
        short = 'n',
        long = "no-color",
        help_heading = "Output",
        help = "Disable colored output."
    )]
    pub no_color: bool,

    #[arg(
        short = 'q',
        long = "quiet",
        help_heading = "Output",
        help = "Hide the banner and the live progress bar."
    )]
    pub quiet: bool,

    #[arg(
        short = 'v',
        long = "verbose",
        action = ArgAction::Count,
        help_heading = "Output",
        help = "Increase verbosity (-v shows failed requests, -vv adds debug logs)."
    )]
    pub verbose: u8,
}
