use crate::cli::args::CliArgs;

pub fn validate(args: &CliArgs) -> Result<(), String> {
    if let Some(threads) = args.threads {
        if threads == 0 {
            return Err("invalid threads, expected positive integer".to_string());
        }
    }
    if let Some(timeout) = args.timeout {
        if timeout == 0 {
            return Err("invalid timeout, expected positive number of seconds".to_string());
        }
    }
    if let Some(url) = args.url.as_deref() {
        if url.trim().is_empty() {
            return Err("invalid URL, value is empty".to_string());
        }
    }
    if let Some(wordlist) = args.wordlist.as_deref() {
        if wordlist.trim().is_empty() {
            return Err("invalid wordlist, path is empty".to_string());
        }
    }
    Ok(())
}
