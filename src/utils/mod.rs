// trims every entry and drops the ones left empty, keeping wordlist order
pub fn clean_wordlist<'a, I>(lines: I) -> Vec<String>
where
    I: Iterator<Item = &'a String>,
{
    lines
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .map(|line| line.to_string())
        .collect()
}

pub fn trim_url(url: &str) -> String {
    url.trim().to_string()
}
