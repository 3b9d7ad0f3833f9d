use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::runner::ScanError;

pub const USER_AGENT: &str = "DeathNote-DirFuzz";

// scheme and authority of the scanned host. any path on the base URL is dropped,
// every probe goes to the root of the authority.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Target {
    pub scheme: String,
    pub authority: String,
}

impl Target {
    pub fn parse(base_url: &str) -> Result<Self, ScanError> {
        let trimmed = base_url.trim();
        let candidate = if trimmed.contains("://") {
            trimmed.to_string()
        } else {
            format!("http://{trimmed}")
        };
        let invalid = || ScanError::InvalidUrl {
            url: base_url.to_string(),
        };
        let url = reqwest::Url::parse(&candidate).map_err(|_| invalid())?;
        let scheme = url.scheme().to_string();
        if scheme != "http" && scheme != "https" {
            return Err(invalid());
        }
        let host = url.host_str().filter(|h| !h.is_empty()).ok_or_else(invalid)?;
        let authority = match url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };
        Ok(Self { scheme, authority })
    }

    pub fn origin(&self) -> String {
        format!("{}://{}", self.scheme, self.authority)
    }

    pub fn url_for(&self, normalized_path: &str) -> String {
        format!("{}{}", self.origin(), normalized_path)
    }
}

// one unit of work, consumed by exactly one `execute` call
#[derive(Clone, Debug)]
pub struct Task {
    pub target: Arc<Target>,
    pub path_segment: String,
    pub timeout: Duration,
}

/// Outcome of probing one task. `status == None` marks a transport failure
/// (timeout, refused connection, DNS, TLS or protocol error); its size is always 0.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProbeResult {
    pub status: Option<u16>,
    pub size: usize,
    pub path: String,
}

impl ProbeResult {
    pub fn failed(path: String) -> Self {
        Self {
            status: None,
            size: 0,
            path,
        }
    }

    pub fn is_failure(&self) -> bool {
        self.status.is_none()
    }
}

/// Ensures exactly one leading slash. Idempotent: `admin`, `/admin` and
/// `//admin` all become `/admin`.
pub fn normalize_path(segment: &str) -> String {
    format!("/{}", segment.trim_start_matches('/'))
}

// shared by every worker of a run. idle pooling is off so each probe
// opens and closes its own connection.
pub fn build_client(timeout: Duration) -> Result<reqwest::Client, ScanError> {
    let mut headers = reqwest::header::HeaderMap::new();
    headers.insert(
        reqwest::header::USER_AGENT,
        reqwest::header::HeaderValue::from_static(USER_AGENT),
    );

    //no certs
    reqwest::Client::builder()
        .default_headers(headers)
        .redirect(reqwest::redirect::Policy::none())
        .pool_max_idle_per_host(0)
        .connect_timeout(timeout)
        .timeout(timeout)
        .danger_accept_invalid_hostnames(true)
        .danger_accept_invalid_certs(true)
        .build()
        .map_err(|e| ScanError::HttpClientBuild { source: e })
}

// performs a single GET and never fails: every error collapses into a
// result without a status
pub async fn execute(client: &reqwest::Client, task: &Task) -> ProbeResult {
    let path = normalize_path(&task.path_segment);
    let url = task.target.url_for(&path);

    let resp = match client.get(&url).timeout(task.timeout).send().await {
        Ok(resp) => resp,
        Err(e) => {
            tracing::debug!(%url, error = %e, "request failed");
            return ProbeResult::failed(path);
        }
    };
    let status = resp.status().as_u16();
    let size = match resp.bytes().await {
        Ok(body) => body.len(),
        Err(e) => {
            tracing::debug!(%url, error = %e, "failed to read response body");
            return ProbeResult::failed(path);
        }
    };

    ProbeResult {
        status: Some(status),
        size,
        path,
    }
}

// runs one task and hands its result to the aggregator. a closed channel only
// happens when the aggregator is gone, so the result is dropped quietly.
pub async fn run_task(client: reqwest::Client, task: Task, tx: mpsc::Sender<ProbeResult>) {
    let result = execute(&client, &task).await;
    if tx.send(result).await.is_err() {
        tracing::debug!(path = %task.path_segment, "result channel closed");
    }
}
