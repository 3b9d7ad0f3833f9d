use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio_native_tls::native_tls;

use crate::aggregator::StatusClass;
use crate::runner::{Options, OutputMode, Runner, WordlistSource};

#[derive(Clone, Debug)]
pub(crate) enum StubReply {
    Status(u16, &'static str),
    Delayed(Duration, u16),
    Hangup,
}

type Routes = Arc<Vec<(&'static str, StubReply)>>;

// request heads (request line plus headers) in arrival order
pub(crate) type SeenRequests = Arc<Mutex<Vec<String>>>;

// minimal HTTP/1.1 responder. routes match on the exact request path, "*"
// matches anything, unmatched paths get the connection dropped.
pub(crate) async fn spawn_stub_server(routes: Vec<(&'static str, StubReply)>) -> String {
    spawn_recording_server(routes).await.0
}

pub(crate) async fn spawn_recording_server(
    routes: Vec<(&'static str, StubReply)>,
) -> (String, SeenRequests) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let routes: Routes = Arc::new(routes);
    let seen: SeenRequests = Arc::new(Mutex::new(Vec::new()));

    let log = seen.clone();
    tokio::spawn(async move {
        loop {
            let (stream, _) = match listener.accept().await {
                Ok(conn) => conn,
                Err(_) => return,
            };
            let routes = routes.clone();
            let log = log.clone();
            tokio::spawn(async move {
                serve_one(stream, &routes, &log).await;
            });
        }
    });

    (format!("http://{addr}"), seen)
}

// same responder behind TLS with a freshly generated self-signed certificate
pub(crate) async fn spawn_tls_stub_server(routes: Vec<(&'static str, StubReply)>) -> String {
    let cert = rcgen::generate_simple_self_signed(vec!["localhost".to_string()]).unwrap();
    let cert_pem = cert.serialize_pem().unwrap();
    let key_pem = cert.serialize_private_key_pem();
    let identity =
        native_tls::Identity::from_pkcs8(cert_pem.as_bytes(), key_pem.as_bytes()).unwrap();
    let acceptor = tokio_native_tls::TlsAcceptor::from(
        native_tls::TlsAcceptor::builder(identity).build().unwrap(),
    );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let routes: Routes = Arc::new(routes);
    let seen: SeenRequests = Arc::new(Mutex::new(Vec::new()));

    tokio::spawn(async move {
        loop {
            let (stream, _) = match listener.accept().await {
                Ok(conn) => conn,
                Err(_) => return,
            };
            let acceptor = acceptor.clone();
            let routes = routes.clone();
            let seen = seen.clone();
            tokio::spawn(async move {
                if let Ok(stream) = acceptor.accept(stream).await {
                    serve_one(stream, &routes, &seen).await;
                }
            });
        }
    });

    format!("https://{addr}")
}

async fn serve_one<S>(mut stream: S, routes: &[(&'static str, StubReply)], seen: &SeenRequests)
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") && buf.len() < 16 * 1024 {
        match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }
    let head = String::from_utf8_lossy(&buf).into_owned();
    let path = head
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or("/")
        .to_string();
    seen.lock().unwrap().push(head);

    let reply = routes
        .iter()
        .find(|(route, _)| *route == path || *route == "*")
        .map(|(_, reply)| reply.clone())
        .unwrap_or(StubReply::Hangup);

    let (status, body) = match reply {
        StubReply::Status(status, body) => (status, body),
        StubReply::Delayed(delay, status) => {
            tokio::time::sleep(delay).await;
            (status, "")
        }
        StubReply::Hangup => return,
    };
    let response = format!(
        "HTTP/1.1 {status} Stub\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    let _ = stream.write_all(response.as_bytes()).await;
    let _ = stream.shutdown().await;
}

// header value from a recorded request head, name matched case-insensitively
pub(crate) fn header_value(head: &str, name: &str) -> Option<String> {
    head.lines().skip(1).find_map(|line| {
        let (key, value) = line.split_once(':')?;
        key.trim()
            .eq_ignore_ascii_case(name)
            .then(|| value.trim().to_string())
    })
}

// an address nothing listens on, so connecting is refused
pub(crate) async fn unused_local_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

fn silent_options(url: String, words: &[&str], threads: usize) -> Options {
    Options {
        url,
        wordlist: WordlistSource::Inline(words.iter().map(|w| w.to_string()).collect()),
        threads,
        timeout_seconds: 5,
        display: OutputMode::Silent,
        ..Default::default()
    }
}

#[tokio::test]
async fn end_to_end_scan_classifies_results() {
    let base = spawn_stub_server(vec![
        ("/admin", StubReply::Status(200, "<html>admin</html>")),
        ("/login", StubReply::Status(404, "not found")),
    ])
    .await;

    let runner =
        Runner::new(silent_options(base, &["admin", "login", "nonexistent"], 50)).unwrap();
    let result = runner.run().await.unwrap();

    assert_eq!(result.consumed, 3);
    assert_eq!(result.submitted, 3);
    assert_eq!(result.stats.count(StatusClass::Success), 1);
    assert_eq!(result.stats.count(StatusClass::Redirect), 0);
    assert_eq!(result.stats.count(StatusClass::ClientError), 1);
    assert_eq!(result.stats.count(StatusClass::ServerError), 0);
    assert_eq!(result.stats.failures, 1);
    assert_eq!(result.stats.success_paths, vec!["/admin"]);
    assert!(!result.cancelled);
}

#[tokio::test]
async fn every_entry_is_consumed_for_any_width() {
    let base = spawn_stub_server(vec![
        ("/a", StubReply::Status(200, "")),
        ("/b", StubReply::Status(301, "")),
        ("/c", StubReply::Status(500, "boom")),
        ("/d", StubReply::Status(403, "")),
    ])
    .await;
    let words = ["a", "/b", "//c", "d", "gone", "a"];

    for threads in [1usize, 2, 8] {
        let runner = Runner::new(silent_options(base.clone(), &words, threads)).unwrap();
        let result = runner.run().await.unwrap();
        assert_eq!(result.consumed, words.len());
        assert!(result.stats.classified() <= words.len());
        assert_eq!(result.stats.classified() + result.stats.failures, words.len());
        assert_eq!(result.stats.count(StatusClass::Redirect), 1);
        assert_eq!(result.stats.count(StatusClass::ServerError), 1);
        assert_eq!(result.stats.success_paths, vec!["/a", "/a"]);
    }
}

#[tokio::test]
async fn redirects_are_reported_not_followed() {
    let base = spawn_stub_server(vec![("/old", StubReply::Status(302, ""))]).await;
    let runner = Runner::new(silent_options(base, &["old"], 1)).unwrap();
    let result = runner.run().await.unwrap();
    assert_eq!(result.stats.count(StatusClass::Redirect), 1);
    assert!(result.stats.success_paths.is_empty());
}

#[tokio::test]
async fn unreachable_host_only_produces_failures() {
    let addr = unused_local_addr().await;
    let runner =
        Runner::new(silent_options(format!("http://{addr}"), &["a", "b", "c"], 2)).unwrap();
    let result = runner.run().await.unwrap();
    assert_eq!(result.consumed, 3);
    assert_eq!(result.stats.classified(), 0);
    assert_eq!(result.stats.failures, 3);
}

#[tokio::test]
async fn interrupted_scan_drains_submitted_work() {
    let base = spawn_stub_server(vec![(
        "*",
        StubReply::Delayed(Duration::from_millis(300), 200),
    )])
    .await;
    let words: Vec<String> = (0..40).map(|i| format!("p{i}")).collect();
    let word_refs: Vec<&str> = words.iter().map(|w| w.as_str()).collect();
    let runner = Runner::new(silent_options(base, &word_refs, 4)).unwrap();

    let cancel = runner.cancellation();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        cancel.trigger();
    });

    let result = runner.run().await.unwrap();
    assert!(result.cancelled);
    assert!(result.submitted >= 4 && result.submitted < words.len());
    assert_eq!(result.consumed, result.submitted);
    assert_eq!(result.stats.count(StatusClass::Success), result.consumed);
}
