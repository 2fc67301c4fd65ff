// tests/http_fetch.rs
//
// HttpFetcher against a one-shot local HTTP responder (plain TCP, std-only).
//
use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::mpsc;
use std::thread;

use chrono::Local;
use seat_watch::config::options::AppOptions;
use seat_watch::fetch::{FetchError, HttpFetcher, SnapshotFetcher};
use seat_watch::session::{AccessContext, Strategy};

/// Serve exactly one request with `status` + `body`; hand back the raw
/// request text.
fn serve_once(status: &str, extra_headers: &str, body: &str) -> (String, mpsc::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}/api.php/v3areas/95", listener.local_addr().unwrap());
    let resp = format!(
        "HTTP/1.1 {status}\r\nContent-Type: application/json\r\n{extra_headers}Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = stream.read(&mut chunk).unwrap();
            if n == 0 { break; }
            buf.extend_from_slice(&chunk[..n]);
        }
        stream.write_all(resp.as_bytes()).unwrap();
        stream.flush().unwrap();
        let _ = tx.send(String::from_utf8_lossy(&buf).into_owned());
    });

    (url, rx)
}

fn ctx(strategy: Strategy, cookies: Vec<(String, String)>) -> AccessContext {
    AccessContext {
        strategy,
        headers: vec![
            ("User-Agent".into(), "Mozilla/5.0".into()),
            ("X-Requested-With".into(), "XMLHttpRequest".into()),
        ],
        cookies,
    }
}

fn fetch(status: &str, extra: &str, body: &str, c: AccessContext) -> (Result<seat_watch::specs::Snapshot, FetchError>, String) {
    let (url, rx) = serve_once(status, extra, body);
    let fetcher = HttpFetcher::with_url(url, &AppOptions::default()).unwrap();
    let got = fetcher.fetch(&c, Local::now().date_naive());
    let request = rx.recv().unwrap_or_default();
    (got, request)
}

const TREE: &str = r#"{"code":0,"data":{"list":{"id":95,"name":"Library","childArea":[
    {"id":1,"name":"A","TotalCount":10,"UnavailableSpace":3},
    {"id":2,"name":"B","TotalCount":5,"UnavailableSpace":5}]}}}"#;

#[test]
fn ok_response_becomes_a_snapshot() {
    let (got, request) = fetch("200 OK", "", TREE, ctx(Strategy::Direct, vec![]));
    let snap = got.unwrap();
    assert_eq!(snap.records.len(), 2);
    assert!(snap.records.iter().all(|r| r.minute == snap.minute));
    assert!((0..24 * 60 + 1).contains(&snap.minute));

    let lower = request.to_ascii_lowercase();
    assert!(lower.starts_with("get /api.php/v3areas/95 "));
    assert!(lower.contains("x-requested-with: xmlhttprequest"));
    assert!(!lower.contains("cookie:"));
}

#[test]
fn forbidden_is_auth_required() {
    let (got, _) = fetch("403 Forbidden", "", "{}", ctx(Strategy::Direct, vec![]));
    assert!(matches!(got, Err(FetchError::AuthRequired(403))));
}

#[test]
fn redirect_is_not_followed_and_is_auth_required() {
    let (got, _) = fetch(
        "302 Found",
        "Location: http://127.0.0.1:9/login\r\n",
        "",
        ctx(Strategy::Direct, vec![]),
    );
    assert!(matches!(got, Err(FetchError::AuthRequired(302))));
}

#[test]
fn server_error_is_plain_failure() {
    let (got, _) = fetch("500 Internal Server Error", "", "oops", ctx(Strategy::Direct, vec![]));
    assert!(matches!(got, Err(FetchError::Status(500))));
}

#[test]
fn html_login_page_is_malformed() {
    let (got, _) = fetch("200 OK", "", "<html>login</html>", ctx(Strategy::Direct, vec![]));
    assert!(matches!(got, Err(FetchError::Malformed(_))));
}

#[test]
fn harvested_cookies_are_sent() {
    let cookies = vec![("PHPSESSID".into(), "abc123".into()), ("lang".into(), "zh".into())];
    let (got, request) = fetch("200 OK", "", TREE, ctx(Strategy::BrowserFallback, cookies));
    assert!(got.is_ok());
    assert!(request.to_ascii_lowercase().contains("cookie: phpsessid=abc123; lang=zh"));
}

#[test]
fn closed_port_is_transport_failure() {
    let port = {
        let l = TcpListener::bind("127.0.0.1:0").unwrap();
        l.local_addr().unwrap().port()
    };
    let fetcher = HttpFetcher::with_url(format!("http://127.0.0.1:{port}/x"), &AppOptions::default()).unwrap();
    let got = fetcher.fetch(&ctx(Strategy::Direct, vec![]), Local::now().date_naive());
    assert!(matches!(got, Err(FetchError::Transport { .. })));
}
