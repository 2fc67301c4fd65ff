// src/session/webdriver.rs
//
// Minimal W3C WebDriver client, just enough to load one page and read its
// cookies. Any driver works (chromedriver, geckodriver, msedgedriver); the
// browser is whatever the driver launches.
//
// Teardown is tied to guard drops so every exit path releases, in order:
//   1. the browser session (DELETE /session/{id})
//   2. the driver process, if we spawned it

use std::{
    process::{Child, Command, Stdio},
    thread,
    time::{Duration, Instant},
};

use reqwest::blocking::{Client, RequestBuilder};
use serde::Deserialize;
use serde_json::{json, Value};

use super::SessionError;
use crate::config::consts::DRIVER_POLL_MS;
use crate::config::options::BrowserOptions;
use crate::core::net;

/// Load `page_url` in a fresh browser session and return its cookies as
/// (name, value) pairs.
pub fn harvest_cookies(
    opts: &BrowserOptions,
    page_url: &str,
) -> Result<Vec<(String, String)>, SessionError> {
    let endpoint = opts.endpoint();
    // Navigation blocks until load (or the driver's own pageLoad timeout),
    // so the HTTP timeout must outlast it.
    let client = net::client(opts.page_load_timeout() * 2 + Duration::from_secs(5))
        .map_err(|e| SessionError::Protocol(e.to_string()))?;

    // Declaration order matters: `session` drops before `_driver`.
    let _driver = DriverProcess::spawn(opts)?;
    wait_ready(&client, &endpoint, opts.driver_start_timeout())?;

    let session = BrowserSession::open(&client, &endpoint, opts)?;
    session.navigate(page_url, opts.page_load_timeout())?;
    session.wait_loaded(opts.page_load_timeout())?;
    session.cookies(opts.page_load_timeout())
}

/* ---------------- Driver process ---------------- */

/// Spawned driver binary; killed and reaped on drop.
struct DriverProcess(Child);

impl DriverProcess {
    fn spawn(opts: &BrowserOptions) -> Result<Option<Self>, SessionError> {
        let Some(path) = &opts.driver_path else {
            return Ok(None);
        };
        let child = Command::new(path)
            .arg(format!("--port={}", opts.port))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| SessionError::Spawn { path: path.clone(), source })?;
        tracing::debug!(pid = child.id(), path = %path.display(), "driver started");
        Ok(Some(Self(child)))
    }
}

impl Drop for DriverProcess {
    fn drop(&mut self) {
        let pid = self.0.id();
        let _ = self.0.kill();
        let _ = self.0.wait();
        tracing::debug!(pid, "driver stopped");
    }
}

/// Poll `/status` until the driver answers. A driver that never answers is
/// reported with the last transport error.
fn wait_ready(client: &Client, endpoint: &str, timeout: Duration) -> Result<(), SessionError> {
    let deadline = Instant::now() + timeout;
    loop {
        match client.get(format!("{endpoint}/status")).send() {
            Ok(resp) if resp.status().is_success() => return Ok(()),
            Ok(resp) => {
                if Instant::now() >= deadline {
                    return Err(SessionError::Protocol(format!(
                        "driver status answered {}", resp.status()
                    )));
                }
            }
            Err(source) => {
                if Instant::now() >= deadline {
                    return Err(SessionError::DriverUnavailable { endpoint: s!(endpoint), source });
                }
            }
        }
        thread::sleep(Duration::from_millis(DRIVER_POLL_MS));
    }
}

/* ---------------- Browser session ---------------- */

#[derive(Deserialize)]
struct WireCookie {
    name: String,
    value: String,
}

/// Open WebDriver session; deleted on drop.
struct BrowserSession<'a> {
    client: &'a Client,
    url: String, // "{endpoint}/session/{id}"
}

impl<'a> BrowserSession<'a> {
    fn open(client: &'a Client, endpoint: &str, opts: &BrowserOptions) -> Result<Self, SessionError> {
        let body = json!({ "capabilities": { "alwaysMatch": capabilities(opts) } });
        let req = client.post(format!("{endpoint}/session")).json(&body);
        let value = call(req, "new session", opts.driver_start_timeout())?;
        let id = value
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| SessionError::Protocol(s!("new session returned no sessionId")))?;
        tracing::debug!(session = id, "browser session opened");
        Ok(Self { client, url: format!("{endpoint}/session/{id}") })
    }

    fn navigate(&self, page_url: &str, timeout: Duration) -> Result<(), SessionError> {
        let req = self.client.post(format!("{}/url", self.url)).json(&json!({ "url": page_url }));
        call(req, "navigation", timeout).map(|_| ())
    }

    /// Wait for `document.readyState == "complete"`.
    fn wait_loaded(&self, timeout: Duration) -> Result<(), SessionError> {
        let deadline = Instant::now() + timeout;
        let script = json!({ "script": "return document.readyState", "args": [] });
        loop {
            let req = self.client.post(format!("{}/execute/sync", self.url)).json(&script);
            let state = call(req, "readyState", timeout)?;
            if state.as_str() == Some("complete") {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(SessionError::Timeout { what: s!("page load"), secs: timeout.as_secs() });
            }
            thread::sleep(Duration::from_millis(DRIVER_POLL_MS));
        }
    }

    fn cookies(&self, timeout: Duration) -> Result<Vec<(String, String)>, SessionError> {
        let value = call(self.client.get(format!("{}/cookie", self.url)), "get cookies", timeout)?;
        let cookies: Vec<WireCookie> = serde_json::from_value(value)
            .map_err(|e| SessionError::Protocol(format!("cookie list: {e}")))?;
        Ok(cookies.into_iter().map(|c| (c.name, c.value)).collect())
    }
}

impl Drop for BrowserSession<'_> {
    fn drop(&mut self) {
        match self.client.delete(&self.url).send() {
            Ok(_) => tracing::debug!(session = %self.url, "browser session closed"),
            Err(e) => tracing::warn!(session = %self.url, error = %e, "browser session not closed"),
        }
    }
}

/* ---------------- Wire helpers ---------------- */

fn capabilities(opts: &BrowserOptions) -> Value {
    let mut caps = json!({
        "browserName": opts.browser_name,
        "pageLoadStrategy": "normal",
        "timeouts": { "pageLoad": opts.page_load_timeout().as_millis() as u64 },
    });
    if opts.headless {
        let vendor = match opts.browser_name.as_str() {
            "chrome" => Some(("goog:chromeOptions", json!({ "args": ["--headless=new", "--disable-gpu"] }))),
            "firefox" => Some(("moz:firefoxOptions", json!({ "args": ["-headless"] }))),
            "MicrosoftEdge" => Some(("ms:edgeOptions", json!({ "args": ["--headless=new"] }))),
            _ => None,
        };
        if let (Some((key, val)), Some(map)) = (vendor, caps.as_object_mut()) {
            map.insert(s!(key), val);
        }
    }
    caps
}

/// Send one command and unwrap the `value` member. WebDriver errors come back
/// as `{"value": {"error": "...", "message": "..."}}` with a non-2xx status;
/// a driver-side `"timeout"` is reported against `timeout`.
fn call(req: RequestBuilder, what: &str, timeout: Duration) -> Result<Value, SessionError> {
    let resp = req
        .send()
        .map_err(|e| SessionError::Protocol(format!("{what}: {e}")))?;
    let ok = resp.status().is_success();
    let body: Value = resp
        .json()
        .map_err(|e| SessionError::Protocol(format!("{what}: unreadable reply: {e}")))?;
    let value = body.get("value").cloned().unwrap_or(Value::Null);

    if ok {
        return Ok(value);
    }
    let code = value.get("error").and_then(Value::as_str).unwrap_or("unknown error");
    if code == "timeout" {
        return Err(SessionError::Timeout { what: s!(what), secs: timeout.as_secs() });
    }
    let msg = value.get("message").and_then(Value::as_str).unwrap_or("");
    Err(SessionError::Protocol(format!("{what}: {code}: {msg}")))
}
