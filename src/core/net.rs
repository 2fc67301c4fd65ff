// src/core/net.rs
// Blocking HTTP GET with explicit headers. Redirects are NOT followed: a 302
// from the seat API means "go get a session", and the caller has to see it.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::redirect::Policy;

/// Status line + body, nothing else is needed downstream.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

pub fn client(timeout: Duration) -> reqwest::Result<Client> {
    Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout)
        .redirect(Policy::none())
        .build()
}

/// GET `url` with the given headers. Any transport problem (DNS, connect,
/// timeout, broken body) is the `Err` side; HTTP statuses are data.
pub fn http_get(
    client: &Client,
    url: &str,
    headers: &[(String, String)],
) -> reqwest::Result<HttpResponse> {
    let mut req = client.get(url);
    for (k, v) in headers {
        req = req.header(k.as_str(), v.as_str());
    }
    let resp = req.send()?;
    let status = resp.status().as_u16();
    let body = resp.text()?;
    tracing::debug!(url, status, bytes = body.len(), "GET");
    Ok(HttpResponse { status, body })
}
