// src/fetch.rs
//
// One fetch attempt against the seat-tree endpoint:
//   transport → status → envelope → flatten → non-empty?
// Each check has its own error variant so the pipeline can tell
// "try another session" (AuthRequired) from "give up" (everything else).

use chrono::{NaiveDate, NaiveDateTime};
use reqwest::blocking::Client;
use thiserror::Error;

use crate::config::options::AppOptions;
use crate::core::{clock, net};
use crate::session::AccessContext;
use crate::specs::area_tree::{self, Envelope, Snapshot};

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("authorization required (HTTP {0})")]
    AuthRequired(u16),

    #[error("unexpected HTTP status {0}")]
    Status(u16),

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("payload held no areas with seat counts")]
    Empty,
}

impl FetchError {
    /// Only this outcome is worth another attempt with a different session.
    pub fn needs_session(&self) -> bool {
        matches!(self, FetchError::AuthRequired(_))
    }
}

pub trait SnapshotFetcher {
    fn fetch(&self, ctx: &AccessContext, date: NaiveDate) -> Result<Snapshot, FetchError>;
}

/// 403 and 302 both mean the API wants a session cookie.
pub fn check_status(status: u16) -> Result<(), FetchError> {
    match status {
        200..=299 => Ok(()),
        403 | 302 => Err(FetchError::AuthRequired(status)),
        other => Err(FetchError::Status(other)),
    }
}

/// Parse the envelope, stamp every record with `minute`, flatten.
pub fn snapshot_from_body(body: &str, minute: i64) -> Result<Snapshot, FetchError> {
    let env: Envelope = serde_json::from_str(body)
        .map_err(|e| FetchError::Malformed(format!("not the expected JSON: {e}")))?;
    let list = env
        .data
        .ok_or_else(|| FetchError::Malformed(s!("missing `data`")))?
        .list
        .ok_or_else(|| FetchError::Malformed(s!("missing `data.list`")))?;

    let snap = area_tree::flatten(list.roots(), minute);
    if snap.is_empty() {
        return Err(FetchError::Empty);
    }
    Ok(snap)
}

/// Live fetcher over HTTP.
pub struct HttpFetcher {
    client: Client,
    url: String,
    clock: fn() -> NaiveDateTime,
}

impl HttpFetcher {
    pub fn new(opts: &AppOptions) -> Result<Self, reqwest::Error> {
        Self::with_url(opts.target.api_url(), opts)
    }

    /// Same as `new` but against an arbitrary URL (tests, mirrors).
    pub fn with_url(url: impl Into<String>, opts: &AppOptions) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: net::client(opts.session.fetch_timeout())?,
            url: url.into(),
            clock: clock::now_local,
        })
    }

    pub fn url(&self) -> &str { &self.url }
}

impl SnapshotFetcher for HttpFetcher {
    fn fetch(&self, ctx: &AccessContext, date: NaiveDate) -> Result<Snapshot, FetchError> {
        tracing::debug!(url = %self.url, strategy = %ctx.strategy, cookies = ctx.cookies.len(), "fetching");
        let resp = net::http_get(&self.client, &self.url, &ctx.request_headers())
            .map_err(|source| FetchError::Transport { url: self.url.clone(), source })?;
        check_status(resp.status)?;

        // Stamped once so every row of this snapshot agrees.
        let minute = clock::minutes_since_midnight(date, (self.clock)());
        snapshot_from_body(&resp.body, minute)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_classes() {
        assert!(check_status(200).is_ok());
        assert!(matches!(check_status(403), Err(FetchError::AuthRequired(403))));
        assert!(matches!(check_status(302), Err(FetchError::AuthRequired(302))));
        assert!(matches!(check_status(500), Err(FetchError::Status(500))));
        assert!(matches!(check_status(404), Err(FetchError::Status(404))));
    }

    #[test]
    fn only_auth_required_escalates() {
        assert!(FetchError::AuthRequired(403).needs_session());
        assert!(!FetchError::Empty.needs_session());
        assert!(!FetchError::Malformed(s!("x")).needs_session());
    }

    #[test]
    fn body_without_list_is_malformed() {
        for body in ["not json", "{}", r#"{"data": {}}"#, r#"{"data": {"list": null}}"#] {
            let err = snapshot_from_body(body, 0).unwrap_err();
            assert!(matches!(err, FetchError::Malformed(_)), "{body}");
        }
    }

    #[test]
    fn tree_without_counts_is_empty() {
        let body = r#"{"data": {"list": {"id": 95, "name": "root", "childArea": [{"id": 1, "name": "g"}]}}}"#;
        assert!(matches!(snapshot_from_body(body, 0), Err(FetchError::Empty)));
    }
}
