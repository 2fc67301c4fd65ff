// src/session/mod.rs
//
// Access contexts for the seat API.
//
// Two ways to get one, cheapest first. The pipeline decides when to move from
// one to the next; nothing in here loops or retries.
//   - Direct:          static headers, no cookies, no external process.
//   - BrowserFallback: drive a real browser to the human page and keep
//                      whatever cookies it was given (see `webdriver`).

pub mod webdriver;

use std::{fmt, path::PathBuf};

use chrono::NaiveDate;
use thiserror::Error;

use crate::config::consts::XHR_HEADER;
use crate::config::options::{AppOptions, SessionOptions, TargetOptions};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Strategy {
    Direct,
    BrowserFallback,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Strategy::Direct => "direct",
            Strategy::BrowserFallback => "browser",
        })
    }
}

/// Headers plus cookies for one fetch attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccessContext {
    pub strategy: Strategy,
    pub headers: Vec<(String, String)>,
    pub cookies: Vec<(String, String)>,
}

impl AccessContext {
    /// `name=value; name=value`, or None when there is nothing to send.
    pub fn cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        let pairs: Vec<String> = self
            .cookies
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect();
        Some(pairs.join("; "))
    }

    /// Headers as they go on the wire, `Cookie` last.
    pub fn request_headers(&self) -> Vec<(String, String)> {
        let mut out = self.headers.clone();
        if let Some(c) = self.cookie_header() {
            out.push((s!("Cookie"), c));
        }
        out
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("browser fallback is disabled")]
    Disabled,

    #[error("no WebDriver reachable at {endpoint}")]
    DriverUnavailable {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to start driver {path}")]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{what} timed out after {secs}s")]
    Timeout { what: String, secs: u64 },

    #[error("WebDriver protocol error: {0}")]
    Protocol(String),
}

pub trait SessionAcquirer {
    fn acquire(&mut self, strategy: Strategy, date: NaiveDate) -> Result<AccessContext, SessionError>;
}

/// Production acquirer: direct headers from config, fallback via WebDriver.
pub struct SessionProvider {
    target: TargetOptions,
    session: SessionOptions,
}

impl SessionProvider {
    pub fn new(opts: &AppOptions) -> Self {
        Self {
            target: opts.target.clone(),
            session: opts.session.clone(),
        }
    }

    pub fn direct_headers(&self, date: NaiveDate) -> Vec<(String, String)> {
        vec![
            (s!("User-Agent"), self.session.user_agent.clone()),
            (s!("Referer"), self.target.page_url(date)),
            (s!(XHR_HEADER.0), s!(XHR_HEADER.1)),
        ]
    }
}

impl SessionAcquirer for SessionProvider {
    fn acquire(&mut self, strategy: Strategy, date: NaiveDate) -> Result<AccessContext, SessionError> {
        let headers = self.direct_headers(date);
        let cookies = match strategy {
            Strategy::Direct => Vec::new(),
            Strategy::BrowserFallback => {
                let browser = &self.session.browser;
                if !browser.enabled {
                    return Err(SessionError::Disabled);
                }
                let page = self.target.page_url(date);
                let cookies = webdriver::harvest_cookies(browser, &page)?;
                tracing::info!(count = cookies.len(), %page, "harvested browser cookies");
                cookies
            }
        };
        Ok(AccessContext { strategy, headers, cookies })
    }
}
