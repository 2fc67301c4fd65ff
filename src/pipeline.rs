// src/pipeline.rs
//
// One acquisition cycle as an explicit state machine:
//
//   Start → TryDirect ──ok──────────────→ Persist → Done
//              │ AuthRequired                 ↑
//              ↓                              │
//         TryFallbackSession ──ok─────────────┘
//              │ anything else
//              ↓
//           Aborted   (also from TryDirect on any non-auth error,
//                      and from Persist on a store error)
//
// There is exactly one escalation and no retry loop. Every outcome ends up
// in the returned `CycleReport`; nothing is thrown past `run`.

use std::error::Error as _;

use chrono::NaiveDate;
use thiserror::Error;

use crate::config::options::AppOptions;
use crate::fetch::{FetchError, HttpFetcher, SnapshotFetcher};
use crate::progress::Progress;
use crate::session::{SessionAcquirer, SessionError, SessionProvider, Strategy};
use crate::specs::area_tree::{OccupancyRecord, Snapshot};
use crate::store::{Appended, SnapshotStore, StoreError};

#[derive(Debug)]
pub enum Stage {
    Start,
    TryDirect,
    TryFallbackSession,
    Persist { strategy: Strategy, snapshot: Snapshot },
    Done(CycleSummary),
    Aborted(CycleError),
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Start => "start",
            Stage::TryDirect => "try-direct",
            Stage::TryFallbackSession => "try-fallback-session",
            Stage::Persist { .. } => "persist",
            Stage::Done(_) => "done",
            Stage::Aborted(_) => "aborted",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::Done(_) | Stage::Aborted(_))
    }
}

/// Failure classes a caller may want to tell apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Transport,
    HttpStatus,
    AuthRequired,
    Malformed,
    Empty,
    ResourceAcquisition,
    Storage,
}

#[derive(Debug, Error)]
pub enum CycleError {
    #[error("{strategy} fetch failed")]
    Fetch {
        strategy: Strategy,
        #[source]
        source: FetchError,
    },

    #[error("no session obtainable")]
    NoSession(#[source] SessionError),

    #[error("snapshot not persisted")]
    Store(#[source] StoreError),
}

impl CycleError {
    pub fn kind(&self) -> FailureKind {
        match self {
            CycleError::Fetch { source, .. } => match source {
                FetchError::Transport { .. } => FailureKind::Transport,
                FetchError::Status(_) => FailureKind::HttpStatus,
                FetchError::AuthRequired(_) => FailureKind::AuthRequired,
                FetchError::Malformed(_) => FailureKind::Malformed,
                FetchError::Empty => FailureKind::Empty,
            },
            CycleError::NoSession(_) => FailureKind::ResourceAcquisition,
            CycleError::Store(_) => FailureKind::Storage,
        }
    }

    /// Whole cause chain on one line: `browser fetch failed: authorization required (HTTP 403)`.
    pub fn one_line(&self) -> String {
        let mut line = self.to_string();
        let mut cur = self.source();
        while let Some(e) = cur {
            line.push_str(": ");
            line.push_str(&e.to_string());
            cur = e.source();
        }
        line
    }
}

#[derive(Debug, Clone)]
pub struct CycleSummary {
    pub date: NaiveDate,
    pub minute: i64,
    pub strategy: Strategy,
    pub areas: Vec<OccupancyRecord>,
    pub total: i64,
    pub available: i64,
    pub appended: Appended,
}

#[derive(Debug)]
pub struct CycleReport {
    pub date: NaiveDate,
    /// Session strategies tried, in order.
    pub attempts: Vec<Strategy>,
    pub outcome: Result<CycleSummary, CycleError>,
}

impl CycleReport {
    pub fn is_ok(&self) -> bool { self.outcome.is_ok() }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        self.outcome.as_ref().err().map(CycleError::kind)
    }
}

pub struct Pipeline<'a> {
    date: NaiveDate,
    sessions: &'a mut dyn SessionAcquirer,
    fetcher: &'a dyn SnapshotFetcher,
    store: &'a SnapshotStore,
    progress: &'a mut dyn Progress,
    attempts: Vec<Strategy>,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        date: NaiveDate,
        sessions: &'a mut dyn SessionAcquirer,
        fetcher: &'a dyn SnapshotFetcher,
        store: &'a SnapshotStore,
        progress: &'a mut dyn Progress,
    ) -> Self {
        Self { date, sessions, fetcher, store, progress, attempts: Vec::new() }
    }

    /// Drive the machine to a terminal stage.
    pub fn run(mut self) -> CycleReport {
        let mut stage = Stage::Start;
        let outcome = loop {
            stage = match stage {
                Stage::Done(summary) => break Ok(summary),
                Stage::Aborted(err) => break Err(err),
                live => self.step(live),
            };
            self.progress.stage(stage.name());
        };

        match &outcome {
            Ok(s) => tracing::info!(date = %self.date, total = s.total, available = s.available, "cycle done"),
            Err(e) if e.kind() == FailureKind::Empty => tracing::warn!(date = %self.date, "{}", e.one_line()),
            Err(e) => tracing::error!(date = %self.date, kind = ?e.kind(), "{}", e.one_line()),
        }
        self.progress.finish(outcome.is_ok());

        CycleReport { date: self.date, attempts: self.attempts, outcome }
    }

    /// Transition function. Terminal stages map to themselves.
    pub fn step(&mut self, stage: Stage) -> Stage {
        match stage {
            Stage::Start => Stage::TryDirect,
            Stage::TryDirect => self.attempt(Strategy::Direct),
            Stage::TryFallbackSession => self.attempt(Strategy::BrowserFallback),
            Stage::Persist { strategy, snapshot } => self.persist(strategy, snapshot),
            terminal => terminal,
        }
    }

    fn attempt(&mut self, strategy: Strategy) -> Stage {
        self.attempts.push(strategy);

        let ctx = match self.sessions.acquire(strategy, self.date) {
            Ok(ctx) => ctx,
            Err(e) => return Stage::Aborted(CycleError::NoSession(e)),
        };

        match self.fetcher.fetch(&ctx, self.date) {
            Ok(snapshot) => {
                self.progress.log(&format!("{} areas via {strategy} session", snapshot.len()));
                Stage::Persist { strategy, snapshot }
            }
            Err(e) if e.needs_session() && strategy == Strategy::Direct => {
                tracing::warn!(error = %e, "direct fetch refused, escalating to browser session");
                self.progress.log("Direct access refused; trying a browser session…");
                Stage::TryFallbackSession
            }
            Err(source) => Stage::Aborted(CycleError::Fetch { strategy, source }),
        }
    }

    fn persist(&mut self, strategy: Strategy, snapshot: Snapshot) -> Stage {
        match self.store.append(self.date, &snapshot) {
            Ok(appended) => Stage::Done(CycleSummary {
                date: self.date,
                minute: snapshot.minute,
                strategy,
                total: snapshot.total(),
                available: snapshot.available(),
                areas: snapshot.records,
                appended,
            }),
            Err(e) => Stage::Aborted(CycleError::Store(e)),
        }
    }
}

/// Run one cycle with the live session provider and HTTP fetcher.
pub fn run_cycle(opts: &AppOptions, date: NaiveDate, progress: &mut dyn Progress) -> CycleReport {
    let fetcher = match HttpFetcher::new(opts) {
        Ok(f) => f,
        Err(source) => {
            let err = CycleError::Fetch {
                strategy: Strategy::Direct,
                source: FetchError::Transport { url: opts.target.api_url(), source },
            };
            tracing::error!("{}", err.one_line());
            progress.finish(false);
            return CycleReport { date, attempts: Vec::new(), outcome: Err(err) };
        }
    };
    let mut sessions = SessionProvider::new(opts);
    let store = SnapshotStore::new(opts.store.dir.clone());

    tracing::info!(%date, url = fetcher.url(), store = %store.dir().display(), "cycle start");
    Pipeline::new(date, &mut sessions, &fetcher, &store, progress).run()
}
