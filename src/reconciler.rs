//! # Gap-Fill Reconciler
//!
//! Works out which rounds are missing after the cursor and fetches them.
//!
//! ## Modes
//!
//! - **Sequential**: walk `cursor+1 ..= expected_round(today)` and stop at the
//!   first round no source can deliver. The weekly cadence is the upper bound.
//! - **Latest-first**: ask a latest-capable source for the newest round. If it
//!   is ahead of the cursor and not past the expected round, fetch each round
//!   in between individually (a failure leaves a gap, nothing is retried) and
//!   append the newest record. Anything else falls back to sequential.
//!
//! Every fetch is awaited before the next one starts; there is never more than
//! one request in flight. Failures never abort the run, they only shape the
//! [`SyncReport`].

use chrono::{Local, NaiveDate};
use log::{debug, info, warn};
use std::sync::Arc;

use crate::calendar::DrawCalendar;
use crate::draw::{DrawRecord, FetchTarget, Round};
use crate::settings::SyncMode;
use crate::source::{AttemptError, DrawSource};

/// Source of "today".
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Local wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Clock frozen at one date.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

/// Outcome of asking one source for one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    Fetched(Round),
    Failed { reason: String, transient: bool },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    pub target: FetchTarget,
    pub source: &'static str,
    pub outcome: AttemptOutcome,
}

/// Why the forward scan ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Halt {
    /// Every round up to the expected one was fetched, or the cursor was already there.
    UpToDate,
    /// A source answered that the round does not exist, or its payload was rejected.
    NotAvailable(Round),
    /// Every source failed at the transport level. The round may well exist.
    Transport { round: Round, reason: String },
    /// No configured source can serve round targets.
    NoRoundSource,
}

#[derive(Debug, Clone)]
pub struct SyncReport {
    /// Mode that produced the records; latest-first may fall back to sequential.
    pub mode: SyncMode,
    /// New records, descending by round.
    pub records: Vec<DrawRecord>,
    pub attempts: Vec<Attempt>,
    /// Set by the sequential walk. Latest-first never halts, it leaves gaps.
    pub halt: Option<Halt>,
    /// Rounds skipped by latest-first because no source delivered them.
    pub gaps: Vec<Round>,
}

impl SyncReport {
    fn new(mode: SyncMode) -> Self {
        Self {
            mode,
            records: Vec::new(),
            attempts: Vec::new(),
            halt: None,
            gaps: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// True when the run stopped on a network problem rather than on an answer.
    pub fn halted_on_transport(&self) -> bool {
        matches!(self.halt, Some(Halt::Transport { .. }))
    }

    fn finish(mut self) -> Self {
        self.records.sort_by(|a, b| b.round().cmp(&a.round()));
        self
    }
}

pub struct Reconciler {
    /// Priority order: earlier sources are asked first.
    sources: Vec<Box<dyn DrawSource>>,
    calendar: DrawCalendar,
    clock: Arc<dyn Clock>,
    mode: SyncMode,
}

impl Reconciler {
    pub fn new(sources: Vec<Box<dyn DrawSource>>, calendar: DrawCalendar, clock: Arc<dyn Clock>) -> Self {
        Self {
            sources,
            calendar,
            clock,
            mode: SyncMode::default(),
        }
    }

    pub fn with_mode(mut self, mode: SyncMode) -> Self {
        self.mode = mode;
        self
    }

    /// Newest round that can have been drawn today.
    pub fn expected_round(&self) -> Round {
        self.calendar.expected_round(self.clock.today())
    }

    /// Fetches every round after `cursor` that can be found.
    pub async fn reconcile(&self, cursor: Round) -> SyncReport {
        let report = match self.mode {
            SyncMode::Sequential => self.sequential(cursor, SyncReport::new(SyncMode::Sequential)).await,
            SyncMode::LatestFirst => self.latest_first(cursor).await,
        };
        report.finish()
    }

    async fn sequential(&self, cursor: Round, mut report: SyncReport) -> SyncReport {
        let expected = self.expected_round();
        info!("🔍 Sequential scan: cursor {}, expected round {}", cursor, expected);

        for round in cursor.saturating_add(1)..=expected {
            match self.fetch_round(round, &mut report.attempts).await {
                Ok(record) => report.records.push(record),
                Err(halt) => {
                    match &halt {
                        Halt::Transport { reason, .. } => {
                            warn!("⚠️ Stopping at round {}: transport failure ({})", round, reason)
                        }
                        _ => info!("Stopping at round {}: not available yet", round),
                    }
                    report.halt = Some(halt);
                    return report;
                }
            }
        }

        report.halt = Some(Halt::UpToDate);
        report
    }

    async fn latest_first(&self, cursor: Round) -> SyncReport {
        let mut report = SyncReport::new(SyncMode::LatestFirst);
        let expected = self.expected_round();

        let latest = match self.fetch_latest(&mut report.attempts).await {
            Some(record) if record.round() > expected => {
                warn!(
                    "⚠️ Latest round {} is past the expected round {}, ignoring it and falling back to sequential scan",
                    record.round(),
                    expected
                );
                report.mode = SyncMode::Sequential;
                return self.sequential(cursor, report).await;
            }
            Some(record) if record.round() > cursor => record,
            Some(record) => {
                info!(
                    "Latest round {} is not ahead of cursor {}, falling back to sequential scan",
                    record.round(),
                    cursor
                );
                report.mode = SyncMode::Sequential;
                return self.sequential(cursor, report).await;
            }
            None => {
                info!("No latest round available, falling back to sequential scan");
                report.mode = SyncMode::Sequential;
                return self.sequential(cursor, report).await;
            }
        };

        info!("🔍 Latest round is {}, filling {}..{}", latest.round(), cursor + 1, latest.round());
        for round in cursor.saturating_add(1)..latest.round() {
            match self.fetch_round(round, &mut report.attempts).await {
                Ok(record) => report.records.push(record),
                Err(halt) => {
                    warn!("⚠️ Leaving a gap at round {}: {:?}", round, halt);
                    report.gaps.push(round);
                }
            }
        }
        report.records.push(latest);
        report
    }

    /// Tries each round-capable source in order; first success wins.
    async fn fetch_round(&self, round: Round, attempts: &mut Vec<Attempt>) -> Result<DrawRecord, Halt> {
        let target = FetchTarget::Round(round);
        let mut transport_failure: Option<String> = None;
        let mut answered = false;
        let mut asked_any = false;

        for source in self.sources.iter().filter(|s| s.supports(target)) {
            asked_any = true;
            match source.fetch_record(target).await {
                Ok(record) => {
                    attempts.push(fetched(target, source.name(), &record));
                    return Ok(record);
                }
                Err(e) => {
                    debug!("{} failed for {}: {}", source.name(), target, e);
                    if e.is_transient() {
                        transport_failure.get_or_insert_with(|| e.to_string());
                    } else {
                        answered = true;
                    }
                    attempts.push(failed(target, source.name(), &e));
                }
            }
        }

        if !asked_any {
            return Err(Halt::NoRoundSource);
        }
        // An answer from any source outranks a transport error from another.
        match transport_failure {
            Some(reason) if !answered => Err(Halt::Transport { round, reason }),
            _ => Err(Halt::NotAvailable(round)),
        }
    }

    async fn fetch_latest(&self, attempts: &mut Vec<Attempt>) -> Option<DrawRecord> {
        let target = FetchTarget::Latest;
        for source in self.sources.iter().filter(|s| s.supports(target)) {
            match source.fetch_record(target).await {
                Ok(record) => {
                    attempts.push(fetched(target, source.name(), &record));
                    return Some(record);
                }
                Err(e) => {
                    warn!("⚠️ {} could not provide the latest round: {}", source.name(), e);
                    attempts.push(failed(target, source.name(), &e));
                }
            }
        }
        None
    }
}

fn fetched(target: FetchTarget, source: &'static str, record: &DrawRecord) -> Attempt {
    Attempt {
        target,
        source,
        outcome: AttemptOutcome::Fetched(record.round()),
    }
}

fn failed(target: FetchTarget, source: &'static str, error: &AttemptError) -> Attempt {
    Attempt {
        target,
        source,
        outcome: AttemptOutcome::Failed {
            reason: error.to_string(),
            transient: error.is_transient(),
        },
    }
}
