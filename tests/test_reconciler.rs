//! Integration tests for gap-fill reconciliation
//!
//! Tests cover:
//! - Sequential scan bounded by the draw calendar
//! - Halting on the first failed round
//! - Latest-first gap filling and its fallback
//! - Latest rounds newer than the calendar allows
//! - Source priority
//!
//! All sources are in-memory fakes; no network.

use async_trait::async_trait;
use chrono::NaiveDate;
use lotto_sync::calendar::DrawCalendar;
use lotto_sync::error::{ExtractError, FetchError};
use lotto_sync::reconciler::{FixedClock, Halt, Reconciler};
use lotto_sync::settings::SyncMode;
use lotto_sync::source::{DrawSource, RawContent};
use lotto_sync::{DrawRecord, FetchTarget, Round};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Clone, Copy)]
enum Answer {
    Draw,
    NotPublished,
    Down,
    Garbage,
}

struct FakeSource {
    name: &'static str,
    latest: Option<(Round, Answer)>,
    rounds: HashMap<Round, Answer>,
    calls: Arc<Mutex<Vec<FetchTarget>>>,
}

impl FakeSource {
    fn api(rounds: &[(Round, Answer)]) -> Self {
        Self {
            name: "fake-api",
            latest: None,
            rounds: rounds.iter().copied().collect(),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn search(round: Round, answer: Answer) -> Self {
        Self {
            name: "fake-search",
            latest: Some((round, answer)),
            rounds: HashMap::new(),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn named(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    fn calls(&self) -> Arc<Mutex<Vec<FetchTarget>>> {
        Arc::clone(&self.calls)
    }
}

fn draw(round: Round) -> DrawRecord {
    let base = (round % 39) as i64 + 1;
    let numbers: Vec<i64> = (0..6).map(|i| base + i).collect();
    DrawRecord::new(round as i64, &numbers, None, DrawCalendar::default().date_of(round).unwrap()).unwrap()
}

#[async_trait]
impl DrawSource for FakeSource {
    fn name(&self) -> &'static str {
        self.name
    }

    fn supports(&self, target: FetchTarget) -> bool {
        match target {
            FetchTarget::Latest => self.latest.is_some(),
            FetchTarget::Round(_) => self.latest.is_none(),
        }
    }

    async fn fetch(&self, target: FetchTarget) -> Result<RawContent, FetchError> {
        self.calls.lock().unwrap().push(target);
        let (round, answer) = match target {
            FetchTarget::Latest => self.latest.unwrap(),
            FetchTarget::Round(r) => (r, self.rounds.get(&r).copied().unwrap_or(Answer::NotPublished)),
        };
        match answer {
            Answer::Draw => Ok(RawContent::new(serde_json::to_string(&draw(round)).unwrap())),
            Answer::Garbage => Ok(RawContent::new("<html>oops</html>")),
            Answer::NotPublished => Err(FetchError::NotPublished {
                source_name: self.name,
                target,
            }),
            Answer::Down => Err(FetchError::unavailable(self.name, "connection reset")),
        }
    }

    fn extract(&self, raw: &RawContent) -> Result<DrawRecord, ExtractError> {
        serde_json::from_str(&raw.body).map_err(|e| ExtractError::Malformed(e.to_string()))
    }
}

fn boxed(source: FakeSource) -> Box<dyn DrawSource> {
    Box::new(source)
}

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn reconciler(sources: Vec<Box<dyn DrawSource>>, today: &str, mode: SyncMode) -> Reconciler {
    Reconciler::new(sources, DrawCalendar::default(), Arc::new(FixedClock(date(today)))).with_mode(mode)
}

fn rounds(records: &[DrawRecord]) -> Vec<Round> {
    records.iter().map(DrawRecord::round).collect()
}

/// 2026-01-10 is the draw date of round 1206
#[tokio::test]
async fn test_sequential_fetches_up_to_expected_round() {
    let api = FakeSource::api(&[
        (1204, Answer::Draw),
        (1205, Answer::Draw),
        (1206, Answer::Draw),
        (1207, Answer::Draw),
    ]);
    let calls = api.calls();
    let r = reconciler(vec![boxed(api)], "2026-01-12", SyncMode::Sequential);

    let report = r.reconcile(1203).await;

    assert_eq!(rounds(&report.records), vec![1206, 1205, 1204]);
    assert_eq!(report.halt, Some(Halt::UpToDate));
    assert!(!calls.lock().unwrap().contains(&FetchTarget::Round(1207)));
}

#[tokio::test]
async fn test_sequential_stops_at_first_unpublished_round() {
    let api = FakeSource::api(&[
        (1204, Answer::Draw),
        (1205, Answer::NotPublished),
        (1206, Answer::Draw),
    ]);
    let calls = api.calls();
    let r = reconciler(vec![boxed(api)], "2026-01-10", SyncMode::Sequential);

    let report = r.reconcile(1203).await;

    assert_eq!(rounds(&report.records), vec![1204]);
    assert_eq!(report.halt, Some(Halt::NotAvailable(1205)));
    assert!(!report.halted_on_transport());
    assert_eq!(
        *calls.lock().unwrap(),
        vec![FetchTarget::Round(1204), FetchTarget::Round(1205)]
    );
}

#[tokio::test]
async fn test_transport_failure_is_distinguished_from_not_drawn() {
    let api = FakeSource::api(&[(1204, Answer::Down), (1205, Answer::Draw)]);
    let r = reconciler(vec![boxed(api)], "2026-01-10", SyncMode::Sequential);

    let report = r.reconcile(1203).await;

    assert!(report.is_empty());
    assert!(report.halted_on_transport());
    assert!(matches!(report.halt, Some(Halt::Transport { round: 1204, .. })));
}

#[tokio::test]
async fn test_unparsable_round_is_skipped_without_retry() {
    let api = FakeSource::api(&[(1205, Answer::Garbage), (1206, Answer::Draw)]);
    let calls = api.calls();
    let r = reconciler(vec![boxed(api)], "2026-01-10", SyncMode::Sequential);

    let report = r.reconcile(1204).await;

    assert!(report.is_empty());
    assert_eq!(report.halt, Some(Halt::NotAvailable(1205)));
    assert_eq!(*calls.lock().unwrap(), vec![FetchTarget::Round(1205)]);
}

#[tokio::test]
async fn test_cursor_at_expected_round_fetches_nothing() {
    let api = FakeSource::api(&[(1207, Answer::Draw)]);
    let calls = api.calls();
    let r = reconciler(vec![boxed(api)], "2026-01-10", SyncMode::Sequential);

    let report = r.reconcile(1206).await;

    assert!(report.is_empty());
    assert_eq!(report.halt, Some(Halt::UpToDate));
    assert!(calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_later_source_fills_in_when_first_is_down() {
    let primary = FakeSource::api(&[(1206, Answer::Down)]).named("primary");
    let secondary = FakeSource::api(&[(1206, Answer::Draw)]).named("secondary");
    let r = reconciler(vec![boxed(primary), boxed(secondary)], "2026-01-10", SyncMode::Sequential);

    let report = r.reconcile(1205).await;

    assert_eq!(rounds(&report.records), vec![1206]);
    assert_eq!(report.attempts.len(), 2);
    assert_eq!(report.attempts[1].source, "secondary");
}

#[tokio::test]
async fn test_latest_first_fills_intermediate_rounds_and_tolerates_gaps() {
    let api = FakeSource::api(&[(1205, Answer::Draw), (1206, Answer::Down)]);
    let search = FakeSource::search(1207, Answer::Draw);
    let api_calls = api.calls();
    let r = reconciler(vec![boxed(api), boxed(search)], "2026-01-17", SyncMode::LatestFirst);

    let report = r.reconcile(1204).await;

    assert_eq!(report.mode, SyncMode::LatestFirst);
    assert_eq!(rounds(&report.records), vec![1207, 1205]);
    assert_eq!(report.gaps, vec![1206]);
    // The latest round comes from the search page, never asked of the API.
    assert!(!api_calls.lock().unwrap().contains(&FetchTarget::Round(1207)));
}

#[tokio::test]
async fn test_latest_first_falls_back_when_search_fails() {
    let api = FakeSource::api(&[(1205, Answer::Draw), (1206, Answer::Draw)]);
    let search = FakeSource::search(0, Answer::Down);
    let r = reconciler(vec![boxed(api), boxed(search)], "2026-01-10", SyncMode::LatestFirst);

    let report = r.reconcile(1204).await;

    assert_eq!(report.mode, SyncMode::Sequential);
    assert_eq!(rounds(&report.records), vec![1206, 1205]);
}

#[tokio::test]
async fn test_latest_first_falls_back_when_nothing_is_newer() {
    let api = FakeSource::api(&[]);
    let search = FakeSource::search(1206, Answer::Draw);
    let r = reconciler(vec![boxed(api), boxed(search)], "2026-01-10", SyncMode::LatestFirst);

    let report = r.reconcile(1206).await;

    assert_eq!(report.mode, SyncMode::Sequential);
    assert!(report.is_empty());
}

#[tokio::test]
async fn test_latest_first_ignores_round_past_the_calendar() {
    let api = FakeSource::api(&[]);
    let search = FakeSource::search(5000, Answer::Draw);
    let api_calls = api.calls();
    let r = reconciler(vec![boxed(api), boxed(search)], "2026-01-10", SyncMode::LatestFirst);

    let report = r.reconcile(1206).await;

    assert_eq!(report.mode, SyncMode::Sequential);
    assert!(report.is_empty());
    assert!(report.gaps.is_empty());
    assert_eq!(report.halt, Some(Halt::UpToDate));
    assert!(api_calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_latest_first_past_the_calendar_still_scans_sequentially() {
    let api = FakeSource::api(&[(1205, Answer::Draw), (1206, Answer::Draw)]);
    let search = FakeSource::search(1300, Answer::Draw);
    let api_calls = api.calls();
    let r = reconciler(vec![boxed(api), boxed(search)], "2026-01-10", SyncMode::LatestFirst);

    let report = r.reconcile(1204).await;

    assert_eq!(report.mode, SyncMode::Sequential);
    assert_eq!(rounds(&report.records), vec![1206, 1205]);
    assert_eq!(
        *api_calls.lock().unwrap(),
        vec![FetchTarget::Round(1205), FetchTarget::Round(1206)]
    );
}

#[tokio::test]
async fn test_no_round_source_is_reported() {
    let search = FakeSource::search(0, Answer::Down);
    let r = reconciler(vec![boxed(search)], "2026-01-10", SyncMode::Sequential);

    let report = r.reconcile(1205).await;

    assert_eq!(report.halt, Some(Halt::NoRoundSource));
}
