//! # Dataset Store
//!
//! The persisted history is one JSON file:
//!
//! ```json
//! { "latestRound": 1206, "lastUpdate": "2026-01-10",
//!   "data": [ { "round": 1206, "numbers": [1, 3, 17, 26, 27, 42], "bonus": 23, "date": "2026-01-10" } ] }
//! ```
//!
//! `data` is strictly descending by round. Loading refuses a file that breaks
//! that, and saving goes through a temp file in the same directory followed by
//! a rename, so readers never see a half-written dataset.

use chrono::NaiveDate;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io::Write;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

use crate::calendar::DrawCalendar;
use crate::draw::{DrawRecord, Round};
use crate::error::StoreError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub latest_round: Round,
    pub last_update: NaiveDate,
    pub data: Vec<DrawRecord>,
}

/// Something `check` found wrong with a dataset that still loads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Finding {
    /// Runs of rounds absent between the oldest and newest stored round, ascending.
    MissingRounds(Vec<RangeInclusive<Round>>),
    /// Stored date disagrees with the draw calendar.
    DateMismatch { round: Round, stored: NaiveDate, expected: NaiveDate },
    /// Round so large the calendar cannot date it.
    RoundOutOfCalendar(Round),
    /// Draws persisted with bonus 0.
    UnknownBonus(Vec<Round>),
}

impl Finding {
    /// Whether the dataset is actually wrong. An unknown bonus is still a usable draw.
    pub fn is_problem(&self) -> bool {
        !matches!(self, Finding::UnknownBonus(_))
    }

    /// Number of rounds missing across all runs.
    pub fn missing_count(ranges: &[RangeInclusive<Round>]) -> u64 {
        ranges
            .iter()
            .map(|r| u64::from(r.end() - r.start()) + 1)
            .sum()
    }
}

impl Dataset {
    pub fn empty(today: NaiveDate) -> Self {
        Self {
            latest_round: 0,
            last_update: today,
            data: Vec::new(),
        }
    }

    /// Rounds already present. Fetching starts right after it.
    pub fn cursor(&self) -> Round {
        self.latest_round
    }

    /// Hard invariants: strictly descending rounds and a matching `latestRound`.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(pair) = self.data.windows(2).find(|w| w[0].round() <= w[1].round()) {
            return Err(format!(
                "rounds not strictly descending at {} -> {}",
                pair[0].round(),
                pair[1].round()
            ));
        }
        if let Some(first) = self.data.first() {
            if first.round() != self.latest_round {
                return Err(format!(
                    "latestRound is {} but newest record is round {}",
                    self.latest_round,
                    first.round()
                ));
            }
        }
        Ok(())
    }

    /// Prepends `records` and moves the cursor. Rounds already stored are
    /// dropped. Returns how many records were added.
    pub fn merge(&mut self, records: Vec<DrawRecord>, today: NaiveDate) -> usize {
        let mut seen: HashSet<Round> = self.data.iter().map(DrawRecord::round).collect();
        let mut fresh: Vec<DrawRecord> = records
            .into_iter()
            .filter(|r| seen.insert(r.round()))
            .collect();

        if fresh.is_empty() {
            return 0;
        }
        let added = fresh.len();

        fresh.sort_by(|a, b| b.round().cmp(&a.round()));
        fresh.append(&mut self.data);
        self.data = fresh;

        // Only a record older than the cursor can break the order.
        if self.data.windows(2).any(|w| w[0].round() < w[1].round()) {
            self.data.sort_by(|a, b| b.round().cmp(&a.round()));
        }

        self.latest_round = self.data[0].round();
        self.last_update = today;
        debug!("merged {} records, latest round is now {}", added, self.latest_round);
        added
    }

    /// Soft checks that do not stop the dataset from loading.
    pub fn check(&self, calendar: &DrawCalendar) -> Vec<Finding> {
        let mut findings = Vec::new();

        let mut rounds: Vec<Round> = self.data.iter().map(DrawRecord::round).collect();
        rounds.sort_unstable();
        rounds.dedup();
        let missing: Vec<RangeInclusive<Round>> = rounds
            .windows(2)
            .filter(|w| w[1] - w[0] > 1)
            .map(|w| w[0] + 1..=w[1] - 1)
            .collect();
        if !missing.is_empty() {
            findings.push(Finding::MissingRounds(missing));
        }

        for record in &self.data {
            match calendar.date_of(record.round()) {
                Some(expected) if record.date() != expected => findings.push(Finding::DateMismatch {
                    round: record.round(),
                    stored: record.date(),
                    expected,
                }),
                Some(_) => {}
                None => findings.push(Finding::RoundOutOfCalendar(record.round())),
            }
        }

        let unknown: Vec<Round> = self
            .data
            .iter()
            .filter(|r| !r.bonus().is_known())
            .map(DrawRecord::round)
            .collect();
        if !unknown.is_empty() {
            findings.push(Finding::UnknownBonus(unknown));
        }

        findings
    }
}

#[derive(Debug, Clone)]
pub struct DatasetStore {
    path: PathBuf,
}

impl DatasetStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Dataset, StoreError> {
        if !self.path.exists() {
            return Err(StoreError::Missing(self.path.clone()));
        }
        let raw = std::fs::read_to_string(&self.path).map_err(|source| StoreError::Unreadable {
            path: self.path.clone(),
            source,
        })?;
        let dataset: Dataset = serde_json::from_str(&raw).map_err(|e| self.corrupt(e))?;
        dataset.validate().map_err(|e| self.corrupt(e))?;

        info!(
            "📂 Loaded {} draws from {} (latest round {})",
            dataset.data.len(),
            self.path.display(),
            dataset.latest_round
        );
        Ok(dataset)
    }

    /// Replaces the file in one rename.
    pub fn save(&self, dataset: &Dataset) -> Result<(), StoreError> {
        let write_err = |source: std::io::Error| StoreError::Write {
            path: self.path.clone(),
            source,
        };

        let json = serde_json::to_string_pretty(dataset)
            .map_err(|e| write_err(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))?;

        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
        tmp.write_all(json.as_bytes()).map_err(write_err)?;
        // The temp file is owner-only; keep whatever mode the dataset already had.
        if let Ok(meta) = std::fs::metadata(&self.path) {
            tmp.as_file().set_permissions(meta.permissions()).map_err(write_err)?;
        }
        tmp.as_file().sync_all().map_err(write_err)?;
        tmp.persist(&self.path).map_err(|e| write_err(e.error))?;

        info!("💾 Saved {} draws to {}", dataset.data.len(), self.path.display());
        Ok(())
    }

    fn corrupt(&self, reason: impl std::fmt::Display) -> StoreError {
        StoreError::Corrupt {
            path: self.path.clone(),
            reason: reason.to_string(),
        }
    }
}
