//! # Draw records
//!
//! A [`DrawRecord`] can only be built through [`DrawRecord::new`] (or by
//! deserialising, which goes through the same checks), so every record in
//! memory holds exactly six distinct numbers in `1..=45`, sorted ascending.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ExtractError;

/// Sequential identifier of one weekly draw.
pub type Round = u32;

pub const MIN_NUMBER: u8 = 1;
pub const MAX_NUMBER: u8 = 45;
pub const NUMBERS_PER_DRAW: usize = 6;

/// What a source is asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchTarget {
    Round(Round),
    Latest,
}

impl fmt::Display for FetchTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchTarget::Round(r) => write!(f, "round {}", r),
            FetchTarget::Latest => f.write_str("latest round"),
        }
    }
}

/// Bonus number of a draw. Scraped sources do not always expose it.
///
/// Persisted as an integer where `0` means [`Bonus::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Bonus {
    Known(u8),
    #[default]
    Unknown,
}

impl Bonus {
    pub fn value(self) -> Option<u8> {
        match self {
            Bonus::Known(n) => Some(n),
            Bonus::Unknown => None,
        }
    }

    pub fn is_known(self) -> bool {
        matches!(self, Bonus::Known(_))
    }

    fn to_wire(self) -> u8 {
        self.value().unwrap_or(0)
    }
}

impl Serialize for Bonus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.to_wire())
    }
}

impl<'de> Deserialize<'de> for Bonus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = u8::deserialize(deserializer)?;
        match raw {
            0 => Ok(Bonus::Unknown),
            n if (MIN_NUMBER..=MAX_NUMBER).contains(&n) => Ok(Bonus::Known(n)),
            n => Err(serde::de::Error::custom(format!(
                "bonus {} is outside 0..=45",
                n
            ))),
        }
    }
}

/// One validated draw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "WireDrawRecord", into = "WireDrawRecord")]
pub struct DrawRecord {
    round: Round,
    numbers: [u8; NUMBERS_PER_DRAW],
    bonus: Bonus,
    date: NaiveDate,
}

impl DrawRecord {
    /// Validates and normalises a draw.
    ///
    /// `numbers` may come in any order; the record keeps them sorted. A bonus
    /// that is out of range or repeats a main number is rejected.
    pub fn new(
        round: i64,
        numbers: &[i64],
        bonus: Option<i64>,
        date: NaiveDate,
    ) -> Result<Self, ExtractError> {
        let round = Round::try_from(round)
            .ok()
            .filter(|r| *r > 0)
            .ok_or(ExtractError::InvalidRound(round))?;

        let numbers = normalize_numbers(numbers)?;

        let bonus = match bonus {
            None => Bonus::Unknown,
            Some(b) => {
                let valid = u8::try_from(b)
                    .ok()
                    .filter(|n| (MIN_NUMBER..=MAX_NUMBER).contains(n))
                    .filter(|n| !numbers.contains(n));
                match valid {
                    Some(n) => Bonus::Known(n),
                    None => return Err(ExtractError::InvalidBonus(b)),
                }
            }
        };

        Ok(Self {
            round,
            numbers,
            bonus,
            date,
        })
    }

    pub fn round(&self) -> Round {
        self.round
    }

    /// Main numbers, ascending.
    pub fn numbers(&self) -> &[u8; NUMBERS_PER_DRAW] {
        &self.numbers
    }

    pub fn bonus(&self) -> Bonus {
        self.bonus
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }
}

impl fmt::Display for DrawRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} ({}) {:?}", self.round, self.date, self.numbers)?;
        match self.bonus {
            Bonus::Known(b) => write!(f, " + {}", b),
            Bonus::Unknown => f.write_str(" + ?"),
        }
    }
}

/// Checks that `raw` holds exactly six distinct values in `1..=45` and
/// returns them sorted.
pub fn normalize_numbers(raw: &[i64]) -> Result<[u8; NUMBERS_PER_DRAW], ExtractError> {
    let invalid = || ExtractError::InvalidNumbers(raw.to_vec());
    if raw.len() != NUMBERS_PER_DRAW {
        return Err(invalid());
    }

    let mut numbers = [0u8; NUMBERS_PER_DRAW];
    for (slot, value) in numbers.iter_mut().zip(raw) {
        *slot = u8::try_from(*value)
            .ok()
            .filter(|n| (MIN_NUMBER..=MAX_NUMBER).contains(n))
            .ok_or_else(invalid)?;
    }
    numbers.sort_unstable();
    if numbers.windows(2).any(|w| w[0] == w[1]) {
        return Err(invalid());
    }
    Ok(numbers)
}

/// On-disk shape of a record.
#[derive(Serialize, Deserialize)]
struct WireDrawRecord {
    round: i64,
    numbers: Vec<i64>,
    bonus: Bonus,
    date: NaiveDate,
}

impl TryFrom<WireDrawRecord> for DrawRecord {
    type Error = ExtractError;

    fn try_from(wire: WireDrawRecord) -> Result<Self, Self::Error> {
        DrawRecord::new(
            wire.round,
            &wire.numbers,
            wire.bonus.value().map(i64::from),
            wire.date,
        )
    }
}

impl From<DrawRecord> for WireDrawRecord {
    fn from(record: DrawRecord) -> Self {
        Self {
            round: i64::from(record.round),
            numbers: record.numbers.iter().map(|n| i64::from(*n)).collect(),
            bonus: record.bonus,
            date: record.date,
        }
    }
}
