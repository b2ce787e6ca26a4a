//! Number statistics over the stored history.
//!
//! Each number 1..=45 gets three min-max normalised components:
//!
//! - frequency over the whole history, weighted 35
//! - appearances in the 10 most recent draws, weighted 35
//! - a first-order transition score: how often the number followed the
//!   numbers of the latest draw in consecutive weeks, weighted 30
//!
//! [`best_combinations`] then picks the highest scoring balanced tickets from
//! the top of that ranking.

use crate::draw::{DrawRecord, MAX_NUMBER, MIN_NUMBER, NUMBERS_PER_DRAW};

pub const FREQUENCY_WEIGHT: f64 = 35.0;
pub const RECENT_WEIGHT: f64 = 35.0;
pub const TRANSITION_WEIGHT: f64 = 30.0;
pub const RECENT_WINDOW: usize = 10;

/// Best ranked numbers that combinations are drawn from.
pub const COMBINATION_POOL: usize = 20;
pub const TOP_COMBINATIONS: usize = 5;

const LOW_HALF_MAX: u8 = 22;
const BALANCED_COUNT: std::ops::RangeInclusive<usize> = 2..=4;
const BALANCED_SUM: std::ops::RangeInclusive<u32> = 100..=170;

const SLOTS: usize = MAX_NUMBER as usize + 1;

#[derive(Debug, Clone, PartialEq)]
pub struct NumberScore {
    pub number: u8,
    pub appearances: u32,
    pub recent_appearances: u32,
    pub transitions: u32,
    pub frequency: f64,
    pub recent: f64,
    pub transition: f64,
    pub total: f64,
}

/// Scores every number. `history` must be descending by round, as stored.
/// Returns the numbers best first; empty for an empty history.
pub fn score_numbers(history: &[DrawRecord]) -> Vec<NumberScore> {
    if history.is_empty() {
        return Vec::new();
    }

    let mut appearances = [0u32; SLOTS];
    for draw in history {
        for n in draw.numbers() {
            appearances[*n as usize] += 1;
        }
    }

    let mut recent = [0u32; SLOTS];
    for draw in history.iter().take(RECENT_WINDOW) {
        for n in draw.numbers() {
            recent[*n as usize] += 1;
        }
    }

    // transition[from][to]: `to` drawn the week after `from`
    let mut transition = vec![[0u32; SLOTS]; SLOTS];
    for pair in history.windows(2) {
        let (next_week, this_week) = (&pair[0], &pair[1]);
        for from in this_week.numbers() {
            for to in next_week.numbers() {
                transition[*from as usize][*to as usize] += 1;
            }
        }
    }
    let latest = history[0].numbers();
    let mut transitions = [0u32; SLOTS];
    for (to, slot) in transitions.iter_mut().enumerate() {
        *slot = latest.iter().map(|from| transition[*from as usize][to]).sum();
    }

    let (freq_min, freq_max) = bounds(&appearances);
    let (_, recent_max) = bounds(&recent);
    let (trans_min, trans_max) = bounds(&transitions);

    let mut scores: Vec<NumberScore> = (MIN_NUMBER..=MAX_NUMBER)
        .map(|number| {
            let i = number as usize;
            let frequency = if freq_max > freq_min {
                f64::from(appearances[i] - freq_min) / f64::from(freq_max - freq_min) * FREQUENCY_WEIGHT
            } else {
                FREQUENCY_WEIGHT / 2.0
            };
            let recent_score = if recent_max > 0 {
                f64::from(recent[i]) / f64::from(recent_max) * RECENT_WEIGHT
            } else {
                0.0
            };
            let transition_score = if trans_max > trans_min {
                f64::from(transitions[i] - trans_min) / f64::from(trans_max - trans_min) * TRANSITION_WEIGHT
            } else {
                0.0
            };
            NumberScore {
                number,
                appearances: appearances[i],
                recent_appearances: recent[i],
                transitions: transitions[i],
                frequency,
                recent: recent_score,
                transition: transition_score,
                total: frequency + recent_score + transition_score,
            }
        })
        .collect();

    scores.sort_by(|a, b| b.total.total_cmp(&a.total).then(a.number.cmp(&b.number)));
    scores
}

/// One candidate ticket, numbers ascending.
#[derive(Debug, Clone, PartialEq)]
pub struct Combination {
    pub numbers: [u8; NUMBERS_PER_DRAW],
    pub score: f64,
}

impl Combination {
    pub fn sum(&self) -> u32 {
        self.numbers.iter().map(|n| u32::from(*n)).sum()
    }

    pub fn odd_count(&self) -> usize {
        self.numbers.iter().filter(|n| *n % 2 == 1).count()
    }

    /// Odd to even ratio, e.g. `3:3`.
    pub fn odd_even(&self) -> String {
        let odd = self.odd_count();
        format!("{}:{}", odd, NUMBERS_PER_DRAW - odd)
    }
}

/// Two to four odd numbers, two to four numbers up to 22, sum within 100..=170.
pub fn is_balanced(numbers: &[u8]) -> bool {
    let odd = numbers.iter().filter(|n| *n % 2 == 1).count();
    let low = numbers.iter().filter(|n| **n <= LOW_HALF_MAX).count();
    let sum: u32 = numbers.iter().map(|n| u32::from(*n)).sum();
    BALANCED_COUNT.contains(&odd) && BALANCED_COUNT.contains(&low) && BALANCED_SUM.contains(&sum)
}

/// Highest scoring balanced 6-number combinations from the top of `ranked`
/// (as returned by [`score_numbers`]). A `lucky` number in 1..=45 joins the
/// pool and must appear in every combination; anything else is ignored.
pub fn best_combinations(ranked: &[NumberScore], lucky: Option<u8>) -> Vec<Combination> {
    let mut totals = [0.0f64; SLOTS];
    for score in ranked {
        totals[score.number as usize] = score.total;
    }

    let lucky = lucky.filter(|n| (MIN_NUMBER..=MAX_NUMBER).contains(n));
    let mut pool: Vec<u8> = ranked.iter().take(COMBINATION_POOL).map(|s| s.number).collect();
    if pool.is_empty() {
        return Vec::new();
    }
    if let Some(n) = lucky {
        if !pool.contains(&n) {
            pool.push(n);
        }
    }

    let mut combos = Vec::new();
    let mut current = Vec::with_capacity(NUMBERS_PER_DRAW);
    collect_combinations(&pool, 0, &mut current, &mut |picked| {
        if !is_balanced(picked) || lucky.map_or(false, |n| !picked.contains(&n)) {
            return;
        }
        let mut numbers = [0u8; NUMBERS_PER_DRAW];
        numbers.copy_from_slice(picked);
        numbers.sort_unstable();
        let score = numbers.iter().map(|n| totals[*n as usize]).sum();
        combos.push(Combination { numbers, score });
    });

    combos.sort_by(|a, b| b.score.total_cmp(&a.score).then(a.numbers.cmp(&b.numbers)));
    combos.truncate(TOP_COMBINATIONS);
    combos
}

fn collect_combinations(pool: &[u8], start: usize, current: &mut Vec<u8>, emit: &mut impl FnMut(&[u8])) {
    if current.len() == NUMBERS_PER_DRAW {
        emit(current);
        return;
    }
    for i in start..pool.len() {
        current.push(pool[i]);
        collect_combinations(pool, i + 1, current, emit);
        current.pop();
    }
}

/// Min and max over the real numbers 1..=45 (slot 0 is unused).
fn bounds(counts: &[u32; SLOTS]) -> (u32, u32) {
    let real = &counts[MIN_NUMBER as usize..];
    let min = real.iter().copied().min().unwrap_or(0);
    let max = real.iter().copied().max().unwrap_or(0);
    (min, max)
}
