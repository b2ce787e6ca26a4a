//! # Markup extraction
//!
//! Best-effort parsing of a search results page. Ball numbers are read by an
//! ordered list of independent strategies; the first one that yields exactly
//! six valid numbers wins. Each strategy is a plain function so it can be
//! tested against a snippet in isolation.
//!
//! The bonus is optional all the way through: a page without a readable bonus
//! still produces a record, with [`Bonus::Unknown`](crate::draw::Bonus::Unknown).

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};

use crate::calendar::DrawCalendar;
use crate::draw::{normalize_numbers, DrawRecord, Round, MAX_NUMBER, MIN_NUMBER, NUMBERS_PER_DRAW};
use crate::error::ExtractError;

/// Ball values read by one strategy, before validation into a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BallReading {
    pub numbers: Vec<i64>,
    pub bonus: Option<i64>,
}

pub type BallStrategy = fn(&Html) -> Option<BallReading>;

/// Tried in order.
pub const BALL_STRATEGIES: &[(&str, BallStrategy)] = &[
    ("winning-ball selector", winning_ball_selector),
    ("ball-class selector", ball_class_selector),
    ("text pattern", text_pattern),
];

const MAIN_BALL_SELECTOR: &str = ".win_ball .ball";
const BONUS_BALL_SELECTOR: &str = ".bonus_ball .ball";
const ANY_BALL_SELECTOR: &str = "span.ball_645";
const ROUND_SELECTORS: &[&str] = &["._lotto-btn-current em", ".win_result h4 strong", "[data-round]"];

static SIX_NUMBERS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?:^|\D)(\d{1,2})[\s,]+(\d{1,2})[\s,]+(\d{1,2})[\s,]+(\d{1,2})[\s,]+(\d{1,2})[\s,]+(\d{1,2})(?:\D|$)",
    )
    .expect("six-number pattern is valid")
});

static BONUS_LABEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:보너스|bonus)\D{0,20}?(\d{1,2})(?:\D|$)").expect("bonus pattern is valid")
});

static ROUND_LABEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:(\d{1,5})\s*회|round\s*#?\s*(\d{1,5}))").expect("round pattern is valid")
});

static DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").expect("digit pattern is valid"));

/// Parses a search results page into a record. `date` is derived from the
/// round through `calendar`, since the page may not show it.
pub fn extract_markup_record(
    body: &str,
    calendar: &DrawCalendar,
) -> Result<DrawRecord, ExtractError> {
    let doc = Html::parse_document(body);

    let reading = BALL_STRATEGIES
        .iter()
        .find_map(|(name, strategy)| {
            let reading = strategy(&doc)?;
            debug!("ball strategy '{}' matched {:?}", name, reading);
            Some(reading)
        })
        .ok_or(ExtractError::NoStrategyMatched)?;

    let round = extract_round(&doc).ok_or(ExtractError::MissingField("round"))?;
    let date = Round::try_from(round)
        .ok()
        .filter(|r| *r > 0)
        .and_then(|r| calendar.date_of(r))
        .ok_or(ExtractError::InvalidRound(round))?;

    let bonus = reading
        .bonus
        .or_else(|| bonus_from_text(&document_text(&doc)));
    let bonus = usable_bonus(&reading.numbers, bonus);

    DrawRecord::new(round, &reading.numbers, bonus, date)
}

/// Main balls under the winning-number block, bonus under its own block.
pub fn winning_ball_selector(doc: &Html) -> Option<BallReading> {
    let main = Selector::parse(MAIN_BALL_SELECTOR).ok()?;
    let numbers = six_numbers(doc.select(&main).filter_map(|el| parse_int(&el.text().collect::<String>())))?;

    let bonus = Selector::parse(BONUS_BALL_SELECTOR).ok().and_then(|sel| {
        doc.select(&sel)
            .find_map(|el| parse_int(&el.text().collect::<String>()))
    });

    Some(BallReading { numbers, bonus })
}

/// Every `ball_645` span in document order; a seventh one is the bonus.
pub fn ball_class_selector(doc: &Html) -> Option<BallReading> {
    let sel = Selector::parse(ANY_BALL_SELECTOR).ok()?;
    let values: Vec<i64> = doc
        .select(&sel)
        .filter_map(|el| parse_int(&el.text().collect::<String>()))
        .collect();

    if values.len() != NUMBERS_PER_DRAW && values.len() != NUMBERS_PER_DRAW + 1 {
        return None;
    }
    let numbers = six_numbers(values[..NUMBERS_PER_DRAW].iter().copied())?;
    let bonus = values.get(NUMBERS_PER_DRAW).copied();
    Some(BallReading { numbers, bonus })
}

/// First run of six valid numbers in the visible text, followed by a
/// labelled bonus if one appears after it.
pub fn text_pattern(doc: &Html) -> Option<BallReading> {
    let text = document_text(doc);
    SIX_NUMBERS.captures_iter(&text).find_map(|caps| {
        let values = (1..=NUMBERS_PER_DRAW).filter_map(|i| caps.get(i)).filter_map(|m| parse_int(m.as_str()));
        let numbers = six_numbers(values)?;
        let tail = caps.get(0).map(|m| &text[m.end()..]).unwrap_or_default();
        Some(BallReading {
            numbers,
            bonus: bonus_from_text(tail),
        })
    })
}

fn extract_round(doc: &Html) -> Option<i64> {
    for raw in ROUND_SELECTORS {
        let Ok(sel) = Selector::parse(raw) else { continue };
        for el in doc.select(&sel) {
            let from_attr = el.value().attr("data-round").and_then(parse_int);
            let found = from_attr.or_else(|| {
                let text = el.text().collect::<String>();
                DIGITS.find(&text).and_then(|m| parse_int(m.as_str()))
            });
            if let Some(round) = found.filter(|r| *r > 0) {
                return Some(round);
            }
        }
    }

    let text = document_text(doc);
    ROUND_LABEL.captures_iter(&text).find_map(|caps| {
        caps.get(1)
            .or_else(|| caps.get(2))
            .and_then(|m| parse_int(m.as_str()))
            .filter(|r| *r > 0)
    })
}

fn bonus_from_text(text: &str) -> Option<i64> {
    BONUS_LABEL
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| parse_int(m.as_str()))
}

/// Drops a bonus the record would reject, instead of failing the whole draw.
fn usable_bonus(numbers: &[i64], bonus: Option<i64>) -> Option<i64> {
    bonus.filter(|b| {
        (i64::from(MIN_NUMBER)..=i64::from(MAX_NUMBER)).contains(b) && !numbers.contains(b)
    })
}

fn six_numbers(values: impl Iterator<Item = i64>) -> Option<Vec<i64>> {
    let values: Vec<i64> = values.collect();
    normalize_numbers(&values).ok()?;
    Some(values)
}

fn parse_int(raw: &str) -> Option<i64> {
    raw.trim().parse().ok()
}

fn document_text(doc: &Html) -> String {
    doc.root_element()
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
