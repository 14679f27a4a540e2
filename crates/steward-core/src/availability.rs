//! Time blocks and the availability matcher.
//!
//! Each participant offers, per date, a list of time blocks such as
//! `9:00 - 10:00`. The matcher intersects those offers and picks the earliest
//! date, then the earliest block on that date, that everyone can attend.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::defaults::{GRID_BLOCKS, GRID_START_HOUR};
use crate::models::DayAvailability;

static BLOCK_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\d{1,2}):(\d{2})\s*-\s*(\d{1,2}):(\d{2})\s*$").unwrap());

/// A half-open time range on some day, labelled `H:MM - H:MM`.
///
/// Ordered by start time, then end time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimeBlock {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TimeBlock {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Option<Self> {
        (start < end).then_some(Self { start, end })
    }

    /// One-hour block starting at `hour`.
    pub fn hour(hour: u32) -> Option<Self> {
        Self::new(
            NaiveTime::from_hms_opt(hour, 0, 0)?,
            NaiveTime::from_hms_opt(hour + 1, 0, 0)?,
        )
    }

    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for TimeBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{:02} - {}:{:02}",
            self.start.hour(),
            self.start.minute(),
            self.end.hour(),
            self.end.minute()
        )
    }
}

impl FromStr for TimeBlock {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || format!("invalid time block '{}', expected H:MM - H:MM", s);
        let caps = BLOCK_LABEL.captures(s).ok_or_else(invalid)?;
        let part = |i: usize| caps[i].parse::<u32>().map_err(|_| invalid());
        let start = NaiveTime::from_hms_opt(part(1)?, part(2)?, 0).ok_or_else(invalid)?;
        let end = NaiveTime::from_hms_opt(part(3)?, part(4)?, 0).ok_or_else(invalid)?;
        TimeBlock::new(start, end).ok_or_else(invalid)
    }
}

impl Serialize for TimeBlock {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimeBlock {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

/// The standard grid offered to users: nine one-hour blocks from 9:00 to 18:00.
pub fn standard_time_blocks() -> Vec<TimeBlock> {
    (0..GRID_BLOCKS)
        .filter_map(|i| TimeBlock::hour(GRID_START_HOUR + i))
        .collect()
}

/// The slot chosen by [`find_common_slot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SlotMatch {
    pub date: NaiveDate,
    pub block: TimeBlock,
}

impl SlotMatch {
    /// Meeting start: the matched date at the block's start time.
    pub fn start(&self) -> NaiveDateTime {
        self.date.and_time(self.block.start)
    }
}

/// Find the earliest slot every submission offers.
///
/// A date survives only if every submission lists it and the blocks offered
/// on it still intersect. Dates are scanned chronologically and the earliest
/// block by start time wins, so the result does not depend on the order of
/// submissions. Returns `None` when nothing is shared or there are no
/// submissions.
pub fn find_common_slot<'a, I>(submissions: I) -> Option<SlotMatch>
where
    I: IntoIterator<Item = &'a DayAvailability>,
{
    let mut submissions = submissions.into_iter();
    let first = submissions.next()?;

    let mut common: BTreeMap<NaiveDate, BTreeSet<TimeBlock>> = first
        .iter()
        .map(|(date, blocks)| (*date, blocks.iter().copied().collect()))
        .collect();

    for submission in submissions {
        common.retain(|date, blocks| match submission.get(date) {
            Some(offered) => {
                blocks.retain(|b| offered.contains(b));
                tracing::trace!(
                    subsystem = "scheduling",
                    component = "matcher",
                    date = %date,
                    remaining = blocks.len(),
                    "Intersected date"
                );
                !blocks.is_empty()
            }
            None => false,
        });
        if common.is_empty() {
            return None;
        }
    }

    common.into_iter().find_map(|(date, blocks)| {
        blocks
            .into_iter()
            .next()
            .map(|block| SlotMatch { date, block })
    })
}

/// Check a submitted availability map: at least one date, every date with at
/// least one block. Duplicate blocks on a date are collapsed.
pub fn validate_availability(availability: &DayAvailability) -> Result<DayAvailability, String> {
    if availability.is_empty() {
        return Err("availability must include at least one date".to_string());
    }
    let mut cleaned = DayAvailability::new();
    for (date, blocks) in availability {
        let set: BTreeSet<TimeBlock> = blocks.iter().copied().collect();
        if set.is_empty() {
            return Err(format!("no time blocks offered for {}", date));
        }
        cleaned.insert(*date, set.into_iter().collect());
    }
    Ok(cleaned)
}
