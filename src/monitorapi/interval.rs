//! Intervals and interval collections.
//!
//! # Range rule
//! `slice(from, to)` treats the query as half-open `[from, to)` and each interval
//! as closed `[a, b]` (an open interval has `b = +inf`). An interval is kept iff
//! `a < to && b >= from`:
//! - an instant at exactly `from` is kept, an instant at exactly `to` is not
//! - an interval that ends exactly at `from` is kept

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::sync::Arc;

use crate::monitorapi::condition::{Condition, Level};
use crate::monitorapi::locator::{locator_keys, KEY_DISRUPTION};

/// A condition with a time span. `to == None` while the interval is open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interval {
    #[serde(flatten)]
    pub condition: Condition,
    pub from: DateTime<Utc>,
    pub to: Option<DateTime<Utc>>,
}

impl Interval {
    /// An instantaneous event (`from == to`).
    pub fn instant(condition: Condition, at: DateTime<Utc>) -> Self {
        Self {
            condition,
            from: at,
            to: Some(at),
        }
    }

    /// An interval that has not been closed yet.
    pub fn open(condition: Condition, from: DateTime<Utc>) -> Self {
        Self {
            condition,
            from,
            to: None,
        }
    }

    /// A closed interval. `to` is clamped so that `to >= from` always holds.
    pub fn closed(condition: Condition, from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self {
            condition,
            from,
            to: Some(to.max(from)),
        }
    }

    pub fn is_open(&self) -> bool {
        self.to.is_none()
    }

    pub fn is_instant(&self) -> bool {
        self.to == Some(self.from)
    }

    /// Length of a closed interval; `None` while open.
    pub fn duration(&self) -> Option<TimeDelta> {
        self.to.map(|to| to - self.from)
    }

    /// Whether this interval overlaps the half-open range `[from, to)`.
    pub fn overlaps(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> bool {
        if self.from >= to {
            return false;
        }
        match self.to {
            Some(end) => end >= from,
            None => true,
        }
    }
}

/// Total order used for every sort of the timeline.
pub fn compare_intervals(a: &Interval, b: &Interval) -> Ordering {
    a.from
        .cmp(&b.from)
        .then_with(|| a.condition.locator.cmp(&b.condition.locator))
        .then_with(|| match (a.to, b.to) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| a.condition.level.cmp(&b.condition.level))
        .then_with(|| a.condition.message.cmp(&b.condition.message))
}

/// Shared, composable interval predicate.
pub type IntervalPredicate = Arc<dyn Fn(&Interval) -> bool + Send + Sync>;

pub fn and(a: IntervalPredicate, b: IntervalPredicate) -> IntervalPredicate {
    Arc::new(move |i| a(i) && b(i))
}

pub fn or(a: IntervalPredicate, b: IntervalPredicate) -> IntervalPredicate {
    Arc::new(move |i| a(i) || b(i))
}

pub fn not(a: IntervalPredicate) -> IntervalPredicate {
    Arc::new(move |i| !a(i))
}

pub fn is_level(level: Level) -> IntervalPredicate {
    Arc::new(move |i| i.condition.level == level)
}

pub fn is_locator(locator: impl Into<String>) -> IntervalPredicate {
    let locator = locator.into();
    Arc::new(move |i| i.condition.locator == locator)
}

pub fn has_locator_key(key: impl Into<String>) -> IntervalPredicate {
    let key = key.into();
    Arc::new(move |i| locator_keys(&i.condition.locator).contains_key(&key))
}

/// Intervals produced by disruption checks.
pub fn is_disruption() -> IntervalPredicate {
    has_locator_key(KEY_DISRUPTION)
}

pub fn is_instant() -> IntervalPredicate {
    Arc::new(|i| i.is_instant())
}

pub fn is_open() -> IntervalPredicate {
    Arc::new(|i| i.is_open())
}

/// An ordered collection of intervals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Intervals(Vec<Interval>);

impl Intervals {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, interval: Interval) {
        self.0.push(interval);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Interval> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[Interval] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<Interval> {
        self.0
    }

    /// Stable sort by `from`, ties broken by `compare_intervals`.
    pub fn sort(&mut self) {
        self.0.sort_by(compare_intervals);
    }

    pub fn sorted(mut self) -> Self {
        self.sort();
        self
    }

    /// Intervals overlapping `[from, to)`, in their current order.
    pub fn slice(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Intervals {
        self.0
            .iter()
            .filter(|i| i.overlaps(from, to))
            .cloned()
            .collect()
    }

    pub fn filter<F>(&self, predicate: F) -> Intervals
    where
        F: Fn(&Interval) -> bool,
    {
        self.0.iter().filter(|i| predicate(i)).cloned().collect()
    }

    /// Earliest `from` and latest known `to` (or `from` for open intervals).
    pub fn span(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let start = self.0.iter().map(|i| i.from).min()?;
        let end = self.0.iter().map(|i| i.to.unwrap_or(i.from)).max()?;
        Some((start, end))
    }
}

impl From<Vec<Interval>> for Intervals {
    fn from(v: Vec<Interval>) -> Self {
        Self(v)
    }
}

impl FromIterator<Interval> for Intervals {
    fn from_iter<T: IntoIterator<Item = Interval>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Intervals {
    type Item = Interval;
    type IntoIter = std::vec::IntoIter<Interval>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Intervals {
    type Item = &'a Interval;
    type IntoIter = std::slice::Iter<'a, Interval>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl Extend<Interval> for Intervals {
    fn extend<T: IntoIterator<Item = Interval>>(&mut self, iter: T) {
        self.0.extend(iter);
    }
}
