//! Collapsing repeated point samples into contiguous runs.

use chrono::{DateTime, TimeDelta, Utc};
use std::collections::BTreeMap;

use crate::monitorapi::{Condition, Interval, Intervals, Level};

/// Samples closer together than this many seconds belong to the same run.
pub const COALESCE_GAP_SECS: i64 = 5;

fn coalesce_gap() -> TimeDelta {
    TimeDelta::seconds(COALESCE_GAP_SECS)
}

/// Collapse point samples into runs, one signal (level, locator, message) at a time.
///
/// Walking a signal's samples in time order, a gap strictly shorter than
/// [`COALESCE_GAP_SECS`] extends the current run; a longer gap closes it as
/// `[run_start, last_sample]` and starts a new one.
///
/// A run made of a single sample has no end sample, so it is closed at
/// `run_start + COALESCE_GAP_SECS`. That end is an approximation: the signal may
/// have cleared anywhere inside the gap.
pub fn coalesce(samples: &Intervals) -> Intervals {
    let mut signals: BTreeMap<(Level, &str, &str), Vec<DateTime<Utc>>> = BTreeMap::new();
    for sample in samples {
        let c = &sample.condition;
        signals
            .entry((c.level, c.locator.as_str(), c.message.as_str()))
            .or_default()
            .push(sample.from);
    }

    let mut out = Intervals::new();
    for ((level, locator, message), mut times) in signals {
        times.sort();
        let condition = Condition::new(level, locator, message);

        let mut run: Option<(DateTime<Utc>, DateTime<Utc>)> = None;
        for t in times {
            run = match run {
                Some((start, last)) if t - last < coalesce_gap() => Some((start, t)),
                Some((start, last)) => {
                    out.push(close_run(&condition, start, last));
                    Some((t, t))
                }
                None => Some((t, t)),
            };
        }
        if let Some((start, last)) = run {
            out.push(close_run(&condition, start, last));
        }
    }

    out.sorted()
}

fn close_run(condition: &Condition, start: DateTime<Utc>, last: DateTime<Utc>) -> Interval {
    let end = if last == start { start + coalesce_gap() } else { last };
    Interval::closed(condition.clone(), start, end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn samples(locator: &str, times: &[i64]) -> Vec<Interval> {
        times
            .iter()
            .map(|t| Interval::instant(Condition::error(locator, "failing"), at(*t)))
            .collect()
    }

    #[test]
    fn test_two_runs() {
        let input: Intervals = samples("probe/x", &[0, 1, 2, 10, 11]).into();
        let runs = coalesce(&input);
        assert_eq!(runs.len(), 2);
        assert_eq!((runs.as_slice()[0].from, runs.as_slice()[0].to), (at(0), Some(at(2))));
        assert_eq!((runs.as_slice()[1].from, runs.as_slice()[1].to), (at(10), Some(at(11))));
    }

    #[test]
    fn test_gap_of_exactly_five_seconds_splits() {
        let input: Intervals = samples("probe/x", &[0, 1, 6, 7]).into();
        let runs = coalesce(&input);
        assert_eq!(runs.len(), 2);
        assert_eq!(runs.as_slice()[0].to, Some(at(1)));
        assert_eq!(runs.as_slice()[1].from, at(6));
    }

    #[test]
    fn test_single_sample_closed_synthetically() {
        let input: Intervals = samples("probe/x", &[20]).into();
        let runs = coalesce(&input);
        assert_eq!(runs.len(), 1);
        assert_eq!(runs.as_slice()[0].to, Some(at(25)));
    }

    #[test]
    fn test_signals_do_not_mix() {
        let mut input = samples("probe/a", &[0, 1]);
        input.extend(samples("probe/b", &[2, 3]));
        let runs = coalesce(&input.into());
        assert_eq!(runs.len(), 2);
        assert_eq!(runs.as_slice()[0].condition.locator, "probe/a");
        assert_eq!(runs.as_slice()[1].condition.locator, "probe/b");
    }

    #[test]
    fn test_unordered_input() {
        let input: Intervals = samples("probe/x", &[11, 0, 2, 10, 1]).into();
        let runs = coalesce(&input);
        assert_eq!(runs.len(), 2);
        assert_eq!(runs.as_slice()[0].to, Some(at(2)));
    }
}
