//! Merging of already-ordered interval batches.

use crate::monitorapi::interval::compare_intervals;
use crate::monitorapi::Intervals;

/// Concatenate `batches` and stable sort the result.
///
/// Batches are small compared to a whole run, so a plain sort is used instead
/// of a k-way merge.
pub fn merge<I>(batches: I) -> Intervals
where
    I: IntoIterator<Item = Intervals>,
{
    let mut merged: Vec<_> = batches.into_iter().flatten().collect();
    merged.sort_by(compare_intervals);
    merged.into()
}
