//! Expected elapsed time for a sequence of timed items.
//!
//! The same per-item formula backs warm-up budgeting, the session's
//! total countdown, and skip bookkeeping.

use crate::TimedItem;

/// Seconds one item takes from its first rep to its last, excluding prep.
/// Saturates at `u32::MAX`.
///
/// `sets * (reps*work + (reps-1)*rest_rep) + (sets-1)*rest_set`
pub fn item_seconds(item: &TimedItem) -> u32 {
    if !item.is_valid() {
        return 0;
    }
    let per_set = item
        .reps
        .saturating_mul(item.work_seconds)
        .saturating_add(item.reps.saturating_sub(1).saturating_mul(item.rest_between_reps));
    item.sets
        .saturating_mul(per_set)
        .saturating_add(item.sets.saturating_sub(1).saturating_mul(item.rest_between_sets))
}

/// Total expected session length, prep included.
///
/// Prep is charged before every valid item, the first one included.
/// Invalid items contribute nothing, and an empty (or all-invalid) list
/// estimates to zero.
pub fn estimate_total(items: &[TimedItem], prep_seconds: u32) -> u32 {
    let valid: Vec<&TimedItem> = items.iter().filter(|i| i.is_valid()).collect();
    if valid.is_empty() {
        return 0;
    }

    let mut total = prep_seconds;
    for (idx, item) in valid.iter().enumerate() {
        total = total.saturating_add(item_seconds(item));
        if idx + 1 < valid.len() {
            total = total.saturating_add(prep_seconds);
        }
    }
    total
}
