//! Exercise and warm-up selection.
//!
//! Exercises come straight from the catalog. Warm-ups are drawn from the pool
//! under a time budget with these rules:
//! 1. One finger/wrist item and one shoulder item when they fit
//! 2. General items fill whatever budget is left
//! 3. The selection never runs longer than the budget

use crate::duration::item_seconds;
use crate::{valid_items, Catalog, Filter, Result, TimedItem};
use rand::seq::SliceRandom;
use rand::Rng;

/// Tags that place a warm-up in the finger/wrist group
pub const FINGER_TAGS: [&str; 4] = ["finger", "finger_joints", "wrist", "grip_strength"];

/// Tags that place a warm-up in the shoulder/upper-back group
pub const SHOULDER_TAGS: [&str; 4] = ["scapula", "upper_back", "neck", "rotator_cuff"];

/// Share of the session spent warming up, as seconds per session minute (20%)
const WARMUP_SECONDS_PER_MINUTE: u32 = 12;
const MIN_WARMUP_SECONDS: u32 = 2 * 60;
const MAX_WARMUP_SECONDS: u32 = 10 * 60;

/// Coverage group of a warm-up candidate
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WarmupGroup {
    Fingers,
    Shoulders,
    General,
}

impl WarmupGroup {
    /// First match wins: fingers before shoulders before general
    pub fn of(item: &TimedItem) -> Self {
        if item.targets_any(&FINGER_TAGS) {
            WarmupGroup::Fingers
        } else if item.targets_any(&SHOULDER_TAGS) {
            WarmupGroup::Shoulders
        } else {
            WarmupGroup::General
        }
    }
}

/// Warm-up budget for a session: 20% of its length, kept within 2..=10 minutes
pub fn warmup_budget_seconds(session_minutes: u32) -> u32 {
    session_minutes
        .saturating_mul(WARMUP_SECONDS_PER_MINUTE)
        .clamp(MIN_WARMUP_SECONDS, MAX_WARMUP_SECONDS)
}

fn fits(total: u32, secs: u32, target_seconds: u32) -> bool {
    total.saturating_add(secs) <= target_seconds
}

/// Fetch the schedulable exercise list for a filter.
///
/// Lookup errors propagate unchanged; invalid items are dropped.
pub fn select_exercises(catalog: &Catalog, filter: &Filter) -> Result<Vec<TimedItem>> {
    let items = catalog.lookup(filter)?;
    let items = valid_items(items);
    tracing::info!(
        "Selected {} exercise(s) for {} / {} / {} min",
        items.len(),
        filter.protocol,
        filter.intensity,
        filter.duration
    );
    Ok(items)
}

/// Pick a warm-up routine that fits within `target_seconds`.
///
/// The finger pick deliberately reserves room for the shortest fitting
/// shoulder item, so both groups are covered whenever they fit together.
/// Returned in the order items were taken: finger pick, shoulder pick, then
/// general fillers. A group with nothing that fits is skipped without error.
pub fn select_warmups<R: Rng + ?Sized>(
    pool: &[TimedItem],
    target_seconds: u32,
    rng: &mut R,
) -> Vec<TimedItem> {
    let mut fingers = Vec::new();
    let mut shoulders = Vec::new();
    let mut general = Vec::new();

    for item in pool.iter().filter(|i| i.is_valid()) {
        match WarmupGroup::of(item) {
            WarmupGroup::Fingers => fingers.push(item),
            WarmupGroup::Shoulders => shoulders.push(item),
            WarmupGroup::General => general.push(item),
        }
    }

    fingers.shuffle(rng);
    shoulders.shuffle(rng);
    general.shuffle(rng);

    let mut selected: Vec<TimedItem> = Vec::new();
    let mut total = 0u32;

    // Leave room for the shortest shoulder item so both groups can be covered
    let shoulder_reserve = shoulders
        .iter()
        .map(|i| item_seconds(i))
        .filter(|&secs| secs <= target_seconds)
        .min()
        .unwrap_or(0);

    let finger_pick = fingers
        .iter()
        .find(|i| fits(total, item_seconds(i).saturating_add(shoulder_reserve), target_seconds))
        .or_else(|| {
            fingers
                .iter()
                .find(|i| fits(total, item_seconds(i), target_seconds))
        });
    match finger_pick {
        Some(item) => {
            total += item_seconds(item);
            selected.push((*item).clone());
        }
        None => tracing::info!("No finger/wrist warm-up fits in {}s", target_seconds),
    }

    match shoulders
        .iter()
        .find(|i| fits(total, item_seconds(i), target_seconds))
    {
        Some(item) => {
            total += item_seconds(item);
            selected.push((*item).clone());
        }
        None => tracing::info!(
            "No shoulder warm-up fits in the remaining {}s",
            target_seconds - total
        ),
    }

    for item in general {
        if total >= target_seconds {
            break;
        }
        let secs = item_seconds(item);
        if fits(total, secs, target_seconds) {
            total += secs;
            selected.push(item.clone());
        }
    }

    tracing::debug!(
        "Selected {} warm-up(s) totalling {}s of {}s",
        selected.len(),
        total,
        target_seconds
    );
    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{default_catalog, IntensityLevel, SESSION_DURATIONS};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn warmup(name: &str, secs: u32, tags: &[&str]) -> TimedItem {
        TimedItem {
            label: name.into(),
            secondary_label: String::new(),
            work_seconds: secs,
            rest_between_reps: 0,
            reps: 1,
            sets: 1,
            rest_between_sets: 0,
            intensity_note: String::new(),
            targets: tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    fn total(items: &[TimedItem]) -> u32 {
        items.iter().map(item_seconds).sum()
    }

    fn has_group(items: &[TimedItem], group: WarmupGroup) -> bool {
        items.iter().any(|i| WarmupGroup::of(i) == group)
    }

    #[test]
    fn test_budget_is_clamped() {
        assert_eq!(warmup_budget_seconds(5), 120);
        assert_eq!(warmup_budget_seconds(10), 120);
        assert_eq!(warmup_budget_seconds(20), 240);
        assert_eq!(warmup_budget_seconds(30), 360);
        assert_eq!(warmup_budget_seconds(50), 600);
        assert_eq!(warmup_budget_seconds(90), 600);
    }

    #[test]
    fn test_group_assignment_first_match_wins() {
        assert_eq!(
            WarmupGroup::of(&warmup("both", 10, &["wrist", "scapula"])),
            WarmupGroup::Fingers
        );
        assert_eq!(
            WarmupGroup::of(&warmup("neck", 10, &["neck"])),
            WarmupGroup::Shoulders
        );
        assert_eq!(
            WarmupGroup::of(&warmup("hips", 10, &["hips"])),
            WarmupGroup::General
        );
        assert_eq!(WarmupGroup::of(&warmup("none", 10, &[])), WarmupGroup::General);
    }

    #[test]
    fn test_selection_never_exceeds_budget() {
        let pool = default_catalog().unwrap().warmup_pool();
        for minutes in [5, 10, 20, 30, 45, 60] {
            let target = warmup_budget_seconds(minutes);
            for seed in 0..200 {
                let mut rng = ChaCha8Rng::seed_from_u64(seed);
                let picked = select_warmups(pool, target, &mut rng);
                assert!(
                    total(&picked) <= target,
                    "seed {} target {}: {}s selected",
                    seed,
                    target,
                    total(&picked)
                );
            }
        }
    }

    #[test]
    fn test_selection_covers_fingers_and_shoulders() {
        let pool = default_catalog().unwrap().warmup_pool();
        for minutes in SESSION_DURATIONS {
            let target = warmup_budget_seconds(minutes);
            for seed in 0..200 {
                let mut rng = ChaCha8Rng::seed_from_u64(seed);
                let picked = select_warmups(pool, target, &mut rng);
                assert!(has_group(&picked, WarmupGroup::Fingers), "seed {}", seed);
                assert!(has_group(&picked, WarmupGroup::Shoulders), "seed {}", seed);
            }
        }
    }

    #[test]
    fn test_coverage_when_cheap_items_exist_alongside_long_ones() {
        // A careless finger pick (100s) would starve the shoulder group
        let pool = vec![
            warmup("long fingers", 100, &["finger"]),
            warmup("short fingers", 30, &["finger"]),
            warmup("scap", 60, &["scapula"]),
        ];
        for seed in 0..50 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let picked = select_warmups(&pool, 120, &mut rng);
            assert!(has_group(&picked, WarmupGroup::Fingers));
            assert!(has_group(&picked, WarmupGroup::Shoulders));
            assert!(total(&picked) <= 120);
        }
    }

    #[test]
    fn test_order_is_fingers_shoulders_general() {
        let pool = vec![
            warmup("hips", 10, &["hips"]),
            warmup("neck", 10, &["neck"]),
            warmup("fingers", 10, &["finger"]),
            warmup("cardio", 10, &["cardio"]),
        ];
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let picked = select_warmups(&pool, 120, &mut rng);

        let groups: Vec<_> = picked.iter().map(WarmupGroup::of).collect();
        assert_eq!(groups.len(), 4);
        assert_eq!(groups[0], WarmupGroup::Fingers);
        assert_eq!(groups[1], WarmupGroup::Shoulders);
        assert!(groups[2..].iter().all(|g| *g == WarmupGroup::General));
    }

    #[test]
    fn test_only_one_pick_per_coverage_group() {
        let pool = vec![
            warmup("f1", 10, &["finger"]),
            warmup("f2", 10, &["wrist"]),
            warmup("s1", 10, &["neck"]),
            warmup("s2", 10, &["rotator_cuff"]),
        ];
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let picked = select_warmups(&pool, 600, &mut rng);
        assert_eq!(picked.len(), 2);
    }

    #[test]
    fn test_sparse_pool_skips_missing_groups() {
        let pool = vec![
            warmup("huge fingers", 500, &["finger"]),
            warmup("hips", 60, &["hips"]),
        ];
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let picked = select_warmups(&pool, 120, &mut rng);

        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].label, "hips");
    }

    #[test]
    fn test_general_fill_stops_at_budget() {
        let pool = vec![
            warmup("a", 60, &["hips"]),
            warmup("b", 60, &["core"]),
            warmup("c", 60, &["cardio"]),
        ];
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let picked = select_warmups(&pool, 120, &mut rng);
        assert_eq!(picked.len(), 2);
        assert_eq!(total(&picked), 120);
    }

    #[test]
    fn test_invalid_items_never_selected() {
        let mut broken = warmup("broken", 10, &["finger"]);
        broken.reps = 0;
        let pool = vec![broken, warmup("hips", 10, &["hips"])];
        for seed in 0..20 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let picked = select_warmups(&pool, 120, &mut rng);
            assert!(picked.iter().all(|i| i.label != "broken"));
        }
    }

    #[test]
    fn test_empty_pool_returns_nothing() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert!(select_warmups(&[], 600, &mut rng).is_empty());
    }

    #[test]
    fn test_select_exercises_filters_invalid() {
        let json = r#"{
            "protocols": {
                "Repeaters": {
                    "Medium": {
                        "20": [
                            {"GripType": "Half-Crimp", "EdgeType": "20mm", "HangDuration_s": 7,
                             "RestBetweenHangs_s": 3, "Reps": 6, "Sets": 3,
                             "RestBetweenSets_min": 2, "IntensityModifier": "Bodyweight"},
                            {"GripType": "Broken", "EdgeType": "20mm", "HangDuration_s": 0,
                             "RestBetweenHangs_s": 3, "Reps": 6, "Sets": 3,
                             "RestBetweenSets_min": 2, "IntensityModifier": ""}
                        ]
                    }
                }
            }
        }"#;
        let catalog = Catalog::from_json(json).unwrap();
        let filter = Filter::new("Repeaters", IntensityLevel::Medium, 20);

        let items = select_exercises(&catalog, &filter).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].label, "Half-Crimp");
    }

    #[test]
    fn test_select_exercises_propagates_lookup_error() {
        let catalog = default_catalog().unwrap();
        let filter = Filter::new("Nope", IntensityLevel::Low, 10);
        let err = select_exercises(catalog, &filter).unwrap_err();
        assert_eq!(err.to_string(), "Protocol 'Nope' not found.");
    }

    #[test]
    fn test_oversized_candidates_are_skipped() {
        let mut huge = warmup("huge", 100_000, &["finger"]);
        huge.reps = 100_000;
        let pool = vec![
            huge,
            warmup("wrist", 30, &["wrist"]),
            warmup("scap", 40, &["scapula"]),
        ];
        let mut rng = ChaCha8Rng::seed_from_u64(7);

        let picked = select_warmups(&pool, 120, &mut rng);
        assert!(total(&picked) <= 120);
        assert!(picked.iter().all(|i| i.label != "huge"));
        assert!(has_group(&picked, WarmupGroup::Shoulders));
    }
}
