//! Guided session state machine.
//!
//! One engine drives both workouts and warm-ups through
//! `Prep -> Work -> (RestRep -> Work)* -> (RestSet -> Work ...)* -> Prep (next item) ... -> Finished`.
//! The machine never reads a clock itself: the owner calls [`Session::tick`]
//! once per elapsed second and forwards user commands.

use crate::duration::estimate_total;
use crate::format::format_clock;
use crate::{valid_items, Phase, SessionKind, TimedItem};
use serde::Serialize;

/// Seconds of preparation before each item unless configured otherwise
pub const DEFAULT_PREP_SECONDS: u32 = 5;

/// Parameters fixed for the lifetime of a session
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionConfig {
    pub kind: SessionKind,
    pub prep_seconds: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            kind: SessionKind::Workout,
            prep_seconds: DEFAULT_PREP_SECONDS,
        }
    }
}

/// Outcome of a tick or command
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Advance {
    /// Nothing changed (paused, finished, or command not allowed)
    Idle,
    /// Countdown moved but the phase did not change
    Counting,
    /// A transition landed on a new phase
    Entered(Phase),
    /// The session just finished. Reported once per session.
    Completed,
}

/// Display state handed to the UI after every tick or command
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub kind: SessionKind,
    pub phase: Phase,
    pub phase_label: String,
    pub phase_seconds_left: u32,
    pub total_seconds_left: u32,
    pub item_index: usize,
    pub item_count: usize,
    pub set: u32,
    pub set_count: u32,
    pub rep: u32,
    pub rep_count: u32,
    pub paused: bool,
    pub label: String,
    pub secondary_label: String,
    pub intensity_note: String,
    pub phase_clock: String,
    pub total_clock: String,
}

/// A running guided session
#[derive(Clone, Debug)]
pub struct Session {
    kind: SessionKind,
    items: Vec<TimedItem>,
    prep_seconds: u32,
    item_index: usize,
    set: u32,
    rep: u32,
    phase: Phase,
    phase_seconds_left: u32,
    total_seconds_left: u32,
    paused: bool,
    completion_reported: bool,
    finished_early: bool,
    items_skipped: usize,
}

impl Session {
    /// Start a session over the valid subset of `items`.
    ///
    /// With nothing valid to do the session starts (and stays) finished.
    pub fn new(items: &[TimedItem], config: SessionConfig) -> Self {
        let items = valid_items(items);

        if items.is_empty() {
            tracing::info!("No valid items for {} session", config.kind.as_str());
            return Self {
                kind: config.kind,
                items,
                prep_seconds: config.prep_seconds,
                item_index: 0,
                set: 0,
                rep: 0,
                phase: Phase::Finished,
                phase_seconds_left: 0,
                total_seconds_left: 0,
                paused: false,
                completion_reported: true,
                finished_early: false,
                items_skipped: 0,
            };
        }

        let total = estimate_total(&items, config.prep_seconds);
        tracing::debug!(
            "New {} session: {} item(s), {}s expected",
            config.kind.as_str(),
            items.len(),
            total
        );

        Self {
            kind: config.kind,
            items,
            prep_seconds: config.prep_seconds,
            item_index: 0,
            set: 1,
            rep: 1,
            phase: Phase::Prep,
            phase_seconds_left: config.prep_seconds,
            total_seconds_left: total,
            paused: false,
            completion_reported: false,
            finished_early: false,
            items_skipped: 0,
        }
    }

    // ------------------------------------------------------------------------
    // Clock
    // ------------------------------------------------------------------------

    /// Whether the owner's clock should be delivering ticks
    pub fn clock_enabled(&self) -> bool {
        !self.paused && !self.is_finished()
    }

    /// One elapsed second.
    ///
    /// Counts both clocks down and, once the phase clock is spent, performs
    /// exactly one transition.
    pub fn tick(&mut self) -> Advance {
        if !self.clock_enabled() {
            return Advance::Idle;
        }

        self.phase_seconds_left = self.phase_seconds_left.saturating_sub(1);
        self.total_seconds_left = self.total_seconds_left.saturating_sub(1);

        if self.phase_seconds_left > 0 {
            return Advance::Counting;
        }
        self.transition()
    }

    // ------------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------------

    /// Flip the paused flag. Timers are left untouched.
    ///
    /// Returns the new paused state.
    pub fn toggle_pause(&mut self) -> bool {
        if self.is_finished() {
            return self.paused;
        }
        self.paused = !self.paused;
        tracing::debug!("Session {}", if self.paused { "paused" } else { "resumed" });
        self.paused
    }

    /// End the current phase now, as if its countdown had reached zero
    pub fn skip_phase(&mut self) -> Advance {
        if !self.clock_enabled() {
            return Advance::Idle;
        }
        self.total_seconds_left = self
            .total_seconds_left
            .saturating_sub(self.phase_seconds_left);
        self.phase_seconds_left = 0;
        self.transition()
    }

    /// Abandon the current item and jump to the next item's prep.
    ///
    /// The remaining total is recomputed from the items still ahead, capped so
    /// it always drops by at least the time left in the current phase.
    pub fn skip_item(&mut self) -> Advance {
        if !self.clock_enabled() {
            return Advance::Idle;
        }
        self.items_skipped += 1;

        let next = self.item_index + 1;
        if next >= self.items.len() {
            tracing::debug!("Skipped last item");
            return self.finish();
        }

        let ahead = estimate_total(&self.items[next..], self.prep_seconds);
        let floor = self
            .total_seconds_left
            .saturating_sub(self.phase_seconds_left);
        self.total_seconds_left = ahead.min(floor);

        self.item_index = next;
        self.set = 1;
        self.rep = 1;
        self.enter(Phase::Prep, self.prep_seconds)
    }

    /// Stop the session immediately
    pub fn finish_early(&mut self) -> Advance {
        if self.is_finished() {
            return Advance::Idle;
        }
        self.finished_early = true;
        self.paused = true;
        tracing::debug!("Session finished early at item {}", self.item_index + 1);
        self.finish()
    }

    // ------------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------------

    fn transition(&mut self) -> Advance {
        let Some(item) = self.items.get(self.item_index) else {
            return self.finish();
        };
        let (work, rest_rep, rest_set) = (
            item.work_seconds,
            item.rest_between_reps,
            item.rest_between_sets,
        );
        let (reps, sets) = (item.reps, item.sets);

        match self.phase {
            Phase::Prep | Phase::RestRep | Phase::RestSet => self.enter(Phase::Work, work),
            Phase::Work if self.rep < reps => {
                self.rep += 1;
                self.enter(Phase::RestRep, rest_rep)
            }
            Phase::Work if self.set < sets => {
                self.set += 1;
                self.rep = 1;
                self.enter(Phase::RestSet, rest_set)
            }
            Phase::Work if self.item_index + 1 < self.items.len() => {
                self.item_index += 1;
                self.set = 1;
                self.rep = 1;
                self.enter(Phase::Prep, self.prep_seconds)
            }
            Phase::Work => self.finish(),
            Phase::Finished => Advance::Idle,
        }
    }

    fn enter(&mut self, phase: Phase, seconds: u32) -> Advance {
        tracing::debug!(
            "Item {} set {} rep {}: {:?} -> {:?} ({}s)",
            self.item_index + 1,
            self.set,
            self.rep,
            self.phase,
            phase,
            seconds
        );
        self.phase = phase;
        self.phase_seconds_left = seconds;
        Advance::Entered(phase)
    }

    fn finish(&mut self) -> Advance {
        self.phase = Phase::Finished;
        self.phase_seconds_left = 0;
        self.total_seconds_left = 0;

        if self.completion_reported {
            return Advance::Idle;
        }
        self.completion_reported = true;
        tracing::info!(
            "{} session complete{}",
            self.kind.as_str(),
            if self.finished_early { " (finished early)" } else { "" }
        );
        Advance::Completed
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn kind(&self) -> SessionKind {
        self.kind
    }

    pub fn items(&self) -> &[TimedItem] {
        &self.items
    }

    pub fn prep_seconds(&self) -> u32 {
        self.prep_seconds
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn phase_seconds_left(&self) -> u32 {
        self.phase_seconds_left
    }

    pub fn total_seconds_left(&self) -> u32 {
        self.total_seconds_left
    }

    pub fn item_index(&self) -> usize {
        self.item_index
    }

    pub fn set(&self) -> u32 {
        self.set
    }

    pub fn rep(&self) -> u32 {
        self.rep
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_finished(&self) -> bool {
        self.phase == Phase::Finished
    }

    pub fn finished_early(&self) -> bool {
        self.finished_early
    }

    pub fn items_skipped(&self) -> usize {
        self.items_skipped
    }

    /// The item being worked on; `None` for an empty session
    pub fn current_item(&self) -> Option<&TimedItem> {
        self.items.get(self.item_index)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let item = self.current_item();
        SessionSnapshot {
            kind: self.kind,
            phase: self.phase,
            phase_label: self.kind.phase_label(self.phase).to_string(),
            phase_seconds_left: self.phase_seconds_left,
            total_seconds_left: self.total_seconds_left,
            item_index: self.item_index,
            item_count: self.items.len(),
            set: self.set,
            set_count: item.map_or(0, |i| i.sets),
            rep: self.rep,
            rep_count: item.map_or(0, |i| i.reps),
            paused: self.paused,
            label: item.map(|i| i.label.clone()).unwrap_or_default(),
            secondary_label: item.map(|i| i.secondary_label.clone()).unwrap_or_default(),
            intensity_note: item.map(|i| i.intensity_note.clone()).unwrap_or_default(),
            phase_clock: format_clock(self.phase_seconds_left),
            total_clock: format_clock(self.total_seconds_left),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn item(work: u32, rest_rep: u32, reps: u32, sets: u32, rest_set: u32) -> TimedItem {
        TimedItem {
            label: "Half-Crimp".into(),
            secondary_label: "Medium Edge (20mm)".into(),
            work_seconds: work,
            rest_between_reps: rest_rep,
            reps,
            sets,
            rest_between_sets: rest_set,
            intensity_note: "Bodyweight".into(),
            targets: BTreeSet::new(),
        }
    }

    fn config(prep: u32) -> SessionConfig {
        SessionConfig {
            kind: SessionKind::Workout,
            prep_seconds: prep,
        }
    }

    /// Tick until finished, recording each phase entered and the tick count
    fn run_to_end(session: &mut Session) -> (Vec<Phase>, u32, usize) {
        let mut phases = vec![session.phase()];
        let mut ticks = 0;
        let mut completions = 0;
        while !session.is_finished() {
            ticks += 1;
            match session.tick() {
                Advance::Entered(phase) => phases.push(phase),
                Advance::Completed => {
                    phases.push(Phase::Finished);
                    completions += 1;
                }
                _ => {}
            }
            assert!(ticks < 100_000, "session never finished");
        }
        (phases, ticks, completions)
    }

    #[test]
    fn test_initial_state() {
        let session = Session::new(&[item(7, 180, 2, 1, 0)], config(5));
        assert_eq!(session.phase(), Phase::Prep);
        assert_eq!(session.phase_seconds_left(), 5);
        assert_eq!(session.total_seconds_left(), 199);
        assert_eq!((session.item_index(), session.set(), session.rep()), (0, 1, 1));
        assert!(!session.is_paused());
    }

    #[test]
    fn test_single_item_round_trip() {
        let mut session = Session::new(&[item(7, 180, 2, 1, 0)], config(5));

        let (phases, ticks, completions) = run_to_end(&mut session);

        assert_eq!(
            phases,
            vec![
                Phase::Prep,
                Phase::Work,
                Phase::RestRep,
                Phase::Work,
                Phase::Finished
            ]
        );
        assert_eq!(ticks, 199);
        assert_eq!(completions, 1);
        assert_eq!(session.total_seconds_left(), 0);
    }

    #[test]
    fn test_total_counts_down_with_ticks() {
        let items = vec![item(10, 5, 2, 2, 30), item(7, 3, 3, 1, 0)];
        let mut session = Session::new(&items, config(5));
        let expected = estimate_total(&items, 5);
        assert_eq!(session.total_seconds_left(), expected);

        for elapsed in 1..expected {
            session.tick();
            assert_eq!(session.total_seconds_left(), expected - elapsed);
        }
        assert_eq!(session.tick(), Advance::Completed);
        assert_eq!(session.total_seconds_left(), 0);
    }

    #[test]
    fn test_sets_and_items_sequence() {
        let items = vec![item(1, 1, 2, 2, 1), item(1, 1, 1, 1, 0)];
        let mut session = Session::new(&items, config(1));

        let (phases, _, _) = run_to_end(&mut session);

        use Phase::*;
        assert_eq!(
            phases,
            vec![Prep, Work, RestRep, Work, RestSet, Work, RestRep, Work, Prep, Work, Finished]
        );
    }

    #[test]
    fn test_set_and_rep_counters() {
        let mut session = Session::new(&[item(1, 1, 2, 2, 1)], config(1));
        session.skip_phase(); // -> Work, set 1 rep 1
        assert_eq!((session.set(), session.rep()), (1, 1));
        session.skip_phase(); // -> RestRep
        assert_eq!((session.set(), session.rep()), (1, 2));
        session.skip_phase(); // -> Work
        session.skip_phase(); // -> RestSet
        assert_eq!(session.phase(), Phase::RestSet);
        assert_eq!((session.set(), session.rep()), (2, 1));
    }

    #[test]
    fn test_completion_fires_once() {
        let mut session = Session::new(&[item(1, 0, 1, 1, 0)], config(0));
        assert_eq!(session.tick(), Advance::Entered(Phase::Work));
        assert_eq!(session.tick(), Advance::Completed);
        assert_eq!(session.tick(), Advance::Idle);
        assert_eq!(session.skip_phase(), Advance::Idle);
        assert_eq!(session.finish_early(), Advance::Idle);
        assert_eq!(session.phase(), Phase::Finished);
    }

    #[test]
    fn test_skip_phase_follows_transition_table() {
        let mut session = Session::new(&[item(10, 20, 2, 2, 60), item(5, 5, 1, 1, 0)], config(5));

        let expected = [
            (Phase::Work, 10),
            (Phase::RestRep, 20),
            (Phase::Work, 10),
            (Phase::RestSet, 60),
            (Phase::Work, 10),
            (Phase::RestRep, 20),
            (Phase::Work, 10),
            (Phase::Prep, 5),
            (Phase::Work, 5),
        ];
        for (phase, secs) in expected {
            assert_eq!(session.skip_phase(), Advance::Entered(phase));
            assert_eq!(session.phase_seconds_left(), secs);
        }
        assert_eq!(session.skip_phase(), Advance::Completed);
        assert!(session.is_finished());
    }

    #[test]
    fn test_skip_phase_deducts_remaining_phase_time() {
        let mut session = Session::new(&[item(7, 180, 2, 1, 0)], config(5));
        session.tick();
        session.tick();
        assert_eq!(session.phase_seconds_left(), 3);
        assert_eq!(session.total_seconds_left(), 197);

        session.skip_phase();
        assert_eq!(session.phase(), Phase::Work);
        assert_eq!(session.total_seconds_left(), 194);
    }

    #[test]
    fn test_skip_item_moves_to_next_prep() {
        let items = vec![item(10, 5, 3, 2, 30), item(7, 3, 2, 1, 0)];
        let mut session = Session::new(&items, config(5));
        session.skip_phase();
        session.skip_phase();
        assert_eq!(session.phase(), Phase::RestRep);

        assert_eq!(session.skip_item(), Advance::Entered(Phase::Prep));
        assert_eq!(session.item_index(), 1);
        assert_eq!((session.set(), session.rep()), (1, 1));
        assert_eq!(session.phase_seconds_left(), 5);
        assert_eq!(session.total_seconds_left(), estimate_total(&items[1..], 5));
        assert_eq!(session.items_skipped(), 1);
    }

    #[test]
    fn test_skip_item_on_last_item_finishes() {
        let mut session = Session::new(&[item(10, 5, 3, 2, 30)], config(5));
        assert_eq!(session.skip_item(), Advance::Completed);
        assert!(session.is_finished());
        assert_eq!(session.total_seconds_left(), 0);
        assert_eq!(session.skip_item(), Advance::Idle);
    }

    #[test]
    fn test_skip_item_drops_at_least_phase_time() {
        let items = vec![item(10, 5, 1, 1, 0), item(10, 5, 1, 1, 0)];
        let mut session = Session::new(&items, config(5));
        let before = session.total_seconds_left();
        let phase_left = session.phase_seconds_left();

        session.skip_item();
        assert!(session.total_seconds_left() <= before - phase_left);
    }

    #[test]
    fn test_pause_blocks_ticks_and_skips() {
        let mut session = Session::new(&[item(7, 180, 2, 1, 0)], config(5));
        assert!(session.toggle_pause());
        assert!(!session.clock_enabled());

        let before = session.snapshot();
        assert_eq!(session.tick(), Advance::Idle);
        assert_eq!(session.skip_phase(), Advance::Idle);
        assert_eq!(session.skip_item(), Advance::Idle);
        let mut after = session.snapshot();
        assert_eq!(before, after);

        assert!(!session.toggle_pause());
        assert_eq!(session.tick(), Advance::Counting);
        after = session.snapshot();
        assert_eq!(after.phase_seconds_left, 4);
    }

    #[test]
    fn test_finish_early_while_paused() {
        let mut session = Session::new(&[item(7, 180, 2, 1, 0)], config(5));
        session.toggle_pause();

        assert_eq!(session.finish_early(), Advance::Completed);
        assert_eq!(session.phase(), Phase::Finished);
        assert_eq!(session.phase_seconds_left(), 0);
        assert_eq!(session.total_seconds_left(), 0);
        assert!(session.is_paused());
        assert!(session.finished_early());

        assert_eq!(session.finish_early(), Advance::Idle);
        assert!(session.toggle_pause(), "pause is frozen once finished");
    }

    #[test]
    fn test_empty_session_starts_finished() {
        let invalid = item(0, 10, 3, 3, 60);
        for items in [vec![], vec![invalid]] {
            let mut session = Session::new(&items, config(5));
            assert!(session.is_finished());
            assert_eq!(session.phase_seconds_left(), 0);
            assert_eq!(session.total_seconds_left(), 0);
            assert_eq!((session.set(), session.rep()), (0, 0));
            assert!(session.current_item().is_none());
            assert!(!session.clock_enabled());
            assert_eq!(session.tick(), Advance::Idle);
            assert_eq!(session.finish_early(), Advance::Idle);
        }
    }

    #[test]
    fn test_invalid_items_are_not_scheduled() {
        let items = vec![item(0, 10, 3, 3, 60), item(7, 180, 2, 1, 0)];
        let session = Session::new(&items, config(5));
        assert_eq!(session.items().len(), 1);
        assert_eq!(session.total_seconds_left(), 199);
    }

    #[test]
    fn test_zero_prep_enters_work_on_first_tick() {
        let mut session = Session::new(&[item(3, 0, 1, 1, 0)], config(0));
        assert_eq!(session.phase_seconds_left(), 0);
        assert_eq!(session.tick(), Advance::Entered(Phase::Work));
        assert_eq!(session.phase_seconds_left(), 3);
    }

    #[test]
    fn test_snapshot_display_fields() {
        let mut session = Session::new(
            &[item(7, 180, 2, 3, 0)],
            SessionConfig {
                kind: SessionKind::Warmup,
                prep_seconds: 5,
            },
        );
        session.skip_phase();
        let snap = session.snapshot();

        assert_eq!(snap.phase, Phase::Work);
        assert_eq!(snap.phase_label, "Work");
        assert_eq!(snap.phase_clock, "00:07");
        assert_eq!(snap.total_clock, format_clock(snap.total_seconds_left));
        assert_eq!((snap.set, snap.set_count), (1, 3));
        assert_eq!((snap.rep, snap.rep_count), (1, 2));
        assert_eq!(snap.item_count, 1);
        assert_eq!(snap.label, "Half-Crimp");
    }
}
