//! Audio cue decisions derived from session snapshots.
//!
//! Playback itself belongs to the front-end; this module only decides when a
//! cue should start or stop.

use crate::{Phase, SessionSnapshot};

/// Seconds left in a prep or rest phase when the countdown cue plays
pub const COUNTDOWN_AT_SECONDS: u32 = 3;

/// A sound the front-end should play or stop
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cue {
    /// One-shot countdown before work starts
    Countdown,
    /// Begin the looping rest sound
    StartRestLoop,
    /// Stop the looping rest sound
    StopRestLoop,
}

/// Something that can make noise
pub trait CuePlayer {
    fn play(&mut self, cue: Cue);
}

/// Identifies one phase instance so a countdown never repeats within it
type PhaseKey = (Phase, usize, u32, u32);

/// Edge detector turning successive snapshots into cues
#[derive(Debug, Default)]
pub struct CueTracker {
    rest_loop_playing: bool,
    last_countdown: Option<PhaseKey>,
}

impl CueTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rest_loop_playing(&self) -> bool {
        self.rest_loop_playing
    }

    /// Cues triggered by moving to `snapshot`
    pub fn observe(&mut self, snapshot: &SessionSnapshot) -> Vec<Cue> {
        let mut cues = Vec::new();

        let want_loop = snapshot.phase.is_rest() && !snapshot.paused;
        if want_loop != self.rest_loop_playing {
            self.rest_loop_playing = want_loop;
            cues.push(if want_loop {
                Cue::StartRestLoop
            } else {
                Cue::StopRestLoop
            });
        }

        let counts_down = matches!(
            snapshot.phase,
            Phase::Prep | Phase::RestRep | Phase::RestSet
        );
        if counts_down
            && !snapshot.paused
            && snapshot.phase_seconds_left == COUNTDOWN_AT_SECONDS
        {
            let key = (
                snapshot.phase,
                snapshot.item_index,
                snapshot.set,
                snapshot.rep,
            );
            if self.last_countdown != Some(key) {
                self.last_countdown = Some(key);
                cues.push(Cue::Countdown);
            }
        }

        cues
    }

    /// Observe and hand every resulting cue to `player`
    pub fn drive<P: CuePlayer + ?Sized>(&mut self, snapshot: &SessionSnapshot, player: &mut P) {
        for cue in self.observe(snapshot) {
            player.play(cue);
        }
    }
}
