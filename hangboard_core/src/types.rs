//! Core domain types for the hangboard session system.
//!
//! This module defines the fundamental types used throughout the system:
//! - Timed items (exercises and warm-ups share one shape)
//! - Lookup filters (protocol, intensity level, duration)
//! - Session phases and session variants

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

/// Session lengths (minutes) the catalog is keyed by
pub const SESSION_DURATIONS: [u32; 3] = [10, 20, 30];

// ============================================================================
// Timed Items
// ============================================================================

/// A single exercise or warm-up entry.
///
/// All durations are whole seconds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimedItem {
    /// Grip for exercises, name for warm-ups
    pub label: String,
    /// Edge for exercises, description for warm-ups
    pub secondary_label: String,
    /// Time held per rep
    pub work_seconds: u32,
    pub rest_between_reps: u32,
    pub reps: u32,
    pub sets: u32,
    pub rest_between_sets: u32,
    pub intensity_note: String,
    /// Muscle/joint tags; empty for generic exercises
    #[serde(default)]
    pub targets: BTreeSet<String>,
}

impl TimedItem {
    /// An item with no reps, no sets, or no work time can never be scheduled
    pub fn is_valid(&self) -> bool {
        self.reps > 0 && self.sets > 0 && self.work_seconds > 0
    }

    /// Whether the item carries any of the given tags
    pub fn targets_any(&self, tags: &[&str]) -> bool {
        tags.iter().any(|tag| self.targets.contains(*tag))
    }
}

/// Drop every item that fails [`TimedItem::is_valid`], keeping order
pub fn valid_items(items: &[TimedItem]) -> Vec<TimedItem> {
    let valid: Vec<TimedItem> = items.iter().filter(|i| i.is_valid()).cloned().collect();
    if valid.len() < items.len() {
        tracing::debug!(
            "Filtered {} invalid item(s) out of {}",
            items.len() - valid.len(),
            items.len()
        );
    }
    valid
}

// ============================================================================
// Lookup Filter
// ============================================================================

/// Intensity sub-key within a protocol
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum IntensityLevel {
    Low,
    Medium,
    High,
}

impl IntensityLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntensityLevel::Low => "Low",
            IntensityLevel::Medium => "Medium",
            IntensityLevel::High => "High",
        }
    }
}

impl fmt::Display for IntensityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for IntensityLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(IntensityLevel::Low),
            "medium" | "med" => Ok(IntensityLevel::Medium),
            "high" => Ok(IntensityLevel::High),
            other => Err(format!(
                "unknown intensity level '{}' (expected low, medium or high)",
                other
            )),
        }
    }
}

/// Exact catalog lookup key. No partial or fuzzy matching.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    pub protocol: String,
    pub intensity: IntensityLevel,
    /// Session length in minutes
    pub duration: u32,
}

impl Filter {
    pub fn new(protocol: impl Into<String>, intensity: IntensityLevel, duration: u32) -> Self {
        Self {
            protocol: protocol.into(),
            intensity,
            duration,
        }
    }
}

// ============================================================================
// Session Phases
// ============================================================================

/// One timed segment of a session
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Prep,
    Work,
    RestRep,
    RestSet,
    Finished,
}

impl Phase {
    pub fn is_rest(&self) -> bool {
        matches!(self, Phase::RestRep | Phase::RestSet)
    }
}

/// Which flavour of guided session is running.
///
/// Both variants share one state machine; the kind only changes vocabulary.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionKind {
    #[default]
    Workout,
    Warmup,
}

impl SessionKind {
    /// Human-readable name of a phase for this kind of session
    pub fn phase_label(&self, phase: Phase) -> &'static str {
        match (self, phase) {
            (_, Phase::Prep) => "Get ready",
            (SessionKind::Workout, Phase::Work) => "Hang",
            (SessionKind::Warmup, Phase::Work) => "Work",
            (SessionKind::Workout, Phase::RestRep) => "Rest between hangs",
            (SessionKind::Warmup, Phase::RestRep) => "Rest between reps",
            (_, Phase::RestSet) => "Rest between sets",
            (_, Phase::Finished) => "Finished",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionKind::Workout => "workout",
            SessionKind::Warmup => "warm-up",
        }
    }
}

// ============================================================================
// Catalog Type
// ============================================================================

/// Exercise lists for one protocol, keyed by intensity then duration (minutes)
pub type ProtocolTable = BTreeMap<IntensityLevel, BTreeMap<u32, Vec<TimedItem>>>;

/// The complete catalog of workout exercises and warm-up candidates
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    pub protocols: BTreeMap<String, ProtocolTable>,
    pub warmups: Vec<TimedItem>,
}
