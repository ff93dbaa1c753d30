//! Catalog of hangboard protocols and warm-up candidates.
//!
//! The built-in dataset ships inside the library and is parsed once, on first
//! use, into a process-wide read-only catalog.

use crate::types::*;
use crate::{Error, LookupError, Result};
use once_cell::sync::OnceCell;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

const EMBEDDED_DATASET: &str = include_str!("../data/catalog.json");

/// Cached default catalog - parsed once and reused across all operations
static DEFAULT_CATALOG: OnceCell<Catalog> = OnceCell::new();

/// Get a reference to the cached default catalog
///
/// The embedded dataset is parsed on the first call only; later calls return
/// the same instance.
pub fn default_catalog() -> Result<&'static Catalog> {
    DEFAULT_CATALOG.get_or_try_init(|| {
        let catalog = Catalog::from_json(EMBEDDED_DATASET)?;
        tracing::debug!(
            "Loaded embedded catalog: {} protocols, {} warm-ups",
            catalog.protocols.len(),
            catalog.warmups.len()
        );
        Ok(catalog)
    })
}

// ============================================================================
// Dataset Records
// ============================================================================

/// Dataset file format (matches the exported training table)
#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    protocols: BTreeMap<String, BTreeMap<IntensityLevel, BTreeMap<u32, Vec<ExerciseRecord>>>>,
    #[serde(default)]
    warmups: Vec<WarmupRecord>,
}

#[derive(Debug, Deserialize)]
struct ExerciseRecord {
    #[serde(rename = "GripType")]
    grip_type: String,
    #[serde(rename = "EdgeType")]
    edge_type: String,
    #[serde(rename = "HangDuration_s")]
    hang_duration_s: u32,
    #[serde(rename = "RestBetweenHangs_s")]
    rest_between_hangs_s: u32,
    #[serde(rename = "Reps")]
    reps: u32,
    #[serde(rename = "Sets")]
    sets: u32,
    #[serde(rename = "RestBetweenSets_min")]
    rest_between_sets_min: u32,
    #[serde(rename = "IntensityModifier", default)]
    intensity_modifier: String,
}

impl TryFrom<ExerciseRecord> for TimedItem {
    type Error = Error;

    fn try_from(record: ExerciseRecord) -> Result<Self> {
        // The workout table stores set rest in minutes
        let rest_between_sets = record.rest_between_sets_min.checked_mul(60).ok_or_else(|| {
            Error::CatalogValidation(format!(
                "Exercise '{}': {} minutes of set rest is out of range",
                record.grip_type, record.rest_between_sets_min
            ))
        })?;

        Ok(TimedItem {
            label: record.grip_type,
            secondary_label: record.edge_type,
            work_seconds: record.hang_duration_s,
            rest_between_reps: record.rest_between_hangs_s,
            reps: record.reps,
            sets: record.sets,
            rest_between_sets,
            intensity_note: record.intensity_modifier,
            targets: BTreeSet::new(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct WarmupRecord {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Description", default)]
    description: String,
    #[serde(rename = "Duration_s")]
    duration_s: u32,
    #[serde(rename = "RestBetweenReps_s", default)]
    rest_between_reps_s: u32,
    #[serde(rename = "Reps")]
    reps: u32,
    #[serde(rename = "Sets")]
    sets: u32,
    #[serde(rename = "RestBetweenSets_s", default)]
    rest_between_sets_s: u32,
    #[serde(rename = "Targets", default)]
    targets: Vec<String>,
}

impl From<WarmupRecord> for TimedItem {
    fn from(record: WarmupRecord) -> Self {
        TimedItem {
            label: record.name,
            secondary_label: record.description,
            work_seconds: record.duration_s,
            rest_between_reps: record.rest_between_reps_s,
            reps: record.reps,
            sets: record.sets,
            rest_between_sets: record.rest_between_sets_s,
            intensity_note: String::new(),
            targets: record.targets.into_iter().collect(),
        }
    }
}

// ============================================================================
// Catalog Operations
// ============================================================================

impl Catalog {
    /// Parse a catalog from the JSON dataset format
    pub fn from_json(contents: &str) -> Result<Self> {
        let file: CatalogFile = serde_json::from_str(contents)?;

        let mut protocols = BTreeMap::new();
        for (name, levels) in file.protocols {
            let mut table = ProtocolTable::new();
            for (level, durations) in levels {
                let mut by_minutes = BTreeMap::new();
                for (minutes, records) in durations {
                    let items = records
                        .into_iter()
                        .map(TimedItem::try_from)
                        .collect::<Result<Vec<_>>>()?;
                    by_minutes.insert(minutes, items);
                }
                table.insert(level, by_minutes);
            }
            protocols.insert(name, table);
        }

        let warmups = file.warmups.into_iter().map(TimedItem::from).collect();

        Ok(Catalog { protocols, warmups })
    }

    /// Load a catalog from a dataset file on disk
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let catalog = Self::from_json(&contents)?;
        tracing::info!("Loaded catalog from {:?}", path);
        Ok(catalog)
    }

    /// Resolve a filter to its ordered exercise list.
    ///
    /// Fails at the most specific missing key: protocol, then intensity level,
    /// then duration. Invalid items are returned as stored; scheduling filters
    /// them out.
    pub fn lookup(&self, filter: &Filter) -> Result<&[TimedItem]> {
        let levels = self.protocols.get(&filter.protocol).ok_or_else(|| {
            LookupError::ProtocolNotFound {
                protocol: filter.protocol.clone(),
            }
        })?;

        let durations = levels.get(&filter.intensity).ok_or_else(|| {
            LookupError::IntensityNotFound {
                protocol: filter.protocol.clone(),
                intensity: filter.intensity.to_string(),
            }
        })?;

        let items = durations.get(&filter.duration).ok_or_else(|| {
            LookupError::DurationNotFound {
                protocol: filter.protocol.clone(),
                intensity: filter.intensity.to_string(),
                duration: filter.duration,
            }
        })?;

        Ok(items.as_slice())
    }

    /// Warm-up candidates, in dataset order
    pub fn warmup_pool(&self) -> &[TimedItem] {
        &self.warmups
    }

    /// Protocol names in sorted order
    pub fn protocol_names(&self) -> Vec<&str> {
        self.protocols.keys().map(String::as_str).collect()
    }

    /// Every lookup key the catalog can resolve, sorted
    pub fn keys(&self) -> Vec<Filter> {
        let mut keys = Vec::new();
        for (protocol, levels) in &self.protocols {
            for (level, durations) in levels {
                for minutes in durations.keys() {
                    keys.push(Filter::new(protocol.clone(), *level, *minutes));
                }
            }
        }
        keys
    }

    /// Validate the catalog for consistency and completeness
    ///
    /// Returns a list of validation errors, or empty Vec if valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        for (name, levels) in &self.protocols {
            if name.trim().is_empty() {
                errors.push("Protocol has empty name".to_string());
            }
            if levels.is_empty() {
                errors.push(format!("Protocol '{}' has no intensity levels", name));
            }

            for (level, durations) in levels {
                for (minutes, items) in durations {
                    if !SESSION_DURATIONS.contains(minutes) {
                        errors.push(format!(
                            "Protocol '{}' ({}): unsupported duration {} minutes",
                            name, level, minutes
                        ));
                    }
                    if items.is_empty() {
                        errors.push(format!(
                            "Protocol '{}' ({}, {} min) has no exercises",
                            name, level, minutes
                        ));
                    }
                    for item in items.iter().filter(|i| !i.is_valid()) {
                        errors.push(format!(
                            "Protocol '{}' ({}, {} min): exercise '{}' has no reps, sets or hang time",
                            name, level, minutes, item.label
                        ));
                    }
                }
            }
        }

        for warmup in &self.warmups {
            if warmup.label.trim().is_empty() {
                errors.push("Warm-up has empty name".to_string());
            }
            if warmup.targets.is_empty() {
                errors.push(format!("Warm-up '{}' has no targets", warmup.label));
            }
            if !warmup.is_valid() {
                errors.push(format!(
                    "Warm-up '{}' has no reps, sets or work time",
                    warmup.label
                ));
            }
        }

        errors
    }

    /// Validate and turn a non-empty report into an error
    pub fn ensure_valid(&self) -> Result<()> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            for error in &errors {
                tracing::warn!("Catalog problem: {}", error);
            }
            Err(Error::CatalogValidation(errors.join("; ")))
        }
    }
}
