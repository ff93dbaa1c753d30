#![forbid(unsafe_code)]

//! Core domain model and session engine for guided hangboard training.
//!
//! This crate provides:
//! - Domain types (timed items, filters, phases)
//! - Catalog lookup and warm-up selection
//! - Duration estimation
//! - The session state machine and its clock
//! - Audio cue decisions

pub mod types;
pub mod error;
pub mod catalog;
pub mod config;
pub mod logging;
pub mod duration;
pub mod format;
pub mod selector;
pub mod session;
pub mod driver;
pub mod cues;

// Re-export commonly used types
pub use error::{Error, LookupError, Result};
pub use types::*;
pub use catalog::default_catalog;
pub use config::Config;
pub use duration::{estimate_total, item_seconds};
pub use format::format_clock;
pub use selector::{select_exercises, select_warmups, warmup_budget_seconds, WarmupGroup};
pub use session::{Advance, Session, SessionConfig, SessionSnapshot};
pub use driver::{Command, SessionHandle, SessionReport};
pub use cues::{Cue, CuePlayer, CueTracker};
