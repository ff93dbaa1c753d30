//! Session clock.
//!
//! A spawned task owns the [`Session`] and is the only place it is mutated.
//! It waits on a repeating interval (polled only while the session is running)
//! and on a command channel, and publishes a snapshot after every change.
//! Dropping the [`SessionHandle`] aborts the task, so no tick outlives it.

use crate::{Error, Result, Session, SessionKind, SessionSnapshot};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::Instrument;
use uuid::Uuid;

/// Real-time tick period
pub const DEFAULT_TICK: Duration = Duration::from_secs(1);

/// User command forwarded to the session task
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    TogglePause,
    SkipPhase,
    SkipItem,
    FinishEarly,
}

/// Summary returned when a session task ends
#[derive(Clone, Debug, Serialize)]
pub struct SessionReport {
    pub id: Uuid,
    pub kind: SessionKind,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// False when the user finished early or the task stopped before the end
    pub completed_naturally: bool,
    pub items_total: usize,
    pub items_skipped: usize,
}

/// Owner-side handle to a running session
pub struct SessionHandle {
    commands: mpsc::UnboundedSender<Command>,
    updates: mpsc::UnboundedReceiver<SessionSnapshot>,
    task: Option<JoinHandle<SessionReport>>,
}

impl SessionHandle {
    /// Start driving `session` with one tick per `period`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(session: Session, period: Duration) -> Self {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        let id = Uuid::new_v4();
        let span = tracing::info_span!("session", %id, kind = session.kind().as_str());
        let task = tokio::spawn(
            run_session(id, session, period, command_rx, update_tx).instrument(span),
        );

        Self {
            commands: command_tx,
            updates: update_rx,
            task: Some(task),
        }
    }

    /// Forward a command. Returns false once the session has ended.
    pub fn send(&self, command: Command) -> bool {
        self.commands.send(command).is_ok()
    }

    pub fn toggle_pause(&self) -> bool {
        self.send(Command::TogglePause)
    }

    pub fn skip_phase(&self) -> bool {
        self.send(Command::SkipPhase)
    }

    pub fn skip_item(&self) -> bool {
        self.send(Command::SkipItem)
    }

    pub fn finish_early(&self) -> bool {
        self.send(Command::FinishEarly)
    }

    /// Next published snapshot; `None` after the final one has been read
    pub async fn next_update(&mut self) -> Option<SessionSnapshot> {
        self.updates.recv().await
    }

    /// Most recent snapshot already published, discarding older ones
    #[cfg(test)]
    fn latest_update(&mut self) -> Option<SessionSnapshot> {
        let mut latest = None;
        while let Ok(snapshot) = self.updates.try_recv() {
            latest = Some(snapshot);
        }
        latest
    }

    /// Wait for the session to end
    pub async fn wait(mut self) -> Result<SessionReport> {
        let task = self
            .task
            .take()
            .ok_or_else(|| Error::Other("session task already joined".into()))?;
        task.await
            .map_err(|e| Error::Other(format!("session task failed: {}", e)))
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

fn new_clock(period: Duration) -> Interval {
    let mut clock = interval_at(Instant::now() + period, period);
    clock.set_missed_tick_behavior(MissedTickBehavior::Delay);
    clock
}

fn apply(session: &mut Session, command: Command) {
    tracing::debug!("Command: {:?}", command);
    match command {
        Command::TogglePause => {
            session.toggle_pause();
        }
        Command::SkipPhase => {
            session.skip_phase();
        }
        Command::SkipItem => {
            session.skip_item();
        }
        Command::FinishEarly => {
            session.finish_early();
        }
    }
}

async fn run_session(
    id: Uuid,
    mut session: Session,
    period: Duration,
    mut commands: mpsc::UnboundedReceiver<Command>,
    updates: mpsc::UnboundedSender<SessionSnapshot>,
) -> SessionReport {
    let started_at = Utc::now();
    let items_total = session.items().len();
    tracing::info!("Starting {} session with {} item(s)", session.kind().as_str(), items_total);

    let mut clock = new_clock(period);
    // A closed receiver only means nobody is watching; keep running
    let _ = updates.send(session.snapshot());

    while !session.is_finished() {
        tokio::select! {
            _ = clock.tick(), if session.clock_enabled() => {
                session.tick();
            }
            command = commands.recv() => match command {
                Some(command) => {
                    let was_paused = session.is_paused();
                    apply(&mut session, command);
                    if was_paused && !session.is_paused() {
                        // Resume a full period after the command, not on a stale deadline
                        clock.reset();
                    }
                }
                None => {
                    tracing::debug!("Command channel closed, stopping session");
                    break;
                }
            },
        }
        let _ = updates.send(session.snapshot());
    }

    let report = SessionReport {
        id,
        kind: session.kind(),
        started_at,
        finished_at: Utc::now(),
        completed_naturally: session.is_finished() && !session.finished_early(),
        items_total,
        items_skipped: session.items_skipped(),
    };
    tracing::info!(
        "Session ended: completed={} skipped={}/{}",
        report.completed_naturally,
        report.items_skipped,
        report.items_total
    );
    report
}
