//! Types shared by the sequence engine, the supervisor and the control plane.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

use crate::recognizer::CardFields;

/// Recognition result for one slot plus provenance.
///
/// Created once per processed slot and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardRecord {
    pub run_id: Uuid,
    /// Magazine label.
    pub label: String,
    /// 1-based slot within the magazine.
    pub slot: u32,
    pub captured_at: DateTime<Utc>,
    pub recorded_at: DateTime<Utc>,
    pub image_path: PathBuf,
    pub card: CardFields,
    /// Recognition failed and `card` holds the unknown placeholder.
    pub placeholder: bool,
}

/// What the engine hands to the per-slot callback.
///
/// The supervisor turns this into a [`CardRecord`] by adding the label,
/// run id and record timestamp.
#[derive(Debug, Clone)]
pub struct ProcessedCard {
    pub slot: u32,
    pub captured_at: DateTime<Utc>,
    pub image_path: PathBuf,
    pub card: CardFields,
    pub placeholder: bool,
}

/// Where the engine currently is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum EnginePhase {
    #[default]
    Idle,
    Homing,
    Processing {
        slot: u32,
    },
    Ejecting {
        slot: u32,
    },
    Advancing {
        slot: u32,
    },
    Returning,
}

/// Snapshot the engine publishes after every state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    /// Slot the magazine is positioned at; 0 right after homing.
    pub position: u32,
    /// First slot a resumed run has to process.
    pub resume_slot: u32,
    /// The card at `position` was recorded but is still under the camera.
    pub eject_pending: bool,
    /// The magazine has been homed since the process started.
    pub homed: bool,
    pub phase: EnginePhase,
}

impl Default for Progress {
    fn default() -> Self {
        Self {
            position: 0,
            resume_slot: 1,
            eject_pending: false,
            homed: false,
            phase: EnginePhase::Idle,
        }
    }
}

/// Cancellation checkpoint a run stopped at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Checkpoint {
    /// Before separating the next card; nothing recorded for that slot.
    BeforeSeparate,
    /// After recording the card, before ejecting it.
    AfterRecognition,
    /// Motors were disabled underneath the run by an emergency stop.
    Emergency,
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum RunOutcome {
    /// Every slot up to the end of the magazine was processed.
    Completed { slots_processed: u32 },
    /// Stopped cooperatively.
    Stopped {
        checkpoint: Checkpoint,
        slot: u32,
        slots_processed: u32,
    },
    /// Aborted by a fault.
    Failed { error: String },
}

impl RunOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, RunOutcome::Completed { .. })
    }

    /// Label value for metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            RunOutcome::Completed { .. } => "completed",
            RunOutcome::Stopped { .. } => "stopped",
            RunOutcome::Failed { .. } => "failed",
        }
    }
}

/// One-shot messages delivered through the status poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Notification {
    /// The current pass recorded a full magazine and the worker finished.
    RunFinished,
    /// The last run aborted with an error.
    RunFailed,
}

/// Options for [`RunSupervisor::start`](super::RunSupervisor::start).
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct StartOptions {
    /// Re-home and start at slot 1 even if a resume is possible.
    #[serde(default)]
    pub force_home: bool,
}

/// Returned by a successful start.
#[derive(Debug, Clone, Serialize)]
pub struct StartReport {
    pub run_id: Uuid,
    pub start_slot: u32,
    /// The magazine was homed before the run started.
    pub homed: bool,
}

/// Returned by a successful export.
#[derive(Debug, Clone, Serialize)]
pub struct ExportReport {
    pub csv_path: PathBuf,
    pub records: usize,
}

/// Polled run status.
#[derive(Debug, Clone, Serialize)]
pub struct RunStatus {
    pub running: bool,
    pub phase: EnginePhase,
    pub current_position: u32,
    pub resume_slot: u32,
    pub magazine_size: u32,
    pub active_label: Option<String>,
    pub run_id: Option<Uuid>,
    pub total_recorded: usize,
    /// Records of the current pass.
    pub current_run_recorded: usize,
    pub current_run_elapsed_secs: u64,
    pub last_outcome: Option<RunOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification: Option<Notification>,
}
