//! Run orchestration for the sorting machine.
//!
//! Two layers:
//!
//! - [`SequenceEngine`] drives one physical pass through a magazine: homing,
//!   then separate / capture / recognize / eject / advance per slot, with two
//!   cooperative cancellation checkpoints per slot. It publishes its progress
//!   through a `watch` channel and reports each processed card through a
//!   callback.
//! - [`RunSupervisor`] owns everything across runs: home-vs-resume decisions,
//!   the background worker, the record history, polled status with a
//!   one-shot completion notification, and ordered export.
//!
//! # Example
//!
//! ```ignore
//! use cardsort_core::sorter::{RunSupervisor, SequenceEngine, StartOptions};
//!
//! let engine = SequenceEngine::new(config, motor, sensor, camera, recognizer);
//! let supervisor = RunSupervisor::new(engine, exporter, export_dir);
//!
//! let report = supervisor.start("A", StartOptions::default()).await?;
//! loop {
//!     let status = supervisor.status();
//!     if status.notification.is_some() {
//!         break;
//!     }
//!     tokio::time::sleep(Duration::from_secs(1)).await;
//! }
//! let export = supervisor.export_history(None)?;
//! ```

mod config;
mod engine;
mod error;
mod mailbox;
mod supervisor;
mod types;

pub use config::{MachineConfig, SequenceConfig};
pub use engine::{SequenceEngine, SlotCallback};
pub use error::{SequenceError, SupervisorError};
pub use mailbox::NotificationMailbox;
pub use supervisor::{ordered_history, RecordObserver, RunSupervisor};
pub use types::{
    CardRecord, Checkpoint, EnginePhase, ExportReport, Notification, ProcessedCard, Progress,
    RunOutcome, RunStatus, StartOptions, StartReport,
};
