//! Run supervisor: lifecycle across runs.
//!
//! The supervisor owns the record history and decides, on every start,
//! whether the magazine has to be homed or the previous run can be resumed.
//! Runs execute on a spawned tokio task; liveness and outcome come from its
//! `JoinHandle`. Completion is derived on the status poll instead of being
//! pushed by the worker, and reported exactly once through the mailbox.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use chrono::{DateTime, Utc};
use futures::FutureExt;
use tokio::task::JoinHandle;
use tracing::{error, info};
use uuid::Uuid;

use crate::export::CsvExporter;
use crate::metrics::RUNS_FINISHED;

use super::engine::{SequenceEngine, SlotCallback};
use super::error::{SequenceError, SupervisorError};
use super::mailbox::NotificationMailbox;
use super::types::{
    CardRecord, ExportReport, Notification, ProcessedCard, RunOutcome, RunStatus, StartOptions,
    StartReport,
};

/// Callback invoked with every new record after it was stored.
pub type RecordObserver = Arc<dyn Fn(&CardRecord) + Send + Sync>;

type Worker = JoinHandle<Result<RunOutcome, SequenceError>>;

/// Runs from a homed slot 1 up to magazine completion, across resumes.
#[derive(Debug, Clone, Copy)]
struct Pass {
    started_at: DateTime<Utc>,
    /// Set when the last run of this pass was reaped; cleared on resume.
    halted_at: Option<DateTime<Utc>>,
    completion_reported: bool,
}

impl Pass {
    fn new(now: DateTime<Utc>) -> Self {
        Self {
            started_at: now,
            halted_at: None,
            completion_reported: false,
        }
    }
}

#[derive(Default)]
struct SupervisorState {
    /// A start() is between its checks and spawning the worker (homing).
    starting: bool,
    worker: Option<Worker>,
    active_label: Option<String>,
    run_id: Option<Uuid>,
    pass: Option<Pass>,
    last_outcome: Option<RunOutcome>,
    mailbox: NotificationMailbox,
}

/// Clears `starting` when a start() ends before spawning its worker,
/// including when the start() future is dropped mid-homing.
struct StartingGuard<'a> {
    state: &'a Mutex<SupervisorState>,
    armed: bool,
}

impl StartingGuard<'_> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for StartingGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.state
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .starting = false;
        }
    }
}

enum StartPlan {
    Home,
    Resume(u32),
}

/// Manages runs of a [`SequenceEngine`] for a remote caller.
pub struct RunSupervisor {
    engine: Arc<SequenceEngine>,
    exporter: Arc<dyn CsvExporter>,
    export_dir: PathBuf,
    records: Arc<RwLock<Vec<CardRecord>>>,
    cancel: Arc<AtomicBool>,
    state: Mutex<SupervisorState>,
    observer: Option<RecordObserver>,
}

impl RunSupervisor {
    pub fn new(
        engine: SequenceEngine,
        exporter: Arc<dyn CsvExporter>,
        export_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            engine: Arc::new(engine),
            exporter,
            export_dir: export_dir.into(),
            records: Arc::new(RwLock::new(Vec::new())),
            cancel: Arc::new(AtomicBool::new(false)),
            state: Mutex::new(SupervisorState::default()),
            observer: None,
        }
    }

    /// Set a callback for new records (used for live push to clients).
    pub fn with_record_observer(mut self, observer: RecordObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    fn lock_state(&self) -> MutexGuard<'_, SupervisorState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Start or resume a run for `label`.
    ///
    /// Homes first if the magazine was never homed, the last run completed,
    /// or `force_home` is set; otherwise continues where the previous run
    /// left off. Returns once the worker is spawned.
    pub async fn start(
        &self,
        label: &str,
        options: StartOptions,
    ) -> Result<StartReport, SupervisorError> {
        let label = label.trim();
        if label.is_empty() {
            return Err(SupervisorError::InvalidLabel);
        }

        let (plan, starting) = {
            let mut state = self.lock_state();
            self.reap(&mut state);
            if state.starting || state.worker.is_some() {
                return Err(SupervisorError::AlreadyRunning);
            }
            state.starting = true;
            let starting = StartingGuard {
                state: &self.state,
                armed: true,
            };
            self.cancel.store(false, Ordering::SeqCst);

            let progress = self.engine.progress();
            let completed = state
                .last_outcome
                .as_ref()
                .is_some_and(RunOutcome::is_completed);
            let plan =
                if !progress.homed || completed || options.force_home || state.pass.is_none() {
                    StartPlan::Home
                } else {
                    StartPlan::Resume(progress.resume_slot)
                };
            (plan, starting)
        };

        let (start_slot, homed) = match plan {
            StartPlan::Home => {
                if let Err(e) = self.engine.home().await {
                    drop(starting);
                    error!(label, error = %e, "homing failed, run not started");
                    return Err(e.into());
                }
                (1, true)
            }
            StartPlan::Resume(slot) => (slot, false),
        };

        let run_id = Uuid::new_v4();
        let mut state = self.lock_state();
        state.starting = false;
        starting.disarm();

        let now = Utc::now();
        if homed || state.pass.is_none() {
            state.pass = Some(Pass::new(now));
        } else if let Some(pass) = state.pass.as_mut() {
            pass.halted_at = None;
        }
        state.run_id = Some(run_id);
        state.active_label = Some(label.to_string());
        state.last_outcome = None;

        let engine = Arc::clone(&self.engine);
        let cancel = Arc::clone(&self.cancel);
        let on_card = self.slot_callback(label, run_id);
        let run_label = label.to_string();
        state.worker = Some(tokio::spawn(async move {
            engine.run(start_slot, &run_label, &cancel, on_card).await
        }));

        info!(label, %run_id, start_slot, homed, "run launched");
        Ok(StartReport {
            run_id,
            start_slot,
            homed,
        })
    }

    fn slot_callback(&self, label: &str, run_id: Uuid) -> SlotCallback {
        let records = Arc::clone(&self.records);
        let observer = self.observer.clone();
        let label = label.to_string();

        Arc::new(move |processed: ProcessedCard| {
            let record = CardRecord {
                run_id,
                label: label.clone(),
                slot: processed.slot,
                captured_at: processed.captured_at,
                recorded_at: Utc::now(),
                image_path: processed.image_path,
                card: processed.card,
                placeholder: processed.placeholder,
            };

            records
                .write()
                .unwrap_or_else(|e| e.into_inner())
                .push(record.clone());

            if let Some(observer) = &observer {
                observer(&record);
            }
        })
    }

    /// Request the current run to stop at its next checkpoint.
    ///
    /// With `emergency` the motors are disabled right away as well. Never
    /// waits for the worker.
    pub fn stop(&self, emergency: bool) {
        self.cancel.store(true, Ordering::SeqCst);
        info!(emergency, "stop requested");
        if emergency {
            self.engine.cleanup();
        }
    }

    /// Whether a run is executing or being started. Has no side effects.
    pub fn is_running(&self) -> bool {
        let state = self.lock_state();
        state.starting || state.worker.as_ref().is_some_and(|w| !w.is_finished())
    }

    /// Collect the result of a finished worker.
    fn reap(&self, state: &mut SupervisorState) {
        let Some(worker) = state.worker.as_mut() else {
            return;
        };
        if !worker.is_finished() {
            return;
        }
        let Some(result) = FutureExt::now_or_never(&mut *worker) else {
            return;
        };
        state.worker = None;

        let outcome = match result {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(e)) => RunOutcome::Failed {
                error: e.to_string(),
            },
            Err(join_error) => {
                error!(error = %join_error, "run worker panicked");
                RunOutcome::Failed {
                    error: join_error.to_string(),
                }
            }
        };

        RUNS_FINISHED.with_label_values(&[outcome.as_str()]).inc();
        if let RunOutcome::Failed { .. } = outcome {
            state.mailbox.post(Notification::RunFailed);
        }
        if let Some(pass) = state.pass.as_mut() {
            pass.halted_at = Some(Utc::now());
        }
        info!(outcome = outcome.as_str(), "run finished");
        state.last_outcome = Some(outcome);
    }

    /// Poll the run status.
    ///
    /// Reaps a finished worker, checks whether the current pass is complete
    /// and hands out a pending notification. A notification is returned by
    /// exactly one call.
    pub fn status(&self) -> RunStatus {
        self.snapshot(true)
    }

    /// Same as [`status`](Self::status) but leaves a pending notification in
    /// the mailbox. Used for broadcast pushes.
    pub fn peek_status(&self) -> RunStatus {
        self.snapshot(false)
    }

    fn snapshot(&self, take_notification: bool) -> RunStatus {
        let mut guard = self.lock_state();
        let state = &mut *guard;
        self.reap(state);

        let running = state.starting || state.worker.is_some();
        let progress = self.engine.progress();
        let magazine_size = self.engine.magazine_size();

        let (total_recorded, current_run_recorded) = {
            let records = self.records.read().unwrap_or_else(|e| e.into_inner());
            let current = state.pass.as_ref().map_or(0, |pass| {
                records
                    .iter()
                    .filter(|r| r.recorded_at >= pass.started_at)
                    .count()
            });
            (records.len(), current)
        };

        if !running {
            if let Some(pass) = state.pass.as_mut() {
                if !pass.completion_reported && current_run_recorded >= magazine_size as usize {
                    pass.completion_reported = true;
                    state.mailbox.post(Notification::RunFinished);
                    info!(records = current_run_recorded, "magazine finished");
                }
            }
        }

        let current_run_elapsed_secs = state.pass.as_ref().map_or(0, |pass| {
            let until = pass.halted_at.unwrap_or_else(Utc::now);
            (until - pass.started_at).num_seconds().max(0) as u64
        });

        RunStatus {
            running,
            phase: progress.phase,
            current_position: progress.position,
            resume_slot: progress.resume_slot,
            magazine_size,
            active_label: state.active_label.clone(),
            run_id: state.run_id,
            total_recorded,
            current_run_recorded,
            current_run_elapsed_secs,
            last_outcome: state.last_outcome.clone(),
            notification: if take_notification {
                state.mailbox.take()
            } else {
                None
            },
        }
    }

    /// Copy of the history in insertion order, optionally for one label.
    pub fn get_records(&self, label: Option<&str>) -> Vec<CardRecord> {
        let records = self.records.read().unwrap_or_else(|e| e.into_inner());
        records
            .iter()
            .filter(|r| label.is_none_or(|l| r.label == l))
            .cloned()
            .collect()
    }

    /// Write the whole history ordered by label, then slot.
    ///
    /// Without a path the file goes to `<export_dir>/all_cards_<unix>.csv`.
    pub fn export_history(&self, path: Option<PathBuf>) -> Result<ExportReport, SupervisorError> {
        let ordered = {
            let records = self.records.read().unwrap_or_else(|e| e.into_inner());
            ordered_history(&records)
        };

        let csv_path = path.unwrap_or_else(|| {
            self.export_dir
                .join(format!("all_cards_{}.csv", Utc::now().timestamp()))
        });

        self.exporter.write(&ordered, &csv_path)?;
        info!(
            exporter = self.exporter.name(),
            path = %csv_path.display(),
            records = ordered.len(),
            "history exported"
        );

        Ok(ExportReport {
            csv_path,
            records: ordered.len(),
        })
    }
}

/// Records grouped by label in label order, each group ascending by slot.
///
/// Records sharing label and slot keep their insertion order.
pub fn ordered_history(records: &[CardRecord]) -> Vec<CardRecord> {
    let mut ordered = records.to_vec();
    ordered.sort_by(|a, b| a.label.cmp(&b.label).then(a.slot.cmp(&b.slot)));
    ordered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures::card_record;

    #[test]
    fn test_ordered_history() {
        let records = vec![
            card_record("B", 2),
            card_record("A", 1),
            card_record("B", 1),
            card_record("A", 2),
        ];
        let ordered: Vec<(String, u32)> = ordered_history(&records)
            .into_iter()
            .map(|r| (r.label, r.slot))
            .collect();
        assert_eq!(
            ordered,
            vec![
                ("A".to_string(), 1),
                ("A".to_string(), 2),
                ("B".to_string(), 1),
                ("B".to_string(), 2),
            ]
        );
    }

    #[test]
    fn test_ordered_history_is_stable() {
        let mut first = card_record("A", 1);
        first.card.name = "first".to_string();
        let mut second = card_record("A", 1);
        second.card.name = "second".to_string();

        let ordered = ordered_history(&[card_record("A", 2), first, second]);
        assert_eq!(ordered[0].card.name, "first");
        assert_eq!(ordered[1].card.name, "second");
        assert_eq!(ordered[2].slot, 2);
    }
}
