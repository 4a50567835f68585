//! Sequence engine: one physical pass through a magazine.
//!
//! Per slot: separate, capture, recognize, record, eject, advance. Cancellation
//! is only looked at between those steps (before separating and after
//! recording), so a motor is never stopped in the middle of a pulse train.
//! Motors are enabled for the duration of [`SequenceEngine::home`] and
//! [`SequenceEngine::run`] and disabled again on every way out, including the
//! future being dropped.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::camera::CameraService;
use crate::hardware::{Axis, Direction, HomeSensor, MotorDriver, MotorFault, SensorState};
use crate::metrics::{
    CAPTURE_FAILURES, HOMING_ATTEMPTS, RECOGNITION_DURATION, SLOTS_PROCESSED,
};
use crate::recognizer::{CardFields, Recognizer};

use super::config::SequenceConfig;
use super::error::SequenceError;
use super::types::{Checkpoint, EnginePhase, ProcessedCard, Progress, RunOutcome};

/// Callback invoked once per recorded slot.
pub type SlotCallback = Arc<dyn Fn(ProcessedCard) + Send + Sync>;

/// Drives the machine through homing and magazine passes.
pub struct SequenceEngine {
    config: SequenceConfig,
    motor: Arc<dyn MotorDriver>,
    sensor: Arc<dyn HomeSensor>,
    camera: Arc<dyn CameraService>,
    recognizer: Arc<dyn Recognizer>,
    progress: watch::Sender<Progress>,
}

/// Disables the motors and marks the engine idle when dropped.
struct CleanupGuard<'a> {
    engine: &'a SequenceEngine,
}

impl Drop for CleanupGuard<'_> {
    fn drop(&mut self) {
        self.engine.cleanup();
        self.engine.set_phase(EnginePhase::Idle);
    }
}

impl SequenceEngine {
    pub fn new(
        config: SequenceConfig,
        motor: Arc<dyn MotorDriver>,
        sensor: Arc<dyn HomeSensor>,
        camera: Arc<dyn CameraService>,
        recognizer: Arc<dyn Recognizer>,
    ) -> Self {
        let (progress, _) = watch::channel(Progress::default());
        Self {
            config,
            motor,
            sensor,
            camera,
            recognizer,
            progress,
        }
    }

    pub fn magazine_size(&self) -> u32 {
        self.config.machine.magazine_size
    }

    /// Latest published progress.
    pub fn progress(&self) -> Progress {
        *self.progress.borrow()
    }

    /// Subscribe to progress updates.
    pub fn subscribe(&self) -> watch::Receiver<Progress> {
        self.progress.subscribe()
    }

    /// Disable all motor drivers. Safe to call at any time and repeatedly.
    pub fn cleanup(&self) {
        if self.motor.is_enabled() {
            info!(driver = self.motor.name(), "disabling motors");
        }
        self.motor.set_enabled(false);
    }

    fn set_phase(&self, phase: EnginePhase) {
        self.progress.send_modify(|p| p.phase = phase);
    }

    async fn drive(
        &self,
        axis: Axis,
        direction: Direction,
        steps: u32,
        step_delay: Duration,
    ) -> Result<(), MotorFault> {
        debug!(%axis, ?direction, steps, "move");
        self.motor
            .move_axis(axis, direction, steps, step_delay)
            .await
    }

    /// Drive the magazine backward until the reference switch asserts.
    ///
    /// On success the position is reset to 0 and the next run starts at slot 1.
    pub async fn home(&self) -> Result<(), SequenceError> {
        let _guard = CleanupGuard { engine: self };
        let max_steps = self.config.machine.home_max_steps;
        let step_delay = self.config.machine.home_step_delay();

        self.progress.send_modify(|p| {
            p.homed = false;
            p.phase = EnginePhase::Homing;
        });
        self.motor.set_enabled(true);
        info!(max_steps, "homing magazine");

        for step in 1..=max_steps {
            if let Err(fault) = self
                .motor
                .move_axis(Axis::Magazine, Direction::Backward, 1, step_delay)
                .await
            {
                HOMING_ATTEMPTS.with_label_values(&["fault"]).inc();
                error!(step, error = %fault, "homing aborted");
                return Err(fault.into());
            }

            if self.sensor.read() == SensorState::Asserted {
                self.progress.send_modify(|p| {
                    p.position = 0;
                    p.resume_slot = 1;
                    p.eject_pending = false;
                    p.homed = true;
                });
                HOMING_ATTEMPTS.with_label_values(&["success"]).inc();
                info!(steps = step, "magazine homed");
                return Ok(());
            }
        }

        HOMING_ATTEMPTS.with_label_values(&["timeout"]).inc();
        warn!(max_steps, "reference switch not reached");
        Err(SequenceError::HomingTimeout { steps: max_steps })
    }

    /// Process slots `start_slot..=magazine_size`.
    ///
    /// `start_slot` may be one past the last slot, which only finishes a card
    /// left under the camera and returns the magazine. `on_card` is called
    /// after a slot's record exists and before the card is ejected.
    pub async fn run(
        &self,
        start_slot: u32,
        label: &str,
        cancel: &AtomicBool,
        on_card: SlotCallback,
    ) -> Result<RunOutcome, SequenceError> {
        let magazine_size = self.magazine_size();
        if start_slot == 0 || start_slot > magazine_size + 1 {
            return Err(SequenceError::InvalidStartSlot {
                slot: start_slot,
                magazine_size,
            });
        }

        let _guard = CleanupGuard { engine: self };
        self.motor.set_enabled(true);
        info!(label, start_slot, magazine_size, "run started");

        let mut slots_processed = 0;
        let result = self
            .process(start_slot, label, cancel, &on_card, &mut slots_processed)
            .await;

        match result {
            Ok(outcome) => Ok(outcome),
            Err(SequenceError::Motor(MotorFault::Disabled { axis })) if cancel.load(Ordering::SeqCst) => {
                let slot = self.progress().position;
                info!(%axis, slot, "run halted by emergency stop");
                Ok(RunOutcome::Stopped {
                    checkpoint: Checkpoint::Emergency,
                    slot,
                    slots_processed,
                })
            }
            Err(e) => {
                error!(label, error = %e, "run aborted");
                Err(e)
            }
        }
    }

    async fn process(
        &self,
        start_slot: u32,
        label: &str,
        cancel: &AtomicBool,
        on_card: &SlotCallback,
        slots_processed: &mut u32,
    ) -> Result<RunOutcome, SequenceError> {
        let machine = &self.config.machine;
        let magazine_size = machine.magazine_size;
        let step_delay = machine.step_delay();

        // A card recorded by the previous run is still under the camera.
        let previous = self.progress();
        if previous.eject_pending {
            let slot = previous.position;
            info!(slot, "ejecting card left by previous run");
            self.eject(slot).await?;
            if slot < magazine_size {
                self.advance(slot).await?;
            }
        }

        for slot in start_slot..=magazine_size {
            if cancel.load(Ordering::SeqCst) {
                info!(slot, "run stopped before separating");
                return Ok(RunOutcome::Stopped {
                    checkpoint: Checkpoint::BeforeSeparate,
                    slot,
                    slots_processed: *slots_processed,
                });
            }

            self.set_phase(EnginePhase::Processing { slot });
            self.drive(Axis::Cards, Direction::Forward, machine.separate_steps, step_delay)
                .await?;

            let image_path = self.image_path(label, slot);
            let captured_at = Utc::now();
            if let Err(e) = self.camera.capture(&image_path).await {
                CAPTURE_FAILURES.inc();
                error!(slot, camera = self.camera.name(), error = %e, "capture failed");
                return Err(e.into());
            }

            let timer = RECOGNITION_DURATION.start_timer();
            let recognized = self.recognizer.recognize(&image_path).await;
            timer.observe_duration();

            let (card, placeholder) = match recognized {
                Ok(card) => (card, false),
                Err(e) => {
                    warn!(
                        slot,
                        provider = self.recognizer.provider(),
                        error = %e,
                        "recognition failed, recording placeholder"
                    );
                    (CardFields::unknown(), true)
                }
            };
            SLOTS_PROCESSED
                .with_label_values(&[if placeholder { "placeholder" } else { "recognized" }])
                .inc();

            self.progress.send_modify(|p| {
                p.position = slot;
                p.resume_slot = slot + 1;
                p.eject_pending = true;
            });
            *slots_processed += 1;
            debug!(slot, placeholder, image = %image_path.display(), "slot recorded");

            on_card(ProcessedCard {
                slot,
                captured_at,
                image_path,
                card,
                placeholder,
            });

            if cancel.load(Ordering::SeqCst) {
                info!(slot, "run stopped before ejecting");
                return Ok(RunOutcome::Stopped {
                    checkpoint: Checkpoint::AfterRecognition,
                    slot,
                    slots_processed: *slots_processed,
                });
            }

            self.eject(slot).await?;
            if slot < magazine_size {
                self.advance(slot).await?;
            }
        }

        self.set_phase(EnginePhase::Returning);
        if let Err(fault) = self
            .drive(
                Axis::Magazine,
                Direction::Backward,
                machine.return_steps,
                step_delay,
            )
            .await
        {
            warn!(error = %fault, "magazine return failed");
        }

        info!(label, slots_processed = *slots_processed, "run completed");
        Ok(RunOutcome::Completed {
            slots_processed: *slots_processed,
        })
    }

    async fn eject(&self, slot: u32) -> Result<(), MotorFault> {
        let machine = &self.config.machine;
        self.set_phase(EnginePhase::Ejecting { slot });
        self.drive(
            Axis::Cards,
            Direction::Forward,
            machine.output_steps,
            machine.step_delay(),
        )
        .await?;
        self.progress.send_modify(|p| p.eject_pending = false);
        Ok(())
    }

    async fn advance(&self, slot: u32) -> Result<(), MotorFault> {
        let machine = &self.config.machine;
        self.set_phase(EnginePhase::Advancing { slot });
        self.drive(
            Axis::Magazine,
            Direction::Forward,
            machine.move_steps,
            machine.step_delay(),
        )
        .await?;
        self.progress.send_modify(|p| {
            p.position = slot + 1;
            p.resume_slot = slot + 1;
        });
        Ok(())
    }

    /// `<image_dir>/<label>_<slot>_<timestamp>.<ext>`, label reduced to
    /// file-name safe characters.
    fn image_path(&self, label: &str, slot: u32) -> PathBuf {
        let label: String = label
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        let timestamp = Utc::now().format("%Y%m%d_%H%M%S%3f");
        self.config.image_dir.join(format!(
            "{}_{:03}_{}.{}",
            label, slot, timestamp, self.config.image_extension
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockCamera, MockHomeSensor, MockMotorDriver, MockRecognizer};

    fn engine() -> SequenceEngine {
        SequenceEngine::new(
            SequenceConfig::default(),
            Arc::new(MockMotorDriver::new()),
            Arc::new(MockHomeSensor::after_reads(0)),
            Arc::new(MockCamera::new()),
            Arc::new(MockRecognizer::new()),
        )
    }

    #[test]
    fn test_image_path_sanitizes_label() {
        let engine = engine();
        let path = engine.image_path("A/b c", 7);
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(path.starts_with("images"));
        assert!(name.starts_with("A_b_c_007_"), "{}", name);
        assert!(name.ends_with(".jpg"));
    }

    #[tokio::test]
    async fn test_invalid_start_slot() {
        let engine = engine();
        let cancel = AtomicBool::new(false);
        let noop: SlotCallback = Arc::new(|_| {});

        let err = engine.run(0, "A", &cancel, noop.clone()).await.unwrap_err();
        assert!(matches!(err, SequenceError::InvalidStartSlot { slot: 0, .. }));

        let err = engine.run(72, "A", &cancel, noop).await.unwrap_err();
        assert!(matches!(
            err,
            SequenceError::InvalidStartSlot {
                slot: 72,
                magazine_size: 70
            }
        ));
    }

    #[test]
    fn test_cleanup_idempotent() {
        let engine = engine();
        engine.cleanup();
        engine.cleanup();
        assert_eq!(engine.progress(), Progress::default());
    }
}
