//! Mock motor driver and home sensor for testing.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::hardware::{Axis, Direction, HomeSensor, MotorDriver, MotorFault, SensorState};

/// A recorded motor move for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedMove {
    pub axis: Axis,
    pub direction: Direction,
    pub steps: u32,
}

/// Called after every successful move.
pub type MoveHook = Arc<dyn Fn(&RecordedMove) + Send + Sync>;

/// Mock implementation of the MotorDriver trait.
///
/// Provides controllable behavior for testing:
/// - Track moves and enable transitions for assertions
/// - Refuse moves while disabled, like the real drivers
/// - Inject faults and delays
/// - Run a hook after each move (e.g. to request a stop at a precise point)
///
/// # Example
///
/// ```rust,ignore
/// use cardsort_core::testing::MockMotorDriver;
///
/// let motor = Arc::new(MockMotorDriver::new());
/// // ... run the engine ...
/// let moves = motor.recorded_moves();
/// assert_eq!(moves[0].axis, Axis::Cards);
/// assert!(!motor.is_enabled());
/// ```
pub struct MockMotorDriver {
    enabled: AtomicBool,
    moves: Mutex<Vec<RecordedMove>>,
    enable_log: Mutex<Vec<bool>>,
    /// If set, the next move will fail with this fault.
    next_error: Mutex<Option<MotorFault>>,
    /// Fail the n-th move (1-based) with the given fault.
    fail_on_move: Mutex<Option<(usize, MotorFault)>>,
    move_delay: Mutex<Duration>,
    hook: Mutex<Option<MoveHook>>,
}

impl std::fmt::Debug for MockMotorDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockMotorDriver")
            .field("enabled", &self.enabled)
            .field("moves", &"<moves>")
            .field("hook", &"<hook>")
            .finish()
    }
}

impl Default for MockMotorDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl MockMotorDriver {
    pub fn new() -> Self {
        Self {
            enabled: AtomicBool::new(false),
            moves: Mutex::new(Vec::new()),
            enable_log: Mutex::new(Vec::new()),
            next_error: Mutex::new(None),
            fail_on_move: Mutex::new(None),
            move_delay: Mutex::new(Duration::ZERO),
            hook: Mutex::new(None),
        }
    }

    /// Make the next move fail.
    pub fn set_next_error(&self, fault: MotorFault) {
        *self.next_error.lock().unwrap() = Some(fault);
    }

    /// Make the n-th move (1-based, counted over the driver's lifetime) fail.
    pub fn fail_on_move(&self, n: usize, fault: MotorFault) {
        *self.fail_on_move.lock().unwrap() = Some((n, fault));
    }

    /// Sleep this long in every move.
    pub fn set_move_delay(&self, delay: Duration) {
        *self.move_delay.lock().unwrap() = delay;
    }

    pub fn set_hook(&self, hook: MoveHook) {
        *self.hook.lock().unwrap() = Some(hook);
    }

    /// All successful moves in order.
    pub fn recorded_moves(&self) -> Vec<RecordedMove> {
        self.moves.lock().unwrap().clone()
    }

    /// Successful moves on one axis in one direction.
    pub fn moves_on(&self, axis: Axis, direction: Direction) -> Vec<RecordedMove> {
        self.recorded_moves()
            .into_iter()
            .filter(|m| m.axis == axis && m.direction == direction)
            .collect()
    }

    /// Every `set_enabled` call in order.
    pub fn enable_transitions(&self) -> Vec<bool> {
        self.enable_log.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.moves.lock().unwrap().clear();
        self.enable_log.lock().unwrap().clear();
    }
}

#[async_trait]
impl MotorDriver for MockMotorDriver {
    fn name(&self) -> &str {
        "mock"
    }

    async fn move_axis(
        &self,
        axis: Axis,
        direction: Direction,
        steps: u32,
        _step_delay: Duration,
    ) -> Result<(), MotorFault> {
        if !self.enabled.load(Ordering::SeqCst) {
            return Err(MotorFault::Disabled { axis });
        }

        if let Some(fault) = self.next_error.lock().unwrap().take() {
            return Err(fault);
        }

        let attempt = self.moves.lock().unwrap().len() + 1;
        {
            let mut fail_on = self.fail_on_move.lock().unwrap();
            if fail_on.as_ref().is_some_and(|(n, _)| *n == attempt) {
                if let Some((_, fault)) = fail_on.take() {
                    return Err(fault);
                }
            }
        }

        let delay = *self.move_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let recorded = RecordedMove {
            axis,
            direction,
            steps,
        };
        self.moves.lock().unwrap().push(recorded.clone());

        let hook = self.hook.lock().unwrap().clone();
        if let Some(hook) = hook {
            hook(&recorded);
        }
        Ok(())
    }

    fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
        self.enable_log.lock().unwrap().push(enabled);
    }

    fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }
}

/// Mock implementation of the HomeSensor trait.
#[derive(Debug)]
pub struct MockHomeSensor {
    reads: AtomicU32,
    /// `None` never asserts.
    assert_after: Option<u32>,
}

impl MockHomeSensor {
    /// Asserts once more than `reads` reads were made, and stays asserted.
    pub fn after_reads(reads: u32) -> Self {
        Self {
            reads: AtomicU32::new(0),
            assert_after: Some(reads),
        }
    }

    /// Never asserts; homing always times out.
    pub fn never() -> Self {
        Self {
            reads: AtomicU32::new(0),
            assert_after: None,
        }
    }

    pub fn read_count(&self) -> u32 {
        self.reads.load(Ordering::SeqCst)
    }
}

impl HomeSensor for MockHomeSensor {
    fn read(&self) -> SensorState {
        let reads = self.reads.fetch_add(1, Ordering::SeqCst) + 1;
        match self.assert_after {
            Some(after) if reads > after => SensorState::Asserted,
            _ => SensorState::NotAsserted,
        }
    }
}
