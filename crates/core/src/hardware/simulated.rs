//! Simulated drivers for running the machine without hardware attached.
//!
//! Moves take as long as the real pulse train would, so run timing in the
//! dashboard looks like the real machine. Nothing is written to any pin.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::time::Duration;
use tracing::debug;

use super::error::MotorFault;
use super::traits::{Axis, Direction, HomeSensor, MotorDriver, SensorState};

/// Motor driver that only sleeps and counts steps.
#[derive(Debug, Default)]
pub struct SimulatedMotorDriver {
    enabled: AtomicBool,
    cards_steps: AtomicU64,
    magazine_steps: AtomicU64,
}

impl SimulatedMotorDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total steps issued on `axis` since creation, regardless of direction.
    pub fn steps_issued(&self, axis: Axis) -> u64 {
        match axis {
            Axis::Cards => self.cards_steps.load(Ordering::Relaxed),
            Axis::Magazine => self.magazine_steps.load(Ordering::Relaxed),
        }
    }
}

#[async_trait]
impl MotorDriver for SimulatedMotorDriver {
    fn name(&self) -> &str {
        "simulated"
    }

    async fn move_axis(
        &self,
        axis: Axis,
        direction: Direction,
        steps: u32,
        step_delay: Duration,
    ) -> Result<(), MotorFault> {
        if !self.enabled.load(Ordering::SeqCst) {
            return Err(MotorFault::Disabled { axis });
        }

        debug!(%axis, ?direction, steps, "simulated move");

        // One high and one low phase per step.
        let duration = step_delay.saturating_mul(steps.saturating_mul(2));
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }

        let counter = match axis {
            Axis::Cards => &self.cards_steps,
            Axis::Magazine => &self.magazine_steps,
        };
        counter.fetch_add(u64::from(steps), Ordering::Relaxed);
        Ok(())
    }

    fn set_enabled(&self, enabled: bool) {
        if self.enabled.swap(enabled, Ordering::SeqCst) != enabled {
            debug!(enabled, "simulated drivers toggled");
        }
    }

    fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }
}

/// Reference sensor that asserts once it has been read a number of times.
///
/// Mirrors a magazine that starts a few steps away from the switch and stays
/// there once it arrived.
#[derive(Debug)]
pub struct SimulatedHomeSensor {
    reads: AtomicU32,
    assert_after: u32,
}

impl SimulatedHomeSensor {
    pub fn new(assert_after: u32) -> Self {
        Self {
            reads: AtomicU32::new(0),
            assert_after,
        }
    }
}

impl HomeSensor for SimulatedHomeSensor {
    fn read(&self) -> SensorState {
        let reads = self.reads.fetch_add(1, Ordering::Relaxed) + 1;
        if reads > self.assert_after {
            SensorState::Asserted
        } else {
            SensorState::NotAsserted
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_move_requires_enable() {
        let driver = SimulatedMotorDriver::new();
        let result = driver
            .move_axis(Axis::Cards, Direction::Forward, 10, Duration::ZERO)
            .await;
        assert_eq!(result, Err(MotorFault::Disabled { axis: Axis::Cards }));

        driver.set_enabled(true);
        driver
            .move_axis(Axis::Cards, Direction::Forward, 10, Duration::ZERO)
            .await
            .unwrap();
        driver
            .move_axis(Axis::Magazine, Direction::Backward, 3, Duration::ZERO)
            .await
            .unwrap();

        assert_eq!(driver.steps_issued(Axis::Cards), 10);
        assert_eq!(driver.steps_issued(Axis::Magazine), 3);
    }

    #[test]
    fn test_set_enabled_idempotent() {
        let driver = SimulatedMotorDriver::new();
        driver.set_enabled(false);
        driver.set_enabled(false);
        assert!(!driver.is_enabled());
        driver.set_enabled(true);
        driver.set_enabled(true);
        assert!(driver.is_enabled());
    }

    #[test]
    fn test_sensor_asserts_after_reads() {
        let sensor = SimulatedHomeSensor::new(2);
        assert_eq!(sensor.read(), SensorState::NotAsserted);
        assert_eq!(sensor.read(), SensorState::NotAsserted);
        assert_eq!(sensor.read(), SensorState::Asserted);
        assert_eq!(sensor.read(), SensorState::Asserted);
    }
}
