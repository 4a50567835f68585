//! Machine geometry and timing.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Step counts and timings of the sorting machine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MachineConfig {
    /// Number of slots in one magazine.
    #[serde(default = "default_magazine_size")]
    pub magazine_size: u32,

    /// Card axis steps that push one card out of the magazine under the camera.
    #[serde(default = "default_separate_steps")]
    pub separate_steps: u32,

    /// Card axis steps that eject the photographed card.
    #[serde(default = "default_output_steps")]
    pub output_steps: u32,

    /// Magazine axis steps between two slots.
    #[serde(default = "default_move_steps")]
    pub move_steps: u32,

    /// Magazine axis steps back towards the start after a full pass.
    #[serde(default = "default_return_steps")]
    pub return_steps: u32,

    /// Homing gives up after this many single steps.
    #[serde(default = "default_home_max_steps")]
    pub home_max_steps: u32,

    /// Half period of a step pulse in microseconds.
    #[serde(default = "default_step_delay_us")]
    pub step_delay_us: u64,

    /// Half period of a step pulse while homing, in microseconds.
    #[serde(default = "default_step_delay_us")]
    pub home_step_delay_us: u64,
}

fn default_magazine_size() -> u32 {
    70
}

fn default_separate_steps() -> u32 {
    200
}

fn default_output_steps() -> u32 {
    200
}

fn default_move_steps() -> u32 {
    100
}

fn default_return_steps() -> u32 {
    7000
}

fn default_home_max_steps() -> u32 {
    10_000
}

fn default_step_delay_us() -> u64 {
    5000
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            magazine_size: default_magazine_size(),
            separate_steps: default_separate_steps(),
            output_steps: default_output_steps(),
            move_steps: default_move_steps(),
            return_steps: default_return_steps(),
            home_max_steps: default_home_max_steps(),
            step_delay_us: default_step_delay_us(),
            home_step_delay_us: default_step_delay_us(),
        }
    }
}

impl MachineConfig {
    pub fn step_delay(&self) -> Duration {
        Duration::from_micros(self.step_delay_us)
    }

    pub fn home_step_delay(&self) -> Duration {
        Duration::from_micros(self.home_step_delay_us)
    }
}

/// Everything the sequence engine needs besides its collaborators.
#[derive(Debug, Clone)]
pub struct SequenceConfig {
    pub machine: MachineConfig,
    /// Directory captured images are written to.
    pub image_dir: PathBuf,
    /// Image file extension without the dot.
    pub image_extension: String,
}

impl Default for SequenceConfig {
    fn default() -> Self {
        Self {
            machine: MachineConfig::default(),
            image_dir: PathBuf::from("images"),
            image_extension: "jpg".to_string(),
        }
    }
}
