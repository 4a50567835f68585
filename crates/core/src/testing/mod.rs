//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of every collaborator trait the
//! sequence engine and the supervisor depend on, so full runs can be driven
//! in tests without hardware, a camera or a recognition service.
//!
//! # Example
//!
//! ```rust,ignore
//! use cardsort_core::testing::{fixtures, MockCamera, MockHomeSensor, MockMotorDriver, MockRecognizer};
//!
//! let motor = Arc::new(MockMotorDriver::new());
//! let recognizer = Arc::new(MockRecognizer::new());
//! recognizer.fail_on_call(2).await;
//!
//! let engine = SequenceEngine::new(
//!     fixtures::sequence_config(3, dir.path()),
//!     motor.clone(),
//!     Arc::new(MockHomeSensor::after_reads(0)),
//!     Arc::new(MockCamera::new()),
//!     recognizer.clone(),
//! );
//! ```

mod mock_camera;
mod mock_exporter;
mod mock_motor;
mod mock_recognizer;

pub use mock_camera::MockCamera;
pub use mock_exporter::{MockCsvExporter, RecordedExport};
pub use mock_motor::{MockHomeSensor, MockMotorDriver, MoveHook, RecordedMove};
pub use mock_recognizer::{MockRecognizer, RecognizeHook};

/// Test fixtures and helper functions.
pub mod fixtures {
    use chrono::Utc;
    use std::path::{Path, PathBuf};
    use uuid::Uuid;

    use crate::recognizer::CardFields;
    use crate::sorter::{CardRecord, MachineConfig, SequenceConfig};

    /// Create a record with placeholder fields.
    pub fn card_record(label: &str, slot: u32) -> CardRecord {
        let now = Utc::now();
        CardRecord {
            run_id: Uuid::nil(),
            label: label.to_string(),
            slot,
            captured_at: now,
            recorded_at: now,
            image_path: PathBuf::from(format!("images/{}_{:03}.jpg", label, slot)),
            card: CardFields::unknown(),
            placeholder: false,
        }
    }

    /// Machine geometry with distinct step counts and no step delays.
    pub fn machine_config(magazine_size: u32) -> MachineConfig {
        MachineConfig {
            magazine_size,
            separate_steps: 200,
            output_steps: 150,
            move_steps: 100,
            return_steps: 7000,
            home_max_steps: 50,
            step_delay_us: 0,
            home_step_delay_us: 0,
        }
    }

    /// Engine configuration writing images below `image_dir`.
    pub fn sequence_config(magazine_size: u32, image_dir: &Path) -> SequenceConfig {
        SequenceConfig {
            machine: machine_config(magazine_size),
            image_dir: image_dir.to_path_buf(),
            image_extension: "jpg".to_string(),
        }
    }
}
