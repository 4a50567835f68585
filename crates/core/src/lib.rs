pub mod camera;
pub mod config;
pub mod export;
pub mod hardware;
pub mod metrics;
pub mod recognizer;
pub mod sorter;
pub mod testing;

pub use camera::{create_camera, CameraBackend, CameraConfig, CameraService, CaptureError};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, HardwareBackend,
    HardwareConfig, SanitizedConfig, ServerConfig,
};
pub use export::{CsvExporter, ExportConfig, ExportError, SemicolonCsvExporter};
pub use hardware::{
    create_drivers, Axis, Direction, HomeSensor, MotorDriver, MotorFault, SensorState,
};
pub use recognizer::{create_recognizer, CardFields, RecognitionError, Recognizer};
pub use sorter::{
    CardRecord, EnginePhase, Notification, Progress, RunOutcome, RunStatus, RunSupervisor,
    SequenceEngine, SequenceError, StartOptions, StartReport, SupervisorError,
};
