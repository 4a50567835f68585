//! Still capture of the separated card.
//!
//! The sequence engine only needs "write a picture of whatever is under the
//! lens to this path". [`CommandCamera`] shells out to a capture program
//! (`libcamera-still` on the appliance), [`SimulatedCamera`] writes a stub
//! image for development without a sensor.

mod command;
mod config;
mod error;
mod simulated;
mod traits;

pub use command::CommandCamera;
pub use config::{CameraBackend, CameraConfig};
pub use error::CaptureError;
pub use simulated::SimulatedCamera;
pub use traits::CameraService;

use std::sync::Arc;

/// Factory function to create a camera from config
pub fn create_camera(config: &CameraConfig) -> Arc<dyn CameraService> {
    match config.backend {
        CameraBackend::Command => Arc::new(CommandCamera::new(config.clone())),
        CameraBackend::Simulated => Arc::new(SimulatedCamera::new()),
    }
}
