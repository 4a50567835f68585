use super::{types::Config, ConfigError};
use crate::camera::CameraBackend;
use crate::recognizer::RecognizerBackend;

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Magazine holds at least one slot and homing has a step budget
/// - Command camera has a program
/// - Gemini recognizer has an API key
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.machine.magazine_size == 0 {
        return Err(ConfigError::ValidationError(
            "machine.magazine_size must be at least 1".to_string(),
        ));
    }

    if config.machine.home_max_steps == 0 {
        return Err(ConfigError::ValidationError(
            "machine.home_max_steps must be at least 1".to_string(),
        ));
    }

    if config.camera.backend == CameraBackend::Command && config.camera.program.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "camera.program is required for the command camera".to_string(),
        ));
    }

    if config.recognizer.backend == RecognizerBackend::Gemini {
        let has_key = config
            .recognizer
            .gemini
            .as_ref()
            .is_some_and(|g| !g.api_key.is_empty());
        if !has_key {
            return Err(ConfigError::ValidationError(
                "recognizer.gemini.api_key is required when backend = \"gemini\"".to_string(),
            ));
        }
    }

    Ok(())
}
