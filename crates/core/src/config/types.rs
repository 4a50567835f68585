use serde::{Deserialize, Serialize};
use std::net::IpAddr;

use crate::camera::CameraConfig;
use crate::export::ExportConfig;
use crate::recognizer::{RecognizerBackend, RecognizerConfig};
use crate::sorter::{MachineConfig, SequenceConfig};

/// Root configuration. Every section is optional.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub machine: MachineConfig,
    #[serde(default)]
    pub hardware: HardwareConfig,
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub recognizer: RecognizerConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

impl Config {
    /// Engine configuration derived from the machine and camera sections.
    pub fn sequence(&self) -> SequenceConfig {
        SequenceConfig {
            machine: self.machine.clone(),
            image_dir: self.camera.image_dir.clone(),
            image_extension: self.camera.extension.clone(),
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Interval of status pushes to WebSocket clients.
    #[serde(default = "default_status_push_interval")]
    pub status_push_interval_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            status_push_interval_ms: default_status_push_interval(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8080
}

fn default_status_push_interval() -> u64 {
    1000
}

/// Motor and sensor backend.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HardwareBackend {
    /// Timing-faithful drivers without pin access.
    #[default]
    Simulated,
    // Future: Gpio
}

/// Hardware configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HardwareConfig {
    #[serde(default)]
    pub backend: HardwareBackend,
    /// Reads before the simulated reference switch asserts.
    #[serde(default = "default_home_after_reads")]
    pub simulated_home_after_reads: u32,
}

impl Default for HardwareConfig {
    fn default() -> Self {
        Self {
            backend: HardwareBackend::default(),
            simulated_home_after_reads: default_home_after_reads(),
        }
    }
}

fn default_home_after_reads() -> u32 {
    5
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub machine: MachineConfig,
    pub hardware: HardwareConfig,
    pub camera: CameraConfig,
    pub recognizer: SanitizedRecognizerConfig,
    pub export: ExportConfig,
}

/// Sanitized recognizer config (API key hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedRecognizerConfig {
    pub backend: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gemini: Option<SanitizedGeminiConfig>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedGeminiConfig {
    pub model: String,
    pub api_base: String,
    pub api_key_configured: bool,
    pub timeout_secs: u64,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            machine: config.machine.clone(),
            hardware: config.hardware.clone(),
            camera: config.camera.clone(),
            recognizer: SanitizedRecognizerConfig {
                backend: match config.recognizer.backend {
                    RecognizerBackend::Gemini => "gemini".to_string(),
                    RecognizerBackend::None => "none".to_string(),
                },
                gemini: config
                    .recognizer
                    .gemini
                    .as_ref()
                    .map(|g| SanitizedGeminiConfig {
                        model: g.model.clone(),
                        api_base: g.api_base.clone(),
                        api_key_configured: !g.api_key.is_empty(),
                        timeout_secs: g.timeout_secs,
                    }),
            },
            export: config.export.clone(),
        }
    }
}
