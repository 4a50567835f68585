//! Common test utilities for E2E testing with mocks.
//!
//! This module provides a test fixture that creates an in-process server
//! with mock hardware, camera and recognizer injected, enabling E2E testing
//! of the HTTP surface without a machine attached.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use cardsort_core::{
    recognizer::{GeminiConfig, RecognizerBackend, RecognizerConfig},
    testing::{MockCamera, MockCsvExporter, MockHomeSensor, MockMotorDriver, MockRecognizer},
    Config, CsvExporter, ExportConfig, RunSupervisor, SemicolonCsvExporter, SequenceEngine,
    ServerConfig,
};

use cardsort_server::api::{create_router, WsBroadcaster};
use cardsort_server::state::AppState;

/// Re-export fixtures for test convenience
pub use cardsort_core::testing::fixtures;

/// API key placed in the test config; must never show up in responses.
pub const SECRET_KEY: &str = "test-secret-key";

/// Test fixture for E2E testing with mock dependencies.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_start() {
///     let fixture = TestFixture::new().await;
///
///     let response = fixture.post("/api/v1/process/start", json!({ "label": "A" })).await;
///
///     assert_eq!(response.status, 202);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Supervisor behind the router, for waiting on runs
    pub supervisor: Arc<RunSupervisor>,
    pub motor: Arc<MockMotorDriver>,
    pub camera: Arc<MockCamera>,
    pub recognizer: Arc<MockRecognizer>,
    /// Set when the fixture was built with a mock exporter
    pub exporter: Option<Arc<MockCsvExporter>>,
    pub broadcaster: WsBroadcaster,
    /// Temporary directory for images and exports
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    /// Create a new test fixture with default mocks.
    pub async fn new() -> Self {
        Self::with_config(TestConfig::default()).await
    }

    /// Create a test fixture with custom configuration.
    pub async fn with_config(test_config: TestConfig) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let export_dir = temp_dir.path().join("exports");

        let motor = Arc::new(MockMotorDriver::new());
        let camera = Arc::new(MockCamera::new());
        let recognizer = Arc::new(MockRecognizer::new());

        let config = Config {
            server: ServerConfig {
                host: std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
                port: 0, // Not used for in-process testing
                status_push_interval_ms: 1000,
            },
            machine: fixtures::machine_config(test_config.magazine_size),
            recognizer: RecognizerConfig {
                backend: RecognizerBackend::Gemini,
                gemini: Some(GeminiConfig {
                    api_key: SECRET_KEY.to_string(),
                    ..Default::default()
                }),
            },
            export: ExportConfig {
                dir: export_dir.clone(),
                ..Default::default()
            },
            ..Default::default()
        };

        let (exporter, mock_exporter): (Arc<dyn CsvExporter>, _) = if test_config.mock_exporter {
            let mock = Arc::new(MockCsvExporter::new());
            (mock.clone() as Arc<dyn CsvExporter>, Some(mock))
        } else {
            (
                Arc::new(SemicolonCsvExporter::new(&config.export)) as Arc<dyn CsvExporter>,
                None,
            )
        };

        let sensor = match test_config.home_after_reads {
            Some(reads) => MockHomeSensor::after_reads(reads),
            None => MockHomeSensor::never(),
        };

        let engine = SequenceEngine::new(
            fixtures::sequence_config(
                test_config.magazine_size,
                &temp_dir.path().join("images"),
            ),
            motor.clone(),
            Arc::new(sensor),
            camera.clone(),
            recognizer.clone(),
        );

        let broadcaster = WsBroadcaster::default();
        let observer_broadcaster = broadcaster.clone();
        let supervisor = Arc::new(
            RunSupervisor::new(engine, exporter, export_dir).with_record_observer(Arc::new(
                move |record: &cardsort_core::CardRecord| {
                    observer_broadcaster.card_recorded(record)
                },
            )),
        );

        let state = Arc::new(AppState::new(
            config,
            Arc::clone(&supervisor),
            broadcaster.clone(),
        ));

        let router = create_router(state);

        Self {
            router,
            supervisor,
            motor,
            camera,
            recognizer,
            exporter: mock_exporter,
            broadcaster,
            temp_dir,
        }
    }

    /// Wait until the supervisor reports no live run.
    pub async fn wait_idle(&self) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while self.supervisor.is_running() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("run did not finish in time");
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a POST request without a body.
    pub async fn post_empty(&self, path: &str) -> TestResponse {
        self.request("POST", path, None).await
    }

    /// Send a POST request with raw string body (for testing malformed JSON).
    pub async fn post_raw(&self, path: &str, body: &str) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();

        self.send(request).await
    }

    /// Send a GET request and return the raw body text.
    pub async fn get_text(&self, path: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        (status, String::from_utf8_lossy(&bytes).to_string())
    }

    /// Send a request to the test server.
    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        let request = request_builder.body(body).unwrap();
        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }
}

/// Configuration for test fixture.
#[derive(Debug, Clone)]
pub struct TestConfig {
    pub magazine_size: u32,
    /// Sensor reads before home asserts; `None` never homes
    pub home_after_reads: Option<u32>,
    /// Use a mock exporter instead of writing CSV files
    pub mock_exporter: bool,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            magazine_size: 3,
            home_after_reads: Some(0),
            mock_exporter: false,
        }
    }
}

impl TestConfig {
    /// Create config whose home sensor never asserts.
    pub fn never_homes() -> Self {
        Self {
            home_after_reads: None,
            ..Default::default()
        }
    }

    /// Create config with a mock exporter.
    pub fn with_mock_exporter() -> Self {
        Self {
            mock_exporter: true,
            ..Default::default()
        }
    }
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}

/// Helper to assert a JSON path equals expected value.
#[macro_export]
macro_rules! assert_json_path {
    ($json:expr, $path:expr, $expected:expr) => {
        let actual = &$json[$path];
        assert_eq!(
            actual, &$expected,
            "Path '{}' expected {:?}, got {:?}",
            $path, $expected, actual
        );
    };
}
