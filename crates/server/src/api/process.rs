//! Run control handlers.

use axum::{body::Bytes, extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

use cardsort_core::{RunStatus, SequenceError, StartOptions, SupervisorError};

use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for starting a run
#[derive(Debug, Deserialize)]
pub struct StartBody {
    /// Magazine label stamped on every record
    pub label: String,
    /// Re-home and start at slot 1 even if a resume is possible
    #[serde(default)]
    pub force_home: bool,
}

#[derive(Debug, Serialize)]
pub struct StartResponse {
    pub status: String,
    pub run_id: Uuid,
    pub start_slot: u32,
    pub homed: bool,
}

/// Request body for stopping a run
#[derive(Debug, Default, Deserialize)]
pub struct StopBody {
    /// Disable the motors immediately instead of waiting for a checkpoint
    #[serde(default)]
    pub emergency: bool,
}

#[derive(Debug, Serialize)]
pub struct StopResponse {
    pub status: String,
    pub emergency: bool,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ProcessErrorResponse {
    pub error: String,
}

fn start_error_status(error: &SupervisorError) -> StatusCode {
    match error {
        SupervisorError::AlreadyRunning => StatusCode::CONFLICT,
        SupervisorError::InvalidLabel => StatusCode::BAD_REQUEST,
        SupervisorError::Sequence(SequenceError::InvalidStartSlot { .. }) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        SupervisorError::Sequence(_) => StatusCode::SERVICE_UNAVAILABLE,
        SupervisorError::Export(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Start or resume a run
pub async fn start(
    State(state): State<Arc<AppState>>,
    Json(body): Json<StartBody>,
) -> Result<(StatusCode, Json<StartResponse>), impl IntoResponse> {
    let options = StartOptions {
        force_home: body.force_home,
    };

    match state.supervisor().start(&body.label, options).await {
        Ok(report) => {
            state.ws_broadcaster().run_started(
                report.run_id,
                body.label.trim(),
                report.start_slot,
                report.homed,
            );
            Ok((
                StatusCode::ACCEPTED,
                Json(StartResponse {
                    status: "started".to_string(),
                    run_id: report.run_id,
                    start_slot: report.start_slot,
                    homed: report.homed,
                }),
            ))
        }
        Err(e) => {
            warn!(error = %e, "start rejected");
            Err((
                start_error_status(&e),
                Json(ProcessErrorResponse {
                    error: e.to_string(),
                }),
            ))
        }
    }
}

/// Request a stop. Returns immediately. An empty body means a cooperative stop.
pub async fn stop(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<StopResponse>, (StatusCode, Json<ProcessErrorResponse>)> {
    let body: StopBody = if body.is_empty() {
        StopBody::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| {
            (
                StatusCode::BAD_REQUEST,
                Json(ProcessErrorResponse {
                    error: format!("Invalid stop request: {}", e),
                }),
            )
        })?
    };
    state.supervisor().stop(body.emergency);
    state.ws_broadcaster().stop_requested(body.emergency);

    Ok(Json(StopResponse {
        status: "stopping".to_string(),
        emergency: body.emergency,
    }))
}

/// Poll the run status. Hands out a pending notification once.
pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<RunStatus> {
    Json(state.supervisor().status())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardsort_core::{Axis, MotorFault};

    #[test]
    fn test_start_error_status() {
        assert_eq!(
            start_error_status(&SupervisorError::AlreadyRunning),
            StatusCode::CONFLICT
        );
        assert_eq!(
            start_error_status(&SupervisorError::InvalidLabel),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            start_error_status(&SupervisorError::Sequence(SequenceError::HomingTimeout {
                steps: 10
            })),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            start_error_status(&SupervisorError::Sequence(SequenceError::Motor(
                MotorFault::Disabled {
                    axis: Axis::Magazine
                }
            ))),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
