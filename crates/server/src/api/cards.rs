//! Record history and export handlers.

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::error;

use cardsort_core::CardRecord;

use crate::state::AppState;

/// Query parameters for listing cards
#[derive(Debug, Deserialize)]
pub struct ListCardsParams {
    /// Only records of this magazine label
    pub label: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ListCardsResponse {
    pub cards: Vec<CardRecord>,
    pub total: usize,
}

/// Request body for exporting the history
#[derive(Debug, Default, Deserialize)]
pub struct ExportBody {
    /// Target file; defaults to a timestamped file in the export directory
    pub path: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
pub struct ExportResponse {
    pub csv_path: String,
    pub records: usize,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct CardsErrorResponse {
    pub error: String,
}

type ErrorReply = (StatusCode, Json<CardsErrorResponse>);

fn error_reply(status: StatusCode, error: impl Into<String>) -> ErrorReply {
    (
        status,
        Json(CardsErrorResponse {
            error: error.into(),
        }),
    )
}

/// List recorded cards in insertion order
pub async fn list_cards(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListCardsParams>,
) -> Json<ListCardsResponse> {
    let label = params
        .label
        .as_deref()
        .map(str::trim)
        .filter(|l| !l.is_empty());
    let cards = state.supervisor().get_records(label);
    let total = cards.len();
    Json(ListCardsResponse { cards, total })
}

/// Export the whole history as CSV, ordered by label and slot
pub async fn export(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<ExportResponse>, ErrorReply> {
    let body: ExportBody = if body.is_empty() {
        ExportBody::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| {
            error_reply(
                StatusCode::BAD_REQUEST,
                format!("Invalid export request: {}", e),
            )
        })?
    };

    match state.supervisor().export_history(body.path) {
        Ok(report) => Ok(Json(ExportResponse {
            csv_path: report.csv_path.display().to_string(),
            records: report.records,
        })),
        Err(e) => {
            error!(error = %e, "export failed");
            Err(error_reply(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}
