use axum::{
    extract::{Path, State},
    routing::post,
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::services::jobs;
use crate::state::AppState;

pub fn jobs_routes(state: AppState) -> Router {
    Router::new()
        .route("/{job}/run", post(run_job))
        .with_state(state)
}

#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
pub struct RunJobRequest {
    /// Evaluation date override, `YYYY-MM-DD`. Defaults to today.
    pub as_of: Option<NaiveDate>,
}

/// Trigger one job run by name, synchronously, and return its summary.
/// Safe to race against the scheduler: the dedup log prevents double
/// notifications.
#[utoipa::path(
    post,
    path = "/api/jobs/{job}/run",
    tag = "Jobs",
    params(
        ("job" = String, Path, description = "Job name"),
    ),
    request_body = RunJobRequest,
    responses(
        (status = 200, body = serde_json::Value),
        (status = 404, description = "Unknown job name")
    )
)]
async fn run_job(
    State(state): State<AppState>,
    Path(job): Path<String>,
    body: Option<Json<RunJobRequest>>,
) -> Result<Json<serde_json::Value>> {
    let req = body.map(|Json(r)| r).unwrap_or_default();
    let as_of = req.as_of;

    let service = &state.notifications;

    let summary = match job.as_str() {
        "contract_expiration" => jobs::run_contract_expiration_check(service, as_of).await?,
        "invoice_overdue" => jobs::run_invoice_overdue_check(service, as_of).await?,
        "rent_increase" => jobs::run_rent_increase_check(service, as_of).await?,
        "invoice_due_soon" => jobs::run_invoice_due_soon_check(service, as_of).await?,
        "batch_dispatch" => {
            let as_of = as_of.and_then(|d| d.and_hms_opt(0, 0, 0)).map(|dt| dt.and_utc());
            let report = jobs::run_batch_dispatch(&state.batches, as_of).await?;
            return Ok(Json(serde_json::json!({ "job": job, "report": report })));
        }
        _ => {
            return Err(AppError::NotFound(format!("Unknown job: {}", job)));
        }
    };

    Ok(Json(serde_json::json!({ "job": job, "summary": summary })))
}
