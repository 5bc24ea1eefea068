use crate::dto::user_dto::{ResetProblemsResponse, SeedPayload, SeedResponse};
use crate::error::Result;
use crate::services::generator::UserGenerator;
use crate::services::seed_service::DEFAULT_SEED_TOTAL;
use crate::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use validator::Validate;

pub async fn seed_users(
    State(state): State<AppState>,
    payload: Option<Json<SeedPayload>>,
) -> Result<impl IntoResponse> {
    let payload = payload.map(|Json(p)| p).unwrap_or_default();
    payload.validate()?;

    let total = payload.total.unwrap_or(DEFAULT_SEED_TOTAL);
    let generator = match payload.seed {
        Some(seed) => UserGenerator::new(seed),
        None => UserGenerator::from_entropy(),
    };

    tracing::info!(total, "seed request received");
    let report = state.seed_service.run(total, generator).await?;

    let message = if report.cancelled {
        format!(
            "Seeding cancelled after {} of {} users",
            report.inserted, report.requested
        )
    } else {
        format!("Successfully seeded {} users", report.inserted)
    };

    Ok((
        StatusCode::OK,
        Json(SeedResponse {
            message,
            requested: report.requested,
            inserted: report.inserted,
            batches: report.batches,
            cancelled: report.cancelled,
            elapsed_ms: report.elapsed.as_millis() as u64,
        }),
    ))
}

pub async fn reset_problems(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let count = state.problem_service.reset_problems().await?;

    Ok((
        StatusCode::OK,
        Json(ResetProblemsResponse {
            message: format!("Cleared the problems flag for {} users", count),
            users_with_problems: count,
        }),
    ))
}
