//! Submission listing, deletion and the public read-only projection.

use axum::{Form, Json, extract::State};
use mindwell_core::models::submission::{PublicSubmission, Submission};
use mindwell_core::repository::SubmissionRepository;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::info;

use crate::{error::AppError, session::RequireUser, state::AppState};

#[derive(Debug, Serialize)]
pub struct SubmissionList<T> {
    submissions: Vec<T>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteForm {
    #[serde(rename = "userEmail")]
    user_email: Option<String>,
}

/// `GET /submissions`, newest first.
pub async fn list(
    State(state): State<AppState>,
    RequireUser(_): RequireUser,
) -> Result<Json<SubmissionList<Submission>>, AppError> {
    let mut submissions = state.submissions.scan_all().await?;
    submissions.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
    Ok(Json(SubmissionList { submissions }))
}

/// `POST /submissions`: delete the record keyed by `userEmail`.
///
/// Any signed-in user may delete any record.
pub async fn delete(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Form(form): Form<DeleteForm>,
) -> Result<Json<Value>, AppError> {
    let Some(user_email) = form.user_email.filter(|e| !e.trim().is_empty()) else {
        return Err(AppError::Validation("Invalid email".into()));
    };

    state.submissions.delete_by_key(&user_email).await?;

    info!(deleted = %user_email, by = %user.user_id, "Submission deleted");

    Ok(Json(json!({ "success": true })))
}

/// `GET /api/submissions`: contact fields only, no session required.
pub async fn public_list(
    State(state): State<AppState>,
) -> Result<Json<SubmissionList<PublicSubmission>>, AppError> {
    let submissions = state
        .submissions
        .scan_all()
        .await?
        .iter()
        .map(PublicSubmission::from)
        .collect();
    Ok(Json(SubmissionList { submissions }))
}
