//! Intake form: show the caller's submission and accept new posts.

use axum::{
    Form, Json,
    extract::State,
    response::{IntoResponse, Redirect},
};
use chrono::Utc;
use mindwell_auth::SessionUser;
use mindwell_core::intake::{FormFields, normalize_submission};
use mindwell_core::models::submission::Submission;
use mindwell_core::repository::SubmissionRepository;
use serde::Serialize;
use tracing::info;

use crate::{error::AppError, session::RequireUser, state::AppState};

pub const SUBMISSIONS_PATH: &str = "/submissions";

#[derive(Debug, Serialize)]
pub struct HomeResponse {
    user: SessionUser,
    submission: Option<Submission>,
}

/// `GET /`
pub async fn home(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<HomeResponse>, AppError> {
    let submission = state.submissions.get_by_key(&user.email).await?;
    Ok(Json(HomeResponse { user, submission }))
}

/// `POST /`
///
/// The body is decoded into ordered pairs so that repeated `concerns`
/// keys survive until normalization.
pub async fn submit(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<impl IntoResponse, AppError> {
    let submission =
        normalize_submission(&user.user_id, &user.email, FormFields::new(pairs), Utc::now())?;

    let stored = state.submissions.upsert(&user.email, submission).await?;

    info!(
        user_id = %stored.user_id,
        concerns = stored.concerns.len(),
        "Intake form submitted"
    );

    Ok(Redirect::to(SUBMISSIONS_PATH))
}
