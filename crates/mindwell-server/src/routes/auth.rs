//! Sign-in, two-phase sign-up and sign-out.

use axum::{
    Form, Json,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::warn;

use crate::{
    error::{AppError, LOGIN_PATH},
    session::{HOME_PATH, MaybeUser, create_session, destroy_session},
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    email: Option<String>,
    password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SignupForm {
    #[serde(rename = "_action")]
    action: Option<String>,
    email: Option<String>,
    password: Option<String>,
    code: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VerificationRequired {
    verification_required: bool,
    email: String,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// `GET /login` and `GET /signup`: signed-in users go home.
pub async fn entry_page(MaybeUser(user): MaybeUser) -> Response {
    match user {
        Some(_) => Redirect::to(HOME_PATH).into_response(),
        None => Json(json!({})).into_response(),
    }
}

/// `POST /login`
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let (Some(email), Some(password)) = (non_blank(form.email), non_blank(form.password)) else {
        return Err(AppError::Validation("Email and password are required".into()));
    };

    let signed_in = state
        .identity
        .authenticate(&email, &password)
        .await
        .map_err(|failure| {
            warn!(reason = %failure, "Sign-in rejected");
            AppError::Identity("Invalid credentials".into())
        })?;

    create_session(&state, jar, &signed_in.user_id.to_string(), &signed_in.email)
}

/// `POST /signup`, dispatched on the `_action` field.
pub async fn signup(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<SignupForm>,
) -> Result<Response, AppError> {
    match form.action.as_deref() {
        Some("signup") => register(&state, form).await,
        Some("confirm") => confirm(&state, jar, form).await,
        Some("resend") => resend(&state, form).await,
        _ => Err(AppError::Validation("Unknown sign-up action".into())),
    }
}

async fn register(state: &AppState, form: SignupForm) -> Result<Response, AppError> {
    let (Some(email), Some(password)) = (non_blank(form.email), non_blank(form.password)) else {
        return Err(AppError::Validation("Email and password are required".into()));
    };

    let signup = state.identity.register(&email, &password).await?;

    Ok(Json(VerificationRequired {
        verification_required: true,
        email: signup.email,
    })
    .into_response())
}

async fn confirm(state: &AppState, jar: CookieJar, form: SignupForm) -> Result<Response, AppError> {
    let (Some(email), Some(code), Some(password)) = (
        non_blank(form.email),
        non_blank(form.code),
        non_blank(form.password),
    ) else {
        return Err(AppError::Validation(
            "Email, confirmation code, and password are required".into(),
        ));
    };

    state.identity.confirm_registration(&email, &code).await?;

    match state.identity.authenticate(&email, &password).await {
        Ok(signed_in) => {
            create_session(state, jar, &signed_in.user_id.to_string(), &signed_in.email)
        }
        Err(failure) => {
            warn!(reason = %failure, "Confirmed account could not sign in");
            Ok(Json(json!({
                "error": "Account confirmed but failed to sign in. Please go to login page.",
                "success": true,
            }))
            .into_response())
        }
    }
}

async fn resend(state: &AppState, form: SignupForm) -> Result<Response, AppError> {
    let Some(email) = non_blank(form.email) else {
        return Err(AppError::Validation("Email is required".into()));
    };

    state.identity.resend_confirmation_code(&email).await?;

    Ok(Json(json!({ "codeSent": true })).into_response())
}

/// `POST /logout`
pub async fn logout(jar: CookieJar) -> Response {
    destroy_session(jar)
}

/// `GET /logout`
pub async fn logout_page() -> Redirect {
    Redirect::to(LOGIN_PATH)
}

/// `GET /session`: the signed-in user or `null`.
pub async fn current_session(MaybeUser(user): MaybeUser) -> impl IntoResponse {
    Json(json!({ "user": user }))
}
