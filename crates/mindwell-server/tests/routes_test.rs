//! End-to-end tests of the HTTP routes against an in-memory store.

use std::sync::{Arc, Mutex};

use axum::{
    Router,
    body::Body,
    http::{Request, Response, StatusCode, header},
};
use http_body_util::BodyExt;
use mindwell_auth::{AuthConfig, ConfirmationNotifier};
use mindwell_db::DbConfig;
use mindwell_server::{app, config::ServerConfig, state::AppState};
use serde_json::{Value, json};
use tower::ServiceExt;

const ALLOWED_ORIGIN: &str = "https://mindwell.example";
const PASSWORD: &str = "correct-horse-battery";

#[derive(Clone, Default)]
struct RecordingNotifier {
    sent: Arc<Mutex<Vec<(String, String)>>>,
}

impl RecordingNotifier {
    fn code_for(&self, email: &str) -> String {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(e, _)| e == email)
            .map(|(_, code)| code.clone())
            .unwrap()
    }
}

impl ConfirmationNotifier for RecordingNotifier {
    fn send_confirmation_code(&self, email: &str, code: &str) {
        self.sent
            .lock()
            .unwrap()
            .push((email.to_string(), code.to_string()));
    }
}

struct TestApp {
    router: Router,
    notifier: RecordingNotifier,
}

impl TestApp {
    async fn new() -> Self {
        let config = ServerConfig {
            port: 0,
            db: DbConfig::default(),
            auth: AuthConfig {
                session_secret: "route-test-secret".into(),
                resend_cooldown_secs: 0,
                ..Default::default()
            },
            secure_cookies: false,
            allowed_origin: Some(ALLOWED_ORIGIN.into()),
        };
        let notifier = RecordingNotifier::default();
        let state = AppState::with_notifier(&config, Arc::new(notifier.clone()))
            .await
            .unwrap();
        let router = app(state, config.allowed_origin.as_deref()).unwrap();
        Self { router, notifier }
    }

    async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    async fn get(&self, uri: &str, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    async fn post_form(&self, uri: &str, body: &str, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap())
            .await
    }

    /// Register, confirm and return the `name=value` session cookie.
    async fn sign_up(&self, email: &str) -> String {
        let encoded = email.replace('@', "%40");
        let response = self
            .post_form(
                "/signup",
                &format!("_action=signup&email={encoded}&password={PASSWORD}"),
                None,
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);

        let code = self.notifier.code_for(email);
        let response = self
            .post_form(
                "/signup",
                &format!("_action=confirm&email={encoded}&code={code}&password={PASSWORD}"),
                None,
            )
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/");
        session_cookie(&response)
    }
}

fn location(response: &Response<Body>) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap()
}

fn session_cookie(response: &Response<Body>) -> String {
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("response should set a cookie")
        .to_str()
        .unwrap();
    set_cookie.split(';').next().unwrap().to_string()
}

async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// -----------------------------------------------------------------------
// Session gating
// -----------------------------------------------------------------------

#[tokio::test]
async fn unauthenticated_listing_redirects_to_login() {
    let app = TestApp::new().await;

    let response = app.get("/submissions", None).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");
}

#[tokio::test]
async fn unauthenticated_intake_post_redirects_to_login() {
    let app = TestApp::new().await;

    let response = app.post_form("/", "concerns=Trauma", None).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");
}

#[tokio::test]
async fn tampered_cookie_is_treated_as_anonymous() {
    let app = TestApp::new().await;
    let cookie = app.sign_up("jane@x.com").await;

    let response = app.get("/", Some(&format!("{cookie}tampered"))).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");
}

#[tokio::test]
async fn session_endpoint_reports_current_user() {
    let app = TestApp::new().await;

    let anonymous = body_json(app.get("/session", None).await).await;
    assert_eq!(anonymous, json!({ "user": null }));

    let cookie = app.sign_up("jane@x.com").await;
    let signed_in = body_json(app.get("/session", Some(&cookie)).await).await;
    assert_eq!(signed_in["user"]["email"], "jane@x.com");
    assert!(signed_in["user"]["id"].as_str().is_some());
}

// -----------------------------------------------------------------------
// Sign-in / sign-up / sign-out
// -----------------------------------------------------------------------

#[tokio::test]
async fn login_requires_email_and_password() {
    let app = TestApp::new().await;

    let response = app.post_form("/login", "email=jane%40x.com", None).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await,
        json!({ "error": "Email and password are required" })
    );
}

#[tokio::test]
async fn login_with_wrong_password_is_rejected() {
    let app = TestApp::new().await;
    app.sign_up("jane@x.com").await;

    let response = app
        .post_form("/login", "email=jane%40x.com&password=wrong-password", None)
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await,
        json!({ "error": "Invalid credentials" })
    );
}

#[tokio::test]
async fn login_sets_session_and_redirects_home() {
    let app = TestApp::new().await;
    app.sign_up("jane@x.com").await;

    let response = app
        .post_form(
            "/login",
            &format!("email=jane%40x.com&password={PASSWORD}"),
            None,
        )
        .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(set_cookie.starts_with("__session="));
    assert!(set_cookie.contains("HttpOnly"));

    let cookie = session_cookie(&response);
    let home = app.get("/", Some(&cookie)).await;
    assert_eq!(home.status(), StatusCode::OK);
}

#[tokio::test]
async fn entry_pages_redirect_signed_in_users() {
    let app = TestApp::new().await;

    let anonymous = app.get("/login", None).await;
    assert_eq!(anonymous.status(), StatusCode::OK);

    let cookie = app.sign_up("jane@x.com").await;
    for page in ["/login", "/signup"] {
        let response = app.get(page, Some(&cookie)).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/");
    }
}

#[tokio::test]
async fn signup_surfaces_identity_errors() {
    let app = TestApp::new().await;

    let response = app
        .post_form(
            "/signup",
            "_action=signup&email=jane%40x.com&password=short",
            None,
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("Password"));
}

#[tokio::test]
async fn signup_returns_verification_required() {
    let app = TestApp::new().await;

    let response = app
        .post_form(
            "/signup",
            &format!("_action=signup&email=jane%40x.com&password={PASSWORD}"),
            None,
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({ "verificationRequired": true, "email": "jane@x.com" })
    );
}

#[tokio::test]
async fn confirm_with_wrong_code_is_rejected() {
    let app = TestApp::new().await;
    app.post_form(
        "/signup",
        &format!("_action=signup&email=jane%40x.com&password={PASSWORD}"),
        None,
    )
    .await;
    let wrong = if app.notifier.code_for("jane@x.com") == "000000" {
        "111111"
    } else {
        "000000"
    };

    let response = app
        .post_form(
            "/signup",
            &format!("_action=confirm&email=jane%40x.com&code={wrong}&password={PASSWORD}"),
            None,
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(response.headers().get(header::SET_COOKIE).is_none());
}

#[tokio::test]
async fn resend_issues_a_new_working_code() {
    let app = TestApp::new().await;
    app.post_form(
        "/signup",
        &format!("_action=signup&email=jane%40x.com&password={PASSWORD}"),
        None,
    )
    .await;

    let response = app
        .post_form("/signup", "_action=resend&email=jane%40x.com", None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({ "codeSent": true }));
    assert_eq!(app.notifier.sent.lock().unwrap().len(), 2);

    let code = app.notifier.code_for("jane@x.com");
    let response = app
        .post_form(
            "/signup",
            &format!("_action=confirm&email=jane%40x.com&code={code}&password={PASSWORD}"),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
}

#[tokio::test]
async fn logout_clears_cookie_and_redirects_to_login() {
    let app = TestApp::new().await;
    let cookie = app.sign_up("jane@x.com").await;

    let response = app.post_form("/logout", "", Some(&cookie)).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(set_cookie.starts_with("__session="));
    assert!(set_cookie.contains("Max-Age=0"));
}

// -----------------------------------------------------------------------
// Intake form
// -----------------------------------------------------------------------

#[tokio::test]
async fn intake_post_stores_normalized_record() {
    let app = TestApp::new().await;
    let cookie = app.sign_up("jane@x.com").await;

    let response = app
        .post_form(
            "/",
            "clientName=Jane+Doe&concerns=Anxiety+Disorder&concerns=ADHD&location=remote",
            Some(&cookie),
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/submissions");

    let home = body_json(app.get("/", Some(&cookie)).await).await;
    let submission = &home["submission"];
    assert_eq!(submission["userEmail"], "jane@x.com");
    assert_eq!(submission["userId"], home["user"]["id"]);
    assert_eq!(submission["clientName"], "Jane Doe");
    assert_eq!(submission["location"], "remote");
    assert_eq!(submission["concerns"], json!(["Anxiety Disorder", "ADHD"]));
    assert!(submission["submittedAt"].as_str().is_some());
}

#[tokio::test]
async fn intake_without_concerns_stores_empty_sequence() {
    let app = TestApp::new().await;
    let cookie = app.sign_up("jane@x.com").await;

    app.post_form("/", "firstName=Jane&lastName=Doe", Some(&cookie))
        .await;

    let listing = body_json(app.get("/submissions", Some(&cookie)).await).await;
    assert_eq!(listing["submissions"][0]["concerns"], json!([]));
}

#[tokio::test]
async fn home_without_submission_returns_null() {
    let app = TestApp::new().await;
    let cookie = app.sign_up("jane@x.com").await;

    let home = body_json(app.get("/", Some(&cookie)).await).await;

    assert_eq!(home["user"]["email"], "jane@x.com");
    assert_eq!(home["submission"], Value::Null);
}

#[tokio::test]
async fn resubmission_replaces_previous_record() {
    let app = TestApp::new().await;
    let cookie = app.sign_up("jane@x.com").await;

    app.post_form(
        "/",
        "firstName=Jane&phone=607-555-0100&concerns=Trauma&comments=first",
        Some(&cookie),
    )
    .await;
    app.post_form("/", "firstName=Janet", Some(&cookie)).await;

    let listing = body_json(app.get("/submissions", Some(&cookie)).await).await;
    let submissions = listing["submissions"].as_array().unwrap();
    assert_eq!(submissions.len(), 1);
    assert_eq!(submissions[0]["firstName"], "Janet");
    assert!(submissions[0].get("phone").is_none());
    assert!(submissions[0].get("comments").is_none());
    assert_eq!(submissions[0]["concerns"], json!([]));
}

#[tokio::test]
async fn intake_rejects_unknown_concern() {
    let app = TestApp::new().await;
    let cookie = app.sign_up("jane@x.com").await;

    let response = app
        .post_form("/", "concerns=Insomnia", Some(&cookie))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let listing = body_json(app.get("/submissions", Some(&cookie)).await).await;
    assert_eq!(listing["submissions"], json!([]));
}

// -----------------------------------------------------------------------
// Listing and deletion
// -----------------------------------------------------------------------

#[tokio::test]
async fn any_user_sees_and_deletes_every_submission() {
    let app = TestApp::new().await;
    let jane = app.sign_up("jane@x.com").await;
    let john = app.sign_up("john@x.com").await;

    app.post_form("/", "firstName=Jane", Some(&jane)).await;
    app.post_form("/", "firstName=John", Some(&john)).await;

    let listing = body_json(app.get("/submissions", Some(&jane)).await).await;
    assert_eq!(listing["submissions"].as_array().unwrap().len(), 2);
    // Newest first.
    assert_eq!(listing["submissions"][0]["userEmail"], "john@x.com");

    let response = app
        .post_form("/submissions", "userEmail=john%40x.com", Some(&jane))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({ "success": true }));

    let listing = body_json(app.get("/submissions", Some(&jane)).await).await;
    let submissions = listing["submissions"].as_array().unwrap();
    assert_eq!(submissions.len(), 1);
    assert_eq!(submissions[0]["userEmail"], "jane@x.com");
}

#[tokio::test]
async fn delete_requires_user_email() {
    let app = TestApp::new().await;
    let cookie = app.sign_up("jane@x.com").await;

    let response = app.post_form("/submissions", "", Some(&cookie)).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await, json!({ "error": "Invalid email" }));
}

#[tokio::test]
async fn delete_of_missing_record_succeeds() {
    let app = TestApp::new().await;
    let cookie = app.sign_up("jane@x.com").await;

    let response = app
        .post_form("/submissions", "userEmail=nobody%40x.com", Some(&cookie))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn unauthenticated_delete_redirects_to_login() {
    let app = TestApp::new().await;

    let response = app
        .post_form("/submissions", "userEmail=jane%40x.com", None)
        .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");
}

// -----------------------------------------------------------------------
// Public projection
// -----------------------------------------------------------------------

#[tokio::test]
async fn public_api_returns_contact_projection_with_cors() {
    let app = TestApp::new().await;
    let cookie = app.sign_up("jane@x.com").await;
    app.post_form(
        "/",
        "firstName=Jane&lastName=Doe&email=jane.doe%40example.com&comments=private",
        Some(&cookie),
    )
    .await;

    let request = Request::builder()
        .method("GET")
        .uri("/api/submissions")
        .header(header::ORIGIN, ALLOWED_ORIGIN)
        .body(Body::empty())
        .unwrap();
    let response = app.send(request).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .unwrap(),
        ALLOWED_ORIGIN
    );
    assert_eq!(
        body_json(response).await,
        json!({
            "submissions": [{
                "firstName": "Jane",
                "lastName": "Doe",
                "email": "jane.doe@example.com",
                "phone": ""
            }]
        })
    );
}
