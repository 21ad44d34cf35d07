//! End-to-end API flow over the router, with surveys persisted to disk.
//!
//! Signs up an account, signs in, builds and publishes a survey, answers it
//! anonymously and checks the dashboard count. Requests go through
//! `tower::ServiceExt::oneshot`, so no port is bound.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use surveyor::config::{Config, StorageBackend};
use surveyor::rest::{build_router, ApiState};

// ─── Helpers ──────────────────────────────────────────────────────────────────

struct TestApp {
    router: Router,
    _dir: TempDir,
}

impl TestApp {
    fn new() -> Self {
        let dir = TempDir::new().expect("temp dir");
        let mut config = Config::default();
        config.storage.backend = StorageBackend::File;
        config.storage.path = dir.path().join("data").to_string_lossy().to_string();
        config.server.public_origin = "https://surveys.test".to_string();

        let state = ApiState::from_config(config).expect("state");
        Self {
            router: build_router(state),
            _dir: dir,
        }
    }

    async fn call(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            request = request.header("authorization", format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => request
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => request.body(Body::empty()),
        }
        .unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }
}

fn organization() -> Value {
    json!({
        "name": "MIRS Inc",
        "employeeCount": "100-499",
        "surveyEmployeeCount": "100-499",
        "type": "Sans but lucratif",
        "sector": "Secteur public",
        "unionStatus": "Syndicat",
        "industry": "Services publics"
    })
}

fn organization_step() -> Value {
    let mut step = organization();
    step["step"] = json!("organization");
    step
}

async fn sign_up_and_in(app: &TestApp) -> String {
    let (status, signup) = app.call("POST", "/api/v1/signup", None, None).await;
    assert_eq!(status, StatusCode::CREATED);
    let id = signup["id"].as_str().unwrap().to_string();
    let advance = format!("/api/v1/signup/{}/advance", id);

    let steps = [
        json!({
            "step": "personal",
            "firstName": "Marie",
            "lastName": "Tremblay",
            "jobTitle": "Directrice RH",
            "phone": "514-555-0100",
            "address": "1 rue Principale",
            "city": "Montréal",
            "country": "CA",
            "postalCode": "H2X 1Y4"
        }),
        json!({
            "step": "organization",
            "organization": "MIRS Inc",
            "employeeCount": "100-499",
            "surveyEmployeeCount": "100-499",
            "organizationType": "Sans but lucratif",
            "sector": "Secteur public",
            "unionStatus": "Syndicat",
            "industry": "Services publics"
        }),
        json!({
            "step": "account",
            "email": "marie@mirs.test",
            "password": "correct horse",
            "confirmPassword": "correct horse",
            "termsAccepted": true
        }),
    ];
    let mut last = Value::Null;
    for step in steps {
        let (status, body) = app.call("POST", &advance, None, Some(step)).await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        last = body;
    }
    assert_eq!(last["currentStep"], "verification");
    assert!(last["draft"]["account"].get("password").is_none());

    let (status, session) = app
        .call(
            "POST",
            "/api/v1/auth/signin",
            None,
            Some(json!({"email": "marie@mirs.test", "password": "correct horse"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    session["accessToken"].as_str().unwrap().to_string()
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_author_publish_and_respond() {
    let app = TestApp::new();
    let token = sign_up_and_in(&app).await;

    // Signup saved the organization profile
    let (status, org) = app
        .call("GET", "/api/v1/organization", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(org["name"], "MIRS Inc");

    // Build a quick survey
    let (status, draft) = app.call("POST", "/api/v1/drafts", Some(&token), None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(draft["draft"]["organization"]["name"], "MIRS Inc");
    let draft_id = draft["id"].as_str().unwrap().to_string();
    let advance = format!("/api/v1/drafts/{}/advance", draft_id);

    let steps = [
        json!({"step": "type", "name": "Pulse printemps", "type": "quick"}),
        organization_step(),
        json!({"step": "demographics", "selected": ["age", "gender"]}),
        json!({"step": "builder"}),
    ];
    for step in steps {
        let (status, body) = app.call("POST", &advance, Some(&token), Some(step)).await;
        assert_eq!(status, StatusCode::OK, "{}", body);
    }

    let (status, published) = app
        .call(
            "POST",
            &format!("/api/v1/drafts/{}/publish", draft_id),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", published);
    let survey_id = published["id"].as_str().unwrap().to_string();
    assert!(survey_id.starts_with("mirs-inc-"));
    assert_eq!(
        published["link"],
        format!("https://surveys.test/survey/{}", survey_id)
    );

    // Respond anonymously
    let (status, survey) = app
        .call("GET", &format!("/api/v1/surveys/{}", survey_id), None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let questions = survey["questions"].as_array().unwrap().clone();
    assert_eq!(questions.len(), 6);

    let (status, session) = app
        .call(
            "POST",
            &format!("/api/v1/surveys/{}/responses", survey_id),
            None,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let response_id = session["id"].as_str().unwrap().to_string();

    for question in &questions {
        let (status, _) = app
            .call(
                "PUT",
                &format!("/api/v1/responses/{}/answers", response_id),
                None,
                Some(json!({"questionId": question["id"], "label": "Parfois"})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, done) = app
        .call(
            "POST",
            &format!("/api/v1/responses/{}/submit", response_id),
            None,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(done["surveyId"], survey_id.as_str());

    // Dashboard shows the survey with one response
    let (status, dashboard) = app
        .call("GET", "/api/v1/dashboard", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let surveys = dashboard["surveys"].as_array().unwrap();
    assert_eq!(surveys.len(), 1);
    assert_eq!(surveys[0]["id"], survey_id.as_str());
    assert_eq!(surveys[0]["responseCount"], 1);
    assert_eq!(surveys[0]["status"], "open");
}

#[tokio::test]
async fn test_validation_errors_are_localized() {
    let app = TestApp::new();
    let (_, signup) = app.call("POST", "/api/v1/signup", None, None).await;
    let id = signup["id"].as_str().unwrap();

    let request = Request::post(format!("/api/v1/signup/{}/advance", id))
        .header("content-type", "application/json")
        .header("accept-language", "fr-CA")
        .body(Body::from(json!({"step": "personal"}).to_string()))
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"], "validation_error");
    let fields = body["fields"].as_array().unwrap();
    assert!(fields.iter().any(|f| f["field"] == "firstName"));
}

#[tokio::test]
async fn test_unknown_survey_is_not_found() {
    let app = TestApp::new();
    let (status, body) = app
        .call("GET", "/api/v1/surveys/nonexistent-id", None, None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn test_publish_requires_review_step() {
    let app = TestApp::new();
    let token = sign_up_and_in(&app).await;
    let (_, draft) = app.call("POST", "/api/v1/drafts", Some(&token), None).await;
    let draft_id = draft["id"].as_str().unwrap();

    let (status, body) = app
        .call(
            "POST",
            &format!("/api/v1/drafts/{}/publish", draft_id),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{}", body);
}
