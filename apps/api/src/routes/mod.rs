pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::form::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Applicant form sessions
        .route("/api/v1/applicants", post(handlers::handle_create_session))
        .route(
            "/api/v1/applicants/:id",
            get(handlers::handle_get_session).delete(handlers::handle_discard_session),
        )
        .route(
            "/api/v1/applicants/:id/field",
            get(handlers::handle_get_field).patch(handlers::handle_change_field),
        )
        .route(
            "/api/v1/applicants/:id/lists",
            post(handlers::handle_list_event),
        )
        .route("/api/v1/applicants/:id/submit", post(handlers::handle_submit))
        // Static field options and role autocomplete
        .route("/api/v1/options", get(handlers::handle_field_options))
        .route("/api/v1/roles/suggest", get(handlers::handle_suggest_roles))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use axum::response::Response;
    use chrono::Utc;
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::*;
    use crate::config::Config;
    use crate::errors::AppError;
    use crate::submission::{SubmissionPayload, SubmissionReceipt, SubmissionSink};

    #[derive(Default)]
    struct RecordingSink {
        delivered: Mutex<Vec<SubmissionPayload>>,
    }

    #[async_trait]
    impl SubmissionSink for RecordingSink {
        async fn deliver(
            &self,
            payload: &SubmissionPayload,
        ) -> Result<SubmissionReceipt, AppError> {
            self.delivered.lock().unwrap().push(payload.clone());
            Ok(SubmissionReceipt {
                submission_id: Uuid::new_v4(),
                submitted_at: Utc::now(),
                sink: "recording".to_string(),
            })
        }
    }

    /// Refuses the first `failures` deliveries, then records like `RecordingSink`.
    struct FlakySink {
        failures: Mutex<usize>,
        inner: RecordingSink,
    }

    #[async_trait]
    impl SubmissionSink for FlakySink {
        async fn deliver(
            &self,
            payload: &SubmissionPayload,
        ) -> Result<SubmissionReceipt, AppError> {
            {
                let mut failures = self.failures.lock().unwrap();
                if *failures > 0 {
                    *failures -= 1;
                    return Err(AppError::Internal(anyhow::anyhow!("upstream refused")));
                }
            }
            self.inner.deliver(payload).await
        }
    }

    fn app() -> (Router, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::default());
        let state = AppState::new(Config::default(), sink.clone());
        (build_router(state), sink)
    }

    fn app_with(config: Config, sink: Arc<dyn SubmissionSink>) -> Router {
        build_router(AppState::new(config, sink))
    }

    async fn send(router: &Router, method: &str, uri: &str, body: Option<Value>) -> Response {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        router.clone().oneshot(request).await.expect("route executes")
    }

    async fn read_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn open_session(router: &Router) -> String {
        let response = send(router, "POST", "/api/v1/applicants", None).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let view = read_json(response).await;
        view["sessionId"].as_str().unwrap().to_string()
    }

    async fn change(router: &Router, id: &str, path: &str, value: Value) -> Response {
        send(
            router,
            "PATCH",
            &format!("/api/v1/applicants/{id}/field"),
            Some(json!({ "path": path, "value": value })),
        )
        .await
    }

    #[tokio::test]
    async fn test_health() {
        let (router, _) = app();
        let response = send(&router, "GET", "/health", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(read_json(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn test_new_session_holds_minimal_record() {
        let (router, _) = app();
        let response = send(&router, "POST", "/api/v1/applicants", None).await;
        let view = read_json(response).await;
        assert_eq!(view["status"], "editing");
        assert_eq!(view["experienceCount"], 1);
        assert_eq!(view["detailCounts"], json!([1]));
        assert_eq!(view["errors"], json!({}));
    }

    #[tokio::test]
    async fn test_field_change_reports_error_then_clears() {
        let (router, _) = app();
        let id = open_session(&router).await;

        let response = change(&router, &id, "phoneNumber", json!("12345")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let field = read_json(response).await;
        assert_eq!(field["error"]["kind"], "invalidFormat");

        let response = change(&router, &id, "phoneNumber", json!("922 283 3416")).await;
        let field = read_json(response).await;
        assert!(field["error"].is_null());
        assert_eq!(field["value"], "922 283 3416");

        let response = send(
            &router,
            "GET",
            &format!("/api/v1/applicants/{id}/field?path=phoneNumber"),
            None,
        )
        .await;
        assert_eq!(read_json(response).await["value"], "922 283 3416");
    }

    #[tokio::test]
    async fn test_unknown_path_is_bad_request() {
        let (router, _) = app();
        let id = open_session(&router).await;
        let response = change(&router, &id, "experience.4.role", json!("Cook")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let response = change(&router, &id, "nickname", json!("Jo")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_session_is_not_found() {
        let (router, _) = app();
        let uri = format!("/api/v1/applicants/{}", Uuid::new_v4());
        let response = send(&router, "GET", &uri, None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_list_events_keep_floor_of_one() {
        let (router, _) = app();
        let id = open_session(&router).await;
        let uri = format!("/api/v1/applicants/{id}/lists");

        let event = json!({ "list": "experience", "op": "remove", "index": 0 });
        let body = read_json(send(&router, "POST", &uri, Some(event)).await).await;
        assert_eq!(body["change"]["kind"], "retained");
        assert_eq!(body["len"], 1);
        assert_eq!(body["form"]["experienceCount"], 1);

        let event = json!({ "list": "experience.0.details", "op": "append" });
        let body = read_json(send(&router, "POST", &uri, Some(event)).await).await;
        assert_eq!(body["change"], json!({ "kind": "appended", "index": 1 }));
        assert_eq!(body["form"]["detailCounts"], json!([2]));
        let details = &body["form"]["record"]["experience"][0]["details"];
        assert_eq!(body["ids"], json!([details[0]["id"], details[1]["id"]]));

        let event = json!({ "list": "experience", "op": "remove" });
        let response = send(&router, "POST", &uri, Some(event)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_submit_invalid_form_returns_field_errors() {
        let (router, sink) = app();
        let id = open_session(&router).await;

        let uri = format!("/api/v1/applicants/{id}/submit");
        let response = send(&router, "POST", &uri, None).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = read_json(response).await;
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(body["error"]["firstInvalid"], "firstName");
        let fields = &body["error"]["fields"];
        assert_eq!(fields["experience.0.details.0.description"]["kind"], "missingValue");
        assert!(body["error"]["fields"].get("highestEducationAttained").is_none());
        assert!(sink.delivered.lock().unwrap().is_empty());
    }

    async fn fill_valid(router: &Router, id: &str) {
        for (path, value) in [
            ("firstName", json!("Juan")),
            ("lastName", json!("Dela Cruz")),
            ("phoneNumber", json!("922 283 3416")),
            ("sex", json!("M")),
            ("birthdate", json!("1990-05-17")),
            ("highestEducationAttained", json!("graduate")),
            ("yearsOfExperience", json!(0)),
            ("experience.0.role", json!("Electrician")),
            ("experience.0.startDate", json!("2020-03")),
            ("experience.0.endDate", json!("2021-07")),
            ("experience.0.details.0.description", json!("Wired 12 buildings")),
        ] {
            let response = change(&router, &id, path, value).await;
            assert_eq!(response.status(), StatusCode::OK, "{path}");
        }
    }

    #[tokio::test]
    async fn test_full_submission_flow() {
        let (router, sink) = app();
        let id = open_session(&router).await;
        fill_valid(&router, &id).await;

        let uri = format!("/api/v1/applicants/{id}/submit");
        let response = send(&router, "POST", &uri, None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        assert_eq!(body["payload"]["phoneNumber"], "9222833416");
        assert_eq!(body["payload"]["yearsOfExperience"], 0);
        let exp = &body["payload"]["experience"][0];
        assert_eq!(exp["startMonth"], 3);
        assert_eq!(exp["startYear"], 2020);
        assert_eq!(exp["endMonth"], 7);
        assert_eq!(exp["endYear"], 2021);
        assert_eq!(exp["startDate"], "2020-03");
        assert_eq!(body["receipt"]["sink"], "recording");
        assert_eq!(sink.delivered.lock().unwrap().len(), 1);

        // Delivery ends the session.
        let response = send(&router, "POST", &uri, None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let response = change(&router, &id, "firstName", json!("Other")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(sink.delivered.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_delivery_reopens_form() {
        let sink = Arc::new(FlakySink {
            failures: Mutex::new(1),
            inner: RecordingSink::default(),
        });
        let router = app_with(Config::default(), sink.clone());
        let id = open_session(&router).await;
        fill_valid(&router, &id).await;
        let uri = format!("/api/v1/applicants/{id}/submit");

        let response = send(&router, "POST", &uri, None).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let session_uri = format!("/api/v1/applicants/{id}");
        let view = read_json(send(&router, "GET", &session_uri, None).await).await;
        assert_eq!(view["status"], "editing");
        assert_eq!(view["record"]["firstName"], "Juan");
        assert!(sink.inner.delivered.lock().unwrap().is_empty());

        let response = send(&router, "POST", &uri, None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(sink.inner.delivered.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delivered_and_discarded_sessions_free_capacity() {
        let config = Config {
            max_sessions: 2,
            ..Config::default()
        };
        let router = app_with(config, Arc::new(RecordingSink::default()));
        let submitted = open_session(&router).await;
        let discarded = open_session(&router).await;
        let response = send(&router, "POST", "/api/v1/applicants", None).await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        fill_valid(&router, &submitted).await;
        let uri = format!("/api/v1/applicants/{submitted}/submit");
        assert_eq!(send(&router, "POST", &uri, None).await.status(), StatusCode::OK);
        open_session(&router).await;

        let uri = format!("/api/v1/applicants/{discarded}");
        assert_eq!(send(&router, "DELETE", &uri, None).await.status(), StatusCode::NO_CONTENT);
        open_session(&router).await;

        let health = read_json(send(&router, "GET", "/health", None).await).await;
        assert_eq!(health["openSessions"], 2);
    }

    #[tokio::test]
    async fn test_discard_session() {
        let (router, _) = app();
        let id = open_session(&router).await;
        let uri = format!("/api/v1/applicants/{id}");
        assert_eq!(send(&router, "DELETE", &uri, None).await.status(), StatusCode::NO_CONTENT);
        assert_eq!(send(&router, "GET", &uri, None).await.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_role_suggestions() {
        let (router, _) = app();
        let response = send(&router, "GET", "/api/v1/roles/suggest?q=weld", None).await;
        let body = read_json(response).await;
        assert_eq!(body[0]["value"], "Welder");

        let response = send(&router, "GET", "/api/v1/roles/suggest?q=Astronaut", None).await;
        let body = read_json(response).await;
        assert_eq!(body[0]["label"], "Add \"Astronaut\"");
        assert_eq!(body[0]["creatable"], true);

        let body = read_json(send(&router, "GET", "/api/v1/roles/suggest", None).await).await;
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn test_field_options() {
        let (router, _) = app();
        let body = read_json(send(&router, "GET", "/api/v1/options", None).await).await;
        assert_eq!(body["sex"][0]["value"], "M");
        assert_eq!(body["highestEducationAttained"].as_array().unwrap().len(), 6);
        assert_eq!(body["highestEducationAttained"][5]["value"], "doctoral");
    }
}
