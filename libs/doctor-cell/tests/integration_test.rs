use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use tower::ServiceExt;
use serde_json::json;
use wiremock::{MockServer, Mock, ResponseTemplate};
use wiremock::matchers::{method, path, query_param};

use doctor_cell::router::doctor_routes;
use shared_utils::test_utils::{JwtTestUtils, MockSupabaseResponses, TestConfig, TestUser, TEST_JWT_SECRET};

fn create_test_app(mock_server: &MockServer) -> Router {
    doctor_routes(TestConfig::with_supabase_url(&mock_server.uri()).to_arc())
}

async fn mount_user(mock_server: &MockServer, user: &TestUser) {
    let (table, column) = user.storage();

    Mock::given(method("GET"))
        .and(path(format!("/rest/v1/{}", table)))
        .and(query_param(column, format!("eq.{}", user.identifier)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([user.credentials_row()])))
        .mount(mock_server)
        .await;
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

fn with_json(method: &str, uri: &str, token: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", format!("Bearer {}", token))
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_list_doctors() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::doctor_response(1, "a@clinic.test", &["09:00"]),
            MockSupabaseResponses::doctor_response(2, "b@clinic.test", &["14:00"]),
        ])))
        .mount(&mock_server)
        .await;

    let response = create_test_app(&mock_server).oneshot(get("/", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json_response = body_json(response).await;
    assert_eq!(json_response["total"], 2);
    assert!(json_response["doctors"][0].get("password").is_none());
}

fn named_doctor(id: i64, name: &str, specialty: &str, slots: &[&str]) -> serde_json::Value {
    let mut row = MockSupabaseResponses::doctor_response(id, &format!("doc{}@clinic.test", id), slots);
    row["name"] = json!(name);
    row["specialty"] = json!(specialty);
    row
}

async fn mount_doctor_table(mock_server: &MockServer, rows: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .and(query_param("order", "id.asc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(rows))
        .mount(mock_server)
        .await;
}

#[tokio::test]
async fn test_filter_doctors_by_name_specialty_and_time() {
    let mock_server = MockServer::start().await;
    mount_doctor_table(&mock_server, json!([
        named_doctor(1, "Dr. Anna Smith", "Cardiology", &["08:00", "09:00"]),
        named_doctor(2, "Dr. Ben Smith", "Cardiology", &["18:00"]),
        named_doctor(3, "Dr. Cy SMITHERS", "cardiology", &["08:00", "14:00"]),
        named_doctor(4, "Dr. Dee Jones", "Cardiology", &["18:00"]),
        named_doctor(5, "Dr. Eve Smith", "Dermatology", &["18:00"]),
    ])).await;

    let response = create_test_app(&mock_server)
        .oneshot(get("/filter?name=smith&specialty=Cardiology&time=pm", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json_response = body_json(response).await;
    assert_eq!(json_response["total"], 2);
    assert_eq!(json_response["doctors"][0]["id"], 2);
    assert_eq!(json_response["doctors"][1]["id"], 3);
}

#[tokio::test]
async fn test_filter_doctors_treats_wildcards_literally() {
    let mock_server = MockServer::start().await;
    mount_doctor_table(&mock_server, json!([
        named_doctor(1, "Dr. Smith", "Cardiology", &["09:00"]),
        named_doctor(2, "Dr. Jo_bs", "Card%", &["10:00"]),
    ])).await;

    let app = create_test_app(&mock_server);

    let response = app.clone().oneshot(get("/filter?name=_", None)).await.unwrap();
    let json_response = body_json(response).await;
    assert_eq!(json_response["total"], 1);
    assert_eq!(json_response["doctors"][0]["id"], 2);

    let response = app.clone().oneshot(get("/filter?specialty=card%25", None)).await.unwrap();
    let json_response = body_json(response).await;
    assert_eq!(json_response["total"], 1);
    assert_eq!(json_response["doctors"][0]["id"], 2);

    let response = app.oneshot(get("/filter?name=*", None)).await.unwrap();
    assert_eq!(body_json(response).await["total"], 0);

    let requests = mock_server.received_requests().await.unwrap();
    assert!(requests.iter().all(|r| !r.url.query().unwrap_or_default().contains("ilike")));
}

#[tokio::test]
async fn test_filter_doctors_rejects_unknown_period() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let response = create_test_app(&mock_server)
        .oneshot(get("/filter?time=evening", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_availability_for_patient_token() {
    let mock_server = MockServer::start().await;
    let patient = TestUser::patient("pat@clinic.test");
    mount_user(&mock_server, &patient).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .and(query_param("id", "eq.5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::doctor_response(5, "doc@clinic.test", &["09:00", "10:00", "11:00"])
        ])))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "appointment_time": "2025-03-10T10:00:00" }
        ])))
        .mount(&mock_server)
        .await;

    let token = JwtTestUtils::create_test_token(&patient, TEST_JWT_SECRET);
    let response = create_test_app(&mock_server)
        .oneshot(get("/availability/patient/5/2025-03-10", Some(&token)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json_response = body_json(response).await;
    assert_eq!(json_response["availability"], json!(["09:00", "11:00"]));
    assert_eq!(json_response["date"], "2025-03-10");
}

#[tokio::test]
async fn test_availability_rejects_token_for_wrong_role() {
    let mock_server = MockServer::start().await;
    let patient = TestUser::patient("pat@clinic.test");
    mount_user(&mock_server, &patient).await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let token = JwtTestUtils::create_test_token(&patient, TEST_JWT_SECRET);

    for role in ["doctor", "superuser"] {
        let response = create_test_app(&mock_server)
            .oneshot(get(&format!("/availability/{}/5/2025-03-10", role), Some(&token)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}

#[tokio::test]
async fn test_availability_malformed_slot_is_unprocessable() {
    let mock_server = MockServer::start().await;
    let doctor = TestUser::doctor("doc@clinic.test");
    mount_user(&mock_server, &doctor).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .and(query_param("id", "eq.5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::doctor_response(5, "doc@clinic.test", &["9 o'clock"])
        ])))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let token = JwtTestUtils::create_test_token(&doctor, TEST_JWT_SECRET);
    let response = create_test_app(&mock_server)
        .oneshot(get("/availability/doctor/5/2025-03-10", Some(&token)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_create_doctor_requires_admin() {
    let mock_server = MockServer::start().await;
    let doctor = TestUser::doctor("doc@clinic.test");
    mount_user(&mock_server, &doctor).await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/admins"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let token = JwtTestUtils::create_test_token(&doctor, TEST_JWT_SECRET);
    let body = json!({
        "name": "Dr. New",
        "specialty": "Dermatology",
        "email": "new@clinic.test",
        "password": "secret123",
        "phone": "0123456789",
        "available_times": ["09:00"]
    });

    let response = create_test_app(&mock_server)
        .oneshot(with_json("POST", "/", &token, body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_doctor_hashes_password() {
    let mock_server = MockServer::start().await;
    let admin = TestUser::admin("root");
    mount_user(&mock_server, &admin).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .and(query_param("email", "eq.new@clinic.test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/doctors"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockSupabaseResponses::doctor_response(9, "new@clinic.test", &["09:00"])
        ])))
        .mount(&mock_server)
        .await;

    let token = JwtTestUtils::create_test_token(&admin, TEST_JWT_SECRET);
    let body = json!({
        "name": "Dr. New",
        "specialty": "Dermatology",
        "email": "new@clinic.test",
        "password": "secret123",
        "phone": "0123456789",
        "available_times": ["09:00"]
    });

    let response = create_test_app(&mock_server)
        .oneshot(with_json("POST", "/", &token, body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_json(response).await["doctor"]["id"], 9);

    let requests = mock_server.received_requests().await.unwrap();
    let insert = requests
        .iter()
        .find(|r| r.method.as_str() == "POST")
        .unwrap();
    let inserted: serde_json::Value = serde_json::from_slice(&insert.body).unwrap();
    let stored = inserted["password"].as_str().unwrap();
    assert_ne!(stored, "secret123");
    assert!(stored.starts_with("$argon2"));
}

#[tokio::test]
async fn test_create_doctor_duplicate_email_conflicts() {
    let mock_server = MockServer::start().await;
    let admin = TestUser::admin("root");
    mount_user(&mock_server, &admin).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .and(query_param("email", "eq.taken@clinic.test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": 3 }])))
        .mount(&mock_server)
        .await;

    let token = JwtTestUtils::create_test_token(&admin, TEST_JWT_SECRET);
    let body = json!({
        "name": "Dr. Dup",
        "specialty": "Dermatology",
        "email": "taken@clinic.test",
        "password": "secret123",
        "phone": "0123456789",
        "available_times": []
    });

    let response = create_test_app(&mock_server)
        .oneshot(with_json("POST", "/", &token, body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_create_doctor_with_malformed_slot_is_rejected() {
    let mock_server = MockServer::start().await;
    let admin = TestUser::admin("root");
    mount_user(&mock_server, &admin).await;

    let token = JwtTestUtils::create_test_token(&admin, TEST_JWT_SECRET);
    let body = json!({
        "name": "Dr. Typo",
        "specialty": "Dermatology",
        "email": "typo@clinic.test",
        "password": "secret123",
        "phone": "0123456789",
        "available_times": ["09:00", "25:00"]
    });

    let response = create_test_app(&mock_server)
        .oneshot(with_json("POST", "/", &token, body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_delete_missing_doctor_is_not_found() {
    let mock_server = MockServer::start().await;
    let admin = TestUser::admin("root");
    mount_user(&mock_server, &admin).await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let token = JwtTestUtils::create_test_token(&admin, TEST_JWT_SECRET);
    let request = Request::builder()
        .method("DELETE")
        .uri("/42")
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let response = create_test_app(&mock_server).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_doctor_removes_appointments_first() {
    let mock_server = MockServer::start().await;
    let admin = TestUser::admin("root");
    mount_user(&mock_server, &admin).await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::doctor_response(42, "doc@clinic.test", &["09:00"])
        ])))
        .mount(&mock_server)
        .await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(204))
        .expect(2)
        .mount(&mock_server)
        .await;

    let token = JwtTestUtils::create_test_token(&admin, TEST_JWT_SECRET);
    let request = Request::builder()
        .method("DELETE")
        .uri("/42")
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let response = create_test_app(&mock_server).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let requests = mock_server.received_requests().await.unwrap();
    let deletes: Vec<_> = requests
        .iter()
        .filter(|r| r.method.as_str() == "DELETE")
        .map(|r| r.url.path().to_string())
        .collect();
    assert_eq!(deletes, vec!["/rest/v1/appointments", "/rest/v1/doctors"]);
}

async fn mount_existing_doctor(mock_server: &MockServer, doctor_id: i64) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .and(query_param("id", format!("eq.{}", doctor_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::doctor_response(doctor_id, "doc@clinic.test", &["09:00"])
        ])))
        .mount(mock_server)
        .await;
}

#[tokio::test]
async fn test_get_doctor_by_id() {
    let mock_server = MockServer::start().await;
    mount_existing_doctor(&mock_server, 42).await;

    let response = create_test_app(&mock_server).oneshot(get("/42", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json_response = body_json(response).await;
    assert_eq!(json_response["id"], 42);
    assert_eq!(json_response["available_times"], json!(["09:00"]));
    assert!(json_response.get("password").is_none());
}

#[tokio::test]
async fn test_get_missing_doctor_is_not_found() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let response = create_test_app(&mock_server).oneshot(get("/7", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_missing_doctor_is_not_found() {
    let mock_server = MockServer::start().await;
    let admin = TestUser::admin("root");
    mount_user(&mock_server, &admin).await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;
    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let token = JwtTestUtils::create_test_token(&admin, TEST_JWT_SECRET);
    let response = create_test_app(&mock_server)
        .oneshot(with_json("PUT", "/42", &token, json!({ "name": "Dr. Renamed" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_doctor_to_taken_email_conflicts() {
    let mock_server = MockServer::start().await;
    let admin = TestUser::admin("root");
    mount_user(&mock_server, &admin).await;
    mount_existing_doctor(&mock_server, 42).await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .and(query_param("email", "eq.taken@clinic.test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": 3 }])))
        .mount(&mock_server)
        .await;
    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let token = JwtTestUtils::create_test_token(&admin, TEST_JWT_SECRET);
    let response = create_test_app(&mock_server)
        .oneshot(with_json("PUT", "/42", &token, json!({ "email": "taken@clinic.test" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_update_doctor_with_malformed_slot_is_rejected() {
    let mock_server = MockServer::start().await;
    let admin = TestUser::admin("root");
    mount_user(&mock_server, &admin).await;
    mount_existing_doctor(&mock_server, 42).await;
    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let token = JwtTestUtils::create_test_token(&admin, TEST_JWT_SECRET);
    let response = create_test_app(&mock_server)
        .oneshot(with_json("PUT", "/42", &token, json!({ "available_times": ["9am"] })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_update_doctor_with_short_password_is_rejected() {
    let mock_server = MockServer::start().await;
    let admin = TestUser::admin("root");
    mount_user(&mock_server, &admin).await;
    mount_existing_doctor(&mock_server, 42).await;
    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let token = JwtTestUtils::create_test_token(&admin, TEST_JWT_SECRET);
    let response = create_test_app(&mock_server)
        .oneshot(with_json("PUT", "/42", &token, json!({ "password": "abc" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_update_doctor_rehashes_password() {
    let mock_server = MockServer::start().await;
    let admin = TestUser::admin("root");
    mount_user(&mock_server, &admin).await;
    mount_existing_doctor(&mock_server, 42).await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/doctors"))
        .and(query_param("id", "eq.42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::doctor_response(42, "doc@clinic.test", &["09:00"])
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let token = JwtTestUtils::create_test_token(&admin, TEST_JWT_SECRET);
    let response = create_test_app(&mock_server)
        .oneshot(with_json("PUT", "/42", &token, json!({ "password": "newsecret" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["message"], "Doctor updated");

    let requests = mock_server.received_requests().await.unwrap();
    let patch = requests.iter().find(|r| r.method.as_str() == "PATCH").unwrap();
    let patched: serde_json::Value = serde_json::from_slice(&patch.body).unwrap();
    let stored = patched["password"].as_str().unwrap();
    assert_ne!(stored, "newsecret");
    assert!(stored.starts_with("$argon2"));
}
