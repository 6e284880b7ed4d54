use chrono::{Duration as ChronoDuration, Utc};
use civica_auth::{Role, TokenClaims};
use civica_core::SubjectId;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::{json, Value};

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn(jwt_secret: &str) -> Self {
        // Build app (same router as prod), but bind to an ephemeral port.
        let app = civica_api::app::build_app(jwt_secret.to_string());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

const SECRET: &str = "black-box-secret";

fn mint_jwt(subject: SubjectId, role: Role) -> String {
    let now = Utc::now();
    let claims = TokenClaims {
        sub: subject,
        role,
        email: format!("{role}@example.com"),
        first_name: "Test".to_string(),
        last_name: role.as_str().to_string(),
        iat: now - ChronoDuration::minutes(1),
        exp: now + ChronoDuration::minutes(10),
    };

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .expect("failed to encode jwt")
}

struct Actors {
    parent: (SubjectId, String),
    school_admin: (SubjectId, String),
    teacher: (SubjectId, String),
    doctor: (SubjectId, String),
    health_admin: (SubjectId, String),
    patient: (SubjectId, String),
}

fn actors() -> Actors {
    let mk = |role| {
        let subject = SubjectId::new();
        (subject, mint_jwt(subject, role))
    };
    Actors {
        parent: mk(Role::Parent),
        school_admin: mk(Role::SchoolAdmin),
        teacher: mk(Role::Teacher),
        doctor: mk(Role::Doctor),
        health_admin: mk(Role::HealthAdmin),
        patient: mk(Role::Patient),
    }
}

/// Set up the health side: doctor profile + a patient profile for `child`,
/// then an enrollment certificate valid for `valid_days` more days.
async fn issue_certificate_for(
    client: &reqwest::Client,
    base: &str,
    actors: &Actors,
    child: SubjectId,
    valid_days: i64,
) -> String {
    let res = client
        .post(format!("{base}/health/doctors"))
        .bearer_auth(&actors.health_admin.1)
        .json(&json!({
            "subject_id": actors.doctor.0,
            "first_name": "Dunja",
            "last_name": "Ilic",
            "specialty": "pediatrics",
        }))
        .send()
        .await
        .unwrap();
    // Doctor may already exist from an earlier call in the same test.
    assert!(
        res.status() == StatusCode::CREATED || res.status() == StatusCode::CONFLICT,
        "doctor setup: {}",
        res.status()
    );

    let res = client
        .post(format!("{base}/health/patients"))
        .bearer_auth(&actors.doctor.1)
        .json(&json!({
            "subject_id": child,
            "first_name": "Iva",
            "last_name": "Novak",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let patient: Value = res.json().await.unwrap();

    let now = Utc::now();
    let res = client
        .post(format!("{base}/health/certificates"))
        .bearer_auth(&actors.doctor.1)
        .json(&json!({
            "patient_id": patient["id"],
            "kind": "enrollment",
            "valid_from": (now - ChronoDuration::days(30)).date_naive(),
            "valid_to": (now + ChronoDuration::days(valid_days)).date_naive(),
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let cert: Value = res.json().await.unwrap();
    cert["id"].as_str().unwrap().to_string()
}

async fn submit_enrollment(
    client: &reqwest::Client,
    base: &str,
    parent_token: &str,
    child: SubjectId,
    certificate_id: Option<&str>,
) -> Value {
    let res = client
        .post(format!("{base}/school/enrollments"))
        .bearer_auth(parent_token)
        .json(&json!({
            "student_subject_id": child,
            "first_name": "Iva",
            "last_name": "Novak",
            "date_of_birth": (Utc::now() - ChronoDuration::days(7 * 365)).date_naive(),
            "school_year": "2026/2027",
            "certificate_id": certificate_id,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    res.json().await.unwrap()
}

#[tokio::test]
async fn healthcheck_is_public_everything_else_is_not() {
    let server = TestServer::spawn(SECRET).await;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/healthz", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .get(format!("{}/school/enrollments", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn expired_token_is_a_full_denial() {
    let server = TestServer::spawn(SECRET).await;
    let client = reqwest::Client::new();

    let now = Utc::now();
    let claims = TokenClaims {
        sub: SubjectId::new(),
        role: Role::SchoolAdmin,
        email: "x@example.com".to_string(),
        first_name: "X".to_string(),
        last_name: "X".to_string(),
        iat: now - ChronoDuration::hours(2),
        exp: now - ChronoDuration::hours(1),
    };
    let stale = jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap();

    let res = client
        .get(format!("{}/school/enrollments", server.base_url))
        .bearer_auth(stale)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn enrollment_approval_end_to_end() {
    let server = TestServer::spawn(SECRET).await;
    let base = &server.base_url;
    let client = reqwest::Client::new();
    let actors = actors();
    let child = SubjectId::new();

    let cert_id = issue_certificate_for(&client, base, &actors, child, 365).await;
    let enrollment =
        submit_enrollment(&client, base, &actors.parent.1, child, Some(&cert_id)).await;
    assert_eq!(enrollment["status"], "pending");
    let enrollment_id = enrollment["id"].as_str().unwrap();

    // The parent cannot approve their own request.
    let res = client
        .patch(format!("{base}/school/enrollments/{enrollment_id}/status"))
        .bearer_auth(&actors.parent.1)
        .json(&json!({"status": "approved"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    // The school office can.
    let res = client
        .patch(format!("{base}/school/enrollments/{enrollment_id}/status"))
        .bearer_auth(&actors.school_admin.1)
        .json(&json!({"status": "approved"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let approved: Value = res.json().await.unwrap();
    assert_eq!(approved["status"], "approved");
    assert_eq!(approved["verification"]["outcome"], "valid");
    let student_id = approved["student_id"].as_str().unwrap().to_string();

    // Replaying the approval returns the same student, creates nothing.
    let res = client
        .patch(format!("{base}/school/enrollments/{enrollment_id}/status"))
        .bearer_auth(&actors.school_admin.1)
        .json(&json!({"status": "approved"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let replay: Value = res.json().await.unwrap();
    assert_eq!(replay["student_id"].as_str().unwrap(), student_id);

    let res = client
        .get(format!("{base}/school/students"))
        .bearer_auth(&actors.school_admin.1)
        .send()
        .await
        .unwrap();
    let students: Value = res.json().await.unwrap();
    assert_eq!(students["items"].as_array().unwrap().len(), 1);

    // The audit trail shows exactly one transition.
    let res = client
        .get(format!(
            "{base}/school/enrollments/{enrollment_id}/transitions"
        ))
        .bearer_auth(&actors.school_admin.1)
        .send()
        .await
        .unwrap();
    let log: Value = res.json().await.unwrap();
    let entries = log["items"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["from"], "pending");
    assert_eq!(entries[0]["to"], "approved");
}

#[tokio::test]
async fn expired_certificate_blocks_enrollment_approval() {
    let server = TestServer::spawn(SECRET).await;
    let base = &server.base_url;
    let client = reqwest::Client::new();
    let actors = actors();
    let child = SubjectId::new();

    let cert_id = issue_certificate_for(&client, base, &actors, child, -1).await;
    let enrollment =
        submit_enrollment(&client, base, &actors.parent.1, child, Some(&cert_id)).await;
    let enrollment_id = enrollment["id"].as_str().unwrap();

    let res = client
        .patch(format!("{base}/school/enrollments/{enrollment_id}/status"))
        .bearer_auth(&actors.school_admin.1)
        .json(&json!({"status": "approved"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "verification_failed");

    // Still pending, with the failed check recorded for audit.
    let res = client
        .get(format!("{base}/school/enrollments/{enrollment_id}"))
        .bearer_auth(&actors.school_admin.1)
        .send()
        .await
        .unwrap();
    let reloaded: Value = res.json().await.unwrap();
    assert_eq!(reloaded["status"], "pending");
    assert_eq!(reloaded["verification"]["outcome"], "expired");
}

#[tokio::test]
async fn rejected_enrollment_cannot_be_approved_later() {
    let server = TestServer::spawn(SECRET).await;
    let base = &server.base_url;
    let client = reqwest::Client::new();
    let actors = actors();
    let child = SubjectId::new();

    let cert_id = issue_certificate_for(&client, base, &actors, child, 365).await;
    let enrollment =
        submit_enrollment(&client, base, &actors.parent.1, child, Some(&cert_id)).await;
    let enrollment_id = enrollment["id"].as_str().unwrap();

    let res = client
        .patch(format!("{base}/school/enrollments/{enrollment_id}/status"))
        .bearer_auth(&actors.school_admin.1)
        .json(&json!({"status": "rejected", "notes": "incomplete paperwork"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .patch(format!("{base}/school/enrollments/{enrollment_id}/status"))
        .bearer_auth(&actors.school_admin.1)
        .json(&json!({"status": "approved"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid_transition");
}

#[tokio::test]
async fn absence_without_certificate_approves_unconditionally() {
    let server = TestServer::spawn(SECRET).await;
    let base = &server.base_url;
    let client = reqwest::Client::new();
    let actors = actors();

    let student_subject = SubjectId::new();
    let student_token = mint_jwt(student_subject, Role::Student);

    let res = client
        .post(format!("{base}/school/students"))
        .bearer_auth(&actors.school_admin.1)
        .json(&json!({
            "subject_id": student_subject,
            "first_name": "Iva",
            "last_name": "Novak",
            "date_of_birth": (Utc::now() - ChronoDuration::days(8 * 365)).date_naive(),
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let now = Utc::now();
    let res = client
        .post(format!("{base}/school/absences"))
        .bearer_auth(&student_token)
        .json(&json!({
            "start_date": (now - ChronoDuration::days(2)).date_naive(),
            "end_date": (now - ChronoDuration::days(1)).date_naive(),
            "reason": "flu",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let absence: Value = res.json().await.unwrap();
    let absence_id = absence["id"].as_str().unwrap();

    let res = client
        .patch(format!("{base}/school/absences/{absence_id}/status"))
        .bearer_auth(&actors.teacher.1)
        .json(&json!({"status": "approved"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let approved: Value = res.json().await.unwrap();
    assert_eq!(approved["status"], "approved");
    assert!(approved["verification"].is_null());
}

#[tokio::test]
async fn prescriptions_cannot_be_transitioned() {
    let server = TestServer::spawn(SECRET).await;
    let base = &server.base_url;
    let client = reqwest::Client::new();
    let actors = actors();

    // Doctor + patient setup.
    let res = client
        .post(format!("{base}/health/doctors"))
        .bearer_auth(&actors.health_admin.1)
        .json(&json!({
            "subject_id": actors.doctor.0,
            "first_name": "Dunja",
            "last_name": "Ilic",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = client
        .post(format!("{base}/health/patients"))
        .bearer_auth(&actors.patient.1)
        .json(&json!({"first_name": "Mira", "last_name": "Kovac"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let patient: Value = res.json().await.unwrap();

    let res = client
        .post(format!("{base}/health/prescriptions"))
        .bearer_auth(&actors.doctor.1)
        .json(&json!({
            "patient_id": patient["id"],
            "medication": "amoxicillin",
            "dosage": "500mg 3x/day",
            "valid_until": Utc::now() + ChronoDuration::days(14),
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let prescription: Value = res.json().await.unwrap();
    assert_eq!(prescription["status"], "active");
    let prescription_id = prescription["id"].as_str().unwrap();

    // Even the issuing doctor cannot drive a status by hand.
    let res = client
        .patch(format!(
            "{base}/health/prescriptions/{prescription_id}/status"
        ))
        .bearer_auth(&actors.doctor.1)
        .json(&json!({"status": "used"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);

    // The patient sees their own prescription in a self-scoped list.
    let res = client
        .get(format!("{base}/health/prescriptions"))
        .bearer_auth(&actors.patient.1)
        .send()
        .await
        .unwrap();
    let list: Value = res.json().await.unwrap();
    assert_eq!(list["items"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn health_card_request_runs_through_processing() {
    let server = TestServer::spawn(SECRET).await;
    let base = &server.base_url;
    let client = reqwest::Client::new();
    let actors = actors();

    let res = client
        .post(format!("{base}/health/card-requests"))
        .bearer_auth(&actors.patient.1)
        .json(&json!({"request_kind": "new"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let request: Value = res.json().await.unwrap();
    let request_id = request["id"].as_str().unwrap();

    for (status, expected) in [
        ("processing", StatusCode::OK),
        ("issued", StatusCode::OK),
        // Terminal: nothing moves out of `issued`.
        ("rejected", StatusCode::CONFLICT),
    ] {
        let res = client
            .patch(format!("{base}/health/card-requests/{request_id}/status"))
            .bearer_auth(&actors.health_admin.1)
            .json(&json!({"status": status}))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), expected, "moving to {status}");
    }

    // Two entries in the audit trail: pending→processing→issued.
    let res = client
        .get(format!(
            "{base}/health/card-requests/{request_id}/transitions"
        ))
        .bearer_auth(&actors.health_admin.1)
        .send()
        .await
        .unwrap();
    let log: Value = res.json().await.unwrap();
    assert_eq!(log["items"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn unauthorized_probes_read_as_not_found() {
    let server = TestServer::spawn(SECRET).await;
    let base = &server.base_url;
    let client = reqwest::Client::new();
    let actors = actors();
    let child = SubjectId::new();

    let enrollment = submit_enrollment(&client, base, &actors.parent.1, child, None).await;
    let enrollment_id = enrollment["id"].as_str().unwrap();

    // A health-domain caller probing a real school id and a fabricated one
    // gets byte-identical answers.
    let real = client
        .patch(format!("{base}/school/enrollments/{enrollment_id}/status"))
        .bearer_auth(&actors.patient.1)
        .json(&json!({"status": "approved"}))
        .send()
        .await
        .unwrap();
    let fake = client
        .patch(format!(
            "{base}/school/enrollments/{}/status",
            civica_core::EntityId::new()
        ))
        .bearer_auth(&actors.patient.1)
        .json(&json!({"status": "approved"}))
        .send()
        .await
        .unwrap();

    assert_eq!(real.status(), StatusCode::NOT_FOUND);
    assert_eq!(fake.status(), StatusCode::NOT_FOUND);
    let real_body: Value = real.json().await.unwrap();
    let fake_body: Value = fake.json().await.unwrap();
    assert_eq!(real_body, fake_body);
}
