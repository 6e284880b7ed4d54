//! Students, classes, courses and grades: the school's reference data and
//! the gradebook.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;

use civica_core::{GradeId, StudentId};

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::CallerContext;

pub fn router() -> Router {
    Router::new()
        .route("/students", post(create_student).get(list_students))
        .route("/students/:id", get(get_student))
        .route("/classes", post(create_class).get(list_classes))
        .route("/courses", post(create_course).get(list_courses))
        .route("/grades", post(create_grade).get(list_grades))
        .route("/grades/:id", delete(delete_grade))
}

pub async fn create_student(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Json(body): Json<dto::CreateStudentRequest>,
) -> axum::response::Response {
    match services.school.register_student(
        caller.claim(),
        body.subject_id,
        body.first_name,
        body.last_name,
        body.date_of_birth,
        body.parent_subject_id,
        body.class_id,
    ) {
        Ok(s) => (StatusCode::CREATED, Json(dto::student_to_json(&s))).into_response(),
        Err(e) => errors::domain_error_response(e),
    }
}

pub async fn list_students(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
) -> axum::response::Response {
    match services.school.list_students(caller.claim()) {
        Ok(list) => {
            let items = list.iter().map(dto::student_to_json).collect();
            (StatusCode::OK, Json(dto::items(items))).into_response()
        }
        Err(e) => errors::domain_error_response(e),
    }
}

pub async fn get_student(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: StudentId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid student id")
        }
    };
    match services.school.get_student(caller.claim(), id) {
        Ok(s) => (StatusCode::OK, Json(dto::student_to_json(&s))).into_response(),
        Err(e) => errors::scoped_error_response(e),
    }
}

pub async fn create_class(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Json(body): Json<dto::CreateClassRequest>,
) -> axum::response::Response {
    match services.school.create_class(
        caller.claim(),
        body.name,
        body.year,
        body.teacher_subject_id,
    ) {
        Ok(c) => (StatusCode::CREATED, Json(dto::class_to_json(&c))).into_response(),
        Err(e) => errors::domain_error_response(e),
    }
}

pub async fn list_classes(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
) -> axum::response::Response {
    match services.school.list_classes(caller.claim()) {
        Ok(list) => {
            let items = list.iter().map(dto::class_to_json).collect();
            (StatusCode::OK, Json(dto::items(items))).into_response()
        }
        Err(e) => errors::domain_error_response(e),
    }
}

pub async fn create_course(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Json(body): Json<dto::CreateCourseRequest>,
) -> axum::response::Response {
    match services.school.create_course(
        caller.claim(),
        body.name,
        body.class_id,
        body.teacher_subject_id,
    ) {
        Ok(c) => (StatusCode::CREATED, Json(dto::course_to_json(&c))).into_response(),
        Err(e) => errors::domain_error_response(e),
    }
}

pub async fn list_courses(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
) -> axum::response::Response {
    match services.school.list_courses(caller.claim()) {
        Ok(list) => {
            let items = list.iter().map(dto::course_to_json).collect();
            (StatusCode::OK, Json(dto::items(items))).into_response()
        }
        Err(e) => errors::domain_error_response(e),
    }
}

pub async fn create_grade(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Json(body): Json<dto::CreateGradeRequest>,
) -> axum::response::Response {
    match services.school.record_grade(
        caller.claim(),
        body.student_id,
        body.course_id,
        body.value,
        body.graded_on,
        body.comment,
    ) {
        Ok(g) => (StatusCode::CREATED, Json(dto::grade_to_json(&g))).into_response(),
        Err(e) => errors::domain_error_response(e),
    }
}

#[derive(Debug, Deserialize)]
pub struct GradeFilter {
    pub student_id: Option<StudentId>,
}

pub async fn list_grades(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Query(filter): Query<GradeFilter>,
) -> axum::response::Response {
    match services.school.list_grades(caller.claim(), filter.student_id) {
        Ok(list) => {
            let items = list.iter().map(dto::grade_to_json).collect();
            (StatusCode::OK, Json(dto::items(items))).into_response()
        }
        Err(e) => errors::domain_error_response(e),
    }
}

pub async fn delete_grade(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: GradeId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid grade id")
        }
    };
    match services.school.delete_grade(caller.claim(), id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::scoped_error_response(e),
    }
}
