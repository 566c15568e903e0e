//! Student roster routes.  Every route is tenant-scoped by `?schoolId=`.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Deserialize;
use serde_json::{json, Map, Value};

use es_directory::StudentFilter;
use es_domain::error::Error;

use super::{api_error, internal_error, parse_limit, TenantQuery};
use crate::state::AppState;

const DEFAULT_LIST_LIMIT: usize = 20;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    #[serde(default)]
    pub school_id: Option<String>,
    #[serde(default)]
    pub class_grade: Option<String>,
    #[serde(default)]
    pub section: Option<String>,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub limit: Option<String>,
}

/// Stored class labels read `"Class 5"`; callers may send just `"5"`.
fn class_label(grade: &str) -> String {
    if grade.starts_with("Class ") {
        grade.to_owned()
    } else {
        format!("Class {grade}")
    }
}

fn non_empty(v: Option<String>) -> Option<String> {
    v.filter(|s| !s.trim().is_empty())
}

/// `GET /api/students`
pub async fn list(State(state): State<AppState>, Query(q): Query<ListQuery>) -> Response {
    let Some(tenant) = non_empty(q.school_id) else {
        return api_error(StatusCode::BAD_REQUEST, "Missing schoolId");
    };
    let filter = StudentFilter {
        class_grade: non_empty(q.class_grade).map(|g| class_label(&g)),
        section: non_empty(q.section),
        search: non_empty(q.search),
        limit: Some(parse_limit(q.limit.as_deref(), DEFAULT_LIST_LIMIT)),
    };

    match state.roster.list_students(&tenant, &filter).await {
        Ok(students) => {
            Json(json!({ "totalCount": students.len(), "students": students })).into_response()
        }
        Err(e) => internal_error("listing students failed", e),
    }
}

/// `POST /api/students/add`
pub async fn add(
    State(state): State<AppState>,
    Query(q): Query<TenantQuery>,
    Json(student): Json<Map<String, Value>>,
) -> Response {
    let tenant = match q.tenant() {
        Ok(t) => t,
        Err(resp) => return resp,
    };
    match state.roster.add_student(tenant, student).await {
        Ok(id) => (StatusCode::CREATED, Json(json!({ "id": id }))).into_response(),
        Err(e) => internal_error("adding student failed", e),
    }
}

#[derive(Debug, Deserialize)]
pub struct BatchBody {
    #[serde(default)]
    pub students: Option<Value>,
}

/// `POST /api/students/batch`
pub async fn batch_add(
    State(state): State<AppState>,
    Query(q): Query<TenantQuery>,
    Json(body): Json<BatchBody>,
) -> Response {
    let tenant = match q.tenant() {
        Ok(t) => t,
        Err(resp) => return resp,
    };
    let Some(Value::Array(students)) = body.students else {
        return api_error(StatusCode::BAD_REQUEST, "Invalid students array");
    };

    match state.roster.add_students(tenant, students).await {
        Ok(count) => (
            StatusCode::CREATED,
            Json(json!({ "message": format!("Added {count} students"), "count": count })),
        )
            .into_response(),
        Err(Error::Other(msg)) => api_error(StatusCode::BAD_REQUEST, msg),
        Err(e) => internal_error("batch student insert failed", e),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateQuery {
    #[serde(default)]
    pub school_id: Option<String>,
    #[serde(default)]
    pub student_id: Option<String>,
}

/// `PUT /api/students/update`
pub async fn update(
    State(state): State<AppState>,
    Query(q): Query<UpdateQuery>,
    Json(patch): Json<Map<String, Value>>,
) -> Response {
    let (Some(tenant), Some(student_id)) = (non_empty(q.school_id), non_empty(q.student_id)) else {
        return api_error(StatusCode::BAD_REQUEST, "Missing schoolId or studentId");
    };

    match state.roster.update_student(&tenant, &student_id, patch).await {
        Ok(()) => Json(json!({ "message": "Student updated" })).into_response(),
        Err(Error::NotFound(what)) => api_error(StatusCode::NOT_FOUND, what),
        Err(e) => internal_error("updating student failed", e),
    }
}

/// `GET /api/students/contacts`
pub async fn contacts(State(state): State<AppState>, Query(q): Query<TenantQuery>) -> Response {
    let tenant = match q.tenant() {
        Ok(t) => t,
        Err(resp) => return resp,
    };
    match state.roster.parent_contacts(tenant).await {
        Ok(contacts) => {
            Json(json!({ "count": contacts.len(), "contacts": contacts })).into_response()
        }
        Err(e) => internal_error("listing parent contacts failed", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_grades_get_the_class_prefix() {
        assert_eq!(class_label("5"), "Class 5");
        assert_eq!(class_label("Class 5"), "Class 5");
    }
}
