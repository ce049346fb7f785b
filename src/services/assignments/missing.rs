use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use chrono::Utc;

use super::{AssignmentService, current_user, error_response};
use crate::models::ApiResponse;
use crate::models::grading::requests::BulkGradeRequest;

/// POST /assignments/{id}/auto-grade-missing
pub async fn auto_grade_missing(
    service: &AssignmentService,
    request: &HttpRequest,
    assignment_id: i64,
) -> ActixResult<HttpResponse> {
    let actor = match current_user(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };

    match service
        .get_engine(request)
        .auto_grade_missing(assignment_id, &actor, Utc::now())
        .await
    {
        Ok(resp) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            resp,
            "Missing submissions auto-graded",
        ))),
        Err(e) => Ok(error_response(&e)),
    }
}

/// POST /assignments/{id}/bulk-grade-missing
pub async fn bulk_grade_missing(
    service: &AssignmentService,
    request: &HttpRequest,
    assignment_id: i64,
    req: BulkGradeRequest,
) -> ActixResult<HttpResponse> {
    let actor = match current_user(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };

    match service
        .get_engine(request)
        .bulk_grade_missing(assignment_id, &actor, req, Utc::now())
        .await
    {
        Ok(resp) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            resp,
            "Missing submissions graded",
        ))),
        Err(e) => Ok(error_response(&e)),
    }
}

pub async fn list_auto_grade_history(
    service: &AssignmentService,
    request: &HttpRequest,
    assignment_id: i64,
) -> ActixResult<HttpResponse> {
    let viewer = match current_user(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };

    match service
        .get_engine(request)
        .list_auto_grade_history(assignment_id, &viewer)
        .await
    {
        Ok(runs) => Ok(HttpResponse::Ok().json(ApiResponse::success(runs, "OK"))),
        Err(e) => Ok(error_response(&e)),
    }
}
