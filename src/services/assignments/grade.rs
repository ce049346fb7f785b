use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use chrono::Utc;

use super::{AssignmentService, current_user, error_response};
use crate::models::ApiResponse;
use crate::models::grading::requests::GradeRequest;

/// PUT /assignments/{id}/submissions/{sub_id}/grade
pub async fn grade_submission(
    service: &AssignmentService,
    request: &HttpRequest,
    assignment_id: i64,
    submission_id: i64,
    req: GradeRequest,
) -> ActixResult<HttpResponse> {
    let grader = match current_user(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };

    match service
        .get_engine(request)
        .grade_submission(assignment_id, submission_id, &grader, req, Utc::now())
        .await
    {
        Ok(resp) => Ok(HttpResponse::Ok().json(ApiResponse::success(resp, "Submission graded"))),
        Err(e) => Ok(error_response(&e)),
    }
}

pub async fn list_grading_history(
    service: &AssignmentService,
    request: &HttpRequest,
    assignment_id: i64,
    submission_id: i64,
) -> ActixResult<HttpResponse> {
    let viewer = match current_user(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };

    match service
        .get_engine(request)
        .list_grading_history(assignment_id, submission_id, &viewer)
        .await
    {
        Ok(history) => Ok(HttpResponse::Ok().json(ApiResponse::success(history, "OK"))),
        Err(e) => Ok(error_response(&e)),
    }
}
