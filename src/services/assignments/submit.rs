use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use chrono::Utc;

use super::{AssignmentService, current_user, error_response};
use crate::models::ApiResponse;
use crate::models::submissions::requests::SubmitRequest;

/// POST /assignments/{id}/submit
pub async fn submit(
    service: &AssignmentService,
    request: &HttpRequest,
    assignment_id: i64,
    req: SubmitRequest,
) -> ActixResult<HttpResponse> {
    let student = match current_user(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };

    match service
        .get_engine(request)
        .submit(assignment_id, &student, req, Utc::now())
        .await
    {
        Ok(submission) => {
            Ok(HttpResponse::Ok().json(ApiResponse::success(submission, "Submission received")))
        }
        Err(e) => Ok(error_response(&e)),
    }
}
