use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{AssignmentService, current_user, error_response};
use crate::models::ApiResponse;

/// 花名册 + 提交情况（教师）
pub async fn list_submissions(
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
        .list_roster_submissions(assignment_id, &viewer)
        .await
    {
        Ok(items) => Ok(HttpResponse::Ok().json(ApiResponse::success(items, "OK"))),
        Err(e) => Ok(error_response(&e)),
    }
}

pub async fn get_my_submission(
    service: &AssignmentService,
    request: &HttpRequest,
    assignment_id: i64,
) -> ActixResult<HttpResponse> {
    let student = match current_user(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };

    match service
        .get_engine(request)
        .my_submission(assignment_id, &student)
        .await
    {
        Ok(view) => Ok(HttpResponse::Ok().json(ApiResponse::success(view, "OK"))),
        Err(e) => Ok(error_response(&e)),
    }
}
