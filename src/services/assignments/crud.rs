use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use chrono::{DateTime, Utc};

use super::{AssignmentService, current_user, error_response};
use crate::models::assignments::{
    requests::{CreateAssignmentRequest, UpdateAssignmentRequest},
    responses::FieldViolationsResponse,
};
use crate::models::{ApiResponse, ErrorCode};
use crate::services::grading::AssignmentUpdate;

pub async fn create_assignment(
    service: &AssignmentService,
    request: &HttpRequest,
    req: CreateAssignmentRequest,
) -> ActixResult<HttpResponse> {
    let user = match current_user(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };

    match service
        .get_engine(request)
        .create_assignment(&user, req, Utc::now())
        .await
    {
        Ok(assignment) => Ok(HttpResponse::Created()
            .json(ApiResponse::success(assignment, "Assignment created"))),
        Err(e) => Ok(error_response(&e)),
    }
}

pub async fn get_assignment(
    service: &AssignmentService,
    request: &HttpRequest,
    assignment_id: i64,
) -> ActixResult<HttpResponse> {
    let user = match current_user(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };

    match service
        .get_engine(request)
        .get_assignment(assignment_id, &user)
        .await
    {
        Ok(assignment) => Ok(HttpResponse::Ok().json(ApiResponse::success(assignment, "OK"))),
        Err(e) => Ok(error_response(&e)),
    }
}

/// 受限字段违规时返回 400 和完整的违规列表
pub async fn update_assignment(
    service: &AssignmentService,
    request: &HttpRequest,
    assignment_id: i64,
    update: UpdateAssignmentRequest,
) -> ActixResult<HttpResponse> {
    let user = match current_user(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };

    match service
        .get_engine(request)
        .update_assignment(assignment_id, &user, update)
        .await
    {
        Ok(AssignmentUpdate::Updated(assignment)) => {
            Ok(HttpResponse::Ok().json(ApiResponse::success(assignment, "Assignment updated")))
        }
        Ok(AssignmentUpdate::Rejected(violations)) => {
            Ok(HttpResponse::BadRequest().json(ApiResponse::error(
                ErrorCode::RestrictedFieldUpdate,
                FieldViolationsResponse { violations },
                "Assignment update rejected",
            )))
        }
        Err(e) => Ok(error_response(&e)),
    }
}

pub async fn publish_assignment(
    service: &AssignmentService,
    request: &HttpRequest,
    assignment_id: i64,
) -> ActixResult<HttpResponse> {
    let user = match current_user(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };

    match service
        .get_engine(request)
        .publish_assignment(assignment_id, &user)
        .await
    {
        Ok(assignment) => {
            Ok(HttpResponse::Ok().json(ApiResponse::success(assignment, "Assignment published")))
        }
        Err(e) => Ok(error_response(&e)),
    }
}

pub async fn schedule_assignment(
    service: &AssignmentService,
    request: &HttpRequest,
    assignment_id: i64,
    publish_at: DateTime<Utc>,
) -> ActixResult<HttpResponse> {
    let user = match current_user(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };

    match service
        .get_engine(request)
        .schedule_assignment(assignment_id, &user, publish_at, Utc::now())
        .await
    {
        Ok(assignment) => {
            Ok(HttpResponse::Ok().json(ApiResponse::success(assignment, "Assignment scheduled")))
        }
        Err(e) => Ok(error_response(&e)),
    }
}

pub async fn delete_assignment(
    service: &AssignmentService,
    request: &HttpRequest,
    assignment_id: i64,
) -> ActixResult<HttpResponse> {
    let user = match current_user(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };

    match service
        .get_engine(request)
        .delete_assignment(assignment_id, &user)
        .await
    {
        Ok(()) => Ok(HttpResponse::Ok().json(ApiResponse::success_empty("Assignment deleted"))),
        Err(e) => Ok(error_response(&e)),
    }
}
