pub mod crud;
pub mod grade;
pub mod missing;
pub mod submissions;
pub mod submit;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::error;

use crate::errors::HWSystemError;
use crate::middlewares::RequireJWT;
use crate::models::assignments::requests::{CreateAssignmentRequest, UpdateAssignmentRequest};
use crate::models::grading::requests::{BulkGradeRequest, GradeRequest};
use crate::models::submissions::requests::SubmitRequest;
use crate::models::users::entities::User;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::grading::GradingEngine;

pub struct AssignmentService {
    engine: Option<Arc<GradingEngine>>,
}

impl AssignmentService {
    pub fn new_lazy() -> Self {
        Self { engine: None }
    }

    pub(crate) fn get_engine(&self, request: &HttpRequest) -> Arc<GradingEngine> {
        if let Some(engine) = &self.engine {
            engine.clone()
        } else {
            request
                .app_data::<actix_web::web::Data<Arc<GradingEngine>>>()
                .expect("GradingEngine not found in app data")
                .get_ref()
                .clone()
        }
    }

    pub async fn create_assignment(
        &self,
        request: &HttpRequest,
        req: CreateAssignmentRequest,
    ) -> ActixResult<HttpResponse> {
        crud::create_assignment(self, request, req).await
    }

    pub async fn get_assignment(
        &self,
        request: &HttpRequest,
        assignment_id: i64,
    ) -> ActixResult<HttpResponse> {
        crud::get_assignment(self, request, assignment_id).await
    }

    pub async fn update_assignment(
        &self,
        request: &HttpRequest,
        assignment_id: i64,
        update: UpdateAssignmentRequest,
    ) -> ActixResult<HttpResponse> {
        crud::update_assignment(self, request, assignment_id, update).await
    }

    pub async fn publish_assignment(
        &self,
        request: &HttpRequest,
        assignment_id: i64,
    ) -> ActixResult<HttpResponse> {
        crud::publish_assignment(self, request, assignment_id).await
    }

    pub async fn schedule_assignment(
        &self,
        request: &HttpRequest,
        assignment_id: i64,
        publish_at: DateTime<Utc>,
    ) -> ActixResult<HttpResponse> {
        crud::schedule_assignment(self, request, assignment_id, publish_at).await
    }

    pub async fn delete_assignment(
        &self,
        request: &HttpRequest,
        assignment_id: i64,
    ) -> ActixResult<HttpResponse> {
        crud::delete_assignment(self, request, assignment_id).await
    }

    /// 学生提交作业
    pub async fn submit(
        &self,
        request: &HttpRequest,
        assignment_id: i64,
        req: SubmitRequest,
    ) -> ActixResult<HttpResponse> {
        submit::submit(self, request, assignment_id, req).await
    }

    /// 教师评分
    pub async fn grade_submission(
        &self,
        request: &HttpRequest,
        assignment_id: i64,
        submission_id: i64,
        req: GradeRequest,
    ) -> ActixResult<HttpResponse> {
        grade::grade_submission(self, request, assignment_id, submission_id, req).await
    }

    pub async fn list_grading_history(
        &self,
        request: &HttpRequest,
        assignment_id: i64,
        submission_id: i64,
    ) -> ActixResult<HttpResponse> {
        grade::list_grading_history(self, request, assignment_id, submission_id).await
    }

    pub async fn list_submissions(
        &self,
        request: &HttpRequest,
        assignment_id: i64,
    ) -> ActixResult<HttpResponse> {
        submissions::list_submissions(self, request, assignment_id).await
    }

    pub async fn get_my_submission(
        &self,
        request: &HttpRequest,
        assignment_id: i64,
    ) -> ActixResult<HttpResponse> {
        submissions::get_my_submission(self, request, assignment_id).await
    }

    pub async fn auto_grade_missing(
        &self,
        request: &HttpRequest,
        assignment_id: i64,
    ) -> ActixResult<HttpResponse> {
        missing::auto_grade_missing(self, request, assignment_id).await
    }

    pub async fn bulk_grade_missing(
        &self,
        request: &HttpRequest,
        assignment_id: i64,
        req: BulkGradeRequest,
    ) -> ActixResult<HttpResponse> {
        missing::bulk_grade_missing(self, request, assignment_id, req).await
    }

    pub async fn list_auto_grade_history(
        &self,
        request: &HttpRequest,
        assignment_id: i64,
    ) -> ActixResult<HttpResponse> {
        missing::list_auto_grade_history(self, request, assignment_id).await
    }
}

/// 当前登录用户，缺失时返回 401 响应
pub(crate) fn current_user(request: &HttpRequest) -> Result<User, HttpResponse> {
    RequireJWT::extract_user(request).ok_or_else(|| {
        HttpResponse::Unauthorized().json(ApiResponse::error_empty(
            ErrorCode::Unauthorized,
            "Authentication required",
        ))
    })
}

/// 业务错误转 HTTP 响应
pub(crate) fn error_response(err: &HWSystemError) -> HttpResponse {
    let status = err.status_code();
    if status.is_server_error() {
        error!("Request failed: {}", err);
    }
    HttpResponse::build(status).json(ApiResponse::from_error(err))
}
