//! 管理员手动触发定时任务

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use chrono::Utc;
use std::sync::Arc;

use crate::models::ApiResponse;
use crate::services::assignments::error_response;
use crate::services::grading::GradingEngine;

pub struct JobService {
    engine: Option<Arc<GradingEngine>>,
}

impl JobService {
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

    pub async fn run_auto_grade(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        match self.get_engine(request).run_auto_grade(Utc::now()).await {
            Ok(summaries) => Ok(HttpResponse::Ok().json(ApiResponse::success(
                summaries,
                "Auto-grading sweep finished",
            ))),
            Err(e) => Ok(error_response(&e)),
        }
    }

    pub async fn run_reminders(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        match self.get_engine(request).run_reminders(Utc::now()).await {
            Ok(summaries) => Ok(HttpResponse::Ok().json(ApiResponse::success(
                summaries,
                "Reminder sweep finished",
            ))),
            Err(e) => Ok(error_response(&e)),
        }
    }

    pub async fn publish_scheduled(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        match self.get_engine(request).publish_scheduled(Utc::now()).await {
            Ok(ids) => Ok(HttpResponse::Ok().json(ApiResponse::success(
                ids,
                "Scheduled assignments published",
            ))),
            Err(e) => Ok(error_response(&e)),
        }
    }
}
