use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares::{self, RateLimit};
use crate::models::users::entities::UserRole;
use crate::services::JobService;

static JOB_SERVICE: Lazy<JobService> = Lazy::new(JobService::new_lazy);

pub async fn run_auto_grade(request: HttpRequest) -> ActixResult<HttpResponse> {
    JOB_SERVICE.run_auto_grade(&request).await
}

pub async fn run_reminders(request: HttpRequest) -> ActixResult<HttpResponse> {
    JOB_SERVICE.run_reminders(&request).await
}

pub async fn publish_scheduled(request: HttpRequest) -> ActixResult<HttpResponse> {
    JOB_SERVICE.publish_scheduled(&request).await
}

// 配置路由
pub fn configure_admin_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/admin/jobs")
            .wrap(middlewares::RequireJWT)
            .service(
                web::scope("")
                    .wrap(middlewares::RequireRole::new(&UserRole::Admin))
                    .wrap(RateLimit::batch_grading())
                    .route("/auto-grade", web::post().to(run_auto_grade))
                    .route("/reminders", web::post().to(run_reminders))
                    .route("/publish-scheduled", web::post().to(publish_scheduled)),
            ),
    );
}
