use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares::{self, RateLimit};
use crate::models::assignments::requests::{
    CreateAssignmentRequest, ScheduleAssignmentRequest, UpdateAssignmentRequest,
};
use crate::models::grading::requests::{BulkGradeRequest, GradeRequest};
use crate::models::submissions::requests::SubmitRequest;
use crate::services::AssignmentService;

// 懒加载的全局 AssignmentService 实例
static ASSIGNMENT_SERVICE: Lazy<AssignmentService> = Lazy::new(AssignmentService::new_lazy);

pub async fn create_assignment(
    req: HttpRequest,
    body: web::Json<CreateAssignmentRequest>,
) -> ActixResult<HttpResponse> {
    ASSIGNMENT_SERVICE
        .create_assignment(&req, body.into_inner())
        .await
}

pub async fn get_assignment(req: HttpRequest, path: web::Path<i64>) -> ActixResult<HttpResponse> {
    ASSIGNMENT_SERVICE
        .get_assignment(&req, path.into_inner())
        .await
}

pub async fn update_assignment(
    req: HttpRequest,
    path: web::Path<i64>,
    body: web::Json<UpdateAssignmentRequest>,
) -> ActixResult<HttpResponse> {
    ASSIGNMENT_SERVICE
        .update_assignment(&req, path.into_inner(), body.into_inner())
        .await
}

pub async fn delete_assignment(
    req: HttpRequest,
    path: web::Path<i64>,
) -> ActixResult<HttpResponse> {
    ASSIGNMENT_SERVICE
        .delete_assignment(&req, path.into_inner())
        .await
}

pub async fn publish_assignment(
    req: HttpRequest,
    path: web::Path<i64>,
) -> ActixResult<HttpResponse> {
    ASSIGNMENT_SERVICE
        .publish_assignment(&req, path.into_inner())
        .await
}

pub async fn schedule_assignment(
    req: HttpRequest,
    path: web::Path<i64>,
    body: web::Json<ScheduleAssignmentRequest>,
) -> ActixResult<HttpResponse> {
    ASSIGNMENT_SERVICE
        .schedule_assignment(&req, path.into_inner(), body.publish_at)
        .await
}

pub async fn submit(
    req: HttpRequest,
    path: web::Path<i64>,
    body: web::Json<SubmitRequest>,
) -> ActixResult<HttpResponse> {
    ASSIGNMENT_SERVICE
        .submit(&req, path.into_inner(), body.into_inner())
        .await
}

pub async fn list_submissions(
    req: HttpRequest,
    path: web::Path<i64>,
) -> ActixResult<HttpResponse> {
    ASSIGNMENT_SERVICE
        .list_submissions(&req, path.into_inner())
        .await
}

pub async fn get_my_submission(
    req: HttpRequest,
    path: web::Path<i64>,
) -> ActixResult<HttpResponse> {
    ASSIGNMENT_SERVICE
        .get_my_submission(&req, path.into_inner())
        .await
}

pub async fn grade_submission(
    req: HttpRequest,
    path: web::Path<(i64, i64)>, // (assignment_id, submission_id)
    body: web::Json<GradeRequest>,
) -> ActixResult<HttpResponse> {
    let (assignment_id, submission_id) = path.into_inner();
    ASSIGNMENT_SERVICE
        .grade_submission(&req, assignment_id, submission_id, body.into_inner())
        .await
}

pub async fn list_grading_history(
    req: HttpRequest,
    path: web::Path<(i64, i64)>,
) -> ActixResult<HttpResponse> {
    let (assignment_id, submission_id) = path.into_inner();
    ASSIGNMENT_SERVICE
        .list_grading_history(&req, assignment_id, submission_id)
        .await
}

pub async fn auto_grade_missing(
    req: HttpRequest,
    path: web::Path<i64>,
) -> ActixResult<HttpResponse> {
    ASSIGNMENT_SERVICE
        .auto_grade_missing(&req, path.into_inner())
        .await
}

pub async fn bulk_grade_missing(
    req: HttpRequest,
    path: web::Path<i64>,
    body: web::Json<BulkGradeRequest>,
) -> ActixResult<HttpResponse> {
    ASSIGNMENT_SERVICE
        .bulk_grade_missing(&req, path.into_inner(), body.into_inner())
        .await
}

pub async fn list_auto_grade_history(
    req: HttpRequest,
    path: web::Path<i64>,
) -> ActixResult<HttpResponse> {
    ASSIGNMENT_SERVICE
        .list_auto_grade_history(&req, path.into_inner())
        .await
}

// 配置路由
pub fn configure_assignment_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/assignments")
            .wrap(middlewares::RequireJWT)
            .route("", web::post().to(create_assignment))
            .route("/{id}", web::get().to(get_assignment))
            .route("/{id}", web::put().to(update_assignment))
            .route("/{id}", web::delete().to(delete_assignment))
            .route("/{id}/publish", web::post().to(publish_assignment))
            .route("/{id}/schedule", web::post().to(schedule_assignment))
            .service(
                web::resource("/{id}/submit")
                    .wrap(RateLimit::submission())
                    .route(web::post().to(submit)),
            )
            .route("/{id}/submissions", web::get().to(list_submissions))
            .route("/{id}/submissions/mine", web::get().to(get_my_submission))
            .route(
                "/{id}/submissions/{sub_id}/grade",
                web::put().to(grade_submission),
            )
            .route(
                "/{id}/submissions/{sub_id}/history",
                web::get().to(list_grading_history),
            )
            .service(
                web::resource("/{id}/auto-grade-missing")
                    .wrap(RateLimit::batch_grading())
                    .route(web::post().to(auto_grade_missing)),
            )
            .service(
                web::resource("/{id}/bulk-grade-missing")
                    .wrap(RateLimit::batch_grading())
                    .route(web::post().to(bulk_grade_missing)),
            )
            .route(
                "/{id}/auto-grade-history",
                web::get().to(list_auto_grade_history),
            ),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ObjectCache;
    use crate::cache::object_cache::moka::MokaCacheWrapper;
    use crate::routes::configure_notification_routes;
    use crate::services::grading::test_support::Fixture;
    use crate::services::grading::{GradingEngine, StorageNotifier, StorageRosterResolver};
    use crate::storage::Storage;
    use crate::utils::jwt::JwtUtils;
    use actix_web::http::StatusCode;
    use actix_web::{App, test};
    use chrono::Duration;
    use serde_json::{Value, json};
    use std::sync::Arc;

    fn bearer(user_id: i64) -> (&'static str, String) {
        let token = JwtUtils::generate_access_token(user_id, "user").unwrap();
        ("Authorization", format!("Bearer {token}"))
    }

    #[actix_web::test]
    async fn test_submit_and_grade_over_http() {
        let fx = Fixture::new().await;
        let assignment = fx.assignment_due_in(Duration::days(2)).await;
        let alice = fx.student("alice").await;

        let storage: Arc<dyn Storage> = fx.storage.clone();
        let engine = Arc::new(GradingEngine::new(
            storage.clone(),
            Arc::new(StorageRosterResolver::new(storage.clone())),
            Arc::new(StorageNotifier::new(storage.clone())),
        ));
        let cache: Arc<dyn ObjectCache> = Arc::new(MokaCacheWrapper::with_capacity(100, 60));
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(storage))
                .app_data(web::Data::new(cache))
                .app_data(web::Data::new(engine))
                .configure(configure_assignment_routes)
                .configure(configure_notification_routes),
        )
        .await;

        let submit_uri = format!("/api/v1/assignments/{}/submit", assignment.id);
        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri(&submit_uri)
                .set_json(json!({"content": "my essay"}))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri(&submit_uri)
                .insert_header(bearer(alice.id))
                .set_json(json!({"content": "my essay"}))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["code"], 0);
        let submission_id = body["data"]["id"].as_i64().unwrap();

        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri(&submit_uri)
                .insert_header(bearer(alice.id))
                .set_json(json!({"content": "second try"}))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let grade_uri = format!(
            "/api/v1/assignments/{}/submissions/{}/grade",
            assignment.id, submission_id
        );
        let resp = test::call_service(
            &app,
            test::TestRequest::put()
                .uri(&grade_uri)
                .insert_header(bearer(fx.teacher.id))
                .set_json(json!({"grade": 150.0, "feedback": "Thorough and well argued."}))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = test::call_service(
            &app,
            test::TestRequest::put()
                .uri(&grade_uri)
                .insert_header(bearer(fx.teacher.id))
                .set_json(json!({"grade": 85.0, "feedback": "Thorough and well argued."}))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["data"]["submission"]["grade"], 85.0);
        assert_eq!(body["data"]["penalty_info"]["is_late"], false);

        let resp = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/api/v1/notifications")
                .insert_header(bearer(alice.id))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        let kinds: Vec<&str> = body["data"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|n| n["notification_type"].as_str())
            .collect();
        assert_eq!(kinds, vec!["grade_assigned"]);
    }

    #[actix_web::test]
    async fn test_auto_grade_missing_requires_overdue() {
        let fx = Fixture::new().await;
        let assignment = fx.assignment_due_in(Duration::days(1)).await;
        fx.student("bob").await;

        let storage: Arc<dyn Storage> = fx.storage.clone();
        let engine = Arc::new(GradingEngine::new(
            storage.clone(),
            Arc::new(StorageRosterResolver::new(storage.clone())),
            Arc::new(StorageNotifier::new(storage.clone())),
        ));
        let cache: Arc<dyn ObjectCache> = Arc::new(MokaCacheWrapper::with_capacity(100, 60));
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(storage))
                .app_data(web::Data::new(cache))
                .app_data(web::Data::new(engine))
                .configure(configure_assignment_routes),
        )
        .await;

        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri(&format!(
                    "/api/v1/assignments/{}/auto-grade-missing",
                    assignment.id
                ))
                .insert_header(bearer(fx.teacher.id))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "Assignment is not overdue yet");
    }
}
