//! 作业的创建、查看、修改与发布

use chrono::{DateTime, Utc};
use tracing::info;

use super::GradingEngine;
use super::policy::{AssignmentSettings, check_restricted_fields, validate_settings};
use crate::errors::{HWSystemError, Result};
use crate::models::assignments::{
    entities::{Assignment, Visibility},
    requests::{CreateAssignmentRequest, UpdateAssignmentRequest},
    responses::FieldViolation,
};
use crate::models::users::entities::User;

/// 修改结果：受限字段或校验失败时返回全部违规项
#[derive(Debug)]
pub enum AssignmentUpdate {
    Updated(Assignment),
    Rejected(Vec<FieldViolation>),
}

fn violations_to_error(violations: &[FieldViolation]) -> HWSystemError {
    HWSystemError::validation(
        violations
            .iter()
            .map(|v| format!("{}: {}", v.field, v.message))
            .collect::<Vec<_>>()
            .join("; "),
    )
}

impl GradingEngine {
    pub async fn create_assignment(
        &self,
        actor: &User,
        req: CreateAssignmentRequest,
        now: DateTime<Utc>,
    ) -> Result<Assignment> {
        self.ensure_class_teacher(actor, req.class_id).await?;

        let settings = AssignmentSettings {
            title: &req.title,
            total_points: req.total_points,
            late_penalty: req.late_penalty,
            max_late_days: req.max_late_days,
            missing_submission_policy: &req.missing_submission_policy,
            rubric: req.rubric.as_deref(),
        };
        let violations = validate_settings(&settings);
        if !violations.is_empty() {
            return Err(violations_to_error(&violations));
        }

        if req.visibility == Some(Visibility::Scheduled)
            && !req.publish_at.is_some_and(|at| at > now)
        {
            return Err(HWSystemError::validation(
                "Scheduled assignments need a publish time in the future",
            ));
        }

        let assignment = self.storage.create_assignment(actor.id, req).await?;
        info!(
            assignment_id = assignment.id,
            class_id = assignment.class_id,
            visibility = %assignment.visibility,
            "Assignment created"
        );
        Ok(assignment)
    }

    /// 学生只能看到已开放的作业
    pub async fn get_assignment(&self, assignment_id: i64, viewer: &User) -> Result<Assignment> {
        let assignment = self.load_assignment(assignment_id).await?;
        if self.is_class_teacher(viewer, assignment.class_id).await? {
            return Ok(assignment);
        }

        let member = self
            .storage
            .get_class_user_by_user_id_and_class_id(viewer.id, assignment.class_id)
            .await?;
        if member.is_none() {
            return Err(HWSystemError::authorization(
                "You are not a member of this class",
            ));
        }
        if !assignment.is_open() {
            return Err(HWSystemError::not_found("Assignment not found"));
        }
        Ok(assignment)
    }

    pub async fn update_assignment(
        &self,
        assignment_id: i64,
        actor: &User,
        update: UpdateAssignmentRequest,
    ) -> Result<AssignmentUpdate> {
        let current = self.load_assignment(assignment_id).await?;
        self.ensure_class_teacher(actor, current.class_id).await?;

        let mut violations = validate_settings(&AssignmentSettings::merged(&current, &update));
        let counts = self
            .storage
            .count_assignment_submissions(current.id)
            .await?;
        violations.extend(check_restricted_fields(&current, &update, &counts));
        if !violations.is_empty() {
            return Ok(AssignmentUpdate::Rejected(violations));
        }

        let updated = self
            .storage
            .update_assignment(current.id, update)
            .await?
            .ok_or_else(|| HWSystemError::not_found("Assignment not found"))?;
        info!(assignment_id, actor_id = actor.id, "Assignment updated");
        Ok(AssignmentUpdate::Updated(updated))
    }

    pub async fn publish_assignment(&self, assignment_id: i64, actor: &User) -> Result<Assignment> {
        let current = self.load_assignment(assignment_id).await?;
        self.ensure_class_teacher(actor, current.class_id).await?;

        let published = self
            .storage
            .publish_assignment(current.id)
            .await?
            .ok_or_else(|| HWSystemError::not_found("Assignment not found"))?;
        info!(assignment_id, actor_id = actor.id, "Assignment published");
        Ok(published)
    }

    pub async fn schedule_assignment(
        &self,
        assignment_id: i64,
        actor: &User,
        publish_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Assignment> {
        let current = self.load_assignment(assignment_id).await?;
        self.ensure_class_teacher(actor, current.class_id).await?;

        if current.is_published() {
            return Err(HWSystemError::validation("Assignment is already published"));
        }
        if publish_at <= now {
            return Err(HWSystemError::validation(
                "Scheduled assignments need a publish time in the future",
            ));
        }

        self.storage
            .schedule_assignment(current.id, publish_at)
            .await?
            .ok_or_else(|| HWSystemError::not_found("Assignment not found"))
    }

    /// 软删除，保留提交与评分记录
    pub async fn delete_assignment(&self, assignment_id: i64, actor: &User) -> Result<()> {
        let current = self.load_assignment(assignment_id).await?;
        self.ensure_class_teacher(actor, current.class_id).await?;

        if !self
            .storage
            .soft_delete_assignment(current.id, actor.id)
            .await?
        {
            return Err(HWSystemError::not_found("Assignment not found"));
        }
        info!(assignment_id, actor_id = actor.id, "Assignment deleted");
        Ok(())
    }

    /// 定时发布到期的作业
    pub async fn publish_scheduled(&self, now: DateTime<Utc>) -> Result<Vec<i64>> {
        let published = self.storage.publish_due_scheduled_assignments(now).await?;
        if !published.is_empty() {
            info!(count = published.len(), ids = ?published, "Published scheduled assignments");
        }
        Ok(published)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::submissions::requests::SubmitRequest;
    use crate::services::grading::test_support::{Fixture, now};
    use chrono::Duration;

    #[tokio::test]
    async fn test_create_validates_settings() {
        let fx = Fixture::new().await;
        let mut req = fx.assignment_request(now() + Duration::days(7));
        req.total_points = 0.0;
        req.late_penalty = 120.0;
        let err = fx
            .engine
            .create_assignment(&fx.teacher, req, now())
            .await
            .unwrap_err();
        assert!(matches!(err, HWSystemError::Validation(_)));
        assert!(err.message().contains("total_points"));
        assert!(err.message().contains("late_penalty"));

        let student = fx.student("alice").await;
        let err = fx
            .engine
            .create_assignment(
                &student,
                fx.assignment_request(now() + Duration::days(7)),
                now(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, HWSystemError::Authorization(_)));

        let mut scheduled = fx.assignment_request(now() + Duration::days(7));
        scheduled.visibility = Some(Visibility::Scheduled);
        assert!(
            fx.engine
                .create_assignment(&fx.teacher, scheduled, now())
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_students_only_see_open_assignments() {
        let fx = Fixture::new().await;
        let mut draft = fx.assignment_request(now() + Duration::days(7));
        draft.visibility = Some(Visibility::Draft);
        let draft = fx
            .engine
            .create_assignment(&fx.teacher, draft, now())
            .await
            .unwrap();
        let student = fx.student("alice").await;
        let stranger = fx
            .user("stranger", crate::models::users::entities::UserStatus::Active)
            .await;

        let err = fx.engine.get_assignment(draft.id, &student).await.unwrap_err();
        assert!(matches!(err, HWSystemError::NotFound(_)));
        let err = fx.engine.get_assignment(draft.id, &stranger).await.unwrap_err();
        assert!(matches!(err, HWSystemError::Authorization(_)));
        assert!(fx.engine.get_assignment(draft.id, &fx.teacher).await.is_ok());

        fx.engine
            .publish_assignment(draft.id, &fx.teacher)
            .await
            .unwrap();
        let seen = fx.engine.get_assignment(draft.id, &student).await.unwrap();
        assert!(seen.is_published());

        fx.engine
            .delete_assignment(draft.id, &fx.teacher)
            .await
            .unwrap();
        let err = fx.engine.get_assignment(draft.id, &fx.teacher).await.unwrap_err();
        assert!(matches!(err, HWSystemError::NotFound(_)));
        let deleted = fx
            .storage
            .get_assignment_by_id(draft.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(deleted.deleted_by, Some(fx.teacher.id));
    }

    #[tokio::test]
    async fn test_update_blocked_by_restricted_fields() {
        let fx = Fixture::new().await;
        let assignment = fx.assignment_due_in(Duration::days(7)).await;
        let student = fx.student("alice").await;
        fx.engine
            .submit(
                assignment.id,
                &student,
                SubmitRequest {
                    content: Some("draft".to_string()),
                    attachments: vec![],
                },
                now(),
            )
            .await
            .unwrap();

        let result = fx
            .engine
            .update_assignment(
                assignment.id,
                &fx.teacher,
                UpdateAssignmentRequest {
                    due_date: Some(assignment.due_date - Duration::days(3)),
                    late_penalty: Some(-5.0),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let AssignmentUpdate::Rejected(violations) = result else {
            panic!("update should be rejected");
        };
        let fields: Vec<&str> = violations.iter().map(|v| v.field.as_str()).collect();
        assert!(fields.contains(&"due_date"));
        assert!(fields.contains(&"late_penalty"));

        let result = fx
            .engine
            .update_assignment(
                assignment.id,
                &fx.teacher,
                UpdateAssignmentRequest {
                    title: Some("Essay (revised)".to_string()),
                    due_date: Some(assignment.due_date + Duration::days(1)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let AssignmentUpdate::Updated(updated) = result else {
            panic!("update should succeed");
        };
        assert_eq!(updated.title, "Essay (revised)");
        assert_eq!(updated.due_date, assignment.due_date + Duration::days(1));
    }

    #[tokio::test]
    async fn test_scheduled_publish_sweep() {
        let fx = Fixture::new().await;
        let mut draft = fx.assignment_request(now() + Duration::days(7));
        draft.visibility = Some(Visibility::Draft);
        let draft = fx
            .engine
            .create_assignment(&fx.teacher, draft, now())
            .await
            .unwrap();

        let publish_at = now() + Duration::minutes(5);
        let err = fx
            .engine
            .schedule_assignment(draft.id, &fx.teacher, now() - Duration::minutes(1), now())
            .await
            .unwrap_err();
        assert!(matches!(err, HWSystemError::Validation(_)));
        let scheduled = fx
            .engine
            .schedule_assignment(draft.id, &fx.teacher, publish_at, now())
            .await
            .unwrap();
        assert_eq!(scheduled.visibility, Visibility::Scheduled);

        assert!(fx.engine.publish_scheduled(now()).await.unwrap().is_empty());
        let published = fx.engine.publish_scheduled(publish_at).await.unwrap();
        assert_eq!(published, vec![draft.id]);
        let reloaded = fx
            .storage
            .get_assignment_by_id(draft.id)
            .await
            .unwrap()
            .unwrap();
        assert!(reloaded.is_published());
    }
}
