//! 作业存储操作

use super::SeaOrmStorage;
use crate::entity::assignments::{ActiveModel, Column, Entity as Assignments};
use crate::entity::submissions::{Column as SubmissionColumn, Entity as Submissions};
use crate::errors::{HWSystemError, Result};
use crate::models::assignments::{
    entities::{Assignment, SubmissionCounts, Visibility},
    requests::{CreateAssignmentRequest, UpdateAssignmentRequest},
};
use crate::models::submissions::entities::SubmissionStatus;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};

fn to_json<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value)
        .map_err(|e| HWSystemError::serialization(format!("序列化作业字段失败: {e}")))
}

impl SeaOrmStorage {
    /// 创建作业
    pub async fn create_assignment_impl(
        &self,
        created_by: i64,
        req: CreateAssignmentRequest,
    ) -> Result<Assignment> {
        let now = chrono::Utc::now().timestamp();
        let policy = req.missing_submission_policy.normalize();
        let visibility = req.visibility.unwrap_or(Visibility::Draft);

        let model = ActiveModel {
            class_id: Set(req.class_id),
            created_by: Set(created_by),
            title: Set(req.title),
            description: Set(req.description),
            due_date: Set(req.due_date.timestamp()),
            total_points: Set(req.total_points),
            allow_late_submission: Set(req.allow_late_submission),
            late_penalty: Set(req.late_penalty),
            max_late_days: Set(req.max_late_days),
            submission_type: Set(req.submission_settings.submission_type.to_string()),
            text_submission_required: Set(req.submission_settings.text_submission_required),
            file_submission_required: Set(req.submission_settings.file_submission_required),
            auto_grade_when_overdue: Set(policy.auto_grade_when_overdue),
            auto_grade_value: Set(policy.auto_grade_value),
            days_after_due_for_auto_grade: Set(policy.days_after_due_for_auto_grade),
            reminder_days_before_due: Set(to_json(&policy.reminder_days_before_due)?),
            notify_students_of_missing_submission: Set(
                policy.notify_students_of_missing_submission
            ),
            rubric: Set(req.rubric.as_ref().map(to_json).transpose()?),
            visibility: Set(visibility.to_string()),
            publish_at: Set(req.publish_at.map(|t| t.timestamp())),
            is_active: Set(true),
            is_deleted: Set(false),
            deleted_at: Set(None),
            deleted_by: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("创建作业失败: {e}")))?;

        Ok(result.into_assignment())
    }

    /// 通过 ID 获取作业（含已软删除）
    pub async fn get_assignment_by_id_impl(
        &self,
        assignment_id: i64,
    ) -> Result<Option<Assignment>> {
        let result = Assignments::find_by_id(assignment_id)
            .one(&self.db)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("查询作业失败: {e}")))?;

        Ok(result.map(|m| m.into_assignment()))
    }

    /// 更新作业
    pub async fn update_assignment_impl(
        &self,
        assignment_id: i64,
        update: UpdateAssignmentRequest,
    ) -> Result<Option<Assignment>> {
        let existing = Assignments::find_by_id(assignment_id)
            .one(&self.db)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("查询作业失败: {e}")))?;

        let Some(existing) = existing else {
            return Ok(None);
        };

        let mut model: ActiveModel = existing.into();

        if let Some(title) = update.title {
            model.title = Set(title);
        }
        if let Some(description) = update.description {
            model.description = Set(Some(description));
        }
        if let Some(due_date) = update.due_date {
            model.due_date = Set(due_date.timestamp());
        }
        if let Some(total_points) = update.total_points {
            model.total_points = Set(total_points);
        }
        if let Some(allow) = update.allow_late_submission {
            model.allow_late_submission = Set(allow);
        }
        if let Some(late_penalty) = update.late_penalty {
            model.late_penalty = Set(late_penalty);
        }
        if let Some(max_late_days) = update.max_late_days {
            model.max_late_days = Set(max_late_days);
        }
        if let Some(settings) = update.submission_settings {
            model.submission_type = Set(settings.submission_type.to_string());
            model.text_submission_required = Set(settings.text_submission_required);
            model.file_submission_required = Set(settings.file_submission_required);
        }
        if let Some(policy) = update.missing_submission_policy {
            let policy = policy.normalize();
            model.auto_grade_when_overdue = Set(policy.auto_grade_when_overdue);
            model.auto_grade_value = Set(policy.auto_grade_value);
            model.days_after_due_for_auto_grade = Set(policy.days_after_due_for_auto_grade);
            model.reminder_days_before_due = Set(to_json(&policy.reminder_days_before_due)?);
            model.notify_students_of_missing_submission =
                Set(policy.notify_students_of_missing_submission);
        }
        if let Some(rubric) = update.rubric {
            model.rubric = Set(Some(to_json(&rubric)?));
        }
        if let Some(is_active) = update.is_active {
            model.is_active = Set(is_active);
        }
        model.updated_at = Set(chrono::Utc::now().timestamp());

        let result = model
            .update(&self.db)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("更新作业失败: {e}")))?;

        Ok(Some(result.into_assignment()))
    }

    /// 立即发布
    pub async fn publish_assignment_impl(&self, assignment_id: i64) -> Result<Option<Assignment>> {
        let result = Assignments::update_many()
            .col_expr(
                Column::Visibility,
                sea_orm::sea_query::Expr::value(Visibility::Published.to_string()),
            )
            .col_expr(
                Column::PublishAt,
                sea_orm::sea_query::Expr::value(Option::<i64>::None),
            )
            .col_expr(
                Column::UpdatedAt,
                sea_orm::sea_query::Expr::value(chrono::Utc::now().timestamp()),
            )
            .filter(Column::Id.eq(assignment_id))
            .filter(Column::IsDeleted.eq(false))
            .exec(&self.db)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("发布作业失败: {e}")))?;

        if result.rows_affected == 0 {
            return Ok(None);
        }
        self.get_assignment_by_id_impl(assignment_id).await
    }

    /// 设置定时发布
    pub async fn schedule_assignment_impl(
        &self,
        assignment_id: i64,
        publish_at: DateTime<Utc>,
    ) -> Result<Option<Assignment>> {
        let result = Assignments::update_many()
            .col_expr(
                Column::Visibility,
                sea_orm::sea_query::Expr::value(Visibility::Scheduled.to_string()),
            )
            .col_expr(
                Column::PublishAt,
                sea_orm::sea_query::Expr::value(Some(publish_at.timestamp())),
            )
            .col_expr(
                Column::UpdatedAt,
                sea_orm::sea_query::Expr::value(chrono::Utc::now().timestamp()),
            )
            .filter(Column::Id.eq(assignment_id))
            .filter(Column::IsDeleted.eq(false))
            .exec(&self.db)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("设置定时发布失败: {e}")))?;

        if result.rows_affected == 0 {
            return Ok(None);
        }
        self.get_assignment_by_id_impl(assignment_id).await
    }

    /// 软删除作业
    pub async fn soft_delete_assignment_impl(
        &self,
        assignment_id: i64,
        deleted_by: i64,
    ) -> Result<bool> {
        let now = chrono::Utc::now().timestamp();

        let result = Assignments::update_many()
            .col_expr(Column::IsDeleted, sea_orm::sea_query::Expr::value(true))
            .col_expr(Column::DeletedAt, sea_orm::sea_query::Expr::value(Some(now)))
            .col_expr(
                Column::DeletedBy,
                sea_orm::sea_query::Expr::value(Some(deleted_by)),
            )
            .col_expr(Column::UpdatedAt, sea_orm::sea_query::Expr::value(now))
            .filter(Column::Id.eq(assignment_id))
            .filter(Column::IsDeleted.eq(false))
            .exec(&self.db)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("删除作业失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }

    /// 发布到期的定时作业
    pub async fn publish_due_scheduled_assignments_impl(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<i64>> {
        let ids: Vec<i64> = Assignments::find()
            .select_only()
            .column(Column::Id)
            .filter(Column::Visibility.eq(Visibility::Scheduled.to_string()))
            .filter(Column::PublishAt.lte(now.timestamp()))
            .filter(Column::IsDeleted.eq(false))
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("查询定时作业失败: {e}")))?;

        if ids.is_empty() {
            return Ok(ids);
        }

        Assignments::update_many()
            .col_expr(
                Column::Visibility,
                sea_orm::sea_query::Expr::value(Visibility::Published.to_string()),
            )
            .col_expr(
                Column::UpdatedAt,
                sea_orm::sea_query::Expr::value(now.timestamp()),
            )
            .filter(Column::Id.is_in(ids.clone()))
            .filter(Column::Visibility.eq(Visibility::Scheduled.to_string()))
            .exec(&self.db)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("发布定时作业失败: {e}")))?;

        Ok(ids)
    }

    /// 自动评分候选作业
    pub async fn list_auto_grade_candidates_impl(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<Assignment>> {
        let results = Assignments::find()
            .filter(Column::AutoGradeWhenOverdue.eq(true))
            .filter(Column::DueDate.lt(now.timestamp()))
            .filter(Column::Visibility.eq(Visibility::Published.to_string()))
            .filter(Column::IsActive.eq(true))
            .filter(Column::IsDeleted.eq(false))
            .order_by_asc(Column::DueDate)
            .all(&self.db)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("查询自动评分作业失败: {e}")))?;

        Ok(results.into_iter().map(|m| m.into_assignment()).collect())
    }

    /// 缺交提醒候选作业
    pub async fn list_reminder_candidates_impl(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<Assignment>> {
        let results = Assignments::find()
            .filter(Column::NotifyStudentsOfMissingSubmission.eq(true))
            .filter(Column::DueDate.gte(now.timestamp()))
            .filter(Column::Visibility.eq(Visibility::Published.to_string()))
            .filter(Column::IsActive.eq(true))
            .filter(Column::IsDeleted.eq(false))
            .order_by_asc(Column::DueDate)
            .all(&self.db)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("查询提醒作业失败: {e}")))?;

        Ok(results.into_iter().map(|m| m.into_assignment()).collect())
    }

    /// 统计作业的真实提交数与已评分数
    pub async fn count_assignment_submissions_impl(
        &self,
        assignment_id: i64,
    ) -> Result<SubmissionCounts> {
        let submitted = Submissions::find()
            .filter(SubmissionColumn::AssignmentId.eq(assignment_id))
            .filter(SubmissionColumn::SubmittedAt.is_not_null())
            .count(&self.db)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("统计提交数失败: {e}")))?;

        let graded = Submissions::find()
            .filter(SubmissionColumn::AssignmentId.eq(assignment_id))
            .filter(SubmissionColumn::Status.eq(SubmissionStatus::Graded.to_string()))
            .count(&self.db)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("统计评分数失败: {e}")))?;

        Ok(SubmissionCounts { submitted, graded })
    }
}
