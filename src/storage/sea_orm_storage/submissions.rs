//! 提交存储操作

use super::SeaOrmStorage;
use crate::entity::submissions::{ActiveModel, Column, Entity as Submissions};
use crate::errors::{HWSystemError, Result};
use crate::models::submissions::entities::{Submission, SubmissionStatus};
use crate::storage::{NewSubmission, Resubmission};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
    Set,
};

fn status_for(is_late: bool) -> SubmissionStatus {
    if is_late {
        SubmissionStatus::Late
    } else {
        SubmissionStatus::Submitted
    }
}

impl SeaOrmStorage {
    /// 首次提交
    pub async fn create_submission_impl(&self, new: NewSubmission) -> Result<Submission> {
        let now = chrono::Utc::now().timestamp();
        let attachments = serde_json::to_string(&new.attachments)
            .map_err(|e| HWSystemError::serialization(format!("序列化附件失败: {e}")))?;

        let model = ActiveModel {
            assignment_id: Set(new.assignment_id),
            student_id: Set(new.student_id),
            submitted_at: Set(Some(new.submitted_at.timestamp())),
            content: Set(new.content),
            attachments: Set(attachments),
            status: Set(status_for(new.is_late).to_string()),
            is_late: Set(new.is_late),
            grade: Set(None),
            original_grade: Set(None),
            feedback: Set(None),
            graded_at: Set(None),
            grader_kind: Set(None),
            grader_id: Set(None),
            penalty_applied: Set(false),
            penalty_percent: Set(0.0),
            penalty_days_late: Set(0),
            penalty_amount: Set(0.0),
            allow_resubmit: Set(false),
            resubmission_count: Set(0),
            hide_grade_from_student: Set(false),
            version: Set(1),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = model.insert(&self.db).await.map_err(|e| {
            super::write_error(e, "该学生已提交过此作业", "创建提交失败")
        })?;

        Ok(result.into_submission())
    }

    /// 重新提交：只有开放重交且版本号一致时才会命中
    pub async fn resubmit_impl(&self, resubmission: Resubmission) -> Result<Submission> {
        let attachments = serde_json::to_string(&resubmission.attachments)
            .map_err(|e| HWSystemError::serialization(format!("序列化附件失败: {e}")))?;
        let status = status_for(resubmission.is_late);

        let result = Submissions::update_many()
            .col_expr(
                Column::SubmittedAt,
                Expr::value(Some(resubmission.submitted_at.timestamp())),
            )
            .col_expr(Column::Content, Expr::value(resubmission.content))
            .col_expr(Column::Attachments, Expr::value(attachments))
            .col_expr(Column::Status, Expr::value(status.to_string()))
            .col_expr(Column::IsLate, Expr::value(resubmission.is_late))
            .col_expr(Column::Grade, Expr::value(Option::<f64>::None))
            .col_expr(Column::OriginalGrade, Expr::value(Option::<f64>::None))
            .col_expr(Column::Feedback, Expr::value(Option::<String>::None))
            .col_expr(Column::GradedAt, Expr::value(Option::<i64>::None))
            .col_expr(Column::GraderKind, Expr::value(Option::<String>::None))
            .col_expr(Column::GraderId, Expr::value(Option::<i64>::None))
            .col_expr(Column::PenaltyApplied, Expr::value(false))
            .col_expr(Column::PenaltyPercent, Expr::value(0.0))
            .col_expr(Column::PenaltyDaysLate, Expr::value(0))
            .col_expr(Column::PenaltyAmount, Expr::value(0.0))
            .col_expr(Column::AllowResubmit, Expr::value(false))
            .col_expr(
                Column::ResubmissionCount,
                Expr::value(resubmission.resubmission_count + 1),
            )
            .col_expr(
                Column::Version,
                Expr::value(resubmission.expected_version + 1),
            )
            .col_expr(
                Column::UpdatedAt,
                Expr::value(resubmission.submitted_at.timestamp()),
            )
            .filter(Column::Id.eq(resubmission.submission_id))
            .filter(Column::Version.eq(resubmission.expected_version))
            .filter(Column::AllowResubmit.eq(true))
            .exec(&self.db)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("重新提交失败: {e}")))?;

        if result.rows_affected == 0 {
            return Err(HWSystemError::conflict(
                "Submission was modified concurrently, please reload and try again",
            ));
        }

        self.get_submission_by_id_impl(resubmission.submission_id)
            .await?
            .ok_or_else(|| HWSystemError::not_found("Submission not found"))
    }

    /// 通过 ID 获取提交
    pub async fn get_submission_by_id_impl(
        &self,
        submission_id: i64,
    ) -> Result<Option<Submission>> {
        let result = Submissions::find_by_id(submission_id)
            .one(&self.db)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("查询提交失败: {e}")))?;

        Ok(result.map(|m| m.into_submission()))
    }

    /// 获取学生在某作业下的提交
    pub async fn get_submission_by_assignment_and_student_impl(
        &self,
        assignment_id: i64,
        student_id: i64,
    ) -> Result<Option<Submission>> {
        let result = Submissions::find()
            .filter(
                Condition::all()
                    .add(Column::AssignmentId.eq(assignment_id))
                    .add(Column::StudentId.eq(student_id)),
            )
            .one(&self.db)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("查询提交失败: {e}")))?;

        Ok(result.map(|m| m.into_submission()))
    }

    /// 列出作业下全部提交
    pub async fn list_submissions_by_assignment_impl(
        &self,
        assignment_id: i64,
    ) -> Result<Vec<Submission>> {
        let results = Submissions::find()
            .filter(Column::AssignmentId.eq(assignment_id))
            .order_by_asc(Column::StudentId)
            .all(&self.db)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("查询提交列表失败: {e}")))?;

        Ok(results.into_iter().map(|m| m.into_submission()).collect())
    }

    /// 已有提交记录的学生 ID
    pub async fn list_submitter_ids_impl(&self, assignment_id: i64) -> Result<Vec<i64>> {
        Submissions::find()
            .select_only()
            .column(Column::StudentId)
            .filter(Column::AssignmentId.eq(assignment_id))
            .into_tuple::<i64>()
            .all(&self.db)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("查询提交学生失败: {e}")))
    }
}
