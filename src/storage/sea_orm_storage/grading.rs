//! 评分历史存储操作

use super::SeaOrmStorage;
use crate::entity::grading_history::{
    ActiveModel as HistoryActiveModel, Column as HistoryColumn, Entity as GradingHistory,
};
use crate::entity::submissions::{Column, Entity as Submissions};
use crate::errors::{HWSystemError, Result};
use crate::models::grading::entities::GradingHistoryEntry;
use crate::models::submissions::entities::{Submission, SubmissionStatus};
use crate::storage::GradingRecord;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};

/// 下一个历史序号
async fn next_seq<C: ConnectionTrait>(conn: &C, submission_id: i64) -> Result<i32> {
    let last = GradingHistory::find()
        .filter(HistoryColumn::SubmissionId.eq(submission_id))
        .order_by_desc(HistoryColumn::Seq)
        .one(conn)
        .await
        .map_err(|e| HWSystemError::database_operation(format!("查询评分历史失败: {e}")))?;

    Ok(last.map(|m| m.seq + 1).unwrap_or(1))
}

impl SeaOrmStorage {
    /// 原子追加评分
    ///
    /// 同一事务内：按版本号更新提交镜像字段、清除旧记录的 latest 标记、插入新记录。
    /// 版本号不一致时整个事务回滚并返回 Conflict。
    pub async fn append_grading_entry_impl(
        &self,
        record: GradingRecord,
    ) -> Result<(Submission, GradingHistoryEntry)> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| HWSystemError::database_operation(format!("开启事务失败: {e}")))?;

        let graded_at = record.graded_at.timestamp();
        let (grader_kind, grader_id) = record.graded_by.to_columns();
        let rubric_grades = serde_json::to_string(&record.rubric_grades)
            .map_err(|e| HWSystemError::serialization(format!("序列化评分项失败: {e}")))?;
        let annotations = serde_json::to_string(&record.annotations)
            .map_err(|e| HWSystemError::serialization(format!("序列化批注失败: {e}")))?;

        let updated = Submissions::update_many()
            .col_expr(Column::Grade, Expr::value(Some(record.grade)))
            .col_expr(Column::OriginalGrade, Expr::value(Some(record.original_grade)))
            .col_expr(Column::Feedback, Expr::value(Some(record.feedback.clone())))
            .col_expr(Column::GradedAt, Expr::value(Some(graded_at)))
            .col_expr(Column::GraderKind, Expr::value(Some(grader_kind.clone())))
            .col_expr(Column::GraderId, Expr::value(grader_id))
            .col_expr(Column::PenaltyApplied, Expr::value(record.late_penalty.applied))
            .col_expr(
                Column::PenaltyPercent,
                Expr::value(record.late_penalty.percentage),
            )
            .col_expr(
                Column::PenaltyDaysLate,
                Expr::value(record.late_penalty.days_late as i32),
            )
            .col_expr(
                Column::PenaltyAmount,
                Expr::value(record.late_penalty.penalty_amount),
            )
            .col_expr(
                Column::Status,
                Expr::value(SubmissionStatus::Graded.to_string()),
            )
            .col_expr(Column::AllowResubmit, Expr::value(record.allow_resubmit))
            .col_expr(
                Column::HideGradeFromStudent,
                Expr::value(record.hide_grade_from_student),
            )
            .col_expr(Column::Version, Expr::value(record.expected_version + 1))
            .col_expr(Column::UpdatedAt, Expr::value(graded_at))
            .filter(Column::Id.eq(record.submission_id))
            .filter(Column::Version.eq(record.expected_version))
            .exec(&txn)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("更新提交评分失败: {e}")))?;

        if updated.rows_affected == 0 {
            let exists = Submissions::find_by_id(record.submission_id)
                .one(&txn)
                .await
                .map_err(|e| HWSystemError::database_operation(format!("查询提交失败: {e}")))?
                .is_some();
            return Err(if exists {
                HWSystemError::conflict(
                    "Submission was graded concurrently, please reload and try again",
                )
            } else {
                HWSystemError::not_found("Submission not found")
            });
        }

        let seq = next_seq(&txn, record.submission_id).await?;

        GradingHistory::update_many()
            .col_expr(HistoryColumn::IsLatest, Expr::value(false))
            .filter(HistoryColumn::SubmissionId.eq(record.submission_id))
            .filter(HistoryColumn::IsLatest.eq(true))
            .exec(&txn)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("更新评分历史失败: {e}")))?;

        let entry = HistoryActiveModel {
            submission_id: Set(record.submission_id),
            seq: Set(seq),
            grade: Set(record.grade),
            original_grade: Set(record.original_grade),
            feedback: Set(record.feedback),
            rubric_grades: Set(rubric_grades),
            annotations: Set(annotations),
            graded_at: Set(graded_at),
            grader_kind: Set(grader_kind),
            grader_id: Set(grader_id),
            is_latest: Set(true),
            grade_reason: Set(record.grade_reason),
            previous_grade: Set(record.previous_grade),
            change_type: Set(record.change_type.to_string()),
            penalty_applied: Set(record.late_penalty.applied),
            penalty_percent: Set(record.late_penalty.percentage),
            penalty_days_late: Set(record.late_penalty.days_late as i32),
            penalty_amount: Set(record.late_penalty.penalty_amount),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(|e| super::write_error(e, "评分历史序号冲突", "写入评分历史失败"))?;

        let submission = Submissions::find_by_id(record.submission_id)
            .one(&txn)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("查询提交失败: {e}")))?
            .ok_or_else(|| HWSystemError::not_found("Submission not found"))?;

        txn.commit()
            .await
            .map_err(|e| HWSystemError::database_operation(format!("提交事务失败: {e}")))?;

        Ok((submission.into_submission(), entry.into_history_entry()))
    }

    /// 评分历史，按序号升序
    pub async fn list_grading_history_impl(
        &self,
        submission_id: i64,
    ) -> Result<Vec<GradingHistoryEntry>> {
        let results = GradingHistory::find()
            .filter(HistoryColumn::SubmissionId.eq(submission_id))
            .order_by_asc(HistoryColumn::Seq)
            .all(&self.db)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("查询评分历史失败: {e}")))?;

        Ok(results.into_iter().map(|m| m.into_history_entry()).collect())
    }
}
