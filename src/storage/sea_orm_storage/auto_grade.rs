//! 缺交自动评分存储操作

use super::SeaOrmStorage;
use crate::entity::auto_grade_history::{
    ActiveModel as RunActiveModel, Column as RunColumn, Entity as AutoGradeHistory,
};
use crate::entity::grading_history::ActiveModel as HistoryActiveModel;
use crate::entity::submissions::ActiveModel as SubmissionActiveModel;
use crate::errors::{HWSystemError, Result};
use crate::models::grading::entities::{AutoGradeHistoryEntry, ChangeType};
use crate::models::submissions::entities::SubmissionStatus;
use crate::storage::{SyntheticGradeBatch, SyntheticGradeResult};
use crate::utils::time::format_run_date;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, SqlErr,
    TransactionTrait,
};

impl SeaOrmStorage {
    /// 为缺交学生写入系统提交
    ///
    /// 带批次记录时先插入记录，(assignment_id, run_date) 唯一冲突说明当天已执行，事务回滚。
    /// 每个学生生成一条已评分提交和一条 initial 历史。
    pub async fn apply_synthetic_grades_impl(
        &self,
        batch: SyntheticGradeBatch,
    ) -> Result<SyntheticGradeResult> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| HWSystemError::database_operation(format!("开启事务失败: {e}")))?;

        let graded_at = batch.graded_at.timestamp();
        let (grader_kind, grader_id) = batch.graded_by.to_columns();

        if let Some(marker) = &batch.marker {
            let student_ids = serde_json::to_string(&batch.student_ids)
                .map_err(|e| HWSystemError::serialization(format!("序列化学生列表失败: {e}")))?;

            let run = RunActiveModel {
                assignment_id: Set(batch.assignment_id),
                run_date: Set(format_run_date(marker.run_date)),
                auto_graded_at: Set(graded_at),
                student_ids: Set(student_ids),
                grade_value: Set(batch.grade),
                reason: Set(marker.reason.clone()),
                ..Default::default()
            };

            if let Err(e) = run.insert(&txn).await {
                return match e.sql_err() {
                    Some(SqlErr::UniqueConstraintViolation(_)) => {
                        Ok(SyntheticGradeResult::AlreadyRan)
                    }
                    _ => Err(HWSystemError::database_operation(format!(
                        "写入自动评分记录失败: {e}"
                    ))),
                };
            }
        }

        let mut created = Vec::with_capacity(batch.student_ids.len());
        for student_id in &batch.student_ids {
            let submission = SubmissionActiveModel {
                assignment_id: Set(batch.assignment_id),
                student_id: Set(*student_id),
                submitted_at: Set(None),
                content: Set(None),
                attachments: Set("[]".to_string()),
                status: Set(SubmissionStatus::Graded.to_string()),
                is_late: Set(false),
                grade: Set(Some(batch.grade)),
                original_grade: Set(Some(batch.grade)),
                feedback: Set(Some(batch.feedback.clone())),
                graded_at: Set(Some(graded_at)),
                grader_kind: Set(Some(grader_kind.clone())),
                grader_id: Set(grader_id),
                penalty_applied: Set(false),
                penalty_percent: Set(0.0),
                penalty_days_late: Set(0),
                penalty_amount: Set(0.0),
                allow_resubmit: Set(false),
                resubmission_count: Set(0),
                hide_grade_from_student: Set(false),
                version: Set(1),
                created_at: Set(graded_at),
                updated_at: Set(graded_at),
                ..Default::default()
            }
            .insert(&txn)
            .await
            .map_err(|e| super::write_error(e, "学生在评分期间提交了作业", "写入系统提交失败"))?;

            HistoryActiveModel {
                submission_id: Set(submission.id),
                seq: Set(1),
                grade: Set(batch.grade),
                original_grade: Set(batch.grade),
                feedback: Set(batch.feedback.clone()),
                rubric_grades: Set("{}".to_string()),
                annotations: Set("[]".to_string()),
                graded_at: Set(graded_at),
                grader_kind: Set(grader_kind.clone()),
                grader_id: Set(grader_id),
                is_latest: Set(true),
                grade_reason: Set(batch.marker.as_ref().map(|m| m.reason.clone())),
                previous_grade: Set(None),
                change_type: Set(ChangeType::Initial.to_string()),
                penalty_applied: Set(false),
                penalty_percent: Set(0.0),
                penalty_days_late: Set(0),
                penalty_amount: Set(0.0),
                ..Default::default()
            }
            .insert(&txn)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("写入评分历史失败: {e}")))?;

            created.push(submission.into_submission());
        }

        txn.commit()
            .await
            .map_err(|e| HWSystemError::database_operation(format!("提交事务失败: {e}")))?;

        Ok(SyntheticGradeResult::Applied(created))
    }

    /// 作业的自动评分批次记录，最新在前
    pub async fn list_auto_grade_history_impl(
        &self,
        assignment_id: i64,
    ) -> Result<Vec<AutoGradeHistoryEntry>> {
        let results = AutoGradeHistory::find()
            .filter(RunColumn::AssignmentId.eq(assignment_id))
            .order_by_desc(RunColumn::AutoGradedAt)
            .all(&self.db)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("查询自动评分记录失败: {e}")))?;

        Ok(results
            .into_iter()
            .map(|m| m.into_auto_grade_entry())
            .collect())
    }
}
