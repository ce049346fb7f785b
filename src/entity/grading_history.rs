//! 评分历史实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "grading_history")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub submission_id: i64,
    pub seq: i32,
    #[sea_orm(column_type = "Double")]
    pub grade: f64,
    #[sea_orm(column_type = "Double")]
    pub original_grade: f64,
    #[sea_orm(column_type = "Text")]
    pub feedback: String,
    /// JSON 对象：评分项 id → 分值
    #[sea_orm(column_type = "Text")]
    pub rubric_grades: String,
    /// JSON 数组
    #[sea_orm(column_type = "Text")]
    pub annotations: String,
    pub graded_at: i64,
    pub grader_kind: String,
    pub grader_id: Option<i64>,
    pub is_latest: bool,
    #[sea_orm(column_type = "Text", nullable)]
    pub grade_reason: Option<String>,
    #[sea_orm(column_type = "Double", nullable)]
    pub previous_grade: Option<f64>,
    pub change_type: String,
    pub penalty_applied: bool,
    #[sea_orm(column_type = "Double")]
    pub penalty_percent: f64,
    pub penalty_days_late: i32,
    #[sea_orm(column_type = "Double")]
    pub penalty_amount: f64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::submissions::Entity",
        from = "Column::SubmissionId",
        to = "super::submissions::Column::Id"
    )]
    Submission,
}

impl Related<super::submissions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Submission.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_history_entry(self) -> crate::models::grading::entities::GradingHistoryEntry {
        use crate::models::grading::entities::{ChangeType, GradingHistoryEntry};
        use crate::models::submissions::entities::{Actor, LatePenaltyInfo};
        use chrono::{DateTime, Utc};

        GradingHistoryEntry {
            id: self.id,
            submission_id: self.submission_id,
            seq: self.seq,
            grade: self.grade,
            original_grade: self.original_grade,
            feedback: self.feedback,
            rubric_grades: serde_json::from_str(&self.rubric_grades).unwrap_or_default(),
            annotations: serde_json::from_str(&self.annotations).unwrap_or_default(),
            graded_at: DateTime::<Utc>::from_timestamp(self.graded_at, 0).unwrap_or_default(),
            graded_by: Actor::from_columns(&self.grader_kind, self.grader_id)
                .unwrap_or(Actor::System),
            is_latest: self.is_latest,
            grade_reason: self.grade_reason,
            previous_grade: self.previous_grade,
            change_type: self
                .change_type
                .parse::<ChangeType>()
                .unwrap_or(ChangeType::Revision),
            late_penalty: LatePenaltyInfo {
                applied: self.penalty_applied,
                percentage: self.penalty_percent,
                days_late: self.penalty_days_late as i64,
                penalty_amount: self.penalty_amount,
            },
        }
    }
}
