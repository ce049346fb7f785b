//! 提交实体（每个学生每个作业一条）

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "submissions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub assignment_id: i64,
    pub student_id: i64,
    pub submitted_at: Option<i64>,
    #[sea_orm(column_type = "Text", nullable)]
    pub content: Option<String>,
    /// JSON 数组
    #[sea_orm(column_type = "Text")]
    pub attachments: String,
    pub status: String,
    pub is_late: bool,
    #[sea_orm(column_type = "Double", nullable)]
    pub grade: Option<f64>,
    #[sea_orm(column_type = "Double", nullable)]
    pub original_grade: Option<f64>,
    #[sea_orm(column_type = "Text", nullable)]
    pub feedback: Option<String>,
    pub graded_at: Option<i64>,
    pub grader_kind: Option<String>,
    pub grader_id: Option<i64>,
    pub penalty_applied: bool,
    #[sea_orm(column_type = "Double")]
    pub penalty_percent: f64,
    pub penalty_days_late: i32,
    #[sea_orm(column_type = "Double")]
    pub penalty_amount: f64,
    pub allow_resubmit: bool,
    pub resubmission_count: i32,
    pub hide_grade_from_student: bool,
    pub version: i32,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::assignments::Entity",
        from = "Column::AssignmentId",
        to = "super::assignments::Column::Id"
    )]
    Assignment,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::StudentId",
        to = "super::users::Column::Id"
    )]
    Student,
    #[sea_orm(has_many = "super::grading_history::Entity")]
    GradingHistory,
}

impl Related<super::assignments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Assignment.def()
    }
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
}

impl Related<super::grading_history::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::GradingHistory.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_submission(self) -> crate::models::submissions::entities::Submission {
        use crate::models::submissions::entities::{
            Actor, LatePenaltyInfo, Submission, SubmissionStatus,
        };
        use chrono::{DateTime, Utc};

        let graded_by = self
            .grader_kind
            .as_deref()
            .and_then(|kind| Actor::from_columns(kind, self.grader_id));

        Submission {
            id: self.id,
            assignment_id: self.assignment_id,
            student_id: self.student_id,
            submitted_at: self
                .submitted_at
                .map(|ts| DateTime::<Utc>::from_timestamp(ts, 0).unwrap_or_default()),
            content: self.content,
            attachments: serde_json::from_str(&self.attachments).unwrap_or_default(),
            status: self
                .status
                .parse::<SubmissionStatus>()
                .unwrap_or(SubmissionStatus::Pending),
            is_late: self.is_late,
            grade: self.grade,
            original_grade: self.original_grade,
            feedback: self.feedback,
            graded_at: self
                .graded_at
                .map(|ts| DateTime::<Utc>::from_timestamp(ts, 0).unwrap_or_default()),
            graded_by,
            late_penalty: LatePenaltyInfo {
                applied: self.penalty_applied,
                percentage: self.penalty_percent,
                days_late: self.penalty_days_late as i64,
                penalty_amount: self.penalty_amount,
            },
            allow_resubmit: self.allow_resubmit,
            resubmission_count: self.resubmission_count,
            hide_grade_from_student: self.hide_grade_from_student,
            version: self.version,
            created_at: DateTime::<Utc>::from_timestamp(self.created_at, 0).unwrap_or_default(),
            updated_at: DateTime::<Utc>::from_timestamp(self.updated_at, 0).unwrap_or_default(),
        }
    }
}
