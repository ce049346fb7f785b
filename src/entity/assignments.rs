//! 作业实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "assignments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub class_id: i64,
    pub created_by: i64,
    pub title: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub due_date: i64,
    #[sea_orm(column_type = "Double")]
    pub total_points: f64,
    pub allow_late_submission: bool,
    #[sea_orm(column_type = "Double")]
    pub late_penalty: f64,
    pub max_late_days: i32,
    pub submission_type: String,
    pub text_submission_required: bool,
    pub file_submission_required: bool,
    pub auto_grade_when_overdue: bool,
    #[sea_orm(column_type = "Double")]
    pub auto_grade_value: f64,
    pub days_after_due_for_auto_grade: i32,
    /// JSON 数组
    #[sea_orm(column_type = "Text")]
    pub reminder_days_before_due: String,
    pub notify_students_of_missing_submission: bool,
    /// JSON 数组
    #[sea_orm(column_type = "Text", nullable)]
    pub rubric: Option<String>,
    pub visibility: String,
    pub publish_at: Option<i64>,
    pub is_active: bool,
    pub is_deleted: bool,
    pub deleted_at: Option<i64>,
    pub deleted_by: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::classes::Entity",
        from = "Column::ClassId",
        to = "super::classes::Column::Id"
    )]
    Class,
    #[sea_orm(has_many = "super::submissions::Entity")]
    Submissions,
    #[sea_orm(has_many = "super::auto_grade_history::Entity")]
    AutoGradeHistory,
    #[sea_orm(has_many = "super::reminder_logs::Entity")]
    ReminderLogs,
}

impl Related<super::classes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Class.def()
    }
}

impl Related<super::submissions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Submissions.def()
    }
}

impl Related<super::auto_grade_history::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AutoGradeHistory.def()
    }
}

impl Related<super::reminder_logs::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ReminderLogs.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_assignment(self) -> crate::models::assignments::entities::Assignment {
        use crate::models::assignments::entities::{
            Assignment, MissingSubmissionPolicy, SubmissionSettings, SubmissionType, Visibility,
        };
        use chrono::{DateTime, Utc};

        let reminder_days_before_due: Vec<i32> =
            serde_json::from_str(&self.reminder_days_before_due).unwrap_or_default();

        Assignment {
            id: self.id,
            class_id: self.class_id,
            created_by: self.created_by,
            title: self.title,
            description: self.description,
            due_date: DateTime::<Utc>::from_timestamp(self.due_date, 0).unwrap_or_default(),
            total_points: self.total_points,
            allow_late_submission: self.allow_late_submission,
            late_penalty: self.late_penalty,
            max_late_days: self.max_late_days,
            submission_settings: SubmissionSettings {
                submission_type: self
                    .submission_type
                    .parse::<SubmissionType>()
                    .unwrap_or(SubmissionType::Both),
                text_submission_required: self.text_submission_required,
                file_submission_required: self.file_submission_required,
            },
            missing_submission_policy: MissingSubmissionPolicy {
                auto_grade_when_overdue: self.auto_grade_when_overdue,
                auto_grade_value: self.auto_grade_value,
                days_after_due_for_auto_grade: self.days_after_due_for_auto_grade,
                reminder_days_before_due,
                notify_students_of_missing_submission: self.notify_students_of_missing_submission,
            }
            .normalize(),
            rubric: self
                .rubric
                .and_then(|raw| serde_json::from_str(&raw).ok()),
            visibility: self
                .visibility
                .parse::<Visibility>()
                .unwrap_or(Visibility::Draft),
            publish_at: self
                .publish_at
                .map(|ts| DateTime::<Utc>::from_timestamp(ts, 0).unwrap_or_default()),
            is_active: self.is_active,
            is_deleted: self.is_deleted,
            deleted_at: self
                .deleted_at
                .map(|ts| DateTime::<Utc>::from_timestamp(ts, 0).unwrap_or_default()),
            deleted_by: self.deleted_by,
            created_at: DateTime::<Utc>::from_timestamp(self.created_at, 0).unwrap_or_default(),
            updated_at: DateTime::<Utc>::from_timestamp(self.updated_at, 0).unwrap_or_default(),
        }
    }
}
