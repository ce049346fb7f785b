//! 自动评分批次记录实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "auto_grade_history")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub assignment_id: i64,
    /// UTC 日期 YYYY-MM-DD
    pub run_date: String,
    pub auto_graded_at: i64,
    /// JSON 数组
    #[sea_orm(column_type = "Text")]
    pub student_ids: String,
    #[sea_orm(column_type = "Double")]
    pub grade_value: f64,
    #[sea_orm(column_type = "Text")]
    pub reason: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::assignments::Entity",
        from = "Column::AssignmentId",
        to = "super::assignments::Column::Id"
    )]
    Assignment,
}

impl Related<super::assignments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Assignment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_auto_grade_entry(self) -> crate::models::grading::entities::AutoGradeHistoryEntry {
        use crate::models::grading::entities::AutoGradeHistoryEntry;
        use chrono::{DateTime, NaiveDate, Utc};

        AutoGradeHistoryEntry {
            id: self.id,
            assignment_id: self.assignment_id,
            run_date: NaiveDate::parse_from_str(&self.run_date, crate::utils::time::RUN_DATE_FORMAT)
                .unwrap_or_default(),
            auto_graded_at: DateTime::<Utc>::from_timestamp(self.auto_graded_at, 0)
                .unwrap_or_default(),
            student_ids: serde_json::from_str(&self.student_ids).unwrap_or_default(),
            grade_value: self.grade_value,
            reason: self.reason,
        }
    }
}
