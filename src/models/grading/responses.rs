use serde::Serialize;

use super::entities::PenaltyOutcome;
use crate::models::submissions::entities::Submission;

#[derive(Debug, Clone, Serialize)]
pub struct GradeResponse {
    pub submission: Submission,
    pub penalty_info: PenaltyOutcome,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GradedStudent {
    pub student_id: i64,
    pub name: String,
}

/// 手动触发自动评分结果
#[derive(Debug, Clone, Serialize)]
pub struct AutoGradeMissingResponse {
    pub graded_count: usize,
    pub graded_students: Vec<GradedStudent>,
    pub days_overdue: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct BulkGradeResponse {
    pub graded_count: usize,
    pub graded_students: Vec<GradedStudent>,
}

/// 定时自动评分：单个作业的处理结果
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AutoGradeOutcome {
    Graded {
        graded_count: usize,
        student_ids: Vec<i64>,
    },
    NoMissingStudents,
    AlreadyRanToday,
    NotEligible {
        reason: String,
    },
    Failed {
        error: String,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct AutoGradeSummary {
    pub assignment_id: i64,
    pub outcome: AutoGradeOutcome,
}

/// 缺交提醒：单个作业单个档位的处理结果
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ReminderOutcome {
    Sent {
        sent_count: u32,
        failed_count: u32,
        is_urgent: bool,
    },
    AlreadySent,
    Failed {
        error: String,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct ReminderSummary {
    pub assignment_id: i64,
    pub days_left: i64,
    pub outcome: ReminderOutcome,
}
