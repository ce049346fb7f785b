use serde::Serialize;

use super::entities::{Submission, SubmissionStatus};
use crate::models::class_users::entities::RosterMember;
use crate::models::grading::entities::GradingHistoryEntry;

/// 教师视角：花名册中的每个学生及其提交
#[derive(Debug, Clone, Serialize)]
pub struct RosterSubmissionItem {
    pub student: RosterMember,
    pub status: SubmissionStatus,
    pub submission: Option<Submission>,
}

/// 学生视角：自己的提交
#[derive(Debug, Clone, Serialize)]
pub struct StudentSubmissionView {
    pub submission: Submission,
    pub grade_hidden: bool,
    pub grading_history: Vec<GradingHistoryEntry>,
}
