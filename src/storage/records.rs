//! 存储层写入命令
//!
//! 服务层计算完业务规则后，以这些结构体把需要落库的数据一次性交给存储层。

use chrono::{DateTime, NaiveDate, Utc};
use std::collections::BTreeMap;

use crate::models::grading::entities::{Annotation, ChangeType};
use crate::models::submissions::entities::{Actor, Attachment, LatePenaltyInfo, Submission};

/// 首次提交
#[derive(Debug, Clone)]
pub struct NewSubmission {
    pub assignment_id: i64,
    pub student_id: i64,
    pub submitted_at: DateTime<Utc>,
    pub content: Option<String>,
    pub attachments: Vec<Attachment>,
    pub is_late: bool,
}

/// 重新提交（基于版本号的条件更新）
#[derive(Debug, Clone)]
pub struct Resubmission {
    pub submission_id: i64,
    pub expected_version: i32,
    pub resubmission_count: i32,
    pub submitted_at: DateTime<Utc>,
    pub content: Option<String>,
    pub attachments: Vec<Attachment>,
    pub is_late: bool,
}

/// 一次评分：同时更新提交上的镜像字段并追加历史
#[derive(Debug, Clone)]
pub struct GradingRecord {
    pub submission_id: i64,
    pub expected_version: i32,
    pub grade: f64,
    pub original_grade: f64,
    pub feedback: String,
    pub rubric_grades: BTreeMap<String, f64>,
    pub annotations: Vec<Annotation>,
    pub graded_at: DateTime<Utc>,
    pub graded_by: Actor,
    pub grade_reason: Option<String>,
    pub previous_grade: Option<f64>,
    pub change_type: ChangeType,
    pub late_penalty: LatePenaltyInfo,
    pub allow_resubmit: bool,
    pub hide_grade_from_student: bool,
}

/// 批次记录，带上后由 (assignment_id, run_date) 唯一索引保证每日一次
#[derive(Debug, Clone)]
pub struct AutoGradeRunMarker {
    pub run_date: NaiveDate,
    pub reason: String,
}

/// 为缺交学生批量生成系统提交
#[derive(Debug, Clone)]
pub struct SyntheticGradeBatch {
    pub assignment_id: i64,
    pub student_ids: Vec<i64>,
    pub grade: f64,
    pub feedback: String,
    pub graded_at: DateTime<Utc>,
    pub graded_by: Actor,
    pub marker: Option<AutoGradeRunMarker>,
}

#[derive(Debug, Clone)]
pub enum SyntheticGradeResult {
    Applied(Vec<Submission>),
    /// 当日批次记录已存在，未做任何写入
    AlreadyRan,
}
