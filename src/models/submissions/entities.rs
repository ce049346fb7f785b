use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// 提交状态: pending → submitted | late → graded
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    Pending,
    Submitted,
    Late,
    Graded,
}

impl std::fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubmissionStatus::Pending => write!(f, "pending"),
            SubmissionStatus::Submitted => write!(f, "submitted"),
            SubmissionStatus::Late => write!(f, "late"),
            SubmissionStatus::Graded => write!(f, "graded"),
        }
    }
}

impl std::str::FromStr for SubmissionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(SubmissionStatus::Pending),
            "submitted" => Ok(SubmissionStatus::Submitted),
            "late" => Ok(SubmissionStatus::Late),
            "graded" => Ok(SubmissionStatus::Graded),
            _ => Err(format!("Invalid submission status: {s}")),
        }
    }
}

/// 操作者：真实用户或系统任务
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Actor {
    User { id: i64 },
    System,
}

impl Actor {
    pub const USER: &'static str = "user";
    pub const SYSTEM: &'static str = "system";

    /// 持久化形式 (grader_kind, grader_id)
    pub fn to_columns(self) -> (String, Option<i64>) {
        match self {
            Actor::User { id } => (Self::USER.to_string(), Some(id)),
            Actor::System => (Self::SYSTEM.to_string(), None),
        }
    }

    pub fn from_columns(kind: &str, id: Option<i64>) -> Option<Self> {
        match (kind, id) {
            (Self::USER, Some(id)) => Some(Actor::User { id }),
            (Self::SYSTEM, _) => Some(Actor::System),
            _ => None,
        }
    }
}

/// 附件（外部存储的 blob 引用）
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Attachment {
    pub name: String,
    pub url: String,
    pub file_type: String,
    pub file_size: i64,
}

/// 迟交扣分快照
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct LatePenaltyInfo {
    pub applied: bool,
    pub percentage: f64,
    pub days_late: i64,
    pub penalty_amount: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub id: i64,
    pub assignment_id: i64,
    pub student_id: i64,
    /// 为空表示系统生成（未实际提交）
    pub submitted_at: Option<DateTime<Utc>>,
    pub content: Option<String>,
    pub attachments: Vec<Attachment>,
    pub status: SubmissionStatus,
    pub is_late: bool,
    pub grade: Option<f64>,
    pub original_grade: Option<f64>,
    pub feedback: Option<String>,
    pub graded_at: Option<DateTime<Utc>>,
    pub graded_by: Option<Actor>,
    pub late_penalty: LatePenaltyInfo,
    pub allow_resubmit: bool,
    pub resubmission_count: i32,
    pub hide_grade_from_student: bool,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Submission {
    pub fn is_synthetic(&self) -> bool {
        self.submitted_at.is_none()
    }

    /// 对学生隐藏成绩相关字段
    pub fn without_grade(mut self) -> Self {
        self.grade = None;
        self.original_grade = None;
        self.feedback = None;
        self.graded_at = None;
        self.graded_by = None;
        self.late_penalty = LatePenaltyInfo::default();
        self
    }
}
