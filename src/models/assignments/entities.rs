use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::models::grading::entities::PenaltyPolicy;

// 提交形式
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionType {
    Text,
    File,
    Both,
}

impl std::fmt::Display for SubmissionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubmissionType::Text => write!(f, "text"),
            SubmissionType::File => write!(f, "file"),
            SubmissionType::Both => write!(f, "both"),
        }
    }
}

impl std::str::FromStr for SubmissionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(SubmissionType::Text),
            "file" => Ok(SubmissionType::File),
            "both" => Ok(SubmissionType::Both),
            _ => Err(format!("Invalid submission type: {s}")),
        }
    }
}

// 可见性
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Draft,     // 草稿
    Published, // 已发布
    Scheduled, // 定时发布
}

impl std::fmt::Display for Visibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Visibility::Draft => write!(f, "draft"),
            Visibility::Published => write!(f, "published"),
            Visibility::Scheduled => write!(f, "scheduled"),
        }
    }
}

impl std::str::FromStr for Visibility {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Visibility::Draft),
            "published" => Ok(Visibility::Published),
            "scheduled" => Ok(Visibility::Scheduled),
            _ => Err(format!("Invalid visibility: {s}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubmissionSettings {
    #[serde(rename = "type")]
    pub submission_type: SubmissionType,
    #[serde(default)]
    pub text_submission_required: bool,
    #[serde(default)]
    pub file_submission_required: bool,
}

impl Default for SubmissionSettings {
    fn default() -> Self {
        Self {
            submission_type: SubmissionType::Both,
            text_submission_required: false,
            file_submission_required: false,
        }
    }
}

/// 缺交处理策略
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MissingSubmissionPolicy {
    pub auto_grade_when_overdue: bool,
    pub auto_grade_value: f64,
    pub days_after_due_for_auto_grade: i32,
    /// 截止前第几天发送提醒，升序去重
    pub reminder_days_before_due: Vec<i32>,
    pub notify_students_of_missing_submission: bool,
}

impl MissingSubmissionPolicy {
    /// 规范化提醒档位：去掉非正数，升序去重
    pub fn normalize(mut self) -> Self {
        self.reminder_days_before_due.retain(|d| *d > 0);
        self.reminder_days_before_due.sort_unstable();
        self.reminder_days_before_due.dedup();
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RubricCriterion {
    pub id: String,
    pub title: String,
    pub max_points: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assignment {
    pub id: i64,
    pub class_id: i64,
    pub created_by: i64,
    pub title: String,
    pub description: Option<String>,
    pub due_date: DateTime<Utc>,
    pub total_points: f64,
    pub allow_late_submission: bool,
    /// 每迟交一天扣除的百分比
    pub late_penalty: f64,
    /// 迟交窗口（天），0 表示不限
    pub max_late_days: i32,
    pub submission_settings: SubmissionSettings,
    pub missing_submission_policy: MissingSubmissionPolicy,
    pub rubric: Option<Vec<RubricCriterion>>,
    pub visibility: Visibility,
    pub publish_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub is_deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub deleted_by: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Assignment {
    pub fn is_published(&self) -> bool {
        self.visibility == Visibility::Published
    }

    /// 学生可见且可提交
    pub fn is_open(&self) -> bool {
        self.is_published() && self.is_active && !self.is_deleted
    }

    pub fn penalty_policy(&self) -> PenaltyPolicy {
        PenaltyPolicy {
            due_date: self.due_date,
            allow_late_submission: self.allow_late_submission,
            late_penalty: self.late_penalty,
        }
    }

    /// 迟交窗口结束时间，`None` 表示不限
    pub fn late_window_end(&self) -> Option<DateTime<Utc>> {
        if self.max_late_days > 0 {
            Some(self.due_date + Duration::days(self.max_late_days as i64))
        } else {
            None
        }
    }

    pub fn rubric_criterion(&self, id: &str) -> Option<&RubricCriterion> {
        self.rubric
            .as_ref()
            .and_then(|criteria| criteria.iter().find(|c| c.id == id))
    }
}

/// 作业下的提交统计，用于受限字段判断
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubmissionCounts {
    pub submitted: u64,
    pub graded: u64,
}
