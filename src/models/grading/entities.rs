use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::submissions::entities::{Actor, LatePenaltyInfo};

// 评分变更类型
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    Initial,
    Revision,
    Appeal,
    Correction,
}

impl std::fmt::Display for ChangeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChangeType::Initial => write!(f, "initial"),
            ChangeType::Revision => write!(f, "revision"),
            ChangeType::Appeal => write!(f, "appeal"),
            ChangeType::Correction => write!(f, "correction"),
        }
    }
}

impl std::str::FromStr for ChangeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "initial" => Ok(ChangeType::Initial),
            "revision" => Ok(ChangeType::Revision),
            "appeal" => Ok(ChangeType::Appeal),
            "correction" => Ok(ChangeType::Correction),
            _ => Err(format!("Invalid change type: {s}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct AnnotationPosition {
    pub page: u32,
    pub x: f64,
    pub y: f64,
}

/// 批注
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Annotation {
    Comment {
        position: AnnotationPosition,
        text: String,
        created_at: DateTime<Utc>,
    },
    Highlight {
        start: u32,
        end: u32,
        note: Option<String>,
        created_at: DateTime<Utc>,
    },
    Correction {
        start: u32,
        end: u32,
        replacement: String,
        created_at: DateTime<Utc>,
    },
}

/// 评分历史（只追加）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradingHistoryEntry {
    pub id: i64,
    pub submission_id: i64,
    pub seq: i32,
    pub grade: f64,
    pub original_grade: f64,
    pub feedback: String,
    pub rubric_grades: BTreeMap<String, f64>,
    pub annotations: Vec<Annotation>,
    pub graded_at: DateTime<Utc>,
    pub graded_by: Actor,
    pub is_latest: bool,
    pub grade_reason: Option<String>,
    pub previous_grade: Option<f64>,
    pub change_type: ChangeType,
    pub late_penalty: LatePenaltyInfo,
}

/// 迟交扣分策略
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PenaltyPolicy {
    pub due_date: DateTime<Utc>,
    pub allow_late_submission: bool,
    /// 每天扣除百分比
    pub late_penalty: f64,
}

/// 扣分计算结果
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PenaltyOutcome {
    pub original_grade: f64,
    pub final_grade: f64,
    pub penalty_percent: f64,
    pub penalty_amount: f64,
    pub days_late: i64,
    pub is_late: bool,
}

impl PenaltyOutcome {
    pub fn applied(&self) -> bool {
        self.penalty_percent > 0.0
    }

    pub fn to_info(&self) -> LatePenaltyInfo {
        LatePenaltyInfo {
            applied: self.applied(),
            percentage: self.penalty_percent,
            days_late: self.days_late,
            penalty_amount: self.penalty_amount,
        }
    }
}

/// 自动评分批次记录（每个作业每个 UTC 自然日至多一条）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoGradeHistoryEntry {
    pub id: i64,
    pub assignment_id: i64,
    pub run_date: NaiveDate,
    pub auto_graded_at: DateTime<Utc>,
    pub student_ids: Vec<i64>,
    pub grade_value: f64,
    pub reason: String,
}
