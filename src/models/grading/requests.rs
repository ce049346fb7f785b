use serde::Deserialize;
use std::collections::BTreeMap;

use super::entities::{Annotation, ChangeType};

#[derive(Debug, Clone, Deserialize)]
pub struct GradeRequest {
    pub grade: f64,
    pub feedback: String,
    #[serde(default)]
    pub rubric_grades: BTreeMap<String, f64>,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    #[serde(default)]
    pub allow_resubmit: bool,
    #[serde(default)]
    pub hide_grade_from_student: bool,
    pub grade_reason: Option<String>,
    /// 仅允许 appeal / correction 显式指定
    pub change_type: Option<ChangeType>,
    /// 客户端读取时的版本号，用于乐观并发检查
    pub expected_version: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BulkGradeRequest {
    pub grade: f64,
    pub feedback: Option<String>,
    /// 为空表示全部缺交学生
    pub student_ids: Option<Vec<i64>>,
}
