use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::entities::{
    MissingSubmissionPolicy, RubricCriterion, SubmissionSettings, Visibility,
};

#[derive(Debug, Clone, Deserialize)]
pub struct CreateAssignmentRequest {
    pub class_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub due_date: DateTime<Utc>,
    pub total_points: f64,
    #[serde(default)]
    pub allow_late_submission: bool,
    #[serde(default)]
    pub late_penalty: f64,
    #[serde(default)]
    pub max_late_days: i32,
    #[serde(default)]
    pub submission_settings: SubmissionSettings,
    #[serde(default)]
    pub missing_submission_policy: MissingSubmissionPolicy,
    pub rubric: Option<Vec<RubricCriterion>>,
    pub visibility: Option<Visibility>,
    pub publish_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateAssignmentRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub total_points: Option<f64>,
    pub allow_late_submission: Option<bool>,
    pub late_penalty: Option<f64>,
    pub max_late_days: Option<i32>,
    pub submission_settings: Option<SubmissionSettings>,
    pub missing_submission_policy: Option<MissingSubmissionPolicy>,
    pub rubric: Option<Vec<RubricCriterion>>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleAssignmentRequest {
    pub publish_at: DateTime<Utc>,
}
