use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    SubmissionCreated,
    GradeAssigned,
    AutoGradeApplied,
    MissingSubmissionReminder,
}

impl std::fmt::Display for NotificationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotificationType::SubmissionCreated => write!(f, "submission_created"),
            NotificationType::GradeAssigned => write!(f, "grade_assigned"),
            NotificationType::AutoGradeApplied => write!(f, "auto_grade_applied"),
            NotificationType::MissingSubmissionReminder => {
                write!(f, "missing_submission_reminder")
            }
        }
    }
}

impl std::str::FromStr for NotificationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "submission_created" => Ok(NotificationType::SubmissionCreated),
            "grade_assigned" => Ok(NotificationType::GradeAssigned),
            "auto_grade_applied" => Ok(NotificationType::AutoGradeApplied),
            "missing_submission_reminder" => Ok(NotificationType::MissingSubmissionReminder),
            _ => Err(format!("Invalid notification type: {s}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: i64,
    pub user_id: i64,
    pub notification_type: NotificationType,
    pub title: String,
    pub content: Option<String>,
    pub reference_type: Option<String>,
    pub reference_id: Option<i64>,
    pub is_read: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}
