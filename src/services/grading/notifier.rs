//! 领域事件通知

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::info;

use crate::errors::{HWSystemError, Result};
use crate::models::grading::entities::ChangeType;
use crate::models::notifications::{
    entities::NotificationType, requests::CreateNotificationRequest,
};
use crate::storage::Storage;

#[derive(Debug, Clone, PartialEq)]
pub enum DomainEvent {
    SubmissionCreated {
        teacher_id: i64,
        assignment_id: i64,
        assignment_title: String,
        submission_id: i64,
        student_name: String,
        is_late: bool,
    },
    GradeAssigned {
        student_id: i64,
        assignment_id: i64,
        assignment_title: String,
        submission_id: i64,
        /// 对学生隐藏成绩时为空
        grade: Option<f64>,
        total_points: f64,
        change_type: ChangeType,
    },
    AutoGradeApplied {
        student_id: i64,
        assignment_id: i64,
        assignment_title: String,
        submission_id: i64,
        grade: f64,
        total_points: f64,
    },
    MissingSubmissionReminder {
        student_id: i64,
        email: String,
        student_name: String,
        assignment_id: i64,
        assignment_title: String,
        due_date: DateTime<Utc>,
        days_left: i64,
        is_urgent: bool,
    },
}

impl DomainEvent {
    pub fn recipient_id(&self) -> i64 {
        match self {
            DomainEvent::SubmissionCreated { teacher_id, .. } => *teacher_id,
            DomainEvent::GradeAssigned { student_id, .. }
            | DomainEvent::AutoGradeApplied { student_id, .. }
            | DomainEvent::MissingSubmissionReminder { student_id, .. } => *student_id,
        }
    }

    pub fn notification_type(&self) -> NotificationType {
        match self {
            DomainEvent::SubmissionCreated { .. } => NotificationType::SubmissionCreated,
            DomainEvent::GradeAssigned { .. } => NotificationType::GradeAssigned,
            DomainEvent::AutoGradeApplied { .. } => NotificationType::AutoGradeApplied,
            DomainEvent::MissingSubmissionReminder { .. } => {
                NotificationType::MissingSubmissionReminder
            }
        }
    }

    /// 渲染站内通知
    pub fn to_notification(&self) -> CreateNotificationRequest {
        let (title, content, reference_type, reference_id) = match self {
            DomainEvent::SubmissionCreated {
                assignment_id,
                assignment_title,
                student_name,
                is_late,
                ..
            } => (
                format!("新提交：{assignment_title}"),
                if *is_late {
                    format!("{student_name} 迟交了作业《{assignment_title}》")
                } else {
                    format!("{student_name} 提交了作业《{assignment_title}》")
                },
                "assignment",
                *assignment_id,
            ),
            DomainEvent::GradeAssigned {
                assignment_title,
                submission_id,
                grade,
                total_points,
                change_type,
                ..
            } => {
                let verb = match change_type {
                    ChangeType::Initial => "已评分",
                    _ => "成绩已更新",
                };
                let content = match grade {
                    Some(grade) => format!("《{assignment_title}》{verb}：{grade}/{total_points}"),
                    None => format!("《{assignment_title}》{verb}，成绩暂未公布"),
                };
                (
                    format!("作业{verb}：{assignment_title}"),
                    content,
                    "submission",
                    *submission_id,
                )
            }
            DomainEvent::AutoGradeApplied {
                assignment_title,
                submission_id,
                grade,
                total_points,
                ..
            } => (
                format!("缺交自动评分：{assignment_title}"),
                format!("你未提交《{assignment_title}》，系统已自动记为 {grade}/{total_points}"),
                "submission",
                *submission_id,
            ),
            DomainEvent::MissingSubmissionReminder {
                assignment_id,
                assignment_title,
                due_date,
                days_left,
                is_urgent,
                ..
            } => (
                if *is_urgent {
                    format!("【紧急】作业即将截止：{assignment_title}")
                } else {
                    format!("作业提醒：{assignment_title}")
                },
                format!(
                    "《{assignment_title}》将于 {} 截止（剩余 {days_left} 天），你尚未提交",
                    due_date.format("%Y-%m-%d %H:%M UTC")
                ),
                "assignment",
                *assignment_id,
            ),
        };

        CreateNotificationRequest {
            user_id: self.recipient_id(),
            notification_type: self.notification_type(),
            title,
            content: Some(content),
            reference_type: Some(reference_type.to_string()),
            reference_id: Some(reference_id),
        }
    }
}

/// 通知发送方
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, event: DomainEvent) -> Result<()>;
}

/// 写入站内通知表，并为提醒类事件派发邮件
pub struct StorageNotifier {
    storage: Arc<dyn Storage>,
}

impl StorageNotifier {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl Notifier for StorageNotifier {
    async fn notify(&self, event: DomainEvent) -> Result<()> {
        if let DomainEvent::MissingSubmissionReminder {
            email,
            student_name,
            assignment_id,
            is_urgent,
            ..
        } = &event
        {
            if email.trim().is_empty() {
                return Err(HWSystemError::notification(format!(
                    "Student {student_name} has no email address"
                )));
            }
            info!(
                to = %email,
                assignment_id = *assignment_id,
                urgent = *is_urgent,
                "Dispatching missing submission reminder email"
            );
        }

        self.storage
            .create_notification(event.to_notification())
            .await
            .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hidden_grade_is_withheld() {
        let event = DomainEvent::GradeAssigned {
            student_id: 5,
            assignment_id: 1,
            assignment_title: "Essay".to_string(),
            submission_id: 9,
            grade: None,
            total_points: 100.0,
            change_type: ChangeType::Initial,
        };
        let req = event.to_notification();
        assert_eq!(req.user_id, 5);
        assert_eq!(req.notification_type, NotificationType::GradeAssigned);
        assert!(!req.content.unwrap_or_default().contains("100"));
    }

    #[test]
    fn test_urgent_reminder_title() {
        let event = DomainEvent::MissingSubmissionReminder {
            student_id: 5,
            email: "s@example.com".to_string(),
            student_name: "S".to_string(),
            assignment_id: 1,
            assignment_title: "Essay".to_string(),
            due_date: Utc::now(),
            days_left: 1,
            is_urgent: true,
        };
        assert!(event.to_notification().title.starts_with("【紧急】"));
    }
}
