//! 学生提交与重新提交

use chrono::{DateTime, Utc};
use tracing::info;

use super::{DomainEvent, GradingEngine};
use crate::errors::{HWSystemError, Result};
use crate::models::assignments::entities::{Assignment, SubmissionSettings, SubmissionType};
use crate::models::submissions::{entities::Submission, requests::SubmitRequest};
use crate::models::users::entities::User;
use crate::storage::{NewSubmission, Resubmission};
use crate::utils::validate::validate_attachment;

/// 按作业的提交设置检查内容，返回第一条未满足的前置条件
pub fn check_content(
    settings: &SubmissionSettings,
    content: Option<&str>,
    attachment_count: usize,
) -> std::result::Result<(), &'static str> {
    let has_text = content.is_some_and(|c| !c.trim().is_empty());
    let has_files = attachment_count > 0;

    match settings.submission_type {
        SubmissionType::Text => {
            if has_files {
                return Err("This assignment only accepts text submissions");
            }
            if !has_text {
                return Err("Text submission is required for this assignment");
            }
        }
        SubmissionType::File => {
            if !has_files {
                return Err("File submission is required for this assignment");
            }
        }
        SubmissionType::Both => {
            if !has_text && !has_files {
                return Err("Submission must include text content or at least one attachment");
            }
        }
    }

    if settings.text_submission_required && !has_text {
        return Err("Text submission is required for this assignment");
    }
    if settings.file_submission_required && !has_files {
        return Err("File submission is required for this assignment");
    }

    Ok(())
}

/// 截止后的提交是否仍在迟交窗口内
fn check_late_window(assignment: &Assignment, now: DateTime<Utc>) -> Result<bool> {
    let is_late = now > assignment.due_date;
    if !is_late {
        return Ok(false);
    }
    if !assignment.allow_late_submission {
        return Err(HWSystemError::validation(
            "Late submissions are not allowed for this assignment",
        ));
    }
    if assignment.late_window_end().is_some_and(|end| now > end) {
        return Err(HWSystemError::validation(
            "The late submission window for this assignment has closed",
        ));
    }
    Ok(true)
}

impl GradingEngine {
    /// 提交作业；已有提交时仅在开放重交后允许覆盖
    pub async fn submit(
        &self,
        assignment_id: i64,
        student: &User,
        req: SubmitRequest,
        now: DateTime<Utc>,
    ) -> Result<Submission> {
        let assignment = self.load_assignment(assignment_id).await?;
        if !assignment.is_open() {
            return Err(HWSystemError::validation(
                "Assignment is not open for submissions",
            ));
        }

        let enrolled = self
            .storage
            .get_class_user_by_user_id_and_class_id(student.id, assignment.class_id)
            .await?
            .is_some_and(|member| member.role.is_submitter());
        if !enrolled || !student.is_active() {
            return Err(HWSystemError::authorization(
                "You are not enrolled as a student in this class",
            ));
        }

        check_content(
            &assignment.submission_settings,
            req.content.as_deref(),
            req.attachments.len(),
        )
        .map_err(HWSystemError::validation)?;
        for attachment in &req.attachments {
            validate_attachment(attachment).map_err(HWSystemError::validation)?;
        }

        let is_late = check_late_window(&assignment, now)?;
        let content = req.content.filter(|c| !c.trim().is_empty());

        let existing = self
            .storage
            .get_submission_by_assignment_and_student(assignment.id, student.id)
            .await?;

        let submission = match existing {
            Some(existing) if !existing.allow_resubmit => {
                return Err(HWSystemError::authorization(
                    "Resubmission is not allowed for this submission",
                ));
            }
            Some(existing) => {
                self.storage
                    .resubmit(Resubmission {
                        submission_id: existing.id,
                        expected_version: existing.version,
                        resubmission_count: existing.resubmission_count,
                        submitted_at: now,
                        content,
                        attachments: req.attachments,
                        is_late,
                    })
                    .await?
            }
            None => {
                self.storage
                    .create_submission(NewSubmission {
                        assignment_id: assignment.id,
                        student_id: student.id,
                        submitted_at: now,
                        content,
                        attachments: req.attachments,
                        is_late,
                    })
                    .await?
            }
        };

        info!(
            assignment_id = assignment.id,
            student_id = student.id,
            resubmission = submission.resubmission_count > 0,
            is_late,
            "Submission recorded"
        );

        if let Some(class) = self.storage.get_class_by_id(assignment.class_id).await? {
            self.notify_quietly(DomainEvent::SubmissionCreated {
                teacher_id: class.teacher_id,
                assignment_id: assignment.id,
                assignment_title: assignment.title.clone(),
                submission_id: submission.id,
                student_name: student
                    .display_name
                    .clone()
                    .unwrap_or_else(|| student.username.clone()),
                is_late,
            })
            .await;
        }

        Ok(submission)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::class_users::entities::ClassUserRole;
    use crate::models::notifications::entities::NotificationType;
    use crate::models::submissions::entities::{Attachment, SubmissionStatus};
    use crate::models::users::entities::UserStatus;
    use crate::services::grading::test_support::{Fixture, grade_request, now};
    use chrono::Duration;

    fn text(content: &str) -> SubmitRequest {
        SubmitRequest {
            content: Some(content.to_string()),
            attachments: vec![],
        }
    }

    fn pdf() -> Attachment {
        Attachment {
            name: "essay.pdf".to_string(),
            url: "https://blob.school.example/essay.pdf".to_string(),
            file_type: "application/pdf".to_string(),
            file_size: 2048,
        }
    }

    #[test]
    fn test_content_rules() {
        let text_only = SubmissionSettings {
            submission_type: SubmissionType::Text,
            ..Default::default()
        };
        assert_eq!(
            check_content(&text_only, Some("  "), 0),
            Err("Text submission is required for this assignment")
        );
        assert_eq!(
            check_content(&text_only, Some("hello"), 1),
            Err("This assignment only accepts text submissions")
        );

        let file_only = SubmissionSettings {
            submission_type: SubmissionType::File,
            ..Default::default()
        };
        assert_eq!(
            check_content(&file_only, Some("hello"), 0),
            Err("File submission is required for this assignment")
        );

        let both = SubmissionSettings::default();
        assert_eq!(
            check_content(&both, None, 0),
            Err("Submission must include text content or at least one attachment")
        );
        assert!(check_content(&both, None, 1).is_ok());

        let both_with_text = SubmissionSettings {
            text_submission_required: true,
            ..Default::default()
        };
        assert_eq!(
            check_content(&both_with_text, None, 2),
            Err("Text submission is required for this assignment")
        );
    }

    #[tokio::test]
    async fn test_submit_on_time_and_late() {
        let fx = Fixture::new().await;
        let alice = fx.student("alice").await;
        let bob = fx.student("bob").await;
        let now = now();

        let open = fx.assignment_due_in(Duration::days(1)).await;
        let sub = fx
            .engine
            .submit(open.id, &alice, text("my essay"), now)
            .await
            .unwrap();
        assert_eq!(sub.status, SubmissionStatus::Submitted);
        assert!(!sub.is_late);
        assert_eq!(sub.submitted_at, Some(now));

        let past = fx.assignment_due_in(Duration::days(-1)).await;
        let sub = fx
            .engine
            .submit(
                past.id,
                &bob,
                SubmitRequest {
                    content: None,
                    attachments: vec![pdf()],
                },
                now,
            )
            .await
            .unwrap();
        assert_eq!(sub.status, SubmissionStatus::Late);
        assert!(sub.is_late);
        assert_eq!(fx.notifier.count(NotificationType::SubmissionCreated), 2);
    }

    #[tokio::test]
    async fn test_late_window_rules() {
        let fx = Fixture::new().await;
        let alice = fx.student("alice").await;
        let now = now();

        let mut req = fx.assignment_request(now - Duration::days(3));
        req.max_late_days = 2;
        let closed = fx.assignment(req).await;
        let err = fx
            .engine
            .submit(closed.id, &alice, text("too late"), now)
            .await
            .unwrap_err();
        assert!(matches!(err, HWSystemError::Validation(_)));

        let mut req = fx.assignment_request(now - Duration::hours(1));
        req.allow_late_submission = false;
        let strict = fx.assignment(req).await;
        let err = fx
            .engine
            .submit(strict.id, &alice, text("late"), now)
            .await
            .unwrap_err();
        assert_eq!(
            err.message(),
            "Late submissions are not allowed for this assignment"
        );
    }

    #[tokio::test]
    async fn test_only_enrolled_students_submit_published_work() {
        let fx = Fixture::new().await;
        let outsider = fx.user("mallory", UserStatus::Active).await;
        let assistant = fx
            .member("ta", ClassUserRole::Teacher, UserStatus::Active)
            .await;
        let rep = fx
            .member("rep", ClassUserRole::ClassRepresentative, UserStatus::Active)
            .await;
        let assignment = fx.assignment_due_in(Duration::days(2)).await;

        for user in [&outsider, &assistant] {
            let err = fx
                .engine
                .submit(assignment.id, user, text("hello"), now())
                .await
                .unwrap_err();
            assert!(matches!(err, HWSystemError::Authorization(_)));
        }
        assert!(
            fx.engine
                .submit(assignment.id, &rep, text("hello"), now())
                .await
                .is_ok()
        );

        let mut draft = fx.assignment_request(now() + Duration::days(2));
        draft.visibility = None;
        let draft = fx.assignment(draft).await;
        let err = fx
            .engine
            .submit(draft.id, &rep, text("hello"), now())
            .await
            .unwrap_err();
        assert!(matches!(err, HWSystemError::Validation(_)));
    }

    #[tokio::test]
    async fn test_resubmission_requires_permission_and_consumes_it() {
        let fx = Fixture::new().await;
        let alice = fx.student("alice").await;
        let assignment = fx.assignment_due_in(Duration::days(2)).await;

        let first = fx
            .engine
            .submit(assignment.id, &alice, text("draft one"), now())
            .await
            .unwrap();

        let err = fx
            .engine
            .submit(assignment.id, &alice, text("draft two"), now())
            .await
            .unwrap_err();
        assert!(matches!(err, HWSystemError::Authorization(_)));

        let graded = fx
            .engine
            .grade_submission(
                assignment.id,
                first.id,
                &fx.teacher,
                grade_request(70.0, true),
                now(),
            )
            .await
            .unwrap();
        assert!(graded.submission.allow_resubmit);

        let second = fx
            .engine
            .submit(assignment.id, &alice, text("draft two"), now())
            .await
            .unwrap();
        assert_eq!(second.id, first.id);
        assert_eq!(second.resubmission_count, 1);
        assert!(!second.allow_resubmit);
        assert_eq!(second.status, SubmissionStatus::Submitted);
        assert_eq!(second.grade, None);
        assert_eq!(second.feedback, None);
        assert_eq!(second.content.as_deref(), Some("draft two"));

        // 历史保留
        let history = fx.storage.list_grading_history(first.id).await.unwrap();
        assert_eq!(history.len(), 1);

        let err = fx
            .engine
            .submit(assignment.id, &alice, text("draft three"), now())
            .await
            .unwrap_err();
        assert!(matches!(err, HWSystemError::Authorization(_)));
    }

    #[tokio::test]
    async fn test_duplicate_first_submission_conflicts() {
        let fx = Fixture::new().await;
        let alice = fx.student("alice").await;
        let assignment = fx.assignment_due_in(Duration::days(2)).await;

        let new = NewSubmission {
            assignment_id: assignment.id,
            student_id: alice.id,
            submitted_at: now(),
            content: Some("x".to_string()),
            attachments: vec![],
            is_late: false,
        };
        fx.storage.create_submission(new.clone()).await.unwrap();
        let err = fx.storage.create_submission(new).await.unwrap_err();
        assert!(err.is_conflict());
    }
}
