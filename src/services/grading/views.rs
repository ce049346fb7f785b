//! 只读视图：花名册提交列表、评分历史、学生本人提交、自动评分记录

use super::GradingEngine;
use crate::errors::{HWSystemError, Result};
use crate::models::grading::entities::{AutoGradeHistoryEntry, GradingHistoryEntry};
use crate::models::submissions::{
    entities::SubmissionStatus,
    responses::{RosterSubmissionItem, StudentSubmissionView},
};
use crate::models::users::entities::User;

impl GradingEngine {
    /// 教师视角，未提交的学生以 pending 占位
    pub async fn list_roster_submissions(
        &self,
        assignment_id: i64,
        viewer: &User,
    ) -> Result<Vec<RosterSubmissionItem>> {
        let assignment = self.load_assignment(assignment_id).await?;
        self.ensure_class_teacher(viewer, assignment.class_id).await?;

        let mut submissions = self
            .storage
            .list_submissions_by_assignment(assignment.id)
            .await?;

        let items = self
            .roster
            .active_students(assignment.class_id)
            .await?
            .into_iter()
            .map(|student| {
                let submission = submissions
                    .iter()
                    .position(|s| s.student_id == student.user_id)
                    .map(|idx| submissions.swap_remove(idx));
                RosterSubmissionItem {
                    status: submission
                        .as_ref()
                        .map_or(SubmissionStatus::Pending, |s| s.status),
                    student,
                    submission,
                }
            })
            .collect();

        Ok(items)
    }

    pub async fn list_grading_history(
        &self,
        assignment_id: i64,
        submission_id: i64,
        viewer: &User,
    ) -> Result<Vec<GradingHistoryEntry>> {
        let assignment = self.load_assignment(assignment_id).await?;
        self.ensure_class_teacher(viewer, assignment.class_id).await?;

        let submission = self
            .storage
            .get_submission_by_id(submission_id)
            .await?
            .filter(|s| s.assignment_id == assignment.id)
            .ok_or_else(|| HWSystemError::not_found("Submission not found"))?;

        self.storage.list_grading_history(submission.id).await
    }

    /// 学生本人提交；隐藏成绩时不返回成绩、反馈与历史
    pub async fn my_submission(
        &self,
        assignment_id: i64,
        student: &User,
    ) -> Result<StudentSubmissionView> {
        let assignment = self.load_assignment(assignment_id).await?;
        let submission = self
            .storage
            .get_submission_by_assignment_and_student(assignment.id, student.id)
            .await?
            .ok_or_else(|| HWSystemError::not_found("Submission not found"))?;

        if submission.hide_grade_from_student {
            return Ok(StudentSubmissionView {
                submission: submission.without_grade(),
                grade_hidden: true,
                grading_history: vec![],
            });
        }

        let grading_history = self.storage.list_grading_history(submission.id).await?;
        Ok(StudentSubmissionView {
            submission,
            grade_hidden: false,
            grading_history,
        })
    }

    pub async fn list_auto_grade_history(
        &self,
        assignment_id: i64,
        viewer: &User,
    ) -> Result<Vec<AutoGradeHistoryEntry>> {
        let assignment = self.load_assignment(assignment_id).await?;
        self.ensure_class_teacher(viewer, assignment.class_id).await?;
        self.storage.list_auto_grade_history(assignment.id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::submissions::requests::SubmitRequest;
    use crate::services::grading::test_support::{Fixture, grade_request, now};
    use chrono::Duration;

    #[tokio::test]
    async fn test_roster_list_marks_pending() {
        let fx = Fixture::new().await;
        let assignment = fx.assignment_due_in(Duration::days(3)).await;
        let alice = fx.student("alice").await;
        let bob = fx.student("bob").await;
        fx.engine
            .submit(
                assignment.id,
                &alice,
                SubmitRequest {
                    content: Some("my essay".to_string()),
                    attachments: vec![],
                },
                now(),
            )
            .await
            .unwrap();

        let items = fx
            .engine
            .list_roster_submissions(assignment.id, &fx.teacher)
            .await
            .unwrap();
        assert_eq!(items.len(), 2);
        let alice_item = items.iter().find(|i| i.student.user_id == alice.id).unwrap();
        assert_eq!(alice_item.status, SubmissionStatus::Submitted);
        assert!(alice_item.submission.is_some());
        let bob_item = items.iter().find(|i| i.student.user_id == bob.id).unwrap();
        assert_eq!(bob_item.status, SubmissionStatus::Pending);
        assert!(bob_item.submission.is_none());

        let err = fx
            .engine
            .list_roster_submissions(assignment.id, &alice)
            .await
            .unwrap_err();
        assert!(matches!(err, HWSystemError::Authorization(_)));
    }

    #[tokio::test]
    async fn test_hidden_grade_withheld_from_student() {
        let fx = Fixture::new().await;
        let assignment = fx.assignment_due_in(Duration::days(3)).await;
        let alice = fx.student("alice").await;
        let submission = fx
            .engine
            .submit(
                assignment.id,
                &alice,
                SubmitRequest {
                    content: Some("my essay".to_string()),
                    attachments: vec![],
                },
                now(),
            )
            .await
            .unwrap();

        let mut hidden = grade_request(91.0, false);
        hidden.hide_grade_from_student = true;
        fx.engine
            .grade_submission(assignment.id, submission.id, &fx.teacher, hidden, now())
            .await
            .unwrap();

        let view = fx.engine.my_submission(assignment.id, &alice).await.unwrap();
        assert!(view.grade_hidden);
        assert_eq!(view.submission.grade, None);
        assert_eq!(view.submission.feedback, None);
        assert!(view.grading_history.is_empty());

        let history = fx
            .engine
            .list_grading_history(assignment.id, submission.id, &fx.teacher)
            .await
            .unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].grade, 91.0);

        fx.engine
            .grade_submission(
                assignment.id,
                submission.id,
                &fx.teacher,
                grade_request(93.0, false),
                now(),
            )
            .await
            .unwrap();
        let view = fx.engine.my_submission(assignment.id, &alice).await.unwrap();
        assert!(!view.grade_hidden);
        assert_eq!(view.submission.grade, Some(93.0));
        assert_eq!(view.grading_history.len(), 2);
    }
}
