//! 教师评分与评分历史

use chrono::{DateTime, Utc};
use tracing::info;

use super::{DomainEvent, GradingEngine, calculate_penalty};
use crate::errors::{HWSystemError, Result};
use crate::models::assignments::entities::Assignment;
use crate::models::grading::{
    entities::{Annotation, ChangeType, GradingHistoryEntry},
    requests::GradeRequest,
    responses::GradeResponse,
};
use crate::models::submissions::entities::{Actor, Submission};
use crate::models::users::entities::User;
use crate::storage::GradingRecord;
use crate::utils::validate::{validate_feedback, validate_score};

fn validate_annotation(annotation: &Annotation) -> std::result::Result<(), &'static str> {
    match annotation {
        Annotation::Comment { position, text, .. } => {
            if position.page < 1 {
                return Err("Annotation page must be at least 1");
            }
            if !position.x.is_finite() || !position.y.is_finite() {
                return Err("Annotation position must be finite");
            }
            if text.trim().is_empty() {
                return Err("Comment annotation text must not be empty");
            }
        }
        Annotation::Highlight { start, end, .. } => {
            if start >= end {
                return Err("Highlight range must start before it ends");
            }
        }
        Annotation::Correction {
            start,
            end,
            replacement,
            ..
        } => {
            if start >= end {
                return Err("Correction range must start before it ends");
            }
            if replacement.trim().is_empty() {
                return Err("Correction replacement must not be empty");
            }
        }
    }
    Ok(())
}

/// 评分请求校验，不涉及存储
pub fn validate_grade_request(assignment: &Assignment, req: &GradeRequest) -> Result<()> {
    if !validate_score(req.grade, assignment.total_points) {
        return Err(HWSystemError::validation(format!(
            "Grade must be between 0 and {}",
            assignment.total_points
        )));
    }
    validate_feedback(&req.feedback).map_err(HWSystemError::validation)?;

    for (criterion_id, value) in &req.rubric_grades {
        let criterion = assignment.rubric_criterion(criterion_id).ok_or_else(|| {
            HWSystemError::validation(format!("Unknown rubric criterion '{criterion_id}'"))
        })?;
        if !validate_score(*value, criterion.max_points) {
            return Err(HWSystemError::validation(format!(
                "Rubric grade for '{}' must be between 0 and {}",
                criterion_id, criterion.max_points
            )));
        }
    }

    for annotation in &req.annotations {
        validate_annotation(annotation).map_err(HWSystemError::validation)?;
    }

    Ok(())
}

/// 首次评分为 initial；之后默认 revision，调用方可显式标记 appeal / correction
pub fn derive_change_type(
    submission: &Submission,
    history: &[GradingHistoryEntry],
    requested: Option<ChangeType>,
) -> ChangeType {
    if submission.grade.is_none() && history.is_empty() {
        return ChangeType::Initial;
    }
    match requested {
        Some(kind @ (ChangeType::Appeal | ChangeType::Correction)) => kind,
        _ => ChangeType::Revision,
    }
}

impl GradingEngine {
    /// 评分：校验、计算扣分、原子追加历史，成功后通知学生
    pub async fn grade_submission(
        &self,
        assignment_id: i64,
        submission_id: i64,
        grader: &User,
        req: GradeRequest,
        now: DateTime<Utc>,
    ) -> Result<GradeResponse> {
        let assignment = self.load_assignment(assignment_id).await?;
        self.ensure_class_teacher(grader, assignment.class_id).await?;

        let submission = self
            .storage
            .get_submission_by_id(submission_id)
            .await?
            .filter(|s| s.assignment_id == assignment.id)
            .ok_or_else(|| HWSystemError::not_found("Submission not found"))?;

        validate_grade_request(&assignment, &req)?;

        let expected_version = match req.expected_version {
            Some(version) if version != submission.version => {
                return Err(HWSystemError::conflict(
                    "Submission was modified since it was loaded, please reload and try again",
                ));
            }
            Some(version) => version,
            None => submission.version,
        };

        let history = self.storage.list_grading_history(submission.id).await?;
        let change_type = derive_change_type(&submission, &history, req.change_type);
        let previous_grade = submission
            .grade
            .or_else(|| history.iter().find(|e| e.is_latest).map(|e| e.grade));

        let outcome = calculate_penalty(
            req.grade,
            submission.submitted_at,
            &assignment.penalty_policy(),
        );

        let (submission, entry) = self
            .storage
            .append_grading_entry(GradingRecord {
                submission_id: submission.id,
                expected_version,
                grade: outcome.final_grade,
                original_grade: req.grade,
                feedback: req.feedback.trim().to_string(),
                rubric_grades: req.rubric_grades,
                annotations: req.annotations,
                graded_at: now,
                graded_by: Actor::User { id: grader.id },
                grade_reason: req.grade_reason,
                previous_grade,
                change_type,
                late_penalty: outcome.to_info(),
                allow_resubmit: req.allow_resubmit,
                hide_grade_from_student: req.hide_grade_from_student,
            })
            .await?;

        info!(
            assignment_id = assignment.id,
            submission_id = submission.id,
            grader_id = grader.id,
            seq = entry.seq,
            change_type = %change_type,
            final_grade = outcome.final_grade,
            "Submission graded"
        );

        self.notify_quietly(DomainEvent::GradeAssigned {
            student_id: submission.student_id,
            assignment_id: assignment.id,
            assignment_title: assignment.title.clone(),
            submission_id: submission.id,
            grade: (!submission.hide_grade_from_student).then_some(outcome.final_grade),
            total_points: assignment.total_points,
            change_type,
        })
        .await;

        Ok(GradeResponse {
            submission,
            penalty_info: outcome,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::assignments::entities::RubricCriterion;
    use crate::models::grading::entities::AnnotationPosition;
    use crate::models::notifications::entities::NotificationType;
    use crate::models::submissions::entities::SubmissionStatus;
    use crate::models::submissions::requests::SubmitRequest;
    use crate::models::users::entities::UserStatus;
    use crate::services::grading::test_support::{Fixture, grade_request, now};
    use crate::storage::NewSubmission;
    use chrono::{Duration, TimeZone};

    async fn submitted(fx: &Fixture, assignment: &Assignment, at: DateTime<Utc>) -> Submission {
        let student = fx.student(&format!("student{}", at.timestamp())).await;
        fx.storage
            .create_submission(NewSubmission {
                assignment_id: assignment.id,
                student_id: student.id,
                submitted_at: at,
                content: Some("essay".to_string()),
                attachments: vec![],
                is_late: at > assignment.due_date,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_late_grade_applies_penalty() {
        let fx = Fixture::new().await;
        let due = Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap();
        let assignment = fx.assignment(fx.assignment_request(due)).await;
        let late_at = Utc.with_ymd_and_hms(2024, 1, 12, 0, 0, 0).unwrap();
        let late = submitted(&fx, &assignment, late_at).await;

        let resp = fx
            .engine
            .grade_submission(
                assignment.id,
                late.id,
                &fx.teacher,
                grade_request(80.0, false),
                now(),
            )
            .await
            .unwrap();

        assert_eq!(resp.penalty_info.days_late, 2);
        assert_eq!(resp.penalty_info.penalty_percent, 20.0);
        assert_eq!(resp.submission.grade, Some(64.0));
        assert_eq!(resp.submission.original_grade, Some(80.0));
        assert_eq!(resp.submission.status, SubmissionStatus::Graded);
        assert!(resp.submission.late_penalty.applied);

        let on_time_at = Utc.with_ymd_and_hms(2024, 1, 9, 0, 0, 0).unwrap();
        let on_time = submitted(&fx, &assignment, on_time_at).await;
        let resp = fx
            .engine
            .grade_submission(
                assignment.id,
                on_time.id,
                &fx.teacher,
                grade_request(80.0, false),
                now(),
            )
            .await
            .unwrap();
        assert_eq!(resp.submission.grade, Some(80.0));
        assert!(!resp.penalty_info.is_late);
    }

    #[tokio::test]
    async fn test_history_keeps_single_latest() {
        let fx = Fixture::new().await;
        let assignment = fx.assignment_due_in(Duration::days(1)).await;
        let sub = submitted(&fx, &assignment, now()).await;

        fx.engine
            .grade_submission(assignment.id, sub.id, &fx.teacher, grade_request(60.0, false), now())
            .await
            .unwrap();
        fx.engine
            .grade_submission(assignment.id, sub.id, &fx.teacher, grade_request(70.0, false), now())
            .await
            .unwrap();
        let mut appeal = grade_request(75.0, false);
        appeal.change_type = Some(ChangeType::Appeal);
        appeal.grade_reason = Some("Appeal accepted".to_string());
        let resp = fx
            .engine
            .grade_submission(assignment.id, sub.id, &fx.admin, appeal, now())
            .await
            .unwrap();

        let history = fx.storage.list_grading_history(sub.id).await.unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(history.iter().filter(|e| e.is_latest).count(), 1);
        let latest = history.last().unwrap();
        assert!(latest.is_latest);
        assert_eq!(latest.seq, 3);
        assert_eq!(latest.grade, 75.0);
        assert_eq!(resp.submission.grade, Some(latest.grade));

        let kinds: Vec<ChangeType> = history.iter().map(|e| e.change_type).collect();
        assert_eq!(
            kinds,
            vec![ChangeType::Initial, ChangeType::Revision, ChangeType::Appeal]
        );
        assert_eq!(history[1].previous_grade, Some(60.0));
        assert_eq!(fx.notifier.count(NotificationType::GradeAssigned), 3);
    }

    #[tokio::test]
    async fn test_invalid_requests_change_nothing() {
        let fx = Fixture::new().await;
        let mut req = fx.assignment_request(now() + Duration::days(1));
        req.rubric = Some(vec![RubricCriterion {
            id: "thesis".to_string(),
            title: "Thesis".to_string(),
            max_points: 20.0,
        }]);
        let assignment = fx.assignment(req).await;
        let sub = submitted(&fx, &assignment, now()).await;

        let mut too_high = grade_request(101.0, false);
        too_high.feedback = "Well structured essay.".to_string();
        let mut short_feedback = grade_request(50.0, false);
        short_feedback.feedback = "   ok    ".to_string();
        let mut unknown_rubric = grade_request(50.0, false);
        unknown_rubric.rubric_grades.insert("style".to_string(), 5.0);
        let mut rubric_overflow = grade_request(50.0, false);
        rubric_overflow.rubric_grades.insert("thesis".to_string(), 25.0);
        let mut bad_annotation = grade_request(50.0, false);
        bad_annotation.annotations.push(Annotation::Comment {
            position: AnnotationPosition {
                page: 0,
                x: 1.0,
                y: 1.0,
            },
            text: "see here".to_string(),
            created_at: now(),
        });
        let mut nan = grade_request(50.0, false);
        nan.grade = f64::NAN;

        for req in [
            too_high,
            short_feedback,
            unknown_rubric,
            rubric_overflow,
            bad_annotation,
            nan,
        ] {
            let err = fx
                .engine
                .grade_submission(assignment.id, sub.id, &fx.teacher, req, now())
                .await
                .unwrap_err();
            assert!(matches!(err, HWSystemError::Validation(_)), "{err}");
        }

        assert!(fx.storage.list_grading_history(sub.id).await.unwrap().is_empty());
        assert_eq!(fx.notifier.count(NotificationType::GradeAssigned), 0);
        let unchanged = fx.storage.get_submission_by_id(sub.id).await.unwrap().unwrap();
        assert_eq!(unchanged.grade, None);
        assert_eq!(unchanged.version, sub.version);
    }

    #[tokio::test]
    async fn test_only_class_teachers_grade() {
        let fx = Fixture::new().await;
        let assignment = fx.assignment_due_in(Duration::days(1)).await;
        let sub = submitted(&fx, &assignment, now()).await;
        let classmate = fx.student("classmate").await;
        let stranger = fx.user("stranger", UserStatus::Active).await;

        for user in [&classmate, &stranger] {
            let err = fx
                .engine
                .grade_submission(assignment.id, sub.id, user, grade_request(50.0, false), now())
                .await
                .unwrap_err();
            assert!(matches!(err, HWSystemError::Authorization(_)));
        }
        assert!(fx.storage.list_grading_history(sub.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_stale_version_conflicts() {
        let fx = Fixture::new().await;
        let assignment = fx.assignment_due_in(Duration::days(1)).await;
        let sub = submitted(&fx, &assignment, now()).await;

        let mut first = grade_request(50.0, false);
        first.expected_version = Some(sub.version);
        fx.engine
            .grade_submission(assignment.id, sub.id, &fx.teacher, first, now())
            .await
            .unwrap();

        let mut stale = grade_request(90.0, false);
        stale.expected_version = Some(sub.version);
        let err = fx
            .engine
            .grade_submission(assignment.id, sub.id, &fx.teacher, stale, now())
            .await
            .unwrap_err();
        assert!(err.is_conflict());

        let history = fx.storage.list_grading_history(sub.id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].grade, 50.0);
    }

    #[tokio::test]
    async fn test_notification_failure_keeps_grade_and_hidden_grade_withheld() {
        let fx = Fixture::new().await;
        let assignment = fx.assignment_due_in(Duration::days(1)).await;
        let alice = fx.student("alice").await;
        let sub = fx
            .engine
            .submit(
                assignment.id,
                &alice,
                SubmitRequest {
                    content: Some("essay".to_string()),
                    attachments: vec![],
                },
                now(),
            )
            .await
            .unwrap();

        fx.notifier.fail_for(alice.id);
        let resp = fx
            .engine
            .grade_submission(assignment.id, sub.id, &fx.teacher, grade_request(88.0, false), now())
            .await
            .unwrap();
        assert_eq!(resp.submission.grade, Some(88.0));
        assert_eq!(fx.notifier.count(NotificationType::GradeAssigned), 0);

        let fx = Fixture::new().await;
        let assignment = fx.assignment_due_in(Duration::days(1)).await;
        let sub = submitted(&fx, &assignment, now()).await;
        let mut hidden = grade_request(88.0, false);
        hidden.hide_grade_from_student = true;
        fx.engine
            .grade_submission(assignment.id, sub.id, &fx.teacher, hidden, now())
            .await
            .unwrap();
        let events = fx.notifier.events();
        assert!(matches!(
            events.as_slice(),
            [DomainEvent::GradeAssigned { grade: None, .. }]
        ));
    }
}
