//! 缺交自动评分
//!
//! 定时任务、手动触发和批量评分共用 [`GradingEngine::grade_missing`]。
//! 同一作业同一 UTC 日期至多执行一次，由 auto_grade_history 的唯一索引保证。

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, error, info, warn};

use super::{DomainEvent, GradingEngine};
use crate::errors::{HWSystemError, Result};
use crate::models::assignments::entities::Assignment;
use crate::models::class_users::entities::RosterMember;
use crate::models::grading::{
    requests::BulkGradeRequest,
    responses::{
        AutoGradeMissingResponse, AutoGradeOutcome, AutoGradeSummary, BulkGradeResponse,
        GradedStudent,
    },
};
use crate::models::submissions::entities::Actor;
use crate::models::users::entities::User;
use crate::storage::{AutoGradeRunMarker, SyntheticGradeBatch, SyntheticGradeResult};
use crate::utils::time::{floor_days_between, utc_date};
use crate::utils::validate::validate_score;

const AUTO_GRADE_FEEDBACK: &str = "No submission was received; graded automatically.";
const BULK_GRADE_FEEDBACK: &str = "No submission was received; graded by the teacher.";

/// 定时任务的资格判断，返回逾期天数或不满足的原因
pub fn auto_grade_eligibility(
    assignment: &Assignment,
    now: DateTime<Utc>,
) -> std::result::Result<i64, String> {
    let policy = &assignment.missing_submission_policy;
    if !policy.auto_grade_when_overdue {
        return Err("Auto-grading is disabled".to_string());
    }
    if now <= assignment.due_date {
        return Err("Assignment is not overdue yet".to_string());
    }

    let days_overdue = floor_days_between(assignment.due_date, now);
    let days_after = policy.days_after_due_for_auto_grade as i64;

    if assignment.allow_late_submission {
        // 迟交窗口不限时学生随时可能补交，自动评分不能抢先
        let Some(window_end) = assignment.late_window_end() else {
            return Err("Late submission window has no end".to_string());
        };
        if now <= window_end {
            return Err("Late submission window is still open".to_string());
        }
        if now < window_end + Duration::days(days_after) {
            return Err(format!(
                "Grace period of {days_after} day(s) after the late window has not elapsed"
            ));
        }
    } else if days_overdue < days_after {
        return Err(format!(
            "Only {days_overdue} day(s) overdue, auto-grading starts after {days_after}"
        ));
    }

    Ok(days_overdue)
}

fn graded_students(students: &[RosterMember]) -> Vec<GradedStudent> {
    students
        .iter()
        .map(|s| GradedStudent {
            student_id: s.user_id,
            name: s.name().to_string(),
        })
        .collect()
}

/// 一次合成评分的参数
struct MissingGrade<'a> {
    assignment: &'a Assignment,
    students: &'a [RosterMember],
    grade: f64,
    feedback: String,
    actor: Actor,
    marker: Option<AutoGradeRunMarker>,
}

impl GradingEngine {
    /// 活跃学生中没有任何提交记录的
    pub async fn missing_students(&self, assignment: &Assignment) -> Result<Vec<RosterMember>> {
        let submitted: HashSet<i64> = self
            .storage
            .list_submitter_ids(assignment.id)
            .await?
            .into_iter()
            .collect();

        Ok(self
            .roster
            .active_students(assignment.class_id)
            .await?
            .into_iter()
            .filter(|s| !submitted.contains(&s.user_id))
            .collect())
    }

    /// 写入系统提交并逐个通知学生；`None` 表示当天已执行过
    async fn grade_missing(
        &self,
        params: MissingGrade<'_>,
        now: DateTime<Utc>,
    ) -> Result<Option<Vec<GradedStudent>>> {
        let MissingGrade {
            assignment,
            students,
            grade,
            feedback,
            actor,
            marker,
        } = params;

        let result = self
            .storage
            .apply_synthetic_grades(SyntheticGradeBatch {
                assignment_id: assignment.id,
                student_ids: students.iter().map(|s| s.user_id).collect(),
                grade,
                feedback,
                graded_at: now,
                graded_by: actor,
                marker,
            })
            .await?;

        let created = match result {
            SyntheticGradeResult::AlreadyRan => return Ok(None),
            SyntheticGradeResult::Applied(created) => created,
        };

        for submission in &created {
            self.notify_quietly(DomainEvent::AutoGradeApplied {
                student_id: submission.student_id,
                assignment_id: assignment.id,
                assignment_title: assignment.title.clone(),
                submission_id: submission.id,
                grade,
                total_points: assignment.total_points,
            })
            .await;
        }

        Ok(Some(graded_students(students)))
    }

    async fn auto_grade_assignment(
        &self,
        assignment: &Assignment,
        now: DateTime<Utc>,
    ) -> Result<AutoGradeOutcome> {
        let days_overdue = match auto_grade_eligibility(assignment, now) {
            Ok(days) => days,
            Err(reason) => return Ok(AutoGradeOutcome::NotEligible { reason }),
        };

        let today = utc_date(now);
        if self
            .storage
            .list_auto_grade_history(assignment.id)
            .await?
            .iter()
            .any(|run| run.run_date == today)
        {
            return Ok(AutoGradeOutcome::AlreadyRanToday);
        }

        let missing = self.missing_students(assignment).await?;
        if missing.is_empty() {
            return Ok(AutoGradeOutcome::NoMissingStudents);
        }

        let policy = &assignment.missing_submission_policy;
        let graded = self
            .grade_missing(
                MissingGrade {
                    assignment,
                    students: &missing,
                    grade: policy.auto_grade_value,
                    feedback: AUTO_GRADE_FEEDBACK.to_string(),
                    actor: Actor::System,
                    marker: Some(AutoGradeRunMarker {
                        run_date: today,
                        reason: format!(
                            "Auto-graded {days_overdue} day(s) after the due date"
                        ),
                    }),
                },
                now,
            )
            .await?;

        Ok(match graded {
            Some(students) => AutoGradeOutcome::Graded {
                graded_count: students.len(),
                student_ids: students.iter().map(|s| s.student_id).collect(),
            },
            None => AutoGradeOutcome::AlreadyRanToday,
        })
    }

    /// 定时任务：处理所有开启自动评分的逾期作业，单个作业失败不影响其他作业
    pub async fn run_auto_grade(&self, now: DateTime<Utc>) -> Result<Vec<AutoGradeSummary>> {
        let candidates = self.storage.list_auto_grade_candidates(now).await?;
        let mut summaries = Vec::with_capacity(candidates.len());

        for assignment in &candidates {
            let outcome = match self.auto_grade_assignment(assignment, now).await {
                Ok(outcome) => outcome,
                Err(err) => {
                    error!(
                        assignment_id = assignment.id,
                        error = %err,
                        "Auto-grading failed"
                    );
                    AutoGradeOutcome::Failed {
                        error: err.to_string(),
                    }
                }
            };

            match &outcome {
                AutoGradeOutcome::Graded { graded_count, .. } => info!(
                    assignment_id = assignment.id,
                    graded_count, "Auto-graded missing submissions"
                ),
                AutoGradeOutcome::NotEligible { reason } => {
                    debug!(assignment_id = assignment.id, reason, "Skipped auto-grading")
                }
                _ => debug!(assignment_id = assignment.id, ?outcome, "Auto-grading skipped"),
            }

            summaries.push(AutoGradeSummary {
                assignment_id: assignment.id,
                outcome,
            });
        }

        let graded: usize = summaries
            .iter()
            .map(|s| match s.outcome {
                AutoGradeOutcome::Graded { graded_count, .. } => graded_count,
                _ => 0,
            })
            .sum();
        let failed = summaries
            .iter()
            .filter(|s| matches!(s.outcome, AutoGradeOutcome::Failed { .. }))
            .count();
        if failed > 0 {
            warn!(failed, "Some assignments failed auto-grading");
        }
        info!(
            assignments = summaries.len(),
            graded, "Auto-grading sweep finished"
        );

        Ok(summaries)
    }

    /// 教师手动触发：只要求已过截止时间
    pub async fn auto_grade_missing(
        &self,
        assignment_id: i64,
        actor: &User,
        now: DateTime<Utc>,
    ) -> Result<AutoGradeMissingResponse> {
        let assignment = self.load_assignment(assignment_id).await?;
        self.ensure_class_teacher(actor, assignment.class_id).await?;

        if now <= assignment.due_date {
            return Err(HWSystemError::policy_gate("Assignment is not overdue yet"));
        }
        let days_overdue = floor_days_between(assignment.due_date, now);

        let missing = self.missing_students(&assignment).await?;
        let graded_students = if missing.is_empty() {
            vec![]
        } else {
            self.grade_missing(
                MissingGrade {
                    assignment: &assignment,
                    students: &missing,
                    grade: assignment.missing_submission_policy.auto_grade_value,
                    feedback: AUTO_GRADE_FEEDBACK.to_string(),
                    actor: Actor::User { id: actor.id },
                    marker: None,
                },
                now,
            )
            .await?
            .unwrap_or_default()
        };

        info!(
            assignment_id,
            actor_id = actor.id,
            graded_count = graded_students.len(),
            "Manually auto-graded missing submissions"
        );

        Ok(AutoGradeMissingResponse {
            graded_count: graded_students.len(),
            graded_students,
            days_overdue,
        })
    }

    /// 教师批量评分：不检查截止时间，可指定部分缺交学生
    pub async fn bulk_grade_missing(
        &self,
        assignment_id: i64,
        actor: &User,
        req: BulkGradeRequest,
        now: DateTime<Utc>,
    ) -> Result<BulkGradeResponse> {
        let assignment = self.load_assignment(assignment_id).await?;
        self.ensure_class_teacher(actor, assignment.class_id).await?;

        if !validate_score(req.grade, assignment.total_points) {
            return Err(HWSystemError::validation(format!(
                "Grade must be between 0 and {}",
                assignment.total_points
            )));
        }

        let mut missing = self.missing_students(&assignment).await?;
        if let Some(ids) = &req.student_ids {
            let wanted: HashSet<i64> = ids.iter().copied().collect();
            missing.retain(|s| wanted.contains(&s.user_id));
        }

        let feedback = req
            .feedback
            .filter(|f| !f.trim().is_empty())
            .unwrap_or_else(|| BULK_GRADE_FEEDBACK.to_string());

        let graded_students = if missing.is_empty() {
            vec![]
        } else {
            self.grade_missing(
                MissingGrade {
                    assignment: &assignment,
                    students: &missing,
                    grade: req.grade,
                    feedback,
                    actor: Actor::User { id: actor.id },
                    marker: None,
                },
                now,
            )
            .await?
            .unwrap_or_default()
        };

        info!(
            assignment_id,
            actor_id = actor.id,
            graded_count = graded_students.len(),
            "Bulk graded missing submissions"
        );

        Ok(BulkGradeResponse {
            graded_count: graded_students.len(),
            graded_students,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::assignments::requests::CreateAssignmentRequest;
    use crate::models::class_users::entities::ClassUserRole;
    use crate::models::grading::entities::ChangeType;
    use crate::models::notifications::entities::NotificationType;
    use crate::models::submissions::entities::SubmissionStatus;
    use crate::models::submissions::requests::SubmitRequest;
    use crate::models::users::entities::UserStatus;
    use crate::services::grading::test_support::{Fixture, now};
    use crate::storage::NewSubmission;

    /// 不允许迟交、逾期 1 天后自动给 0 分
    fn auto_grade_request(fx: &Fixture, due: DateTime<Utc>) -> CreateAssignmentRequest {
        let mut req = fx.assignment_request(due);
        req.allow_late_submission = false;
        req.missing_submission_policy.auto_grade_when_overdue = true;
        req.missing_submission_policy.auto_grade_value = 0.0;
        req.missing_submission_policy.days_after_due_for_auto_grade = 1;
        req
    }

    async fn submit_for(fx: &Fixture, assignment: &Assignment, student: &User) {
        fx.storage
            .create_submission(NewSubmission {
                assignment_id: assignment.id,
                student_id: student.id,
                submitted_at: assignment.due_date - Duration::hours(1),
                content: Some("done".to_string()),
                attachments: vec![],
                is_late: false,
            })
            .await
            .unwrap();
    }

    #[test]
    fn test_eligibility_gates() {
        let due = Utc::now() - Duration::days(10);
        let assignment_with = |allow_late: bool, max_late: i32, after: i32| {
            let mut a: Assignment = serde_json::from_value(serde_json::json!({
                "id": 1, "class_id": 1, "created_by": 1, "title": "Essay",
                "description": null, "due_date": due, "total_points": 100.0,
                "allow_late_submission": allow_late, "late_penalty": 10.0,
                "max_late_days": max_late,
                "submission_settings": {"type": "both"},
                "missing_submission_policy": {},
                "rubric": null, "visibility": "published", "publish_at": null,
                "is_active": true, "is_deleted": false, "deleted_at": null,
                "deleted_by": null, "created_at": due, "updated_at": due
            }))
            .unwrap();
            a.missing_submission_policy.auto_grade_when_overdue = true;
            a.missing_submission_policy.days_after_due_for_auto_grade = after;
            a
        };

        let strict = assignment_with(false, 0, 1);
        assert_eq!(
            auto_grade_eligibility(&strict, due + Duration::hours(25)),
            Ok(1)
        );
        assert!(auto_grade_eligibility(&strict, due + Duration::hours(23)).is_err());
        assert!(auto_grade_eligibility(&assignment_with(false, 0, 0), due).is_err());

        let late = assignment_with(true, 3, 2);
        assert!(auto_grade_eligibility(&late, due + Duration::days(3)).is_err());
        assert!(auto_grade_eligibility(&late, due + Duration::days(4)).is_err());
        assert_eq!(auto_grade_eligibility(&late, due + Duration::days(5)), Ok(5));

        let unbounded = assignment_with(true, 0, 1);
        assert_eq!(
            auto_grade_eligibility(&unbounded, due + Duration::days(30)),
            Err("Late submission window has no end".to_string())
        );

        let mut disabled = assignment_with(false, 0, 0);
        disabled.missing_submission_policy.auto_grade_when_overdue = false;
        assert!(auto_grade_eligibility(&disabled, due + Duration::days(5)).is_err());
    }

    #[tokio::test]
    async fn test_auto_grade_creates_synthetic_submission_once() {
        let fx = Fixture::new().await;
        let assignment = fx
            .assignment(auto_grade_request(&fx, now() - Duration::hours(25)))
            .await;
        let missing = fx.student("missing").await;
        let diligent = fx.student("diligent").await;
        submit_for(&fx, &assignment, &diligent).await;

        let summaries = fx.engine.run_auto_grade(now()).await.unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(
            summaries[0].outcome,
            AutoGradeOutcome::Graded {
                graded_count: 1,
                student_ids: vec![missing.id],
            }
        );

        let synthetic = fx
            .storage
            .get_submission_by_assignment_and_student(assignment.id, missing.id)
            .await
            .unwrap()
            .unwrap();
        assert!(synthetic.is_synthetic());
        assert_eq!(synthetic.grade, Some(0.0));
        assert_eq!(synthetic.status, SubmissionStatus::Graded);
        assert_eq!(synthetic.graded_by, Some(Actor::System));
        assert!(!synthetic.allow_resubmit);

        let history = fx.storage.list_grading_history(synthetic.id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].change_type, ChangeType::Initial);
        assert!(history[0].is_latest);
        assert_eq!(history[0].graded_by, Actor::System);
        assert_eq!(fx.notifier.count(NotificationType::AutoGradeApplied), 1);

        let again = fx.engine.run_auto_grade(now()).await.unwrap();
        assert_eq!(again[0].outcome, AutoGradeOutcome::AlreadyRanToday);
        let runs = fx
            .storage
            .list_auto_grade_history(assignment.id)
            .await
            .unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].student_ids, vec![missing.id]);
        assert_eq!(
            fx.storage
                .list_submissions_by_assignment(assignment.id)
                .await
                .unwrap()
                .len(),
            2
        );
        assert_eq!(fx.notifier.count(NotificationType::AutoGradeApplied), 1);
    }

    #[tokio::test]
    async fn test_auto_grade_skips_ineligible_and_inactive() {
        let fx = Fixture::new().await;
        let fresh = fx
            .assignment(auto_grade_request(&fx, now() - Duration::hours(2)))
            .await;
        fx.member("suspended", ClassUserRole::Student, UserStatus::Suspended)
            .await;
        fx.member("assistant", ClassUserRole::Teacher, UserStatus::Active)
            .await;

        let summaries = fx.engine.run_auto_grade(now()).await.unwrap();
        assert!(matches!(
            summaries[0].outcome,
            AutoGradeOutcome::NotEligible { .. }
        ));

        let old = fx
            .assignment(auto_grade_request(&fx, now() - Duration::days(3)))
            .await;
        let summaries = fx.engine.run_auto_grade(now()).await.unwrap();
        let old_summary = summaries
            .iter()
            .find(|s| s.assignment_id == old.id)
            .unwrap();
        assert_eq!(old_summary.outcome, AutoGradeOutcome::NoMissingStudents);
        assert!(
            fx.storage
                .list_submissions_by_assignment(fresh.id)
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn test_unbounded_late_window_keeps_students_able_to_submit() {
        let fx = Fixture::new().await;
        let mut req = auto_grade_request(&fx, now() - Duration::days(3));
        req.allow_late_submission = true;
        req.max_late_days = 0;
        let assignment = fx.assignment(req).await;
        let student = fx.student("latecomer").await;

        let summaries = fx.engine.run_auto_grade(now()).await.unwrap();
        assert_eq!(
            summaries[0].outcome,
            AutoGradeOutcome::NotEligible {
                reason: "Late submission window has no end".to_string(),
            }
        );
        assert!(
            fx.storage
                .list_submissions_by_assignment(assignment.id)
                .await
                .unwrap()
                .is_empty()
        );

        let submission = fx
            .engine
            .submit(
                assignment.id,
                &student,
                SubmitRequest {
                    content: Some("late but complete".to_string()),
                    attachments: vec![],
                },
                now(),
            )
            .await
            .unwrap();
        assert!(submission.is_late);
        assert_eq!(submission.status, SubmissionStatus::Late);
    }

    #[tokio::test]
    async fn test_manual_auto_grade_requires_overdue() {
        let fx = Fixture::new().await;
        let upcoming = fx
            .assignment(auto_grade_request(&fx, now() + Duration::days(1)))
            .await;
        fx.student("bob").await;

        let err = fx
            .engine
            .auto_grade_missing(upcoming.id, &fx.teacher, now())
            .await
            .unwrap_err();
        assert!(matches!(err, HWSystemError::PolicyGate(_)));

        let overdue = fx
            .assignment(auto_grade_request(&fx, now() - Duration::hours(50)))
            .await;
        let resp = fx
            .engine
            .auto_grade_missing(overdue.id, &fx.teacher, now())
            .await
            .unwrap();
        assert_eq!(resp.graded_count, 1);
        assert_eq!(resp.days_overdue, 2);
        assert_eq!(resp.graded_students[0].name, "bob");

        let again = fx
            .engine
            .auto_grade_missing(overdue.id, &fx.teacher, now())
            .await
            .unwrap();
        assert_eq!(again.graded_count, 0);
    }

    #[tokio::test]
    async fn test_bulk_grade_subset() {
        let fx = Fixture::new().await;
        let assignment = fx.assignment_due_in(Duration::days(2)).await;
        let alice = fx.student("alice").await;
        let bob = fx.student("bob").await;
        let carol = fx.student("carol").await;
        submit_for(&fx, &assignment, &carol).await;

        let err = fx
            .engine
            .bulk_grade_missing(
                assignment.id,
                &fx.teacher,
                BulkGradeRequest {
                    grade: 150.0,
                    feedback: None,
                    student_ids: None,
                },
                now(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, HWSystemError::Validation(_)));

        let outsider = fx.user("outsider", UserStatus::Active).await;
        let err = fx
            .engine
            .bulk_grade_missing(
                assignment.id,
                &outsider,
                BulkGradeRequest {
                    grade: 10.0,
                    feedback: None,
                    student_ids: None,
                },
                now(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, HWSystemError::Authorization(_)));

        let resp = fx
            .engine
            .bulk_grade_missing(
                assignment.id,
                &fx.teacher,
                BulkGradeRequest {
                    grade: 10.0,
                    feedback: Some("Excused partially".to_string()),
                    student_ids: Some(vec![bob.id, carol.id]),
                },
                now(),
            )
            .await
            .unwrap();
        assert_eq!(resp.graded_count, 1);
        assert_eq!(resp.graded_students[0].student_id, bob.id);

        let graded = fx
            .storage
            .get_submission_by_assignment_and_student(assignment.id, bob.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(graded.grade, Some(10.0));
        assert_eq!(graded.feedback.as_deref(), Some("Excused partially"));
        assert_eq!(graded.graded_by, Some(Actor::User { id: fx.teacher.id }));
        assert!(
            fx.storage
                .get_submission_by_assignment_and_student(assignment.id, alice.id)
                .await
                .unwrap()
                .is_none()
        );
    }
}
