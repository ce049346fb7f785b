//! 缺交提醒
//!
//! 截止前剩余天数（向上取整）恰好命中配置档位时提醒未提交的学生。
//! 每个 (作业, 档位) 只发送一次，由 reminder_logs 的唯一索引去重。

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info};

use super::{DomainEvent, GradingEngine};
use crate::errors::Result;
use crate::models::assignments::entities::Assignment;
use crate::models::class_users::entities::RosterMember;
use crate::models::grading::responses::{ReminderOutcome, ReminderSummary};
use crate::utils::time::ceil_days_between;

/// 剩余一天以内视为紧急
pub fn is_urgent(days_left: i64) -> bool {
    days_left <= 1
}

/// 当前时间命中的提醒档位
pub fn reminder_offset(assignment: &Assignment, now: DateTime<Utc>) -> Option<i32> {
    if assignment.due_date < now {
        return None;
    }
    let days_left = ceil_days_between(now, assignment.due_date);
    assignment
        .missing_submission_policy
        .reminder_days_before_due
        .iter()
        .copied()
        .find(|offset| *offset as i64 == days_left)
}

impl GradingEngine {
    async fn reminder_recipients(&self, assignment: &Assignment) -> Result<Vec<RosterMember>> {
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
            .filter(|s| !submitted.contains(&s.user_id) && !s.email.trim().is_empty())
            .collect())
    }

    async fn remind_assignment(
        &self,
        assignment: &Assignment,
        offset: i32,
        now: DateTime<Utc>,
    ) -> Result<ReminderOutcome> {
        let recipients = self.reminder_recipients(assignment).await?;

        let Some(log_id) = self
            .storage
            .claim_reminder_slot(assignment.id, offset, now)
            .await?
        else {
            return Ok(ReminderOutcome::AlreadySent);
        };

        let days_left = offset as i64;
        let urgent = is_urgent(days_left);
        let mut sent_count = 0u32;
        let mut failed_count = 0u32;

        for student in &recipients {
            let delivered = self
                .notify_quietly(DomainEvent::MissingSubmissionReminder {
                    student_id: student.user_id,
                    email: student.email.clone(),
                    student_name: student.name().to_string(),
                    assignment_id: assignment.id,
                    assignment_title: assignment.title.clone(),
                    due_date: assignment.due_date,
                    days_left,
                    is_urgent: urgent,
                })
                .await;
            if delivered {
                sent_count += 1;
            } else {
                failed_count += 1;
            }
        }

        self.storage
            .record_reminder_result(log_id, sent_count, failed_count)
            .await?;

        Ok(ReminderOutcome::Sent {
            sent_count,
            failed_count,
            is_urgent: urgent,
        })
    }

    /// 定时任务：逐个作业发送缺交提醒
    pub async fn run_reminders(&self, now: DateTime<Utc>) -> Result<Vec<ReminderSummary>> {
        let candidates = self.storage.list_reminder_candidates(now).await?;
        let mut summaries = Vec::new();

        for assignment in &candidates {
            let Some(offset) = reminder_offset(assignment, now) else {
                continue;
            };

            let outcome = match self.remind_assignment(assignment, offset, now).await {
                Ok(outcome) => outcome,
                Err(err) => {
                    error!(
                        assignment_id = assignment.id,
                        error = %err,
                        "Sending missing submission reminders failed"
                    );
                    ReminderOutcome::Failed {
                        error: err.to_string(),
                    }
                }
            };
            debug!(assignment_id = assignment.id, offset, ?outcome, "Reminder processed");

            summaries.push(ReminderSummary {
                assignment_id: assignment.id,
                days_left: offset as i64,
                outcome,
            });
        }

        let sent: u32 = summaries
            .iter()
            .map(|s| match s.outcome {
                ReminderOutcome::Sent { sent_count, .. } => sent_count,
                _ => 0,
            })
            .sum();
        info!(
            assignments = summaries.len(),
            sent, "Reminder sweep finished"
        );

        Ok(summaries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::assignments::requests::CreateAssignmentRequest;
    use crate::models::notifications::entities::NotificationType;
    use crate::models::users::entities::UserStatus;
    use crate::models::class_users::entities::ClassUserRole;
    use crate::services::grading::test_support::{Fixture, now};
    use crate::storage::NewSubmission;
    use chrono::Duration;

    fn reminder_request(fx: &Fixture, due: DateTime<Utc>) -> CreateAssignmentRequest {
        let mut req = fx.assignment_request(due);
        req.missing_submission_policy.notify_students_of_missing_submission = true;
        req.missing_submission_policy.reminder_days_before_due = vec![3, 1];
        req
    }

    #[test]
    fn test_urgency() {
        assert!(is_urgent(1));
        assert!(is_urgent(0));
        assert!(!is_urgent(2));
    }

    #[tokio::test]
    async fn test_reminder_sent_once_per_offset() {
        let fx = Fixture::new().await;
        let current = now();
        let assignment = fx
            .assignment(reminder_request(&fx, current + Duration::days(3)))
            .await;
        let lazy = fx.student("lazy").await;
        let done = fx.student("done").await;
        fx.member("gone", ClassUserRole::Student, UserStatus::Inactive)
            .await;
        fx.storage
            .create_submission(NewSubmission {
                assignment_id: assignment.id,
                student_id: done.id,
                submitted_at: current,
                content: Some("finished".to_string()),
                attachments: vec![],
                is_late: false,
            })
            .await
            .unwrap();

        let summaries = fx.engine.run_reminders(current).await.unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].days_left, 3);
        assert_eq!(
            summaries[0].outcome,
            ReminderOutcome::Sent {
                sent_count: 1,
                failed_count: 0,
                is_urgent: false,
            }
        );
        let events = fx.notifier.events();
        assert!(matches!(
            events.as_slice(),
            [DomainEvent::MissingSubmissionReminder { student_id, days_left: 3, .. }]
                if *student_id == lazy.id
        ));

        let rerun = fx.engine.run_reminders(current).await.unwrap();
        assert_eq!(rerun[0].outcome, ReminderOutcome::AlreadySent);
        assert_eq!(
            fx.notifier.count(NotificationType::MissingSubmissionReminder),
            1
        );
    }

    #[tokio::test]
    async fn test_daily_runs_send_one_wave_per_offset() {
        let fx = Fixture::new().await;
        let start = now();
        let due = start + Duration::days(7);
        fx.assignment(reminder_request(&fx, due)).await;
        let lazy = fx.student("lazy").await;

        for day in 0..=7 {
            fx.engine
                .run_reminders(start + Duration::days(day))
                .await
                .unwrap();
        }

        let waves: Vec<i64> = fx
            .notifier
            .events()
            .iter()
            .filter_map(|event| match event {
                DomainEvent::MissingSubmissionReminder {
                    student_id,
                    days_left,
                    ..
                } if *student_id == lazy.id => Some(*days_left),
                _ => None,
            })
            .collect();
        assert_eq!(waves, vec![3, 1]);
    }

    #[tokio::test]
    async fn test_reminder_offsets_must_match_exactly() {
        let fx = Fixture::new().await;
        let current = now();
        fx.assignment(reminder_request(&fx, current + Duration::days(2)))
            .await;
        fx.student("alice").await;

        assert!(fx.engine.run_reminders(current).await.unwrap().is_empty());

        // 两天零一小时向上取整为三天
        let summaries = fx
            .engine
            .run_reminders(current - Duration::hours(23))
            .await
            .unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].days_left, 3);
    }

    #[tokio::test]
    async fn test_reminder_failures_counted_and_urgent() {
        let fx = Fixture::new().await;
        let current = now();
        fx.assignment(reminder_request(&fx, current + Duration::hours(20)))
            .await;
        let alice = fx.student("alice").await;
        fx.student("bob").await;
        fx.notifier.fail_for(alice.id);

        let summaries = fx.engine.run_reminders(current).await.unwrap();
        assert_eq!(
            summaries[0].outcome,
            ReminderOutcome::Sent {
                sent_count: 1,
                failed_count: 1,
                is_urgent: true,
            }
        );
    }
}
