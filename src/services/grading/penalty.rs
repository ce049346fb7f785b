//! 迟交扣分计算

use chrono::{DateTime, Utc};

use crate::models::grading::entities::{PenaltyOutcome, PenaltyPolicy};
use crate::utils::time::ceil_days_between;

/// 按迟交天数计算最终成绩
///
/// - 无实际提交时间、不允许迟交或扣分比例为 0 时不扣分
/// - 按时提交不扣分，`days_late` 为 0
/// - 迟交天数向上取整且至少为 1，扣分比例封顶 100%，最终成绩保留一位小数且不为负
pub fn calculate_penalty(
    original_grade: f64,
    submitted_at: Option<DateTime<Utc>>,
    policy: &PenaltyPolicy,
) -> PenaltyOutcome {
    let unpenalized = |is_late: bool| PenaltyOutcome {
        original_grade,
        final_grade: original_grade,
        penalty_percent: 0.0,
        penalty_amount: 0.0,
        days_late: 0,
        is_late,
    };

    let Some(submitted_at) = submitted_at else {
        return unpenalized(false);
    };

    let is_late = submitted_at > policy.due_date;
    if !is_late || !policy.allow_late_submission || policy.late_penalty <= 0.0 {
        return unpenalized(is_late);
    }

    let days_late = ceil_days_between(policy.due_date, submitted_at).max(1);
    let penalty_percent = (policy.late_penalty * days_late as f64).min(100.0);
    let penalty_amount = original_grade * penalty_percent / 100.0;
    let final_grade = (((original_grade - penalty_amount) * 10.0).round() / 10.0).max(0.0);

    PenaltyOutcome {
        original_grade,
        final_grade,
        penalty_percent,
        penalty_amount,
        days_late,
        is_late,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn policy(late_penalty: f64, allow_late_submission: bool) -> PenaltyPolicy {
        PenaltyPolicy {
            due_date: Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap(),
            allow_late_submission,
            late_penalty,
        }
    }

    #[test]
    fn test_two_days_late() {
        let submitted = Utc.with_ymd_and_hms(2024, 1, 12, 0, 0, 0).unwrap();
        let outcome = calculate_penalty(80.0, Some(submitted), &policy(10.0, true));

        assert_eq!(outcome.days_late, 2);
        assert_eq!(outcome.penalty_percent, 20.0);
        assert_eq!(outcome.penalty_amount, 16.0);
        assert_eq!(outcome.final_grade, 64.0);
        assert!(outcome.is_late);
        assert!(outcome.applied());
    }

    #[test]
    fn test_on_time_is_not_penalized() {
        let submitted = Utc.with_ymd_and_hms(2024, 1, 9, 0, 0, 0).unwrap();
        let outcome = calculate_penalty(80.0, Some(submitted), &policy(10.0, true));

        assert_eq!(outcome.final_grade, 80.0);
        assert_eq!(outcome.days_late, 0);
        assert!(!outcome.is_late);

        let exactly_due = Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap();
        let outcome = calculate_penalty(80.0, Some(exactly_due), &policy(10.0, true));
        assert!(!outcome.is_late);
        assert_eq!(outcome.final_grade, 80.0);
    }

    #[test]
    fn test_partial_day_rounds_up() {
        let submitted = Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 1).unwrap();
        let outcome = calculate_penalty(90.0, Some(submitted), &policy(5.0, true));

        assert_eq!(outcome.days_late, 1);
        assert_eq!(outcome.final_grade, 85.5);
    }

    #[test]
    fn test_penalty_is_capped() {
        let submitted = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let outcome = calculate_penalty(75.0, Some(submitted), &policy(30.0, true));

        assert_eq!(outcome.penalty_percent, 100.0);
        assert_eq!(outcome.final_grade, 0.0);
        assert!(outcome.final_grade >= 0.0);
    }

    #[test]
    fn test_no_penalty_cases() {
        let submitted = Utc.with_ymd_and_hms(2024, 1, 12, 0, 0, 0).unwrap();

        let synthetic = calculate_penalty(50.0, None, &policy(10.0, true));
        assert_eq!(synthetic.final_grade, 50.0);
        assert!(!synthetic.is_late);

        let disallowed = calculate_penalty(50.0, Some(submitted), &policy(10.0, false));
        assert_eq!(disallowed.final_grade, 50.0);
        assert!(disallowed.is_late);
        assert!(!disallowed.applied());

        let zero_rate = calculate_penalty(50.0, Some(submitted), &policy(0.0, true));
        assert_eq!(zero_rate.final_grade, 50.0);
        assert_eq!(zero_rate.days_late, 0);
    }

    #[test]
    fn test_deterministic() {
        let submitted = Utc.with_ymd_and_hms(2024, 1, 13, 7, 30, 0).unwrap();
        let p = policy(7.5, true);
        assert_eq!(
            calculate_penalty(66.6, Some(submitted), &p),
            calculate_penalty(66.6, Some(submitted), &p)
        );
    }
}
