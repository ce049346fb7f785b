//! 作业字段校验与受限字段规则表

use std::collections::HashSet;

use crate::models::assignments::{
    entities::{Assignment, MissingSubmissionPolicy, RubricCriterion, SubmissionCounts},
    requests::UpdateAssignmentRequest,
    responses::FieldViolation,
};
use crate::utils::validate::validate_title;

/// 作业设置的合并视图（创建请求或“当前值 + 更新”）
pub struct AssignmentSettings<'a> {
    pub title: &'a str,
    pub total_points: f64,
    pub late_penalty: f64,
    pub max_late_days: i32,
    pub missing_submission_policy: &'a MissingSubmissionPolicy,
    pub rubric: Option<&'a [RubricCriterion]>,
}

impl<'a> AssignmentSettings<'a> {
    /// 当前作业叠加更新后的设置
    pub fn merged(current: &'a Assignment, update: &'a UpdateAssignmentRequest) -> Self {
        Self {
            title: update.title.as_deref().unwrap_or(&current.title),
            total_points: update.total_points.unwrap_or(current.total_points),
            late_penalty: update.late_penalty.unwrap_or(current.late_penalty),
            max_late_days: update.max_late_days.unwrap_or(current.max_late_days),
            missing_submission_policy: update
                .missing_submission_policy
                .as_ref()
                .unwrap_or(&current.missing_submission_policy),
            rubric: update
                .rubric
                .as_deref()
                .or(current.rubric.as_deref()),
        }
    }
}

/// 字段取值校验
pub fn validate_settings(settings: &AssignmentSettings<'_>) -> Vec<FieldViolation> {
    let mut violations = Vec::new();

    if let Err(msg) = validate_title(settings.title) {
        violations.push(FieldViolation::new("title", msg));
    }
    if !settings.total_points.is_finite() || settings.total_points <= 0.0 {
        violations.push(FieldViolation::new(
            "total_points",
            "Total points must be a positive number",
        ));
    }
    if !settings.late_penalty.is_finite() || !(0.0..=100.0).contains(&settings.late_penalty) {
        violations.push(FieldViolation::new(
            "late_penalty",
            "Late penalty must be between 0 and 100 percent per day",
        ));
    }
    if settings.max_late_days < 0 {
        violations.push(FieldViolation::new(
            "max_late_days",
            "Max late days must not be negative",
        ));
    }

    let policy = settings.missing_submission_policy;
    if !policy.auto_grade_value.is_finite()
        || policy.auto_grade_value < 0.0
        || policy.auto_grade_value > settings.total_points
    {
        violations.push(FieldViolation::new(
            "missing_submission_policy.auto_grade_value",
            "Auto grade value must be between 0 and total points",
        ));
    }
    if policy.days_after_due_for_auto_grade < 0 {
        violations.push(FieldViolation::new(
            "missing_submission_policy.days_after_due_for_auto_grade",
            "Days after due must not be negative",
        ));
    }

    let mut offsets = HashSet::new();
    if policy
        .reminder_days_before_due
        .iter()
        .any(|offset| *offset <= 0 || !offsets.insert(*offset))
    {
        violations.push(FieldViolation::new(
            "missing_submission_policy.reminder_days_before_due",
            "Reminder offsets must be distinct positive day counts",
        ));
    }

    if let Some(rubric) = settings.rubric {
        let mut seen = HashSet::new();
        for criterion in rubric {
            if criterion.id.trim().is_empty() {
                violations.push(FieldViolation::new(
                    "rubric",
                    "Rubric criterion id must not be empty",
                ));
            } else if !seen.insert(criterion.id.as_str()) {
                violations.push(FieldViolation::new(
                    "rubric",
                    format!("Duplicate rubric criterion id '{}'", criterion.id),
                ));
            }
            if !criterion.max_points.is_finite() || criterion.max_points <= 0.0 {
                violations.push(FieldViolation::new(
                    "rubric",
                    format!(
                        "Rubric criterion '{}' must have positive max points",
                        criterion.id
                    ),
                ));
            }
        }
    }

    violations
}

struct RestrictedField {
    field: &'static str,
    check: fn(&Assignment, &UpdateAssignmentRequest, &SubmissionCounts) -> Option<&'static str>,
}

const RESTRICTED_FIELDS: &[RestrictedField] = &[
    RestrictedField {
        field: "due_date",
        check: |current, update, counts| match update.due_date {
            Some(due)
                if current.is_published() && counts.submitted > 0 && due < current.due_date =>
            {
                Some("Due date cannot be moved earlier after students have submitted")
            }
            _ => None,
        },
    },
    RestrictedField {
        field: "total_points",
        check: |current, update, counts| match update.total_points {
            Some(points) if counts.graded > 0 && points < current.total_points => {
                Some("Total points cannot be decreased after submissions have been graded")
            }
            _ => None,
        },
    },
    RestrictedField {
        field: "submission_settings.type",
        check: |current, update, counts| match &update.submission_settings {
            Some(settings)
                if counts.submitted > 0
                    && settings.submission_type != current.submission_settings.submission_type =>
            {
                Some("Submission type cannot be changed after students have submitted")
            }
            _ => None,
        },
    },
];

/// 按规则表逐条检查，一次返回全部违规项
pub fn check_restricted_fields(
    current: &Assignment,
    update: &UpdateAssignmentRequest,
    counts: &SubmissionCounts,
) -> Vec<FieldViolation> {
    RESTRICTED_FIELDS
        .iter()
        .filter_map(|rule| {
            (rule.check)(current, update, counts).map(|msg| FieldViolation::new(rule.field, msg))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::assignments::entities::{
        SubmissionSettings, SubmissionType, Visibility,
    };
    use chrono::{Duration, Utc};

    fn assignment() -> Assignment {
        let now = Utc::now();
        Assignment {
            id: 1,
            class_id: 1,
            created_by: 1,
            title: "Essay".to_string(),
            description: None,
            due_date: now + Duration::days(7),
            total_points: 100.0,
            allow_late_submission: true,
            late_penalty: 10.0,
            max_late_days: 0,
            submission_settings: SubmissionSettings::default(),
            missing_submission_policy: MissingSubmissionPolicy::default(),
            rubric: None,
            visibility: Visibility::Published,
            publish_at: None,
            is_active: true,
            is_deleted: false,
            deleted_at: None,
            deleted_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_restricted_fields_all_reported() {
        let current = assignment();
        let update = UpdateAssignmentRequest {
            due_date: Some(current.due_date - Duration::days(1)),
            total_points: Some(50.0),
            submission_settings: Some(SubmissionSettings {
                submission_type: SubmissionType::Text,
                ..Default::default()
            }),
            ..Default::default()
        };
        let counts = SubmissionCounts {
            submitted: 3,
            graded: 1,
        };

        let violations = check_restricted_fields(&current, &update, &counts);
        let fields: Vec<&str> = violations.iter().map(|v| v.field.as_str()).collect();
        assert_eq!(
            fields,
            vec!["due_date", "total_points", "submission_settings.type"]
        );
    }

    #[test]
    fn test_restricted_fields_allow_safe_changes() {
        let current = assignment();
        let update = UpdateAssignmentRequest {
            due_date: Some(current.due_date + Duration::days(1)),
            total_points: Some(120.0),
            ..Default::default()
        };
        let counts = SubmissionCounts {
            submitted: 3,
            graded: 3,
        };
        assert!(check_restricted_fields(&current, &update, &counts).is_empty());

        // 草稿或无提交时可自由修改
        let shrink = UpdateAssignmentRequest {
            due_date: Some(current.due_date - Duration::days(3)),
            total_points: Some(10.0),
            ..Default::default()
        };
        assert!(
            check_restricted_fields(&current, &shrink, &SubmissionCounts::default()).is_empty()
        );
    }

    #[test]
    fn test_validate_settings() {
        let current = assignment();
        let update = UpdateAssignmentRequest {
            late_penalty: Some(150.0),
            missing_submission_policy: Some(MissingSubmissionPolicy {
                auto_grade_value: 200.0,
                ..Default::default()
            }),
            rubric: Some(vec![
                RubricCriterion {
                    id: "a".to_string(),
                    title: "Clarity".to_string(),
                    max_points: 10.0,
                },
                RubricCriterion {
                    id: "a".to_string(),
                    title: "Depth".to_string(),
                    max_points: 0.0,
                },
            ]),
            ..Default::default()
        };

        let violations = validate_settings(&AssignmentSettings::merged(&current, &update));
        let fields: Vec<&str> = violations.iter().map(|v| v.field.as_str()).collect();
        assert!(fields.contains(&"late_penalty"));
        assert!(fields.contains(&"missing_submission_policy.auto_grade_value"));
        assert_eq!(fields.iter().filter(|f| **f == "rubric").count(), 2);
    }

    #[test]
    fn test_reminder_offsets_must_be_distinct_and_positive() {
        let current = assignment();
        let with_offsets = |offsets: Vec<i32>| UpdateAssignmentRequest {
            missing_submission_policy: Some(MissingSubmissionPolicy {
                reminder_days_before_due: offsets,
                ..Default::default()
            }),
            ..Default::default()
        };
        let field = "missing_submission_policy.reminder_days_before_due";

        for bad in [vec![3, 0], vec![-1], vec![3, 1, 3]] {
            let violations =
                validate_settings(&AssignmentSettings::merged(&current, &with_offsets(bad)));
            assert!(violations.iter().any(|v| v.field == field));
        }

        let ok = validate_settings(&AssignmentSettings::merged(
            &current,
            &with_offsets(vec![7, 3, 1]),
        ));
        assert!(ok.iter().all(|v| v.field != field));
    }
}
