use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::models::{
    assignments::{
        entities::{Assignment, SubmissionCounts},
        requests::{CreateAssignmentRequest, UpdateAssignmentRequest},
    },
    class_users::entities::{ClassUser, ClassUserRole, RosterMember},
    classes::{entities::Class, requests::CreateClassRequest},
    grading::entities::{AutoGradeHistoryEntry, GradingHistoryEntry},
    notifications::{entities::Notification, requests::CreateNotificationRequest},
    submissions::entities::Submission,
    users::{entities::User, requests::CreateUserRequest},
};

use crate::errors::Result;

pub mod records;
pub mod sea_orm_storage;

pub use records::*;

#[async_trait::async_trait]
pub trait Storage: Send + Sync {
    /// 用户管理方法（身份目录镜像）
    // 创建用户
    async fn create_user(&self, user: CreateUserRequest) -> Result<User>;
    // 通过ID获取用户信息
    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>>;

    /// 班级管理方法
    // 创建班级
    async fn create_class(&self, class: CreateClassRequest) -> Result<Class>;
    // 通过ID获取班级信息
    async fn get_class_by_id(&self, class_id: i64) -> Result<Option<Class>>;

    /// 班级成员方法
    // 加入班级并指定角色
    async fn join_class(
        &self,
        user_id: i64,
        class_id: i64,
        role: ClassUserRole,
    ) -> Result<ClassUser>;
    // 获取用户在班级中的信息
    async fn get_class_user_by_user_id_and_class_id(
        &self,
        user_id: i64,
        class_id: i64,
    ) -> Result<Option<ClassUser>>;
    // 班级花名册（成员 + 用户信息）
    async fn list_class_roster(&self, class_id: i64) -> Result<Vec<RosterMember>>;

    /// 作业管理方法
    async fn create_assignment(
        &self,
        created_by: i64,
        req: CreateAssignmentRequest,
    ) -> Result<Assignment>;
    async fn get_assignment_by_id(&self, assignment_id: i64) -> Result<Option<Assignment>>;
    async fn update_assignment(
        &self,
        assignment_id: i64,
        update: UpdateAssignmentRequest,
    ) -> Result<Option<Assignment>>;
    async fn publish_assignment(&self, assignment_id: i64) -> Result<Option<Assignment>>;
    async fn schedule_assignment(
        &self,
        assignment_id: i64,
        publish_at: DateTime<Utc>,
    ) -> Result<Option<Assignment>>;
    async fn soft_delete_assignment(&self, assignment_id: i64, deleted_by: i64) -> Result<bool>;
    // 发布到期的定时作业，返回被发布的作业 ID
    async fn publish_due_scheduled_assignments(&self, now: DateTime<Utc>) -> Result<Vec<i64>>;
    // 开启自动评分且已过截止时间的已发布作业
    async fn list_auto_grade_candidates(&self, now: DateTime<Utc>) -> Result<Vec<Assignment>>;
    // 开启缺交提醒且尚未截止的已发布作业
    async fn list_reminder_candidates(&self, now: DateTime<Utc>) -> Result<Vec<Assignment>>;
    async fn count_assignment_submissions(&self, assignment_id: i64) -> Result<SubmissionCounts>;

    /// 提交方法
    // 首次提交，(assignment_id, student_id) 重复时返回 Conflict
    async fn create_submission(&self, submission: NewSubmission) -> Result<Submission>;
    // 重新提交，版本号不符或未开放重交时返回 Conflict
    async fn resubmit(&self, resubmission: Resubmission) -> Result<Submission>;
    async fn get_submission_by_id(&self, submission_id: i64) -> Result<Option<Submission>>;
    async fn get_submission_by_assignment_and_student(
        &self,
        assignment_id: i64,
        student_id: i64,
    ) -> Result<Option<Submission>>;
    async fn list_submissions_by_assignment(&self, assignment_id: i64) -> Result<Vec<Submission>>;
    // 有提交记录（含系统生成）的学生
    async fn list_submitter_ids(&self, assignment_id: i64) -> Result<Vec<i64>>;

    /// 评分历史方法
    // 原子追加评分：版本检查、更新镜像字段、切换 latest、插入历史
    async fn append_grading_entry(
        &self,
        record: GradingRecord,
    ) -> Result<(Submission, GradingHistoryEntry)>;
    async fn list_grading_history(&self, submission_id: i64) -> Result<Vec<GradingHistoryEntry>>;

    /// 自动评分方法
    async fn apply_synthetic_grades(
        &self,
        batch: SyntheticGradeBatch,
    ) -> Result<SyntheticGradeResult>;
    async fn list_auto_grade_history(
        &self,
        assignment_id: i64,
    ) -> Result<Vec<AutoGradeHistoryEntry>>;

    /// 缺交提醒方法
    // 占用 (作业, 提前天数) 提醒槽位，已被占用时返回 None
    async fn claim_reminder_slot(
        &self,
        assignment_id: i64,
        days_before_due: i32,
        now: DateTime<Utc>,
    ) -> Result<Option<i64>>;
    async fn record_reminder_result(
        &self,
        log_id: i64,
        sent_count: u32,
        failed_count: u32,
    ) -> Result<()>;

    /// 站内通知方法
    async fn create_notification(&self, req: CreateNotificationRequest) -> Result<Notification>;
    async fn list_user_notifications(&self, user_id: i64, limit: u64)
    -> Result<Vec<Notification>>;
}

pub async fn create_storage() -> Result<Arc<dyn Storage>> {
    let storage = sea_orm_storage::SeaOrmStorage::new_async().await?;
    Ok(Arc::new(storage))
}
