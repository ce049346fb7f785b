//! SeaORM 存储实现
//!
//! 统一的数据库存储层，支持 SQLite、PostgreSQL 和 MySQL。

mod assignments;
mod auto_grade;
mod class_users;
mod classes;
mod grading;
mod notifications;
mod reminders;
mod submissions;
mod users;

use crate::config::AppConfig;
use crate::errors::{HWSystemError, Result};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr, SqlErr};
use std::time::Duration;
use tracing::info;

/// SeaORM 存储实现
#[derive(Clone)]
pub struct SeaOrmStorage {
    pub(crate) db: DatabaseConnection,
}

impl SeaOrmStorage {
    /// 创建新的 SeaORM 存储实例
    pub async fn new_async() -> Result<Self> {
        let config = AppConfig::get();
        let db_url = Self::build_database_url(&config.database.url)?;

        // 根据数据库类型选择连接方式
        let db = if db_url.starts_with("sqlite://") {
            Self::connect_sqlite(&db_url, config).await?
        } else {
            Self::connect_generic(&db_url, config).await?
        };

        // 运行迁移
        Migrator::up(&db, None)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("数据库迁移失败: {e}")))?;

        info!("SeaORM 存储初始化完成，数据库: {}", db_url);

        Ok(Self { db })
    }

    /// 内存 SQLite（单连接，供测试与本地演示）
    pub async fn connect_in_memory() -> Result<Self> {
        use sea_orm::SqlxSqliteConnector;
        use sea_orm::sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
        use std::str::FromStr;

        let opt = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| HWSystemError::database_config(format!("SQLite URL 解析失败: {e}")))?
            .foreign_keys(true);

        // 内存库随连接销毁，必须保持唯一连接常驻
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(opt)
            .await
            .map_err(|e| HWSystemError::database_connection(format!("SQLite 连接失败: {e}")))?;

        let db = SqlxSqliteConnector::from_sqlx_sqlite_pool(pool);
        Migrator::up(&db, None)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("数据库迁移失败: {e}")))?;

        Ok(Self { db })
    }

    /// SQLite 专用连接（WAL + pragma 优化）
    async fn connect_sqlite(url: &str, config: &AppConfig) -> Result<DatabaseConnection> {
        use sea_orm::SqlxSqliteConnector;
        use sea_orm::sqlx::sqlite::{
            SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
        };
        use std::str::FromStr;

        let opt = SqliteConnectOptions::from_str(url)
            .map_err(|e| HWSystemError::database_config(format!("SQLite URL 解析失败: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(5))
            .foreign_keys(true)
            .pragma("cache_size", "-64000")
            .pragma("temp_store", "memory")
            .pragma("mmap_size", "536870912")
            .pragma("wal_autocheckpoint", "1000");

        let pool = SqlitePoolOptions::new()
            .max_connections(config.database.pool_size)
            .min_connections(1)
            .test_before_acquire(true)
            .acquire_timeout(Duration::from_secs(config.database.timeout))
            .idle_timeout(Duration::from_secs(300))
            .connect_with(opt)
            .await
            .map_err(|e| HWSystemError::database_connection(format!("SQLite 连接失败: {e}")))?;

        Ok(SqlxSqliteConnector::from_sqlx_sqlite_pool(pool))
    }

    /// 通用连接（PostgreSQL、MySQL 等）
    async fn connect_generic(url: &str, config: &AppConfig) -> Result<DatabaseConnection> {
        let mut opt = ConnectOptions::new(url);
        opt.max_connections(config.database.pool_size)
            .min_connections(5)
            .connect_timeout(Duration::from_secs(config.database.timeout))
            .acquire_timeout(Duration::from_secs(config.database.timeout))
            .idle_timeout(Duration::from_secs(600))
            .max_lifetime(Duration::from_secs(1800))
            .sqlx_logging(false)
            .sqlx_logging_level(tracing::log::LevelFilter::Debug);

        Database::connect(opt)
            .await
            .map_err(|e| HWSystemError::database_connection(format!("无法连接到数据库: {e}")))
    }

    /// 从 URL 自动推断数据库类型并构建连接 URL
    fn build_database_url(url: &str) -> Result<String> {
        if url.starts_with("sqlite://") {
            Ok(url.to_string())
        } else if url.ends_with(".db") || url.ends_with(".sqlite") || url == ":memory:" {
            Ok(format!("sqlite://{}?mode=rwc", url))
        } else if url.starts_with("postgres://")
            || url.starts_with("postgresql://")
            || url.starts_with("mysql://")
            || url.starts_with("mariadb://")
        {
            Ok(url.to_string())
        } else {
            Err(HWSystemError::database_config(format!(
                "无法从 URL 推断数据库类型: {url}. 支持: sqlite://, postgres://, mysql://, 或 .db/.sqlite 文件路径"
            )))
        }
    }
}

/// 唯一约束冲突映射为 Conflict，其余为数据库操作错误
pub(crate) fn write_error(e: DbErr, conflict: &str, context: &str) -> HWSystemError {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => HWSystemError::conflict(conflict),
        _ => HWSystemError::database_operation(format!("{context}: {e}")),
    }
}

// Storage trait 实现
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
use crate::storage::{
    GradingRecord, NewSubmission, Resubmission, Storage, SyntheticGradeBatch, SyntheticGradeResult,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[async_trait]
impl Storage for SeaOrmStorage {
    // 用户模块
    async fn create_user(&self, user: CreateUserRequest) -> Result<User> {
        self.create_user_impl(user).await
    }

    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>> {
        self.get_user_by_id_impl(id).await
    }

    // 班级模块
    async fn create_class(&self, class: CreateClassRequest) -> Result<Class> {
        self.create_class_impl(class).await
    }

    async fn get_class_by_id(&self, class_id: i64) -> Result<Option<Class>> {
        self.get_class_by_id_impl(class_id).await
    }

    // 班级用户模块
    async fn join_class(
        &self,
        user_id: i64,
        class_id: i64,
        role: ClassUserRole,
    ) -> Result<ClassUser> {
        self.join_class_impl(user_id, class_id, role).await
    }

    async fn get_class_user_by_user_id_and_class_id(
        &self,
        user_id: i64,
        class_id: i64,
    ) -> Result<Option<ClassUser>> {
        self.get_class_user_by_user_id_and_class_id_impl(user_id, class_id)
            .await
    }

    async fn list_class_roster(&self, class_id: i64) -> Result<Vec<RosterMember>> {
        self.list_class_roster_impl(class_id).await
    }

    // 作业模块
    async fn create_assignment(
        &self,
        created_by: i64,
        req: CreateAssignmentRequest,
    ) -> Result<Assignment> {
        self.create_assignment_impl(created_by, req).await
    }

    async fn get_assignment_by_id(&self, assignment_id: i64) -> Result<Option<Assignment>> {
        self.get_assignment_by_id_impl(assignment_id).await
    }

    async fn update_assignment(
        &self,
        assignment_id: i64,
        update: UpdateAssignmentRequest,
    ) -> Result<Option<Assignment>> {
        self.update_assignment_impl(assignment_id, update).await
    }

    async fn publish_assignment(&self, assignment_id: i64) -> Result<Option<Assignment>> {
        self.publish_assignment_impl(assignment_id).await
    }

    async fn schedule_assignment(
        &self,
        assignment_id: i64,
        publish_at: DateTime<Utc>,
    ) -> Result<Option<Assignment>> {
        self.schedule_assignment_impl(assignment_id, publish_at)
            .await
    }

    async fn soft_delete_assignment(&self, assignment_id: i64, deleted_by: i64) -> Result<bool> {
        self.soft_delete_assignment_impl(assignment_id, deleted_by)
            .await
    }

    async fn publish_due_scheduled_assignments(&self, now: DateTime<Utc>) -> Result<Vec<i64>> {
        self.publish_due_scheduled_assignments_impl(now).await
    }

    async fn list_auto_grade_candidates(&self, now: DateTime<Utc>) -> Result<Vec<Assignment>> {
        self.list_auto_grade_candidates_impl(now).await
    }

    async fn list_reminder_candidates(&self, now: DateTime<Utc>) -> Result<Vec<Assignment>> {
        self.list_reminder_candidates_impl(now).await
    }

    async fn count_assignment_submissions(&self, assignment_id: i64) -> Result<SubmissionCounts> {
        self.count_assignment_submissions_impl(assignment_id).await
    }

    // 提交模块
    async fn create_submission(&self, submission: NewSubmission) -> Result<Submission> {
        self.create_submission_impl(submission).await
    }

    async fn resubmit(&self, resubmission: Resubmission) -> Result<Submission> {
        self.resubmit_impl(resubmission).await
    }

    async fn get_submission_by_id(&self, submission_id: i64) -> Result<Option<Submission>> {
        self.get_submission_by_id_impl(submission_id).await
    }

    async fn get_submission_by_assignment_and_student(
        &self,
        assignment_id: i64,
        student_id: i64,
    ) -> Result<Option<Submission>> {
        self.get_submission_by_assignment_and_student_impl(assignment_id, student_id)
            .await
    }

    async fn list_submissions_by_assignment(&self, assignment_id: i64) -> Result<Vec<Submission>> {
        self.list_submissions_by_assignment_impl(assignment_id)
            .await
    }

    async fn list_submitter_ids(&self, assignment_id: i64) -> Result<Vec<i64>> {
        self.list_submitter_ids_impl(assignment_id).await
    }

    // 评分历史模块
    async fn append_grading_entry(
        &self,
        record: GradingRecord,
    ) -> Result<(Submission, GradingHistoryEntry)> {
        self.append_grading_entry_impl(record).await
    }

    async fn list_grading_history(&self, submission_id: i64) -> Result<Vec<GradingHistoryEntry>> {
        self.list_grading_history_impl(submission_id).await
    }

    // 自动评分模块
    async fn apply_synthetic_grades(
        &self,
        batch: SyntheticGradeBatch,
    ) -> Result<SyntheticGradeResult> {
        self.apply_synthetic_grades_impl(batch).await
    }

    async fn list_auto_grade_history(
        &self,
        assignment_id: i64,
    ) -> Result<Vec<AutoGradeHistoryEntry>> {
        self.list_auto_grade_history_impl(assignment_id).await
    }

    // 缺交提醒模块
    async fn claim_reminder_slot(
        &self,
        assignment_id: i64,
        days_before_due: i32,
        now: DateTime<Utc>,
    ) -> Result<Option<i64>> {
        self.claim_reminder_slot_impl(assignment_id, days_before_due, now)
            .await
    }

    async fn record_reminder_result(
        &self,
        log_id: i64,
        sent_count: u32,
        failed_count: u32,
    ) -> Result<()> {
        self.record_reminder_result_impl(log_id, sent_count, failed_count)
            .await
    }

    // 通知模块
    async fn create_notification(&self, req: CreateNotificationRequest) -> Result<Notification> {
        self.create_notification_impl(req).await
    }

    async fn list_user_notifications(
        &self,
        user_id: i64,
        limit: u64,
    ) -> Result<Vec<Notification>> {
        self.list_user_notifications_impl(user_id, limit).await
    }
}
