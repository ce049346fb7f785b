//! 引擎测试夹具：内存 SQLite + 记录型通知器

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use super::{DomainEvent, GradingEngine, Notifier, StorageRosterResolver};
use crate::errors::{HWSystemError, Result};
use crate::models::assignments::entities::{
    Assignment, MissingSubmissionPolicy, SubmissionSettings, Visibility,
};
use crate::models::assignments::requests::CreateAssignmentRequest;
use crate::models::class_users::entities::ClassUserRole;
use crate::models::classes::{entities::Class, requests::CreateClassRequest};
use crate::models::grading::requests::GradeRequest;
use crate::models::notifications::entities::NotificationType;
use crate::models::users::entities::{User, UserRole, UserStatus};
use crate::models::users::requests::CreateUserRequest;
use crate::storage::Storage;
use crate::storage::sea_orm_storage::SeaOrmStorage;

#[derive(Default)]
pub(crate) struct RecordingNotifier {
    events: Mutex<Vec<DomainEvent>>,
    failing_recipients: Mutex<HashSet<i64>>,
}

impl RecordingNotifier {
    pub fn fail_for(&self, user_id: i64) {
        self.failing_recipients.lock().unwrap().insert(user_id);
    }

    pub fn events(&self) -> Vec<DomainEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, kind: NotificationType) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.notification_type() == kind)
            .count()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, event: DomainEvent) -> Result<()> {
        if self
            .failing_recipients
            .lock()
            .unwrap()
            .contains(&event.recipient_id())
        {
            return Err(HWSystemError::notification("smtp unavailable"));
        }
        self.events.lock().unwrap().push(event);
        Ok(())
    }
}

pub(crate) struct Fixture {
    pub engine: GradingEngine,
    pub storage: Arc<dyn Storage>,
    pub notifier: Arc<RecordingNotifier>,
    pub teacher: User,
    pub admin: User,
    pub class: Class,
}

impl Fixture {
    pub async fn new() -> Self {
        let storage: Arc<dyn Storage> =
            Arc::new(SeaOrmStorage::connect_in_memory().await.unwrap());
        let notifier = Arc::new(RecordingNotifier::default());
        let engine = GradingEngine::new(
            storage.clone(),
            Arc::new(StorageRosterResolver::new(storage.clone())),
            notifier.clone(),
        );

        let teacher = create_user(&storage, "teacher", UserRole::Teacher, UserStatus::Active).await;
        let admin = create_user(&storage, "admin", UserRole::Admin, UserStatus::Active).await;
        let class = storage
            .create_class(CreateClassRequest {
                class_name: "Literature 101".to_string(),
                description: None,
                teacher_id: teacher.id,
            })
            .await
            .unwrap();

        Self {
            engine,
            storage,
            notifier,
            teacher,
            admin,
            class,
        }
    }

    pub async fn user(&self, name: &str, status: UserStatus) -> User {
        create_user(&self.storage, name, UserRole::User, status).await
    }

    /// 加入班级的学生
    pub async fn student(&self, name: &str) -> User {
        self.member(name, ClassUserRole::Student, UserStatus::Active)
            .await
    }

    pub async fn member(&self, name: &str, role: ClassUserRole, status: UserStatus) -> User {
        let user = self.user(name, status).await;
        self.storage
            .join_class(user.id, self.class.id, role)
            .await
            .unwrap();
        user
    }

    /// 默认：已发布、满分 100、允许迟交每天扣 10%
    pub fn assignment_request(&self, due_date: DateTime<Utc>) -> CreateAssignmentRequest {
        CreateAssignmentRequest {
            class_id: self.class.id,
            title: "Essay".to_string(),
            description: None,
            due_date,
            total_points: 100.0,
            allow_late_submission: true,
            late_penalty: 10.0,
            max_late_days: 0,
            submission_settings: SubmissionSettings::default(),
            missing_submission_policy: MissingSubmissionPolicy::default(),
            rubric: None,
            visibility: Some(Visibility::Published),
            publish_at: None,
        }
    }

    pub async fn assignment(&self, req: CreateAssignmentRequest) -> Assignment {
        self.storage
            .create_assignment(self.teacher.id, req)
            .await
            .unwrap()
    }

    pub async fn assignment_due_in(&self, offset: Duration) -> Assignment {
        self.assignment(self.assignment_request(now() + offset))
            .await
    }
}

pub(crate) fn grade_request(grade: f64, allow_resubmit: bool) -> GradeRequest {
    GradeRequest {
        grade,
        feedback: "Clear argument, needs more sources.".to_string(),
        rubric_grades: Default::default(),
        annotations: vec![],
        allow_resubmit,
        hide_grade_from_student: false,
        grade_reason: None,
        change_type: None,
        expected_version: None,
    }
}

/// 秒级精度的当前时间，与落库精度一致
pub(crate) fn now() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(Utc::now().timestamp(), 0).unwrap()
}

async fn create_user(
    storage: &Arc<dyn Storage>,
    name: &str,
    role: UserRole,
    status: UserStatus,
) -> User {
    storage
        .create_user(CreateUserRequest {
            username: name.to_string(),
            email: format!("{name}@school.example"),
            role,
            status,
            display_name: None,
        })
        .await
        .unwrap()
}
