//! 评分生命周期引擎
//!
//! 提交、迟交扣分、评分历史、缺交自动评分与缺交提醒的业务规则都在这里，
//! 不依赖 HTTP 层；定时任务与 HTTP 处理函数共用同一个 [`GradingEngine`]。

pub mod assignment;
pub mod auto_grade;
pub mod grade;
pub mod notifier;
pub mod penalty;
pub mod policy;
pub mod reminders;
pub mod roster;
pub mod submit;
pub mod views;

use std::sync::Arc;

use tracing::warn;

use crate::errors::{HWSystemError, Result};
use crate::models::assignments::entities::Assignment;
use crate::models::class_users::entities::ClassUserRole;
use crate::models::users::entities::User;
use crate::storage::Storage;

pub use assignment::AssignmentUpdate;
pub use notifier::{DomainEvent, Notifier, StorageNotifier};
pub use penalty::calculate_penalty;
pub use roster::{CachedRosterResolver, RosterResolver, StorageRosterResolver};

pub struct GradingEngine {
    storage: Arc<dyn Storage>,
    roster: Arc<dyn RosterResolver>,
    notifier: Arc<dyn Notifier>,
}

impl GradingEngine {
    pub fn new(
        storage: Arc<dyn Storage>,
        roster: Arc<dyn RosterResolver>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            storage,
            roster,
            notifier,
        }
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    /// 读取未删除的作业
    pub(crate) async fn load_assignment(&self, assignment_id: i64) -> Result<Assignment> {
        match self.storage.get_assignment_by_id(assignment_id).await? {
            Some(assignment) if !assignment.is_deleted => Ok(assignment),
            _ => Err(HWSystemError::not_found("Assignment not found")),
        }
    }

    /// 班级所有者、班级内教师或平台管理员
    pub(crate) async fn is_class_teacher(&self, actor: &User, class_id: i64) -> Result<bool> {
        if actor.is_admin() {
            return Ok(true);
        }

        let class = self
            .storage
            .get_class_by_id(class_id)
            .await?
            .ok_or_else(|| HWSystemError::not_found("Class not found"))?;
        if class.teacher_id == actor.id {
            return Ok(true);
        }

        Ok(self
            .storage
            .get_class_user_by_user_id_and_class_id(actor.id, class_id)
            .await?
            .is_some_and(|member| member.role == ClassUserRole::Teacher))
    }

    pub(crate) async fn ensure_class_teacher(&self, actor: &User, class_id: i64) -> Result<()> {
        if self.is_class_teacher(actor, class_id).await? {
            Ok(())
        } else {
            Err(HWSystemError::authorization(
                "Only the class teacher or an administrator can perform this action",
            ))
        }
    }

    /// 通知失败只记录日志
    pub(crate) async fn notify_quietly(&self, event: DomainEvent) -> bool {
        let recipient = event.recipient_id();
        let kind = event.notification_type();
        match self.notifier.notify(event).await {
            Ok(()) => true,
            Err(err) => {
                warn!(
                    error = %err,
                    recipient,
                    "Failed to deliver {} notification",
                    kind
                );
                false
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support;
