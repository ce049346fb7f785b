//! 缺交提醒发送记录存储操作

use super::SeaOrmStorage;
use crate::entity::reminder_logs::{ActiveModel, Column, Entity as ReminderLogs};
use crate::errors::{HWSystemError, Result};
use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set, SqlErr};

impl SeaOrmStorage {
    /// 占用提醒槽位，唯一索引 (assignment_id, days_before_due) 保证每档只发一次
    pub async fn claim_reminder_slot_impl(
        &self,
        assignment_id: i64,
        days_before_due: i32,
        now: DateTime<Utc>,
    ) -> Result<Option<i64>> {
        let model = ActiveModel {
            assignment_id: Set(assignment_id),
            days_before_due: Set(days_before_due),
            sent_at: Set(now.timestamp()),
            sent_count: Set(0),
            failed_count: Set(0),
            ..Default::default()
        };

        match model.insert(&self.db).await {
            Ok(log) => Ok(Some(log.id)),
            Err(e) => match e.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => Ok(None),
                _ => Err(HWSystemError::database_operation(format!(
                    "写入提醒记录失败: {e}"
                ))),
            },
        }
    }

    /// 记录发送结果
    pub async fn record_reminder_result_impl(
        &self,
        log_id: i64,
        sent_count: u32,
        failed_count: u32,
    ) -> Result<()> {
        ReminderLogs::update_many()
            .col_expr(
                Column::SentCount,
                sea_orm::sea_query::Expr::value(sent_count as i32),
            )
            .col_expr(
                Column::FailedCount,
                sea_orm::sea_query::Expr::value(failed_count as i32),
            )
            .filter(Column::Id.eq(log_id))
            .exec(&self.db)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("更新提醒记录失败: {e}")))?;

        Ok(())
    }
}
