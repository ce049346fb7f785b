//! 班级用户关联存储操作

use super::SeaOrmStorage;
use crate::entity::class_users::{ActiveModel, Column, Entity as ClassUsers};
use crate::entity::users::Entity as Users;
use crate::errors::{HWSystemError, Result};
use crate::models::class_users::entities::{ClassUser, ClassUserRole, RosterMember};
use sea_orm::{ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, Set};

impl SeaOrmStorage {
    /// 加入班级
    pub async fn join_class_impl(
        &self,
        user_id: i64,
        class_id: i64,
        role: ClassUserRole,
    ) -> Result<ClassUser> {
        let now = chrono::Utc::now().timestamp();

        let model = ActiveModel {
            class_id: Set(class_id),
            user_id: Set(user_id),
            role: Set(role.to_string()),
            updated_at: Set(now),
            joined_at: Set(now),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| super::write_error(e, "用户已在该班级中", "加入班级失败"))?;

        Ok(result.into_class_user())
    }

    /// 获取用户在班级中的信息
    pub async fn get_class_user_by_user_id_and_class_id_impl(
        &self,
        user_id: i64,
        class_id: i64,
    ) -> Result<Option<ClassUser>> {
        let result = ClassUsers::find()
            .filter(
                Condition::all()
                    .add(Column::UserId.eq(user_id))
                    .add(Column::ClassId.eq(class_id)),
            )
            .one(&self.db)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("查询班级用户失败: {e}")))?;

        Ok(result.map(|m| m.into_class_user()))
    }

    /// 班级花名册，按加入时间排序
    pub async fn list_class_roster_impl(&self, class_id: i64) -> Result<Vec<RosterMember>> {
        let rows = ClassUsers::find()
            .filter(Column::ClassId.eq(class_id))
            .order_by_asc(Column::JoinedAt)
            .order_by_asc(Column::Id)
            .find_also_related(Users)
            .all(&self.db)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("查询班级花名册失败: {e}")))?;

        Ok(rows
            .into_iter()
            .filter_map(|(member, user)| user.map(|u| member.into_roster_member(u)))
            .collect())
    }
}
