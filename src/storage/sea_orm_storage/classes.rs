use super::SeaOrmStorage;
use crate::entity::classes::{ActiveModel, Entity as Classes};
use crate::errors::Result;
use crate::models::classes::{entities::Class, requests::CreateClassRequest};
use sea_orm::{ActiveModelTrait, EntityTrait, Set};

impl SeaOrmStorage {
    pub async fn create_class_impl(&self, req: CreateClassRequest) -> Result<Class> {
        let now = chrono::Utc::now().timestamp();

        let model = ActiveModel {
            teacher_id: Set(req.teacher_id),
            class_name: Set(req.class_name),
            description: Set(req.description),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;

        Ok(model.into())
    }

    /// 班级教师用于评分与查看权限判断
    pub async fn get_class_by_id_impl(&self, class_id: i64) -> Result<Option<Class>> {
        Ok(Classes::find_by_id(class_id)
            .one(&self.db)
            .await?
            .map(Class::from))
    }
}
