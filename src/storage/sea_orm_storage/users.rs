//! 身份目录镜像：只写入与按 ID 读取

use super::SeaOrmStorage;
use crate::entity::users::{ActiveModel, Entity as Users};
use crate::errors::Result;
use crate::models::users::{entities::User, requests::CreateUserRequest};
use sea_orm::{ActiveModelTrait, EntityTrait, Set};

impl SeaOrmStorage {
    pub async fn create_user_impl(&self, req: CreateUserRequest) -> Result<User> {
        let now = chrono::Utc::now().timestamp();

        ActiveModel {
            username: Set(req.username),
            email: Set(req.email),
            role: Set(req.role.to_string()),
            status: Set(req.status.to_string()),
            display_name: Set(req.display_name),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .map(User::from)
        .map_err(|e| super::write_error(e, "用户名已存在", "创建用户失败"))
    }

    pub async fn get_user_by_id_impl(&self, id: i64) -> Result<Option<User>> {
        let model = Users::find_by_id(id).one(&self.db).await?;
        Ok(model.map(User::from))
    }
}
