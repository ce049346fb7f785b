use super::entities::{UserRole, UserStatus};
use serde::Deserialize;

// 同步身份目录中的用户
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
    pub role: UserRole,
    pub status: UserStatus,
    pub display_name: Option<String>,
}
