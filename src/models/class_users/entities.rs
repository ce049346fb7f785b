use serde::{Deserialize, Serialize};

use crate::models::users::entities::UserStatus;

// 班级内角色
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum ClassUserRole {
    Student,             // 学生
    ClassRepresentative, // 课代表
    Teacher,             // 教师
}

impl ClassUserRole {
    /// 是否需要提交作业
    pub fn is_submitter(&self) -> bool {
        matches!(
            self,
            ClassUserRole::Student | ClassUserRole::ClassRepresentative
        )
    }
}

impl<'de> Deserialize<'de> for ClassUserRole {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse::<ClassUserRole>().map_err(|_| {
            serde::de::Error::custom(format!(
                "无效的班级用户角色: '{s}'. 支持的角色: student, class_representative, teacher"
            ))
        })
    }
}

impl std::fmt::Display for ClassUserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClassUserRole::Student => write!(f, "student"),
            ClassUserRole::ClassRepresentative => write!(f, "class_representative"),
            ClassUserRole::Teacher => write!(f, "teacher"),
        }
    }
}

impl std::str::FromStr for ClassUserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(ClassUserRole::Student),
            "class_representative" => Ok(ClassUserRole::ClassRepresentative),
            "teacher" => Ok(ClassUserRole::Teacher),
            _ => Err(format!("Invalid class user role: {s}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassUser {
    pub id: i64,
    pub class_id: i64,
    pub user_id: i64,
    pub profile_name: Option<String>,
    pub role: ClassUserRole,
    pub updated_at: chrono::DateTime<chrono::Utc>,
    pub joined_at: chrono::DateTime<chrono::Utc>,
}

/// 花名册成员（班级成员 + 身份目录信息）
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RosterMember {
    pub user_id: i64,
    pub username: String,
    pub email: String,
    pub display_name: Option<String>,
    pub role: ClassUserRole,
    pub status: UserStatus,
}

impl RosterMember {
    /// 需要提交作业的活跃学生
    pub fn is_active_student(&self) -> bool {
        self.role.is_submitter() && self.status == UserStatus::Active
    }

    pub fn name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.username)
    }
}
