//! 业务数据模型
//!
//! 与 `entity` 中的数据库实体分离，供服务层与 API 层使用。

pub mod assignments;
pub mod class_users;
pub mod classes;
pub mod common;
pub mod grading;
pub mod notifications;
pub mod submissions;
pub mod users;

pub use common::ApiResponse;

use crate::errors::HWSystemError;

/// 程序启动时间
#[derive(Debug, Clone)]
pub struct AppStartTime {
    pub start_datetime: chrono::DateTime<chrono::Utc>,
}

/// API 响应中的业务错误码
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ErrorCode {
    Success = 0,

    // 通用错误 1xxx
    BadRequest = 1000,
    ValidationFailed = 1001,
    Unauthorized = 1002,
    Forbidden = 1003,
    NotFound = 1004,
    Conflict = 1005,
    InternalServerError = 1006,
    RateLimitExceeded = 1007,

    // 作业 3xxx
    AssignmentNotFound = 3001,
    RestrictedFieldUpdate = 3002,

    // 提交与评分 4xxx
    SubmissionNotFound = 4001,
    SubmissionConflict = 4002,
    GradeInvalid = 4003,
    AutoGradeNotEligible = 4004,
}

impl From<&HWSystemError> for ErrorCode {
    fn from(err: &HWSystemError) -> Self {
        match err {
            HWSystemError::Validation(_) => ErrorCode::ValidationFailed,
            HWSystemError::Authentication(_) => ErrorCode::Unauthorized,
            HWSystemError::Authorization(_) => ErrorCode::Forbidden,
            HWSystemError::NotFound(_) => ErrorCode::NotFound,
            HWSystemError::Conflict(_) => ErrorCode::Conflict,
            HWSystemError::PolicyGate(_) => ErrorCode::AutoGradeNotEligible,
            _ => ErrorCode::InternalServerError,
        }
    }
}
