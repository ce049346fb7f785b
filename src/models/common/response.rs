use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::HWSystemError;
use crate::models::ErrorCode;

/// 统一的 API 响应信封，`code` 为 0 表示成功
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    pub timestamp: DateTime<Utc>,
}

impl<T> ApiResponse<T> {
    fn build(code: ErrorCode, data: Option<T>, message: impl Into<String>) -> Self {
        Self {
            code: code as i32,
            message: message.into(),
            data,
            timestamp: Utc::now(),
        }
    }

    pub fn success(data: T, message: impl Into<String>) -> Self {
        Self::build(ErrorCode::Success, Some(data), message)
    }

    /// 带结构化数据的失败响应（如字段违规列表）
    pub fn error(code: ErrorCode, data: T, message: impl Into<String>) -> Self {
        Self::build(code, Some(data), message)
    }

    pub fn is_success(&self) -> bool {
        self.code == ErrorCode::Success as i32
    }
}

impl ApiResponse<()> {
    pub fn success_empty(message: impl Into<String>) -> Self {
        Self::build(ErrorCode::Success, None, message)
    }

    pub fn error_empty(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::build(code, None, message)
    }

    pub fn from_error(err: &HWSystemError) -> Self {
        Self::build(ErrorCode::from(err), None, err.message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_error_keeps_message_and_code() {
        let resp = ApiResponse::from_error(&HWSystemError::policy_gate(
            "Assignment is not overdue yet",
        ));
        assert!(!resp.is_success());
        assert_eq!(resp.message, "Assignment is not overdue yet");
        assert_eq!(resp.code, ErrorCode::from(&HWSystemError::policy_gate("")) as i32);

        let json = serde_json::to_value(&resp).unwrap();
        assert!(json.get("data").is_none());
    }
}
