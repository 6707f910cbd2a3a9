use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::{AppError, LlmError};

/// 成功
pub const CODE_OK: i32 = 0;
/// 输入参数不合法
pub const CODE_INVALID_INPUT: i32 = 400;
/// 处理超时
pub const CODE_TIMEOUT: i32 = 504;
/// LLM 服务不可用
pub const CODE_GENERATOR_UNAVAILABLE: i32 = 503;
/// 其他内部错误
pub const CODE_INTERNAL: i32 = 500;

/// 标准响应
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardResponse {
    /// 0表示成功，非0表示错误码
    pub code: i32,
    /// 状态说明
    pub message: String,
    #[serde(default)]
    pub data: Option<JsonValue>,
}

impl StandardResponse {
    pub fn success(message: impl Into<String>, data: JsonValue) -> Self {
        Self {
            code: CODE_OK,
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn failure(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn timeout(timeout_secs: u64) -> Self {
        Self::failure(CODE_TIMEOUT, format!("处理超时 ({} 秒)", timeout_secs))
    }

    pub fn is_success(&self) -> bool {
        self.code == CODE_OK
    }
}

impl From<&AppError> for StandardResponse {
    fn from(err: &AppError) -> Self {
        let code = match err {
            AppError::InvalidInput(_) | AppError::Llm(LlmError::EmptyPrompt) => CODE_INVALID_INPUT,
            AppError::Llm(_) => CODE_GENERATOR_UNAVAILABLE,
            _ => CODE_INTERNAL,
        };
        Self::failure(code, err.to_string())
    }
}
