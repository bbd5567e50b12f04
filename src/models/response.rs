use crate::error::AppError;
use chrono::Utc;
use serde::Serialize;

/// 统一响应信封，成功和失败共用
#[derive(Debug, Serialize)]
pub struct ApiResponse<T>
where
    T: Serialize,
{
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiErrorBody>,
}

/// 失败时的错误体
#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    /// 稳定的机器可读错误类型，例如 "INVALID_INPUT"
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub message: String,
    pub timestamp: String,
}

impl<T> ApiResponse<T>
where
    T: Serialize,
{
    pub fn success(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(err: &AppError) -> Self {
        Self {
            success: false,
            message: None,
            data: None,
            error: Some(ApiErrorBody {
                kind: err.code(),
                message: err.to_string(),
                timestamp: Utc::now().to_rfc3339(),
            }),
        }
    }
}

impl<T> From<Result<T, AppError>> for ApiResponse<T>
where
    T: Serialize,
{
    fn from(result: Result<T, AppError>) -> Self {
        match result {
            Ok(data) => Self::success(data, "Success"),
            Err(err) => Self::failure(&err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_envelope_carries_stable_type() {
        let response: ApiResponse<()> =
            ApiResponse::failure(&AppError::invalid_input("Text content is required"));
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["success"], false);
        assert_eq!(value["error"]["type"], "INVALID_INPUT");
        assert!(value.get("data").is_none());
    }

    #[test]
    fn test_success_envelope() {
        let response = ApiResponse::from(Ok::<_, AppError>(42));
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["success"], true);
        assert_eq!(value["data"], 42);
    }
}
