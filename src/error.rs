//! 错误处理模块
//!
//! 定义应用程序的错误类型和错误处理逻辑。

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 应用程序错误类型
#[derive(Error, Debug)]
pub enum AppError {
    /// 参数验证错误（缺少图像、名字等）
    #[error("{0}")]
    Validation(String),

    /// 素材缺失
    #[error("Failed to generate cat image: {0}")]
    AssetMissing(String),

    /// 外部模型调用错误
    #[error("Upstream model error: {0}")]
    Upstream(String),

    /// 配置错误
    #[error("Configuration error: {0}")]
    Config(String),

    /// 序列化错误
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// 图像编解码错误
    #[error("Image error: {0}")]
    Image(String),

    /// 内部错误
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO 错误
    #[error("IO error: {0}")]
    Io(String),
}

impl AppError {
    /// 是否属于输入验证错误（不应被降级为兜底数据）
    pub fn is_validation(&self) -> bool {
        matches!(self, AppError::Validation(_))
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::Serialization(e.to_string())
    }
}

impl From<figment::Error> for AppError {
    fn from(e: figment::Error) -> Self {
        AppError::Config(e.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        AppError::Upstream(e.to_string())
    }
}

impl From<image::ImageError> for AppError {
    fn from(e: image::ImageError) -> Self {
        AppError::Image(e.to_string())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(format!("Invalid request body: {}", rejection.body_text()))
    }
}

/// Axum response implementation for AppError
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = (&self).into();
        let body = match &self {
            AppError::Validation(message) => ErrorResponse::new(&code, message),
            AppError::AssetMissing(detail) => {
                ErrorResponse::new(&code, "Failed to generate cat image").with_message(detail)
            }
            _ => ErrorResponse::new(&code, "An error occurred").with_message(&self.to_string()),
        };
        (
            StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            Json(body),
        )
            .into_response()
    }
}

/// 错误响应
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// 错误描述（客户端以该字段作为失败信号）
    pub error: String,
    /// 错误代码
    pub code: String,
    /// 详细信息
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ErrorResponse {
    /// 创建新错误响应
    pub fn new(code: &str, error: &str) -> Self {
        Self {
            error: error.to_string(),
            code: code.to_string(),
            message: None,
        }
    }

    /// 添加详细信息
    pub fn with_message(mut self, message: &str) -> Self {
        self.message = Some(message.to_string());
        self
    }
}

/// HTTP 状态码映射
impl From<&AppError> for (u16, String) {
    fn from(err: &AppError) -> (u16, String) {
        match err {
            AppError::Validation(_) => (400, "BAD_REQUEST".to_string()),
            AppError::AssetMissing(_) => (500, "ASSET_MISSING".to_string()),
            AppError::Upstream(_) => (500, "UPSTREAM_ERROR".to_string()),
            AppError::Image(_) => (500, "IMAGE_ERROR".to_string()),
            _ => (500, "INTERNAL_ERROR".to_string()),
        }
    }
}

/// 结果类型别名
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[test]
    fn test_status_mapping() {
        let (status, code) = (&AppError::Validation("No name provided".into())).into();
        assert_eq!(status, 400);
        assert_eq!(code, "BAD_REQUEST");

        let (status, code) = (&AppError::AssetMissing("eyes".into())).into();
        assert_eq!(status, 500);
        assert_eq!(code, "ASSET_MISSING");
    }

    #[tokio::test]
    async fn test_validation_body_carries_error_field() {
        let response = AppError::Validation("No image data provided".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "No image data provided");
        assert!(json.get("message").is_none());
    }
}
