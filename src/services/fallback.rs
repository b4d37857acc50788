//! 兜底策略
//!
//! 依赖失败（网络、非 JSON、字段缺失）一律替换为同形状的兜底值并附带 `error` 说明；
//! 输入验证错误原样返回。

use serde::Serialize;
use std::future::Future;
use tracing::warn;

use crate::error::Result;

/// 生成结果，`error` 非空表示使用了兜底值
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Generated<T> {
    pub value: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> Generated<T> {
    pub fn fresh(value: T) -> Self {
        Self { value, error: None }
    }

    pub fn fallback(value: T, error: impl Into<String>) -> Self {
        Self {
            value,
            error: Some(error.into()),
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.error.is_some()
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Generated<U> {
        Generated {
            value: f(self.value),
            error: self.error,
        }
    }
}

/// 执行 `operation`，依赖错误时改用 `fallback()`
pub async fn with_fallback<T, Fut, F>(operation: Fut, fallback: F) -> Result<Generated<T>>
where
    Fut: Future<Output = Result<T>>,
    F: FnOnce() -> T,
{
    match operation.await {
        Ok(value) => Ok(Generated::fresh(value)),
        Err(e) if e.is_validation() => Err(e),
        Err(e) => {
            warn!("Dependency call failed, serving fallback: {}", e);
            Ok(Generated::fallback(fallback(), e.to_string()))
        }
    }
}
