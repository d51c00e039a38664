//! 模型调用抽象
//!
//! 策略层只依赖 `ChatModel`，不关心背后是真实的 HTTP 客户端还是测试替身

use crate::error::ModelErrorKind;
use async_trait::async_trait;
use std::time::Duration;

/// 一次远程调用的结果，创建后不再修改
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelCallResult {
    pub ok: bool,
    pub text: Option<String>,
    pub error_kind: Option<ModelErrorKind>,
    pub status_code: Option<u16>,
    /// 错误详情（HTTP 错误时为响应体）
    pub error: Option<String>,
}

impl ModelCallResult {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            ok: true,
            text: Some(text.into()),
            error_kind: None,
            status_code: None,
            error: None,
        }
    }

    pub fn failure(kind: ModelErrorKind, status_code: Option<u16>, error: impl Into<String>) -> Self {
        Self {
            ok: false,
            text: None,
            error_kind: Some(kind),
            status_code,
            error: Some(error.into()),
        }
    }

    /// 面向日志和错误记录的描述
    pub fn error_summary(&self) -> String {
        let detail = self.error.as_deref().unwrap_or("unknown error");
        match (self.error_kind, self.status_code) {
            (Some(ModelErrorKind::Http) | None, Some(status)) => format!("HTTP {}: {}", status, detail),
            (Some(kind), _) => format!("{} error: {}", kind, detail),
            (None, None) => detail.to_string(),
        }
    }
}

/// 单轮对话能力（system + user）
///
/// 实现方不得重试，也不得返回 panic；所有失败都体现在 `ModelCallResult` 中
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn call(
        &self,
        prompt: &str,
        system_prompt: &str,
        temperature: f32,
        timeout: Duration,
    ) -> ModelCallResult;
}
