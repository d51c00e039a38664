//! LLM API 客户端 - 基础设施层
//!
//! 向 OpenAI 兼容的 `/chat/completions` 端点发送单轮对话请求，
//! 并把所有结果（成功、HTTP 错误、传输错误）统一为 `ModelCallResult`。
//!
//! 请求体使用 `async-openai` 的类型构建，直接由 `reqwest` 发送，不做自动重试。

use crate::clients::chat_model::{ChatModel, ModelCallResult};
use crate::config::Config;
use crate::error::ModelErrorKind;
use async_openai::types::chat::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequest,
    CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// LLM 客户端
#[derive(Clone)]
pub struct LlmClient {
    http: reqwest::Client,
    api_key: String,
    api_base_url: String,
    model_name: String,
    max_tokens: u32,
}

impl LlmClient {
    /// 创建新的 LLM 客户端
    pub fn new(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: config.llm_api_key.clone(),
            api_base_url: config.llm_api_base_url.clone(),
            model_name: config.llm_model_name.clone(),
            max_tokens: config.llm_max_tokens,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.api_base_url.trim_end_matches('/'))
    }

    /// 构建请求体：固定为 system + user 两条消息
    fn build_request(
        &self,
        prompt: &str,
        system_prompt: &str,
        temperature: f32,
    ) -> Result<CreateChatCompletionRequest, async_openai::error::OpenAIError> {
        let system_msg = ChatCompletionRequestSystemMessageArgs::default()
            .content(system_prompt)
            .build()?;
        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(prompt)
            .build()?;

        let messages = vec![
            ChatCompletionRequestMessage::System(system_msg),
            ChatCompletionRequestMessage::User(user_msg),
        ];

        CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(messages)
            .temperature(temperature)
            .max_tokens(self.max_tokens)
            .build()
    }

    /// 发送聊天请求
    ///
    /// # 参数
    /// - `prompt`: 用户消息内容
    /// - `system_prompt`: 系统消息
    /// - `temperature`: 采样温度
    /// - `timeout`: 本次请求的超时时间
    ///
    /// # 返回
    /// 永远不会返回错误；失败信息都在 `ModelCallResult` 里
    pub async fn chat(
        &self,
        prompt: &str,
        system_prompt: &str,
        temperature: f32,
        timeout: Duration,
    ) -> ModelCallResult {
        debug!(
            "调用 LLM API，模型: {}，温度: {}，超时: {:?}",
            self.model_name, temperature, timeout
        );
        debug!("用户消息长度: {} 字符", prompt.len());

        let request = match self.build_request(prompt, system_prompt, temperature) {
            Ok(request) => request,
            Err(e) => {
                warn!("LLM 请求构建失败: {}", e);
                return ModelCallResult::failure(ModelErrorKind::Request, None, e.to_string());
            }
        };

        let response = match self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&request)
            .timeout(timeout)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                let kind = transport_kind(&e);
                warn!("LLM API 调用失败 ({}): {}", kind, e);
                return ModelCallResult::failure(kind, None, e.to_string());
            }
        };

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            // 优先保留 JSON 形式的错误体
            let err_text = serde_json::from_str::<Value>(&body)
                .map(|v| v.to_string())
                .unwrap_or(body);
            warn!("LLM API 返回错误状态 {}: {}", status.as_u16(), err_text);
            return ModelCallResult::failure(ModelErrorKind::Http, Some(status.as_u16()), err_text);
        }

        match response.json::<Value>().await {
            Ok(data) => {
                debug!("LLM API 调用成功");
                ModelCallResult::success(extract_content(&data))
            }
            Err(e) if e.is_timeout() => {
                warn!("读取 LLM 响应超时: {}", e);
                ModelCallResult::failure(ModelErrorKind::Timeout, None, e.to_string())
            }
            Err(e) => {
                warn!("LLM 响应解析失败: {}", e);
                ModelCallResult::failure(ModelErrorKind::Decode, Some(status.as_u16()), e.to_string())
            }
        }
    }
}

#[async_trait]
impl ChatModel for LlmClient {
    async fn call(
        &self,
        prompt: &str,
        system_prompt: &str,
        temperature: f32,
        timeout: Duration,
    ) -> ModelCallResult {
        self.chat(prompt, system_prompt, temperature, timeout).await
    }
}

fn transport_kind(err: &reqwest::Error) -> ModelErrorKind {
    if err.is_timeout() {
        ModelErrorKind::Timeout
    } else {
        ModelErrorKind::Connection
    }
}

/// 取 `choices[0].message.content`，缺失或为 null 时返回空字符串
fn extract_content(data: &Value) -> String {
    data.pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}
