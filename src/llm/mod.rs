//! 对话模型模块
//!
//! 外部多模态对话补全服务的抽象。生成服务只依赖 [`ChatModel`]，测试时可替换。

pub mod openai;

use async_trait::async_trait;
use futures_util::stream::BoxStream;

use crate::error::Result;

pub use openai::OpenAiChatModel;

/// 流式文本：每项是一个增量片段
pub type TextStream = BoxStream<'static, Result<String>>;

/// 一次对话请求
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatPrompt {
    /// 系统指令
    pub system: String,
    /// 用户消息
    pub user: String,
    /// base64 编码的 PNG 图像（不含 data URL 前缀）
    pub image_base64: Option<String>,
    /// 是否要求返回 JSON 对象
    pub json: bool,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub presence_penalty: Option<f32>,
    pub frequency_penalty: Option<f32>,
}

impl ChatPrompt {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
            ..Default::default()
        }
    }

    /// 附带图像
    pub fn with_image(mut self, image_base64: impl Into<String>) -> Self {
        self.image_base64 = Some(image_base64.into());
        self
    }

    /// 要求 JSON 输出
    pub fn json(mut self) -> Self {
        self.json = true;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_penalties(mut self, presence: f32, frequency: f32) -> Self {
        self.presence_penalty = Some(presence);
        self.frequency_penalty = Some(frequency);
        self
    }
}

/// 对话模型 trait
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// 单次补全，返回解析后的 JSON 内容
    async fn complete_json(&self, prompt: &ChatPrompt) -> Result<serde_json::Value>;

    /// 流式补全，逐片段返回文本
    async fn stream_text(&self, prompt: &ChatPrompt) -> Result<TextStream>;
}
