//! 客户端模块
//!
//! 页面编排器按顺序驱动各生成接口；[`CatApi`] 抽象六个 HTTP 调用，测试时可替换。

pub mod http;
pub mod orchestrator;

use async_trait::async_trait;
use futures_util::stream::BoxStream;

use crate::api::dto::{AttributesResponse, NameResponse, PersonalityResponse, TimelineResponse};
use crate::error::Result;
use crate::models::PersonalityType;

pub use http::HttpCatApi;
pub use orchestrator::{OrchestratorError, PageOrchestrator, PageSnapshot, PageState, Step, StepFailure};

/// 原始字节流（SSE 响应体）
pub type ByteStream = BoxStream<'static, Result<Vec<u8>>>;

/// 猫咪生成接口
#[async_trait]
pub trait CatApi: Send + Sync {
    /// 获取一张新合成的 PNG
    async fn cat_image(&self) -> Result<Vec<u8>>;

    async fn suggest_name(&self, image: &[u8]) -> Result<NameResponse>;

    async fn personality(&self, image: &[u8], name: &str) -> Result<PersonalityResponse>;

    async fn attributes(
        &self,
        image: &[u8],
        name: &str,
        personality: &PersonalityType,
    ) -> Result<AttributesResponse>;

    /// 打开背景故事流，返回未解码的响应体
    async fn backstory_stream(
        &self,
        image: &[u8],
        name: &str,
        personality: Option<&PersonalityType>,
    ) -> Result<ByteStream>;

    async fn timeline(
        &self,
        name: &str,
        personality: Option<&PersonalityType>,
        backstory: &str,
    ) -> Result<TimelineResponse>;
}
