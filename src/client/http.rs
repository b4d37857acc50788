//! 基于 reqwest 的 [`CatApi`] 实现

use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD};
use futures_util::StreamExt;
use reqwest::{Client, Response};
use serde::{Serialize, de::DeserializeOwned};
use std::time::Duration;
use tracing::debug;

use super::{ByteStream, CatApi};
use crate::api::dto::*;
use crate::error::{AppError, ErrorResponse, Result};
use crate::models::PersonalityType;

/// HTTP 客户端
#[derive(Debug, Clone)]
pub struct HttpCatApi {
    client: Client,
    base_url: String,
}

impl HttpCatApi {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/{}", self.base_url, path)
    }

    /// 非 2xx 响应转换为错误，优先使用响应体中的 `error` 字段
    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let detail = response
            .json::<ErrorResponse>()
            .await
            .map(|body| body.error)
            .unwrap_or_else(|_| status.to_string());
        if status.is_client_error() {
            Err(AppError::Validation(detail))
        } else {
            Err(AppError::Upstream(format!("{}: {}", status, detail)))
        }
    }

    async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        debug!("POST {}", path);
        let response = self.client.post(self.url(path)).json(body).send().await?;
        Ok(Self::check(response).await?.json::<R>().await?)
    }

    fn generation_request(
        image: &[u8],
        name: &str,
        personality: Option<&PersonalityType>,
    ) -> GenerationRequest {
        GenerationRequest {
            image_base64: Some(STANDARD.encode(image)),
            name: Some(name.to_string()),
            personality_type: personality.cloned(),
        }
    }
}

#[async_trait]
impl CatApi for HttpCatApi {
    async fn cat_image(&self) -> Result<Vec<u8>> {
        let response = self.client.get(self.url("cat-image")).send().await?;
        let bytes = Self::check(response).await?.bytes().await?;
        Ok(bytes.to_vec())
    }

    async fn suggest_name(&self, image: &[u8]) -> Result<NameResponse> {
        let request = CatDetailsRequest {
            image_data: Some(STANDARD.encode(image)),
            action: Some("getName".to_string()),
            name: None,
        };
        self.post_json("cat-details", &request).await
    }

    async fn personality(&self, image: &[u8], name: &str) -> Result<PersonalityResponse> {
        let request = Self::generation_request(image, name, None);
        self.post_json("cat-personality", &request).await
    }

    async fn attributes(
        &self,
        image: &[u8],
        name: &str,
        personality: &PersonalityType,
    ) -> Result<AttributesResponse> {
        let request = Self::generation_request(image, name, Some(personality));
        self.post_json("cat-dnd-attributes", &request).await
    }

    async fn backstory_stream(
        &self,
        image: &[u8],
        name: &str,
        personality: Option<&PersonalityType>,
    ) -> Result<ByteStream> {
        let request = Self::generation_request(image, name, personality);
        let response = self
            .client
            .post(self.url("cat-backstory-stream"))
            .json(&request)
            .send()
            .await?;
        let body = Self::check(response)
            .await?
            .bytes_stream()
            .map(|chunk| chunk.map(|bytes| bytes.to_vec()).map_err(AppError::from));
        Ok(body.boxed())
    }

    async fn timeline(
        &self,
        name: &str,
        personality: Option<&PersonalityType>,
        backstory: &str,
    ) -> Result<TimelineResponse> {
        let request = TimelineRequest {
            backstory: Some(backstory.to_string()),
            name: Some(name.to_string()),
            personality_type: personality.cloned(),
        };
        self.post_json("cat-timeline", &request).await
    }
}
