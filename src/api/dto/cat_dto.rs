//! 猫咪档案 DTO
//!
//! 定义生成接口的请求和响应数据结构。客户端复用同一组类型解析响应。

use axum::extract::FromRequest;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::AppError;
use crate::models::{DndAttributes, PersonalityType, TimelineEvent};

/// JSON 请求体提取器，解析失败时返回 400 `{error}`
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// `/cat-details` 请求
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CatDetailsRequest {
    /// Base64 图像，可带 `data:...;base64,` 前缀
    pub image_data: Option<String>,
    /// getName | getBackstory | getAll
    pub action: Option<String>,
    pub name: Option<String>,
}

/// 基于图像的生成请求
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GenerationRequest {
    pub image_base64: Option<String>,
    pub name: Option<String>,
    pub personality_type: Option<PersonalityType>,
}

/// 时间线请求
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TimelineRequest {
    pub backstory: Option<String>,
    pub name: Option<String>,
    pub personality_type: Option<PersonalityType>,
}

impl TimelineRequest {
    /// 宽松读取：类型不符的字段视为缺失
    pub fn from_value(body: &Value) -> Self {
        let text = |key: &str| body.get(key).and_then(Value::as_str).map(str::to_string);
        Self {
            backstory: text("backstory"),
            name: text("name"),
            personality_type: body
                .get("personalityType")
                .and_then(|v| PersonalityType::deserialize(v).ok()),
        }
    }
}

/// 名字建议响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NameResponse {
    pub success: bool,
    pub name: String,
    pub prefixes: Vec<String>,
    pub suffixes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// 档案详情响应；`getBackstory` 不含时间线
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailsResponse {
    pub success: bool,
    pub name: String,
    pub backstory: String,
    pub personality_type: PersonalityType,
    pub dnd_attributes: DndAttributes,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeline: Option<Vec<TimelineEvent>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalityResponse {
    pub personality_type: PersonalityType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributesResponse {
    pub dnd_attributes: DndAttributes,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BasicInfoResponse {
    pub personality_type: PersonalityType,
    pub dnd_attributes: DndAttributes,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineResponse {
    pub timeline: Vec<TimelineEvent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// 去掉 data URL 前缀
pub fn strip_data_url(image: &str) -> &str {
    image
        .split_once("base64,")
        .map(|(_, data)| data)
        .unwrap_or(image)
}
