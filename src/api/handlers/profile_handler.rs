use axum::{Json, extract::State, response::IntoResponse};
use tracing::debug;

use crate::{
    api::{app_state::AppState, dto::cat_dto::*},
    error::AppError,
    models::PersonalityType,
    services::require,
};

/// 推断人格类型
pub async fn cat_personality(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<GenerationRequest>,
) -> Result<impl IntoResponse, AppError> {
    let image = require(request.image_base64, "No image data provided")?;
    let name = require(request.name, "No name provided")?;
    debug!("Generating personality for {}", name);

    let personality = state.generator.personality(&image, &name).await?;
    Ok(Json(PersonalityResponse {
        personality_type: personality.value,
        error: personality.error,
    }))
}

/// 按人格分配 D&D 属性
pub async fn cat_dnd_attributes(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<GenerationRequest>,
) -> Result<impl IntoResponse, AppError> {
    let image = require(request.image_base64, "No image data provided")?;
    let name = require(request.name, "No name provided")?;
    let personality = request
        .personality_type
        .and_then(PersonalityType::normalized)
        .ok_or_else(|| AppError::Validation("No personality type provided".to_string()))?;
    debug!("Generating attributes for {} ({})", name, personality.code);

    let attributes = state
        .generator
        .attributes(&image, &name, &personality)
        .await?;
    Ok(Json(AttributesResponse {
        dnd_attributes: attributes.value,
        error: attributes.error,
    }))
}

/// 一次调用生成人格与属性
pub async fn cat_basic_info(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<GenerationRequest>,
) -> Result<impl IntoResponse, AppError> {
    let image = require(request.image_base64, "No image data provided")?;
    let name = require(request.name, "No name provided")?;
    debug!("Generating basic info for {}", name);

    let info = state.generator.basic_info(&image, &name).await?;
    Ok(Json(BasicInfoResponse {
        personality_type: info.value.personality_type,
        dnd_attributes: info.value.dnd_attributes,
        error: info.error,
    }))
}
