use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Response},
};
use tracing::{debug, info};

use crate::{
    api::{app_state::AppState, dto::cat_dto::*},
    error::AppError,
    services::{
        catalog::{NAME_PREFIXES, NAME_SUFFIXES},
        require,
    },
};

fn catalog(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

/// 组合接口：按 action 返回名字建议、背景故事或完整档案
pub async fn cat_details(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CatDetailsRequest>,
) -> Result<Response, AppError> {
    let image_data = require(request.image_data, "No image data provided")?;
    let image = strip_data_url(&image_data);
    let name = request
        .name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());
    debug!(
        "Cat details request: action={:?}, has_name={}, image_len={}",
        request.action,
        name.is_some(),
        image.len()
    );

    match (request.action.as_deref(), name) {
        (Some("getName"), _) => {
            let suggestion = state.generator.suggest_name(image).await?;
            info!("Name suggestion: {}", suggestion.value);
            Ok(Json(NameResponse {
                success: true,
                name: suggestion.value,
                prefixes: catalog(NAME_PREFIXES),
                suffixes: catalog(NAME_SUFFIXES),
                error: suggestion.error,
            })
            .into_response())
        }
        (Some("getBackstory"), Some(name)) => {
            let details = state.generator.details(image, &name).await?;
            Ok(Json(DetailsResponse {
                success: true,
                name,
                backstory: details.value.backstory,
                personality_type: details.value.personality_type,
                dnd_attributes: details.value.dnd_attributes,
                timeline: None,
                error: details.error,
            })
            .into_response())
        }
        (None | Some("getAll"), name) => {
            let (name, name_error) = match name {
                Some(name) => (name, None),
                None => {
                    let suggestion = state.generator.suggest_name(image).await?;
                    (suggestion.value, suggestion.error)
                }
            };
            let details = state.generator.details(image, &name).await?;
            info!(
                "Cat details generated for {}, backstory length: {}",
                name,
                details.value.backstory.len()
            );
            Ok(Json(DetailsResponse {
                success: true,
                name,
                backstory: details.value.backstory,
                personality_type: details.value.personality_type,
                dnd_attributes: details.value.dnd_attributes,
                timeline: Some(details.value.timeline),
                error: details.error.or(name_error),
            })
            .into_response())
        }
        _ => Err(AppError::Validation(
            "Invalid action specified or missing name".to_string(),
        )),
    }
}
