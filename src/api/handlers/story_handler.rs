use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    response::{
        IntoResponse,
        sse::{Event, Sse},
    },
};
use futures_util::StreamExt;
use serde_json::Value;
use std::convert::Infallible;
use tracing::{debug, warn};

use crate::{
    api::{app_state::AppState, dto::cat_dto::*},
    error::AppError,
    models::{PersonalityType, TimelineEvent},
    services::{
        generation::{TIMELINE_REQUEST_ERROR, UNKNOWN_CAT},
        require,
    },
};

/// 以 SSE 流式返回背景故事
pub async fn cat_backstory_stream(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<GenerationRequest>,
) -> Result<impl IntoResponse, AppError> {
    let image = require(request.image_base64, "No image data provided")?;
    let name = require(request.name, "No name provided")?;
    let personality = request
        .personality_type
        .and_then(PersonalityType::normalized);
    debug!("Opening backstory stream for {}", name);

    let events = state
        .generator
        .stream_backstory(&image, &name, personality.as_ref())
        .await?;

    let body = events.map(|event| {
        Ok::<_, Infallible>(Event::default().event(event.name()).data(event.data()))
    });
    Ok(Sse::new(body))
}

/// 从背景故事提炼时间线
///
/// 任何请求内容都不会得到 4xx：无法解析的请求体返回默认时间线并附带 `error`。
pub async fn cat_timeline(
    State(state): State<AppState>,
    body: std::result::Result<Json<Value>, JsonRejection>,
) -> Json<TimelineResponse> {
    let request = match body {
        Ok(Json(value)) => TimelineRequest::from_value(&value),
        Err(rejection) => {
            warn!("Unreadable timeline request: {}", rejection.body_text());
            return Json(TimelineResponse {
                timeline: TimelineEvent::default_timeline(UNKNOWN_CAT),
                error: Some(TIMELINE_REQUEST_ERROR.to_string()),
            });
        }
    };
    debug!(
        "Timeline request: name={:?}, backstory_len={}",
        request.name,
        request.backstory.as_deref().map(str::len).unwrap_or(0)
    );
    let personality = request
        .personality_type
        .and_then(PersonalityType::normalized);

    let timeline = state
        .generator
        .timeline(
            request.name.as_deref(),
            personality.as_ref(),
            request.backstory.as_deref(),
        )
        .await;

    Json(TimelineResponse {
        timeline: timeline.value,
        error: timeline.error,
    })
}
