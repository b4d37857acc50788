use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, error, info};

use crate::{api::app_state::AppState, error::AppError};

/// 合成一张新的猫咪肖像
pub async fn generate_cat_image(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    debug!("Generating cat image");

    let compositor = state.compositor.clone();
    let png = tokio::task::spawn_blocking(move || {
        let mut rng = StdRng::from_entropy();
        compositor.compose(&mut rng)
    })
    .await
    .map_err(|e| AppError::Internal(format!("image task failed: {}", e)))?
    .inspect_err(|e| error!("Error generating cat image: {}", e))?;

    info!("Cat image generated, {} bytes", png.len());

    Ok((
        [
            (header::CONTENT_TYPE, "image/png"),
            (header::CACHE_CONTROL, "no-store"),
        ],
        png,
    ))
}
