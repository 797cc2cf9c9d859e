use tracing::{error, info};

use crate::app_state::AppState;
use crate::error::{RelayError, Result};
use crate::types::{
    Envelope, EnvelopeData, ImagePayload, ImageReply, ImageResult, StoryRequest,
    MSG_IMAGE_UPSTREAM_FAILED,
};

/// 文生图提示词：风格一行，画面描述一行
pub fn compose_prompt(style: &str, scene: &str) -> String {
    format!("风格:{style}\n\n场景描述:{scene}")
}

/// `/generate-image` 的处理逻辑
pub async fn generate_image(state: &AppState, body: &[u8]) -> Envelope<EnvelopeData<ImageResult>> {
    match try_generate(state, body).await {
        Ok(image) => Envelope::ok(image),
        Err(e) => {
            error!(error = %e, "image generation failed");
            e.into_envelope(MSG_IMAGE_UPSTREAM_FAILED)
        }
    }
}

async fn try_generate(state: &AppState, body: &[u8]) -> Result<ImageResult> {
    let req: StoryRequest = serde_json::from_slice(body).map_err(RelayError::RequestParse)?;
    info!(prompt = req.prompt(), style = req.style(), "image request");

    let payload = ImagePayload {
        prompt: compose_prompt(req.style(), req.prompt()),
        stream: false,
    };
    let payload = serde_json::to_value(&payload).map_err(RelayError::Encode)?;

    let config = &state.config;
    let value = state
        .client
        .invoke(&config.image_endpoint, &payload, config.timeout())
        .await?;
    let reply: ImageReply = serde_json::from_value(value).map_err(RelayError::Decode)?;

    info!(saved_path = %reply.saved_path, "image generated");
    Ok(ImageResult {
        image_base64: reply.image_base64,
        saved_path: reply.saved_path,
    })
}
