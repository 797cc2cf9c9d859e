use std::sync::Arc;

use rocket::data::Limits;
use rocket::http::{Method, Status};
use rocket::response::status::Custom;
use rocket::route::{Handler, Outcome};
use rocket::serde::json::Json;
use rocket::{get, post, Data, Request, Route, State};
use tracing::warn;

use crate::app_state::AppState;
use crate::error::{RelayError, Result};
use crate::types::{
    Envelope, EnvelopeData, ErrorBody, HealthResponse, ImageResult, ShotList,
    MSG_IMAGE_UPSTREAM_FAILED, MSG_POST_ONLY, MSG_TEXT_UPSTREAM_FAILED,
};
use crate::{image, segment};

pub const SEGMENT_PATH: &str = "/segment";
pub const GENERATE_IMAGE_PATH: &str = "/generate-image";

#[get("/health")]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// 原样读出 body 字节。超长、读失败都交给调用方转成 envelope，
/// 不走 rocket 的 data guard（它会直接回 400/413 的 HTML 页）。
async fn read_body(data: Data<'_>, limits: &Limits) -> Result<Vec<u8>> {
    let limit = limits.get("bytes").unwrap_or(Limits::BYTES);
    let capped = data.open(limit).into_bytes().await?;
    if !capped.is_complete() {
        warn!(%limit, "request body over limit");
        return Err(RelayError::BodyTooLarge(limit));
    }
    Ok(capped.into_inner())
}

#[post("/segment", data = "<data>")]
pub async fn segment_story(
    state: &State<Arc<AppState>>,
    limits: &Limits,
    data: Data<'_>,
) -> Json<Envelope<EnvelopeData<ShotList>>> {
    let envelope = match read_body(data, limits).await {
        Ok(body) => segment::segment_story(state, &body).await,
        Err(e) => e.into_envelope(MSG_TEXT_UPSTREAM_FAILED),
    };
    Json(envelope)
}

#[post("/generate-image", data = "<data>")]
pub async fn generate_image(
    state: &State<Arc<AppState>>,
    limits: &Limits,
    data: Data<'_>,
) -> Json<Envelope<EnvelopeData<ImageResult>>> {
    let envelope = match read_body(data, limits).await {
        Ok(body) => image::generate_image(state, &body).await,
        Err(e) => e.into_envelope(MSG_IMAGE_UPSTREAM_FAILED),
    };
    Json(envelope)
}

/// 非 POST 一律 405，返回体不是 envelope
#[derive(Clone)]
struct PostOnly;

#[rocket::async_trait]
impl Handler for PostOnly {
    async fn handle<'r>(&self, req: &'r Request<'_>, _data: Data<'r>) -> Outcome<'r> {
        let body = ErrorBody {
            error: MSG_POST_ONLY.to_string(),
        };
        Outcome::from(req, Custom(Status::MethodNotAllowed, Json(body)))
    }
}

/// 给每个 POST 接口的其他方法挂上 405 路由
pub fn post_only_routes(paths: &[&str]) -> Vec<Route> {
    const METHODS: [Method; 7] = [
        Method::Get,
        Method::Put,
        Method::Delete,
        Method::Patch,
        Method::Options,
        Method::Trace,
        Method::Connect,
    ];

    paths
        .iter()
        .flat_map(|path| METHODS.iter().map(move |m| Route::new(*m, *path, PostOnly)))
        .collect()
}
