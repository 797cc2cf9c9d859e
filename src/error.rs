use rocket::data::ByteUnit;
use thiserror::Error;

use crate::types::{Envelope, EnvelopeData, MSG_SERVER_ERROR};

#[derive(Error, Debug)]
pub enum RelayError {
    #[error("failed to read request body: {0}")]
    BodyRead(#[from] std::io::Error),

    #[error("request body exceeds {0}")]
    BodyTooLarge(ByteUnit),

    #[error("invalid request body: {0}")]
    RequestParse(#[source] serde_json::Error),

    #[error("failed to encode upstream payload: {0}")]
    Encode(#[source] serde_json::Error),

    /// 上游返回非 2xx，body 原样保留
    #[error("upstream returned HTTP {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("upstream request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("upstream returned a non-JSON body: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("模型未返回有效 JSON")]
    OutputFormat,

    #[error("failed to parse model output: {0}")]
    OutputParse(#[source] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, RelayError>;

impl RelayError {
    /// 转成 code=500 的 envelope。
    ///
    /// `upstream_msg` 只用于 `Upstream`，此时 data 是上游原始 body；
    /// 其他错误统一用 "服务器异常"，data 是错误文本。
    pub fn into_envelope<T>(self, upstream_msg: &str) -> Envelope<EnvelopeData<T>> {
        match self {
            RelayError::Upstream { body, .. } => Envelope::fail(upstream_msg, body),
            other => Envelope::fail(MSG_SERVER_ERROR, other.to_string()),
        }
    }
}
