use serde::{Deserialize, Deserializer, Serialize};

pub const MSG_OK: &str = "操作成功";
pub const MSG_SERVER_ERROR: &str = "服务器异常";
pub const MSG_TEXT_UPSTREAM_FAILED: &str = "大模型调用失败";
pub const MSG_IMAGE_UPSTREAM_FAILED: &str = "图像生成模型调用失败";
pub const MSG_POST_ONLY: &str = "只支持POST请求";

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
}

/// 非 POST 请求的返回体（不是 envelope）
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// 前端请求：两个字段都可以缺省
#[derive(Debug, Clone, Deserialize)]
pub struct StoryRequest {
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub style: Option<String>,
}

impl StoryRequest {
    pub fn prompt(&self) -> &str {
        self.prompt.as_deref().unwrap_or("").trim()
    }

    pub fn style(&self) -> &str {
        self.style.as_deref().unwrap_or("").trim()
    }
}

/// 所有接口统一的返回格式，成功失败都用它
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope<T> {
    pub code: u16,
    pub msg: String,
    pub data: T,
    /// 毫秒时间戳
    pub time: i64,
}

impl<T> Envelope<EnvelopeData<T>> {
    pub fn ok(data: T) -> Self {
        Self::new(200, MSG_OK, EnvelopeData::Data(data))
    }

    pub fn fail(msg: &str, diagnostic: String) -> Self {
        Self::new(500, msg, EnvelopeData::Diagnostic(diagnostic))
    }
}

impl<T> Envelope<T> {
    fn new(code: u16, msg: &str, data: T) -> Self {
        Self {
            code,
            msg: msg.to_string(),
            data,
            time: chrono::Utc::now().timestamp_millis(),
        }
    }
}

/// envelope 的 data：成功时是具体结果，失败时是诊断文本
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EnvelopeData<T> {
    Data(T),
    Diagnostic(String),
}

/// 一个分镜
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    // 字段名和前端约定一致（包括拼写）
    pub scence_title: String,
    pub prompt: String,
    pub narration: String,
    pub bgm_suggestion: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShotList {
    #[serde(rename = "shotList")]
    pub shot_list: Vec<Scene>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageResult {
    pub image_base64: String,
    pub saved_path: String,
}

// ---- 上游请求 / 响应 ----

#[derive(Debug, Clone, Serialize)]
pub struct GenerateOptions {
    pub temperature: f32,
    pub num_predict: u32,
}

/// Ollama `/api/generate` 请求体
#[derive(Debug, Clone, Serialize)]
pub struct GeneratePayload {
    pub model: String,
    pub prompt: String,
    pub stream: bool,
    pub options: GenerateOptions,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerateReply {
    #[serde(default)]
    pub response: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImagePayload {
    pub prompt: String,
    pub stream: bool,
}

/// 文生图服务的回复。字段缺失或为 null 都当作空串
#[derive(Debug, Clone, Deserialize)]
pub struct ImageReply {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub image_base64: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub saved_path: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
