use tracing::{error, info};

use crate::app_state::AppState;
use crate::error::{RelayError, Result};
use crate::types::{
    Envelope, EnvelopeData, GenerateOptions, GeneratePayload, GenerateReply, Scene, ShotList,
    StoryRequest, MSG_TEXT_UPSTREAM_FAILED,
};

/// 拼出发给文本模型的完整提示词：固定的中文指令 + 用户的故事
pub fn build_prompt(style: &str, story: &str) -> String {
    let instructions = format!(
        r#"
你是一个专业的故事分镜助手，需要把用户给出的故事拆分成若干个连续的场景。
不管用户使用哪种语言输入，输出内容都必须全部是中文。

每个场景对象包含且只包含以下字段：
- scence_title: 场景标题
- prompt: 可直接用于图像生成的画面描述（画面风格：{style}）
- narration: 场景旁白
- bgm_suggestion: 推荐的背景音乐

必须遵守：
1. scence_title、prompt、narration、bgm_suggestion 全部用中文书写。
2. prompt 是中文的画面描述，不允许出现英文句子。
3. narration 用中文叙述。
4. 只输出一个 JSON 数组，数组里每个元素是一个场景对象。
5. 不要输出任何解释或多余的文字，只输出 JSON。
"#
    );

    format!("{instructions}\n\n故事内容如下：\n{story}")
}

/// 去掉 markdown 代码块标记。没有 ``` 时原样返回。
pub fn strip_code_fences(text: &str) -> String {
    if text.contains("```") {
        text.replace("```json", "").replace("```", "").trim().to_string()
    } else {
        text.to_string()
    }
}

/// 取第一个 `[` 到最后一个 `]`（含）之间的内容。
///
/// 只做子串查找，不做括号配对。`]` 出现在第一个 `[` 之前时返回空串，
/// 留给后面的 JSON 解析报错。
pub fn extract_json_array(text: &str) -> Result<&str> {
    let (Some(start), Some(end)) = (text.find('['), text.rfind(']')) else {
        return Err(RelayError::OutputFormat);
    };

    Ok(text.get(start..end + 1).unwrap_or(""))
}

/// 模型原始输出 → 分镜列表
pub fn parse_shot_list(model_text: &str) -> Result<Vec<Scene>> {
    let cleaned = strip_code_fences(model_text);
    let json = extract_json_array(&cleaned)?;
    serde_json::from_str(json).map_err(RelayError::OutputParse)
}

/// `/segment` 的处理逻辑。所有错误都在这里转成 envelope。
pub async fn segment_story(state: &AppState, body: &[u8]) -> Envelope<EnvelopeData<ShotList>> {
    match try_segment(state, body).await {
        Ok(shot_list) => Envelope::ok(shot_list),
        Err(e) => {
            error!(error = %e, "story segmentation failed");
            e.into_envelope(MSG_TEXT_UPSTREAM_FAILED)
        }
    }
}

async fn try_segment(state: &AppState, body: &[u8]) -> Result<ShotList> {
    let req: StoryRequest = serde_json::from_slice(body).map_err(RelayError::RequestParse)?;
    let (story, style) = (req.prompt(), req.style());
    info!(prompt = story, style, "segment request");

    let config = &state.config;
    let payload = GeneratePayload {
        model: config.text_model.clone(),
        prompt: build_prompt(style, story),
        stream: false,
        options: GenerateOptions {
            temperature: config.temperature,
            num_predict: config.num_predict,
        },
    };
    let payload = serde_json::to_value(&payload).map_err(RelayError::Encode)?;

    let value = state
        .client
        .invoke(&config.text_endpoint, &payload, config.timeout())
        .await?;
    let reply: GenerateReply = serde_json::from_value(value).map_err(RelayError::Decode)?;

    let model_text = reply.response.trim();
    info!(model_text, "raw model output");

    let shot_list = parse_shot_list(model_text)?;
    info!(scenes = shot_list.len(), "parsed shot list");

    Ok(ShotList { shot_list })
}
