//! 配置缺省值。其他模块不要再写死这些地址和参数。

pub const TEXT_ENDPOINT: &str = "http://localhost:18001/api/generate";
pub const IMAGE_ENDPOINT: &str = "http://localhost:18002/api/generate_image";
pub const TEXT_MODEL: &str = "qwen2.5-coder:3b";

pub const TEMPERATURE: f32 = 0.4;
pub const NUM_PREDICT: u32 = 1500;

/// 上游调用超时（秒）
pub const TIMEOUT_SECS: u64 = 60;
